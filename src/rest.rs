//! The simulated user driving the REST surface of the reservation API.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::Value;

use crate::payload::{ReservationRequest, id_from_value};
use crate::task::{Outcome, REST_TASKS, Task, TaskPicker, classify_rest};
use crate::user::SimulatedUser;

/// A simulated user issuing REST calls against `/api/reservations`.
///
/// The user remembers the id of the last reservation it created and uses it
/// for get/update/cancel/delete until a delete succeeds.
#[derive(Debug)]
pub struct RestReservationUser {
    client: reqwest::Client,
    base_url: String,
    reservation_id: Option<String>,
    picker: TaskPicker,
    rng: SmallRng,
}

impl RestReservationUser {
    /// Creates a new user targeting `base_url`.
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            reservation_id: None,
            picker: TaskPicker::new(REST_TASKS),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// The reservation id this user currently holds, if any.
    pub fn reservation_id(&self) -> Option<&str> {
        self.reservation_id.as_deref()
    }

    async fn create(&mut self) -> Outcome {
        let payload = ReservationRequest::create(&mut self.rng);
        let url = format!("{}/api/reservations", self.base_url);

        let response = match self.client.post(url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => return Outcome::Failure(err.to_string()),
        };

        let status = response.status().as_u16();
        if status == 201 {
            let id = response
                .json::<Value>()
                .await
                .ok()
                .as_ref()
                .and_then(|body| body.get("id"))
                .and_then(id_from_value);
            if let Some(id) = id {
                self.reservation_id = Some(id);
            }
        }
        classify_rest(Task::Create, status)
    }

    async fn get_by_id(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let url = format!("{}/api/reservations/{id}", self.base_url);

        match self.client.get(url).send().await {
            Ok(response) => classify_rest(Task::GetById, response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn get_all(&mut self) -> Outcome {
        let url = format!("{}/api/reservations", self.base_url);

        match self.client.get(url).send().await {
            Ok(response) => classify_rest(Task::GetAll, response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn update(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let url = format!("{}/api/reservations/{id}", self.base_url);
        let payload = ReservationRequest::update(&mut self.rng);

        match self.client.put(url).json(&payload).send().await {
            Ok(response) => classify_rest(Task::Update, response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn cancel(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let url = format!("{}/api/reservations/{id}/cancel", self.base_url);

        match self.client.patch(url).send().await {
            Ok(response) => classify_rest(Task::Cancel, response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn delete(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let url = format!("{}/api/reservations/{id}", self.base_url);

        let status = match self.client.delete(url).send().await {
            Ok(response) => response.status().as_u16(),
            Err(err) => return Outcome::Failure(err.to_string()),
        };

        let outcome = classify_rest(Task::Delete, status);
        if outcome == Outcome::Success {
            self.reservation_id = None;
        }
        outcome
    }
}

impl SimulatedUser for RestReservationUser {
    fn next_task(&mut self) -> Task {
        self.picker.pick(&mut self.rng)
    }

    async fn perform(&mut self, task: Task) -> Outcome {
        match task {
            Task::Create => self.create().await,
            Task::GetById => self.get_by_id().await,
            Task::GetAll => self.get_all().await,
            Task::Update => self.update().await,
            Task::Cancel => self.cancel().await,
            Task::Delete => self.delete().await,
        }
    }
}
