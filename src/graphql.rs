//! The simulated user driving the GraphQL surface of the reservation API.
//!
//! Every operation is a POST of `{query, variables}` to a single endpoint.
//! GraphQL reports application errors in the response body while still
//! answering HTTP 200, so transport success and application success are
//! treated separately: a 200 with an `errors` array is a recorded success,
//! but does not yield a usable reservation id.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::{Value, json};

use crate::payload::{ReservationRequest, UPDATE_MARKER, id_from_value};
use crate::task::{GRAPHQL_TASKS, Outcome, Task, TaskPicker, classify_graphql};
use crate::user::SimulatedUser;

const CREATE_RESERVATION: &str = r"
mutation CreateReservation($input: CreateReservationInput!) {
  createReservation(input: $input) {
    id
    status
    totalPrice
    checkInDate
    checkOutDate
  }
}";

const GET_RESERVATION: &str = r"
query GetReservation($id: ID!) {
  getReservation(id: $id) {
    id
    status
    totalPrice
    numberOfGuests
    client {
      firstName
      lastName
      email
    }
    room {
      roomNumber
      roomType
    }
  }
}";

const GET_ALL_RESERVATIONS: &str = r"
query GetAllReservations {
  getAllReservations {
    id
    status
    checkInDate
    checkOutDate
  }
}";

const UPDATE_RESERVATION: &str = r"
mutation UpdateReservation($id: ID!, $input: UpdateReservationInput!) {
  updateReservation(id: $id, input: $input) {
    id
    status
    specialRequests
  }
}";

const DELETE_RESERVATION: &str = r"
mutation DeleteReservation($id: ID!) {
  deleteReservation(id: $id)
}";

/// A simulated user issuing GraphQL queries and mutations against a single
/// endpoint.
#[derive(Debug)]
pub struct GraphQlReservationUser {
    client: reqwest::Client,
    endpoint: String,
    reservation_id: Option<String>,
    picker: TaskPicker,
    rng: SmallRng,
}

impl GraphQlReservationUser {
    /// Creates a new user targeting the GraphQL `endpoint`.
    pub fn new(client: reqwest::Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_owned(),
            reservation_id: None,
            picker: TaskPicker::new(GRAPHQL_TASKS),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// The reservation id this user currently holds, if any.
    pub fn reservation_id(&self) -> Option<&str> {
        self.reservation_id.as_deref()
    }

    async fn post(
        &self,
        query: &'static str,
        variables: Option<Value>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut body = json!({ "query": query });
        if let Some(variables) = variables {
            body["variables"] = variables;
        }
        self.client.post(&self.endpoint).json(&body).send().await
    }

    async fn create(&mut self) -> Outcome {
        let payload = ReservationRequest::create(&mut self.rng);
        let variables = json!({
            "input": {
                "clientId": payload.client_id.to_string(),
                "roomId": payload.room_id.to_string(),
                "checkInDate": payload.check_in_date,
                "checkOutDate": payload.check_out_date,
                "numberOfGuests": payload.number_of_guests,
                "specialRequests": payload.special_requests,
                "status": payload.status,
            }
        });

        let response = match self.post(CREATE_RESERVATION, Some(variables)).await {
            Ok(response) => response,
            Err(err) => return Outcome::Failure(err.to_string()),
        };

        let status = response.status().as_u16();
        if status == 200 {
            // an `errors` array is still transport success, but carries no id
            if let Ok(body) = response.json::<Value>().await
                && body.get("errors").is_none()
                && let Some(id) = body
                    .pointer("/data/createReservation/id")
                    .and_then(id_from_value)
            {
                self.reservation_id = Some(id);
            }
        }
        classify_graphql(status)
    }

    async fn get_by_id(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let variables = json!({ "id": id });

        match self.post(GET_RESERVATION, Some(variables)).await {
            Ok(response) => classify_graphql(response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn get_all(&mut self) -> Outcome {
        match self.post(GET_ALL_RESERVATIONS, None).await {
            Ok(response) => classify_graphql(response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn update(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        // the schema's UpdateReservationInput is a partial update
        let variables = json!({
            "id": id,
            "input": {
                "status": "CONFIRMED",
                "specialRequests": UPDATE_MARKER,
            }
        });

        match self.post(UPDATE_RESERVATION, Some(variables)).await {
            Ok(response) => classify_graphql(response.status().as_u16()),
            Err(err) => Outcome::Failure(err.to_string()),
        }
    }

    async fn delete(&mut self) -> Outcome {
        let Some(id) = self.reservation_id.as_deref() else {
            return Outcome::Skipped;
        };
        let variables = json!({ "id": id });

        let status = match self.post(DELETE_RESERVATION, Some(variables)).await {
            Ok(response) => response.status().as_u16(),
            Err(err) => return Outcome::Failure(err.to_string()),
        };

        let outcome = classify_graphql(status);
        if outcome == Outcome::Success {
            self.reservation_id = None;
        }
        outcome
    }
}

impl SimulatedUser for GraphQlReservationUser {
    fn next_task(&mut self) -> Task {
        self.picker.pick(&mut self.rng)
    }

    async fn perform(&mut self, task: Task) -> Outcome {
        match task {
            Task::Create => self.create().await,
            Task::GetById => self.get_by_id().await,
            Task::GetAll => self.get_all().await,
            Task::Update => self.update().await,
            // not part of the GraphQL surface
            Task::Cancel => Outcome::Skipped,
            Task::Delete => self.delete().await,
        }
    }
}
