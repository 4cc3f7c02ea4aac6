//! Randomized reservation request payloads.

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Serialize;
use serde_json::Value;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Marker placed in the notes field of generated reservations.
pub const CREATE_MARKER: &str = "Load test reservation";
/// Marker placed in the notes field of generated updates.
pub const UPDATE_MARKER: &str = "Load test update";

/// Status requested for a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    /// The reservation is awaiting confirmation.
    Pending,
    /// The reservation is confirmed.
    Confirmed,
}

/// The request body for creating or updating a reservation.
///
/// All fields are freshly randomized per call; the service under test is the
/// sole authority on whether the values are acceptable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    /// Client placing the reservation (1-10).
    pub client_id: u32,
    /// Room being reserved (1-10).
    pub room_id: u32,
    /// Check-in date, `YYYY-MM-DD`, 1-30 days from today.
    pub check_in_date: String,
    /// Check-out date, `YYYY-MM-DD`, 1-7 days after check-in.
    pub check_out_date: String,
    /// Number of guests (1-4).
    pub number_of_guests: u32,
    /// Free-text notes carrying the load-test marker.
    pub special_requests: String,
    /// Requested reservation status.
    pub status: ReservationStatus,
}

impl ReservationRequest {
    /// Builds a randomized create payload with a random PENDING/CONFIRMED status.
    pub fn create(rng: &mut SmallRng) -> Self {
        let status = if rng.random() {
            ReservationStatus::Pending
        } else {
            ReservationStatus::Confirmed
        };
        Self::randomized(rng, status, CREATE_MARKER)
    }

    /// Builds a randomized update payload. Updates always confirm.
    pub fn update(rng: &mut SmallRng) -> Self {
        Self::randomized(rng, ReservationStatus::Confirmed, UPDATE_MARKER)
    }

    fn randomized(rng: &mut SmallRng, status: ReservationStatus, notes: &str) -> Self {
        let (check_in, check_out) = stay_dates(rng);
        Self {
            client_id: rng.random_range(1..=10),
            room_id: rng.random_range(1..=10),
            check_in_date: format_date(check_in),
            check_out_date: format_date(check_out),
            number_of_guests: rng.random_range(1..=4),
            special_requests: notes.to_owned(),
            status,
        }
    }
}

fn stay_dates(rng: &mut SmallRng) -> (Date, Date) {
    let today = OffsetDateTime::now_utc().date();
    let check_in = today + Duration::days(rng.random_range(1..=30));
    let check_out = check_in + Duration::days(rng.random_range(1..=7));
    (check_in, check_out)
}

fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(format).unwrap()
}

/// Extracts a reservation id from a JSON value, accepting both string and
/// numeric ids.
pub(crate) fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
