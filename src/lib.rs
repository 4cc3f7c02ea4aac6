//! A load tester driving a hotel-reservation HTTP API.
//!
//! Two kinds of simulated users are supported: [`RestReservationUser`] issues
//! plain REST calls against the reservation endpoints, while
//! [`GraphQlReservationUser`] drives the equivalent operations through a
//! single GraphQL endpoint.
//!
//! Each user independently loops until the configured deadline: sleep a
//! uniformly random think-time, pick one task from a weighted set
//! (create-heavy, with reads, updates, cancels and deletes mixed in), issue
//! exactly one HTTP call, and classify the response itself. The
//! classification deliberately overrides plain status-code judgment where the
//! domain calls for it: booking conflicts and idempotent deletes are treated
//! as successes, and a GraphQL response with a body-level `errors` array is
//! still a transport success.
//!
//! [`RestReservationUser`]: crate::rest::RestReservationUser
//! [`GraphQlReservationUser`]: crate::graphql::GraphQlReservationUser
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod graphql;
pub mod payload;
pub mod rest;
pub mod runner;
pub mod task;
pub mod user;

pub use crate::runner::run;

#[cfg(test)]
mod tests;
