//! The seam between the runner and the protocol-specific user definitions.

use std::future::Future;

use crate::task::{Outcome, Task};

/// One independent simulated user in the load test.
///
/// Implementations hold the per-user state the protocol needs: an HTTP
/// client, the target URL, and at most one remembered reservation id. A user
/// issues exactly one HTTP call per performed task and judges the response
/// itself, instead of trusting raw status codes.
pub trait SimulatedUser {
    /// Picks the next task from this user's weighted task set.
    fn next_task(&mut self) -> Task;

    /// Performs `task` and classifies the response.
    ///
    /// Returns [`Outcome::Skipped`] without issuing a call when the task
    /// requires a held reservation id and none is held this turn.
    fn perform(&mut self, task: Task) -> impl Future<Output = Outcome> + Send;
}
