//! The weighted task set and the per-operation response classification.

use rand::rngs::SmallRng;
use rand_distr::Distribution;
use rand_distr::weighted::WeightedIndex;

/// One of the operations a simulated user can perform against the
/// reservation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    /// Create a new reservation.
    Create,
    /// Fetch the reservation this user holds.
    GetById,
    /// Fetch all reservations.
    GetAll,
    /// Update the reservation this user holds.
    Update,
    /// Cancel the reservation this user holds (REST only).
    Cancel,
    /// Delete the reservation this user holds.
    Delete,
}

impl Task {
    /// Short name for failure messages and the report.
    pub fn name(self) -> &'static str {
        match self {
            Task::Create => "create",
            Task::GetById => "get-by-id",
            Task::GetAll => "get-all",
            Task::Update => "update",
            Task::Cancel => "cancel",
            Task::Delete => "delete",
        }
    }

    /// Whether the task can only run while the user holds a reservation id.
    pub fn needs_reservation(self) -> bool {
        !matches!(self, Task::Create | Task::GetAll)
    }
}

/// The weighted task set of the REST user.
pub const REST_TASKS: &[(Task, u8)] = &[
    (Task::Create, 3),
    (Task::GetById, 2),
    (Task::GetAll, 1),
    (Task::Update, 1),
    (Task::Cancel, 1),
    (Task::Delete, 1),
];

/// The weighted task set of the GraphQL user. There is no cancel mutation.
pub const GRAPHQL_TASKS: &[(Task, u8)] = &[
    (Task::Create, 3),
    (Task::GetById, 2),
    (Task::GetAll, 1),
    (Task::Update, 1),
    (Task::Delete, 1),
];

/// Picks tasks from a fixed weighted set.
#[derive(Debug)]
pub struct TaskPicker {
    tasks: &'static [(Task, u8)],
    distribution: WeightedIndex<u8>,
}

impl TaskPicker {
    /// Creates a picker over the given weighted task set.
    pub fn new(tasks: &'static [(Task, u8)]) -> Self {
        let distribution = WeightedIndex::new(tasks.iter().map(|(_, weight)| *weight)).unwrap();
        Self {
            tasks,
            distribution,
        }
    }

    /// Picks one task, with probability proportional to its weight.
    pub fn pick(&self, rng: &mut SmallRng) -> Task {
        self.tasks[self.distribution.sample(rng)].0
    }
}

/// How a single task invocation turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The response was acceptable for this operation.
    Success,
    /// The response (or the call itself) was not acceptable.
    Failure(String),
    /// The task's precondition was unmet; no call was made this turn.
    Skipped,
}

/// Classifies a REST response status for the given task.
///
/// This encodes more than "2xx is fine": a create hitting a booking conflict
/// (409) is an acceptable outcome, a get or cancel finding nothing (404) is
/// acceptable under concurrent deletes, and a delete is idempotent (204 or
/// 404 both count).
pub fn classify_rest(task: Task, status: u16) -> Outcome {
    let acceptable = match task {
        Task::Create => matches!(status, 201 | 409),
        Task::GetById => matches!(status, 200 | 404),
        Task::GetAll => status == 200,
        Task::Update => matches!(status, 200 | 404 | 409),
        Task::Cancel => matches!(status, 200 | 404),
        Task::Delete => matches!(status, 204 | 404),
    };
    if acceptable {
        Outcome::Success
    } else {
        Outcome::Failure(format!("unexpected status {status}"))
    }
}

/// Classifies a GraphQL response status.
///
/// GraphQL reports application errors in the response body while still
/// answering 200, so transport success is all that is judged here.
pub fn classify_graphql(status: u16) -> Outcome {
    if status == 200 {
        Outcome::Success
    } else {
        Outcome::Failure(format!("unexpected status {status}"))
    }
}
