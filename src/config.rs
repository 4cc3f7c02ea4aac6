//! The YAML run configuration for the load tester.

use std::time::Duration;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::Deserialize;

/// The full run configuration, parsed from a YAML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// How long to run each scenario.
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// The scenarios to run concurrently.
    pub scenarios: Vec<Scenario>,
}

/// One load scenario: a population of identical simulated users driving a
/// single target.
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Name of the scenario for identification in the report.
    pub name: String,
    /// Which protocol surface the users exercise.
    pub protocol: Protocol,
    /// Base URL of the target. For GraphQL this is the full endpoint URL.
    pub base_url: String,
    /// Number of simulated users to spawn.
    pub users: usize,
    /// Users started per second during ramp-up. All at once when unset.
    #[serde(default)]
    pub spawn_rate: Option<f64>,
    /// Bounds for the randomized think-time between a user's actions.
    #[serde(default)]
    pub wait_time: WaitTime,
}

/// The protocol surface a scenario exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// The `/api/reservations` REST endpoints.
    Rest,
    /// The single GraphQL endpoint.
    Graphql,
}

/// Bounds for the randomized pause between a user's consecutive actions.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaitTime {
    /// Shortest pause.
    #[serde(with = "humantime_serde")]
    pub min: Duration,
    /// Longest pause.
    #[serde(with = "humantime_serde")]
    pub max: Duration,
}

impl WaitTime {
    /// Samples one think-time, uniformly between the two bounds.
    pub fn sample(&self, rng: &mut SmallRng) -> Duration {
        let secs = rng.random_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(1),
            max: Duration::from_secs(3),
        }
    }
}
