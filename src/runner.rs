//! Runs scenarios concurrently against the reservation service and prints a
//! per-operation report.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sketches_ddsketch::DDSketch;
use yansi::Paint;

use crate::config::{Config, Protocol, Scenario, WaitTime};
use crate::graphql::GraphQlReservationUser;
use crate::rest::RestReservationUser;
use crate::task::{Outcome, Task};
use crate::user::SimulatedUser;

/// Runs all configured scenarios concurrently, then prints per-scenario and
/// total metrics.
pub async fn run(config: Config) -> Result<()> {
    let client = reqwest::Client::new();
    let duration = config.duration;

    let tasks: Vec<_> = config
        .scenarios
        .into_iter()
        .map(|scenario| tokio::spawn(run_scenario(client.clone(), scenario, duration)))
        .collect();

    let mut total = ScenarioMetrics::default();
    for task in futures::future::join_all(tasks).await {
        let (scenario, metrics) = task?;

        println!();
        println!(
            "{} {} (protocol: {:?}, users: {})",
            "## Scenario".bold(),
            scenario.name.bold().blue(),
            scenario.protocol,
            scenario.users.bold()
        );
        print_metrics(&metrics, duration);

        total.merge(&metrics);
    }

    println!();
    println!("{}", "## TOTALS".bold());
    print_metrics(&total, duration);

    Ok(())
}

/// Runs a single scenario to its deadline and returns the merged metrics of
/// all its users.
pub(crate) async fn run_scenario(
    client: reqwest::Client,
    scenario: Scenario,
    duration: Duration,
) -> (Scenario, ScenarioMetrics) {
    let deadline = tokio::time::Instant::now() + duration;
    let metrics = Arc::new(Mutex::new(ScenarioMetrics::default()));

    match scenario.protocol {
        Protocol::Rest => {
            spawn_users(
                &scenario,
                || RestReservationUser::new(client.clone(), &scenario.base_url),
                deadline,
                &metrics,
            )
            .await
        }
        Protocol::Graphql => {
            spawn_users(
                &scenario,
                || GraphQlReservationUser::new(client.clone(), &scenario.base_url),
                deadline,
                &metrics,
            )
            .await
        }
    }

    let metrics = Arc::try_unwrap(metrics)
        .map_err(|_| ())
        .unwrap()
        .into_inner()
        .unwrap();

    (scenario, metrics)
}

async fn spawn_users<U, F>(
    scenario: &Scenario,
    make_user: F,
    deadline: tokio::time::Instant,
    metrics: &Arc<Mutex<ScenarioMetrics>>,
) where
    U: SimulatedUser + Send + 'static,
    F: Fn() -> U,
{
    let ramp = scenario
        .spawn_rate
        .map(|rate| Duration::from_secs_f64(1.0 / rate));

    let mut users = Vec::with_capacity(scenario.users);
    for _ in 0..scenario.users {
        users.push(tokio::spawn(run_user(
            make_user(),
            scenario.wait_time,
            deadline,
            Arc::clone(metrics),
        )));

        if let Some(ramp) = ramp {
            tokio::time::sleep(ramp).await;
        }
    }

    futures::future::join_all(users).await;
}

async fn run_user<U: SimulatedUser>(
    mut user: U,
    wait: WaitTime,
    deadline: tokio::time::Instant,
    metrics: Arc<Mutex<ScenarioMetrics>>,
) {
    let mut rng = SmallRng::from_os_rng();

    loop {
        let wake = tokio::time::Instant::now() + wait.sample(&mut rng);
        if wake >= deadline {
            break;
        }
        tokio::time::sleep_until(wake).await;

        let task = user.next_task();
        let start = Instant::now();
        let outcome = user.perform(task).await;
        if let Outcome::Failure(message) = &outcome {
            eprintln!("{} failed: {message}", task.name());
        }
        metrics.lock().unwrap().record(task, &outcome, start.elapsed());
    }
}

#[derive(Default)]
pub(crate) struct ScenarioMetrics {
    pub(crate) ops: BTreeMap<Task, OpMetrics>,
}

#[derive(Default)]
pub(crate) struct OpMetrics {
    pub(crate) successes: u64,
    pub(crate) failures: u64,
    pub(crate) skips: u64,
    timing: DDSketch,
}

impl ScenarioMetrics {
    fn record(&mut self, task: Task, outcome: &Outcome, elapsed: Duration) {
        let op = self.ops.entry(task).or_default();
        match outcome {
            Outcome::Success => {
                op.successes += 1;
                op.timing.add(elapsed.as_secs_f64());
            }
            Outcome::Failure(_) => op.failures += 1,
            Outcome::Skipped => op.skips += 1,
        }
    }

    fn merge(&mut self, other: &ScenarioMetrics) {
        for (task, op) in &other.ops {
            let merged = self.ops.entry(*task).or_default();
            merged.successes += op.successes;
            merged.failures += op.failures;
            merged.skips += op.skips;
            merged.timing.merge(&op.timing).unwrap();
        }
    }
}

fn print_metrics(metrics: &ScenarioMetrics, duration: Duration) {
    for (task, op) in &metrics.ops {
        if op.successes + op.failures + op.skips == 0 {
            continue;
        }

        print!(
            "{} ({} ops",
            task.name().to_uppercase().bold().green(),
            op.successes.bold()
        );
        if op.failures > 0 {
            print!(", {}", format!("{} FAILURES", op.failures).bold().red());
        }
        if op.skips > 0 {
            print!(", {} skipped", op.skips);
        }
        println!(")");

        if op.successes > 0 {
            let ops_ps = op.successes as f64 / duration.as_secs_f64();
            println!("  {:.2} operations/s", ops_ps.bold());
            print_percentiles(&op.timing, Duration::from_secs_f64);
        }
    }
}

fn print_percentiles<T: fmt::Debug>(sketch: &DDSketch, map: impl Fn(f64) -> T) {
    let ops = sketch.count();
    let avg = map(sketch.sum().unwrap() / ops as f64);
    let p50 = map(sketch.quantile(0.5).unwrap().unwrap());
    let p90 = map(sketch.quantile(0.9).unwrap().unwrap());
    let p99 = map(sketch.quantile(0.99).unwrap().unwrap());
    println!(
        "  avg: {:.2?}; p50: {p50:.2?}; p90: {p90:.2?}; p99: {p99:.2?}",
        avg.bold()
    );
}
