use chrono::{Days, NaiveDate};
use colored::Colorize;
use genesys_progression::ProgressionEngine;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::scenarios::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

pub struct LogicTester {
    engine: ProgressionEngine,
    start: NaiveDate,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(engine: ProgressionEngine, start: NaiveDate, verbose: bool) -> Self {
        Self {
            engine,
            start,
            verbose,
        }
    }

    /// Run `scenario` once per iteration. Each iteration gets a fresh store, its
    /// own seed and a start date shifted by the iteration index.
    pub fn run_scenario(&self, scenario: &Scenario, seed: u64, iterations: usize) -> ScenarioResult {
        if self.verbose {
            println!(
                "🧪 Testing scenario: {} (seed: {seed}, start: {})",
                scenario.name.bright_white(),
                self.start
            );
        }

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut total = Duration::ZERO;

        for i in 0..iterations {
            let offset = u64::try_from(i).unwrap_or(u64::MAX);
            let iteration_seed = seed.wrapping_add(offset);
            let start = self
                .start
                .checked_add_days(Days::new(offset))
                .unwrap_or(self.start);
            let mut ctx = ScenarioCtx::new(self.engine.clone(), start, iteration_seed, self.verbose);

            let started = Instant::now();
            let result = scenario.run(&mut ctx);
            total += started.elapsed();

            match result {
                Ok(()) => successes += 1,
                Err(err) => {
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (seed {iteration_seed}, start {start}): {err:#}",
                        i + 1
                    ));
                }
            }
        }

        let average_duration = if iterations == 0 {
            Duration::ZERO
        } else {
            total / u32::try_from(iterations).unwrap_or(u32::MAX)
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
