use crate::error::SuiteError;
use crate::retry::RetryPolicy;
use crate::scenarios::{Scenario, SuiteContext};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug)]
pub enum Outcome {
    Passed { attempts: u32 },
    Failed { attempts: u32, error: SuiteError },
    Skipped { reason: String },
    /// The scenario task panicked or was cancelled. Counted as a failure.
    Aborted { reason: String },
}

#[derive(Debug)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub story: Option<&'static str>,
    pub outcome: Outcome,
}

impl ScenarioReport {
    /// `name` or `name [story]`, used in result lines.
    pub fn label(&self) -> String {
        match self.story {
            Some(story) => format!("{} [{}]", self.name, story),
            None => self.name.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    pub run_id: String,
    pub reports: Vec<ScenarioReport>,
}

impl Summary {
    pub fn passed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Passed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. } | Outcome::Aborted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    /// Failures caused by the token endpoint rather than the playlist API.
    pub fn auth_failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { error, .. } if error.is_auth_failure()))
    }

    pub fn report(&self, name: &str) -> Option<&ScenarioReport> {
        self.reports.iter().find(|r| r.name == name)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Run every scenario concurrently, one tokio task each. All tasks share the
/// context and therefore the same token cache.
pub async fn run_scenarios(
    ctx: Arc<SuiteContext>,
    scenarios: Vec<Scenario>,
    policy: RetryPolicy,
) -> Summary {
    let run_id = Uuid::new_v4().to_string();
    let handles: Vec<_> = scenarios
        .into_iter()
        .map(|scenario| {
            let ctx = ctx.clone();
            let run_id = run_id.clone();
            let handle = tokio::spawn(async move { run_one(&ctx, scenario, policy, &run_id).await });
            (scenario, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (scenario, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("scenario {} task aborted: {}", scenario.name, e);
                Outcome::Aborted {
                    reason: e.to_string(),
                }
            }
        };
        reports.push(ScenarioReport {
            name: scenario.name,
            story: scenario.story,
            outcome,
        });
    }
    Summary { run_id, reports }
}

async fn run_one(ctx: &SuiteContext, scenario: Scenario, policy: RetryPolicy, run_id: &str) -> Outcome {
    for fixture in scenario.requires {
        if let Err(e) = ctx.fixture(*fixture) {
            warn!("skipping {}: {}", scenario.name, e);
            return Outcome::Skipped {
                reason: e.to_string(),
            };
        }
    }

    let mut attempt = 0u32;
    let (attempts, result) = policy
        .run(scenario.name, || {
            attempt += 1;
            info!(
                run_id,
                "starting scenario {} (attempt {}) on thread {:?}",
                scenario.name,
                attempt,
                std::thread::current().id()
            );
            (scenario.run)(ctx)
        })
        .await;
    match result {
        Ok(()) => {
            info!("scenario {} passed after {} attempt(s)", scenario.name, attempts);
            Outcome::Passed { attempts }
        }
        Err(SuiteError::MissingFixture(key)) => Outcome::Skipped {
            reason: format!("missing fixture: {}", key),
        },
        Err(error) => {
            if error.is_auth_failure() {
                error!("scenario {} aborted by auth failure: {}", scenario.name, error);
            } else {
                error!("scenario {} failed: {}", scenario.name, error);
            }
            Outcome::Failed { attempts, error }
        }
    }
}
