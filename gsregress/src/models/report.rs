use gsrunner::{models::batch::Batch, models::outcome::Outcome, runner::RunnerError};

/// How a single batch ended, as seen from the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    Exited(Outcome),
    LaunchFailed { batch: Batch, reason: String },
    // the worker task itself died, so the batch is unknown
    Panicked { reason: String },
}

impl BatchResult {
    pub fn success(&self) -> bool {
        matches!(self, BatchResult::Exited(outcome) if outcome.success())
    }
}

impl From<Result<Outcome, RunnerError>> for BatchResult {
    fn from(result: Result<Outcome, RunnerError>) -> Self {
        match result {
            Ok(outcome) => BatchResult::Exited(outcome),
            Err(e) => {
                let batch = match &e {
                    RunnerError::Spawn { batch, .. } | RunnerError::Wait { batch, .. } => *batch,
                };
                BatchResult::LaunchFailed {
                    batch,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Everything collected at the join barrier. Only consulted for logging and for strict runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    results: Vec<BatchResult>,
}

impl RunReport {
    pub fn push(&mut self, result: BatchResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[BatchResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.success()).count()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures() == 0
    }
}
