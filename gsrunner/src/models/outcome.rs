use crate::models::batch::Batch;
use serde::Serialize;

/// What the harness learns about a finished runner: which batch it was and how it exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub batch: Batch,
    /// None when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}
