pub mod args;
pub mod batch;
pub mod launch;
pub mod outcome;
