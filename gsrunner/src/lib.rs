// value objects handed to the runner executable
pub mod models;

// spawn and await one runner process
pub mod runner;

// dump file naming and the runner's batch partition rule
pub mod dump;
