use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tells the runner not to open its console window.
pub const NO_CONSOLE_VAR: &str = "PCSX2_NOCONSOLE";

/// Windows process creation flag for BELOW_NORMAL_PRIORITY_CLASS.
pub const BELOW_NORMAL_PRIORITY_CLASS: u32 = 0x0000_4000;

/// Niceness added to the child on unix.
pub const NICE_INCREMENT: i32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    Normal,
    // regression runs should not starve the desktop
    #[default]
    BelowNormal,
}

/// Process settings applied to every runner launch. Handed to the launcher explicitly instead of
/// mutating this process' own environment or niceness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub priority: Priority,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        let mut env = BTreeMap::new();
        env.insert(NO_CONSOLE_VAR.to_owned(), "1".to_owned());
        Self {
            env,
            priority: Priority::default(),
        }
    }
}

impl LaunchOptions {
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
