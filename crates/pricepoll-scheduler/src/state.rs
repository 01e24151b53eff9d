//! Loop state carried between iterations.

use pricepoll_config::Config;

/// How a freshly loaded configuration relates to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigChange {
    /// First configuration seen by the loop.
    Initial,
    /// Identical to the previous configuration.
    Unchanged,
    /// Differs from the previous configuration in at least one field.
    Changed,
}

/// State the polling loop keeps between iterations.
#[derive(Debug, Clone, Default)]
pub struct LoopState {
    previous: Option<Config>,
}

impl LoopState {
    /// Creates an empty state.
    #[must_use]
    pub const fn new() -> Self {
        Self { previous: None }
    }

    /// Records `config` as the current snapshot and reports whether it
    /// differs from the previous one.
    pub fn observe(&mut self, config: &Config) -> ConfigChange {
        let change = match &self.previous {
            None => ConfigChange::Initial,
            Some(previous) if previous == config => ConfigChange::Unchanged,
            Some(_) => ConfigChange::Changed,
        };
        if change != ConfigChange::Unchanged {
            self.previous = Some(config.clone());
        }
        change
    }

    /// Returns the last observed configuration.
    #[must_use]
    pub const fn current(&self) -> Option<&Config> {
        self.previous.as_ref()
    }
}
