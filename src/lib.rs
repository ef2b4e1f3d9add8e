use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::counter::{Counter, Status, COUNT_OVERFLOW, MAX_SAFE_COUNT};
pub use crate::error::{Error, Result};
pub use crate::registry::Registry;

mod clock;
mod counter;
mod error;
mod registry;

/// Window applied when no other is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Construction-time settings for counters and registries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Trailing span covered by the buckets; must be a positive whole
    /// number of seconds.
    pub window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
        }
    }
}
