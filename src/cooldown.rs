use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

pub const COOLDOWN_SECONDS: i64 = 300;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Returned when the command is invoked inside the cooldown window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoolingDown {
    pub remaining: Duration,
}

impl CoolingDown {
    pub fn message(&self) -> String {
        let total = self.remaining.num_seconds().max(0);
        format!(
            "Leaderboard is cooling down. Try again in {}m {}s.",
            total / 60,
            total % 60
        )
    }
}

/// One cooldown for the whole process, shared by every user and channel.
pub struct Cooldown {
    window: Duration,
    clock: Arc<dyn Clock>,
    last_invocation: Mutex<Option<DateTime<Utc>>>,
}

impl Cooldown {
    pub fn new(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Cooldown {
            window,
            clock,
            last_invocation: Mutex::new(None),
        }
    }

    pub fn with_default_window(clock: Arc<dyn Clock>) -> Self {
        Cooldown::new(Duration::seconds(COOLDOWN_SECONDS), clock)
    }

    /// Records an invocation unless the previous accepted one is still inside
    /// the window. Check and update happen under one lock.
    pub async fn try_acquire(&self) -> Result<(), CoolingDown> {
        let mut last = self.last_invocation.lock().await;
        let now = self.clock.now();

        if let Some(previous) = *last {
            let elapsed = now.signed_duration_since(previous);
            if elapsed < self.window {
                return Err(CoolingDown {
                    remaining: self.window - elapsed,
                });
            }
        }

        *last = Some(now);
        Ok(())
    }

    #[cfg(test)]
    pub async fn last_invocation(&self) -> Option<DateTime<Utc>> {
        *self.last_invocation.lock().await
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use super::*;
    use std::sync::Mutex;

    pub struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        pub fn new() -> Arc<Self> {
            let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
            Arc::new(ManualClock {
                now: Mutex::new(start),
            })
        }

        pub fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }
}
