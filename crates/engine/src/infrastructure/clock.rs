//! System clock adapter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::ports::ClockPort;

/// Real wall-clock time and tokio sleeps.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[async_trait]
impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
