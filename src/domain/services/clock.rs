//! Clock skew measurement against the exchange server.
//!
//! The exchange validates order timing against its own clock, and local
//! clocks drift, so the trigger compares a corrected reading rather than the
//! raw local clock.

use chrono::Utc;

use crate::domain::repositories::exchange_client::{ExchangeClient, ExchangeResult};

/// Source of local wall-clock readings. Swapped for a scripted clock in
/// tests.
pub trait Clock: Send + Sync {
    /// Local wall-clock time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Signed offset between the local clock and the exchange clock, in
/// milliseconds. Measured once at process start and assumed constant for the
/// process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset {
    millis: i64,
}

impl ClockOffset {
    /// Fetch the server time once and capture the local clock immediately
    /// after the response returns. There is no retry: without a usable skew
    /// measurement the whole trigger is meaningless, so a failure here is
    /// fatal to startup.
    pub async fn sync(client: &dyn ExchangeClient, clock: &dyn Clock) -> ExchangeResult<Self> {
        let server_ms = client.server_time_ms().await?;
        let local_ms = clock.now_ms();
        Ok(Self {
            millis: local_ms - server_ms,
        })
    }

    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// A local reading adjusted by the measured offset; this is the value
    /// compared against the target timestamp.
    pub fn corrected(&self, local_ms: i64) -> i64 {
        local_ms + self.millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::order::{OrderReceipt, OrderRequest};
    use crate::domain::repositories::exchange_client::{ExchangeError, SymbolRules};
    use async_trait::async_trait;

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    struct StubExchange {
        server_time: ExchangeResult<i64>,
    }

    #[async_trait]
    impl ExchangeClient for StubExchange {
        fn name(&self) -> &str {
            "stub"
        }

        async fn server_time_ms(&self) -> ExchangeResult<i64> {
            self.server_time.clone()
        }

        async fn free_balance(&self, _asset: &str) -> ExchangeResult<f64> {
            Ok(0.0)
        }

        async fn symbol_rules(&self, _symbol: &str) -> ExchangeResult<SymbolRules> {
            Ok(SymbolRules::default())
        }

        async fn place_order(&self, _order: &OrderRequest) -> ExchangeResult<OrderReceipt> {
            Ok(OrderReceipt::default())
        }
    }

    #[tokio::test]
    async fn test_sync_local_ahead_of_server() {
        let exchange = StubExchange {
            server_time: Ok(1_000),
        };
        let offset = ClockOffset::sync(&exchange, &FixedClock(1_250)).await.unwrap();
        assert_eq!(offset.millis(), 250);
    }

    #[tokio::test]
    async fn test_sync_local_behind_server() {
        let exchange = StubExchange {
            server_time: Ok(2_000),
        };
        let offset = ClockOffset::sync(&exchange, &FixedClock(1_700)).await.unwrap();
        assert_eq!(offset.millis(), -300);
    }

    #[tokio::test]
    async fn test_sync_propagates_failure() {
        let exchange = StubExchange {
            server_time: Err(ExchangeError::Transport("connection refused".to_string())),
        };
        let result = ClockOffset::sync(&exchange, &FixedClock(0)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_corrected_applies_offset() {
        let offset = ClockOffset::from_millis(250);
        assert_eq!(offset.corrected(10_000), 10_250);

        let behind = ClockOffset::from_millis(-300);
        assert_eq!(behind.corrected(10_000), 9_700);
    }
}
