//! Exchange Client Trait
//!
//! Common interface between the trading flow and the venue plumbing. The
//! trigger loop and order submitter only ever see this trait, which keeps
//! them testable against hand-rolled mocks and independent of the REST
//! details underneath.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::order::{OrderReceipt, OrderRequest};

/// Common result type for exchange operations.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// Errors that can occur during exchange operations. The submission retry
/// loop deliberately does not branch on these; the variants exist so log
/// lines stay precise.
#[derive(Debug, Error, Clone)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("exchange rejected request (code {code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("failed to decode exchange response: {0}")]
    Decode(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),
}

/// Trading rules for one symbol, as published by the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SymbolRules {
    /// Fractional digits allowed in an order quantity, derived from the
    /// lot-size step. `None` when the symbol is unknown or publishes no
    /// lot-size rule.
    pub quantity_precision: Option<u32>,
}

impl SymbolRules {
    /// Fallback when no lot-size rule is published for the symbol.
    pub const DEFAULT_QUANTITY_PRECISION: u32 = 2;

    pub fn quantity_precision_or_default(&self) -> u32 {
        self.quantity_precision
            .unwrap_or(Self::DEFAULT_QUANTITY_PRECISION)
    }
}

/// Exchange client trait providing the operations the timed-buy flow needs.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Venue name, for logging.
    fn name(&self) -> &str;

    /// Current exchange clock in epoch milliseconds.
    async fn server_time_ms(&self) -> ExchangeResult<i64>;

    /// Free (non-locked) balance of `asset`. Zero when the asset is absent
    /// from the account.
    async fn free_balance(&self, asset: &str) -> ExchangeResult<f64>;

    /// Published trading rules for `symbol`.
    async fn symbol_rules(&self, symbol: &str) -> ExchangeResult<SymbolRules>;

    /// Submit a buy order. Implementations route to the venue's test
    /// endpoint in dry-run mode.
    async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderReceipt>;
}
