//! Order submission: balance gate, quantity sizing, retry loop.

use tracing::{error, info, warn};

use crate::config::OrderMode;
use crate::domain::entities::order::{OrderReceipt, OrderRequest};
use crate::domain::repositories::exchange_client::{
    ExchangeClient, ExchangeError, ExchangeResult, SymbolRules,
};
use crate::domain::services::retry::RetryPolicy;
use crate::domain::value_objects::quantity::Quantity;

/// Terminal outcome of a submission.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Order accepted; receipt plus the quote amount committed.
    Placed { receipt: OrderReceipt, spent: f64 },
    /// Free quote balance was zero at trigger time; the order endpoint was
    /// never called.
    InsufficientBalance,
}

pub struct OrderSubmitter<'a> {
    client: &'a dyn ExchangeClient,
    quote_asset: &'a str,
    retry: Box<dyn RetryPolicy>,
}

impl<'a> OrderSubmitter<'a> {
    pub fn new(
        client: &'a dyn ExchangeClient,
        quote_asset: &'a str,
        retry: Box<dyn RetryPolicy>,
    ) -> Self {
        Self {
            client,
            quote_asset,
            retry,
        }
    }

    /// Size and submit the buy order for `symbol`. The free balance is read
    /// fresh here rather than reusing the pre-wait reading, so funds moved
    /// during the wait are picked up.
    pub async fn submit(
        &mut self,
        symbol: &str,
        mode: OrderMode,
        rules: SymbolRules,
    ) -> ExchangeResult<SubmitOutcome> {
        let balance = self.client.free_balance(self.quote_asset).await?;
        if balance <= 0.0 {
            error!("no free {} balance, nothing to spend", self.quote_asset);
            return Ok(SubmitOutcome::InsufficientBalance);
        }

        let request = build_request(symbol, mode, balance, rules)?;
        let receipt = self.place_with_retry(&request).await?;
        Ok(SubmitOutcome::Placed {
            receipt,
            spent: balance,
        })
    }

    async fn place_with_retry(&mut self, request: &OrderRequest) -> ExchangeResult<OrderReceipt> {
        let mut attempt: u32 = 0;
        loop {
            match self.client.place_order(request).await {
                Ok(receipt) => {
                    if attempt > 0 {
                        info!("order accepted after {} failed attempts", attempt);
                    }
                    return Ok(receipt);
                }
                Err(err) => {
                    attempt += 1;
                    match self.retry.next_delay(attempt, &err) {
                        Some(delay) => {
                            warn!(attempt, "order submission failed: {err}, retrying in {delay:?}");
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(err),
                    }
                }
            }
        }
    }
}

/// Build the wire request for the given mode and fresh balance.
///
/// Market orders pass the full free balance through as a quote-denominated
/// spend; the exchange converts at execution price. Limit orders size as
/// `balance / price`, truncated to the symbol's lot-size precision so the
/// submitted quantity never exceeds what the wallet can pay for.
pub fn build_request(
    symbol: &str,
    mode: OrderMode,
    balance: f64,
    rules: SymbolRules,
) -> ExchangeResult<OrderRequest> {
    match mode {
        OrderMode::Market => Ok(OrderRequest::market_buy(symbol, balance.to_string())),
        OrderMode::Limit { price } => {
            let precision = rules.quantity_precision_or_default();
            let quantity =
                Quantity::new(balance / price.value()).map_err(ExchangeError::InvalidOrder)?;
            Ok(OrderRequest::limit_buy(
                symbol,
                quantity.to_exchange_string(precision),
                price.to_string(),
            ))
        }
    }
}
