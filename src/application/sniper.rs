//! End-to-end run: measure skew, size up, wait, fire.

use tracing::info;

use crate::config::{OrderMode, SniperConfig};
use crate::domain::repositories::exchange_client::{ExchangeClient, ExchangeResult};
use crate::domain::services::clock::{Clock, ClockOffset, SystemClock};
use crate::domain::services::retry::FixedDelay;
use crate::domain::services::submitter::{OrderSubmitter, SubmitOutcome};
use crate::domain::services::trigger::TriggerLoop;
use crate::domain::value_objects::quantity::Quantity;

/// Run the full timed-buy flow against the system clock.
pub async fn run(config: &SniperConfig, client: &dyn ExchangeClient) -> ExchangeResult<SubmitOutcome> {
    run_with_clock(config, client, SystemClock).await
}

/// Same flow with an injectable clock; the end-to-end tests drive this.
///
/// The whole run is one sequential task: every exchange call completes
/// before the next begins, matching the single-threaded model of the tool.
pub async fn run_with_clock<C>(
    config: &SniperConfig,
    client: &dyn ExchangeClient,
    clock: C,
) -> ExchangeResult<SubmitOutcome>
where
    C: Clock + Copy,
{
    let offset = ClockOffset::sync(client, &clock).await?;
    info!("{} clock delta: {} ms", client.name(), offset.millis());

    let rules = client.symbol_rules(&config.symbol).await?;
    info!(
        "{} quantity precision: {}",
        config.symbol,
        rules.quantity_precision_or_default()
    );

    // Pre-wait reading, for visibility only; the submitter re-fetches at
    // trigger time so funds moved during the wait are picked up.
    let balance = client.free_balance(&config.quote_asset).await?;
    info!("free {} balance: {}", config.quote_asset, balance);
    if let OrderMode::Limit { price } = config.mode {
        if let Ok(estimate) = Quantity::new(balance / price.value()) {
            info!(
                "estimated purchase quantity: {}",
                estimate.to_exchange_string(rules.quantity_precision_or_default())
            );
        }
    }

    info!("armed for {} (local time)", config.order_time);
    let mut trigger = TriggerLoop::new(clock, offset, config.target_ms);
    let fired = trigger.wait().await;
    info!("target reached (exchange time {} ms)", fired.fired_at_ms);

    let mut submitter = OrderSubmitter::new(
        client,
        &config.quote_asset,
        Box::new(FixedDelay::default()),
    );
    let outcome = submitter.submit(&config.symbol, config.mode, rules).await?;

    if let SubmitOutcome::Placed { receipt, spent } = &outcome {
        match serde_json::to_string_pretty(receipt) {
            Ok(json) => info!("order receipt:\n{json}"),
            Err(_) => info!("order receipt: {receipt:?}"),
        }
        info!("total {} spent: {}", config.quote_asset, spent);
        info!(
            "completed at {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
        );
    }

    Ok(outcome)
}
