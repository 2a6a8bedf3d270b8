//! Order wire types: the request sent to the exchange and the receipt that
//! comes back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInForce {
    Gtc,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
        }
    }
}

/// A buy order ready for the wire. Quantity and price are carried as
/// precision-compliant decimal strings; the MARKET/LIMIT field split matches
/// what the exchange expects for each type.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    /// Base-asset quantity (LIMIT only), lot-size precision applied.
    pub quantity: Option<String>,
    /// Quote-asset spend (MARKET only); the exchange converts to base
    /// quantity at execution price.
    pub quote_quantity: Option<String>,
    /// Quote price per base unit (LIMIT only).
    pub price: Option<String>,
    pub time_in_force: Option<TimeInForce>,
}

impl OrderRequest {
    /// Market buy spending `quote_quantity` of the quote asset.
    pub fn market_buy(symbol: &str, quote_quantity: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            quantity: None,
            quote_quantity: Some(quote_quantity),
            price: None,
            time_in_force: None,
        }
    }

    /// GTC limit buy of `quantity` base units at `price`.
    pub fn limit_buy(symbol: &str, quantity: String, price: String) -> Self {
        Self {
            symbol: symbol.to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: Some(quantity),
            quote_quantity: None,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
        }
    }
}

/// Exchange acknowledgment of a placed order. Every field is optional: the
/// test endpoint acknowledges with an empty JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderReceipt {
    pub symbol: Option<String>,
    pub order_id: Option<i64>,
    pub client_order_id: Option<String>,
    pub transact_time: Option<i64>,
    pub price: Option<String>,
    pub orig_qty: Option<String>,
    pub executed_qty: Option<String>,
    pub cummulative_quote_qty: Option<String>,
    pub status: Option<String>,
    pub fills: Vec<OrderFill>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFill {
    pub price: String,
    pub qty: String,
    pub commission: String,
    pub commission_asset: String,
}
