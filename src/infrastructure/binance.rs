//! Binance spot REST client.
//!
//! Signed endpoints follow the spot API convention: HMAC-SHA256 over the
//! query string, hex-encoded, with the key in the `X-MBX-APIKEY` header.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::config::SniperConfig;
use crate::domain::entities::order::{OrderReceipt, OrderRequest};
use crate::domain::repositories::exchange_client::{
    ExchangeClient, ExchangeError, ExchangeResult, SymbolRules,
};

type HmacSha256 = Hmac<Sha256>;

/// Tolerated distance between the signed timestamp and the server clock.
const RECV_WINDOW_MS: u64 = 5_000;

/// Error code the exchange returns for a symbol it does not know.
const CODE_INVALID_SYMBOL: i64 = -1121;

pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: Zeroizing<String>,
    live: bool,
}

impl BinanceClient {
    pub fn new(config: &SniperConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            live: config.live,
        }
    }

    /// Hex HMAC-SHA256 of `query` under the API secret.
    fn sign(&self, query: &str) -> ExchangeResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Authentication(e.to_string()))?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Append `timestamp`, `recvWindow` and `signature` to the parameter
    /// list and render the final query string.
    fn signed_query(&self, mut params: Vec<(&'static str, String)>) -> ExchangeResult<String> {
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        let query = render_query(&params);
        let signature = self.sign(&query)?;
        Ok(format!("{query}&signature={signature}"))
    }

    async fn get_json<T>(&self, path_and_query: &str, signed: bool) -> ExchangeResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path_and_query);
        let mut request = self.http.get(&url);
        if signed {
            request = request.header("X-MBX-APIKEY", &self.api_key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T>(response: reqwest::Response) -> ExchangeResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        if !status.is_success() {
            if let Ok(api) = serde_json::from_str::<ApiErrorBody>(&body) {
                return Err(ExchangeError::Rejected {
                    code: api.code,
                    message: api.msg,
                });
            }
            return Err(ExchangeError::Transport(format!("HTTP {status}: {body}")));
        }
        serde_json::from_str(&body).map_err(|e| ExchangeError::Decode(format!("{e}: {body}")))
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn name(&self) -> &str {
        "Binance"
    }

    async fn server_time_ms(&self) -> ExchangeResult<i64> {
        let time: ServerTime = self.get_json("/api/v3/time", false).await?;
        Ok(time.server_time)
    }

    async fn free_balance(&self, asset: &str) -> ExchangeResult<f64> {
        let query = self.signed_query(Vec::new())?;
        let account: AccountInfo = self
            .get_json(&format!("/api/v3/account?{query}"), true)
            .await?;
        find_free_balance(&account, asset)
    }

    async fn symbol_rules(&self, symbol: &str) -> ExchangeResult<SymbolRules> {
        let result: ExchangeResult<ExchangeInfo> = self
            .get_json(&format!("/api/v3/exchangeInfo?symbol={symbol}"), false)
            .await;
        match result {
            Ok(info) => Ok(rules_from_info(&info)),
            Err(ExchangeError::Rejected {
                code: CODE_INVALID_SYMBOL,
                ..
            }) => {
                warn!("{symbol} missing from exchange info, using default precision");
                Ok(SymbolRules::default())
            }
            Err(e) => Err(e),
        }
    }

    async fn place_order(&self, order: &OrderRequest) -> ExchangeResult<OrderReceipt> {
        let path = if self.live {
            "/api/v3/order"
        } else {
            "/api/v3/order/test"
        };
        let query = self.signed_query(order_params(order))?;
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!("POST {}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        Self::decode(response).await
    }
}

fn render_query(params: &[(&'static str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Query parameters for an order request, in wire vocabulary.
fn order_params(order: &OrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", order.symbol.clone()),
        ("side", order.side.as_str().to_string()),
        ("type", order.order_type.as_str().to_string()),
    ];
    if let Some(quantity) = &order.quantity {
        params.push(("quantity", quantity.clone()));
    }
    if let Some(quote) = &order.quote_quantity {
        params.push(("quoteOrderQty", quote.clone()));
    }
    if let Some(price) = &order.price {
        params.push(("price", price.clone()));
    }
    if let Some(tif) = &order.time_in_force {
        params.push(("timeInForce", tif.as_str().to_string()));
    }
    params
}

fn find_free_balance(account: &AccountInfo, asset: &str) -> ExchangeResult<f64> {
    match account.balances.iter().find(|b| b.asset == asset) {
        Some(balance) => balance
            .free
            .parse::<f64>()
            .map_err(|e| ExchangeError::Decode(format!("bad balance {:?}: {e}", balance.free))),
        None => Ok(0.0),
    }
}

fn rules_from_info(info: &ExchangeInfo) -> SymbolRules {
    let quantity_precision = info.symbols.first().and_then(|symbol| {
        symbol
            .filters
            .iter()
            .find(|f| f.filter_type == "LOT_SIZE")
            .and_then(|f| f.step_size.as_deref())
            .map(precision_from_step_size)
    });
    SymbolRules { quantity_precision }
}

/// Significant fractional digits in a lot-size step, trailing zeros
/// stripped: `"0.00100000"` -> 3, `"1.00000000"` -> 0.
fn precision_from_step_size(step: &str) -> u32 {
    let trimmed = step.trim_end_matches('0');
    match trimmed.split_once('.') {
        Some((_, fraction)) => fraction.len() as u32,
        None => 0,
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Deserialize)]
struct ServerTime {
    #[serde(rename = "serverTime")]
    server_time: i64,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Deserialize)]
struct AssetBalance {
    asset: String,
    free: String,
    #[allow(dead_code)]
    locked: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
struct SymbolFilter {
    #[serde(rename = "filterType")]
    filter_type: String,
    #[serde(rename = "stepSize")]
    step_size: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrderMode;
    use crate::domain::services::submitter::build_request;
    use crate::domain::value_objects::price::Price;

    fn test_client() -> BinanceClient {
        BinanceClient {
            http: Client::new(),
            base_url: "https://api.binance.com".to_string(),
            api_key: "key".to_string(),
            api_secret: Zeroizing::new("secret".to_string()),
            live: false,
        }
    }

    #[test]
    fn test_precision_from_step_size() {
        assert_eq!(precision_from_step_size("0.00100000"), 3);
        assert_eq!(precision_from_step_size("0.00000100"), 6);
        assert_eq!(precision_from_step_size("1.00000000"), 0);
        assert_eq!(precision_from_step_size("0.1"), 1);
        assert_eq!(precision_from_step_size("10.00000000"), 0);
    }

    #[test]
    fn test_sign_is_hex_sha256_and_deterministic() {
        let client = test_client();
        let first = client.sign("symbol=BTCUSDT&side=BUY").unwrap();
        let second = client.sign("symbol=BTCUSDT&side=BUY").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        // a different payload signs differently
        let other = client.sign("symbol=ETHUSDT&side=BUY").unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_signed_query_appends_auth_params() {
        let client = test_client();
        let query = client
            .signed_query(vec![("symbol", "BTCUSDT".to_string())])
            .unwrap();
        assert!(query.starts_with("symbol=BTCUSDT&timestamp="));
        assert!(query.contains("&recvWindow=5000&"));
        assert!(query.contains("&signature="));
    }

    #[test]
    fn test_order_params_market() {
        let request = build_request(
            "NEWUSDT",
            OrderMode::Market,
            100.456,
            SymbolRules::default(),
        )
        .unwrap();
        let params = order_params(&request);
        assert_eq!(
            params,
            vec![
                ("symbol", "NEWUSDT".to_string()),
                ("side", "BUY".to_string()),
                ("type", "MARKET".to_string()),
                ("quoteOrderQty", "100.456".to_string()),
            ]
        );
    }

    #[test]
    fn test_order_params_limit() {
        let request = build_request(
            "NEWUSDT",
            OrderMode::Limit {
                price: Price::new(3.0001).unwrap(),
            },
            100.456,
            SymbolRules {
                quantity_precision: Some(3),
            },
        )
        .unwrap();
        let params = order_params(&request);
        assert_eq!(
            params,
            vec![
                ("symbol", "NEWUSDT".to_string()),
                ("side", "BUY".to_string()),
                ("type", "LIMIT".to_string()),
                ("quantity", "33.484".to_string()),
                ("price", "3.0001".to_string()),
                ("timeInForce", "GTC".to_string()),
            ]
        );
    }

    #[test]
    fn test_find_free_balance() {
        let account: AccountInfo = serde_json::from_str(
            r#"{"balances": [
                {"asset": "BTC", "free": "0.5", "locked": "0.0"},
                {"asset": "USDT", "free": "100.45600000", "locked": "12.0"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(find_free_balance(&account, "USDT").unwrap(), 100.456);
        assert_eq!(find_free_balance(&account, "DOGE").unwrap(), 0.0);
    }

    #[test]
    fn test_rules_from_exchange_info() {
        let info: ExchangeInfo = serde_json::from_str(
            r#"{"symbols": [{"filters": [
                {"filterType": "PRICE_FILTER", "tickSize": "0.00010000"},
                {"filterType": "LOT_SIZE", "minQty": "0.00100000", "stepSize": "0.00100000"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(
            rules_from_info(&info),
            SymbolRules {
                quantity_precision: Some(3)
            }
        );
    }

    #[test]
    fn test_rules_absent_without_lot_size_filter() {
        let info: ExchangeInfo = serde_json::from_str(
            r#"{"symbols": [{"filters": [
                {"filterType": "PRICE_FILTER", "tickSize": "0.00010000"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(rules_from_info(&info), SymbolRules::default());
    }

    #[test]
    fn test_api_error_body_decodes() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"code": -1121, "msg": "Invalid symbol."}"#).unwrap();
        assert_eq!(body.code, CODE_INVALID_SYMBOL);
        assert_eq!(body.msg, "Invalid symbol.");
    }

    #[test]
    fn test_server_time_decodes() {
        let time: ServerTime =
            serde_json::from_str(r#"{"serverTime": 1754520000123}"#).unwrap();
        assert_eq!(time.server_time, 1_754_520_000_123);
    }
}
