//! Timed listing-buy utility for Binance.
//!
//! Waits until a target wall-clock instant, corrected for skew against the
//! exchange clock, then spends the account's free USDT balance on a single
//! buy order (market or limit).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
