//! Order types and the order request model
//!
//! All quantities and prices are `Fixed`, so what the caller typed is
//! exactly what goes on the wire.

use crate::errors::{ExchangeError, Result};
use tradebot_core::Fixed;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
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

impl FromStr for OrderSide {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(ExchangeError::validation(format!("unknown order side {other:?}"))),
        }
    }
}

/// Futures order type
///
/// `Stop` and `TakeProfit` are stop-limit orders: they rest at `price`
/// once `stop_price` triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    TakeProfit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::TakeProfit => "TAKE_PROFIT",
        }
    }

    /// Types that rest on the book at a limit price
    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit | OrderType::Stop | OrderType::TakeProfit)
    }

    pub fn requires_stop_price(&self) -> bool {
        matches!(self, OrderType::Stop | OrderType::TakeProfit)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            "STOP" | "STOP_LIMIT" => Ok(OrderType::Stop),
            "TAKE_PROFIT" => Ok(OrderType::TakeProfit),
            other => Err(ExchangeError::validation(format!("unknown order type {other:?}"))),
        }
    }
}

/// Time in force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeInForce {
    #[default]
    #[serde(rename = "GTC")]
    GoodTillCanceled,
    #[serde(rename = "IOC")]
    ImmediateOrCancel,
    #[serde(rename = "FOK")]
    FillOrKill,
    /// Post-only
    #[serde(rename = "GTX")]
    GoodTillCrossing,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::GoodTillCanceled => "GTC",
            TimeInForce::ImmediateOrCancel => "IOC",
            TimeInForce::FillOrKill => "FOK",
            TimeInForce::GoodTillCrossing => "GTX",
        }
    }
}

impl std::fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeInForce {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GTC" => Ok(TimeInForce::GoodTillCanceled),
            "IOC" => Ok(TimeInForce::ImmediateOrCancel),
            "FOK" => Ok(TimeInForce::FillOrKill),
            "GTX" => Ok(TimeInForce::GoodTillCrossing),
            other => Err(ExchangeError::validation(format!("unknown time in force {other:?}"))),
        }
    }
}

/// An order to place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Fixed,
    pub price: Option<Fixed>,
    pub stop_price: Option<Fixed>,
    /// Only transmitted for types that require a price
    pub time_in_force: TimeInForce,
}

impl OrderRequest {
    pub fn new(symbol: &str, side: OrderSide, order_type: OrderType, quantity: Fixed) -> Self {
        Self {
            symbol: symbol.trim().to_ascii_uppercase(),
            side,
            order_type,
            quantity,
            price: None,
            stop_price: None,
            time_in_force: TimeInForce::default(),
        }
    }

    pub fn market(symbol: &str, side: OrderSide, quantity: Fixed) -> Self {
        Self::new(symbol, side, OrderType::Market, quantity)
    }

    pub fn limit(symbol: &str, side: OrderSide, quantity: Fixed, price: Fixed) -> Self {
        Self::new(symbol, side, OrderType::Limit, quantity).with_price(price)
    }

    pub fn stop_limit(
        symbol: &str,
        side: OrderSide,
        quantity: Fixed,
        price: Fixed,
        stop_price: Fixed,
    ) -> Self {
        Self::new(symbol, side, OrderType::Stop, quantity)
            .with_price(price)
            .with_stop_price(stop_price)
    }

    pub fn with_price(mut self, price: Fixed) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stop_price(mut self, stop_price: Fixed) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Check the order before anything is signed or sent
    pub fn validate(&self) -> Result<()> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(ExchangeError::validation("symbol must not be empty"));
        }
        if !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ExchangeError::validation(format!("invalid symbol {symbol:?}")));
        }

        if !self.quantity.is_positive() {
            return Err(ExchangeError::validation(format!(
                "quantity must be > 0, got {}",
                self.quantity
            )));
        }

        let order_type = self.order_type;
        match (order_type.requires_price(), self.price) {
            (true, None) => {
                return Err(ExchangeError::validation(format!("{order_type} orders require price")));
            }
            (false, Some(_)) => {
                return Err(ExchangeError::validation(format!("{order_type} orders do not take a price")));
            }
            (true, Some(price)) if !price.is_positive() => {
                return Err(ExchangeError::validation(format!("price must be > 0, got {price}")));
            }
            _ => {}
        }

        match (order_type.requires_stop_price(), self.stop_price) {
            (true, None) => {
                return Err(ExchangeError::validation(format!("{order_type} orders require stop price")));
            }
            (false, Some(_)) => {
                return Err(ExchangeError::validation(format!("{order_type} orders do not take a stop price")));
            }
            (true, Some(stop)) if !stop.is_positive() => {
                return Err(ExchangeError::validation(format!("stop price must be > 0, got {stop}")));
            }
            _ => {}
        }

        Ok(())
    }

    /// Wire parameters in transmission order, unset fields omitted
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("symbol".to_string(), self.symbol.trim().to_ascii_uppercase()),
            ("side".to_string(), self.side.to_string()),
            ("type".to_string(), self.order_type.to_string()),
            ("quantity".to_string(), self.quantity.to_wire_string()),
        ];

        if let Some(price) = self.price {
            params.push(("price".to_string(), price.to_wire_string()));
        }
        if self.order_type.requires_price() {
            params.push(("timeInForce".to_string(), self.time_in_force.to_string()));
        }
        if let Some(stop_price) = self.stop_price {
            params.push(("stopPrice".to_string(), stop_price.to_wire_string()));
        }

        params
    }
}
