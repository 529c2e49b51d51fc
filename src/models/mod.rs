use serde::Serialize;
use std::fmt;

pub const PRODUCT_TYPE: &str = "USDT-FUTURES";
pub const MARGIN_MODE: &str = "isolated";
pub const MARGIN_COIN: &str = "USDT";
pub const ORDER_TYPE: &str = "market";
pub const TIME_IN_FORCE: &str = "gtc";

/// Exchange API credentials, supplied once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub passphrase: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Order direction
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Whether an order opens a new position or closes an existing one
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Open,
    Close,
}

/// Body of a place-order call. Field order matters: it is the order of the
/// keys inside the signed JSON body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub symbol: String,
    pub product_type: String,
    pub margin_mode: String,
    pub margin_coin: String,
    pub size: String,
    pub side: Side,
    pub trade_side: TradeSide,
    pub order_type: String,
    pub force: String,
}

impl OrderIntent {
    /// Isolated-margin market order on USDT futures
    pub fn market(symbol: &str, size: &str, side: Side, trade_side: TradeSide) -> Self {
        Self {
            symbol: symbol.to_string(),
            product_type: PRODUCT_TYPE.to_string(),
            margin_mode: MARGIN_MODE.to_string(),
            margin_coin: MARGIN_COIN.to_string(),
            size: size.to_string(),
            side,
            trade_side,
            order_type: ORDER_TYPE.to_string(),
            force: TIME_IN_FORCE.to_string(),
        }
    }
}

/// Indicator sample for one cycle, never cached
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorReading {
    Value(f64),
    Unavailable,
}

/// Advisor recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Buy,
    Sell,
    Nothing,
}

impl Decision {
    /// Map free-text model output to a decision.
    ///
    /// Only an exact `BUY` or `SELL` (after trimming and uppercasing) is
    /// actionable; anything else, including replies that merely start with
    /// one of them, is `Nothing`.
    pub fn from_reply(reply: &str) -> Self {
        match reply.trim().to_uppercase().as_str() {
            "BUY" => Decision::Buy,
            "SELL" => Decision::Sell,
            _ => Decision::Nothing,
        }
    }

    /// Side to trade, if the decision is actionable
    pub fn side(self) -> Option<Side> {
        match self {
            Decision::Buy => Some(Side::Buy),
            Decision::Sell => Some(Side::Sell),
            Decision::Nothing => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => write!(f, "BUY"),
            Decision::Sell => write!(f, "SELL"),
            Decision::Nothing => write!(f, "NOTHING"),
        }
    }
}

/// What a single cycle ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Close and open were both submitted for this side
    Acted(Side),
    SkippedNoIndicator,
    SkippedNothing,
    /// Shutdown was observed at a state boundary
    Cancelled,
}
