use crate::api::bitget::PLACE_ORDER_PATH;
use crate::api::{Exchange, ExchangeError, ExchangeResponse};
use crate::models::{OrderIntent, Side, TradeSide};
use reqwest::Method;
use std::sync::Arc;

/// Position transitions expressed as place-order calls.
///
/// Holds no view of the live position. `close_opposite` is sent whether or
/// not anything is open; the exchange treats a close on a flat book as a
/// rejected no-op. Sizes are fixed policy, not derived from the position.
pub struct PositionManager {
    exchange: Arc<dyn Exchange>,
    symbol: String,
    open_size: String,
    close_size: String,
}

impl PositionManager {
    pub fn new(
        exchange: Arc<dyn Exchange>,
        symbol: impl Into<String>,
        open_size: impl Into<String>,
        close_size: impl Into<String>,
    ) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            open_size: open_size.into(),
            close_size: close_size.into(),
        }
    }

    pub fn from_settings(exchange: Arc<dyn Exchange>, settings: &crate::Settings) -> Self {
        Self::new(
            exchange,
            &settings.symbol,
            &settings.open_size,
            &settings.close_size,
        )
    }

    /// Close whatever is held on the side opposite to `side`, the side about
    /// to be opened
    pub async fn close_opposite(&self, side: Side) -> Result<ExchangeResponse, ExchangeError> {
        let intent = OrderIntent::market(
            &self.symbol,
            &self.close_size,
            side.opposite(),
            TradeSide::Close,
        );
        tracing::info!(side = %intent.side, size = %intent.size, "Closing opposite position");
        self.submit(&intent).await
    }

    /// Open a new position on `side`
    pub async fn open(&self, side: Side) -> Result<ExchangeResponse, ExchangeError> {
        let intent = OrderIntent::market(&self.symbol, &self.open_size, side, TradeSide::Open);
        tracing::info!(side = %intent.side, size = %intent.size, "Opening position");
        self.submit(&intent).await
    }

    async fn submit(&self, intent: &OrderIntent) -> Result<ExchangeResponse, ExchangeError> {
        let payload = serde_json::to_value(intent)?;
        self.exchange
            .request(Method::POST, PLACE_ORDER_PATH, Some(&payload))
            .await
    }
}
