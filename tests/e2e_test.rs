use ::config::Map;
use mockito::{Matcher, Mock, Server, ServerGuard};
use rsibot::api::bitget::PLACE_ORDER_PATH;
use rsibot::api::{http_client, BitgetClient, GroqAdvisor, TaapiClient};
use rsibot::execution::{CycleError, CycleScheduler, PositionManager};
use rsibot::{CycleOutcome, Settings, Side};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_test::assert_ok;

/// One mock server per upstream: indicator, advisor, exchange
struct Upstreams {
    taapi: ServerGuard,
    groq: ServerGuard,
    bitget: ServerGuard,
}

impl Upstreams {
    async fn start() -> Self {
        let _ = tracing_subscriber::fmt::try_init();
        Self {
            taapi: Server::new_async().await,
            groq: Server::new_async().await,
            bitget: Server::new_async().await,
        }
    }

    fn settings(&self) -> Settings {
        let mut vars = Map::new();
        for (key, value) in [
            ("BITGET_API_KEY", "bg-key"),
            ("BITGET_SECRET", "bg-secret"),
            ("BITGET_PASSPHRASE", "bg-pass"),
            ("GROQ_API_KEY", "gsk-test"),
            ("TAAPI_SECRET", "taapi-secret"),
            ("HTTP_TIMEOUT_SECS", "5"),
        ] {
            vars.insert(key.to_string(), value.to_string());
        }
        vars.insert("TAAPI_BASE_URL".to_string(), self.taapi.url());
        vars.insert("GROQ_BASE_URL".to_string(), self.groq.url());
        vars.insert("BITGET_BASE_URL".to_string(), self.bitget.url());

        Settings::from_source(Some(vars)).expect("test settings are valid")
    }

    /// Wire the real clients against the mock servers, single cycle budget
    fn scheduler(&self) -> (watch::Sender<bool>, CycleScheduler) {
        let settings = self.settings();
        let http = http_client(settings.http_timeout()).unwrap();

        let exchange = Arc::new(BitgetClient::new(
            http.clone(),
            &settings.bitget_base_url,
            settings.credentials(),
            settings.paper_trading,
        ));
        let indicator = Arc::new(TaapiClient::from_settings(http.clone(), &settings));
        let advisor = Arc::new(GroqAdvisor::from_settings(http, &settings));
        let positions = PositionManager::from_settings(exchange, &settings);

        let (tx, rx) = watch::channel(false);
        let scheduler =
            CycleScheduler::new(indicator, advisor, positions, settings.cycle_interval(), rx)
                .with_max_cycles(1);
        (tx, scheduler)
    }

    async fn indicator_returns(&mut self, status: usize, body: &str) -> Mock {
        self.taapi
            .mock("GET", "/rsi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("secret".into(), "taapi-secret".into()),
                Matcher::UrlEncoded("exchange".into(), "binance".into()),
                Matcher::UrlEncoded("symbol".into(), "ETH/USDT".into()),
                Matcher::UrlEncoded("interval".into(), "5m".into()),
            ]))
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    async fn advisor_replies(&mut self, content: &str) -> Mock {
        self.groq
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer gsk-test")
            .with_status(200)
            .with_body(
                json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
                    .to_string(),
            )
            .create_async()
            .await
    }

    /// Any place-order call; used to assert that nothing was sent
    async fn no_orders(&mut self) -> Mock {
        self.bitget
            .mock("POST", PLACE_ORDER_PATH)
            .expect(0)
            .create_async()
            .await
    }
}

#[tokio::test]
async fn test_oversold_buy_closes_short_then_opens_long() {
    let mut upstreams = Upstreams::start().await;

    let indicator = upstreams.indicator_returns(200, r#"{"value": 25.0}"#).await;
    let advisor = upstreams.advisor_replies("BUY").await;

    let close = upstreams
        .bitget
        .mock("POST", PLACE_ORDER_PATH)
        .match_header("paptrading", "1")
        .match_header("ACCESS-KEY", "bg-key")
        .match_body(Matcher::PartialJson(json!({
            "symbol": "ETHUSDT",
            "productType": "USDT-FUTURES",
            "side": "sell",
            "tradeSide": "close",
            "size": "1000"
        })))
        .with_status(400)
        .with_body(r#"{"code":"22002","msg":"No position to close"}"#)
        .expect(1)
        .create_async()
        .await;
    let open = upstreams
        .bitget
        .mock("POST", PLACE_ORDER_PATH)
        .match_header("paptrading", "1")
        .match_body(Matcher::PartialJson(json!({
            "symbol": "ETHUSDT",
            "side": "buy",
            "tradeSide": "open",
            "size": "0.05",
            "orderType": "market"
        })))
        .with_status(200)
        .with_body(r#"{"code":"00000","msg":"success","data":{"orderId":"42"}}"#)
        .expect(1)
        .create_async()
        .await;

    let (_shutdown, scheduler) = upstreams.scheduler();
    let outcome = assert_ok!(scheduler.run_cycle(1).await);

    assert_eq!(outcome, CycleOutcome::Acted(Side::Buy));
    indicator.assert_async().await;
    advisor.assert_async().await;
    close.assert_async().await;
    open.assert_async().await;
}

#[tokio::test]
async fn test_indicator_outage_skips_cycle() {
    let mut upstreams = Upstreams::start().await;

    let _indicator = upstreams
        .indicator_returns(500, r#"{"error":"upstream down"}"#)
        .await;
    let advisor = upstreams
        .groq
        .mock("POST", "/chat/completions")
        .expect(0)
        .create_async()
        .await;
    let orders = upstreams.no_orders().await;

    let (_shutdown, mut scheduler) = upstreams.scheduler();
    let completed = assert_ok!(scheduler.run().await);

    // A skipped cycle still counts toward the budget
    assert_eq!(completed, 1);
    advisor.assert_async().await;
    orders.assert_async().await;
}

#[tokio::test]
async fn test_advisor_auth_failure_means_nothing() {
    let mut upstreams = Upstreams::start().await;

    let _indicator = upstreams.indicator_returns(200, r#"{"value": 80.0}"#).await;
    let _advisor = upstreams
        .groq
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Invalid API Key"}}"#)
        .create_async()
        .await;
    let orders = upstreams.no_orders().await;

    let (_shutdown, scheduler) = upstreams.scheduler();
    let outcome = assert_ok!(scheduler.run_cycle(1).await);

    assert_eq!(outcome, CycleOutcome::SkippedNothing);
    orders.assert_async().await;
}

#[tokio::test]
async fn test_chatty_advisor_reply_means_nothing() {
    let mut upstreams = Upstreams::start().await;

    let _indicator = upstreams.indicator_returns(200, r#"{"value": 75.0}"#).await;
    let _advisor = upstreams.advisor_replies("SELL please, I'm confident").await;
    let orders = upstreams.no_orders().await;

    let (_shutdown, scheduler) = upstreams.scheduler();
    let outcome = assert_ok!(scheduler.run_cycle(1).await);

    assert_eq!(outcome, CycleOutcome::SkippedNothing);
    orders.assert_async().await;
}

#[tokio::test]
async fn test_overbought_sell_closes_long_then_opens_short() {
    let mut upstreams = Upstreams::start().await;

    let _indicator = upstreams.indicator_returns(200, r#"{"value": 78.4}"#).await;
    let _advisor = upstreams.advisor_replies(" sell\n").await;

    let close = upstreams
        .bitget
        .mock("POST", PLACE_ORDER_PATH)
        .match_body(Matcher::PartialJson(
            json!({"side": "buy", "tradeSide": "close", "size": "1000"}),
        ))
        .with_status(200)
        .with_body(r#"{"code":"00000"}"#)
        .expect(1)
        .create_async()
        .await;
    let open = upstreams
        .bitget
        .mock("POST", PLACE_ORDER_PATH)
        .match_body(Matcher::PartialJson(
            json!({"side": "sell", "tradeSide": "open", "size": "0.05"}),
        ))
        .with_status(200)
        .with_body(r#"{"code":"00000"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_shutdown, mut scheduler) = upstreams.scheduler();
    let completed = assert_ok!(scheduler.run().await);

    assert_eq!(completed, 1);
    close.assert_async().await;
    open.assert_async().await;
}

#[tokio::test]
async fn test_exchange_unreachable_stops_loop() {
    let mut upstreams = Upstreams::start().await;

    let _indicator = upstreams.indicator_returns(200, r#"{"value": 20.0}"#).await;
    let _advisor = upstreams.advisor_replies("BUY").await;

    let settings = upstreams.settings();
    let http = http_client(settings.http_timeout()).unwrap();
    // Nothing listens on the discard port
    let exchange = Arc::new(BitgetClient::new(
        http.clone(),
        "http://127.0.0.1:9",
        settings.credentials(),
        true,
    ));
    let positions = PositionManager::from_settings(exchange, &settings);
    let (_tx, rx) = watch::channel(false);
    let mut scheduler = CycleScheduler::new(
        Arc::new(TaapiClient::from_settings(http.clone(), &settings)),
        Arc::new(GroqAdvisor::from_settings(http, &settings)),
        positions,
        settings.cycle_interval(),
        rx,
    )
    .with_max_cycles(3);

    let result = scheduler.run().await;
    assert!(matches!(
        result,
        Err(CycleError::Order { side: Side::Buy, .. })
    ));
}
