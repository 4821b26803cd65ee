//! Daemon end to end: a local data API feeds the stores, reqwest reads them
//! back through the HTTP API.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use xahodd::{Config, Daemon, Environment};

fn order_json(utid: &str, status: &str, time: &str) -> Value {
    json!({
        "utid": utid,
        "trade_type": "sell",
        "status": status,
        "creation_time": time,
        "currency": "USDT",
        "currency_pair": "XAH/USDT",
        "price": "0.21",
        "quantity": "500",
        "platform": "bitrue",
        "automated": true,
        "notes": ""
    })
}

async fn spawn_data_api() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let app = Router::new()
        .route(
            "/data-api/rest/Order",
            get(|| async {
                Json(json!({
                    "value": [
                        order_json("A", "closed", "2024-02-03T00:00:00Z"),
                        order_json("B", "open", "2024-02-01T00:00:00Z"),
                        order_json("C", "closed", "2024-02-02T00:00:00Z"),
                    ]
                }))
            }),
        )
        .route("/data-api/rest/Transaction", get(|| async { Json(json!({ "value": [] })) }))
        .route("/data-api/rest/Transfer", get(|| async { Json(json!({ "value": [] })) }))
        .route(
            "/api/market",
            get(|| async { Json(json!({ "bitrue:xah": {"symbol": "XAH/USDT", "last": "0.21"} })) }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(addr)
}

fn daemon_config(data_api: SocketAddr) -> Config {
    let mut config = Config::test();
    config.environment = Environment::Development;
    config.data_api.base_url = Some(format!("http://{}", data_api));
    config
}

#[tokio::test]
async fn test_stores_served_from_data_api() -> anyhow::Result<()> {
    let data_api = spawn_data_api().await?;
    let daemon = Daemon::from_config(daemon_config(data_api))?;
    daemon.context().load_all().await?;
    let server = daemon.start_api_server().await?;
    let base = format!("http://{}", server.addr());
    let http = reqwest::Client::new();

    let health: Value = http.get(format!("{}/health", base)).send().await?.json().await?;
    assert_eq!(health["status"], "healthy");

    // default order screen: completed orders, oldest first
    let page: Value = http
        .get(format!("{}/orders?isActive=false&sortBy=creation_time&sortingOrder=asc", base))
        .send()
        .await?
        .json()
        .await?;
    let keys: Vec<&str> = page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["utid"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["C", "A"]);
    assert_eq!(page["pagination"]["total"], 2);

    let markets: Value = http.get(format!("{}/markets", base)).send().await?.json().await?;
    assert_eq!(markets["data"][0]["pair"], "XAH/USDT");

    server.stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_health_degraded_when_data_api_down() -> anyhow::Result<()> {
    // nothing listens on the discard port
    let daemon = Daemon::from_config(daemon_config("127.0.0.1:9".parse()?))?;
    let server = daemon.start_api_server().await?;

    let response = reqwest::get(format!("http://{}/health", server.addr())).await?;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let health: Value = response.json().await?;
    assert_eq!(health["status"], "degraded");

    let response = reqwest::get(format!("http://{}/orders/missing", server.addr())).await?;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await?;
    Ok(())
}
