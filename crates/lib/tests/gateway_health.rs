//! Integration test: start the gateway on a free port, GET /, assert health JSON.
//! Does not require LINE or Gemini. The server task is left running when the test ends.

use relay::config::{Config, Credentials, DispatchMode};
use relay::gateway;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

async fn wait_for_health(url: &str) -> serde_json::Value {
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                return resp.json().await.expect("parse JSON");
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let port = free_port();
    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config, Credentials::default()).await;
    });

    let json = wait_for_health(&format!("http://127.0.0.1:{}/", port)).await;
    assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
    assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));
    assert_eq!(json.get("dispatch").and_then(|v| v.as_str()), Some("async"));
    assert_eq!(json.get("delivery").and_then(|v| v.as_str()), Some("push"));
    gateway_handle.abort();
}

#[tokio::test]
async fn gateway_acks_verification_ping_without_credentials() {
    let port = free_port();
    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.dispatch = DispatchMode::Inline;

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config, Credentials::default()).await;
    });
    wait_for_health(&format!("http://127.0.0.1:{}/", port)).await;

    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{}/line/webhook", port))
        .body(r#"{"destination":"Uxxxxxxxx","events":[]}"#)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.expect("body"), "{}");
    gateway_handle.abort();
}
