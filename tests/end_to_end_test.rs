//! End-to-end flow over a real TCP listener
//!
//! initialize -> tools/call (login required) -> web login -> tools/call (served)

mod common;

use serde_json::{json, Value};

use common::{app_state, data_dir, ALLOWED, NET_WORTH};
use toolgate::server::router;

#[tokio::test]
async fn test_login_flow_over_http() {
    let data = data_dir();
    let (state, _) = app_state(&data);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let mcp_url = format!("http://{}/mcp", addr);

    let response = client
        .post(&mcp_url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {
                "protocolVersion": "2025-03-26",
                "capabilities": {},
                "clientInfo": {"name": "e2e", "version": "1.0.0"}
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let session = response
        .headers()
        .get("mcp-session-id")
        .expect("session header")
        .to_str()
        .unwrap()
        .to_string();
    let init: Value = response.json().await.unwrap();
    assert_eq!(init["result"]["protocolVersion"], "2025-03-26");

    let call = json!({
        "jsonrpc": "2.0",
        "id": 2,
        "method": "tools/call",
        "params": {"name": "fetch_net_worth"}
    });

    let body: Value = client
        .post(&mcp_url)
        .header("mcp-session-id", &session)
        .json(&call)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let payload: Value =
        serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(payload["status"], "login_required");
    let login_url = payload["login_url"].as_str().unwrap();
    assert!(login_url.ends_with(&format!("sessionId={}", session)));

    let page = client
        .get(format!("http://{}/mockWebPage?sessionId={}", addr, session))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), 200);

    let login = client
        .post(format!("http://{}/login", addr))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(format!("sessionId={}&phoneNumber={}", session, ALLOWED))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);

    let body: Value = client
        .post(&mcp_url)
        .header("mcp-session-id", &session)
        .json(&call)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["content"][0]["text"], NET_WORTH);

    handle.abort();
}
