mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use hivestats_backend::router;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::{account, app_state, chain_globals, ScriptedTransport};

fn build_test_router(transport: ScriptedTransport) -> Router {
    router(app_state(transport))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn chain_time(hours_ago: i64) -> String {
    (Utc::now() - Duration::hours(hours_ago))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn history() -> Value {
    json!([
        [1, {
            "trx_id": "aa11",
            "block": 90000001,
            "timestamp": chain_time(1),
            "op": ["transfer", {"from": "alice", "to": "bob", "amount": "5.000 HIVE", "memo": ""}],
        }],
        [2, {
            "trx_id": "bb22",
            "block": 90000002,
            "timestamp": chain_time(2),
            "op": ["vote", {"voter": "bob", "author": "carol", "permlink": "post", "weight": -10000}],
        }],
        [3, {
            "trx_id": "cc33",
            "block": 80000000,
            "timestamp": chain_time(24 * 30),
            "op": ["transfer", {"from": "bob", "to": "dave", "amount": "1.000 HBD", "memo": ""}],
        }],
    ])
}

#[tokio::test]
async fn test_health() {
    let app = build_test_router(ScriptedTransport::new());
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_operations_incoming_transfer() {
    let transport = ScriptedTransport::new().with("condenser_api.get_account_history", history());
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/bob/operations?filter=in").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["filter"], "in");
    // The month-old transfer is outside the window
    assert_eq!(json["total_in_window"], 2);
    assert_eq!(json["count"], 1);

    let operation = &json["groups"][0]["operations"][0];
    assert_eq!(operation["transaction_id"], "aa11");
    assert_eq!(operation["direction"], "in");
    assert_eq!(operation["categories"], json!(["transfer"]));
    assert!(operation["description"].as_str().unwrap().contains("bob"));
    assert_eq!(json["filters"].as_array().unwrap().len(), 13);
}

#[tokio::test]
async fn test_operations_downvote_filter() {
    let transport = ScriptedTransport::new().with("condenser_api.get_account_history", history());
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/bob/operations?filter=downvotes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    let operation = &json["groups"][0]["operations"][0];
    assert_eq!(operation["direction"], "out");
    assert_eq!(operation["categories"], json!(["vote", "downvotes"]));
}

#[tokio::test]
async fn test_operations_rejects_unknown_filter_and_day() {
    let transport = ScriptedTransport::new().with("condenser_api.get_account_history", history());
    let app = build_test_router(transport);

    let (status, json) = get_json(app.clone(), "/api/accounts/bob/operations?filter=bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("bogus"));

    let (status, _) = get_json(app, "/api/accounts/bob/operations?day=lastweek").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_operations_upstream_failure() {
    let app = build_test_router(ScriptedTransport::new());
    let (status, json) = get_json(app, "/api/accounts/bob/operations").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_stats_unknown_account() {
    let transport = chain_globals(ScriptedTransport::new()).with("condenser_api.get_accounts", json!([]));
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/nobody/stats").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nobody"));
}

#[tokio::test]
async fn test_stats_with_failing_side_lookups() {
    // Reputation, RC, profile, votes and blog are not scripted and fail
    let transport = chain_globals(ScriptedTransport::new())
        .with("condenser_api.get_accounts", json!([account("alice")]));
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/alice/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["vote_value"], 2.0);
    assert_eq!(json["vote_value_display"], "$2.0000");
    assert_eq!(json["voting_power"], 100.0);
    assert_eq!(json["reputation"], 52);
    assert_eq!(json["followers"], 0);
    assert_eq!(json["post_count"], 12);
    assert_eq!(json["hive_power"]["own"], 500000.0);
}

#[tokio::test]
async fn test_vote_value_percent() {
    let transport = chain_globals(ScriptedTransport::new())
        .with("condenser_api.get_accounts", json!([account("alice")]));
    let app = build_test_router(transport);

    let (status, json) = get_json(app.clone(), "/api/accounts/alice/vote-value?percent=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["vote_value"], 1.0);

    let (_, json) = get_json(app.clone(), "/api/accounts/alice/vote-value?percent=150").await;
    assert_eq!(json["percent"], 100.0);
    assert_eq!(json["vote_value"], 2.0);

    let (_, json) = get_json(app, "/api/accounts/alice/vote-value").await;
    assert_eq!(json["percent"], 100.0);
}

#[tokio::test]
async fn test_balance() {
    let transport = chain_globals(ScriptedTransport::new())
        .with("condenser_api.get_accounts", json!([account("alice")]));
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/alice/balance").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hive"], 10.0);
    assert_eq!(json["hbd"], 5.0);
    assert_eq!(json["savings_usd"], 1.0);
    assert_eq!(json["total_usd"], 500016.0);
    assert_eq!(json["total_display"], "$500016.00");
}

#[tokio::test]
async fn test_delegations_fall_back_to_aggregate() {
    let mut alice = account("alice");
    alice["received_vesting_shares"] = json!("250.000000 VESTS");

    let transport = chain_globals(ScriptedTransport::new())
        .with("condenser_api.get_accounts", json!([alice]))
        .with("condenser_api.get_account_history", json!([]))
        .with(
            "condenser_api.get_vesting_delegations",
            json!([{
                "delegator": "alice",
                "delegatee": "carol",
                "vesting_shares": "100.000000 VESTS",
                "min_delegation_time": "2024-01-01T00:00:00",
            }]),
        );
    let app = build_test_router(transport);

    let (status, json) = get_json(app, "/api/accounts/alice/delegations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outgoing"].as_array().unwrap().len(), 1);
    assert_eq!(json["total_outgoing_hp"], 50.0);

    // Every candidate check only sees delegations to carol, so nothing is identified
    let incoming = json["incoming"].as_array().unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0]["kind"], "unidentified_aggregate");
    assert_eq!(incoming[0]["vesting_shares"], "250.000000 VESTS");
    assert_eq!(json["incoming_approximate"], true);
    assert_eq!(json["total_incoming_hp"], 125.0);
}
