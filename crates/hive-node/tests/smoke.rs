//! In-process smoke test for the Hive coordinator's RPC surface.
//!
//! Unlike a node binary that talks to a real Lightning host over a wire
//! protocol, the host-adapter boundary here is an in-process trait object,
//! so this test starts a real `RpcServer` directly against a fresh
//! `HiveStateDb` and drives it over HTTP JSON-RPC — no child process needed.

use std::net::TcpListener;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use hive_crypto::Identity;
use hive_governance::GovernanceMode;
use hive_hostadapter::MockHostAdapter;
use hive_rpc::{RpcServer, RpcServerState};
use hive_state::{FleetStateMap, HiveStateDb};

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

async fn rpc_call(client: &reqwest::Client, url: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
}

fn clock() -> Box<dyn Fn() -> hive_core::Timestamp + Send + Sync> {
    Box::new(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    })
}

/// Every real deployment is one `hive-node` process per member, each with
/// its own identity, all converging on a shared membership ledger via
/// gossip. This test stands in two such nodes sharing one in-process
/// `HiveStateDb` (simulating a fully-converged ledger) so that genesis and
/// join use genuinely distinct pubkeys without needing a real P2P transport.
#[tokio::test]
async fn smoke_genesis_invite_join_promote() {
    let data_dir = std::env::temp_dir().join(format!("hive_node_smoke_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let db = Arc::new(HiveStateDb::open(&data_dir).unwrap());
    let fleet_map = Arc::new(FleetStateMap::new());

    let admin_identity = Arc::new(Identity::generate());
    let admin_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        fleet_map: Arc::clone(&fleet_map),
        identity: admin_identity,
        hive_id: Arc::new(RwLock::new(None)),
        host: Arc::new(MockHostAdapter::new()),
        governance_mode: GovernanceMode::Advisor,
        bridge_status: "ok".into(),
        clock: clock(),
    });

    let candidate_identity = Arc::new(Identity::generate());
    let candidate_state = Arc::new(RpcServerState {
        db: Arc::clone(&db),
        fleet_map: Arc::clone(&fleet_map),
        identity: candidate_identity,
        hive_id: Arc::new(RwLock::new(None)),
        host: Arc::new(MockHostAdapter::new()),
        governance_mode: GovernanceMode::Advisor,
        bridge_status: "ok".into(),
        clock: clock(),
    });

    let admin_port = free_port();
    let admin_addr: std::net::SocketAddr = format!("127.0.0.1:{admin_port}").parse().unwrap();
    let admin_url = format!("http://127.0.0.1:{admin_port}");
    let _admin_handle = RpcServer::new(admin_state)
        .start(admin_addr)
        .await
        .expect("start admin RPC server");

    let candidate_port = free_port();
    let candidate_addr: std::net::SocketAddr = format!("127.0.0.1:{candidate_port}").parse().unwrap();
    let candidate_url = format!("http://127.0.0.1:{candidate_port}");
    let _candidate_handle = RpcServer::new(candidate_state)
        .start(candidate_addr)
        .await
        .expect("start candidate RPC server");

    let http = reqwest::Client::new();
    let url = admin_url;

    // Give the listeners a moment; jsonrpsee binds synchronously in `start`,
    // but the accept loop needs a tick to come up under load.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // ── Genesis ───────────────────────────────────────────────────────────
    let genesis = rpc_call(&http, &url, "hive_genesis", serde_json::json!([])).await;
    assert!(genesis["hive_id"].as_str().unwrap().len() == 32);

    let status = rpc_call(&http, &url, "hive_status", serde_json::json!([])).await;
    assert_eq!(status["status"], "ACTIVE");
    assert_eq!(status["members"]["admins"], 1);
    assert_eq!(status["members"]["total"], 1);

    // A second genesis must fail.
    let dup_body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "hive_genesis",
        "params": [],
        "id": 2
    });
    let dup_resp: serde_json::Value = http.post(&url).json(&dup_body).send().await.unwrap().json().await.unwrap();
    assert!(dup_resp.get("error").is_some(), "double genesis should be rejected");

    // ── Invite and join ──────────────────────────────────────────────────
    let invite = rpc_call(&http, &url, "hive_invite", serde_json::json!([24, 0])).await;
    let ticket_json = invite["ticket_json"].as_str().unwrap().to_string();

    let join = rpc_call(&http, &candidate_url, "hive_join", serde_json::json!([ticket_json])).await;
    assert_eq!(join["status"], "joined");

    let members = rpc_call(&http, &url, "hive_members", serde_json::json!([])).await;
    let members: Vec<serde_json::Value> = serde_json::from_value(members).unwrap();
    assert_eq!(members.len(), 2);
    assert!(members.iter().any(|m| m["tier"] == "Neophyte"));

    let _ = std::fs::remove_dir_all(&data_dir);
}
