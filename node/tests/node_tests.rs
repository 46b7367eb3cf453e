//! Full-stack tests: LMDB on disk, a real socket, raw HTTP/1.1.

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use votatoon_node::{NodeConfig, NodeError, VoteNode};
use votatoon_nullables::RaceFixture;
use votatoon_votes::ContestantVoteLedger;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn config(dir: &Path) -> NodeConfig {
    NodeConfig {
        data_dir: dir.to_path_buf(),
        map_size_mb: 16,
        rpc_bind: "127.0.0.1".parse().unwrap(),
        rpc_port: 0,
        enable_metrics: true,
        ..Default::default()
    }
}

async fn request(addr: std::net::SocketAddr, head: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let raw = format!("{head}\r\nHost: localhost\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn start(node: &Arc<VoteNode>) -> (std::net::SocketAddr, tokio::task::JoinHandle<Result<(), NodeError>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let serving = Arc::clone(node);
    let handle = tokio::spawn(async move { serving.serve(listener).await });
    (addr, handle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn serves_votes_and_races_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let node = Arc::new(VoteNode::new(config(dir.path())).unwrap());
    RaceFixture::active(7)
        .with_totals(30, 10)
        .seed(node.store.as_ref())
        .unwrap();
    let (addr, handle) = start(&node).await;

    let response = request(addr, "POST /votes/b HTTP/1.1\r\nx-client-id: alice").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.contains("The vote has been cast"));

    let response = request(addr, "POST /votes/a HTTP/1.1\r\nx-client-id: bob").await;
    assert!(response.starts_with("HTTP/1.1 409"), "{response}");
    assert!(response.contains("EXISTING_VOTE"));

    let response = request(addr, "GET /races/current HTTP/1.1").await;
    assert!(response.contains(r#""bVotesTotal":11"#), "{response}");

    let response = request(addr, "GET /metrics HTTP/1.1").await;
    assert!(response.contains("votatoon_votes_cast_total 1"), "{response}");

    node.stop();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn votes_persist_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = RaceFixture::active(4);
    {
        let node = Arc::new(VoteNode::new(config(dir.path())).unwrap());
        fixture.seed(node.store.as_ref()).unwrap();
        let (addr, handle) = start(&node).await;
        let response = request(addr, "POST /votes/a HTTP/1.1\r\nx-client-id: alice").await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");
        node.stop();
        handle.await.unwrap().unwrap();
    }

    let node = VoteNode::new(config(dir.path())).unwrap();
    let totals = ContestantVoteLedger
        .read_totals(node.store.as_ref(), fixture.race_id)
        .unwrap();
    assert_eq!((totals.a_total(), totals.b_total()), (1, 0));
}

#[test]
fn refuses_damaged_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("lock.mdb"), b"").unwrap();
    let err = VoteNode::new(config(dir.path())).err().expect("must fail");
    assert!(matches!(err, NodeError::DataDir(_)));
}

#[test]
fn refuses_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let bad = NodeConfig {
        log_format: "yaml".into(),
        ..config(dir.path())
    };
    assert!(matches!(VoteNode::new(bad), Err(NodeError::Config(_))));
}
