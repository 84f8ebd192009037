//! End-to-end tests for the client holder: loading both modes, rotating
//! provider data, and what a remote backend actually receives.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use stackfront_core::config::{BackendConfig, ByokStore, RagConfig};
use stackfront_llm::client::{LibraryEngine, LibraryLoader};
use stackfront_llm::error::Result;
use stackfront_llm::{
    ClientError, ClientHandle, ClientHolder, ClientMode, ConfigEnricher, PROVIDER_DATA_HEADER,
    RemoteClient, RemoteOnly, SharedClientHolder,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct RecordingEngine {
    config_path: PathBuf,
}

impl LibraryEngine for RecordingEngine {
    fn config_path(&self) -> &Path {
        &self.config_path
    }
}

struct RecordingLoader;

impl LibraryLoader for RecordingLoader {
    async fn initialize(&self, config_path: &Path) -> Result<Arc<dyn LibraryEngine>> {
        Ok(Arc::new(RecordingEngine {
            config_path: config_path.to_path_buf(),
        }))
    }
}

async fn remote_holder(url: &str) -> ClientHolder {
    let holder = ClientHolder::new();
    holder
        .load(&BackendConfig::remote(url), &RemoteOnly)
        .await
        .expect("remote load");
    holder
}

fn seed_headers(holder: &ClientHolder, headers: BTreeMap<String, String>) -> ClientHandle {
    let loaded = holder.get().expect("loaded");
    let seeded = ClientHandle::from(loaded.as_remote().expect("remote").with_default_headers(headers));
    holder.set_client(seeded.clone());
    seeded
}

#[tokio::test]
async fn library_mode_with_byok_store_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("run.yaml");
    std::fs::write(
        &input,
        "version: 2\nproviders:\n  inference:\n    - provider_id: openai\n      provider_type: remote::openai\n",
    )
    .expect("write config");

    let rag = RagConfig {
        byok: vec![ByokStore {
            vector_db_id: "product_docs".to_string(),
            db_path: dir.path().join("docs.db"),
            embedding_model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            embedding_dimension: 768,
            provider_id: None,
        }],
        ..RagConfig::default()
    };
    let holder = ClientHolder::with_enricher(ConfigEnricher::new(rag).with_output_dir(dir.path()));
    holder
        .load(&BackendConfig::library(&input), &RecordingLoader)
        .await
        .expect("library load");

    assert_eq!(holder.mode(), Some(ClientMode::Library));
    let handle = holder.get().expect("loaded");
    let engine_config = handle.as_library().expect("library").engine().config_path().to_path_buf();
    assert_ne!(engine_config, input, "engine starts from the enriched copy");

    let enriched = std::fs::read_to_string(&engine_config).expect("read enriched");
    assert!(enriched.contains("product_docs"));
    assert!(enriched.contains("remote::openai"));

    let updated = holder
        .update_provider_data([("azure_api_key", "tok")])
        .expect("update");
    assert!(updated.same_client(&handle));
    assert_eq!(handle.provider_data().get("azure_api_key"), Some("tok"));
}

#[tokio::test]
async fn remote_rotation_keeps_other_headers_byte_identical() {
    let holder = remote_holder("http://localhost:8321").await;
    let mut headers = BTreeMap::new();
    headers.insert("X-Request-Source".to_string(), "api".to_string());
    headers.insert("X-Trace".to_string(), "abc; q=1".to_string());
    headers.insert(
        PROVIDER_DATA_HEADER.to_string(),
        r#"{"watsonx_project_id":"p-1"}"#.to_string(),
    );
    let seeded = seed_headers(&holder, headers.clone());

    let updated = holder
        .update_provider_data([("watsonx_api_key", "k-2")])
        .expect("update");

    assert!(!updated.same_client(&seeded));
    let remote = updated.as_remote().expect("remote");
    for name in ["X-Request-Source", "X-Trace"] {
        assert_eq!(remote.default_headers()[name], headers[name]);
    }
    let data = updated.provider_data();
    assert_eq!(data.get("watsonx_project_id"), Some("p-1"));
    assert_eq!(data.get("watsonx_api_key"), Some("k-2"));
}

#[tokio::test]
async fn handles_taken_before_rotation_keep_old_credentials() {
    let holder = remote_holder("http://localhost:8321").await;
    holder.update_provider_data([("azure_api_key", "old")]).expect("first");
    let in_flight = holder.get().expect("loaded");

    holder.update_provider_data([("azure_api_key", "new")]).expect("second");

    assert_eq!(in_flight.provider_data().get("azure_api_key"), Some("old"));
    assert_eq!(
        holder.get().expect("loaded").provider_data().get("azure_api_key"),
        Some("new")
    );
}

#[tokio::test]
async fn missing_library_path_is_a_configuration_error() {
    let holder = ClientHolder::new();
    let config = BackendConfig {
        use_as_library_client: true,
        ..BackendConfig::default()
    };
    let err = holder.load(&config, &RecordingLoader).await.expect_err("no path");
    assert!(matches!(err, ClientError::Configuration(_)));
    assert!(matches!(holder.get(), Err(ClientError::Uninitialized)));
}

#[tokio::test]
async fn remote_without_url_uses_local_default() {
    let holder = ClientHolder::new();
    holder
        .load(&BackendConfig::default(), &RemoteOnly)
        .await
        .expect("remote load");
    let handle = holder.get().expect("loaded");
    assert_eq!(handle.as_remote().expect("remote").base_url(), "http://localhost:8321");
}

#[tokio::test]
async fn concurrent_updates_lose_no_keys() {
    let holder: SharedClientHolder = Arc::new(remote_holder("http://localhost:8321").await);

    let threads: Vec<_> = (0..8)
        .map(|t| {
            let holder = Arc::clone(&holder);
            std::thread::spawn(move || {
                for i in 0..25 {
                    holder
                        .update_provider_data([(format!("key_{t}_{i}"), format!("{t}:{i}"))])
                        .expect("update");
                }
            })
        })
        .collect();
    for thread in threads {
        thread.join().expect("thread");
    }

    let data = holder.get().expect("loaded").provider_data();
    assert_eq!(data.len(), 8 * 25);
    assert_eq!(data.get("key_7_24"), Some("7:24"));
}

/// What the stub backend received: lowercased request head, raw body.
struct Captured {
    head: String,
    body: String,
}

/// Accept one connection, answer it with `reply` as a JSON body and hand
/// back the request.
async fn serve_once(reply: &'static str) -> (SocketAddr, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        let head_end = loop {
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut buf).await.expect("read");
            assert!(n > 0, "connection closed before headers");
            request.extend_from_slice(&buf[..n]);
        };
        let head = String::from_utf8_lossy(&request[..head_end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map_or(0, |len| len.trim().parse::<usize>().expect("content length"));
        while request.len() < head_end + body_len {
            let n = socket.read(&mut buf).await.expect("read body");
            assert!(n > 0, "connection closed before body");
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{reply}",
            reply.len()
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        Captured {
            head,
            body: String::from_utf8_lossy(&request[head_end..]).into_owned(),
        }
    });
    (addr, server)
}

#[tokio::test]
async fn remote_requests_carry_provider_data_header() {
    let (addr, server) = serve_once(r#"{"status":"OK"}"#).await;

    let holder = remote_holder(&format!("http://{addr}")).await;
    let handle = holder
        .update_provider_data([("azure_api_key", "tok")])
        .expect("update");
    let body = handle
        .as_remote()
        .expect("remote")
        .get_json("v1/health")
        .await
        .expect("health");
    assert_eq!(body["status"], "OK");

    let request = server.await.expect("server task");
    assert!(request.head.starts_with("get /v1/health "));
    assert!(request.head.contains(r#"x-llamastack-provider-data: {"azure_api_key":"tok"}"#));
}

#[tokio::test]
async fn post_json_sends_body_and_headers() {
    let (addr, server) = serve_once(r#"{"output_message":{"content":"Hi"}}"#).await;

    let holder = ClientHolder::new();
    holder
        .load(
            &BackendConfig::remote(format!("http://{addr}/")).with_api_key("sk-test"),
            &RemoteOnly,
        )
        .await
        .expect("remote load");
    let handle = holder
        .update_provider_data([("watsonx_api_key", "k-1")])
        .expect("update");

    let request_body = serde_json::json!({"model_id": "granite-3", "messages": [{"role": "user", "content": "Hello"}]});
    let reply = handle
        .as_remote()
        .expect("remote")
        .post_json("/v1/inference/chat-completion", &request_body)
        .await
        .expect("chat completion");
    assert_eq!(reply["output_message"]["content"], "Hi");

    let request = server.await.expect("server task");
    assert!(request.head.starts_with("post /v1/inference/chat-completion "));
    assert!(request.head.contains("authorization: bearer sk-test"));
    assert!(request.head.contains("content-type: application/json"));
    assert!(request.head.contains(r#"x-llamastack-provider-data: {"watsonx_api_key":"k-1"}"#));
    let sent: serde_json::Value = serde_json::from_str(&request.body).expect("json body");
    assert_eq!(sent, request_body);
}

#[tokio::test]
async fn timeout_reports_configured_limit() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let client = RemoteClient::new(format!("http://{addr}"), None, Duration::from_millis(100))
        .expect("build client");
    let err = client.get_json("v1/health").await.expect_err("no answer");
    server.abort();

    assert!(matches!(err, ClientError::Timeout(100)), "got {err:?}");
    assert!(err.to_string().contains("100ms"));
}

proptest! {
    #[test]
    fn remote_merge_matches_map_semantics(
        initial in prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,8}", 0..6),
        updates in prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{0,8}", 0..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let holder = runtime.block_on(remote_holder("http://localhost:8321"));

        let mut headers = BTreeMap::new();
        headers.insert(
            PROVIDER_DATA_HEADER.to_string(),
            serde_json::to_string(&initial).expect("encode"),
        );
        seed_headers(&holder, headers);

        let updated = holder.update_provider_data(updates.clone()).expect("update");

        let mut expected = initial.clone();
        expected.extend(updates);
        let data = updated.provider_data();
        prop_assert_eq!(data.len(), expected.len());
        for (k, v) in &expected {
            prop_assert_eq!(data.get(k), Some(v.as_str()));
        }
    }
}
