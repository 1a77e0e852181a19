//! Gateway Module Tests
//!
//! Validates the poll loop and both transport implementations.
//!
//! ## Test Scopes
//! - **Poll loop**: One response per request, malformed-payload survival,
//!   idle timeouts, ordering.
//! - **Transports**: Channel round trip via the loop, UDP datagram round
//!   trip on loopback.
//! - **End to end**: Build, search and topn through the gateway against the
//!   in-process cluster.

#[cfg(test)]
mod tests {
    use crate::dispatch::RequestDispatcher;
    use crate::dispatch::protocol::{RequestStatus, ResponseEnvelope};
    use crate::gateway::gateway::Gateway;
    use crate::gateway::transport::{ChannelTransport, Transport, UdpTransport};
    use crate::index::IndexStore;
    use crate::index::store::{aggregated_path, corpus_path, metadata_path};
    use crate::index::types::{MetadataMap, PaperMetadata};
    use crate::pipeline::cluster::LocalCluster;
    use crate::pipeline::fetch::{AcquisitionReport, DocumentSource};
    use crate::query::types::{SearchResult, TopNResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Materializes a fixed corpus instead of talking to the scholar API.
    struct SeededSource {
        data_dir: PathBuf,
        docs: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl DocumentSource for SeededSource {
        async fn acquire(&self, _url: &str, index_id: &str) -> anyhow::Result<AcquisitionReport> {
            let corpus = corpus_path(&self.data_dir, index_id);
            fs::create_dir_all(&corpus)?;

            let mut metadata = MetadataMap::new();
            for (doc_id, words) in &self.docs {
                fs::write(
                    corpus.join(format!("{}.txt", doc_id)),
                    format!("{} {}", doc_id, words),
                )?;
                metadata.insert(
                    doc_id.to_string(),
                    PaperMetadata {
                        title: format!("Paper {}", doc_id),
                        citation: 3,
                        link: format!("https://example.org/document/{}", doc_id),
                    },
                );
            }
            fs::write(
                metadata_path(&self.data_dir, index_id),
                serde_json::to_string(&metadata)?,
            )?;
            Ok(AcquisitionReport {
                documents: self.docs.len(),
                skipped: 0,
            })
        }
    }

    /// Never produces anything; query-only tests must not reach it.
    struct NullSource;

    #[async_trait]
    impl DocumentSource for NullSource {
        async fn acquire(&self, _url: &str, _index_id: &str) -> anyhow::Result<AcquisitionReport> {
            anyhow::bail!("no acquisition in this test")
        }
    }

    fn gateway_over(
        dir: &Path,
        source: impl DocumentSource + 'static,
    ) -> (
        Gateway<ChannelTransport>,
        mpsc::Sender<Vec<u8>>,
        mpsc::Receiver<Vec<u8>>,
    ) {
        let dispatcher = RequestDispatcher::new(
            Arc::new(IndexStore::new(dir)),
            Arc::new(source),
            Arc::new(LocalCluster::new(dir)),
        );
        let (transport, request_tx, response_rx) = ChannelTransport::new(8);
        let gateway =
            Gateway::new(transport, dispatcher).with_poll_timeout(Duration::from_millis(20));
        (gateway, request_tx, response_rx)
    }

    fn seed_index(dir: &Path, index_id: &str, aggregated: &str, docs: &[&str]) {
        fs::write(aggregated_path(dir, index_id), aggregated).unwrap();
        let metadata: MetadataMap = docs
            .iter()
            .map(|doc_id| {
                (
                    doc_id.to_string(),
                    PaperMetadata {
                        title: format!("Paper {}", doc_id),
                        citation: 3,
                        link: format!("https://example.org/document/{}", doc_id),
                    },
                )
            })
            .collect();
        fs::write(
            metadata_path(dir, index_id),
            serde_json::to_string(&metadata).unwrap(),
        )
        .unwrap();
    }

    async fn send(request_tx: &mpsc::Sender<Vec<u8>>, payload: serde_json::Value) {
        request_tx
            .send(serde_json::to_vec(&payload).unwrap())
            .await
            .unwrap();
    }

    fn decode(payload: Vec<u8>) -> ResponseEnvelope {
        serde_json::from_slice(&payload).unwrap()
    }

    // ============================================================
    // POLL LOOP TESTS
    // ============================================================

    #[tokio::test]
    async fn test_gateway_answers_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        seed_index(dir.path(), "idx1", "cat\t2:d1,2\n", &["d1"]);
        let (gateway, request_tx, mut response_rx) = gateway_over(dir.path(), NullSource);

        send(
            &request_tx,
            json!({"request_id": "gw.1", "action": "search", "index_id": "idx1", "word": "cat"}),
        )
        .await;
        gateway.step().await;

        let response = decode(response_rx.recv().await.unwrap());
        assert_eq!(response.status, RequestStatus::Done);
        assert_eq!(response.request_id, "gw.1");
        assert!(
            response_rx.try_recv().is_err(),
            "exactly one response per request"
        );
    }

    #[tokio::test]
    async fn test_gateway_survives_malformed_payloads() {
        let dir = tempfile::tempdir().unwrap();
        seed_index(dir.path(), "idx1", "cat\t2:d1,2\n", &["d1"]);
        let (gateway, request_tx, mut response_rx) = gateway_over(dir.path(), NullSource);

        request_tx.send(b"{not json".to_vec()).await.unwrap();
        gateway.step().await;
        assert!(
            response_rx.try_recv().is_err(),
            "malformed payloads are dropped without a response"
        );

        // Valid envelope but missing required fields: also dropped.
        send(&request_tx, json!({"action": "search"})).await;
        gateway.step().await;
        assert!(response_rx.try_recv().is_err());

        // The loop is still alive and serving.
        send(
            &request_tx,
            json!({"request_id": "gw.2", "action": "search", "index_id": "idx1", "word": "cat"}),
        )
        .await;
        gateway.step().await;
        assert_eq!(decode(response_rx.recv().await.unwrap()).request_id, "gw.2");
    }

    #[tokio::test]
    async fn test_gateway_idle_poll_returns_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let (gateway, _request_tx, mut response_rx) = gateway_over(dir.path(), NullSource);

        gateway.step().await;
        assert!(response_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_gateway_preserves_request_order() {
        let dir = tempfile::tempdir().unwrap();
        seed_index(dir.path(), "idx1", "cat\t2:d1,2\n", &["d1"]);
        let (gateway, request_tx, mut response_rx) = gateway_over(dir.path(), NullSource);

        for i in 1..=3 {
            send(
                &request_tx,
                json!({
                    "request_id": format!("gw.{}", i),
                    "action": "search",
                    "index_id": "idx1",
                    "word": "cat"
                }),
            )
            .await;
        }
        for _ in 0..3 {
            gateway.step().await;
        }

        for i in 1..=3 {
            let response = decode(response_rx.recv().await.unwrap());
            assert_eq!(response.request_id, format!("gw.{}", i));
        }
    }

    #[tokio::test]
    async fn test_gateway_answers_unknown_action() {
        let dir = tempfile::tempdir().unwrap();
        let (gateway, request_tx, mut response_rx) = gateway_over(dir.path(), NullSource);

        send(
            &request_tx,
            json!({"request_id": "gw.9", "action": "drop_table", "index_id": "idx1"}),
        )
        .await;
        gateway.step().await;

        let response = decode(response_rx.recv().await.unwrap());
        assert_eq!(response.status, RequestStatus::Failed);
        assert_eq!(response.error.as_deref(), Some("unknown action: drop_table"));
    }

    // ============================================================
    // END TO END
    // ============================================================

    #[tokio::test]
    async fn test_gateway_build_then_query_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let (gateway, request_tx, mut response_rx) = gateway_over(
            dir.path(),
            SeededSource {
                data_dir: dir.path().to_path_buf(),
                docs: vec![("d1", "cat dog cat"), ("d2", "dog fish")],
            },
        );

        send(
            &request_tx,
            json!({
                "request_id": "gw.1",
                "action": "build_index",
                "index_id": "idx1",
                "url": "https://scholar.example.com/scholar?q=cats"
            }),
        )
        .await;
        gateway.step().await;
        let build = decode(response_rx.recv().await.unwrap());
        assert_eq!(build.status, RequestStatus::Done, "{:?}", build.error);
        assert_eq!(
            build.url.as_deref(),
            Some("https://scholar.example.com/scholar?q=cats")
        );

        send(
            &request_tx,
            json!({"request_id": "gw.2", "action": "search", "index_id": "idx1", "word": "cat"}),
        )
        .await;
        gateway.step().await;
        let search = decode(response_rx.recv().await.unwrap());
        assert_eq!(search.status, RequestStatus::Done);
        let payload: SearchResult = serde_json::from_value(search.data.unwrap()).unwrap();
        assert_eq!(payload.count, 2);
        assert_eq!(payload.result[0].doc_id, "d1");
        assert_eq!(payload.result[0].freq, 2);

        send(
            &request_tx,
            json!({"request_id": "gw.3", "action": "topn", "index_id": "idx1", "num": "2"}),
        )
        .await;
        gateway.step().await;
        let topn = decode(response_rx.recv().await.unwrap());
        assert_eq!(topn.status, RequestStatus::Done);
        let payload: TopNResult = serde_json::from_value(topn.data.unwrap()).unwrap();
        assert_eq!(payload.count, 2);
        // cat and dog tie at two occurrences; the tie breaks alphabetically.
        assert_eq!(payload.result[0].word, "cat");
        assert_eq!(payload.result[1].word, "dog");
    }

    // ============================================================
    // UDP TRANSPORT TESTS
    // ============================================================

    #[tokio::test]
    async fn test_udp_transport_round_trip_on_loopback() {
        let client = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client_addr = client.local_addr().unwrap();

        let transport = UdpTransport::bind("127.0.0.1:0".parse().unwrap(), client_addr)
            .await
            .unwrap();
        let server_addr = transport.local_addr().unwrap();

        assert!(
            transport
                .poll(Duration::from_millis(30))
                .await
                .unwrap()
                .is_none(),
            "idle poll times out with None"
        );

        client.send_to(b"ping-payload", server_addr).await.unwrap();
        let payload = transport
            .poll(Duration::from_secs(2))
            .await
            .unwrap()
            .expect("payload should arrive on loopback");
        assert_eq!(payload, b"ping-payload");

        transport.publish(b"pong").await.unwrap();
        transport.flush().await.unwrap();

        let mut buf = [0u8; 64];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"pong");
    }
}
