//! Tests for the report workflow and the object URLs it manages
//!
//! These tests drive the download dialog state machine against a local mock
//! server, including concurrent requests and cancellation on close.

use std::sync::Arc;
use std::time::Duration;

use hospital_admin::{
    ApiError, Blob, Client, ClientConfig, ObjectUrlRegistry, ReportKind, ReportPhase,
    ReportWorkflow,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn workflow_for(client: &Client) -> ReportWorkflow {
    ReportWorkflow::new(
        client.patients(),
        client.object_urls().clone(),
        client.config().fallback_filename.clone(),
    )
}

async fn mount_report(server: &MockServer, route: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.7 report body".to_vec(), "application/pdf")
                .insert_header("Content-Disposition", "attachment; filename=\"leave.pdf\"")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Test suite for object URL bookkeeping
#[cfg(test)]
mod object_url_tests {
    use super::*;
    use bytes::Bytes;

    /// Test create, resolve and revoke
    #[test]
    fn test_registry_lifecycle() {
        // Arrange
        let registry = ObjectUrlRegistry::new();
        let blob = Blob::new(Bytes::from_static(b"abc"), "application/pdf");

        // Act
        let url = registry.create(blob.clone());

        // Assert
        assert!(url.as_str().starts_with("blob:"));
        assert_eq!(registry.resolve(&url), Some(blob));
        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url), "a URL is revoked only once");
        assert!(registry.resolve(&url).is_none());
        assert!(registry.is_empty());
    }

    /// Test that clones share one store and URLs are distinct
    #[test]
    fn test_registry_clones_share_entries() {
        let registry = ObjectUrlRegistry::new();
        let handle = registry.clone();

        let a = registry.create(Blob::new(Bytes::from_static(b"a"), "application/pdf"));
        let b = handle.create(Blob::new(Bytes::from_static(b"b"), "application/pdf"));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert!(handle.revoke(&a));
        assert_eq!(registry.len(), 1);
    }

    /// Test saving a blob to disk
    #[tokio::test]
    async fn test_blob_save_to() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sickleaves.pdf");
        let blob = Blob::new(Bytes::from_static(b"%PDF-1.4"), "application/pdf");

        blob.save_to(&target).await.unwrap();

        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"%PDF-1.4");
    }
}

/// Test suite for the download dialog state machine
#[cfg(test)]
mod workflow_tests {
    use super::*;

    /// Test a download that completes
    ///
    /// The completed state carries progress 100, the server filename and an
    /// object URL that resolves to the downloaded bytes.
    #[tokio::test]
    async fn test_generate_completes() {
        // Arrange
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::ZERO).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);

        // Act
        let state = workflow.generate("p1", ReportKind::Medical).await.unwrap();

        // Assert
        assert_eq!(state.phase, ReportPhase::Completed);
        assert!(state.is_completed());
        assert!(state.is_downloading, "dialog stays open until closed");
        assert_eq!(state.file_name, "leave.pdf");
        assert_eq!(state.report_kind, Some(ReportKind::Medical));
        let url = state.file_url.clone().unwrap();
        let blob = client.object_urls().resolve(&url).unwrap();
        assert!(blob.bytes().starts_with(b"%PDF"));
        assert_eq!(workflow.state(), state);
        assert!(!workflow.is_active());
    }

    /// Test that a second request while one is active is rejected
    #[tokio::test]
    async fn test_concurrent_request_rejected() {
        // Arrange: A slow report
        let server = MockServer::start().await;
        mount_report(&server, "/sick/p1", Duration::from_millis(500)).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = Arc::new(workflow_for(&client));
        let first = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.generate("p1", ReportKind::SickLeave).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Act
        let second = workflow.generate("p2", ReportKind::Medical).await;

        // Assert: The second fails, the first still completes
        assert!(matches!(second, Err(ApiError::DownloadInProgress)));
        let first = first.await.unwrap().unwrap();
        assert!(first.is_completed());
        assert_eq!(first.report_kind, Some(ReportKind::SickLeave));
    }

    /// Test that closing cancels the download in flight
    #[tokio::test]
    async fn test_close_cancels_in_flight_download() {
        // Arrange
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::from_secs(5)).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = Arc::new(workflow_for(&client));
        let running = {
            let workflow = workflow.clone();
            tokio::spawn(async move { workflow.generate("p1", ReportKind::Medical).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(workflow.is_active());
        assert_eq!(workflow.state().phase, ReportPhase::Requesting);

        // Act
        let revoked = workflow.close();

        // Assert: Nothing was revoked, the run ends cancelled, state is idle
        assert!(!revoked);
        let result = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("cancelled download should end promptly")
            .unwrap();
        assert!(matches!(result, Err(ApiError::Cancelled)));
        assert_eq!(workflow.state().phase, ReportPhase::Idle);
        assert!(client.object_urls().is_empty());
    }

    /// Test that closing twice revokes the URL once
    #[tokio::test]
    async fn test_close_revokes_once() {
        // Arrange
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::ZERO).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);
        workflow.generate("p1", ReportKind::Medical).await.unwrap();
        assert_eq!(client.object_urls().len(), 1);

        // Act
        let first = workflow.close();
        let second = workflow.close();

        // Assert
        assert!(first);
        assert!(!second);
        assert!(client.object_urls().is_empty());
        assert_eq!(workflow.state().progress, 0);
        assert!(workflow.state().file_url.is_none());
    }

    /// Test that a new request releases the previous report
    #[tokio::test]
    async fn test_new_request_revokes_previous_url() {
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::ZERO).await;
        mount_report(&server, "/sick/p1", Duration::ZERO).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);

        let first = workflow.generate("p1", ReportKind::Medical).await.unwrap();
        let second = workflow.generate("p1", ReportKind::SickLeave).await.unwrap();

        assert_ne!(first.file_url, second.file_url);
        assert_eq!(client.object_urls().len(), 1);
        assert!(client.object_urls().resolve(&first.file_url.unwrap()).is_none());
    }

    /// Test that a failed download resets the dialog
    #[tokio::test]
    async fn test_failure_resets_state() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/medical/p1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);

        // Act
        let result = workflow.generate("p1", ReportKind::Medical).await;

        // Assert
        assert!(matches!(result, Err(ApiError::Http { status: 500, .. })));
        let state = workflow.state();
        assert_eq!(state.phase, ReportPhase::Failed);
        assert!(!state.is_downloading);
        assert!(state.file_url.is_none());
        assert!(!workflow.is_active(), "a failed run frees the slot");
    }

    /// Test that dropping the workflow releases its report
    #[tokio::test]
    async fn test_drop_revokes_url() {
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::ZERO).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);
        workflow.generate("p1", ReportKind::Medical).await.unwrap();

        drop(workflow);

        assert!(client.object_urls().is_empty());
    }

    /// Test that subscribers observe the finished state
    #[tokio::test]
    async fn test_subscribers_see_completion() {
        let server = MockServer::start().await;
        mount_report(&server, "/medical/p1", Duration::ZERO).await;
        let client = Client::new(ClientConfig::new(server.uri())).unwrap();
        let workflow = workflow_for(&client);
        let mut updates = workflow.subscribe();

        workflow.generate("p1", ReportKind::Medical).await.unwrap();

        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().is_completed());
    }

    /// Serves one report body in paced chunks with a known length
    async fn serve_paced_report(chunks: Vec<Vec<u8>>, pause: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await.unwrap();

            let total: usize = chunks.iter().map(Vec::len).sum();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                total
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            for chunk in chunks {
                tokio::time::sleep(pause).await;
                socket.write_all(&chunk).await.unwrap();
                socket.flush().await.unwrap();
            }
        });
        format!("http://{}", addr)
    }

    /// Test the published progress of a chunked download
    ///
    /// Every state before completion is below 100 and never goes down;
    /// 100 appears only together with the object URL.
    #[tokio::test]
    async fn test_progress_ticks_before_completion() {
        // Arrange: 204 bytes in three paced chunks
        let base = serve_paced_report(
            vec![vec![b'%'; 100], vec![b'P'; 100], vec![b'F'; 4]],
            Duration::from_millis(50),
        )
        .await;
        let client = Client::new(ClientConfig::new(base)).unwrap();
        let workflow = workflow_for(&client);
        let mut updates = workflow.subscribe();
        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                let done = state.phase == ReportPhase::Completed;
                seen.push(state);
                if done {
                    break;
                }
            }
            seen
        });

        // Act
        let finished = workflow.generate("p1", ReportKind::Medical).await.unwrap();
        let seen = collector.await.unwrap();

        // Assert: Downloading ticks, capped and monotonic, then completion
        let (last, before) = seen.split_last().unwrap();
        assert_eq!(last, &finished);
        assert_eq!(last.progress, 100);
        assert!(last.file_url.is_some());

        let downloading: Vec<u8> = before
            .iter()
            .filter(|s| s.phase == ReportPhase::Downloading)
            .map(|s| s.progress)
            .collect();
        assert!(!downloading.is_empty(), "chunks should publish Downloading states");
        assert!(before.iter().all(|s| s.progress <= 99 && s.file_url.is_none()));
        assert!(
            before.windows(2).all(|w| w[0].progress <= w[1].progress),
            "progress must not go backwards"
        );
    }
}
