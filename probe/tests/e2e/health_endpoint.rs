//! E2E tests: reqwest health check against a throwaway local HTTP listener

use std::sync::Arc;
use std::time::Duration;

use mcp_probe::connect::{HealthEndpoint, HealthProbe, HttpHealthEndpoint, ProbeOutcome};
use mcp_probe::output::{CaptureOutput, StepStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one connection per status code, in order, then stop
async fn serve_statuses(statuses: Vec<u16>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        for status in statuses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {} Status\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/health", addr)
}

#[tokio::test]
async fn test_check_reports_status_codes() {
    let url = serve_statuses(vec![503, 200]).await;
    let endpoint = HttpHealthEndpoint::new().unwrap();

    assert_eq!(endpoint.check(&url).await, Ok(503));
    assert_eq!(endpoint.check(&url).await, Ok(200));
}

#[tokio::test]
async fn test_refused_connection_is_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = HttpHealthEndpoint::new().unwrap();
    let result = endpoint.check(&format!("http://{}/health", addr)).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_health_check_polls_until_ready() {
    let url = serve_statuses(vec![502, 503, 204]).await;
    let output = CaptureOutput::new();
    let probe = HealthProbe::new(
        Arc::new(HttpHealthEndpoint::new().unwrap()),
        Arc::new(output.clone()),
    );

    let outcome = probe.probe(&url, 6, Duration::from_millis(20)).await;

    assert_eq!(outcome, ProbeOutcome::Ready { attempts: 3 });
    let failed = output
        .steps()
        .iter()
        .filter(|s| s.status == StepStatus::Failed)
        .count();
    assert_eq!(failed, 2);
}
