//! Integration tests for the snapshot server

#[cfg(feature = "server")]
mod server_tests {
    use std::time::Duration;
    use strain_sensor_agent::server::{run, ServerConfig};
    use strain_sensor_agent::{Snapshot, SnapshotHub, SnapshotSink};

    fn snapshot(risk: u8) -> Snapshot {
        Snapshot {
            risk,
            pressure: 160.0,
            pressure_left_norm: 0.0,
            pressure_right_norm: 1.0,
            tilt: 700.0,
            heavy_press_norm: 0.1,
            static_hold_norm: 0.0,
            bursts_norm: 0.0,
            extreme_tilt_norm: 0.0,
            static_hold_streak_sec: 0,
            minutes_since_break: 0.0,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let hub = SnapshotHub::default();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), hub, "session-test")
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["session_id"], "session-test");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_snapshot_endpoint() {
        let hub = SnapshotHub::default();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), hub.clone(), "session-test")
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let url = format!("http://{}/snapshot", addr);

        // Nothing published yet
        let response = client.get(&url).send().await.expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

        hub.publish(&snapshot(42));

        let response = client.get(&url).send().await.expect("Failed to send request");
        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["risk"], 42);
        assert_eq!(body["pressure"], 160.0);
        assert_eq!(body["pressureRightNorm"], 1.0);
        assert_eq!(body["staticHoldStreakSec"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let hub = SnapshotHub::default();
        let (addr, shutdown_tx) = run(ServerConfig::new(0), hub, "session-test")
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/snapshot", addr))
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "GET")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );

        let _ = shutdown_tx.send(());
    }
}
