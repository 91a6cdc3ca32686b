//! Custom assertion macros
//!
//! Provides assertion macros for error response bodies and event streams.

/// Assert that a response carries the JSON error body `{"error", "status"}`
#[macro_export]
macro_rules! assert_error_body {
    ($response:expr, $status:expr, $message:expr) => {{
        let response = $response;
        assert_eq!(response.status_code(), $status);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], $message);
        assert_eq!(body["status"], $status.as_u16());
    }};
}

/// Await the next session event, failing the test after one second
#[macro_export]
macro_rules! next_event {
    ($session:expr) => {
        match tokio::time::timeout(std::time::Duration::from_secs(1), $session.next_event()).await {
            Ok(Some(event)) => event,
            Ok(None) => panic!("Session event stream ended"),
            Err(_) => panic!("Timed out waiting for a session event"),
        }
    };
}

/// Assert that no event arrives within a short window
#[macro_export]
macro_rules! assert_no_event {
    ($session:expr) => {
        if let Ok(event) =
            tokio::time::timeout(std::time::Duration::from_millis(100), $session.next_event()).await
        {
            panic!("Expected no event, got {:?}", event);
        }
    };
}
