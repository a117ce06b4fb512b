//! Tests for `Transport`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::{HttpError, RetryPolicy, RetryableError, Transport, TransportError};
use crate::test_fixtures::{RecordingSleeper, ScriptedClient, api_base};

fn transport(
    script: ScriptedClient,
) -> (
    Arc<ScriptedClient>,
    RecordingSleeper,
    Transport<Arc<ScriptedClient>, RecordingSleeper>,
) {
    let mock = Arc::new(script);
    let sleeper = RecordingSleeper::default();
    let transport = Transport::new(Arc::clone(&mock), api_base()).with_sleeper(sleeper.clone());
    (mock, sleeper, transport)
}

mod urls {
    use super::*;

    #[test]
    fn path_is_appended_to_base_without_dropping_segments() {
        let (_, _, transport) = transport(ScriptedClient::new());

        let url = transport.endpoint_url("/recognition", &[]).unwrap();

        assert_eq!(url.as_str(), "https://api.example.com/facespace/recognition");
    }

    #[test]
    fn query_pairs_are_encoded_in_order() {
        let (_, _, transport) = transport(ScriptedClient::new());

        let url = transport
            .endpoint_url(
                "/logs",
                &[
                    ("start_time", "13:30 05/01/24".to_string()),
                    ("camera_id", "cam 1".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(
            url.query(),
            Some("start_time=13%3A30+05%2F01%2F24&camera_id=cam+1")
        );
    }

    #[test]
    fn empty_query_leaves_no_question_mark() {
        let (_, _, transport) = transport(ScriptedClient::new());

        let url = transport.endpoint_url("/logs", &[]).unwrap();

        assert_eq!(url.query(), None);
    }
}

mod success {
    use super::*;

    #[tokio::test]
    async fn returns_parsed_json() {
        let (_, _, transport) =
            transport(ScriptedClient::new().json(200, json!({ "events": [1, 2] })));

        let value = transport.get_json("/recognition", &[]).await.unwrap();

        assert_eq!(value, json!({ "events": [1, 2] }));
    }

    #[tokio::test]
    async fn sends_configured_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert("x-api-key", http::HeaderValue::from_static("secret"));
        let (mock, _, transport) = transport(ScriptedClient::new().json(200, json!({})));
        let transport = transport.with_headers(headers);

        transport.get_json("/recognition", &[]).await.unwrap();

        let requests = mock.api_requests();
        assert_eq!(requests[0].headers.get("x-api-key").unwrap(), "secret");
        assert_eq!(requests[0].method, http::Method::GET);
    }

    #[tokio::test]
    async fn every_call_increments_request_count() {
        let (_, _, transport) = transport(
            ScriptedClient::new()
                .json(200, json!({}))
                .json(404, json!({ "error": "missing" })),
        );

        transport.get_json("/recognition", &[]).await.unwrap();
        let _ = transport.get_json("/recognition", &[]).await;

        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn request_count_is_per_call_not_per_attempt() {
        let (mock, _, transport) = transport(
            ScriptedClient::new()
                .error(HttpError::Timeout)
                .json(200, json!({})),
        );

        transport.get_json("/recognition", &[]).await.unwrap();

        assert_eq!(mock.api_calls(), 2);
        assert_eq!(transport.request_count(), 1);
    }
}

mod retries {
    use super::*;

    #[tokio::test]
    async fn retries_retryable_status_then_succeeds() {
        let (mock, sleeper, transport) = transport(
            ScriptedClient::new()
                .json(503, json!({}))
                .json(502, json!({}))
                .json(200, json!({ "ok": true })),
        );

        let value = transport.get_json("/recognition", &[]).await.unwrap();

        assert_eq!(value, json!({ "ok": true }));
        assert_eq!(mock.api_calls(), 3);
        assert_eq!(
            sleeper.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn exhaustion_reports_attempts_and_last_cause() {
        let (mock, _, transport) = transport(
            ScriptedClient::new()
                .error(HttpError::Timeout)
                .json(500, json!({}))
                .error(HttpError::Timeout)
                .json(429, json!({})),
        );

        let error = transport.get_json("/recognition", &[]).await.unwrap_err();

        assert_eq!(mock.api_calls(), 4);
        match error {
            TransportError::Exhausted {
                attempts,
                last_error: RetryableError::NonSuccessStatus { status, .. },
                ..
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(status, http::StatusCode::TOO_MANY_REQUESTS);
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn honors_custom_attempt_ceiling() {
        let (mock, _, transport) = transport(
            ScriptedClient::new()
                .error(HttpError::Timeout)
                .error(HttpError::Timeout),
        );
        let transport = transport.with_retry_policy(RetryPolicy::new().with_max_attempts(2));

        let error = transport.get_json("/recognition", &[]).await.unwrap_err();

        assert!(matches!(error, TransportError::Exhausted { attempts: 2, .. }));
        assert_eq!(mock.api_calls(), 2);
    }

    #[tokio::test]
    async fn non_idempotent_method_is_not_retried() {
        let (mock, sleeper, transport) = transport(ScriptedClient::new().json(503, json!({})));

        let error = transport
            .request(http::Method::POST, "/recognition", &[])
            .await
            .unwrap_err();

        assert_eq!(mock.api_calls(), 1);
        assert!(sleeper.sleeps().is_empty());
        assert!(matches!(
            error,
            TransportError::RemoteRequestFailed { status, .. }
                if status == http::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn non_retryable_status_fails_immediately_with_server_message() {
        let (mock, _, transport) = transport(
            ScriptedClient::new().json(403, json!({ "error": "Invalid API key" })),
        );

        let error = transport.get_json("/recognition", &[]).await.unwrap_err();

        assert_eq!(mock.api_calls(), 1);
        match error {
            TransportError::RemoteRequestFailed { status, message } => {
                assert_eq!(status, http::StatusCode::FORBIDDEN);
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("expected RemoteRequestFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn error_message_falls_back_to_status_text() {
        let (_, _, transport) = transport(ScriptedClient::new().raw(404, "<html>nope</html>"));

        let error = transport.get_json("/recognition", &[]).await.unwrap_err();

        assert!(matches!(
            error,
            TransportError::RemoteRequestFailed { ref message, .. } if message == "404 Not Found"
        ));
    }
}

mod decoding {
    use super::*;

    #[tokio::test]
    async fn non_json_success_body_is_decode_error() {
        let (_, _, transport) = transport(ScriptedClient::new().raw(200, "not json"));

        let error = transport.get_json("/recognition", &[]).await.unwrap_err();

        assert!(matches!(error, TransportError::Decode { .. }));
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn request_opens_and_close_releases_once() {
        let (mock, _, transport) = transport(ScriptedClient::new().json(200, json!({})));
        assert!(!transport.is_open());

        transport.get_json("/recognition", &[]).await.unwrap();
        assert!(transport.is_open());

        transport.close();
        transport.close();

        assert!(!transport.is_open());
        assert_eq!(mock.closes(), 1);
    }

    #[tokio::test]
    async fn closed_transport_reopens_on_next_request() {
        let (_, _, transport) = transport(
            ScriptedClient::new()
                .json(200, json!({}))
                .json(200, json!({})),
        );

        transport.get_json("/recognition", &[]).await.unwrap();
        transport.close();
        transport.get_json("/recognition", &[]).await.unwrap();

        assert!(transport.is_open());
    }
}
