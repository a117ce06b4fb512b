//! Tests for HTTP request/response types.

use super::{HttpRequest, HttpResponse};

mod http_request {
    use super::*;

    #[test]
    fn new_creates_request_with_method_and_url() {
        let url = url::Url::parse("https://example.com/api").unwrap();
        let req = HttpRequest::new(http::Method::PUT, url.clone());

        assert_eq!(req.method, http::Method::PUT);
        assert_eq!(req.url, url);
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn with_json_sets_body_and_content_type() {
        let url = url::Url::parse("https://hooks.example.com/in").unwrap();
        let req = HttpRequest::post(url)
            .with_json(&serde_json::json!({ "camera_id": "cam-1" }))
            .unwrap();

        assert_eq!(
            req.headers.get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(req.body, Some(br#"{"camera_id":"cam-1"}"#.to_vec()));
    }

    #[test]
    fn with_json_survives_header_replacement_order() {
        let mut headers = http::HeaderMap::new();
        headers.insert("x-tenant", http::HeaderValue::from_static("acme"));
        let url = url::Url::parse("https://hooks.example.com/in").unwrap();

        let req = HttpRequest::post(url)
            .with_headers(&headers)
            .with_json(&serde_json::json!([]))
            .unwrap();

        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn with_headers_copies_the_map() {
        let mut headers = http::HeaderMap::new();
        headers.insert("x-api-key", http::HeaderValue::from_static("k"));
        let url = url::Url::parse("https://example.com/").unwrap();

        let req = HttpRequest::post(url)
            .with_headers(&headers)
            .with_body(b"{}".to_vec());

        assert_eq!(req.method, http::Method::POST);
        assert_eq!(req.headers.get("x-api-key").unwrap(), "k");
        assert_eq!(req.body, Some(b"{}".to_vec()));
    }
}

mod http_response {
    use super::*;

    #[test]
    fn is_success_only_for_2xx() {
        for status in [http::StatusCode::OK, http::StatusCode::NO_CONTENT] {
            let resp = HttpResponse::new(status, http::HeaderMap::new(), vec![]);
            assert!(resp.is_success(), "Expected {status} to be success");
        }
        for status in [http::StatusCode::NOT_FOUND, http::StatusCode::BAD_GATEWAY] {
            let resp = HttpResponse::new(status, http::HeaderMap::new(), vec![]);
            assert!(!resp.is_success(), "Expected {status} to not be success");
        }
    }

    #[test]
    fn json_parses_body() {
        let resp = HttpResponse::new(
            http::StatusCode::OK,
            http::HeaderMap::new(),
            br#"{"stop":"No cameras active"}"#.to_vec(),
        );

        assert_eq!(
            resp.json().unwrap(),
            serde_json::json!({ "stop": "No cameras active" })
        );
    }

    #[test]
    fn json_rejects_non_json_body() {
        let resp = HttpResponse::new(
            http::StatusCode::OK,
            http::HeaderMap::new(),
            b"<html>".to_vec(),
        );

        assert!(resp.json().is_err());
    }

    #[test]
    fn body_text_returns_none_for_invalid_utf8() {
        let resp = HttpResponse::new(http::StatusCode::OK, http::HeaderMap::new(), vec![0xFF]);

        assert!(resp.body_text().is_none());
    }
}
