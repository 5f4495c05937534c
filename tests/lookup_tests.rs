/// Unit tests for the lookup building blocks
/// Tests option validation, response normalization, auth selection and the HTTP gateway
use serde_json::{json, Value};
use spotter_lookup::auth::{AuthStrategy, TokenProvider};
use spotter_lookup::config::RequestConfig;
use spotter_lookup::errors::ResponseStatus;
use spotter_lookup::gateway_client::{RequestGateway, RequestSpec};
use spotter_lookup::models::{normalize_search_body, Entity, LookupOptions, LookupResult};
use spotter_lookup::validation::validate_options;

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn test_host_shaped_options_with_empty_host() {
        let options: LookupOptions = serde_json::from_value(json!({
            "host": {"value": ""},
            "token": {"value": "abc"},
            "tenant": {"value": "t1"}
        }))
        .unwrap();

        let errors = validate_options(&options);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].key, "host");
    }

    #[test]
    fn test_non_string_option_is_rejected() {
        let options: LookupOptions = serde_json::from_value(json!({
            "host": {"value": "https://siem.example.com"},
            "username": {"value": "analyst"},
            "password": {"value": true},
            "tenant": {"value": "acme"}
        }))
        .unwrap();

        let errors = validate_options(&options);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].key, "password");
    }

    #[test]
    fn test_whitespace_counts_as_present() {
        let options = LookupOptions {
            host: Some(" ".to_string()),
            token: Some("abc".to_string()),
            tenant: Some("t1".to_string()),
            ..Default::default()
        };
        assert!(validate_options(&options).is_empty());
    }
}

#[cfg(test)]
mod normalization_tests {
    use super::*;

    #[test]
    fn test_single_entry_event() {
        let body = json!({
            "events": {"result": {"entry": [{"key": "ip", "value": "10.0.0.1"}]}}
        });
        let data = normalize_search_body(&body).unwrap().unwrap();

        let mut expected = serde_json::Map::new();
        expected.insert("ip".to_string(), json!("10.0.0.1"));
        assert!(data.details.contains(&expected));
    }

    #[test]
    fn test_no_events_field() {
        assert!(normalize_search_body(&json!({})).unwrap().is_none());
    }

    #[test]
    fn test_entry_without_value_is_null() {
        let body = json!({"events": [{"entry": [{"key": "tag"}]}]});
        let data = normalize_search_body(&body).unwrap().unwrap();
        assert_eq!(data.details[0]["tag"], Value::Null);
    }

    #[test]
    fn test_result_json_shape() {
        let result = LookupResult {
            entity: Entity::new("10.0.0.1"),
            data: normalize_search_body(&json!({
                "events": {"entry": [{"key": "ip", "value": "10.0.0.1"}]}
            }))
            .unwrap(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            json!({
                "entity": {"value": "10.0.0.1", "type": "IPv4"},
                "data": {"summary": [], "details": [{"ip": "10.0.0.1"}]}
            })
        );
    }
}

#[cfg(test)]
mod auth_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_token_takes_precedence_over_credentials() {
        let options = LookupOptions {
            username: Some("analyst".to_string()),
            password: Some("pw".to_string()),
            tenant: Some("acme".to_string()),
            token: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            AuthStrategy::from_options(&options),
            AuthStrategy::StaticToken(_)
        ));
    }

    #[tokio::test]
    async fn test_static_token_needs_no_network() {
        let gateway = RequestGateway::from_config(&RequestConfig::default()).unwrap_or_else(|e| {
            panic!("gateway: {}", e);
        });
        let provider = TokenProvider::new(gateway, None);

        let token = provider
            .resolve(
                "http://127.0.0.1:1",
                &AuthStrategy::StaticToken("abc".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(token, "abc");
    }

    #[tokio::test]
    async fn test_json_string_token_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json("tok-json"))
            .mount(&mock_server)
            .await;

        let gateway = RequestGateway::from_config(&RequestConfig::default()).unwrap_or_else(|e| {
            panic!("gateway: {}", e);
        });
        let provider = TokenProvider::new(gateway, None);
        let options = LookupOptions {
            username: Some("analyst".to_string()),
            password: Some("pw".to_string()),
            tenant: Some("acme".to_string()),
            ..Default::default()
        };

        let token = provider
            .resolve(&mock_server.uri(), &AuthStrategy::from_options(&options))
            .await
            .unwrap();
        assert_eq!(token, "tok-json");
    }
}

#[cfg(test)]
mod gateway_tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway() -> RequestGateway {
        RequestGateway::from_config(&RequestConfig::default())
            .unwrap_or_else(|e| panic!("gateway: {}", e))
    }

    #[tokio::test]
    async fn test_send_passes_query_and_headers() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/echo"))
            .and(query_param("q", "a b \"c\""))
            .and(header("x-test", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let body = gateway()
            .send(
                RequestSpec::get(format!("{}/echo", mock_server.uri()))
                    .query("q", "a b \"c\"")
                    .header("x-test", "1"),
                200,
            )
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_send_returns_plain_text_as_string() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/plain"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&mock_server)
            .await;

        let body = gateway()
            .send(RequestSpec::post(format!("{}/plain", mock_server.uri())), 200)
            .await
            .unwrap();
        assert_eq!(body, Value::String("hello".to_string()));
    }

    #[tokio::test]
    async fn test_status_mismatch_reports_actual_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&mock_server)
            .await;

        let err = gateway()
            .send(RequestSpec::get(mock_server.uri()), 201)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, ResponseStatus::Code(200));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_transport_failure_has_unknown_status() {
        let err = gateway()
            .send(RequestSpec::get("http://127.0.0.1:1/"), 200)
            .await
            .unwrap_err();
        assert_eq!(err.status_code, ResponseStatus::Unknown);
        assert!(err.error.is_some());
    }
}
