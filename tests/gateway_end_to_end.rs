//! End-to-end failover through real HTTP adapters against mock backends

use llm_gateway::services::backend_pool::PoolConfig;
use llm_gateway::services::{Gateway, GenerateRequest, ProviderDescriptor, ProviderRegistry, WireFormat};
use llm_gateway::utils::TimeoutConfig;
use llm_gateway::{FailureKind, GatewayError};
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn registry(server: &MockServer) -> ProviderRegistry {
    ProviderRegistry::new(vec![
        ProviderDescriptor::new(
            "groq",
            WireFormat::ChatCompletionsCompatible,
            format!("{}/groq/chat/completions", server.uri()),
            &["llama-3.3-70b-versatile"],
        )
        .with_singular_vars(&["GROQ_API_KEY"]),
        ProviderDescriptor::new(
            "gemini",
            WireFormat::GenerativeContent,
            format!("{}/gemini/{{model}}:generateContent", server.uri()),
            &["gemini-1.5-flash"],
        )
        .with_singular_vars(&["GEMINI_API_KEY"]),
    ])
}

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn timeouts() -> TimeoutConfig {
    TimeoutConfig::default()
        .with_request_timeout(Duration::from_secs(5))
        .with_generate_deadline(Duration::from_secs(10))
}

#[tokio::test]
async fn test_fails_over_across_providers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groq/chat/completions"))
        .and(header("authorization", "Bearer gsk_revoked_0001"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "AIzaSyWorking0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "hello from gemini"}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = Gateway::from_env(
        registry(&server),
        &env(&[
            ("GROQ_API_KEY", "gsk_revoked_0001"),
            ("GEMINI_API_KEY", "AIzaSyWorking0001"),
        ]),
        PoolConfig::default(),
        &timeouts(),
    )
    .unwrap();

    let generation = gateway
        .generate(&GenerateRequest::new("hi").with_system("be brief"))
        .await
        .unwrap();
    assert_eq!(generation.text, "hello from gemini");
    assert_eq!(generation.provider, "gemini");
    assert_eq!(generation.attempts, 2);

    let snapshot = gateway.snapshot();
    assert_eq!(snapshot.providers["groq"].disabled, 1);
    assert_eq!(snapshot.providers["gemini"].available, 1);
}

#[tokio::test]
async fn test_exhaustion_reports_every_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/groq/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit reached"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/gemini/gemini-1.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let gateway = Gateway::from_env(
        registry(&server),
        &env(&[
            ("GROQ_API_KEY", "gsk_limited_0001"),
            ("GEMINI_API_KEY", "AIzaSyBusyKey0001"),
        ]),
        PoolConfig::default(),
        &timeouts(),
    )
    .unwrap();

    let err = gateway.generate(&GenerateRequest::new("hi")).await.unwrap_err();
    let attempts = err.attempts();
    assert!(matches!(err, GatewayError::ExhaustedPool { deadline_exceeded: false, .. }));
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].provider, "groq");
    assert_eq!(attempts[0].kind, FailureKind::RateLimited);
    assert_eq!(attempts[1].provider, "gemini");
    assert_eq!(attempts[1].kind, FailureKind::TransientFailure);

    // Secrets never appear in diagnostics
    let rendered = err.to_string() + &attempts.iter().map(|a| a.to_string()).collect::<String>();
    assert!(!rendered.contains("gsk_limited_0001"));
    assert!(!rendered.contains("AIzaSyBusyKey0001"));

    // Groq is rate limited; Gemini stays available below the failure threshold
    let remaining = gateway.pool().select_candidates();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].provider, "gemini");
}

#[tokio::test]
async fn test_unconfigured_gateway() {
    let server = MockServer::start().await;
    let gateway = Gateway::from_env(registry(&server), &env(&[]), PoolConfig::default(), &timeouts()).unwrap();

    let err = gateway.generate(&GenerateRequest::new("hi")).await.unwrap_err();
    assert!(err.is_not_configured());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
