//! Classifier gate behavior against a simulated moderation service:
//! verdict token parsing, the retry budget, fail-open, and the
//! pre-publish block at the engine level.

use feed_engine::api::FixtureRepository;
use feed_engine::config::ModerationConfig;
use feed_engine::models::{PostDraft, Session};
use feed_engine::retry::RetryConfig;
use feed_engine::services::{KeywordScreen, ModerationGateway, Verdict};
use feed_engine::store::FeedFilter;
use feed_engine::{Config, EngineError, FeedEngine};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    }
}

async fn gateway(server: &MockServer, max_retries: u32) -> ModerationGateway {
    ModerationGateway::new(
        &ModerationConfig {
            url: format!("{}/moderate", server.uri()),
            max_retries,
        },
        fast_retry(max_retries),
    )
    .unwrap()
}

#[tokio::test]
async fn verbose_safe_verdict_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("The content appears to be safe for the community."),
        )
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, 2).await;
    assert_eq!(gateway.classify("my study plan for june").await, Verdict::Safe);
}

#[tokio::test]
async fn definitive_unsafe_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("UNSAFE"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server, 3).await;
    assert_eq!(gateway.classify("something dubious").await, Verdict::Unsafe);
}

#[tokio::test]
async fn unrecognized_verdict_spends_the_retry_budget_then_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("I cannot help with that."))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = gateway(&server, 2).await;
    assert_eq!(gateway.classify("ambiguous text").await, Verdict::Safe);
}

#[tokio::test]
async fn server_errors_fail_open() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let gateway = gateway(&server, 1).await;
    assert_eq!(gateway.classify("anything at all").await, Verdict::Safe);
}

#[tokio::test]
async fn keyword_screen_rejects_without_a_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("SAFE"))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = gateway(&server, 2)
        .await
        .with_screen(KeywordScreen::new(vec!["forbidden topic".to_string()]));
    assert_eq!(
        gateway.classify("all about the FORBIDDEN TOPIC here").await,
        Verdict::Unsafe
    );
}

// ========== Engine-level gate ==========

async fn engine_with_classifier(server: &MockServer) -> FeedEngine {
    let mut config = Config::default();
    config.moderation.url = format!("{}/moderate", server.uri());
    config.moderation.max_retries = 0;
    let fixture = Arc::new(FixtureRepository::seeded(Session::anonymous()));
    FeedEngine::with_backend(config, Session::anonymous(), fixture.clone(), fixture).unwrap()
}

#[tokio::test]
async fn rejected_draft_never_reaches_the_feed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("UNSAFE"))
        .mount(&server)
        .await;

    let engine = engine_with_classifier(&server).await;
    engine.load_more().await.unwrap();
    let count_before = engine.visible_posts(&FeedFilter::default()).len();

    let err = engine
        .create_post(&PostDraft::text("a perfectly normal sentence"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ModerationRejected(_)));

    assert_eq!(engine.visible_posts(&FeedFilter::default()).len(), count_before);
}

#[tokio::test]
async fn approved_draft_publishes_with_a_confirmed_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/moderate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("SAFE"))
        .mount(&server)
        .await;

    let engine = engine_with_classifier(&server).await;
    engine.load_more().await.unwrap();

    let id = engine
        .create_post(&PostDraft::text("Sharing my revision timetable"))
        .await
        .unwrap();
    assert!(!id.is_local());

    let views = engine.visible_posts(&FeedFilter::default());
    assert_eq!(views[0].post.id, id);
    assert_eq!(views[0].post.content, "Sharing my revision timetable");
}

#[tokio::test]
async fn unreachable_classifier_fails_open_and_publishes() {
    // No server at all: connection refused on every attempt
    let mut config = Config::default();
    config.moderation.url = "http://127.0.0.1:9/moderate".to_string();
    config.moderation.max_retries = 1;
    let fixture = Arc::new(FixtureRepository::seeded(Session::anonymous()));
    let engine =
        FeedEngine::with_backend(config, Session::anonymous(), fixture.clone(), fixture).unwrap();
    engine.load_more().await.unwrap();

    let id = engine
        .create_post(&PostDraft::text("Notes from class today"))
        .await
        .unwrap();
    let views = engine.visible_posts(&FeedFilter::default());
    assert_eq!(views[0].post.id, id);
}
