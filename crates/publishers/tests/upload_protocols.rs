//! Upload-protocol tests against local fake platform endpoints.
//!
//! Each test spins up an axum server standing in for the platform API and
//! points a publisher at it, so the wire behavior (channel pre-check,
//! forced re-sign-in, pull-from-URL resolution, page upload) is exercised
//! end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::json;

use platform_publishers::auth::{AuthGrant, AuthorizationFlow};
use platform_publishers::publisher::platforms::facebook::{FacebookConfig, FacebookPublisher};
use platform_publishers::publisher::platforms::tiktok::{TiktokConfig, TiktokPublisher};
use platform_publishers::publisher::platforms::youtube::{
    NO_CHANNEL_MESSAGE, YoutubeConfig, YoutubePublisher,
};
use platform_publishers::{
    Clip, PageSelection, PlatformCredential, PlatformPublisher, PublishError, UploadMetadata,
    UploadOutcome,
};

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

/// Counts how many times the external surface was driven.
struct CountingFlow {
    token: String,
    calls: AtomicUsize,
}

impl CountingFlow {
    fn new(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: token.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl AuthorizationFlow for CountingFlow {
    async fn authorize(&self) -> Result<AuthGrant, PublishError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthGrant::new(self.token.clone()))
    }
}

#[derive(Default)]
struct YoutubeState {
    channel_tokens: Mutex<Vec<String>>,
    upload_tokens: Mutex<Vec<String>>,
}

async fn yt_channels(
    State(state): State<Arc<YoutubeState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = bearer(&headers);
    state.channel_tokens.lock().push(token.clone());
    if token == "stale" {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({"error": {"message": "Invalid Credentials"}})),
        );
    }
    (
        StatusCode::OK,
        axum::Json(json!({
            "items": [{
                "id": "UC1",
                "snippet": {"title": "Chan", "thumbnails": {"default": {"url": "https://a/b.png"}}}
            }]
        })),
    )
}

async fn yt_upload(
    State(state): State<Arc<YoutubeState>>,
    headers: HeaderMap,
    _body: axum::body::Bytes,
) -> impl IntoResponse {
    state.upload_tokens.lock().push(bearer(&headers));
    axum::Json(json!({"id": "vid123"}))
}

async fn clip_bytes() -> impl IntoResponse {
    (StatusCode::OK, vec![0u8; 64])
}

fn youtube_publisher(
    addr: SocketAddr,
    flow: Arc<dyn AuthorizationFlow>,
) -> YoutubePublisher {
    let base = format!("http://{addr}");
    YoutubePublisher::with_config(
        Client::new(),
        YoutubeConfig {
            api_base: base.clone(),
            upload_base: base,
            watch_base: "https://www.youtube.com".to_string(),
        },
        flow,
    )
}

#[tokio::test]
async fn youtube_uploads_multipart_and_builds_watch_url() {
    let state = Arc::new(YoutubeState::default());
    let app = Router::new()
        .route("/channels", get(yt_channels))
        .route("/videos", post(yt_upload))
        .route("/clip.mp4", get(clip_bytes))
        .with_state(Arc::clone(&state));
    let addr = serve(app).await;

    let flow = CountingFlow::new("fresh");
    let publisher = youtube_publisher(addr, flow.clone());
    let clip = Clip::new("clip-1", format!("http://{addr}/clip.mp4"));

    let result = publisher
        .upload(
            &clip,
            &UploadMetadata::new("title", "desc"),
            &PlatformCredential::bearer("good"),
        )
        .await
        .unwrap();

    match result.outcome {
        UploadOutcome::Published { external_id, url } => {
            assert_eq!(external_id, "vid123");
            assert_eq!(url, "https://www.youtube.com/watch?v=vid123");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(result.renewed.is_none());
    assert_eq!(flow.calls.load(Ordering::SeqCst), 0);
    assert_eq!(state.upload_tokens.lock().as_slice(), ["good"]);
}

#[tokio::test]
async fn youtube_forces_re_sign_in_on_expired_credential() {
    let state = Arc::new(YoutubeState::default());
    let app = Router::new()
        .route("/channels", get(yt_channels))
        .route("/videos", post(yt_upload))
        .route("/clip.mp4", get(clip_bytes))
        .with_state(Arc::clone(&state));
    let addr = serve(app).await;

    let flow = CountingFlow::new("fresh");
    let publisher = youtube_publisher(addr, flow.clone());
    let clip = Clip::new("clip-1", format!("http://{addr}/clip.mp4"));

    let result = publisher
        .upload(
            &clip,
            &UploadMetadata::new("title", "desc"),
            &PlatformCredential::bearer("stale"),
        )
        .await
        .unwrap();

    assert!(matches!(result.outcome, UploadOutcome::Published { .. }));
    assert_eq!(
        result.renewed.map(|g| g.access_token).as_deref(),
        Some("fresh")
    );
    // One forced re-sign-in, channel check retried with the fresh token.
    assert_eq!(flow.calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.channel_tokens.lock().as_slice(), ["stale", "fresh"]);
    // The upload itself never saw the stale credential.
    assert_eq!(state.upload_tokens.lock().as_slice(), ["fresh"]);
}

#[tokio::test]
async fn youtube_missing_channel_short_circuits_before_upload() {
    let upload_hits = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&upload_hits);
    let app = Router::new()
        .route(
            "/channels",
            get(|| async { axum::Json(json!({"items": []})) }),
        )
        .route(
            "/videos",
            post(move || {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    axum::Json(json!({"id": "never"}))
                }
            }),
        );
    let addr = serve(app).await;

    let publisher = youtube_publisher(addr, CountingFlow::new("fresh"));
    let err = publisher
        .upload(
            &Clip::new("clip-1", format!("http://{addr}/clip.mp4")),
            &UploadMetadata::new("t", "d"),
            &PlatformCredential::bearer("good"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::PlatformApi { ref message, .. } if message == NO_CHANNEL_MESSAGE
    ));
    assert_eq!(upload_hits.load(Ordering::SeqCst), 0);
}

#[derive(Default)]
struct TiktokState {
    submit_calls: AtomicUsize,
    list_calls: AtomicUsize,
    /// Listing turns non-empty once this many polls have happened.
    videos_after: usize,
}

async fn tiktok_submit(State(state): State<Arc<TiktokState>>) -> impl IntoResponse {
    state.submit_calls.fetch_add(1, Ordering::SeqCst);
    axum::Json(json!({"success": true}))
}

async fn tiktok_list(State(state): State<Arc<TiktokState>>) -> impl IntoResponse {
    let seen = state.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if seen >= state.videos_after && state.videos_after > 0 {
        axum::Json(json!({
            "data": {"videos": [{
                "id": "7301",
                "share_url": "https://www.tiktok.com/@user/video/7301"
            }]}
        }))
    } else {
        axum::Json(json!({"data": {"videos": []}}))
    }
}

fn tiktok_publisher(addr: SocketAddr) -> TiktokPublisher {
    TiktokPublisher::with_config(
        Client::new(),
        TiktokConfig {
            api_base: format!("http://{addr}"),
            resolve_attempts: 3,
            resolve_initial_delay: Duration::from_millis(10),
            ..TiktokConfig::default()
        },
        CountingFlow::new("unused"),
    )
}

fn tiktok_app(state: Arc<TiktokState>) -> Router {
    Router::new()
        .route("/v2/post/publish/video/init/", post(tiktok_submit))
        .route("/v2/video/list/", get(tiktok_list))
        .with_state(state)
}

#[tokio::test]
async fn tiktok_resolves_identifier_from_listing() {
    let state = Arc::new(TiktokState {
        videos_after: 2,
        ..TiktokState::default()
    });
    let addr = serve(tiktok_app(Arc::clone(&state))).await;

    let publisher = tiktok_publisher(addr);
    let result = publisher
        .upload(
            &Clip::new("clip-1", "https://cdn.example/clip.mp4"),
            &UploadMetadata::new("t", "d"),
            &PlatformCredential::bearer("tok"),
        )
        .await
        .unwrap();

    match result.outcome {
        UploadOutcome::Published { external_id, url } => {
            assert_eq!(external_id, "7301");
            assert_eq!(url, "https://www.tiktok.com/@user/video/7301");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(state.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(state.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn tiktok_reports_accepted_unresolved_when_listing_stays_empty() {
    // Scenario: submission accepted, listing never shows the video.
    let state = Arc::new(TiktokState::default());
    let addr = serve(tiktok_app(Arc::clone(&state))).await;

    let publisher = tiktok_publisher(addr);
    let result = publisher
        .upload(
            &Clip::new("clip-1", "https://cdn.example/clip.mp4"),
            &UploadMetadata::new("t", "d"),
            &PlatformCredential::bearer("tok"),
        )
        .await
        .unwrap();

    assert!(matches!(result.outcome, UploadOutcome::AcceptedUnresolved));
    // The bounded poll ran dry rather than looping forever.
    assert_eq!(state.list_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn tiktok_surfaces_rejected_submission_verbatim() {
    let app = Router::new().route(
        "/v2/post/publish/video/init/",
        post(|| async { axum::Json(json!({"success": false, "message": "spam_risk"})) }),
    );
    let addr = serve(app).await;

    let publisher = tiktok_publisher(addr);
    let err = publisher
        .upload(
            &Clip::new("clip-1", "https://cdn.example/clip.mp4"),
            &UploadMetadata::new("t", "d"),
            &PlatformCredential::bearer("tok"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::PlatformApi { ref message, .. } if message == "spam_risk"
    ));
}

#[tokio::test]
async fn facebook_upload_requires_page_selection() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().fallback(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            StatusCode::OK
        }
    });
    let addr = serve(app).await;

    let publisher = FacebookPublisher::with_config(
        Client::new(),
        FacebookConfig {
            graph_base: format!("http://{addr}"),
            watch_base: "https://www.facebook.com".to_string(),
        },
        CountingFlow::new("unused"),
    );

    let err = publisher
        .upload(
            &Clip::new("clip-1", format!("http://{addr}/clip.mp4")),
            &UploadMetadata::new("t", "d"),
            &PlatformCredential::PageAccount {
                user_token: "user-token".to_string(),
                selected_page: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Validation(_)));
    // Pre-flight failure: nothing reached the network.
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn facebook_lists_pages_for_selection() {
    let app = Router::new().route(
        "/me/accounts",
        get(|headers: HeaderMap| async move {
            assert_eq!(bearer(&headers), "user-token");
            axum::Json(json!({
                "data": [
                    {"id": "111", "name": "First Page", "access_token": "page-token-1"},
                    {"id": "222", "name": "Second Page", "access_token": "page-token-2"}
                ]
            }))
        }),
    );
    let addr = serve(app).await;

    let publisher = FacebookPublisher::with_config(
        Client::new(),
        FacebookConfig {
            graph_base: format!("http://{addr}"),
            watch_base: "https://www.facebook.com".to_string(),
        },
        CountingFlow::new("unused"),
    );

    let pages = publisher.list_pages("user-token").await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_id, "111");
    assert_eq!(pages[1].access_token, "page-token-2");
}

#[tokio::test]
async fn facebook_uploads_to_selected_page() {
    let seen_body = Arc::new(Mutex::new(Vec::new()));
    let body_sink = Arc::clone(&seen_body);
    let app = Router::new()
        .route(
            "/111/videos",
            post(move |body: axum::body::Bytes| {
                let body_sink = Arc::clone(&body_sink);
                async move {
                    body_sink.lock().extend_from_slice(&body);
                    axum::Json(json!({"id": "888"}))
                }
            }),
        )
        .route("/clip.mp4", get(clip_bytes));
    let addr = serve(app).await;

    let publisher = FacebookPublisher::with_config(
        Client::new(),
        FacebookConfig {
            graph_base: format!("http://{addr}"),
            watch_base: "https://www.facebook.com".to_string(),
        },
        CountingFlow::new("unused"),
    );

    let result = publisher
        .upload(
            &Clip::new("clip-1", format!("http://{addr}/clip.mp4")),
            &UploadMetadata::new("Page title", "Page description"),
            &PlatformCredential::PageAccount {
                user_token: "user-token".to_string(),
                selected_page: Some(PageSelection {
                    page_id: "111".to_string(),
                    page_name: "First Page".to_string(),
                    access_token: "page-token-1".to_string(),
                }),
            },
        )
        .await
        .unwrap();

    match result.outcome {
        UploadOutcome::Published { external_id, url } => {
            assert_eq!(external_id, "888");
            assert_eq!(url, "https://www.facebook.com/watch/?v=888");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    // The multipart body carries the page token and metadata fields.
    let body = String::from_utf8_lossy(&seen_body.lock()).into_owned();
    assert!(body.contains("page-token-1"));
    assert!(body.contains("Page title"));
}
