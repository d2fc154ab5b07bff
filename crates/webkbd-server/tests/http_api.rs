//! End-to-end tests of the HTTP API through the axum router, with in-memory
//! storage, a recording keyboard and a recording status reporter.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use webkbd_core::keymap::{HidKeyCode, ModifierFlags};
use webkbd_server::application::auth::encode_basic;
use webkbd_server::application::{
    ConnectionState, Credentials, KeyValueBackend, PresetStore, RequestGateway, StatusReporter,
    TypeTextUseCase, TypingDelays,
};
use webkbd_server::infrastructure::clock::RecordingClock;
use webkbd_server::infrastructure::http::{build_router, INDEX_HTML};
use webkbd_server::infrastructure::keyboard::mock::{EmittedEvent, MockKeystrokeEmitter};
use webkbd_server::infrastructure::storage::MemoryBackend;

#[derive(Default)]
struct RecordingReporter {
    counts: Mutex<Vec<usize>>,
}

impl StatusReporter for RecordingReporter {
    fn preset_count(&self, count: usize) {
        self.counts.lock().unwrap().push(count);
    }

    fn connection(&self, _state: &ConnectionState) {}
}

struct Harness {
    app: Router,
    backend: MemoryBackend,
    emitter: Arc<MockKeystrokeEmitter>,
    clock: Arc<RecordingClock>,
    reporter: Arc<RecordingReporter>,
}

impl Harness {
    fn new() -> Self {
        let backend = MemoryBackend::new();
        let emitter = Arc::new(MockKeystrokeEmitter::new());
        let clock = Arc::new(RecordingClock::new());
        let reporter = Arc::new(RecordingReporter::default());

        let shared: Arc<dyn KeyValueBackend> = Arc::new(backend.clone());
        let typing = TypeTextUseCase::new(emitter.clone(), clock.clone(), TypingDelays::default());
        let gateway = RequestGateway::new(
            PresetStore::open(shared),
            typing,
            Credentials::new("admin", "password"),
            reporter.clone(),
            INDEX_HTML,
        );

        Self {
            app: build_router(Arc::new(Mutex::new(gateway))),
            backend,
            emitter,
            clock,
            reporter,
        }
    }

    async fn send(&self, method: &str, uri: &str, form: Option<&str>, authed: bool) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if authed {
            req = req.header(header::AUTHORIZATION, encode_basic("admin", "password"));
        }
        let body = match form {
            Some(form) => {
                req = req.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
    }

    fn document(&self) -> String {
        self.backend.raw("presets").unwrap_or_default()
    }
}

async fn text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ── Auth gate ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthenticated_mutations_change_nothing() {
    // Arrange
    let h = Harness::new();
    h.send("POST", "/presets", Some("name=keep&user=u&pass=p"), true).await;
    let before = h.document();

    // Act
    let set = h.send("POST", "/presets", Some("name=evil&user=x"), false).await;
    let del = h.send("DELETE", "/presets?name=keep", None, false).await;
    let typed = h.send("POST", "/type", Some("text=hello"), false).await;

    // Assert
    assert_eq!(set.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(del.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(typed.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.document(), before);
    assert!(h.emitter.events().is_empty());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let h = Harness::new();
    let req = Request::get("/presets")
        .header(header::AUTHORIZATION, encode_basic("admin", "guess"))
        .body(Body::empty())
        .unwrap();
    let resp = h.app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_malformed_query_still_gets_auth_challenge() {
    let h = Harness::new();
    let resp = h.send("DELETE", "/presets?name=%ZZ", None, false).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Preset lifecycle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_preset_lifecycle_scenario() {
    let h = Harness::new();

    // set work → count 1
    let resp = h.send("POST", "/presets", Some("name=work&user=alice&pass=pw"), true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(h.send("GET", "/presets", None, true).await).await,
        r#"{"work":{"user":"alice","pass":"pw"}}"#);

    // set "" → 500, count stays 1
    let resp = h.send("POST", "/presets", Some("name=&user=x"), true).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(resp).await, "Failed to save preset");

    // remove work → count 0
    let resp = h.send("DELETE", "/presets?name=work", None, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.document(), "{}");

    // remove work again → 404
    let resp = h.send("DELETE", "/presets?name=work", None, true).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(text(resp).await, "Not found");

    // Only successful mutations were reported.
    assert_eq!(*h.reporter.counts.lock().unwrap(), vec![1, 0]);
}

#[tokio::test]
async fn test_set_is_idempotent() {
    let h = Harness::new();
    h.send("POST", "/presets", Some("name=a&user=u&pass=p"), true).await;
    let first = h.document();
    h.send("POST", "/presets", Some("name=a&user=u&pass=p"), true).await;
    assert_eq!(h.document(), first);
}

#[tokio::test]
async fn test_legacy_value_is_served_raw_and_upgraded_on_write() {
    // Arrange
    let h = Harness::new();
    h.backend.insert("presets", r#"{"n":"legacyPass"}"#);

    // Act / Assert: GET returns the stored text untouched
    let raw = text(h.send("GET", "/presets", None, true).await).await;
    assert_eq!(raw, r#"{"n":"legacyPass"}"#);

    // Act / Assert: writing the same name replaces it with the structured form
    h.send("POST", "/presets", Some("name=n&user=u2&pass=p2"), true).await;
    assert_eq!(h.document(), r#"{"n":{"user":"u2","pass":"p2"}}"#);
}

#[tokio::test]
async fn test_non_preset_value_does_not_block_writes() {
    // Arrange
    let h = Harness::new();
    h.backend.insert("presets", r#"{"a":42}"#);

    // Act / Assert: another preset can still be saved
    let resp = h.send("POST", "/presets", Some("name=b&user=u&pass=p"), true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.document(), r#"{"a":42,"b":{"user":"u","pass":"p"}}"#);

    // Act / Assert: and the odd value can be deleted
    let resp = h.send("DELETE", "/presets?name=a", None, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.document(), r#"{"b":{"user":"u","pass":"p"}}"#);

    assert_eq!(*h.reporter.counts.lock().unwrap(), vec![2, 1]);
}

#[tokio::test]
async fn test_oversized_document_is_rejected_without_write() {
    let h = Harness::new();
    let pass = "p".repeat(128);
    for i in 0..50 {
        h.send("POST", "/presets", Some(&format!("name=preset{i:02}&pass={pass}")), true).await;
    }
    let stored = h.document();
    assert!(stored.len() <= 8192);

    let resp = h.send("POST", "/presets", Some(&format!("name=zz&pass={pass}")), true).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(h.document(), stored);
}

// ── Typing ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_type_with_newline_ends_in_enter() {
    let h = Harness::new();
    let resp = h.send("POST", "/type", Some("text=Hi&newline=on"), true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "OK");
    assert_eq!(
        h.emitter.events(),
        vec![
            EmittedEvent::ReleaseAll,
            EmittedEvent::KeyDown(HidKeyCode::KeyH, ModifierFlags::SHIFT),
            EmittedEvent::KeyUp(HidKeyCode::KeyH, ModifierFlags::NONE),
            EmittedEvent::KeyDown(HidKeyCode::KeyI, ModifierFlags::NONE),
            EmittedEvent::KeyUp(HidKeyCode::KeyI, ModifierFlags::NONE),
            EmittedEvent::KeyDown(HidKeyCode::Enter, ModifierFlags::NONE),
            EmittedEvent::KeyUp(HidKeyCode::Enter, ModifierFlags::NONE),
        ]
    );
}

#[tokio::test]
async fn test_type_text_may_come_from_query() {
    let h = Harness::new();
    let resp = h.send("POST", "/type?text=a", None, true).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(h.emitter.pressed_keys(), vec![HidKeyCode::KeyA]);
}

#[tokio::test]
async fn test_hotkey_alias_sends_chord_and_waits() {
    let h = Harness::new();
    h.send("POST", "/type", Some("text=%7BCTRL%2BALT%2BDEL%7D"), true).await;

    assert_eq!(
        h.emitter.pressed_keys(),
        vec![HidKeyCode::ControlLeft, HidKeyCode::AltLeft, HidKeyCode::Delete]
    );
    let delays = TypingDelays::default();
    assert_eq!(
        h.clock.total(),
        delays.release_settle + delays.chord_settle + delays.pacing
    );
}

#[tokio::test]
async fn test_type_requires_text() {
    let h = Harness::new();
    let resp = h.send("POST", "/type", Some("newline=1"), true).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(h.emitter.events().is_empty());
    assert_eq!(h.clock.sleeps().len(), 0);
}
