//! RequestGateway: the authenticated operations behind every HTTP route.
//!
//! The gateway knows nothing about sockets or the web framework.  The HTTP
//! layer turns a request into a [`GatewayRequest`], calls [`RequestGateway::handle`]
//! with the matched [`Route`], and writes the returned [`GatewayResponse`]
//! back out.  Calls are expected to be serialized by the caller; each one
//! runs to completion, including every typing delay.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::auth::{challenge, Credentials};
use crate::application::preset_store::{KeyValueBackend, PresetError, PresetStore};
use crate::application::status::StatusReporter;
use crate::application::type_text::{TypeOutcome, TypeTextUseCase};

// ── Request / response model ──────────────────────────────────────────────────

/// Operation selected by method and path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /`
    Root,
    /// `POST /type`
    Type,
    /// `GET /presets`
    GetPresets,
    /// `POST /presets`
    SetPreset,
    /// `DELETE /presets`
    DeletePreset,
    /// `GET /favicon.ico`
    Favicon,
}

impl Route {
    /// Whether the route sits behind the Basic-auth gate.
    pub fn requires_auth(self) -> bool {
        !matches!(self, Route::Favicon)
    }
}

/// Arguments and credentials of one request.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Decoded query-string pairs, in order.
    pub query: Vec<(String, String)>,
    /// Decoded url-encoded form pairs, in order.
    pub form: Vec<(String, String)>,
}

impl GatewayRequest {
    /// Looks `name` up in the query first, then in the form body.  The first
    /// occurrence wins.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.form.iter())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.arg(name).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    NoContent,
    BadRequest,
    Unauthorized,
    NotFound,
    InternalError,
}

impl ResponseStatus {
    pub fn code(self) -> u16 {
        match self {
            ResponseStatus::Ok => 200,
            ResponseStatus::NoContent => 204,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::Unauthorized => 401,
            ResponseStatus::NotFound => 404,
            ResponseStatus::InternalError => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    PlainText,
    Json,
    Html,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::PlainText => "text/plain",
            ContentType::Json => "application/json; charset=utf-8",
            ContentType::Html => "text/html; charset=utf-8",
        }
    }
}

/// What to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: ResponseStatus,
    pub content_type: Option<ContentType>,
    pub body: String,
    /// `WWW-Authenticate` value for a 401.
    pub challenge: Option<String>,
}

impl GatewayResponse {
    pub fn text(status: ResponseStatus, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some(ContentType::PlainText),
            body: body.into(),
            challenge: None,
        }
    }

    pub fn ok() -> Self {
        Self::text(ResponseStatus::Ok, "OK")
    }

    pub fn no_content() -> Self {
        Self {
            status: ResponseStatus::NoContent,
            content_type: None,
            body: String::new(),
            challenge: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            challenge: Some(challenge()),
            ..Self::text(ResponseStatus::Unauthorized, "Unauthorized")
        }
    }

    fn typed(status: ResponseStatus, content_type: ContentType, body: String) -> Self {
        Self {
            status,
            content_type: Some(content_type),
            body,
            challenge: None,
        }
    }
}

// ── Newline flag ──────────────────────────────────────────────────────────────

/// `"1"`, `"true"` and `"on"` request a trailing CRLF; anything else does not.
pub fn parse_newline_flag(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "on"))
}

// ── Gateway ───────────────────────────────────────────────────────────────────

pub struct RequestGateway {
    store: PresetStore<Arc<dyn KeyValueBackend>>,
    typing: TypeTextUseCase,
    credentials: Credentials,
    reporter: Arc<dyn StatusReporter>,
    index_html: String,
}

impl RequestGateway {
    pub fn new(
        store: PresetStore<Arc<dyn KeyValueBackend>>,
        typing: TypeTextUseCase,
        credentials: Credentials,
        reporter: Arc<dyn StatusReporter>,
        index_html: impl Into<String>,
    ) -> Self {
        Self {
            store,
            typing,
            credentials,
            reporter,
            index_html: index_html.into(),
        }
    }

    pub fn store(&self) -> &PresetStore<Arc<dyn KeyValueBackend>> {
        &self.store
    }

    /// Sends the current preset count to the status reporter.
    pub fn report_count(&self) {
        self.reporter.preset_count(self.store.count());
    }

    /// Runs `route`, checking credentials first where the route needs them.
    pub fn handle(&self, route: Route, request: &GatewayRequest) -> GatewayResponse {
        if route.requires_auth() && !self.require_auth(request) {
            return GatewayResponse::unauthorized();
        }

        match route {
            Route::Root => self.handle_root(),
            Route::Type => self.handle_type(request),
            Route::GetPresets => self.handle_get_document(),
            Route::SetPreset => self.handle_set_preset(request),
            Route::DeletePreset => self.handle_delete_preset(request),
            Route::Favicon => self.handle_favicon(),
        }
    }

    /// Returns `true` if the request carries the configured credentials.
    pub fn require_auth(&self, request: &GatewayRequest) -> bool {
        let ok = self
            .credentials
            .verify_header(request.authorization.as_deref());
        if !ok {
            debug!("rejected request without valid credentials");
        }
        ok
    }

    pub fn handle_root(&self) -> GatewayResponse {
        GatewayResponse::typed(ResponseStatus::Ok, ContentType::Html, self.index_html.clone())
    }

    /// Serves the stored document verbatim; legacy entries are left for the
    /// page to interpret.
    pub fn handle_get_document(&self) -> GatewayResponse {
        GatewayResponse::typed(ResponseStatus::Ok, ContentType::Json, self.store.load_raw())
    }

    pub fn handle_set_preset(&self, request: &GatewayRequest) -> GatewayResponse {
        let Some(name) = request.arg("name") else {
            return GatewayResponse::text(ResponseStatus::BadRequest, "Missing 'name'");
        };
        let user = request.arg("user").unwrap_or("");
        let pass = request.arg("pass").unwrap_or("");

        match self.store.set(name, user, pass) {
            Ok(()) => {
                info!(preset = name, "preset saved");
                self.report_count();
                GatewayResponse::ok()
            }
            Err(e) => {
                warn!(preset = name, "saving preset failed: {e}");
                GatewayResponse::text(ResponseStatus::InternalError, "Failed to save preset")
            }
        }
    }

    pub fn handle_delete_preset(&self, request: &GatewayRequest) -> GatewayResponse {
        let Some(name) = request.arg("name") else {
            return GatewayResponse::text(ResponseStatus::BadRequest, "Missing 'name'");
        };

        match self.store.remove(name) {
            Ok(()) => {
                info!(preset = name, "preset deleted");
                self.report_count();
                GatewayResponse::ok()
            }
            Err(PresetError::NotFound(_)) => {
                debug!(preset = name, "delete of unknown preset");
                GatewayResponse::text(ResponseStatus::NotFound, "Not found")
            }
            Err(e) => {
                warn!(preset = name, "deleting preset failed: {e}");
                GatewayResponse::text(ResponseStatus::NotFound, "Not found")
            }
        }
    }

    /// Types `text` on the host.  Emitter failures are logged only; the
    /// caller always gets 200 once the dispatch ran.
    pub fn handle_type(&self, request: &GatewayRequest) -> GatewayResponse {
        let Some(text) = request.arg("text") else {
            return GatewayResponse::text(ResponseStatus::BadRequest, "Missing 'text'");
        };
        let newline = parse_newline_flag(request.arg("newline"));

        info!(len = text.chars().count(), newline, "type request");

        match self.typing.type_text(text, newline) {
            Ok(TypeOutcome::Hotkey(hotkey)) => debug!("sent {}", hotkey.label()),
            Ok(TypeOutcome::Typed { typed, skipped }) => {
                debug!(typed, skipped, "text dispatched");
            }
            Err(e) => warn!("keystroke dispatch failed: {e}"),
        }

        GatewayResponse::ok()
    }

    pub fn handle_favicon(&self) -> GatewayResponse {
        GatewayResponse::no_content()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
