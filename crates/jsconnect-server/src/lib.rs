//! jsConnect Server
//!
//! Serves the identity-provider endpoint a forum calls through JSONP.
//!
//! # Routes
//!
//! ```text
//! GET /JsConnect/Authenticate?client_id=&callback=&timestamp=&signature=
//! GET /jsconnect/authenticate            (alias)
//! GET /health
//! ```

pub mod config;
pub mod session;

use crate::config::{ServerConfig, SessionConfig};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use jsconnect::{render_failure, HttpDirectory, JsConnect, JsConnectError, SsoRequest, UserDirectory};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared request state
#[derive(Clone)]
pub struct AppState {
    pub jsconnect: Arc<JsConnect>,
    pub session: SessionConfig,
}

impl AppState {
    pub fn new(jsconnect: JsConnect, session: SessionConfig) -> Self {
        Self {
            jsconnect: Arc::new(jsconnect),
            session,
        }
    }

    /// Wires the handshake to the forum API named in `config`
    pub fn from_config(config: &ServerConfig) -> Result<Self, jsconnect::DirectoryError> {
        let timeout = Duration::from_secs(config.jsconnect.request_timeout_secs);
        let directory: Arc<dyn UserDirectory> =
            Arc::new(HttpDirectory::new(&config.jsconnect.api_base_uri, timeout)?);

        if config.jsconnect.api_base_uri.is_empty() {
            tracing::warn!("jsconnect.api_base_uri is not set, signed-in requests will fail");
        }

        let jsconnect = JsConnect::new(config.jsconnect.clone(), directory);
        Ok(Self::new(jsconnect, config.session.clone()))
    }
}

/// Builds the router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/JsConnect/Authenticate", get(authenticate))
        .route("/jsconnect/authenticate", get(authenticate))
        .route("/health", get(health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn authenticate(
    State(state): State<AppState>,
    query: Result<Query<SsoRequest>, QueryRejection>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let rendered = match query {
        Ok(Query(request)) => {
            let identity = session::identity_from_headers(&headers, &state.session);
            state.jsconnect.authenticate(&request, identity.as_ref()).await
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unparseable jsConnect query");
            render_failure(&JsConnectError::invalid_request("The query string is invalid."))
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, rendered.content_type)],
        rendered.body,
    )
}

async fn health() -> &'static str {
    "OK"
}
