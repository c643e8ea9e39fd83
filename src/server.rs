use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::engine::Engine;
use crate::error::{ErrorClass, GumshoeError, Result};
use crate::settings::Settings;
use crate::store::DocumentStore;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub err: String,
}

pub struct AppState<S> {
    store: Arc<S>,
    settings: Arc<Settings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// 400 for anything wrong with the query itself, 500 when the store fails.
pub fn status_for(error: &GumshoeError) -> StatusCode {
    match error.class() {
        ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
        ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router<S>(store: Arc<S>, settings: Arc<Settings>) -> Result<Router>
where
    S: DocumentStore + Send + Sync + 'static,
{
    let origin = &settings.server.allowed_origin;
    let cors = CorsLayer::new().allow_methods([Method::GET]);
    let cors = if origin == "*" {
        cors.allow_origin(Any)
    } else {
        let origin = HeaderValue::from_str(origin)
            .map_err(|e| GumshoeError::Config(format!("allowed_origin: {e}")))?;
        cors.allow_origin(origin)
    };
    let state = AppState { store, settings };
    Ok(Router::new()
        .route("/eval", get(evaluate::<S>))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(state))
}

async fn evaluate<S>(
    State(state): State<AppState<S>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response
where
    S: DocumentStore + Send + Sync + 'static,
{
    let started = Instant::now();
    let raw = params.get("query").cloned();
    let timeout = Duration::from_millis(state.settings.server.request_timeout_ms);
    // the store is synchronous, so the whole query runs on a blocking thread
    let task = tokio::task::spawn_blocking(move || {
        let engine = Engine::new(state.store.as_ref(), state.settings.as_ref());
        engine.evaluate(raw.as_deref())
    });
    let result = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => Err(GumshoeError::Storage(format!("join error: {e}"))),
        Err(_) => Err(GumshoeError::Storage("query timed out".into())),
    };
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(outcome) => {
            info!(ms = elapsed_ms, "query complete");
            (StatusCode::OK, Json(outcome)).into_response()
        }
        Err(e) => {
            let status = status_for(&e);
            let msg = e.to_string();
            warn!(%msg, code = %status.as_u16(), ms = elapsed_ms, "query error");
            (status, Json(ErrorResponse { err: msg })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_errors_are_bad_requests() {
        assert_eq!(status_for(&GumshoeError::InvalidLimit), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&GumshoeError::RestrictedCollection), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&GumshoeError::FilterParse("x".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn storage_errors_are_internal() {
        assert_eq!(
            status_for(&GumshoeError::Storage("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_origin_is_a_config_error() {
        let mut settings = Settings::default();
        settings.server.allowed_origin = "bad\norigin".into();
        let store = Arc::new(crate::persist::Persistor::new(crate::persist::PersistenceMode::InMemory).unwrap());
        let err = router(store, Arc::new(settings)).unwrap_err();
        assert!(matches!(err, GumshoeError::Config(_)));
    }
}
