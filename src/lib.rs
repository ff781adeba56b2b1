//! journal-gatewayd — a read-only HTTP gateway over a local append-only
//! structured log store. The router (`build_router`, below) dispatches
//! each request to a handler in `http`; `parse` turns `Accept`/`Range`
//! headers and query parameters into a seeded cursor over
//! `journal_core::Journal`; `stream` drives that cursor forward under
//! the client's pagination/follow policy and hands each record to
//! `serialize` for encoding.

pub mod error;
pub mod http;
pub mod output_mode;
pub mod parse;
pub mod serialize;
pub mod state;
pub mod stream;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Builds the full route table. `axum`'s `Router` gives route matching
/// and method rejection for free before any handler runs; each handler
/// receives `AppState` (the process-global, read-only bits — see
/// `state.rs`) plus whatever per-request state it builds locally.
pub fn build_router(state: AppState) -> Router {
    let browse_html = state.docroot.join("browse.html");

    Router::new()
        .route("/", get(root_redirect))
        .route_service("/browse", ServeFile::new(browse_html))
        .route("/entries", get(http::get_entries))
        .route("/fields/*name", get(http::get_fields))
        .route("/machine", get(http::get_machine))
        .fallback(fallback_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `GET /` redirects to `/browse` with a body carrying a link, rather
/// than a bare empty redirect.
async fn root_redirect() -> Response {
    let body = "<html><body>Redirecting to <a href=\"/browse\">/browse</a></body></html>\n";
    (
        StatusCode::MOVED_PERMANENTLY,
        [
            (header::LOCATION, "/browse"),
            (header::CONTENT_TYPE, "text/html"),
        ],
        body,
    )
        .into_response()
}

async fn fallback_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found\n")
}
