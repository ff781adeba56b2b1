//! `/entries` — streams journal records under client-controlled filters,
//! pagination, and follow mode.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::Response;

use crate::error::GatewayError;
use crate::output_mode::OutputMode;
use crate::parse::{parse_query, parse_range};
use crate::state::AppState;
use crate::stream::{entry_pump, EntryPumpConfig};

pub async fn get_entries(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, GatewayError> {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok());
    let mode = OutputMode::from_accept(accept);

    let range_spec = match headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        Some(raw) => parse_range(raw)?,
        None => None,
    };
    let query_args = parse_query(uri.query())?;

    let mut n_skip = 0i64;
    let mut n_entries = None;
    let mut cursor = None;
    if let Some(range) = range_spec {
        n_skip = range.n_skip;
        n_entries = range.n_entries;
        cursor = range.cursor;
    }

    let discrete = query_args.discrete;
    if discrete && cursor.is_none() {
        return Err(GatewayError::BadRequest(
            "discrete seeks require a cursor specification".to_owned(),
        ));
    }
    if discrete {
        n_entries = Some(1);
    }

    let mut journal = state.journal.handle();
    for (key, value) in &query_args.matches {
        journal.add_match(key, value)?;
    }

    match &cursor {
        Some(c) => journal.seek_cursor(c).await?,
        None if n_skip >= 0 => journal.seek_head(),
        None => journal.seek_tail(),
    }

    let cfg = EntryPumpConfig {
        mode,
        n_skip,
        n_entries,
        follow: query_args.follow,
        discrete,
        discrete_cursor: cursor,
    };
    let body = Body::from_stream(entry_pump(journal, cfg));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mode.mime())
        .body(body)
        .expect("response with a streamed body is always well-formed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::body::to_bytes;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn no_headers_yields_forward_order_from_oldest() {
        let (state, journal) = test_state().await;
        for i in 0..3 {
            journal
                .append(vec![("MESSAGE".to_owned(), format!("m{i}"))])
                .await
                .unwrap();
        }
        let router = crate::build_router(state);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/entries")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("m0"));
        assert!(lines[2].contains("m2"));
    }

    #[tokio::test]
    async fn empty_journal_returns_200_with_empty_body() {
        let (state, _journal) = test_state().await;
        let router = crate::build_router(state);
        let resp = router
            .oneshot(Request::builder().uri("/entries").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn discrete_without_cursor_is_400() {
        let (state, _journal) = test_state().await;
        let router = crate::build_router(state);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/entries?discrete")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_range_is_400() {
        let (state, _journal) = test_state().await;
        let router = crate::build_router(state);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/entries")
                    .header(header::RANGE, "entries=abc:0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn range_cursor_with_skip_zero_emits_from_that_record() {
        let (state, journal) = test_state().await;
        let mut cursors = Vec::new();
        for i in 0..3 {
            let c = journal
                .append(vec![("MESSAGE".to_owned(), format!("m{i}"))])
                .await
                .unwrap();
            cursors.push(c);
        }
        let router = crate::build_router(state);
        let range = format!("entries={}:0:2", cursors[1]);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/entries")
                    .header(header::ACCEPT, "application/json")
                    .header(header::RANGE, range)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("m1"));
        assert!(lines[1].contains("m2"));
    }
}
