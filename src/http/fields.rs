//! `/fields/<NAME>` — streams each unique value observed for a field.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;

use crate::error::GatewayError;
use crate::output_mode::OutputMode;
use crate::state::AppState;
use crate::stream::field_pump;

pub async fn get_fields(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, GatewayError> {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    let mode = OutputMode::from_accept(accept);

    // Only JSON vs plaintext is meaningful here; JsonSse/Export degrade
    // to plaintext.
    let content_type = if mode == OutputMode::Json {
        "application/json"
    } else {
        "text/plain"
    };

    let journal = state.journal.handle();
    let body = Body::from_stream(field_pump(journal, name, mode));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
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
    async fn emits_each_unique_value_once_as_json_object_per_line() {
        let (state, journal) = test_state().await;
        for unit in ["a.service", "b.service", "a.service"] {
            journal
                .append(vec![("UNIT".to_owned(), unit.to_owned())])
                .await
                .unwrap();
        }
        let router = crate::build_router(state);
        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/fields/UNIT")
                    .header(header::ACCEPT, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("a.service"));
        assert!(lines[1].contains("b.service"));
    }

    #[tokio::test]
    async fn plaintext_mode_emits_bare_values() {
        let (state, journal) = test_state().await;
        journal
            .append(vec![("UNIT".to_owned(), "a.service".to_owned())])
            .await
            .unwrap();
        let router = crate::build_router(state);
        let resp = router
            .oneshot(Request::builder().uri("/fields/UNIT").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain"
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"a.service\n");
    }
}
