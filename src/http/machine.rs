//! `/machine` — one-shot JSON host metadata.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::GatewayError;
use crate::state::AppState;

pub async fn get_machine(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let journal = state.journal.handle();
    let usage = journal.get_usage().await?;
    let (cutoff_from, cutoff_to) = journal.get_cutoff_realtime_usec().await?;

    let body = json!({
        "machine_id": journal.machine_id(),
        "boot_id": journal_core::process_boot_id(),
        "hostname": current_hostname(),
        "os_pretty_name": read_os_pretty_name(),
        "virtualization": "bare",
        "usage": usage.to_string(),
        "cutoff_from_realtime": cutoff_from.to_string(),
        "cutoff_to_realtime": cutoff_to.to_string(),
    });

    Ok(Json(body).into_response())
}

/// `hostname_cleanup()` in the original strips control characters from
/// `gethostname()`'s result. We have no single portable hostname syscall
/// in std, so prefer `/proc/sys/kernel/hostname`, then `$HOSTNAME`, then
/// a fixed fallback — the cleanup step applies regardless of source.
fn current_hostname() -> String {
    if let Ok(raw) = std::fs::read_to_string("/proc/sys/kernel/hostname") {
        return hostname_cleanup(raw.trim());
    }
    if let Ok(raw) = std::env::var("HOSTNAME") {
        return hostname_cleanup(&raw);
    }
    "localhost".to_owned()
}

fn hostname_cleanup(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_control()).collect()
}

fn read_os_pretty_name() -> String {
    let Ok(contents) = std::fs::read_to_string("/etc/os-release") else {
        return "Linux".to_owned();
    };
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("PRETTY_NAME=") {
            return rest.trim_matches('"').to_owned();
        }
    }
    "Linux".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    #[test]
    fn hostname_cleanup_strips_control_characters() {
        assert_eq!(hostname_cleanup("host\n\t.local"), "host.local");
    }

    #[tokio::test]
    async fn machine_endpoint_has_exactly_the_documented_keys() {
        let (state, _journal) = test_state().await;
        let router = crate::build_router(state);
        let resp = router
            .oneshot(Request::builder().uri("/machine").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = vec![
            "machine_id",
            "boot_id",
            "hostname",
            "os_pretty_name",
            "virtualization",
            "usage",
            "cutoff_from_realtime",
            "cutoff_to_realtime",
        ];
        expected.sort_unstable();
        assert_eq!(keys, expected);
        assert!(value["machine_id"].as_str().unwrap().len() == 32);
    }
}
