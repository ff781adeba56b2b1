//! A tagged variant selecting both the MIME type a response advertises
//! and the on-wire encoding the serializer emits for it.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Short,
    Json,
    JsonSse,
    Export,
}

impl OutputMode {
    pub fn mime(self) -> &'static str {
        match self {
            OutputMode::Short => "text/plain",
            OutputMode::Json => "application/json",
            OutputMode::JsonSse => "text/event-stream",
            OutputMode::Export => "application/vnd.fdo.journal",
        }
    }

    /// Exact-match against the `Accept` header; unrecognized or absent
    /// values fall back to `Short`.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some("application/json") => OutputMode::Json,
            Some("text/event-stream") => OutputMode::JsonSse,
            Some("application/vnd.fdo.journal") => OutputMode::Export,
            None | Some(_) => OutputMode::Short,
        }
    }
}
