//! Traversal session span helpers.

use tracing::Span;

use crate::model::ItemRef;

/// Start a span covering one traversal session.
///
/// `session.current` is declared empty and updated via [`record_advance`].
pub fn start_session_span(folder: &str, worklist: Option<&str>) -> Span {
    tracing::info_span!(
        "worklist.session",
        "session.folder" = folder,
        "session.worklist" = worklist.unwrap_or("-"),
        "session.current" = tracing::field::Empty,
    )
}

/// Record moving from one item to the next on the session span.
pub fn record_advance(span: &Span, from: Option<&ItemRef>, to: Option<&ItemRef>, result: &str) {
    let to_display = to.map(ToString::to_string).unwrap_or_else(|| "none".to_string());
    span.record("session.current", to_display.as_str());
    span.in_scope(|| {
        tracing::info!(
            from = %from.map(ToString::to_string).unwrap_or_else(|| "none".to_string()),
            to = %to_display,
            result,
            "advanced"
        );
    });
}
