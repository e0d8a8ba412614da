//! Quoted-history removal for reply bodies.
//!
//! Mail clients append the previous conversation below a marker line
//! ("On ... wrote:", "-----Original Message-----", ...). Each marker is a
//! `QuoteBoundary`; boundaries are applied in a fixed order, each one
//! truncating whatever the previous ones left behind.

use std::sync::LazyLock;

use regex::Regex;

/// A single quote marker with its compiled pattern.
#[derive(Debug)]
pub struct QuoteBoundary {
    /// Short label used in debug logs.
    pub name: &'static str,
    pub regex: Regex,
}

/// Boundaries in application order. The `wrote:` matcher must stay first:
/// the broad `From:` matcher would otherwise cut earlier on bodies that
/// carry both markers.
static BOUNDARIES: LazyLock<Vec<QuoteBoundary>> = LazyLock::new(|| {
    vec![
        // "On Sat, Jan 10, 2026 at 9:35 PM <x@y.com>\nwrote:" may wrap.
        QuoteBoundary {
            name: "on_wrote",
            regex: Regex::new(r"(?is)On\s+.*?wrote:").unwrap(),
        },
        QuoteBoundary {
            name: "original_message",
            regex: Regex::new(r"(?i)-+\s*Original Message\s*-+").unwrap(),
        },
        QuoteBoundary {
            name: "from_header",
            regex: Regex::new(r"(?im)^[ \t]*From:\s+.*").unwrap(),
        },
        QuoteBoundary {
            name: "underscore_rule",
            regex: Regex::new(r"_{32,}").unwrap(),
        },
    ]
});

/// The boundary list, in the order `strip_quoted_text` applies it.
pub fn boundaries() -> &'static [QuoteBoundary] {
    &BOUNDARIES
}

/// Strip quoted history from an email body, keeping only the new text.
///
/// Never fails; empty input yields an empty string. A body with no
/// recognised marker comes back trimmed but otherwise unchanged.
pub fn strip_quoted_text(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }

    let mut working = body;
    for boundary in boundaries() {
        if let Some(m) = boundary.regex.find(working) {
            tracing::trace!(boundary = boundary.name, at = m.start(), "Quote boundary found");
            working = &working[..m.start()];
        }
    }

    working.trim().to_string()
}
