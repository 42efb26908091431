//! User-Agent sent with every request to the conversion service.

/// Default User-Agent (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("note-converter/{version}")
}
