//! Shared User-Agent string for metalink and mirror HTTP requests.

/// Project URL for User-Agent identification (good citizenship; RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/metalink-resolver";

/// Default User-Agent for every request (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("metalink-resolver/{version} (+{PROJECT_UA_URL})")
}
