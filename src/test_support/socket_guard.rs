use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_ENV: &str = "METALINK_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

#[track_caller]
fn localhost_unavailable() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] no localhost socket at {}:{}; wiremock test cannot run here",
        location.file(),
        location.line()
    );
    assert!(
        !socket_tests_required(),
        "{message}. Unset {REQUIRE_SOCKET_TESTS_ENV} to skip instead."
    );
    eprintln!("{message}. Skipping. Set {REQUIRE_SOCKET_TESTS_ENV}=1 to fail instead.");
    true
}

/// Starts a mock server, or returns `None` when sockets are unavailable.
#[track_caller]
pub(crate) fn start_mock_server_or_skip() -> impl Future<Output = Option<MockServer>> {
    let skip = localhost_unavailable();
    async move {
        if skip {
            None
        } else {
            Some(MockServer::start().await)
        }
    }
}
