//! Test utilities for Toolgate
//!
//! This module provides common test fixtures: data directories laid out as
//! `<identity>/<tool>.json`, auth stores driven by a manual clock, and
//! assertion helpers.

use crate::auth::{AuthStateStore, ManualClock};
use std::fmt;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a data directory holding one file per `(identity, tool, payload)`
///
/// # Panics
///
/// Panics if the directory or any file cannot be created
pub fn data_dir_with(entries: &[(&str, &str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temporary directory");
    for (identity, tool, payload) in entries {
        let identity_dir = dir.path().join(identity);
        std::fs::create_dir_all(&identity_dir).expect("Failed to create identity directory");
        std::fs::write(identity_dir.join(format!("{}.json", tool)), payload)
            .expect("Failed to write test data file");
    }
    dir
}

/// Create a store with the given auth window whose time only moves when the
/// returned clock is advanced
pub fn manual_store(window_minutes: i64) -> (Arc<AuthStateStore>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(AuthStateStore::with_clock(
        chrono::Duration::minutes(window_minutes),
        clock.clone(),
    ));
    (store, clock)
}

/// Assert that a failed result's message contains `expected`
///
/// Works for both [`crate::error::ToolgateError`] and the `anyhow::Error` returned by
/// application-level functions such as `Config::validate`.
///
/// # Panics
///
/// Panics if the result is Ok or its error message lacks `expected`
pub fn assert_error_contains<T, E: fmt::Display>(result: Result<T, E>, expected: &str) {
    let Err(e) = result else {
        panic!("expected an error containing '{}', got Ok", expected);
    };
    let message = e.to_string();
    assert!(
        message.contains(expected),
        "error '{}' does not mention '{}'",
        message,
        expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;

    #[test]
    fn test_data_dir_with_lays_out_identity_tool_files() {
        let dir = data_dir_with(&[("+1111", "fetch_net_worth", "{}")]);
        let path = dir.path().join("+1111").join("fetch_net_worth.json");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }

    #[test]
    fn test_manual_store_follows_clock() {
        let (store, clock) = manual_store(5);
        let id = Identity::from("+1111");
        store.record_login(&id);
        clock.advance(chrono::Duration::minutes(5));
        assert!(!store.is_currently_authenticated(&id));
    }

    #[test]
    #[should_panic(expected = "got Ok")]
    fn test_assert_error_contains_rejects_ok() {
        assert_error_contains(Ok::<(), String>(()), "error");
    }
}
