#![allow(dead_code)]

use std::sync::Once;

pub mod fakes;
pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        jim_rust::logging::init_test_logging();
    });
}

/// Import settings with intervals short enough for tests.
pub fn test_settings() -> jim_rust::migrate::ImportSettings {
    jim_rust::migrate::ImportSettings {
        default_assignee: "importer".to_string(),
        source_name: "Example JIRA".to_string(),
        body_limit: 65536,
        poll_timeout: std::time::Duration::from_secs(5),
        poll_interval: std::time::Duration::from_millis(1),
        transient_error_resources: vec!["Internal Error".to_string()],
        collaborator_permission: "pull".to_string(),
    }
}

/// A retry policy that does not slow tests down.
pub fn fast_policy() -> jim_rust::github::retry::RetryPolicy {
    jim_rust::github::retry::RetryPolicy::new(std::time::Duration::from_millis(1))
}
