// Library exports for the binary and integration tests

pub mod aws_session;
pub mod catalog;
pub mod cloud_storage;
pub mod config;
pub mod content_id;
pub mod encryption;
pub mod import;
pub mod secure_config;

// Test support (unit tests, or integration tests with the test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;
