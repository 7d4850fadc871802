//! Configuration loading tests.
//!
//! Runs in its own test binary (own process) so the environment mutations
//! cannot race other tests.

use booklib_server::config::AppConfig;

#[test]
fn test_env_overrides_reach_nested_keys() {
    std::env::set_var("BOOKLIB_DATABASE__MAX_CONNECTIONS", "42");
    std::env::set_var("BOOKLIB_SERVER__PORT", "9090");

    let config = AppConfig::load().expect("configuration should load");
    assert_eq!(config.database.max_connections, 42);
    assert_eq!(config.server.port, 9090);

    std::env::remove_var("BOOKLIB_DATABASE__MAX_CONNECTIONS");
    std::env::remove_var("BOOKLIB_SERVER__PORT");
}
