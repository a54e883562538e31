// tests/logging_filters.rs

use taskdag::logging::filter_from_env_value;

#[test]
fn test_bare_levels_are_normalised() {
    let filter = filter_from_env_value(" WARNING ").expect("level should parse");
    assert_eq!(filter.to_string(), "warn");

    let filter = filter_from_env_value("debug").expect("level should parse");
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn test_directive_strings_pass_through() {
    assert!(filter_from_env_value("taskdag::exec=debug,info").is_some());
}

#[test]
fn test_blank_value_is_ignored() {
    assert!(filter_from_env_value("").is_none());
    assert!(filter_from_env_value("   ").is_none());
}
