use fixture_core::config::FixtureConfig;
use fixture_core::error::CoreError;
use fixture_core::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;

/// **VALUE**: Verifies `ConfigError::ParseError` names the file and the parser's reason.
///
/// **WHY THIS MATTERS**: A broken fixture.json should be fixable from the error line alone.
///
/// **BUG THIS CATCHES**: Would catch the path or reason being dropped from the message.
#[test]
fn given_parse_error_when_formatted_then_includes_path_and_reason() {
    // GIVEN: A parse failure from real input
    let err = FixtureConfig::parse("{ \"server\": ", Path::new("/work/fixture.json"))
        .expect_err("Truncated JSON should not parse");

    // WHEN: Formatting
    let error_string = err.to_string();

    // THEN: Kind, path and location present
    assert!(error_string.starts_with("Config Parse Error"));
    assert!(error_string.contains("/work/fixture.json"));
    assert!(error_string.contains(".rs:"));
}

/// **VALUE**: Verifies `#[track_caller]` on `parse()` attributes errors to the caller.
///
/// **WHY THIS MATTERS**: Config is loaded from several places (tests, the app). The location
/// should point at the one that failed, not inside the config module.
///
/// **BUG THIS CATCHES**: Would catch `#[track_caller]` being dropped from `parse()`/`validate()`.
#[test]
fn given_validation_failure_when_location_read_then_points_at_this_file() {
    // GIVEN / WHEN: An invalid version parsed from here
    let err = FixtureConfig::parse(r#"{ "version": 0 }"#, Path::new("inline"))
        .expect_err("Version 0 should be rejected");

    // THEN: Location is in this test file
    assert!(matches!(err, ConfigError::ValidationError { .. }));
    assert!(
        err.location().file.ends_with("config.rs"),
        "Location should be this file, got {}",
        err.location()
    );
}

/// **VALUE**: Verifies config errors convert into `CoreError` transparently.
///
/// **WHY THIS MATTERS**: The app handles `CoreError` for both config and launch failures.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[from]` on the Config variant.
#[test]
fn given_config_error_when_converted_to_core_error_then_display_is_transparent() {
    let location = ErrorLocation::from(Location::caller());
    let err = ConfigError::ValidationError {
        location,
        reason: "cluster_id cannot be empty string".to_string(),
    };
    let expected = err.to_string();

    let core = CoreError::from(err);

    assert_eq!(core.to_string(), expected);
    assert_eq!(core.location(), location);
}
