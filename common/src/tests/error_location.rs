use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column of the call site.
///
/// **WHY THIS MATTERS**: Every launch and config error in the fixture carries an ErrorLocation.
/// If it records the wrong position, a failed server launch in a test points nowhere useful.
///
/// **BUG THIS CATCHES**: Would catch if the `file`, `line` or `column` fields stop being
/// copied from the panic location.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: Current caller location, with the expected line recorded on the same line
    // WHEN: Creating ErrorLocation from caller
    let (location, expected_line) = (ErrorLocation::from(Location::caller()), line!());

    // THEN: Should capture file, line, and column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, expected_line, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies that ErrorLocation Display formatting produces `[file:line:column]`.
///
/// **WHY THIS MATTERS**: Every error Display string ends with this suffix. Log scrapers and
/// humans both rely on the bracketed shape to find where a launch failed.
///
/// **BUG THIS CATCHES**: Would catch if the Display implementation drops the brackets or
/// one of the three components.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting as string
    let formatted = format!("{}", location);

    // THEN: Should produce "[file:line:column]" format
    assert!(formatted.starts_with('['), "Should start with '['");
    assert!(formatted.ends_with(']'), "Should end with ']'");
    assert_eq!(
        formatted,
        format!("[{}:{}:{}]", location.file, location.line, location.column)
    );
}

/// **VALUE**: Verifies that `#[track_caller]` propagation reports each call site separately.
///
/// **WHY THIS MATTERS**: `ProcessHandle::launch()` and `LaunchConfig::resolve()` are
/// `#[track_caller]`. If propagation breaks, every error points at the same constructor line.
///
/// **BUG THIS CATCHES**: Would catch if `ErrorLocation::from()` is wrapped in a helper that
/// loses the caller, collapsing distinct call sites onto one line.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    // GIVEN: A helper function that captures location
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing location from different call sites
    let loc1 = capture_location();
    let loc2 = capture_location();

    // THEN: Should have same file but sequential line numbers
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
    assert_ne!(loc1, loc2, "Distinct call sites should not compare equal");
}
