use fixture_core::error::CoreError;
use fixture_core::error::launch::LaunchError;

use common::ErrorLocation;

use std::error::Error;
use std::io::Error as IoError;
use std::io::ErrorKind;
use std::panic::Location;
use std::path::PathBuf;

/// **VALUE**: Verifies that `LaunchError::Spawn` Display includes kind, message, and location.
///
/// **WHY THIS MATTERS**: A failed fixture launch is usually seen as a single line in test
/// output. It must say what failed and where the launch was attempted.
///
/// **BUG THIS CATCHES**: Would catch the `{location}` suffix or the "Spawn Error" prefix being
/// dropped from the `#[error]` format.
#[test]
fn given_spawn_error_when_formatted_then_includes_location() {
    // GIVEN: A Spawn error with location
    let err = LaunchError::Spawn {
        message: "Failed to spawn [target/nats-streaming-server]".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: IoError::new(ErrorKind::NotFound, "binary not found"),
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{}", err);

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Spawn Error"));
    assert!(error_string.contains("target/nats-streaming-server"));
    assert!(error_string.contains("launch.rs"));
}

/// **VALUE**: Verifies that the OS error is preserved as the source of a Spawn error.
///
/// **WHY THIS MATTERS**: "permission denied" and "not found" need different fixes; callers
/// and logs must be able to reach the underlying `io::Error`.
///
/// **BUG THIS CATCHES**: Would catch someone removing `#[source]` from `LaunchError::Spawn`.
#[test]
fn given_spawn_error_with_source_when_inspected_then_preserves_chain() {
    // GIVEN: A Spawn error wrapping PermissionDenied
    let err = LaunchError::Spawn {
        message: "Spawn failed".to_string(),
        location: ErrorLocation::from(Location::caller()),
        source: IoError::new(ErrorKind::PermissionDenied, "permission denied"),
    };

    // WHEN: Accessing the error source
    let source = err.source();

    // THEN: Should preserve the original OS error
    let source = source.expect("Should have error source");
    assert!(format!("{}", source).contains("permission denied"));
    let io = source
        .downcast_ref::<IoError>()
        .expect("Source should be an io::Error");
    assert_eq!(io.kind(), ErrorKind::PermissionDenied);
}

/// **VALUE**: Verifies every LaunchError variant reports the location it was built with.
///
/// **WHY THIS MATTERS**: The app re-wraps core errors and keeps the original location, so
/// `location()` must cover every variant.
///
/// **BUG THIS CATCHES**: Would catch a new variant being added without a `location()` arm
/// returning the right field.
#[test]
fn given_each_launch_variant_when_location_read_then_matches_construction_site() {
    // GIVEN: One location shared by every variant
    let location = ErrorLocation::from(Location::caller());
    let errors = vec![
        LaunchError::Spawn {
            message: String::new(),
            location,
            source: IoError::other("x"),
        },
        LaunchError::WorkingDirectory {
            message: String::new(),
            location,
            path: PathBuf::from("target"),
        },
        LaunchError::Executable {
            message: String::new(),
            location,
            source: IoError::other("x"),
        },
        LaunchError::AlreadyRunning {
            message: String::new(),
            location,
        },
    ];

    // WHEN / THEN: Each reports it
    for err in errors {
        assert_eq!(err.location(), location, "Wrong location for {err:?}");
    }
}

/// **VALUE**: Verifies `CoreError` forwards Display and location transparently.
///
/// **WHY THIS MATTERS**: Callers that only handle `CoreError` should still see the original
/// message and call site.
///
/// **BUG THIS CATCHES**: Would catch `#[error(transparent)]` being replaced by a generic
/// message that hides the cause.
#[test]
fn given_launch_error_when_converted_to_core_error_then_display_is_transparent() {
    // GIVEN: A launch error
    let location = ErrorLocation::from(Location::caller());
    let launch = LaunchError::AlreadyRunning {
        message: "handle already owns a server".to_string(),
        location,
    };
    let expected = launch.to_string();

    // WHEN: Converting with `?`-style From
    let core: CoreError = launch.into();

    // THEN: Same text, same location
    assert_eq!(core.to_string(), expected);
    assert_eq!(core.location(), location);
}
