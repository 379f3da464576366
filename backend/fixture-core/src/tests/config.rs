// Unit tests for fixture configuration
// Covers fixture.json loading, validation and launch path resolution

use crate::config::{CONFIG_FILE_NAME, FixtureConfig, LaunchConfig, ServerConfig};
use crate::error::config::ConfigError;
use crate::{STAN_SERVER, STAN_SERVER_DIR};

use std::ffi::OsString;
use std::fs::write;
use std::path::{Path, PathBuf};

use tempfile::tempdir;

// ============================================
// LOADING
// ============================================

/// **VALUE**: Verifies a missing fixture.json yields the defaults.
///
/// **WHY THIS MATTERS**: Most checkouts never create a config file. Loading must not fail
/// just because it is absent.
///
/// **BUG THIS CATCHES**: Would catch `load()` returning a ReadError for NotFound.
#[test]
fn given_missing_config_file_when_load_called_then_returns_defaults() {
    // GIVEN: An empty directory
    let dir = tempdir().unwrap();

    // WHEN: Loading config
    let config = FixtureConfig::load(dir.path()).unwrap();

    // THEN: Defaults
    assert_eq!(config, FixtureConfig::default());
    assert_eq!(config.server, ServerConfig::default());
    assert!(!config.server.verbose);
}

/// **VALUE**: Verifies a complete fixture.json is parsed into every field.
///
/// **WHY THIS MATTERS**: Developers point the fixture at a locally built server binary through
/// this file. A silently ignored field means tests run against the wrong binary.
///
/// **BUG THIS CATCHES**: Would catch serde field renames or nesting mistakes.
#[test]
fn given_full_config_file_when_load_called_then_all_fields_parsed() {
    // GIVEN: A fixture.json with every field
    let dir = tempdir().unwrap();
    write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{
            "version": 1,
            "server": { "cluster_id": "test-cluster", "port": 4333, "verbose": true },
            "launch": { "executable": "/usr/local/bin/nats-streaming-server", "working_directory": "/tmp" }
        }"#,
    )
    .unwrap();

    // WHEN: Loading
    let config = FixtureConfig::load(dir.path()).unwrap();

    // THEN: Fields match
    assert_eq!(config.server.cluster_id.as_deref(), Some("test-cluster"));
    assert_eq!(config.server.port, Some(4333));
    assert!(config.server.verbose);
    assert_eq!(
        config.launch.executable,
        Some(PathBuf::from("/usr/local/bin/nats-streaming-server"))
    );
    assert_eq!(config.launch.working_directory, Some(PathBuf::from("/tmp")));
}

/// **VALUE**: Verifies a privileged port in the file is accepted, then dropped at argv time.
///
/// **WHY THIS MATTERS**: Out-of-range ports are normalized, never rejected. A config file with
/// `"port": 80` must still start a server.
///
/// **BUG THIS CATCHES**: Would catch someone adding port range validation to `validate()`.
#[test]
fn given_privileged_port_in_file_when_load_called_then_accepted_and_normalized() {
    let dir = tempdir().unwrap();
    write(
        dir.path().join(CONFIG_FILE_NAME),
        r#"{ "server": { "port": 80 } }"#,
    )
    .unwrap();

    let config = FixtureConfig::load(dir.path()).unwrap();

    assert_eq!(config.server.port, Some(80));
    assert_eq!(config.server.effective_port(), None);
}

/// **VALUE**: Verifies malformed JSON returns a ParseError naming the file.
///
/// **WHY THIS MATTERS**: A typo in fixture.json should fail loudly with the path, not quietly
/// fall back to defaults and launch a different binary.
///
/// **BUG THIS CATCHES**: Would catch parse errors being swallowed or losing the path.
#[test]
fn given_malformed_json_when_load_called_then_returns_parse_error() {
    // GIVEN: Broken JSON
    let dir = tempdir().unwrap();
    write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

    // WHEN: Loading
    let result = FixtureConfig::load(dir.path());

    // THEN: ParseError with the config path
    match result {
        Err(ConfigError::ParseError { path, .. }) => {
            assert!(path.ends_with(CONFIG_FILE_NAME));
        }
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

/// **VALUE**: Verifies a negative port is a parse error rather than a silent default.
///
/// **WHY THIS MATTERS**: Ports are `u16`. Anything unrepresentable is a broken file, which is
/// a different thing from a representable-but-privileged port.
///
/// **BUG THIS CATCHES**: Would catch the port type being widened without updating validation.
#[test]
fn given_negative_port_when_parsed_then_returns_parse_error() {
    let result = FixtureConfig::parse(r#"{ "server": { "port": -1 } }"#, Path::new("inline"));

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

// ============================================
// VALIDATION
// ============================================

/// **VALUE**: Verifies unsupported config versions are rejected.
///
/// **WHY THIS MATTERS**: Version 0 or a future version means the file was written for a
/// different fixture layout.
///
/// **BUG THIS CATCHES**: Would catch the version check being dropped.
#[test]
fn given_unsupported_version_when_parsed_then_returns_validation_error() {
    for raw in [r#"{ "version": 0 }"#, r#"{ "version": 99 }"#] {
        let result = FixtureConfig::parse(raw, Path::new("inline"));

        match result {
            Err(ConfigError::ValidationError { reason, .. }) => {
                assert!(reason.contains("Invalid version"), "Unexpected reason: {reason}");
            }
            other => panic!("Expected ValidationError for {raw}, got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies a blank cluster id in the file is rejected.
///
/// **WHY THIS MATTERS**: `-cluster_id ""` starts a server with an empty cluster name that no
/// client can match.
///
/// **BUG THIS CATCHES**: Would catch the empty-string check being removed.
#[test]
fn given_blank_cluster_id_when_parsed_then_returns_validation_error() {
    let result = FixtureConfig::parse(
        r#"{ "server": { "cluster_id": "  " } }"#,
        Path::new("inline"),
    );

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

// ============================================
// LAUNCH RESOLUTION
// ============================================

/// **VALUE**: Verifies the defaults resolve to `target/nats-streaming-server` run from `target`.
///
/// **WHY THIS MATTERS**: This is where the build drops the server binary. The executable must
/// be absolute because the child runs with a different working directory.
///
/// **BUG THIS CATCHES**: Would catch the default path staying relative, which makes the spawn
/// look for `target/target/nats-streaming-server`.
#[test]
fn given_no_overrides_when_resolved_then_uses_absolute_default_path() {
    // GIVEN: Empty launch config and no env override
    let config = LaunchConfig::default();

    // WHEN: Resolving
    let launch = config.resolve_with(None).unwrap();

    // THEN: Absolute path ending in target/nats-streaming-server, working dir target
    assert!(launch.executable.is_absolute());
    assert!(launch.executable.ends_with(Path::new(STAN_SERVER_DIR).join(STAN_SERVER)));
    assert_eq!(launch.working_directory, PathBuf::from(STAN_SERVER_DIR));
}

/// **VALUE**: Verifies the env override is used when the config has no executable.
///
/// **WHY THIS MATTERS**: CI installs the server outside the build tree and points
/// `STAN_SERVER_BIN` at it.
///
/// **BUG THIS CATCHES**: Would catch the env value being ignored.
#[test]
fn given_env_executable_when_resolved_then_env_wins_over_default() {
    let launch = LaunchConfig::default()
        .resolve_with(Some(OsString::from("/usr/bin/nats-streaming-server")))
        .unwrap();

    assert_eq!(
        launch.executable,
        PathBuf::from("/usr/bin/nats-streaming-server")
    );
}

/// **VALUE**: Verifies an explicit config path beats the env override, and an empty env value
/// is ignored.
///
/// **WHY THIS MATTERS**: A per-project fixture.json must not be silently overridden by a
/// machine-wide environment variable.
///
/// **BUG THIS CATCHES**: Would catch inverted precedence, or `STAN_SERVER_BIN=` resolving to
/// an empty path.
#[test]
fn given_config_and_env_executables_when_resolved_then_config_wins() {
    // GIVEN: Both sources set
    let config = LaunchConfig {
        executable: Some(PathBuf::from("/srv/stan")),
        working_directory: Some(PathBuf::from("/srv")),
    };

    // WHEN / THEN: Config wins
    let launch = config
        .resolve_with(Some(OsString::from("/usr/bin/other")))
        .unwrap();
    assert_eq!(launch.executable, PathBuf::from("/srv/stan"));
    assert_eq!(launch.working_directory, PathBuf::from("/srv"));

    // AND: An empty env value falls through to the default
    let launch = LaunchConfig::default()
        .resolve_with(Some(OsString::new()))
        .unwrap();
    assert!(launch.executable.ends_with(STAN_SERVER));
}

/// **VALUE**: Verifies bare executable names are left for PATH lookup.
///
/// **WHY THIS MATTERS**: `STAN_SERVER_BIN=nats-streaming-server` should find the binary on
/// PATH, not in the current directory.
///
/// **BUG THIS CATCHES**: Would catch absolutizing every relative path, including bare names.
#[test]
fn given_bare_name_when_resolved_then_path_left_untouched() {
    let launch = LaunchConfig::default()
        .resolve_with(Some(OsString::from(STAN_SERVER)))
        .unwrap();

    assert_eq!(launch.executable, PathBuf::from(STAN_SERVER));
}
