//! Configuration loading and validation tests
//!
//! Tests focus on observable behavior of loading: defaults, path resolution
//! and rejection of unusable policies.

use geocluster::config::{ConfigError, PipelineConfig};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;


#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[data]
orders = "/data/orders.json"
geolocations = "/data/geolocations.json"
static_reference = "/data/static_reference_data.json"
inventory = "/data/inventory.json"

[clustering]
resolution = 7

[validation]
strict = true
"#
    )
    .unwrap();

    let config = PipelineConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.clustering.resolution, 7);
    assert!(config.validation.strict);
    assert_eq!(config.validation.high_priority, "high");

    // Absolute paths are kept as written
    let sources = config.data_sources().unwrap();
    assert_eq!(sources.orders, PathBuf::from("/data/orders.json"));
}

#[test]
fn test_relative_paths_resolve_against_config_directory() {
    let workspace = test_helpers::workspace();
    let config = workspace.config();

    let sources = config.data_sources().unwrap();
    assert_eq!(sources.orders, workspace.path("orders.json"));
    assert_eq!(sources.inventory, workspace.path("inventory.json"));
    assert!(sources.geolocations.exists());
}

#[test]
fn test_delivery_time_overrides() {
    let workspace = test_helpers::workspace_with(
        r#"
[delivery_time]
kg_per_unit = 100.0
minutes_per_unit = 30.0
"#,
    );

    let config = workspace.config();
    assert_eq!(config.delivery_time.kg_per_unit, 100.0);
    assert_eq!(config.delivery_time.minutes_per_unit, 30.0);
    assert_eq!(config.delivery_time.decimals, 2);
}

#[test]
fn test_missing_config_file_fails_with_file_read() {
    let result = PipelineConfig::load_from_file(&PathBuf::from("/nonexistent/geocluster.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_invalid_toml_fails_with_parse_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[clustering\nresolution = ").unwrap();

    let result = PipelineConfig::load_from_file(temp_file.path());
    assert!(matches!(result, Err(ConfigError::TomlParse(_))));
}

#[test]
fn test_out_of_range_resolution_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[clustering]\nresolution = 16").unwrap();

    let result = PipelineConfig::load_from_file(temp_file.path());
    match result {
        Err(ConfigError::InvalidConfig(message)) => assert!(message.contains("resolution")),
        other => panic!("expected invalid config, got {other:?}"),
    }
}

#[test]
fn test_non_positive_throughput_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[delivery_time]\nkg_per_unit = -5.0").unwrap();

    assert!(matches!(
        PipelineConfig::load_from_file(temp_file.path()),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
fn test_config_without_data_section_cannot_load_sources() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[clustering]\nresolution = 5").unwrap();

    let config = PipelineConfig::load_from_file(temp_file.path()).unwrap();
    assert!(matches!(
        config.data_sources(),
        Err(ConfigError::InvalidConfig(_))
    ));
}
