// SPDX-FileCopyrightText: 2026 Plugboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Plugboard configuration system.

use std::path::PathBuf;

use plugboard_config::diagnostic::{ConfigError, suggest_key};
use plugboard_config::{
    ConfigFormat, HostConfig, ModuleConfigFile, load_and_validate_str, load_config_from_path,
    load_config_from_str,
};

#[test]
fn full_config_deserializes() {
    let toml = r#"
[plugin]
location = "/srv/plugins"
host_prefixes = ["shared.util."]

[extensions]
only = "greeter"
exclude = ["legacy"]

[logging]
level = "debug"

[greeter]
prefix = "hello"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.plugin.location, Some(PathBuf::from("/srv/plugins")));
    assert_eq!(config.plugin.host_prefixes, vec!["shared.util."]);
    assert_eq!(config.extensions.only.as_deref(), Some("greeter"));
    assert_eq!(config.extensions.exclude, vec!["legacy"]);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn empty_config_uses_defaults() {
    let config = load_config_from_str("").unwrap();
    assert!(config.plugin.location.is_none());
    assert!(config.plugin.host_prefixes.is_empty());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn unknown_key_in_plugin_section_gets_suggestion() {
    let toml = "[plugin]\nlocaton = \"/srv/plugins\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "locaton");
            assert_eq!(suggestion.as_deref(), Some("location"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = "[extensions]\nexclude = 5\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
    assert!(errors[0].to_string().contains("extensions.exclude"));
}

#[test]
fn validation_errors_surface_through_load() {
    let errors = load_and_validate_str("[logging]\nlevel = \"chatty\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn suggest_key_is_public() {
    assert_eq!(
        suggest_key("exclud", &["only", "exclude"]),
        Some("exclude".to_string())
    );
}

#[test]
fn load_from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugboard.toml");
    std::fs::write(&path, "[plugin]\nlocation = \"plugins\"\n").unwrap();
    let config = load_config_from_path(&path).unwrap();
    assert_eq!(config.plugin.location, Some(PathBuf::from("plugins")));
}

#[test]
fn module_view_exposes_host_application_tables() {
    let host = HostConfig::from_toml_str("[greeter]\nprefix = \"hi\"\n");
    let view = host.module_view(&[ModuleConfigFile::new(
        "alpha:config/greeter.yaml",
        ConfigFormat::Yaml,
        "greeter:\n  name: alpha\n",
    )]);
    let prefix: String = view.extract_inner("greeter.prefix").unwrap();
    let name: String = view.extract_inner("greeter.name").unwrap();
    assert_eq!(prefix, "hi");
    assert_eq!(name, "alpha");
}
