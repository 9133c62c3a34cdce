use csp::CspConfig;

#[test]
fn partial_toml_keeps_defaults() {
    let config: CspConfig = toml::from_str(
        r#"
        register_function = "app.csp.register"
        nonce = "bm9uY2U="
        "#,
    )
    .expect("parse config");
    assert_eq!(config.register_function, "app.csp.register");
    assert_eq!(config.nonce.as_deref(), Some("bm9uY2U="));
    assert!(config.generate_ids);
    assert!(config.execute_scripts_on_end_document);
    assert!(config.validate().is_ok());
}

#[test]
fn empty_toml_is_default() {
    let config: CspConfig = toml::from_str("").expect("parse config");
    assert_eq!(config, CspConfig::default());
}

#[test]
fn unknown_keys_are_rejected() {
    let result = toml::from_str::<CspConfig>("registerFunction = \"x\"");
    assert!(result.is_err());
}

#[test]
fn parsed_config_is_still_validated() {
    let config: CspConfig = toml::from_str("id_separator = \"\"").expect("parse config");
    assert!(config.validate().is_err());
}
