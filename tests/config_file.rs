use solar_estimator::EstimatorConfig;

#[test]
fn shipped_config_matches_built_in_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.json");
    let config = EstimatorConfig::load(path).unwrap();
    assert_eq!(config, EstimatorConfig::default());
}

#[test]
fn printed_config_loads_back() {
    let config = EstimatorConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("site.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    assert_eq!(EstimatorConfig::load(&path).unwrap(), config);
}
