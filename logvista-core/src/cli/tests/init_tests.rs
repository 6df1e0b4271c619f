use crate::cli::init::write_template;
use crate::conf::load_config;
use crate::conf::types::UaEngineKind;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn written_template_loads_and_validates() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("etc").join("logvista.hcl");

    // Act
    write_template(&path).unwrap();
    let validated = load_config(&path).unwrap();

    // Assert
    let config = validated.config;
    assert_eq!(config.sites.len(), 1);
    assert_eq!(config.sites[0].id, "example");
    assert_eq!(config.server.batch_size, 100);
    assert_eq!(config.pv_filter.status_codes, vec![200]);
    assert!(!config.identity.enable_geoip);
    assert_eq!(config.identity.ua_engine, UaEngineKind::Woothee);
    assert!(validated.report.errors.is_empty());
}

#[test]
fn existing_config_is_left_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logvista.hcl");
    std::fs::write(&path, "# mine\n").unwrap();

    let err = write_template(&path).unwrap_err();

    assert!(err.to_string().contains("refusing to overwrite"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
}
