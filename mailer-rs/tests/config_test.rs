//! Configuration loading from files and environment

use mailer_rs::config::{Config, SmtpSecurity};
use mailer_rs::transport::build_transport;
use mailer_rs::MailerError;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        [server]
        base_url = "https://track.corp.example/"

        [sender]
        address = "it-security@corp.example"
        name = "IT Security"

        [transport]
        provider = "smtp"

        [transport.smtp]
        host = "smtp.corp.example"
        port = 2525
        security = "none"

        [dispatch]
        concurrency = 2

        [logging]
        format = "json"
        "#,
    );

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.server.base_url, "https://track.corp.example/");
    assert_eq!(config.sender.address, "it-security@corp.example");
    let smtp = config.transport.smtp.as_ref().unwrap();
    assert_eq!(smtp.port, 2525);
    assert_eq!(smtp.security, SmtpSecurity::None);
    assert_eq!(config.dispatch.concurrency, 2);
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_from_file_matches_load() {
    let file = write_config(
        r#"
        [sender]
        address = "a@corp.example"

        [transport]
        provider = "log"
        "#,
    );

    let direct = Config::from_file(file.path()).unwrap();
    let layered = Config::load(Some(file.path())).unwrap();

    assert_eq!(direct.sender.address, layered.sender.address);
    assert_eq!(direct.transport.provider, layered.transport.provider);
    assert_eq!(direct.dispatch.concurrency, layered.dispatch.concurrency);
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    assert!(Config::load(Some(&missing)).is_err());
    assert!(matches!(
        Config::from_file(&missing),
        Err(MailerError::Config(_))
    ));
}

#[test]
fn test_load_validates() {
    let file = write_config(
        r#"
        [sender]
        address = "a@corp.example"

        [logging]
        format = "xml"
        "#,
    );

    assert!(matches!(
        Config::load(Some(file.path())),
        Err(MailerError::Config(_))
    ));
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
        [server]
        listen_addr = "127.0.0.1:9000"

        [sender]
        address = "a@corp.example"
        "#,
    );

    // Only this test touches the variable and only this field is asserted
    std::env::set_var("MAILER__SERVER__LISTEN_ADDR", "127.0.0.1:9100");
    let config = Config::load(Some(file.path()));
    std::env::remove_var("MAILER__SERVER__LISTEN_ADDR");

    assert_eq!(config.unwrap().server.listen_addr, "127.0.0.1:9100");
}

#[test]
fn test_development_config_builds_log_transport() {
    let config = Config::development();
    config.validate().unwrap();

    let transport = build_transport(&config.transport).unwrap();
    assert_eq!(transport.provider(), "log");
}

#[test]
fn test_smtp_provider_without_section_fails() {
    let file = write_config(
        r#"
        [sender]
        address = "a@corp.example"
        "#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert!(matches!(
        build_transport(&config.transport),
        Err(MailerError::Config(_))
    ));
}
