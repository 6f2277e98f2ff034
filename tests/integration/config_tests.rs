//! Configuration Integration Tests
//!
//! Loads real TOML files through the config builder and checks:
//! - Defaults fill in omitted sections
//! - Explicit values override defaults
//! - Malformed channel IDs are rejected at load time

use buywatch_operator::config::AppConfig;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

const MINIMAL: &str = r#"
[discord]
bot_token = "bot-secret"
feed_channel_id = 111
discussion_channel_id = 222

[ledger]
token_address = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"
team_wallet = "BcAoCEdkzV2J21gAjCCEokBw5iMnAe96SbYo9F6QmKWV"
"#;

#[test]
fn test_minimal_file_uses_defaults() {
    let file = write_config(MINIMAL);
    let config = AppConfig::load_from(file.path()).unwrap();

    assert_eq!(config.discord.bot_token.expose_secret(), "bot-secret");
    assert_eq!(config.discord.feed_channel_id, 111);
    assert_eq!(config.ledger.signature_limit, 10);
    assert_eq!(config.ledger.catch_up_limit, 3);
    assert_eq!(config.ledger.poll_interval_secs, 60);
    assert_eq!(config.ledger.min_buy_sol, Decimal::new(1, 2));
    assert_eq!(config.floor.interval_secs, 300);
    assert_eq!(config.oracle.fallback_rate, Decimal::from(150));
    assert!(config.price_data.snapshot_url.is_none());
    assert_eq!(config.server.port, 8080);
    assert!(config.validate().is_ok());
}

#[test]
fn test_explicit_values_override_defaults() {
    let file = write_config(&format!(
        r#"{MINIMAL}
signature_limit = 25
catch_up_limit = 5
poll_interval_secs = 15

[floor]
interval_secs = 120

[price_data]
snapshot_url = "http://127.0.0.1:7000/snapshot"

[server]
enabled = false
port = 9191
"#
    ));
    let config = AppConfig::load_from(file.path()).unwrap();

    assert_eq!(config.ledger.signature_limit, 25);
    assert_eq!(config.ledger.catch_up_limit, 5);
    assert_eq!(config.ledger.poll_interval_secs, 15);
    assert_eq!(config.floor.interval_secs, 120);
    assert_eq!(
        config.price_data.snapshot_url.as_deref(),
        Some("http://127.0.0.1:7000/snapshot")
    );
    assert!(!config.server.enabled);
    assert_eq!(config.server.port, 9191);
    assert!(config.validate().is_ok());
}

#[test]
fn test_non_numeric_channel_id_is_rejected() {
    let file = write_config(
        r#"
[discord]
bot_token = "bot-secret"
feed_channel_id = "general"
discussion_channel_id = 222

[ledger]
token_address = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"
team_wallet = "BcAoCEdkzV2J21gAjCCEokBw5iMnAe96SbYo9F6QmKWV"
"#,
    );

    assert!(AppConfig::load_from(file.path()).is_err());
}

#[test]
fn test_missing_token_address_is_rejected() {
    let file = write_config(
        r#"
[discord]
bot_token = "bot-secret"
feed_channel_id = 111
discussion_channel_id = 222

[ledger]
team_wallet = "BcAoCEdkzV2J21gAjCCEokBw5iMnAe96SbYo9F6QmKWV"
"#,
    );

    assert!(AppConfig::load_from(file.path()).is_err());
}

#[test]
fn test_catch_up_above_signature_limit_fails_validation() {
    let file = write_config(&format!("{MINIMAL}\nsignature_limit = 2\ncatch_up_limit = 3\n"));
    let config = AppConfig::load_from(file.path()).unwrap();

    assert!(config.validate().is_err());
}
