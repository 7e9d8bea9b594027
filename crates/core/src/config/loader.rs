use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides (`DRIVEDROP_SERVER__PORT=9000`).
const ENV_PREFIX: &str = "DRIVEDROP_";

/// Inline service-account JSON, as read by earlier deployments.
const LEGACY_SERVICE_ACCOUNT_VAR: &str = "GOOGLE_SERVICE_ACCOUNT";

/// Destination folder id, as read by earlier deployments.
const LEGACY_FOLDER_ID_VAR: &str = "DRIVE_FOLDER_ID";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(base: Figment) -> Result<Config, ConfigError> {
    let figment = apply_legacy_overrides(
        base,
        std::env::var(LEGACY_SERVICE_ACCOUNT_VAR).ok(),
        std::env::var(LEGACY_FOLDER_ID_VAR).ok(),
    )
    .merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Layer the legacy variables over file values. Prefixed variables are
/// merged afterwards and win over both.
fn apply_legacy_overrides(
    figment: Figment,
    service_account_json: Option<String>,
    folder_id: Option<String>,
) -> Figment {
    let mut figment = figment;

    if let Some(json) = service_account_json.filter(|json| !json.trim().is_empty()) {
        figment = figment
            .merge(("storage.credentials.method", "service_account"))
            .merge(("storage.credentials.service_account_json", json));
    }

    if let Some(folder_id) = folder_id.filter(|id| !id.trim().is_empty()) {
        figment = figment.merge(("storage.folder_id", folder_id));
    }

    figment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CredentialConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const OAUTH_TOML: &str = r#"
[server]
port = 9000

[storage]
folder_id = "from-file"

[storage.credentials]
method = "oauth"
client_id = "client"
refresh_token = "refresh"
"#;

    #[test]
    fn test_load_config_from_str_valid() {
        let config = load_config_from_str(OAUTH_TOML).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.folder_id, "from-file");
    }

    #[test]
    fn test_load_config_from_str_missing_storage() {
        let toml = r#"
[server]
port = 8000
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[storage]
folder_id = "folder-abc"

[storage.credentials]
method = "oauth"
client_id = "client"
refresh_token = "refresh"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.storage.folder_id, "folder-abc");
    }

    #[test]
    fn test_legacy_overrides_switch_to_service_account() {
        let figment = apply_legacy_overrides(
            Figment::new().merge(Toml::string(OAUTH_TOML)),
            Some(r#"{"client_email":"bot@example.iam.gserviceaccount.com"}"#.to_string()),
            Some("legacy-folder".to_string()),
        );
        let config: Config = figment.extract().unwrap();

        assert_eq!(config.storage.folder_id, "legacy-folder");
        match config.storage.credentials {
            CredentialConfig::ServiceAccount {
                service_account_json,
                ..
            } => {
                let json = service_account_json.unwrap();
                assert!(json.contains("bot@example.iam.gserviceaccount.com"));
            }
            other => panic!("expected service account, got {}", other.method_name()),
        }
    }

    #[test]
    fn test_legacy_overrides_ignore_blank_values() {
        let figment = apply_legacy_overrides(
            Figment::new().merge(Toml::string(OAUTH_TOML)),
            Some("  ".to_string()),
            Some(String::new()),
        );
        let config: Config = figment.extract().unwrap();

        assert_eq!(config.storage.folder_id, "from-file");
        assert_eq!(config.storage.credentials.method_name(), "oauth");
    }

    #[test]
    fn test_legacy_overrides_alone_are_enough() {
        let figment = apply_legacy_overrides(
            Figment::new(),
            Some(r#"{"type":"service_account"}"#.to_string()),
            Some("env-folder".to_string()),
        );
        let config: Config = figment.extract().unwrap();

        assert_eq!(config.storage.folder_id, "env-folder");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.storage.credentials.method_name(), "service_account");
    }
}
