//! Configuration loader with TOML parsing and environment overrides
//!
//! Loading order: read the file, substitute `${VAR}` placeholders,
//! parse, apply `STRATA_*` overrides, validate. Secrets normally
//! arrive through the substitution step so they never live in the
//! config file itself.

use super::schema::StrataConfig;
use crate::config::secret_string;
use crate::domain::errors::StrataError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced
/// environment variable is unset, parsing fails, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<StrataConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(StrataError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        StrataError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: StrataConfig = toml::from_str(&contents)
        .map_err(|e| StrataError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| StrataError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Referencing an unset variable is
/// an error listing every missing name at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| StrataError::Configuration(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(StrataError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `STRATA_*` prefix
///
/// Pattern: `STRATA_<SECTION>_<KEY>`, e.g. `STRATA_SOURCE_ENDPOINT`.
fn apply_env_overrides(config: &mut StrataConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("STRATA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("STRATA_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Source overrides
    if let Ok(val) = std::env::var("STRATA_SOURCE_ENDPOINT") {
        config.source.endpoint = val;
    }
    if let Ok(val) = std::env::var("STRATA_SOURCE_KEY") {
        config.source.key = secret_string(val);
    }
    if let Ok(val) = std::env::var("STRATA_SOURCE_DATABASE") {
        config.source.database = val;
    }
    if let Ok(val) = std::env::var("STRATA_SOURCE_CONTAINER") {
        config.source.container = val;
    }

    // Storage overrides
    if let Ok(val) = std::env::var("STRATA_STORAGE_ENDPOINT") {
        config.storage.endpoint = val;
    }
    if let Ok(val) = std::env::var("STRATA_STORAGE_CONTAINER") {
        config.storage.container = val;
    }
    if let Ok(val) = std::env::var("STRATA_STORAGE_TENANT_ID") {
        config.storage.tenant_id = val;
    }
    if let Ok(val) = std::env::var("STRATA_STORAGE_CLIENT_ID") {
        config.storage.client_id = val;
    }
    if let Ok(val) = std::env::var("STRATA_STORAGE_CLIENT_SECRET") {
        config.storage.client_secret = secret_string(val);
    }

    // Backup overrides
    if let Ok(val) = std::env::var("STRATA_BACKUP_MAX_CONCURRENCY") {
        if let Ok(parsed) = val.parse() {
            config.backup.max_concurrency = parsed;
        }
    }
}
