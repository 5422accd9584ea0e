//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::SchedulerOptions;

/// TOML loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load options from a TOML file.
    pub fn load(path: &Path) -> Result<SchedulerOptions, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load options from a TOML string.
    pub fn load_str(content: &str) -> Result<SchedulerOptions, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let options: SchedulerOptions = toml::from_str(&expanded)?;
        Ok(options)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g. `~/jobs`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let content = r#"
            connection_uri = "mongodb://localhost:27017/scheduled_tasks"
            jobs_source = "./jobs"
        "#;
        let opts = ConfigLoader::load_str(content).unwrap();
        assert_eq!(opts.connection_uri, "mongodb://localhost:27017/scheduled_tasks");
        assert_eq!(opts.process_every, "30 seconds");
        assert!(opts.every.is_empty());
    }

    #[test]
    fn test_load_every_section() {
        let content = r#"
            connection_uri = "mongodb://localhost/x"
            jobs_source = "./jobs"

            [every]
            "10 seconds" = "say-hello"

            [every."5 minutes".cleanup]
            data = { depth = 3 }

            [schedule]
            "every day at 3am" = ["say-hello", "i-am-your-father"]
        "#;
        let opts = ConfigLoader::load_str(content).unwrap();

        assert_eq!(opts.every.len(), 2);
        assert_eq!(opts.every["10 seconds"], serde_json::json!("say-hello"));
        assert_eq!(
            opts.every["5 minutes"]["cleanup"]["data"]["depth"],
            serde_json::json!(3)
        );
        assert_eq!(
            opts.schedule["every day at 3am"],
            serde_json::json!(["say-hello", "i-am-your-father"])
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "connection_uri = \"mongodb://localhost/x\"").unwrap();
        writeln!(file, "jobs_source = \"./jobs\"").unwrap();
        writeln!(file, "max_concurrency = 7").unwrap();

        let opts = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(opts.max_concurrency, 7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/cadence.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable, set and removed within the test
        unsafe {
            std::env::set_var("CADENCE_TEST_URI", "mongodb://envhost/db");
        }
        let content = r#"
            connection_uri = "${CADENCE_TEST_URI}"
            jobs_source = "./jobs"
        "#;
        let opts = ConfigLoader::load_str(content).unwrap();
        assert_eq!(opts.connection_uri, "mongodb://envhost/db");
        unsafe {
            std::env::remove_var("CADENCE_TEST_URI");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = r#"connection_uri = "${CADENCE_NOT_SET_12345}""#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = ConfigLoader::expand_path("~/jobs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/jobs"));
    }
}
