//! Pipeline configuration
//!
//! Loaded from a TOML file (default `dl.toml`). Credentials live under the
//! `[AWS]` section and are handed to the engine session explicitly; they are
//! never exported into the process environment.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "dl.toml";

pub const DEFAULT_DEMOGRAPHICS_FILE: &str = "us_cities_demographics.csv";
pub const DEFAULT_ACCIDENTS_FILE: &str = "US_Accidents_June20.csv";
pub const DEFAULT_INCOME_FILE: &str = "Median_income_zip.csv";

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EtlConfig {
    #[serde(rename = "AWS", default)]
    pub aws: Option<AwsCredentials>,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub inputs: InputFiles,
}

#[derive(Clone, Deserialize)]
pub struct AwsCredentials {
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: String,

    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    pub secret_access_key: String,

    #[serde(rename = "AWS_REGION", default)]
    pub region: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

impl AwsCredentials {
    /// Read credentials from `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`.
    /// Returns None unless both are set.
    pub fn from_env() -> Option<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        Some(Self {
            access_key_id,
            secret_access_key,
            region: std::env::var("AWS_REGION").ok(),
        })
    }

    /// Option pairs understood by the object store builder
    pub fn storage_options(&self) -> Vec<(String, String)> {
        let mut options = vec![
            ("aws_access_key_id".to_string(), self.access_key_id.clone()),
            ("aws_secret_access_key".to_string(), self.secret_access_key.clone()),
        ];
        if let Some(region) = &self.region {
            options.push(("aws_region".to_string(), region.clone()));
        }
        options
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Root location for inputs and (unless overridden) outputs
    #[serde(default)]
    pub base_path: Option<String>,

    #[serde(default)]
    pub output_path: Option<String>,

    #[serde(default)]
    pub demographics_join_key: JoinKey,

    #[serde(default)]
    pub weekday: WeekdayConvention,

    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    #[serde(default = "default_demographics_file")]
    pub demographics: String,

    #[serde(default = "default_accidents_file")]
    pub accidents: String,

    #[serde(default = "default_income_file")]
    pub income: String,
}

fn default_demographics_file() -> String {
    DEFAULT_DEMOGRAPHICS_FILE.to_string()
}

fn default_accidents_file() -> String {
    DEFAULT_ACCIDENTS_FILE.to_string()
}

fn default_income_file() -> String {
    DEFAULT_INCOME_FILE.to_string()
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            demographics: default_demographics_file(),
            accidents: default_accidents_file(),
            income: default_income_file(),
        }
    }
}

/// Key the demographics pivot and join are grouped on.
///
/// `City` reproduces the historical behavior: same-named cities in different
/// states collapse into one row. `CityState` keeps them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum JoinKey {
    #[default]
    City,
    CityState,
}

impl JoinKey {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            JoinKey::City => &["city"],
            JoinKey::CityState => &["city", "state"],
        }
    }
}

/// Numbering used for the derived `weekday` column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum WeekdayConvention {
    /// Monday = 1 .. Sunday = 7
    #[default]
    Iso,
    /// Sunday = 1 .. Saturday = 7
    SundayFirst,
}

impl EtlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load the config file if it exists. A missing file is only an error
    /// when the caller named it explicitly.
    pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<Self> {
        let path = path.as_ref();
        if !explicit && !path.exists() {
            tracing::debug!("no config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Credentials from the `[AWS]` section, falling back to the environment
    pub fn credentials(&self) -> Option<AwsCredentials> {
        self.aws.clone().or_else(AwsCredentials::from_env)
    }

    pub fn base_path(&self) -> Result<&str> {
        self.pipeline
            .base_path
            .as_deref()
            .ok_or_else(|| EtlError::Config("pipeline.base_path is not set".to_string()))
    }

    pub fn output_path(&self) -> Result<&str> {
        match self.pipeline.output_path.as_deref() {
            Some(path) => Ok(path),
            None => self.base_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = EtlConfig::from_toml_str(
            r#"
            [AWS]
            AWS_ACCESS_KEY_ID = "AKIAEXAMPLE"
            AWS_SECRET_ACCESS_KEY = "secret"

            [pipeline]
            base_path = "s3://bucket/traffic_accident/"
            demographics_join_key = "city_state"
            weekday = "sunday_first"
            parallel = true

            [inputs]
            income = "income.csv"
            "#,
        )
        .unwrap();

        let aws = config.aws.as_ref().unwrap();
        assert_eq!(aws.access_key_id, "AKIAEXAMPLE");
        assert_eq!(aws.region, None);
        assert_eq!(config.base_path().unwrap(), "s3://bucket/traffic_accident/");
        assert_eq!(config.output_path().unwrap(), "s3://bucket/traffic_accident/");
        assert_eq!(config.pipeline.demographics_join_key, JoinKey::CityState);
        assert_eq!(config.pipeline.weekday, WeekdayConvention::SundayFirst);
        assert!(config.pipeline.parallel);
        assert_eq!(config.inputs.income, "income.csv");
        assert_eq!(config.inputs.accidents, DEFAULT_ACCIDENTS_FILE);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = EtlConfig::from_toml_str("").unwrap();
        assert!(config.aws.is_none());
        assert_eq!(config.pipeline.demographics_join_key, JoinKey::City);
        assert_eq!(config.pipeline.weekday, WeekdayConvention::Iso);
        assert!(!config.pipeline.parallel);
        assert!(matches!(config.base_path(), Err(EtlError::Config(_))));
    }

    #[test]
    fn test_incomplete_aws_section_is_rejected() {
        let result = EtlConfig::from_toml_str(
            r#"
            [AWS]
            AWS_ACCESS_KEY_ID = "AKIAEXAMPLE"
            "#,
        );
        assert!(matches!(result, Err(EtlError::Toml(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = AwsCredentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "top-secret".to_string(),
            region: Some("us-west-2".to_string()),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));

        let options = creds.storage_options();
        assert_eq!(options.len(), 3);
        assert!(options.contains(&("aws_region".to_string(), "us-west-2".to_string())));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(EtlConfig::load_or_default(&missing, false).is_ok());
        assert!(matches!(
            EtlConfig::load_or_default(&missing, true),
            Err(EtlError::Config(_))
        ));
    }
}
