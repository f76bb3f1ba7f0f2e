use crate::core::sql::{DEFAULT_FILE_PREFIX, DEFAULT_TABLE};
use crate::core::ConfigProvider;
use crate::domain::roster::ProfessionalRoster;
use crate::domain::source::{ColumnConfig, SourceSpec};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PRIMARY_FILE: &str = "appbarber_informacoes.csv";
pub const DEFAULT_SECONDARY_FILE: &str = "clientes.csv";
pub const DEFAULT_BATCHES: usize = 4;
pub const MAX_BATCHES: usize = 999;
const INPUT_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Import job description. Every section is optional; missing sections fall
/// back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub job: JobConfig,
    pub sources: SourcesConfig,
    pub columns: ColumnConfig,
    pub roster: ProfessionalRoster,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: "customer-import".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub primary: SourceSpec,
    pub secondary: SourceSpec,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            primary: SourceSpec::new(DEFAULT_PRIMARY_FILE),
            secondary: SourceSpec::new(DEFAULT_SECONDARY_FILE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub batches: usize,
    pub table: String,
    pub file_prefix: String,
    pub manifest: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            batches: DEFAULT_BATCHES,
            table: DEFAULT_TABLE.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            manifest: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        for (field, spec) in [
            ("sources.primary.path", &self.sources.primary),
            ("sources.secondary.path", &self.sources.secondary),
        ] {
            validation::validate_path(field, &spec.path)?;
            validation::validate_file_extension(field, &spec.path, INPUT_EXTENSIONS)?;
            if let Some(d) = spec.delimiter {
                if !d.is_ascii() || d == '"' || d == '\n' {
                    return Err(EtlError::InvalidConfigValueError {
                        field: field.replace(".path", ".delimiter"),
                        value: d.to_string(),
                        reason: "Delimiter must be a single ASCII character".to_string(),
                    });
                }
            }
        }

        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_range("output.batches", self.output.batches, 1, MAX_BATCHES)?;
        validation::validate_sql_identifier("output.table", &self.output.table)?;
        validation::validate_non_empty_string("output.file_prefix", &self.output.file_prefix)?;
        if self.output.file_prefix.contains(['/', '\\']) {
            return Err(EtlError::InvalidConfigValueError {
                field: "output.file_prefix".to_string(),
                value: self.output.file_prefix.clone(),
                reason: "Prefix must not contain path separators; use output.path".to_string(),
            });
        }

        let primary = &self.columns.primary;
        let secondary = &self.columns.secondary;
        for (field, value) in [
            ("columns.primary.professional", &primary.professional),
            ("columns.primary.phone", &primary.phone),
            ("columns.primary.client", &primary.client),
            ("columns.secondary.phone", &secondary.phone),
            ("columns.secondary.email", &secondary.email),
            ("columns.secondary.notes", &secondary.notes),
            ("columns.secondary.referral_source", &secondary.referral_source),
            ("columns.secondary.name", &secondary.name),
        ] {
            validation::validate_non_empty_string(field, value)?;
        }

        if self.roster.retained_count() == 0 {
            return Err(EtlError::MissingConfigError {
                field: "roster (at least one entry with retain = true)".to_string(),
            });
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn primary_source(&self) -> &SourceSpec {
        &self.sources.primary
    }

    fn secondary_source(&self) -> &SourceSpec {
        &self.sources.secondary
    }

    fn columns(&self) -> &ColumnConfig {
        &self.columns
    }

    fn roster(&self) -> &ProfessionalRoster {
        &self.roster
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn batch_count(&self) -> usize {
        self.output.batches
    }

    fn table_name(&self) -> &str {
        &self.output.table
    }

    fn file_prefix(&self) -> &str {
        &self.output.file_prefix
    }

    fn write_manifest(&self) -> bool {
        self.output.manifest
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
