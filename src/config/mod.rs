pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::toml_config::TomlConfig;
#[cfg(feature = "cli")]
use crate::domain::source::SourceSpec;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "roster-etl")]
#[command(about = "Merge customer spreadsheet exports into batched SQL upsert files")]
pub struct CliConfig {
    /// Path to a TOML job file; flags below override its values
    #[arg(short, long)]
    pub config: Option<String>,

    /// Primary export (professional roster with visits)
    #[arg(long)]
    pub primary: Option<String>,

    /// Secondary export (contact data)
    #[arg(long)]
    pub secondary: Option<String>,

    /// Field delimiter for both exports, e.g. ';'
    #[arg(long)]
    pub delimiter: Option<char>,

    #[arg(long)]
    pub output_path: Option<String>,

    /// Number of SQL files to split the import into
    #[arg(short, long)]
    pub batches: Option<usize>,

    #[arg(long)]
    pub table: Option<String>,

    #[arg(long)]
    pub file_prefix: Option<String>,

    /// Also write a JSON manifest of the generated files
    #[arg(long)]
    pub manifest: bool,

    /// Show what would be generated without writing files
    #[arg(long)]
    pub dry_run: bool,

    /// Log memory usage and timing per phase
    #[arg(long)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Job file (or built-in defaults) with command line overrides applied.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(path) = &self.primary {
            config.sources.primary = SourceSpec {
                path: path.clone(),
                delimiter: config.sources.primary.delimiter,
            };
        }
        if let Some(path) = &self.secondary {
            config.sources.secondary = SourceSpec {
                path: path.clone(),
                delimiter: config.sources.secondary.delimiter,
            };
        }
        if let Some(d) = self.delimiter {
            config.sources.primary.delimiter = Some(d);
            config.sources.secondary.delimiter = Some(d);
        }
        if let Some(path) = &self.output_path {
            config.output.path = path.clone();
        }
        if let Some(batches) = self.batches {
            config.output.batches = batches;
        }
        if let Some(table) = &self.table {
            config.output.table = table.clone();
        }
        if let Some(prefix) = &self.file_prefix {
            config.output.file_prefix = prefix.clone();
        }
        if self.manifest {
            config.output.manifest = true;
        }
    }

    pub fn monitor_enabled(&self, config: &TomlConfig) -> bool {
        self.monitor || config.monitoring_enabled()
    }
}
