use crate::core::loader::parse_table;
use crate::core::merger::Merger;
use crate::core::sql::SqlEmitter;
use crate::core::{ConfigProvider, Pipeline, SourceTables, Storage, TransformResult};
use crate::domain::model::{MergeStats, SourceTable, SqlBatch};
use crate::domain::source::{PrimaryLayout, SecondaryLayout, SourceSpec};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Reads both exports, merges customers by phone and writes the SQL files.
pub struct CustomerPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
}

impl<S: Storage, C: ConfigProvider> CustomerPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    async fn read_source(&self, name: &str, spec: &SourceSpec) -> Result<SourceTable> {
        tracing::debug!("Reading {} export from: {}", name, spec.path);
        let data = self.storage.read_file(&spec.path).await?;
        parse_table(name, &data, spec.delimiter_byte())
    }

    fn output_file(&self, file_name: &str) -> String {
        Path::new(self.config.output_path())
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }

    fn manifest_file_name(&self) -> String {
        format!("{}manifest.json", self.config.file_prefix())
    }
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    generated_at: DateTime<Utc>,
    table: &'a str,
    total_customers: usize,
    stats: &'a MergeStats,
    batches: &'a [SqlBatch],
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CustomerPipeline<S, C> {
    async fn extract(&self) -> Result<SourceTables> {
        // 兩份檔案都讀完才開始處理，任一失敗就中止
        let primary = self
            .read_source("primary", self.config.primary_source())
            .await?;
        let secondary = self
            .read_source("secondary", self.config.secondary_source())
            .await?;

        let columns = self.config.columns();
        let primary_layout = PrimaryLayout::resolve(&primary, &columns.primary)?;
        let secondary_layout = SecondaryLayout::resolve(&secondary, &columns.secondary)?;

        tracing::info!(
            "📥 Loaded {} primary rows and {} secondary rows",
            primary.rows.len(),
            secondary.rows.len()
        );

        Ok(SourceTables {
            primary,
            primary_layout,
            secondary,
            secondary_layout,
        })
    }

    async fn transform(&self, data: SourceTables) -> Result<TransformResult> {
        let outcome = Merger::new(self.config.roster()).merge(&data);

        let emitter = SqlEmitter::new(
            self.config.table_name(),
            self.config.file_prefix(),
            self.config.batch_count(),
        );
        let batches = emitter.build_batches(&outcome.customers);

        Ok(TransformResult {
            customers: outcome.customers,
            batches,
            stats: outcome.stats,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let mut written = Vec::with_capacity(result.batches.len() + 1);

        for batch in &result.batches {
            let path = self.output_file(&batch.file_name);
            self.storage
                .write_file(&path, batch.statement.as_bytes())
                .await?;
            tracing::info!(
                "📝 Created {} ({} customers)",
                batch.file_name,
                batch.record_count()
            );
            written.push(path);
        }

        if self.config.write_manifest() {
            let manifest = Manifest {
                generated_at: Utc::now(),
                table: self.config.table_name(),
                total_customers: result.customers.len(),
                stats: &result.stats,
                batches: &result.batches,
            };
            let path = self.output_file(&self.manifest_file_name());
            let json = serde_json::to_string_pretty(&manifest)?;
            self.storage.write_file(&path, json.as_bytes()).await?;
            tracing::debug!("Manifest written to {}", path);
            written.push(path);
        }

        if result.batches.is_empty() {
            tracing::warn!("⚠️ No customers survived the merge, no SQL files were written");
        }

        Ok(written)
    }
}
