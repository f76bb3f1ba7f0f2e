use crate::core::{Pipeline, TransformResult};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Extract and transform only. Nothing is written.
    pub async fn plan(&self) -> Result<TransformResult> {
        tracing::info!("📥 Extracting spreadsheet exports...");
        let tables = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        tracing::info!("🔀 Merging customers...");
        let result = self.pipeline.transform(tables).await?;
        self.monitor.log_stats("Transform");

        tracing::info!(
            "Total customers: {} in {} batch file(s)",
            result.customers.len(),
            result.batches.len()
        );
        Ok(result)
    }

    /// Full run; returns the paths of every file written.
    pub async fn run(&self) -> Result<Vec<String>> {
        tracing::info!("🚀 Starting customer import run");

        let result = self.plan().await?;

        tracing::info!("💾 Writing SQL files...");
        let written = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{MergeStats, SourceTables};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPipeline {
        loads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<SourceTables> {
            Ok(SourceTables::default())
        }

        async fn transform(&self, _data: SourceTables) -> Result<TransformResult> {
            Ok(TransformResult {
                customers: Vec::new(),
                batches: Vec::new(),
                stats: MergeStats::default(),
            })
        }

        async fn load(&self, _result: TransformResult) -> Result<Vec<String>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["out/IMPORTAR_PARTE_01.sql".to_string()])
        }
    }

    #[tokio::test]
    async fn test_plan_does_not_load() {
        let engine = EtlEngine::new(CountingPipeline::default());
        let result = engine.plan().await.unwrap();

        assert!(result.customers.is_empty());
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_loads_once() {
        let engine = EtlEngine::new(CountingPipeline::default());
        let written = engine.run().await.unwrap();

        assert_eq!(written, vec!["out/IMPORTAR_PARTE_01.sql".to_string()]);
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 1);
    }
}
