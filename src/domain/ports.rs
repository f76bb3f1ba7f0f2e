use crate::domain::model::{SourceTables, TransformResult};
use crate::domain::roster::ProfessionalRoster;
use crate::domain::source::{ColumnConfig, SourceSpec};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn primary_source(&self) -> &SourceSpec;
    fn secondary_source(&self) -> &SourceSpec;
    fn columns(&self) -> &ColumnConfig;
    fn roster(&self) -> &ProfessionalRoster;
    fn output_path(&self) -> &str;
    fn batch_count(&self) -> usize;
    fn table_name(&self) -> &str;
    fn file_prefix(&self) -> &str;
    fn write_manifest(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceTables>;
    async fn transform(&self, data: SourceTables) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
