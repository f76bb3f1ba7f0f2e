pub mod etl;
pub mod loader;
pub mod merger;
pub mod pipeline;
pub mod sql;

pub use crate::domain::model::{CustomerRecord, SourceTables, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
