pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{JobConfig, MappingFile, OutputFormat};

pub use adapters::{LocalStorage, PdfTemplate, ZipStorage};
pub use app::pipelines::FormPipeline;
pub use core::{etl::FillEngine, GenerationResult};
pub use utils::error::{BatchError, FillError, Result};
