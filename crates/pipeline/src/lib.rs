//! Pipeline - batch and preview runs over the template engine
//!
//! This crate provides:
//! - `BatchPipeline`: one certificate per dataset row on a bounded worker
//!   pool, with per-record failures, progress and cancellation
//! - `PreviewPipeline`: the same composition rasterised at a zoom level
//! - `write_single`: render one record to a file
//! - `PipelineConfig` and `Dataset` loaders
//!
//! # Example
//!
//! ```ignore
//! use pipeline::{BatchPipeline, Dataset, PipelineConfig};
//! use template::{AssetSet, TemplateId};
//!
//! let config = PipelineConfig::default();
//! let dataset = Dataset::from_path("recipients.json")?;
//! let summary = BatchPipeline::new(&config).run(
//!     &dataset,
//!     TemplateId::ModernProfessional,
//!     &AssetSet::default(),
//!     Some("out".as_ref()),
//!     &|p| println!("{}/{} {}", p.completed, p.total, p.name),
//! )?;
//! println!("{summary}");
//! ```

mod batch;
mod config;
mod dataset;
mod preview;
mod single;

pub use batch::{
    BatchPipeline, BatchState, BatchSummary, CancelToken, CollisionPolicy, Progress,
    RecordFailure, REQUIRED_COLUMNS,
};
pub use config::PipelineConfig;
pub use dataset::{record_from_row, Dataset, Row};
pub use preview::{clamp_zoom, Preview, PreviewPipeline, MAX_EDGE_PX, MAX_ZOOM, MIN_EDGE_PX, MIN_ZOOM};
pub use single::{certificate_file_name, write_single, write_single_with};

use thiserror::Error;

/// Errors that stop a batch before or while it runs
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No output directory configured")]
    NoOutputDirectory,

    #[error("Worker pool error: {0}")]
    Pool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why one record produced no file
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Template(#[from] template::TemplateError),

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Preview failure with its cause
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Preview failed: {0}")]
    Template(#[from] template::TemplateError),

    #[error("Preview failed: {0}")]
    Raster(#[from] pdf_core::PdfError),

    #[error("Preview failed: document kept no page")]
    MissingPage,

    #[error("Preview failed: invalid base DPI {0}")]
    InvalidDpi(f32),
}

/// Configuration or dataset could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid dataset: {0}")]
    Shape(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
