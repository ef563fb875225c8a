//! Template Engine - certificate composition
//!
//! This crate provides:
//! - Validated certificate records and date handling
//! - Image assets (logo, signature) decoded eagerly with a timeout
//! - Verification payloads and QR code generation
//! - Five built-in certificate templates behind one `render` entry point
//!
//! # Example
//!
//! ```ignore
//! use template::{render, AssetSet, CertificateRecord, TemplateId};
//!
//! let record = CertificateRecord::new("Jane Smith", "Data Engineering", "2024-03-15", None)?;
//! let document = render(TemplateId::AcademicDiploma, &record, &AssetSet::default(), false)?;
//! document.save("Certificate_Jane_Smith.pdf")?;
//! ```

mod assets;
mod date;
mod record;
mod render;
pub mod templates;
pub mod verification;

pub use assets::{AssetSet, ImageAsset, DEFAULT_DECODE_TIMEOUT};
pub use date::{CertificateDate, DISPLAY_PATTERN, INPUT_PATTERN};
pub use record::CertificateRecord;
pub use render::{render, Clock, FixedClock, RenderOptions, Renderer, SystemClock};
pub use templates::TemplateId;
pub use verification::{QrStyle, VerificationPayload, MIN_QR_SIZE_PX};

use thiserror::Error;

/// Errors that can occur during certificate composition
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A mandatory record field is missing or blank
    #[error("Missing required field: {0}")]
    Validation(String),

    /// A field that goes into the verification payload holds a control
    /// character such as a line break
    #[error("Control character in field: {0}")]
    ControlCharacter(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
