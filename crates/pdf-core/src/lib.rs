//! PDF Core - Page composition and PDF assembly
//!
//! This crate provides functionality for:
//! - Drawing layout primitives (shapes, gradients, text, paragraphs, images)
//!   onto a fixed-size page surface
//! - Finalizing a page surface into single-page PDF bytes
//! - Rasterizing the same page surface to an RGBA image
//!
//! Text uses the PDF base-14 Helvetica and Times families, so no font file
//! has to be embedded. The same advance widths drive layout for both the PDF
//! and the raster output.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{assemble, Align, Canvas, Color, DocumentInfo, Finalize, PageSize, TextStyle};
//!
//! let mut canvas = Canvas::new(PageSize::A4.landscape());
//! canvas.fill_rect(0.0, 0.0, 841.0, 595.0, Color::hex(0xF9F5E8))?;
//! canvas.draw_text("Hello, World!", 420.0, 300.0, Align::Center, &TextStyle::helvetica(24.0))?;
//! let document = assemble(canvas, &DocumentInfo::default(), Finalize::Final)?;
//! document.save("output.pdf")?;
//! ```

mod canvas;
mod document;
mod font;
mod image;
mod raster;
mod text;

pub use canvas::{Canvas, Command, Page, PageSize, Stroke, TextStyle};
pub use document::{assemble, Color, Document, DocumentInfo, Finalize};
pub use font::{FontFamily, FontStyle, FontWeight, StandardFont};
pub use image::{decode_image, fit_within, ImageXObject};
pub use raster::{rasterize_page, RasterFonts, FONT_DIR_ENV};
pub use text::{wrap_to_width, text_run_operators};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Raster error: {0}")]
    RasterError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
