//! Raster previews of a certificate
//!
//! The document is composed exactly as for final output, rasterised at the
//! base DPI, then scaled by the zoom factor.

use crate::config::PipelineConfig;
use crate::PreviewError;
use image::imageops::{self, FilterType};
use image::RgbaImage;
use pdf_core::{rasterize_page, Finalize, PageSize, RasterFonts};
use template::{AssetSet, CertificateRecord, Renderer, TemplateId};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;

/// Smallest preview edge in pixels
pub const MIN_EDGE_PX: u32 = 10;
/// Largest preview edge in pixels
pub const MAX_EDGE_PX: u32 = 5000;

/// Rendered preview image
#[derive(Debug, Clone)]
pub struct Preview {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

/// Clamp a zoom factor to `[MIN_ZOOM, MAX_ZOOM]`; non-finite values mean 1.0
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

fn scaled_size(width: u32, height: u32, zoom: f32) -> (u32, u32) {
    let scale = |v: u32| ((v as f32 * zoom).round() as u32).clamp(MIN_EDGE_PX, MAX_EDGE_PX);
    (scale(width), scale(height))
}

/// DPI the page is rasterised at before zooming
///
/// Beyond the point where the longer edge at `zoom` reaches `MAX_EDGE_PX`
/// the output is clamped anyway, so the raster stops growing there.
fn base_dpi(dpi: f32, size: PageSize, zoom: f32) -> Result<f32, PreviewError> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(PreviewError::InvalidDpi(dpi));
    }
    let longest = size.width.max(size.height) as f32;
    let limit = MAX_EDGE_PX as f32 / zoom * 72.0 / longest;
    if dpi > limit {
        log::warn!("preview DPI {dpi} capped at {limit:.1}");
        return Ok(limit);
    }
    Ok(dpi)
}

/// Composes and rasterises previews
pub struct PreviewPipeline {
    renderer: Renderer,
    fonts: RasterFonts,
    dpi: f32,
}

impl PreviewPipeline {
    /// Fonts are resolved once here and reused for every preview
    pub fn new(config: &PipelineConfig) -> Self {
        let fonts = RasterFonts::discover(config.font_dir.as_deref());
        if fonts.is_empty() {
            log::warn!("no raster fonts found; previews will omit text");
        }
        Self {
            renderer: Renderer::new().with_options(config.render_options()),
            fonts,
            dpi: config.preview_dpi,
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_fonts(mut self, fonts: RasterFonts) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// Render `record` as an image at `zoom` times the base resolution
    pub fn preview(
        &self,
        template: TemplateId,
        record: &CertificateRecord,
        assets: &AssetSet,
        zoom: f32,
    ) -> Result<Preview, PreviewError> {
        let document = self
            .renderer
            .render(template, record, assets, Finalize::Preview)?;
        let page = document.preview_page().ok_or(PreviewError::MissingPage)?;
        let zoom = clamp_zoom(zoom);
        let dpi = base_dpi(self.dpi, page.size, zoom)?;
        let base = rasterize_page(page, dpi, &self.fonts)?;

        let (width, height) = scaled_size(base.width(), base.height(), zoom);
        let image = if (width, height) == base.dimensions() {
            base
        } else {
            imageops::resize(&base, width, height, FilterType::Lanczos3)
        };
        log::debug!("preview {template}: {width}x{height} at zoom {zoom}");
        Ok(Preview {
            image,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clamp_zoom() {
        assert_eq!(clamp_zoom(10.0), 2.0);
        assert_eq!(clamp_zoom(0.1), 0.5);
        assert_eq!(clamp_zoom(1.25), 1.25);
        assert_eq!(clamp_zoom(f32::NAN), 1.0);
        assert_eq!(clamp_zoom(f32::INFINITY), 1.0);
    }

    #[test]
    fn test_base_dpi_is_capped() {
        let a4 = PageSize::A4.landscape();
        assert_eq!(base_dpi(100.0, a4, 1.0).unwrap(), 100.0);

        let capped = base_dpi(3000.0, a4, 1.0).unwrap();
        let edge = (a4.width as f32 * capped / 72.0).round();
        assert_eq!(edge, MAX_EDGE_PX as f32);
        // Smaller zoom leaves room for a larger base raster
        assert!(base_dpi(3000.0, a4, MIN_ZOOM).unwrap() > capped);
    }

    #[test]
    fn test_base_dpi_rejects_nonsense() {
        let a4 = PageSize::A4;
        assert!(matches!(base_dpi(0.0, a4, 1.0), Err(PreviewError::InvalidDpi(_))));
        assert!(matches!(base_dpi(-72.0, a4, 1.0), Err(PreviewError::InvalidDpi(_))));
        assert!(matches!(base_dpi(f32::NAN, a4, 1.0), Err(PreviewError::InvalidDpi(_))));
    }

    #[test]
    fn test_scaled_size_is_bounded() {
        assert_eq!(scaled_size(4000, 3000, 2.0), (5000, 5000));
        assert_eq!(scaled_size(8, 30, 0.5), (10, 15));
        assert_eq!(scaled_size(1169, 827, 1.0), (1169, 827));
    }
}
