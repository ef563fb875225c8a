//! Logo and signature images
//!
//! Assets are decoded and verified when they are created, not when a
//! template draws them. Decoding runs on a helper thread so a pathological
//! file can be abandoned after a timeout.

use crate::{Result, TemplateError};
use image::{Limits, RgbaImage};
use std::path::Path;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Decode timeout used when the caller has no preference
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest accepted image edge in pixels
const MAX_IMAGE_EDGE: u32 = 10_000;

/// Largest decoder allocation in bytes
const MAX_DECODE_ALLOC: u64 = 512 * 1024 * 1024;

fn decode_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_EDGE);
    limits.max_image_height = Some(MAX_IMAGE_EDGE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Decode on a helper thread, giving up after `timeout`
fn decode_with_timeout(bytes: Vec<u8>, timeout: Duration) -> Result<RgbaImage> {
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("asset-decode".to_string())
        .spawn(move || {
            // The receiver may have timed out already
            let _ = tx.send(pdf_core::decode_image(&bytes, Some(decode_limits())));
        })?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(image)) => Ok(image),
        Ok(Err(e)) => Err(TemplateError::Asset(e.to_string())),
        Err(RecvTimeoutError::Timeout) => Err(TemplateError::Asset(format!(
            "decode timed out after {} ms",
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(TemplateError::Asset(
            "decoder stopped without a result".to_string(),
        )),
    }
}

/// A decoded, verified raster image shared read-only between renders
#[derive(Debug, Clone)]
pub struct ImageAsset {
    image: Arc<RgbaImage>,
}

impl ImageAsset {
    /// Decode PNG or JPEG bytes
    ///
    /// # Errors
    /// [`TemplateError::Asset`] if the bytes are not a decodable raster
    /// image, exceed the size limits, or take longer than `timeout`
    pub fn from_bytes(bytes: Vec<u8>, timeout: Duration) -> Result<Self> {
        let image = decode_with_timeout(bytes, timeout)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(TemplateError::Asset("image has no pixels".to_string()));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    /// Read and decode an image file
    pub fn from_path<P: AsRef<Path>>(path: P, timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| TemplateError::Asset(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes, timeout)
            .map_err(|e| TemplateError::Asset(format!("{}: {e}", path.display())))
    }

    /// Wrap pixels that are already decoded
    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    pub fn image(&self) -> &Arc<RgbaImage> {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Optional logo and signature, constant across a batch
#[derive(Debug, Clone, Default)]
pub struct AssetSet {
    pub logo: Option<ImageAsset>,
    pub signature: Option<ImageAsset>,
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logo(mut self, logo: ImageAsset) -> Self {
        self.logo = Some(logo);
        self
    }

    pub fn with_signature(mut self, signature: ImageAsset) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Load whichever asset files are given
    ///
    /// An asset that cannot be read or decoded is left out with a warning;
    /// it never fails the whole set.
    pub fn load(logo: Option<&Path>, signature: Option<&Path>, timeout: Duration) -> Self {
        let load_one = |kind: &str, path: Option<&Path>| {
            let path = path?;
            match ImageAsset::from_path(path, timeout) {
                Ok(asset) => {
                    log::info!(
                        "loaded {kind} {} ({}x{})",
                        path.display(),
                        asset.width(),
                        asset.height()
                    );
                    Some(asset)
                }
                Err(e) => {
                    log::warn!("{kind} omitted: {e}");
                    None
                }
            }
        };
        Self {
            logo: load_one("logo", logo),
            signature: load_one("signature", signature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([12, 34, 56, 255]));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_from_bytes() {
        let asset = ImageAsset::from_bytes(png_bytes(30, 20), DEFAULT_DECODE_TIMEOUT).unwrap();
        assert_eq!((asset.width(), asset.height()), (30, 20));
    }

    #[test]
    fn test_rejects_non_raster_data() {
        let err = ImageAsset::from_bytes(b"<svg></svg>....".to_vec(), DEFAULT_DECODE_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Asset(_)));
    }

    #[test]
    fn test_missing_file_is_asset_error() {
        let err = ImageAsset::from_path("/nonexistent/logo.png", DEFAULT_DECODE_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, TemplateError::Asset(_)));
    }

    #[test]
    fn test_load_degrades_to_omitted() {
        let assets = AssetSet::load(
            Some(Path::new("/nonexistent/logo.png")),
            None,
            DEFAULT_DECODE_TIMEOUT,
        );
        assert!(assets.logo.is_none());
        assert!(assets.signature.is_none());
    }

    #[test]
    fn test_clones_share_pixels() {
        let asset = ImageAsset::from_image(RgbaImage::new(4, 4));
        let assets = AssetSet::new().with_logo(asset);
        let copy = assets.clone();
        assert!(Arc::ptr_eq(
            assets.logo.as_ref().unwrap().image(),
            copy.logo.as_ref().unwrap().image()
        ));
    }
}
