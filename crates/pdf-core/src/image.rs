//! Raster images: decoding, fitting and PDF image XObjects

use crate::text::fmt_num;
use crate::{PdfError, Result};
use image::{ImageReader, Limits, RgbaImage};
use lopdf::{dictionary, Dictionary, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Encodings accepted for logos and signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    /// Identify the encoding from its leading bytes
    fn sniff(data: &[u8]) -> Result<Self> {
        if data.starts_with(&PNG_SIGNATURE) {
            Ok(RasterFormat::Png)
        } else if data.starts_with(&JPEG_SOI) {
            Ok(RasterFormat::Jpeg)
        } else {
            Err(PdfError::ImageError(
                "not a PNG or JPEG image".to_string(),
            ))
        }
    }

    fn decoder_format(self) -> image::ImageFormat {
        match self {
            RasterFormat::Png => image::ImageFormat::Png,
            RasterFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Largest size with the image's aspect ratio that fits in a box
///
/// # Returns
/// (width, height) in the box's units
pub fn fit_within(
    pixel_width: u32,
    pixel_height: u32,
    box_width: f64,
    box_height: f64,
) -> (f64, f64) {
    if pixel_width == 0 || pixel_height == 0 {
        return (0.0, 0.0);
    }
    let scale = (box_width / pixel_width as f64).min(box_height / pixel_height as f64);
    (pixel_width as f64 * scale, pixel_height as f64 * scale)
}

/// Decode PNG or JPEG bytes into RGBA pixels
///
/// # Arguments
/// * `data` - Encoded image bytes
/// * `limits` - Optional decoder limits (dimensions, allocation)
pub fn decode_image(data: &[u8], limits: Option<Limits>) -> Result<RgbaImage> {
    let format = RasterFormat::sniff(data)?;
    let mut reader = ImageReader::with_format(Cursor::new(data), format.decoder_format());
    if let Some(limits) = limits {
        reader.limits(limits);
    }
    Ok(reader.decode()?.to_rgba8())
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Pixels split into the two planes a PDF image needs
///
/// Colour is a FlateDecode DeviceRGB plane. Transparency, when present,
/// travels as a separate DeviceGray plane referenced through `/SMask`
/// rather than being blended into the colour.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    /// Compressed RGB samples
    pub rgb: Vec<u8>,
    /// Compressed alpha samples, `None` for fully opaque images
    pub alpha: Option<Vec<u8>>,
}

impl ImageXObject {
    pub fn from_rgba(image: &RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let samples = image.as_raw();
        let rgb: Vec<u8> = samples
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();
        let alpha: Vec<u8> = samples.chunks_exact(4).map(|px| px[3]).collect();

        let alpha = if alpha.iter().all(|a| *a == u8::MAX) {
            None
        } else {
            Some(deflate(&alpha)?)
        };
        Ok(Self {
            width,
            height,
            rgb: deflate(&rgb)?,
            alpha,
        })
    }

    fn plane_dict(&self, color_space: &str) -> Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        }
    }

    /// Colour plane; the assembler links `/SMask` once the mask has an id
    pub fn color_stream(&self) -> Stream {
        Stream::new(self.plane_dict("DeviceRGB"), self.rgb.clone())
    }

    /// Alpha plane, if the image has any transparency
    pub fn mask_stream(&self) -> Option<Stream> {
        self.alpha
            .as_ref()
            .map(|alpha| Stream::new(self.plane_dict("DeviceGray"), alpha.clone()))
    }
}

/// Content stream operators painting image resource `name` into a box
pub fn placement_operators(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{name} Do\nQ\n",
        fmt_num(width),
        fmt_num(height),
        fmt_num(x),
        fmt_num(y)
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_sniff() {
        assert_eq!(RasterFormat::sniff(&PNG_SIGNATURE).unwrap(), RasterFormat::Png);
        assert_eq!(
            RasterFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap(),
            RasterFormat::Jpeg
        );
        assert!(RasterFormat::sniff(b"<svg xmlns=").is_err());
        assert!(RasterFormat::sniff(&[]).is_err());
    }

    #[test]
    fn test_decode_png() {
        let source = RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]));
        let decoded = decode_image(&png(&source), None).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_decode_respects_limits() {
        let mut limits = Limits::default();
        limits.max_image_width = Some(16);
        assert!(decode_image(&png(&RgbaImage::new(64, 64)), Some(limits)).is_err());
    }

    #[test]
    fn test_truncated_png_is_an_error() {
        assert!(decode_image(b"\x89PNG\r\n\x1a\ngarbage", None).is_err());
    }

    #[test]
    fn test_fit_within() {
        // Wide image limited by the box width
        assert_eq!(fit_within(800, 600, 100.0, 200.0), (100.0, 75.0));
        // Tall image limited by the box height
        assert_eq!(fit_within(600, 800, 200.0, 100.0), (75.0, 100.0));
        assert_eq!(fit_within(0, 10, 50.0, 50.0), (0.0, 0.0));
    }

    #[test]
    fn test_opaque_image_has_no_mask() {
        let xobject =
            ImageXObject::from_rgba(&RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])))
                .unwrap();
        assert!(xobject.alpha.is_none());
        assert!(xobject.mask_stream().is_none());
    }

    #[test]
    fn test_planes() {
        let mut img = RgbaImage::from_pixel(5, 3, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
        let xobject = ImageXObject::from_rgba(&img).unwrap();

        let color = xobject.color_stream();
        assert_eq!(color.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(
            color.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceRGB"
        );
        assert_eq!(color.dict.get(b"Width").unwrap().as_i64().unwrap(), 5);

        let mask = xobject.mask_stream().unwrap();
        assert_eq!(
            mask.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceGray"
        );
        assert_eq!(mask.dict.get(b"Height").unwrap().as_i64().unwrap(), 3);
    }

    #[test]
    fn test_placement_operators() {
        let ops = String::from_utf8(placement_operators("Im2", -5.0, 20.0, 80.0, 40.5)).unwrap();
        assert_eq!(ops, "q\n80 0 0 40.5 -5 20 cm\n/Im2 Do\nQ\n");
    }
}
