//! Verification payload and QR code generation
//!
//! The payload is a short newline-separated text block:
//!
//! ```text
//! Certificate Verification
//! Name: Jane Smith
//! Course: Data Engineering
//! Date: March 15, 2024
//! ID: 20240315-0427
//! ```
//!
//! It is encoded at error-correction level H so a logo covering the centre
//! of the code does not make it unreadable.

use crate::assets::ImageAsset;
use crate::record::CertificateRecord;
use chrono::NaiveDate;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};

/// Quiet zone around the code, in modules
const QUIET_ZONE: u32 = 4;

/// Largest share of the code width the centre logo may cover
const LOGO_FRACTION: f64 = 0.2;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

const DARK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const LIGHT: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Labels that may introduce the course line
const COURSE_LABELS: [&str; 4] = ["Course", "Program", "Training", "Workshop"];

/// FNV-1a, 32-bit
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ *byte as u32).wrapping_mul(FNV_PRIME)
    })
}

/// Identifier `<YYYYMMDD>-<NNNN>` from the issue date and the recipient name
pub fn verification_id(name: &str, issued: NaiveDate) -> String {
    format!(
        "{}-{:04}",
        issued.format("%Y%m%d"),
        fnv1a_32(name.as_bytes()) % 10_000
    )
}

/// Heading and course label a template uses in its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadLabels {
    pub heading: &'static str,
    pub course_label: &'static str,
}

/// Text encoded into the verification code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPayload {
    pub heading: String,
    pub name: String,
    pub course_label: String,
    pub course: String,
    /// Formatted date, or the raw text when it did not parse
    pub date: String,
    pub id: String,
}

impl VerificationPayload {
    /// Build the payload for one record
    pub fn new(labels: PayloadLabels, record: &CertificateRecord, issued: NaiveDate) -> Self {
        Self {
            heading: labels.heading.to_string(),
            name: record.name().to_string(),
            course_label: labels.course_label.to_string(),
            course: record.course().to_string(),
            date: record.date().display(),
            id: verification_id(record.name(), issued),
        }
    }

    /// Newline-separated text form
    pub fn to_text(&self) -> String {
        format!(
            "{}\nName: {}\n{}: {}\nDate: {}\nID: {}",
            self.heading, self.name, self.course_label, self.course, self.date, self.id
        )
    }

    /// Parse the text form back, e.g. after scanning a code
    ///
    /// Blank lines and surrounding whitespace are ignored. Returns `None`
    /// when a line is missing, out of order, or unknown.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

        let heading = lines.next()?;
        let name = lines.next()?.strip_prefix("Name: ")?;
        let (course_label, course) = lines.next()?.split_once(": ")?;
        if !COURSE_LABELS.contains(&course_label) {
            return None;
        }
        let date = lines.next()?.strip_prefix("Date: ")?;
        let id = lines.next()?.strip_prefix("ID: ")?;
        if lines.next().is_some() {
            return None;
        }

        Some(Self {
            heading: heading.to_string(),
            name: name.to_string(),
            course_label: course_label.to_string(),
            course: course.to_string(),
            date: date.to_string(),
            id: id.to_string(),
        })
    }
}

/// How individual QR modules are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStyle {
    Square,
    /// Outer corners of isolated module edges are rounded
    #[default]
    Rounded,
}

/// Encode text at error-correction level H
pub fn encode(text: &str) -> Option<QrCode> {
    match QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H) {
        Ok(code) => Some(code),
        Err(e) => {
            log::warn!("verification code omitted: {e}");
            None
        }
    }
}

/// Whether pixel (u, v) inside a module of size `b` is painted when the
/// module's corners may be rounded
fn inside_rounded(u: f64, v: f64, b: f64, open_corner: impl Fn(bool, bool) -> bool) -> bool {
    let r = b / 2.0;
    let left = u < r;
    let top = v < r;
    if !open_corner(left, top) {
        return true;
    }
    let (du, dv) = (u - r, v - r);
    du * du + dv * dv <= r * r
}

fn draw_modules(code: &QrCode, box_size: u32, style: QrStyle) -> RgbaImage {
    let width = code.width() as u32;
    let colors = code.to_colors();
    let dark = |x: i64, y: i64| -> bool {
        if x < 0 || y < 0 || x >= width as i64 || y >= width as i64 {
            return false;
        }
        colors[(y as u32 * width + x as u32) as usize] == qrcode::Color::Dark
    };

    let native = (width + 2 * QUIET_ZONE) * box_size;
    let mut image = RgbaImage::from_pixel(native, native, LIGHT);
    let b = box_size as f64;

    for my in 0..width as i64 {
        for mx in 0..width as i64 {
            if !dark(mx, my) {
                continue;
            }
            let ox = (mx as u32 + QUIET_ZONE) * box_size;
            let oy = (my as u32 + QUIET_ZONE) * box_size;
            for py in 0..box_size {
                for px in 0..box_size {
                    let paint = match style {
                        QrStyle::Square => true,
                        QrStyle::Rounded => {
                            let (u, v) = (px as f64 + 0.5, py as f64 + 0.5);
                            inside_rounded(u, v, b, |left, top| {
                                let nx = if left { mx - 1 } else { mx + 1 };
                                let ny = if top { my - 1 } else { my + 1 };
                                !dark(nx, my) && !dark(mx, ny)
                            })
                        }
                    };
                    if paint {
                        image.put_pixel(ox + px, oy + py, DARK);
                    }
                }
            }
        }
    }
    image
}

fn embed_logo(image: &mut RgbaImage, logo: &ImageAsset, pad: u32) {
    let max_edge = ((image.width() as f64) * LOGO_FRACTION).floor() as u32;
    if max_edge == 0 {
        return;
    }
    let (w, h) = pdf_core::fit_within(
        logo.width(),
        logo.height(),
        max_edge as f64,
        max_edge as f64,
    );
    let (w, h) = ((w.round() as u32).max(1), (h.round() as u32).max(1));
    let scaled = imageops::resize(logo.image().as_ref(), w, h, FilterType::Lanczos3);

    let backing = RgbaImage::from_pixel(w + 2 * pad, h + 2 * pad, LIGHT);
    let bx = (image.width() as i64 - backing.width() as i64) / 2;
    let by = (image.height() as i64 - backing.height() as i64) / 2;
    imageops::overlay(image, &backing, bx, by);
    imageops::overlay(image, &scaled, bx + pad as i64, by + pad as i64);
}

/// Smallest accepted code image edge in pixels
///
/// Payloads encode at around 57 modules plus the quiet zone, so this keeps
/// at least two pixels per module for them.
pub const MIN_QR_SIZE_PX: u32 = 160;

/// Render payload text as a square QR image of `size_px` pixels
///
/// Modules are drawn at a whole number of pixels each; whatever `size_px`
/// leaves over widens the quiet zone. Only when `size_px` has fewer pixels
/// than the code has modules is the image downsampled (Lanczos3), and such
/// a code will rarely scan.
///
/// # Arguments
/// * `text` - Payload text
/// * `logo` - Optional logo drawn over the centre on a white pad
/// * `size_px` - Output edge length in pixels
/// * `style` - Module style
///
/// # Returns
/// `None` when the payload cannot be encoded or `size_px` is zero; the
/// caller leaves the code out
pub fn generate_qr(
    text: &str,
    logo: Option<&ImageAsset>,
    size_px: u32,
    style: QrStyle,
) -> Option<RgbaImage> {
    if size_px == 0 {
        log::warn!("verification code omitted: zero pixel size");
        return None;
    }
    let code = encode(text)?;
    let total_modules = code.width() as u32 + 2 * QUIET_ZONE;
    let box_size = (size_px / total_modules).max(1);

    let mut modules = draw_modules(&code, box_size, style);
    if let Some(logo) = logo {
        embed_logo(&mut modules, logo, (box_size / 2).max(1));
    }

    let image = if modules.width() == size_px {
        modules
    } else if modules.width() > size_px {
        log::warn!(
            "verification code: {total_modules} modules squeezed into {size_px}px may not scan"
        );
        imageops::resize(&modules, size_px, size_px, FilterType::Lanczos3)
    } else {
        let mut padded = RgbaImage::from_pixel(size_px, size_px, LIGHT);
        let offset = ((size_px - modules.width()) / 2) as i64;
        imageops::replace(&mut padded, &modules, offset, offset);
        padded
    };
    log::debug!(
        "verification code: {} modules, box {box_size}px, output {size_px}px",
        code.width()
    );
    Some(image)
}
