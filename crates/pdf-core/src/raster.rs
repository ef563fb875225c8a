//! Raster backend: replays a page display list into an RGBA image
//!
//! Shapes, gradients and images are drawn with tiny-skia. Text glyph
//! outlines come from TrueType files found on the system (ttf-parser), but
//! every glyph is advanced with the base-14 metrics so line breaks and
//! alignment match the PDF exactly.

use crate::canvas::{Command, Page, Stroke};
use crate::document::Color;
use crate::font::{FontFamily, FontStyle, FontWeight, StandardFont};
use crate::{PdfError, Result};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, IntSize, LinearGradient, Paint, PathBuilder, Pixmap,
    PixmapPaint, Point, Rect, SpreadMode, Transform,
};
use ttf_parser::OutlineBuilder;

/// Environment variable with extra font directories (path-list syntax)
pub const FONT_DIR_ENV: &str = "CERTGEN_FONT_DIR";

/// Directory depth searched below each font directory
const MAX_FONT_DIR_DEPTH: usize = 5;

type FontCache = HashMap<Vec<PathBuf>, RasterFonts>;

static FONT_CACHE: OnceLock<Mutex<FontCache>> = OnceLock::new();

/// TrueType faces standing in for the base-14 fonts when rasterising
#[derive(Debug, Clone, Default)]
pub struct RasterFonts {
    faces: HashMap<StandardFont, Arc<Vec<u8>>>,
}

impl RasterFonts {
    /// No faces at all; text is skipped when rasterising
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve faces from `font_dir`, then `CERTGEN_FONT_DIR`, then the
    /// platform font directories. Results are cached per directory list.
    pub fn discover(font_dir: Option<&Path>) -> Self {
        let mut dirs = Vec::new();
        if let Some(dir) = font_dir {
            dirs.push(dir.to_path_buf());
        }
        if let Ok(extra) = std::env::var(FONT_DIR_ENV) {
            dirs.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
        }
        dirs.extend(system_font_dirs());

        let cache = FONT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
        if let Ok(guard) = cache.lock() {
            if let Some(fonts) = guard.get(&dirs) {
                return fonts.clone();
            }
        }

        let fonts = Self::from_dirs(&dirs);
        if let Ok(mut guard) = cache.lock() {
            guard.insert(dirs, fonts.clone());
        }
        fonts
    }

    /// Resolve faces from an explicit list of directories, searched in order
    pub fn from_dirs(dirs: &[PathBuf]) -> Self {
        let mut files: HashMap<String, PathBuf> = HashMap::new();
        for dir in dirs {
            index_font_files(dir, 0, &mut files);
        }

        let mut fonts = Self::empty();
        for font in StandardFont::ALL {
            for candidate in font_file_candidates(font) {
                let Some(path) = files.get(&candidate.to_ascii_lowercase()) else {
                    continue;
                };
                let Ok(bytes) = std::fs::read(path) else {
                    continue;
                };
                if fonts.insert(font, bytes).is_ok() {
                    log::debug!("raster font {} -> {}", font.base_font_name(), path.display());
                    break;
                }
            }
        }
        if fonts.is_empty() {
            log::warn!("no TrueType fonts found for rasterising text");
        }
        fonts
    }

    /// Register a face for one base-14 font
    pub fn insert(&mut self, font: StandardFont, bytes: Vec<u8>) -> Result<()> {
        ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| PdfError::RasterError(format!("invalid font data: {e}")))?;
        self.faces.insert(font, Arc::new(bytes));
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Face for a font, falling back to the family's regular cut, then to
    /// the other family
    pub fn get(&self, font: StandardFont) -> Option<&[u8]> {
        let regular = font.family().variant(FontWeight::Regular, FontStyle::Normal);
        let other = match font.family() {
            FontFamily::Helvetica => FontFamily::Times,
            FontFamily::Times => FontFamily::Helvetica,
        };
        [
            font,
            regular,
            other.variant(font.weight(), font.style()),
            other.variant(FontWeight::Regular, FontStyle::Normal),
        ]
        .iter()
        .find_map(|f| self.faces.get(f))
        .map(|bytes| bytes.as_slice())
    }
}

fn index_font_files(dir: &Path, depth: usize, files: &mut HashMap<String, PathBuf>) {
    if depth > MAX_FONT_DIR_DEPTH {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            index_font_files(&path, depth + 1, files);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.entry(name.to_ascii_lowercase()).or_insert(path);
        }
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    dirs
}

/// Metric-compatible font files first, then common look-alikes
fn font_file_candidates(font: StandardFont) -> &'static [&'static str] {
    match font {
        StandardFont::Helvetica => &[
            "LiberationSans-Regular.ttf",
            "Arial.ttf",
            "FreeSans.ttf",
            "DejaVuSans.ttf",
        ],
        StandardFont::HelveticaBold => &[
            "LiberationSans-Bold.ttf",
            "Arial Bold.ttf",
            "arialbd.ttf",
            "FreeSansBold.ttf",
            "DejaVuSans-Bold.ttf",
        ],
        StandardFont::HelveticaOblique => &[
            "LiberationSans-Italic.ttf",
            "Arial Italic.ttf",
            "ariali.ttf",
            "FreeSansOblique.ttf",
            "DejaVuSans-Oblique.ttf",
        ],
        StandardFont::HelveticaBoldOblique => &[
            "LiberationSans-BoldItalic.ttf",
            "Arial Bold Italic.ttf",
            "arialbi.ttf",
            "FreeSansBoldOblique.ttf",
            "DejaVuSans-BoldOblique.ttf",
        ],
        StandardFont::TimesRoman => &[
            "LiberationSerif-Regular.ttf",
            "Times New Roman.ttf",
            "times.ttf",
            "FreeSerif.ttf",
            "DejaVuSerif.ttf",
        ],
        StandardFont::TimesBold => &[
            "LiberationSerif-Bold.ttf",
            "Times New Roman Bold.ttf",
            "timesbd.ttf",
            "FreeSerifBold.ttf",
            "DejaVuSerif-Bold.ttf",
        ],
        StandardFont::TimesItalic => &[
            "LiberationSerif-Italic.ttf",
            "Times New Roman Italic.ttf",
            "timesi.ttf",
            "FreeSerifItalic.ttf",
            "DejaVuSerif-Italic.ttf",
        ],
        StandardFont::TimesBoldItalic => &[
            "LiberationSerif-BoldItalic.ttf",
            "Times New Roman Bold Italic.ttf",
            "timesbi.ttf",
            "FreeSerifBoldItalic.ttf",
            "DejaVuSerif-BoldItalic.ttf",
        ],
    }
}

struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y + y * self.scale)
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn sk_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

fn solid_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.anti_alias = true;
    paint
}

fn sk_stroke(stroke: &Stroke) -> tiny_skia::Stroke {
    tiny_skia::Stroke {
        width: stroke.width as f32,
        ..Default::default()
    }
}

fn rect_path(x: f64, y: f64, width: f64, height: f64) -> Option<tiny_skia::Path> {
    let rect = Rect::from_xywh(x as f32, y as f32, width as f32, height as f32)?;
    Some(PathBuilder::from_rect(rect))
}

fn round_rect_path(x: f64, y: f64, width: f64, height: f64, radius: f64) -> Option<tiny_skia::Path> {
    if radius <= 0.0 {
        return rect_path(x, y, width, height);
    }
    let (x, y, w, h, r) = (x as f32, y as f32, width as f32, height as f32, radius as f32);
    let k = r * 0.552_284_8;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn paint_path(
    pixmap: &mut Pixmap,
    path: &tiny_skia::Path,
    fill: Option<Color>,
    stroke: Option<&Stroke>,
    transform: Transform,
) {
    if let Some(fill) = fill {
        pixmap.fill_path(path, &solid_paint(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = stroke {
        pixmap.stroke_path(
            path,
            &solid_paint(stroke.color),
            &sk_stroke(stroke),
            transform,
            None,
        );
    }
}

/// Convert straight-alpha RGBA pixels into a premultiplied pixmap
fn image_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        let premultiply = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        data.extend_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
    }
    Pixmap::from_vec(data, size)
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    pixmap: &mut Pixmap,
    face_data: &[u8],
    text: &str,
    x: f64,
    y: f64,
    font: StandardFont,
    size: f64,
    color: Color,
    transform: Transform,
) {
    let Ok(face) = ttf_parser::Face::parse(face_data, 0) else {
        return;
    };
    let scale = size as f32 / face.units_per_em().max(1) as f32;
    let paint = solid_paint(color);
    let mut pen_x = x;
    for c in text.chars() {
        if let Some(glyph) = face.glyph_index(c) {
            let mut builder = GlyphPathBuilder::new(pen_x as f32, y as f32, scale);
            if face.outline_glyph(glyph, &mut builder).is_some() {
                if let Some(path) = builder.finish() {
                    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
                }
            }
        }
        pen_x += font.glyph_width(c) as f64 * size / 1000.0;
    }
}

/// Rasterise a page at `dpi` onto a white background
///
/// # Arguments
/// * `page` - Display list and size of the page
/// * `dpi` - Output resolution; 72 maps one point to one pixel
/// * `fonts` - Faces used for glyph outlines
pub fn rasterize_page(page: &Page, dpi: f32, fonts: &RasterFonts) -> Result<RgbaImage> {
    if !dpi.is_finite() || dpi <= 0.0 {
        return Err(PdfError::RasterError(format!("invalid DPI {dpi}")));
    }
    let scale = dpi / 72.0;
    let width_px = ((page.size.width as f32) * scale).round().max(1.0) as u32;
    let height_px = ((page.size.height as f32) * scale).round().max(1.0) as u32;
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        PdfError::RasterError(format!(
            "invalid raster size {width_px}x{height_px} at {dpi} DPI"
        ))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let base_transform =
        Transform::from_row(scale, 0.0, 0.0, -scale, 0.0, page.size.height as f32 * scale);
    let mut image_cache: Vec<(Arc<RgbaImage>, Option<Pixmap>)> = Vec::new();
    let mut skipped_text = 0usize;

    for command in &page.commands {
        match command {
            Command::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                if let Some(path) = rect_path(*x, *y, *width, *height) {
                    paint_path(&mut pixmap, &path, *fill, stroke.as_ref(), base_transform);
                }
            }
            Command::RoundRect {
                x,
                y,
                width,
                height,
                radius,
                fill,
                stroke,
            } => {
                if let Some(path) = round_rect_path(*x, *y, *width, *height, *radius) {
                    paint_path(&mut pixmap, &path, *fill, stroke.as_ref(), base_transform);
                }
            }
            Command::Circle {
                cx,
                cy,
                radius,
                fill,
                stroke,
            } => {
                if let Some(path) = PathBuilder::from_circle(*cx as f32, *cy as f32, *radius as f32)
                {
                    paint_path(&mut pixmap, &path, *fill, stroke.as_ref(), base_transform);
                }
            }
            Command::Line {
                x1,
                y1,
                x2,
                y2,
                stroke,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x1 as f32, *y1 as f32);
                pb.line_to(*x2 as f32, *y2 as f32);
                if let Some(path) = pb.finish() {
                    paint_path(&mut pixmap, &path, None, Some(stroke), base_transform);
                }
            }
            Command::LinearGradient {
                x,
                y,
                width,
                height,
                start,
                end,
                from,
                to,
            } => {
                let Some(path) = rect_path(*x, *y, *width, *height) else {
                    continue;
                };
                let shader = LinearGradient::new(
                    Point::from_xy(start.0 as f32, start.1 as f32),
                    Point::from_xy(end.0 as f32, end.1 as f32),
                    vec![
                        GradientStop::new(0.0, sk_color(*from)),
                        GradientStop::new(1.0, sk_color(*to)),
                    ],
                    SpreadMode::Pad,
                    Transform::identity(),
                );
                match shader {
                    Some(shader) => {
                        let mut paint = Paint::default();
                        paint.shader = shader;
                        paint.anti_alias = true;
                        pixmap.fill_path(&path, &paint, FillRule::Winding, base_transform, None);
                    }
                    None => paint_path(&mut pixmap, &path, Some(*from), None, base_transform),
                }
            }
            Command::Text { x, y, text, style } => match fonts.get(style.font) {
                Some(face) => draw_text(
                    &mut pixmap,
                    face,
                    text,
                    *x,
                    *y,
                    style.font,
                    style.size,
                    style.color,
                    base_transform,
                ),
                None => skipped_text += 1,
            },
            Command::Image {
                image,
                x,
                y,
                width,
                height,
            } => {
                let cached = match image_cache.iter().position(|(i, _)| Arc::ptr_eq(i, image)) {
                    Some(pos) => pos,
                    None => {
                        image_cache.push((Arc::clone(image), image_to_pixmap(image)));
                        image_cache.len() - 1
                    }
                };
                let Some(source) = image_cache[cached].1.as_ref() else {
                    continue;
                };
                // Source row 0 is the visual top of the image box
                let image_ts = Transform::from_row(
                    (*width / source.width() as f64) as f32,
                    0.0,
                    0.0,
                    -(*height / source.height() as f64) as f32,
                    *x as f32,
                    (*y + *height) as f32,
                );
                let paint = PixmapPaint {
                    quality: FilterQuality::Bicubic,
                    ..Default::default()
                };
                pixmap.draw_pixmap(
                    0,
                    0,
                    source.as_ref(),
                    &paint,
                    base_transform.pre_concat(image_ts),
                    None,
                );
            }
        }
    }

    if skipped_text > 0 {
        log::warn!("raster: skipped {skipped_text} text runs, no font available");
    }

    let mut out = RgbaImage::new(width_px, height_px);
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, PageSize, TextStyle};
    use crate::Align;
    use image::Rgba;

    fn small_page() -> PageSize {
        PageSize {
            width: 72.0,
            height: 36.0,
        }
    }

    #[test]
    fn test_raster_size_follows_dpi() {
        let canvas = Canvas::new(small_page());
        let (page, _) = canvas.finish();
        let image = rasterize_page(&page, 144.0, &RasterFonts::empty()).unwrap();
        assert_eq!(image.dimensions(), (144, 72));
        assert_eq!(image.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_invalid_dpi() {
        let (page, _) = Canvas::new(small_page()).finish();
        assert!(rasterize_page(&page, 0.0, &RasterFonts::empty()).is_err());
        assert!(rasterize_page(&page, f32::NAN, &RasterFonts::empty()).is_err());
    }

    #[test]
    fn test_rect_fill_uses_pdf_orientation() {
        let mut canvas = Canvas::new(small_page());
        // Bottom half of the page in PDF space
        canvas
            .fill_rect(0.0, 0.0, 72.0, 18.0, Color::rgb(1.0, 0.0, 0.0))
            .unwrap();
        let (page, _) = canvas.finish();
        let image = rasterize_page(&page, 72.0, &RasterFonts::empty()).unwrap();

        assert_eq!(image.get_pixel(36, 30), &Rgba([255, 0, 0, 255]));
        assert_eq!(image.get_pixel(36, 5), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_image_is_drawn_upright() {
        let mut source = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
        source.put_pixel(0, 0, Rgba([0, 255, 0, 255]));
        source.put_pixel(1, 0, Rgba([0, 255, 0, 255]));

        let mut canvas = Canvas::new(small_page());
        canvas
            .draw_image(&Arc::new(source), 0.0, 0.0, 36.0, 36.0)
            .unwrap();
        let (page, _) = canvas.finish();
        let image = rasterize_page(&page, 72.0, &RasterFonts::empty()).unwrap();

        // Top row of the source (green) lands at the top of the raster
        assert!(image.get_pixel(18, 2).0[1] > 200);
        assert!(image.get_pixel(18, 2).0[2] < 50);
        assert!(image.get_pixel(18, 33).0[2] > 200);
    }

    #[test]
    fn test_text_without_fonts_is_skipped() {
        let mut canvas = Canvas::new(small_page());
        canvas
            .draw_text("Hello", 2.0, 10.0, Align::Left, &TextStyle::helvetica(12.0))
            .unwrap();
        let (page, _) = canvas.finish();
        let image = rasterize_page(&page, 72.0, &RasterFonts::empty()).unwrap();
        assert!(image.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_insert_rejects_invalid_font() {
        let mut fonts = RasterFonts::empty();
        assert!(fonts.insert(StandardFont::Helvetica, vec![0, 1, 2]).is_err());
        assert!(fonts.is_empty());
        assert!(fonts.get(StandardFont::Helvetica).is_none());
    }

    #[test]
    fn test_from_missing_dirs_is_empty() {
        let fonts = RasterFonts::from_dirs(&[PathBuf::from("/nonexistent/certgen-fonts")]);
        assert!(fonts.is_empty());
    }
}
