//! PDF Document assembly
//!
//! Turns a finished [`Canvas`] into an immutable single-page PDF. Object
//! ids and resource names (`F1`, `Im1`, `Sh1`) are handed out in draw
//! order, so the same draw sequence always produces the same bytes.

use crate::canvas::{Canvas, Command, Page, PageSize, Stroke};
use crate::font::StandardFont;
use crate::image::{placement_operators, ImageXObject};
use crate::text::{fmt_num, text_run_operators};
use crate::{PdfError, Result};
use image::RgbaImage;
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Control point factor for approximating a quarter circle with a cubic Bézier
const KAPPA: f64 = 0.552_284_749_8;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Create color from a packed `0xRRGGBB` value
    pub fn hex(rgb: u32) -> Self {
        Self::from_rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// 8-bit RGBA, fully opaque
    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), 255]
    }

    /// Components formatted as content stream operands (`r g b`)
    pub(crate) fn operands(&self) -> String {
        format!(
            "{} {} {}",
            fmt_num(self.r as f64),
            fmt_num(self.g as f64),
            fmt_num(self.b as f64)
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// How much of the composition survives finalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Finalize {
    /// Only the PDF bytes
    #[default]
    Final,
    /// PDF bytes plus the display list, for rasterising previews
    Preview,
}

/// Document information dictionary entries
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub producer: String,
    /// PDF date string, e.g. `D:20240315000000`
    pub creation_date: Option<String>,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: None,
            subject: None,
            producer: "certgen".to_string(),
            creation_date: None,
        }
    }
}

/// Immutable, finalised single-page PDF
#[derive(Debug, Clone)]
pub struct Document {
    bytes: Vec<u8>,
    page_size: PageSize,
    page: Option<Page>,
    warnings: Vec<String>,
}

impl Document {
    /// Serialized PDF
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Display list of the first page, kept only for [`Finalize::Preview`]
    pub fn preview_page(&self) -> Option<&Page> {
        self.page.as_ref()
    }

    /// Warnings collected while drawing
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Resources referenced from the page, in first-use order
#[derive(Default)]
struct Resources {
    fonts: Vec<(StandardFont, ObjectId)>,
    images: Vec<(Arc<RgbaImage>, ObjectId)>,
    shadings: Vec<ObjectId>,
}

impl Resources {
    fn font(&mut self, doc: &mut lopdf::Document, font: StandardFont) -> String {
        if let Some(pos) = self.fonts.iter().position(|(f, _)| *f == font) {
            return format!("F{}", pos + 1);
        }
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font_name(),
            "Encoding" => "WinAnsiEncoding",
        });
        self.fonts.push((font, id));
        format!("F{}", self.fonts.len())
    }

    fn image(&mut self, doc: &mut lopdf::Document, image: &Arc<RgbaImage>) -> Result<String> {
        if let Some(pos) = self
            .images
            .iter()
            .position(|(existing, _)| Arc::ptr_eq(existing, image))
        {
            return Ok(format!("Im{}", pos + 1));
        }
        let xobject = ImageXObject::from_rgba(image)?;
        let mut stream = xobject.color_stream();
        if let Some(mask) = xobject.mask_stream() {
            let mask_id = doc.add_object(mask);
            stream.dict.set("SMask", mask_id);
        }
        let id = doc.add_object(stream);
        self.images.push((Arc::clone(image), id));
        Ok(format!("Im{}", self.images.len()))
    }

    fn shading(
        &mut self,
        doc: &mut lopdf::Document,
        start: (f64, f64),
        end: (f64, f64),
        from: Color,
        to: Color,
    ) -> String {
        let components = |c: Color| -> Vec<Object> {
            vec![
                Object::Real(c.r as _),
                Object::Real(c.g as _),
                Object::Real(c.b as _),
            ]
        };
        let id = doc.add_object(dictionary! {
            "ShadingType" => 2,
            "ColorSpace" => "DeviceRGB",
            "Coords" => vec![
                Object::Real(start.0 as _),
                Object::Real(start.1 as _),
                Object::Real(end.0 as _),
                Object::Real(end.1 as _),
            ],
            "Function" => dictionary! {
                "FunctionType" => 2,
                "Domain" => vec![0.into(), 1.into()],
                "C0" => components(from),
                "C1" => components(to),
                "N" => 1,
            },
            "Extend" => vec![true.into(), true.into()],
        });
        self.shadings.push(id);
        format!("Sh{}", self.shadings.len())
    }

    fn into_dictionary(self) -> Dictionary {
        let mut resources = Dictionary::new();
        if !self.fonts.is_empty() {
            let mut fonts = Dictionary::new();
            for (i, (_, id)) in self.fonts.iter().enumerate() {
                fonts.set(format!("F{}", i + 1), *id);
            }
            resources.set("Font", fonts);
        }
        if !self.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (i, (_, id)) in self.images.iter().enumerate() {
                xobjects.set(format!("Im{}", i + 1), *id);
            }
            resources.set("XObject", xobjects);
        }
        if !self.shadings.is_empty() {
            let mut shadings = Dictionary::new();
            for (i, id) in self.shadings.iter().enumerate() {
                shadings.set(format!("Sh{}", i + 1), *id);
            }
            resources.set("Shading", shadings);
        }
        resources
    }
}

/// Painting operator for a closed path
fn paint_operator(fill: Option<Color>, stroke: Option<&Stroke>) -> &'static str {
    match (fill.is_some(), stroke.is_some()) {
        (true, true) => "B",
        (true, false) => "f",
        (false, true) => "S",
        (false, false) => "n",
    }
}

fn graphics_state(fill: Option<Color>, stroke: Option<&Stroke>) -> String {
    let mut ops = String::new();
    if let Some(fill) = fill {
        ops.push_str(&format!("{} rg\n", fill.operands()));
    }
    if let Some(stroke) = stroke {
        ops.push_str(&format!(
            "{} RG\n{} w\n",
            stroke.color.operands(),
            fmt_num(stroke.width)
        ));
    }
    ops
}

fn round_rect_path(x: f64, y: f64, width: f64, height: f64, radius: f64) -> String {
    let (r, k) = (radius, radius * KAPPA);
    let (x2, y2) = (x + width, y + height);
    let n = fmt_num;
    let mut path = String::new();
    path.push_str(&format!("{} {} m\n", n(x + r), n(y)));
    path.push_str(&format!("{} {} l\n", n(x2 - r), n(y)));
    path.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x2 - r + k),
        n(y),
        n(x2),
        n(y + r - k),
        n(x2),
        n(y + r)
    ));
    path.push_str(&format!("{} {} l\n", n(x2), n(y2 - r)));
    path.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x2),
        n(y2 - r + k),
        n(x2 - r + k),
        n(y2),
        n(x2 - r),
        n(y2)
    ));
    path.push_str(&format!("{} {} l\n", n(x + r), n(y2)));
    path.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x + r - k),
        n(y2),
        n(x),
        n(y2 - r + k),
        n(x),
        n(y2 - r)
    ));
    path.push_str(&format!("{} {} l\n", n(x), n(y + r)));
    path.push_str(&format!(
        "{} {} {} {} {} {} c\n",
        n(x),
        n(y + r - k),
        n(x + r - k),
        n(y),
        n(x + r),
        n(y)
    ));
    path.push_str("h\n");
    path
}

fn circle_path(cx: f64, cy: f64, r: f64) -> String {
    let k = r * KAPPA;
    let n = fmt_num;
    let mut path = String::new();
    path.push_str(&format!("{} {} m\n", n(cx + r), n(cy)));
    let arcs = [
        (cx + r, cy + k, cx + k, cy + r, cx, cy + r),
        (cx - k, cy + r, cx - r, cy + k, cx - r, cy),
        (cx - r, cy - k, cx - k, cy - r, cx, cy - r),
        (cx + k, cy - r, cx + r, cy - k, cx + r, cy),
    ];
    for (a, b, c, d, e, f) in arcs {
        path.push_str(&format!(
            "{} {} {} {} {} {} c\n",
            n(a),
            n(b),
            n(c),
            n(d),
            n(e),
            n(f)
        ));
    }
    path.push_str("h\n");
    path
}

/// Generate content stream operators for one command
fn command_operators(
    command: &Command,
    doc: &mut lopdf::Document,
    resources: &mut Resources,
) -> Result<Vec<u8>> {
    let n = fmt_num;
    let ops = match command {
        Command::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        } => format!(
            "q\n{}{} {} {} {} re\n{}\nQ\n",
            graphics_state(*fill, stroke.as_ref()),
            n(*x),
            n(*y),
            n(*width),
            n(*height),
            paint_operator(*fill, stroke.as_ref())
        ),
        Command::RoundRect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            stroke,
        } => format!(
            "q\n{}{}{}\nQ\n",
            graphics_state(*fill, stroke.as_ref()),
            round_rect_path(*x, *y, *width, *height, *radius),
            paint_operator(*fill, stroke.as_ref())
        ),
        Command::Circle {
            cx,
            cy,
            radius,
            fill,
            stroke,
        } => format!(
            "q\n{}{}{}\nQ\n",
            graphics_state(*fill, stroke.as_ref()),
            circle_path(*cx, *cy, *radius),
            paint_operator(*fill, stroke.as_ref())
        ),
        Command::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => format!(
            "q\n{}{} {} m\n{} {} l\nS\nQ\n",
            graphics_state(None, Some(stroke)),
            n(*x1),
            n(*y1),
            n(*x2),
            n(*y2)
        ),
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
            let name = resources.shading(doc, *start, *end, *from, *to);
            format!(
                "q\n{} {} {} {} re\nW\nn\n/{name} sh\nQ\n",
                n(*x),
                n(*y),
                n(*width),
                n(*height)
            )
        }
        Command::Text { x, y, text, style } => {
            let font = resources.font(doc, style.font);
            let hex = StandardFont::encode_text_hex(text);
            return Ok(text_run_operators(&font, style.size, style.color, *x, *y, &hex));
        }
        Command::Image {
            image,
            x,
            y,
            width,
            height,
        } => {
            let name = resources.image(doc, image)?;
            return Ok(placement_operators(&name, *x, *y, *width, *height));
        }
    };
    Ok(ops.into_bytes())
}

/// Finalise a canvas into single-page PDF bytes
///
/// # Arguments
/// * `canvas` - Finished page surface
/// * `info` - Information dictionary entries
/// * `mode` - Whether to keep the display list for previews
pub fn assemble(canvas: Canvas, info: &DocumentInfo, mode: Finalize) -> Result<Document> {
    let (page, warnings) = canvas.finish();
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut resources = Resources::default();

    let mut content = Vec::new();
    for command in &page.commands {
        content.extend(command_operators(command, &mut doc, &mut resources)?);
    }
    log::debug!(
        "assembled {} commands into {} content bytes",
        page.commands.len(),
        content.len()
    );

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&content)?;
    let compressed = encoder.finish()?;
    let contents_id = doc.add_object(Stream::new(
        dictionary! { "Filter" => "FlateDecode" },
        compressed,
    ));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(page.size.width as _),
            Object::Real(page.size.height as _),
        ],
        "Resources" => resources.into_dictionary(),
        "Contents" => contents_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });

    let mut info_dict = dictionary! {
        "Producer" => Object::string_literal(info.producer.as_str()),
    };
    if let Some(title) = &info.title {
        info_dict.set("Title", Object::string_literal(title.as_str()));
    }
    if let Some(subject) = &info.subject {
        info_dict.set("Subject", Object::string_literal(subject.as_str()));
    }
    if let Some(date) = &info.creation_date {
        info_dict.set("CreationDate", Object::string_literal(date.as_str()));
    }
    let info_id = doc.add_object(info_dict);

    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| PdfError::SaveError(e.to_string()))?;

    let page_size = page.size;
    Ok(Document {
        bytes,
        page_size,
        page: match mode {
            Finalize::Final => None,
            Finalize::Preview => Some(page),
        },
        warnings,
    })
}
