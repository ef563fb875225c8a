//! Page surface: records layout primitives into a display list
//!
//! Coordinates are PDF user space: points, origin at the bottom-left corner,
//! y growing upwards. The recorded commands are replayed by the PDF
//! assembler and by the rasterizer, so both outputs share one draw sequence.

use crate::document::Color;
use crate::font::{FontFamily, FontStyle, FontWeight, StandardFont};
use crate::image::{decode_image, fit_within};
use crate::text::{anchor_offset, wrap_to_width};
use crate::{Align, PdfError, Result};
use image::RgbaImage;
use std::sync::Arc;

/// Page size in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait (210 x 297 mm)
    pub const A4: PageSize = PageSize {
        width: 595.275_590_551_181_2,
        height: 841.889_763_779_527_7,
    };

    /// Same size with the long edge horizontal
    pub fn landscape(self) -> Self {
        if self.width >= self.height {
            self
        } else {
            Self {
                width: self.height,
                height: self.width,
            }
        }
    }

    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Stroke settings for outlines and lines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

/// Font, size and fill colour for a text run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: StandardFont,
    pub size: f64,
    pub color: Color,
}

impl TextStyle {
    pub fn new(font: StandardFont, size: f64, color: Color) -> Self {
        Self { font, size, color }
    }

    /// Regular Helvetica in black
    pub fn helvetica(size: f64) -> Self {
        Self::new(StandardFont::Helvetica, size, Color::black())
    }

    /// Regular Times in black
    pub fn times(size: f64) -> Self {
        Self::new(StandardFont::TimesRoman, size, Color::black())
    }

    /// Switch to another variant of the same family
    pub fn with_variant(mut self, weight: FontWeight, style: FontStyle) -> Self {
        self.font = self.font.family().variant(weight, style);
        self
    }

    pub fn bold(self) -> Self {
        let style = self.font.style();
        self.with_variant(FontWeight::Bold, style)
    }

    pub fn italic(self) -> Self {
        let weight = self.font.weight();
        self.with_variant(weight, FontStyle::Italic)
    }

    pub fn family(self, family: FontFamily) -> Self {
        Self {
            font: family.variant(self.font.weight(), self.font.style()),
            ..self
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// One recorded drawing primitive
#[derive(Debug, Clone)]
pub enum Command {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    RoundRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Circle {
        cx: f64,
        cy: f64,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
    /// Two-stop axial gradient clipped to a rectangle
    LinearGradient {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        start: (f64, f64),
        end: (f64, f64),
        from: Color,
        to: Color,
    },
    /// Text already resolved to a left baseline origin
    Text {
        x: f64,
        y: f64,
        text: String,
        style: TextStyle,
    },
    Image {
        image: Arc<RgbaImage>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

/// A finished page: size plus its display list
#[derive(Debug, Clone)]
pub struct Page {
    pub size: PageSize,
    pub commands: Vec<Command>,
}

/// Mutable drawing surface for one page
#[derive(Debug, Clone)]
pub struct Canvas {
    size: PageSize,
    commands: Vec<Command>,
    warnings: Vec<String>,
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PdfError::InvalidGeometry(format!(
            "{what}: non-finite coordinate in {values:?}"
        )))
    }
}

fn check_extent(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| *v >= 0.0) {
        Ok(())
    } else {
        Err(PdfError::InvalidGeometry(format!(
            "{what}: negative dimension in {values:?}"
        )))
    }
}

fn check_stroke(what: &str, stroke: Option<&Stroke>) -> Result<()> {
    match stroke {
        Some(s) => {
            check_finite(what, &[s.width])?;
            check_extent(what, &[s.width])
        }
        None => Ok(()),
    }
}

impl Canvas {
    /// Create an empty surface
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            commands: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    /// Page width truncated to whole points
    pub fn width_units(&self) -> i64 {
        self.size.width as i64
    }

    /// Page height truncated to whole points
    pub fn height_units(&self) -> i64 {
        self.size.height as i64
    }

    /// Commands recorded so far, in draw order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Non-fatal problems hit while drawing (e.g., undecodable images)
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Record a warning without drawing anything
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.warnings.push(message);
    }

    /// Split into the finished page and the collected warnings
    pub fn finish(self) -> (Page, Vec<String>) {
        (
            Page {
                size: self.size,
                commands: self.commands,
            },
            self.warnings,
        )
    }

    /// Draw a rectangle with optional fill and outline
    pub fn rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> Result<()> {
        check_finite("rect", &[x, y, width, height])?;
        check_extent("rect", &[width, height])?;
        check_stroke("rect", stroke.as_ref())?;
        self.commands.push(Command::Rect {
            x,
            y,
            width,
            height,
            fill,
            stroke,
        });
        Ok(())
    }

    /// Draw a filled rectangle
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) -> Result<()> {
        self.rect(x, y, width, height, Some(color), None)
    }

    /// Draw a rectangle with rounded corners
    #[allow(clippy::too_many_arguments)]
    pub fn round_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> Result<()> {
        check_finite("round_rect", &[x, y, width, height, radius])?;
        check_extent("round_rect", &[width, height, radius])?;
        check_stroke("round_rect", stroke.as_ref())?;
        let radius = radius.min(width / 2.0).min(height / 2.0);
        self.commands.push(Command::RoundRect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            stroke,
        });
        Ok(())
    }

    /// Draw a circle centred on (cx, cy)
    pub fn circle(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    ) -> Result<()> {
        check_finite("circle", &[cx, cy, radius])?;
        check_extent("circle", &[radius])?;
        check_stroke("circle", stroke.as_ref())?;
        self.commands.push(Command::Circle {
            cx,
            cy,
            radius,
            fill,
            stroke,
        });
        Ok(())
    }

    /// Draw a straight line
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: Stroke) -> Result<()> {
        check_finite("line", &[x1, y1, x2, y2])?;
        check_stroke("line", Some(&stroke))?;
        self.commands.push(Command::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        });
        Ok(())
    }

    /// Fill a rectangle with a two-stop gradient running from `start` to `end`
    #[allow(clippy::too_many_arguments)]
    pub fn linear_gradient(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        start: (f64, f64),
        end: (f64, f64),
        from: Color,
        to: Color,
    ) -> Result<()> {
        check_finite(
            "linear_gradient",
            &[x, y, width, height, start.0, start.1, end.0, end.1],
        )?;
        check_extent("linear_gradient", &[width, height])?;
        self.commands.push(Command::LinearGradient {
            x,
            y,
            width,
            height,
            start,
            end,
            from,
            to,
        });
        Ok(())
    }

    /// Width of `text` in points for the given style
    pub fn text_width(&self, text: &str, style: &TextStyle) -> f64 {
        style.font.text_width_points(text, style.size)
    }

    /// Draw a single line of text anchored at (x, baseline y)
    ///
    /// # Arguments
    /// * `text` - Text to draw; characters outside WinAnsi become `?`
    /// * `x` - Anchor X: left edge, centre or right edge depending on `align`
    /// * `y` - Baseline Y
    /// * `align` - Horizontal alignment around the anchor
    /// * `style` - Font, size and colour
    pub fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        align: Align,
        style: &TextStyle,
    ) -> Result<()> {
        check_finite("text", &[x, y, style.size])?;
        check_extent("text", &[style.size])?;
        let text = StandardFont::sanitize(text);
        if text.is_empty() {
            return Ok(());
        }
        let width = self.text_width(&text, style);
        self.commands.push(Command::Text {
            x: x + anchor_offset(width, align),
            y,
            text,
            style: *style,
        });
        Ok(())
    }

    /// Draw a word-wrapped paragraph inside a box of `wrap_width`
    ///
    /// `top` is the top edge of the paragraph box; the first baseline sits
    /// one font size below it and following lines step down by `leading`.
    ///
    /// # Returns
    /// Height consumed in points (`lines * leading`)
    #[allow(clippy::too_many_arguments)]
    pub fn draw_paragraph(
        &mut self,
        text: &str,
        x: f64,
        top: f64,
        wrap_width: f64,
        align: Align,
        style: &TextStyle,
        leading: f64,
    ) -> Result<f64> {
        check_finite("paragraph", &[x, top, wrap_width, leading, style.size])?;
        check_extent("paragraph", &[wrap_width, leading, style.size])?;
        let text = StandardFont::sanitize(text);
        let lines = wrap_to_width(&text, style.font, style.size, wrap_width);
        let anchor_x = match align {
            Align::Left => x,
            Align::Center => x + wrap_width / 2.0,
            Align::Right => x + wrap_width,
        };
        let mut baseline = top - style.size;
        for line in &lines {
            self.draw_text(line, anchor_x, baseline, align, style)?;
            baseline -= leading;
        }
        Ok(lines.len() as f64 * leading)
    }

    /// Draw a decoded image fitted into a box, centred, keeping its aspect
    /// ratio
    pub fn draw_image(
        &mut self,
        image: &Arc<RgbaImage>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        check_finite("image", &[x, y, width, height])?;
        check_extent("image", &[width, height])?;
        if image.width() == 0 || image.height() == 0 {
            self.warn("image: skipped empty image");
            return Ok(());
        }
        let (w, h) = fit_within(image.width(), image.height(), width, height);
        self.commands.push(Command::Image {
            image: Arc::clone(image),
            x: x + (width - w) / 2.0,
            y: y + (height - h) / 2.0,
            width: w,
            height: h,
        });
        Ok(())
    }

    /// Decode encoded image bytes and draw them fitted into a box
    ///
    /// Undecodable bytes are not an error: the draw is skipped and a
    /// warning recorded.
    pub fn draw_image_bytes(
        &mut self,
        data: &[u8],
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        check_finite("image", &[x, y, width, height])?;
        check_extent("image", &[width, height])?;
        match decode_image(data, None) {
            Ok(image) => self.draw_image(&Arc::new(image), x, y, width, height),
            Err(e) => {
                self.warn(format!("image: skipped undecodable image ({e})"));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(PageSize::A4)
    }

    #[test]
    fn test_a4_units() {
        let c = canvas();
        assert_eq!(c.width_units(), 595);
        assert_eq!(c.height_units(), 841);

        let l = Canvas::new(PageSize::A4.landscape());
        assert_eq!(l.width_units(), 841);
        assert_eq!(l.height_units(), 595);
        assert!(l.size().is_landscape());
    }

    #[test]
    fn test_landscape_is_idempotent() {
        let l = PageSize::A4.landscape();
        assert_eq!(l.landscape(), l);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut c = canvas();
        let err = c.fill_rect(f64::NAN, 0.0, 10.0, 10.0, Color::black());
        assert!(matches!(err, Err(PdfError::InvalidGeometry(_))));
        assert!(c.line(0.0, 0.0, f64::INFINITY, 0.0, Stroke::new(Color::black(), 1.0)).is_err());
        assert!(c.commands().is_empty());
    }

    #[test]
    fn test_rejects_negative_dimensions() {
        let mut c = canvas();
        assert!(c.fill_rect(0.0, 0.0, -1.0, 10.0, Color::black()).is_err());
        assert!(c.circle(0.0, 0.0, -5.0, Some(Color::black()), None).is_err());
        assert!(c
            .line(0.0, 0.0, 1.0, 1.0, Stroke::new(Color::black(), -1.0))
            .is_err());
    }

    #[test]
    fn test_round_rect_radius_clamped() {
        let mut c = canvas();
        c.round_rect(0.0, 0.0, 10.0, 40.0, 50.0, None, None).unwrap();
        match &c.commands()[0] {
            Command::RoundRect { radius, .. } => assert_eq!(*radius, 5.0),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_text_alignment() {
        let mut c = canvas();
        let style = TextStyle::helvetica(10.0);
        // "Hi" is 9.44pt wide at 10pt
        c.draw_text("Hi", 100.0, 50.0, Align::Center, &style).unwrap();
        c.draw_text("Hi", 100.0, 50.0, Align::Right, &style).unwrap();
        let xs: Vec<f64> = c
            .commands()
            .iter()
            .map(|cmd| match cmd {
                Command::Text { x, .. } => *x,
                _ => unreachable!(),
            })
            .collect();
        assert!((xs[0] - 95.28).abs() < 1e-9);
        assert!((xs[1] - 90.56).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_is_not_recorded() {
        let mut c = canvas();
        c.draw_text("", 0.0, 0.0, Align::Left, &TextStyle::helvetica(10.0))
            .unwrap();
        assert!(c.commands().is_empty());
    }

    #[test]
    fn test_paragraph_height() {
        let mut c = canvas();
        let style = TextStyle::helvetica(10.0);
        let height = c
            .draw_paragraph("Hello world", 0.0, 500.0, 40.0, Align::Left, &style, 12.0)
            .unwrap();
        assert_eq!(height, 24.0);
        assert_eq!(c.commands().len(), 2);
        match &c.commands()[1] {
            Command::Text { y, text, .. } => {
                assert_eq!(text, "world");
                assert_eq!(*y, 500.0 - 10.0 - 12.0);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_image_fit_is_centred() {
        let mut c = canvas();
        let img = Arc::new(RgbaImage::new(200, 100));
        c.draw_image(&img, 0.0, 0.0, 100.0, 100.0).unwrap();
        match &c.commands()[0] {
            Command::Image {
                x,
                y,
                width,
                height,
                ..
            } => {
                assert_eq!((*x, *y, *width, *height), (0.0, 25.0, 100.0, 50.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_image_is_skipped_with_warning() {
        let mut c = canvas();
        c.draw_image_bytes(b"not an image at all", 0.0, 0.0, 10.0, 10.0)
            .unwrap();
        c.fill_rect(0.0, 0.0, 1.0, 1.0, Color::white()).unwrap();
        assert_eq!(c.commands().len(), 1);
        assert_eq!(c.warnings().len(), 1);
    }

    #[test]
    fn test_text_style_variants() {
        let style = TextStyle::times(12.0).bold().italic();
        assert_eq!(style.font, StandardFont::TimesBoldItalic);
        let style = style.family(FontFamily::Helvetica);
        assert_eq!(style.font, StandardFont::HelveticaBoldOblique);
    }
}
