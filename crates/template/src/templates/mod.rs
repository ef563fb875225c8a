//! Built-in certificate templates
//!
//! Every template is a plain function drawing onto a [`Canvas`] in PDF user
//! space (origin bottom-left, points). Layout coordinates are measured from
//! the page edges; horizontal centres use the page width floored to whole
//! points so all templates share one centre line per page size.

mod academic;
mod classic;
mod corporate;
mod modern;
mod workshop;

use crate::assets::AssetSet;
use crate::record::CertificateRecord;
use crate::verification::{PayloadLabels, VerificationPayload};
use crate::{Result, TemplateError};
use image::RgbaImage;
use pdf_core::{Align, Canvas, Color, PageSize, Stroke, TextStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Edge length of the verification code on the page, in points
pub(crate) const QR_EDGE: f64 = 80.0;

/// Horizontal margin of wrapped body paragraphs
const PARAGRAPH_MARGIN: f64 = 100.0;

/// The five built-in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateId {
    ClassicElegance,
    ModernProfessional,
    AcademicDiploma,
    CorporateAchievement,
    WorkshopCompletion,
}

impl TemplateId {
    pub const ALL: [TemplateId; 5] = [
        TemplateId::ClassicElegance,
        TemplateId::ModernProfessional,
        TemplateId::AcademicDiploma,
        TemplateId::CorporateAchievement,
        TemplateId::WorkshopCompletion,
    ];

    /// Human-readable name, e.g. "Classic Elegance"
    pub fn display_name(self) -> &'static str {
        match self {
            TemplateId::ClassicElegance => "Classic Elegance",
            TemplateId::ModernProfessional => "Modern Professional",
            TemplateId::AcademicDiploma => "Academic Diploma",
            TemplateId::CorporateAchievement => "Corporate Achievement",
            TemplateId::WorkshopCompletion => "Workshop Completion",
        }
    }

    /// Kebab-case identifier, e.g. "classic-elegance"
    pub fn id(self) -> &'static str {
        match self {
            TemplateId::ClassicElegance => "classic-elegance",
            TemplateId::ModernProfessional => "modern-professional",
            TemplateId::AcademicDiploma => "academic-diploma",
            TemplateId::CorporateAchievement => "corporate-achievement",
            TemplateId::WorkshopCompletion => "workshop-completion",
        }
    }

    /// A4, landscape for Classic Elegance and Academic Diploma
    pub fn page_size(self) -> PageSize {
        match self {
            TemplateId::ClassicElegance | TemplateId::AcademicDiploma => PageSize::A4.landscape(),
            _ => PageSize::A4,
        }
    }

    /// Whether the recipient name is printed in capitals
    pub fn uppercase_name(self) -> bool {
        matches!(
            self,
            TemplateId::ClassicElegance | TemplateId::AcademicDiploma
        )
    }

    /// Heading and course label of the verification payload
    pub fn payload_labels(self) -> PayloadLabels {
        let (heading, course_label) = match self {
            TemplateId::ClassicElegance | TemplateId::ModernProfessional => {
                ("Certificate Verification", "Course")
            }
            TemplateId::AcademicDiploma => ("Diploma Verification", "Program"),
            TemplateId::CorporateAchievement => ("Corporate Certification", "Training"),
            TemplateId::WorkshopCompletion => ("Workshop Certificate Verification", "Workshop"),
        };
        PayloadLabels {
            heading,
            course_label,
        }
    }

    /// Draw this template onto `canvas`
    pub(crate) fn compose(self, canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
        match self {
            TemplateId::ClassicElegance => classic::compose(canvas, ctx),
            TemplateId::ModernProfessional => modern::compose(canvas, ctx),
            TemplateId::AcademicDiploma => academic::compose(canvas, ctx),
            TemplateId::CorporateAchievement => corporate::compose(canvas, ctx),
            TemplateId::WorkshopCompletion => workshop::compose(canvas, ctx),
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TemplateId {
    type Err = TemplateError;

    /// Accepts the exact display name or the kebab-case id
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        TemplateId::ALL
            .into_iter()
            .find(|t| t.display_name() == s || t.id() == s)
            .ok_or_else(|| TemplateError::Render(format!("unknown template: {s}")))
    }
}

/// Everything a template draws from one record
pub(crate) struct Composition<'a> {
    pub template: TemplateId,
    pub record: &'a CertificateRecord,
    pub assets: &'a AssetSet,
    pub payload: &'a VerificationPayload,
    /// Rendered verification code, absent when encoding failed
    pub qr: Option<Arc<RgbaImage>>,
    /// Issue year for footers
    pub year: i32,
}

impl Composition<'_> {
    /// Recipient name as printed
    pub fn name(&self) -> String {
        if self.template.uppercase_name() {
            self.record.name().to_uppercase()
        } else {
            self.record.name().to_string()
        }
    }

    pub fn date(&self) -> String {
        self.record.date().display()
    }
}

/// Horizontal centre line of a page
pub(crate) fn centre_x(canvas: &Canvas) -> f64 {
    (canvas.size().width / 2.0).floor()
}

/// Centred paragraph between the standard margins, whose first line sits
/// where a single line placed at `bottom` would
pub(crate) fn body_paragraph(
    canvas: &mut Canvas,
    text: &str,
    bottom: f64,
    style: &TextStyle,
    leading: f64,
) -> Result<f64> {
    let width = canvas.size().width - 2.0 * PARAGRAPH_MARGIN;
    Ok(canvas.draw_paragraph(
        text,
        PARAGRAPH_MARGIN,
        bottom + leading,
        width,
        Align::Center,
        style,
        leading,
    )?)
}

/// Image box with a rule beneath it and a caption under the rule
pub(crate) struct Captioned<'a> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rule: Color,
    pub caption: &'a str,
    pub caption_align: Align,
    pub caption_color: Color,
}

impl Captioned<'_> {
    pub fn draw(&self, canvas: &mut Canvas, image: &Arc<RgbaImage>) -> Result<()> {
        canvas.draw_image(image, self.x, self.y, self.width, self.height)?;
        canvas.line(
            self.x,
            self.y - 10.0,
            self.x + self.width,
            self.y - 10.0,
            Stroke::new(self.rule, 0.5),
        )?;
        let anchor = match self.caption_align {
            Align::Center => self.x + self.width / 2.0,
            Align::Right => self.x + self.width,
            Align::Left => self.x,
        };
        canvas.draw_text(
            self.caption,
            anchor,
            self.y - 25.0,
            self.caption_align,
            &TextStyle::helvetica(10.0).color(self.caption_color),
        )?;
        Ok(())
    }
}

/// Draw the verification code with its lower-left corner at (x, y)
pub(crate) fn place_qr(canvas: &mut Canvas, ctx: &Composition<'_>, x: f64, y: f64) -> Result<()> {
    match &ctx.qr {
        Some(qr) => Ok(canvas.draw_image(qr, x, y, QR_EDGE, QR_EDGE)?),
        None => {
            canvas.warn("verification code omitted");
            Ok(())
        }
    }
}
