//! Template rendering entry points

use crate::assets::AssetSet;
use crate::record::CertificateRecord;
use crate::templates::{Composition, TemplateId, QR_EDGE};
use crate::verification::{generate_qr, QrStyle, VerificationPayload};
use crate::Result;
use chrono::{Datelike, NaiveDate};
use pdf_core::{assemble, Canvas, Document, DocumentInfo, Finalize};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Source of the issue date stamped into IDs, footers and metadata
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always the same date; makes output byte-for-byte reproducible
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Rendering knobs shared by every template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub qr_style: QrStyle,
    /// Pixel edge of the verification code image before it is placed
    pub qr_size_px: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            qr_style: QrStyle::default(),
            // 80 pt at roughly 216 dpi
            qr_size_px: 240,
        }
    }
}

/// Certificate renderer
#[derive(Clone)]
pub struct Renderer {
    clock: Arc<dyn Clock>,
    options: RenderOptions,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            options: RenderOptions::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Verification payload a certificate would carry if rendered now
    pub fn payload(&self, template: TemplateId, record: &CertificateRecord) -> VerificationPayload {
        VerificationPayload::new(template.payload_labels(), record, self.clock.today())
    }

    /// Draw a certificate without finalising it
    pub fn compose(
        &self,
        template: TemplateId,
        record: &CertificateRecord,
        assets: &AssetSet,
    ) -> Result<Canvas> {
        let issued = self.clock.today();
        let payload = VerificationPayload::new(template.payload_labels(), record, issued);
        let qr = generate_qr(
            &payload.to_text(),
            assets.logo.as_ref(),
            self.options.qr_size_px,
            self.options.qr_style,
        )
        .map(Arc::new);

        let ctx = Composition {
            template,
            record,
            assets,
            payload: &payload,
            qr,
            year: issued.year(),
        };

        let mut canvas = Canvas::new(template.page_size());
        template.compose(&mut canvas, &ctx)?;
        log::debug!(
            "{}: composed {} primitives for {} (code {} pt)",
            template,
            canvas.commands().len(),
            record.name(),
            QR_EDGE
        );
        Ok(canvas)
    }

    /// Render one certificate into a finished single-page document
    ///
    /// # Arguments
    /// * `template` - Which layout to draw
    /// * `record` - Validated recipient data
    /// * `assets` - Optional logo and signature
    /// * `mode` - `Finalize::Preview` keeps the page for rasterising; the
    ///   draw sequence is the same either way
    pub fn render(
        &self,
        template: TemplateId,
        record: &CertificateRecord,
        assets: &AssetSet,
        mode: Finalize,
    ) -> Result<Document> {
        let canvas = self.compose(template, record, assets)?;
        let info = DocumentInfo {
            title: Some(format!("Certificate - {}", record.name())),
            subject: Some(template.display_name().to_string()),
            creation_date: Some(self.clock.today().format("D:%Y%m%d000000").to_string()),
            ..DocumentInfo::default()
        };
        Ok(assemble(canvas, &info, mode)?)
    }
}

/// Render with default options and today's date
pub fn render(
    template: TemplateId,
    record: &CertificateRecord,
    assets: &AssetSet,
    preview: bool,
) -> Result<Document> {
    let mode = if preview {
        Finalize::Preview
    } else {
        Finalize::Final
    };
    Renderer::new().render(template, record, assets, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdf_core::Command;
    use pretty_assertions::assert_eq;

    fn renderer() -> Renderer {
        Renderer::new().with_clock(Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        )))
    }

    fn texts(canvas: &Canvas) -> Vec<String> {
        canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                Command::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(description: Option<&str>) -> CertificateRecord {
        CertificateRecord::new("Jane Smith", "Data Engineering", "2024-03-15", description)
            .unwrap()
    }

    #[test]
    fn test_name_case_per_template() {
        let r = renderer();
        for template in TemplateId::ALL {
            let canvas = r.compose(template, &record(None), &AssetSet::default()).unwrap();
            let texts = texts(&canvas);
            let expected = if template.uppercase_name() {
                "JANE SMITH"
            } else {
                "Jane Smith"
            };
            assert!(texts.iter().any(|t| t == expected), "{template}: {texts:?}");
        }
    }

    #[test]
    fn test_description_block_omitted_when_empty() {
        let r = renderer();
        for template in TemplateId::ALL {
            if template == TemplateId::ModernProfessional {
                // Modern folds the description into its body sentence
                continue;
            }
            let without = texts(&r.compose(template, &record(None), &AssetSet::default()).unwrap());
            let with = texts(
                &r.compose(template, &record(Some("Pipelines")), &AssetSet::default())
                    .unwrap(),
            );
            assert_eq!(with.len(), without.len() + 1, "{template}");
            assert!(with.iter().any(|t| t == "Pipelines"));
        }
    }

    #[test]
    fn test_modern_body_mentions_description() {
        let canvas = renderer()
            .compose(
                TemplateId::ModernProfessional,
                &record(Some("Rust")),
                &AssetSet::default(),
            )
            .unwrap();
        let body = texts(&canvas).join(" ");
        assert!(body.contains("with demonstrated excellence in Rust"));
    }

    #[test]
    fn test_modern_prints_id_and_year() {
        let r = renderer();
        let canvas = r
            .compose(TemplateId::ModernProfessional, &record(None), &AssetSet::default())
            .unwrap();
        let texts = texts(&canvas);
        let id = r.payload(TemplateId::ModernProfessional, &record(None)).id;
        assert!(texts.contains(&format!("ID: {id}")));
        assert!(texts.iter().any(|t| t.starts_with("\u{a9} 2024 ")));
    }

    #[test]
    fn test_corporate_header_certificate_number() {
        let r = renderer();
        let canvas = r
            .compose(TemplateId::CorporateAchievement, &record(None), &AssetSet::default())
            .unwrap();
        let id = r.payload(TemplateId::CorporateAchievement, &record(None)).id;
        assert!(texts(&canvas).contains(&format!("CERT-{id}")));
    }

    #[test]
    fn test_every_template_places_code() {
        let r = renderer();
        for template in TemplateId::ALL {
            let canvas = r.compose(template, &record(None), &AssetSet::default()).unwrap();
            let placed = canvas.commands().iter().any(|c| {
                matches!(c, Command::Image { width, height, .. }
                    if (*width - QR_EDGE).abs() < 1e-6 && (*height - QR_EDGE).abs() < 1e-6)
            });
            assert!(placed, "{template}");
            assert!(canvas.warnings().is_empty());
        }
    }

    #[test]
    fn test_unparseable_date_is_printed_verbatim() {
        let record = CertificateRecord::new("Ana", "Course", "not-a-date", None).unwrap();
        let r = renderer();
        let canvas = r
            .compose(TemplateId::WorkshopCompletion, &record, &AssetSet::default())
            .unwrap();
        assert!(texts(&canvas).contains(&"Completed on not-a-date".to_string()));
        assert_eq!(r.payload(TemplateId::WorkshopCompletion, &record).date, "not-a-date");
    }

    #[test]
    fn test_preview_keeps_page() {
        let r = renderer();
        let preview = r
            .render(
                TemplateId::ClassicElegance,
                &record(None),
                &AssetSet::default(),
                Finalize::Preview,
            )
            .unwrap();
        let last = r
            .render(
                TemplateId::ClassicElegance,
                &record(None),
                &AssetSet::default(),
                Finalize::Final,
            )
            .unwrap();
        assert!(preview.preview_page().is_some());
        assert!(last.preview_page().is_none());
        assert_eq!(preview.bytes(), last.bytes());
    }
}
