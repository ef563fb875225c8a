//! Integration tests for certificate rendering

use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use pdf_core::{Finalize, StandardFont};
use std::sync::Arc;
use template::verification::generate_qr;
use template::{
    AssetSet, CertificateRecord, FixedClock, ImageAsset, QrStyle, RenderOptions, Renderer,
    TemplateId, VerificationPayload,
};

fn renderer() -> Renderer {
    Renderer::new().with_clock(Arc::new(FixedClock(
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
    )))
}

fn jane(description: Option<&str>) -> CertificateRecord {
    CertificateRecord::new("Jane Smith", "Data Engineering", "2024-03-15", description).unwrap()
}

fn parse(bytes: &[u8]) -> lopdf::Document {
    lopdf::Document::load_mem(bytes).expect("produced PDF should parse")
}

fn first_page(doc: &lopdf::Document) -> &lopdf::Dictionary {
    let page_id = *doc.get_pages().values().next().unwrap();
    doc.get_object(page_id).unwrap().as_dict().unwrap()
}

fn page_content(doc: &lopdf::Document) -> String {
    let page = first_page(doc);
    let contents_id = page.get(b"Contents").unwrap().as_reference().unwrap();
    let stream = doc.get_object(contents_id).unwrap().as_stream().unwrap();
    let content = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    String::from_utf8_lossy(&content).into_owned()
}

fn media_box(doc: &lopdf::Document) -> (f64, f64) {
    let values: Vec<f64> = first_page(doc)
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|v| {
            v.as_f32()
                .map(|f| f as f64)
                .or_else(|_| v.as_i64().map(|i| i as f64))
                .unwrap()
        })
        .collect();
    (values[2], values[3])
}

fn count_text_runs(content: &str) -> usize {
    content.lines().filter(|l| l.trim_end().ends_with("Tj")).count()
}

#[test]
fn test_academic_diploma_for_jane_smith() {
    let r = renderer();
    let record = jane(None);
    let document = r
        .render(
            TemplateId::AcademicDiploma,
            &record,
            &AssetSet::default(),
            Finalize::Final,
        )
        .unwrap();

    let doc = parse(document.bytes());
    assert_eq!(doc.get_pages().len(), 1);
    let (w, h) = media_box(&doc);
    assert!(w > h, "diploma is landscape");

    let content = page_content(&doc);
    assert!(content.contains(&StandardFont::encode_text_hex("JANE SMITH")));
    assert!(content.contains(&StandardFont::encode_text_hex("Data Engineering")));
    assert!(content.contains(&StandardFont::encode_text_hex("Given this March 15, 2024")));

    let payload = r.payload(TemplateId::AcademicDiploma, &record);
    let text = payload.to_text();
    assert!(text.starts_with("Diploma Verification\n"));
    assert!(text.contains("Name: Jane Smith"));
    assert!(text.contains("Program: Data Engineering"));
    assert!(text.contains("ID: 20240315-"));
}

#[test]
fn test_empty_description_draws_no_block() {
    let r = renderer();
    let plain = r
        .render(
            TemplateId::AcademicDiploma,
            &jane(None),
            &AssetSet::default(),
            Finalize::Final,
        )
        .unwrap();
    let described = r
        .render(
            TemplateId::AcademicDiploma,
            &jane(Some("Distributed systems track")),
            &AssetSet::default(),
            Finalize::Final,
        )
        .unwrap();

    let plain_runs = count_text_runs(&page_content(&parse(plain.bytes())));
    let described_runs = count_text_runs(&page_content(&parse(described.bytes())));
    assert_eq!(described_runs, plain_runs + 1);
}

#[test]
fn test_every_template_yields_one_page_with_its_size() {
    let r = renderer();
    for template in TemplateId::ALL {
        let document = r
            .render(template, &jane(None), &AssetSet::default(), Finalize::Final)
            .unwrap();
        let doc = parse(document.bytes());
        assert_eq!(doc.get_pages().len(), 1, "{template}");

        let (w, h) = media_box(&doc);
        let expected = template.page_size();
        assert!((w - expected.width).abs() < 0.01, "{template}: width {w}");
        assert!((h - expected.height).abs() < 0.01, "{template}: height {h}");
    }
}

#[test]
fn test_fixed_clock_renders_identical_bytes() {
    let assets = AssetSet::new()
        .with_logo(ImageAsset::from_image(RgbaImage::from_pixel(
            60,
            40,
            Rgba([0, 90, 200, 255]),
        )))
        .with_signature(ImageAsset::from_image(RgbaImage::from_pixel(
            90,
            30,
            Rgba([10, 10, 10, 255]),
        )));
    for template in TemplateId::ALL {
        let a = renderer()
            .render(template, &jane(Some("Extra")), &assets, Finalize::Final)
            .unwrap();
        let b = renderer()
            .render(template, &jane(Some("Extra")), &assets, Finalize::Final)
            .unwrap();
        assert_eq!(a.bytes(), b.bytes(), "{template}");
    }
}

#[test]
fn test_unparseable_date_flows_through() {
    let r = renderer();
    let record = CertificateRecord::new("Ana Lee", "Rust", "not-a-date", None).unwrap();
    let document = r
        .render(
            TemplateId::ClassicElegance,
            &record,
            &AssetSet::default(),
            Finalize::Final,
        )
        .unwrap();

    let content = page_content(&parse(document.bytes()));
    assert!(content.contains(&StandardFont::encode_text_hex("Awarded this not-a-date")));

    let payload = r.payload(TemplateId::ClassicElegance, &record);
    assert_eq!(payload.date, "not-a-date");
    assert!(payload.to_text().contains("Date: not-a-date"));
}

#[test]
fn test_payload_survives_text_round_trip() {
    let r = renderer();
    for template in TemplateId::ALL {
        let payload = r.payload(template, &jane(None));
        let parsed = VerificationPayload::parse(&payload.to_text()).unwrap();
        assert_eq!(parsed, payload, "{template}");
    }
}

#[test]
fn test_info_dictionary_carries_title_and_date() {
    let document = renderer()
        .render(
            TemplateId::CorporateAchievement,
            &jane(None),
            &AssetSet::default(),
            Finalize::Final,
        )
        .unwrap();
    let doc = parse(document.bytes());
    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_object(info_id).unwrap().as_dict().unwrap();

    let title = info.get(b"Title").unwrap().as_str().unwrap();
    assert_eq!(title, b"Certificate - Jane Smith");
    let created = info.get(b"CreationDate").unwrap().as_str().unwrap();
    assert_eq!(created, b"D:20240315000000");
}

#[test]
fn test_free_render_function() {
    let document = template::render(
        TemplateId::WorkshopCompletion,
        &jane(None),
        &AssetSet::default(),
        true,
    )
    .unwrap();
    assert!(document.preview_page().is_some());
    assert_eq!(document.page_size(), TemplateId::WorkshopCompletion.page_size());
}

fn decode_qr(image: &RgbaImage) -> String {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        image.width() as usize,
        image.height() as usize,
        |x, y| {
            let [r, g, b, _] = image.get_pixel(x as u32, y as u32).0;
            ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
        },
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one code in the image");
    let (_, content) = grids[0].decode().expect("code should decode");
    content
}

#[test]
fn test_generated_codes_scan_back_to_the_payload() {
    let record = jane(None);
    let renderer = renderer();
    let size = RenderOptions::default().qr_size_px;
    let logo = ImageAsset::from_image(RgbaImage::from_pixel(60, 40, Rgba([30, 60, 150, 255])));

    for template in TemplateId::ALL {
        let payload = renderer.payload(template, &record);
        for style in [QrStyle::Square, QrStyle::Rounded] {
            for logo in [None, Some(&logo)] {
                let case = format!("{template}, {style:?}, logo: {}", logo.is_some());
                let image = generate_qr(&payload.to_text(), logo, size, style)
                    .unwrap_or_else(|| panic!("no code for {case}"));
                assert_eq!(image.dimensions(), (size, size), "{case}");

                let scanned = decode_qr(&image);
                let decoded = VerificationPayload::parse(&scanned)
                    .unwrap_or_else(|| panic!("unparseable payload for {case}: {scanned:?}"));
                assert_eq!(decoded.name, "Jane Smith", "{case}");
                assert_eq!(decoded.course, "Data Engineering", "{case}");
                assert_eq!(decoded.date, "March 15, 2024", "{case}");
                assert_eq!(decoded, payload, "{case}");
            }
        }
    }
}
