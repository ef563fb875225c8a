//! Classic Elegance: landscape, cream background, rounded border, watermark

use super::{body_paragraph, centre_x, place_qr, Captioned, Composition};
use crate::Result;
use pdf_core::{Align, Canvas, Color, Stroke, TextStyle};

const BACKGROUND: u32 = 0xF9F5E8;
const BORDER: u32 = 0x8B7355;
const WATERMARK: u32 = 0xF0E6D2;
const NAVY: u32 = 0x2C3E50;
const ACCENT: u32 = 0xE74C3C;
const BODY: u32 = 0x333333;

pub(super) fn compose(canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
    let size = canvas.size();
    let (w, h) = (size.width, size.height);
    let cx = centre_x(canvas);
    let border = Color::hex(BORDER);
    let body = Color::hex(BODY);

    canvas.fill_rect(0.0, 0.0, w, h, Color::hex(BACKGROUND))?;
    canvas.round_rect(
        30.0,
        30.0,
        w - 60.0,
        h - 60.0,
        10.0,
        None,
        Some(Stroke::new(border, 10.0)),
    )?;
    canvas.draw_text(
        "CERTIFICATE",
        cx,
        (h / 2.0).floor() - 60.0,
        Align::Center,
        &TextStyle::helvetica(120.0).bold().color(Color::hex(WATERMARK)),
    )?;

    canvas.draw_text(
        "CERTIFICATE OF ACHIEVEMENT",
        cx,
        h - 120.0,
        Align::Center,
        &TextStyle::helvetica(42.0).bold().color(Color::hex(NAVY)),
    )?;
    canvas.line(
        cx - 180.0,
        h - 150.0,
        cx + 180.0,
        h - 150.0,
        Stroke::new(Color::hex(ACCENT), 3.0),
    )?;
    canvas.draw_text(
        "This is to certify that",
        cx,
        h - 200.0,
        Align::Center,
        &TextStyle::helvetica(20.0).color(Color::hex(NAVY)),
    )?;
    canvas.draw_text(
        &ctx.name(),
        cx,
        h - 260.0,
        Align::Center,
        &TextStyle::times(36.0).bold().italic().color(border),
    )?;

    body_paragraph(
        canvas,
        "has successfully completed the course of study in",
        h - 320.0,
        &TextStyle::helvetica(18.0).color(body),
        22.0,
    )?;
    canvas.draw_text(
        &format!("\u{ab}{}\u{bb}", ctx.record.course()),
        cx,
        h - 360.0,
        Align::Center,
        &TextStyle::helvetica(22.0).bold().color(Color::hex(NAVY)),
    )?;
    if let Some(description) = ctx.record.description() {
        body_paragraph(
            canvas,
            description,
            h - 400.0,
            &TextStyle::helvetica(16.0).color(Color::hex(0x555555)),
            20.0,
        )?;
    }

    canvas.draw_text(
        &format!("Awarded this {}", ctx.date()),
        cx,
        h - 450.0,
        Align::Center,
        &TextStyle::helvetica(16.0).italic().color(Color::hex(0x555555)),
    )?;

    let y = h - 550.0;
    if let Some(logo) = &ctx.assets.logo {
        Captioned {
            x: 100.0,
            y,
            width: 150.0,
            height: 100.0,
            rule: border,
            caption: "Official Seal",
            caption_align: Align::Left,
            caption_color: Color::hex(0x555555),
        }
        .draw(canvas, logo.image())?;
    }
    if let Some(signature) = &ctx.assets.signature {
        Captioned {
            x: w - 250.0,
            y,
            width: 150.0,
            height: 80.0,
            rule: border,
            caption: "Authorized Signature",
            caption_align: Align::Center,
            caption_color: Color::hex(0x555555),
        }
        .draw(canvas, signature.image())?;
    }

    place_qr(canvas, ctx, w - 120.0, 50.0)?;

    canvas.draw_text(
        "This certificate is awarded as recognition of professional achievement",
        cx,
        50.0,
        Align::Center,
        &TextStyle::helvetica(10.0).color(Color::hex(0x666666)),
    )?;
    Ok(())
}
