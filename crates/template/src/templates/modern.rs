//! Modern Professional: portrait, gradient page, dark header band

use super::{body_paragraph, centre_x, place_qr, Captioned, Composition};
use crate::Result;
use pdf_core::{Align, Canvas, Color, TextStyle};

const HEADER_HEIGHT: f64 = 150.0;
const NAVY: u32 = 0x2C3E50;
const ACCENT: u32 = 0xE74C3C;
const SILVER: u32 = 0xBDC3C7;
const GREY: u32 = 0x7F8C8D;

pub(super) fn compose(canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
    let size = canvas.size();
    // Layout runs on whole points
    let w = canvas.width_units() as f64;
    let h = canvas.height_units() as f64;
    let cx = centre_x(canvas);

    canvas.linear_gradient(
        0.0,
        0.0,
        size.width,
        size.height,
        (0.0, 0.0),
        (w, h),
        Color::white(),
        Color::hex(0xF8F9FA),
    )?;

    let header_y = h - HEADER_HEIGHT;
    canvas.fill_rect(0.0, header_y, size.width, size.height - header_y, Color::hex(NAVY))?;
    canvas.fill_rect(0.0, header_y, size.width, 8.0, Color::hex(ACCENT))?;
    canvas.draw_text(
        "CERTIFICATE",
        cx,
        h - 80.0,
        Align::Center,
        &TextStyle::helvetica(34.0).bold().color(Color::white()),
    )?;
    canvas.draw_text(
        "OF PROFESSIONAL ACHIEVEMENT",
        cx,
        h - 110.0,
        Align::Center,
        &TextStyle::helvetica(14.0).color(Color::hex(SILVER)),
    )?;

    canvas.fill_rect(40.0, 180.0, w - 80.0, h - 380.0, Color::white())?;

    canvas.draw_text(
        &ctx.name(),
        cx,
        h - 200.0,
        Align::Center,
        &TextStyle::helvetica(28.0).bold().color(Color::hex(NAVY)),
    )?;

    let mut text = format!("has successfully completed the {} program", ctx.record.course());
    if let Some(description) = ctx.record.description() {
        text.push_str(" with demonstrated excellence in ");
        text.push_str(description);
    }
    body_paragraph(
        canvas,
        &text,
        h - 280.0,
        &TextStyle::helvetica(16.0).color(Color::hex(0x333333)),
        22.0,
    )?;

    canvas.draw_text(
        "in recognition of outstanding performance and dedication",
        cx,
        h - 350.0,
        Align::Center,
        &TextStyle::helvetica(14.0).color(Color::hex(GREY)),
    )?;
    canvas.draw_text(
        &format!("Completed on: {}", ctx.date()),
        cx,
        h - 390.0,
        Align::Center,
        &TextStyle::helvetica(14.0).bold().color(Color::hex(ACCENT)),
    )?;

    let y = h - 480.0;
    if let Some(logo) = &ctx.assets.logo {
        Captioned {
            x: 100.0,
            y,
            width: 120.0,
            height: 80.0,
            rule: Color::hex(SILVER),
            caption: "Issuing Organization",
            caption_align: Align::Left,
            caption_color: Color::hex(ACCENT),
        }
        .draw(canvas, logo.image())?;
    }
    if let Some(signature) = &ctx.assets.signature {
        Captioned {
            x: w - 250.0,
            y,
            width: 150.0,
            height: 60.0,
            rule: Color::hex(SILVER),
            caption: "Authorized Signatory",
            caption_align: Align::Center,
            caption_color: Color::hex(ACCENT),
        }
        .draw(canvas, signature.image())?;
    }

    canvas.draw_text(
        &format!("ID: {}", ctx.payload.id),
        w - 40.0,
        40.0,
        Align::Right,
        &TextStyle::helvetica(8.0).color(Color::hex(0x95A5A6)),
    )?;

    place_qr(canvas, ctx, w - 120.0, 50.0)?;

    canvas.draw_text(
        &format!(
            "\u{a9} {} Professional Certification Board. All rights reserved.",
            ctx.year
        ),
        cx,
        30.0,
        Align::Center,
        &TextStyle::helvetica(9.0).color(Color::hex(GREY)),
    )?;
    Ok(())
}
