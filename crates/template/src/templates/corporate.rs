//! Corporate Achievement: portrait, pale blue page with a branded header

use super::{body_paragraph, centre_x, place_qr, Composition};
use crate::Result;
use pdf_core::{Align, Canvas, Color, Stroke, TextStyle};

const PAGE: u32 = 0xE6F2FF;
const CORPORATE_BLUE: u32 = 0x003366;

pub(super) fn compose(canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
    let size = canvas.size();
    let (w, h) = (size.width, size.height);
    let cx = centre_x(canvas);
    let blue = Color::hex(CORPORATE_BLUE);
    let black = Color::black();

    canvas.fill_rect(0.0, 0.0, w, h, Color::hex(PAGE))?;
    canvas.fill_rect(0.0, h - 100.0, w, 100.0, blue)?;
    if let Some(logo) = &ctx.assets.logo {
        canvas.draw_image(logo.image(), w - 150.0, h - 90.0, 120.0, 80.0)?;
    }
    canvas.draw_text(
        "CORPORATE TRAINING CERTIFICATION",
        50.0,
        h - 60.0,
        Align::Left,
        &TextStyle::helvetica(24.0).bold().color(Color::white()),
    )?;
    canvas.draw_text(
        &format!("CERT-{}", ctx.payload.id),
        w - 50.0,
        h - 70.0,
        Align::Right,
        &TextStyle::helvetica(10.0).color(Color::white()),
    )?;

    canvas.draw_text(
        "This is to certify that",
        cx,
        h - 180.0,
        Align::Center,
        &TextStyle::helvetica(16.0).color(black),
    )?;
    canvas.draw_text(
        &ctx.name(),
        cx,
        h - 230.0,
        Align::Center,
        &TextStyle::helvetica(24.0).bold().color(blue),
    )?;
    body_paragraph(
        canvas,
        "has successfully completed the corporate training program:",
        h - 280.0,
        &TextStyle::helvetica(16.0).color(black),
        20.0,
    )?;
    canvas.draw_text(
        ctx.record.course(),
        cx,
        h - 320.0,
        Align::Center,
        &TextStyle::helvetica(20.0).bold().color(black),
    )?;
    if let Some(description) = ctx.record.description() {
        body_paragraph(
            canvas,
            description,
            h - 360.0,
            &TextStyle::helvetica(14.0).color(black),
            18.0,
        )?;
    }

    canvas.draw_text(
        &format!("Date of Completion: {}", ctx.date()),
        cx,
        h - 420.0,
        Align::Center,
        &TextStyle::helvetica(14.0).color(black),
    )?;

    let third = (w / 3.0).floor();
    let two_thirds = (2.0 * w / 3.0).floor();
    let rule = Stroke::new(blue, 1.0);
    if let Some(signature) = &ctx.assets.signature {
        canvas.draw_image(signature.image(), third, h - 475.0, 200.0, 50.0)?;
    }
    canvas.line(third, h - 480.0, third + 200.0, h - 480.0, rule)?;
    canvas.line(two_thirds - 200.0, h - 480.0, two_thirds, h - 480.0, rule)?;

    let caption = TextStyle::helvetica(12.0).color(black);
    canvas.draw_text("Training Manager", third + 100.0, h - 500.0, Align::Center, &caption)?;
    canvas.draw_text("HR Director", two_thirds - 100.0, h - 500.0, Align::Center, &caption)?;

    place_qr(canvas, ctx, w - 120.0, 50.0)?;

    let footer = TextStyle::helvetica(10.0).color(Color::hex(0x666666));
    canvas.draw_text(
        "This certificate verifies completion of required training hours",
        cx,
        50.0,
        Align::Center,
        &footer,
    )?;
    canvas.draw_text(
        "and demonstration of competency in the subject matter.",
        cx,
        30.0,
        Align::Center,
        &footer,
    )?;
    Ok(())
}
