//! Workshop Completion: portrait, pastel bands behind a white card

use super::{body_paragraph, centre_x, place_qr, Composition, QR_EDGE};
use crate::Result;
use pdf_core::{Align, Canvas, Color, Stroke, TextStyle};

const BANDS: [u32; 6] = [0xFF9AA2, 0xFFB7B2, 0xFFDAC1, 0xE2F0CB, 0xB5EAD7, 0xC7CEEA];
const INK: u32 = 0x333333;
const CORAL: u32 = 0xFF6B6B;

pub(super) fn compose(canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
    let size = canvas.size();
    let (w, h) = (size.width, size.height);
    let cx = centre_x(canvas);
    let ink = Color::hex(INK);

    let band = (h / BANDS.len() as f64).floor();
    for (i, color) in BANDS.iter().enumerate() {
        let y = band * i as f64;
        // Top band runs to the page edge
        let height = if i + 1 == BANDS.len() { h - y } else { band };
        canvas.fill_rect(0.0, y, w, height, Color::hex(*color))?;
    }
    canvas.round_rect(
        40.0,
        40.0,
        w - 80.0,
        h - 80.0,
        10.0,
        Some(Color::white()),
        Some(Stroke::new(Color::hex(0xDDDDDD), 1.0)),
    )?;

    canvas.draw_text(
        "WORKSHOP PARTICIPATION",
        cx,
        h - 100.0,
        Align::Center,
        &TextStyle::helvetica(28.0).bold().color(ink),
    )?;
    canvas.draw_text(
        "This certificate is presented to",
        cx,
        h - 160.0,
        Align::Center,
        &TextStyle::helvetica(16.0).color(ink),
    )?;
    canvas.draw_text(
        &ctx.name(),
        cx,
        h - 210.0,
        Align::Center,
        &TextStyle::helvetica(24.0).bold().color(Color::hex(CORAL)),
    )?;
    body_paragraph(
        canvas,
        "for active participation in the workshop:",
        h - 260.0,
        &TextStyle::helvetica(16.0).color(ink),
        20.0,
    )?;
    canvas.draw_text(
        ctx.record.course(),
        cx,
        h - 300.0,
        Align::Center,
        &TextStyle::helvetica(20.0).bold().color(ink),
    )?;
    if let Some(description) = ctx.record.description() {
        body_paragraph(
            canvas,
            description,
            h - 340.0,
            &TextStyle::helvetica(14.0).color(ink),
            18.0,
        )?;
    }

    canvas.draw_text(
        &format!("Completed on {}", ctx.date()),
        cx,
        h - 390.0,
        Align::Center,
        &TextStyle::helvetica(14.0).color(ink),
    )?;

    if let Some(signature) = &ctx.assets.signature {
        canvas.draw_image(signature.image(), cx - 75.0, h - 450.0, 150.0, 60.0)?;
    }
    canvas.line(
        cx - 100.0,
        h - 450.0,
        cx + 100.0,
        h - 450.0,
        Stroke::new(Color::hex(0xAAAAAA), 0.5),
    )?;
    canvas.draw_text(
        "Workshop Facilitator",
        cx,
        h - 480.0,
        Align::Center,
        &TextStyle::helvetica(12.0).color(ink),
    )?;

    // Placeholder shows through wherever the code is absent
    let qr_x = w - 100.0;
    canvas.fill_rect(qr_x, 50.0, QR_EDGE, QR_EDGE, Color::hex(0xEEEEEE))?;
    let label = TextStyle::helvetica(8.0).color(Color::hex(0x999999));
    canvas.draw_text("VERIFICATION", w - 60.0, 70.0, Align::Center, &label)?;
    canvas.draw_text("QR CODE", w - 60.0, 60.0, Align::Center, &label)?;

    place_qr(canvas, ctx, qr_x, 50.0)?;
    Ok(())
}
