//! Academic Diploma: landscape parchment with a dotted texture and a seal

use super::{body_paragraph, centre_x, place_qr, Composition};
use crate::Result;
use pdf_core::{Align, Canvas, Color, Stroke, TextStyle};

const PARCHMENT: u32 = 0xFDF5E6;
const TEXTURE: u32 = 0xFAEBD7;
const BROWN: u32 = 0x8B4513;

/// Dot pitch of the parchment texture in points
const TEXTURE_STEP: i64 = 3;

fn texture(canvas: &mut Canvas) -> Result<()> {
    let color = Color::hex(TEXTURE);
    let (w, h) = (canvas.width_units(), canvas.height_units());
    for i in (0..w).step_by(TEXTURE_STEP as usize) {
        for j in (0..h).step_by(TEXTURE_STEP as usize) {
            if (i + j) % (2 * TEXTURE_STEP) == 0 {
                canvas.fill_rect(i as f64, j as f64, 2.0, 2.0, color)?;
            }
        }
    }
    Ok(())
}

pub(super) fn compose(canvas: &mut Canvas, ctx: &Composition<'_>) -> Result<()> {
    let size = canvas.size();
    let (w, h) = (size.width, size.height);
    let cx = centre_x(canvas);
    let brown = Color::hex(BROWN);
    let black = Color::black();

    canvas.fill_rect(0.0, 0.0, w, h, Color::hex(PARCHMENT))?;
    texture(canvas)?;
    canvas.round_rect(
        40.0,
        40.0,
        w - 80.0,
        h - 80.0,
        15.0,
        None,
        Some(Stroke::new(brown, 8.0)),
    )?;

    canvas.circle(cx, h - 100.0, 50.0, Some(brown), None)?;
    canvas.draw_text(
        "SEAL",
        cx,
        h - 100.0,
        Align::Center,
        &TextStyle::times(16.0).bold().color(Color::hex(PARCHMENT)),
    )?;

    canvas.draw_text(
        "DIPLOMA",
        cx,
        h - 180.0,
        Align::Center,
        &TextStyle::times(36.0).bold().color(brown),
    )?;
    canvas.draw_text(
        "Scientia est potentia",
        cx,
        h - 210.0,
        Align::Center,
        &TextStyle::times(12.0).italic().color(brown),
    )?;

    canvas.draw_text(
        "This certifies that",
        cx,
        h - 270.0,
        Align::Center,
        &TextStyle::times(18.0).color(black),
    )?;
    canvas.draw_text(
        &ctx.name(),
        cx,
        h - 320.0,
        Align::Center,
        &TextStyle::times(28.0).bold().color(brown),
    )?;
    body_paragraph(
        canvas,
        "has satisfactorily completed all requirements for",
        h - 370.0,
        &TextStyle::times(18.0).color(black),
        22.0,
    )?;
    canvas.draw_text(
        ctx.record.course(),
        cx,
        h - 410.0,
        Align::Center,
        &TextStyle::times(22.0).bold().color(black),
    )?;
    if let Some(description) = ctx.record.description() {
        body_paragraph(
            canvas,
            description,
            h - 450.0,
            &TextStyle::times(16.0).color(black),
            20.0,
        )?;
    }

    canvas.draw_text(
        &format!("Given this {}", ctx.date()),
        cx,
        h - 500.0,
        Align::Center,
        &TextStyle::times(16.0).color(black),
    )?;

    let quarter = (w / 4.0).floor();
    let three_quarters = (3.0 * w / 4.0).floor();
    let rule = Stroke::new(brown, 1.0);
    if let Some(signature) = &ctx.assets.signature {
        canvas.draw_image(signature.image(), quarter, h - 545.0, 200.0, 50.0)?;
    }
    canvas.line(quarter, h - 550.0, quarter + 200.0, h - 550.0, rule)?;
    canvas.line(three_quarters - 200.0, h - 550.0, three_quarters, h - 550.0, rule)?;

    let caption = TextStyle::times(12.0).color(black);
    canvas.draw_text("Dean of Studies", quarter + 100.0, h - 570.0, Align::Center, &caption)?;
    canvas.draw_text(
        "University President",
        three_quarters - 100.0,
        h - 570.0,
        Align::Center,
        &caption,
    )?;

    place_qr(canvas, ctx, w - 120.0, 50.0)?;
    Ok(())
}
