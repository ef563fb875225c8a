//! Text runs and line breaking

use crate::document::Color;
use crate::font::StandardFont;
use crate::Align;

/// Format a number for a content stream: at most four decimals, no
/// trailing zeros, never `-0`.
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{rounded}")
}

/// Shift from an anchor to the left edge of a run `text_width` wide
pub fn anchor_offset(text_width: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => -text_width / 2.0,
        Align::Right => -text_width,
    }
}

/// Operators for one text run whose baseline starts at (x, y)
///
/// # Arguments
/// * `font_resource` - Font resource name, e.g. `F1`
/// * `size` - Font size in points
/// * `color` - Fill colour
/// * `hex` - Encoded string operand, e.g. `<4869>`
pub fn text_run_operators(
    font_resource: &str,
    size: f64,
    color: Color,
    x: f64,
    y: f64,
    hex: &str,
) -> Vec<u8> {
    format!(
        "BT\n{} rg\n/{font_resource} {} Tf\n{} {} Td\n{hex} Tj\nET\n",
        color.operands(),
        fmt_num(size),
        fmt_num(x),
        fmt_num(y)
    )
    .into_bytes()
}

/// Greedy line breaking on whitespace so each line fits `max_width` points
/// when set in `font` at `font_size`
///
/// A single word wider than `max_width` gets a line of its own. Blank input
/// yields one empty line.
pub fn wrap_to_width(
    text: &str,
    font: StandardFont,
    font_size: f64,
    max_width: f64,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let widened = font.text_width_points(&line, font_size)
            + font.text_width_points(" ", font_size)
            + font.text_width_points(word, font_size);
        if widened <= max_width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_anchor_offset() {
        assert_eq!(anchor_offset(80.0, Align::Left), 0.0);
        assert_eq!(anchor_offset(80.0, Align::Center), -40.0);
        assert_eq!(anchor_offset(80.0, Align::Right), -80.0);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(420.94488), "420.9449");
        assert_eq!(fmt_num(0.5), "0.5");
    }

    #[test]
    fn test_text_run_operators() {
        let ops = text_run_operators("F2", 14.0, Color::black(), 150.0, 600.5, "<54657374>");
        assert_eq!(
            String::from_utf8(ops).unwrap(),
            "BT\n0 0 0 rg\n/F2 14 Tf\n150 600.5 Td\n<54657374> Tj\nET\n"
        );
    }

    #[test]
    fn test_wrap_to_width() {
        // "Hello" in Helvetica 10pt = 22.78pt, "Hello world" = 50.01pt
        let lines = wrap_to_width("Hello world", StandardFont::Helvetica, 10.0, 40.0);
        assert_eq!(lines, vec!["Hello", "world"]);

        let lines = wrap_to_width("Hello world", StandardFont::Helvetica, 10.0, 60.0);
        assert_eq!(lines, vec!["Hello world"]);
    }

    #[test]
    fn test_wrap_blank_and_long_words() {
        assert_eq!(wrap_to_width("   ", StandardFont::Helvetica, 10.0, 50.0), vec![""]);
        assert_eq!(
            wrap_to_width("Supercalifragilistic", StandardFont::Helvetica, 10.0, 20.0),
            vec!["Supercalifragilistic"]
        );
    }

    #[test]
    fn test_wrap_keeps_every_word() {
        let text = "has successfully completed the course of study in advanced data engineering";
        let lines = wrap_to_width(text, StandardFont::TimesRoman, 18.0, 200.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        for line in &lines[..lines.len() - 1] {
            assert!(StandardFont::TimesRoman.text_width_points(line, 18.0) <= 200.0);
        }
    }
}
