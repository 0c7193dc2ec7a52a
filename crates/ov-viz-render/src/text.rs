use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Advance width of `ch` in ems for a generic sans-serif face.
fn advance_em(ch: char) -> f64 {
    match ch {
        ' ' | '.' | ',' | ':' | ';' | '\'' | '!' | '|' | 'i' | 'j' | 'l' | 'I' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '{' | '}' | '/' | '-' => 0.36,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.86,
        '0'..='9' => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_lowercase() => 0.53,
        // Superscripts, Greek and symbols
        _ => 0.6,
    }
}

/// Estimate text width and height in points.
///
/// SVG output defers glyph layout to the viewer, so only legend and margin
/// sizing depend on this; per-character em widths are accurate to a few
/// percent for Helvetica-like faces.
pub fn measure_text(text: &str, style: &TextStyle) -> TextMetrics {
    let ems: f64 = text.chars().map(advance_em).sum();
    let bold = if style.weight == FontWeight::Bold { 1.07 } else { 1.0 };
    TextMetrics {
        width: ems * style.size * bold,
        height: 1.2 * style.size,
        ascent: 0.8 * style.size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_hello() {
        let m = measure_text("Hello", &TextStyle { size: 12.0, ..Default::default() });
        assert!(m.width > 20.0);
        assert!(m.height > 8.0);
        assert!(m.ascent > 0.0);
    }

    #[test]
    fn bold_wider_than_regular() {
        let r = measure_text("Test", &TextStyle { size: 12.0, ..Default::default() });
        let b = measure_text(
            "Test",
            &TextStyle { size: 12.0, weight: FontWeight::Bold, ..Default::default() },
        );
        assert!(b.width > r.width);
    }

    #[test]
    fn width_scales_with_size() {
        let small = measure_text("kappa", &TextStyle { size: 10.0, ..Default::default() });
        let large = measure_text("kappa", &TextStyle { size: 20.0, ..Default::default() });
        assert!((large.width - 2.0 * small.width).abs() < 1e-9);
        assert_eq!(measure_text("", &TextStyle::default()).width, 0.0);
    }
}
