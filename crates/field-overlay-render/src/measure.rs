use field_overlay::{FontSpec, TextMeasurer};

/// Glyph-class width estimate for hosts without real font metrics.
///
/// Tracks browser output closely enough for previews and tests. Hosts that
/// can measure real glyphs should supply their own [`TextMeasurer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure_text_px(&self, text: &str, font: &FontSpec) -> f32 {
        heuristic_measure_text(text, font)
    }
}

fn heuristic_measure_text(text: &str, font: &FontSpec) -> f32 {
    if text.is_empty() {
        return 0.0;
    }
    let family = font.family.to_ascii_lowercase();
    let proportional = !(family.contains("mono") || family.contains("fixed"));
    let em_sum: f32 = if proportional {
        text.chars().map(proportional_glyph_em_width).sum()
    } else {
        text.chars()
            .map(|ch| {
                if is_wide(ch) {
                    1.0
                } else if ch == ' ' {
                    0.52
                } else {
                    0.58
                }
            })
            .sum()
    };

    let mut family_scale = if family.contains("serif") && !family.contains("sans") {
        1.03
    } else if family.contains("sans") {
        0.99
    } else {
        1.00
    };
    if font.weight >= 700 {
        family_scale += 0.03;
    }
    em_sum * font.size_px * family_scale
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' | '\u{00A0}' => 0.32,
        '\t' => 1.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
        'f' | 't' | 'j' | 'r' => 0.34,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
        c if c.is_ascii_digit() => 0.52,
        c if c.is_ascii_uppercase() => 0.64,
        c if c.is_ascii_lowercase() => 0.52,
        c if is_wide(c) => 1.0,
        c if c.is_whitespace() => 0.32,
        c if c.is_ascii_punctuation() => 0.42,
        _ => 0.56,
    }
}

/// Hangul, kana, CJK ideographs and full-width forms occupy a full em.
fn is_wide(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{11FF}'
            | '\u{3000}'..='\u{303F}'
            | '\u{3040}'..='\u{30FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{FF01}'..='\u{FF60}'
    )
}
