// Copyright (c) 2026 the velarain authors

use std::char;

pub const DEFAULT_GLYPHS: &str = "Velar";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphSet {
    Velar,
    Ascii,
    Letters,
    Digits,
    Binary,
    Hex,
    Katakana,
    Matrix,
}

pub fn glyph_set_from_str(spec: &str, default_to_ascii: bool) -> Result<GlyphSet, String> {
    let spec = spec.trim().to_ascii_lowercase();
    match spec.as_str() {
        "auto" => Ok(if default_to_ascii {
            GlyphSet::Ascii
        } else {
            GlyphSet::Matrix
        }),
        "velar" => Ok(GlyphSet::Velar),
        "ascii" => Ok(GlyphSet::Ascii),
        "letters" | "english" => Ok(GlyphSet::Letters),
        "digits" | "dec" | "decimal" => Ok(GlyphSet::Digits),
        "bin" | "binary" | "01" => Ok(GlyphSet::Binary),
        "hex" | "hexadecimal" => Ok(GlyphSet::Hex),
        "katakana" => Ok(GlyphSet::Katakana),
        "matrix" => Ok(GlyphSet::Matrix),
        _ => Err(format!(
            "unsupported charset: {} (see --list-charsets)",
            spec
        )),
    }
}

fn push_range(out: &mut Vec<char>, start: u32, end: u32) {
    for v in start..=end {
        if let Some(ch) = char::from_u32(v) {
            out.push(ch);
        }
    }
}

pub fn build_glyphs(set: GlyphSet) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();

    match set {
        GlyphSet::Velar => out.extend(DEFAULT_GLYPHS.chars()),
        GlyphSet::Ascii => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x61, 0x7A);
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x21, 0x2F);
            push_range(&mut out, 0x3A, 0x40);
        }
        GlyphSet::Letters => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x61, 0x7A);
        }
        GlyphSet::Digits => push_range(&mut out, 0x30, 0x39),
        GlyphSet::Binary => push_range(&mut out, 0x30, 0x31),
        GlyphSet::Hex => {
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0x41, 0x46);
        }
        GlyphSet::Katakana => push_range(&mut out, 0xFF66, 0xFF9D),
        GlyphSet::Matrix => {
            push_range(&mut out, 0x41, 0x5A);
            push_range(&mut out, 0x61, 0x7A);
            push_range(&mut out, 0x30, 0x39);
            push_range(&mut out, 0xFF66, 0xFF9D);
        }
    }

    if out.is_empty() {
        out.push('0');
        out.push('1');
    }

    out
}

pub fn glyphs_from_literal(s: &str) -> Vec<char> {
    let out: Vec<char> = s.chars().collect();
    if out.is_empty() {
        return vec!['0', '1'];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_is_the_velar_signature() {
        assert_eq!(build_glyphs(GlyphSet::Velar), vec!['V', 'e', 'l', 'a', 'r']);
    }

    #[test]
    fn auto_selects_ascii_when_non_utf() {
        assert_eq!(glyph_set_from_str("auto", true).unwrap(), GlyphSet::Ascii);
        assert_eq!(glyph_set_from_str("auto", false).unwrap(), GlyphSet::Matrix);
    }

    #[test]
    fn binary_has_only_0_and_1() {
        assert_eq!(build_glyphs(GlyphSet::Binary), vec!['0', '1']);
    }

    #[test]
    fn unknown_set_is_rejected() {
        assert!(glyph_set_from_str("klingon", false).is_err());
    }

    #[test]
    fn literal_override_keeps_order_and_falls_back_when_empty() {
        assert_eq!(glyphs_from_literal("ab1"), vec!['a', 'b', '1']);
        assert_eq!(glyphs_from_literal(""), vec!['0', '1']);
    }
}
