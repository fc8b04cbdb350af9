// Copyright (c) 2026 the velarain authors

use std::str::FromStr;

use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color16,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoldMode {
    Off,
    Head,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub fn over(self, below: (u8, u8, u8)) -> (u8, u8, u8) {
        let a = self.a.clamp(0.0, 1.0);
        let blend =
            |top: u8, bot: u8| -> u8 { ((top as f32) * a + (bot as f32) * (1.0 - a)).round() as u8 };
        (
            blend(self.r, below.0),
            blend(self.g, below.1),
            blend(self.b, below.2),
        )
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }
}

fn parse_channel(name: &str, part: &str) -> Result<u8, String> {
    part.trim()
        .parse::<u8>()
        .map_err(|_| format!("invalid {} channel: {} (must be 0-255)", name, part.trim()))
}

fn parse_alpha(part: &str) -> Result<f32, String> {
    let a: f32 = part
        .trim()
        .parse()
        .map_err(|_| format!("invalid alpha: {}", part.trim()))?;
    if !(0.0..=1.0).contains(&a) {
        return Err(format!("invalid alpha: {} (must be 0.0-1.0)", part.trim()));
    }
    Ok(a)
}

fn parse_hex_pair(s: &str) -> Result<u8, String> {
    u8::from_str_radix(s, 16).map_err(|_| format!("invalid hex digits: {}", s))
}

impl FromStr for Rgba {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.trim().to_ascii_lowercase();

        if let Some(body) = spec.strip_prefix("rgba(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = body.split(',').collect();
            if parts.len() != 4 {
                return Err(format!("invalid color: {} (expected rgba(R,G,B,A))", s));
            }
            return Ok(Rgba {
                r: parse_channel("red", parts[0])?,
                g: parse_channel("green", parts[1])?,
                b: parse_channel("blue", parts[2])?,
                a: parse_alpha(parts[3])?,
            });
        }

        if let Some(body) = spec.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let parts: Vec<&str> = body.split(',').collect();
            if parts.len() != 3 {
                return Err(format!("invalid color: {} (expected rgb(R,G,B))", s));
            }
            return Ok(Rgba {
                r: parse_channel("red", parts[0])?,
                g: parse_channel("green", parts[1])?,
                b: parse_channel("blue", parts[2])?,
                a: 1.0,
            });
        }

        if let Some(hex) = spec.strip_prefix('#') {
            // Pair slicing below indexes bytes; only ASCII keeps that aligned.
            if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
                return Err(format!("invalid color: {} (expected #rrggbb or #rrggbbaa)", s));
            }
            let r = parse_hex_pair(&hex[0..2])?;
            let g = parse_hex_pair(&hex[2..4])?;
            let b = parse_hex_pair(&hex[4..6])?;
            let a = if hex.len() == 8 {
                parse_hex_pair(&hex[6..8])? as f32 / 255.0
            } else {
                1.0
            };
            return Ok(Rgba { r, g, b, a });
        }

        Err(format!("invalid color: {} (expected rgba(), rgb() or #hex)", s))
    }
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = a as f32;
    let b = b as f32;
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn gradient(from: (u8, u8, u8), to: (u8, u8, u8), steps: usize) -> Vec<(u8, u8, u8)> {
    if steps <= 1 {
        return vec![from; steps];
    }
    (0..steps)
        .map(|i| {
            let t = (i as f32) / ((steps - 1) as f32);
            (
                lerp_u8(from.0, to.0, t),
                lerp_u8(from.1, to.1, t),
                lerp_u8(from.2, to.2, t),
            )
        })
        .collect()
}

fn dist2(r0: u8, g0: u8, b0: u8, r1: u8, g1: u8, b1: u8) -> i32 {
    let dr = (r0 as i32) - (r1 as i32);
    let dg = (g0 as i32) - (g1 as i32);
    let db = (b0 as i32) - (b1 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cr = CUBE_LEVELS[r6 as usize];
    let cg = CUBE_LEVELS[g6 as usize];
    let cb = CUBE_LEVELS[b6 as usize];
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);
    let cube_dist = dist2(r, g, b, cr, cg, cb);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_idx = if avg < 8 {
        16
    } else if avg > 238 {
        231
    } else {
        232 + ((avg - 8) / 10)
    };
    let (gr, gg, gb) = if gray_idx == 16 {
        (0, 0, 0)
    } else if gray_idx == 231 {
        (255, 255, 255)
    } else {
        let v = 8 + 10 * (gray_idx - 232);
        (v, v, v)
    };
    let gray_dist = dist2(r, g, b, gr, gg, gb);

    if gray_dist < cube_dist {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 16] = [
        (Color::Black, (0, 0, 0)),
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkRed, (128, 0, 0)),
        (Color::Red, (255, 0, 0)),
        (Color::DarkGreen, (0, 128, 0)),
        (Color::Green, (0, 255, 0)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::DarkMagenta, (128, 0, 128)),
        (Color::Magenta, (255, 0, 255)),
        (Color::DarkYellow, (128, 128, 0)),
        (Color::Yellow, (255, 255, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, (cr, cg, cb)) in TABLE {
        let d = dist2(r, g, b, cr, cg, cb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn quantize(mode: ColorMode, (r, g, b): (u8, u8, u8)) -> Color {
    match mode {
        ColorMode::Mono => Color::White,
        ColorMode::Color16 => rgb_to_color16(r, g, b),
        ColorMode::Color256 => Color::AnsiValue(rgb_to_ansi256(r, g, b)),
        ColorMode::TrueColor => Color::Rgb { r, g, b },
    }
}

fn fade_levels(bg_alpha: f32) -> u8 {
    if !(bg_alpha > 0.0) {
        return 64;
    }
    (1.0 / bg_alpha).round().clamp(2.0, 64.0) as u8
}

// Trail colors brightest first, level 0 composited over the background. The
// level count follows the background alpha: a 5% wash takes about 20 passes
// to swallow a glyph.
#[derive(Clone, Debug)]
pub struct FadeRamp {
    colors: Vec<Color>,
    bg: Option<Color>,
    levels: u8,
}

impl FadeRamp {
    pub fn build(fill: Rgba, background: Rgba, mode: ColorMode) -> Self {
        let levels = fade_levels(background.a);
        let head = fill.over(background.rgb());

        let colors = if mode == ColorMode::Mono {
            Vec::new()
        } else {
            gradient(head, background.rgb(), levels as usize)
                .into_iter()
                .map(|rgb| quantize(mode, rgb))
                .collect()
        };

        let bg = if mode == ColorMode::Mono {
            None
        } else {
            Some(quantize(mode, background.rgb()))
        };

        Self { colors, bg, levels }
    }

    pub fn levels(&self) -> u8 {
        self.levels
    }

    pub fn color_for(&self, level: u8) -> Option<Color> {
        self.colors.get(level as usize).copied()
    }

    pub fn background(&self) -> Option<Color> {
        self.bg
    }
}
