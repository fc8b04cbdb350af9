// Copyright (c) 2026 the velarain authors

use std::io::IsTerminal;
use std::time::Duration;

use clap::Parser;

use crate::glyphs::{build_glyphs, GlyphSet};
use crate::palette::Rgba;

pub const MIN_INTERVAL_MS: u64 = 1;
pub const MAX_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_PARAMS_USAGE: &str = "DEFAULT PARAMS USAGE:\n  velarain --interval 75 --glyph-size 14 --color \"rgba(255,255,255,0.75)\" --bg \"rgba(15,23,42,0.05)\" --reset-pct 2.5 --charset velar --bold 1 --fps 60";

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

fn colorize_help(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 64);
    for chunk in text.split_inclusive('\n') {
        let (line, nl) = chunk
            .strip_suffix('\n')
            .map(|l| (l, "\n"))
            .unwrap_or((chunk, ""));

        let is_heading =
            !line.starts_with(' ') && line.ends_with(':') && line == line.to_ascii_uppercase();

        if is_heading {
            out.push_str("\x1b[1;36m");
            out.push_str(line);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  velarain") {
            out.push_str("  \x1b[1;34mvelarain\x1b[0m");
            out.push_str(rest);
            out.push_str(nl);
            continue;
        }

        if let Some(rest) = line.strip_prefix("  -") {
            out.push_str("  \x1b[33m-");
            out.push_str(rest);
            out.push_str("\x1b[0m");
            out.push_str(nl);
            continue;
        }

        out.push_str(line);
        out.push_str(nl);
    }
    out
}

pub fn default_params_usage_for_help() -> String {
    if color_enabled_stdout() {
        colorize_help(DEFAULT_PARAMS_USAGE)
    } else {
        DEFAULT_PARAMS_USAGE.to_string()
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "velarain", version, disable_version_flag = true)]
pub struct Args {
    #[arg(
        short = 'b',
        long = "bold",
        default_value_t = 1,
        help_heading = "APPEARANCE",
        help = "Bold mode (min 0 max 2): 0=off, 1=head, 2=all"
    )]
    pub bold: u8,

    #[arg(
        short = 'c',
        long = "color",
        default_value = "rgba(255,255,255,0.75)",
        value_name = "COLOR",
        help_heading = "APPEARANCE",
        help = "Glyph color: rgba(R,G,B,A), rgb(R,G,B) or #hex"
    )]
    pub color: String,

    #[arg(
        long = "bg",
        default_value = "rgba(15,23,42,0.05)",
        value_name = "COLOR",
        help_heading = "APPEARANCE",
        help = "Background wash color; its alpha sets how fast trails fade"
    )]
    pub bg: String,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Event-loop rate in frames per second (min 1 max 240); paints stay paced by --interval"
    )]
    pub fps: f64,

    #[arg(
        short = 'g',
        long = "glyph-size",
        default_value_t = 14,
        help_heading = "ANIMATION",
        help = "Glyph size in pixels; columns = viewport width / glyph size (min 1 max 256)"
    )]
    pub glyph_size: u64,

    #[arg(
        long = "interval",
        default_value_t = 75,
        value_name = "MS",
        help_heading = "ANIMATION",
        help = "Minimum milliseconds between paints (min 1 max 60000)"
    )]
    pub interval: u64,

    #[arg(
        short = 'r',
        long = "reset-pct",
        default_value_t = 2.5,
        help_heading = "ANIMATION",
        help = "Chance in percent that a column restarts after leaving the bottom (min 0 max 100)"
    )]
    pub reset_pct: f32,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on keypress)"
    )]
    pub screensaver: bool,

    #[arg(
        long = "seed",
        help_heading = "ANIMATION",
        help = "Seed the randomness for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "charset",
        default_value = "velar",
        help_heading = "CHARSET",
        help = "Glyph preset (see --list-charsets)"
    )]
    pub charset: String,

    #[arg(
        long = "chars",
        help_heading = "CHARSET",
        help = "Custom glyphs override, used verbatim"
    )]
    pub chars: Option<String>,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0,16,8/256,24/32). Default: 24-bit if supported (COLORTERM), else 8-bit (TERM=...256color)"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "check-bitcolor",
        help_heading = "HELP",
        help = "Print detected terminal color capability and exit"
    )]
    pub check_bitcolor: bool,

    #[arg(
        long = "list-charsets",
        help_heading = "HELP",
        help = "List available glyph presets and exit"
    )]
    pub list_charsets: bool,

    #[arg(
        long = "info",
        short = 'i',
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        long = "version",
        short = 'v',
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

// Resolved animation settings, independent of how the binary was invoked.
#[derive(Clone, Debug)]
pub struct RainConfig {
    pub glyphs: Vec<char>,
    pub glyph_px: u32,
    pub min_redraw: Duration,
    pub fill: Rgba,
    pub background: Rgba,
    pub reset_chance: f64,
    pub seed: Option<u64>,
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            glyphs: build_glyphs(GlyphSet::Velar),
            glyph_px: 14,
            min_redraw: Duration::from_millis(75),
            fill: Rgba {
                r: 255,
                g: 255,
                b: 255,
                a: 0.75,
            },
            background: Rgba {
                r: 15,
                g: 23,
                b: 42,
                a: 0.05,
            },
            reset_chance: 0.025,
            seed: None,
        }
    }
}

pub fn print_list_charsets() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mAVAILABLE GLYPH PRESETS:\x1b[0m");
        println!("\x1b[2mNOTE: Use only the VALUE (left side) with --charset.\x1b[0m");
    } else {
        println!("AVAILABLE GLYPH PRESETS:");
        println!("NOTE: Use only the VALUE (left side) with --charset.");
    }
    println!();
    println!("VALUE        DESCRIPTION");
    println!("auto         Auto-select (ascii when non-UTF locale, otherwise matrix)");
    println!("velar        The Velar signature letters (default)");
    println!("ascii        Letters + digits + punctuation");
    println!("letters      Letters only (alias: english)");
    println!("digits       Digits only (aliases: dec, decimal)");
    println!("binary       0 and 1 (aliases: bin, 01)");
    println!("hex          0-9 and A-F (alias: hexadecimal)");
    println!("katakana     Halfwidth katakana");
    println!("matrix       Letters + digits + katakana");
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_params() {
        let c = RainConfig::default();
        assert_eq!(c.glyph_px, 14);
        assert_eq!(c.min_redraw, Duration::from_millis(75));
        assert!((c.reset_chance - 0.025).abs() < 1e-9);
        assert_eq!(c.glyphs, vec!['V', 'e', 'l', 'a', 'r']);
        assert_eq!((c.fill.r, c.fill.g, c.fill.b), (255, 255, 255));
        assert_eq!(
            (c.background.r, c.background.g, c.background.b),
            (15, 23, 42)
        );
    }
}
