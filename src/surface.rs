// Copyright (c) 2026 the velarain authors

use std::io;

use crate::palette::Rgba;

pub const SURFACE_ID: &str = "velarain-surface";

// Freshly minted whenever a host replaces its surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceId(pub u64);

// Drawing target addressed in pixels, top-left origin. A translucent fill
// dims prior content instead of erasing it.
pub trait Surface {
    fn id(&self) -> SurfaceId;

    fn set_buffer_size(&mut self, width: u32, height: u32);

    fn fill(&mut self, color: Rgba) -> io::Result<()>;

    fn draw_glyph(&mut self, x: u32, y: u32, ch: char, color: Rgba, size: u32) -> io::Result<()>;
}

// Owns the viewport (in pixels) and the mounted surfaces, which may come
// and go between frames.
pub trait Host {
    fn viewport(&self) -> (u32, u32);

    fn surface(&mut self, id: &str) -> Option<&mut dyn Surface>;
}
