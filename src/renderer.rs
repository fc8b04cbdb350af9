// Copyright (c) 2026 the velarain authors

use std::io;
use std::time::{Duration, Instant};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info};

use crate::config::RainConfig;
use crate::palette::Rgba;
use crate::surface::{Host, Surface, SurfaceId, SURFACE_ID};

// Holds the drop positions and a throttle clock, never the surface itself:
// every tick looks it up through the host afresh.
pub struct RainRenderer {
    glyphs: Vec<char>,
    glyph_px: u32,
    min_redraw: Duration,
    fill: Rgba,
    background: Rgba,
    reset_chance: f64,

    bound: Option<SurfaceId>,
    width: u32,
    height: u32,
    columns: u32,
    drops: Vec<u32>,
    last_draw: Option<Instant>,

    rng: StdRng,
}

impl RainRenderer {
    pub fn new(config: RainConfig) -> Self {
        let mut glyphs = config.glyphs;
        if glyphs.is_empty() {
            glyphs.push('0');
            glyphs.push('1');
        }

        let seed = config.seed.unwrap_or_else(rand::random);

        Self {
            glyphs,
            glyph_px: config.glyph_px.max(1),
            min_redraw: config.min_redraw,
            fill: config.fill,
            background: config.background,
            reset_chance: config.reset_chance.clamp(0.0, 1.0),
            bound: None,
            width: 0,
            height: 0,
            columns: 0,
            drops: Vec::new(),
            last_draw: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[allow(dead_code)]
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    #[allow(dead_code)]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[allow(dead_code)]
    pub fn drops(&self) -> &[u32] {
        &self.drops
    }

    pub fn min_redraw(&self) -> Duration {
        self.min_redraw
    }

    pub fn set_min_redraw(&mut self, d: Duration) {
        self.min_redraw = d;
    }

    pub fn resize(&mut self, host: &mut dyn Host) {
        if self.bound.is_none() {
            return;
        }

        let (width, height) = host.viewport();
        self.width = width;
        self.height = height;
        if let Some(surface) = host.surface(SURFACE_ID) {
            surface.set_buffer_size(width, height);
        }

        self.columns = width / self.glyph_px;
        self.drops.clear();
        self.drops.resize(self.columns as usize, 1);
    }

    fn init(&mut self, host: &mut dyn Host) {
        let Some(found) = host.surface(SURFACE_ID).map(|s| s.id()) else {
            self.bound = None;
            return;
        };

        self.bound = Some(found);
        self.resize(host);
        if self.drops.is_empty() {
            self.drops.resize(self.columns as usize, 1);
        }
        info!(
            columns = self.columns,
            width = self.width,
            height = self.height,
            "rain surface bound"
        );
    }

    pub fn tick(&mut self, now: Instant, host: &mut dyn Host) {
        if let Some(last) = self.last_draw {
            if now.saturating_duration_since(last) < self.min_redraw {
                return;
            }
        }
        self.last_draw = Some(now);

        let Some(found) = host.surface(SURFACE_ID).map(|s| s.id()) else {
            self.bound = None;
            return;
        };

        if self.bound != Some(found) {
            self.init(host);
        }
        if self.bound.is_none() {
            return;
        }

        let Some(surface) = host.surface(SURFACE_ID) else {
            return;
        };
        if let Err(e) = self.paint(surface) {
            error!(error = %e, "rain paint failed");
        }
    }

    fn paint(&mut self, surface: &mut dyn Surface) -> io::Result<()> {
        surface.fill(self.background)?;

        for i in 0..self.drops.len() {
            let ch = self.glyphs[self.rng.random_range(0..self.glyphs.len())];
            let x = (i as u32) * self.glyph_px;
            let y = self.drops[i].saturating_mul(self.glyph_px);
            surface.draw_glyph(x, y, ch, self.fill, self.glyph_px)?;

            if y > self.height && self.rng.random::<f64>() < self.reset_chance {
                self.drops[i] = 0;
            }
            self.drops[i] = self.drops[i].saturating_add(1);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::{Duration, Instant};

    use super::RainRenderer;
    use crate::config::RainConfig;
    use crate::palette::Rgba;
    use crate::surface::{Host, Surface, SurfaceId, SURFACE_ID};

    #[derive(Default)]
    struct TestSurface {
        token: u64,
        buffer: Option<(u32, u32)>,
        fills: usize,
        glyphs: Vec<(u32, u32, char)>,
        fail_io: bool,
    }

    impl TestSurface {
        fn with_token(token: u64) -> Self {
            TestSurface {
                token,
                ..Default::default()
            }
        }
    }

    impl Surface for TestSurface {
        fn id(&self) -> SurfaceId {
            SurfaceId(self.token)
        }

        fn set_buffer_size(&mut self, width: u32, height: u32) {
            self.buffer = Some((width, height));
            self.glyphs.clear();
        }

        fn fill(&mut self, _color: Rgba) -> io::Result<()> {
            if self.fail_io {
                return Err(io::Error::other("surface lost"));
            }
            self.fills += 1;
            Ok(())
        }

        fn draw_glyph(
            &mut self,
            x: u32,
            y: u32,
            ch: char,
            _color: Rgba,
            _size: u32,
        ) -> io::Result<()> {
            if self.fail_io {
                return Err(io::Error::other("surface lost"));
            }
            self.glyphs.push((x, y, ch));
            Ok(())
        }
    }

    struct TestHost {
        viewport: (u32, u32),
        mounted: Option<TestSurface>,
    }

    impl TestHost {
        fn new(width: u32, height: u32) -> Self {
            Self {
                viewport: (width, height),
                mounted: Some(TestSurface::with_token(1)),
            }
        }

        fn surface_ref(&self) -> &TestSurface {
            self.mounted.as_ref().expect("surface mounted")
        }
    }

    impl Host for TestHost {
        fn viewport(&self) -> (u32, u32) {
            self.viewport
        }

        fn surface(&mut self, id: &str) -> Option<&mut dyn Surface> {
            if id != SURFACE_ID {
                return None;
            }
            self.mounted.as_mut().map(|s| s as &mut dyn Surface)
        }
    }

    fn config(seed: u64) -> RainConfig {
        RainConfig {
            seed: Some(seed),
            ..RainConfig::default()
        }
    }

    const STEP: Duration = Duration::from_millis(75);

    #[test]
    fn first_tick_binds_sizes_and_paints_every_column() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        r.tick(t0, &mut host);

        assert!(r.is_bound());
        assert_eq!(r.columns(), 10);
        assert_eq!(host.surface_ref().buffer, Some((140, 100)));
        assert_eq!(host.surface_ref().fills, 1);
        assert_eq!(host.surface_ref().glyphs.len(), 10);
        for (i, &(x, y, _)) in host.surface_ref().glyphs.iter().enumerate() {
            assert_eq!(x, i as u32 * 14);
            assert_eq!(y, 14);
        }
        // Every column advanced one row.
        assert_eq!(r.drops(), &[2u32; 10][..]);
    }

    #[test]
    fn ticks_inside_the_redraw_window_are_dropped() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        r.tick(t0, &mut host);
        let drops_after_first = r.drops().to_vec();

        r.tick(t0 + Duration::from_millis(74), &mut host);
        assert_eq!(host.surface_ref().fills, 1);
        assert_eq!(r.drops(), &drops_after_first[..]);

        r.tick(t0 + STEP, &mut host);
        assert_eq!(host.surface_ref().fills, 2);
    }

    #[test]
    fn redraw_window_can_be_retuned() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        r.set_min_redraw(Duration::from_millis(10));
        r.tick(t0, &mut host);
        r.tick(t0 + Duration::from_millis(10), &mut host);
        assert_eq!(host.surface_ref().fills, 2);
    }

    #[test]
    fn columns_follow_viewport_width() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        r.tick(Instant::now(), &mut host);

        for (width, want) in [(139u32, 9u32), (14, 1), (13, 0), (280, 20)] {
            host.viewport = (width, 100);
            r.resize(&mut host);
            assert_eq!(r.columns(), want);
            assert_eq!(r.drops(), vec![1u32; want as usize].as_slice());
            assert_eq!(host.surface_ref().buffer, Some((width, 100)));
        }
    }

    #[test]
    fn resize_before_binding_is_a_noop() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);

        r.resize(&mut host);

        assert_eq!(r.columns(), 0);
        assert!(r.drops().is_empty());
        assert_eq!(host.surface_ref().buffer, None);
    }

    #[test]
    fn resize_restarts_columns_even_at_the_same_size() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        for k in 0..3u32 {
            r.tick(t0 + STEP * k, &mut host);
        }
        assert_eq!(r.drops(), &[4u32; 10][..]);

        r.resize(&mut host);
        assert_eq!(r.drops(), &[1u32; 10][..]);
        assert_eq!(host.surface_ref().buffer, Some((140, 100)));

        r.resize(&mut host);
        assert_eq!(r.columns(), 10);
        assert_eq!(r.drops(), &[1u32; 10][..]);
    }

    #[test]
    fn replaced_surface_is_adopted_and_relaid_out() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        r.tick(t0, &mut host);
        assert_eq!(r.columns(), 10);

        host.mounted = Some(TestSurface::with_token(2));
        host.viewport = (280, 100);
        r.tick(t0 + STEP, &mut host);

        assert!(r.is_bound());
        assert_eq!(r.columns(), 20);
        assert_eq!(host.surface_ref().buffer, Some((280, 100)));
        assert_eq!(host.surface_ref().fills, 1);
        assert_eq!(r.drops(), &[2u32; 20][..]);
    }

    #[test]
    fn missing_surface_parks_the_renderer_until_it_returns() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        r.tick(t0, &mut host);
        let drops_before = r.drops().to_vec();

        host.mounted = None;
        r.tick(t0 + STEP, &mut host);
        r.tick(t0 + STEP * 2, &mut host);
        assert!(!r.is_bound());
        assert_eq!(r.drops(), &drops_before[..]);

        host.mounted = Some(TestSurface::with_token(3));
        r.tick(t0 + STEP * 3, &mut host);
        assert!(r.is_bound());
        assert_eq!(r.drops(), &[2u32; 10][..]);
        assert_eq!(host.surface_ref().fills, 1);
    }

    #[test]
    fn drops_restart_after_leaving_the_viewport() {
        // One column, forced restarts: the drop must step 1,2,3,4 and only
        // once strictly below the bottom edge snap back to the top.
        let mut r = RainRenderer::new(RainConfig {
            glyph_px: 10,
            reset_chance: 1.0,
            seed: Some(7),
            ..RainConfig::default()
        });
        let mut host = TestHost::new(10, 30);
        let t0 = Instant::now();

        let mut seen = Vec::new();
        for k in 0..4u32 {
            r.tick(t0 + STEP * k, &mut host);
            seen.push(r.drops()[0]);
        }
        assert_eq!(seen, vec![2, 3, 4, 1]);
    }

    #[test]
    fn drops_never_restart_when_chance_is_zero() {
        let mut r = RainRenderer::new(RainConfig {
            glyph_px: 10,
            reset_chance: 0.0,
            seed: Some(7),
            ..RainConfig::default()
        });
        let mut host = TestHost::new(10, 30);
        let t0 = Instant::now();

        for k in 0..50u32 {
            r.tick(t0 + STEP * k, &mut host);
        }
        assert_eq!(r.drops()[0], 51);
    }

    #[test]
    fn restarts_eventually_happen_at_the_default_chance() {
        let mut r = RainRenderer::new(RainConfig {
            glyph_px: 10,
            seed: Some(7),
            ..RainConfig::default()
        });
        let mut host = TestHost::new(10, 30);
        let t0 = Instant::now();

        let mut wrapped = false;
        let mut prev = 1u32;
        for k in 0..2000u32 {
            r.tick(t0 + STEP * k, &mut host);
            let cur = r.drops()[0];
            if cur < prev {
                wrapped = true;
                break;
            }
            prev = cur;
        }
        assert!(wrapped);
    }

    #[test]
    fn paint_failures_are_swallowed() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(140, 100);
        let t0 = Instant::now();

        host.mounted.as_mut().unwrap().fail_io = true;
        r.tick(t0, &mut host);
        assert_eq!(r.drops(), &[1u32; 10][..]);

        host.mounted.as_mut().unwrap().fail_io = false;
        r.tick(t0 + STEP, &mut host);
        assert_eq!(r.drops(), &[2u32; 10][..]);
        assert_eq!(host.surface_ref().fills, 1);
    }

    #[test]
    fn painted_glyphs_come_from_the_configured_set() {
        let mut r = RainRenderer::new(RainConfig {
            glyphs: vec!['V'],
            seed: Some(7),
            ..RainConfig::default()
        });
        let mut host = TestHost::new(140, 100);

        r.tick(Instant::now(), &mut host);

        assert!(!host.surface_ref().glyphs.is_empty());
        assert!(host.surface_ref().glyphs.iter().all(|&(_, _, ch)| ch == 'V'));
    }

    #[test]
    fn zero_area_viewport_is_harmless() {
        let mut r = RainRenderer::new(config(7));
        let mut host = TestHost::new(0, 0);

        r.tick(Instant::now(), &mut host);

        assert!(r.is_bound());
        assert_eq!(r.columns(), 0);
        assert!(r.drops().is_empty());
        assert_eq!(host.surface_ref().fills, 1);
        assert!(host.surface_ref().glyphs.is_empty());
    }
}
