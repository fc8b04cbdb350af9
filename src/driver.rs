// Copyright (c) 2026 the velarain authors

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{error, info};

use crate::config::{MAX_INTERVAL_MS, MIN_INTERVAL_MS};
use crate::palette::{BoldMode, FadeRamp};
use crate::renderer::RainRenderer;
use crate::term::{TermHost, Terminal};

fn adjust_interval(ms: u64, faster: bool) -> u64 {
    if faster {
        (ms * 2 / 3).max(MIN_INTERVAL_MS)
    } else {
        (ms * 3 / 2).max(ms + 1).min(MAX_INTERVAL_MS)
    }
}

// Paces the renderer on a deadline loop, pumping input between frames.
pub struct Driver {
    term: Terminal,
    host: TermHost,
    renderer: RainRenderer,
    ramp: FadeRamp,
    bold_mode: BoldMode,
    target_period: Duration,
    screensaver: bool,
    duration: Option<Duration>,
}

impl Driver {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        term: Terminal,
        host: TermHost,
        renderer: RainRenderer,
        ramp: FadeRamp,
        bold_mode: BoldMode,
        target_fps: f64,
        screensaver: bool,
        duration: Option<Duration>,
    ) -> Self {
        Self {
            term,
            host,
            renderer,
            ramp,
            bold_mode,
            target_period: Duration::from_secs_f64(1.0 / target_fps),
            screensaver,
            duration,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        info!(
            interval_ms = self.renderer.min_redraw().as_millis() as u64,
            period_ms = self.target_period.as_millis() as u64,
            "rain engine started"
        );

        let start_time = Instant::now();
        let end_time = self.duration.map(|d| start_time + d);
        let mut next_frame = Instant::now();
        let mut running = true;

        while running {
            if end_time.is_some_and(|end| Instant::now() >= end) {
                break;
            }
            let mut pending_resize: Option<(u16, u16)> = None;

            loop {
                while Terminal::poll_event(Duration::from_millis(0))? {
                    match Terminal::read_event()? {
                        Event::Resize(nw, nh) => {
                            pending_resize = Some((nw, nh));
                        }
                        Event::Key(k) if k.kind == KeyEventKind::Press => {
                            if self.screensaver {
                                running = false;
                                break;
                            }

                            match (k.code, k.modifiers) {
                                (KeyCode::Esc, _) => running = false,
                                (KeyCode::Char('q'), _) => running = false,
                                (KeyCode::Char('c'), KeyModifiers::CONTROL) => running = false,
                                (KeyCode::Char(' '), _) => {
                                    // Restart from the top, trails included.
                                    self.renderer.resize(&mut self.host);
                                }
                                (KeyCode::Up, _) => {
                                    let ms = self.renderer.min_redraw().as_millis() as u64;
                                    self.renderer
                                        .set_min_redraw(Duration::from_millis(adjust_interval(
                                            ms, true,
                                        )));
                                }
                                (KeyCode::Down, _) => {
                                    let ms = self.renderer.min_redraw().as_millis() as u64;
                                    self.renderer
                                        .set_min_redraw(Duration::from_millis(adjust_interval(
                                            ms, false,
                                        )));
                                }
                                _ => {}
                            }
                        }
                        _ => {}
                    }
                }

                if !running || pending_resize.is_some() {
                    break;
                }

                let now = Instant::now();
                if now >= next_frame {
                    break;
                }

                let mut timeout = next_frame - now;
                if let Some(end) = end_time {
                    if now >= end {
                        break;
                    }
                    timeout = timeout.min(end - now);
                }
                let _ = Terminal::poll_event(timeout)?;
            }

            if !running {
                break;
            }

            if let Some((nw, nh)) = pending_resize {
                self.host.set_term_size(nw, nh);
                self.renderer.resize(&mut self.host);
            }

            // Re-arm the schedule before doing any work, the way an
            // animation callback re-requests itself first thing.
            next_frame += self.target_period;
            let now = Instant::now();
            if now > next_frame {
                next_frame = now;
            }

            self.renderer.tick(now, &mut self.host);

            let frame = self.host.frame_mut();
            if frame.is_dirty_all() || !frame.dirty_indices().is_empty() {
                if let Err(e) = self.term.draw(frame, &self.ramp, self.bold_mode) {
                    error!(error = %e, "terminal flush failed");
                }
            }
        }

        Ok(())
    }
}
