//! Per-tick render step
//!
//! Ties the pipeline together. Every tick:
//! 1. draw the scene into the canvas
//! 2. binarize the canvas
//! 3. either save it as a PNG preview, or hand it to the display and
//!    flush if it changed
//!
//! Which output is used is decided once at startup.

use anyhow::{Context, Result};
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Instant;

use crate::display::{Display, DisplayError};
use crate::frame::{self, Canvas};
use crate::scene::{GameState, Scene};
use crate::ticker::TickContext;

/// Where finished frames go
pub enum Output {
    /// A physical board or the simulator
    Panel(Display),
    /// PNG preview overwritten every tick; no display is touched
    Preview(PathBuf),
}

/// Counters reported when the ticker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub flushes: u64,
    pub failed_flushes: u64,
}

/// The render callback's state
pub struct RenderStep {
    canvas: Canvas,
    scene: Scene,
    output: Output,
    stats: RenderStats,
}

impl RenderStep {
    /// Create a render step with a canvas of the given size
    ///
    /// For [`Output::Panel`] the size must match the display.
    pub fn new(width: u32, height: u32, scene: Scene, output: Output) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            scene,
            output,
            stats: RenderStats::default(),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Run one tick of the pipeline
    ///
    /// Transport write failures are logged and retried on the next tick.
    /// Anything returned as an error is fatal.
    pub fn tick(&mut self, state: GameState, context: TickContext) -> Result<()> {
        let started = Instant::now();

        self.canvas.clear_transparent();
        self.scene
            .draw(&mut self.canvas, state)
            .unwrap_or_else(|never: Infallible| match never {});
        self.canvas.binarize();
        self.stats.frames += 1;

        match &mut self.output {
            Output::Preview(path) => frame::save_png(&self.canvas, path)?,
            Output::Panel(display) => {
                display
                    .set_image_data(self.canvas.image())
                    .context("Rendered frame does not fit the display")?;

                if display.is_dirty() {
                    match display.flush() {
                        Ok(()) => self.stats.flushes += 1,
                        Err(DisplayError::Transport(e)) => {
                            self.stats.failed_flushes += 1;
                            log::warn!("Flush failed, retrying next tick: {}", e);
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        log::debug!(
            "Frame {}: elapsed {:.0}ms, delta {:.2}ms, rendered in {:?}",
            self.stats.frames,
            context.elapsed_ms(),
            context.delta_ms(),
            started.elapsed()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{Layout, PanelGeometry, PanelWidth};
    use crate::transport::{Transport, TransportError};
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeTransport {
        writes: Arc<Mutex<Vec<Vec<u8>>>>,
        fail: Arc<AtomicBool>,
    }

    impl Transport for FakeTransport {
        fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(TransportError::Write {
                    target: "fake".to_string(),
                    source: io::Error::new(io::ErrorKind::TimedOut, "stalled"),
                });
            }
            self.writes.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }

        fn describe(&self) -> String {
            "fake".to_string()
        }
    }

    fn panel_step() -> (RenderStep, FakeTransport) {
        let transport = FakeTransport::default();
        let geometry = PanelGeometry::new(Layout::default(), PanelWidth::W28, true);
        let (width, height) = (geometry.width(), geometry.height());
        let display = Display::new(geometry, Box::new(transport.clone()));
        let step = RenderStep::new(width, height, Scene::default(), Output::Panel(display));
        (step, transport)
    }

    #[test]
    fn test_unchanged_scene_is_sent_once() {
        let (mut step, transport) = panel_step();
        let state = GameState::default();

        for _ in 0..4 {
            step.tick(state, TickContext::default()).unwrap();
        }

        assert_eq!(transport.writes.lock().unwrap().len(), 1);
        assert_eq!(
            step.stats(),
            RenderStats {
                frames: 4,
                flushes: 1,
                failed_flushes: 0
            }
        );
    }

    #[test]
    fn test_state_change_triggers_flush() {
        let (mut step, transport) = panel_step();

        step.tick(GameState::new(11, 11), TickContext::default()).unwrap();
        step.tick(GameState::new(11, 11), TickContext::default()).unwrap();
        step.tick(GameState::new(10, 11), TickContext::default()).unwrap();

        assert_eq!(transport.writes.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_flush_is_retried_next_tick() {
        let (mut step, transport) = panel_step();
        transport.fail.store(true, Ordering::SeqCst);

        step.tick(GameState::default(), TickContext::default()).unwrap();
        assert_eq!(step.stats().failed_flushes, 1);

        transport.fail.store(false, Ordering::SeqCst);
        step.tick(GameState::default(), TickContext::default()).unwrap();

        assert_eq!(step.stats().flushes, 1);
        assert_eq!(transport.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_canvas_is_binarized_before_output() {
        let (mut step, _) = panel_step();
        step.tick(GameState::default(), TickContext::default()).unwrap();

        assert!(step
            .canvas
            .image()
            .pixels()
            .all(|p| (p[0] == 0 || p[0] == 255) && p[3] == 255));
    }

    #[test]
    fn test_size_mismatch_is_fatal() {
        let transport = FakeTransport::default();
        let geometry = PanelGeometry::new(Layout::default(), PanelWidth::W28, false);
        let display = Display::new(geometry, Box::new(transport));
        let mut step = RenderStep::new(28, 7, Scene::default(), Output::Panel(display));

        assert!(step.tick(GameState::default(), TickContext::default()).is_err());
    }

    #[test]
    fn test_preview_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let mut step = RenderStep::new(84, 28, Scene::default(), Output::Preview(path.clone()));

        step.tick(GameState::default(), TickContext::default()).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (84, 28));
        assert_eq!(written.as_raw(), step.canvas.image().as_raw());
    }
}
