use std::{
    convert::Infallible,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use embedded_graphics_simulator::{OutputSettings, OutputSettingsBuilder, SimulatorDisplay};
#[cfg(feature = "window")]
use embedded_graphics_simulator::{SimulatorEvent, Window};
use micro_viz::FramePresenter;

/// Keeps presentation in step with real time when the source can outrun it.
struct Pacer {
    period: Duration,
    next: Instant,
}

impl Pacer {
    fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            // Fell behind; restart the schedule from now.
            self.next = now + self.period;
        }
    }
}

/// Presents frames on a simulated LED panel, optionally shown in a window.
/// The panel is blanked when the presenter is dropped.
pub struct Presenter {
    display: SimulatorDisplay<Rgb888>,
    output: OutputSettings,
    pacer: Option<Pacer>,
    #[cfg(feature = "window")]
    window: Option<Window>,
    stop: Arc<AtomicBool>,
}

impl Presenter {
    pub fn new(size: Size, scale: u32, stop: Arc<AtomicBool>) -> Self {
        let output = OutputSettingsBuilder::new()
            .scale(scale.max(1))
            .pixel_spacing(1)
            .build();
        log::info!(
            "panel {}x{} pixels, simulator scale {}",
            size.width,
            size.height,
            scale
        );
        Self {
            display: SimulatorDisplay::new(size),
            output,
            pacer: None,
            #[cfg(feature = "window")]
            window: None,
            stop,
        }
    }

    /// Waits out the rest of `period` after each frame.
    pub fn with_pacing(mut self, period: Duration) -> Self {
        self.pacer = Some(Pacer::new(period));
        self
    }

    pub fn with_window(self, title: &str) -> Result<Self> {
        #[cfg(feature = "window")]
        {
            let mut this = self;
            this.window = Some(Window::new(title, &this.output));
            Ok(this)
        }
        #[cfg(not(feature = "window"))]
        {
            let _ = title;
            anyhow::bail!("the desktop window needs the `window` feature")
        }
    }

    /// Shows the canvas in the window, if any, and turns a close request into a
    /// stop request.
    #[cfg(feature = "window")]
    fn update_window(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.update(&self.display);
            if window.events().any(|event| matches!(event, SimulatorEvent::Quit)) {
                log::info!("window closed");
                self.stop.store(true, Ordering::SeqCst);
            }
        }
    }

    #[cfg(not(feature = "window"))]
    fn update_window(&mut self) {}

    /// Clears the panel and pushes the blank frame to the window, if any.
    fn blank(&mut self) {
        let _ = self.display.clear(Rgb888::BLACK);
        self.update_window();
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        self.display
            .to_rgb_output_image(&self.output)
            .save_png(path)
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;
        log::info!("saved snapshot {}", path.display());
        Ok(())
    }
}

impl FramePresenter for Presenter {
    type Canvas = SimulatorDisplay<Rgb888>;
    type Error = Infallible;

    fn canvas(&mut self) -> &mut SimulatorDisplay<Rgb888> {
        &mut self.display
    }

    fn present(&mut self) -> Result<(), Infallible> {
        self.update_window();
        if let Some(pacer) = self.pacer.as_mut() {
            pacer.wait();
        }
        Ok(())
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        if self.stop.load(Ordering::SeqCst) {
            log::debug!("blanking panel after stop request");
        }
        self.blank();
    }
}
