mod capture;
mod cli;
mod present;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use micro_viz::{BlockStatus, FrameDriver, FrameError, SampleSource};

use capture::CaptureError;
use cli::Args;
use present::Presenter;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = args.spectrum_config();
    log::info!("spectro starting: {:?}", config);

    let renderer = args.renderer();
    let screen = renderer.screen_size(config.columns());
    let mut driver = FrameDriver::with_color_strategy(config.clone(), args.palette.strategy())
        .context("invalid spectrum configuration")?
        .with_renderer(renderer);

    let stop = Arc::new(AtomicBool::new(false));
    {
        // SIGINT, SIGTERM and SIGHUP all end the loop at the next frame boundary.
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::SeqCst))
            .context("failed to install signal handler")?;
    }

    let mut source = capture::open(&args, &config)?;

    let mut presenter = Presenter::new(screen, args.scale, stop.clone());
    if args.window {
        presenter = presenter.with_window("spectro")?;
    }
    // Live capture and stdin already block at the audio rate.
    let paced_input = !args.mic && args.input != "-";
    if paced_input && !args.unpaced {
        presenter = presenter.with_pacing(Duration::from_micros(config.block_period_us()));
    }

    let outcome = run(&mut driver, source.as_mut(), &mut presenter, &stop, args.frames);

    if let Some(path) = &args.snapshot {
        presenter.save_snapshot(path)?;
    }
    log::info!(
        "spectro stopped after {} frames ({} capture overruns)",
        driver.frames_processed(),
        driver.overruns()
    );
    outcome
}

fn run<S>(
    driver: &mut FrameDriver,
    source: &mut S,
    presenter: &mut Presenter,
    stop: &AtomicBool,
    max_frames: Option<u64>,
) -> Result<()>
where
    S: SampleSource<Error = CaptureError> + ?Sized,
{
    while !stop.load(Ordering::SeqCst) {
        if max_frames.is_some_and(|limit| driver.frames_processed() >= limit) {
            log::info!("frame limit reached");
            break;
        }
        match driver.run_frame(source, presenter) {
            Ok(BlockStatus::Complete | BlockStatus::Overrun { .. }) => {}
            Err(FrameError::Capture(CaptureError::EndOfStream)) => {
                log::info!("end of input");
                break;
            }
            Err(e) => return Err(e).context("frame loop failed"),
        }
    }
    if stop.load(Ordering::SeqCst) {
        log::info!("stop requested");
    }
    Ok(())
}
