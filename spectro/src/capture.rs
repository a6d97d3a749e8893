use std::{
    fs::File,
    io::{self, BufReader, ErrorKind, Read},
    path::Path,
};

use anyhow::{Context, Result};
use micro_viz::{BlockStatus, SampleSource};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("end of input stream")]
    EndOfStream,
    #[error("failed to read PCM input")]
    Io(#[from] io::Error),
    #[error("failed to decode WAV input")]
    Wav(#[from] hound::Error),
    #[error("audio device stopped delivering samples")]
    Disconnected,
}

pub type BoxedSource = Box<dyn SampleSource<Error = CaptureError>>;

/// Raw signed 16-bit little-endian mono PCM from any reader.
///
/// A final partial block is zero-padded; the read after it reports
/// [`CaptureError::EndOfStream`].
pub struct PcmSource<R> {
    reader: R,
    bytes: Vec<u8>,
    finished: bool,
}

impl<R: Read> PcmSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            bytes: Vec::new(),
            finished: false,
        }
    }

    /// Fills `self.bytes` as far as the reader allows and returns the byte count.
    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.bytes.len() {
            match self.reader.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> SampleSource for PcmSource<R> {
    type Error = CaptureError;

    fn read_block(&mut self, block: &mut [i16]) -> Result<BlockStatus, CaptureError> {
        if self.finished {
            return Err(CaptureError::EndOfStream);
        }
        self.bytes.resize(block.len() * 2, 0);
        let filled = self.fill()?;
        if filled == 0 {
            self.finished = true;
            return Err(CaptureError::EndOfStream);
        }
        if filled < self.bytes.len() {
            log::debug!("short read of {} bytes, padding final block", filled);
            self.bytes[filled..].fill(0);
            self.finished = true;
        }

        for (sample, pair) in block.iter_mut().zip(self.bytes.chunks_exact(2)) {
            *sample = i16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(BlockStatus::Complete)
    }
}

type SampleIter = Box<dyn Iterator<Item = Result<i16, hound::Error>>>;

/// First channel of a WAV file, converted to 16-bit.
pub struct WavSource {
    samples: SampleIter,
    sample_rate: u32,
    finished: bool,
}

impl WavSource {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open WAV file {}", path.display()))?;
        let spec = reader.spec();
        log::info!(
            "WAV input {}: {} Hz, {} channel(s), {} bit {:?}",
            path.display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            spec.sample_format
        );
        Ok(Self::from_reader(reader))
    }

    pub fn from_reader<R: Read + 'static>(reader: hound::WavReader<R>) -> Self {
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: SampleIter = match spec.sample_format {
            hound::SampleFormat::Float => Box::new(
                reader
                    .into_samples::<f32>()
                    .step_by(channels)
                    .map(|s| s.map(float_to_i16)),
            ),
            hound::SampleFormat::Int => {
                let bits = spec.bits_per_sample as u32;
                Box::new(
                    reader
                        .into_samples::<i32>()
                        .step_by(channels)
                        .map(move |s| s.map(|v| int_to_i16(v, bits))),
                )
            }
        };

        Self {
            samples,
            sample_rate: spec.sample_rate,
            finished: false,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl SampleSource for WavSource {
    type Error = CaptureError;

    fn read_block(&mut self, block: &mut [i16]) -> Result<BlockStatus, CaptureError> {
        if self.finished {
            return Err(CaptureError::EndOfStream);
        }
        let mut filled = 0;
        for slot in block.iter_mut() {
            match self.samples.next() {
                Some(sample) => {
                    *slot = sample?;
                    filled += 1;
                }
                None => break,
            }
        }
        if filled == 0 {
            self.finished = true;
            return Err(CaptureError::EndOfStream);
        }
        if filled < block.len() {
            block[filled..].fill(0);
            self.finished = true;
        }
        Ok(BlockStatus::Complete)
    }
}

fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn int_to_i16(sample: i32, bits: u32) -> i16 {
    if bits > 16 {
        (sample >> (bits - 16)) as i16
    } else {
        (sample << (16 - bits)) as i16
    }
}

/// Opens the capture collaborator selected on the command line.
pub fn open(args: &crate::cli::Args, config: &micro_viz::SpectrumConfig) -> Result<BoxedSource> {
    if args.mic {
        #[cfg(feature = "mic")]
        {
            let source = mic::MicSource::open(config.sample_rate, config.fft_size())?;
            return Ok(Box::new(source));
        }
        #[cfg(not(feature = "mic"))]
        anyhow::bail!("microphone capture needs the `mic` feature");
    }

    if args.is_wav() {
        let source = WavSource::open(Path::new(&args.input))?;
        if source.sample_rate() != config.sample_rate {
            log::warn!(
                "WAV sample rate {} Hz differs from the configured {} Hz; bins will be shifted",
                source.sample_rate(),
                config.sample_rate
            );
        }
        return Ok(Box::new(source));
    }

    if args.input == "-" {
        log::info!("reading S16LE PCM from stdin");
        return Ok(Box::new(PcmSource::new(io::stdin().lock())));
    }

    let file = File::open(&args.input)
        .with_context(|| format!("failed to open PCM input {}", args.input))?;
    log::info!("reading S16LE PCM from {}", args.input);
    Ok(Box::new(PcmSource::new(BufReader::new(file))))
}

#[cfg(feature = "mic")]
pub mod mic {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use anyhow::{anyhow, Context, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{FromSample, Sample, SizedSample, SupportedStreamConfigRange};
    use crossbeam_channel::{Receiver, Sender, TrySendError};
    use micro_viz::{BlockStatus, SampleSource};

    use super::CaptureError;

    /// Whole blocks buffered between the audio callback and the frame loop.
    const QUEUE_BLOCKS: usize = 4;

    /// Live capture from the default input device. The audio callback collects
    /// the first channel into whole blocks and hands them over a bounded channel;
    /// blocks that do not fit are dropped and reported as an overrun.
    pub struct MicSource {
        _stream: cpal::Stream,
        blocks: Receiver<Vec<i16>>,
        dropped: Arc<AtomicUsize>,
    }

    impl MicSource {
        pub fn open(sample_rate: u32, block_len: usize) -> Result<Self> {
            let host = cpal::default_host();
            let device = host
                .default_input_device()
                .ok_or_else(|| anyhow!("no input device available"))?;
            log::info!("using input device {}", device.name()?);

            let configs = device
                .supported_input_configs()
                .context("failed to query input configs")?
                .collect::<Vec<_>>();
            let supported = find_supported_config(configs, sample_rate)
                .ok_or_else(|| anyhow!("no i16 or f32 input format found"))?;
            let rate = sample_rate.clamp(
                supported.min_sample_rate().0,
                supported.max_sample_rate().0,
            );
            if rate != sample_rate {
                log::warn!("device cannot capture at {} Hz, using {} Hz", sample_rate, rate);
            }
            let supported = supported.with_sample_rate(cpal::SampleRate(rate));
            let format = supported.sample_format();
            let config: cpal::StreamConfig = supported.into();
            log::info!(
                "capturing {} channel(s) at {} Hz as {:?}",
                config.channels,
                rate,
                format
            );

            let (tx, blocks) = crossbeam_channel::bounded(QUEUE_BLOCKS);
            let dropped = Arc::new(AtomicUsize::new(0));
            let stream = match format {
                cpal::SampleFormat::I16 => {
                    build_stream::<i16>(&device, &config, block_len, tx, dropped.clone())?
                }
                cpal::SampleFormat::F32 => {
                    build_stream::<f32>(&device, &config, block_len, tx, dropped.clone())?
                }
                other => return Err(anyhow!("unsupported sample format {:?}", other)),
            };
            stream.play().context("failed to start input stream")?;

            Ok(Self {
                _stream: stream,
                blocks,
                dropped,
            })
        }
    }

    impl SampleSource for MicSource {
        type Error = CaptureError;

        fn read_block(&mut self, block: &mut [i16]) -> Result<BlockStatus, CaptureError> {
            let samples = self.blocks.recv().map_err(|_| CaptureError::Disconnected)?;
            block.copy_from_slice(&samples);
            match self.dropped.swap(0, Ordering::Relaxed) {
                0 => Ok(BlockStatus::Complete),
                dropped => Ok(BlockStatus::Overrun { dropped }),
            }
        }
    }

    fn build_stream<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        block_len: usize,
        tx: Sender<Vec<i16>>,
        dropped: Arc<AtomicUsize>,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample,
        i16: FromSample<T>,
    {
        let channels = config.channels.max(1) as usize;
        let mut pending: Vec<i16> = Vec::with_capacity(block_len);

        let stream = device.build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    pending.push(frame[0].to_sample::<i16>());
                    if pending.len() == block_len {
                        let block = std::mem::replace(&mut pending, Vec::with_capacity(block_len));
                        match tx.try_send(block) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                dropped.fetch_add(block_len, Ordering::Relaxed);
                            }
                            Err(TrySendError::Disconnected(_)) => return,
                        }
                    }
                }
            },
            |err| log::error!("input stream error: {}", err),
            None,
        )?;
        Ok(stream)
    }

    /// Prefers a mono i16 config, then any i16 or f32 one, covering `target_rate`
    /// or as close to it as possible.
    fn find_supported_config(
        configs: Vec<SupportedStreamConfigRange>,
        target_rate: u32,
    ) -> Option<SupportedStreamConfigRange> {
        configs
            .into_iter()
            .filter(|c| {
                matches!(
                    c.sample_format(),
                    cpal::SampleFormat::I16 | cpal::SampleFormat::F32
                )
            })
            .min_by_key(|c| {
                let below = c.min_sample_rate().0.saturating_sub(target_rate);
                let above = target_rate.saturating_sub(c.max_sample_rate().0);
                let format_rank = if c.sample_format() == cpal::SampleFormat::I16 { 0 } else { 1 };
                (below + above, c.channels() != 1, format_rank)
            })
    }
}
