mod audio;
mod config;
mod g711;
mod logging;
mod rtp;

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use toneline_dtmf::{DigitLog, DtmfDetector, ProcessOptions, DEFAULT_SAMPLE_RATE};
use toneline_tone::DtmfDialer;
use tracing::{debug, info};

use audio::SampleFormat;
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "toneline", about = "DTMF digit detection for raw telephony audio")]
struct Args {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect DTMF digits in an audio or RTP packet file.
    Detect {
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = SampleFormat::S16le)]
        format: SampleFormat,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
        /// Use the relaxed twist limits.
        #[arg(long)]
        relax: bool,
        /// Samples handed to the detector per call. RTP input is fed one
        /// packet per call instead.
        #[arg(long, default_value_t = 160)]
        chunk: usize,
    },
    /// Write DTMF audio for a digit string.
    Generate {
        digits: String,
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = SampleFormat::S16le)]
        format: SampleFormat,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
        #[arg(long, default_value_t = 100.0)]
        tone_ms: f32,
        #[arg(long, default_value_t = 100.0)]
        gap_ms: f32,
        /// Peak amplitude of each tone.
        #[arg(long, default_value_t = 8000.0)]
        level: f32,
        /// Row tone level above the column tone, in dB.
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        twist_db: f32,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = AppConfig::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    logging::setup_logging(&config.logging)?;

    match args.command {
        Command::Detect {
            input,
            format,
            sample_rate,
            relax,
            chunk,
        } => {
            let log = detect(&config, &input, format, sample_rate, relax, chunk)?;
            report(&log, sample_rate, &mut std::io::stdout().lock())?;
            Ok(())
        }
        Command::Generate {
            digits,
            output,
            format,
            sample_rate,
            tone_ms,
            gap_ms,
            level,
            twist_db,
        } => {
            let dialer =
                DtmfDialer::new(sample_rate as f32, tone_ms, gap_ms, level).with_twist_db(twist_db);
            let samples = dialer.dial(&digits)?;
            audio::write_samples(&output, &samples, format)?;
            info!(
                digits = %digits,
                samples = samples.len(),
                path = %output.display(),
                "audio written"
            );
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn detect(
    config: &AppConfig,
    input: &Path,
    format: SampleFormat,
    sample_rate: u32,
    relax: bool,
    chunk: usize,
) -> anyhow::Result<DigitLog> {
    let frames = audio::read_frames(input, format, chunk)?;
    let mut detector = DtmfDetector::new(sample_rate, config.detector.clone())?;
    info!(
        path = %input.display(),
        frames = frames.len(),
        sample_rate,
        "detecting"
    );

    let opts = ProcessOptions {
        relax,
        ..ProcessOptions::default()
    };
    let mut last = None;
    for frame in &frames {
        let current = detector.process(frame, opts);
        if current != last {
            debug!(
                digit = ?current,
                sample = detector.samples_processed(),
                "debounced state changed"
            );
            last = current;
        }
    }

    Ok(detector.into_sink())
}

fn report<W: Write>(log: &DigitLog, sample_rate: u32, out: &mut W) -> std::io::Result<()> {
    for entry in log.entries() {
        let ms = entry.duration as f64 * 1000.0 / sample_rate as f64;
        writeln!(out, "{}\t{:.1} ms", entry.digit, ms)?;
    }
    writeln!(out, "digits: {}", log.digits())?;
    writeln!(out, "detected: {}, lost: {}", log.detected(), log.lost())
}
