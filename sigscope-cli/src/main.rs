// A host-side companion to the sigscope library: it decodes logic captures
// saved as text dumps, and can replay them through the acquisition handshake
// against a simulated capture unit to exercise the same code path the
// firmware uses.

use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

use sigscope::acquisition::{CaptureUnit, DigitalUnit};
use sigscope::analyzer::analyze_capture;
use sigscope::capture::{CAPTURE_POINTS, CAPTURE_WORDS};
use sigscope::interface::fake::{self, store_words, Producer};
use sigscope::report::Report;
use sigscope::{
    BaudCode, CaptureBuffer, ClockSettings, DigitalSession, EncodingScheme, FrequencyCode,
    SessionConfig,
};

mod parsers;

#[derive(Debug, StructOpt)]
#[structopt(name = "sigscope", about = "Logic capture decoding tool")]
struct Opt {
    /// Log more detail. Repeat for trace output.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
    #[structopt(subcommand)]
    cmd: CliCommand,
}

#[derive(Debug, StructOpt)]
struct DecodeOpts {
    /// nrz-l, rz, nrz-i, manchester, diff-manchester or uart
    #[structopt(short, long, default_value = "nrz-l", parse(try_from_str = scheme_from_str))]
    scheme: EncodingScheme,
    /// Bit clock in Hz for the synchronous codes
    #[structopt(short, long, default_value = "50000", parse(try_from_str = frequency_from_str))]
    freq: FrequencyCode,
    /// Baud rate for UART
    #[structopt(short, long, default_value = "9600", parse(try_from_str = baud_from_str))]
    baud: BaudCode,
    /// Capture dump to read
    #[structopt(parse(from_os_str))]
    path: PathBuf,
}

#[derive(Debug, StructOpt)]
enum CliCommand {
    /// Decode each 1024-sample capture in a dump file
    Decode {
        #[structopt(flatten)]
        opts: DecodeOpts,
    },
    /// Replay a dump through an acquisition session against a simulated
    /// capture unit, decoding each frame it delivers
    Simulate {
        #[structopt(flatten)]
        opts: DecodeOpts,
        /// Status reads the simulated unit takes per capture
        #[structopt(long, default_value = "2")]
        latency: u32,
        /// Polls to spend waiting for ready to clear after an acknowledgment
        #[structopt(long, default_value = "1000")]
        spin_limit: u32,
        /// Skip the stop and re-arm after each acknowledgment
        #[structopt(long)]
        no_restart: bool,
        /// Stop after the first frame
        #[structopt(long)]
        single_shot: bool,
    },
    /// List the supported schemes and rates
    List,
}

#[derive(Debug)]
enum CliError {
    Read(PathBuf, std::io::Error),
    Parse(PathBuf, parsers::ParseError),
    Empty(PathBuf),
    Interface(fake::Error<Infallible>),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Read(path, err) => write!(f, "reading {}: {}", path.display(), err),
            CliError::Parse(path, err) => write!(f, "{}: {}", path.display(), err),
            CliError::Empty(path) => write!(f, "{}: no samples", path.display()),
            CliError::Interface(err) => write!(f, "simulated interface: {:?}", err),
        }
    }
}

impl From<fake::Error<Infallible>> for CliError {
    fn from(err: fake::Error<Infallible>) -> Self {
        CliError::Interface(err)
    }
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut logger = env_logger::Builder::new();
    logger.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    let result = match opt.cmd {
        CliCommand::Decode { opts } => command_decode(&opts),
        CliCommand::Simulate {
            opts,
            latency,
            spin_limit,
            no_restart,
            single_shot,
        } => {
            let mut config = SessionConfig::new();
            config
                .spin_limit(spin_limit)
                .restart_after_ack(!no_restart)
                .single_shot(single_shot);
            command_simulate(&opts, config, latency)
        }
        CliCommand::List => {
            command_list();
            Ok(())
        }
    };

    if let Err(err) = result {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn command_decode(opts: &DecodeOpts) -> Result<(), CliError> {
    let settings = ClockSettings::new(opts.freq, opts.baud);
    for (i, capture) in load_captures(&opts.path)?.iter().enumerate() {
        let result = analyze_capture(capture, settings, opts.scheme);
        println!("Capture {}:\n{}\n", i, Report(&result));
    }
    Ok(())
}

fn command_simulate(
    opts: &DecodeOpts,
    config: SessionConfig,
    latency: u32,
) -> Result<(), CliError> {
    let frames: Vec<[u32; CAPTURE_WORDS]> = load_captures(&opts.path)?
        .iter()
        .map(CaptureBuffer::to_words)
        .collect();
    let count = frames.len();

    let producer = Producer::new(
        DigitalUnit::CONTROL,
        DigitalUnit::STATUS,
        DigitalUnit::BUFFER,
        move |n: u32, buf: &mut [u8]| match frames.get(n as usize) {
            Some(words) => {
                store_words(buf, words);
                true
            }
            None => false,
        },
    )
    .latency(latency);
    let ei = fake::Interface::new().with_register_file(producer);

    let settings = ClockSettings::new(opts.freq, opts.baud);
    let mut session = DigitalSession::with_config(ei, config);
    session.start(settings.selection_for(opts.scheme))?;

    // The unit needs `latency` status reads per frame, plus whatever the
    // post-acknowledgment spin and re-arm take.
    let max_idle = latency as usize * 2 + 4;
    let mut delivered = 0;
    let mut idle = 0;
    while delivered < count && session.is_running() {
        match session.poll()? {
            Some(capture) => {
                let result = analyze_capture(&capture, settings, opts.scheme);
                println!("Frame {}:\n{}\n", delivered, Report(&result));
                delivered += 1;
                idle = 0;
            }
            None => {
                idle += 1;
                if idle > max_idle {
                    log::warn!("capture unit stalled after {} frames", delivered);
                    break;
                }
            }
        }
    }
    session.stop()?;

    let ei = session.take_interface();
    let producer = ei.registers();
    log::info!(
        "delivered {} of {} frames, {} acknowledged",
        delivered,
        count,
        producer.acks_observed(),
    );
    Ok(())
}

fn command_list() {
    for scheme in EncodingScheme::ALL.iter() {
        println!("{:<16} {}", scheme_arg(*scheme), scheme.name());
    }
    for code in FrequencyCode::ALL.iter() {
        println!("{:<16} {}", code.hz(), code.name());
    }
    for code in BaudCode::ALL.iter() {
        println!("{:<16} {}", code.hz(), code.name());
    }
}

/// Reads a dump and splits it into captures, padding the last one with low
/// samples.
fn load_captures(path: &Path) -> Result<Vec<CaptureBuffer>, CliError> {
    let data = std::fs::read(path).map_err(|err| CliError::Read(path.to_path_buf(), err))?;
    let samples =
        parsers::parse_samples(&data).map_err(|err| CliError::Parse(path.to_path_buf(), err))?;
    if samples.is_empty() {
        return Err(CliError::Empty(path.to_path_buf()));
    }
    let partial = samples.len() % CAPTURE_POINTS;
    if partial != 0 {
        log::warn!(
            "{}: last capture has only {} samples, padding with low",
            path.display(),
            partial
        );
    }
    log::debug!("{}: {} samples", path.display(), samples.len());
    Ok(samples
        .chunks(CAPTURE_POINTS)
        .map(CaptureBuffer::from_levels)
        .collect())
}

fn scheme_arg(scheme: EncodingScheme) -> &'static str {
    match scheme {
        EncodingScheme::NrzL => "nrz-l",
        EncodingScheme::Rz => "rz",
        EncodingScheme::NrzI => "nrz-i",
        EncodingScheme::Manchester => "manchester",
        EncodingScheme::DiffManchester => "diff-manchester",
        EncodingScheme::Uart => "uart",
    }
}

fn scheme_from_str(s: &str) -> Result<EncodingScheme, String> {
    EncodingScheme::ALL
        .iter()
        .copied()
        .find(|scheme| scheme_arg(*scheme) == s)
        .ok_or_else(|| format!("unknown scheme {:?}", s))
}

fn frequency_from_str(s: &str) -> Result<FrequencyCode, String> {
    let hz: u32 = s.parse().map_err(|_| format!("invalid frequency {:?}", s))?;
    FrequencyCode::ALL
        .iter()
        .copied()
        .find(|code| code.hz() == hz)
        .ok_or_else(|| format!("unsupported frequency {} Hz", hz))
}

fn baud_from_str(s: &str) -> Result<BaudCode, String> {
    let hz: u32 = s.parse().map_err(|_| format!("invalid baud rate {:?}", s))?;
    BaudCode::ALL
        .iter()
        .copied()
        .find(|code| code.hz() == hz)
        .ok_or_else(|| format!("unsupported baud rate {}", hz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_values() {
        for scheme in EncodingScheme::ALL.iter() {
            assert_eq!(scheme_from_str(scheme_arg(*scheme)), Ok(*scheme));
        }
        assert!(scheme_from_str("ami").is_err());
        assert_eq!(frequency_from_str("250000"), Ok(FrequencyCode::Khz250));
        assert!(frequency_from_str("30000").is_err());
        assert_eq!(baud_from_str("115200"), Ok(BaudCode::B115200));
        assert!(baud_from_str("fast").is_err());
    }
}
