use clap::{Args, Parser, Subcommand};
use hound::{SampleFormat, WavSpec};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use tonewire_core::{resample, Decoder, Encoder, FecConfig, FecScheme, ModemConfig};

#[derive(Parser)]
#[command(name = "tonewire")]
#[command(about = "BFSK acoustic modem: payload bytes to audible WAV and back")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a payload file to a WAV transmission
    Encode {
        /// Input payload file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output WAV file
        #[arg(value_name = "OUTPUT.WAV")]
        output: PathBuf,

        #[command(flatten)]
        modem: ModemArgs,
    },

    /// Decode a WAV capture back into payload bytes
    Decode {
        /// Input WAV file
        #[arg(value_name = "INPUT.WAV")]
        input: PathBuf,

        /// Output payload file; when omitted the payload is printed as text
        #[arg(value_name = "OUTPUT")]
        output: Option<PathBuf>,

        #[command(flatten)]
        modem: ModemArgs,
    },
}

/// Modem parameters shared by both subcommands. Defaults match
/// `ModemConfig::default()`; encode and decode must be run with the same
/// values to understand each other.
#[derive(Args)]
struct ModemArgs {
    /// Sample rate of the generated or expected audio, Hz
    #[arg(long, default_value_t = 48_000)]
    sample_rate: u32,

    /// Transmission speed, bits per second
    #[arg(long, default_value_t = 300.0)]
    bit_rate: f32,

    /// Tone frequency for zero bits, Hz
    #[arg(long, default_value_t = 1_500.0)]
    freq0: f32,

    /// Tone frequency for one bits, Hz
    #[arg(long, default_value_t = 2_400.0)]
    freq1: f32,

    /// Peak tone amplitude, 0 to 1
    #[arg(long, default_value_t = 0.7)]
    amplitude: f32,

    /// Preamble bit pattern, a string of '1' and '0'
    #[arg(long, default_value = "10101010")]
    preamble: String,

    /// Error correction scheme: none, repetition or hamming74
    #[arg(long, default_value = "none")]
    fec: String,

    /// Copies of each bit under the repetition scheme (must be odd)
    #[arg(long, default_value_t = 3)]
    repetition_factor: usize,

    /// Block interleaving depth applied to FEC-coded frames
    #[arg(long, default_value_t = 1)]
    interleave_depth: usize,
}

impl ModemArgs {
    fn to_config(&self) -> Result<ModemConfig, Box<dyn std::error::Error>> {
        let scheme: FecScheme = self.fec.parse()?;
        Ok(ModemConfig {
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
            freq0: self.freq0,
            freq1: self.freq1,
            amplitude: self.amplitude,
            preamble: self.preamble.clone(),
            fec: FecConfig {
                scheme,
                repetition_factor: self.repetition_factor,
            },
            interleave_depth: self.interleave_depth,
        })
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            input,
            output,
            modem,
        } => encode_command(&input, &output, &modem),
        Commands::Decode {
            input,
            output,
            modem,
        } => decode_command(&input, output.as_deref(), &modem),
    }
}

fn encode_command(
    input: &Path,
    output: &Path,
    modem: &ModemArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = modem.to_config()?;
    let payload = std::fs::read(input)?;
    println!("Read {} bytes from {}", payload.len(), input.display());

    let encoder = Encoder::new(config)?;
    let out = encoder.encode(&payload);
    println!(
        "Encoded {} bits ({} after FEC) into {} audio samples",
        out.metadata.bit_count,
        out.metadata.fec.encoded_bits,
        out.waveform.len()
    );

    // Mono 16-bit PCM at the configured rate.
    let spec = WavSpec {
        channels: 1,
        sample_rate: encoder.config().sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let file = File::create(output)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for sample in &out.waveform {
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;

    println!("Wrote {}", output.display());
    Ok(())
}

fn decode_command(
    input: &Path,
    output: Option<&Path>,
    modem: &ModemArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = Decoder::new(modem.to_config()?)?;

    let file = File::open(input)?;
    let mut reader = hound::WavReader::new(file)?;
    let spec = reader.spec();
    println!(
        "Read WAV: {} Hz, {} channels, {} bits",
        spec.sample_rate, spec.channels, spec.bits_per_sample
    );

    let samples = extract_samples(&mut reader)?;
    let samples = match spec.channels {
        1 => samples,
        2 => {
            // A truncated capture may end mid-frame; fold whole pairs only.
            let whole = samples.len() - samples.len() % 2;
            resample::stereo_to_mono(&samples[..whole])
        }
        other => return Err(format!("unsupported channel count: {other}").into()),
    };
    let samples = if spec.sample_rate != decoder.config().sample_rate {
        println!(
            "Resampling {} Hz capture to {} Hz",
            spec.sample_rate,
            decoder.config().sample_rate
        );
        resample::resample(&samples, spec.sample_rate, decoder.config().sample_rate)
    } else {
        samples
    };
    debug!("{} mono samples after conversion", samples.len());

    let decoded = decoder.decode(&samples);
    let metrics = &decoded.metrics;
    println!(
        "Sync: start={} samples_per_bit={:.2} score={:.3}",
        metrics.sync_start, metrics.samples_per_bit, metrics.sync_score
    );
    println!(
        "Bits: {} demodulated, {} payload",
        metrics.bit_count, metrics.data_bits
    );
    println!(
        "FEC: {} corrected={} uncorrectable={} truncated={}",
        metrics.fec.scheme,
        metrics.fec.stats.corrected_bits,
        metrics.fec.stats.uncorrectable_blocks,
        metrics.fec.truncated_bits
    );
    println!("Status: {}", metrics.status);

    if !metrics.status.is_ok() {
        return Err(format!("decode failed: {}", metrics.status).into());
    }

    match output {
        Some(path) => {
            std::fs::write(path, &decoded.payload)?;
            println!("Wrote {} bytes to {}", decoded.payload.len(), path.display());
        }
        None => {
            println!("Payload ({} bytes):", decoded.payload.len());
            println!("{}", String::from_utf8_lossy(&decoded.payload));
        }
    }
    Ok(())
}

/// Pulls WAV samples out as floats. 16-bit integer and 32-bit float files
/// are accepted; anything else is rejected rather than guessed at.
fn extract_samples<R: std::io::Read>(
    reader: &mut hound::WavReader<R>,
) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let spec = reader.spec();
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<Vec<f32>, _>>()?,
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()?,
        (format, bits) => {
            return Err(format!("unsupported WAV format: {bits}-bit {format:?}").into())
        }
    };
    Ok(samples)
}
