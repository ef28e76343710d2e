//! # Command Line Front End
//!
//! File based access to the codec, same rules as the web API:
//!
//! ```bash
//! stegano capacity cover.png
//! stegano encode cover.png secret.zip -o stego.png
//! stegano decode stego.png -o recovered      # writes recovered.zip
//! stegano sniff recovered.zip
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use stegano_web::codec::{self, media::extension_of, CodecKind};
use stegano_web::utils::logging::init_logger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print how many payload bytes a carrier can hold
    Capacity { carrier: PathBuf },

    /// Hide a file inside a carrier
    Encode {
        carrier: PathBuf,
        payload: PathBuf,
        /// Output file for the carrier with the hidden payload
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Recover the hidden file; the sniffed extension is appended to the output stem
    Decode {
        carrier: PathBuf,
        #[arg(short, long, default_value = "extracted_data")]
        output: PathBuf,
    },

    /// Guess the type of a file from its leading bytes
    Sniff { file: PathBuf },
}

fn carrier_extension(path: &Path) -> Result<String> {
    let name = path.to_string_lossy();
    if !codec::is_accepted_media(&name) {
        bail!(
            "Unsupported media file '{}', expected one of: {}",
            name,
            codec::ACCEPTED_EXTENSIONS.join(", ")
        );
    }
    Ok(extension_of(&name).unwrap_or_default())
}

fn read(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Pre-check a payload against the carrier's usable capacity.
fn ensure_fits(carrier: &Path, capacity: u64, payload_len: u64, ext: &str) -> Result<()> {
    if capacity == 0 {
        bail!("Unable to compute capacity of {}", carrier.display());
    }
    let limit = codec::payload_limit(capacity, ext);
    if payload_len > limit {
        bail!(
            "Payload too large: {} bytes, carrier holds at most {} bytes",
            payload_len,
            limit
        );
    }
    Ok(())
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Capacity { carrier } => {
            let ext = carrier_extension(&carrier)?;
            let capacity = codec::estimate_capacity(&read(&carrier)?, &ext);
            println!("{}", capacity);
        }
        Command::Encode {
            carrier,
            payload,
            output,
        } => {
            let ext = carrier_extension(&carrier)?;
            let carrier_bytes = read(&carrier)?;
            let payload_bytes = read(&payload)?;

            let capacity = codec::estimate_capacity(&carrier_bytes, &ext);
            ensure_fits(&carrier, capacity, payload_bytes.len() as u64, &ext)?;

            let stego = codec::encode(&carrier_bytes, &payload_bytes, &ext)?;
            fs::write(&output, &stego)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Encoded {} into {}", payload.display(), output.display());
            if CodecKind::select(&ext) == CodecKind::Lsb {
                println!("{} (PNG data)", output.display());
            } else {
                println!("{}", output.display());
            }
        }
        Command::Decode { carrier, output } => {
            let ext = extension_of(&carrier.to_string_lossy()).unwrap_or_default();
            let decoded = codec::decode(&read(&carrier)?, &ext)?;

            let mut name = output.into_os_string();
            name.push(decoded.extension);
            let output = PathBuf::from(name);
            fs::write(&output, &decoded.payload)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", output.display());
        }
        Command::Sniff { file } => {
            println!("{}", codec::sniff(&read(&file)?));
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level, None)?;
    run(args.command)
}
