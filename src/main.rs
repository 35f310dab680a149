//! structwire - inspect and compare the binary struct encodings

use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::BytesMut;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use structwire::config::{self, Config};
use structwire::protocol::BinaryProtocol;
use structwire::reflect::{decode_generic, encode_generic};
use structwire::sample::{decode_explicit, encode_explicit, SampleStruct};

/// structwire - binary struct encoding, generic vs explicit
#[derive(Parser)]
#[command(name = "structwire")]
#[command(version)]
#[command(about = "Encode, decode and compare the sample struct", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which encoder/decoder to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CodecPath {
    /// Descriptor-driven encoding
    Generic,
    /// Hand-sequenced protocol calls
    Explicit,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a sample struct
    Encode {
        /// JSON file holding the struct (default: the benchmark value)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = CodecPath::Generic)]
        path: CodecPath,

        /// Write raw bytes here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a sample struct and print it as JSON
    Decode {
        /// File holding the encoded bytes
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = CodecPath::Generic)]
        path: CodecPath,
    },

    /// Encode through both paths and check the bytes agree
    Compare {
        /// JSON file holding the struct (default: the benchmark value)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let protocol = BinaryProtocol::new(config.protocol);
    tracing::debug!(protocol = ?config.protocol, "codec configured");

    match cli.command {
        Commands::Encode {
            input,
            path,
            output,
        } => {
            let value = load_value(input.as_deref())?;
            let bytes = encode(&protocol, &value, path)?;
            tracing::info!("Encoded {} bytes via {:?} path", bytes.len(), path);

            if let Some(output) = output {
                std::fs::write(&output, &bytes)?;
                println!("Wrote {} bytes to: {}", bytes.len(), output.display());
            } else {
                println!("{}", to_hex(&bytes));
            }
        }
        Commands::Decode { file, path } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut src = &bytes[..];
            let value = match path {
                CodecPath::Generic => {
                    decode_generic(&protocol, SampleStruct::descriptor(), &mut src)?
                }
                CodecPath::Explicit => decode_explicit(&protocol, &mut src)?,
            };
            if !src.is_empty() {
                tracing::warn!("{} trailing bytes after struct", src.len());
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Compare { input } => {
            let value = load_value(input.as_deref())?;
            let generic = encode(&protocol, &value, CodecPath::Generic)?;
            let explicit = encode(&protocol, &value, CodecPath::Explicit)?;

            println!("generic:  {}", to_hex(&generic));
            println!("explicit: {}", to_hex(&explicit));
            if generic != explicit {
                anyhow::bail!("Encodings differ");
            }
            println!("Identical ({} bytes)", generic.len());
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config()?;
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_value(input: Option<&Path>) -> anyhow::Result<SampleStruct> {
    let Some(path) = input else {
        return Ok(SampleStruct::benchmark_value());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(serde_json::from_str(&contents)?)
}

fn encode(
    protocol: &BinaryProtocol,
    value: &SampleStruct,
    path: CodecPath,
) -> anyhow::Result<BytesMut> {
    let mut buf = BytesMut::with_capacity(64);
    match path {
        CodecPath::Generic => {
            encode_generic(protocol, value, SampleStruct::descriptor(), &mut buf)?
        }
        CodecPath::Explicit => encode_explicit(protocol, value, &mut buf)?,
    }
    Ok(buf)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
