use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use qrgen::encoder::mask::candidate_penalties;
use qrgen::render::{self, Color, RenderOptions};
use qrgen::{Charset, ECLevel, EncodeOptions, QRCode, encode_with, reader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrgen", version, about = "QR code generator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SymbolArgs {
    /// Text to encode
    #[arg(long)]
    text: String,
    /// Error correction level (L, M, Q, H)
    #[arg(long, default_value = "M")]
    ec: ECLevel,
    /// Force a version (1-40) instead of the smallest that fits
    #[arg(long)]
    version: Option<u8>,
    /// Force a mask pattern (0-7)
    #[arg(long)]
    mask: Option<u8>,
    /// Encode the text as ISO 8859-1 instead of UTF-8
    #[arg(long)]
    latin1: bool,
    /// Prefix an ECI designator naming the character set
    #[arg(long)]
    eci: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Encode text and write a PNG, a data URL or terminal output
    Encode {
        #[command(flatten)]
        symbol: SymbolArgs,
        #[arg(long, default_value_t = 256)]
        width: u32,
        #[arg(long, default_value_t = 256)]
        height: u32,
        #[arg(long, default_value = "#000000")]
        dark: Color,
        #[arg(long, default_value = "#ffffff")]
        light: Color,
        /// Light border width in modules
        #[arg(long, default_value_t = 0)]
        quiet_zone: u32,
        /// Output file (derived from the text when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print a data:image/png;base64 URL instead of writing a file
        #[arg(long)]
        data_url: bool,
        /// Print the symbol to the terminal instead of writing a file
        #[arg(long)]
        ascii: bool,
    },
    /// Print version, chosen mask and all eight mask penalties
    Inspect {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
    /// Encode, read the symbol back and compare the payload
    Verify {
        #[command(flatten)]
        symbol: SymbolArgs,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Encode {
            symbol,
            width,
            height,
            dark,
            light,
            quiet_zone,
            out,
            data_url,
            ascii,
        } => {
            let code = build(&symbol)?;
            let options = RenderOptions {
                width,
                height,
                dark,
                light,
                quiet_zone,
            };
            if ascii {
                print!("{}", render::to_text(&code, quiet_zone as usize)?);
            } else if data_url {
                println!("{}", render::to_data_url(&code, &options)?);
            } else {
                let path = out.unwrap_or_else(|| PathBuf::from(render::file_name_for(&symbol.text)));
                let png = render::to_png(&code, &options)?;
                std::fs::write(&path, png)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!(
                    "Wrote {} (version {}, {}, mask {})",
                    path.display(),
                    code.version,
                    code.error_correction,
                    code.mask_index()
                );
            }
        }
        Command::Inspect { symbol } => {
            let code = build(&symbol)?;
            println!("Version: {} ({}x{} modules)", code.version, code.size(), code.size());
            println!("Error correction: {}", code.error_correction);
            println!("Mask: {}", code.mask_index());
            for (i, penalty) in candidate_penalties(&code).iter().enumerate() {
                let marker = if i as u8 == code.mask_index() { " *" } else { "" };
                println!("  mask {i}: {penalty}{marker}");
            }
        }
        Command::Verify { symbol } => {
            let code = build(&symbol)?;
            let decoded = reader::read_code(&code).context("reading the symbol back")?;
            let expected = payload_bytes(&symbol)?;
            if decoded.data != expected {
                bail!(
                    "payload mismatch: encoded {} bytes, read {} bytes",
                    expected.len(),
                    decoded.data.len()
                );
            }
            println!(
                "OK: version {}, {}, mask {}, {} bytes",
                decoded.version,
                decoded.error_correction,
                decoded.mask_pattern.index(),
                decoded.data.len()
            );
        }
    }
    Ok(())
}

fn payload_bytes(symbol: &SymbolArgs) -> anyhow::Result<Vec<u8>> {
    if !symbol.latin1 {
        return Ok(symbol.text.as_bytes().to_vec());
    }
    symbol
        .text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .context("text contains characters outside ISO 8859-1")
}

fn build(symbol: &SymbolArgs) -> anyhow::Result<QRCode> {
    let data = payload_bytes(symbol)?;
    let options = EncodeOptions {
        ec_level: symbol.ec,
        version: symbol.version,
        mask: symbol.mask,
        charset: if symbol.latin1 {
            Charset::Latin1
        } else {
            Charset::Utf8
        },
        eci: symbol.eci,
    };
    Ok(encode_with(&data, &options)?)
}
