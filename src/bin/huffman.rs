use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use huffman_codec::{CodeTable, EncodedPayload};

#[derive(Parser, Debug)]
#[command(about = "Huffman encode or decode a file", long_about = None)]
struct Args {
    /// Where the code table is written on encode and read from on decode.
    #[arg(long, default_value = "huffman_codes.mp")]
    table: PathBuf,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Compress the bytes of INPUT into OUTPUT.
    Encode { input: PathBuf, output: PathBuf },
    /// Restore the bytes of OUTPUT from the payload in INPUT.
    Decode { input: PathBuf, output: PathBuf },
}

fn encode(input: &Path, output: &Path, table_path: &Path) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let (bits, table) = huffman_codec::encode(&data)
        .with_context(|| format!("encoding {}", input.display()))?;

    let out = File::create(output).with_context(|| format!("creating {}", output.display()))?;
    EncodedPayload::new(&bits).write_to(BufWriter::new(out))?;

    let table_out = File::create(table_path)
        .with_context(|| format!("creating code table {}", table_path.display()))?;
    table.write_to(BufWriter::new(table_out))?;

    info!(
        "encoded {} bytes into {} bits using {} codes ({:.3} bits per byte)",
        data.len(),
        bits.len(),
        table.len(),
        bits.len() as f64 / data.len() as f64
    );
    Ok(())
}

fn decode(input: &Path, output: &Path, table_path: &Path) -> Result<()> {
    let table_file = File::open(table_path)
        .with_context(|| format!("opening code table {}", table_path.display()))?;
    let table = CodeTable::<u8>::read_from(BufReader::new(table_file))
        .with_context(|| format!("loading code table {}", table_path.display()))?;

    let payload = EncodedPayload::read_from(BufReader::new(File::open(input)?))
        .with_context(|| format!("reading payload {}", input.display()))?;
    let bits = payload.into_bits()?;

    let data = huffman_codec::decode(&bits, &table)
        .with_context(|| format!("decoding {}", input.display()))?;
    fs::write(output, &data).with_context(|| format!("writing {}", output.display()))?;

    info!("decoded {} bits into {} bytes", bits.len(), data.len());
    Ok(())
}

pub fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match &args.mode {
        Mode::Encode { input, output } => encode(input, output, &args.table),
        Mode::Decode { input, output } => decode(input, output, &args.table),
    }
}
