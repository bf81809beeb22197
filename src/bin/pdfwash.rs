//! pdfwash - general purpose PDF syntax washer
//!
//! Rewrite a PDF with garbage collection, deduplication, xref
//! compaction, stream decompression and page subsetting.

use clap::{ArgAction, Parser};
use pdfwash::clean::{EXPAND_ALL, EXPAND_FONTS, EXPAND_IMAGES};
use pdfwash::{CleanOptions, Document, Error, clean};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Rewrite a PDF file: garbage collect, deduplicate, compact, expand
#[derive(Parser, Debug)]
#[command(name = "pdfwash", version, about)]
struct Args {
    /// Password for encrypted input
    #[arg(short = 'p', default_value = "", value_name = "password")]
    password: String,

    /// Garbage collect unused objects; -gg also compacts the xref,
    /// -ggg also merges duplicate objects
    #[arg(short = 'g', action = ArgAction::Count)]
    garbage: u8,

    /// Decompress all streams
    #[arg(short = 'd', action = ArgAction::SetTrue)]
    decompress: bool,

    /// Toggle decompression of image streams
    #[arg(short = 'i', action = ArgAction::SetTrue)]
    images: bool,

    /// Toggle decompression of font streams
    #[arg(short = 'f', action = ArgAction::SetTrue)]
    fonts: bool,

    /// ASCII hex encode binary streams
    #[arg(short = 'a', action = ArgAction::SetTrue)]
    ascii: bool,

    /// Input file
    input: PathBuf,

    /// Output file (default out.pdf), then comma separated page ranges
    rest: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pdfwash: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> pdfwash::Result<()> {
    let mut expand = 0u8;
    if args.decompress {
        expand ^= EXPAND_ALL;
    }
    if args.images {
        expand ^= EXPAND_IMAGES;
    }
    if args.fonts {
        expand ^= EXPAND_FONTS;
    }

    let mut output = String::from("out.pdf");
    let mut pages = Vec::new();
    for (i, arg) in args.rest.iter().enumerate() {
        if i == 0 && arg.to_ascii_lowercase().ends_with(".pdf") {
            output = arg.clone();
        } else {
            pages.push(arg.clone());
        }
    }

    let mut doc = Document::open(&args.input)?;
    if doc.needs_password() && !doc.authenticate(&args.password) {
        return Err(Error::encryption(format!(
            "cannot authenticate password: {}",
            args.input.display()
        )));
    }

    let opts = CleanOptions {
        garbage: args.garbage.min(3),
        expand,
        ascii: args.ascii,
        pages,
    };

    let out = BufWriter::new(File::create(&output)?);
    clean(&mut doc, out, &opts)
}
