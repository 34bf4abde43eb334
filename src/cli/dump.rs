use std::fs::File;
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::prelude::*;
use clap::Args;
use uproctrace::{DecodeOptions, FrameReader};

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Path of the trace file
    pub trace: PathBuf,

    /// Print one JSON object per line instead of debug blocks
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &DumpArgs, options: DecodeOptions, out: &mut impl Write) -> Result<()> {
    let file = File::open(&args.trace)
        .with_context(|| format!("Failed to open trace {}", args.trace.display()))?;
    dump(file, args.json, options, out)
        .with_context(|| format!("Failed to dump trace {}", args.trace.display()))
}

fn dump<R: Read>(
    reader: R,
    json: bool,
    options: DecodeOptions,
    out: &mut impl Write,
) -> Result<()> {
    let mut frames = FrameReader::with_options(reader, options);
    for event in frames.by_ref() {
        let event = event?;
        if json {
            serde_json::to_writer(&mut *out, &event)?;
            writeln!(out)?;
        } else {
            writeln!(out, "event {event:#?}")?;
        }
    }

    debug!(
        "Dumped {} frames, skipped {}",
        frames.frames_decoded(),
        frames.frames_skipped()
    );
    Ok(())
}
