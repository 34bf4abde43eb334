use std::io::Write;
use std::path::PathBuf;

use crate::prelude::*;
use clap::Args;
use uproctrace::{DecodeOptions, Process, Processes};

#[derive(Args, Debug)]
pub struct PstreeArgs {
    /// Path of the trace file
    pub trace: PathBuf,
}

pub fn run(args: &PstreeArgs, options: DecodeOptions, out: &mut impl Write) -> Result<()> {
    let processes = Processes::from_path_with_options(&args.trace, options)
        .with_context(|| format!("Failed to read trace {}", args.trace.display()))?;
    debug!(
        "Reconstructed {} processes, {} toplevel, {:?}",
        processes.len(),
        processes.toplevel().count(),
        processes.anomalies()
    );
    write_tree(&processes, out)
}

fn label(process: &Process) -> String {
    match process.cmdline() {
        Some(args) => shell_words::join(args),
        None => "???".to_string(),
    }
}

fn write_tree(processes: &Processes, out: &mut impl Write) -> Result<()> {
    // Depth-first, siblings reversed on the stack to keep their start order
    let mut stack: Vec<(&Process, usize)> = processes.toplevel().map(|p| (p, 0)).collect();
    stack.reverse();
    while let Some((process, depth)) = stack.pop() {
        writeln!(out, "{:indent$}{}", "", label(process), indent = 2 * depth)?;
        let first_child = stack.len();
        stack.extend(processes.children(process).map(|child| (child, depth + 1)));
        stack[first_child..].reverse();
    }
    Ok(())
}
