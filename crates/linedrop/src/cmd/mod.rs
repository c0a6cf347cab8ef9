use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod receive;
pub mod send;

/// Default port, kept from the protocol's original deployment.
pub const DEFAULT_PORT: u16 = 12100;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload batches of lines to a receiving peer.
    Send(SendArgs),
    /// Listen for uploads and persist them as numbered files.
    Receive(ReceiveArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Receive(args) => receive::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to, e.g. "localhost:12100".
    pub addr: String,
    /// Send this file's lines as a single batch instead of prompting.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Address to listen on.
    #[arg(default_value_t = format!("0.0.0.0:{DEFAULT_PORT}"))]
    pub addr: String,
    /// Directory to write numbered batch files into.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Exit after serving N sessions.
    #[arg(long)]
    pub sessions: Option<usize>,
    /// Reject batches with more than N lines.
    #[arg(long)]
    pub max_lines: Option<usize>,
    /// Reject batches containing a line longer than N bytes.
    #[arg(long)]
    pub max_line_bytes: Option<usize>,
}
