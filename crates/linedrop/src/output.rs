use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use linedrop_session::{SessionStats, UploadOutcome};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct UploadOutput<'a> {
    event: &'a str,
    batch: usize,
    lines: usize,
    outcome: &'a str,
    timestamp: String,
}

/// Report one upload's verdict.
pub fn print_upload(batch: usize, lines: usize, outcome: UploadOutcome, format: OutputFormat) {
    let verdict = match outcome {
        UploadOutcome::Accepted => "accepted",
        UploadOutcome::Rejected => "rejected",
    };
    match format {
        OutputFormat::Json => {
            let out = UploadOutput {
                event: "upload",
                batch,
                lines,
                outcome: verdict,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["BATCH", "LINES", "OUTCOME"])
                .add_row(vec![
                    batch.to_string(),
                    lines.to_string(),
                    verdict.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("batch={batch} lines={lines} outcome={verdict}");
        }
    }
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    event: &'a str,
    peer: &'a str,
    accepted: u64,
    rejected: u64,
    clean: bool,
    timestamp: String,
}

/// Report one finished (or abandoned) server session.
pub fn print_session(peer: &str, stats: SessionStats, clean: bool, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SessionOutput {
                event: "session",
                peer,
                accepted: stats.accepted,
                rejected: stats.rejected,
                clean,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PEER", "ACCEPTED", "REJECTED", "END"])
                .add_row(vec![
                    peer.to_string(),
                    stats.accepted.to_string(),
                    stats.rejected.to_string(),
                    if clean { "clean" } else { "disconnected" }.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "peer={} accepted={} rejected={} end={}",
                peer,
                stats.accepted,
                stats.rejected,
                if clean { "clean" } else { "disconnected" }
            );
        }
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
