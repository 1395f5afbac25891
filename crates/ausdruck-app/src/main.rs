// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ausdruck — document capture and export
//
// Entry point. Initialises logging, parses the command line and runs one
// export job against a serialized rendered document.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ausdruck_core::events::JobOutcome;
use ausdruck_core::types::{Delivery, DocumentKind, RecordMeta};
use ausdruck_core::ExportConfig;

use services::export::{ExportRequest, load_config, run_export};

#[derive(Parser)]
#[command(name = "ausdruck")]
#[command(version)]
#[command(about = "Export rendered portal documents as PDF or send them to print", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a rendered document
    Export {
        /// Rendered document (JSON)
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Document kind: application, undertaking or certificate
        #[arg(long)]
        kind: DocumentKind,

        /// Record identifier used in the file name
        #[arg(long)]
        record_id: Option<String>,

        /// Send to the print surface instead of saving a file
        #[arg(long)]
        print: bool,

        /// Config file (defaults to ./ausdruck.json when present)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Base URL relative image paths are resolved against
        #[arg(long, env = "AUSDRUCK_BASE_URL")]
        base_url: Option<String>,

        /// Download directory
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Write the default configuration to a directory
    InitConfig {
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Export {
            document,
            kind,
            record_id,
            print,
            config,
            base_url,
            out,
        } => {
            let config = match load_config(config.as_deref(), base_url, out) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            };
            let meta = match record_id {
                Some(id) => RecordMeta::new(kind, id),
                None => RecordMeta::unsaved(kind),
            };
            let delivery = if print {
                Delivery::Print
            } else {
                Delivery::Download
            };

            match run_export(ExportRequest {
                document,
                meta,
                delivery,
                config,
            })
            .await
            {
                Ok(JobOutcome::Done(receipt)) => {
                    match &receipt.location {
                        Some(location) => println!("saved {location}"),
                        None => println!("sent {} to print", receipt.filename),
                    }
                    if let Some(digest) = &receipt.digest {
                        println!("  {} bytes, sha256 {}", digest.bytes_len, digest.sha256);
                    }
                    if receipt.degraded_images > 0 {
                        println!(
                            "  {} image(s) could not be embedded",
                            receipt.degraded_images
                        );
                    }
                    ExitCode::SUCCESS
                }
                Ok(JobOutcome::Failed(report)) => {
                    eprintln!("{} {}", report.human.message, report.human.suggestion);
                    tracing::debug!(error = %report.error, state = %report.failed_in, "job failed");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::InitConfig { dir } => match ExportConfig::default().persist(&dir) {
            Ok(()) => {
                println!("wrote {}", dir.join(ausdruck_core::config::CONFIG_FILE).display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
