mod cli;
mod counters;
mod graph;
mod sampler;
mod series;
mod tui;
mod units;
mod watch;

use std::time::Instant;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, IfacesFormat};
use crate::counters::read_snapshots;

fn print_ifaces(all: bool, verbose: bool, format: IfacesFormat) -> Result<()> {
    let snapshots = read_snapshots(all, Instant::now())?;
    match format {
        IfacesFormat::Text => {
            if snapshots.is_empty() {
                eprintln!("<no interfaces>");
                std::process::exit(2);
            }
            for snap in snapshots {
                if verbose {
                    println!(
                        "{}\trx {} bytes\ttx {} bytes",
                        snap.adapter, snap.recv_total, snap.sent_total
                    );
                } else {
                    println!("{}", snap.adapter);
                }
            }
        }
        IfacesFormat::Json => {
            #[derive(serde::Serialize)]
            struct IfaceOut {
                name: String,
                recv_total: u64,
                sent_total: u64,
            }

            let out: Vec<IfaceOut> = snapshots
                .into_iter()
                .map(|snap| IfaceOut {
                    name: snap.adapter,
                    recv_total: snap.recv_total,
                    sent_total: snap.sent_total,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out).unwrap());
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let result: Result<()> = match cli.command {
        Some(Commands::Ifaces { all, verbose, format }) => print_ifaces(all, verbose, format),
        Some(Commands::Watch(watch)) => watch::run_watch(watch),
        None => {
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(err) = result {
        // Map to stable exit codes
        let code = exit_code_for_error(&err);
        eprintln!("error: {err:?}");
        std::process::exit(code);
    }
}

pub(crate) fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    // 2: no interfaces (listing), 4: terminal io failure, 5: counter source failure, 1: other
    for cause in err.chain() {
        if cause.is::<crate::counters::CountersError>() {
            return 5;
        }
        if cause.is::<std::io::Error>() {
            return 4;
        }
    }
    1
}
