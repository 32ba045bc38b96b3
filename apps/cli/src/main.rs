mod console;
mod logging;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use safe_eject_core::{
    eject_batch, list_removable_volumes, run_interactive, DeviceApi, DevicePath, EjectReport,
    VolumeId, VolumeSource,
};
use safe_eject_host_windows::{SystemDevices, SystemVolumes};
use std::io::{BufRead, Write};

use crate::console::TerminalConsole;

#[derive(Debug, Parser)]
#[command(name = "safe-eject", version, about = "Safely eject removable drives")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List removable drives that are ready to eject
    List {
        #[arg(long)]
        json: bool,
        #[arg(long, requires = "json")]
        pretty: bool,
    },
    /// Eject drives without prompting
    Eject {
        /// Drives to eject, e.g. E: or E:\
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        volumes: Vec<String>,
        /// Eject every removable drive
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let code = run(
        cli.command,
        &SystemVolumes,
        &SystemDevices,
        stdin.lock(),
        stdout.lock(),
    )?;
    std::process::exit(code)
}

fn run<V, D, R, W>(
    command: Option<Command>,
    volumes: &V,
    devices: &D,
    input: R,
    mut output: W,
) -> Result<i32>
where
    V: VolumeSource,
    D: DeviceApi,
    R: BufRead,
    W: Write,
{
    tracing::debug!(?command, "running");
    match command {
        None => {
            let mut console = TerminalConsole::new(input, output);
            let summary = run_interactive(volumes, devices, &mut console)?;
            Ok(summary.exit_code())
        }
        Some(Command::List { json, pretty }) => {
            let removable = list_removable_volumes(volumes)?;
            if pretty {
                writeln!(output, "{}", serde_json::to_string_pretty(&removable)?)?;
            } else if json {
                writeln!(output, "{}", serde_json::to_string(&removable)?)?;
            } else if removable.is_empty() {
                writeln!(output, "No removable drives are connected.")?;
            } else {
                for volume in &removable {
                    writeln!(output, "{}", volume)?;
                }
            }
            Ok(0)
        }
        Some(Command::Eject {
            volumes: names,
            all,
            json,
        }) => {
            let removable = list_removable_volumes(volumes)?;
            let targets = if all {
                removable
            } else {
                let mut targets = Vec::new();
                for name in &names {
                    match resolve_volume(name, &removable) {
                        Some(volume) if targets.contains(&volume) => {
                            tracing::debug!(%volume, "drive named more than once");
                        }
                        Some(volume) => targets.push(volume),
                        None => {
                            writeln!(output, "{} is not a removable drive that is ready.", name)?;
                            return Ok(2);
                        }
                    }
                }
                targets
            };

            let reports = eject_batch(devices, &targets, |report| {
                if !json {
                    // Progress is best effort; the JSON summary is authoritative.
                    let _ = writeln!(output, "{}", report);
                }
            });
            if json {
                writeln!(output, "{}", serde_json::to_string_pretty(&reports)?)?;
            }
            Ok(batch_exit_code(&reports))
        }
    }
}

fn batch_exit_code(reports: &[EjectReport]) -> i32 {
    if reports.iter().all(|report| report.outcome.is_success()) {
        0
    } else {
        1
    }
}

/// Matches `E`, `E:` or `E:\` against the current listing, ignoring case.
fn resolve_volume(name: &str, removable: &[VolumeId]) -> Option<VolumeId> {
    let name = name.trim();
    let name = if name.len() == 1 {
        format!("{}:", name)
    } else {
        name.to_string()
    };
    let wanted = DevicePath::for_volume(&VolumeId::new(name));
    removable
        .iter()
        .find(|volume| {
            DevicePath::for_volume(volume)
                .as_str()
                .eq_ignore_ascii_case(wanted.as_str())
        })
        .cloned()
}
