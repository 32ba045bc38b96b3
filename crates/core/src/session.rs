use anyhow::Result;
use tracing::info;

use crate::device::{eject_batch, DeviceApi, EjectReport};
use crate::selection::{parse_selection, SelectionError};
use crate::volume::{list_removable_volumes, VolumeId, VolumeSource};

/// Operator-facing side of the interactive flow.
pub trait Console {
    fn no_volumes(&mut self) -> Result<()>;
    fn found_single(&mut self, volume: &VolumeId) -> Result<()>;
    fn show_menu(&mut self, volumes: &[VolumeId]) -> Result<()>;
    /// One line of operator input.
    fn read_choice(&mut self) -> Result<String>;
    fn report(&mut self, report: &EjectReport) -> Result<()>;
    fn invalid_selection(&mut self, error: &SelectionError) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSummary {
    NoVolumes,
    Ejected(Vec<EjectReport>),
    InvalidSelection(SelectionError),
}

impl SessionSummary {
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionSummary::NoVolumes => 0,
            SessionSummary::Ejected(reports) => {
                if reports.iter().all(|report| report.outcome.is_success()) {
                    0
                } else {
                    1
                }
            }
            SessionSummary::InvalidSelection(_) => 2,
        }
    }
}

pub fn run_interactive<V, D, C>(volumes: &V, devices: &D, console: &mut C) -> Result<SessionSummary>
where
    V: VolumeSource + ?Sized,
    D: DeviceApi + ?Sized,
    C: Console + ?Sized,
{
    let removable = list_removable_volumes(&volumes)?;

    let picked = match removable.len() {
        0 => {
            console.no_volumes()?;
            return Ok(SessionSummary::NoVolumes);
        }
        1 => {
            console.found_single(&removable[0])?;
            removable
        }
        count => {
            console.show_menu(&removable)?;
            let line = console.read_choice()?;
            match parse_selection(&line, count) {
                Ok(selection) => selection.pick(&removable),
                Err(error) => {
                    info!(input = %line.trim(), %error, "invalid selection");
                    console.invalid_selection(&error)?;
                    return Ok(SessionSummary::InvalidSelection(error));
                }
            }
        }
    };

    let mut console_error = None;
    let reports = eject_batch(devices, &picked, |report| {
        if let Err(err) = console.report(report) {
            console_error.get_or_insert(err);
        }
    });
    if let Some(err) = console_error {
        return Err(err);
    }
    Ok(SessionSummary::Ejected(reports))
}
