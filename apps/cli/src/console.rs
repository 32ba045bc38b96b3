use anyhow::{Context, Result};
use safe_eject_core::{Console, EjectReport, SelectionError, VolumeId};
use std::io::{BufRead, Write};

/// Line-oriented operator dialogue over any reader/writer pair.
pub struct TerminalConsole<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Console for TerminalConsole<R, W> {
    fn no_volumes(&mut self) -> Result<()> {
        writeln!(self.output, "No removable drives are connected.")?;
        Ok(())
    }

    fn found_single(&mut self, volume: &VolumeId) -> Result<()> {
        writeln!(self.output, "Found removable drive: {}", volume)?;
        Ok(())
    }

    fn show_menu(&mut self, volumes: &[VolumeId]) -> Result<()> {
        writeln!(self.output, "Removable drives found:")?;
        for (idx, volume) in volumes.iter().enumerate() {
            writeln!(self.output, "{}: {}", idx + 1, volume)?;
        }
        writeln!(
            self.output,
            "Enter the number of the drive to eject, or 0 to eject all:"
        )?;
        self.output.flush()?;
        Ok(())
    }

    fn read_choice(&mut self) -> Result<String> {
        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .context("read selection from stdin")?;
        Ok(line)
    }

    fn report(&mut self, report: &EjectReport) -> Result<()> {
        writeln!(self.output, "{}", report)?;
        Ok(())
    }

    fn invalid_selection(&mut self, error: &SelectionError) -> Result<()> {
        writeln!(self.output, "Invalid choice: {}.", error)?;
        Ok(())
    }
}
