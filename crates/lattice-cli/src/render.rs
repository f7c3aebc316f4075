//! Console rendering of snapshots.

use std::io::{self, Write};

use clap::ValueEnum;
use lattice_runtime::{CellState, Observer, Row, RuleTable, Snapshot};

/// How snapshots are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// `0`/`1` digits separated by spaces.
    #[default]
    Digits,
    /// One character per cell.
    Blocks,
    /// One JSON object per line.
    Json,
}

/// Writes snapshots as they arrive. The first write error is kept and
/// returned by [`Renderer::finish`].
pub struct Renderer<W: Write> {
    format: Format,
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Renderer<W> {
    pub fn new(format: Format, out: W) -> Self {
        Self {
            format,
            out,
            error: None,
        }
    }

    /// Rule table and seed, printed once before the first generation.
    pub fn header(&mut self, rule: &RuleTable, seed: &Row) -> io::Result<()> {
        match self.format {
            Format::Json => {
                let header = serde_json::json!({
                    "rule": rule.rule_number(),
                    "table": rule.bits(),
                    "size": seed.len(),
                });
                writeln!(self.out, "{header}")
            }
            Format::Digits | Format::Blocks => {
                writeln!(self.out, "Rule table: {rule}")?;
                writeln!(self.out, "Seed:       {seed}")?;
                writeln!(self.out)
            }
        }
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        match self.format {
            Format::Digits => writeln!(self.out, "{:>5} | {}", snapshot.generation, snapshot.row),
            Format::Blocks => {
                let line: String = snapshot.row.iter().map(|s| block(*s)).collect();
                writeln!(self.out, "{line}")
            }
            Format::Json => {
                serde_json::to_writer(&mut self.out, snapshot)?;
                writeln!(self.out)
            }
        }
    }

    /// Flush and surface any write error seen while observing.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> Observer for Renderer<W> {
    fn observe(&mut self, snapshot: &Snapshot) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.write_snapshot(snapshot) {
            self.error = Some(e);
        }
    }
}

fn block(state: CellState) -> char {
    match state {
        CellState::Alive => '█',
        CellState::Dead => ' ',
    }
}
