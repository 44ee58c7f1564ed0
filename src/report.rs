//! Rendering of scan results.
//!
//! The driver talks to a [`Reporter`]; what ends up on screen depends on the
//! implementation. [`TracingReporter`] is what the binary uses by default,
//! [`JsonReporter`] writes machine-readable lines, and [`CollectingReporter`]
//! keeps everything in memory.

use crate::caves::{CaveRecord, ScanSummary, SectionScan};
use crate::error::Result;
use crate::formats::pe::PeError;
use serde::Serialize;
use std::io::Write;
use tracing::{info, warn};

/// Sink for diagnostics and cave records.
pub trait Reporter {
    fn info(&mut self, message: &str) -> Result<()>;

    fn warning(&mut self, message: &str) -> Result<()>;

    /// A section is about to have its records reported.
    fn section(&mut self, scan: &SectionScan) -> Result<()>;

    fn cave(&mut self, record: &CaveRecord) -> Result<()>;

    /// The section consists entirely of zero bytes.
    fn empty_section(&mut self, record: &CaveRecord) -> Result<()>;

    /// The section's bytes could not be read and it was skipped.
    fn skipped_section(&mut self, name: &str, error: &PeError) -> Result<()>;

    fn summary(&mut self, _summary: &ScanSummary) -> Result<()> {
        Ok(())
    }
}

/// Reports through `tracing` at info/warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&mut self, message: &str) -> Result<()> {
        info!("{}", message);
        Ok(())
    }

    fn warning(&mut self, message: &str) -> Result<()> {
        warn!("{}", message);
        Ok(())
    }

    fn section(&mut self, scan: &SectionScan) -> Result<()> {
        info!(
            perms = %scan.section.perms,
            size = scan.size,
            "Parsing section {}",
            scan.name()
        );
        Ok(())
    }

    fn cave(&mut self, record: &CaveRecord) -> Result<()> {
        info!(pattern = %record.pattern, "{}", record);
        Ok(())
    }

    fn empty_section(&mut self, record: &CaveRecord) -> Result<()> {
        info!("Section {} appears to be empty", record.section);
        info!("{}", record);
        Ok(())
    }

    fn skipped_section(&mut self, name: &str, error: &PeError) -> Result<()> {
        warn!(%error, "Could not read data of section {}, skipping", name);
        Ok(())
    }

    fn summary(&mut self, summary: &ScanSummary) -> Result<()> {
        info!(
            sections = summary.sections_scanned,
            skipped = summary.sections_skipped,
            bytes = summary.cave_bytes,
            "Found {} code caves",
            summary.caves
        );
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonLine<'a> {
    Cave(&'a CaveRecord),
    EmptySection(&'a CaveRecord),
    Summary(&'a ScanSummary),
}

/// Writes one JSON object per record; diagnostics still go to `tracing`.
pub struct JsonReporter<W: Write> {
    writer: W,
    diagnostics: TracingReporter,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            diagnostics: TracingReporter,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, line: &JsonLine<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn info(&mut self, message: &str) -> Result<()> {
        self.diagnostics.info(message)
    }

    fn warning(&mut self, message: &str) -> Result<()> {
        self.diagnostics.warning(message)
    }

    fn section(&mut self, scan: &SectionScan) -> Result<()> {
        self.diagnostics.section(scan)
    }

    fn cave(&mut self, record: &CaveRecord) -> Result<()> {
        self.emit(&JsonLine::Cave(record))
    }

    fn empty_section(&mut self, record: &CaveRecord) -> Result<()> {
        self.emit(&JsonLine::EmptySection(record))
    }

    fn skipped_section(&mut self, name: &str, error: &PeError) -> Result<()> {
        self.diagnostics.skipped_section(name, error)
    }

    fn summary(&mut self, summary: &ScanSummary) -> Result<()> {
        self.emit(&JsonLine::Summary(summary))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Leveled diagnostic kept by [`CollectingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Info(String),
    Warning(String),
}

/// Keeps everything it is told, for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct CollectingReporter {
    pub diagnostics: Vec<Diagnostic>,
    pub sections: Vec<String>,
    pub caves: Vec<CaveRecord>,
    pub empty_sections: Vec<CaveRecord>,
    pub skipped: Vec<(String, PeError)>,
    pub summary: Option<ScanSummary>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::Warning(msg) => Some(msg.as_str()),
            Diagnostic::Info(_) => None,
        })
    }
}

impl Reporter for CollectingReporter {
    fn info(&mut self, message: &str) -> Result<()> {
        self.diagnostics.push(Diagnostic::Info(message.to_string()));
        Ok(())
    }

    fn warning(&mut self, message: &str) -> Result<()> {
        self.diagnostics.push(Diagnostic::Warning(message.to_string()));
        Ok(())
    }

    fn section(&mut self, scan: &SectionScan) -> Result<()> {
        self.sections.push(scan.name().to_string());
        Ok(())
    }

    fn cave(&mut self, record: &CaveRecord) -> Result<()> {
        self.caves.push(record.clone());
        Ok(())
    }

    fn empty_section(&mut self, record: &CaveRecord) -> Result<()> {
        self.empty_sections.push(record.clone());
        Ok(())
    }

    fn skipped_section(&mut self, name: &str, error: &PeError) -> Result<()> {
        self.skipped.push((name.to_string(), error.clone()));
        Ok(())
    }

    fn summary(&mut self, summary: &ScanSummary) -> Result<()> {
        self.summary = Some(summary.clone());
        Ok(())
    }
}
