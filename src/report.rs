//! Report emitters
//!
//! Results are streamed: the verifier hands each [`ComparisonResult`] to a
//! [`ReportSink`] as soon as the pair has been compared, and sinks flush
//! after every result so a harness reading stdout sees progress live.
//!
//! [`TapReporter`] writes TAP-style lines:
//!
//! ```text
//! ok 1 - compare revision r1 and commit 3f2a... (refs/heads/trunk)
//! not ok 2 - compare revision r2 and commit 9c1e... (refs/heads/trunk)
//! # missing path /tmp/git/a.txt
//! ```
//!
//! [`JsonReporter`] writes one JSON object per line instead.

use crate::error::Result;
use crate::types::{ComparisonResult, Discrepancy};
use colored::Colorize;
use serde::Serialize;
use std::io::Write;

/// Consumer of comparison results
pub trait ReportSink {
    /// Record one result
    fn report(&mut self, result: &ComparisonResult) -> Result<()>;
}

impl ReportSink for Vec<ComparisonResult> {
    fn report(&mut self, result: &ComparisonResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn report(&mut self, result: &ComparisonResult) -> Result<()> {
        (**self).report(result)
    }
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn report(&mut self, result: &ComparisonResult) -> Result<()> {
        (**self).report(result)
    }
}

/// TAP-style text report
pub struct TapReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TapReporter<W> {
    /// Create a reporter; failures are bold red when `color` is set
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn failure_line(&mut self, line: &str) -> Result<()> {
        if self.color {
            writeln!(self.out, "{}", line.red().bold())?;
        } else {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }
}

impl<W: Write> ReportSink for TapReporter<W> {
    fn report(&mut self, result: &ComparisonResult) -> Result<()> {
        if result.ok() {
            writeln!(self.out, "ok {} - {}", result.sequence, result.description())?;
        } else {
            self.failure_line(&format!(
                "not ok {} - {}",
                result.sequence,
                result.description()
            ))?;
            for discrepancy in &result.discrepancies {
                self.failure_line(&format!("# {}", discrepancy))?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    sequence: usize,
    ok: bool,
    revision: &'a str,
    commit: &'a str,
    #[serde(rename = "ref")]
    reference: &'a str,
    discrepancies: Vec<JsonDiscrepancy<'a>>,
}

#[derive(Serialize)]
struct JsonDiscrepancy<'a> {
    message: String,
    #[serde(flatten)]
    detail: &'a Discrepancy,
}

/// JSON-lines report, one object per result
pub struct JsonReporter<W: Write> {
    out: W,
}

impl<W: Write> JsonReporter<W> {
    /// Create a reporter writing to `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for JsonReporter<W> {
    fn report(&mut self, result: &ComparisonResult) -> Result<()> {
        let record = JsonRecord {
            sequence: result.sequence,
            ok: result.ok(),
            revision: &result.revision,
            commit: &result.commit,
            reference: &result.reference,
            discrepancies: result
                .discrepancies
                .iter()
                .map(|d| JsonDiscrepancy {
                    message: d.to_string(),
                    detail: d,
                })
                .collect(),
        };
        serde_json::to_writer(&mut self.out, &record)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
