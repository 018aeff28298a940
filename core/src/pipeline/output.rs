//! Output stage: the single consumer at the end of the pipeline.
//!
//! This is the only place where results are deduplicated and ordered. A
//! domain is printed the first time a matching result for it arrives; later
//! matches for the same domain are ignored.

use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Receiver;
use geopipe_common::{config::OutputMode, models::GeoResult, network::domain::Domain};
use serde::Serialize;
use tracing::{debug, info_span, warn};

#[derive(Serialize)]
struct JsonRecord<'a> {
    domain: &'a str,
    ip_address: String,
    country_code: &'a str,
    #[serde(rename = "match")]
    matched: bool,
}

impl<'a> From<&'a GeoResult> for JsonRecord<'a> {
    fn from(result: &'a GeoResult) -> Self {
        Self {
            domain: result.domain.as_str(),
            ip_address: result.addr.to_string(),
            country_code: &result.country_code,
            matched: result.matched,
        }
    }
}

pub struct OutputStage<W> {
    writer: W,
    mode: OutputMode,
    matched: HashSet<Domain>,
    closed: bool,
}

impl<W: Write> OutputStage<W> {
    pub fn new(writer: W, mode: OutputMode) -> Self {
        Self {
            writer,
            mode,
            matched: HashSet::new(),
            closed: false,
        }
    }

    /// Consumes results until the queue is closed, then returns the number of
    /// distinct matched domains.
    ///
    /// Once `aborted` is set nothing more is written, but results are still
    /// drained and counted.
    pub fn run(mut self, results: Receiver<GeoResult>, aborted: &AtomicBool) -> usize {
        let _span = info_span!("output").entered();

        for result in results.iter() {
            if !self.closed && aborted.load(Ordering::Acquire) {
                debug!("Run aborted, discarding remaining results");
                self.closed = true;
            }
            self.accept(result);
        }
        self.emit(|w| w.flush());

        debug!("Done");
        self.matched.len()
    }

    /// Handles one result.
    ///
    /// JSON mode prints every record; the other modes print each matching
    /// domain once. Matches are counted in every mode.
    pub fn accept(&mut self, result: GeoResult) {
        if self.mode == OutputMode::Json {
            let record = JsonRecord::from(&result);
            self.emit(|w| {
                serde_json::to_writer(&mut *w, &record).map_err(io::Error::from)?;
                writeln!(w)
            });
        }

        if !result.matched || self.matched.contains(&result.domain) {
            return;
        }

        if self.mode != OutputMode::Json {
            self.emit(|w| writeln!(w, "{}", result.domain));
        }
        self.matched.insert(result.domain);
    }

    pub fn matched(&self) -> usize {
        self.matched.len()
    }

    /// Writes unless output was closed by an earlier failure or an abort.
    ///
    /// A closed stage keeps draining its queue so upstream workers never
    /// block on a reader that has gone away.
    fn emit(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.closed {
            return;
        }
        if let Err(e) = write(&mut self.writer) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                debug!("Output closed by reader");
            } else {
                warn!("Failed to write output: {e}");
            }
            self.closed = true;
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
