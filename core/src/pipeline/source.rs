//! Turns an input stream into validated [`Domain`]s.

use std::io::{self, BufRead};

use crossbeam_channel::Sender;
use geopipe_common::network::domain::Domain;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub accepted: usize,
    /// Non-blank lines that failed validation.
    pub skipped: usize,
}

/// Reads one domain per line, silently skipping blank lines and anything
/// that is not a valid hostname. Input order is preserved.
pub struct DomainSource<I> {
    lines: io::Split<I>,
    stats: SourceStats,
}

impl<I: BufRead> DomainSource<I> {
    pub fn new(input: I) -> Self {
        Self {
            lines: input.split(b'\n'),
            stats: SourceStats::default(),
        }
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    /// Pushes every domain into `queue`.
    ///
    /// Stops early if nobody is left to receive. The caller closes the queue.
    pub(crate) fn feed(mut self, queue: &Sender<Domain>) -> io::Result<SourceStats> {
        for domain in self.by_ref() {
            if queue.send(domain?).is_err() {
                warn!("Resolution stage stopped accepting domains");
                break;
            }
        }
        Ok(self.stats)
    }
}

impl<I: BufRead> Iterator for DomainSource<I> {
    type Item = io::Result<Domain>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line: Vec<u8> = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };

            // Non UTF-8 bytes can never form a valid hostname, so a lossy decode
            // only affects what shows up in the debug message.
            let text = String::from_utf8_lossy(&line);
            let text: &str = text.trim();
            if text.is_empty() {
                continue;
            }

            match text.parse::<Domain>() {
                Ok(domain) => {
                    self.stats.accepted += 1;
                    return Some(Ok(domain));
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    debug!("{text} is not a valid domain, ignoring ({e})");
                }
            }
        }
    }
}
