//! Resolution stage: domains in, one [`ResolvedAddress`] per A record out.

use crossbeam_channel::{Receiver, Sender};
use geopipe_common::{lookup::Resolve, models::ResolvedAddress, network::domain::Domain};
use tracing::{debug, info_span, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ResolutionStats {
    pub resolved: usize,
    pub failed: usize,
    pub addresses: usize,
}

/// Drains `jobs` until the queue is closed and empty.
///
/// A domain that fails to resolve is dropped; the client's own retry budget
/// is the only retry there is.
pub(crate) fn run_worker<R: Resolve>(
    id: usize,
    mut client: R,
    jobs: Receiver<Domain>,
    results: Sender<ResolvedAddress>,
) -> ResolutionStats {
    let _span = info_span!("dns_worker", id).entered();
    let mut stats = ResolutionStats::default();

    for domain in jobs.iter() {
        debug!("Resolving {domain}");
        let addrs = match client.resolve(&domain) {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("{e}");
                stats.failed += 1;
                continue;
            }
        };

        stats.resolved += 1;
        for addr in addrs {
            if results.send(ResolvedAddress::new(domain.clone(), addr)).is_err() {
                warn!("Geo stage stopped accepting addresses");
                return stats;
            }
            stats.addresses += 1;
        }
    }

    debug!("Done");
    stats
}
