//! Geo stage: tags each address with its country and whether it matches.

use std::net::IpAddr;

use crossbeam_channel::{Receiver, Sender};
use geopipe_common::{
    lookup::CountryLookup,
    models::{GeoResult, ResolvedAddress},
};
use tracing::{debug, info_span, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GeoStats {
    pub failed: usize,
}

pub(crate) fn run_worker<L: CountryLookup + ?Sized>(
    id: usize,
    db: &L,
    target: &str,
    jobs: Receiver<ResolvedAddress>,
    results: Sender<GeoResult>,
) -> GeoStats {
    let _span = info_span!("geo_worker", id).entered();
    let mut stats = GeoStats::default();

    for job in jobs.iter() {
        let country_code: String = match db.country_code(IpAddr::V4(job.addr)) {
            Ok(code) => code,
            Err(e) => {
                warn!("{e}");
                stats.failed += 1;
                continue;
            }
        };

        let result = GeoResult::new(job, country_code, target);
        if result.matched {
            debug!("{} ({}) matches", result.addr, result.domain);
        } else {
            debug!("{} ({}) does not match", result.addr, result.domain);
        }

        if results.send(result).is_err() {
            warn!("Output stage stopped accepting results");
            break;
        }
    }

    debug!("Done");
    stats
}
