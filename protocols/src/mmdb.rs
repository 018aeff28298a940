//! MaxMind country database reader.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use geopipe_common::lookup::{CountryLookup, LookupError};
use maxminddb::{MaxMindDBError, Reader, geoip2};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GeoDbError {
    #[error("file {} does not exist", .0.display())]
    Missing(PathBuf),
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: MaxMindDBError,
    },
}

/// A GeoLite2/GeoIP2 country database, read fully into memory.
///
/// The reader is immutable once opened, so one instance serves every geo
/// worker without locking.
pub struct GeoDb {
    reader: Reader<Vec<u8>>,
}

impl GeoDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoDbError> {
        let path: &Path = path.as_ref();
        if !path.is_file() {
            return Err(GeoDbError::Missing(path.to_path_buf()));
        }

        let reader = Reader::open_readfile(path).map_err(|source| GeoDbError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Opened {} ({} nodes)",
            reader.metadata.database_type, reader.metadata.node_count
        );

        Ok(Self { reader })
    }

    pub fn database_type(&self) -> &str {
        &self.reader.metadata.database_type
    }
}

impl CountryLookup for GeoDb {
    fn country_code(&self, addr: IpAddr) -> Result<String, LookupError> {
        match self.reader.lookup::<geoip2::Country>(addr) {
            Ok(record) => Ok(record
                .country
                .and_then(|country| country.iso_code)
                .unwrap_or_default()
                .to_string()),
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(String::new()),
            Err(e) => Err(LookupError::Database {
                addr,
                reason: e.to_string(),
            }),
        }
    }
}
