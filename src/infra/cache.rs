//! On-disk cache in front of a [`LapSource`].
//!
//! Each session is stored as gzip-compressed JSON under
//! `<cache_dir>/<season>_<event-slug>_<kind>.json.gz`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::services::{LapSource, RawLapTable, SessionId};

/// A [`LapSource`] wrapper that serves sessions from disk when possible and
/// persists whatever the inner source returns.
pub struct CachedSource<S> {
    pub inner: S,
    cache_dir: PathBuf,
}

impl<S> CachedSource<S> {
    /// Wraps `inner`, creating `cache_dir` if it does not exist.
    pub fn new(inner: S, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)
            .with_context(|| format!("creating cache directory {}", cache_dir.display()))?;
        Ok(Self { inner, cache_dir })
    }

    pub fn path_for(&self, session: &SessionId) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json.gz", session.cache_key()))
    }
}

fn read_cached(path: &Path) -> Result<Option<RawLapTable>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    let table = serde_json::from_reader(GzDecoder::new(BufReader::new(file)))?;
    Ok(Some(table))
}

/// Sibling file the entry is written to before being renamed into place.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes the entry to a staging file and renames it over `path`.
fn write_cached(path: &Path, table: &RawLapTable) -> Result<()> {
    let staging = staging_path(path);
    let written = (|| -> Result<()> {
        let file = File::create(&staging)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, table)?;
        encoder.finish()?.flush()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    fs::rename(&staging, path)?;
    Ok(())
}

#[async_trait]
impl<S: LapSource> LapSource for CachedSource<S> {
    #[tracing::instrument(skip(self, session), fields(session = %session))]
    async fn load_session(&self, session: &SessionId) -> Result<RawLapTable> {
        let path = self.path_for(session);

        match read_cached(&path) {
            Ok(Some(table)) if table.session == *session => {
                info!(path = %path.display(), laps = table.laps.len(), "Cache hit");
                return Ok(table);
            }
            Ok(Some(_)) => warn!(path = %path.display(), "Cache entry belongs to another session, refetching"),
            Ok(None) => debug!(path = %path.display(), "Cache miss"),
            Err(e) => warn!(path = %path.display(), error = %e, "Unreadable cache entry, refetching"),
        }

        let table = self.inner.load_session(session).await?;
        write_cached(&path, &table)
            .with_context(|| format!("writing cache entry {}", path.display()))?;
        debug!(path = %path.display(), "Cache entry written");

        Ok(table)
    }
}
