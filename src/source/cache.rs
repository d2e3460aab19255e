use crate::{
    result::{TileError, TileResult},
    source::DiskCacheConfig,
};
use bevy::log::debug;
use std::{
    fs::{self, OpenOptions},
    io::ErrorKind,
    path::{Path, PathBuf},
    thread,
    time::{Duration, SystemTime},
};

const ENTRY_EXTENSION: &str = "tile";
const LOCK_EXTENSION: &str = "lock";
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Stores raw tile data by key, shared between processes.
pub trait RasterCache {
    /// Held while a key is locked, releases the lock when dropped.
    type Lock;

    fn get(&self, key: &str) -> TileResult<Option<Vec<u8>>>;

    fn put(&self, key: &str, value: &[u8]) -> TileResult<()>;

    /// Blocks until the advisory lock of the key is acquired.
    fn lock(&self, key: &str) -> TileResult<Self::Lock>;
}

/// An advisory lock represented by an exclusively created file.
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_file(&self.path) {
            debug!("Failed to release cache lock {:?}: {error}", self.path);
        }
    }
}

/// A [`RasterCache`] storing one file per entry in a directory.
///
/// Entries expire after the configured duration and the oldest entries are evicted
/// whenever the total size exceeds the limit.
#[derive(Debug)]
pub struct DiskCache {
    config: DiskCacheConfig,
}

impl DiskCache {
    /// Opens the cache directory, creating it if necessary, and drops expired entries.
    pub fn open(config: DiskCacheConfig) -> TileResult<Self> {
        fs::create_dir_all(&config.path)?;

        let cache = Self { config };

        for (path, modified, _) in cache.entries()? {
            if cache.is_expired(modified) {
                fs::remove_file(path)?;
            }
        }

        Ok(cache)
    }

    /// Trims the cache to its size limit and closes it.
    pub fn close(self) -> TileResult<()> {
        self.trim()
    }

    pub fn config(&self) -> &DiskCacheConfig {
        &self.config
    }

    /// The total size of all entries in bytes.
    pub fn size(&self) -> TileResult<u64> {
        Ok(self.entries()?.iter().map(|&(_, _, size)| size).sum())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.config
            .path
            .join(sanitize(key))
            .with_extension(ENTRY_EXTENSION)
    }

    fn lock_path(&self, key: &str) -> PathBuf {
        self.config
            .path
            .join(sanitize(key))
            .with_extension(LOCK_EXTENSION)
    }

    fn is_expired(&self, modified: SystemTime) -> bool {
        age(modified) >= self.config.data_expiration()
    }

    /// Lists all entries with their modification time and size.
    fn entries(&self) -> TileResult<Vec<(PathBuf, SystemTime, u64)>> {
        let mut entries = Vec::new();

        for entry in fs::read_dir(&self.config.path)? {
            let path = entry?.path();

            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                let metadata = fs::metadata(&path)?;
                entries.push((path, metadata.modified()?, metadata.len()));
            }
        }

        Ok(entries)
    }

    /// Evicts the oldest entries until the size limit is met.
    fn trim(&self) -> TileResult<()> {
        let mut entries = self.entries()?;
        let mut size: u64 = entries.iter().map(|&(_, _, size)| size).sum();

        entries.sort_by_key(|&(_, modified, _)| modified);

        for (path, _, entry_size) in entries {
            if size <= self.config.size_limit {
                break;
            }

            debug!("Evicting {path:?} from the raster cache.");
            fs::remove_file(&path)?;
            size -= entry_size;
        }

        Ok(())
    }
}

impl RasterCache for DiskCache {
    type Lock = CacheLock;

    fn get(&self, key: &str) -> TileResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if self.is_expired(metadata.modified()?) {
            fs::remove_file(&path)?;
            return Ok(None);
        }

        Ok(Some(fs::read(path)?))
    }

    fn put(&self, key: &str, value: &[u8]) -> TileResult<()> {
        let path = self.entry_path(key);
        let partial = path.with_extension("partial");

        // Readers never observe partially written entries.
        fs::write(&partial, value)?;
        fs::rename(&partial, &path)?;

        self.trim()
    }

    fn lock(&self, key: &str) -> TileResult<CacheLock> {
        let path = self.lock_path(key);
        let expiration = self.config.lock_expiration();
        let start = SystemTime::now();

        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(CacheLock { path }),
                Err(error) if error.kind() == ErrorKind::AlreadyExists => {}
                Err(error) => return Err(error.into()),
            }

            if is_stale(&path, expiration) {
                debug!("Breaking stale cache lock {path:?}.");
                // Another process may have broken the lock first.
                let _ = fs::remove_file(&path);
                continue;
            }

            if age(start) > expiration {
                return Err(TileError::LockTimeout(key.to_string()));
            }

            thread::sleep(LOCK_RETRY_INTERVAL);
        }
    }
}

/// The time passed since the instant, zero if it lies in the future.
fn age(time: SystemTime) -> Duration {
    SystemTime::now()
        .duration_since(time)
        .unwrap_or_default()
}

fn is_stale(path: &Path, expiration: Duration) -> bool {
    fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .is_ok_and(|modified| age(modified) >= expiration)
}

/// Maps the key to a valid file name.
fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}
