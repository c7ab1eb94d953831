use super::loader::{decode_tile, TileImage};
use crate::core::config::CacheConfig;
use crate::core::geo::TileKey;
use crate::{MapError, Result};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Persistent tile cache: one file per tile, named `<zoom>-<x>-<y>.png`.
///
/// File presence is the only existence check, so a tile on disk is always a
/// hit and never triggers a download. With `max_tiles` set, an LRU index
/// over the directory deletes the least recently used file once the count
/// is exceeded.
#[derive(Debug, Clone)]
pub struct TileCacheStore {
    root: PathBuf,
    index: Option<Arc<Mutex<LruCache<TileKey, ()>>>>,
}

impl TileCacheStore {
    /// Open (and create) a cache directory
    pub fn open(root: impl Into<PathBuf>, max_tiles: Option<usize>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        let index = match max_tiles {
            Some(capacity) => {
                let capacity = NonZeroUsize::new(capacity)
                    .ok_or_else(|| MapError::Config("max_tiles must be at least 1".into()))?;
                Some(Arc::new(Mutex::new(LruCache::new(capacity))))
            }
            None => None,
        };

        let store = Self { root, index };
        store.seed_index()?;
        log::debug!("tile cache opened at {}", store.root.display());
        Ok(store)
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::open(config.resolve_directory()?, config.max_tiles)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: TileKey) -> PathBuf {
        self.root
            .join(format!("{}-{}-{}.png", key.zoom, key.x, key.y))
    }

    pub fn has(&self, key: TileKey) -> bool {
        self.path_for(key).is_file()
    }

    /// Raw bytes of a cached tile
    pub fn load_bytes(&self, key: TileKey) -> Option<Vec<u8>> {
        let bytes = std::fs::read(self.path_for(key)).ok()?;
        self.touch(key);
        Some(bytes)
    }

    /// Decoded cached tile. A file that fails to decode is reported as absent.
    pub fn load(&self, key: TileKey) -> Option<TileImage> {
        let bytes = self.load_bytes(key)?;
        match decode_tile(&bytes) {
            Ok(image) => Some(image),
            Err(e) => {
                log::debug!("cached tile {} does not decode: {}", key, e);
                None
            }
        }
    }

    /// Persist raw tile bytes
    pub fn store(&self, key: TileKey, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let partial = path.with_extension("part");
        std::fs::write(&partial, bytes)?;
        std::fs::rename(&partial, &path)?;

        if let Some(index) = &self.index {
            let evicted = index.lock().ok().and_then(|mut lru| lru.push(key, ()));
            if let Some((old, _)) = evicted {
                if old != key {
                    self.remove_file(old);
                }
            }
        }
        Ok(())
    }

    /// Number of tile files on disk
    pub fn len(&self) -> usize {
        self.cached_keys().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every cached tile
    pub fn clear(&self) -> Result<()> {
        for (key, _) in self.cached_keys()? {
            std::fs::remove_file(self.path_for(key))?;
        }
        if let Some(index) = &self.index {
            if let Ok(mut lru) = index.lock() {
                lru.clear();
            }
        }
        Ok(())
    }

    fn touch(&self, key: TileKey) {
        if let Some(index) = &self.index {
            if let Ok(mut lru) = index.lock() {
                if lru.get(&key).is_none() {
                    lru.put(key, ());
                }
            }
        }
    }

    fn remove_file(&self, key: TileKey) {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => log::debug!("evicted cached tile {}", key),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to evict cached tile {}: {}", key, e),
        }
    }

    /// Seed the LRU index oldest-first so the most recently written tiles survive
    fn seed_index(&self) -> Result<()> {
        let Some(index) = &self.index else {
            return Ok(());
        };
        let mut keys = self.cached_keys()?;
        keys.sort_by_key(|(_, modified)| *modified);

        let mut evicted = Vec::new();
        if let Ok(mut lru) = index.lock() {
            for (key, _) in keys {
                if let Some((old, _)) = lru.push(key, ()) {
                    evicted.push(old);
                }
            }
        }
        for key in evicted {
            self.remove_file(key);
        }
        Ok(())
    }

    fn cached_keys(&self) -> Result<Vec<(TileKey, SystemTime)>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(parse_tile_file_name) else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            keys.push((key, modified));
        }
        Ok(keys)
    }
}

fn parse_tile_file_name(name: &str) -> Option<TileKey> {
    let stem = name.strip_suffix(".png")?;
    let mut parts = stem.split('-');
    let zoom = parts.next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(TileKey::new(zoom, x, y))
}
