use crossbeam_channel::{unbounded, Receiver, Sender};

use super::cache::TileCacheStore;
use super::source::{TemplateSource, TileSource};
use crate::core::config::{EngineConfig, TileLoaderConfig, TileServerConfig};
use crate::core::geo::TileKey;
use crate::prelude::{Arc, HashMap};
use crate::Result;
use async_trait::async_trait;
use image::RgbaImage;
use tokio::sync::Semaphore;

/// A decoded tile, shared between the tile set and any in-progress render
pub type TileImage = Arc<RgbaImage>;

/// Decodes downloaded or cached bytes into an RGBA tile
pub fn decode_tile(bytes: &[u8]) -> Result<TileImage> {
    Ok(Arc::new(image::load_from_memory(bytes)?.to_rgba8()))
}

/// Fetches the raw bytes of one tile
#[async_trait]
pub trait TileDownloader: Send + Sync {
    async fn download(&self, key: TileKey) -> Result<Vec<u8>>;
}

/// Downloads tiles over HTTP(S) from a URL template
pub struct HttpDownloader {
    client: reqwest::Client,
    source: Arc<dyn TileSource>,
}

impl HttpDownloader {
    pub fn new(server: &TileServerConfig, loader: &TileLoaderConfig) -> Result<Self> {
        Self::with_source(
            Arc::new(TemplateSource::from_config(server)),
            &server.user_agent,
            loader,
        )
    }

    pub fn with_source(
        source: Arc<dyn TileSource>,
        user_agent: &str,
        loader: &TileLoaderConfig,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(loader.request_timeout())
            .pool_max_idle_per_host(loader.max_concurrent)
            .build()?;
        Ok(Self { client, source })
    }
}

#[async_trait]
impl TileDownloader for HttpDownloader {
    async fn download(&self, key: TileKey) -> Result<Vec<u8>> {
        let url = self.source.url(key);
        log::trace!("GET {}", url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Outcome of [`TileFetcher::request`]
#[derive(Debug, Clone)]
pub enum Request {
    /// Served from the disk cache without touching the network
    Ready(TileImage),
    /// A download is in flight; the result arrives via [`TileFetcher::try_recv_results`]
    Pending,
}

/// Completion of a background fetch, tagged with the tile-set generation
/// that last asked for it
#[derive(Debug, Clone)]
pub enum TileResult {
    Loaded {
        key: TileKey,
        generation: u64,
        image: TileImage,
    },
    /// The server answered with bytes that are not an image
    Undecodable { key: TileKey, generation: u64 },
    Failed {
        key: TileKey,
        generation: u64,
        error: String,
    },
}

impl TileResult {
    pub fn key(&self) -> TileKey {
        match self {
            TileResult::Loaded { key, .. }
            | TileResult::Undecodable { key, .. }
            | TileResult::Failed { key, .. } => *key,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            TileResult::Loaded { generation, .. }
            | TileResult::Undecodable { generation, .. }
            | TileResult::Failed { generation, .. } => *generation,
        }
    }

    fn with_generation(mut self, new_generation: u64) -> Self {
        match &mut self {
            TileResult::Loaded { generation, .. }
            | TileResult::Undecodable { generation, .. }
            | TileResult::Failed { generation, .. } => *generation = new_generation,
        }
        self
    }
}

/// Cache-first tile fetcher.
///
/// Cache hits are answered synchronously. Misses are downloaded by spawned
/// tasks, at most `max_concurrent` at a time; each completed download is
/// decoded, persisted, and delivered through a channel drained by the host
/// thread. A key is never in flight twice: requesting it again while a
/// download runs only moves the download to the newer generation.
pub struct TileFetcher {
    downloader: Arc<dyn TileDownloader>,
    cache: TileCacheStore,
    semaphore: Arc<Semaphore>,
    result_tx: Sender<TileResult>,
    result_rx: Receiver<TileResult>,
    pending: HashMap<TileKey, u64>,
}

impl TileFetcher {
    /// Create a fetcher backed by HTTP and the configured disk cache
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let downloader = HttpDownloader::new(&config.tiles, &config.loader)?;
        let cache = TileCacheStore::from_config(&config.cache)?;
        Ok(Self::with_downloader(Arc::new(downloader), cache, &config.loader))
    }

    pub fn with_downloader(
        downloader: Arc<dyn TileDownloader>,
        cache: TileCacheStore,
        config: &TileLoaderConfig,
    ) -> Self {
        let (result_tx, result_rx) = unbounded();
        log::debug!(
            "tile fetcher starting with max_concurrent: {}",
            config.max_concurrent
        );
        Self {
            downloader,
            cache,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            result_tx,
            result_rx,
            pending: HashMap::default(),
        }
    }

    /// Request `key` on behalf of tile-set `generation`
    pub fn request(&mut self, key: TileKey, generation: u64) -> Request {
        if let Some(owner) = self.pending.get_mut(&key) {
            *owner = generation;
            return Request::Pending;
        }

        if let Some(image) = self.cache.load(key) {
            return Request::Ready(image);
        }

        self.pending.insert(key, generation);
        self.spawn_download(key, generation);
        Request::Pending
    }

    fn spawn_download(&self, key: TileKey, generation: u64) {
        let downloader = self.downloader.clone();
        let cache = self.cache.clone();
        let semaphore = self.semaphore.clone();
        let result_tx = self.result_tx.clone();

        crate::runtime::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };

            let result = match downloader.download(key).await {
                Ok(bytes) => match decode_tile(&bytes) {
                    Ok(image) => {
                        if let Err(e) = cache.store(key, &bytes) {
                            log::warn!("failed to cache tile {}: {}", key, e);
                        }
                        TileResult::Loaded {
                            key,
                            generation,
                            image,
                        }
                    }
                    Err(e) => {
                        log::debug!("tile {} is not a decodable image: {}", key, e);
                        TileResult::Undecodable { key, generation }
                    }
                },
                Err(e) => {
                    log::warn!("failed to fetch tile {}: {}", key, e);
                    TileResult::Failed {
                        key,
                        generation,
                        error: e.to_string(),
                    }
                }
            };

            let _ = result_tx.send(result);
        });
    }

    /// Try to receive completed tile results (non-blocking).
    ///
    /// Each result carries the most recent generation that requested its key.
    pub fn try_recv_results(&mut self) -> Vec<TileResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_rx.try_recv() {
            let result = match self.pending.remove(&result.key()) {
                Some(generation) => result.with_generation(generation),
                None => result,
            };
            results.push(result);
        }
        results
    }

    pub fn is_pending(&self, key: TileKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.result_rx.is_empty()
    }

    pub fn cache(&self) -> &TileCacheStore {
        &self.cache
    }
}
