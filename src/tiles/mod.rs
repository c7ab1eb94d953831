pub mod cache;
pub mod loader;
pub mod set;
pub mod source;

// Re-exports for convenience
pub use cache::TileCacheStore;
pub use loader::{HttpDownloader, Request, TileDownloader, TileFetcher, TileImage, TileResult};
pub use set::{TileRange, TileSet, TileStatus};
pub use source::{TemplateSource, TileSource};
