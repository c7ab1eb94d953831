pub mod buffer;

// Re-export main types
pub use buffer::RenderBuffer;
