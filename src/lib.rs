// Library exports for testing and reuse

pub mod band_mapping;
pub mod cli;
pub mod decoder;
pub mod error;
pub mod io;
pub mod label_index;
pub mod metrics;
pub mod pipeline;
pub mod restructure;
pub mod sampling;
pub mod splitter;
pub mod tile;

// Re-export commonly used types
pub use band_mapping::{BandAction, BandMapping};
pub use error::{Result, TileError};
pub use metrics::MetricsAggregator;
pub use sampling::Sampler;
pub use splitter::BandSplitter;
pub use tile::{Image, Metadata, Tile, TileKind};
