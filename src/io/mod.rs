/// I/O operations for writing disc images

/// Sector writer and image emission
pub mod writer;

pub use writer::{write_image, SectorWriter};
