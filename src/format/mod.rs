/// Disc format constants and descriptor encoders

/// Sector layout constants and fixed identifiers
pub mod constants;
/// Fixed-offset field writers
pub mod field;
/// ISO9660 descriptors and records
pub mod iso;
/// Volume specification types
pub mod spec;
/// UDF descriptors
pub mod udf;

pub use constants::*;
pub use field::SectorBytes;
pub use spec::VolumeSpec;
