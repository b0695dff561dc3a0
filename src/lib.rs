/*!
# ps2image

A Rust library for building PS2-compatible hybrid ISO9660/UDF 1.02 disc images
from a host directory.

## Features

- Enumerate a host directory into an in-memory file tree
- Plan the complete sector layout before any byte is written
- Emit ISO9660 descriptors, path tables and directory records alongside the
  UDF volume, integrity and file set structures
- Stream file payloads straight from disk into a sequential writer
- Run a packing job on a background thread and poll its progress

## Quick Start

```rust,no_run
use ps2image::{DiscImage, NoProgress, Packer, ProgressState, VolumeSpec};

// Plan an image from a directory and inspect the layout
let image = DiscImage::builder()
    .volume_identifier("SLUS_209.46")
    .source("game/")
    .build()?;
println!("{} sectors", image.total_sectors());

// Write it out
image.save("game.iso", &NoProgress)?;

// Or pack in the background and poll
let job = Packer::start("game/", "game.iso", VolumeSpec::default())?;
while !job.is_finished() {
    let progress = job.poll();
    if progress.new_state {
        println!("{}", progress.state);
    }
}
job.wait()?;
# Ok::<(), ps2image::DiscError>(())
```

## Image Layout

Sectors are 2048 bytes. The fixed area holds the system area, the ISO9660
primary volume descriptor, the UDF recognition sequence, both volume
descriptor sequences, the integrity sequence and the anchor at sector 256.
Path tables and ISO directory records follow, then the UDF partition with
the file set, file identifiers, file entries and file data. Images are
padded to a multiple of 16 sectors, the last of which is a terminating
descriptor.

## Modules

- `format`: ISO9660 and UDF structures and constants
- `tree`: File tree and directory enumeration
- `image`: Sector allocation and planned images
- `io`: Sector writer and image emission
- `packer`: Background packing jobs
- `progress`: Progress reporting
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Descriptor tag checksums
pub mod checksum;
/// Error types and Result alias
pub mod error;
/// ISO9660 and UDF structures and constants
pub mod format;
/// Planned images and sector allocation
pub mod image;
/// I/O operations for writing disc images
pub mod io;
/// Region map visualization
pub mod map;
/// Background packing jobs
pub mod packer;
/// Progress reporting
pub mod progress;
/// File tree and directory enumeration
pub mod tree;

// Re-export common types
pub use error::{DiscError, Result};
pub use format::VolumeSpec;
pub use image::{
    allocate, Allocation, DiscImage, DiscImageBuilder, Location, Region, RegionKind,
    SectorBudget,
};
pub use packer::{Packer, PackingJob};
pub use progress::{NoProgress, Progress, ProgressSink, ProgressState, SharedProgress};
pub use tree::{FileEntry, FileTree, NodeId, TreeNode};
