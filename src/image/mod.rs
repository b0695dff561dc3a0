/// Planned disc images

/// Image builder for creating disc images
pub mod builder;
/// Sector allocation engine
pub mod layout;

pub use builder::DiscImageBuilder;
pub use layout::{allocate, Allocation, Location, Region, RegionKind, SectorBudget};

use crate::error::Result;
use crate::format::VolumeSpec;
use crate::progress::{ProgressSink, ProgressState};
use crate::tree::FileTree;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// A file tree with its complete sector allocation, ready to write
#[derive(Debug, Clone)]
pub struct DiscImage {
    /// Volume specification
    pub(crate) spec: VolumeSpec,
    /// Source tree
    pub(crate) tree: FileTree,
    /// Placement of every region and node
    pub(crate) allocation: Allocation,
}

impl DiscImage {
    /// Enumerate a source directory and plan an image with PS2 defaults
    pub fn open<P: AsRef<Path>>(source: P) -> Result<Self> {
        DiscImageBuilder::new().source(source.as_ref()).build()
    }

    /// Plan an image for an existing tree
    pub fn create(tree: FileTree, spec: VolumeSpec) -> Result<Self> {
        let allocation = allocate(&tree, &spec)?;
        Ok(Self {
            spec,
            tree,
            allocation,
        })
    }

    /// Create a new builder for planning disc images
    pub fn builder() -> DiscImageBuilder {
        DiscImageBuilder::new()
    }

    /// Get the volume specification
    pub fn spec(&self) -> &VolumeSpec {
        &self.spec
    }

    /// Replace the volume specification and plan again
    pub fn set_spec(&mut self, spec: VolumeSpec) -> Result<()> {
        self.allocation = allocate(&self.tree, &spec)?;
        self.spec = spec;
        Ok(())
    }

    /// Get the source tree
    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    /// Get the allocation table
    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Get the region sizes
    pub fn budget(&self) -> &SectorBudget {
        &self.allocation.budget
    }

    /// Image size in sectors
    pub fn total_sectors(&self) -> u32 {
        self.allocation.budget.total_sectors
    }

    /// Image size in bytes
    pub fn total_bytes(&self) -> u64 {
        self.allocation.budget.total_bytes()
    }

    /// Write the image to any sequential sink
    pub fn write_to<W: Write>(&self, out: W, sink: &dyn ProgressSink) -> Result<W> {
        crate::io::write_image(&self.tree, &self.spec, &self.allocation, sink, out)
    }

    /// Write the image to a file
    ///
    /// Publishes `Finished` on success. On failure publishes `Failed` and
    /// removes the partially written file.
    pub fn save<P: AsRef<Path>>(&self, path: P, sink: &dyn ProgressSink) -> Result<()> {
        let path = path.as_ref();
        log::info!(
            "Writing {} ({} sectors) to {}",
            self.spec.volume_identifier,
            self.total_sectors(),
            path.display()
        );

        match self.write_file(path, sink) {
            Ok(()) => {
                sink.update(ProgressState::Finished, 1.0, None);
                log::info!("Finished {}", path.display());
                Ok(())
            }
            Err(e) => {
                sink.update(ProgressState::Failed, 0.0, None);
                if path.exists() {
                    log::warn!("Removing partial image {}: {}", path.display(), e);
                    if let Err(remove) = fs::remove_file(path) {
                        log::warn!("Cannot remove {}: {}", path.display(), remove);
                    }
                }
                Err(e)
            }
        }
    }

    fn write_file(&self, path: &Path, sink: &dyn ProgressSink) -> Result<()> {
        let file = File::create(path)?;
        let out = self.write_to(BufWriter::new(file), sink)?;
        out.into_inner()
            .map_err(|e| e.into_error())?
            .sync_all()?;
        Ok(())
    }
}
