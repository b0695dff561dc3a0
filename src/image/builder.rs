/// Builder for planning disc images

use crate::error::{DiscError, Result};
use crate::format::VolumeSpec;
use crate::image::DiscImage;
use crate::tree::FileTree;
use std::path::PathBuf;

/// Builder for constructing disc images from a directory or a prepared tree
pub struct DiscImageBuilder {
    spec: VolumeSpec,
    source: Option<PathBuf>,
    tree: Option<FileTree>,
}

impl DiscImageBuilder {
    /// Create a new builder with PS2 defaults
    pub fn new() -> Self {
        Self {
            spec: VolumeSpec::ps2_dvd(),
            source: None,
            tree: None,
        }
    }

    /// Set the volume specification
    pub fn spec(mut self, spec: VolumeSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Set the volume identifier
    pub fn volume_identifier(mut self, id: &str) -> Self {
        self.spec.volume_identifier = id.to_string();
        self
    }

    /// Set the publisher identifier
    pub fn publisher(mut self, id: &str) -> Self {
        self.spec.publisher_identifier = id.to_string();
        self
    }

    /// Set the boot descriptor file sorted first at the root
    pub fn boot_file(mut self, name: &str) -> Self {
        self.spec.boot_file = name.to_string();
        self
    }

    /// Set the multi-sector directory cap
    pub fn max_directory_sectors(mut self, sectors: u32) -> Self {
        self.spec.max_directory_sectors = sectors.max(1);
        self
    }

    /// Enumerate this host directory when building
    pub fn source<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source = Some(path.into());
        self.tree = None;
        self
    }

    /// Use a prepared tree instead of enumerating a directory
    pub fn tree(mut self, tree: FileTree) -> Self {
        self.tree = Some(tree);
        self.source = None;
        self
    }

    /// Enumerate (if needed) and plan the image
    pub fn build(self) -> Result<DiscImage> {
        let tree = match (self.tree, self.source) {
            (Some(tree), _) => tree,
            (None, Some(source)) => FileTree::from_directory(&source)?,
            (None, None) => return Err(DiscError::invalid_tree("no source directory or tree")),
        };
        DiscImage::create(tree, self.spec)
    }
}

impl Default for DiscImageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builder_requires_source() {
        assert!(matches!(
            DiscImageBuilder::new().build(),
            Err(DiscError::InvalidTree(_))
        ));
    }

    #[test]
    fn test_builder_custom() {
        let image = DiscImageBuilder::new()
            .volume_identifier("SLUS_209.46")
            .publisher("VUG")
            .boot_file("BOOT.CNF")
            .max_directory_sectors(4)
            .tree(FileTree::new())
            .build()
            .unwrap();

        assert_eq!(image.spec().volume_identifier, "SLUS_209.46");
        assert_eq!(image.spec().publisher_identifier, "VUG");
        assert_eq!(image.spec().boot_file, "BOOT.CNF");
        assert_eq!(image.spec().max_directory_sectors, 4);
    }

    #[test]
    fn test_builder_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SYSTEM.CNF"), b"BOOT2").unwrap();
        let image = DiscImageBuilder::new().source(dir.path()).build().unwrap();
        assert_eq!(image.tree().file_count(), 1);
        assert_eq!(image.total_sectors() % 16, 0);
    }
}
