/// Build a [`FileTree`] from a host directory

use crate::error::{DiscError, Result};
use crate::tree::{FileTree, NodeId};
use std::fs;
use std::path::Path;

impl FileTree {
    /// Enumerate a host directory recursively
    ///
    /// Entries are added in name order so repeated builds of the same
    /// directory produce identical images. Symlinks are followed; anything
    /// that is neither a file nor a directory is skipped.
    pub fn from_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| DiscError::enumeration(path, format!("cannot read: {}", e)))?;
        if !metadata.is_dir() {
            return Err(DiscError::enumeration(path, "not a directory"));
        }

        let mut tree = FileTree::with_root_path(path);
        let root = tree.root();
        add_directory_recursive(&mut tree, path, root)?;

        if tree.is_empty() {
            return Err(DiscError::enumeration(path, "nothing to pack"));
        }

        log::info!(
            "Enumerated {}: {} directories, {} files, {} bytes",
            path.display(),
            tree.directory_count(),
            tree.file_count(),
            tree.data_size()
        );
        Ok(tree)
    }
}

fn add_directory_recursive(tree: &mut FileTree, current: &Path, parent: NodeId) -> Result<()> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(current)
        .map_err(|e| DiscError::enumeration(current, format!("cannot list: {}", e)))?
    {
        let entry = entry?;
        let name = entry.file_name().into_string().map_err(|raw| {
            DiscError::InvalidFilename(format!("{} is not valid UTF-8", raw.to_string_lossy()))
        })?;
        if name == "." || name == ".." {
            continue;
        }
        entries.push((name, entry.path()));
    }
    entries.sort();

    for (name, path) in entries {
        let metadata = fs::metadata(&path)
            .map_err(|e| DiscError::enumeration(&path, format!("cannot read: {}", e)))?;
        if metadata.is_dir() {
            let id = tree.add_directory(parent, &name)?;
            add_directory_recursive(tree, &path, id)?;
        } else if metadata.is_file() {
            tree.add_file(parent, &name, metadata.len(), &path)?;
        } else {
            log::debug!("Skipping {}: not a regular file", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileTree::from_directory(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DiscError::Enumeration { .. }));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = FileTree::from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, DiscError::Enumeration { .. }));
    }

    #[test]
    fn test_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("SYSTEM.CNF");
        fs::write(&file, b"BOOT2").unwrap();
        let err = FileTree::from_directory(&file).unwrap_err();
        assert!(matches!(err, DiscError::Enumeration { .. }));
    }

    #[test]
    fn test_enumerates_nested_tree() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SYSTEM.CNF"), [0u8; 16]).unwrap();
        fs::create_dir(dir.path().join("DATA")).unwrap();
        fs::write(dir.path().join("DATA").join("A.BIN"), vec![0xAAu8; 5000]).unwrap();
        fs::create_dir(dir.path().join("EMPTY")).unwrap();

        let tree = FileTree::from_directory(dir.path()).unwrap();
        assert_eq!(tree.directory_count(), 2);
        assert_eq!(tree.file_count(), 2);
        assert_eq!(tree.data_size_in_sectors(), 4);

        let a = tree.find("DATA/A.BIN").unwrap();
        let node = tree.node(a);
        assert_eq!(node.entry.size, 5000);
        assert_eq!(node.depth, 1);
        assert_eq!(node.entry.source_path, dir.path().join("DATA").join("A.BIN"));

        let names: Vec<&str> = tree
            .node(tree.root())
            .children
            .iter()
            .map(|&c| tree.node(c).name())
            .collect();
        assert_eq!(names, vec!["DATA", "EMPTY", "SYSTEM.CNF"]);
    }
}
