/// In-memory file tree consumed by the layout engine

/// Host directory enumeration
pub mod enumerate;

use crate::checksum::compressed_len;
use crate::error::{DiscError, Result};
use crate::format::constants::sectors_for;
use crate::format::iso::{self, NAVIGATION_RECORD_LEN};
use crate::format::spec::VolumeSpec;
use crate::format::udf;
use std::path::{Path, PathBuf};

/// Largest file whose size fits the 32-bit ISO9660 data length
pub const MAX_FILE_SIZE: u64 = u32::MAX as u64;

/// Longest compressed identifier a File Identifier Descriptor can hold
const MAX_FILE_IDENTIFIER_LEN: usize = 255;

/// One real filesystem object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Name of the entry within its directory
    pub name: String,
    /// Directory flag
    pub is_directory: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Host path the contents are read from
    pub source_path: PathBuf,
}

/// Handle of a node in a [`FileTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Index of the node in the tree arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of the tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// The wrapped entry
    pub entry: FileEntry,
    /// Parent directory (`None` only for the root)
    pub parent: Option<NodeId>,
    /// Children in insertion order
    pub children: Vec<NodeId>,
    /// Depth below the root (top-level entries are at depth 0)
    pub depth: u32,
}

impl TreeNode {
    /// Name of the entry
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Directory flag
    pub fn is_directory(&self) -> bool {
        self.entry.is_directory
    }
}

/// Arena-backed directory tree with the disc root at [`FileTree::root`]
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
}

impl FileTree {
    /// Create a tree holding only the root directory
    pub fn new() -> Self {
        Self::with_root_path(PathBuf::new())
    }

    /// Create a tree whose root maps to a host directory
    pub fn with_root_path<P: Into<PathBuf>>(path: P) -> Self {
        let root = TreeNode {
            entry: FileEntry {
                name: String::new(),
                is_directory: true,
                size: 0,
                source_path: path.into(),
            },
            parent: None,
            children: Vec::new(),
            depth: 0,
        };
        Self { nodes: vec![root] }
    }

    /// Handle of the root directory
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Check whether a handle is the root
    pub fn is_root(&self, id: NodeId) -> bool {
        id.0 == 0
    }

    /// Host path of the root directory
    pub fn root_path(&self) -> &Path {
        &self.nodes[0].entry.source_path
    }

    /// Get a node by handle
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Get a node by handle, panicking on a handle from another tree
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Number of entries below the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Check whether the root has no entries
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a subdirectory
    pub fn add_directory(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        let path = self.child_source_path(parent, name);
        self.add_entry(
            parent,
            FileEntry {
                name: name.to_string(),
                is_directory: true,
                size: 0,
                source_path: path,
            },
        )
    }

    /// Add a file whose contents are read from `source_path`
    pub fn add_file<P: Into<PathBuf>>(
        &mut self,
        parent: NodeId,
        name: &str,
        size: u64,
        source_path: P,
    ) -> Result<NodeId> {
        if size > MAX_FILE_SIZE {
            return Err(DiscError::FileTooLarge {
                name: name.to_string(),
                size,
            });
        }
        self.add_entry(
            parent,
            FileEntry {
                name: name.to_string(),
                is_directory: false,
                size,
                source_path: source_path.into(),
            },
        )
    }

    fn child_source_path(&self, parent: NodeId, name: &str) -> PathBuf {
        match self.get(parent) {
            Some(node) => node.entry.source_path.join(name),
            None => PathBuf::from(name),
        }
    }

    fn add_entry(&mut self, parent: NodeId, entry: FileEntry) -> Result<NodeId> {
        let parent_node = self
            .get(parent)
            .ok_or_else(|| DiscError::invalid_tree(format!("no node {}", parent.0)))?;
        if !parent_node.is_directory() {
            return Err(DiscError::invalid_tree(format!(
                "cannot add {} to file {}",
                entry.name,
                parent_node.name()
            )));
        }
        validate_name(&entry.name, entry.is_directory)?;
        if parent_node
            .children
            .iter()
            .any(|&c| self.nodes[c.0].entry.name.eq_ignore_ascii_case(&entry.name))
        {
            return Err(DiscError::invalid_tree(format!(
                "duplicate entry {} in {}",
                entry.name,
                self.display_path(parent)
            )));
        }

        let depth = if self.is_root(parent) {
            0
        } else {
            parent_node.depth + 1
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            entry,
            parent: Some(parent),
            children: Vec::new(),
            depth,
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Path components from the root to a node (empty for the root)
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut components = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current.0].parent {
            components.push(self.nodes[current.0].entry.name.as_str());
            current = parent;
        }
        components.reverse();
        components
    }

    /// Slash-separated path of a node ("/" for the root)
    pub fn display_path(&self, id: NodeId) -> String {
        format!("/{}", self.path(id).join("/"))
    }

    /// Look up a node by slash-separated path
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current = *self.nodes[current.0]
                .children
                .iter()
                .find(|&&c| self.nodes[c.0].entry.name == part)?;
        }
        Some(current)
    }

    /// Every node below the root in depth-first, sibling order
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.len());
        let mut stack: Vec<NodeId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Root followed by every node sorted by depth, then path components
    ///
    /// Comparison is case-sensitive and byte-wise; the sort is stable.
    pub fn sorted(&self) -> Vec<NodeId> {
        let mut keyed: Vec<(u32, Vec<&str>, NodeId)> = self
            .depth_first()
            .into_iter()
            .map(|id| (self.nodes[id.0].depth, self.path(id), id))
            .collect();
        keyed.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        let mut order = Vec::with_capacity(keyed.len() + 1);
        order.push(self.root());
        order.extend(keyed.into_iter().map(|(_, _, id)| id));
        order
    }

    /// Directories (root first) in sorted order
    pub fn sorted_directories(&self) -> Vec<NodeId> {
        self.sorted()
            .into_iter()
            .filter(|&id| self.nodes[id.0].is_directory())
            .collect()
    }

    /// Files in depth-first, sibling order
    pub fn files(&self) -> Vec<NodeId> {
        self.depth_first()
            .into_iter()
            .filter(|&id| !self.nodes[id.0].is_directory())
            .collect()
    }

    /// Children in on-disc record order
    ///
    /// The boot file comes first at the root only, then directories, then
    /// files, each group by case-sensitive name.
    pub fn ordered_children(&self, id: NodeId, spec: &VolumeSpec) -> Vec<NodeId> {
        let node = &self.nodes[id.0];
        let mut boot = Vec::new();
        let mut dirs = Vec::new();
        let mut files = Vec::new();
        for &child in &node.children {
            let entry = &self.nodes[child.0].entry;
            if self.is_root(id) && !entry.is_directory && spec.is_boot_file(&entry.name) {
                boot.push(child);
            } else if entry.is_directory {
                dirs.push(child);
            } else {
                files.push(child);
            }
        }
        dirs.sort_by(|a, b| self.nodes[a.0].entry.name.cmp(&self.nodes[b.0].entry.name));
        files.sort_by(|a, b| self.nodes[a.0].entry.name.cmp(&self.nodes[b.0].entry.name));
        boot.extend(dirs);
        boot.extend(files);
        boot
    }

    /// Number of directories below the root
    pub fn directory_count(&self) -> u32 {
        self.nodes[1..].iter().filter(|n| n.is_directory()).count() as u32
    }

    /// Number of files
    pub fn file_count(&self) -> u32 {
        self.nodes[1..].iter().filter(|n| !n.is_directory()).count() as u32
    }

    /// Total bytes of file payload
    pub fn data_size(&self) -> u64 {
        self.nodes[1..]
            .iter()
            .filter(|n| !n.is_directory())
            .map(|n| n.entry.size)
            .sum()
    }

    /// Payload sectors, each file rounded up to a whole sector
    pub fn data_size_in_sectors(&self) -> u32 {
        self.nodes[1..]
            .iter()
            .filter(|n| !n.is_directory())
            .map(|n| sectors_for(n.entry.size))
            .sum()
    }

    /// Hard link count of a directory: one plus its subdirectories
    pub fn directory_link_count(&self, id: NodeId) -> u16 {
        let subdirs = self.nodes[id.0]
            .children
            .iter()
            .filter(|&&c| self.nodes[c.0].is_directory())
            .count();
        (1 + subdirs) as u16
    }

    /// Record lengths of a directory in on-disc order, "." and ".." included
    pub fn directory_record_lengths(&self, id: NodeId, spec: &VolumeSpec) -> Vec<usize> {
        let mut lengths = vec![NAVIGATION_RECORD_LEN, NAVIGATION_RECORD_LEN];
        lengths.extend(self.ordered_children(id, spec).into_iter().map(|c| {
            let entry = &self.nodes[c.0].entry;
            iso::entry_record_len(&entry.name, entry.is_directory)
        }));
        lengths
    }

    /// Bytes of a directory's record block, ignoring sector boundaries
    pub fn directory_record_block_len(&self, id: NodeId) -> usize {
        2 * NAVIGATION_RECORD_LEN
            + self.nodes[id.0]
                .children
                .iter()
                .map(|&c| {
                    let entry = &self.nodes[c.0].entry;
                    iso::entry_record_len(&entry.name, entry.is_directory)
                })
                .sum::<usize>()
    }

    /// Sectors of one directory's record block
    pub fn directory_record_sectors(&self, id: NodeId, spec: &VolumeSpec) -> u32 {
        iso::record_sectors(self.directory_record_lengths(id, spec))
    }

    /// Directory record sectors summed over every directory, root included
    pub fn directory_record_sector_count(&self, spec: &VolumeSpec) -> u32 {
        self.directories_with_root()
            .map(|id| self.directory_record_sectors(id, spec))
            .sum()
    }

    /// Bytes of one directory's File Identifier Descriptors, parent entry included
    pub fn file_identifier_len(&self, id: NodeId) -> usize {
        udf::parent_identifier_len()
            + self.nodes[id.0]
                .children
                .iter()
                .map(|&c| udf::named_identifier_len(&self.nodes[c.0].entry.name))
                .sum::<usize>()
    }

    /// Blocks of one directory's File Identifier Descriptors
    pub fn file_identifier_sectors(&self, id: NodeId) -> u32 {
        sectors_for(self.file_identifier_len(id) as u64)
    }

    /// File identifier blocks summed over every directory, root included
    pub fn file_identifier_sector_count(&self) -> u32 {
        self.directories_with_root()
            .map(|id| self.file_identifier_sectors(id))
            .sum()
    }

    /// Bytes of one path table
    pub fn path_table_size(&self) -> usize {
        iso::path_table_entry_len(1)
            + self.nodes[1..]
                .iter()
                .filter(|n| n.is_directory())
                .map(|n| iso::path_table_entry_len(n.entry.name.len()))
                .sum::<usize>()
    }

    fn directories_with_root(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_directory())
            .map(|(i, _)| NodeId(i))
    }
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Check a name can be written as both an ISO9660 and a UDF identifier
pub fn validate_name(name: &str, is_directory: bool) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(DiscError::InvalidFilename(format!("'{}'", name)));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(DiscError::InvalidFilename(format!(
            "{} contains a path separator",
            name
        )));
    }
    if !name.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err(DiscError::InvalidFilename(format!(
            "{} is not printable ASCII",
            name.escape_default()
        )));
    }
    let iso_len = name.len() + if is_directory { 0 } else { 2 };
    if iso_len > iso::MAX_IDENTIFIER_LEN || compressed_len(name) > MAX_FILE_IDENTIFIER_LEN {
        return Err(DiscError::InvalidFilename(format!("{} is too long", name)));
    }
    Ok(())
}
