/// Sector allocation: every region and node placed before any byte is written

use crate::error::{DiscError, Result};
use crate::format::constants::*;
use crate::format::spec::VolumeSpec;
use crate::tree::{FileTree, NodeId};

/// Scalar sizes derived once from the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorBudget {
    /// Directories, root included
    pub directories: u32,
    /// Files
    pub files: u32,
    /// Directory record sectors over all directories
    pub directory_record_sectors: u32,
    /// File Identifier Descriptor blocks over all directories
    pub file_identifier_sectors: u32,
    /// File payload sectors
    pub data_sectors: u32,
    /// Image size in sectors, a multiple of 16
    pub total_sectors: u32,
    /// Zero sectors added before the end-of-session descriptor for alignment
    pub pad_sectors: u32,
    /// Absolute sector of partition block 0
    pub partition_start: u32,
    /// Absolute sector of the first payload sector
    pub data_start: u32,
    /// Bytes of one path table
    pub path_table_size: u32,
}

impl SectorBudget {
    /// Compute region sizes for a tree
    pub fn compute(tree: &FileTree, spec: &VolumeSpec) -> Self {
        let directories = tree.directory_count() + 1;
        let files = tree.file_count();
        let directory_record_sectors = tree.directory_record_sector_count(spec);
        let file_identifier_sectors = tree.file_identifier_sector_count();
        let data_sectors = tree.data_size_in_sectors();

        let partition_start = VOLUME_DESCRIPTOR_SECTORS + directory_record_sectors;
        // File set descriptor and its terminator, then identifiers and entries
        let data_start = partition_start + 2 + file_identifier_sectors + directories + files;
        let unaligned = data_start + data_sectors + 1;
        let total_sectors = align_sectors(unaligned);

        Self {
            directories,
            files,
            directory_record_sectors,
            file_identifier_sectors,
            data_sectors,
            total_sectors,
            pad_sectors: total_sectors - unaligned,
            partition_start,
            data_start,
            path_table_size: tree.path_table_size() as u32,
        }
    }

    /// Length of the UDF partition in blocks
    pub fn partition_len(&self) -> u32 {
        self.total_sectors - self.partition_start
    }

    /// First partition block of the directory File Entries
    pub fn directory_entries_lba(&self) -> u32 {
        FILE_IDENTIFIER_LBA + self.file_identifier_sectors
    }

    /// First partition block of the file File Entries
    pub fn file_entries_lba(&self) -> u32 {
        self.directory_entries_lba() + self.directories
    }

    /// Partition block of the first payload sector
    pub fn data_lba(&self) -> u32 {
        self.data_start - self.partition_start
    }

    /// Absolute sector of the end-of-session descriptor
    pub fn end_of_session_sector(&self) -> u32 {
        self.total_sectors - 1
    }

    /// Image size in bytes
    pub fn total_bytes(&self) -> u64 {
        self.total_sectors as u64 * SECTOR_SIZE as u64
    }
}

/// Placement of one node
///
/// Directories: `global_sector` is the first directory record sector,
/// `local_sector` the first File Identifier block. Files: `global_sector`
/// is the first payload sector, `local_sector` the same sector relative to
/// the partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Absolute sector
    pub global_sector: u32,
    /// Partition block of the node's File Entry
    pub lba: u32,
    /// Partition block of the node's identifiers or payload
    pub local_sector: u32,
    /// Sectors of the directory record block or payload
    pub sectors: u32,
    /// File Entry unique ID
    pub unique_id: u64,
}

/// Kind of a contiguous region of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// Zeroed system area
    SystemArea,
    /// ISO9660 primary volume descriptor and set terminator
    IsoDescriptors,
    /// BEA01, NSR02 and TEA01
    ExtendedArea,
    /// Zeroed reserved sectors
    Reserved,
    /// Main volume descriptor sequence
    MainSequence,
    /// Reserve volume descriptor sequence
    ReserveSequence,
    /// Logical volume integrity descriptor and terminator
    Integrity,
    /// Anchor volume descriptor pointer
    Anchor,
    /// Type L and type M path tables
    PathTables,
    /// ISO9660 directory records
    DirectoryRecords,
    /// File set descriptor and terminator
    FileSet,
    /// UDF File Identifier Descriptors
    FileIdentifiers,
    /// File Entries of directories
    DirectoryEntries,
    /// File Entries of files
    FileEntries,
    /// File payload
    FileData,
    /// Alignment padding
    Padding,
    /// End-of-session anchor
    EndOfSession,
}

impl RegionKind {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            RegionKind::SystemArea => "System area",
            RegionKind::IsoDescriptors => "ISO9660 descriptors",
            RegionKind::ExtendedArea => "Extended area",
            RegionKind::Reserved => "Reserved",
            RegionKind::MainSequence => "Main VDS",
            RegionKind::ReserveSequence => "Reserve VDS",
            RegionKind::Integrity => "Integrity sequence",
            RegionKind::Anchor => "Anchor",
            RegionKind::PathTables => "Path tables",
            RegionKind::DirectoryRecords => "Directory records",
            RegionKind::FileSet => "File set",
            RegionKind::FileIdentifiers => "File identifiers",
            RegionKind::DirectoryEntries => "Directory entries",
            RegionKind::FileEntries => "File entries",
            RegionKind::FileData => "File data",
            RegionKind::Padding => "Padding",
            RegionKind::EndOfSession => "End of session",
        }
    }
}

/// One contiguous region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// What the region holds
    pub kind: RegionKind,
    /// First absolute sector
    pub start: u32,
    /// Length in sectors
    pub sectors: u32,
}

impl Region {
    /// One past the last sector
    pub fn end(&self) -> u32 {
        self.start + self.sectors
    }
}

/// Complete placement of a tree
#[derive(Debug, Clone)]
pub struct Allocation {
    /// Region sizes
    pub budget: SectorBudget,
    /// Directories, root first, in sorted order
    pub directories: Vec<NodeId>,
    /// Files in depth-first sibling order
    pub files: Vec<NodeId>,
    /// Unique ID the integrity descriptor records as next
    pub next_unique_id: u64,
    table: Vec<Option<Location>>,
}

impl Allocation {
    /// Location of a node
    pub fn get(&self, id: NodeId) -> Option<&Location> {
        self.table.get(id.index()).and_then(|l| l.as_ref())
    }

    /// Location of a node known to be in the allocated tree
    ///
    /// Panics on a node from another tree; every node of the allocated tree has an entry.
    pub fn location(&self, id: NodeId) -> &Location {
        match self.get(id) {
            Some(location) => location,
            None => panic!("node {} missing from the allocation table", id.index()),
        }
    }

    /// Contiguous regions in write order, covering the whole image
    pub fn regions(&self) -> Vec<Region> {
        let b = &self.budget;
        let mut regions = Vec::new();
        let mut push = |kind: RegionKind, start: u32, sectors: u32| {
            if sectors > 0 {
                regions.push(Region { kind, start, sectors });
            }
        };
        push(RegionKind::SystemArea, 0, SYSTEM_AREA_SECTORS);
        push(RegionKind::IsoDescriptors, ISO_PVD_SECTOR, 2);
        push(RegionKind::ExtendedArea, ISO_PVD_SECTOR + 2, 3);
        push(
            RegionKind::Reserved,
            ISO_PVD_SECTOR + 5,
            EXTENDED_AREA_RESERVED_SECTORS,
        );
        push(RegionKind::MainSequence, MAIN_VDS_SECTOR, VDS_SECTORS);
        push(RegionKind::ReserveSequence, RESERVE_VDS_SECTOR, VDS_SECTORS);
        push(RegionKind::Integrity, LVID_SECTOR, INTEGRITY_SEQUENCE_SECTORS);
        push(
            RegionKind::Reserved,
            LVID_SECTOR + INTEGRITY_SEQUENCE_SECTORS,
            ANCHOR_RESERVED_SECTORS,
        );
        push(RegionKind::Anchor, ANCHOR_SECTOR, 1);
        push(RegionKind::PathTables, PATH_TABLE_L_SECTOR, 4);
        push(
            RegionKind::DirectoryRecords,
            DIRECTORY_RECORDS_SECTOR,
            b.directory_record_sectors,
        );
        push(RegionKind::FileSet, b.partition_start, 2);
        push(
            RegionKind::FileIdentifiers,
            b.partition_start + FILE_IDENTIFIER_LBA,
            b.file_identifier_sectors,
        );
        push(
            RegionKind::DirectoryEntries,
            b.partition_start + b.directory_entries_lba(),
            b.directories,
        );
        push(
            RegionKind::FileEntries,
            b.partition_start + b.file_entries_lba(),
            b.files,
        );
        push(RegionKind::FileData, b.data_start, b.data_sectors);
        push(
            RegionKind::Padding,
            b.data_start + b.data_sectors,
            b.pad_sectors,
        );
        push(RegionKind::EndOfSession, b.end_of_session_sector(), 1);
        regions
    }
}

/// Place every directory, file and metadata region of a tree
///
/// Fails when a directory's records or identifiers need more sectors than
/// `spec.max_directory_sectors`, or when the path table outgrows its sector.
pub fn allocate(tree: &FileTree, spec: &VolumeSpec) -> Result<Allocation> {
    spec.validate()?;
    let budget = SectorBudget::compute(tree, spec);

    if budget.path_table_size as usize > SECTOR_SIZE {
        return Err(DiscError::overflow(
            "path table",
            sectors_for(budget.path_table_size as u64),
            1,
        ));
    }

    let mut table: Vec<Option<Location>> = vec![None; tree.len() + 1];
    let directories = tree.sorted_directories();
    let files = tree.files();

    let mut record_sector = DIRECTORY_RECORDS_SECTOR;
    let mut identifier_lba = FILE_IDENTIFIER_LBA;
    let mut entry_lba = budget.directory_entries_lba();
    let mut unique_id = FIRST_UNIQUE_ID;

    for &dir in &directories {
        let record_sectors = tree.directory_record_sectors(dir, spec);
        let identifier_sectors = tree.file_identifier_sectors(dir);
        for (what, needed) in [
            ("directory records", record_sectors),
            ("file identifiers", identifier_sectors),
        ] {
            if needed > spec.max_directory_sectors {
                return Err(DiscError::overflow(
                    format!("{} of {}", what, tree.display_path(dir)),
                    needed,
                    spec.max_directory_sectors,
                ));
            }
        }

        let id = if tree.is_root(dir) {
            0
        } else {
            let id = unique_id;
            unique_id += 1;
            id
        };
        table[dir.index()] = Some(Location {
            global_sector: record_sector,
            lba: entry_lba,
            local_sector: identifier_lba,
            sectors: record_sectors,
            unique_id: id,
        });
        record_sector += record_sectors;
        identifier_lba += identifier_sectors;
        entry_lba += 1;
    }

    let mut data_sector = budget.data_start;
    for &file in &files {
        let sectors = sectors_for(tree.node(file).entry.size);
        table[file.index()] = Some(Location {
            global_sector: data_sector,
            lba: entry_lba,
            local_sector: data_sector - budget.partition_start,
            sectors,
            unique_id,
        });
        unique_id += 1;
        entry_lba += 1;
        data_sector += sectors;
    }

    log::info!(
        "Planned {} sectors: {} directories, {} files, partition at {}, data at {}",
        budget.total_sectors,
        budget.directories,
        budget.files,
        budget.partition_start,
        budget.data_start
    );

    Ok(Allocation {
        budget,
        directories,
        files,
        next_unique_id: unique_id,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> FileTree {
        let mut tree = FileTree::new();
        let root = tree.root();
        tree.add_file(root, "SYSTEM.CNF", 16, "SYSTEM.CNF").unwrap();
        let data = tree.add_directory(root, "DATA").unwrap();
        tree.add_file(data, "A.BIN", 5000, "DATA/A.BIN").unwrap();
        tree
    }

    #[test]
    fn test_sample_budget() {
        let tree = sample();
        let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();
        let b = alloc.budget;
        assert_eq!(b.directories, 2);
        assert_eq!(b.files, 2);
        assert_eq!(b.data_sectors, 4);
        assert_eq!(b.directory_record_sectors, 2);
        assert_eq!(b.file_identifier_sectors, 2);
        assert_eq!(b.partition_start, 263);
        // FSD, TD, 2 identifier blocks, 2 directory entries, 2 file entries
        assert_eq!(b.data_start, 263 + 8);
        // 271 + 4 + 1 = 276 -> 288
        assert_eq!(b.total_sectors, 288);
        assert_eq!(b.pad_sectors, 12);
        assert_eq!(b.partition_len(), 25);
        assert_eq!(alloc.next_unique_id, 0x13);
    }

    #[test]
    fn test_sample_locations() {
        let tree = sample();
        let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();

        let root = alloc.location(tree.root());
        assert_eq!(root.global_sector, 261);
        assert_eq!(root.lba, 4);
        assert_eq!(root.local_sector, 2);
        assert_eq!(root.unique_id, 0);

        let data = alloc.location(tree.find("DATA").unwrap());
        assert_eq!(data.global_sector, 262);
        assert_eq!(data.lba, 5);
        assert_eq!(data.local_sector, 3);
        assert_eq!(data.unique_id, 0x10);

        let cnf = alloc.location(tree.find("SYSTEM.CNF").unwrap());
        assert_eq!(cnf.global_sector, 271);
        assert_eq!(cnf.lba, 6);
        assert_eq!(cnf.local_sector, 8);
        assert_eq!(cnf.sectors, 1);
        assert_eq!(cnf.unique_id, 0x11);

        let a = alloc.location(tree.find("DATA/A.BIN").unwrap());
        assert_eq!(a.global_sector, 272);
        assert_eq!(a.lba, 7);
        assert_eq!(a.local_sector, 9);
        assert_eq!(a.sectors, 3);
        assert_eq!(a.unique_id, 0x12);
    }

    #[test]
    fn test_empty_tree_budget() {
        let tree = FileTree::new();
        let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();
        let b = alloc.budget;
        assert_eq!(b.partition_start, 262);
        assert_eq!(b.data_start, 262 + 4);
        assert_eq!(b.data_sectors, 0);
        assert_eq!(b.total_sectors, 272);
        assert_eq!(alloc.directories, vec![tree.root()]);
        assert!(alloc.files.is_empty());
        assert_eq!(alloc.location(tree.root()).sectors, 1);
    }

    #[test]
    fn test_regions_cover_image() {
        let tree = sample();
        let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();
        let regions = alloc.regions();
        let mut cursor = 0;
        for region in &regions {
            assert_eq!(region.start, cursor, "{} starts late", region.kind.name());
            cursor = region.end();
        }
        assert_eq!(cursor, alloc.budget.total_sectors);
    }

    #[test]
    fn test_multi_sector_directory() {
        let mut tree = FileTree::new();
        let root = tree.root();
        for i in 0..60 {
            tree.add_file(root, &format!("FILE{:04}.BIN", i), 10, "x").unwrap();
        }
        let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();
        assert_eq!(alloc.location(root).sectors, 2);
        assert_eq!(alloc.budget.partition_start, 263);
    }

    #[test]
    fn test_directory_overflow_rejected() {
        let mut tree = FileTree::new();
        let root = tree.root();
        for i in 0..60 {
            tree.add_file(root, &format!("FILE{:04}.BIN", i), 10, "x").unwrap();
        }
        let spec = VolumeSpec::default().with_max_directory_sectors(1);
        let err = allocate(&tree, &spec).unwrap_err();
        assert!(matches!(err, DiscError::StructuralOverflow { needed: 2, limit: 1, .. }));
    }

    #[test]
    fn test_path_table_overflow_rejected() {
        let mut tree = FileTree::new();
        let root = tree.root();
        for i in 0..120 {
            tree.add_directory(root, &format!("DIRECTORY{:04}", i)).unwrap();
        }
        let spec = VolumeSpec::default().with_max_directory_sectors(64);
        let err = allocate(&tree, &spec).unwrap_err();
        assert!(matches!(err, DiscError::StructuralOverflow { .. }));
    }

    /// Build a random tree from (parent choice, is_directory, name, size) tuples
    fn build_tree(ops: &[(usize, bool, String, u64)]) -> FileTree {
        let mut tree = FileTree::new();
        let mut dirs = vec![tree.root()];
        for (parent, is_dir, name, size) in ops {
            let parent = dirs[parent % dirs.len()];
            if *is_dir {
                if let Ok(id) = tree.add_directory(parent, name) {
                    dirs.push(id);
                }
            } else {
                let _ = tree.add_file(parent, name, *size, name.as_str());
            }
        }
        tree
    }

    fn ops_strategy() -> impl Strategy<Value = Vec<(usize, bool, String, u64)>> {
        prop::collection::vec(
            (0usize..64, any::<bool>(), "[A-Za-z0-9_]{1,12}", 0u64..20_000),
            0..80,
        )
    }

    proptest! {
        #[test]
        fn prop_total_is_multiple_of_sixteen(ops in ops_strategy()) {
            let tree = build_tree(&ops);
            let alloc = allocate(&tree, &VolumeSpec::default()).unwrap();
            prop_assert_eq!(alloc.budget.total_sectors % SECTOR_ALIGNMENT, 0);
            prop_assert!(alloc.budget.total_sectors > alloc.budget.data_start + alloc.budget.data_sectors);
        }

        #[test]
        fn prop_ranges_are_disjoint(ops in ops_strategy()) {
            let tree = build_tree(&ops);
            let spec = VolumeSpec::default();
            let alloc = allocate(&tree, &spec).unwrap();
            let b = alloc.budget;

            let mut ranges: Vec<(u32, u32)> = Vec::new();
            for &dir in &alloc.directories {
                let loc = alloc.location(dir);
                prop_assert!(loc.sectors as usize * SECTOR_SIZE >= tree.directory_record_block_len(dir));
                ranges.push((loc.global_sector, loc.sectors));
                ranges.push((b.partition_start + loc.local_sector, tree.file_identifier_sectors(dir)));
                ranges.push((b.partition_start + loc.lba, 1));
            }
            for &file in &alloc.files {
                let loc = alloc.location(file);
                prop_assert!(loc.sectors as u64 * SECTOR_SIZE as u64 >= tree.node(file).entry.size);
                prop_assert_eq!(loc.local_sector + b.partition_start, loc.global_sector);
                ranges.push((loc.global_sector, loc.sectors));
                ranges.push((b.partition_start + loc.lba, 1));
            }

            ranges.retain(|&(_, len)| len > 0);
            ranges.sort();
            for pair in ranges.windows(2) {
                prop_assert!(pair[0].0 + pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
            }
            if let Some(last) = ranges.last() {
                prop_assert!(last.0 + last.1 <= b.end_of_session_sector());
            }
            prop_assert!(ranges.first().map_or(true, |r| r.0 >= DIRECTORY_RECORDS_SECTOR));
        }

        #[test]
        fn prop_root_sorts_first_and_dirs_by_depth(ops in ops_strategy()) {
            let tree = build_tree(&ops);
            let sorted = tree.sorted();
            prop_assert_eq!(sorted[0], tree.root());
            for pair in sorted[1..].windows(2) {
                let (a, b) = (tree.node(pair[0]), tree.node(pair[1]));
                prop_assert!(a.depth <= b.depth);
                if a.depth == b.depth {
                    prop_assert!(tree.path(pair[0]) <= tree.path(pair[1]));
                }
            }
        }
    }
}
