/// Disc image writer
///
/// Emits the image strictly in sector order; every cross-reference comes
/// from the precomputed [`Allocation`], so nothing is ever rewritten.

use crate::error::{DiscError, Result};
use crate::format::constants::*;
use crate::format::field::{iso_identifier, zeroed, SectorBytes};
use crate::format::iso::{self, DirectoryRecord, PathTableEntry};
use crate::format::spec::VolumeSpec;
use crate::format::udf::{self, FileEntry, FileIdentifier, IntegrityCounts};
use crate::image::layout::{Allocation, RegionKind};
use crate::progress::{ProgressSink, ProgressState};
use crate::tree::{FileTree, NodeId};
use std::fs::File;
use std::io::{Read, Write};

/// Bytes copied per read while writing file payload
const COPY_CHUNK: usize = 64 * SECTOR_SIZE;

/// Sequential sector writer that tracks its position
pub struct SectorWriter<W: Write> {
    out: W,
    sector: u32,
}

impl<W: Write> SectorWriter<W> {
    /// Wrap an output stream positioned at sector 0
    pub fn new(out: W) -> Self {
        Self { out, sector: 0 }
    }

    /// Absolute sector the next write lands in
    pub fn sector(&self) -> u32 {
        self.sector
    }

    /// Write one full sector
    pub fn write_sector(&mut self, data: &SectorBytes) -> Result<()> {
        self.out.write_all(data)?;
        self.sector += 1;
        Ok(())
    }

    /// Write `count` zeroed sectors
    pub fn write_zeros(&mut self, count: u32) -> Result<()> {
        let zero = zeroed();
        for _ in 0..count {
            self.write_sector(&zero)?;
        }
        Ok(())
    }

    /// Write bytes, zero padding the last sector, and check the sector count
    pub fn write_padded(&mut self, data: &[u8], sectors: u32) -> Result<()> {
        let needed = sectors_for(data.len() as u64);
        if needed > sectors {
            return Err(DiscError::overflow("sector block", needed, sectors));
        }
        self.out.write_all(data)?;
        let padding = sectors as usize * SECTOR_SIZE - data.len();
        if padding > 0 {
            self.out.write_all(&vec![0u8; padding])?;
        }
        self.sector += sectors;
        Ok(())
    }

    /// Flush and return the output stream
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Write a complete image for an allocated tree
pub fn write_image<W: Write>(
    tree: &FileTree,
    spec: &VolumeSpec,
    allocation: &Allocation,
    sink: &dyn ProgressSink,
    out: W,
) -> Result<W> {
    let mut writer = SectorWriter::new(out);
    let image = ImageContext {
        tree,
        spec,
        allocation,
        sink,
    };

    sink.update(ProgressState::WritingSectors, 0.0, None);
    for region in allocation.regions() {
        debug_assert_eq!(writer.sector(), region.start, "{}", region.kind.name());
        log::debug!(
            "{} at sector {} ({} sectors)",
            region.kind.name(),
            region.start,
            region.sectors
        );
        match region.kind {
            RegionKind::SystemArea | RegionKind::Reserved => writer.write_zeros(region.sectors)?,
            RegionKind::IsoDescriptors => image.write_iso_descriptors(&mut writer)?,
            RegionKind::ExtendedArea => {
                for id in [BEA_ID, NSR_ID, TEA_ID] {
                    writer.write_sector(&iso::extended_area_descriptor(id))?;
                }
            }
            RegionKind::MainSequence | RegionKind::ReserveSequence => {
                image.write_volume_sequence(&mut writer, region.start)?
            }
            RegionKind::Integrity => image.write_integrity_sequence(&mut writer)?,
            RegionKind::Anchor | RegionKind::EndOfSession => {
                image.publish_end(region.kind);
                writer.write_sector(&udf::anchor_pointer(region.start))?
            }
            RegionKind::PathTables => image.write_path_tables(&mut writer)?,
            RegionKind::DirectoryRecords => image.write_directory_records(&mut writer)?,
            RegionKind::FileSet => {
                let root = allocation.location(tree.root());
                writer.write_sector(&udf::file_set_descriptor(spec, root.lba))?;
                writer.write_sector(&udf::terminating_descriptor(FILE_SET_DESCRIPTOR_LBA + 1))?;
            }
            RegionKind::FileIdentifiers => image.write_file_identifiers(&mut writer)?,
            RegionKind::DirectoryEntries => image.write_directory_entries(&mut writer)?,
            RegionKind::FileEntries => image.write_file_entries(&mut writer)?,
            RegionKind::FileData => image.write_file_data(&mut writer)?,
            RegionKind::Padding => {
                image.publish_end(region.kind);
                writer.write_zeros(region.sectors)?
            }
        }
    }

    writer.finish()
}

/// Everything the region writers read
struct ImageContext<'a> {
    tree: &'a FileTree,
    spec: &'a VolumeSpec,
    allocation: &'a Allocation,
    sink: &'a dyn ProgressSink,
}

impl ImageContext<'_> {
    fn fraction(&self, sector: u32) -> f32 {
        sector as f32 / self.allocation.budget.total_sectors as f32
    }

    fn publish_end(&self, kind: RegionKind) {
        // Trailing sectors start at the padding, or at the end-of-session
        // descriptor when there is none; the anchor at 256 is not trailing.
        if kind == RegionKind::Anchor {
            return;
        }
        let start = self.allocation.budget.data_start + self.allocation.budget.data_sectors;
        self.sink
            .update(ProgressState::WritingEnd, self.fraction(start), None);
    }

    fn root_data_length(&self) -> u32 {
        self.allocation.location(self.tree.root()).sectors * SECTOR_SIZE_U32
    }

    fn write_iso_descriptors<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        let budget = &self.allocation.budget;
        writer.write_sector(&iso::primary_volume_descriptor(
            self.spec,
            budget.total_sectors,
            budget.path_table_size,
            self.root_data_length(),
        ))?;
        writer.write_sector(&iso::set_terminator())
    }

    fn write_volume_sequence<W: Write>(&self, writer: &mut SectorWriter<W>, start: u32) -> Result<()> {
        let budget = &self.allocation.budget;
        writer.write_sector(&udf::primary_volume_descriptor(self.spec, start, 0))?;
        writer.write_sector(&udf::implementation_use_descriptor(self.spec, start + 1, 1))?;
        writer.write_sector(&udf::partition_descriptor(
            start + 2,
            2,
            budget.partition_start,
            budget.partition_len(),
        ))?;
        writer.write_sector(&udf::logical_volume_descriptor(self.spec, start + 3, 3))?;
        writer.write_sector(&udf::unallocated_space_descriptor(start + 4, 4))?;
        writer.write_sector(&udf::terminating_descriptor(start + 5))?;
        writer.write_zeros(VDS_RESERVED_SECTORS)
    }

    fn write_integrity_sequence<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        let budget = &self.allocation.budget;
        let counts = IntegrityCounts {
            files: budget.files,
            directories: budget.directories,
            next_unique_id: self.allocation.next_unique_id,
            partition_len: budget.partition_len(),
        };
        writer.write_sector(&udf::logical_volume_integrity_descriptor(LVID_SECTOR, &counts))?;
        writer.write_sector(&udf::terminating_descriptor(LVID_SECTOR + 1))
    }

    /// Path table entries in sorted directory order
    fn path_table(&self) -> Vec<PathTableEntry> {
        let dirs = &self.allocation.directories;
        dirs.iter()
            .map(|&dir| {
                let node = self.tree.node(dir);
                let parent = node.parent.unwrap_or(dir);
                // Parents sort before their children, so the index is always found
                let parent_index = dirs.iter().position(|&d| d == parent).unwrap_or(0);
                let identifier = if self.tree.is_root(dir) {
                    vec![0]
                } else {
                    iso_identifier(node.name()).into_bytes()
                };
                PathTableEntry {
                    identifier,
                    extent: self.allocation.location(dir).global_sector,
                    parent: (parent_index + 1) as u16,
                }
            })
            .collect()
    }

    fn write_path_tables<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        let entries = self.path_table();
        for big_endian in [false, true] {
            let mut table = Vec::with_capacity(self.allocation.budget.path_table_size as usize);
            for entry in &entries {
                entry.encode(&mut table, big_endian);
            }
            writer.write_padded(&table, 1)?;
            writer.write_padded(&table, 1)?;
        }
        Ok(())
    }

    /// Directory records of one directory, packed so none straddles a sector
    fn directory_records(&self, dir: NodeId) -> Vec<u8> {
        let location = self.allocation.location(dir);
        let parent = self.tree.node(dir).parent.unwrap_or(dir);
        let parent_location = self.allocation.location(parent);

        let mut records = vec![
            DirectoryRecord::current(location.global_sector, location.sectors * SECTOR_SIZE_U32),
            DirectoryRecord::parent(
                parent_location.global_sector,
                parent_location.sectors * SECTOR_SIZE_U32,
            ),
        ];
        for child in self.tree.ordered_children(dir, self.spec) {
            let node = self.tree.node(child);
            let child_location = self.allocation.location(child);
            let length = if node.is_directory() {
                child_location.sectors * SECTOR_SIZE_U32
            } else {
                node.entry.size as u32
            };
            records.push(DirectoryRecord::entry(
                node.name(),
                node.is_directory(),
                child_location.global_sector,
                length,
            ));
        }

        let mut block = Vec::with_capacity(location.sectors as usize * SECTOR_SIZE);
        for record in &records {
            let used = block.len() % SECTOR_SIZE;
            if used + record.len() > SECTOR_SIZE {
                block.resize(block.len() + SECTOR_SIZE - used, 0);
            }
            record.encode(&mut block);
        }
        block
    }

    fn write_directory_records<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        for &dir in &self.allocation.directories {
            let location = self.allocation.location(dir);
            debug_assert_eq!(writer.sector(), location.global_sector);
            let block = self.directory_records(dir);
            writer.write_padded(&block, location.sectors)?;
        }
        Ok(())
    }

    /// File Identifier Descriptors of one directory
    fn file_identifiers(&self, dir: NodeId) -> Vec<u8> {
        let location = self.allocation.location(dir);
        let parent = self.tree.node(dir).parent.unwrap_or(dir);

        let mut identifiers = vec![FileIdentifier::parent(self.allocation.location(parent).lba)];
        for child in self.tree.ordered_children(dir, self.spec) {
            let node = self.tree.node(child);
            identifiers.push(FileIdentifier::entry(
                node.name(),
                node.is_directory(),
                self.allocation.location(child).lba,
            ));
        }

        let mut block = Vec::with_capacity(self.tree.file_identifier_len(dir));
        for fid in &identifiers {
            // Tag location is the block the descriptor starts in
            let block_offset = (block.len() / SECTOR_SIZE) as u32;
            fid.encode(&mut block, location.local_sector + block_offset);
        }
        block
    }

    fn write_file_identifiers<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        for &dir in &self.allocation.directories {
            let block = self.file_identifiers(dir);
            writer.write_padded(&block, self.tree.file_identifier_sectors(dir))?;
        }
        Ok(())
    }

    fn write_directory_entries<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        for &dir in &self.allocation.directories {
            let location = self.allocation.location(dir);
            let entry = FileEntry {
                lba: location.lba,
                file_type: udf::FILE_TYPE_DIRECTORY,
                link_count: self.tree.directory_link_count(dir),
                info_len: self.tree.file_identifier_len(dir) as u64,
                unique_id: location.unique_id,
                data_lba: location.local_sector,
            };
            writer.write_sector(&entry.encode())?;
        }
        Ok(())
    }

    fn write_file_entries<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        for &file in &self.allocation.files {
            let location = self.allocation.location(file);
            let node = self.tree.node(file);
            let entry = FileEntry {
                lba: location.lba,
                file_type: udf::FILE_TYPE_FILE,
                link_count: 1,
                info_len: node.entry.size,
                unique_id: location.unique_id,
                data_lba: location.local_sector,
            };
            if entry.extents().len() > udf::MAX_ALLOCATION_DESCRIPTORS {
                return Err(DiscError::FileTooLarge {
                    name: node.name().to_string(),
                    size: node.entry.size,
                });
            }
            writer.write_sector(&entry.encode())?;
        }
        Ok(())
    }

    fn write_file_data<W: Write>(&self, writer: &mut SectorWriter<W>) -> Result<()> {
        let mut buffer = vec![0u8; COPY_CHUNK];
        for &file in &self.allocation.files {
            let location = self.allocation.location(file);
            let node = self.tree.node(file);
            self.sink.update(
                ProgressState::WritingFiles,
                self.fraction(location.global_sector),
                Some(node.name()),
            );
            log::debug!(
                "Writing {} ({} bytes) at sector {}",
                self.tree.display_path(file),
                node.entry.size,
                location.global_sector
            );
            debug_assert_eq!(writer.sector(), location.global_sector);
            copy_payload(writer, &node.entry.source_path, node.entry.size, &mut buffer)?;
        }
        Ok(())
    }
}

/// Copy exactly `size` bytes of a source file, zero padding the last sector
fn copy_payload<W: Write>(
    writer: &mut SectorWriter<W>,
    path: &std::path::Path,
    size: u64,
    buffer: &mut [u8],
) -> Result<()> {
    let sectors = sectors_for(size);
    if sectors == 0 {
        return Ok(());
    }

    let mut file = File::open(path)?;
    let mut remaining = size;
    while remaining > 0 {
        let want = remaining.min(buffer.len() as u64) as usize;
        let mut filled = 0;
        while filled < want {
            let n = file.read(&mut buffer[filled..want])?;
            if n == 0 {
                return Err(DiscError::SizeMismatch {
                    path: path.to_path_buf(),
                    expected: size,
                });
            }
            filled += n;
        }
        remaining -= want as u64;
        let chunk_sectors = sectors_for(want as u64);
        writer.write_padded(&buffer[..want], chunk_sectors)?;
    }
    Ok(())
}
