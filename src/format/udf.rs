/// UDF (ECMA-167) descriptors as written on PS2 discs

use crate::checksum::{compress_unicode, compressed_len, crc16, tag_checksum, TAG_CHECKSUM_OFFSET};
use crate::format::constants::*;
use crate::format::field::*;
use crate::format::spec::VolumeSpec;

/// Size of a descriptor tag
pub const TAG_SIZE: usize = 16;

/// Descriptor version for NSR02 volumes
pub const DESCRIPTOR_VERSION: u16 = 2;

/// CRC length used by sector-sized descriptors (the whole sector after the tag)
pub const SECTOR_CRC_LEN: usize = SECTOR_SIZE - TAG_SIZE;

/// Tag identifiers
pub mod tag {
    /// Primary Volume Descriptor
    pub const PRIMARY_VOLUME: u16 = 1;
    /// Anchor Volume Descriptor Pointer
    pub const ANCHOR_POINTER: u16 = 2;
    /// Implementation Use Volume Descriptor
    pub const IMPLEMENTATION_USE: u16 = 4;
    /// Partition Descriptor
    pub const PARTITION: u16 = 5;
    /// Logical Volume Descriptor
    pub const LOGICAL_VOLUME: u16 = 6;
    /// Unallocated Space Descriptor
    pub const UNALLOCATED_SPACE: u16 = 7;
    /// Terminating Descriptor
    pub const TERMINATING: u16 = 8;
    /// Logical Volume Integrity Descriptor
    pub const LOGICAL_VOLUME_INTEGRITY: u16 = 9;
    /// File Set Descriptor
    pub const FILE_SET: u16 = 0x100;
    /// File Identifier Descriptor
    pub const FILE_IDENTIFIER: u16 = 0x101;
    /// File Entry
    pub const FILE_ENTRY: u16 = 0x105;
    /// Extended Attribute Header Descriptor
    pub const EXTENDED_ATTRIBUTE_HEADER: u16 = 0x106;
}

/// Fixed length of a File Identifier Descriptor before its identifier
pub const FILE_IDENTIFIER_HEADER: usize = 38;

/// File characteristics: entry is a directory
pub const CHAR_DIRECTORY: u8 = 0x02;

/// File characteristics: entry refers to the parent directory
pub const CHAR_PARENT: u8 = 0x08;

/// ICB file type of a directory
pub const FILE_TYPE_DIRECTORY: u8 = 4;

/// ICB file type of a regular file
pub const FILE_TYPE_FILE: u8 = 5;

/// Permissions of every entry: read and execute for owner, group and others
pub const PERMISSIONS: u32 = 0x14A5;

/// Unset UID/GID
pub const ID_UNSET: u32 = 0xFFFF_FFFF;

/// Largest extent a short allocation descriptor can describe, block aligned
pub const MAX_EXTENT_LEN: u32 = 0x3FFF_F800;

/// Offset of the extended attributes inside a File Entry
const FILE_ENTRY_EA_OFFSET: usize = 176;

/// Length of the Extended Attribute Header Descriptor
const EA_HEADER_LEN: usize = 24;

/// Implementation Use EA "*UDF FreeEASpace" with its header checksum
pub const FREE_EA_SPACE: [u8; 52] = [
    0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x34, 0x00, 0x00, 0x00,
    0x04, 0x00, 0x00, 0x00, 0x00, 0x2A, 0x55, 0x44, 0x46, 0x20, 0x46, 0x72,
    0x65, 0x65, 0x45, 0x41, 0x53, 0x70, 0x61, 0x63, 0x65, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x61, 0x05, 0x00, 0x00,
];

/// Implementation Use EA "*UDF DVD CGMS Info" with its header checksum
pub const CGMS_INFO: [u8; 56] = [
    0x00, 0x08, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x38, 0x00, 0x00, 0x00,
    0x08, 0x00, 0x00, 0x00, 0x00, 0x2A, 0x55, 0x44, 0x46, 0x20, 0x44, 0x56,
    0x44, 0x20, 0x43, 0x47, 0x4D, 0x53, 0x20, 0x49, 0x6E, 0x66, 0x6F, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Total length of the extended attributes in every File Entry
pub const EXTENDED_ATTRIBUTES_LEN: usize = EA_HEADER_LEN + FREE_EA_SPACE.len() + CGMS_INFO.len();

/// Fill in a descriptor tag and both checksums
///
/// `buf` starts at the tag. The location is set before the CRC is computed.
pub fn seal(buf: &mut [u8], identifier: u16, location: u32, crc_len: usize) {
    put_u16(buf, 0, identifier);
    put_u16(buf, 2, DESCRIPTOR_VERSION);
    buf[TAG_CHECKSUM_OFFSET] = 0;
    buf[5] = 0;
    put_u16(buf, 6, 0); // serial number
    put_u16(buf, 10, crc_len as u16);
    put_u32(buf, 12, location);
    let crc = crc16(&buf[TAG_SIZE..TAG_SIZE + crc_len]);
    put_u16(buf, 8, crc);
    buf[TAG_CHECKSUM_OFFSET] = tag_checksum(&buf[..TAG_SIZE]);
}

/// Recompute both checksums of a sealed descriptor and compare them to the stored values
pub fn verify_tag(buf: &[u8]) -> bool {
    if buf.len() < TAG_SIZE {
        return false;
    }
    let crc_len = u16::from_le_bytes([buf[10], buf[11]]) as usize;
    if buf.len() < TAG_SIZE + crc_len {
        return false;
    }
    let stored_crc = u16::from_le_bytes([buf[8], buf[9]]);
    stored_crc == crc16(&buf[TAG_SIZE..TAG_SIZE + crc_len])
        && buf[TAG_CHECKSUM_OFFSET] == tag_checksum(&buf[..TAG_SIZE])
}

/// Tag identifier of a descriptor
pub fn tag_identifier(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}

/// Tag location of a descriptor
pub fn tag_location(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]])
}

fn udf_suffix() -> [u8; 2] {
    UDF_SUFFIX_REVISION.to_le_bytes()
}

/// Build the UDF Primary Volume Descriptor
pub fn primary_volume_descriptor(spec: &VolumeSpec, location: u32, sequence: u32) -> SectorBytes {
    let mut s = zeroed();
    put_u32(&mut s, 16, sequence);
    put_u32(&mut s, 20, 0); // primary volume descriptor number
    put_dstring(&mut s, 24, 32, &spec.volume_identifier);
    put_u16(&mut s, 56, 1); // volume sequence number
    put_u16(&mut s, 58, 1);
    put_u16(&mut s, 60, 2); // interchange level
    put_u16(&mut s, 62, 2);
    put_u32(&mut s, 64, 1); // character set list
    put_u32(&mut s, 68, 1);

    // Volume set identifier: encoded date, space run, used length in the last byte
    let set = &mut s[72..200];
    set[0] = DSTRING_COMPRESSION_ID;
    let date = VOLUME_SET_DATE.as_bytes();
    set[1..1 + date.len()].copy_from_slice(date);
    set[1 + date.len()..VOLUME_SET_USED_LEN as usize].fill(b' ');
    set[127] = VOLUME_SET_USED_LEN;

    put_charspec(&mut s, 200);
    put_charspec(&mut s, 264);
    // volume abstract and copyright extents stay zero
    s[344] = 0;
    put_padded(&mut s, 345, 23, &spec.system_identifier, b' ');
    s[376..388].copy_from_slice(&UDF_RECORDING_TIME.udf());
    put_entity_id(&mut s, 388, IMPLEMENTATION_ID, &[]);

    seal(&mut s, tag::PRIMARY_VOLUME, location, SECTOR_CRC_LEN);
    s
}

/// Build the Implementation Use Volume Descriptor carrying the logical volume info
pub fn implementation_use_descriptor(spec: &VolumeSpec, location: u32, sequence: u32) -> SectorBytes {
    let mut s = zeroed();
    put_u32(&mut s, 16, sequence);
    put_entity_id(&mut s, 20, LV_INFO_ID, &[]);
    put_charspec(&mut s, 52);
    put_dstring(&mut s, 116, 128, &spec.volume_identifier);
    for offset in [244, 280, 316] {
        // Empty d-string: compression ID only
        s[offset] = DSTRING_COMPRESSION_ID;
        s[offset + 35] = 1;
    }
    put_entity_id(&mut s, 352, IMPLEMENTATION_ID, &[]);

    seal(&mut s, tag::IMPLEMENTATION_USE, location, SECTOR_CRC_LEN);
    s
}

/// Build the Partition Descriptor
pub fn partition_descriptor(
    location: u32,
    sequence: u32,
    partition_start: u32,
    partition_len: u32,
) -> SectorBytes {
    let mut s = zeroed();
    put_u32(&mut s, 16, sequence);
    put_u16(&mut s, 20, 1); // allocated
    put_u16(&mut s, 22, 0); // partition number
    put_entity_id(&mut s, 24, PARTITION_CONTENTS_ID, &[]);
    put_u32(&mut s, 184, 1); // read-only access
    put_u32(&mut s, 188, partition_start);
    put_u32(&mut s, 192, partition_len);
    put_entity_id(&mut s, 196, IMPLEMENTATION_ID, &[]);

    seal(&mut s, tag::PARTITION, location, SECTOR_CRC_LEN);
    s
}

/// Build the Logical Volume Descriptor
pub fn logical_volume_descriptor(spec: &VolumeSpec, location: u32, sequence: u32) -> SectorBytes {
    let mut s = zeroed();
    put_u32(&mut s, 16, sequence);
    put_charspec(&mut s, 20);
    put_dstring(&mut s, 84, 128, &spec.volume_identifier);
    put_u32(&mut s, 212, SECTOR_SIZE_U32);
    let suffix = udf_suffix();
    put_entity_id(&mut s, 216, DOMAIN_ID, &[suffix[0], suffix[1], 0x03]);
    // Logical volume contents use: where the file set descriptor lives
    put_long_ad(&mut s, 248, SECTOR_SIZE_U32, FILE_SET_DESCRIPTOR_LBA);
    put_u32(&mut s, 264, 6); // map table length
    put_u32(&mut s, 268, 1); // partition maps
    put_entity_id(&mut s, 272, IMPLEMENTATION_ID, &[]);
    put_extent(
        &mut s,
        432,
        INTEGRITY_SEQUENCE_SECTORS * SECTOR_SIZE_U32,
        LVID_SECTOR,
    );
    // Type 1 partition map
    s[440] = 1;
    s[441] = 6;
    put_u16(&mut s, 442, 1);
    put_u16(&mut s, 444, 0);

    seal(&mut s, tag::LOGICAL_VOLUME, location, SECTOR_CRC_LEN);
    s
}

/// Build the Unallocated Space Descriptor (no free extents)
pub fn unallocated_space_descriptor(location: u32, sequence: u32) -> SectorBytes {
    let mut s = zeroed();
    put_u32(&mut s, 16, sequence);
    put_u32(&mut s, 20, 0);
    seal(&mut s, tag::UNALLOCATED_SPACE, location, SECTOR_CRC_LEN);
    s
}

/// Build a Terminating Descriptor
pub fn terminating_descriptor(location: u32) -> SectorBytes {
    let mut s = zeroed();
    seal(&mut s, tag::TERMINATING, location, SECTOR_CRC_LEN);
    s
}

/// Counters recorded in the Logical Volume Integrity Descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrityCounts {
    /// Number of files
    pub files: u32,
    /// Number of directories, root included
    pub directories: u32,
    /// Next unused File Entry unique ID
    pub next_unique_id: u64,
    /// Partition length in blocks
    pub partition_len: u32,
}

/// Build the Logical Volume Integrity Descriptor
pub fn logical_volume_integrity_descriptor(location: u32, counts: &IntegrityCounts) -> SectorBytes {
    let mut s = zeroed();
    s[16..28].copy_from_slice(&UDF_RECORDING_TIME.udf());
    put_u32(&mut s, 28, 1); // close integrity
    put_extent(&mut s, 32, 0, 0);
    put_u64(&mut s, 40, counts.next_unique_id);
    put_u32(&mut s, 72, 1); // partitions
    put_u32(&mut s, 76, 46); // implementation use length
    put_u32(&mut s, 80, 0); // free space
    put_u32(&mut s, 84, counts.partition_len);
    put_entity_id(&mut s, 88, IMPLEMENTATION_ID, &[]);
    put_u32(&mut s, 120, counts.files);
    put_u32(&mut s, 124, counts.directories);
    put_u16(&mut s, 128, UDF_REVISION);
    put_u16(&mut s, 130, UDF_REVISION);
    put_u16(&mut s, 132, UDF_REVISION);

    seal(&mut s, tag::LOGICAL_VOLUME_INTEGRITY, location, SECTOR_CRC_LEN);
    s
}

/// Build an Anchor Volume Descriptor Pointer (also the end-of-session descriptor)
pub fn anchor_pointer(location: u32) -> SectorBytes {
    let mut s = zeroed();
    let vds_len = VDS_SECTORS * SECTOR_SIZE_U32;
    put_extent(&mut s, 16, vds_len, MAIN_VDS_SECTOR);
    put_extent(&mut s, 24, vds_len, RESERVE_VDS_SECTOR);
    seal(&mut s, tag::ANCHOR_POINTER, location, SECTOR_CRC_LEN);
    s
}

/// Build the File Set Descriptor at partition block 0
pub fn file_set_descriptor(spec: &VolumeSpec, root_entry_lba: u32) -> SectorBytes {
    let mut s = zeroed();
    s[16..28].copy_from_slice(&UDF_RECORDING_TIME.udf());
    put_u16(&mut s, 28, 3); // interchange level
    put_u16(&mut s, 30, 3);
    put_u32(&mut s, 32, 1); // character set list
    put_u32(&mut s, 36, 1);
    put_u32(&mut s, 40, 0); // file set number
    put_u32(&mut s, 44, 0); // file set descriptor number
    put_charspec(&mut s, 48);
    put_dstring(&mut s, 112, 128, &spec.volume_identifier);
    put_charspec(&mut s, 240);
    put_dstring(&mut s, 304, 32, &spec.volume_identifier);
    put_long_ad(&mut s, 400, SECTOR_SIZE_U32, root_entry_lba);
    let suffix = udf_suffix();
    put_entity_id(&mut s, 416, DOMAIN_ID, &[suffix[0], suffix[1], 0x03]);

    seal(&mut s, tag::FILE_SET, FILE_SET_DESCRIPTOR_LBA, SECTOR_CRC_LEN);
    s
}

/// Length of a File Identifier Descriptor, padded to a multiple of four
#[inline]
pub fn file_identifier_len(identifier_len: usize) -> usize {
    (FILE_IDENTIFIER_HEADER + identifier_len).div_ceil(4) * 4
}

/// Length of the File Identifier Descriptor naming `name`
#[inline]
pub fn named_identifier_len(name: &str) -> usize {
    file_identifier_len(compressed_len(name))
}

/// Length of the parent (or root self-reference) File Identifier Descriptor
#[inline]
pub fn parent_identifier_len() -> usize {
    file_identifier_len(0)
}

/// One File Identifier Descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier {
    /// File characteristics flags
    pub characteristics: u8,
    /// Partition block of the referenced File Entry
    pub icb_lba: u32,
    /// Compressed identifier (empty for the parent entry)
    pub identifier: Vec<u8>,
}

impl FileIdentifier {
    /// Entry referencing the parent directory
    pub fn parent(icb_lba: u32) -> Self {
        Self {
            characteristics: CHAR_DIRECTORY | CHAR_PARENT,
            icb_lba,
            identifier: Vec::new(),
        }
    }

    /// Entry naming a child
    pub fn entry(name: &str, is_directory: bool, icb_lba: u32) -> Self {
        Self {
            characteristics: if is_directory { CHAR_DIRECTORY } else { 0 },
            icb_lba,
            identifier: compress_unicode(name),
        }
    }

    /// Encoded length including padding
    pub(crate) fn len(&self) -> usize {
        file_identifier_len(self.identifier.len())
    }

    /// Append the sealed descriptor; `location` is the block it starts in
    pub fn encode(&self, out: &mut Vec<u8>, location: u32) {
        let start = out.len();
        out.resize(start + self.len(), 0);
        let fid = &mut out[start..];

        put_u16(fid, 16, 1); // file version number
        fid[18] = self.characteristics;
        fid[19] = self.identifier.len() as u8;
        put_long_ad(fid, 20, SECTOR_SIZE_U32, self.icb_lba);
        put_u16(fid, 36, 0); // implementation use length
        let id_end = FILE_IDENTIFIER_HEADER + self.identifier.len();
        fid[FILE_IDENTIFIER_HEADER..id_end].copy_from_slice(&self.identifier);

        let crc_len = fid.len() - TAG_SIZE;
        seal(fid, tag::FILE_IDENTIFIER, location, crc_len);
    }
}

/// A File Entry for a directory or file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Partition block of this entry
    pub lba: u32,
    /// ICB file type
    pub file_type: u8,
    /// Hard link count
    pub link_count: u16,
    /// Information length in bytes
    pub info_len: u64,
    /// Unique ID
    pub unique_id: u64,
    /// First partition block of the described data
    pub data_lba: u32,
}

impl FileEntry {
    /// Short allocation descriptors covering the data, split at the extent limit
    pub fn extents(&self) -> Vec<(u32, u32)> {
        let mut extents = Vec::new();
        let mut remaining = self.info_len;
        let mut block = self.data_lba;
        while remaining > 0 {
            let len = remaining.min(MAX_EXTENT_LEN as u64) as u32;
            extents.push((len, block));
            remaining -= len as u64;
            block += len / SECTOR_SIZE_U32;
        }
        extents
    }

    /// Build the sealed sector
    pub fn encode(&self) -> SectorBytes {
        let mut s = zeroed();

        // ICB tag
        put_u32(&mut s, 16, 0);
        put_u16(&mut s, 20, 4); // strategy type
        put_u16(&mut s, 24, 1); // maximum entries
        s[27] = self.file_type;
        put_u16(&mut s, 34, 0); // short allocation descriptors

        put_u32(&mut s, 36, ID_UNSET);
        put_u32(&mut s, 40, ID_UNSET);
        put_u32(&mut s, 44, PERMISSIONS);
        put_u16(&mut s, 48, self.link_count);
        put_u64(&mut s, 56, self.info_len);
        put_u64(&mut s, 64, self.info_len.div_ceil(SECTOR_SIZE as u64));
        let time = UDF_RECORDING_TIME.udf();
        s[72..84].copy_from_slice(&time);
        s[84..96].copy_from_slice(&time);
        s[96..108].copy_from_slice(&time);
        put_u32(&mut s, 108, 1); // checkpoint
        put_entity_id(&mut s, 128, IMPLEMENTATION_ID, &[]);
        put_u64(&mut s, 160, self.unique_id);

        let extents = self.extents();
        put_u32(&mut s, 168, EXTENDED_ATTRIBUTES_LEN as u32);
        put_u32(&mut s, 172, (extents.len() * 8) as u32);

        let ea = FILE_ENTRY_EA_OFFSET;
        put_u32(&mut s, ea + 16, EA_HEADER_LEN as u32);
        put_u32(&mut s, ea + 20, EXTENDED_ATTRIBUTES_LEN as u32);
        seal(
            &mut s[ea..],
            tag::EXTENDED_ATTRIBUTE_HEADER,
            self.lba,
            EA_HEADER_LEN - TAG_SIZE,
        );
        let free = ea + EA_HEADER_LEN;
        s[free..free + FREE_EA_SPACE.len()].copy_from_slice(&FREE_EA_SPACE);
        let cgms = free + FREE_EA_SPACE.len();
        s[cgms..cgms + CGMS_INFO.len()].copy_from_slice(&CGMS_INFO);

        let mut ad = ea + EXTENDED_ATTRIBUTES_LEN;
        for (len, block) in extents {
            put_u32(&mut s, ad, len);
            put_u32(&mut s, ad + 4, block);
            ad += 8;
        }

        seal(&mut s, tag::FILE_ENTRY, self.lba, SECTOR_CRC_LEN);
        s
    }
}

/// Most allocation descriptors a File Entry sector can hold
pub const MAX_ALLOCATION_DESCRIPTORS: usize =
    (SECTOR_SIZE - FILE_ENTRY_EA_OFFSET - EXTENDED_ATTRIBUTES_LEN) / 8;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ea_header_checksum;

    #[test]
    fn test_ea_blobs_carry_valid_checksums() {
        assert_eq!(
            u16::from_le_bytes([FREE_EA_SPACE[48], FREE_EA_SPACE[49]]),
            ea_header_checksum(&FREE_EA_SPACE)
        );
        assert_eq!(
            u16::from_le_bytes([CGMS_INFO[48], CGMS_INFO[49]]),
            ea_header_checksum(&CGMS_INFO)
        );
        assert_eq!(&FREE_EA_SPACE[17..33], b"*UDF FreeEASpace");
        assert_eq!(&CGMS_INFO[17..35], b"*UDF DVD CGMS Info");
        assert_eq!(EXTENDED_ATTRIBUTES_LEN, 132);
    }

    #[test]
    fn test_seal_and_verify() {
        let mut s = zeroed();
        s[100] = 0x42;
        seal(&mut s, tag::TERMINATING, 65, SECTOR_CRC_LEN);
        assert!(verify_tag(&s));
        assert_eq!(tag_identifier(&s), 8);
        assert_eq!(tag_location(&s), 65);

        s[100] = 0x43;
        assert!(!verify_tag(&s));
    }

    #[test]
    fn test_every_volume_descriptor_verifies() {
        let spec = VolumeSpec::new("CRASH");
        let counts = IntegrityCounts {
            files: 2,
            directories: 2,
            next_unique_id: 0x12,
            partition_len: 40,
        };
        let sectors = [
            primary_volume_descriptor(&spec, 32, 0),
            implementation_use_descriptor(&spec, 33, 1),
            partition_descriptor(34, 2, 263, 57),
            logical_volume_descriptor(&spec, 35, 3),
            unallocated_space_descriptor(36, 4),
            terminating_descriptor(37),
            logical_volume_integrity_descriptor(64, &counts),
            anchor_pointer(256),
            file_set_descriptor(&spec, 4),
        ];
        for s in &sectors {
            assert!(verify_tag(s), "tag {} failed", tag_identifier(s));
        }
        assert_eq!(tag_location(&sectors[0]), 32);
        assert_eq!(tag_location(&sectors[8]), 0);
    }

    #[test]
    fn test_primary_volume_identifiers() {
        let s = primary_volume_descriptor(&VolumeSpec::new("CRASH"), 32, 0);
        assert_eq!(s[24], 8);
        assert_eq!(&s[25..30], b"CRASH");
        assert_eq!(s[55], 6);
        assert_eq!(s[72], 8);
        assert_eq!(&s[73..85], b"=0<58115SCEI");
        assert_eq!(s[85], b' ');
        assert_eq!(s[120], b' ');
        assert_eq!(s[121], 0);
        assert_eq!(s[199], 0x31);
        assert_eq!(&s[201..224], b"OSTA Compressed Unicode");
        assert_eq!(&s[389..406], b"DVD-ROM GENERATOR");
        // Recording time 2004-09-03 07:33:47, type/zone 0x121C
        assert_eq!(&s[376..385], &[0x1C, 0x12, 0xD4, 0x07, 9, 3, 7, 33, 47]);
    }

    #[test]
    fn test_integrity_revision_constant() {
        let counts = IntegrityCounts {
            files: 7,
            directories: 3,
            next_unique_id: 0x19,
            partition_len: 100,
        };
        let s = logical_volume_integrity_descriptor(64, &counts);
        assert_eq!(u32::from_le_bytes([s[120], s[121], s[122], s[123]]), 7);
        assert_eq!(u32::from_le_bytes([s[124], s[125], s[126], s[127]]), 3);
        for offset in [128, 130, 132] {
            assert_eq!(u16::from_le_bytes([s[offset], s[offset + 1]]), 258);
        }
    }

    #[test]
    fn test_anchor_extents() {
        let s = anchor_pointer(256);
        assert_eq!(u32::from_le_bytes([s[16], s[17], s[18], s[19]]), 0x8000);
        assert_eq!(u32::from_le_bytes([s[20], s[21], s[22], s[23]]), 32);
        assert_eq!(u32::from_le_bytes([s[28], s[29], s[30], s[31]]), 48);
    }

    #[test]
    fn test_file_identifier_lengths() {
        assert_eq!(parent_identifier_len(), 40);
        // "A.BIN": 38 + 6 = 44
        assert_eq!(named_identifier_len("A.BIN"), 44);
        // "SYSTEM.CNF": 38 + 11 = 49 -> 52
        assert_eq!(named_identifier_len("SYSTEM.CNF"), 52);
    }

    #[test]
    fn test_file_identifier_encoding() {
        let mut out = Vec::new();
        FileIdentifier::parent(5).encode(&mut out, 2);
        FileIdentifier::entry("A.BIN", false, 7).encode(&mut out, 2);
        assert_eq!(out.len(), 84);

        let parent = &out[..40];
        assert!(verify_tag(parent));
        assert_eq!(parent[18], CHAR_DIRECTORY | CHAR_PARENT);
        assert_eq!(parent[19], 0);
        assert_eq!(u16::from_le_bytes([parent[10], parent[11]]), 24);

        let child = &out[40..];
        assert!(verify_tag(child));
        assert_eq!(child[18], 0);
        assert_eq!(child[19], 6);
        assert_eq!(u32::from_le_bytes([child[24], child[25], child[26], child[27]]), 7);
        assert_eq!(&child[38..44], &[8, b'A', b'.', b'B', b'I', b'N']);
    }

    #[test]
    fn test_file_entry_layout() {
        let entry = FileEntry {
            lba: 9,
            file_type: FILE_TYPE_FILE,
            link_count: 1,
            info_len: 5000,
            unique_id: 0x11,
            data_lba: 12,
        };
        let s = entry.encode();
        assert!(verify_tag(&s));
        assert!(verify_tag(&s[176..200]));
        assert_eq!(tag_identifier(&s[176..]), tag::EXTENDED_ATTRIBUTE_HEADER);
        assert_eq!(tag_location(&s), 9);
        assert_eq!(s[27], FILE_TYPE_FILE);
        assert_eq!(u32::from_le_bytes([s[36], s[37], s[38], s[39]]), ID_UNSET);
        assert_eq!(u64::from_le_bytes(s[64..72].try_into().unwrap()), 3);
        for offset in [72, 84, 96] {
            assert_eq!(&s[offset..offset + 12], &UDF_RECORDING_TIME.udf());
        }
        assert_eq!(u16::from_le_bytes([s[74], s[75]]), 2004);
        assert_eq!(u32::from_le_bytes([s[172], s[173], s[174], s[175]]), 8);
        assert_eq!(&s[200..252], &FREE_EA_SPACE);
        assert_eq!(&s[252..308], &CGMS_INFO);
        assert_eq!(u32::from_le_bytes([s[308], s[309], s[310], s[311]]), 5000);
        assert_eq!(u32::from_le_bytes([s[312], s[313], s[314], s[315]]), 12);
    }

    #[test]
    fn test_large_file_splits_extents() {
        let entry = FileEntry {
            lba: 3,
            file_type: FILE_TYPE_FILE,
            link_count: 1,
            info_len: MAX_EXTENT_LEN as u64 + 4096,
            unique_id: 0x10,
            data_lba: 100,
        };
        let extents = entry.extents();
        assert_eq!(extents.len(), 2);
        assert_eq!(extents[0], (MAX_EXTENT_LEN, 100));
        assert_eq!(extents[1], (4096, 100 + MAX_EXTENT_LEN / 2048));
    }

    #[test]
    fn test_empty_file_has_no_extents() {
        let entry = FileEntry {
            lba: 3,
            file_type: FILE_TYPE_FILE,
            link_count: 1,
            info_len: 0,
            unique_id: 0x10,
            data_lba: 100,
        };
        assert!(entry.extents().is_empty());
        assert!(verify_tag(&entry.encode()));
    }
}
