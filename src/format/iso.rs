/// ISO9660 descriptors, directory records and path table entries

use crate::format::constants::*;
use crate::format::field::*;
use crate::format::spec::VolumeSpec;

/// Fixed part of a directory record before the identifier
pub const DIRECTORY_RECORD_HEADER: usize = 33;

/// CD-XA system use field appended to every directory record
pub const XA_SYSTEM_USE_LEN: usize = 14;

/// Length of the "." and ".." records
pub const NAVIGATION_RECORD_LEN: usize = 48;

/// Length of the root record embedded in the primary volume descriptor
pub const ROOT_RECORD_LEN: u8 = 34;

/// Longest identifier that keeps a record within its 8-bit length field
pub const MAX_IDENTIFIER_LEN: usize = 207;

/// Directory record flag: entry is a directory
pub const FLAG_DIRECTORY: u8 = 0x02;

/// XA attributes of a directory (mode 2 form 1, all read/execute bits)
const XA_ATTRIBUTES_DIRECTORY: u16 = 0x8D55;

/// XA attributes of a file
const XA_ATTRIBUTES_FILE: u16 = 0x0D55;

/// Length of a directory record with an identifier of `identifier_len` bytes
///
/// An even-length identifier is followed by one pad byte so the record length stays even.
#[inline]
pub fn directory_record_len(identifier_len: usize) -> usize {
    let pad = (identifier_len + 1) % 2;
    DIRECTORY_RECORD_HEADER + identifier_len + pad + XA_SYSTEM_USE_LEN
}

/// ISO9660 identifier bytes of a directory entry
pub fn entry_identifier(name: &str, is_directory: bool) -> Vec<u8> {
    let mut id = iso_identifier(name).into_bytes();
    if !is_directory {
        id.extend_from_slice(b";1");
    }
    id
}

/// Length of a directory record for a named entry
#[inline]
pub fn entry_record_len(name: &str, is_directory: bool) -> usize {
    let id_len = iso_identifier(name).len() + if is_directory { 0 } else { 2 };
    directory_record_len(id_len)
}

/// Sectors needed to hold records of the given lengths, none straddling a sector
pub fn record_sectors<I: IntoIterator<Item = usize>>(lengths: I) -> u32 {
    let mut sectors = 1u32;
    let mut used = 0usize;
    for len in lengths {
        if used + len > SECTOR_SIZE {
            sectors += 1;
            used = 0;
        }
        used += len;
    }
    sectors
}

/// One ISO9660 directory record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Absolute sector of the entry's extent
    pub extent: u32,
    /// Data length in bytes
    pub data_length: u32,
    /// Directory flag
    pub is_directory: bool,
    /// Identifier bytes (0x00 for ".", 0x01 for "..")
    pub identifier: Vec<u8>,
}

impl DirectoryRecord {
    /// The "." record of a directory
    pub fn current(extent: u32, data_length: u32) -> Self {
        Self {
            extent,
            data_length,
            is_directory: true,
            identifier: vec![0x00],
        }
    }

    /// The ".." record of a directory
    pub fn parent(extent: u32, data_length: u32) -> Self {
        Self {
            extent,
            data_length,
            is_directory: true,
            identifier: vec![0x01],
        }
    }

    /// Record for a named child
    pub fn entry(name: &str, is_directory: bool, extent: u32, data_length: u32) -> Self {
        Self {
            extent,
            data_length,
            is_directory,
            identifier: entry_identifier(name, is_directory),
        }
    }

    /// Encoded length in bytes
    pub(crate) fn len(&self) -> usize {
        directory_record_len(self.identifier.len())
    }

    /// Append the encoded record
    pub fn encode(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.resize(start + self.len(), 0);
        let rec = &mut out[start..];

        rec[0] = self.len() as u8;
        rec[1] = 0; // extended attribute record length
        put_u32_both(rec, 2, self.extent);
        put_u32_both(rec, 10, self.data_length);
        rec[18..25].copy_from_slice(&DIRECTORY_RECORD_DATE);
        rec[25] = if self.is_directory { FLAG_DIRECTORY } else { 0 };
        rec[26] = 0; // file unit size
        rec[27] = 0; // interleave gap
        put_u16_both(rec, 28, 1);
        rec[32] = self.identifier.len() as u8;
        let id_end = 33 + self.identifier.len();
        rec[33..id_end].copy_from_slice(&self.identifier);

        let xa = id_end + (self.identifier.len() + 1) % 2;
        let attributes = if self.is_directory {
            XA_ATTRIBUTES_DIRECTORY
        } else {
            XA_ATTRIBUTES_FILE
        };
        rec[xa + 4..xa + 6].copy_from_slice(&attributes.to_be_bytes());
        rec[xa + 6..xa + 8].copy_from_slice(b"XA");
    }
}

/// One path table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTableEntry {
    /// Directory identifier (0x00 for the root)
    pub identifier: Vec<u8>,
    /// Absolute sector of the directory's records
    pub extent: u32,
    /// 1-based index of the parent entry
    pub parent: u16,
}

impl PathTableEntry {
    /// Append the entry in little-endian (type L) or big-endian (type M) form
    pub fn encode(&self, out: &mut Vec<u8>, big_endian: bool) {
        out.push(self.identifier.len() as u8);
        out.push(0);
        if big_endian {
            out.extend_from_slice(&self.extent.to_be_bytes());
            out.extend_from_slice(&self.parent.to_be_bytes());
        } else {
            out.extend_from_slice(&self.extent.to_le_bytes());
            out.extend_from_slice(&self.parent.to_le_bytes());
        }
        out.extend_from_slice(&self.identifier);
        if self.identifier.len() % 2 == 1 {
            out.push(0);
        }
    }
}

/// Length of a path table entry with an identifier of `identifier_len` bytes
#[inline]
pub fn path_table_entry_len(identifier_len: usize) -> usize {
    8 + identifier_len + identifier_len % 2
}

/// Build the ISO9660 Primary Volume Descriptor
pub fn primary_volume_descriptor(
    spec: &VolumeSpec,
    total_sectors: u32,
    path_table_size: u32,
    root_data_length: u32,
) -> SectorBytes {
    let mut s = zeroed();

    s[0] = 1;
    s[1..6].copy_from_slice(ISO_STANDARD_ID);
    s[6] = 1;
    put_padded(&mut s, 8, 32, &iso_identifier(&spec.system_identifier), b' ');
    put_padded(&mut s, 40, 32, &iso_identifier(&spec.volume_identifier), b' ');
    put_u32_both(&mut s, 80, total_sectors);
    put_u16_both(&mut s, 120, 1); // volume set size
    put_u16_both(&mut s, 124, 1); // volume sequence number
    put_u16_both(&mut s, 128, SECTOR_SIZE as u16);
    put_u32_both(&mut s, 132, path_table_size);
    put_u32(&mut s, 140, PATH_TABLE_L_SECTOR);
    put_u32(&mut s, 144, PATH_TABLE_L_OPT_SECTOR);
    put_u32_be(&mut s, 148, PATH_TABLE_M_SECTOR);
    put_u32_be(&mut s, 152, PATH_TABLE_M_OPT_SECTOR);

    // Root directory record, without the XA field
    let root = &mut s[156..190];
    root[0] = ROOT_RECORD_LEN;
    put_u32_both(root, 2, DIRECTORY_RECORDS_SECTOR);
    put_u32_both(root, 10, root_data_length);
    root[18..25].copy_from_slice(&DIRECTORY_RECORD_DATE);
    root[25] = FLAG_DIRECTORY;
    put_u16_both(root, 28, 1);
    root[32] = 1;
    root[33] = 0;

    put_padded(&mut s, 190, 128, &iso_identifier(&spec.volume_set_identifier), b' ');
    put_padded(&mut s, 318, 128, &iso_identifier(&spec.publisher_identifier), b' ');
    put_padded(&mut s, 446, 128, &iso_identifier(&spec.data_preparer_identifier), b' ');
    put_padded(&mut s, 574, 128, &iso_identifier(&spec.application_identifier), b' ');
    put_padded(&mut s, 702, 37, &iso_identifier(&spec.copyright_identifier), b' ');
    put_padded(&mut s, 739, 37, "", b' '); // abstract file
    put_padded(&mut s, 776, 37, "", b' '); // bibliographic file

    s[813..830].copy_from_slice(&ISO_CREATION_TIME.iso_decimal());
    for offset in [830, 847, 864] {
        s[offset..offset + 16].fill(b'0');
        s[offset + 16] = 0;
    }
    s[881] = 1; // file structure version

    s
}

/// Build the Volume Descriptor Set Terminator
pub fn set_terminator() -> SectorBytes {
    let mut s = zeroed();
    s[0] = 0xFF;
    s[1..6].copy_from_slice(ISO_STANDARD_ID);
    s[6] = 1;
    s
}

/// Build a BEA01, NSR02 or TEA01 volume structure descriptor
pub fn extended_area_descriptor(id: &[u8; 5]) -> SectorBytes {
    let mut s = zeroed();
    s[0] = 0;
    s[1..6].copy_from_slice(id);
    s[6] = 1;
    s
}
