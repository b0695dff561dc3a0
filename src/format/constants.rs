/// Sector layout constants and fixed identifiers

/// Size of one sector (and of one UDF logical block)
pub const SECTOR_SIZE: usize = 2048;

/// Sector size as a 32-bit value for descriptor fields
pub const SECTOR_SIZE_U32: u32 = SECTOR_SIZE as u32;

/// Sectors reserved for the system area
pub const SYSTEM_AREA_SECTORS: u32 = 16;

/// ISO9660 Primary Volume Descriptor
pub const ISO_PVD_SECTOR: u32 = 16;

/// Reserved sectors after the TEA01 descriptor
pub const EXTENDED_AREA_RESERVED_SECTORS: u32 = 11;

/// First sector of the Main Volume Descriptor Sequence
pub const MAIN_VDS_SECTOR: u32 = 32;

/// First sector of the Reserve Volume Descriptor Sequence
pub const RESERVE_VDS_SECTOR: u32 = 48;

/// Length of one volume descriptor sequence in sectors
pub const VDS_SECTORS: u32 = 16;

/// Reserved sectors closing each volume descriptor sequence
pub const VDS_RESERVED_SECTORS: u32 = 10;

/// Logical Volume Integrity Descriptor
pub const LVID_SECTOR: u32 = 64;

/// Length of the integrity sequence (LVID + terminator)
pub const INTEGRITY_SEQUENCE_SECTORS: u32 = 2;

/// Reserved sectors between the integrity sequence and the anchor
pub const ANCHOR_RESERVED_SECTORS: u32 = 190;

/// Anchor Volume Descriptor Pointer
pub const ANCHOR_SECTOR: u32 = 256;

/// Type L path table
pub const PATH_TABLE_L_SECTOR: u32 = 257;

/// Optional type L path table
pub const PATH_TABLE_L_OPT_SECTOR: u32 = 258;

/// Type M path table
pub const PATH_TABLE_M_SECTOR: u32 = 259;

/// Optional type M path table
pub const PATH_TABLE_M_OPT_SECTOR: u32 = 260;

/// Sectors taken by the volume descriptor regions, independent of tree content
pub const VOLUME_DESCRIPTOR_SECTORS: u32 = 261;

/// First directory record sector (the root's)
pub const DIRECTORY_RECORDS_SECTOR: u32 = VOLUME_DESCRIPTOR_SECTORS;

/// Total image size must be a multiple of this many sectors
pub const SECTOR_ALIGNMENT: u32 = 16;

/// Partition-relative block of the File Set Descriptor
pub const FILE_SET_DESCRIPTOR_LBA: u32 = 0;

/// First partition-relative block of the File Identifier Descriptors
pub const FILE_IDENTIFIER_LBA: u32 = 2;

/// Unique ID of the first non-root File Entry
pub const FIRST_UNIQUE_ID: u64 = 0x10;

/// Revision written to the integrity descriptor (PS2 discs carry this, not 0x0250)
pub const UDF_REVISION: u16 = 258;

/// Revision written in entity identifier suffixes
pub const UDF_SUFFIX_REVISION: u16 = 0x0102;

/// Compression ID prefix of every PS2 d-string
pub const DSTRING_COMPRESSION_ID: u8 = 8;

/// ISO9660 standard identifier
pub const ISO_STANDARD_ID: &[u8; 5] = b"CD001";

/// Beginning Extended Area descriptor identifier
pub const BEA_ID: &[u8; 5] = b"BEA01";

/// NSR descriptor identifier
pub const NSR_ID: &[u8; 5] = b"NSR02";

/// Terminating Extended Area descriptor identifier
pub const TEA_ID: &[u8; 5] = b"TEA01";

/// Character set information of OSTA CS0 charspecs
pub const OSTA_CHARSET: &str = "OSTA Compressed Unicode";

/// Implementation identifier written in every entity ID
pub const IMPLEMENTATION_ID: &str = "DVD-ROM GENERATOR";

/// Domain identifier of the logical volume and file set
pub const DOMAIN_ID: &str = "*OSTA UDF Compliant";

/// Implementation identifier of the Implementation Use Volume Descriptor
pub const LV_INFO_ID: &str = "*UDF LV Info";

/// Partition contents identifier
pub const PARTITION_CONTENTS_ID: &str = "+NSR02";

/// Encoded volume set date with the SCEI suffix
pub const VOLUME_SET_DATE: &str = "=0<58115SCEI";

/// Bytes of the volume set identifier d-string in use
pub const VOLUME_SET_USED_LEN: u8 = 0x31;

/// A fixed timestamp written into the descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingTime {
    /// Full year
    pub year: u16,
    /// Month (1-12)
    pub month: u8,
    /// Day of month
    pub day: u8,
    /// Hour
    pub hour: u8,
    /// Minute
    pub minute: u8,
    /// Second
    pub second: u8,
    /// Offset from GMT in 15 minute intervals
    pub gmt_offset: i8,
}

/// ISO9660 volume creation time: 2009-09-03 07:33:47 GMT+9
pub const ISO_CREATION_TIME: RecordingTime = RecordingTime {
    year: 2009,
    month: 9,
    day: 3,
    hour: 7,
    minute: 33,
    second: 47,
    gmt_offset: 36,
};

/// UDF recording time of every UDF timestamp: 2004-09-03 07:33:47 GMT+9
pub const UDF_RECORDING_TIME: RecordingTime = RecordingTime {
    year: 2004,
    ..ISO_CREATION_TIME
};

/// Recording date of every ISO9660 directory record (1900+120 = 2020-08-25 11:30, GMT)
pub const DIRECTORY_RECORD_DATE: [u8; 7] = [120, 8, 25, 11, 30, 0, 0];

impl RecordingTime {
    /// ISO9660 17-byte decimal form ("YYYYMMDDHHMMSScc" + offset byte)
    pub fn iso_decimal(&self) -> [u8; 17] {
        let text = format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}00",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        );
        let mut out = [0u8; 17];
        out[..16].copy_from_slice(text.as_bytes());
        out[16] = self.gmt_offset as u8;
        out
    }

    /// UDF 12-byte timestamp
    pub fn udf(&self) -> [u8; 12] {
        // Type 1 (local time), offset in minutes
        let minutes = (self.gmt_offset as i16 * 15) as u16 & 0x0FFF;
        let type_and_zone = 0x1000 | minutes;
        let mut out = [0u8; 12];
        out[0..2].copy_from_slice(&type_and_zone.to_le_bytes());
        out[2..4].copy_from_slice(&self.year.to_le_bytes());
        out[4] = self.month;
        out[5] = self.day;
        out[6] = self.hour;
        out[7] = self.minute;
        out[8] = self.second;
        out
    }
}

/// Number of sectors needed to hold `bytes`
#[inline]
pub fn sectors_for(bytes: u64) -> u32 {
    bytes.div_ceil(SECTOR_SIZE as u64) as u32
}

/// Round a sector count up to the image alignment
#[inline]
pub fn align_sectors(sectors: u32) -> u32 {
    sectors.div_ceil(SECTOR_ALIGNMENT) * SECTOR_ALIGNMENT
}
