/// Descriptor checksums and OSTA compressed unicode

use crc::{Crc, CRC_16_XMODEM};

/// CRC-16/CCITT with polynomial 0x1021 and zero initial value, as used by UDF tags
const DESCRIPTOR_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Byte offset of the checksum byte inside a descriptor tag
pub const TAG_CHECKSUM_OFFSET: usize = 4;

/// Compression ID for 8 bits per character
pub const COMPRESSION_8BIT: u8 = 8;

/// Compression ID for 16 bits per character
pub const COMPRESSION_16BIT: u8 = 16;

/// CRC-16 over a descriptor body
pub fn crc16(data: &[u8]) -> u16 {
    DESCRIPTOR_CRC.checksum(data)
}

/// Sum modulo 256 of the 16 tag bytes, skipping the checksum byte itself
pub fn tag_checksum(tag: &[u8]) -> u8 {
    tag.iter()
        .take(16)
        .enumerate()
        .filter(|(i, _)| *i != TAG_CHECKSUM_OFFSET)
        .fold(0u8, |sum, (_, &b)| sum.wrapping_add(b))
}

/// Header checksum of an Implementation Use Extended Attribute
///
/// Covers the 48 bytes from the attribute type through the implementation identifier.
pub fn ea_header_checksum(header: &[u8]) -> u16 {
    header
        .iter()
        .take(48)
        .fold(0u16, |sum, &b| sum.wrapping_add(b as u16))
}

/// Encode a name as OSTA CS0 compressed unicode
///
/// Uses 8 bits per character when every UTF-16 unit fits in a byte, otherwise 16 bits
/// per character in big-endian order. The first byte is the compression ID.
pub fn compress_unicode(name: &str) -> Vec<u8> {
    let units: Vec<u16> = name.encode_utf16().collect();
    let narrow = units.iter().all(|&u| u <= 0xFF);

    if narrow {
        let mut out = Vec::with_capacity(units.len() + 1);
        out.push(COMPRESSION_8BIT);
        out.extend(units.iter().map(|&u| u as u8));
        out
    } else {
        let mut out = Vec::with_capacity(units.len() * 2 + 1);
        out.push(COMPRESSION_16BIT);
        for u in units {
            out.extend_from_slice(&u.to_be_bytes());
        }
        out
    }
}

/// Number of bytes `compress_unicode` produces for a name, compression ID included
pub fn compressed_len(name: &str) -> usize {
    let mut count = 0;
    let mut narrow = true;
    for u in name.encode_utf16() {
        count += 1;
        narrow &= u <= 0xFF;
    }
    1 + if narrow { count } else { count * 2 }
}

/// Decode OSTA CS0 compressed unicode
///
/// Returns `None` for an unknown compression ID or invalid UTF-16.
pub fn uncompress_unicode(data: &[u8]) -> Option<String> {
    let (&comp_id, body) = data.split_first()?;
    let units: Vec<u16> = match comp_id {
        COMPRESSION_8BIT => body.iter().map(|&b| b as u16).collect(),
        COMPRESSION_16BIT => body
            .chunks(2)
            .map(|pair| match pair {
                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                [hi] => (*hi as u16) << 8,
                _ => 0,
            })
            .collect(),
        _ => return None,
    };
    String::from_utf16(&units).ok()
}
