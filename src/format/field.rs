/// Fixed-offset field writers shared by the ISO9660 and UDF descriptors

use crate::checksum::{compress_unicode, COMPRESSION_16BIT};
use crate::format::constants::SECTOR_SIZE;

/// One sector of descriptor bytes
pub type SectorBytes = [u8; SECTOR_SIZE];

/// Create a zeroed sector
#[inline]
pub fn zeroed() -> SectorBytes {
    [0u8; SECTOR_SIZE]
}

/// Write a little-endian u16
#[inline]
pub fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write a little-endian u32
#[inline]
pub fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write a big-endian u32
#[inline]
pub fn put_u32_be(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write a little-endian u64
#[inline]
pub fn put_u64(buf: &mut [u8], offset: usize, value: u64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

/// Write a u16 in both byte orders (little-endian first)
#[inline]
pub fn put_u16_both(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    buf[offset + 2..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write a u32 in both byte orders (little-endian first)
#[inline]
pub fn put_u32_both(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    buf[offset + 4..offset + 8].copy_from_slice(&value.to_be_bytes());
}

/// Write a string into a fixed-width field, truncating and padding with `pad`
pub fn put_padded(buf: &mut [u8], offset: usize, width: usize, text: &str, pad: u8) {
    let field = &mut buf[offset..offset + width];
    let bytes = text.as_bytes();
    let len = bytes.len().min(width);
    field[..len].copy_from_slice(&bytes[..len]);
    field[len..].fill(pad);
}

/// Write a d-string: OSTA CS0 characters, zero fill, used length in the last byte
///
/// PS2 discs store the used length as the final byte of the field. Text that
/// does not fit is cut on a whole code unit.
pub fn put_dstring(buf: &mut [u8], offset: usize, width: usize, text: &str) {
    let field = &mut buf[offset..offset + width];
    field.fill(0);
    if text.is_empty() {
        return;
    }
    let encoded = compress_unicode(text);
    let mut len = encoded.len().min(width - 1);
    if encoded[0] == COMPRESSION_16BIT {
        len -= (len - 1) % 2;
    }
    field[..len].copy_from_slice(&encoded[..len]);
    field[width - 1] = len as u8;
}

/// Write a 64-byte OSTA CS0 charspec
pub fn put_charspec(buf: &mut [u8], offset: usize) {
    buf[offset] = 0;
    put_padded(buf, offset + 1, 63, crate::format::constants::OSTA_CHARSET, 0);
}

/// Write a 32-byte entity identifier with an optional suffix
pub fn put_entity_id(buf: &mut [u8], offset: usize, ident: &str, suffix: &[u8]) {
    buf[offset] = 0;
    put_padded(buf, offset + 1, 23, ident, 0);
    let suffix_len = suffix.len().min(8);
    buf[offset + 24..offset + 24 + suffix_len].copy_from_slice(&suffix[..suffix_len]);
    buf[offset + 24 + suffix_len..offset + 32].fill(0);
}

/// Write an 8-byte extent (length, location)
#[inline]
pub fn put_extent(buf: &mut [u8], offset: usize, length: u32, location: u32) {
    put_u32(buf, offset, length);
    put_u32(buf, offset + 4, location);
}

/// Write a 16-byte long allocation descriptor in partition 0
#[inline]
pub fn put_long_ad(buf: &mut [u8], offset: usize, length: u32, block: u32) {
    put_u32(buf, offset, length);
    put_u32(buf, offset + 4, block);
    put_u16(buf, offset + 8, 0);
    buf[offset + 10..offset + 16].fill(0);
}

/// Uppercase a name for an ISO9660 identifier
pub fn iso_identifier(name: &str) -> String {
    name.to_ascii_uppercase()
}
