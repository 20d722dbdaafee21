//! Big-endian field readers. FITS stores every binary value most significant byte first.
//!
//! Callers slice the row buffer to exactly the field width before calling
//! these helpers, so the slices are always long enough.

use byteorder::{BigEndian, ByteOrder};

#[inline]
#[must_use]
pub fn read_i16(bytes: &[u8]) -> i16 {
    BigEndian::read_i16(bytes)
}

#[inline]
#[must_use]
pub fn read_i32(bytes: &[u8]) -> i32 {
    BigEndian::read_i32(bytes)
}

#[inline]
#[must_use]
pub fn read_i64(bytes: &[u8]) -> i64 {
    BigEndian::read_i64(bytes)
}

#[inline]
#[must_use]
pub fn read_f32(bytes: &[u8]) -> f32 {
    BigEndian::read_f32(bytes)
}

#[inline]
#[must_use]
pub fn read_f64(bytes: &[u8]) -> f64 {
    BigEndian::read_f64(bytes)
}
