//! Fixed-width big-endian values and the composite types stored in metadata sets.

use std::fmt;

use chrono::{Datelike, Timelike, Utc};
use uuid::Uuid;

use crate::error::{AsdcpError, Result};
use crate::ul::{Ul, Umid, UL_LENGTH, UMID_LENGTH, UUID_LENGTH};

/// Upper bound on the element count of a batch or array.
pub const MAX_BATCH_COUNT: u32 = 65536;
/// Upper bound on the declared element size of a batch or array.
pub const MAX_BATCH_ITEM_SIZE: u32 = 1024;

/// Bounds-checked big-endian cursor over a byte slice.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        ByteReader { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(AsdcpError::UnexpectedEof {
                offset: self.pos as u64,
                context: "fixed-width field",
            })?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    /// Everything left, without consuming it.
    pub fn peek_rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Take everything left.
    pub fn rest(&mut self) -> &'a [u8] {
        let out = &self.buf[self.pos..];
        self.pos = self.buf.len();
        out
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_ul(&mut self) -> Result<Ul> {
        Ok(Ul(self.read_array::<UL_LENGTH>()?))
    }

    pub fn read_uuid(&mut self) -> Result<Uuid> {
        Ok(Uuid::from_bytes(self.read_array::<UUID_LENGTH>()?))
    }

    pub fn read_umid(&mut self) -> Result<Umid> {
        Ok(Umid(self.read_array::<UMID_LENGTH>()?))
    }
}

/// A value with a fixed big-endian wire form.
pub trait Archive {
    fn archive(&self, out: &mut Vec<u8>);
}

/// The inverse of [`Archive`].
pub trait Unarchive: Sized {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self>;
}

macro_rules! impl_int {
    ($($t:ty => $read:ident),* $(,)?) => {
        $(
            impl Archive for $t {
                fn archive(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_be_bytes());
                }
            }

            impl Unarchive for $t {
                fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
                    r.$read()
                }
            }
        )*
    };
}

impl_int!(
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
);

impl Archive for Ul {
    fn archive(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Unarchive for Ul {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        r.read_ul()
    }
}

impl Archive for Uuid {
    fn archive(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }
}

impl Unarchive for Uuid {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        r.read_uuid()
    }
}

impl Archive for Umid {
    fn archive(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.0);
    }
}

impl Unarchive for Umid {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        r.read_umid()
    }
}

/// Length-prefixed list: u32 count, u32 item size, then the items.
///
/// Used for both MXF batches and arrays, which share a wire form.
pub fn archive_batch<T: Archive>(items: &[T], item_size: u32, out: &mut Vec<u8>) {
    out.extend_from_slice(&(items.len() as u32).to_be_bytes());
    out.extend_from_slice(&item_size.to_be_bytes());
    for item in items {
        item.archive(out);
    }
}

/// Read a batch, decoding each item from exactly `item_size` bytes.
pub fn unarchive_batch<T: Unarchive>(r: &mut ByteReader<'_>) -> Result<Vec<T>> {
    let count = r.read_u32()?;
    let item_size = r.read_u32()?;
    if count > MAX_BATCH_COUNT || item_size > MAX_BATCH_ITEM_SIZE {
        return Err(AsdcpError::format(format!(
            "batch of {count} items of {item_size} bytes exceeds limits"
        )));
    }
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut item = ByteReader::new(r.read_bytes(item_size as usize)?);
        items.push(T::unarchive(&mut item)?);
    }
    Ok(items)
}

/// A rational number, as used for edit and sample rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Rational {
    pub numerator: i32,
    pub denominator: i32,
}

impl Rational {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Rational {
            numerator,
            denominator,
        }
    }

    pub fn quotient(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }

    /// Rounded integer rate, used as the timecode base.
    pub fn rounded(&self) -> u32 {
        self.quotient().round().max(0.0) as u32
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::new(0, 0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl Archive for Rational {
    fn archive(&self, out: &mut Vec<u8>) {
        self.numerator.archive(out);
        self.denominator.archive(out);
    }
}

impl Unarchive for Rational {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Rational::new(r.read_i32()?, r.read_i32()?))
    }
}

pub const EDIT_RATE_16: Rational = Rational::new(16, 1);
pub const EDIT_RATE_18: Rational = Rational::new(18, 1);
pub const EDIT_RATE_20: Rational = Rational::new(20, 1);
pub const EDIT_RATE_22: Rational = Rational::new(22, 1);
pub const EDIT_RATE_23_98: Rational = Rational::new(24000, 1001);
pub const EDIT_RATE_24: Rational = Rational::new(24, 1);
pub const EDIT_RATE_25: Rational = Rational::new(25, 1);
pub const EDIT_RATE_30: Rational = Rational::new(30, 1);
pub const EDIT_RATE_48: Rational = Rational::new(48, 1);
pub const EDIT_RATE_50: Rational = Rational::new(50, 1);
pub const EDIT_RATE_60: Rational = Rational::new(60, 1);
pub const EDIT_RATE_96: Rational = Rational::new(96, 1);
pub const EDIT_RATE_100: Rational = Rational::new(100, 1);
pub const EDIT_RATE_120: Rational = Rational::new(120, 1);
pub const SAMPLE_RATE_48K: Rational = Rational::new(48000, 1);
pub const SAMPLE_RATE_96K: Rational = Rational::new(96000, 1);

/// Release classification carried in a version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ReleaseType {
    #[default]
    Unknown,
    Release,
    Development,
    Patched,
    Beta,
    Private,
}

impl ReleaseType {
    fn from_u16(v: u16) -> Self {
        match v {
            1 => ReleaseType::Release,
            2 => ReleaseType::Development,
            3 => ReleaseType::Patched,
            4 => ReleaseType::Beta,
            5 => ReleaseType::Private,
            _ => ReleaseType::Unknown,
        }
    }

    fn as_u16(self) -> u16 {
        match self {
            ReleaseType::Unknown => 0,
            ReleaseType::Release => 1,
            ReleaseType::Development => 2,
            ReleaseType::Patched => 3,
            ReleaseType::Beta => 4,
            ReleaseType::Private => 5,
        }
    }
}

/// Product or toolkit version: five u16 fields on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VersionType {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub build: u16,
    pub release: ReleaseType,
}

impl VersionType {
    /// Version of this library, as written into the Identification set.
    pub fn toolkit() -> Self {
        let part = |s: &str| s.parse::<u16>().unwrap_or(0);
        VersionType {
            major: part(env!("CARGO_PKG_VERSION_MAJOR")),
            minor: part(env!("CARGO_PKG_VERSION_MINOR")),
            patch: part(env!("CARGO_PKG_VERSION_PATCH")),
            build: 0,
            release: ReleaseType::Release,
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

impl Archive for VersionType {
    fn archive(&self, out: &mut Vec<u8>) {
        for v in [self.major, self.minor, self.patch, self.build, self.release.as_u16()] {
            v.archive(out);
        }
    }
}

impl Unarchive for VersionType {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(VersionType {
            major: r.read_u16()?,
            minor: r.read_u16()?,
            patch: r.read_u16()?,
            build: r.read_u16()?,
            release: ReleaseType::from_u16(r.read_u16()?),
        })
    }
}

/// MXF timestamp: u16 year, five u8 fields, and quarter-milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// Units of 4 ms.
    pub tick: u8,
}

impl Timestamp {
    pub fn now() -> Self {
        let now = Utc::now();
        Timestamp {
            year: now.year().clamp(0, u16::MAX as i32) as u16,
            month: now.month() as u8,
            day: now.day() as u8,
            hour: now.hour() as u8,
            minute: now.minute() as u8,
            second: now.second().min(59) as u8,
            tick: (now.timestamp_subsec_millis().min(999) / 4) as u8,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Archive for Timestamp {
    fn archive(&self, out: &mut Vec<u8>) {
        self.year.archive(out);
        out.extend_from_slice(&[
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.tick,
        ]);
    }
}

impl Unarchive for Timestamp {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        let year = r.read_u16()?;
        let [month, day, hour, minute, second, tick] = r.read_array::<6>()?;
        Ok(Timestamp {
            year,
            month,
            day,
            hour,
            minute,
            second,
            tick,
        })
    }
}

/// Encode a string as UTF-16BE without terminator.
pub fn encode_utf16be(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

/// Decode UTF-16BE bytes, dropping trailing NULs. Invalid sequences become U+FFFD.
pub fn decode_utf16be(buf: &[u8]) -> String {
    let units: Vec<u16> = buf
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let mut s = String::from_utf16_lossy(&units);
    while s.ends_with('\0') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_reader_eof() {
        let mut r = ByteReader::new(&[0x00, 0x01, 0x02]);
        assert_eq!(r.read_u16().unwrap(), 1);
        assert!(r.read_u16().is_err());
        assert_eq!(r.remaining(), 1);
    }

    #[test]
    fn test_batch_limits() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_BATCH_COUNT + 1).to_be_bytes());
        buf.extend_from_slice(&16u32.to_be_bytes());
        assert!(unarchive_batch::<Ul>(&mut ByteReader::new(&buf)).is_err());
    }

    #[test]
    fn test_batch_item_size_is_honoured() {
        // Items declared wider than the type are skipped past, not misaligned.
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&[0, 0, 0, 7, 0xaa, 0xbb, 0, 0, 0, 9, 0xcc, 0xdd]);
        let items: Vec<u32> = unarchive_batch(&mut ByteReader::new(&buf)).unwrap();
        assert_eq!(items, vec![7, 9]);
    }

    #[test]
    fn test_utf16() {
        let encoded = encode_utf16be("Track");
        assert_eq!(encoded.len(), 10);
        let mut padded = encoded.clone();
        padded.extend_from_slice(&[0, 0]);
        assert_eq!(decode_utf16be(&padded), "Track");
    }

    #[test]
    fn test_rational() {
        assert_eq!(EDIT_RATE_23_98.rounded(), 24);
        assert_eq!(EDIT_RATE_24.to_string(), "24/1");
        assert_eq!(Rational::default().quotient(), 0.0);
    }

    #[test]
    fn test_version_wire_form() {
        let v = VersionType {
            major: 1,
            minor: 2,
            patch: 3,
            build: 4,
            release: ReleaseType::Beta,
        };
        let mut out = Vec::new();
        v.archive(&mut out);
        assert_eq!(out, vec![0, 1, 0, 2, 0, 3, 0, 4, 0, 4]);
    }
}
