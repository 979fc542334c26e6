//! BER lengths and KLV packet framing.

use std::io::{Read, Write};

use crate::error::{AsdcpError, Result};
use crate::ul::{Ul, UlMatch, UL_LENGTH};

/// Length of the BER field AS-DCP writes by default (`0x83 xx xx xx`).
pub const MXF_BER_LENGTH: usize = 4;
/// Key plus a default-width BER length.
pub const KL_LENGTH: usize = UL_LENGTH + MXF_BER_LENGTH;
/// Largest value a single KLV read will allocate for.
pub const MAX_KLV_PACKET_LENGTH: u64 = 64 * 1024 * 1024;
/// Largest value that fits the default 4-byte BER field.
pub const MAX_BER4_VALUE: u64 = 0x00ff_ffff;

/// Smallest total BER field width (lead byte included) able to hold `value`,
/// never narrower than the default 4 bytes.
pub fn ber_length_for_value(value: u64) -> usize {
    if value <= MAX_BER4_VALUE {
        return MXF_BER_LENGTH;
    }
    let octets = 8 - (value.leading_zeros() as usize / 8);
    octets + 1
}

/// Append `value` as a BER length of exactly `ber_len` bytes.
///
/// `ber_len == 1` is the short form and only accepts values below 0x80.
pub fn encode_ber(out: &mut Vec<u8>, value: u64, ber_len: usize) -> Result<()> {
    match ber_len {
        1 => {
            if value > 0x7f {
                return Err(AsdcpError::BerCoding("value does not fit short form"));
            }
            out.push(value as u8);
        }
        2..=9 => {
            let octets = ber_len - 1;
            if octets < 8 && value >> (octets * 8) != 0 {
                return Err(AsdcpError::BerCoding("value does not fit requested width"));
            }
            out.push(0x80 | octets as u8);
            out.extend_from_slice(&value.to_be_bytes()[8 - octets..]);
        }
        _ => return Err(AsdcpError::BerCoding("BER width must be 1 to 9 bytes")),
    }
    Ok(())
}

/// Append `value` using the shortest form (short form up to 127).
pub fn encode_ber_minimal(out: &mut Vec<u8>, value: u64) -> Result<()> {
    if value <= 0x7f {
        return encode_ber(out, value, 1);
    }
    let octets = 8 - (value.leading_zeros() as usize / 8);
    encode_ber(out, value, octets + 1)
}

/// Decode a BER length from the front of `buf`. Returns `(value, bytes consumed)`.
pub fn decode_ber(buf: &[u8]) -> Result<(u64, usize)> {
    let lead = *buf
        .first()
        .ok_or(AsdcpError::BerCoding("empty BER length"))?;
    if lead & 0x80 == 0 {
        return Ok((lead as u64, 1));
    }
    let octets = (lead & 0x7f) as usize;
    if octets == 0 || octets > 8 {
        return Err(AsdcpError::BerCoding("unsupported BER length width"));
    }
    let bytes = buf
        .get(1..=octets)
        .ok_or(AsdcpError::BerCoding("truncated BER length"))?;
    let value = bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
    Ok((value, octets + 1))
}

/// A borrowed KLV packet inside a larger buffer.
#[derive(Debug, Clone, Copy)]
pub struct Klv<'a> {
    pub key: Ul,
    pub value: &'a [u8],
    /// Key plus length field.
    pub kl_length: usize,
}

impl Klv<'_> {
    pub fn packet_length(&self) -> usize {
        self.kl_length + self.value.len()
    }
}

/// Parse one KLV packet from the front of `buf`.
///
/// A length that runs past the end of `buf` is rejected rather than truncated.
pub fn parse_klv(buf: &[u8]) -> Result<Klv<'_>> {
    let key = Ul::from_slice(buf)?;
    let (length, ber_len) = decode_ber(&buf[UL_LENGTH..])?;
    let kl_length = UL_LENGTH + ber_len;
    let end = (kl_length as u64)
        .checked_add(length)
        .filter(|end| *end <= buf.len() as u64)
        .ok_or_else(|| {
            AsdcpError::KlvCoding(format!(
                "value of {length} bytes overruns buffer of {} bytes",
                buf.len()
            ))
        })?;
    Ok(Klv {
        key,
        value: &buf[kl_length..end as usize],
        kl_length,
    })
}

/// Parse one KLV packet and require its key to match `expected` under `mode`.
pub fn expect_klv<'a>(buf: &'a [u8], expected: &Ul, mode: UlMatch) -> Result<Klv<'a>> {
    let klv = parse_klv(buf)?;
    if !klv.key.matches(expected, mode) {
        return Err(AsdcpError::KeyMismatch {
            offset: 0,
            expected: *expected,
            got: klv.key,
        });
    }
    Ok(klv)
}

/// Key and length of a packet read from a stream; the value is not consumed.
#[derive(Debug, Clone, Copy)]
pub struct KlHeader {
    pub key: Ul,
    pub length: u64,
    pub kl_length: usize,
}

impl KlHeader {
    pub fn packet_length(&self) -> u64 {
        self.kl_length as u64 + self.length
    }
}

/// Read a key and long-form BER length from `reader`.
///
/// Only long-form lengths of 4 to 9 bytes are accepted, as every packet in an
/// AS-DCP file is written that way. `offset` is used for error context only.
pub fn read_kl<R: Read>(reader: &mut R, offset: u64) -> Result<KlHeader> {
    let mut buf = [0u8; KL_LENGTH + 5];
    reader
        .read_exact(&mut buf[..KL_LENGTH])
        .map_err(|e| eof_or_io(e, offset, "KLV key and length"))?;

    let lead = buf[UL_LENGTH];
    if lead & 0x80 == 0 {
        return Err(AsdcpError::format(format!(
            "short-form BER length at offset 0x{offset:X}"
        )));
    }
    let ber_size = (lead & 0x0f) as usize + 1;
    if !(MXF_BER_LENGTH..=9).contains(&ber_size) {
        return Err(AsdcpError::format(format!(
            "BER length of {ber_size} bytes at offset 0x{offset:X}"
        )));
    }
    if ber_size > MXF_BER_LENGTH {
        reader
            .read_exact(&mut buf[KL_LENGTH..UL_LENGTH + ber_size])
            .map_err(|e| eof_or_io(e, offset, "KLV length"))?;
    }

    let key = Ul::from_slice(&buf)?;
    let (length, kl_ber) = decode_ber(&buf[UL_LENGTH..UL_LENGTH + ber_size])?;
    Ok(KlHeader {
        key,
        length,
        kl_length: UL_LENGTH + kl_ber,
    })
}

/// Read a whole KLV packet, returning its header and value bytes.
pub fn read_klv_packet<R: Read>(reader: &mut R, offset: u64) -> Result<(KlHeader, Vec<u8>)> {
    let kl = read_kl(reader, offset)?;
    if kl.length > MAX_KLV_PACKET_LENGTH {
        return Err(AsdcpError::KlvCoding(format!(
            "packet of {} bytes at offset 0x{offset:X} exceeds the {} byte limit",
            kl.length, MAX_KLV_PACKET_LENGTH
        )));
    }
    let mut value = vec![0u8; kl.length as usize];
    reader
        .read_exact(&mut value)
        .map_err(|e| eof_or_io(e, offset + kl.kl_length as u64, "KLV value"))?;
    Ok((kl, value))
}

/// Append a key and a BER length wide enough for `length` (4 bytes unless larger).
pub fn encode_kl(out: &mut Vec<u8>, key: &Ul, length: u64) -> Result<()> {
    out.extend_from_slice(key.as_bytes());
    encode_ber(out, length, ber_length_for_value(length))
}

/// Write a key and BER length to `writer`, returning the bytes written.
pub fn write_kl<W: Write>(writer: &mut W, key: &Ul, length: u64) -> Result<usize> {
    let mut kl = Vec::with_capacity(KL_LENGTH + 5);
    encode_kl(&mut kl, key, length)?;
    writer.write_all(&kl)?;
    Ok(kl.len())
}

pub(crate) fn eof_or_io(e: std::io::Error, offset: u64, context: &'static str) -> AsdcpError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        AsdcpError::UnexpectedEof { offset, context }
    } else {
        AsdcpError::IoAtOffset {
            offset,
            context,
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn ber_round_trip(value: u64) -> u64 {
        let mut out = Vec::new();
        encode_ber_minimal(&mut out, value).unwrap();
        let (decoded, used) = decode_ber(&out).unwrap();
        assert_eq!(used, out.len());
        decoded
    }

    #[test]
    fn test_ber_short_long_boundary() {
        let mut out = Vec::new();
        encode_ber_minimal(&mut out, 127).unwrap();
        assert_eq!(out, vec![0x7f]);
        out.clear();
        encode_ber_minimal(&mut out, 128).unwrap();
        assert_eq!(out, vec![0x81, 0x80]);
    }

    #[test]
    fn test_ber_round_trip_edges() {
        for v in [0, 1, 127, 128, 255, 256, 0xffff, 0x10000, 0xff_ffff, 0x100_0000, u32::MAX as u64] {
            assert_eq!(ber_round_trip(v), v);
        }
    }

    #[test]
    fn test_ber_round_trip_sweep() {
        // xorshift over the full u32 range, plus each neighbour of every power of two
        let mut state = 0x9e37_79b9u32;
        for _ in 0..200_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let v = state as u64;
            assert_eq!(ber_round_trip(v), v);
            let mut fixed = Vec::new();
            encode_ber(&mut fixed, v, 9).unwrap();
            assert_eq!(decode_ber(&fixed).unwrap(), (v, 9));
        }
        for bit in 0..32 {
            let p = 1u64 << bit;
            for v in [p - 1, p, p + 1] {
                assert_eq!(ber_round_trip(v), v);
            }
        }
        let mut out = Vec::new();
        encode_ber_minimal(&mut out, 127).unwrap();
        assert_eq!(out.len(), 1);
        out.clear();
        encode_ber_minimal(&mut out, 128).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_ber_fixed_width() {
        let mut out = Vec::new();
        encode_ber(&mut out, 0x1234, MXF_BER_LENGTH).unwrap();
        assert_eq!(out, vec![0x83, 0x00, 0x12, 0x34]);
        assert!(encode_ber(&mut Vec::new(), 0x0100_0000, MXF_BER_LENGTH).is_err());
        assert_eq!(ber_length_for_value(0x0100_0000), 5);
        assert_eq!(ber_length_for_value(12), 4);
    }

    #[test]
    fn test_decode_ber_rejects_bad_width() {
        assert!(decode_ber(&[0x80]).is_err());
        assert!(decode_ber(&[0x89, 0, 0, 0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(decode_ber(&[0x83, 0x00]).is_err());
    }

    #[test]
    fn test_parse_klv_rejects_overrun() {
        let key = Ul::new([0x06, 0x0e, 0x2b, 0x34, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        let mut buf = Vec::new();
        encode_kl(&mut buf, &key, 10).unwrap();
        buf.extend_from_slice(&[0u8; 4]);
        let err = parse_klv(&buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        buf.extend_from_slice(&[0u8; 6]);
        let klv = expect_klv(&buf, &key, UlMatch::Exact).unwrap();
        assert_eq!(klv.value.len(), 10);
        assert_eq!(klv.packet_length(), buf.len());
    }

    #[test]
    fn test_read_kl_wide_length() {
        let key = Ul::new([0x06, 0x0e, 0x2b, 0x34, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        let mut buf = Vec::new();
        key.as_bytes().iter().for_each(|b| buf.push(*b));
        encode_ber(&mut buf, 5, 8).unwrap();
        buf.extend_from_slice(b"hello");
        let mut cursor = Cursor::new(buf);
        let (kl, value) = read_klv_packet(&mut cursor, 0).unwrap();
        assert_eq!(kl.kl_length, 24);
        assert_eq!(value, b"hello");
    }

    #[test]
    fn test_read_kl_rejects_short_form() {
        let mut buf = vec![0u8; 16];
        buf.extend_from_slice(&[0x05, 0, 0, 0]);
        let err = read_kl(&mut Cursor::new(buf), 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
