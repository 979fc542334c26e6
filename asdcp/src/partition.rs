use std::io::{Read, Seek, SeekFrom, Write};

use crate::dict;
use crate::error::{AsdcpError, Result};
use crate::klv::{self, KL_LENGTH, MXF_BER_LENGTH};
use crate::types::{archive_batch, unarchive_batch, Archive, ByteReader};
use crate::ul::{Ul, UL_LENGTH};

/// Fixed part of a partition pack value, before the essence container batch.
const PARTITION_FIXED_LENGTH: usize = 80;
/// Size of one RIP entry on disk.
const RIP_PAIR_LENGTH: usize = 12;

/// Header, body or footer partition pack.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Partition {
    #[serde(skip)]
    pub pack_key: Ul,
    pub major_version: u16,
    pub minor_version: u16,
    pub kag_size: u32,
    pub this_partition: u64,
    pub previous_partition: u64,
    pub footer_partition: u64,
    pub header_byte_count: u64,
    pub index_byte_count: u64,
    pub index_sid: u32,
    pub body_offset: u64,
    pub body_sid: u32,
    #[serde(skip)]
    pub operational_pattern: Ul,
    #[serde(skip)]
    pub essence_containers: Vec<Ul>,
}

impl Default for Partition {
    fn default() -> Self {
        Partition {
            pack_key: dict::CLOSED_COMPLETE_HEADER.ul,
            major_version: 1,
            minor_version: 2,
            kag_size: 1,
            this_partition: 0,
            previous_partition: 0,
            footer_partition: 0,
            header_byte_count: 0,
            index_byte_count: 0,
            index_sid: 0,
            body_offset: 0,
            body_sid: 0,
            operational_pattern: Ul::NIL,
            essence_containers: Vec::new(),
        }
    }
}

impl Partition {
    pub fn new(pack_key: Ul) -> Self {
        Partition {
            pack_key,
            ..Default::default()
        }
    }

    /// Bytes this pack occupies on disk, key and 4-byte length included.
    pub fn archive_size(&self) -> u64 {
        (KL_LENGTH + PARTITION_FIXED_LENGTH + 8 + UL_LENGTH * self.essence_containers.len()) as u64
    }

    pub fn parse_value(pack_key: Ul, value: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(value);
        Ok(Partition {
            pack_key,
            major_version: r.read_u16()?,
            minor_version: r.read_u16()?,
            kag_size: r.read_u32()?,
            this_partition: r.read_u64()?,
            previous_partition: r.read_u64()?,
            footer_partition: r.read_u64()?,
            header_byte_count: r.read_u64()?,
            index_byte_count: r.read_u64()?,
            index_sid: r.read_u32()?,
            body_offset: r.read_u64()?,
            body_sid: r.read_u32()?,
            operational_pattern: r.read_ul()?,
            essence_containers: unarchive_batch(&mut r)?,
        })
    }

    /// Read a partition pack at the reader's current position.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let offset = reader.stream_position()?;
        let (kl, value) = klv::read_klv_packet(reader, offset)?;
        if !dict::is_partition_pack(&kl.key) {
            return Err(AsdcpError::format(format!(
                "expected a partition pack at offset 0x{offset:X}, found {}",
                dict::name_of(&kl.key)
            )));
        }
        Partition::parse_value(kl.key, &value)
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        out.extend_from_slice(self.pack_key.as_bytes());
        klv::encode_ber(out, 0, MXF_BER_LENGTH)?;
        let value_start = out.len();
        self.major_version.archive(out);
        self.minor_version.archive(out);
        self.kag_size.archive(out);
        self.this_partition.archive(out);
        self.previous_partition.archive(out);
        self.footer_partition.archive(out);
        self.header_byte_count.archive(out);
        self.index_byte_count.archive(out);
        self.index_sid.archive(out);
        self.body_offset.archive(out);
        self.body_sid.archive(out);
        self.operational_pattern.archive(out);
        archive_batch(&self.essence_containers, UL_LENGTH as u32, out);
        let value_len = (out.len() - value_start) as u64;
        patch_ber4(out, start + UL_LENGTH, value_len)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut out = Vec::with_capacity(self.archive_size() as usize);
        self.encode(&mut out)?;
        writer.write_all(&out)?;
        Ok(())
    }
}

/// Overwrite a 4-byte BER placeholder at `at` with `value`.
pub(crate) fn patch_ber4(out: &mut [u8], at: usize, value: u64) -> Result<()> {
    let mut ber = Vec::with_capacity(MXF_BER_LENGTH);
    klv::encode_ber(&mut ber, value, MXF_BER_LENGTH)?;
    out[at..at + MXF_BER_LENGTH].copy_from_slice(&ber);
    Ok(())
}

/// Append a KLV fill packet so that `out` ends up exactly `total` bytes long.
///
/// The remaining space must hold at least a key and a 4-byte length.
pub fn fill_to(out: &mut Vec<u8>, total: usize, fill_key: &Ul) -> Result<()> {
    let remaining = total
        .checked_sub(out.len())
        .filter(|r| *r >= KL_LENGTH)
        .ok_or(AsdcpError::HeaderOverflow {
            needed: (out.len() + KL_LENGTH) as u64,
            reserved: total as u64,
        })?;
    out.extend_from_slice(fill_key.as_bytes());
    klv::encode_ber(out, (remaining - KL_LENGTH) as u64, MXF_BER_LENGTH)?;
    out.resize(total, 0);
    Ok(())
}

/// One (BodySID, ByteOffset) entry of the random index pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RipPair {
    pub body_sid: u32,
    pub byte_offset: u64,
}

/// Random index pack: offsets of every partition, at the very end of the file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Rip {
    pub pairs: Vec<RipPair>,
}

impl Rip {
    pub fn push(&mut self, body_sid: u32, byte_offset: u64) {
        self.pairs.push(RipPair {
            body_sid,
            byte_offset,
        });
    }

    /// Total on-disk size, key and trailing length included.
    pub fn archive_size(&self) -> u64 {
        (KL_LENGTH + RIP_PAIR_LENGTH * self.pairs.len() + 4) as u64
    }

    /// Read a RIP packet at the reader's current position.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let offset = reader.stream_position()?;
        let (kl, value) = klv::read_klv_packet(reader, offset)?;
        if kl.key != dict::RANDOM_INDEX_METADATA.ul {
            return Err(AsdcpError::KeyMismatch {
                offset,
                expected: dict::RANDOM_INDEX_METADATA.ul,
                got: kl.key,
            });
        }
        if value.len() < 4 || (value.len() - 4) % RIP_PAIR_LENGTH != 0 {
            return Err(AsdcpError::format(format!(
                "RIP value of {} bytes is not a whole number of entries",
                value.len()
            )));
        }
        let mut r = ByteReader::new(&value);
        let mut rip = Rip::default();
        for _ in 0..(value.len() - 4) / RIP_PAIR_LENGTH {
            let body_sid = r.read_u32()?;
            let byte_offset = r.read_u64()?;
            rip.push(body_sid, byte_offset);
        }
        let declared = r.read_u32()? as u64;
        if declared != kl.packet_length() {
            return Err(AsdcpError::format(format!(
                "RIP length field {declared} does not match its {} byte packet",
                kl.packet_length()
            )));
        }
        Ok(rip)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut out = Vec::with_capacity(self.archive_size() as usize);
        out.extend_from_slice(dict::RANDOM_INDEX_METADATA.ul.as_bytes());
        klv::encode_ber(
            &mut out,
            (RIP_PAIR_LENGTH * self.pairs.len() + 4) as u64,
            MXF_BER_LENGTH,
        )?;
        for pair in &self.pairs {
            pair.body_sid.archive(&mut out);
            pair.byte_offset.archive(&mut out);
        }
        (self.archive_size() as u32).archive(&mut out);
        writer.write_all(&out)?;
        Ok(())
    }
}

/// Position `reader` at the start of the RIP using the trailing length field.
///
/// Returns the RIP's offset. The trailing length is checked against the file
/// size before it is used.
pub fn seek_to_rip<R: Read + Seek>(reader: &mut R) -> Result<u64> {
    let end = reader.seek(SeekFrom::End(0))?;
    if end < KL_LENGTH as u64 {
        return Err(AsdcpError::format(format!(
            "file of {end} bytes is too small to be a track file"
        )));
    }
    reader.seek(SeekFrom::Start(end - 4))?;
    let mut trailer = [0u8; 4];
    reader
        .read_exact(&mut trailer)
        .map_err(|e| klv::eof_or_io(e, end - 4, "RIP length"))?;
    let rip_size = u32::from_be_bytes(trailer) as u64;
    if rip_size > end {
        return Err(AsdcpError::RipOutOfRange {
            rip_size,
            file_size: end,
        });
    }
    let start = end - rip_size;
    reader.seek(SeekFrom::Start(start))?;
    Ok(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    #[test]
    fn test_partition_archive_size_matches_encoding() {
        let mut p = Partition::new(dict::COMPLETE_FOOTER.ul);
        p.essence_containers = vec![dict::GC_MULTI.ul, dict::JPEG_2000_WRAPPING_FRAME.ul];
        p.footer_partition = 0x1234;
        let mut out = Vec::new();
        p.encode(&mut out).unwrap();
        assert_eq!(out.len() as u64, p.archive_size());
        assert_eq!(p.archive_size(), 108 + 32);

        let back = Partition::read_from(&mut Cursor::new(out)).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_read_rejects_non_partition_key() {
        let mut out = Vec::new();
        klv::encode_kl(&mut out, &dict::PRIMER.ul, 0).unwrap();
        let err = Partition::read_from(&mut Cursor::new(out)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_fill_to_exact_size() {
        let mut out = vec![1u8; 100];
        fill_to(&mut out, 200, &dict::KLV_FILL.ul).unwrap();
        assert_eq!(out.len(), 200);
        let klv = klv::parse_klv(&out[100..]).unwrap();
        assert_eq!(klv.value.len(), 80);

        let mut tight = vec![0u8; 190];
        let err = fill_to(&mut tight, 200, &dict::KLV_FILL.ul).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alloc);
    }

    #[test]
    fn test_rip_locate_and_read() {
        let mut rip = Rip::default();
        rip.push(0, 0);
        rip.push(1, 16384);
        rip.push(0, 99999);
        let mut file = vec![0xabu8; 64];
        rip.write_to(&mut file).unwrap();
        assert_eq!(file.len() as u64, 64 + rip.archive_size());

        let mut cursor = Cursor::new(file);
        assert_eq!(seek_to_rip(&mut cursor).unwrap(), 64);
        assert_eq!(Rip::read_from(&mut cursor).unwrap(), rip);
    }

    #[test]
    fn test_rip_length_past_start_of_file() {
        let mut file = vec![0u8; 40];
        file.extend_from_slice(&1000u32.to_be_bytes());
        let err = seek_to_rip(&mut Cursor::new(file)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn test_tiny_file_rejected() {
        let err = seek_to_rip(&mut Cursor::new(vec![0u8; 8])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
