//! Primer pack and local-set (tag/length/value) coding.

use std::collections::HashMap;

use crate::dict::{self, DictEntry};
use crate::error::{AsdcpError, Result};
use crate::klv::{self, MXF_BER_LENGTH};
use crate::partition::patch_ber4;
use crate::types::{archive_batch, unarchive_batch, Archive, ByteReader, Unarchive};
use crate::ul::{Ul, UL_LENGTH};

/// Dynamic tags are handed out downward from here.
const FIRST_DYNAMIC_TAG: u16 = 0xffff;
const LAST_DYNAMIC_TAG: u16 = 0x8000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LocalTagEntry {
    tag: u16,
    ul: Ul,
}

impl Archive for LocalTagEntry {
    fn archive(&self, out: &mut Vec<u8>) {
        self.tag.archive(out);
        self.ul.archive(out);
    }
}

impl Unarchive for LocalTagEntry {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(LocalTagEntry {
            tag: r.read_u16()?,
            ul: r.read_ul()?,
        })
    }
}

/// Bidirectional local tag to UL map for one partition.
#[derive(Debug, Clone)]
pub struct Primer {
    entries: Vec<LocalTagEntry>,
    by_ul: HashMap<Ul, u16>,
    by_tag: HashMap<u16, Ul>,
    next_dynamic: u16,
}

impl Default for Primer {
    fn default() -> Self {
        Primer {
            entries: Vec::new(),
            by_ul: HashMap::new(),
            by_tag: HashMap::new(),
            next_dynamic: FIRST_DYNAMIC_TAG,
        }
    }
}

impl Primer {
    pub fn clear(&mut self) {
        *self = Primer::default();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tag already assigned to `ul`, if any.
    pub fn tag_for_key(&self, ul: &Ul) -> Option<u16> {
        self.by_ul.get(ul).copied()
    }

    pub fn ul_for_tag(&self, tag: u16) -> Option<Ul> {
        self.by_tag.get(&tag).copied()
    }

    /// Return the tag for `ul`, assigning one on first use.
    ///
    /// `static_tag` is used when non-zero; otherwise the next dynamic tag is taken.
    pub fn insert(&mut self, ul: &Ul, static_tag: u16) -> Result<u16> {
        if let Some(tag) = self.tag_for_key(ul) {
            return Ok(tag);
        }
        let tag = if static_tag != 0 {
            static_tag
        } else {
            if self.next_dynamic < LAST_DYNAMIC_TAG {
                return Err(AsdcpError::format("primer ran out of dynamic local tags"));
            }
            let tag = self.next_dynamic;
            self.next_dynamic -= 1;
            tag
        };
        self.push(tag, *ul);
        Ok(tag)
    }

    pub fn insert_tag(&mut self, entry: &DictEntry) -> Result<u16> {
        self.insert(&entry.ul, entry.tag)
    }

    fn push(&mut self, tag: u16, ul: Ul) {
        self.entries.push(LocalTagEntry { tag, ul });
        self.by_ul.insert(ul, tag);
        self.by_tag.insert(tag, ul);
    }

    pub fn parse_value(value: &[u8]) -> Result<Self> {
        let entries: Vec<LocalTagEntry> = unarchive_batch(&mut ByteReader::new(value))?;
        let mut primer = Primer::default();
        for e in entries {
            primer.push(e.tag, e.ul);
        }
        Ok(primer)
    }

    /// Append the primer pack as a KLV packet.
    pub fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        out.extend_from_slice(dict::PRIMER.ul.as_bytes());
        klv::encode_ber(out, 0, MXF_BER_LENGTH)?;
        let value_start = out.len();
        archive_batch(&self.entries, (2 + UL_LENGTH) as u32, out);
        let value_len = (out.len() - value_start) as u64;
        patch_ber4(out, start + UL_LENGTH, value_len)
    }
}

/// One raw item of a local set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub tag: u16,
    /// Resolved through the primer, when it knows the tag.
    pub ul: Option<Ul>,
    pub value: Vec<u8>,
}

/// Indexed view of one local set's items.
pub struct TlvReader<'a> {
    primer: &'a Primer,
    items: Vec<(u16, &'a [u8])>,
    by_tag: HashMap<u16, &'a [u8]>,
}

impl<'a> TlvReader<'a> {
    pub fn new(primer: &'a Primer, value: &'a [u8]) -> Result<Self> {
        let mut r = ByteReader::new(value);
        let mut items = Vec::new();
        let mut by_tag = HashMap::new();
        while !r.is_empty() {
            let tag = r.read_u16()?;
            let len = r.read_u16()? as usize;
            let bytes = r.read_bytes(len).map_err(|_| {
                AsdcpError::KlvCoding(format!(
                    "local tag {tag:04x} declares {len} bytes past the end of its set"
                ))
            })?;
            items.push((tag, bytes));
            by_tag.insert(tag, bytes);
        }
        Ok(TlvReader {
            primer,
            items,
            by_tag,
        })
    }

    /// Raw bytes of the item described by `entry`, or `None` if absent or empty.
    pub fn find(&self, entry: &DictEntry) -> Option<&'a [u8]> {
        let tag = self.primer.tag_for_key(&entry.ul).or_else(|| {
            if entry.tag != 0 && self.primer.ul_for_tag(entry.tag).is_none() {
                Some(entry.tag)
            } else {
                None
            }
        })?;
        self.by_tag.get(&tag).copied().filter(|b| !b.is_empty())
    }

    pub fn read<T: Unarchive>(&self, entry: &DictEntry) -> Result<Option<T>> {
        match self.find(entry) {
            Some(bytes) => Ok(Some(T::unarchive(&mut ByteReader::new(bytes))?)),
            None => Ok(None),
        }
    }

    /// Read a field, treating absence as a structural error.
    pub fn required<T: Unarchive>(&self, entry: &'static DictEntry) -> Result<T> {
        self.read(entry)?
            .ok_or_else(|| AsdcpError::format(format!("required item {} is missing", entry.name)))
    }

    pub fn read_or_default<T: Unarchive + Default>(&self, entry: &DictEntry) -> Result<T> {
        Ok(self.read(entry)?.unwrap_or_default())
    }

    pub fn read_batch<T: Unarchive>(&self, entry: &DictEntry) -> Result<Vec<T>> {
        match self.find(entry) {
            Some(bytes) => unarchive_batch(&mut ByteReader::new(bytes)),
            None => Ok(Vec::new()),
        }
    }

    pub fn read_string(&self, entry: &DictEntry) -> Option<String> {
        self.find(entry).map(crate::types::decode_utf16be)
    }

    pub fn read_raw(&self, entry: &DictEntry) -> Option<Vec<u8>> {
        self.find(entry).map(<[u8]>::to_vec)
    }

    /// All items in file order, with their primer-resolved labels.
    pub fn raw_items(&self) -> Vec<RawItem> {
        self.items
            .iter()
            .map(|(tag, bytes)| RawItem {
                tag: *tag,
                ul: self.primer.ul_for_tag(*tag),
                value: bytes.to_vec(),
            })
            .collect()
    }
}

/// Builds the value of one local set, registering tags with the primer.
pub struct TlvWriter<'a> {
    primer: &'a mut Primer,
    out: Vec<u8>,
}

impl<'a> TlvWriter<'a> {
    pub fn new(primer: &'a mut Primer) -> Self {
        TlvWriter {
            primer,
            out: Vec::new(),
        }
    }

    pub fn write_raw_ul(&mut self, ul: &Ul, static_tag: u16, bytes: &[u8]) -> Result<()> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            AsdcpError::KlvCoding(format!(
                "item {} of {} bytes does not fit a local set",
                dict::name_of(ul),
                bytes.len()
            ))
        })?;
        let tag = self.primer.insert(ul, static_tag)?;
        self.out.extend_from_slice(&tag.to_be_bytes());
        self.out.extend_from_slice(&len.to_be_bytes());
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    /// Write an item under a tag the primer has no label for.
    pub fn write_tagged(&mut self, tag: u16, bytes: &[u8]) -> Result<()> {
        let len = u16::try_from(bytes.len())
            .map_err(|_| AsdcpError::KlvCoding(format!("item {tag:04x} does not fit a local set")))?;
        self.out.extend_from_slice(&tag.to_be_bytes());
        self.out.extend_from_slice(&len.to_be_bytes());
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_raw(&mut self, entry: &DictEntry, bytes: &[u8]) -> Result<()> {
        self.write_raw_ul(&entry.ul, entry.tag, bytes)
    }

    pub fn write<T: Archive + ?Sized>(&mut self, entry: &DictEntry, value: &T) -> Result<()> {
        let mut bytes = Vec::new();
        value.archive(&mut bytes);
        self.write_raw(entry, &bytes)
    }

    /// Write the field only when a value is present.
    pub fn write_opt<T: Archive>(&mut self, entry: &DictEntry, value: &Option<T>) -> Result<()> {
        match value {
            Some(v) => self.write(entry, v),
            None => Ok(()),
        }
    }

    pub fn write_batch<T: Archive>(&mut self, entry: &DictEntry, items: &[T], item_size: u32) -> Result<()> {
        let mut bytes = Vec::new();
        archive_batch(items, item_size, &mut bytes);
        self.write_raw(entry, &bytes)
    }

    pub fn write_string(&mut self, entry: &DictEntry, value: &str) -> Result<()> {
        self.write_raw(entry, &crate::types::encode_utf16be(value))
    }

    pub fn write_opt_string(&mut self, entry: &DictEntry, value: &Option<String>) -> Result<()> {
        match value {
            Some(s) => self.write_string(entry, s),
            None => Ok(()),
        }
    }

    pub fn write_opt_raw(&mut self, entry: &DictEntry, value: &Option<Vec<u8>>) -> Result<()> {
        match value {
            Some(b) => self.write_raw(entry, b),
            None => Ok(()),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_then_dynamic_tags() {
        let mut primer = Primer::default();
        assert_eq!(primer.insert_tag(&dict::INSTANCE_UID).unwrap(), 0x3c0a);
        assert_eq!(primer.insert_tag(&dict::J2K_RSIZE).unwrap(), 0xffff);
        assert_eq!(primer.insert_tag(&dict::J2K_XSIZE).unwrap(), 0xfffe);
        // repeated lookups reuse the first assignment
        assert_eq!(primer.insert_tag(&dict::J2K_RSIZE).unwrap(), 0xffff);
        assert_eq!(primer.len(), 3);
    }

    #[test]
    fn test_primer_pack_round_trip() {
        let mut primer = Primer::default();
        primer.insert_tag(&dict::TRACK_ID).unwrap();
        primer.insert_tag(&dict::DESCRIPTOR_SUB_DESCRIPTORS).unwrap();
        let mut out = Vec::new();
        primer.encode(&mut out).unwrap();
        assert_eq!(out.len(), 20 + 8 + 2 * 18);

        let klv = klv::parse_klv(&out).unwrap();
        let back = Primer::parse_value(klv.value).unwrap();
        assert_eq!(back.tag_for_key(&dict::TRACK_ID.ul), Some(0x4801));
        assert_eq!(back.ul_for_tag(0xffff), Some(dict::DESCRIPTOR_SUB_DESCRIPTORS.ul));
    }

    #[test]
    fn test_tlv_write_then_find() {
        let mut primer = Primer::default();
        let mut w = TlvWriter::new(&mut primer);
        w.write(&dict::TRACK_ID, &2u32).unwrap();
        w.write_opt::<u32>(&dict::TRACK_NUMBER, &None).unwrap();
        w.write_string(&dict::TRACK_NAME, "Picture Track").unwrap();
        w.write(&dict::J2K_CSIZE, &3u16).unwrap();
        let value = w.finish();

        let r = TlvReader::new(&primer, &value).unwrap();
        assert_eq!(r.read::<u32>(&dict::TRACK_ID).unwrap(), Some(2));
        assert_eq!(r.read::<u32>(&dict::TRACK_NUMBER).unwrap(), None);
        assert_eq!(r.read_string(&dict::TRACK_NAME).as_deref(), Some("Picture Track"));
        assert_eq!(r.read::<u16>(&dict::J2K_CSIZE).unwrap(), Some(3));
        assert_eq!(r.raw_items().len(), 3);
    }

    #[test]
    fn test_tlv_rejects_overrun() {
        let primer = Primer::default();
        let value = [0x48, 0x01, 0x00, 0x08, 0x00, 0x00];
        assert!(TlvReader::new(&primer, &value).is_err());
    }
}
