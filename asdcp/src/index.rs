//! Index table segments and the footer partition that carries them.

use std::io::{Read, Seek, SeekFrom, Write};

use uuid::Uuid;

use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::klv;
use crate::partition::Partition;
use crate::primer::{Primer, TlvReader, TlvWriter};
use crate::types::{Archive, ByteReader, Rational, Unarchive};

/// Entries per VBR segment before a new segment is opened.
pub const INDEX_SEGMENT_CAPACITY: usize = 5000;
pub const INDEX_SID: u32 = 129;
pub const BODY_SID: u32 = 1;

const INDEX_ENTRY_SIZE: u32 = 11;
const DELTA_ENTRY_SIZE: u32 = 6;

/// One frame's index record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexEntry {
    pub temporal_offset: i8,
    pub key_frame_offset: i8,
    pub flags: u8,
    /// Offset from the start of the essence container.
    pub stream_offset: u64,
}

impl Archive for IndexEntry {
    fn archive(&self, out: &mut Vec<u8>) {
        self.temporal_offset.archive(out);
        self.key_frame_offset.archive(out);
        self.flags.archive(out);
        self.stream_offset.archive(out);
    }
}

impl Unarchive for IndexEntry {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(IndexEntry {
            temporal_offset: r.read_i8()?,
            key_frame_offset: r.read_i8()?,
            flags: r.read_u8()?,
            stream_offset: r.read_u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct DeltaEntry {
    pub pos_table_index: i8,
    pub slice: u8,
    pub element_data: u32,
}

impl DeltaEntry {
    pub const fn new(pos_table_index: i8, slice: u8, element_data: u32) -> Self {
        DeltaEntry {
            pos_table_index,
            slice,
            element_data,
        }
    }
}

impl Archive for DeltaEntry {
    fn archive(&self, out: &mut Vec<u8>) {
        self.pos_table_index.archive(out);
        self.slice.archive(out);
        self.element_data.archive(out);
    }
}

impl Unarchive for DeltaEntry {
    fn unarchive(r: &mut ByteReader<'_>) -> Result<Self> {
        Ok(DeltaEntry {
            pos_table_index: r.read_i8()?,
            slice: r.read_u8()?,
            element_data: r.read_u32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexTableSegment {
    pub instance_uid: Uuid,
    pub index_edit_rate: Rational,
    pub index_start_position: i64,
    pub index_duration: i64,
    /// Non-zero for a constant-size (CBR) index.
    pub edit_unit_byte_count: u32,
    pub index_sid: u32,
    pub body_sid: u32,
    pub slice_count: u8,
    pub pos_table_count: u8,
    pub delta_entries: Vec<DeltaEntry>,
    #[serde(skip)]
    pub index_entries: Vec<IndexEntry>,
}

impl IndexTableSegment {
    fn new(edit_rate: Rational, start: i64) -> Self {
        IndexTableSegment {
            instance_uid: Uuid::new_v4(),
            index_edit_rate: edit_rate,
            index_start_position: start,
            index_duration: 0,
            edit_unit_byte_count: 0,
            index_sid: INDEX_SID,
            body_sid: BODY_SID,
            slice_count: 0,
            pos_table_count: 0,
            delta_entries: Vec::new(),
            index_entries: Vec::new(),
        }
    }

    pub fn is_cbr(&self) -> bool {
        self.edit_unit_byte_count > 0
    }

    /// First edit unit past this segment, or None if it does not fit an i64.
    fn end_position(&self) -> Option<i64> {
        self.index_start_position.checked_add(self.index_duration)
    }

    fn contains(&self, frame: u64) -> bool {
        let frame = frame as i64;
        frame >= self.index_start_position && self.end_position().is_some_and(|end| frame < end)
    }

    fn parse(value: &[u8], primer: &Primer) -> Result<Self> {
        let r = TlvReader::new(primer, value)?;
        let segment = IndexTableSegment {
            instance_uid: r.read_or_default(&dict::INSTANCE_UID)?,
            index_edit_rate: r.read_or_default(&dict::INDEX_EDIT_RATE)?,
            index_start_position: r.read_or_default(&dict::INDEX_START_POSITION)?,
            index_duration: r.read_or_default(&dict::INDEX_DURATION)?,
            edit_unit_byte_count: r.read_or_default(&dict::INDEX_EDIT_UNIT_BYTE_COUNT)?,
            index_sid: r.read_or_default(&dict::INDEX_SID)?,
            body_sid: r.read_or_default(&dict::BODY_SID)?,
            slice_count: r.read_or_default(&dict::INDEX_SLICE_COUNT)?,
            pos_table_count: r.read_or_default(&dict::INDEX_POS_TABLE_COUNT)?,
            delta_entries: r.read_batch(&dict::INDEX_DELTA_ENTRY_ARRAY)?,
            index_entries: r.read_batch(&dict::INDEX_ENTRY_ARRAY)?,
        };
        if segment.index_start_position < 0 || segment.index_duration < 0 {
            return Err(AsdcpError::format(format!(
                "index segment has negative start {} or duration {}",
                segment.index_start_position, segment.index_duration
            )));
        }
        if segment.end_position().is_none() {
            return Err(AsdcpError::format(format!(
                "index segment start {} plus duration {} overflows",
                segment.index_start_position, segment.index_duration
            )));
        }
        if !segment.is_cbr() && (segment.index_entries.len() as u64) < segment.index_duration as u64 {
            return Err(AsdcpError::format(format!(
                "index segment covers {} edit units but carries {} entries",
                segment.index_duration,
                segment.index_entries.len()
            )));
        }
        Ok(segment)
    }

    fn encode(&self, primer: &mut Primer, out: &mut Vec<u8>) -> Result<()> {
        let mut w = TlvWriter::new(primer);
        w.write(&dict::INSTANCE_UID, &self.instance_uid)?;
        w.write(&dict::INDEX_EDIT_RATE, &self.index_edit_rate)?;
        w.write(&dict::INDEX_START_POSITION, &self.index_start_position)?;
        w.write(&dict::INDEX_DURATION, &self.index_duration)?;
        w.write(&dict::INDEX_EDIT_UNIT_BYTE_COUNT, &self.edit_unit_byte_count)?;
        w.write(&dict::INDEX_SID, &self.index_sid)?;
        w.write(&dict::BODY_SID, &self.body_sid)?;
        w.write(&dict::INDEX_SLICE_COUNT, &self.slice_count)?;
        w.write(&dict::INDEX_POS_TABLE_COUNT, &self.pos_table_count)?;
        if !self.delta_entries.is_empty() {
            w.write_batch(&dict::INDEX_DELTA_ENTRY_ARRAY, &self.delta_entries, DELTA_ENTRY_SIZE)?;
        }
        if !self.is_cbr() {
            w.write_batch(&dict::INDEX_ENTRY_ARRAY, &self.index_entries, INDEX_ENTRY_SIZE)?;
        }
        let value = w.finish();
        klv::encode_kl(out, &dict::INDEX_TABLE_SEGMENT.ul, value.len() as u64)?;
        out.extend_from_slice(&value);
        Ok(())
    }
}

/// Reject footers that mix CBR and VBR segments or whose VBR segments leave gaps.
fn check_segments(segments: &[IndexTableSegment]) -> Result<()> {
    let Some(first) = segments.first() else {
        return Ok(());
    };
    if segments.iter().any(|s| s.is_cbr() != first.is_cbr()) {
        return Err(AsdcpError::format("index mixes CBR and VBR segments"));
    }
    if first.is_cbr() {
        return Ok(());
    }
    for pair in segments.windows(2) {
        if pair[0].end_position() != Some(pair[1].index_start_position) {
            return Err(AsdcpError::format(format!(
                "index segment at {} does not follow the one at {}",
                pair[1].index_start_position, pair[0].index_start_position
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum IndexMode {
    Unset,
    Cbr,
    Vbr,
}

/// Footer partition carrying the complete index table.
#[derive(Debug, Clone)]
pub struct IndexFooter {
    pub partition: Partition,
    segments: Vec<IndexTableSegment>,
    mode: IndexMode,
    edit_rate: Rational,
    delta_entries: Vec<DeltaEntry>,
}

impl Default for IndexFooter {
    fn default() -> Self {
        let mut partition = Partition::new(dict::COMPLETE_FOOTER.ul);
        partition.index_sid = INDEX_SID;
        IndexFooter {
            partition,
            segments: Vec::new(),
            mode: IndexMode::Unset,
            edit_rate: Rational::default(),
            delta_entries: Vec::new(),
        }
    }
}

impl IndexFooter {
    /// Read the footer partition at the reader's position.
    ///
    /// Index segments are decoded with the header's primer; their tags are static
    /// so an empty primer works as well.
    pub fn read_from<R: Read + Seek>(reader: &mut R, primer: &Primer) -> Result<Self> {
        let partition = Partition::read_from(reader)?;
        if partition.pack_key.as_bytes()[13] != 0x04 {
            return Err(AsdcpError::format("expected a footer partition"));
        }
        if partition.header_byte_count > 0 {
            let skip = i64::try_from(partition.header_byte_count).map_err(|_| {
                AsdcpError::format(format!(
                    "footer header byte count {} is implausibly large",
                    partition.header_byte_count
                ))
            })?;
            reader.seek(SeekFrom::Current(skip))?;
        }
        if partition.index_byte_count > klv::MAX_KLV_PACKET_LENGTH {
            return Err(AsdcpError::format(format!(
                "index byte count {} is implausibly large",
                partition.index_byte_count
            )));
        }
        let offset = reader.stream_position()?;
        let mut buf = vec![0u8; partition.index_byte_count as usize];
        reader
            .read_exact(&mut buf)
            .map_err(|e| klv::eof_or_io(e, offset, "index table"))?;

        let mut segments = Vec::new();
        let mut pos = 0;
        while pos < buf.len() {
            let packet = klv::parse_klv(&buf[pos..])?;
            pos += packet.packet_length();
            if packet.key == dict::INDEX_TABLE_SEGMENT.ul {
                segments.push(IndexTableSegment::parse(packet.value, primer)?);
            } else if packet.key != dict::KLV_FILL.ul {
                log::debug!("skipping {} in footer", dict::name_of(&packet.key));
            }
        }

        check_segments(&segments)?;
        let mode = match segments.first() {
            Some(s) if s.is_cbr() => IndexMode::Cbr,
            Some(_) => IndexMode::Vbr,
            None => IndexMode::Unset,
        };
        let edit_rate = segments
            .first()
            .map(|s| s.index_edit_rate)
            .unwrap_or_default();
        Ok(IndexFooter {
            partition,
            segments,
            mode,
            edit_rate,
            delta_entries: Vec::new(),
        })
    }

    pub fn segments(&self) -> &[IndexTableSegment] {
        &self.segments
    }

    /// Constant-size index: one segment, offsets computed as `frame * bytes`.
    pub fn set_params_cbr(&mut self, edit_rate: Rational, bytes_per_edit_unit: u32) -> Result<()> {
        if self.mode != IndexMode::Unset {
            return Err(AsdcpError::State {
                state: "index configured",
                op: "set CBR index parameters",
            });
        }
        if bytes_per_edit_unit == 0 {
            return Err(AsdcpError::param("CBR edit unit size must be non-zero"));
        }
        self.mode = IndexMode::Cbr;
        self.edit_rate = edit_rate;
        let mut segment = IndexTableSegment::new(edit_rate, 0);
        segment.edit_unit_byte_count = bytes_per_edit_unit;
        segment.delta_entries = self.delta_entries.clone();
        self.segments.push(segment);
        Ok(())
    }

    /// Variable-size index: one entry per frame, segments opened on demand.
    pub fn set_params_vbr(&mut self, edit_rate: Rational) -> Result<()> {
        if self.mode != IndexMode::Unset {
            return Err(AsdcpError::State {
                state: "index configured",
                op: "set VBR index parameters",
            });
        }
        self.mode = IndexMode::Vbr;
        self.edit_rate = edit_rate;
        Ok(())
    }

    /// Delta entries copied into every segment opened afterwards.
    pub fn set_delta_params(&mut self, entries: Vec<DeltaEntry>) {
        for s in &mut self.segments {
            s.delta_entries = entries.clone();
        }
        self.delta_entries = entries;
    }

    pub fn push_entry(&mut self, entry: IndexEntry) -> Result<()> {
        match self.mode {
            IndexMode::Vbr => {}
            IndexMode::Cbr => {
                return Err(AsdcpError::State {
                    state: "CBR index",
                    op: "push index entry",
                });
            }
            IndexMode::Unset => {
                return Err(AsdcpError::State {
                    state: "index not configured",
                    op: "push index entry",
                });
            }
        }

        let needs_segment = self
            .segments
            .last()
            .map(|s| s.index_entries.len() >= INDEX_SEGMENT_CAPACITY)
            .unwrap_or(true);
        if needs_segment {
            let start = match self.segments.last_mut() {
                Some(prev) => {
                    prev.index_duration = prev.index_entries.len() as i64;
                    prev.index_start_position + prev.index_duration
                }
                None => 0,
            };
            let mut segment = IndexTableSegment::new(self.edit_rate, start);
            segment.delta_entries = self.delta_entries.clone();
            self.segments.push(segment);
        }

        let last_offset = self
            .segments
            .iter()
            .rev()
            .find_map(|s| s.index_entries.last())
            .map(|e| e.stream_offset);
        if last_offset.is_some_and(|last| entry.stream_offset < last) {
            return Err(AsdcpError::param("index stream offsets must not decrease"));
        }

        if let Some(segment) = self.segments.last_mut() {
            segment.index_entries.push(entry);
            segment.index_duration = segment.index_entries.len() as i64;
        }
        Ok(())
    }

    /// Index entry for `frame`. CBR entries carry only the computed offset.
    pub fn lookup(&self, frame: u32) -> Result<IndexEntry> {
        for segment in &self.segments {
            if segment.is_cbr() {
                if self.segments.len() > 1 {
                    log::warn!("Multiple segments in CBR index");
                }
                if segment.index_duration > 0 && frame as i64 >= segment.index_duration {
                    break;
                }
                return Ok(IndexEntry {
                    stream_offset: frame as u64 * segment.edit_unit_byte_count as u64,
                    ..Default::default()
                });
            }
            if segment.contains(frame as u64) {
                let i = (frame as i64 - segment.index_start_position) as usize;
                if let Some(entry) = segment.index_entries.get(i) {
                    return Ok(*entry);
                }
            }
        }
        Err(AsdcpError::FrameOutOfRange { frame })
    }

    /// Number of frames the index covers.
    pub fn duration(&self) -> u64 {
        if let Some(s) = self.segments.first().filter(|s| s.is_cbr()) {
            return s.index_duration.max(0) as u64;
        }
        self.segments
            .iter()
            .fold(0u64, |total, s| total.saturating_add(s.index_duration.max(0) as u64))
    }

    /// Seal the index for `duration` frames and write the footer partition.
    pub fn write_to<W: Write>(
        &mut self,
        writer: &mut W,
        duration: u64,
        label_set: LabelSetType,
    ) -> Result<()> {
        for segment in &mut self.segments {
            if segment.is_cbr() {
                segment.index_duration = duration as i64;
            } else {
                segment.index_duration = segment.index_entries.len() as i64;
            }
        }

        let mut scratch = Primer::default();
        let mut body = Vec::new();
        for segment in &self.segments {
            segment.encode(&mut scratch, &mut body)?;
        }
        log::debug!(
            "writing footer with {} index segment(s), {} label set",
            self.segments.len(),
            if label_set == LabelSetType::Interop { "Interop" } else { "SMPTE" }
        );

        self.partition.header_byte_count = 0;
        self.partition.index_byte_count = body.len() as u64;
        self.partition.index_sid = INDEX_SID;
        self.partition.body_sid = 0;
        self.partition.write_to(writer)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::EDIT_RATE_24;
    use std::io::Cursor;

    fn entry(offset: u64) -> IndexEntry {
        IndexEntry {
            stream_offset: offset,
            flags: 0x80,
            ..Default::default()
        }
    }

    #[test]
    fn test_cbr_offsets() {
        let mut footer = IndexFooter::default();
        footer.set_params_cbr(EDIT_RATE_24, 6020).unwrap();
        assert_eq!(footer.lookup(0).unwrap().stream_offset, 0);
        assert_eq!(footer.lookup(17).unwrap().stream_offset, 17 * 6020);
        let err = footer.push_entry(entry(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_vbr_lookup_and_range() {
        let mut footer = IndexFooter::default();
        footer.set_params_vbr(EDIT_RATE_24).unwrap();
        for i in 0..10 {
            footer.push_entry(entry(i * 100)).unwrap();
        }
        assert_eq!(footer.lookup(9).unwrap().stream_offset, 900);
        assert_eq!(footer.lookup(10).unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(footer.duration(), 10);
    }

    #[test]
    fn test_rejects_decreasing_offsets() {
        let mut footer = IndexFooter::default();
        footer.set_params_vbr(EDIT_RATE_24).unwrap();
        footer.push_entry(entry(500)).unwrap();
        assert_eq!(footer.push_entry(entry(10)).unwrap_err().kind(), ErrorKind::Param);
    }

    #[test]
    fn test_footer_write_then_read() {
        let mut footer = IndexFooter::default();
        footer.set_params_vbr(EDIT_RATE_24).unwrap();
        footer.set_delta_params(vec![DeltaEntry::new(-1, 0, 0)]);
        for i in 0..3 {
            footer.push_entry(entry(i * 1000)).unwrap();
        }
        let mut out = Vec::new();
        footer.write_to(&mut out, 3, LabelSetType::Smpte).unwrap();

        let back = IndexFooter::read_from(&mut Cursor::new(out), &Primer::default()).unwrap();
        assert_eq!(back.segments(), footer.segments());
        assert_eq!(back.lookup(2).unwrap().stream_offset, 2000);
        assert_eq!(back.segments()[0].delta_entries, vec![DeltaEntry::new(-1, 0, 0)]);
    }

    /// Footer partition bytes carrying `segments` exactly as given.
    fn raw_footer(segments: &[IndexTableSegment], header_byte_count: u64) -> Vec<u8> {
        let mut scratch = Primer::default();
        let mut body = Vec::new();
        for segment in segments {
            segment.encode(&mut scratch, &mut body).unwrap();
        }
        let mut footer = IndexFooter::default();
        footer.partition.header_byte_count = header_byte_count;
        footer.partition.index_byte_count = body.len() as u64;
        let mut out = Vec::new();
        footer.partition.write_to(&mut out).unwrap();
        out.extend_from_slice(&body);
        out
    }

    fn read_raw(segments: &[IndexTableSegment]) -> Result<IndexFooter> {
        IndexFooter::read_from(&mut Cursor::new(raw_footer(segments, 0)), &Primer::default())
    }

    fn cbr(start: i64, duration: i64) -> IndexTableSegment {
        let mut s = IndexTableSegment::new(EDIT_RATE_24, start);
        s.index_duration = duration;
        s.edit_unit_byte_count = 1000;
        s
    }

    fn vbr(start: i64, entries: u64) -> IndexTableSegment {
        let mut s = IndexTableSegment::new(EDIT_RATE_24, start);
        s.index_entries = (0..entries).map(|i| entry(i * 10)).collect();
        s.index_duration = entries as i64;
        s
    }

    #[test]
    fn test_damaged_segments_rejected() {
        let mut short = vbr(0, 2);
        short.index_duration = 4;
        let cases = [
            ("overflowing end", vec![cbr(1, i64::MAX)]),
            ("negative start", vec![cbr(-5, 10)]),
            ("negative duration", vec![cbr(0, -1)]),
            ("entries missing", vec![short]),
            ("no entries at all", vec![{
                let mut s = vbr(0, 0);
                s.index_duration = 4;
                s
            }]),
            ("mixed modes", vec![cbr(0, 10), vbr(10, 3)]),
            ("gap between segments", vec![vbr(0, 3), vbr(5, 3)]),
        ];
        for (what, segments) in cases {
            let err = read_raw(&segments).err().unwrap_or_else(|| panic!("{what} accepted"));
            assert_eq!(err.kind(), ErrorKind::Format, "{what}");
        }

        let back = read_raw(&[vbr(0, 3), vbr(3, 2)]).unwrap();
        assert_eq!(back.duration(), 5);
        assert_eq!(back.lookup(4).unwrap().stream_offset, 10);
        assert_eq!(back.lookup(5).unwrap_err().kind(), ErrorKind::Range);
    }

    #[test]
    fn test_huge_header_byte_count_rejected() {
        let data = raw_footer(&[cbr(0, 10)], u64::MAX);
        let err = IndexFooter::read_from(&mut Cursor::new(data), &Primer::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
