use std::io::{Read, Seek, SeekFrom, Write};

use uuid::Uuid;

use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::klv;
use crate::metadata::{MdObject, Preface, Sequence, SetVariant, SourcePackage, Track};
use crate::partition::{self, Partition, Rip};
use crate::primer::Primer;

/// Smallest header reservation the writer accepts.
pub const MIN_HEADER_SIZE: u32 = 4096;

/// Header partition: pack, primer and the metadata object graph.
#[derive(Debug, Clone)]
pub struct HeaderPartition {
    pub partition: Partition,
    pub primer: Primer,
    pub objects: Vec<MdObject>,
    pub rip: Rip,
    pub label_set: LabelSetType,
}

impl HeaderPartition {
    pub fn new(label_set: LabelSetType) -> Self {
        HeaderPartition {
            partition: Partition::new(dict::CLOSED_COMPLETE_HEADER.ul),
            primer: Primer::default(),
            objects: Vec::new(),
            rip: Rip::default(),
            label_set,
        }
    }

    /// Read the RIP and the header partition of a track file.
    ///
    /// On success the reader is left at the first byte after the header partition.
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        partition::seek_to_rip(reader)?;
        let rip = Rip::read_from(reader).map_err(|e| {
            log::error!("File contains no readable RIP: {e}");
            AsdcpError::format(format!("unreadable RIP: {e}"))
        })?;
        if rip.pairs.is_empty() {
            return Err(AsdcpError::format("RIP contains no pairs"));
        }
        if rip.pairs.len() < 2 {
            log::warn!("RIP contains fewer than two pairs");
        }
        if rip.pairs[0].byte_offset != 0 {
            return Err(AsdcpError::format("first RIP pair does not point to the header"));
        }

        reader.seek(SeekFrom::Start(0))?;
        let partition = Partition::read_from(reader)?;
        if partition.pack_key.as_bytes()[13] != 0x02 {
            return Err(AsdcpError::format("file does not begin with a header partition"));
        }
        if let Some(last) = rip.pairs.last().filter(|p| p.byte_offset != partition.footer_partition) {
            log::error!(
                "RIP ends at 0x{:X}, header names the footer at 0x{:X}",
                last.byte_offset,
                partition.footer_partition
            );
            return Err(AsdcpError::format("RIP does not list the footer partition"));
        }
        let metadata_start = reader.stream_position()?;
        let metadata_end = metadata_start
            .checked_add(partition.header_byte_count)
            .filter(|end| *end <= file_size)
            .ok_or_else(|| {
                AsdcpError::format(format!(
                    "header byte count {} runs past the end of the file",
                    partition.header_byte_count
                ))
            })?;

        let mut metadata = vec![0u8; partition.header_byte_count as usize];
        reader
            .read_exact(&mut metadata)
            .map_err(|e| klv::eof_or_io(e, metadata_start, "header metadata"))?;

        let (primer, objects) = parse_metadata(&metadata)?;

        let label_set = detect_label_set(&partition);
        reader.seek(SeekFrom::Start(metadata_end))?;
        Ok(HeaderPartition {
            partition,
            primer,
            objects,
            rip,
            label_set,
        })
    }

    /// Serialize the header into exactly `header_size` bytes at the writer's position.
    ///
    /// The primer is rebuilt from scratch on every call, so repeated writes of the
    /// same graph produce the same tags.
    pub fn write_to<W: Write>(&mut self, writer: &mut W, header_size: u32) -> Result<()> {
        if header_size < MIN_HEADER_SIZE {
            return Err(AsdcpError::param(format!(
                "header size {header_size} is too small, must be at least {MIN_HEADER_SIZE}"
            )));
        }
        if self.find::<Preface>().is_none() {
            return Err(AsdcpError::State {
                state: "no Preface",
                op: "write header",
            });
        }

        self.primer.clear();
        let mut objects = Vec::new();
        for obj in &self.objects {
            obj.encode(&mut self.primer, &mut objects)?;
        }

        self.partition.header_byte_count = header_size as u64 - self.partition.archive_size();
        let mut out = Vec::with_capacity(header_size as usize);
        self.partition.encode(&mut out)?;
        self.primer.encode(&mut out)?;
        out.extend_from_slice(&objects);
        partition::fill_to(&mut out, header_size as usize, &dict::klv_fill(self.label_set))?;
        writer.write_all(&out)?;
        Ok(())
    }

    pub fn add(&mut self, obj: MdObject) -> Uuid {
        let id = obj.instance_uid;
        self.objects.push(obj);
        id
    }

    /// First object of type `T`.
    pub fn find<T: SetVariant>(&self) -> Option<&T> {
        self.objects.iter().find_map(|o| o.get::<T>())
    }

    pub fn find_mut<T: SetVariant>(&mut self) -> Option<&mut T> {
        self.objects.iter_mut().find_map(|o| o.get_mut::<T>())
    }

    pub fn find_object<T: SetVariant>(&self) -> Option<&MdObject> {
        self.objects.iter().find(|o| o.get::<T>().is_some())
    }

    /// Every object of type `T`, in file order.
    pub fn find_all<T: SetVariant>(&self) -> Vec<&T> {
        self.objects.iter().filter_map(|o| o.get::<T>()).collect()
    }

    pub fn object_by_id(&self, id: &Uuid) -> Option<&MdObject> {
        self.objects.iter().find(|o| o.instance_uid == *id)
    }

    pub fn object_by_id_mut(&mut self, id: &Uuid) -> Option<&mut MdObject> {
        self.objects.iter_mut().find(|o| o.instance_uid == *id)
    }

    /// Typed lookup of a referenced object.
    pub fn get<T: SetVariant>(&self, id: &Uuid) -> Option<&T> {
        self.object_by_id(id).and_then(|o| o.get::<T>())
    }

    pub fn preface(&self) -> Result<&Preface> {
        self.find::<Preface>().ok_or(AsdcpError::MissingObject("Preface"))
    }

    pub fn preface_mut(&mut self) -> Result<&mut Preface> {
        self.find_mut::<Preface>()
            .ok_or(AsdcpError::MissingObject("Preface"))
    }

    /// The essence descriptor referenced by the file package.
    pub fn essence_descriptor(&self) -> Option<&MdObject> {
        let id = self.find::<SourcePackage>()?.descriptor?;
        self.object_by_id(&id)
    }

    /// The file package's timed track that does not carry timecode.
    pub fn essence_track(&self) -> Option<&Track> {
        let package = self.find::<SourcePackage>()?;
        package
            .package
            .tracks
            .iter()
            .filter_map(|id| self.get::<Track>(id))
            .find(|t| {
                t.track
                    .sequence
                    .and_then(|s| self.get::<Sequence>(&s))
                    .is_some_and(|s| s.component.data_definition != dict::TIMECODE_DATA_DEF.ul)
            })
    }
}

/// Split header metadata bytes into the primer and the parsed objects.
fn parse_metadata(buf: &[u8]) -> Result<(Primer, Vec<MdObject>)> {
    let mut primer: Option<Primer> = None;
    let mut objects = Vec::new();
    let mut pos = 0;

    while pos < buf.len() {
        let packet = klv::parse_klv(&buf[pos..]).map_err(|e| match e {
            AsdcpError::KlvCoding(msg) => {
                AsdcpError::KlvCoding(format!("header metadata at +0x{pos:X}: {msg}"))
            }
            other => other,
        })?;
        pos += packet.packet_length();

        if packet.key == dict::PRIMER.ul {
            primer = Some(Primer::parse_value(packet.value)?);
        } else if packet.key == dict::KLV_FILL.ul {
            continue;
        } else {
            let p = primer
                .as_ref()
                .ok_or_else(|| AsdcpError::format("metadata set precedes the primer pack"))?;
            objects.push(MdObject::parse(&packet.key, packet.value, p)?);
        }
    }

    let primer = primer.ok_or(AsdcpError::MissingObject("Primer"))?;
    Ok((primer, objects))
}

fn detect_label_set(partition: &Partition) -> LabelSetType {
    let op = &partition.operational_pattern;
    if op.exact_match(&dict::op_atom(LabelSetType::Smpte)) {
        LabelSetType::Smpte
    } else if op.exact_match(&dict::op_atom(LabelSetType::Interop)) {
        LabelSetType::Interop
    } else {
        log::warn!(
            "Operational pattern is not OP-Atom: {}",
            dict::name_of(op)
        );
        LabelSetType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::Identification;

    fn minimal_header() -> HeaderPartition {
        let mut header = HeaderPartition::new(LabelSetType::Smpte);
        header.partition.operational_pattern = dict::op_atom(LabelSetType::Smpte);
        header.add(MdObject::new(Preface::default()));
        header.add(MdObject::new(Identification {
            company_name: "Example".into(),
            ..Default::default()
        }));
        header
    }

    #[test]
    fn test_write_fills_reservation() {
        let mut header = minimal_header();
        let mut out = Vec::new();
        header.write_to(&mut out, 8192).unwrap();
        assert_eq!(out.len(), 8192);
        assert_eq!(
            header.partition.header_byte_count,
            8192 - header.partition.archive_size()
        );

        let (primer, objects) =
            parse_metadata(&out[header.partition.archive_size() as usize..]).unwrap();
        assert_eq!(objects, header.objects);
        assert!(primer.tag_for_key(&dict::IDENTIFICATION_COMPANY_NAME.ul).is_some());
    }

    #[test]
    fn test_rejects_small_reservation() {
        let mut header = minimal_header();
        let err = header.write_to(&mut Vec::new(), 1024).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Param);
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut header = minimal_header();
        for _ in 0..200 {
            header.add(MdObject::new(Identification {
                company_name: "A company name long enough to fill space".into(),
                ..Default::default()
            }));
        }
        let err = header.write_to(&mut Vec::new(), 4096).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Alloc);
    }

    #[test]
    fn test_requires_preface() {
        let mut header = HeaderPartition::new(LabelSetType::Smpte);
        let err = header.write_to(&mut Vec::new(), 4096).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }
}
