//! Dolby Atmos track files: data tracks tagged with the Atmos essence coding
//! and a [`DolbyAtmosSubDescriptor`].

use std::path::Path;

use uuid::Uuid;

use crate::crypto::{AesDecContext, AesEncContext, HmacContext};
use crate::dict;
use crate::error::{AsdcpError, Result};
use crate::essence::dcdata::{DataDescriptor, DataTrackParams, DcDataReader, DcDataWriter};
use crate::essence::{FrameReader, FrameWriter};
use crate::frame::FrameBuffer;
use crate::info::WriterInfo;
use crate::metadata::{DolbyAtmosSubDescriptor, MdObject};
use crate::reader::EssenceReader;
use crate::types::Rational;
use crate::writer::WriterState;

const ATMOS_PACKAGE_LABEL: &str = "File Package: SMPTE-GC frame wrapping of Dolby ATMOS data";
const ATMOS_TRACK_NAME: &str = "Dolby ATMOS Data Track";

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct AtmosDescriptor {
    pub edit_rate: Rational,
    pub container_duration: u32,
    pub first_frame: u32,
    pub max_channel_count: u16,
    pub max_object_count: u16,
    pub atmos_id: Uuid,
    pub atmos_version: u8,
}

impl AtmosDescriptor {
    fn data_descriptor(&self) -> DataDescriptor {
        DataDescriptor {
            edit_rate: self.edit_rate,
            container_duration: self.container_duration,
            data_essence_coding: dict::ATMOS_ESSENCE_CODING.ul,
        }
    }

    fn sub_descriptor(&self) -> DolbyAtmosSubDescriptor {
        DolbyAtmosSubDescriptor {
            atmos_id: self.atmos_id,
            first_frame: self.first_frame,
            max_channel_count: self.max_channel_count,
            max_object_count: self.max_object_count,
            atmos_version: self.atmos_version,
        }
    }

    pub(crate) fn from_parts(data: &DataDescriptor, sub: &DolbyAtmosSubDescriptor) -> Self {
        AtmosDescriptor {
            edit_rate: data.edit_rate,
            container_duration: data.container_duration,
            first_frame: sub.first_frame,
            max_channel_count: sub.max_channel_count,
            max_object_count: sub.max_object_count,
            atmos_id: sub.atmos_id,
            atmos_version: sub.atmos_version,
        }
    }
}

/// True when `path` is named like an Atmos track file.
pub fn is_dolby_atmos(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("atmos"))
}

pub struct AtmosWriter {
    inner: DcDataWriter,
    adesc: AtmosDescriptor,
}

impl AtmosWriter {
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        adesc: &AtmosDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        let track = DataTrackParams {
            package_label: ATMOS_PACKAGE_LABEL,
            track_name: ATMOS_TRACK_NAME,
            sub_descriptors: vec![MdObject::new(adesc.sub_descriptor())],
        };
        let inner = DcDataWriter::open_track(
            path,
            info,
            &adesc.data_descriptor(),
            track,
            header_size,
            "Atmos",
        )?;
        Ok(AtmosWriter {
            inner,
            adesc: adesc.clone(),
        })
    }

    pub fn atmos_descriptor(&self) -> &AtmosDescriptor {
        &self.adesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.inner.info()
    }

    pub fn state(&self) -> WriterState {
        self.inner.state()
    }

    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.inner.write_frame(buf, ctx, hmac)
    }

    pub fn finalize(&mut self) -> Result<()> {
        self.inner.finalize()
    }
}

impl FrameWriter for AtmosWriter {
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        AtmosWriter::write_frame(self, buf, ctx, hmac)
    }

    fn finalize(&mut self) -> Result<()> {
        AtmosWriter::finalize(self)
    }

    fn frames_written(&self) -> u32 {
        self.inner.frames_written()
    }
}

pub struct AtmosReader {
    inner: DcDataReader,
    adesc: AtmosDescriptor,
}

impl AtmosReader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let sub = reader
            .header()
            .find::<DolbyAtmosSubDescriptor>()
            .cloned()
            .ok_or_else(|| {
                log::error!("DolbyAtmosSubDescriptor object not found");
                AsdcpError::MissingObject("DolbyAtmosSubDescriptor")
            })?;
        let inner = DcDataReader::from_reader(reader)?;
        let data = inner.data_descriptor();
        if data.data_essence_coding != dict::ATMOS_ESSENCE_CODING.ul {
            log::warn!("Atmos track carries data essence coding {}", data.data_essence_coding);
        }
        let adesc = AtmosDescriptor::from_parts(data, &sub);
        Ok(AtmosReader { inner, adesc })
    }

    pub fn atmos_descriptor(&self) -> &AtmosDescriptor {
        &self.adesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.inner.info()
    }

    pub fn essence_reader(&self) -> &EssenceReader {
        self.inner.essence_reader()
    }

    pub fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.inner.read_frame(frame, buf, ctx, hmac)
    }

    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl FrameReader for AtmosReader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        AtmosReader::read_frame(self, frame, buf, ctx, hmac)
    }

    fn frame_count(&self) -> u32 {
        self.adesc.container_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::info::{self, EssenceType};
    use crate::types::EDIT_RATE_24;

    #[test]
    fn test_is_dolby_atmos() {
        assert!(is_dolby_atmos(Path::new("/tmp/reel1.atmos")));
        assert!(is_dolby_atmos(Path::new("reel1.ATMOS")));
        assert!(!is_dolby_atmos(Path::new("reel1.mxf")));
        assert!(!is_dolby_atmos(Path::new("atmos")));
    }

    #[test]
    fn test_atmos_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reel1.mxf");
        let adesc = AtmosDescriptor {
            edit_rate: EDIT_RATE_24,
            first_frame: 192,
            max_channel_count: 10,
            max_object_count: 118,
            atmos_id: Uuid::new_v4(),
            atmos_version: 1,
            ..Default::default()
        };
        let mut w = AtmosWriter::open_write(&path, WriterInfo::default(), &adesc, 16384).unwrap();
        w.write_frame(&FrameBuffer::from_vec(vec![1, 2, 3, 4]), None, None).unwrap();
        w.write_frame(&FrameBuffer::from_vec(vec![5; 512]), None, None).unwrap();
        w.finalize().unwrap();

        assert_eq!(info::essence_type(&path).unwrap(), EssenceType::Atmos);
        let mut r = AtmosReader::open(&path).unwrap();
        let expected = AtmosDescriptor {
            container_duration: 2,
            ..adesc
        };
        assert_eq!(r.atmos_descriptor(), &expected);
        let mut buf = FrameBuffer::default();
        r.read_frame(0, &mut buf, None, None).unwrap();
        assert_eq!(buf.data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_plain_data_is_not_atmos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let ddesc = DataDescriptor {
            edit_rate: EDIT_RATE_24,
            ..Default::default()
        };
        let mut w = DcDataWriter::open_write(&path, WriterInfo::default(), &ddesc, 16384).unwrap();
        w.write_frame(&FrameBuffer::from_vec(vec![0; 8]), None, None).unwrap();
        w.finalize().unwrap();

        assert_eq!(info::essence_type(&path).unwrap(), EssenceType::DcData);
        let err = AtmosReader::open(&path).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
