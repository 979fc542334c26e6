//! Generic D-Cinema data track files.
//!
//! Opaque frames of caller-defined data, frame wrapped with a VBR index. The
//! essence coding label and any sub-descriptors identify what the data is.

use std::path::Path;

use crate::crypto::{AesDecContext, AesEncContext, HmacContext};
use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::essence::{self, FrameReader, FrameWriter};
use crate::frame::FrameBuffer;
use crate::index::IndexEntry;
use crate::info::WriterInfo;
use crate::metadata::{DcDataDescriptor, MdObject};
use crate::reader::EssenceReader;
use crate::types::{
    EDIT_RATE_100, EDIT_RATE_120, EDIT_RATE_24, EDIT_RATE_25, EDIT_RATE_30, EDIT_RATE_48,
    EDIT_RATE_50, EDIT_RATE_60, EDIT_RATE_96, Rational,
};
use crate::ul::Ul;
use crate::writer::{EssenceParams, EssenceWriter, WriterState};

const DC_DATA_PACKAGE_LABEL: &str = "File Package: SMPTE-GC frame wrapping of D-Cinema Generic data";
const DC_DATA_TRACK_NAME: &str = "D-Cinema Generic Data Track";

pub const DATA_EDIT_RATES: [Rational; 9] = [
    EDIT_RATE_24,
    EDIT_RATE_25,
    EDIT_RATE_30,
    EDIT_RATE_48,
    EDIT_RATE_50,
    EDIT_RATE_60,
    EDIT_RATE_96,
    EDIT_RATE_100,
    EDIT_RATE_120,
];

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct DataDescriptor {
    pub edit_rate: Rational,
    pub container_duration: u32,
    /// Label naming the kind of data carried.
    pub data_essence_coding: Ul,
}

impl DataDescriptor {
    pub fn to_metadata(&self) -> DcDataDescriptor {
        let mut desc = DcDataDescriptor::default();
        desc.data.file.sample_rate = self.edit_rate;
        desc.data.file.container_duration = Some(self.container_duration as i64);
        desc.data.data_essence_coding = self.data_essence_coding;
        desc
    }

    pub fn from_metadata(desc: &DcDataDescriptor) -> Self {
        DataDescriptor {
            edit_rate: desc.data.file.sample_rate,
            container_duration: essence::container_frames(desc.data.file.container_duration),
            data_essence_coding: desc.data.data_essence_coding,
        }
    }
}

/// Labels and descriptors for one flavour of data track.
pub(crate) struct DataTrackParams<'a> {
    pub package_label: &'a str,
    pub track_name: &'a str,
    pub sub_descriptors: Vec<MdObject>,
}

/// Writes a data track file. Also the engine under the Atmos writer.
pub struct DcDataWriter {
    writer: EssenceWriter,
    ddesc: DataDescriptor,
}

impl DcDataWriter {
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        ddesc: &DataDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        Self::open_with_sub_descriptors(path, info, ddesc, Vec::new(), header_size)
    }

    /// As [`open_write`](Self::open_write), attaching `sub_descriptors` to the data descriptor.
    pub fn open_with_sub_descriptors(
        path: &Path,
        info: WriterInfo,
        ddesc: &DataDescriptor,
        sub_descriptors: Vec<MdObject>,
        header_size: u32,
    ) -> Result<Self> {
        let track = DataTrackParams {
            package_label: DC_DATA_PACKAGE_LABEL,
            track_name: DC_DATA_TRACK_NAME,
            sub_descriptors,
        };
        Self::open_track(path, info, ddesc, track, header_size, "DC Data")
    }

    pub(crate) fn open_track(
        path: &Path,
        info: WriterInfo,
        ddesc: &DataDescriptor,
        track: DataTrackParams<'_>,
        header_size: u32,
        what: &str,
    ) -> Result<Self> {
        if info.label_set != LabelSetType::Smpte {
            log::error!("{what} support requires the SMPTE label set");
            return Err(AsdcpError::param(format!("{what} requires the SMPTE label set")));
        }
        essence::check_edit_rate(ddesc.edit_rate, &DATA_EDIT_RATES, "DCDataDescriptor")?;

        let mut writer = EssenceWriter::new(info);
        writer.open_write(path, header_size)?;
        let params = EssenceParams {
            package_label: track.package_label.to_string(),
            wrapping_ul: dict::DC_DATA_WRAPPING_FRAME.ul,
            track_name: track.track_name.to_string(),
            essence_ul: dict::DC_DATA_ESSENCE.ul,
            data_definition: dict::DATA_DATA_DEF.ul,
            edit_rate: ddesc.edit_rate,
            tc_frame_rate: essence::timecode_rate(ddesc.edit_rate),
            bytes_per_edit_unit: 0,
        };
        writer.set_source_stream(MdObject::new(ddesc.to_metadata()), track.sub_descriptors, &params)?;
        Ok(DcDataWriter {
            writer,
            ddesc: ddesc.clone(),
        })
    }

    pub fn data_descriptor(&self) -> &DataDescriptor {
        &self.ddesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.writer.info()
    }

    pub fn state(&self) -> WriterState {
        self.writer.state()
    }

    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.writer
            .write_frame(buf, Some(IndexEntry::default()), ctx, hmac)
    }

    pub fn finalize(&mut self) -> Result<()> {
        self.writer.finalize()
    }
}

impl FrameWriter for DcDataWriter {
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        DcDataWriter::write_frame(self, buf, ctx, hmac)
    }

    fn finalize(&mut self) -> Result<()> {
        DcDataWriter::finalize(self)
    }

    fn frames_written(&self) -> u32 {
        self.writer.frames_written()
    }
}

pub struct DcDataReader {
    reader: EssenceReader,
    ddesc: DataDescriptor,
}

impl DcDataReader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let desc = reader.header().find::<DcDataDescriptor>().ok_or_else(|| {
            log::error!("DCDataDescriptor object not found");
            AsdcpError::MissingObject("DCDataDescriptor")
        })?;
        let ddesc = DataDescriptor::from_metadata(desc);
        if !DATA_EDIT_RATES.contains(&ddesc.edit_rate) {
            log::error!("DC Data file EditRate is not a supported value: {}", ddesc.edit_rate);
            return Err(AsdcpError::format(format!(
                "data edit rate {} not in expected value range",
                ddesc.edit_rate
            )));
        }
        Ok(DcDataReader { reader, ddesc })
    }

    pub fn data_descriptor(&self) -> &DataDescriptor {
        &self.ddesc
    }

    /// Sub-descriptors referenced by the data descriptor, in file order.
    pub fn sub_descriptors(&self) -> Vec<&MdObject> {
        let header = self.reader.header();
        header
            .find::<DcDataDescriptor>()
            .map(|d| {
                d.data
                    .file
                    .descriptor
                    .sub_descriptors
                    .iter()
                    .filter_map(|id| header.object_by_id(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn info(&self) -> &WriterInfo {
        self.reader.info()
    }

    pub fn essence_reader(&self) -> &EssenceReader {
        &self.reader
    }

    pub fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.reader
            .read_eklv_frame(frame, buf, &dict::DC_DATA_ESSENCE.ul, ctx, hmac)
    }

    pub fn close(&mut self) {
        self.reader.close();
    }
}

impl FrameReader for DcDataReader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        DcDataReader::read_frame(self, frame, buf, ctx, hmac)
    }

    fn frame_count(&self) -> u32 {
        self.ddesc.container_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::DolbyAtmosSubDescriptor;

    fn ddesc() -> DataDescriptor {
        DataDescriptor {
            edit_rate: EDIT_RATE_24,
            data_essence_coding: dict::ATMOS_ESSENCE_CODING.ul,
            ..Default::default()
        }
    }

    #[test]
    fn test_interop_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let info = WriterInfo {
            label_set: LabelSetType::Interop,
            ..Default::default()
        };
        let err = DcDataWriter::open_write(&path, info, &ddesc(), 16384).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Param);
        assert!(!path.exists());
    }

    #[test]
    fn test_edit_rate_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let mut d = ddesc();
        d.edit_rate = crate::types::EDIT_RATE_23_98;
        let err = DcDataWriter::open_write(&path, WriterInfo::default(), &d, 16384).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Param);
    }

    #[test]
    fn test_frames_and_sub_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let sub = MdObject::new(DolbyAtmosSubDescriptor {
            max_channel_count: 10,
            ..Default::default()
        });
        let mut w = DcDataWriter::open_with_sub_descriptors(
            &path,
            WriterInfo::default(),
            &ddesc(),
            vec![sub],
            16384,
        )
        .unwrap();
        for size in [10usize, 2000, 3] {
            w.write_frame(&FrameBuffer::from_vec(vec![size as u8; size]), None, None)
                .unwrap();
        }
        w.finalize().unwrap();

        let mut r = DcDataReader::open(&path).unwrap();
        assert_eq!(r.frame_count(), 3);
        assert_eq!(r.data_descriptor().data_essence_coding, dict::ATMOS_ESSENCE_CODING.ul);
        let subs = r.sub_descriptors();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].get::<DolbyAtmosSubDescriptor>().map(|d| d.max_channel_count), Some(10));

        let mut buf = FrameBuffer::default();
        r.read_frame(1, &mut buf, None, None).unwrap();
        assert_eq!(buf.size(), 2000);
        r.read_frame(2, &mut buf, None, None).unwrap();
        assert_eq!(buf.data(), &[3, 3, 3]);
    }
}
