//! MPEG-2 video elementary stream track files.
//!
//! Frames are written in transport order. The index records each frame's
//! picture type, GOP boundaries and reorder offset so readers can find the
//! I-frame a decode must start from.

use std::path::Path;

use crate::crypto::{AesDecContext, AesEncContext, HmacContext};
use crate::dict;
use crate::error::{AsdcpError, Result};
use crate::essence::{self, FrameReader};
use crate::frame::FrameBuffer;
use crate::index::{DeltaEntry, IndexEntry};
use crate::info::WriterInfo;
use crate::metadata::{CdciEssenceDescriptor, GenericPictureEssenceDescriptor, MdObject, Mpeg2VideoDescriptor};
use crate::reader::EssenceReader;
use crate::types::Rational;
use crate::writer::{EssenceParams, EssenceWriter, WriterState};

const MPEG_PACKAGE_LABEL: &str = "File Package: SMPTE 381M frame wrapping of MPEG2 video elementary stream";
const PICTURE_TRACK_NAME: &str = "Picture Track";

const FLAG_GOP_START: u8 = 0x40;
const FLAG_CLOSED_GOP: u8 = 0x80;

/// MPEG-2 picture coding type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum FrameType {
    #[default]
    Unknown,
    I,
    P,
    B,
}

impl FrameType {
    /// Index entry flag bits for this picture type.
    fn index_flags(self) -> u8 {
        match self {
            FrameType::P => 0x22,
            FrameType::B => 0x33,
            FrameType::I | FrameType::Unknown => 0x00,
        }
    }

    fn from_index_flags(flags: u8) -> Self {
        match (flags >> 4) & 0x03 {
            0 => FrameType::I,
            2 => FrameType::P,
            3 => FrameType::B,
            _ => FrameType::Unknown,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            FrameType::I => 'I',
            FrameType::P => 'P',
            FrameType::B => 'B',
            FrameType::Unknown => 'U',
        }
    }
}

/// Per-frame attributes that travel alongside the frame bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Mpeg2FrameInfo {
    pub frame_type: FrameType,
    /// Distance between transport order and display order.
    pub temporal_offset: u8,
    /// First frame of a GOP, in transport order.
    pub gop_start: bool,
    /// Only meaningful together with `gop_start`.
    pub closed_gop: bool,
}

impl Mpeg2FrameInfo {
    fn from_entry(entry: &IndexEntry) -> Self {
        Mpeg2FrameInfo {
            frame_type: FrameType::from_index_flags(entry.flags),
            temporal_offset: entry.temporal_offset.unsigned_abs(),
            gop_start: entry.flags & FLAG_GOP_START != 0,
            closed_gop: entry.flags & FLAG_CLOSED_GOP != 0,
        }
    }
}

/// Parameters of an MPEG-2 video track file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct VideoDescriptor {
    pub edit_rate: Rational,
    pub frame_rate: u32,
    pub sample_rate: Rational,
    pub frame_layout: u8,
    pub stored_width: u32,
    pub stored_height: u32,
    pub aspect_ratio: Rational,
    pub component_depth: u32,
    pub horizontal_subsampling: u32,
    pub vertical_subsampling: u32,
    pub color_siting: u8,
    pub coded_content_type: u8,
    pub low_delay: bool,
    pub bit_rate: u32,
    pub profile_and_level: u8,
    pub container_duration: u32,
}

impl VideoDescriptor {
    pub fn to_metadata(&self) -> Mpeg2VideoDescriptor {
        let mut picture = GenericPictureEssenceDescriptor {
            frame_layout: Some(self.frame_layout),
            stored_width: self.stored_width,
            stored_height: self.stored_height,
            aspect_ratio: self.aspect_ratio,
            ..Default::default()
        };
        picture.file.sample_rate = self.sample_rate;
        picture.file.container_duration = Some(self.container_duration as i64);

        Mpeg2VideoDescriptor {
            cdci: CdciEssenceDescriptor {
                picture,
                component_depth: self.component_depth,
                horizontal_subsampling: self.horizontal_subsampling,
                vertical_subsampling: Some(self.vertical_subsampling),
                color_siting: Some(self.color_siting),
            },
            coded_content_type: Some(self.coded_content_type),
            low_delay: Some(self.low_delay as u8),
            bit_rate: Some(self.bit_rate),
            profile_and_level: Some(self.profile_and_level),
        }
    }

    /// The edit rate of an MPEG-2 file is its descriptor sample rate.
    pub fn from_metadata(desc: &Mpeg2VideoDescriptor) -> Self {
        let picture = &desc.cdci.picture;
        let sample_rate = picture.file.sample_rate;
        VideoDescriptor {
            edit_rate: sample_rate,
            frame_rate: sample_rate.numerator.max(0) as u32,
            sample_rate,
            frame_layout: picture.frame_layout.unwrap_or(0),
            stored_width: picture.stored_width,
            stored_height: picture.stored_height,
            aspect_ratio: picture.aspect_ratio,
            component_depth: desc.cdci.component_depth,
            horizontal_subsampling: desc.cdci.horizontal_subsampling,
            vertical_subsampling: desc.cdci.vertical_subsampling.unwrap_or(0),
            color_siting: desc.cdci.color_siting.unwrap_or(0),
            coded_content_type: desc.coded_content_type.unwrap_or(0),
            low_delay: desc.low_delay.unwrap_or(0) != 0,
            bit_rate: desc.bit_rate.unwrap_or(0),
            profile_and_level: desc.profile_and_level.unwrap_or(0),
            container_duration: essence::container_frames(picture.file.container_duration),
        }
    }
}

/// Writes an MPEG-2 video track file.
pub struct Mpeg2Writer {
    writer: EssenceWriter,
    vdesc: VideoDescriptor,
    /// Frames since the last GOP start.
    gop_offset: u32,
}

impl Mpeg2Writer {
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        vdesc: &VideoDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        let mut writer = EssenceWriter::new(info);
        writer.open_write(path, header_size)?;

        let params = EssenceParams {
            package_label: MPEG_PACKAGE_LABEL.to_string(),
            wrapping_ul: dict::MPEG2_VES_WRAPPING_FRAME.ul,
            track_name: PICTURE_TRACK_NAME.to_string(),
            essence_ul: dict::MPEG2_ESSENCE.ul,
            data_definition: dict::PICTURE_DATA_DEF.ul,
            edit_rate: vdesc.edit_rate,
            tc_frame_rate: essence::timecode_rate(vdesc.edit_rate),
            bytes_per_edit_unit: 0,
        };
        writer.set_source_stream(MdObject::new(vdesc.to_metadata()), Vec::new(), &params)?;
        writer.set_delta_params(vec![DeltaEntry::new(-1, 0, 0)]);
        Ok(Mpeg2Writer {
            writer,
            vdesc: vdesc.clone(),
            gop_offset: 0,
        })
    }

    pub fn video_descriptor(&self) -> &VideoDescriptor {
        &self.vdesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.writer.info()
    }

    pub fn state(&self) -> WriterState {
        self.writer.state()
    }

    pub fn frames_written(&self) -> u32 {
        self.writer.frames_written()
    }

    /// Append one frame in transport order.
    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        frame: &Mpeg2FrameInfo,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let mut flags = frame.frame_type.index_flags();
        let mut gop_offset = self.gop_offset;
        if frame.gop_start {
            gop_offset = 0;
            flags |= FLAG_GOP_START;
            if frame.closed_gop {
                flags |= FLAG_CLOSED_GOP;
            }
        }
        let entry = IndexEntry {
            temporal_offset: (-(frame.temporal_offset as i16)).max(i8::MIN as i16) as i8,
            key_frame_offset: (-(gop_offset.min(128) as i16)) as i8,
            flags,
            stream_offset: 0,
        };
        self.writer.write_frame(buf, Some(entry), ctx, hmac)?;
        self.gop_offset = gop_offset + 1;
        Ok(())
    }

    pub fn finalize(&mut self) -> Result<()> {
        self.writer.finalize()
    }
}

/// Reads an MPEG-2 video track file.
pub struct Mpeg2Reader {
    reader: EssenceReader,
    vdesc: VideoDescriptor,
}

impl Mpeg2Reader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let desc = reader.header().find::<Mpeg2VideoDescriptor>().ok_or_else(|| {
            log::error!("MPEG2VideoDescriptor object not found");
            AsdcpError::MissingObject("MPEG2VideoDescriptor")
        })?;
        let vdesc = VideoDescriptor::from_metadata(desc);
        Ok(Mpeg2Reader { reader, vdesc })
    }

    pub fn video_descriptor(&self) -> &VideoDescriptor {
        &self.vdesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.reader.info()
    }

    pub fn essence_reader(&self) -> &EssenceReader {
        &self.reader
    }

    /// Read `frame` and return the attributes recorded for it in the index.
    pub fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<Mpeg2FrameInfo> {
        self.reader
            .read_eklv_frame(frame, buf, &dict::MPEG2_ESSENCE.ul, ctx, hmac)?;
        let entry = self.reader.index().lookup(frame)?;
        Ok(Mpeg2FrameInfo::from_entry(&entry))
    }

    pub fn frame_type(&self, frame: u32) -> Result<FrameType> {
        if !self.reader.is_open() {
            return Err(AsdcpError::NotOpen);
        }
        let entry = self.reader.index().lookup(frame)?;
        Ok(FrameType::from_index_flags(entry.flags))
    }

    /// Frame number of the GOP start that `frame` depends on.
    pub fn find_frame_gop_start(&self, frame: u32) -> Result<u32> {
        if !self.reader.is_open() {
            return Err(AsdcpError::NotOpen);
        }
        let entry = self.reader.index().lookup(frame)?;
        let start = frame as i64 + entry.key_frame_offset as i64;
        u32::try_from(start).map_err(|_| AsdcpError::FrameOutOfRange { frame })
    }

    /// Read the GOP start frame for `frame`; returns its number and attributes.
    pub fn read_frame_gop_start(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<(u32, Mpeg2FrameInfo)> {
        let key_frame = self.find_frame_gop_start(frame)?;
        let info = self.read_frame(key_frame, buf, ctx, hmac)?;
        Ok((key_frame, info))
    }

    pub fn close(&mut self) {
        self.reader.close();
    }
}

impl FrameReader for Mpeg2Reader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        Mpeg2Reader::read_frame(self, frame, buf, ctx, hmac).map(|_| ())
    }

    fn frame_count(&self) -> u32 {
        self.vdesc.container_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::EDIT_RATE_24;

    fn vdesc() -> VideoDescriptor {
        VideoDescriptor {
            edit_rate: EDIT_RATE_24,
            frame_rate: 24,
            sample_rate: EDIT_RATE_24,
            stored_width: 1920,
            stored_height: 1080,
            aspect_ratio: Rational::new(16, 9),
            component_depth: 8,
            horizontal_subsampling: 2,
            vertical_subsampling: 1,
            coded_content_type: 1,
            bit_rate: 80_000_000,
            profile_and_level: 0x82,
            ..Default::default()
        }
    }

    #[test]
    fn test_index_flags() {
        assert_eq!(FrameType::I.index_flags(), 0x00);
        assert_eq!(FrameType::P.index_flags(), 0x22);
        assert_eq!(FrameType::B.index_flags(), 0x33);
        assert_eq!(FrameType::from_index_flags(0xc0), FrameType::I);
        assert_eq!(FrameType::from_index_flags(0x62), FrameType::P);
        assert_eq!(FrameType::from_index_flags(0x33), FrameType::B);
        assert_eq!(FrameType::from_index_flags(0x10), FrameType::Unknown);
    }

    #[test]
    fn test_descriptor_from_metadata() {
        let d = vdesc();
        assert_eq!(VideoDescriptor::from_metadata(&d.to_metadata()), d);
    }

    #[test]
    fn test_gop_structure_in_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mxf");
        let mut w = Mpeg2Writer::open_write(&path, WriterInfo::default(), &vdesc(), 16384).unwrap();

        // transport order of two closed GOPs: I P B B | I B
        let gops = [
            (FrameType::I, 0, true),
            (FrameType::P, 2, false),
            (FrameType::B, 0, false),
            (FrameType::B, 0, false),
            (FrameType::I, 1, true),
            (FrameType::B, 0, false),
        ];
        for (n, (frame_type, temporal_offset, gop_start)) in gops.iter().enumerate() {
            let info = Mpeg2FrameInfo {
                frame_type: *frame_type,
                temporal_offset: *temporal_offset,
                gop_start: *gop_start,
                closed_gop: *gop_start,
            };
            let buf = FrameBuffer::from_vec(vec![0, 0, 1, 0xb3, n as u8]);
            w.write_frame(&buf, &info, None, None).unwrap();
        }
        w.finalize().unwrap();

        let mut r = Mpeg2Reader::open(&path).unwrap();
        assert_eq!(r.video_descriptor().container_duration, 6);
        assert_eq!(r.frame_type(1).unwrap(), FrameType::P);
        assert_eq!(r.find_frame_gop_start(3).unwrap(), 0);
        assert_eq!(r.find_frame_gop_start(5).unwrap(), 4);
        assert_eq!(r.essence_reader().locate_frame(1).unwrap().temporal_offset, -2);

        let mut buf = FrameBuffer::with_capacity(16);
        let (key, info) = r.read_frame_gop_start(5, &mut buf, None, None).unwrap();
        assert_eq!(key, 4);
        assert!(info.gop_start && info.closed_gop);
        assert_eq!(info.frame_type, FrameType::I);
        assert_eq!(buf.data()[4], 4);

        assert_eq!(r.frame_type(6).unwrap_err().kind(), ErrorKind::Range);
    }
}
