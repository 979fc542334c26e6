//! Whole-file summaries for the `asdcp-info` tool, and a reader that dispatches
//! on the essence type found in the header.

use std::path::{Path, PathBuf};

use crate::crypto::{AesDecContext, HmacContext};
use crate::error::{AsdcpError, Result};
use crate::essence::atmos::{AtmosDescriptor, AtmosReader};
use crate::essence::dcdata::{DataDescriptor, DcDataReader};
use crate::essence::jp2k::{Jp2kReader, Jp2kStereoReader, PictureDescriptor, StereoPhase};
use crate::essence::mpeg2::{Mpeg2Reader, VideoDescriptor};
use crate::essence::pcm::{AudioDescriptor, PcmReader};
use crate::essence::FrameReader;
use crate::frame::FrameBuffer;
use crate::info::{self, AssetInfo, EssenceType, WriterInfo};
use crate::partition::{Partition, RipPair};
use crate::reader::EssenceReader;
use crate::types::Rational;

/// Codec descriptor of a track file, as recovered from its header.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DescriptorReport {
    Picture(PictureDescriptor),
    StereoPicture(PictureDescriptor),
    Video(VideoDescriptor),
    Audio(AudioDescriptor),
    Data(DataDescriptor),
    Atmos(AtmosDescriptor),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexSegmentReport {
    pub index_start_position: i64,
    pub index_duration: i64,
    pub edit_unit_byte_count: u32,
    pub index_edit_rate: Rational,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IndexReport {
    /// Edit units covered by all segments.
    pub duration: u64,
    pub segments: Vec<IndexSegmentReport>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FileReport {
    pub path: PathBuf,
    pub essence_type: EssenceType,
    pub asset: AssetInfo,
    pub writer: WriterInfo,
    pub descriptor: DescriptorReport,
    pub header_partition: Partition,
    pub body_partition: Option<Partition>,
    pub footer_partition: Partition,
    pub rip: Vec<RipPair>,
    pub index: IndexReport,
    /// Absolute offset of the first essence packet.
    pub essence_start: u64,
}

/// A track file opened with the reader its essence type calls for.
pub enum TrackReader {
    Jp2k(Jp2kReader),
    Jp2kStereo(Jp2kStereoReader),
    Mpeg2(Mpeg2Reader),
    Pcm(PcmReader),
    DcData(DcDataReader),
    Atmos(AtmosReader),
}

impl TrackReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = EssenceReader::open(path)?;
        let track = match info::classify(reader.header()) {
            EssenceType::Jpeg2000 => TrackReader::Jp2k(Jp2kReader::from_reader(reader)?),
            EssenceType::Jpeg2000Stereo => {
                TrackReader::Jp2kStereo(Jp2kStereoReader::from_reader(reader)?)
            }
            EssenceType::Mpeg2Ves => TrackReader::Mpeg2(Mpeg2Reader::from_reader(reader)?),
            EssenceType::Pcm24b48k | EssenceType::Pcm24b96k => {
                TrackReader::Pcm(PcmReader::from_reader(reader)?)
            }
            EssenceType::DcData => TrackReader::DcData(DcDataReader::from_reader(reader)?),
            EssenceType::Atmos => TrackReader::Atmos(AtmosReader::from_reader(reader)?),
            other => {
                log::error!("{}: unsupported essence type {other:?}", path.display());
                return Err(AsdcpError::format(format!(
                    "unsupported essence type {other:?}"
                )));
            }
        };
        Ok(track)
    }

    pub fn essence_type(&self) -> EssenceType {
        info::classify(self.essence_reader().header())
    }

    pub fn essence_reader(&self) -> &EssenceReader {
        match self {
            TrackReader::Jp2k(r) => r.essence_reader(),
            TrackReader::Jp2kStereo(r) => r.essence_reader(),
            TrackReader::Mpeg2(r) => r.essence_reader(),
            TrackReader::Pcm(r) => r.essence_reader(),
            TrackReader::DcData(r) => r.essence_reader(),
            TrackReader::Atmos(r) => r.essence_reader(),
        }
    }

    pub fn descriptor(&self) -> DescriptorReport {
        match self {
            TrackReader::Jp2k(r) => DescriptorReport::Picture(r.picture_descriptor().clone()),
            TrackReader::Jp2kStereo(r) => {
                DescriptorReport::StereoPicture(r.picture_descriptor().clone())
            }
            TrackReader::Mpeg2(r) => DescriptorReport::Video(r.video_descriptor().clone()),
            TrackReader::Pcm(r) => DescriptorReport::Audio(r.audio_descriptor().clone()),
            TrackReader::DcData(r) => DescriptorReport::Data(r.data_descriptor().clone()),
            TrackReader::Atmos(r) => DescriptorReport::Atmos(r.atmos_descriptor().clone()),
        }
    }

    /// Frames (stereo pairs count once) the file holds.
    pub fn frame_count(&self) -> u32 {
        match self {
            TrackReader::Jp2k(r) => r.frame_count(),
            TrackReader::Jp2kStereo(r) => r.frame_count(),
            TrackReader::Mpeg2(r) => r.frame_count(),
            TrackReader::Pcm(r) => r.frame_count(),
            TrackReader::DcData(r) => r.frame_count(),
            TrackReader::Atmos(r) => r.frame_count(),
        }
    }

    /// Number of buffers one frame yields: two for stereo pairs.
    pub fn buffers_per_frame(&self) -> usize {
        match self {
            TrackReader::Jp2kStereo(_) => 2,
            _ => 1,
        }
    }

    /// Read the frame's buffers; `buffers` must hold [`buffers_per_frame`](Self::buffers_per_frame) entries.
    pub fn read_frame(
        &mut self,
        frame: u32,
        buffers: &mut [FrameBuffer<'_>],
        mut ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        if buffers.len() < self.buffers_per_frame() {
            return Err(AsdcpError::param(format!(
                "{} buffers supplied, {} needed",
                buffers.len(),
                self.buffers_per_frame()
            )));
        }
        match self {
            TrackReader::Jp2kStereo(r) => {
                let (left, right) = buffers.split_at_mut(1);
                r.read_frame(frame, StereoPhase::Left, &mut left[0], ctx.as_deref_mut(), hmac)?;
                r.read_frame(frame, StereoPhase::Right, &mut right[0], ctx, hmac)
            }
            TrackReader::Jp2k(r) => r.read_frame(frame, &mut buffers[0], ctx, hmac),
            TrackReader::Mpeg2(r) => r.read_frame(frame, &mut buffers[0], ctx, hmac).map(|_| ()),
            TrackReader::Pcm(r) => r.read_frame(frame, &mut buffers[0], ctx, hmac),
            TrackReader::DcData(r) => r.read_frame(frame, &mut buffers[0], ctx, hmac),
            TrackReader::Atmos(r) => r.read_frame(frame, &mut buffers[0], ctx, hmac),
        }
    }
}

impl FileReport {
    pub fn read(path: &Path) -> Result<Self> {
        let track = TrackReader::open(path)?;
        Self::from_track(path, &track)
    }

    pub fn from_track(path: &Path, track: &TrackReader) -> Result<Self> {
        let reader = track.essence_reader();
        let header = reader.header();
        let footer = reader.index();
        let index = IndexReport {
            duration: footer.duration(),
            segments: footer
                .segments()
                .iter()
                .map(|s| IndexSegmentReport {
                    index_start_position: s.index_start_position,
                    index_duration: s.index_duration,
                    edit_unit_byte_count: s.edit_unit_byte_count,
                    index_edit_rate: s.index_edit_rate,
                })
                .collect(),
        };

        Ok(FileReport {
            path: path.to_path_buf(),
            essence_type: track.essence_type(),
            asset: AssetInfo::from_header(header)?,
            writer: reader.info().clone(),
            descriptor: track.descriptor(),
            header_partition: header.partition.clone(),
            body_partition: reader.body_partition().cloned(),
            footer_partition: footer.partition.clone(),
            rip: header.rip.pairs.clone(),
            index,
            essence_start: reader.essence_start(),
        })
    }
}
