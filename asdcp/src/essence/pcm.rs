//! Wave (PCM) audio track files.
//!
//! Every edit unit holds the same number of samples, so the index is constant
//! bytes per edit unit and frame offsets are computed rather than stored.

use std::path::Path;

use crate::crypto::{self, AesDecContext, AesEncContext, HmacContext, KLV_CRYPTINFO_SIZE, KLV_EMPTY_INTPACK_SIZE, KLV_INTPACK_SIZE};
use crate::dict;
use crate::error::{AsdcpError, Result};
use crate::essence::{self, FrameReader, FrameWriter};
use crate::frame::FrameBuffer;
use crate::info::WriterInfo;
use crate::klv::MXF_BER_LENGTH;
use crate::metadata::{MdObject, WaveAudioDescriptor};
use crate::reader::EssenceReader;
use crate::types::{
    EDIT_RATE_100, EDIT_RATE_120, EDIT_RATE_16, EDIT_RATE_18, EDIT_RATE_20, EDIT_RATE_22,
    EDIT_RATE_23_98, EDIT_RATE_24, EDIT_RATE_25, EDIT_RATE_30, EDIT_RATE_48, EDIT_RATE_50,
    EDIT_RATE_60, EDIT_RATE_96, Rational, SAMPLE_RATE_48K, SAMPLE_RATE_96K,
};
use crate::ul::{UL_LENGTH, Ul};
use crate::writer::{EssenceParams, EssenceWriter, WriterState};

const PCM_PACKAGE_LABEL: &str = "File Package: SMPTE 382M frame wrapping of wave audio";
const SOUND_TRACK_NAME: &str = "Sound Track";

pub const PCM_EDIT_RATES: [Rational; 14] = [
    EDIT_RATE_24,
    EDIT_RATE_25,
    EDIT_RATE_30,
    EDIT_RATE_48,
    EDIT_RATE_50,
    EDIT_RATE_60,
    EDIT_RATE_96,
    EDIT_RATE_100,
    EDIT_RATE_120,
    EDIT_RATE_16,
    EDIT_RATE_18,
    EDIT_RATE_20,
    EDIT_RATE_22,
    EDIT_RATE_23_98,
];

/// D-Cinema channel configuration carried as the descriptor's channel assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ChannelFormat {
    #[default]
    None,
    /// 5.1 with optional HI/VI.
    Cfg1,
    /// 6.1 (5.1 plus center surround) with optional HI/VI.
    Cfg2,
    /// 7.1 with optional HI/VI.
    Cfg3,
    Cfg4,
    /// 7.1 DS with optional HI/VI.
    Cfg5,
    /// Multichannel audio labelling.
    Cfg6,
}

impl ChannelFormat {
    pub fn label(self) -> Option<Ul> {
        let entry = match self {
            ChannelFormat::None => return None,
            ChannelFormat::Cfg1 => dict::DC_AUDIO_CHANNEL_CFG_1_5P1,
            ChannelFormat::Cfg2 => dict::DC_AUDIO_CHANNEL_CFG_2_6P1,
            ChannelFormat::Cfg3 => dict::DC_AUDIO_CHANNEL_CFG_3_7P1,
            ChannelFormat::Cfg4 => dict::DC_AUDIO_CHANNEL_CFG_4_WTF,
            ChannelFormat::Cfg5 => dict::DC_AUDIO_CHANNEL_CFG_5_7P1_DS,
            ChannelFormat::Cfg6 => dict::DC_AUDIO_CHANNEL_CFG_MCA,
        };
        Some(entry.ul)
    }

    pub fn from_label(ul: &Ul) -> Self {
        [
            ChannelFormat::Cfg1,
            ChannelFormat::Cfg2,
            ChannelFormat::Cfg3,
            ChannelFormat::Cfg4,
            ChannelFormat::Cfg5,
            ChannelFormat::Cfg6,
        ]
        .into_iter()
        .find(|f| f.label().as_ref() == Some(ul))
        .unwrap_or(ChannelFormat::None)
    }

    pub fn description(self) -> &'static str {
        match self {
            ChannelFormat::None => "No Channel Format",
            ChannelFormat::Cfg1 => "Config 1 (5.1 with optional HI/VI)",
            ChannelFormat::Cfg2 => "Config 2 (5.1 + center surround with optional HI/VI)",
            ChannelFormat::Cfg3 => "Config 3 (7.1 with optional HI/VI)",
            ChannelFormat::Cfg4 => "Config 4",
            ChannelFormat::Cfg5 => "Config 5 (7.1 DS with optional HI/VI)",
            ChannelFormat::Cfg6 => "Config 6 (ST 377-1 MCA)",
        }
    }
}

/// Parameters of a wave audio track file.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct AudioDescriptor {
    /// Rate of frame wrapping.
    pub edit_rate: Rational,
    pub audio_sampling_rate: Rational,
    pub locked: u32,
    pub channel_count: u32,
    /// Bits per single-channel sample.
    pub quantization_bits: u32,
    /// Bytes per sample, all channels.
    pub block_align: u32,
    pub avg_bps: u32,
    pub linked_track_id: u32,
    pub container_duration: u32,
    pub channel_format: ChannelFormat,
}

impl AudioDescriptor {
    /// Bytes of one sample across all channels.
    pub fn sample_size(&self) -> u32 {
        (self.quantization_bits / 8) * self.channel_count
    }

    /// Samples in one edit unit, rounded up.
    pub fn samples_per_frame(&self) -> u32 {
        let edit = self.edit_rate.quotient();
        if edit <= 0.0 {
            return 0;
        }
        (self.audio_sampling_rate.quotient() / edit).ceil() as u32
    }

    /// Bytes of one edit unit of audio.
    pub fn frame_buffer_size(&self) -> u32 {
        self.sample_size() * self.samples_per_frame()
    }

    pub fn to_metadata(&self) -> WaveAudioDescriptor {
        let mut desc = WaveAudioDescriptor::default();
        desc.sound.file.sample_rate = self.edit_rate;
        desc.sound.file.linked_track_id = Some(self.linked_track_id);
        desc.sound.file.container_duration = Some(self.container_duration as i64);
        desc.sound.audio_sampling_rate = self.audio_sampling_rate;
        desc.sound.locked = self.locked.min(u8::MAX as u32) as u8;
        desc.sound.channel_count = self.channel_count;
        desc.sound.quantization_bits = self.quantization_bits;
        desc.block_align = self.block_align.min(u16::MAX as u32) as u16;
        desc.avg_bps = self.avg_bps;
        desc.channel_assignment = self.channel_format.label();
        desc
    }

    pub fn from_metadata(desc: &WaveAudioDescriptor) -> Self {
        let file = &desc.sound.file;
        AudioDescriptor {
            edit_rate: file.sample_rate,
            audio_sampling_rate: desc.sound.audio_sampling_rate,
            locked: desc.sound.locked as u32,
            channel_count: desc.sound.channel_count,
            quantization_bits: desc.sound.quantization_bits,
            block_align: desc.block_align as u32,
            avg_bps: desc.avg_bps,
            linked_track_id: file.linked_track_id.unwrap_or(0),
            container_duration: essence::container_frames(file.container_duration),
            channel_format: desc
                .channel_assignment
                .as_ref()
                .map(ChannelFormat::from_label)
                .unwrap_or_default(),
        }
    }
}

/// Size of one KLV packet of audio as written for `info`, used as the CBR index unit.
pub fn cbr_frame_size(info: &WriterInfo, adesc: &AudioDescriptor) -> u32 {
    let frame = adesc.frame_buffer_size() as usize;
    let size = if info.encrypted_essence {
        let pack = if info.uses_hmac {
            KLV_INTPACK_SIZE
        } else {
            KLV_EMPTY_INTPACK_SIZE
        };
        UL_LENGTH + MXF_BER_LENGTH + KLV_CRYPTINFO_SIZE + crypto::calc_esv_length(frame, 0) + pack
    } else {
        frame + UL_LENGTH + MXF_BER_LENGTH
    };
    size as u32
}

/// Edit rate of a file being read, repairing files that recorded the sampling rate instead.
fn checked_read_edit_rate(rate: Rational) -> Result<Rational> {
    if PCM_EDIT_RATES.contains(&rate) {
        return Ok(rate);
    }
    log::error!("PCM file EditRate is not a supported value: {rate}");
    if rate == SAMPLE_RATE_48K {
        log::warn!("adjusting EditRate to 24/1");
        return Ok(EDIT_RATE_24);
    }
    Err(AsdcpError::format(format!("PCM edit rate {rate} not in expected value range")))
}

/// Writes a wave audio track file.
pub struct PcmWriter {
    writer: EssenceWriter,
    adesc: AudioDescriptor,
}

impl PcmWriter {
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        adesc: &AudioDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        essence::check_edit_rate(adesc.edit_rate, &PCM_EDIT_RATES, "AudioDescriptor")?;
        if adesc.audio_sampling_rate != SAMPLE_RATE_48K && adesc.audio_sampling_rate != SAMPLE_RATE_96K {
            log::error!(
                "AudioDescriptor.AudioSamplingRate is not 48000/1 or 96000/1: {}",
                adesc.audio_sampling_rate
            );
            return Err(AsdcpError::param(format!(
                "unsupported audio sampling rate {}",
                adesc.audio_sampling_rate
            )));
        }
        if adesc.frame_buffer_size() == 0 {
            return Err(AsdcpError::param("audio descriptor describes empty frames"));
        }

        let bytes_per_edit_unit = cbr_frame_size(&info, adesc);
        let mut writer = EssenceWriter::new(info);
        writer.open_write(path, header_size)?;

        let params = EssenceParams {
            package_label: PCM_PACKAGE_LABEL.to_string(),
            wrapping_ul: dict::WAV_WRAPPING_FRAME.ul,
            track_name: SOUND_TRACK_NAME.to_string(),
            essence_ul: dict::WAV_ESSENCE.ul,
            data_definition: dict::SOUND_DATA_DEF.ul,
            edit_rate: adesc.edit_rate,
            tc_frame_rate: essence::timecode_rate(adesc.edit_rate),
            bytes_per_edit_unit,
        };
        writer.set_source_stream(MdObject::new(adesc.to_metadata()), Vec::new(), &params)?;
        Ok(PcmWriter {
            writer,
            adesc: adesc.clone(),
        })
    }

    pub fn audio_descriptor(&self) -> &AudioDescriptor {
        &self.adesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.writer.info()
    }

    pub fn state(&self) -> WriterState {
        self.writer.state()
    }

    /// Append one edit unit. Every frame must be exactly `frame_buffer_size` bytes
    /// so the constant-size index stays valid.
    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let expected = self.adesc.frame_buffer_size() as usize;
        if buf.size() != expected {
            return Err(AsdcpError::param(format!(
                "PCM frame is {} bytes, expected {expected}",
                buf.size()
            )));
        }
        if buf.plaintext_offset() != 0 {
            return Err(AsdcpError::param("PCM frames are encrypted from the first byte"));
        }
        self.writer.write_frame(buf, None, ctx, hmac)
    }

    pub fn finalize(&mut self) -> Result<()> {
        self.writer.finalize()
    }
}

impl FrameWriter for PcmWriter {
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        PcmWriter::write_frame(self, buf, ctx, hmac)
    }

    fn finalize(&mut self) -> Result<()> {
        PcmWriter::finalize(self)
    }

    fn frames_written(&self) -> u32 {
        self.writer.frames_written()
    }
}

/// Reads a wave audio track file.
pub struct PcmReader {
    reader: EssenceReader,
    adesc: AudioDescriptor,
}

impl PcmReader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let desc = reader.header().find::<WaveAudioDescriptor>().ok_or_else(|| {
            log::error!("WaveAudioDescriptor object not found");
            AsdcpError::MissingObject("WaveAudioDescriptor")
        })?;
        let mut adesc = AudioDescriptor::from_metadata(desc);
        adesc.edit_rate = checked_read_edit_rate(adesc.edit_rate)?;

        if let Some(segment) = reader.index().segments().first() {
            let expected = cbr_frame_size(reader.info(), &adesc);
            if segment.is_cbr() && segment.edit_unit_byte_count != expected {
                log::warn!(
                    "CBR index edit unit is {} bytes, descriptor implies {expected}",
                    segment.edit_unit_byte_count
                );
            }
        }
        Ok(PcmReader { reader, adesc })
    }

    pub fn audio_descriptor(&self) -> &AudioDescriptor {
        &self.adesc
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
            .read_eklv_frame(frame, buf, &dict::WAV_ESSENCE.ul, ctx, hmac)
    }

    pub fn close(&mut self) {
        self.reader.close();
    }
}

impl FrameReader for PcmReader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        PcmReader::read_frame(self, frame, buf, ctx, hmac)
    }

    fn frame_count(&self) -> u32 {
        self.adesc.container_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn adesc() -> AudioDescriptor {
        AudioDescriptor {
            edit_rate: EDIT_RATE_24,
            audio_sampling_rate: SAMPLE_RATE_48K,
            channel_count: 6,
            quantization_bits: 24,
            block_align: 18,
            avg_bps: 864_000,
            channel_format: ChannelFormat::Cfg1,
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_sizes() {
        let mut a = adesc();
        assert_eq!(a.sample_size(), 18);
        assert_eq!(a.samples_per_frame(), 2000);
        assert_eq!(a.frame_buffer_size(), 36_000);
        a.edit_rate = EDIT_RATE_23_98;
        assert_eq!(a.samples_per_frame(), 2002);
        a.audio_sampling_rate = SAMPLE_RATE_96K;
        a.edit_rate = EDIT_RATE_24;
        assert_eq!(a.samples_per_frame(), 4000);
    }

    #[test]
    fn test_cbr_frame_size() {
        let a = adesc();
        let plain = WriterInfo::default();
        assert_eq!(cbr_frame_size(&plain, &a), 36_000 + 20);

        let mut enc = WriterInfo {
            encrypted_essence: true,
            ..Default::default()
        };
        let esv = crypto::calc_esv_length(36_000, 0) as u32;
        assert_eq!(cbr_frame_size(&enc, &a), 16 + 4 + 68 + esv + 12);
        enc.uses_hmac = true;
        assert_eq!(cbr_frame_size(&enc, &a), 16 + 4 + 68 + esv + 56);
    }

    #[test]
    fn test_channel_format_labels() {
        assert_eq!(ChannelFormat::None.label(), None);
        for f in [ChannelFormat::Cfg1, ChannelFormat::Cfg3, ChannelFormat::Cfg6] {
            assert_eq!(ChannelFormat::from_label(&f.label().unwrap()), f);
        }
        assert_eq!(ChannelFormat::from_label(&dict::OP_ATOM.ul), ChannelFormat::None);
    }

    #[test]
    fn test_descriptor_from_metadata() {
        let a = adesc();
        assert_eq!(AudioDescriptor::from_metadata(&a.to_metadata()), a);
    }

    #[test]
    fn test_read_edit_rate_repair() {
        assert_eq!(checked_read_edit_rate(EDIT_RATE_25).unwrap(), EDIT_RATE_25);
        assert_eq!(checked_read_edit_rate(SAMPLE_RATE_48K).unwrap(), EDIT_RATE_24);
        let err = checked_read_edit_rate(Rational::new(29, 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_writer_rejects_bad_rates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mxf");
        let mut a = adesc();
        a.edit_rate = Rational::new(29, 1);
        let err = PcmWriter::open_write(&path, WriterInfo::default(), &a, 16384).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Param);

        let mut a = adesc();
        a.audio_sampling_rate = Rational::new(44100, 1);
        let err = PcmWriter::open_write(&path, WriterInfo::default(), &a, 16384).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Param);
        assert!(!path.exists());
    }

    #[test]
    fn test_frame_size_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mxf");
        let mut w = PcmWriter::open_write(&path, WriterInfo::default(), &adesc(), 16384).unwrap();
        let short = FrameBuffer::from_vec(vec![0; 100]);
        assert_eq!(w.write_frame(&short, None, None).unwrap_err().kind(), ErrorKind::Param);
        w.write_frame(&FrameBuffer::from_vec(vec![7; 36_000]), None, None).unwrap();
        w.finalize().unwrap();

        let mut r = PcmReader::open(&path).unwrap();
        assert_eq!(r.audio_descriptor().channel_format, ChannelFormat::Cfg1);
        assert_eq!(r.audio_descriptor().linked_track_id, 2);
        let mut buf = FrameBuffer::with_capacity(0);
        r.read_frame(0, &mut buf, None, None).unwrap();
        assert_eq!(buf.size(), 36_000);
        assert_eq!(r.read_frame(1, &mut buf, None, None).unwrap_err().kind(), ErrorKind::Range);
    }
}
