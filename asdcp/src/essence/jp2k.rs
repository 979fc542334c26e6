//! JPEG 2000 picture track files, single image and stereoscopic.
//!
//! Codestreams are wrapped one per KLV packet. Stereoscopic files interleave
//! left and right eye packets; only left eye packets appear in the index, so a
//! stereo frame number addresses a pair.

use std::path::Path;

use crate::crypto::{AesDecContext, AesEncContext, HmacContext};
use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::essence::{self, FrameReader, FrameWriter};
use crate::frame::FrameBuffer;
use crate::index::IndexEntry;
use crate::info::WriterInfo;
use crate::metadata::{
    GenericPictureEssenceDescriptor, Jpeg2000PictureSubDescriptor, MdObject, RgbaEssenceDescriptor,
    StereoscopicPictureSubDescriptor,
};
use crate::reader::EssenceReader;
use crate::types::{
    EDIT_RATE_100, EDIT_RATE_120, EDIT_RATE_24, EDIT_RATE_25, EDIT_RATE_30, EDIT_RATE_48,
    EDIT_RATE_50, EDIT_RATE_60, EDIT_RATE_96, Rational,
};
use crate::writer::{EssenceParams, EssenceWriter, WriterState};

const JP2K_PACKAGE_LABEL: &str = "File Package: SMPTE 429-4 frame wrapping of JPEG 2000 codestreams";
const JP2K_S_PACKAGE_LABEL: &str =
    "File Package: SMPTE 429-10 frame wrapping of stereoscopic JPEG 2000 codestreams";
const PICTURE_TRACK_NAME: &str = "Picture Track";

pub const MAX_COMPONENTS: usize = 3;
/// Widest picture that is labelled as 2K.
const MAX_2K_WIDTH: u32 = 2048;
const COMPONENT_MAX_REF: u32 = 4095;
/// Two u32 array header words plus three 3-byte components.
const COMPONENT_SIZING_LENGTH: usize = 8 + MAX_COMPONENTS * 3;

/// Single edit rates and the doubled sample rate of their stereoscopic pairing.
const STEREO_RATE_PAIRS: [(Rational, Rational); 6] = [
    (EDIT_RATE_24, EDIT_RATE_48),
    (EDIT_RATE_25, EDIT_RATE_50),
    (EDIT_RATE_30, EDIT_RATE_60),
    (EDIT_RATE_48, EDIT_RATE_96),
    (EDIT_RATE_50, EDIT_RATE_100),
    (EDIT_RATE_60, EDIT_RATE_120),
];

/// Sample rate of a stereoscopic file with edit rate `edit_rate`, when one is defined.
pub fn stereo_sample_rate(edit_rate: Rational) -> Option<Rational> {
    STEREO_RATE_PAIRS
        .iter()
        .find(|(edit, _)| *edit == edit_rate)
        .map(|(_, sample)| *sample)
}

/// True when an edit rate and sample rate describe interleaved stereoscopic essence.
pub fn is_stereo_rate_pair(edit_rate: Rational, sample_rate: Rational) -> bool {
    stereo_sample_rate(edit_rate) == Some(sample_rate)
}

const MARKER_SOC: u8 = 0x4f;
const MARKER_SOD: u8 = 0x93;

/// Markers that carry no length field.
fn is_bare_marker(code: u8) -> bool {
    matches!(code, 0x30..=0x3f | MARKER_SOC | MARKER_SOD | 0x92 | 0xd9)
}

/// Length of a codestream's main and first tile-part header: the offset of the
/// first byte after the SOD marker.
///
/// Returns `None` when `data` is not a JPEG 2000 codestream or its markers run
/// off the end of the buffer.
pub fn codestream_header_length(data: &[u8]) -> Option<usize> {
    if data.get(..2)? != [0xff, MARKER_SOC] {
        return None;
    }
    let mut pos = 2;
    loop {
        let code = match data.get(pos..pos + 2)? {
            [0xff, code] => *code,
            _ => return None,
        };
        pos += 2;
        if code == MARKER_SOD {
            return Some(pos);
        }
        if !is_bare_marker(code) {
            let len = u16::from_be_bytes([*data.get(pos)?, *data.get(pos + 1)?]) as usize;
            if len < 2 {
                return None;
            }
            pos += len;
        }
    }
}

/// Sample precision and subsampling of one image component (SIZ marker values).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ImageComponent {
    pub ssiz: u8,
    pub xrsiz: u8,
    pub yrsiz: u8,
}

/// Codestream parameters of a JPEG 2000 track file.
///
/// `edit_rate` is the track rate; `sample_rate` is the descriptor rate and is
/// double the edit rate in stereoscopic files.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct PictureDescriptor {
    pub edit_rate: Rational,
    pub sample_rate: Rational,
    pub container_duration: u32,
    pub stored_width: u32,
    pub stored_height: u32,
    pub aspect_ratio: Rational,
    pub rsize: u16,
    pub xsize: u32,
    pub ysize: u32,
    pub xosize: u32,
    pub yosize: u32,
    pub xtsize: u32,
    pub ytsize: u32,
    pub xtosize: u32,
    pub ytosize: u32,
    pub csize: u16,
    pub image_components: [ImageComponent; MAX_COMPONENTS],
    /// Raw COD marker segment body.
    pub coding_style_default: Vec<u8>,
    /// Raw QCD marker segment body.
    pub quantization_default: Vec<u8>,
}

impl PictureDescriptor {
    /// True when the stored width selects the 4K essence coding label.
    pub fn is_4k(&self) -> bool {
        self.stored_width > MAX_2K_WIDTH
    }

    fn component_sizing(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMPONENT_SIZING_LENGTH);
        out.extend_from_slice(&(MAX_COMPONENTS as u32).to_be_bytes());
        out.extend_from_slice(&3u32.to_be_bytes());
        for c in &self.image_components {
            out.extend_from_slice(&[c.ssiz, c.xrsiz, c.yrsiz]);
        }
        out
    }

    /// Build the RGBA descriptor and JPEG 2000 sub-descriptor for this picture.
    ///
    /// The descriptor sample rate is `sample_rate`; Rsize and the essence coding
    /// label follow from the stored width.
    pub fn to_metadata(
        &self,
        sample_rate: Rational,
    ) -> (RgbaEssenceDescriptor, Jpeg2000PictureSubDescriptor) {
        let (coding, rsize) = if self.is_4k() {
            (dict::JP2K_ESSENCE_COMPRESSION_4K.ul, 4)
        } else {
            (dict::JP2K_ESSENCE_COMPRESSION_2K.ul, 3)
        };

        let mut picture = GenericPictureEssenceDescriptor {
            frame_layout: Some(0),
            stored_width: self.stored_width,
            stored_height: self.stored_height,
            aspect_ratio: self.aspect_ratio,
            picture_essence_coding: Some(coding),
            ..Default::default()
        };
        picture.file.sample_rate = sample_rate;
        picture.file.container_duration = Some(self.container_duration as i64);

        let rgba = RgbaEssenceDescriptor {
            picture,
            component_max_ref: Some(COMPONENT_MAX_REF),
            component_min_ref: Some(0),
        };
        let non_empty = |v: &Vec<u8>| (!v.is_empty()).then(|| v.clone());
        let sub = Jpeg2000PictureSubDescriptor {
            rsize,
            xsize: self.xsize,
            ysize: self.ysize,
            xosize: self.xosize,
            yosize: self.yosize,
            xtsize: self.xtsize,
            ytsize: self.ytsize,
            xtosize: self.xtosize,
            ytosize: self.ytosize,
            csize: self.csize,
            picture_component_sizing: Some(self.component_sizing()),
            coding_style_default: non_empty(&self.coding_style_default),
            quantization_default: non_empty(&self.quantization_default),
        };
        (rgba, sub)
    }

    /// Recover a picture descriptor from header metadata.
    pub fn from_metadata(
        rgba: &RgbaEssenceDescriptor,
        sub: &Jpeg2000PictureSubDescriptor,
        edit_rate: Rational,
    ) -> Self {
        let picture = &rgba.picture;
        let mut image_components = [ImageComponent::default(); MAX_COMPONENTS];
        match &sub.picture_component_sizing {
            Some(sizing) if sizing.len() == COMPONENT_SIZING_LENGTH => {
                for (c, raw) in image_components.iter_mut().zip(sizing[8..].chunks_exact(3)) {
                    *c = ImageComponent {
                        ssiz: raw[0],
                        xrsiz: raw[1],
                        yrsiz: raw[2],
                    };
                }
            }
            Some(sizing) => log::warn!(
                "Unexpected PictureComponentSizing size: {}, should be {COMPONENT_SIZING_LENGTH}",
                sizing.len()
            ),
            None => log::warn!("JPEG 2000 sub-descriptor has no PictureComponentSizing"),
        }

        PictureDescriptor {
            edit_rate,
            sample_rate: picture.file.sample_rate,
            container_duration: essence::container_frames(picture.file.container_duration),
            stored_width: picture.stored_width,
            stored_height: picture.stored_height,
            aspect_ratio: picture.aspect_ratio,
            rsize: sub.rsize,
            xsize: sub.xsize,
            ysize: sub.ysize,
            xosize: sub.xosize,
            yosize: sub.yosize,
            xtsize: sub.xtsize,
            ytsize: sub.ytsize,
            xtosize: sub.xtosize,
            ytosize: sub.ytosize,
            csize: sub.csize,
            image_components,
            coding_style_default: sub.coding_style_default.clone().unwrap_or_default(),
            quantization_default: sub.quantization_default.clone().unwrap_or_default(),
        }
    }
}

/// Open the generic writer and bind a picture descriptor to it.
fn open_picture_writer(
    path: &Path,
    info: WriterInfo,
    pdesc: &PictureDescriptor,
    header_size: u32,
    stereo: bool,
) -> Result<EssenceWriter> {
    let sample_rate = if stereo {
        stereo_sample_rate(pdesc.edit_rate).ok_or_else(|| {
            log::error!("Stereoscopic wrapping requires 24, 25, 30, 48, 50 or 60 fps input streams");
            AsdcpError::param(format!(
                "edit rate {} cannot be wrapped as stereoscopic essence",
                pdesc.edit_rate
            ))
        })?
    } else {
        pdesc.edit_rate
    };
    if stereo && pdesc.is_4k() {
        log::warn!("Wrapping non-standard 4K stereoscopic content");
    }

    let label_set = info.label_set;
    let mut writer = EssenceWriter::new(info);
    writer.open_write(path, header_size)?;

    let (rgba, sub) = pdesc.to_metadata(sample_rate);
    let mut subs = vec![MdObject::new(sub)];
    if stereo && label_set == LabelSetType::Smpte {
        subs.push(MdObject::new(StereoscopicPictureSubDescriptor));
    }
    let params = EssenceParams {
        package_label: (if stereo { JP2K_S_PACKAGE_LABEL } else { JP2K_PACKAGE_LABEL }).to_string(),
        wrapping_ul: dict::JPEG_2000_WRAPPING_FRAME.ul,
        track_name: PICTURE_TRACK_NAME.to_string(),
        essence_ul: dict::JPEG_2000_ESSENCE.ul,
        data_definition: dict::PICTURE_DATA_DEF.ul,
        edit_rate: pdesc.edit_rate,
        tc_frame_rate: essence::timecode_rate(sample_rate),
        bytes_per_edit_unit: 0,
    };
    writer.set_source_stream(MdObject::new(rgba), subs, &params)?;
    Ok(writer)
}

/// Writes a single-image JPEG 2000 track file.
pub struct Jp2kWriter {
    writer: EssenceWriter,
    pdesc: PictureDescriptor,
}

impl Jp2kWriter {
    /// Create `path` and write its header for pictures described by `pdesc`.
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        pdesc: &PictureDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        let writer = open_picture_writer(path, info, pdesc, header_size, false)?;
        Ok(Jp2kWriter {
            writer,
            pdesc: pdesc.clone(),
        })
    }

    pub fn picture_descriptor(&self) -> &PictureDescriptor {
        &self.pdesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.writer.info()
    }

    pub fn state(&self) -> WriterState {
        self.writer.state()
    }

    /// Append one codestream, encrypting it when `ctx` is given.
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

impl FrameWriter for Jp2kWriter {
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        Jp2kWriter::write_frame(self, buf, ctx, hmac)
    }

    fn finalize(&mut self) -> Result<()> {
        Jp2kWriter::finalize(self)
    }

    fn frames_written(&self) -> u32 {
        self.writer.frames_written()
    }
}

/// Which eye of a stereoscopic pair a codestream belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum StereoPhase {
    Left,
    Right,
}

impl StereoPhase {
    fn other(self) -> Self {
        match self {
            StereoPhase::Left => StereoPhase::Right,
            StereoPhase::Right => StereoPhase::Left,
        }
    }

    fn waiting_state(self) -> &'static str {
        match self {
            StereoPhase::Left => "awaiting left eye",
            StereoPhase::Right => "awaiting right eye",
        }
    }
}

/// Writes a stereoscopic JPEG 2000 track file, one left/right pair per edit unit.
pub struct Jp2kStereoWriter {
    writer: EssenceWriter,
    pdesc: PictureDescriptor,
    next_phase: StereoPhase,
}

impl Jp2kStereoWriter {
    /// Create `path` for stereoscopic pictures. `pdesc.edit_rate` is the pair
    /// rate and must be 24, 25, 30, 48, 50 or 60.
    pub fn open_write(
        path: &Path,
        info: WriterInfo,
        pdesc: &PictureDescriptor,
        header_size: u32,
    ) -> Result<Self> {
        let writer = open_picture_writer(path, info, pdesc, header_size, true)?;
        Ok(Jp2kStereoWriter {
            writer,
            pdesc: pdesc.clone(),
            next_phase: StereoPhase::Left,
        })
    }

    pub fn picture_descriptor(&self) -> &PictureDescriptor {
        &self.pdesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.writer.info()
    }

    pub fn next_phase(&self) -> StereoPhase {
        self.next_phase
    }

    /// Append the `phase` codestream. Phases must alternate, starting with the left eye.
    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        phase: StereoPhase,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        if phase != self.next_phase {
            return Err(AsdcpError::State {
                state: self.next_phase.waiting_state(),
                op: match phase {
                    StereoPhase::Left => "write left eye frame",
                    StereoPhase::Right => "write right eye frame",
                },
            });
        }
        let index = (phase == StereoPhase::Left).then(IndexEntry::default);
        self.writer.write_frame(buf, index, ctx, hmac)?;
        self.next_phase = phase.other();
        Ok(())
    }

    /// Seal the file. Fails when the last pair is missing its right eye.
    pub fn finalize(&mut self) -> Result<()> {
        if self.next_phase != StereoPhase::Left {
            return Err(AsdcpError::State {
                state: self.next_phase.waiting_state(),
                op: "finalize",
            });
        }
        let pairs = self.writer.frames_written() / 2;
        self.writer.finalize_as(pairs)
    }
}

impl FrameWriter for Jp2kStereoWriter {
    /// Writes whichever eye is due next.
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let phase = self.next_phase;
        Jp2kStereoWriter::write_frame(self, buf, phase, ctx, hmac)
    }

    fn finalize(&mut self) -> Result<()> {
        Jp2kStereoWriter::finalize(self)
    }

    fn frames_written(&self) -> u32 {
        self.writer.frames_written()
    }
}

/// Find the picture descriptors and track rate of an open file.
fn read_picture_descriptor(reader: &EssenceReader) -> Result<PictureDescriptor> {
    let header = reader.header();
    let rgba = header.find::<RgbaEssenceDescriptor>().ok_or_else(|| {
        log::error!("RGBAEssenceDescriptor object not found");
        AsdcpError::MissingObject("RGBAEssenceDescriptor")
    })?;
    let sub = header.find::<Jpeg2000PictureSubDescriptor>().ok_or_else(|| {
        log::error!("JPEG2000PictureSubDescriptor object not found");
        AsdcpError::MissingObject("JPEG2000PictureSubDescriptor")
    })?;
    let edit_rate = reader.edit_rate()?;
    Ok(PictureDescriptor::from_metadata(rgba, sub, edit_rate))
}

/// Reads a single-image JPEG 2000 track file.
pub struct Jp2kReader {
    reader: EssenceReader,
    pdesc: PictureDescriptor,
}

impl Jp2kReader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    /// Check that an opened file carries single-image JPEG 2000 essence.
    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let pdesc = read_picture_descriptor(&reader)?;
        if pdesc.edit_rate != pdesc.sample_rate {
            log::warn!(
                "EditRate and SampleRate do not match ({:.03}, {:.03})",
                pdesc.edit_rate.quotient(),
                pdesc.sample_rate.quotient()
            );
            if is_stereo_rate_pair(pdesc.edit_rate, pdesc.sample_rate) {
                log::debug!("File may contain JPEG Interop stereoscopic images");
            }
            return Err(AsdcpError::format(format!(
                "edit rate {} and sample rate {} differ",
                pdesc.edit_rate, pdesc.sample_rate
            )));
        }
        Ok(Jp2kReader { reader, pdesc })
    }

    pub fn picture_descriptor(&self) -> &PictureDescriptor {
        &self.pdesc
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
            .read_eklv_frame(frame, buf, &dict::JPEG_2000_ESSENCE.ul, ctx, hmac)
    }

    pub fn close(&mut self) {
        self.reader.close();
    }
}

impl FrameReader for Jp2kReader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        Jp2kReader::read_frame(self, frame, buf, ctx, hmac)
    }

    fn frame_count(&self) -> u32 {
        self.pdesc.container_duration
    }
}

/// Reads a stereoscopic JPEG 2000 track file.
pub struct Jp2kStereoReader {
    reader: EssenceReader,
    pdesc: PictureDescriptor,
    /// Pair whose left eye was read last, leaving the file at its right eye.
    stereo_ready: Option<u32>,
}

impl Jp2kStereoReader {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_reader(EssenceReader::open(path)?)
    }

    pub fn from_reader(reader: EssenceReader) -> Result<Self> {
        let pdesc = read_picture_descriptor(&reader)?;
        match stereo_sample_rate(pdesc.edit_rate) {
            Some(expected) if expected == pdesc.sample_rate => {}
            Some(expected) => {
                log::error!(
                    "EditRate and SampleRate not correct for {}/{} stereoscopic essence",
                    pdesc.edit_rate.numerator,
                    expected.numerator
                );
                return Err(AsdcpError::format(format!(
                    "sample rate {} does not pair with edit rate {}",
                    pdesc.sample_rate, pdesc.edit_rate
                )));
            }
            None => {
                log::error!(
                    "EditRate not correct for stereoscopic essence: {}",
                    pdesc.edit_rate
                );
                return Err(AsdcpError::format(format!(
                    "edit rate {} is not a stereoscopic rate",
                    pdesc.edit_rate
                )));
            }
        }
        Ok(Jp2kStereoReader {
            reader,
            pdesc,
            stereo_ready: None,
        })
    }

    pub fn picture_descriptor(&self) -> &PictureDescriptor {
        &self.pdesc
    }

    pub fn info(&self) -> &WriterInfo {
        self.reader.info()
    }

    pub fn essence_reader(&self) -> &EssenceReader {
        &self.reader
    }

    /// Read one eye of pair `frame`.
    ///
    /// Reading the left eye and then the right eye of the same pair needs no seek.
    pub fn read_frame(
        &mut self,
        frame: u32,
        phase: StereoPhase,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let sequence = 2 * frame as u64
            + match phase {
                StereoPhase::Left => 1,
                StereoPhase::Right => 2,
            };

        match phase {
            StereoPhase::Left => {
                let location = self.reader.locate_frame(frame)?;
                self.reader.seek_to(location.offset)?;
                self.stereo_ready = Some(frame);
            }
            StereoPhase::Right => {
                if self.stereo_ready != Some(frame) {
                    let location = self.reader.locate_frame(frame)?;
                    self.reader.seek_to(location.offset)?;
                    self.reader.skip_packet()?;
                }
                self.stereo_ready = None;
            }
        }

        let result = self.reader.read_eklv_packet(
            frame,
            sequence,
            buf,
            &dict::JPEG_2000_ESSENCE.ul,
            ctx,
            hmac,
        );
        if result.is_err() {
            self.stereo_ready = None;
        }
        result
    }

    /// Read both eyes of pair `frame`.
    pub fn read_pair(
        &mut self,
        frame: u32,
        left: &mut FrameBuffer<'_>,
        right: &mut FrameBuffer<'_>,
        mut ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.read_frame(frame, StereoPhase::Left, left, ctx.as_deref_mut(), hmac)?;
        self.read_frame(frame, StereoPhase::Right, right, ctx, hmac)
    }

    /// Number of left/right pairs.
    pub fn frame_count(&self) -> u32 {
        self.pdesc.container_duration
    }

    pub fn close(&mut self) {
        self.reader.close();
        self.stereo_ready = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn pdesc(width: u32) -> PictureDescriptor {
        PictureDescriptor {
            edit_rate: EDIT_RATE_24,
            sample_rate: EDIT_RATE_24,
            stored_width: width,
            stored_height: 1080,
            aspect_ratio: Rational::new(width as i32, 1080),
            rsize: 3,
            xsize: width,
            ysize: 1080,
            xtsize: width,
            ytsize: 1080,
            csize: 3,
            image_components: [ImageComponent {
                ssiz: 11,
                xrsiz: 1,
                yrsiz: 1,
            }; MAX_COMPONENTS],
            coding_style_default: vec![1, 4, 0, 1, 1, 5, 3, 3, 0, 0, 0x77, 0x88, 0x88, 0x88, 0x88, 0x88],
            quantization_default: vec![0x22, 0x86, 0xe8, 0x76, 0xe8],
            ..Default::default()
        }
    }

    #[test]
    fn test_stereo_rate_pairs() {
        assert_eq!(stereo_sample_rate(EDIT_RATE_24), Some(EDIT_RATE_48));
        assert_eq!(stereo_sample_rate(EDIT_RATE_60), Some(EDIT_RATE_120));
        assert_eq!(stereo_sample_rate(EDIT_RATE_96), None);
        assert!(is_stereo_rate_pair(EDIT_RATE_50, EDIT_RATE_100));
        assert!(!is_stereo_rate_pair(EDIT_RATE_24, EDIT_RATE_50));
    }

    #[test]
    fn test_component_sizing_layout() {
        let (_, sub) = pdesc(2048).to_metadata(EDIT_RATE_24);
        let sizing = sub.picture_component_sizing.unwrap();
        assert_eq!(sizing.len(), 17);
        assert_eq!(&sizing[..8], &[0, 0, 0, 3, 0, 0, 0, 3]);
        assert_eq!(&sizing[8..11], &[11, 1, 1]);
    }

    #[test]
    fn test_coding_label_follows_width() {
        let (rgba, sub) = pdesc(2048).to_metadata(EDIT_RATE_24);
        assert_eq!(rgba.picture.picture_essence_coding, Some(dict::JP2K_ESSENCE_COMPRESSION_2K.ul));
        assert_eq!(sub.rsize, 3);
        assert_eq!(rgba.component_max_ref, Some(4095));

        let (rgba, sub) = pdesc(4096).to_metadata(EDIT_RATE_24);
        assert_eq!(rgba.picture.picture_essence_coding, Some(dict::JP2K_ESSENCE_COMPRESSION_4K.ul));
        assert_eq!(sub.rsize, 4);
    }

    #[test]
    fn test_codestream_header_length() {
        // SOC, SIZ stub, SOT (10 bytes of body), SOD, then tile data
        let mut cs = vec![0xff, 0x4f, 0xff, 0x51, 0x00, 0x04, 0xaa, 0xbb];
        cs.extend_from_slice(&[0xff, 0x90, 0x00, 0x0a, 0, 0, 0, 0, 0, 0, 0, 1]);
        cs.extend_from_slice(&[0xff, 0x93, 0x12, 0x34]);
        assert_eq!(codestream_header_length(&cs), Some(cs.len() - 2));

        assert_eq!(codestream_header_length(&[0x00, 0x4f, 0xff, 0x93]), None);
        assert_eq!(codestream_header_length(&cs[..10]), None);
        assert_eq!(codestream_header_length(&[]), None);
    }

    #[test]
    fn test_descriptor_from_metadata() {
        let desc = pdesc(1998);
        let (rgba, sub) = desc.to_metadata(EDIT_RATE_24);
        let back = PictureDescriptor::from_metadata(&rgba, &sub, EDIT_RATE_24);
        assert_eq!(back, desc);
    }

    #[test]
    fn test_bad_component_sizing_is_tolerated() {
        let (rgba, mut sub) = pdesc(1998).to_metadata(EDIT_RATE_24);
        sub.picture_component_sizing = Some(vec![0, 0, 0, 3]);
        let back = PictureDescriptor::from_metadata(&rgba, &sub, EDIT_RATE_24);
        assert_eq!(back.image_components, [ImageComponent::default(); MAX_COMPONENTS]);
    }

    #[test]
    fn test_stereo_rejects_odd_rate() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = pdesc(2048);
        p.edit_rate = EDIT_RATE_96;
        let path = dir.path().join("bad.mxf");
        let err = Jp2kStereoWriter::open_write(&path, WriterInfo::default(), &p, 16384)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Param);
        assert!(!path.exists());
    }

    #[test]
    fn test_stereo_phase_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.mxf");
        let mut w = Jp2kStereoWriter::open_write(&path, WriterInfo::default(), &pdesc(2048), 16384)
            .unwrap();
        let frame = FrameBuffer::from_vec(vec![0xff, 0x4f, 0xff, 0x51]);

        let err = w.write_frame(&frame, StereoPhase::Right, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        w.write_frame(&frame, StereoPhase::Left, None, None).unwrap();
        assert_eq!(w.next_phase(), StereoPhase::Right);
        assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);
        w.write_frame(&frame, StereoPhase::Right, None, None).unwrap();
        w.finalize().unwrap();

        let mut r = Jp2kStereoReader::open(&path).unwrap();
        assert_eq!(r.frame_count(), 1);
        assert_eq!(r.picture_descriptor().sample_rate, EDIT_RATE_48);
        let mut buf = FrameBuffer::with_capacity(16);
        r.read_frame(0, StereoPhase::Right, &mut buf, None, None).unwrap();
        assert_eq!(buf.data(), frame.data());
        assert!(Jp2kReader::open(&path).is_err());
    }
}
