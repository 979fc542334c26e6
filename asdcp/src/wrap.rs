//! Driving a track file writer from a sequence of frames.

use std::fs;
use std::path::{Path, PathBuf};

use rand::RngCore;
use uuid::Uuid;

use crate::crypto::{AesEncContext, HmacContext, KEY_LENGTH};
use crate::dict::LabelSetType;
use crate::error::{AsdcpError, Result};
use crate::essence::{FrameWriter, jp2k};
use crate::frame::FrameBuffer;
use crate::info::WriterInfo;

/// Default space reserved for the header partition.
pub const DEFAULT_HEADER_SIZE: u32 = 16384;

/// Configuration for wrapping frames into a track file.
#[derive(Debug, Clone)]
pub struct WrapConfig {
    pub label_set: LabelSetType,
    /// Content key. Essence is encrypted when set.
    pub key: Option<[u8; KEY_LENGTH]>,
    /// Key id recorded in the file. Random when encrypting without one.
    pub key_id: Option<Uuid>,
    pub write_hmac: bool,
    /// Leave the frame header unencrypted. The built-in sources mark the header of
    /// JPEG 2000 codestreams; other sources set the frame's plaintext offset.
    pub plaintext_header: bool,
    /// Source frames to skip before writing.
    pub start_frame: u32,
    /// Number of frames to write (None = the whole source).
    pub duration: Option<u32>,
    /// Stretch the source over `duration` by repeating each frame.
    pub slide: bool,
    pub header_size: u32,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            label_set: LabelSetType::Smpte,
            key: None,
            key_id: None,
            write_hmac: true,
            plaintext_header: false,
            start_frame: 0,
            duration: None,
            slide: false,
            header_size: DEFAULT_HEADER_SIZE,
        }
    }
}

/// Writer identity plus the crypto contexts it should be driven with.
pub struct WriterSetup {
    pub info: WriterInfo,
    pub aes: Option<AesEncContext>,
    pub hmac: Option<HmacContext>,
}

impl WriterInfo {
    /// Writer information for a new file, with fresh identifiers and crypto state for `config`.
    pub fn for_config(config: &WrapConfig) -> Result<WriterSetup> {
        let mut info = WriterInfo {
            label_set: config.label_set,
            asset_uuid: Uuid::new_v4(),
            ..Default::default()
        };
        let Some(key) = config.key else {
            return Ok(WriterSetup {
                info,
                aes: None,
                hmac: None,
            });
        };

        info.encrypted_essence = true;
        info.context_id = Uuid::new_v4();
        info.cryptographic_key_id = match config.key_id {
            Some(id) => id,
            None => {
                let mut bytes = [0u8; 16];
                rand::thread_rng().fill_bytes(&mut bytes);
                Uuid::from_bytes(bytes)
            }
        };

        let mut aes = AesEncContext::new(&key)?;
        aes.set_random_ivec();
        let hmac = if config.write_hmac {
            info.uses_hmac = true;
            Some(HmacContext::new(&key, config.label_set)?)
        } else {
            None
        };
        Ok(WriterSetup {
            info,
            aes: Some(aes),
            hmac,
        })
    }
}

/// Events emitted while wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started { start_frame: u32, duration: Option<u32> },
    FrameWritten { frame: u32, bytes: usize },
    Cancelled { frames_written: u32 },
    Finished { frames_written: u32 },
}

/// How a wrap run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapOutcome {
    Finished { frames: u32 },
    /// Stopped by the progress callback; the file was not finalized.
    Cancelled { frames: u32 },
}

/// A supply of frames, read in order.
pub trait FrameSource {
    /// Fill `buf` with the next frame. Returns `false` once the source is exhausted.
    fn next_frame(&mut self, buf: &mut FrameBuffer<'_>) -> Result<bool>;

    /// Total frames, if known up front.
    fn frame_count(&self) -> Option<u32> {
        None
    }
}

/// Copy `data` into `buf`, marking a JPEG 2000 codestream header as the plaintext prefix.
fn fill_frame(buf: &mut FrameBuffer<'_>, data: &[u8]) -> Result<()> {
    buf.fill(data)?;
    let offset = jp2k::codestream_header_length(data).unwrap_or(0);
    buf.set_plaintext_offset(offset.min(u32::MAX as usize) as u32);
    Ok(())
}

/// Frames held in memory.
pub struct MemoryFrames {
    frames: std::vec::IntoIter<Vec<u8>>,
    total: u32,
}

impl MemoryFrames {
    pub fn new(frames: Vec<Vec<u8>>) -> Self {
        let total = frames.len().min(u32::MAX as usize) as u32;
        Self {
            frames: frames.into_iter(),
            total,
        }
    }
}

impl FrameSource for MemoryFrames {
    fn next_frame(&mut self, buf: &mut FrameBuffer<'_>) -> Result<bool> {
        match self.frames.next() {
            Some(frame) => {
                fill_frame(buf, &frame)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn frame_count(&self) -> Option<u32> {
        Some(self.total)
    }
}

/// One frame per file, taken in file name order.
pub struct FileSequence {
    files: Vec<PathBuf>,
    next: usize,
}

impl FileSequence {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, next: 0 }
    }

    /// Every regular file in `dir` whose extension matches `extension` (case-insensitive).
    pub fn from_dir(dir: &Path, extension: &str) -> Result<Self> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            return Err(AsdcpError::param(format!(
                "no .{extension} files in {}",
                dir.display()
            )));
        }
        log::debug!("{} frames found in {}", files.len(), dir.display());
        Ok(Self::new(files))
    }
}

impl FrameSource for FileSequence {
    fn next_frame(&mut self, buf: &mut FrameBuffer<'_>) -> Result<bool> {
        let Some(path) = self.files.get(self.next) else {
            return Ok(false);
        };
        let data = fs::read(path)?;
        fill_frame(buf, &data)?;
        self.next += 1;
        Ok(true)
    }

    fn frame_count(&self) -> Option<u32> {
        Some(self.files.len().min(u32::MAX as usize) as u32)
    }
}

/// Number of times each source frame is written when sliding `available` frames over `duration`.
fn slide_repeats(config: &WrapConfig, available: Option<u32>) -> Result<u32> {
    if !config.slide {
        return Ok(1);
    }
    match (config.duration, available) {
        (Some(duration), Some(n)) if n > 0 => Ok((duration / n).max(1)),
        _ => Err(AsdcpError::param(
            "slide requires a duration and a source of known length",
        )),
    }
}

/// Write frames from `source` into `writer` as `config` describes, then finalize.
///
/// `progress` sees every event; returning `true` cancels the run before the next
/// frame, leaving the file unfinalized.
pub fn wrap_frames<W, S, F>(
    writer: &mut W,
    source: &mut S,
    config: &WrapConfig,
    mut aes: Option<&mut AesEncContext>,
    hmac: Option<&HmacContext>,
    progress: &mut F,
) -> Result<WrapOutcome>
where
    W: FrameWriter + ?Sized,
    S: FrameSource + ?Sized,
    F: FnMut(ProgressEvent) -> bool,
{
    let available = source
        .frame_count()
        .map(|n| n.saturating_sub(config.start_frame));
    let repeats = slide_repeats(config, available)?;

    let mut buf = FrameBuffer::default();
    for skipped in 0..config.start_frame {
        if !source.next_frame(&mut buf)? {
            return Err(AsdcpError::param(format!(
                "start frame {} is beyond the end of the source ({skipped} frames)",
                config.start_frame
            )));
        }
    }

    if progress(ProgressEvent::Started {
        start_frame: config.start_frame,
        duration: config.duration,
    }) {
        return Ok(cancelled(progress, 0));
    }

    let limit = config.duration.unwrap_or(u32::MAX);
    let mut written = 0u32;
    'source: while written < limit {
        if !source.next_frame(&mut buf)? {
            break;
        }
        if !config.plaintext_header {
            buf.set_plaintext_offset(0);
        }
        for _ in 0..repeats {
            if written == limit {
                break 'source;
            }
            writer.write_frame(&buf, aes.as_deref_mut(), hmac)?;
            written += 1;
            let event = ProgressEvent::FrameWritten {
                frame: written - 1,
                bytes: buf.size(),
            };
            if progress(event) {
                log::info!("wrap cancelled after {written} frames");
                return Ok(cancelled(progress, written));
            }
        }
    }

    // With slide, the last frame holds through any remainder of the duration.
    if config.slide && written > 0 {
        while written < limit {
            writer.write_frame(&buf, aes.as_deref_mut(), hmac)?;
            written += 1;
            if progress(ProgressEvent::FrameWritten {
                frame: written - 1,
                bytes: buf.size(),
            }) {
                return Ok(cancelled(progress, written));
            }
        }
    }

    writer.finalize()?;
    progress(ProgressEvent::Finished {
        frames_written: written,
    });
    Ok(WrapOutcome::Finished { frames: written })
}

fn cancelled<F: FnMut(ProgressEvent) -> bool>(progress: &mut F, frames: u32) -> WrapOutcome {
    progress(ProgressEvent::Cancelled {
        frames_written: frames,
    });
    WrapOutcome::Cancelled { frames }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::dcdata::{DataDescriptor, DcDataReader, DcDataWriter};
    use crate::essence::FrameReader;
    use crate::types::EDIT_RATE_24;
    use crate::writer::WriterState;

    fn frames(n: u8) -> MemoryFrames {
        MemoryFrames::new((0..n).map(|i| vec![i; 32]).collect())
    }

    fn data_writer(path: &Path, info: WriterInfo) -> DcDataWriter {
        let ddesc = DataDescriptor {
            edit_rate: EDIT_RATE_24,
            ..Default::default()
        };
        DcDataWriter::open_write(path, info, &ddesc, DEFAULT_HEADER_SIZE).unwrap()
    }

    fn read_first_bytes(path: &Path) -> Vec<u8> {
        let mut r = DcDataReader::open(path).unwrap();
        let mut buf = FrameBuffer::default();
        (0..r.frame_count())
            .map(|i| {
                r.read_frame(i, &mut buf, None, None).unwrap();
                buf.data()[0]
            })
            .collect()
    }

    #[test]
    fn test_for_config_plain() {
        let setup = WriterInfo::for_config(&WrapConfig::default()).unwrap();
        assert!(!setup.info.encrypted_essence);
        assert!(setup.aes.is_none() && setup.hmac.is_none());
        assert!(setup.info.cryptographic_key_id.is_nil());
    }

    #[test]
    fn test_for_config_encrypted() {
        let config = WrapConfig {
            key: Some([7; KEY_LENGTH]),
            label_set: LabelSetType::Interop,
            ..Default::default()
        };
        let a = WriterInfo::for_config(&config).unwrap();
        let b = WriterInfo::for_config(&config).unwrap();
        assert!(a.info.encrypted_essence && a.info.uses_hmac);
        assert!(a.aes.is_some() && a.hmac.is_some());
        assert_ne!(a.info.cryptographic_key_id, b.info.cryptographic_key_id);
        assert_ne!(a.info.context_id, b.info.context_id);
        assert_eq!(a.info.label_set, LabelSetType::Interop);

        let key_id = Uuid::new_v4();
        let fixed = WriterInfo::for_config(&WrapConfig {
            key_id: Some(key_id),
            write_hmac: false,
            ..config
        })
        .unwrap();
        assert_eq!(fixed.info.cryptographic_key_id, key_id);
        assert!(!fixed.info.uses_hmac && fixed.hmac.is_none());
    }

    #[test]
    fn test_start_and_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let mut w = data_writer(&path, WriterInfo::default());
        let config = WrapConfig {
            start_frame: 2,
            duration: Some(3),
            ..Default::default()
        };
        let mut events = Vec::new();
        let outcome = wrap_frames(&mut w, &mut frames(10), &config, None, None, &mut |e| {
            events.push(e);
            false
        })
        .unwrap();
        assert_eq!(outcome, WrapOutcome::Finished { frames: 3 });
        assert_eq!(events.last(), Some(&ProgressEvent::Finished { frames_written: 3 }));
        assert_eq!(read_first_bytes(&path), vec![2, 3, 4]);
    }

    #[test]
    fn test_start_beyond_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let mut w = data_writer(&path, WriterInfo::default());
        let config = WrapConfig {
            start_frame: 5,
            ..Default::default()
        };
        let err = wrap_frames(&mut w, &mut frames(3), &config, None, None, &mut |_| false);
        assert!(err.is_err());
    }

    #[test]
    fn test_slide() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let mut w = data_writer(&path, WriterInfo::default());
        let config = WrapConfig {
            slide: true,
            duration: Some(7),
            ..Default::default()
        };
        wrap_frames(&mut w, &mut frames(3), &config, None, None, &mut |_| false).unwrap();
        assert_eq!(read_first_bytes(&path), vec![0, 0, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn test_slide_needs_duration() {
        let config = WrapConfig {
            slide: true,
            ..Default::default()
        };
        assert!(slide_repeats(&config, Some(3)).is_err());
    }

    #[test]
    fn test_cancel_leaves_file_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let mut w = data_writer(&path, WriterInfo::default());
        let outcome = wrap_frames(
            &mut w,
            &mut frames(10),
            &WrapConfig::default(),
            None,
            None,
            &mut |e| matches!(e, ProgressEvent::FrameWritten { frame: 3, .. }),
        )
        .unwrap();
        assert_eq!(outcome, WrapOutcome::Cancelled { frames: 4 });
        assert_eq!(w.state(), WriterState::Running);
        assert_eq!(w.frames_written(), 4);
    }

    fn codestream(tile: &[u8]) -> Vec<u8> {
        let mut cs = vec![0xff, 0x4f, 0xff, 0x51, 0x00, 0x04, 0x01, 0x02];
        cs.extend_from_slice(&[0xff, 0x93]);
        cs.extend_from_slice(tile);
        cs
    }

    fn wrapped_plaintext_offset(plaintext_header: bool) -> u32 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.mxf");
        let config = WrapConfig {
            key: Some([3; KEY_LENGTH]),
            plaintext_header,
            ..Default::default()
        };
        let mut setup = WriterInfo::for_config(&config).unwrap();
        let mut w = data_writer(&path, setup.info.clone());
        let mut source = MemoryFrames::new(vec![codestream(&[0x55; 64])]);
        wrap_frames(
            &mut w,
            &mut source,
            &config,
            setup.aes.as_mut(),
            setup.hmac.as_ref(),
            &mut |_| false,
        )
        .unwrap();

        let mut r = DcDataReader::open(&path).unwrap();
        let mut raw = FrameBuffer::default();
        r.read_frame(0, &mut raw, None, None).unwrap();
        raw.plaintext_offset()
    }

    #[test]
    fn test_plaintext_header_from_codestream() {
        let mut source = MemoryFrames::new(vec![codestream(&[0; 16]), vec![0xff; 16]]);
        let mut buf = FrameBuffer::default();
        assert!(source.next_frame(&mut buf).unwrap());
        assert_eq!(buf.plaintext_offset(), 10);
        assert!(source.next_frame(&mut buf).unwrap());
        assert_eq!(buf.plaintext_offset(), 0);

        assert_eq!(wrapped_plaintext_offset(true), 10);
        assert_eq!(wrapped_plaintext_offset(false), 0);
    }

    #[test]
    fn test_file_sequence() {
        let dir = tempfile::tempdir().unwrap();
        for (name, byte) in [("b.j2c", 2u8), ("a.j2c", 1), ("c.txt", 9), ("c.J2C", 3)] {
            fs::write(dir.path().join(name), [byte; 4]).unwrap();
        }
        let mut seq = FileSequence::from_dir(dir.path(), "j2c").unwrap();
        assert_eq!(seq.frame_count(), Some(3));
        let mut buf = FrameBuffer::default();
        let mut seen = Vec::new();
        while seq.next_frame(&mut buf).unwrap() {
            seen.push(buf.data()[0]);
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(FileSequence::from_dir(dir.path(), "wav").is_err());
    }
}
