//! Track file readers and writers, one module per essence kind.
//!
//! Each writer is a thin layer over [`EssenceWriter`](crate::writer::EssenceWriter)
//! that turns a codec descriptor into header metadata and each reader checks
//! that a file carries the descriptors its codec needs before serving frames.

use crate::crypto::{AesDecContext, AesEncContext, HmacContext};
use crate::error::{AsdcpError, Result};
use crate::frame::FrameBuffer;
use crate::types::Rational;

pub mod atmos;
pub mod dcdata;
pub mod jp2k;
pub mod mpeg2;
pub mod pcm;

/// Anything that accepts frames one edit unit at a time and can be sealed.
pub trait FrameWriter {
    fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()>;

    /// Write the index and footer; no frames may follow.
    fn finalize(&mut self) -> Result<()>;

    fn frames_written(&self) -> u32;
}

/// Random access to the frames of an open track file.
pub trait FrameReader {
    fn read_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()>;

    /// Number of edit units in the file.
    fn frame_count(&self) -> u32;
}

/// Timecode base for an edit rate.
pub(crate) fn timecode_rate(edit_rate: Rational) -> u16 {
    edit_rate.rounded().min(u16::MAX as u32) as u16
}

/// Fail with a parameter error unless `rate` is one of `allowed`.
pub(crate) fn check_edit_rate(rate: Rational, allowed: &[Rational], what: &str) -> Result<()> {
    if allowed.contains(&rate) {
        return Ok(());
    }
    log::error!("{what} edit rate {rate} is not supported");
    Err(AsdcpError::param(format!("unsupported {what} edit rate {rate}")))
}

/// Container duration from a descriptor, clamped into a frame count.
pub(crate) fn container_frames(duration: Option<i64>) -> u32 {
    duration.unwrap_or(0).clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::{EDIT_RATE_23_98, EDIT_RATE_24, EDIT_RATE_48};

    #[test]
    fn test_timecode_rate() {
        assert_eq!(timecode_rate(EDIT_RATE_24), 24);
        assert_eq!(timecode_rate(EDIT_RATE_23_98), 24);
        assert_eq!(timecode_rate(Rational::new(30000, 1001)), 30);
    }

    #[test]
    fn test_check_edit_rate() {
        assert!(check_edit_rate(EDIT_RATE_24, &[EDIT_RATE_24, EDIT_RATE_48], "test").is_ok());
        let err = check_edit_rate(Rational::new(7, 1), &[EDIT_RATE_24], "test").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Param);
    }

    #[test]
    fn test_container_frames_clamps() {
        assert_eq!(container_frames(None), 0);
        assert_eq!(container_frames(Some(-5)), 0);
        assert_eq!(container_frames(Some(120)), 120);
    }
}
