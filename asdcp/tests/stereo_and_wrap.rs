mod common;

use asdcp::crypto::{AesDecContext, HmacContext};
use asdcp::dict::LabelSetType;
use asdcp::essence::FrameReader;
use asdcp::essence::jp2k::{Jp2kReader, Jp2kStereoReader, Jp2kStereoWriter, Jp2kWriter, StereoPhase};
use asdcp::essence::mpeg2::{FrameType, Mpeg2FrameInfo, Mpeg2Reader, Mpeg2Writer, VideoDescriptor};
use asdcp::reader::EssenceReader;
use asdcp::types::{EDIT_RATE_24, EDIT_RATE_48, Rational};
use asdcp::wrap::{DEFAULT_HEADER_SIZE, FileSequence, MemoryFrames, ProgressEvent, WrapConfig, WrapOutcome, wrap_frames};
use asdcp::{ErrorKind, EssenceType, FrameBuffer};

use common::{KEY, frame_data, frame_len, picture_descriptor, setup};

fn eye(frame: u32, phase: StereoPhase) -> Vec<u8> {
    let n = 2 * frame + if phase == StereoPhase::Left { 0 } else { 1 };
    frame_data(n, frame_len(n))
}

fn write_stereo(path: &std::path::Path, label_set: LabelSetType, key: Option<[u8; 16]>, pairs: u32) {
    let mut s = setup(&WrapConfig {
        label_set,
        key,
        ..Default::default()
    });
    let mut w = Jp2kStereoWriter::open_write(path, s.info.clone(), &picture_descriptor(), DEFAULT_HEADER_SIZE)
        .unwrap();
    for f in 0..pairs {
        for phase in [StereoPhase::Left, StereoPhase::Right] {
            let buf = FrameBuffer::from_vec(eye(f, phase));
            w.write_frame(&buf, phase, s.aes.as_mut(), s.hmac.as_ref()).unwrap();
        }
    }
    w.finalize().unwrap();
}

#[test]
fn test_stereo_encrypted_round_trip() {
    for label_set in [LabelSetType::Smpte, LabelSetType::Interop] {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.mxf");
        write_stereo(&path, label_set, Some(KEY), 4);

        let info = asdcp::read_asset_info(&path).unwrap();
        assert_eq!(info.essence_type, EssenceType::Jpeg2000Stereo);
        assert!(info.stereoscopic);
        assert_eq!(info.duration, 4);
        assert_eq!(info.edit_rate, EDIT_RATE_24);
        assert_eq!(info.sample_rate, EDIT_RATE_48);

        let mut r = Jp2kStereoReader::open(&path).unwrap();
        assert_eq!(r.frame_count(), 4);
        let mut dec = AesDecContext::new(&KEY).unwrap();
        let hmac = HmacContext::new(&KEY, label_set).unwrap();
        let (mut left, mut right) = (FrameBuffer::default(), FrameBuffer::default());

        r.read_pair(2, &mut left, &mut right, Some(&mut dec), Some(&hmac)).unwrap();
        assert_eq!(left.data(), eye(2, StereoPhase::Left).as_slice());
        assert_eq!(right.data(), eye(2, StereoPhase::Right).as_slice());

        // a right eye read on its own steps over the left eye packet
        r.read_frame(0, StereoPhase::Right, &mut right, Some(&mut dec), Some(&hmac)).unwrap();
        assert_eq!(right.data(), eye(0, StereoPhase::Right).as_slice());
        r.read_frame(3, StereoPhase::Left, &mut left, Some(&mut dec), Some(&hmac)).unwrap();
        assert_eq!(left.data(), eye(3, StereoPhase::Left).as_slice());

        let err = r
            .read_frame(4, StereoPhase::Left, &mut left, None, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);

        // mono reader refuses stereo files
        let err = Jp2kReader::open(&path).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}

#[test]
fn test_stereo_phase_enforced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.mxf");
    let s = setup(&WrapConfig::default());
    let mut w = Jp2kStereoWriter::open_write(&path, s.info, &picture_descriptor(), DEFAULT_HEADER_SIZE)
        .unwrap();
    let buf = FrameBuffer::from_vec(vec![1; 32]);
    let err = w.write_frame(&buf, StereoPhase::Right, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    w.write_frame(&buf, StereoPhase::Left, None, None).unwrap();
    assert_eq!(w.next_phase(), StereoPhase::Right);
    assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);
    w.write_frame(&buf, StereoPhase::Right, None, None).unwrap();
    w.finalize().unwrap();
}

#[test]
fn test_mono_reader_rejects_mismatched_rates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.mxf");
    write_stereo(&path, LabelSetType::Smpte, None, 1);
    let err = Jp2kReader::from_reader(EssenceReader::open(&path).unwrap()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(Jp2kStereoReader::open(&path).is_ok());
}

#[test]
fn test_mpeg2_encrypted_gop_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("video.mxf");
    let mut s = setup(&WrapConfig {
        key: Some(KEY),
        ..Default::default()
    });
    let vdesc = VideoDescriptor {
        edit_rate: EDIT_RATE_24,
        frame_rate: 24,
        sample_rate: EDIT_RATE_24,
        stored_width: 1920,
        stored_height: 1080,
        aspect_ratio: Rational::new(16, 9),
        ..Default::default()
    };
    let mut w = Mpeg2Writer::open_write(&path, s.info.clone(), &vdesc, DEFAULT_HEADER_SIZE).unwrap();
    let pattern = [FrameType::I, FrameType::P, FrameType::B, FrameType::B];
    for n in 0..12u32 {
        let frame_type = pattern[n as usize % 4];
        let info = Mpeg2FrameInfo {
            frame_type,
            temporal_offset: if frame_type == FrameType::P { 2 } else { 0 },
            gop_start: frame_type == FrameType::I,
            closed_gop: n == 0,
        };
        let buf = FrameBuffer::from_vec(frame_data(n, 500));
        w.write_frame(&buf, &info, s.aes.as_mut(), s.hmac.as_ref()).unwrap();
    }
    w.finalize().unwrap();

    assert_eq!(asdcp::essence_type(&path).unwrap(), EssenceType::Mpeg2Ves);
    let mut r = Mpeg2Reader::open(&path).unwrap();
    assert_eq!(r.frame_count(), 12);
    assert_eq!(r.find_frame_gop_start(7).unwrap(), 4);
    assert_eq!(r.find_frame_gop_start(8).unwrap(), 8);
    assert_eq!(r.frame_type(10).unwrap(), FrameType::B);

    let mut dec = AesDecContext::new(&KEY).unwrap();
    let hmac = HmacContext::new(&KEY, LabelSetType::Smpte).unwrap();
    let mut buf = FrameBuffer::default();
    let (start, info) = r
        .read_frame_gop_start(11, &mut buf, Some(&mut dec), Some(&hmac))
        .unwrap();
    assert_eq!(start, 8);
    assert_eq!(info.frame_type, FrameType::I);
    assert!(info.gop_start && !info.closed_gop);
    assert_eq!(buf.data(), frame_data(8, 500).as_slice());
}

#[test]
fn test_wrap_directory_encrypted() {
    let dir = tempfile::tempdir().unwrap();
    let frames = dir.path().join("j2c");
    std::fs::create_dir(&frames).unwrap();
    for i in 0..6u32 {
        std::fs::write(frames.join(format!("frame_{i:06}.j2c")), frame_data(i, frame_len(i))).unwrap();
    }
    let path = dir.path().join("picture.mxf");
    let config = WrapConfig {
        key: Some(KEY),
        start_frame: 1,
        duration: Some(4),
        ..Default::default()
    };
    let mut s = setup(&config);
    let mut w = Jp2kWriter::open_write(&path, s.info.clone(), &picture_descriptor(), config.header_size).unwrap();
    let mut source = FileSequence::from_dir(&frames, "j2c").unwrap();
    let mut written = Vec::new();
    let outcome = wrap_frames(&mut w, &mut source, &config, s.aes.as_mut(), s.hmac.as_ref(), &mut |e| {
        if let ProgressEvent::FrameWritten { frame, .. } = e {
            written.push(frame);
        }
        false
    })
    .unwrap();
    assert_eq!(outcome, WrapOutcome::Finished { frames: 4 });
    assert_eq!(written, vec![0, 1, 2, 3]);

    let mut r = Jp2kReader::open(&path).unwrap();
    let mut dec = AesDecContext::new(&KEY).unwrap();
    let hmac = HmacContext::new(&KEY, LabelSetType::Smpte).unwrap();
    let mut buf = FrameBuffer::default();
    for i in 0..4 {
        r.read_frame(i, &mut buf, Some(&mut dec), Some(&hmac)).unwrap();
        assert_eq!(buf.data(), frame_data(i + 1, frame_len(i + 1)).as_slice());
    }
}

#[test]
fn test_wrap_stereo_pairs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.mxf");
    let s = setup(&WrapConfig::default());
    let mut w = Jp2kStereoWriter::open_write(&path, s.info, &picture_descriptor(), DEFAULT_HEADER_SIZE)
        .unwrap();
    let eyes = (0..3)
        .flat_map(|f| [eye(f, StereoPhase::Left), eye(f, StereoPhase::Right)])
        .collect();
    wrap_frames(&mut w, &mut MemoryFrames::new(eyes), &WrapConfig::default(), None, None, &mut |_| false)
        .unwrap();

    let mut r = Jp2kStereoReader::open(&path).unwrap();
    assert_eq!(r.frame_count(), 3);
    let (mut left, mut right) = (FrameBuffer::default(), FrameBuffer::default());
    r.read_pair(1, &mut left, &mut right, None, None).unwrap();
    assert_eq!(left.data(), eye(1, StereoPhase::Left).as_slice());
    assert_eq!(right.data(), eye(1, StereoPhase::Right).as_slice());
}

#[test]
fn test_cancelled_wrap_is_not_a_track_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    let s = setup(&WrapConfig::default());
    let mut w = Jp2kWriter::open_write(&path, s.info, &picture_descriptor(), DEFAULT_HEADER_SIZE).unwrap();
    let source = (0..5).map(|i| frame_data(i, frame_len(i))).collect();
    let outcome = wrap_frames(
        &mut w,
        &mut MemoryFrames::new(source),
        &WrapConfig::default(),
        None,
        None,
        &mut |e| matches!(e, ProgressEvent::FrameWritten { frame: 1, .. }),
    )
    .unwrap();
    assert_eq!(outcome, WrapOutcome::Cancelled { frames: 2 });
    drop(w);

    let readable = Jp2kReader::open(&path).and_then(|mut r| {
        let mut buf = FrameBuffer::default();
        r.read_frame(0, &mut buf, None, None)
    });
    assert!(readable.is_err());
}
