mod common;

use std::fs;
use std::io::Cursor;

use sha2::{Digest, Sha256};

use asdcp::crypto::{AesDecContext, HmacContext};
use asdcp::dict::LabelSetType;
use asdcp::essence::FrameReader;
use asdcp::essence::dcdata::{DataDescriptor, DcDataReader, DcDataWriter};
use asdcp::essence::pcm::{AudioDescriptor, ChannelFormat, PcmReader, PcmWriter, cbr_frame_size};
use asdcp::index::INDEX_SEGMENT_CAPACITY;
use asdcp::klv;
use asdcp::reader::EssenceReader;
use asdcp::types::{EDIT_RATE_24, EDIT_RATE_25, SAMPLE_RATE_48K};
use asdcp::wrap::{DEFAULT_HEADER_SIZE, WrapConfig};
use asdcp::writer::WriterState;
use asdcp::{ErrorKind, FrameBuffer, WriterInfo};

use common::{KEY, frame_data, setup, write_jp2k};

fn audio() -> AudioDescriptor {
    AudioDescriptor {
        edit_rate: EDIT_RATE_25,
        audio_sampling_rate: SAMPLE_RATE_48K,
        channel_count: 2,
        quantization_bits: 24,
        block_align: 6,
        avg_bps: 288_000,
        channel_format: ChannelFormat::Cfg1,
        ..Default::default()
    }
}

#[test]
fn test_pcm_cbr_offsets() {
    for key in [None, Some(KEY)] {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.mxf");
        let mut s = setup(&WrapConfig {
            key,
            ..Default::default()
        });
        let adesc = audio();
        let frame_size = adesc.frame_buffer_size() as usize;
        assert_eq!(frame_size, 1920 * 6);
        let unit = cbr_frame_size(&s.info, &adesc) as u64;

        let mut w = PcmWriter::open_write(&path, s.info.clone(), &adesc, DEFAULT_HEADER_SIZE).unwrap();
        for i in 0..10 {
            let buf = FrameBuffer::from_vec(frame_data(i, frame_size));
            w.write_frame(&buf, s.aes.as_mut(), s.hmac.as_ref()).unwrap();
        }
        w.finalize().unwrap();

        let mut r = PcmReader::open(&path).unwrap();
        assert_eq!(r.frame_count(), 10);
        let segment = &r.essence_reader().index().segments()[0];
        assert_eq!(segment.edit_unit_byte_count as u64, unit);

        let start = r.essence_reader().essence_start();
        for i in 0..10 {
            let loc = r.essence_reader().locate_frame(i).unwrap();
            assert_eq!(loc.offset, start + i as u64 * unit);
        }
        let err = r.essence_reader().locate_frame(10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);

        let mut dec = key.map(|k| AesDecContext::new(&k).unwrap());
        let hmac = key.map(|k| HmacContext::new(&k, LabelSetType::Smpte).unwrap());
        let mut buf = FrameBuffer::default();
        r.read_frame(7, &mut buf, dec.as_mut(), hmac.as_ref()).unwrap();
        assert_eq!(buf.data(), frame_data(7, frame_size).as_slice());
    }
}

#[test]
fn test_vbr_index_segment_rollover() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.mxf");
    let ddesc = DataDescriptor {
        edit_rate: EDIT_RATE_24,
        ..Default::default()
    };
    let total = INDEX_SEGMENT_CAPACITY as u32 + 1;
    let mut w = DcDataWriter::open_write(&path, WriterInfo::default(), &ddesc, DEFAULT_HEADER_SIZE).unwrap();
    for i in 0..total {
        let len = 1 + (i as usize % 7);
        w.write_frame(&FrameBuffer::from_vec(vec![i as u8; len]), None, None).unwrap();
    }
    w.finalize().unwrap();

    let mut r = DcDataReader::open(&path).unwrap();
    assert_eq!(r.frame_count(), total);
    let segments = r.essence_reader().index().segments();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].index_duration, INDEX_SEGMENT_CAPACITY as i64);
    assert_eq!(segments[1].index_start_position, INDEX_SEGMENT_CAPACITY as i64);
    assert_eq!(segments[1].index_duration, 1);

    let mut buf = FrameBuffer::default();
    for frame in [0, 4999, 5000] {
        r.read_frame(frame, &mut buf, None, None).unwrap();
        assert_eq!(buf.size(), 1 + (frame as usize % 7));
        assert!(buf.data().iter().all(|b| *b == frame as u8));
    }
    let err = r.read_frame(total, &mut buf, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

/// Bytes of the primer pack, which follows the header partition pack.
fn primer_digest(path: &std::path::Path) -> Vec<u8> {
    let data = fs::read(path).unwrap();
    let mut cursor = Cursor::new(&data);
    let (partition, _) = klv::read_klv_packet(&mut cursor, 0).unwrap();
    let offset = partition.packet_length();
    let (primer, value) = klv::read_klv_packet(&mut cursor, offset).unwrap();
    let mut hasher = Sha256::new();
    hasher.update(primer.key.as_bytes());
    hasher.update(&value);
    hasher.finalize().to_vec()
}

#[test]
fn test_primer_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.mxf");
    let b = dir.path().join("b.mxf");
    let c = dir.path().join("c.mxf");
    write_jp2k(&a, setup(&WrapConfig::default()), 3);
    write_jp2k(&b, setup(&WrapConfig::default()), 7);
    write_jp2k(&c, setup(&WrapConfig { key: Some(KEY), ..Default::default() }), 3);
    assert_eq!(primer_digest(&a), primer_digest(&b));
    // the cryptographic framework adds tags of its own
    assert_ne!(primer_digest(&a), primer_digest(&c));
}

fn assert_open_rejected(data: &[u8], what: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("damaged.mxf");
    fs::write(&path, data).unwrap();
    match EssenceReader::open(&path) {
        Ok(_) => panic!("{what}: damaged file opened"),
        Err(e) => assert!(
            matches!(e.kind(), ErrorKind::Format | ErrorKind::Range),
            "{what}: unexpected error {e}"
        ),
    }
}

fn written_jp2k(label_set: LabelSetType) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig { label_set, ..Default::default() }), 4);
    fs::read(&path).unwrap()
}

#[test]
fn test_unreadable_rip_rejected() {
    let mut data = written_jp2k(LabelSetType::Interop);
    let len = data.len();
    // the trailing length no longer lands on the RIP key
    data[len - 4..].copy_from_slice(&[0, 0, 0, 40]);
    assert_open_rejected(&data, "bad RIP length");
}

#[test]
fn test_truncated_rip_rejected() {
    let data = written_jp2k(LabelSetType::Smpte);
    for cut in [2usize, 6, 10, 13] {
        assert_open_rejected(&data[..data.len() - cut], &format!("truncated by {cut}"));
    }
}

#[test]
fn test_rip_missing_pair_rejected() {
    let data = written_jp2k(LabelSetType::Smpte);
    let len = data.len();
    // drop the footer pair but keep the original trailer
    let mut cut = data[..len - 16].to_vec();
    cut.extend_from_slice(&data[len - 4..]);
    assert_open_rejected(&cut, "missing RIP pair");
}

/// Overwrite the last occurrence of a 64-bit local-set field with `value`.
fn patch_i64_field(data: &mut [u8], tag: [u8; 2], value: i64) {
    let marker = [tag[0], tag[1], 0x00, 0x08];
    let at = data
        .windows(4)
        .rposition(|w| w == marker)
        .expect("field present in footer");
    data[at + 4..at + 12].copy_from_slice(&value.to_be_bytes());
}

#[test]
fn test_overflowing_index_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig::default()), 4);
    let mut data = fs::read(&path).unwrap();
    patch_i64_field(&mut data, [0x3f, 0x0c], 1);
    patch_i64_field(&mut data, [0x3f, 0x0d], i64::MAX);
    assert_open_rejected(&data, "overflowing index duration");

    let mut data = fs::read(&path).unwrap();
    patch_i64_field(&mut data, [0x3f, 0x0c], -3);
    assert_open_rejected(&data, "negative index start");

    // more edit units than the segment has entries for
    let mut data = fs::read(&path).unwrap();
    patch_i64_field(&mut data, [0x3f, 0x0d], 40);
    assert_open_rejected(&data, "index duration past its entries");
}

#[test]
fn test_open_ended_cbr_index_bounded_by_footer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audio.mxf");
    let adesc = audio();
    let frame_size = adesc.frame_buffer_size() as usize;
    let mut w = PcmWriter::open_write(&path, WriterInfo::default(), &adesc, DEFAULT_HEADER_SIZE).unwrap();
    for i in 0..3 {
        w.write_frame(&FrameBuffer::from_vec(frame_data(i, frame_size)), None, None)
            .unwrap();
    }
    w.finalize().unwrap();

    let mut data = fs::read(&path).unwrap();
    patch_i64_field(&mut data, [0x3f, 0x0d], 0);
    fs::write(&path, &data).unwrap();

    let mut r = PcmReader::open(&path).unwrap();
    let mut buf = FrameBuffer::default();
    r.read_frame(2, &mut buf, None, None).unwrap();
    assert_eq!(buf.data(), frame_data(2, frame_size).as_slice());
    let err = r.essence_reader().locate_frame(100).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    let err = r.read_frame(100, &mut buf, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_rip_length_past_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig::default()), 2);

    let mut data = fs::read(&path).unwrap();
    let len = data.len();
    data[len - 4..].copy_from_slice(&u32::MAX.to_be_bytes());
    fs::write(&path, &data).unwrap();

    let err = EssenceReader::open(&path).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_tiny_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.mxf");
    fs::write(&path, [0x06, 0x0e, 0x2b, 0x34]).unwrap();
    let err = EssenceReader::open(&path).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Format);

    let empty = dir.path().join("empty.mxf");
    fs::write(&empty, []).unwrap();
    assert!(EssenceReader::open(&empty).is_err());
}

#[test]
fn test_writer_state_machine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.mxf");
    let ddesc = DataDescriptor {
        edit_rate: EDIT_RATE_24,
        ..Default::default()
    };
    let mut w = DcDataWriter::open_write(&path, WriterInfo::default(), &ddesc, DEFAULT_HEADER_SIZE).unwrap();
    assert_eq!(w.state(), WriterState::Ready);

    // nothing written yet
    assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);

    let empty = FrameBuffer::from_vec(Vec::new());
    assert_eq!(w.write_frame(&empty, None, None).unwrap_err().kind(), ErrorKind::Param);

    w.write_frame(&FrameBuffer::from_vec(vec![1, 2, 3]), None, None).unwrap();
    assert_eq!(w.state(), WriterState::Running);
    w.finalize().unwrap();
    assert_eq!(w.state(), WriterState::Final);

    let frame = FrameBuffer::from_vec(vec![4]);
    assert_eq!(w.write_frame(&frame, None, None).unwrap_err().kind(), ErrorKind::State);
    assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);
}

#[test]
fn test_encrypted_writer_needs_contexts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.mxf");
    let ddesc = DataDescriptor {
        edit_rate: EDIT_RATE_24,
        ..Default::default()
    };
    let mut s = setup(&WrapConfig {
        key: Some(KEY),
        ..Default::default()
    });
    let mut w = DcDataWriter::open_write(&path, s.info.clone(), &ddesc, DEFAULT_HEADER_SIZE).unwrap();
    let frame = FrameBuffer::from_vec(vec![9; 64]);
    assert_eq!(w.write_frame(&frame, None, None).unwrap_err().kind(), ErrorKind::Param);
    assert_eq!(
        w.write_frame(&frame, s.aes.as_mut(), None).unwrap_err().kind(),
        ErrorKind::Param
    );
    w.write_frame(&frame, s.aes.as_mut(), s.hmac.as_ref()).unwrap();
    w.finalize().unwrap();
}

#[test]
fn test_small_header_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.mxf");
    let ddesc = DataDescriptor {
        edit_rate: EDIT_RATE_24,
        ..Default::default()
    };
    let err = DcDataWriter::open_write(&path, WriterInfo::default(), &ddesc, 512).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Param);
}
