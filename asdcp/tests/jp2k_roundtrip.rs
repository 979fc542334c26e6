mod common;

use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};

use asdcp::crypto::{AesDecContext, HmacContext, KLV_INTPACK_SIZE, calc_esv_length};
use asdcp::dict::LabelSetType;
use asdcp::essence::jp2k::Jp2kReader;
use asdcp::wrap::WrapConfig;
use asdcp::{EssenceType, ErrorKind, FrameBuffer};

use common::{KEY, OTHER_KEY, frame_data, frame_len, setup, write_jp2k};

const FRAMES: u32 = 12;

fn round_trip(label_set: LabelSetType, key: Option<[u8; 16]>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    let config = WrapConfig {
        label_set,
        key,
        ..Default::default()
    };
    let s = setup(&config);
    let asset_uuid = s.info.asset_uuid;
    let key_id = s.info.cryptographic_key_id;
    write_jp2k(&path, s, FRAMES);

    let info = asdcp::read_asset_info(&path).unwrap();
    assert_eq!(info.essence_type, EssenceType::Jpeg2000);
    assert_eq!(info.duration, FRAMES as u64);
    assert_eq!(info.asset_uuid, asset_uuid);
    assert_eq!(info.label_set, label_set);
    assert_eq!(info.encrypted, key.is_some());

    let mut r = Jp2kReader::open(&path).unwrap();
    let header = r.essence_reader().header();
    let expected_partitions = if label_set == LabelSetType::Smpte { 3 } else { 2 };
    assert_eq!(header.rip.pairs.len(), expected_partitions);
    assert_eq!(header.label_set, label_set);
    assert_eq!(r.picture_descriptor().container_duration, FRAMES);

    let mut dec = key.map(|k| AesDecContext::new(&k).unwrap());
    let hmac = key.map(|k| HmacContext::new(&k, label_set).unwrap());
    if key.is_some() {
        assert!(r.info().encrypted_essence && r.info().uses_hmac);
        assert_eq!(r.info().cryptographic_key_id, key_id);
    }

    let mut buf = FrameBuffer::default();
    // read backwards to exercise seeking
    for i in (0..FRAMES).rev() {
        r.read_frame(i, &mut buf, dec.as_mut(), hmac.as_ref()).unwrap();
        assert_eq!(buf.data(), frame_data(i, frame_len(i)).as_slice(), "frame {i}");
        assert_eq!(buf.frame_number(), i);
    }
    let err = r.read_frame(FRAMES, &mut buf, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

#[test]
fn test_smpte_plain() {
    round_trip(LabelSetType::Smpte, None);
}

#[test]
fn test_interop_plain() {
    round_trip(LabelSetType::Interop, None);
}

#[test]
fn test_smpte_encrypted() {
    round_trip(LabelSetType::Smpte, Some(KEY));
}

#[test]
fn test_interop_encrypted() {
    round_trip(LabelSetType::Interop, Some(KEY));
}

#[test]
fn test_ciphertext_without_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig { key: Some(KEY), ..Default::default() }), 3);

    let mut r = Jp2kReader::open(&path).unwrap();
    let mut buf = FrameBuffer::default();
    r.read_frame(1, &mut buf, None, None).unwrap();
    let plain_len = frame_len(1);
    assert_eq!(buf.source_length() as usize, plain_len);
    assert_eq!(buf.plaintext_offset(), 0);
    // ESV followed by the integrity pack
    assert_eq!(buf.size(), calc_esv_length(plain_len, 0) + KLV_INTPACK_SIZE);
}

#[test]
fn test_wrong_key_fails_integrity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig { key: Some(KEY), ..Default::default() }), 2);

    let mut r = Jp2kReader::open(&path).unwrap();
    let mut buf = FrameBuffer::default();
    let mut dec = AesDecContext::new(&OTHER_KEY).unwrap();
    let hmac = HmacContext::new(&OTHER_KEY, LabelSetType::Smpte).unwrap();
    let err = r.read_frame(0, &mut buf, Some(&mut dec), Some(&hmac)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);

    // without the integrity check the check value catches the bad key
    let err = r.read_frame(0, &mut buf, Some(&mut dec), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);

    let mut dec = AesDecContext::new(&KEY).unwrap();
    r.read_frame(0, &mut buf, Some(&mut dec), None).unwrap();
    assert_eq!(buf.data(), frame_data(0, frame_len(0)).as_slice());
}

#[test]
fn test_tampered_frame_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    write_jp2k(&path, setup(&WrapConfig { key: Some(KEY), ..Default::default() }), 3);

    let target = {
        let r = Jp2kReader::open(&path).unwrap();
        r.essence_reader().locate_frame(1).unwrap().offset + 400
    };
    let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
    file.seek(SeekFrom::Start(target)).unwrap();
    let mut byte = [0u8; 1];
    file.read_exact(&mut byte).unwrap();
    byte[0] ^= 0x5a;
    file.seek(SeekFrom::Start(target)).unwrap();
    file.write_all(&byte).unwrap();
    drop(file);

    let mut r = Jp2kReader::open(&path).unwrap();
    let mut dec = AesDecContext::new(&KEY).unwrap();
    let hmac = HmacContext::new(&KEY, LabelSetType::Smpte).unwrap();
    let mut buf = FrameBuffer::default();
    let err = r.read_frame(1, &mut buf, Some(&mut dec), Some(&hmac)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);

    for frame in [0, 2] {
        r.read_frame(frame, &mut buf, Some(&mut dec), Some(&hmac)).unwrap();
        assert_eq!(buf.data(), frame_data(frame, frame_len(frame)).as_slice());
    }
}

#[test]
fn test_plaintext_prefix_kept() {
    use asdcp::essence::jp2k::Jp2kWriter;
    use asdcp::wrap::DEFAULT_HEADER_SIZE;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picture.mxf");
    let mut s = setup(&WrapConfig { key: Some(KEY), ..Default::default() });
    let mut w = Jp2kWriter::open_write(&path, s.info.clone(), &common::picture_descriptor(), DEFAULT_HEADER_SIZE)
        .unwrap();
    let data = frame_data(0, 1000);
    let mut buf = FrameBuffer::from_vec(data.clone());
    buf.set_plaintext_offset(120);
    w.write_frame(&buf, s.aes.as_mut(), s.hmac.as_ref()).unwrap();
    w.finalize().unwrap();

    let mut r = Jp2kReader::open(&path).unwrap();
    let mut raw = FrameBuffer::default();
    r.read_frame(0, &mut raw, None, None).unwrap();
    assert_eq!(raw.plaintext_offset(), 120);
    // IV and check value come first, then the clear prefix
    assert_eq!(&raw.data()[32..152], &data[..120]);

    let mut dec = AesDecContext::new(&KEY).unwrap();
    let mut out = FrameBuffer::default();
    r.read_frame(0, &mut out, Some(&mut dec), None).unwrap();
    assert_eq!(out.data(), data.as_slice());
}
