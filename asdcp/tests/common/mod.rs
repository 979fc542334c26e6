#![allow(dead_code)]

use std::path::Path;

use asdcp::crypto::KEY_LENGTH;
use asdcp::essence::jp2k::{ImageComponent, Jp2kWriter, MAX_COMPONENTS, PictureDescriptor};
use asdcp::types::{EDIT_RATE_24, Rational};
use asdcp::wrap::{DEFAULT_HEADER_SIZE, WrapConfig, WriterSetup};
use asdcp::{FrameBuffer, WriterInfo};

pub const KEY: [u8; KEY_LENGTH] = [
    0x4f, 0x2a, 0x91, 0x0c, 0x77, 0xe3, 0x15, 0xb8, 0x60, 0x09, 0xd2, 0x3e, 0xa4, 0x51, 0x8f, 0x1b,
];
pub const OTHER_KEY: [u8; KEY_LENGTH] = [0x11; KEY_LENGTH];

pub fn picture_descriptor() -> PictureDescriptor {
    PictureDescriptor {
        edit_rate: EDIT_RATE_24,
        sample_rate: EDIT_RATE_24,
        stored_width: 1998,
        stored_height: 1080,
        aspect_ratio: Rational::new(1998, 1080),
        rsize: 3,
        xsize: 1998,
        ysize: 1080,
        xtsize: 1998,
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

/// Deterministic frame contents that differ per frame and per length.
pub fn frame_data(frame: u32, len: usize) -> Vec<u8> {
    let mut state = frame.wrapping_mul(2_654_435_761).wrapping_add(len as u32) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

pub fn frame_len(frame: u32) -> usize {
    900 + (frame as usize * 137) % 700
}

pub fn setup(config: &WrapConfig) -> WriterSetup {
    WriterInfo::for_config(config).unwrap()
}

/// Write `count` JPEG 2000 frames of varying size, encrypting if `setup` carries contexts.
pub fn write_jp2k(path: &Path, mut setup: WriterSetup, count: u32) {
    let mut w = Jp2kWriter::open_write(path, setup.info.clone(), &picture_descriptor(), DEFAULT_HEADER_SIZE)
        .unwrap();
    for i in 0..count {
        let buf = FrameBuffer::from_vec(frame_data(i, frame_len(i)));
        w.write_frame(&buf, setup.aes.as_mut(), setup.hmac.as_ref()).unwrap();
    }
    w.finalize().unwrap();
}
