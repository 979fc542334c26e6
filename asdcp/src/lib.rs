//! Reading and writing AS-DCP track files: single-essence MXF files holding
//! JPEG 2000 pictures, MPEG-2 video, PCM audio or D-Cinema data, optionally
//! AES encrypted with an HMAC-SHA1 integrity pack per frame.
//!
//! The [`essence`] module holds one reader/writer pair per essence kind. Those
//! build on [`writer::EssenceWriter`] and [`reader::EssenceReader`], which own
//! the partition layout, header metadata and index.

pub mod crypto;
pub mod dict;
pub mod error;
pub mod essence;
pub mod frame;
pub mod header;
pub mod index;
pub mod info;
pub mod klv;
pub mod metadata;
pub mod partition;
pub mod primer;
pub mod reader;
pub mod report;
pub mod types;
pub mod ul;
pub mod version;
pub mod wrap;
pub mod writer;

pub use error::{AsdcpError, ErrorKind, Result};
pub use frame::FrameBuffer;
pub use report::{FileReport, TrackReader};
pub use info::{AssetInfo, EssenceClass, EssenceType, WriterInfo, essence_type, read_asset_info};
pub use types::Rational;
pub use ul::Ul;
