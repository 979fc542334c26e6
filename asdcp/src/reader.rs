use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::crypto::{self, AesDecContext, HmacContext, KLV_INTPACK_SIZE};
use crate::dict;
use crate::error::{AsdcpError, Result};
use crate::frame::FrameBuffer;
use crate::header::HeaderPartition;
use crate::index::IndexFooter;
use crate::info::WriterInfo;
use crate::klv;
use crate::partition::Partition;
use crate::types::{ByteReader, Rational};
use crate::ul::{UL_LENGTH, UUID_LENGTH, Ul};

/// A reader over either a plain track file or one decompressed into memory.
pub enum MxfSource {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for MxfSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            MxfSource::File(r) => r.read(buf),
            MxfSource::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for MxfSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            MxfSource::File(r) => r.seek(pos),
            MxfSource::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a `.mxf` or `.mxf.gz` file and return a seekable reader.
///
/// Gzip-compressed files are fully decompressed into memory.
pub fn open_source(path: &Path) -> std::io::Result<MxfSource> {
    let is_gz = path
        .to_str()
        .map(|s| s.ends_with(".gz"))
        .unwrap_or(false);

    let file = File::open(path)?;
    if is_gz {
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(MxfSource::Memory(Cursor::new(buf)))
    } else {
        Ok(MxfSource::File(BufReader::new(file)))
    }
}

/// Absolute position of a frame's KLV packet plus its index attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FrameLocation {
    pub offset: u64,
    pub temporal_offset: i8,
    pub key_frame_offset: i8,
    pub flags: u8,
}

/// Codec-independent half of every track file reader: header, index and EKLV decoding.
pub struct EssenceReader {
    source: Option<MxfSource>,
    header: HeaderPartition,
    body: Option<Partition>,
    footer: IndexFooter,
    info: WriterInfo,
    essence_start: u64,
    /// Offset of the footer partition; no essence lies at or beyond it.
    essence_end: u64,
    last_position: u64,
    ct_buf: Vec<u8>,
}

impl EssenceReader {
    /// Open the track file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let source = open_source(path)?;
        Self::from_source(source)
    }

    /// Read the header, optional body partition and index footer from `source`.
    pub fn from_source(mut source: MxfSource) -> Result<Self> {
        let header = HeaderPartition::read_from(&mut source)?;

        // three-partition files carry a body partition pack ahead of the essence
        let mut body = None;
        if header.rip.pairs.len() > 2 {
            source.seek(SeekFrom::Start(header.rip.pairs[1].byte_offset))?;
            body = Some(Partition::read_from(&mut source)?);
        }
        let essence_start = source.stream_position()?;
        let info = WriterInfo::from_header(&header)?;

        let essence_end = header.partition.footer_partition;
        if essence_end < essence_start {
            return Err(AsdcpError::format(format!(
                "footer partition at 0x{essence_end:X} precedes the essence at 0x{essence_start:X}"
            )));
        }
        source.seek(SeekFrom::Start(essence_end))?;
        let footer = IndexFooter::read_from(&mut source, &header.primer)?;
        source.seek(SeekFrom::Start(essence_start))?;

        log::debug!(
            "opened track file: essence at 0x{essence_start:X}, {} index segment(s)",
            footer.segments().len()
        );
        Ok(EssenceReader {
            source: Some(source),
            header,
            body,
            footer,
            info,
            essence_start,
            essence_end,
            last_position: essence_start,
            ct_buf: Vec::new(),
        })
    }

    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// Release the file; further reads fail with a not-open error.
    pub fn close(&mut self) {
        self.source = None;
    }

    pub fn header(&self) -> &HeaderPartition {
        &self.header
    }

    pub fn body_partition(&self) -> Option<&Partition> {
        self.body.as_ref()
    }

    pub fn index(&self) -> &IndexFooter {
        &self.footer
    }

    pub fn info(&self) -> &WriterInfo {
        &self.info
    }

    pub fn essence_start(&self) -> u64 {
        self.essence_start
    }

    /// Edit rate of the file package's essence track.
    pub fn edit_rate(&self) -> Result<Rational> {
        self.header
            .essence_track()
            .map(|t| t.edit_rate)
            .ok_or(AsdcpError::MissingObject("essence track"))
    }

    /// Absolute file offset and index attributes of `frame`.
    pub fn locate_frame(&self, frame: u32) -> Result<FrameLocation> {
        let entry = self.footer.lookup(frame)?;
        let offset = self
            .essence_start
            .checked_add(entry.stream_offset)
            .filter(|offset| *offset < self.essence_end)
            .ok_or(AsdcpError::FrameOutOfRange { frame })?;
        Ok(FrameLocation {
            offset,
            temporal_offset: entry.temporal_offset,
            key_frame_offset: entry.key_frame_offset,
            flags: entry.flags,
        })
    }

    /// Seek to `frame` and read its packet into `buf`.
    ///
    /// Encrypted frames are decrypted when `ctx` is given and checked against
    /// their integrity pack when the file uses HMAC and `hmac` is given.
    pub fn read_eklv_frame(
        &mut self,
        frame: u32,
        buf: &mut FrameBuffer<'_>,
        essence_ul: &Ul,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        if self.source.is_none() {
            return Err(AsdcpError::NotOpen);
        }
        let location = self.locate_frame(frame).inspect_err(|_| {
            log::error!("Frame value out of range: {frame}");
        })?;
        self.seek_to(location.offset)?;
        self.read_eklv_packet(frame, frame as u64 + 1, buf, essence_ul, ctx, hmac)
    }

    /// Position the file for the next packet read, skipping the seek when already there.
    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        let source = self.source.as_mut().ok_or(AsdcpError::NotOpen)?;
        if position != self.last_position {
            self.last_position = position;
            source.seek(SeekFrom::Start(position))?;
        }
        Ok(())
    }

    /// Step over the packet at the current position without reading its value.
    pub fn skip_packet(&mut self) -> Result<()> {
        let source = self.source.as_mut().ok_or(AsdcpError::NotOpen)?;
        let offset = self.last_position;
        let skipped = klv::read_kl(source, offset).and_then(|kl| {
            let next = offset + kl.packet_length();
            source.seek(SeekFrom::Start(next))?;
            Ok(next)
        });
        match skipped {
            Ok(next) => {
                self.last_position = next;
                Ok(())
            }
            Err(e) => {
                self.last_position = u64::MAX;
                Err(e)
            }
        }
    }

    /// Read the packet at the current position. `sequence` is the integrity-pack sequence number.
    pub fn read_eklv_packet(
        &mut self,
        frame: u32,
        sequence: u64,
        buf: &mut FrameBuffer<'_>,
        essence_ul: &Ul,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let result = self.read_packet_at_position(frame, sequence, buf, essence_ul, ctx, hmac);
        if result.is_err() {
            // the file position is unknown after a failed read
            self.last_position = u64::MAX;
        }
        result
    }

    fn read_packet_at_position(
        &mut self,
        frame: u32,
        sequence: u64,
        buf: &mut FrameBuffer<'_>,
        essence_ul: &Ul,
        ctx: Option<&mut AesDecContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let source = self.source.as_mut().ok_or(AsdcpError::NotOpen)?;
        let offset = self.last_position;
        let kl = klv::read_kl(source, offset)?;
        self.last_position = offset + kl.packet_length();

        if kl.key.match_ignore_stream(&dict::CRYPT_ESSENCE.ul) {
            if !self.info.encrypted_essence {
                log::error!("EKLV packet found, no Cryptographic Context in header");
                return Err(AsdcpError::format(
                    "encrypted packet in a file without a cryptographic context",
                ));
            }
            if kl.length > klv::MAX_KLV_PACKET_LENGTH {
                return Err(AsdcpError::KlvCoding(format!(
                    "encrypted packet of {} bytes at 0x{offset:X} is too large",
                    kl.length
                )));
            }
            self.ct_buf.resize(kl.length as usize, 0);
            source
                .read_exact(&mut self.ct_buf)
                .map_err(|e| klv::eof_or_io(e, offset, "encrypted triplet"))?;
            decode_triplet(&self.ct_buf, &self.info, frame, sequence, buf, essence_ul, ctx, hmac)
        } else if kl.key.match_ignore_stream(essence_ul) {
            let len = kl.length as usize;
            buf.ensure_capacity(len)?;
            source
                .read_exact(&mut buf.buffer_mut()[..len])
                .map_err(|e| klv::eof_or_io(e, offset, "essence frame"))?;
            buf.set_size(len)?;
            buf.set_frame_number(frame);
            buf.set_source_length(0);
            buf.set_plaintext_offset(0);
            Ok(())
        } else {
            log::warn!("Unexpected Essence UL found: {}", dict::name_of(&kl.key));
            Err(AsdcpError::KeyMismatch {
                offset,
                expected: *essence_ul,
                got: kl.key,
            })
        }
    }
}

/// Consume a BER length and check it carries `expected`.
fn expect_ber(r: &mut ByteReader<'_>, expected: u64, what: &str) -> Result<()> {
    let (value, used) = klv::decode_ber(r.peek_rest())?;
    if value != expected {
        return Err(AsdcpError::format(format!(
            "{what} length is {value}, expected {expected}"
        )));
    }
    r.read_bytes(used)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn decode_triplet(
    packet: &[u8],
    info: &WriterInfo,
    frame: u32,
    sequence: u64,
    buf: &mut FrameBuffer<'_>,
    essence_ul: &Ul,
    ctx: Option<&mut AesDecContext>,
    hmac: Option<&HmacContext>,
) -> Result<()> {
    let mut r = ByteReader::new(packet);

    expect_ber(&mut r, UUID_LENGTH as u64, "ContextID")?;
    let context_id = r.read_uuid()?;
    if context_id != info.context_id {
        log::error!("Packet's Cryptographic Context ID does not match the header");
        return Err(AsdcpError::format("cryptographic context ID does not match the header"));
    }

    expect_ber(&mut r, 8, "PlaintextOffset")?;
    let plaintext_offset = r.read_u64()?;

    expect_ber(&mut r, UL_LENGTH as u64, "SourceKey")?;
    let source_key = r.read_ul()?;
    if !source_key.match_ignore_stream(essence_ul) {
        log::warn!(
            "Unexpected Encrypted Essence UL found: {}",
            dict::name_of(&source_key)
        );
        return Err(AsdcpError::format("encrypted source key does not match the essence"));
    }

    expect_ber(&mut r, 8, "SourceLength")?;
    let source_length = r.read_u64()?;
    if source_length > u32::MAX as u64 || plaintext_offset > source_length {
        return Err(AsdcpError::format(format!(
            "implausible source length {source_length} / plaintext offset {plaintext_offset}"
        )));
    }
    let source_length = source_length as usize;
    let plaintext_offset = plaintext_offset as usize;
    buf.ensure_capacity(source_length)?;

    let esv_length = crypto::calc_esv_length(source_length, plaintext_offset);
    expect_ber(&mut r, esv_length as u64, "ESV")?;

    let pack_len = if info.uses_hmac { KLV_INTPACK_SIZE } else { 0 };
    if r.remaining() < esv_length + pack_len {
        return Err(AsdcpError::format("frame length is larger than EKLV packet length"));
    }
    let esv = r.read_bytes(esv_length)?;
    let pack = r.read_bytes(pack_len)?;

    match ctx {
        Some(ctx) => {
            if let (true, Some(hmac)) = (info.uses_hmac, hmac) {
                crypto::test_integrity_pack(esv, pack, &info.asset_uuid, sequence, hmac)?;
            }
            let plain = crypto::decrypt_frame(esv, source_length, plaintext_offset, ctx)?;
            buf.fill(&plain)?;
            buf.set_source_length(0);
            buf.set_plaintext_offset(0);
        }
        None => {
            // ciphertext and integrity pack go back to the caller untouched
            let total = esv_length + pack_len;
            buf.ensure_capacity(total)?;
            buf.buffer_mut()[..esv_length].copy_from_slice(esv);
            buf.buffer_mut()[esv_length..total].copy_from_slice(pack);
            buf.set_size(total)?;
            buf.set_source_length(source_length as u32);
            buf.set_plaintext_offset(plaintext_offset as u32);
        }
    }
    buf.set_frame_number(frame);
    Ok(())
}
