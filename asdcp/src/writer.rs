use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use uuid::Uuid;

use crate::crypto::{self, AesEncContext, HmacContext, KLV_CRYPTINFO_SIZE, KLV_EMPTY_INTPACK_SIZE, KLV_INTPACK_SIZE};
use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::frame::FrameBuffer;
use crate::header::{HeaderPartition, MIN_HEADER_SIZE};
use crate::index::{BODY_SID, DeltaEntry, INDEX_SID, IndexEntry, IndexFooter};
use crate::info::WriterInfo;
use crate::klv::{self, MAX_BER4_VALUE, MXF_BER_LENGTH};
use crate::metadata::{
    ContentStorage, CryptographicContext, CryptographicFramework, DmSegment, EssenceContainerData,
    GenericPackage, GenericTrack, Identification, MaterialPackage, MdObject, Preface,
    Sequence, SourceClip, SourcePackage, StaticTrack, StructuralComponent, TimecodeComponent, Track,
};
use crate::partition::Partition;
use crate::types::{Rational, Timestamp, VersionType};
use crate::ul::{Ul, Umid};

/// Material type byte used for every package UMID this writer creates.
const UMID_MATERIAL_TYPE: u8 = 0x0f;
const MATERIAL_PACKAGE_NAME: &str = "AS-DCP Material Package";
const PREFACE_VERSION: u16 = 258;

/// Writer lifecycle. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WriterState {
    Begin,
    Init,
    Ready,
    Running,
    Final,
}

impl WriterState {
    pub fn name(self) -> &'static str {
        match self {
            WriterState::Begin => "BEGIN",
            WriterState::Init => "INIT",
            WriterState::Ready => "READY",
            WriterState::Running => "RUNNING",
            WriterState::Final => "FINAL",
        }
    }
}

/// How the essence of one track is labelled and indexed.
#[derive(Debug, Clone)]
pub struct EssenceParams {
    /// Name given to the file package.
    pub package_label: String,
    /// Essence container (wrapping) label.
    pub wrapping_ul: Ul,
    pub track_name: String,
    /// Essence element key; the stream byte is filled in by the writer.
    pub essence_ul: Ul,
    pub data_definition: Ul,
    pub edit_rate: Rational,
    pub tc_frame_rate: u16,
    /// Fixed packet size for a CBR index, 0 for VBR.
    pub bytes_per_edit_unit: u32,
}

/// Codec-independent half of every track file writer.
///
/// Composes the header metadata graph, writes EKLV packets, keeps the index
/// and finally rewrites the header once the duration is known.
pub struct EssenceWriter {
    file: Option<BufWriter<File>>,
    state: WriterState,
    info: WriterInfo,
    header: HeaderPartition,
    footer: IndexFooter,
    header_size: u32,
    essence_ul: Ul,
    cbr: bool,
    stream_offset: u64,
    frames_written: u32,
    duration_items: Vec<Uuid>,
    descriptor_id: Option<Uuid>,
}

impl EssenceWriter {
    pub fn new(info: WriterInfo) -> Self {
        let label_set = info.label_set;
        EssenceWriter {
            file: None,
            state: WriterState::Begin,
            info,
            header: HeaderPartition::new(label_set),
            footer: IndexFooter::default(),
            header_size: 0,
            essence_ul: Ul::NIL,
            cbr: false,
            stream_offset: 0,
            frames_written: 0,
            duration_items: Vec::new(),
            descriptor_id: None,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn info(&self) -> &WriterInfo {
        &self.info
    }

    pub fn header(&self) -> &HeaderPartition {
        &self.header
    }

    /// Direct access to the index footer, for codecs that set delta entries.
    pub fn footer_mut(&mut self) -> &mut IndexFooter {
        &mut self.footer
    }

    pub fn set_delta_params(&mut self, entries: Vec<DeltaEntry>) {
        self.footer.set_delta_params(entries);
    }

    /// Bytes of essence written so far, counted from the start of the essence container.
    pub fn stream_offset(&self) -> u64 {
        self.stream_offset
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    /// The essence element key as written, stream byte included.
    pub fn essence_ul(&self) -> &Ul {
        &self.essence_ul
    }

    fn require(&self, expected: WriterState, op: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(AsdcpError::State {
                state: self.state.name(),
                op,
            });
        }
        Ok(())
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>> {
        self.file.as_mut().ok_or(AsdcpError::NotOpen)
    }

    /// Create `path` and reserve `header_size` bytes for the header partition.
    pub fn open_write(&mut self, path: &Path, header_size: u32) -> Result<()> {
        self.require(WriterState::Begin, "open for writing")?;
        if header_size < MIN_HEADER_SIZE {
            return Err(AsdcpError::param(format!(
                "header size {header_size} is too small, must be at least {MIN_HEADER_SIZE}"
            )));
        }
        if self.info.label_set == LabelSetType::Unknown {
            return Err(AsdcpError::param("writer label set must be SMPTE or Interop"));
        }
        if self.info.encrypted_essence && self.info.context_id.is_nil() {
            log::warn!("Encrypted essence with a nil cryptographic context ID");
        }

        let file = File::create(path)?;
        self.file = Some(BufWriter::new(file));
        self.header_size = header_size;
        self.state = WriterState::Init;
        log::debug!("opened {} for writing", path.display());
        Ok(())
    }

    /// Bind the essence descriptor and track parameters, then write the header
    /// and (for SMPTE files) the body partition.
    ///
    /// `descriptor` must be an essence descriptor; its sub-descriptor list is
    /// replaced with the ids of `sub_descriptors`.
    pub fn set_source_stream(
        &mut self,
        mut descriptor: MdObject,
        sub_descriptors: Vec<MdObject>,
        params: &EssenceParams,
    ) -> Result<()> {
        self.require(WriterState::Init, "set source stream")?;
        if params.edit_rate.numerator <= 0 || params.edit_rate.denominator <= 0 {
            return Err(AsdcpError::param(format!(
                "invalid edit rate {}/{}",
                params.edit_rate.numerator, params.edit_rate.denominator
            )));
        }
        {
            let file_desc = descriptor
                .body
                .file_descriptor_mut()
                .ok_or_else(|| AsdcpError::param("descriptor is not an essence descriptor"))?;
            file_desc.descriptor.sub_descriptors =
                sub_descriptors.iter().map(|s| s.instance_uid).collect();
        }

        self.essence_ul = params.essence_ul.with_stream(1);
        self.init_header();
        self.add_source_clip(params);
        self.add_essence_descriptor(descriptor, sub_descriptors, &params.wrapping_ul)?;

        let header_size = self.header_size;
        let file = self.file.as_mut().ok_or(AsdcpError::NotOpen)?;
        self.header.write_to(file, header_size)?;
        self.create_body_part(params.edit_rate, params.bytes_per_edit_unit)?;
        self.state = WriterState::Ready;
        Ok(())
    }

    fn init_header(&mut self) {
        self.header.primer.clear();
        self.header.objects.clear();
        self.header.rip = Default::default();
        self.duration_items.clear();
        self.header.partition.operational_pattern = dict::OP_1A.ul;

        match self.info.label_set {
            LabelSetType::Smpte => self.header.rip.push(0, 0),
            _ => self.header.rip.push(1, 0),
        }

        let ident_id = Uuid::new_v4();
        self.header.add(MdObject::new(Preface {
            last_modified_date: Timestamp::now(),
            version: PREFACE_VERSION,
            identifications: vec![ident_id],
            operational_pattern: dict::OP_1A.ul,
            ..Default::default()
        }));
        self.header.add(MdObject::with_id(
            ident_id,
            Identification {
                this_generation_uid: Uuid::new_v4(),
                company_name: self.info.company_name.clone(),
                product_name: self.info.product_name.clone(),
                version_string: self.info.product_version.clone(),
                product_uid: self.info.product_uuid,
                modification_date: Timestamp::now(),
                toolkit_version: Some(VersionType::toolkit()),
                platform: Some(format!(
                    "{}-{}",
                    std::env::consts::ARCH,
                    std::env::consts::OS
                )),
                ..Default::default()
            },
        ));
    }

    fn add_source_clip(&mut self, params: &EssenceParams) {
        let storage_id = Uuid::new_v4();
        let ecd_id = Uuid::new_v4();
        let mp_id = Uuid::new_v4();
        let fp_id = Uuid::new_v4();
        let sp_umid = Umid::make(UMID_MATERIAL_TYPE, &self.info.asset_uuid);
        let mp_umid = Umid::make(UMID_MATERIAL_TYPE, &Uuid::new_v4());
        let now = Timestamp::now();

        if let Ok(preface) = self.header.preface_mut() {
            preface.content_storage = storage_id;
        }
        self.header.add(MdObject::with_id(
            storage_id,
            ContentStorage {
                packages: vec![mp_id, fp_id],
                essence_container_data: vec![ecd_id],
            },
        ));
        self.header.add(MdObject::with_id(
            ecd_id,
            EssenceContainerData {
                linked_package_uid: sp_umid,
                index_sid: INDEX_SID,
                body_sid: BODY_SID,
            },
        ));

        // material package
        let mp_tc_track = Uuid::new_v4();
        let mp_track = Uuid::new_v4();
        self.header.add(MdObject::with_id(
            mp_id,
            MaterialPackage {
                package: GenericPackage {
                    package_uid: mp_umid,
                    name: Some(MATERIAL_PACKAGE_NAME.to_string()),
                    package_creation_date: now,
                    package_modified_date: now,
                    tracks: vec![mp_tc_track, mp_track],
                },
            },
        ));
        self.add_timecode_track(mp_tc_track, params, 0);
        self.add_essence_track(
            mp_track,
            params,
            0,
            SourceClip {
                component: StructuralComponent {
                    data_definition: params.data_definition,
                    duration: None,
                },
                start_position: 0,
                source_package_id: sp_umid,
                source_track_id: 2,
            },
        );

        // file package
        let fp_tc_track = Uuid::new_v4();
        let fp_track = Uuid::new_v4();
        self.header.add(MdObject::with_id(
            fp_id,
            SourcePackage {
                package: GenericPackage {
                    package_uid: sp_umid,
                    name: Some(params.package_label.clone()),
                    package_creation_date: now,
                    package_modified_date: now,
                    tracks: vec![fp_tc_track, fp_track],
                },
                descriptor: None,
            },
        ));
        self.add_timecode_track(fp_tc_track, params, 3600 * params.tc_frame_rate as i64);

        let ul = self.essence_ul.as_bytes();
        let track_number = u32::from_be_bytes([ul[12], ul[13], ul[14], ul[15]]);
        self.add_essence_track(
            fp_track,
            params,
            track_number,
            SourceClip {
                component: StructuralComponent {
                    data_definition: params.data_definition,
                    duration: None,
                },
                start_position: 0,
                source_package_id: Umid::NIL,
                source_track_id: 0,
            },
        );
    }

    fn add_timecode_track(&mut self, track_id: Uuid, params: &EssenceParams, start: i64) {
        let seq_id = Uuid::new_v4();
        let tc_id = Uuid::new_v4();
        self.header.add(MdObject::with_id(
            track_id,
            Track {
                track: GenericTrack {
                    track_id: 1,
                    track_number: 0,
                    track_name: Some("Timecode Track".to_string()),
                    sequence: Some(seq_id),
                },
                edit_rate: params.edit_rate,
                origin: 0,
            },
        ));
        self.header.add(MdObject::with_id(
            seq_id,
            Sequence {
                component: StructuralComponent {
                    data_definition: dict::TIMECODE_DATA_DEF.ul,
                    duration: None,
                },
                structural_components: vec![tc_id],
            },
        ));
        self.header.add(MdObject::with_id(
            tc_id,
            TimecodeComponent {
                component: StructuralComponent {
                    data_definition: dict::TIMECODE_DATA_DEF.ul,
                    duration: None,
                },
                rounded_timecode_base: params.tc_frame_rate,
                start_timecode: start,
                drop_frame: 0,
            },
        ));
        self.duration_items.push(seq_id);
        self.duration_items.push(tc_id);
    }

    fn add_essence_track(
        &mut self,
        track_id: Uuid,
        params: &EssenceParams,
        track_number: u32,
        clip: SourceClip,
    ) {
        let seq_id = Uuid::new_v4();
        let clip_id = Uuid::new_v4();
        self.header.add(MdObject::with_id(
            track_id,
            Track {
                track: GenericTrack {
                    track_id: 2,
                    track_number,
                    track_name: Some(params.track_name.clone()),
                    sequence: Some(seq_id),
                },
                edit_rate: params.edit_rate,
                origin: 0,
            },
        ));
        self.header.add(MdObject::with_id(
            seq_id,
            Sequence {
                component: StructuralComponent {
                    data_definition: params.data_definition,
                    duration: None,
                },
                structural_components: vec![clip_id],
            },
        ));
        self.header.add(MdObject::with_id(clip_id, clip));
        self.duration_items.push(seq_id);
        self.duration_items.push(clip_id);
    }

    fn add_essence_descriptor(
        &mut self,
        mut descriptor: MdObject,
        sub_descriptors: Vec<MdObject>,
        wrapping_ul: &Ul,
    ) -> Result<()> {
        if let Some(file_desc) = descriptor.body.file_descriptor_mut() {
            file_desc.essence_container = *wrapping_ul;
            file_desc.linked_track_id = Some(2);
        }

        let fp_id = self
            .header
            .find_object::<SourcePackage>()
            .map(|o| o.instance_uid)
            .ok_or(AsdcpError::MissingObject("SourcePackage"))?;

        let mut containers = vec![dict::GC_MULTI.ul];
        if self.info.encrypted_essence {
            containers.push(dict::ENCRYPTED_CONTAINER_LABEL.ul);
        } else {
            containers.push(*wrapping_ul);
        }

        {
            let preface = self.header.preface_mut()?;
            preface.primary_package = Some(fp_id);
            preface.essence_containers = containers.clone();
            if self.info.encrypted_essence {
                preface.dm_schemes.push(dict::CRYPTOGRAPHIC_FRAMEWORK_LABEL.ul);
            }
        }
        self.header.partition.essence_containers = containers;

        if self.info.encrypted_essence {
            self.add_dm_scrypt(wrapping_ul)?;
        }

        let descriptor_id = self.header.add(descriptor);
        for sub in sub_descriptors {
            self.header.add(sub);
        }
        if let Some(fp) = self.header.find_mut::<SourcePackage>() {
            fp.descriptor = Some(descriptor_id);
        }
        self.descriptor_id = Some(descriptor_id);
        Ok(())
    }

    /// Descriptive track carrying the cryptographic context.
    fn add_dm_scrypt(&mut self, wrapping_ul: &Ul) -> Result<()> {
        let track_id = Uuid::new_v4();
        let seq_id = Uuid::new_v4();
        let segment_id = Uuid::new_v4();
        let framework_id = Uuid::new_v4();
        let context_id = Uuid::new_v4();

        self.header
            .find_mut::<SourcePackage>()
            .ok_or(AsdcpError::MissingObject("SourcePackage"))?
            .package
            .tracks
            .push(track_id);

        self.header.add(MdObject::with_id(
            track_id,
            StaticTrack {
                track: GenericTrack {
                    track_id: 3,
                    track_number: 0,
                    track_name: Some("Descriptive Track".to_string()),
                    sequence: Some(seq_id),
                },
            },
        ));
        self.header.add(MdObject::with_id(
            seq_id,
            Sequence {
                component: StructuralComponent {
                    data_definition: dict::DESCRIPTIVE_METADATA_DEF.ul,
                    duration: None,
                },
                structural_components: vec![segment_id],
            },
        ));
        self.header.add(MdObject::with_id(
            segment_id,
            DmSegment {
                component: StructuralComponent {
                    data_definition: dict::DESCRIPTIVE_METADATA_DEF.ul,
                    duration: None,
                },
                event_start_position: None,
                event_comment: Some("AS-DCP KLV Encryption".to_string()),
                dm_framework: Some(framework_id),
            },
        ));
        self.header.add(MdObject::with_id(
            framework_id,
            CryptographicFramework {
                context_sr: context_id,
            },
        ));
        self.header.add(MdObject::with_id(
            context_id,
            CryptographicContext {
                context_id: self.info.context_id,
                source_essence_container: *wrapping_ul,
                cipher_algorithm: dict::CIPHER_ALGORITHM_AES.ul,
                mic_algorithm: if self.info.uses_hmac {
                    dict::MIC_ALGORITHM_HMAC_SHA1.ul
                } else {
                    dict::MIC_ALGORITHM_NONE.ul
                },
                cryptographic_key_id: self.info.cryptographic_key_id,
            },
        ));
        Ok(())
    }

    fn create_body_part(&mut self, edit_rate: Rational, bytes_per_edit_unit: u32) -> Result<()> {
        let label_set = self.info.label_set;
        let containers = self.header.partition.essence_containers.clone();
        let file = self.file.as_mut().ok_or(AsdcpError::NotOpen)?;

        if label_set == LabelSetType::Smpte {
            let mut body = Partition::new(dict::CLOSED_COMPLETE_BODY_PARTITION.ul);
            body.essence_containers = containers;
            body.this_partition = file.stream_position()?;
            body.body_sid = BODY_SID;
            body.operational_pattern = dict::op_atom(label_set);
            self.header.rip.push(BODY_SID, body.this_partition);
            body.write_to(file)?;
        } else {
            self.header.partition.body_sid = BODY_SID;
        }

        self.footer.partition.index_sid = INDEX_SID;
        if bytes_per_edit_unit == 0 {
            self.cbr = false;
            self.footer.set_params_vbr(edit_rate)
        } else {
            self.cbr = true;
            self.footer.set_params_cbr(edit_rate, bytes_per_edit_unit)
        }
    }

    fn check_frame_state(&mut self, op: &'static str) -> Result<()> {
        match self.state {
            WriterState::Ready => {
                self.state = WriterState::Running;
                Ok(())
            }
            WriterState::Running => Ok(()),
            state => Err(AsdcpError::State {
                state: state.name(),
                op,
            }),
        }
    }

    /// Write one frame as the next edit unit.
    ///
    /// `index` carries the codec's temporal offset, key frame offset and flags;
    /// its stream offset is filled in here. `None` writes the packet without an
    /// index entry, as done for the right eye of a stereoscopic pair. CBR indexes
    /// ignore the entry.
    pub fn write_frame(
        &mut self,
        buf: &FrameBuffer<'_>,
        index: Option<IndexEntry>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        self.validate_frame(buf, ctx.is_some(), hmac.is_some())?;
        self.check_frame_state("write frame")?;

        let stream_offset = self.stream_offset;
        self.write_eklv_packet(buf, ctx, hmac)?;
        if let (Some(mut entry), false) = (index, self.cbr) {
            entry.stream_offset = stream_offset;
            self.footer.push_entry(entry)?;
        }
        self.frames_written += 1;
        Ok(())
    }

    fn validate_frame(&self, buf: &FrameBuffer<'_>, has_ctx: bool, has_hmac: bool) -> Result<()> {
        if !matches!(self.state, WriterState::Ready | WriterState::Running) {
            return Err(AsdcpError::State {
                state: self.state.name(),
                op: "write frame",
            });
        }
        if buf.is_empty() {
            log::error!("Cannot write empty frame buffer");
            return Err(AsdcpError::param("empty frame buffer"));
        }
        if self.info.encrypted_essence {
            if !has_ctx {
                return Err(AsdcpError::param("encrypted essence requires an AES context"));
            }
            if self.info.uses_hmac && !has_hmac {
                return Err(AsdcpError::param("HMAC essence requires an HMAC context"));
            }
            if buf.plaintext_offset() as usize > buf.size() {
                return Err(AsdcpError::param(format!(
                    "plaintext offset {} exceeds frame size {}",
                    buf.plaintext_offset(),
                    buf.size()
                )));
            }
        }
        Ok(())
    }

    fn write_eklv_packet(
        &mut self,
        buf: &FrameBuffer<'_>,
        ctx: Option<&mut AesEncContext>,
        hmac: Option<&HmacContext>,
    ) -> Result<()> {
        let essence_ul = self.essence_ul;
        let sequence = self.frames_written as u64 + 1;

        let written = match (self.info.encrypted_essence, ctx) {
            (true, Some(ctx)) => {
                ctx.set_random_ivec();
                let esv = crypto::encrypt_frame(buf.data(), buf.plaintext_offset() as usize, ctx)?;
                let pack = match (self.info.uses_hmac, hmac) {
                    (true, Some(hmac)) => {
                        crypto::calc_integrity_pack(&esv, &self.info.asset_uuid, sequence, hmac)
                    }
                    (true, None) => {
                        return Err(AsdcpError::param("HMAC essence requires an HMAC context"));
                    }
                    _ => vec![0x83, 0, 0, 0, 0x83, 0, 0, 0, 0x83, 0, 0, 0],
                };
                let overhead = self.triplet_header(buf, &essence_ul, esv.len())?;

                let file = self.file_mut()?;
                file.write_all(&overhead)?;
                file.write_all(&esv)?;
                file.write_all(&pack)?;
                (overhead.len() + esv.len() + pack.len()) as u64
            }
            (true, None) => {
                return Err(AsdcpError::param("encrypted essence requires an AES context"));
            }
            (false, _) => {
                let mut overhead = Vec::with_capacity(klv::KL_LENGTH + 5);
                klv::encode_kl(&mut overhead, &essence_ul, buf.size() as u64)?;
                let file = self.file_mut()?;
                file.write_all(&overhead)?;
                file.write_all(buf.data())?;
                (overhead.len() + buf.size()) as u64
            }
        };
        self.stream_offset += written;
        Ok(())
    }

    /// Key, length and the fixed fields of an encrypted triplet, up to the ESV length.
    fn triplet_header(&self, buf: &FrameBuffer<'_>, essence_ul: &Ul, esv_len: usize) -> Result<Vec<u8>> {
        let pack_len = if self.info.uses_hmac {
            KLV_INTPACK_SIZE
        } else {
            KLV_EMPTY_INTPACK_SIZE
        };
        let mut et_length = (KLV_CRYPTINFO_SIZE + esv_len + pack_len) as u64;
        let mut ber_len = MXF_BER_LENGTH;
        if et_length > MAX_BER4_VALUE {
            ber_len = klv::ber_length_for_value(et_length);
            // the ESV length below grows by the same amount
            et_length += (ber_len - MXF_BER_LENGTH) as u64;
        }

        let mut out = Vec::with_capacity(KLV_CRYPTINFO_SIZE + 32);
        out.extend_from_slice(dict::CRYPT_ESSENCE.ul.as_bytes());
        klv::encode_ber(&mut out, et_length, ber_len)?;
        klv::encode_ber(&mut out, 16, MXF_BER_LENGTH)?;
        out.extend_from_slice(self.info.context_id.as_bytes());
        klv::encode_ber(&mut out, 8, MXF_BER_LENGTH)?;
        out.extend_from_slice(&(buf.plaintext_offset() as u64).to_be_bytes());
        klv::encode_ber(&mut out, 16, MXF_BER_LENGTH)?;
        out.extend_from_slice(essence_ul.as_bytes());
        klv::encode_ber(&mut out, 8, MXF_BER_LENGTH)?;
        out.extend_from_slice(&(buf.size() as u64).to_be_bytes());
        klv::encode_ber(&mut out, esv_len as u64, ber_len)?;
        Ok(out)
    }

    /// Seal the index, write the footer and RIP, and rewrite the header with
    /// final durations. The duration is the number of frames written.
    pub fn finalize(&mut self) -> Result<()> {
        let frames = self.frames_written;
        self.finalize_as(frames)
    }

    /// As [`finalize`](Self::finalize), recording `duration` edit units.
    pub fn finalize_as(&mut self, duration: u32) -> Result<()> {
        self.require(WriterState::Running, "finalize")?;
        self.state = WriterState::Final;
        self.write_footer(duration)
    }

    fn write_footer(&mut self, duration: u32) -> Result<()> {
        let frames = duration as i64;
        for id in &self.duration_items {
            if let Some(component) = self
                .header
                .object_by_id_mut(id)
                .and_then(|o| o.body.structural_component_mut())
            {
                component.duration = Some(frames);
            }
        }
        if let Some(file_desc) = self
            .descriptor_id
            .and_then(|id| self.header.object_by_id_mut(&id))
            .and_then(|o| o.body.file_descriptor_mut())
        {
            file_desc.container_duration = Some(frames);
        }

        let label_set = self.info.label_set;
        let op = dict::op_atom(label_set);
        let file = self.file.as_mut().ok_or(AsdcpError::NotOpen)?;

        self.footer.partition.previous_partition = self
            .header
            .rip
            .pairs
            .last()
            .map(|p| p.byte_offset)
            .unwrap_or(0);
        let here = file.stream_position()?;
        self.header.rip.push(0, here);
        self.header.partition.footer_partition = here;
        self.header.partition.operational_pattern = op;
        if let Some(preface) = self.header.find_mut::<Preface>() {
            preface.operational_pattern = op;
        }

        self.footer.partition.operational_pattern = op;
        self.footer.partition.essence_containers = self.header.partition.essence_containers.clone();
        self.footer.partition.footer_partition = here;
        self.footer.partition.this_partition = here;
        self.footer.write_to(file, duration as u64, label_set)?;
        self.header.rip.write_to(file)?;

        file.seek(SeekFrom::Start(0))?;
        self.header.write_to(file, self.header_size)?;
        file.flush()?;
        log::debug!("finalized track file: {duration} edit units, footer at 0x{here:X}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::metadata::{GenericDataEssenceDescriptor, ObjectBody};
    use crate::types::EDIT_RATE_24;

    fn params() -> EssenceParams {
        EssenceParams {
            package_label: "File Package: test essence".into(),
            wrapping_ul: dict::DC_DATA_WRAPPING_FRAME.ul,
            track_name: "Data Track".into(),
            essence_ul: dict::DC_DATA_ESSENCE.ul,
            data_definition: dict::DATA_DATA_DEF.ul,
            edit_rate: EDIT_RATE_24,
            tc_frame_rate: 24,
            bytes_per_edit_unit: 0,
        }
    }

    fn descriptor() -> MdObject {
        let mut d = GenericDataEssenceDescriptor::default();
        d.file.sample_rate = EDIT_RATE_24;
        MdObject::new(d)
    }

    #[test]
    fn test_state_order_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.mxf");
        let mut w = EssenceWriter::new(WriterInfo::default());

        let frame = FrameBuffer::from_vec(vec![1, 2, 3]);
        assert_eq!(w.write_frame(&frame, None, None, None).unwrap_err().kind(), ErrorKind::State);
        assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(
            w.set_source_stream(descriptor(), vec![], &params()).unwrap_err().kind(),
            ErrorKind::State
        );

        w.open_write(&path, 16384).unwrap();
        assert_eq!(w.state(), WriterState::Init);
        assert_eq!(w.open_write(&path, 16384).unwrap_err().kind(), ErrorKind::State);
        w.set_source_stream(descriptor(), vec![], &params()).unwrap();
        assert_eq!(w.state(), WriterState::Ready);
        assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);

        w.write_frame(&frame, Some(IndexEntry::default()), None, None).unwrap();
        assert_eq!(w.state(), WriterState::Running);
        w.finalize().unwrap();
        assert_eq!(w.state(), WriterState::Final);
        assert_eq!(w.finalize().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(w.write_frame(&frame, None, None, None).unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_small_header_rejected_before_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.mxf");
        let mut w = EssenceWriter::new(WriterInfo::default());
        assert_eq!(w.open_write(&path, 1024).unwrap_err().kind(), ErrorKind::Param);
        assert!(!path.exists());
        assert_eq!(w.state(), WriterState::Begin);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = EssenceWriter::new(WriterInfo::default());
        w.open_write(&dir.path().join("empty.mxf"), 16384).unwrap();
        w.set_source_stream(descriptor(), vec![], &params()).unwrap();
        let err = w.write_frame(&FrameBuffer::default(), None, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Param);
        assert_eq!(w.state(), WriterState::Ready);
    }

    #[test]
    fn test_encrypted_requires_context() {
        let dir = tempfile::tempdir().unwrap();
        let info = WriterInfo {
            encrypted_essence: true,
            context_id: Uuid::new_v4(),
            ..Default::default()
        };
        let mut w = EssenceWriter::new(info);
        w.open_write(&dir.path().join("enc.mxf"), 16384).unwrap();
        w.set_source_stream(descriptor(), vec![], &params()).unwrap();
        let frame = FrameBuffer::from_vec(vec![0; 64]);
        let err = w.write_frame(&frame, None, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Param);
        assert_eq!(w.frames_written(), 0);
    }

    #[test]
    fn test_header_graph_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = EssenceWriter::new(WriterInfo::default());
        w.open_write(&dir.path().join("graph.mxf"), 16384).unwrap();
        w.set_source_stream(descriptor(), vec![], &params()).unwrap();

        let header = w.header();
        let packages = header
            .objects
            .iter()
            .filter(|o| {
                matches!(o.body, ObjectBody::MaterialPackage(_) | ObjectBody::SourcePackage(_))
            })
            .count();
        assert_eq!(packages, 2);
        assert_eq!(header.find_all::<Track>().len(), 4);
        assert_eq!(w.duration_items.len(), 8);

        let fp = header.find::<SourcePackage>().unwrap();
        assert_eq!(fp.package.package_uid.material(), w.info().asset_uuid);
        let track = header.essence_track().unwrap();
        assert_eq!(track.track.track_number, 0x1701_0201);
        assert_eq!(w.essence_ul().as_bytes()[15], 1);

        let tc: Vec<_> = header.find_all::<TimecodeComponent>();
        assert_eq!(tc[0].start_timecode, 0);
        assert_eq!(tc[1].start_timecode, 3600 * 24);
    }
}
