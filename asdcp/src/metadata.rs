//! Structural metadata sets and the label-keyed parser registry.
//!
//! Every concrete set is a plain struct. Shared field groups (package, track,
//! component and descriptor fields) are embedded by composition, so a
//! `WaveAudioDescriptor` owns a `GenericSoundEssenceDescriptor`, which owns a
//! `FileDescriptor`, and so on.

use std::collections::HashMap;
use std::sync::OnceLock;

use uuid::Uuid;

use crate::dict::{self, DictEntry};
use crate::error::Result;
use crate::klv;
use crate::primer::{Primer, RawItem, TlvReader, TlvWriter};
use crate::types::{Rational, Timestamp, VersionType};
use crate::ul::{Ul, Umid, UL_LENGTH, UUID_LENGTH};

const UUID_SIZE: u32 = UUID_LENGTH as u32;
const UL_SIZE: u32 = UL_LENGTH as u32;

/// A metadata set with a registered key and local-set fields.
pub trait MetadataSet: Sized {
    const SET: &'static DictEntry;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self>;
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()>;
}

/// Typed access to the matching [`ObjectBody`] variant.
pub trait SetVariant: MetadataSet {
    fn from_body(body: &ObjectBody) -> Option<&Self>;
    fn from_body_mut(body: &mut ObjectBody) -> Option<&mut Self>;
    fn into_body(self) -> ObjectBody;
}

// Shared field groups

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericPackage {
    pub package_uid: Umid,
    pub name: Option<String>,
    pub package_creation_date: Timestamp,
    pub package_modified_date: Timestamp,
    pub tracks: Vec<Uuid>,
}

impl GenericPackage {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericPackage {
            package_uid: r.required(&dict::PACKAGE_UID)?,
            name: r.read_string(&dict::PACKAGE_NAME),
            package_creation_date: r.read_or_default(&dict::PACKAGE_CREATION_DATE)?,
            package_modified_date: r.read_or_default(&dict::PACKAGE_MODIFIED_DATE)?,
            tracks: r.read_batch(&dict::PACKAGE_TRACKS)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::PACKAGE_UID, &self.package_uid)?;
        w.write_opt_string(&dict::PACKAGE_NAME, &self.name)?;
        w.write(&dict::PACKAGE_CREATION_DATE, &self.package_creation_date)?;
        w.write(&dict::PACKAGE_MODIFIED_DATE, &self.package_modified_date)?;
        w.write_batch(&dict::PACKAGE_TRACKS, &self.tracks, UUID_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericTrack {
    pub track_id: u32,
    pub track_number: u32,
    pub track_name: Option<String>,
    pub sequence: Option<Uuid>,
}

impl GenericTrack {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericTrack {
            track_id: r.read_or_default(&dict::TRACK_ID)?,
            track_number: r.read_or_default(&dict::TRACK_NUMBER)?,
            track_name: r.read_string(&dict::TRACK_NAME),
            sequence: r.read(&dict::TRACK_SEQUENCE)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::TRACK_ID, &self.track_id)?;
        w.write(&dict::TRACK_NUMBER, &self.track_number)?;
        w.write_opt_string(&dict::TRACK_NAME, &self.track_name)?;
        w.write_opt(&dict::TRACK_SEQUENCE, &self.sequence)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuralComponent {
    pub data_definition: Ul,
    pub duration: Option<i64>,
}

impl StructuralComponent {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(StructuralComponent {
            data_definition: r.read_or_default(&dict::COMPONENT_DATA_DEFINITION)?,
            duration: r.read(&dict::COMPONENT_DURATION)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::COMPONENT_DATA_DEFINITION, &self.data_definition)?;
        w.write_opt(&dict::COMPONENT_DURATION, &self.duration)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericDescriptor {
    pub locators: Vec<Uuid>,
    pub sub_descriptors: Vec<Uuid>,
}

impl GenericDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericDescriptor {
            locators: r.read_batch(&dict::DESCRIPTOR_LOCATORS)?,
            sub_descriptors: r.read_batch(&dict::DESCRIPTOR_SUB_DESCRIPTORS)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        if !self.locators.is_empty() {
            w.write_batch(&dict::DESCRIPTOR_LOCATORS, &self.locators, UUID_SIZE)?;
        }
        if !self.sub_descriptors.is_empty() {
            w.write_batch(&dict::DESCRIPTOR_SUB_DESCRIPTORS, &self.sub_descriptors, UUID_SIZE)?;
        }
        Ok(())
    }
}

/// Fields common to every essence descriptor. Also a set in its own right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileDescriptor {
    pub descriptor: GenericDescriptor,
    pub linked_track_id: Option<u32>,
    pub sample_rate: Rational,
    pub container_duration: Option<i64>,
    pub essence_container: Ul,
    pub codec: Option<Ul>,
}

impl FileDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(FileDescriptor {
            descriptor: GenericDescriptor::read(r)?,
            linked_track_id: r.read(&dict::FILE_DESCRIPTOR_LINKED_TRACK_ID)?,
            sample_rate: r.read_or_default(&dict::FILE_DESCRIPTOR_SAMPLE_RATE)?,
            container_duration: r.read(&dict::FILE_DESCRIPTOR_CONTAINER_DURATION)?,
            essence_container: r.read_or_default(&dict::FILE_DESCRIPTOR_ESSENCE_CONTAINER)?,
            codec: r.read(&dict::FILE_DESCRIPTOR_CODEC)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.descriptor.write(w)?;
        w.write_opt(&dict::FILE_DESCRIPTOR_LINKED_TRACK_ID, &self.linked_track_id)?;
        w.write(&dict::FILE_DESCRIPTOR_SAMPLE_RATE, &self.sample_rate)?;
        w.write_opt(&dict::FILE_DESCRIPTOR_CONTAINER_DURATION, &self.container_duration)?;
        w.write(&dict::FILE_DESCRIPTOR_ESSENCE_CONTAINER, &self.essence_container)?;
        w.write_opt(&dict::FILE_DESCRIPTOR_CODEC, &self.codec)
    }
}

impl MetadataSet for FileDescriptor {
    const SET: &'static DictEntry = &dict::FILE_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        FileDescriptor::read(r)
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericPictureEssenceDescriptor {
    pub file: FileDescriptor,
    pub frame_layout: Option<u8>,
    pub stored_width: u32,
    pub stored_height: u32,
    pub aspect_ratio: Rational,
    pub picture_essence_coding: Option<Ul>,
}

impl GenericPictureEssenceDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericPictureEssenceDescriptor {
            file: FileDescriptor::read(r)?,
            frame_layout: r.read(&dict::PICTURE_FRAME_LAYOUT)?,
            stored_width: r.read_or_default(&dict::PICTURE_STORED_WIDTH)?,
            stored_height: r.read_or_default(&dict::PICTURE_STORED_HEIGHT)?,
            aspect_ratio: r.read_or_default(&dict::PICTURE_ASPECT_RATIO)?,
            picture_essence_coding: r.read(&dict::PICTURE_ESSENCE_CODING)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.file.write(w)?;
        w.write_opt(&dict::PICTURE_FRAME_LAYOUT, &self.frame_layout)?;
        w.write(&dict::PICTURE_STORED_WIDTH, &self.stored_width)?;
        w.write(&dict::PICTURE_STORED_HEIGHT, &self.stored_height)?;
        w.write(&dict::PICTURE_ASPECT_RATIO, &self.aspect_ratio)?;
        w.write_opt(&dict::PICTURE_ESSENCE_CODING, &self.picture_essence_coding)
    }
}

impl MetadataSet for GenericPictureEssenceDescriptor {
    const SET: &'static DictEntry = &dict::GENERIC_PICTURE_ESSENCE_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        GenericPictureEssenceDescriptor::read(r)
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericSoundEssenceDescriptor {
    pub file: FileDescriptor,
    pub audio_sampling_rate: Rational,
    pub locked: u8,
    pub audio_ref_level: Option<i8>,
    pub channel_count: u32,
    pub quantization_bits: u32,
    pub dial_norm: Option<i8>,
}

impl GenericSoundEssenceDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericSoundEssenceDescriptor {
            file: FileDescriptor::read(r)?,
            audio_sampling_rate: r.read_or_default(&dict::SOUND_AUDIO_SAMPLING_RATE)?,
            locked: r.read_or_default(&dict::SOUND_LOCKED)?,
            audio_ref_level: r.read(&dict::SOUND_AUDIO_REF_LEVEL)?,
            channel_count: r.read_or_default(&dict::SOUND_CHANNEL_COUNT)?,
            quantization_bits: r.read_or_default(&dict::SOUND_QUANTIZATION_BITS)?,
            dial_norm: r.read(&dict::SOUND_DIAL_NORM)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.file.write(w)?;
        w.write(&dict::SOUND_AUDIO_SAMPLING_RATE, &self.audio_sampling_rate)?;
        w.write(&dict::SOUND_LOCKED, &self.locked)?;
        w.write_opt(&dict::SOUND_AUDIO_REF_LEVEL, &self.audio_ref_level)?;
        w.write(&dict::SOUND_CHANNEL_COUNT, &self.channel_count)?;
        w.write(&dict::SOUND_QUANTIZATION_BITS, &self.quantization_bits)?;
        w.write_opt(&dict::SOUND_DIAL_NORM, &self.dial_norm)
    }
}

impl MetadataSet for GenericSoundEssenceDescriptor {
    const SET: &'static DictEntry = &dict::GENERIC_SOUND_ESSENCE_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        GenericSoundEssenceDescriptor::read(r)
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenericDataEssenceDescriptor {
    pub file: FileDescriptor,
    pub data_essence_coding: Ul,
}

impl GenericDataEssenceDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GenericDataEssenceDescriptor {
            file: FileDescriptor::read(r)?,
            data_essence_coding: r.read_or_default(&dict::DATA_ESSENCE_CODING)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.file.write(w)?;
        w.write(&dict::DATA_ESSENCE_CODING, &self.data_essence_coding)
    }
}

impl MetadataSet for GenericDataEssenceDescriptor {
    const SET: &'static DictEntry = &dict::GENERIC_DATA_ESSENCE_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        GenericDataEssenceDescriptor::read(r)
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.write(w)
    }
}

/// Fields shared by the multichannel audio label sub-descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McaLabel {
    pub label_dictionary_id: Ul,
    pub link_id: Uuid,
    pub tag_symbol: String,
    pub tag_name: Option<String>,
    pub channel_id: Option<u32>,
    pub spoken_language: Option<String>,
}

impl McaLabel {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(McaLabel {
            label_dictionary_id: r.read_or_default(&dict::MCA_LABEL_DICTIONARY_ID)?,
            link_id: r.read_or_default(&dict::MCA_LINK_ID)?,
            tag_symbol: r.read_string(&dict::MCA_TAG_SYMBOL).unwrap_or_default(),
            tag_name: r.read_string(&dict::MCA_TAG_NAME),
            channel_id: r.read(&dict::MCA_CHANNEL_ID)?,
            // ISO 8-bit text, unlike the other string items
            spoken_language: r
                .find(&dict::MCA_SPOKEN_LANGUAGE)
                .map(|b| String::from_utf8_lossy(b).trim_end_matches('\0').to_string()),
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::MCA_LABEL_DICTIONARY_ID, &self.label_dictionary_id)?;
        w.write(&dict::MCA_LINK_ID, &self.link_id)?;
        w.write_string(&dict::MCA_TAG_SYMBOL, &self.tag_symbol)?;
        w.write_opt_string(&dict::MCA_TAG_NAME, &self.tag_name)?;
        w.write_opt(&dict::MCA_CHANNEL_ID, &self.channel_id)?;
        if let Some(lang) = &self.spoken_language {
            w.write_raw(&dict::MCA_SPOKEN_LANGUAGE, lang.as_bytes())?;
        }
        Ok(())
    }
}

// Concrete sets

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preface {
    pub last_modified_date: Timestamp,
    pub version: u16,
    pub object_model_version: Option<u32>,
    pub primary_package: Option<Uuid>,
    pub identifications: Vec<Uuid>,
    pub content_storage: Uuid,
    pub operational_pattern: Ul,
    pub essence_containers: Vec<Ul>,
    pub dm_schemes: Vec<Ul>,
}

impl MetadataSet for Preface {
    const SET: &'static DictEntry = &dict::PREFACE;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Preface {
            last_modified_date: r.read_or_default(&dict::PREFACE_LAST_MODIFIED_DATE)?,
            version: r.read_or_default(&dict::PREFACE_VERSION)?,
            object_model_version: r.read(&dict::PREFACE_OBJECT_MODEL_VERSION)?,
            primary_package: r.read(&dict::PREFACE_PRIMARY_PACKAGE)?,
            identifications: r.read_batch(&dict::PREFACE_IDENTIFICATIONS)?,
            content_storage: r.read_or_default(&dict::PREFACE_CONTENT_STORAGE)?,
            operational_pattern: r.read_or_default(&dict::PREFACE_OPERATIONAL_PATTERN)?,
            essence_containers: r.read_batch(&dict::PREFACE_ESSENCE_CONTAINERS)?,
            dm_schemes: r.read_batch(&dict::PREFACE_DM_SCHEMES)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::PREFACE_LAST_MODIFIED_DATE, &self.last_modified_date)?;
        w.write(&dict::PREFACE_VERSION, &self.version)?;
        w.write_opt(&dict::PREFACE_OBJECT_MODEL_VERSION, &self.object_model_version)?;
        w.write_opt(&dict::PREFACE_PRIMARY_PACKAGE, &self.primary_package)?;
        w.write_batch(&dict::PREFACE_IDENTIFICATIONS, &self.identifications, UUID_SIZE)?;
        w.write(&dict::PREFACE_CONTENT_STORAGE, &self.content_storage)?;
        w.write(&dict::PREFACE_OPERATIONAL_PATTERN, &self.operational_pattern)?;
        w.write_batch(&dict::PREFACE_ESSENCE_CONTAINERS, &self.essence_containers, UL_SIZE)?;
        w.write_batch(&dict::PREFACE_DM_SCHEMES, &self.dm_schemes, UL_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identification {
    pub this_generation_uid: Uuid,
    pub company_name: String,
    pub product_name: String,
    pub product_version: Option<VersionType>,
    pub version_string: String,
    pub product_uid: Uuid,
    pub modification_date: Timestamp,
    pub toolkit_version: Option<VersionType>,
    pub platform: Option<String>,
}

impl MetadataSet for Identification {
    const SET: &'static DictEntry = &dict::IDENTIFICATION;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Identification {
            this_generation_uid: r.read_or_default(&dict::IDENTIFICATION_THIS_GENERATION_UID)?,
            company_name: r.read_string(&dict::IDENTIFICATION_COMPANY_NAME).unwrap_or_default(),
            product_name: r.read_string(&dict::IDENTIFICATION_PRODUCT_NAME).unwrap_or_default(),
            product_version: r.read(&dict::IDENTIFICATION_PRODUCT_VERSION)?,
            version_string: r.read_string(&dict::IDENTIFICATION_VERSION_STRING).unwrap_or_default(),
            product_uid: r.read_or_default(&dict::IDENTIFICATION_PRODUCT_UID)?,
            modification_date: r.read_or_default(&dict::IDENTIFICATION_MODIFICATION_DATE)?,
            toolkit_version: r.read(&dict::IDENTIFICATION_TOOLKIT_VERSION)?,
            platform: r.read_string(&dict::IDENTIFICATION_PLATFORM),
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::IDENTIFICATION_THIS_GENERATION_UID, &self.this_generation_uid)?;
        w.write_string(&dict::IDENTIFICATION_COMPANY_NAME, &self.company_name)?;
        w.write_string(&dict::IDENTIFICATION_PRODUCT_NAME, &self.product_name)?;
        w.write_opt(&dict::IDENTIFICATION_PRODUCT_VERSION, &self.product_version)?;
        w.write_string(&dict::IDENTIFICATION_VERSION_STRING, &self.version_string)?;
        w.write(&dict::IDENTIFICATION_PRODUCT_UID, &self.product_uid)?;
        w.write(&dict::IDENTIFICATION_MODIFICATION_DATE, &self.modification_date)?;
        w.write_opt(&dict::IDENTIFICATION_TOOLKIT_VERSION, &self.toolkit_version)?;
        w.write_opt_string(&dict::IDENTIFICATION_PLATFORM, &self.platform)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentStorage {
    pub packages: Vec<Uuid>,
    pub essence_container_data: Vec<Uuid>,
}

impl MetadataSet for ContentStorage {
    const SET: &'static DictEntry = &dict::CONTENT_STORAGE;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(ContentStorage {
            packages: r.read_batch(&dict::CONTENT_STORAGE_PACKAGES)?,
            essence_container_data: r.read_batch(&dict::CONTENT_STORAGE_ESSENCE_CONTAINER_DATA)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write_batch(&dict::CONTENT_STORAGE_PACKAGES, &self.packages, UUID_SIZE)?;
        w.write_batch(
            &dict::CONTENT_STORAGE_ESSENCE_CONTAINER_DATA,
            &self.essence_container_data,
            UUID_SIZE,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EssenceContainerData {
    pub linked_package_uid: Umid,
    pub index_sid: u32,
    pub body_sid: u32,
}

impl MetadataSet for EssenceContainerData {
    const SET: &'static DictEntry = &dict::ESSENCE_CONTAINER_DATA;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(EssenceContainerData {
            linked_package_uid: r.read_or_default(&dict::ESSENCE_CONTAINER_DATA_LINKED_PACKAGE_UID)?,
            index_sid: r.read_or_default(&dict::INDEX_SID)?,
            body_sid: r.read_or_default(&dict::BODY_SID)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::ESSENCE_CONTAINER_DATA_LINKED_PACKAGE_UID, &self.linked_package_uid)?;
        w.write(&dict::INDEX_SID, &self.index_sid)?;
        w.write(&dict::BODY_SID, &self.body_sid)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialPackage {
    pub package: GenericPackage,
}

impl MetadataSet for MaterialPackage {
    const SET: &'static DictEntry = &dict::MATERIAL_PACKAGE;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(MaterialPackage {
            package: GenericPackage::read(r)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.package.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePackage {
    pub package: GenericPackage,
    pub descriptor: Option<Uuid>,
}

impl MetadataSet for SourcePackage {
    const SET: &'static DictEntry = &dict::SOURCE_PACKAGE;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(SourcePackage {
            package: GenericPackage::read(r)?,
            descriptor: r.read(&dict::SOURCE_PACKAGE_DESCRIPTOR)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.package.write(w)?;
        w.write_opt(&dict::SOURCE_PACKAGE_DESCRIPTOR, &self.descriptor)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub track: GenericTrack,
    pub edit_rate: Rational,
    pub origin: i64,
}

impl MetadataSet for Track {
    const SET: &'static DictEntry = &dict::TRACK;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Track {
            track: GenericTrack::read(r)?,
            edit_rate: r.read_or_default(&dict::TRACK_EDIT_RATE)?,
            origin: r.read_or_default(&dict::TRACK_ORIGIN)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.track.write(w)?;
        w.write(&dict::TRACK_EDIT_RATE, &self.edit_rate)?;
        w.write(&dict::TRACK_ORIGIN, &self.origin)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticTrack {
    pub track: GenericTrack,
}

impl MetadataSet for StaticTrack {
    const SET: &'static DictEntry = &dict::STATIC_TRACK;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(StaticTrack {
            track: GenericTrack::read(r)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.track.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sequence {
    pub component: StructuralComponent,
    pub structural_components: Vec<Uuid>,
}

impl MetadataSet for Sequence {
    const SET: &'static DictEntry = &dict::SEQUENCE;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Sequence {
            component: StructuralComponent::read(r)?,
            structural_components: r.read_batch(&dict::SEQUENCE_STRUCTURAL_COMPONENTS)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.component.write(w)?;
        w.write_batch(&dict::SEQUENCE_STRUCTURAL_COMPONENTS, &self.structural_components, UUID_SIZE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceClip {
    pub component: StructuralComponent,
    pub start_position: i64,
    pub source_package_id: Umid,
    pub source_track_id: u32,
}

impl MetadataSet for SourceClip {
    const SET: &'static DictEntry = &dict::SOURCE_CLIP;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(SourceClip {
            component: StructuralComponent::read(r)?,
            start_position: r.read_or_default(&dict::SOURCE_CLIP_START_POSITION)?,
            source_package_id: r.read_or_default(&dict::SOURCE_CLIP_SOURCE_PACKAGE_ID)?,
            source_track_id: r.read_or_default(&dict::SOURCE_CLIP_SOURCE_TRACK_ID)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.component.write(w)?;
        w.write(&dict::SOURCE_CLIP_START_POSITION, &self.start_position)?;
        w.write(&dict::SOURCE_CLIP_SOURCE_PACKAGE_ID, &self.source_package_id)?;
        w.write(&dict::SOURCE_CLIP_SOURCE_TRACK_ID, &self.source_track_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimecodeComponent {
    pub component: StructuralComponent,
    pub rounded_timecode_base: u16,
    pub start_timecode: i64,
    pub drop_frame: u8,
}

impl MetadataSet for TimecodeComponent {
    const SET: &'static DictEntry = &dict::TIMECODE_COMPONENT;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(TimecodeComponent {
            component: StructuralComponent::read(r)?,
            rounded_timecode_base: r.read_or_default(&dict::TIMECODE_ROUNDED_BASE)?,
            start_timecode: r.read_or_default(&dict::TIMECODE_START)?,
            drop_frame: r.read_or_default(&dict::TIMECODE_DROP_FRAME)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.component.write(w)?;
        w.write(&dict::TIMECODE_ROUNDED_BASE, &self.rounded_timecode_base)?;
        w.write(&dict::TIMECODE_START, &self.start_timecode)?;
        w.write(&dict::TIMECODE_DROP_FRAME, &self.drop_frame)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DmSegment {
    pub component: StructuralComponent,
    pub event_start_position: Option<i64>,
    pub event_comment: Option<String>,
    pub dm_framework: Option<Uuid>,
}

impl MetadataSet for DmSegment {
    const SET: &'static DictEntry = &dict::DM_SEGMENT;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(DmSegment {
            component: StructuralComponent::read(r)?,
            event_start_position: r.read(&dict::DM_SEGMENT_EVENT_START_POSITION)?,
            event_comment: r.read_string(&dict::DM_SEGMENT_EVENT_COMMENT),
            dm_framework: r.read(&dict::DM_SEGMENT_DM_FRAMEWORK)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.component.write(w)?;
        w.write_opt(&dict::DM_SEGMENT_EVENT_START_POSITION, &self.event_start_position)?;
        w.write_opt_string(&dict::DM_SEGMENT_EVENT_COMMENT, &self.event_comment)?;
        w.write_opt(&dict::DM_SEGMENT_DM_FRAMEWORK, &self.dm_framework)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptographicFramework {
    pub context_sr: Uuid,
}

impl MetadataSet for CryptographicFramework {
    const SET: &'static DictEntry = &dict::CRYPTOGRAPHIC_FRAMEWORK;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(CryptographicFramework {
            context_sr: r.read_or_default(&dict::CRYPTOGRAPHIC_FRAMEWORK_CONTEXT_SR)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::CRYPTOGRAPHIC_FRAMEWORK_CONTEXT_SR, &self.context_sr)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptographicContext {
    pub context_id: Uuid,
    pub source_essence_container: Ul,
    pub cipher_algorithm: Ul,
    pub mic_algorithm: Ul,
    pub cryptographic_key_id: Uuid,
}

impl MetadataSet for CryptographicContext {
    const SET: &'static DictEntry = &dict::CRYPTOGRAPHIC_CONTEXT;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(CryptographicContext {
            context_id: r.read_or_default(&dict::CRYPTOGRAPHIC_CONTEXT_CONTEXT_ID)?,
            source_essence_container: r.read_or_default(&dict::CRYPTOGRAPHIC_CONTEXT_SOURCE_ESSENCE_CONTAINER)?,
            cipher_algorithm: r.read_or_default(&dict::CRYPTOGRAPHIC_CONTEXT_CIPHER_ALGORITHM)?,
            mic_algorithm: r.read_or_default(&dict::CRYPTOGRAPHIC_CONTEXT_MIC_ALGORITHM)?,
            cryptographic_key_id: r.read_or_default(&dict::CRYPTOGRAPHIC_CONTEXT_KEY_ID)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::CRYPTOGRAPHIC_CONTEXT_CONTEXT_ID, &self.context_id)?;
        w.write(&dict::CRYPTOGRAPHIC_CONTEXT_SOURCE_ESSENCE_CONTAINER, &self.source_essence_container)?;
        w.write(&dict::CRYPTOGRAPHIC_CONTEXT_CIPHER_ALGORITHM, &self.cipher_algorithm)?;
        w.write(&dict::CRYPTOGRAPHIC_CONTEXT_MIC_ALGORITHM, &self.mic_algorithm)?;
        w.write(&dict::CRYPTOGRAPHIC_CONTEXT_KEY_ID, &self.cryptographic_key_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkLocator {
    pub url_string: String,
}

impl MetadataSet for NetworkLocator {
    const SET: &'static DictEntry = &dict::NETWORK_LOCATOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(NetworkLocator {
            url_string: r.read_string(&dict::NETWORK_LOCATOR_URL_STRING).unwrap_or_default(),
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write_string(&dict::NETWORK_LOCATOR_URL_STRING, &self.url_string)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RgbaEssenceDescriptor {
    pub picture: GenericPictureEssenceDescriptor,
    pub component_max_ref: Option<u32>,
    pub component_min_ref: Option<u32>,
}

impl MetadataSet for RgbaEssenceDescriptor {
    const SET: &'static DictEntry = &dict::RGBA_ESSENCE_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(RgbaEssenceDescriptor {
            picture: GenericPictureEssenceDescriptor::read(r)?,
            component_max_ref: r.read(&dict::RGBA_COMPONENT_MAX_REF)?,
            component_min_ref: r.read(&dict::RGBA_COMPONENT_MIN_REF)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.picture.write(w)?;
        w.write_opt(&dict::RGBA_COMPONENT_MAX_REF, &self.component_max_ref)?;
        w.write_opt(&dict::RGBA_COMPONENT_MIN_REF, &self.component_min_ref)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CdciEssenceDescriptor {
    pub picture: GenericPictureEssenceDescriptor,
    pub component_depth: u32,
    pub horizontal_subsampling: u32,
    pub vertical_subsampling: Option<u32>,
    pub color_siting: Option<u8>,
}

impl CdciEssenceDescriptor {
    fn read(r: &TlvReader<'_>) -> Result<Self> {
        Ok(CdciEssenceDescriptor {
            picture: GenericPictureEssenceDescriptor::read(r)?,
            component_depth: r.read_or_default(&dict::CDCI_COMPONENT_DEPTH)?,
            horizontal_subsampling: r.read_or_default(&dict::CDCI_HORIZONTAL_SUBSAMPLING)?,
            vertical_subsampling: r.read(&dict::CDCI_VERTICAL_SUBSAMPLING)?,
            color_siting: r.read(&dict::CDCI_COLOR_SITING)?,
        })
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.picture.write(w)?;
        w.write(&dict::CDCI_COMPONENT_DEPTH, &self.component_depth)?;
        w.write(&dict::CDCI_HORIZONTAL_SUBSAMPLING, &self.horizontal_subsampling)?;
        w.write_opt(&dict::CDCI_VERTICAL_SUBSAMPLING, &self.vertical_subsampling)?;
        w.write_opt(&dict::CDCI_COLOR_SITING, &self.color_siting)
    }
}

impl MetadataSet for CdciEssenceDescriptor {
    const SET: &'static DictEntry = &dict::CDCI_ESSENCE_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        CdciEssenceDescriptor::read(r)
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mpeg2VideoDescriptor {
    pub cdci: CdciEssenceDescriptor,
    pub coded_content_type: Option<u8>,
    pub low_delay: Option<u8>,
    pub bit_rate: Option<u32>,
    pub profile_and_level: Option<u8>,
}

impl MetadataSet for Mpeg2VideoDescriptor {
    const SET: &'static DictEntry = &dict::MPEG2_VIDEO_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Mpeg2VideoDescriptor {
            cdci: CdciEssenceDescriptor::read(r)?,
            coded_content_type: r.read(&dict::MPEG2_CODED_CONTENT_TYPE)?,
            low_delay: r.read(&dict::MPEG2_LOW_DELAY)?,
            bit_rate: r.read(&dict::MPEG2_BIT_RATE)?,
            profile_and_level: r.read(&dict::MPEG2_PROFILE_AND_LEVEL)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.cdci.write(w)?;
        w.write_opt(&dict::MPEG2_CODED_CONTENT_TYPE, &self.coded_content_type)?;
        w.write_opt(&dict::MPEG2_LOW_DELAY, &self.low_delay)?;
        w.write_opt(&dict::MPEG2_BIT_RATE, &self.bit_rate)?;
        w.write_opt(&dict::MPEG2_PROFILE_AND_LEVEL, &self.profile_and_level)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveAudioDescriptor {
    pub sound: GenericSoundEssenceDescriptor,
    pub block_align: u16,
    pub sequence_offset: Option<u8>,
    pub avg_bps: u32,
    pub channel_assignment: Option<Ul>,
}

impl MetadataSet for WaveAudioDescriptor {
    const SET: &'static DictEntry = &dict::WAVE_AUDIO_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(WaveAudioDescriptor {
            sound: GenericSoundEssenceDescriptor::read(r)?,
            block_align: r.read_or_default(&dict::WAVE_BLOCK_ALIGN)?,
            sequence_offset: r.read(&dict::WAVE_SEQUENCE_OFFSET)?,
            avg_bps: r.read_or_default(&dict::WAVE_AVG_BPS)?,
            channel_assignment: r.read(&dict::WAVE_CHANNEL_ASSIGNMENT)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.sound.write(w)?;
        w.write(&dict::WAVE_BLOCK_ALIGN, &self.block_align)?;
        w.write_opt(&dict::WAVE_SEQUENCE_OFFSET, &self.sequence_offset)?;
        w.write(&dict::WAVE_AVG_BPS, &self.avg_bps)?;
        w.write_opt(&dict::WAVE_CHANNEL_ASSIGNMENT, &self.channel_assignment)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jpeg2000PictureSubDescriptor {
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
    pub picture_component_sizing: Option<Vec<u8>>,
    pub coding_style_default: Option<Vec<u8>>,
    pub quantization_default: Option<Vec<u8>>,
}

impl MetadataSet for Jpeg2000PictureSubDescriptor {
    const SET: &'static DictEntry = &dict::JPEG_2000_PICTURE_SUB_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(Jpeg2000PictureSubDescriptor {
            rsize: r.read_or_default(&dict::J2K_RSIZE)?,
            xsize: r.read_or_default(&dict::J2K_XSIZE)?,
            ysize: r.read_or_default(&dict::J2K_YSIZE)?,
            xosize: r.read_or_default(&dict::J2K_XOSIZE)?,
            yosize: r.read_or_default(&dict::J2K_YOSIZE)?,
            xtsize: r.read_or_default(&dict::J2K_XTSIZE)?,
            ytsize: r.read_or_default(&dict::J2K_YTSIZE)?,
            xtosize: r.read_or_default(&dict::J2K_XTOSIZE)?,
            ytosize: r.read_or_default(&dict::J2K_YTOSIZE)?,
            csize: r.read_or_default(&dict::J2K_CSIZE)?,
            picture_component_sizing: r.read_raw(&dict::J2K_PICTURE_COMPONENT_SIZING),
            coding_style_default: r.read_raw(&dict::J2K_CODING_STYLE_DEFAULT),
            quantization_default: r.read_raw(&dict::J2K_QUANTIZATION_DEFAULT),
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::J2K_RSIZE, &self.rsize)?;
        w.write(&dict::J2K_XSIZE, &self.xsize)?;
        w.write(&dict::J2K_YSIZE, &self.ysize)?;
        w.write(&dict::J2K_XOSIZE, &self.xosize)?;
        w.write(&dict::J2K_YOSIZE, &self.yosize)?;
        w.write(&dict::J2K_XTSIZE, &self.xtsize)?;
        w.write(&dict::J2K_YTSIZE, &self.ytsize)?;
        w.write(&dict::J2K_XTOSIZE, &self.xtosize)?;
        w.write(&dict::J2K_YTOSIZE, &self.ytosize)?;
        w.write(&dict::J2K_CSIZE, &self.csize)?;
        w.write_opt_raw(&dict::J2K_PICTURE_COMPONENT_SIZING, &self.picture_component_sizing)?;
        w.write_opt_raw(&dict::J2K_CODING_STYLE_DEFAULT, &self.coding_style_default)?;
        w.write_opt_raw(&dict::J2K_QUANTIZATION_DEFAULT, &self.quantization_default)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoscopicPictureSubDescriptor;

impl MetadataSet for StereoscopicPictureSubDescriptor {
    const SET: &'static DictEntry = &dict::STEREOSCOPIC_PICTURE_SUB_DESCRIPTOR;

    fn read_fields(_r: &TlvReader<'_>) -> Result<Self> {
        Ok(StereoscopicPictureSubDescriptor)
    }

    fn write_fields(&self, _w: &mut TlvWriter<'_>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DcDataDescriptor {
    pub data: GenericDataEssenceDescriptor,
}

impl MetadataSet for DcDataDescriptor {
    const SET: &'static DictEntry = &dict::DC_DATA_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(DcDataDescriptor {
            data: GenericDataEssenceDescriptor::read(r)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.data.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DolbyAtmosSubDescriptor {
    pub atmos_id: Uuid,
    pub first_frame: u32,
    pub max_channel_count: u16,
    pub max_object_count: u16,
    pub atmos_version: u8,
}

impl MetadataSet for DolbyAtmosSubDescriptor {
    const SET: &'static DictEntry = &dict::DOLBY_ATMOS_SUB_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(DolbyAtmosSubDescriptor {
            atmos_id: r.read_or_default(&dict::ATMOS_ID)?,
            first_frame: r.read_or_default(&dict::ATMOS_FIRST_FRAME)?,
            max_channel_count: r.read_or_default(&dict::ATMOS_MAX_CHANNEL_COUNT)?,
            max_object_count: r.read_or_default(&dict::ATMOS_MAX_OBJECT_COUNT)?,
            atmos_version: r.read_or_default(&dict::ATMOS_VERSION)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::ATMOS_ID, &self.atmos_id)?;
        w.write(&dict::ATMOS_FIRST_FRAME, &self.first_frame)?;
        w.write(&dict::ATMOS_MAX_CHANNEL_COUNT, &self.max_channel_count)?;
        w.write(&dict::ATMOS_MAX_OBJECT_COUNT, &self.max_object_count)?;
        w.write(&dict::ATMOS_VERSION, &self.atmos_version)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedTextDescriptor {
    pub data: GenericDataEssenceDescriptor,
    pub resource_id: Uuid,
    pub ucs_encoding: String,
    pub namespace_uri: String,
}

impl MetadataSet for TimedTextDescriptor {
    const SET: &'static DictEntry = &dict::TIMED_TEXT_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(TimedTextDescriptor {
            data: GenericDataEssenceDescriptor::read(r)?,
            resource_id: r.read_or_default(&dict::TIMED_TEXT_RESOURCE_ID)?,
            ucs_encoding: r.read_string(&dict::TIMED_TEXT_UCS_ENCODING).unwrap_or_default(),
            namespace_uri: r.read_string(&dict::TIMED_TEXT_NAMESPACE_URI).unwrap_or_default(),
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.data.write(w)?;
        w.write(&dict::TIMED_TEXT_RESOURCE_ID, &self.resource_id)?;
        w.write_string(&dict::TIMED_TEXT_UCS_ENCODING, &self.ucs_encoding)?;
        w.write_string(&dict::TIMED_TEXT_NAMESPACE_URI, &self.namespace_uri)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedTextResourceSubDescriptor {
    pub ancillary_resource_id: Uuid,
    pub mime_media_type: String,
    pub essence_stream_id: u32,
}

impl MetadataSet for TimedTextResourceSubDescriptor {
    const SET: &'static DictEntry = &dict::TIMED_TEXT_RESOURCE_SUB_DESCRIPTOR;

    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(TimedTextResourceSubDescriptor {
            ancillary_resource_id: r.read_or_default(&dict::TIMED_TEXT_ANCILLARY_RESOURCE_ID)?,
            mime_media_type: r.read_string(&dict::TIMED_TEXT_MIME_MEDIA_TYPE).unwrap_or_default(),
            essence_stream_id: r.read_or_default(&dict::TIMED_TEXT_ESSENCE_STREAM_ID)?,
        })
    }

    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        w.write(&dict::TIMED_TEXT_ANCILLARY_RESOURCE_ID, &self.ancillary_resource_id)?;
        w.write_string(&dict::TIMED_TEXT_MIME_MEDIA_TYPE, &self.mime_media_type)?;
        w.write(&dict::TIMED_TEXT_ESSENCE_STREAM_ID, &self.essence_stream_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct McaLabelSubDescriptor {
    pub label: McaLabel,
}

impl MetadataSet for McaLabelSubDescriptor {
    const SET: &'static DictEntry = &dict::MCA_LABEL_SUB_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(McaLabelSubDescriptor {
            label: McaLabel::read(r)?,
        })
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.label.write(w)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioChannelLabelSubDescriptor {
    pub label: McaLabel,
    pub soundfield_group_link_id: Option<Uuid>,
}

impl MetadataSet for AudioChannelLabelSubDescriptor {
    const SET: &'static DictEntry = &dict::AUDIO_CHANNEL_LABEL_SUB_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(AudioChannelLabelSubDescriptor {
            label: McaLabel::read(r)?,
            soundfield_group_link_id: r.read(&dict::MCA_SOUNDFIELD_GROUP_LINK_ID)?,
        })
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.label.write(w)?;
        w.write_opt(&dict::MCA_SOUNDFIELD_GROUP_LINK_ID, &self.soundfield_group_link_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundfieldGroupLabelSubDescriptor {
    pub label: McaLabel,
    pub group_of_soundfield_groups_link_id: Vec<Uuid>,
}

impl MetadataSet for SoundfieldGroupLabelSubDescriptor {
    const SET: &'static DictEntry = &dict::SOUNDFIELD_GROUP_LABEL_SUB_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(SoundfieldGroupLabelSubDescriptor {
            label: McaLabel::read(r)?,
            group_of_soundfield_groups_link_id: r.read_batch(&dict::MCA_GROUP_OF_SOUNDFIELD_GROUPS_LINK_ID)?,
        })
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.label.write(w)?;
        if !self.group_of_soundfield_groups_link_id.is_empty() {
            w.write_batch(
                &dict::MCA_GROUP_OF_SOUNDFIELD_GROUPS_LINK_ID,
                &self.group_of_soundfield_groups_link_id,
                UUID_SIZE,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOfSoundfieldGroupsLabelSubDescriptor {
    pub label: McaLabel,
}

impl MetadataSet for GroupOfSoundfieldGroupsLabelSubDescriptor {
    const SET: &'static DictEntry = &dict::GROUP_OF_SOUNDFIELD_GROUPS_LABEL_SUB_DESCRIPTOR;
    fn read_fields(r: &TlvReader<'_>) -> Result<Self> {
        Ok(GroupOfSoundfieldGroupsLabelSubDescriptor {
            label: McaLabel::read(r)?,
        })
    }
    fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        self.label.write(w)
    }
}

/// A set whose key is not registered. Items are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownSet {
    pub key: Ul,
    pub items: Vec<RawItem>,
}

impl UnknownSet {
    fn read(key: &Ul, r: &TlvReader<'_>) -> Self {
        let items = r
            .raw_items()
            .into_iter()
            .filter(|item| {
                !matches!(item.ul, Some(ul) if ul == dict::INSTANCE_UID.ul || ul == dict::GENERATION_UID.ul)
                    && item.tag != dict::INSTANCE_UID.tag
                    && item.tag != dict::GENERATION_UID.tag
            })
            .collect();
        UnknownSet { key: *key, items }
    }

    fn write(&self, w: &mut TlvWriter<'_>) -> Result<()> {
        for item in &self.items {
            match item.ul {
                Some(ul) => {
                    let static_tag = dict::find_by_ul(&ul).map(|e| e.tag).unwrap_or(0);
                    w.write_raw_ul(&ul, static_tag, &item.value)?;
                }
                None => w.write_tagged(item.tag, &item.value)?,
            }
        }
        Ok(())
    }
}

type SetParser = fn(&TlvReader<'_>) -> Result<ObjectBody>;

macro_rules! metadata_sets {
    ($($name:ident),* $(,)?) => {
        /// The typed contents of one metadata set.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ObjectBody {
            $($name($name),)*
            Unknown(UnknownSet),
        }

        impl ObjectBody {
            pub fn set_key(&self) -> Ul {
                match self {
                    $(ObjectBody::$name(_) => $name::SET.ul,)*
                    ObjectBody::Unknown(u) => u.key,
                }
            }

            pub fn type_name(&self) -> &'static str {
                match self {
                    $(ObjectBody::$name(_) => $name::SET.name,)*
                    ObjectBody::Unknown(_) => "Unknown",
                }
            }

            fn write_fields(&self, w: &mut TlvWriter<'_>) -> Result<()> {
                match self {
                    $(ObjectBody::$name(v) => v.write_fields(w),)*
                    ObjectBody::Unknown(u) => u.write(w),
                }
            }
        }

        $(
            impl SetVariant for $name {
                fn from_body(body: &ObjectBody) -> Option<&Self> {
                    match body {
                        ObjectBody::$name(v) => Some(v),
                        _ => None,
                    }
                }

                fn from_body_mut(body: &mut ObjectBody) -> Option<&mut Self> {
                    match body {
                        ObjectBody::$name(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_body(self) -> ObjectBody {
                    ObjectBody::$name(self)
                }
            }
        )*

        fn build_registry() -> HashMap<Ul, SetParser> {
            let mut map: HashMap<Ul, SetParser> = HashMap::new();
            $(
                map.insert($name::SET.ul, |r| Ok(ObjectBody::$name($name::read_fields(r)?)));
            )*
            map
        }
    };
}

metadata_sets!(
    Preface,
    Identification,
    ContentStorage,
    EssenceContainerData,
    MaterialPackage,
    SourcePackage,
    Track,
    StaticTrack,
    Sequence,
    SourceClip,
    TimecodeComponent,
    DmSegment,
    CryptographicFramework,
    CryptographicContext,
    NetworkLocator,
    FileDescriptor,
    GenericPictureEssenceDescriptor,
    RgbaEssenceDescriptor,
    CdciEssenceDescriptor,
    Mpeg2VideoDescriptor,
    GenericSoundEssenceDescriptor,
    WaveAudioDescriptor,
    GenericDataEssenceDescriptor,
    DcDataDescriptor,
    TimedTextDescriptor,
    TimedTextResourceSubDescriptor,
    Jpeg2000PictureSubDescriptor,
    StereoscopicPictureSubDescriptor,
    DolbyAtmosSubDescriptor,
    McaLabelSubDescriptor,
    AudioChannelLabelSubDescriptor,
    SoundfieldGroupLabelSubDescriptor,
    GroupOfSoundfieldGroupsLabelSubDescriptor,
);

/// Set key to parser table, built once on first use.
fn registry() -> &'static HashMap<Ul, SetParser> {
    static REGISTRY: OnceLock<HashMap<Ul, SetParser>> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// True when `key` names a set this crate parses into typed fields.
pub fn is_registered_set(key: &Ul) -> bool {
    registry().contains_key(key)
}

impl ObjectBody {
    /// The file descriptor fields of any essence descriptor.
    pub fn file_descriptor(&self) -> Option<&FileDescriptor> {
        match self {
            ObjectBody::FileDescriptor(d) => Some(d),
            ObjectBody::GenericPictureEssenceDescriptor(d) => Some(&d.file),
            ObjectBody::RgbaEssenceDescriptor(d) => Some(&d.picture.file),
            ObjectBody::CdciEssenceDescriptor(d) => Some(&d.picture.file),
            ObjectBody::Mpeg2VideoDescriptor(d) => Some(&d.cdci.picture.file),
            ObjectBody::GenericSoundEssenceDescriptor(d) => Some(&d.file),
            ObjectBody::WaveAudioDescriptor(d) => Some(&d.sound.file),
            ObjectBody::GenericDataEssenceDescriptor(d) => Some(&d.file),
            ObjectBody::DcDataDescriptor(d) => Some(&d.data.file),
            ObjectBody::TimedTextDescriptor(d) => Some(&d.data.file),
            _ => None,
        }
    }

    pub fn file_descriptor_mut(&mut self) -> Option<&mut FileDescriptor> {
        match self {
            ObjectBody::FileDescriptor(d) => Some(d),
            ObjectBody::GenericPictureEssenceDescriptor(d) => Some(&mut d.file),
            ObjectBody::RgbaEssenceDescriptor(d) => Some(&mut d.picture.file),
            ObjectBody::CdciEssenceDescriptor(d) => Some(&mut d.picture.file),
            ObjectBody::Mpeg2VideoDescriptor(d) => Some(&mut d.cdci.picture.file),
            ObjectBody::GenericSoundEssenceDescriptor(d) => Some(&mut d.file),
            ObjectBody::WaveAudioDescriptor(d) => Some(&mut d.sound.file),
            ObjectBody::GenericDataEssenceDescriptor(d) => Some(&mut d.file),
            ObjectBody::DcDataDescriptor(d) => Some(&mut d.data.file),
            ObjectBody::TimedTextDescriptor(d) => Some(&mut d.data.file),
            _ => None,
        }
    }

    pub fn structural_component_mut(&mut self) -> Option<&mut StructuralComponent> {
        match self {
            ObjectBody::Sequence(s) => Some(&mut s.component),
            ObjectBody::SourceClip(s) => Some(&mut s.component),
            ObjectBody::TimecodeComponent(s) => Some(&mut s.component),
            ObjectBody::DmSegment(s) => Some(&mut s.component),
            _ => None,
        }
    }

    pub fn generic_track(&self) -> Option<&GenericTrack> {
        match self {
            ObjectBody::Track(t) => Some(&t.track),
            ObjectBody::StaticTrack(t) => Some(&t.track),
            _ => None,
        }
    }
}

/// One node of the metadata graph: identity plus typed body.
#[derive(Debug, Clone, PartialEq)]
pub struct MdObject {
    pub instance_uid: Uuid,
    pub generation_uid: Option<Uuid>,
    pub body: ObjectBody,
}

impl MdObject {
    /// A new object with a fresh random InstanceUID.
    pub fn new<T: SetVariant>(body: T) -> Self {
        MdObject {
            instance_uid: Uuid::new_v4(),
            generation_uid: None,
            body: body.into_body(),
        }
    }

    /// A new object with a caller-chosen InstanceUID, for graphs linked before insertion.
    pub fn with_id<T: SetVariant>(instance_uid: Uuid, body: T) -> Self {
        MdObject {
            instance_uid,
            generation_uid: None,
            body: body.into_body(),
        }
    }

    pub fn set_key(&self) -> Ul {
        self.body.set_key()
    }

    /// Parse a set value. Unregistered keys become [`ObjectBody::Unknown`].
    pub fn parse(key: &Ul, value: &[u8], primer: &Primer) -> Result<Self> {
        let r = TlvReader::new(primer, value)?;
        let body = match registry().get(key) {
            Some(parse) => parse(&r)?,
            None => ObjectBody::Unknown(UnknownSet::read(key, &r)),
        };
        Ok(MdObject {
            instance_uid: r.read_or_default(&dict::INSTANCE_UID)?,
            generation_uid: r.read(&dict::GENERATION_UID)?,
            body,
        })
    }

    /// Append this object as a KLV packet, registering its tags in `primer`.
    pub fn encode(&self, primer: &mut Primer, out: &mut Vec<u8>) -> Result<()> {
        let mut w = TlvWriter::new(primer);
        w.write(&dict::INSTANCE_UID, &self.instance_uid)?;
        w.write_opt(&dict::GENERATION_UID, &self.generation_uid)?;
        self.body.write_fields(&mut w)?;
        let value = w.finish();
        klv::encode_kl(out, &self.set_key(), value.len() as u64)?;
        out.extend_from_slice(&value);
        Ok(())
    }

    pub fn get<T: SetVariant>(&self) -> Option<&T> {
        T::from_body(&self.body)
    }

    pub fn get_mut<T: SetVariant>(&mut self) -> Option<&mut T> {
        T::from_body_mut(&mut self.body)
    }
}
