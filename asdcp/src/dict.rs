//! Registered labels, set keys and metadata item keys used by AS-DCP track files.
//!
//! Item entries carry the static local tag from the MXF registry. A tag of zero
//! means the item has no static tag and is assigned a dynamic one by the
//! [`Primer`](crate::primer::Primer) when serialized.

use crate::ul::Ul;

/// One registered label with its static local tag (0 when dynamic).
#[derive(Debug, Clone, Copy)]
pub struct DictEntry {
    pub ul: Ul,
    pub tag: u16,
    pub name: &'static str,
}

/// Which flavour of labels a file was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum LabelSetType {
    /// SMPTE 429 labels; three-partition files.
    #[default]
    Smpte,
    /// MXF Interop labels; two-partition files.
    Interop,
    Unknown,
}

const fn raw(name: &'static str, tag: u16, bytes: [u8; 16]) -> DictEntry {
    DictEntry {
        ul: Ul::new(bytes),
        tag,
        name,
    }
}

/// Metadata item key: `06 0e 2b 34 01 01 01 <ver> ...`.
const fn item(name: &'static str, tag: u16, ver: u8, t: [u8; 8]) -> DictEntry {
    raw(
        name,
        tag,
        [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, ver, t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]],
    )
}

/// Local set key: `06 0e 2b 34 02 53 01 01 ...`.
const fn set(name: &'static str, t: [u8; 8]) -> DictEntry {
    raw(
        name,
        0,
        [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x53, 0x01, 0x01, t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]],
    )
}

/// Structural metadata set: `06 0e 2b 34 02 53 01 01 0d 01 01 01 01 01 <id> 00`.
const fn md_set(name: &'static str, id: u8) -> DictEntry {
    set(name, [0x0d, 0x01, 0x01, 0x01, 0x01, 0x01, id, 0x00])
}

/// Label (not a key): `06 0e 2b 34 04 01 01 <ver> ...`.
const fn label(name: &'static str, ver: u8, t: [u8; 8]) -> DictEntry {
    raw(
        name,
        0,
        [0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, ver, t[0], t[1], t[2], t[3], t[4], t[5], t[6], t[7]],
    )
}

/// Pack key: `06 0e 2b 34 02 05 01 01 0d 01 02 01 01 <kind> <status> 00`.
const fn pack(name: &'static str, kind: u8, status: u8) -> DictEntry {
    raw(
        name,
        0,
        [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x05, 0x01, 0x01, 0x0d, 0x01, 0x02, 0x01, 0x01, kind, status, 0x00],
    )
}

// Partition packs, primer, RIP and fill

pub const OPEN_HEADER: DictEntry = pack("OpenHeader", 0x02, 0x01);
pub const CLOSED_COMPLETE_HEADER: DictEntry = pack("ClosedCompleteHeader", 0x02, 0x04);
pub const CLOSED_COMPLETE_BODY_PARTITION: DictEntry = pack("ClosedCompleteBodyPartition", 0x03, 0x04);
pub const COMPLETE_FOOTER: DictEntry = pack("CompleteFooter", 0x04, 0x04);
pub const PRIMER: DictEntry = pack("Primer", 0x05, 0x01);
pub const RANDOM_INDEX_METADATA: DictEntry = pack("RandomIndexMetadata", 0x11, 0x01);
pub const KLV_FILL: DictEntry = raw(
    "KLVFill",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x02, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00],
);

/// True for any header, body or footer partition pack key.
pub fn is_partition_pack(key: &Ul) -> bool {
    let b = key.as_bytes();
    key.as_bytes()[..13] == OPEN_HEADER.ul.as_bytes()[..13] && (0x02..=0x04).contains(&b[13])
}

// Operational patterns and container labels

pub const OP_ATOM: DictEntry = label("OPAtom", 0x02, [0x0d, 0x01, 0x02, 0x01, 0x10, 0x00, 0x00, 0x00]);
pub const OP_1A: DictEntry = label("OP1a", 0x01, [0x0d, 0x01, 0x02, 0x01, 0x01, 0x01, 0x09, 0x00]);
pub const GC_MULTI: DictEntry = label("GCMulti", 0x03, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x7f, 0x01, 0x00]);
pub const JPEG_2000_WRAPPING_FRAME: DictEntry =
    label("JPEG_2000WrappingFrame", 0x07, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x0c, 0x01, 0x00]);
pub const MPEG2_VES_WRAPPING_FRAME: DictEntry =
    label("MPEG2_VESWrappingFrame", 0x02, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x04, 0x60, 0x01]);
pub const WAV_WRAPPING_FRAME: DictEntry =
    label("WAVWrappingFrame", 0x01, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x06, 0x01, 0x00]);
pub const TIMED_TEXT_WRAPPING: DictEntry =
    label("TimedTextWrapping", 0x0a, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x13, 0x01, 0x01]);
pub const DC_DATA_WRAPPING_FRAME: DictEntry =
    label("DCDataWrappingFrame", 0x0d, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x1b, 0x01, 0x00]);
pub const ENCRYPTED_CONTAINER_LABEL: DictEntry =
    label("EncryptedContainerLabel", 0x07, [0x0d, 0x01, 0x03, 0x01, 0x02, 0x0b, 0x01, 0x00]);
pub const CRYPTOGRAPHIC_FRAMEWORK_LABEL: DictEntry =
    label("CryptographicFrameworkLabel", 0x07, [0x0d, 0x01, 0x04, 0x01, 0x02, 0x01, 0x01, 0x00]);

// Essence element keys (the stream byte is set by the writer)

pub const JPEG_2000_ESSENCE: DictEntry = raw(
    "JPEG2000Essence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x15, 0x01, 0x08, 0x00],
);
pub const MPEG2_ESSENCE: DictEntry = raw(
    "MPEG2Essence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x15, 0x01, 0x05, 0x00],
);
pub const WAV_ESSENCE: DictEntry = raw(
    "WAVEssence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x16, 0x01, 0x01, 0x00],
);
pub const TIMED_TEXT_ESSENCE: DictEntry = raw(
    "TimedTextEssence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x05, 0x09, 0x01, 0x00, 0x00, 0x00],
);
pub const DC_DATA_ESSENCE: DictEntry = raw(
    "DCDataEssence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x01, 0x02, 0x01, 0x01, 0x0d, 0x01, 0x03, 0x01, 0x17, 0x01, 0x02, 0x00],
);
pub const CRYPT_ESSENCE: DictEntry = raw(
    "CryptEssence",
    0,
    [0x06, 0x0e, 0x2b, 0x34, 0x02, 0x04, 0x01, 0x07, 0x0d, 0x01, 0x03, 0x01, 0x02, 0x7e, 0x01, 0x00],
);

// Data definitions

pub const PICTURE_DATA_DEF: DictEntry = label("PictureDataDef", 0x01, [0x01, 0x03, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const SOUND_DATA_DEF: DictEntry = label("SoundDataDef", 0x01, [0x01, 0x03, 0x02, 0x02, 0x02, 0x00, 0x00, 0x00]);
pub const DATA_DATA_DEF: DictEntry = label("DataDataDef", 0x01, [0x01, 0x03, 0x02, 0x02, 0x03, 0x00, 0x00, 0x00]);
pub const TIMECODE_DATA_DEF: DictEntry = label("TimecodeDataDef", 0x01, [0x01, 0x03, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const DESCRIPTIVE_METADATA_DEF: DictEntry =
    label("DescriptiveMetaDataDef", 0x01, [0x01, 0x03, 0x02, 0x01, 0x10, 0x00, 0x00, 0x00]);

// Coding and crypto labels

pub const JP2K_ESSENCE_COMPRESSION_2K: DictEntry =
    label("JP2KEssenceCompression_2K", 0x09, [0x04, 0x01, 0x02, 0x02, 0x03, 0x01, 0x01, 0x03]);
pub const JP2K_ESSENCE_COMPRESSION_4K: DictEntry =
    label("JP2KEssenceCompression_4K", 0x09, [0x04, 0x01, 0x02, 0x02, 0x03, 0x01, 0x01, 0x04]);
pub const CIPHER_ALGORITHM_AES: DictEntry =
    label("CipherAlgorithm_AES", 0x07, [0x02, 0x09, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const MIC_ALGORITHM_HMAC_SHA1: DictEntry =
    label("MICAlgorithm_HMAC_SHA1", 0x07, [0x02, 0x09, 0x02, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const MIC_ALGORITHM_NONE: DictEntry = raw("MICAlgorithm_NONE", 0, [0; 16]);
pub const ATMOS_ESSENCE_CODING: DictEntry =
    label("DolbyAtmosEssenceCoding", 0x05, [0x0e, 0x09, 0x06, 0x04, 0x00, 0x00, 0x00, 0x00]);

// D-Cinema audio channel configurations

pub const DC_AUDIO_CHANNEL_CFG_1_5P1: DictEntry =
    label("DCAudioChannelCfg_1_5p1", 0x08, [0x04, 0x02, 0x02, 0x10, 0x03, 0x01, 0x01, 0x00]);
pub const DC_AUDIO_CHANNEL_CFG_2_6P1: DictEntry =
    label("DCAudioChannelCfg_2_6p1", 0x08, [0x04, 0x02, 0x02, 0x10, 0x03, 0x01, 0x02, 0x00]);
pub const DC_AUDIO_CHANNEL_CFG_3_7P1: DictEntry =
    label("DCAudioChannelCfg_3_7p1", 0x08, [0x04, 0x02, 0x02, 0x10, 0x03, 0x01, 0x03, 0x00]);
pub const DC_AUDIO_CHANNEL_CFG_4_WTF: DictEntry =
    label("DCAudioChannelCfg_4_WTF", 0x08, [0x04, 0x02, 0x02, 0x10, 0x03, 0x01, 0x04, 0x00]);
pub const DC_AUDIO_CHANNEL_CFG_5_7P1_DS: DictEntry =
    label("DCAudioChannelCfg_5_7p1_DS", 0x08, [0x04, 0x02, 0x02, 0x10, 0x03, 0x01, 0x05, 0x00]);
pub const DC_AUDIO_CHANNEL_CFG_MCA: DictEntry =
    label("DCAudioChannelCfg_MCA", 0x0d, [0x04, 0x02, 0x02, 0x10, 0x04, 0x00, 0x00, 0x00]);

// Set keys

pub const SEQUENCE: DictEntry = md_set("Sequence", 0x0f);
pub const SOURCE_CLIP: DictEntry = md_set("SourceClip", 0x11);
pub const TIMECODE_COMPONENT: DictEntry = md_set("TimecodeComponent", 0x14);
pub const CONTENT_STORAGE: DictEntry = md_set("ContentStorage", 0x18);
pub const ESSENCE_CONTAINER_DATA: DictEntry = md_set("EssenceContainerData", 0x23);
pub const FILE_DESCRIPTOR: DictEntry = md_set("FileDescriptor", 0x25);
pub const GENERIC_PICTURE_ESSENCE_DESCRIPTOR: DictEntry = md_set("GenericPictureEssenceDescriptor", 0x27);
pub const CDCI_ESSENCE_DESCRIPTOR: DictEntry = md_set("CDCIEssenceDescriptor", 0x28);
pub const RGBA_ESSENCE_DESCRIPTOR: DictEntry = md_set("RGBAEssenceDescriptor", 0x29);
pub const PREFACE: DictEntry = md_set("Preface", 0x2f);
pub const IDENTIFICATION: DictEntry = md_set("Identification", 0x30);
pub const NETWORK_LOCATOR: DictEntry = md_set("NetworkLocator", 0x32);
pub const MATERIAL_PACKAGE: DictEntry = md_set("MaterialPackage", 0x36);
pub const SOURCE_PACKAGE: DictEntry = md_set("SourcePackage", 0x37);
pub const STATIC_TRACK: DictEntry = md_set("StaticTrack", 0x3a);
pub const TRACK: DictEntry = md_set("Track", 0x3b);
pub const DM_SEGMENT: DictEntry = md_set("DMSegment", 0x41);
pub const GENERIC_SOUND_ESSENCE_DESCRIPTOR: DictEntry = md_set("GenericSoundEssenceDescriptor", 0x42);
pub const GENERIC_DATA_ESSENCE_DESCRIPTOR: DictEntry = md_set("GenericDataEssenceDescriptor", 0x43);
pub const WAVE_AUDIO_DESCRIPTOR: DictEntry = md_set("WaveAudioDescriptor", 0x48);
pub const MPEG2_VIDEO_DESCRIPTOR: DictEntry = md_set("MPEG2VideoDescriptor", 0x51);
pub const JPEG_2000_PICTURE_SUB_DESCRIPTOR: DictEntry = md_set("JPEG2000PictureSubDescriptor", 0x5a);
pub const STEREOSCOPIC_PICTURE_SUB_DESCRIPTOR: DictEntry = md_set("StereoscopicPictureSubDescriptor", 0x63);
pub const TIMED_TEXT_DESCRIPTOR: DictEntry = md_set("TimedTextDescriptor", 0x64);
pub const TIMED_TEXT_RESOURCE_SUB_DESCRIPTOR: DictEntry = md_set("TimedTextResourceSubDescriptor", 0x65);
pub const DC_DATA_DESCRIPTOR: DictEntry = md_set("DCDataDescriptor", 0x66);
pub const MCA_LABEL_SUB_DESCRIPTOR: DictEntry = md_set("MCALabelSubDescriptor", 0x6a);
pub const AUDIO_CHANNEL_LABEL_SUB_DESCRIPTOR: DictEntry = md_set("AudioChannelLabelSubDescriptor", 0x6b);
pub const SOUNDFIELD_GROUP_LABEL_SUB_DESCRIPTOR: DictEntry = md_set("SoundfieldGroupLabelSubDescriptor", 0x6c);
pub const GROUP_OF_SOUNDFIELD_GROUPS_LABEL_SUB_DESCRIPTOR: DictEntry =
    md_set("GroupOfSoundfieldGroupsLabelSubDescriptor", 0x6d);
pub const DOLBY_ATMOS_SUB_DESCRIPTOR: DictEntry = md_set("DolbyAtmosSubDescriptor", 0x6e);
pub const INDEX_TABLE_SEGMENT: DictEntry =
    set("IndexTableSegment", [0x0d, 0x01, 0x02, 0x01, 0x01, 0x10, 0x01, 0x00]);
pub const CRYPTOGRAPHIC_FRAMEWORK: DictEntry =
    set("CryptographicFramework", [0x0d, 0x01, 0x04, 0x01, 0x02, 0x01, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT: DictEntry =
    set("CryptographicContext", [0x0d, 0x01, 0x04, 0x01, 0x02, 0x02, 0x00, 0x00]);

// InterchangeObject

pub const INSTANCE_UID: DictEntry = item("InstanceUID", 0x3c0a, 0x01, [0x01, 0x01, 0x15, 0x02, 0x00, 0x00, 0x00, 0x00]);
pub const GENERATION_UID: DictEntry = item("GenerationUID", 0x0102, 0x02, [0x05, 0x20, 0x07, 0x01, 0x08, 0x00, 0x00, 0x00]);

// Preface

pub const PREFACE_LAST_MODIFIED_DATE: DictEntry =
    item("Preface_LastModifiedDate", 0x3b02, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x04, 0x00, 0x00]);
pub const PREFACE_VERSION: DictEntry = item("Preface_Version", 0x3b05, 0x02, [0x03, 0x01, 0x02, 0x01, 0x05, 0x00, 0x00, 0x00]);
pub const PREFACE_OBJECT_MODEL_VERSION: DictEntry =
    item("Preface_ObjectModelVersion", 0x3b07, 0x02, [0x03, 0x01, 0x02, 0x01, 0x04, 0x00, 0x00, 0x00]);
pub const PREFACE_PRIMARY_PACKAGE: DictEntry =
    item("Preface_PrimaryPackage", 0x3b08, 0x04, [0x06, 0x01, 0x01, 0x04, 0x01, 0x08, 0x00, 0x00]);
pub const PREFACE_IDENTIFICATIONS: DictEntry =
    item("Preface_Identifications", 0x3b06, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x04, 0x00, 0x00]);
pub const PREFACE_CONTENT_STORAGE: DictEntry =
    item("Preface_ContentStorage", 0x3b03, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x01, 0x00, 0x00]);
pub const PREFACE_OPERATIONAL_PATTERN: DictEntry =
    item("Preface_OperationalPattern", 0x3b09, 0x05, [0x01, 0x02, 0x02, 0x03, 0x00, 0x00, 0x00, 0x00]);
pub const PREFACE_ESSENCE_CONTAINERS: DictEntry =
    item("Preface_EssenceContainers", 0x3b0a, 0x05, [0x01, 0x02, 0x02, 0x10, 0x02, 0x01, 0x00, 0x00]);
pub const PREFACE_DM_SCHEMES: DictEntry =
    item("Preface_DMSchemes", 0x3b0b, 0x05, [0x01, 0x02, 0x02, 0x10, 0x02, 0x02, 0x00, 0x00]);

// Identification

pub const IDENTIFICATION_THIS_GENERATION_UID: DictEntry =
    item("Identification_ThisGenerationUID", 0x3c09, 0x02, [0x05, 0x20, 0x07, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const IDENTIFICATION_COMPANY_NAME: DictEntry =
    item("Identification_CompanyName", 0x3c01, 0x02, [0x05, 0x20, 0x07, 0x01, 0x02, 0x01, 0x00, 0x00]);
pub const IDENTIFICATION_PRODUCT_NAME: DictEntry =
    item("Identification_ProductName", 0x3c02, 0x02, [0x05, 0x20, 0x07, 0x01, 0x03, 0x01, 0x00, 0x00]);
pub const IDENTIFICATION_PRODUCT_VERSION: DictEntry =
    item("Identification_ProductVersion", 0x3c03, 0x02, [0x05, 0x20, 0x07, 0x01, 0x04, 0x00, 0x00, 0x00]);
pub const IDENTIFICATION_VERSION_STRING: DictEntry =
    item("Identification_VersionString", 0x3c04, 0x02, [0x05, 0x20, 0x07, 0x01, 0x05, 0x01, 0x00, 0x00]);
pub const IDENTIFICATION_PRODUCT_UID: DictEntry =
    item("Identification_ProductUID", 0x3c05, 0x02, [0x05, 0x20, 0x07, 0x01, 0x07, 0x00, 0x00, 0x00]);
pub const IDENTIFICATION_MODIFICATION_DATE: DictEntry =
    item("Identification_ModificationDate", 0x3c06, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x03, 0x00, 0x00]);
pub const IDENTIFICATION_TOOLKIT_VERSION: DictEntry =
    item("Identification_ToolkitVersion", 0x3c07, 0x02, [0x05, 0x20, 0x07, 0x01, 0x0a, 0x00, 0x00, 0x00]);
pub const IDENTIFICATION_PLATFORM: DictEntry =
    item("Identification_Platform", 0x3c08, 0x02, [0x05, 0x20, 0x07, 0x01, 0x06, 0x01, 0x00, 0x00]);

// ContentStorage and EssenceContainerData

pub const CONTENT_STORAGE_PACKAGES: DictEntry =
    item("ContentStorage_Packages", 0x1901, 0x02, [0x06, 0x01, 0x01, 0x04, 0x05, 0x01, 0x00, 0x00]);
pub const CONTENT_STORAGE_ESSENCE_CONTAINER_DATA: DictEntry =
    item("ContentStorage_EssenceContainerData", 0x1902, 0x02, [0x06, 0x01, 0x01, 0x04, 0x05, 0x02, 0x00, 0x00]);
pub const ESSENCE_CONTAINER_DATA_LINKED_PACKAGE_UID: DictEntry =
    item("EssenceContainerData_LinkedPackageUID", 0x2701, 0x02, [0x06, 0x01, 0x01, 0x06, 0x01, 0x00, 0x00, 0x00]);
pub const INDEX_SID: DictEntry = item("IndexSID", 0x3f06, 0x04, [0x01, 0x03, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00]);
pub const BODY_SID: DictEntry = item("BodySID", 0x3f07, 0x04, [0x01, 0x03, 0x04, 0x04, 0x00, 0x00, 0x00, 0x00]);

// Packages

pub const PACKAGE_UID: DictEntry = item("GenericPackage_PackageUID", 0x4401, 0x01, [0x01, 0x01, 0x15, 0x10, 0x00, 0x00, 0x00, 0x00]);
pub const PACKAGE_NAME: DictEntry = item("GenericPackage_Name", 0x4402, 0x01, [0x01, 0x03, 0x03, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const PACKAGE_CREATION_DATE: DictEntry =
    item("GenericPackage_PackageCreationDate", 0x4405, 0x02, [0x07, 0x02, 0x01, 0x10, 0x01, 0x03, 0x00, 0x00]);
pub const PACKAGE_MODIFIED_DATE: DictEntry =
    item("GenericPackage_PackageModifiedDate", 0x4404, 0x02, [0x07, 0x02, 0x01, 0x10, 0x02, 0x05, 0x00, 0x00]);
pub const PACKAGE_TRACKS: DictEntry = item("GenericPackage_Tracks", 0x4403, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x05, 0x00, 0x00]);
pub const SOURCE_PACKAGE_DESCRIPTOR: DictEntry =
    item("SourcePackage_Descriptor", 0x4701, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x03, 0x00, 0x00]);

// Tracks

pub const TRACK_ID: DictEntry = item("GenericTrack_TrackID", 0x4801, 0x02, [0x01, 0x07, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const TRACK_NUMBER: DictEntry = item("GenericTrack_TrackNumber", 0x4804, 0x02, [0x01, 0x04, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00]);
pub const TRACK_NAME: DictEntry = item("GenericTrack_TrackName", 0x4802, 0x02, [0x01, 0x07, 0x01, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const TRACK_SEQUENCE: DictEntry = item("GenericTrack_Sequence", 0x4803, 0x02, [0x06, 0x01, 0x01, 0x04, 0x02, 0x04, 0x00, 0x00]);
pub const TRACK_EDIT_RATE: DictEntry = item("Track_EditRate", 0x4b01, 0x02, [0x05, 0x30, 0x04, 0x05, 0x00, 0x00, 0x00, 0x00]);
pub const TRACK_ORIGIN: DictEntry = item("Track_Origin", 0x4b02, 0x02, [0x07, 0x02, 0x01, 0x03, 0x01, 0x03, 0x00, 0x00]);

// Structural components

pub const COMPONENT_DATA_DEFINITION: DictEntry =
    item("StructuralComponent_DataDefinition", 0x0201, 0x02, [0x04, 0x07, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
pub const COMPONENT_DURATION: DictEntry =
    item("StructuralComponent_Duration", 0x0202, 0x02, [0x07, 0x02, 0x02, 0x01, 0x01, 0x03, 0x00, 0x00]);
pub const SEQUENCE_STRUCTURAL_COMPONENTS: DictEntry =
    item("Sequence_StructuralComponents", 0x1001, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x09, 0x00, 0x00]);
pub const SOURCE_CLIP_START_POSITION: DictEntry =
    item("SourceClip_StartPosition", 0x1201, 0x02, [0x07, 0x02, 0x01, 0x03, 0x01, 0x04, 0x00, 0x00]);
pub const SOURCE_CLIP_SOURCE_PACKAGE_ID: DictEntry =
    item("SourceClip_SourcePackageID", 0x1101, 0x02, [0x06, 0x01, 0x01, 0x03, 0x01, 0x00, 0x00, 0x00]);
pub const SOURCE_CLIP_SOURCE_TRACK_ID: DictEntry =
    item("SourceClip_SourceTrackID", 0x1102, 0x02, [0x06, 0x01, 0x01, 0x03, 0x02, 0x00, 0x00, 0x00]);
pub const TIMECODE_ROUNDED_BASE: DictEntry =
    item("TimecodeComponent_RoundedTimecodeBase", 0x1502, 0x02, [0x04, 0x04, 0x01, 0x01, 0x02, 0x06, 0x00, 0x00]);
pub const TIMECODE_START: DictEntry =
    item("TimecodeComponent_StartTimecode", 0x1501, 0x02, [0x07, 0x02, 0x01, 0x03, 0x01, 0x05, 0x00, 0x00]);
pub const TIMECODE_DROP_FRAME: DictEntry =
    item("TimecodeComponent_DropFrame", 0x1503, 0x01, [0x04, 0x04, 0x01, 0x01, 0x05, 0x00, 0x00, 0x00]);
pub const DM_SEGMENT_EVENT_START_POSITION: DictEntry =
    item("DMSegment_EventStartPosition", 0x0601, 0x02, [0x07, 0x02, 0x01, 0x03, 0x03, 0x03, 0x00, 0x00]);
pub const DM_SEGMENT_EVENT_COMMENT: DictEntry =
    item("DMSegment_EventComment", 0x0602, 0x02, [0x05, 0x30, 0x04, 0x04, 0x01, 0x00, 0x00, 0x00]);
pub const DM_SEGMENT_DM_FRAMEWORK: DictEntry =
    item("DMSegment_DMFramework", 0x6101, 0x05, [0x06, 0x01, 0x01, 0x04, 0x02, 0x0c, 0x00, 0x00]);

// Descriptors

pub const DESCRIPTOR_LOCATORS: DictEntry =
    item("GenericDescriptor_Locators", 0x2f01, 0x02, [0x06, 0x01, 0x01, 0x04, 0x06, 0x03, 0x00, 0x00]);
pub const DESCRIPTOR_SUB_DESCRIPTORS: DictEntry =
    item("GenericDescriptor_SubDescriptors", 0, 0x09, [0x06, 0x01, 0x01, 0x04, 0x06, 0x10, 0x00, 0x00]);
pub const FILE_DESCRIPTOR_LINKED_TRACK_ID: DictEntry =
    item("FileDescriptor_LinkedTrackID", 0x3006, 0x05, [0x06, 0x01, 0x01, 0x03, 0x05, 0x00, 0x00, 0x00]);
pub const FILE_DESCRIPTOR_SAMPLE_RATE: DictEntry =
    item("FileDescriptor_SampleRate", 0x3001, 0x01, [0x04, 0x06, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const FILE_DESCRIPTOR_CONTAINER_DURATION: DictEntry =
    item("FileDescriptor_ContainerDuration", 0x3002, 0x01, [0x04, 0x06, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00]);
pub const FILE_DESCRIPTOR_ESSENCE_CONTAINER: DictEntry =
    item("FileDescriptor_EssenceContainer", 0x3004, 0x02, [0x06, 0x01, 0x01, 0x04, 0x01, 0x02, 0x00, 0x00]);
pub const FILE_DESCRIPTOR_CODEC: DictEntry =
    item("FileDescriptor_Codec", 0x3005, 0x02, [0x06, 0x01, 0x01, 0x04, 0x01, 0x03, 0x00, 0x00]);
pub const PICTURE_FRAME_LAYOUT: DictEntry =
    item("GenericPictureEssenceDescriptor_FrameLayout", 0x320c, 0x01, [0x04, 0x01, 0x03, 0x01, 0x04, 0x00, 0x00, 0x00]);
pub const PICTURE_STORED_WIDTH: DictEntry =
    item("GenericPictureEssenceDescriptor_StoredWidth", 0x3203, 0x01, [0x04, 0x01, 0x05, 0x02, 0x02, 0x00, 0x00, 0x00]);
pub const PICTURE_STORED_HEIGHT: DictEntry =
    item("GenericPictureEssenceDescriptor_StoredHeight", 0x3202, 0x01, [0x04, 0x01, 0x05, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const PICTURE_ASPECT_RATIO: DictEntry =
    item("GenericPictureEssenceDescriptor_AspectRatio", 0x320e, 0x01, [0x04, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const PICTURE_ESSENCE_CODING: DictEntry =
    item("GenericPictureEssenceDescriptor_PictureEssenceCoding", 0x3201, 0x02, [0x04, 0x01, 0x06, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const RGBA_COMPONENT_MAX_REF: DictEntry =
    item("RGBAEssenceDescriptor_ComponentMaxRef", 0x3406, 0x05, [0x04, 0x01, 0x05, 0x03, 0x0b, 0x00, 0x00, 0x00]);
pub const RGBA_COMPONENT_MIN_REF: DictEntry =
    item("RGBAEssenceDescriptor_ComponentMinRef", 0x3407, 0x05, [0x04, 0x01, 0x05, 0x03, 0x0c, 0x00, 0x00, 0x00]);
pub const CDCI_COMPONENT_DEPTH: DictEntry =
    item("CDCIEssenceDescriptor_ComponentDepth", 0x3301, 0x02, [0x04, 0x01, 0x05, 0x03, 0x0a, 0x00, 0x00, 0x00]);
pub const CDCI_HORIZONTAL_SUBSAMPLING: DictEntry =
    item("CDCIEssenceDescriptor_HorizontalSubsampling", 0x3302, 0x01, [0x04, 0x01, 0x05, 0x01, 0x05, 0x00, 0x00, 0x00]);
pub const CDCI_VERTICAL_SUBSAMPLING: DictEntry =
    item("CDCIEssenceDescriptor_VerticalSubsampling", 0x3308, 0x02, [0x04, 0x01, 0x05, 0x01, 0x10, 0x00, 0x00, 0x00]);
pub const CDCI_COLOR_SITING: DictEntry =
    item("CDCIEssenceDescriptor_ColorSiting", 0x3303, 0x01, [0x04, 0x01, 0x05, 0x01, 0x06, 0x00, 0x00, 0x00]);
pub const MPEG2_CODED_CONTENT_TYPE: DictEntry =
    item("MPEG2VideoDescriptor_CodedContentType", 0, 0x05, [0x04, 0x01, 0x06, 0x02, 0x01, 0x04, 0x00, 0x00]);
pub const MPEG2_LOW_DELAY: DictEntry =
    item("MPEG2VideoDescriptor_LowDelay", 0, 0x05, [0x04, 0x01, 0x06, 0x02, 0x01, 0x05, 0x00, 0x00]);
pub const MPEG2_BIT_RATE: DictEntry =
    item("MPEG2VideoDescriptor_BitRate", 0, 0x05, [0x04, 0x01, 0x06, 0x02, 0x01, 0x0b, 0x00, 0x00]);
pub const MPEG2_PROFILE_AND_LEVEL: DictEntry =
    item("MPEG2VideoDescriptor_ProfileAndLevel", 0, 0x05, [0x04, 0x01, 0x06, 0x02, 0x01, 0x0a, 0x00, 0x00]);
pub const SOUND_AUDIO_SAMPLING_RATE: DictEntry =
    item("GenericSoundEssenceDescriptor_AudioSamplingRate", 0x3d03, 0x05, [0x04, 0x02, 0x03, 0x01, 0x01, 0x01, 0x00, 0x00]);
pub const SOUND_LOCKED: DictEntry =
    item("GenericSoundEssenceDescriptor_Locked", 0x3d02, 0x04, [0x04, 0x02, 0x03, 0x01, 0x04, 0x00, 0x00, 0x00]);
pub const SOUND_AUDIO_REF_LEVEL: DictEntry =
    item("GenericSoundEssenceDescriptor_AudioRefLevel", 0x3d04, 0x01, [0x04, 0x02, 0x01, 0x01, 0x03, 0x00, 0x00, 0x00]);
pub const SOUND_CHANNEL_COUNT: DictEntry =
    item("GenericSoundEssenceDescriptor_ChannelCount", 0x3d07, 0x05, [0x04, 0x02, 0x01, 0x01, 0x04, 0x00, 0x00, 0x00]);
pub const SOUND_QUANTIZATION_BITS: DictEntry =
    item("GenericSoundEssenceDescriptor_QuantizationBits", 0x3d01, 0x04, [0x04, 0x02, 0x03, 0x03, 0x04, 0x00, 0x00, 0x00]);
pub const SOUND_DIAL_NORM: DictEntry =
    item("GenericSoundEssenceDescriptor_DialNorm", 0x3d0c, 0x05, [0x04, 0x02, 0x07, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const WAVE_BLOCK_ALIGN: DictEntry =
    item("WaveAudioDescriptor_BlockAlign", 0x3d0a, 0x05, [0x04, 0x02, 0x03, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const WAVE_SEQUENCE_OFFSET: DictEntry =
    item("WaveAudioDescriptor_SequenceOffset", 0x3d0b, 0x05, [0x04, 0x02, 0x03, 0x02, 0x02, 0x00, 0x00, 0x00]);
pub const WAVE_AVG_BPS: DictEntry =
    item("WaveAudioDescriptor_AvgBps", 0x3d09, 0x05, [0x04, 0x02, 0x03, 0x03, 0x05, 0x00, 0x00, 0x00]);
pub const WAVE_CHANNEL_ASSIGNMENT: DictEntry =
    item("WaveAudioDescriptor_ChannelAssignment", 0x3d32, 0x07, [0x04, 0x02, 0x01, 0x01, 0x05, 0x00, 0x00, 0x00]);

const fn j2k(name: &'static str, id: u8) -> DictEntry {
    item(name, 0, 0x0a, [0x04, 0x01, 0x06, 0x03, id, 0x00, 0x00, 0x00])
}

pub const J2K_RSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_Rsize", 0x01);
pub const J2K_XSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_Xsize", 0x02);
pub const J2K_YSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_Ysize", 0x03);
pub const J2K_XOSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_XOsize", 0x04);
pub const J2K_YOSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_YOsize", 0x05);
pub const J2K_XTSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_XTsize", 0x06);
pub const J2K_YTSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_YTsize", 0x07);
pub const J2K_XTOSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_XTOsize", 0x08);
pub const J2K_YTOSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_YTOsize", 0x09);
pub const J2K_CSIZE: DictEntry = j2k("JPEG2000PictureSubDescriptor_Csize", 0x0a);
pub const J2K_PICTURE_COMPONENT_SIZING: DictEntry = j2k("JPEG2000PictureSubDescriptor_PictureComponentSizing", 0x0b);
pub const J2K_CODING_STYLE_DEFAULT: DictEntry = j2k("JPEG2000PictureSubDescriptor_CodingStyleDefault", 0x0c);
pub const J2K_QUANTIZATION_DEFAULT: DictEntry = j2k("JPEG2000PictureSubDescriptor_QuantizationDefault", 0x0d);

pub const DATA_ESSENCE_CODING: DictEntry =
    item("GenericDataEssenceDescriptor_DataEssenceCoding", 0x3e01, 0x03, [0x04, 0x03, 0x03, 0x02, 0x00, 0x00, 0x00, 0x00]);
pub const NETWORK_LOCATOR_URL_STRING: DictEntry =
    item("NetworkLocator_URLString", 0x4001, 0x01, [0x01, 0x02, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_RESOURCE_ID: DictEntry =
    item("TimedTextDescriptor_ResourceID", 0, 0x0c, [0x01, 0x01, 0x15, 0x12, 0x00, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_UCS_ENCODING: DictEntry =
    item("TimedTextDescriptor_UCSEncoding", 0, 0x0c, [0x04, 0x09, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_NAMESPACE_URI: DictEntry =
    item("TimedTextDescriptor_NamespaceURI", 0, 0x0c, [0x01, 0x02, 0x01, 0x05, 0x01, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_ANCILLARY_RESOURCE_ID: DictEntry =
    item("TimedTextResourceSubDescriptor_AncillaryResourceID", 0, 0x0c, [0x01, 0x01, 0x15, 0x13, 0x00, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_MIME_MEDIA_TYPE: DictEntry =
    item("TimedTextResourceSubDescriptor_MIMEMediaType", 0, 0x0c, [0x04, 0x09, 0x07, 0x00, 0x00, 0x00, 0x00, 0x00]);
pub const TIMED_TEXT_ESSENCE_STREAM_ID: DictEntry =
    item("TimedTextResourceSubDescriptor_EssenceStreamID", 0, 0x0c, [0x01, 0x03, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00]);

const fn atmos(name: &'static str, id: u8) -> DictEntry {
    item(name, 0, 0x0e, [0x04, 0x02, 0x08, id, 0x00, 0x00, 0x00, 0x00])
}

pub const ATMOS_ID: DictEntry = atmos("DolbyAtmosSubDescriptor_AtmosID", 0x01);
pub const ATMOS_FIRST_FRAME: DictEntry = atmos("DolbyAtmosSubDescriptor_FirstFrame", 0x02);
pub const ATMOS_MAX_CHANNEL_COUNT: DictEntry = atmos("DolbyAtmosSubDescriptor_MaxChannelCount", 0x03);
pub const ATMOS_MAX_OBJECT_COUNT: DictEntry = atmos("DolbyAtmosSubDescriptor_MaxObjectCount", 0x04);
pub const ATMOS_VERSION: DictEntry = atmos("DolbyAtmosSubDescriptor_AtmosVersion", 0x05);

const fn mca(name: &'static str, id: u8) -> DictEntry {
    item(name, 0, 0x0e, [0x01, 0x03, 0x07, 0x01, id, 0x00, 0x00, 0x00])
}

pub const MCA_LABEL_DICTIONARY_ID: DictEntry = mca("MCALabelSubDescriptor_MCALabelDictionaryID", 0x01);
pub const MCA_TAG_SYMBOL: DictEntry = mca("MCALabelSubDescriptor_MCATagSymbol", 0x02);
pub const MCA_TAG_NAME: DictEntry = mca("MCALabelSubDescriptor_MCATagName", 0x03);
pub const MCA_CHANNEL_ID: DictEntry = mca("MCALabelSubDescriptor_MCAChannelID", 0x04);
pub const MCA_LINK_ID: DictEntry = mca("MCALabelSubDescriptor_MCALinkID", 0x05);
pub const MCA_SOUNDFIELD_GROUP_LINK_ID: DictEntry = mca("AudioChannelLabelSubDescriptor_SoundfieldGroupLinkID", 0x06);
pub const MCA_SPOKEN_LANGUAGE: DictEntry = mca("MCALabelSubDescriptor_RFC5646SpokenLanguage", 0x07);
pub const MCA_GROUP_OF_SOUNDFIELD_GROUPS_LINK_ID: DictEntry =
    mca("SoundfieldGroupLabelSubDescriptor_GroupOfSoundfieldGroupsLinkID", 0x08);

// Cryptographic framework

pub const CRYPTOGRAPHIC_FRAMEWORK_CONTEXT_SR: DictEntry =
    item("CryptographicFramework_ContextSR", 0, 0x09, [0x06, 0x01, 0x01, 0x04, 0x02, 0x0d, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT_CONTEXT_ID: DictEntry =
    item("CryptographicContext_ContextID", 0, 0x09, [0x01, 0x01, 0x15, 0x11, 0x00, 0x00, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT_SOURCE_ESSENCE_CONTAINER: DictEntry =
    item("CryptographicContext_SourceEssenceContainer", 0, 0x09, [0x06, 0x01, 0x01, 0x02, 0x02, 0x00, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT_CIPHER_ALGORITHM: DictEntry =
    item("CryptographicContext_CipherAlgorithm", 0, 0x09, [0x02, 0x09, 0x03, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT_MIC_ALGORITHM: DictEntry =
    item("CryptographicContext_MICAlgorithm", 0, 0x09, [0x02, 0x09, 0x03, 0x02, 0x01, 0x00, 0x00, 0x00]);
pub const CRYPTOGRAPHIC_CONTEXT_KEY_ID: DictEntry =
    item("CryptographicContext_CryptographicKeyID", 0, 0x09, [0x02, 0x09, 0x03, 0x01, 0x02, 0x00, 0x00, 0x00]);

// Index table segment

pub const INDEX_EDIT_RATE: DictEntry =
    item("IndexTableSegment_IndexEditRate", 0x3f0b, 0x05, [0x05, 0x30, 0x04, 0x06, 0x00, 0x00, 0x00, 0x00]);
pub const INDEX_START_POSITION: DictEntry =
    item("IndexTableSegment_IndexStartPosition", 0x3f0c, 0x05, [0x07, 0x02, 0x01, 0x03, 0x01, 0x0a, 0x00, 0x00]);
pub const INDEX_DURATION: DictEntry =
    item("IndexTableSegment_IndexDuration", 0x3f0d, 0x05, [0x07, 0x02, 0x02, 0x01, 0x01, 0x02, 0x00, 0x00]);
pub const INDEX_EDIT_UNIT_BYTE_COUNT: DictEntry =
    item("IndexTableSegment_EditUnitByteCount", 0x3f05, 0x04, [0x04, 0x06, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00]);
pub const INDEX_SLICE_COUNT: DictEntry =
    item("IndexTableSegment_SliceCount", 0x3f08, 0x04, [0x04, 0x04, 0x04, 0x01, 0x01, 0x00, 0x00, 0x00]);
pub const INDEX_POS_TABLE_COUNT: DictEntry =
    item("IndexTableSegment_PosTableCount", 0x3f0e, 0x05, [0x04, 0x04, 0x04, 0x01, 0x07, 0x00, 0x00, 0x00]);
pub const INDEX_DELTA_ENTRY_ARRAY: DictEntry =
    item("IndexTableSegment_DeltaEntryArray", 0x3f09, 0x05, [0x04, 0x04, 0x04, 0x01, 0x06, 0x00, 0x00, 0x00]);
pub const INDEX_ENTRY_ARRAY: DictEntry =
    item("IndexTableSegment_IndexEntryArray", 0x3f0a, 0x05, [0x04, 0x04, 0x04, 0x02, 0x05, 0x00, 0x00, 0x00]);

/// The OP-Atom label as written by each label set.
pub fn op_atom(label_set: LabelSetType) -> Ul {
    match label_set {
        LabelSetType::Interop => OP_ATOM.ul.with_version(0x01),
        _ => OP_ATOM.ul,
    }
}

/// The KLV fill key as written by each label set.
pub fn klv_fill(label_set: LabelSetType) -> Ul {
    match label_set {
        LabelSetType::Interop => KLV_FILL.ul.with_version(0x01),
        _ => KLV_FILL.ul,
    }
}

static ENTRIES: &[&DictEntry] = &[
    &OPEN_HEADER, &CLOSED_COMPLETE_HEADER, &CLOSED_COMPLETE_BODY_PARTITION, &COMPLETE_FOOTER,
    &PRIMER, &RANDOM_INDEX_METADATA, &KLV_FILL, &OP_ATOM, &OP_1A, &GC_MULTI,
    &JPEG_2000_WRAPPING_FRAME, &MPEG2_VES_WRAPPING_FRAME, &WAV_WRAPPING_FRAME,
    &TIMED_TEXT_WRAPPING, &DC_DATA_WRAPPING_FRAME, &ENCRYPTED_CONTAINER_LABEL,
    &CRYPTOGRAPHIC_FRAMEWORK_LABEL, &JPEG_2000_ESSENCE, &MPEG2_ESSENCE, &WAV_ESSENCE,
    &TIMED_TEXT_ESSENCE, &DC_DATA_ESSENCE, &CRYPT_ESSENCE, &PICTURE_DATA_DEF, &SOUND_DATA_DEF,
    &DATA_DATA_DEF, &TIMECODE_DATA_DEF, &DESCRIPTIVE_METADATA_DEF, &JP2K_ESSENCE_COMPRESSION_2K,
    &JP2K_ESSENCE_COMPRESSION_4K, &CIPHER_ALGORITHM_AES, &MIC_ALGORITHM_HMAC_SHA1,
    &ATMOS_ESSENCE_CODING, &DC_AUDIO_CHANNEL_CFG_1_5P1, &DC_AUDIO_CHANNEL_CFG_2_6P1,
    &DC_AUDIO_CHANNEL_CFG_3_7P1, &DC_AUDIO_CHANNEL_CFG_4_WTF, &DC_AUDIO_CHANNEL_CFG_5_7P1_DS,
    &DC_AUDIO_CHANNEL_CFG_MCA, &SEQUENCE, &SOURCE_CLIP, &TIMECODE_COMPONENT, &CONTENT_STORAGE,
    &ESSENCE_CONTAINER_DATA, &FILE_DESCRIPTOR, &GENERIC_PICTURE_ESSENCE_DESCRIPTOR,
    &CDCI_ESSENCE_DESCRIPTOR, &RGBA_ESSENCE_DESCRIPTOR, &PREFACE, &IDENTIFICATION,
    &NETWORK_LOCATOR, &MATERIAL_PACKAGE, &SOURCE_PACKAGE, &STATIC_TRACK, &TRACK, &DM_SEGMENT,
    &GENERIC_SOUND_ESSENCE_DESCRIPTOR, &GENERIC_DATA_ESSENCE_DESCRIPTOR, &WAVE_AUDIO_DESCRIPTOR,
    &MPEG2_VIDEO_DESCRIPTOR, &JPEG_2000_PICTURE_SUB_DESCRIPTOR,
    &STEREOSCOPIC_PICTURE_SUB_DESCRIPTOR, &TIMED_TEXT_DESCRIPTOR,
    &TIMED_TEXT_RESOURCE_SUB_DESCRIPTOR, &DC_DATA_DESCRIPTOR, &MCA_LABEL_SUB_DESCRIPTOR,
    &AUDIO_CHANNEL_LABEL_SUB_DESCRIPTOR, &SOUNDFIELD_GROUP_LABEL_SUB_DESCRIPTOR,
    &GROUP_OF_SOUNDFIELD_GROUPS_LABEL_SUB_DESCRIPTOR, &DOLBY_ATMOS_SUB_DESCRIPTOR,
    &INDEX_TABLE_SEGMENT, &CRYPTOGRAPHIC_FRAMEWORK, &CRYPTOGRAPHIC_CONTEXT, &INSTANCE_UID,
    &GENERATION_UID, &PREFACE_LAST_MODIFIED_DATE, &PREFACE_VERSION, &PREFACE_OBJECT_MODEL_VERSION,
    &PREFACE_PRIMARY_PACKAGE, &PREFACE_IDENTIFICATIONS, &PREFACE_CONTENT_STORAGE,
    &PREFACE_OPERATIONAL_PATTERN, &PREFACE_ESSENCE_CONTAINERS, &PREFACE_DM_SCHEMES,
    &IDENTIFICATION_THIS_GENERATION_UID, &IDENTIFICATION_COMPANY_NAME,
    &IDENTIFICATION_PRODUCT_NAME, &IDENTIFICATION_PRODUCT_VERSION,
    &IDENTIFICATION_VERSION_STRING, &IDENTIFICATION_PRODUCT_UID,
    &IDENTIFICATION_MODIFICATION_DATE, &IDENTIFICATION_TOOLKIT_VERSION, &IDENTIFICATION_PLATFORM,
    &CONTENT_STORAGE_PACKAGES, &CONTENT_STORAGE_ESSENCE_CONTAINER_DATA,
    &ESSENCE_CONTAINER_DATA_LINKED_PACKAGE_UID, &INDEX_SID, &BODY_SID, &PACKAGE_UID,
    &PACKAGE_NAME, &PACKAGE_CREATION_DATE, &PACKAGE_MODIFIED_DATE, &PACKAGE_TRACKS,
    &SOURCE_PACKAGE_DESCRIPTOR, &TRACK_ID, &TRACK_NUMBER, &TRACK_NAME, &TRACK_SEQUENCE,
    &TRACK_EDIT_RATE, &TRACK_ORIGIN, &COMPONENT_DATA_DEFINITION, &COMPONENT_DURATION,
    &SEQUENCE_STRUCTURAL_COMPONENTS, &SOURCE_CLIP_START_POSITION, &SOURCE_CLIP_SOURCE_PACKAGE_ID,
    &SOURCE_CLIP_SOURCE_TRACK_ID, &TIMECODE_ROUNDED_BASE, &TIMECODE_START, &TIMECODE_DROP_FRAME,
    &DM_SEGMENT_EVENT_START_POSITION, &DM_SEGMENT_EVENT_COMMENT, &DM_SEGMENT_DM_FRAMEWORK,
    &DESCRIPTOR_LOCATORS, &DESCRIPTOR_SUB_DESCRIPTORS, &FILE_DESCRIPTOR_LINKED_TRACK_ID,
    &FILE_DESCRIPTOR_SAMPLE_RATE, &FILE_DESCRIPTOR_CONTAINER_DURATION,
    &FILE_DESCRIPTOR_ESSENCE_CONTAINER, &FILE_DESCRIPTOR_CODEC, &PICTURE_FRAME_LAYOUT,
    &PICTURE_STORED_WIDTH, &PICTURE_STORED_HEIGHT, &PICTURE_ASPECT_RATIO, &PICTURE_ESSENCE_CODING,
    &RGBA_COMPONENT_MAX_REF, &RGBA_COMPONENT_MIN_REF, &CDCI_COMPONENT_DEPTH,
    &CDCI_HORIZONTAL_SUBSAMPLING, &CDCI_VERTICAL_SUBSAMPLING, &CDCI_COLOR_SITING,
    &MPEG2_CODED_CONTENT_TYPE, &MPEG2_LOW_DELAY, &MPEG2_BIT_RATE, &MPEG2_PROFILE_AND_LEVEL,
    &SOUND_AUDIO_SAMPLING_RATE, &SOUND_LOCKED, &SOUND_AUDIO_REF_LEVEL, &SOUND_CHANNEL_COUNT,
    &SOUND_QUANTIZATION_BITS, &SOUND_DIAL_NORM, &WAVE_BLOCK_ALIGN, &WAVE_SEQUENCE_OFFSET,
    &WAVE_AVG_BPS, &WAVE_CHANNEL_ASSIGNMENT, &J2K_RSIZE, &J2K_XSIZE, &J2K_YSIZE, &J2K_XOSIZE,
    &J2K_YOSIZE, &J2K_XTSIZE, &J2K_YTSIZE, &J2K_XTOSIZE, &J2K_YTOSIZE, &J2K_CSIZE,
    &J2K_PICTURE_COMPONENT_SIZING, &J2K_CODING_STYLE_DEFAULT, &J2K_QUANTIZATION_DEFAULT,
    &DATA_ESSENCE_CODING, &NETWORK_LOCATOR_URL_STRING, &TIMED_TEXT_RESOURCE_ID,
    &TIMED_TEXT_UCS_ENCODING, &TIMED_TEXT_NAMESPACE_URI, &TIMED_TEXT_ANCILLARY_RESOURCE_ID,
    &TIMED_TEXT_MIME_MEDIA_TYPE, &TIMED_TEXT_ESSENCE_STREAM_ID, &ATMOS_ID, &ATMOS_FIRST_FRAME,
    &ATMOS_MAX_CHANNEL_COUNT, &ATMOS_MAX_OBJECT_COUNT, &ATMOS_VERSION, &MCA_LABEL_DICTIONARY_ID,
    &MCA_TAG_SYMBOL, &MCA_TAG_NAME, &MCA_CHANNEL_ID, &MCA_LINK_ID, &MCA_SOUNDFIELD_GROUP_LINK_ID,
    &MCA_SPOKEN_LANGUAGE, &MCA_GROUP_OF_SOUNDFIELD_GROUPS_LINK_ID,
    &CRYPTOGRAPHIC_FRAMEWORK_CONTEXT_SR, &CRYPTOGRAPHIC_CONTEXT_CONTEXT_ID,
    &CRYPTOGRAPHIC_CONTEXT_SOURCE_ESSENCE_CONTAINER, &CRYPTOGRAPHIC_CONTEXT_CIPHER_ALGORITHM,
    &CRYPTOGRAPHIC_CONTEXT_MIC_ALGORITHM, &CRYPTOGRAPHIC_CONTEXT_KEY_ID, &INDEX_EDIT_RATE,
    &INDEX_START_POSITION, &INDEX_DURATION, &INDEX_EDIT_UNIT_BYTE_COUNT, &INDEX_SLICE_COUNT,
    &INDEX_POS_TABLE_COUNT, &INDEX_DELTA_ENTRY_ARRAY, &INDEX_ENTRY_ARRAY,
];

/// Look up a registered entry by label (version byte ignored).
pub fn find_by_ul(ul: &Ul) -> Option<&'static DictEntry> {
    if ul.is_nil() {
        return None;
    }
    ENTRIES.iter().copied().find(|e| e.ul == *ul)
}

/// Look up an item entry by its static local tag.
pub fn find_by_tag(tag: u16) -> Option<&'static DictEntry> {
    if tag == 0 {
        return None;
    }
    ENTRIES.iter().copied().find(|e| e.tag == tag)
}

/// Human-readable name for a label, falling back to its dotted-hex form.
pub fn name_of(ul: &Ul) -> String {
    find_by_ul(ul)
        .map(|e| e.name.to_string())
        .unwrap_or_else(|| ul.to_string())
}
