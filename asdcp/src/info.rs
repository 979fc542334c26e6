//! Writer provenance, essence classification and asset summaries.

use std::path::Path;

use uuid::Uuid;

use crate::dict::{self, LabelSetType};
use crate::error::{AsdcpError, Result};
use crate::essence::jp2k;
use crate::header::HeaderPartition;
use crate::metadata::{
    CryptographicContext, DcDataDescriptor, DolbyAtmosSubDescriptor, Identification,
    Mpeg2VideoDescriptor, ObjectBody, RgbaEssenceDescriptor, SourcePackage,
    StereoscopicPictureSubDescriptor, TimedTextDescriptor, WaveAudioDescriptor,
};
use crate::reader;
use crate::types::Rational;

/// Product identity stamped into files written with the default [`WriterInfo`].
pub const DEFAULT_PRODUCT_UUID: Uuid = Uuid::from_u128(0x6a9b1c2e_5f4d_4e21_9c7a_3b8d2e0f1a47);

/// Who wrote a track file, and how its essence is protected.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct WriterInfo {
    pub product_uuid: Uuid,
    pub product_version: String,
    pub company_name: String,
    pub product_name: String,
    /// Identifies the track file; becomes the material part of the file package UMID.
    pub asset_uuid: Uuid,
    pub context_id: Uuid,
    pub cryptographic_key_id: Uuid,
    pub encrypted_essence: bool,
    pub uses_hmac: bool,
    pub label_set: LabelSetType,
}

impl Default for WriterInfo {
    fn default() -> Self {
        WriterInfo {
            product_uuid: DEFAULT_PRODUCT_UUID,
            product_version: crate::version::TOOLKIT_VERSION.to_string(),
            company_name: "asdcp-rs".to_string(),
            product_name: env!("CARGO_PKG_NAME").to_string(),
            asset_uuid: Uuid::new_v4(),
            context_id: Uuid::nil(),
            cryptographic_key_id: Uuid::nil(),
            encrypted_essence: false,
            uses_hmac: false,
            label_set: LabelSetType::Smpte,
        }
    }
}

impl WriterInfo {
    /// Recover writer information from a parsed header.
    pub fn from_header(header: &HeaderPartition) -> Result<Self> {
        let ident = header
            .find::<Identification>()
            .ok_or(AsdcpError::MissingObject("Identification"))?;
        let package = header
            .find::<SourcePackage>()
            .ok_or(AsdcpError::MissingObject("SourcePackage"))?;

        let mut info = WriterInfo {
            product_uuid: ident.product_uid,
            product_version: ident.version_string.clone(),
            company_name: ident.company_name.clone(),
            product_name: ident.product_name.clone(),
            asset_uuid: package.package.package_uid.material(),
            label_set: header.label_set,
            ..Default::default()
        };

        if let Some(ctx) = header.find::<CryptographicContext>() {
            info.encrypted_essence = true;
            info.context_id = ctx.context_id;
            info.cryptographic_key_id = ctx.cryptographic_key_id;
            info.uses_hmac = ctx.mic_algorithm == dict::MIC_ALGORITHM_HMAC_SHA1.ul;
        }
        Ok(info)
    }
}

/// Kind of essence carried by a track file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum EssenceType {
    Unknown,
    Mpeg2Ves,
    Jpeg2000,
    Jpeg2000Stereo,
    Pcm24b48k,
    Pcm24b96k,
    TimedText,
    DcData,
    Atmos,
}

/// Broad class of an essence type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum EssenceClass {
    Picture,
    Sound,
    Data,
    Unknown,
}

impl EssenceType {
    pub fn class(self) -> EssenceClass {
        match self {
            EssenceType::Mpeg2Ves | EssenceType::Jpeg2000 | EssenceType::Jpeg2000Stereo => {
                EssenceClass::Picture
            }
            EssenceType::Pcm24b48k | EssenceType::Pcm24b96k => EssenceClass::Sound,
            EssenceType::TimedText | EssenceType::DcData | EssenceType::Atmos => EssenceClass::Data,
            EssenceType::Unknown => EssenceClass::Unknown,
        }
    }
}

/// Classify a header by the descriptors it carries.
pub fn classify(header: &HeaderPartition) -> EssenceType {
    if let Some(rgba) = header.find::<RgbaEssenceDescriptor>() {
        // Interop stereo files carry no sub-descriptor, only the doubled sample rate.
        let rate_pair = header.essence_track().is_some_and(|t| {
            jp2k::is_stereo_rate_pair(t.edit_rate, rgba.picture.file.sample_rate)
        });
        if rate_pair || header.find::<StereoscopicPictureSubDescriptor>().is_some() {
            EssenceType::Jpeg2000Stereo
        } else {
            EssenceType::Jpeg2000
        }
    } else if let Some(wave) = header.find::<WaveAudioDescriptor>() {
        if wave.sound.audio_sampling_rate.numerator == 96000 {
            EssenceType::Pcm24b96k
        } else {
            EssenceType::Pcm24b48k
        }
    } else if header.find::<Mpeg2VideoDescriptor>().is_some() {
        EssenceType::Mpeg2Ves
    } else if header.find::<TimedTextDescriptor>().is_some() {
        EssenceType::TimedText
    } else if header.find::<DcDataDescriptor>().is_some() {
        if header.find::<DolbyAtmosSubDescriptor>().is_some() {
            EssenceType::Atmos
        } else {
            EssenceType::DcData
        }
    } else {
        EssenceType::Unknown
    }
}

/// Open a track file's header and report what it carries.
pub fn essence_type(path: &Path) -> Result<EssenceType> {
    let mut source = reader::open_source(path)?;
    let header = HeaderPartition::read_from(&mut source)?;
    Ok(classify(&header))
}

/// Summary of a track file, as printed by inspection tools.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct AssetInfo {
    pub essence_type: EssenceType,
    pub essence_class: EssenceClass,
    pub stereoscopic: bool,
    pub duration: u64,
    pub edit_rate: Rational,
    pub sample_rate: Rational,
    pub aspect_ratio: Option<Rational>,
    pub asset_uuid: Uuid,
    pub label_set: LabelSetType,
    pub encrypted: bool,
    pub key_id: Option<Uuid>,
    pub uses_hmac: bool,
}

impl AssetInfo {
    pub fn from_header(header: &HeaderPartition) -> Result<Self> {
        let info = WriterInfo::from_header(header)?;
        let essence_type = classify(header);
        let descriptor = header
            .essence_descriptor()
            .ok_or(AsdcpError::MissingObject("essence descriptor"))?;
        let file = descriptor
            .body
            .file_descriptor()
            .ok_or_else(|| AsdcpError::format("file package descriptor is not an essence descriptor"))?;

        let aspect_ratio = match &descriptor.body {
            ObjectBody::RgbaEssenceDescriptor(d) => Some(d.picture.aspect_ratio),
            ObjectBody::CdciEssenceDescriptor(d) => Some(d.picture.aspect_ratio),
            ObjectBody::Mpeg2VideoDescriptor(d) => Some(d.cdci.picture.aspect_ratio),
            ObjectBody::GenericPictureEssenceDescriptor(d) => Some(d.aspect_ratio),
            _ => None,
        };
        let edit_rate = header
            .essence_track()
            .map(|t| t.edit_rate)
            .unwrap_or(file.sample_rate);

        Ok(AssetInfo {
            essence_type,
            essence_class: essence_type.class(),
            stereoscopic: essence_type == EssenceType::Jpeg2000Stereo,
            duration: file.container_duration.unwrap_or(0).max(0) as u64,
            edit_rate,
            sample_rate: file.sample_rate,
            aspect_ratio,
            asset_uuid: info.asset_uuid,
            label_set: info.label_set,
            encrypted: info.encrypted_essence,
            key_id: info.encrypted_essence.then_some(info.cryptographic_key_id),
            uses_hmac: info.uses_hmac,
        })
    }
}

/// Read the header of the track file at `path` and summarise it.
pub fn read_asset_info(path: &Path) -> Result<AssetInfo> {
    let mut source = reader::open_source(path)?;
    let header = HeaderPartition::read_from(&mut source)?;
    AssetInfo::from_header(&header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_writer_info() {
        let a = WriterInfo::default();
        let b = WriterInfo::default();
        assert_ne!(a.asset_uuid, b.asset_uuid);
        assert_eq!(a.product_uuid, DEFAULT_PRODUCT_UUID);
        assert!(!a.encrypted_essence);
        assert_eq!(a.label_set, LabelSetType::Smpte);
    }

    #[test]
    fn test_essence_classes() {
        assert_eq!(EssenceType::Jpeg2000Stereo.class(), EssenceClass::Picture);
        assert_eq!(EssenceType::Pcm24b96k.class(), EssenceClass::Sound);
        assert_eq!(EssenceType::Atmos.class(), EssenceClass::Data);
    }

    #[test]
    fn test_classify_empty_header() {
        let header = HeaderPartition::new(LabelSetType::Smpte);
        assert_eq!(classify(&header), EssenceType::Unknown);
        assert!(WriterInfo::from_header(&header).is_err());
    }

    #[test]
    fn test_writer_info_serializes() {
        let json = serde_json::to_value(WriterInfo::default()).unwrap();
        assert_eq!(json["label_set"], "Smpte");
        assert_eq!(json["encrypted_essence"], false);
    }
}
