use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::error::{AsdcpError, Result};

pub const UL_LENGTH: usize = 16;
pub const UUID_LENGTH: usize = 16;
pub const UMID_LENGTH: usize = 32;

/// Byte holding the registry version of a label. Ignored by the default comparison.
const VERSION_BYTE: usize = 7;
/// Byte holding the element/stream number of an essence key.
const STREAM_BYTE: usize = 15;

/// How two labels are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UlMatch {
    /// All 16 bytes must match.
    Exact,
    /// Ignore the version byte.
    IgnoreVersion,
    /// Ignore the version byte and the stream number.
    IgnoreStream,
}

/// A 16-byte SMPTE Universal Label.
///
/// `==` ignores the version byte, matching how registered labels are compared
/// across registry revisions. Use [`Ul::exact_match`] when all bytes matter.
#[derive(Clone, Copy, Default)]
pub struct Ul(pub [u8; UL_LENGTH]);

impl Ul {
    pub const NIL: Ul = Ul([0; UL_LENGTH]);

    pub const fn new(bytes: [u8; UL_LENGTH]) -> Self {
        Ul(bytes)
    }

    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        let bytes: [u8; UL_LENGTH] = buf
            .get(..UL_LENGTH)
            .and_then(|b| b.try_into().ok())
            .ok_or(AsdcpError::UnexpectedEof {
                offset: buf.len() as u64,
                context: "universal label",
            })?;
        Ok(Ul(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; UL_LENGTH] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn exact_match(&self, other: &Ul) -> bool {
        self.0 == other.0
    }

    pub fn match_ignore_stream(&self, other: &Ul) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .all(|(i, (a, b))| i == VERSION_BYTE || i == STREAM_BYTE || a == b)
    }

    pub fn matches(&self, other: &Ul, mode: UlMatch) -> bool {
        match mode {
            UlMatch::Exact => self.exact_match(other),
            UlMatch::IgnoreVersion => self == other,
            UlMatch::IgnoreStream => self.match_ignore_stream(other),
        }
    }

    /// Copy of this label with the stream number (last byte) replaced.
    pub fn with_stream(&self, stream: u8) -> Ul {
        let mut bytes = self.0;
        bytes[STREAM_BYTE] = stream;
        Ul(bytes)
    }

    /// Copy of this label with the registry version byte replaced.
    pub fn with_version(&self, version: u8) -> Ul {
        let mut bytes = self.0;
        bytes[VERSION_BYTE] = version;
        Ul(bytes)
    }
}

impl PartialEq for Ul {
    fn eq(&self, other: &Self) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .all(|(i, (a, b))| i == VERSION_BYTE || a == b)
    }
}

impl Eq for Ul {}

impl Hash for Ul {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut bytes = self.0;
        bytes[VERSION_BYTE] = 0;
        bytes.hash(state);
    }
}

impl fmt::Display for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}{:02x}{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}.{:02x}{:02x}{:02x}{:02x}.{:02x}{:02x}{:02x}{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7], b[8], b[9], b[10], b[11], b[12], b[13],
            b[14], b[15]
        )
    }
}

impl fmt::Debug for Ul {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ul({self})")
    }
}

impl From<[u8; UL_LENGTH]> for Ul {
    fn from(bytes: [u8; UL_LENGTH]) -> Self {
        Ul(bytes)
    }
}

// Reports carry labels in their dotted-hex form.
impl serde::Serialize for Ul {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "jsonschema")]
impl schemars::JsonSchema for Ul {
    fn schema_name() -> String {
        "Ul".to_string()
    }

    fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(generator)
    }
}

/// 32-byte SMPTE 330M Unique Material Identifier.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Umid(pub [u8; UMID_LENGTH]);

impl Default for Umid {
    fn default() -> Self {
        Umid([0; UMID_LENGTH])
    }
}

impl Umid {
    pub const NIL: Umid = Umid([0; UMID_LENGTH]);

    /// Build a basic UMID whose material number is `material`.
    ///
    /// `kind` selects the material type (0x0f for "unidentified" essence).
    pub fn make(kind: u8, material: &Uuid) -> Self {
        let mut bytes = [0u8; UMID_LENGTH];
        bytes[..10].copy_from_slice(&[0x06, 0x0a, 0x2b, 0x34, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01]);
        bytes[10] = kind;
        // length of the remainder, then the instance method
        bytes[11] = 0x20;
        bytes[12] = 0x13;
        if kind > 4 {
            bytes[7] = 5;
        }
        bytes[16..].copy_from_slice(material.as_bytes());
        Umid(bytes)
    }

    /// The material number, which AS-DCP uses as the asset UUID.
    pub fn material(&self) -> Uuid {
        let mut bytes = [0u8; UUID_LENGTH];
        bytes.copy_from_slice(&self.0[16..]);
        Uuid::from_bytes(bytes)
    }
}

impl fmt::Display for Umid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 && i % 4 == 0 {
                f.write_str(".")?;
            }
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Umid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Umid({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const OP_ATOM: Ul = Ul::new([
        0x06, 0x0e, 0x2b, 0x34, 0x04, 0x01, 0x01, 0x02, 0x0d, 0x01, 0x02, 0x01, 0x10, 0x00, 0x00,
        0x00,
    ]);

    #[test]
    fn test_default_equality_ignores_version() {
        let interop = OP_ATOM.with_version(0x01);
        assert_eq!(OP_ATOM, interop);
        assert!(!OP_ATOM.exact_match(&interop));
        assert!(OP_ATOM.matches(&interop, UlMatch::IgnoreVersion));
    }

    #[test]
    fn test_ignore_stream() {
        let stream1 = OP_ATOM.with_stream(0x01);
        assert_ne!(OP_ATOM, stream1);
        assert!(OP_ATOM.match_ignore_stream(&stream1));
        assert!(OP_ATOM.matches(&stream1.with_version(9), UlMatch::IgnoreStream));
    }

    #[test]
    fn test_hash_consistent_with_eq() {
        let mut map = HashMap::new();
        map.insert(OP_ATOM, "atom");
        assert_eq!(map.get(&OP_ATOM.with_version(0x01)), Some(&"atom"));
    }

    #[test]
    fn test_display() {
        assert_eq!(OP_ATOM.to_string(), "060e2b34.0401.0102.0d010201.10000000");
    }

    #[test]
    fn test_umid_material_round_trip() {
        let id = Uuid::from_bytes([7u8; 16]);
        let umid = Umid::make(0x0f, &id);
        assert_eq!(umid.0[10], 0x0f);
        assert_eq!(umid.0[7], 5);
        assert_eq!(umid.0[11], 0x20);
        assert_eq!(umid.material(), id);
    }
}
