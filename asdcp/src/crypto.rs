//! AES-128-CBC frame encryption and the HMAC-SHA1 integrity pack.

use aes::Aes128;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit, generic_array::GenericArray};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::{Digest, Sha1};
use uuid::Uuid;

use crate::dict::LabelSetType;
use crate::error::{AsdcpError, Result};
use crate::ul::UUID_LENGTH;

pub const CBC_BLOCK_SIZE: usize = 16;
pub const KEY_LENGTH: usize = 16;
pub const HMAC_SIZE: usize = 20;

/// Encrypted ahead of the essence so a wrong key is detected before any output is produced.
pub const ESV_CHECK_VALUE: [u8; CBC_BLOCK_SIZE] = *b"CHUKCHUKCHUKCHUK";

/// Integrity pack: three BER4 lengths, TrackFileID, sequence number and HMAC.
pub const KLV_INTPACK_SIZE: usize = 4 * 3 + UUID_LENGTH + 8 + HMAC_SIZE;

/// Cryptographic info preceding the ESV: five BER4 lengths, ContextID,
/// PlaintextOffset, SourceKey and SourceLength.
pub const KLV_CRYPTINFO_SIZE: usize = 4 * 5 + UUID_LENGTH + 8 + 16 + 8;

/// Size of the integrity pack written when no HMAC is in use.
pub const KLV_EMPTY_INTPACK_SIZE: usize = 4 * 3;

const SHA1_INIT: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];
const FIPS186_SEED_LEN: usize = 64;
const INTEROP_KEY_NONCE: [u8; KEY_LENGTH] = [
    0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff,
];

type HmacSha1 = Hmac<Sha1>;

/// Length of the encrypted source value for a frame of `source_length` bytes.
pub fn calc_esv_length(source_length: usize, plaintext_offset: usize) -> usize {
    let ct_size = source_length.saturating_sub(plaintext_offset);
    let block_size = ct_size - ct_size % CBC_BLOCK_SIZE;
    plaintext_offset + block_size + CBC_BLOCK_SIZE * 3
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != KEY_LENGTH {
        return Err(AsdcpError::Crypto(format!(
            "key must be {KEY_LENGTH} bytes, got {}",
            key.len()
        )));
    }
    Ok(())
}

/// Encrypting side of an AES-128-CBC chain.
#[derive(Clone)]
pub struct AesEncContext {
    cipher: Aes128,
    ivec: [u8; CBC_BLOCK_SIZE],
}

impl AesEncContext {
    pub fn new(key: &[u8]) -> Result<Self> {
        check_key(key)?;
        Ok(AesEncContext {
            cipher: Aes128::new(GenericArray::from_slice(key)),
            ivec: [0u8; CBC_BLOCK_SIZE],
        })
    }

    pub fn set_ivec(&mut self, ivec: &[u8; CBC_BLOCK_SIZE]) {
        self.ivec = *ivec;
    }

    pub fn set_random_ivec(&mut self) {
        rand::thread_rng().fill_bytes(&mut self.ivec);
    }

    pub fn ivec(&self) -> &[u8; CBC_BLOCK_SIZE] {
        &self.ivec
    }

    /// Encrypt whole blocks, continuing the chain from the current IV.
    pub fn encrypt_blocks(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if input.len() % CBC_BLOCK_SIZE != 0 {
            return Err(AsdcpError::param("CBC input is not a whole number of blocks"));
        }
        for chunk in input.chunks_exact(CBC_BLOCK_SIZE) {
            let mut block = GenericArray::clone_from_slice(chunk);
            for (b, iv) in block.iter_mut().zip(self.ivec.iter()) {
                *b ^= iv;
            }
            self.cipher.encrypt_block(&mut block);
            self.ivec.copy_from_slice(&block);
            out.extend_from_slice(&block);
        }
        Ok(())
    }
}

/// Decrypting side of an AES-128-CBC chain.
#[derive(Clone)]
pub struct AesDecContext {
    cipher: Aes128,
    ivec: [u8; CBC_BLOCK_SIZE],
}

impl AesDecContext {
    pub fn new(key: &[u8]) -> Result<Self> {
        check_key(key)?;
        Ok(AesDecContext {
            cipher: Aes128::new(GenericArray::from_slice(key)),
            ivec: [0u8; CBC_BLOCK_SIZE],
        })
    }

    pub fn set_ivec(&mut self, ivec: &[u8]) -> Result<()> {
        if ivec.len() != CBC_BLOCK_SIZE {
            return Err(AsdcpError::param("IV must be one cipher block"));
        }
        self.ivec.copy_from_slice(ivec);
        Ok(())
    }

    pub fn decrypt_blocks(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        if input.len() % CBC_BLOCK_SIZE != 0 {
            return Err(AsdcpError::param("CBC input is not a whole number of blocks"));
        }
        for chunk in input.chunks_exact(CBC_BLOCK_SIZE) {
            let mut block = GenericArray::clone_from_slice(chunk);
            self.cipher.decrypt_block(&mut block);
            for (b, iv) in block.iter_mut().zip(self.ivec.iter()) {
                *b ^= iv;
            }
            self.ivec.copy_from_slice(chunk);
            out.extend_from_slice(&block);
        }
        Ok(())
    }
}

/// HMAC-SHA1 keyed with a value derived from the content key.
#[derive(Clone)]
pub struct HmacContext {
    mac: HmacSha1,
}

impl HmacContext {
    pub fn new(key: &[u8], label_set: LabelSetType) -> Result<Self> {
        check_key(key)?;
        let derived = match label_set {
            LabelSetType::Smpte => smpte_hmac_key(key),
            LabelSetType::Interop => interop_hmac_key(key),
            LabelSetType::Unknown => {
                return Err(AsdcpError::Crypto(
                    "cannot derive an HMAC key for an unknown label set".into(),
                ));
            }
        };
        let mac = <HmacSha1 as Mac>::new_from_slice(&derived)
            .map_err(|e| AsdcpError::Crypto(e.to_string()))?;
        Ok(HmacContext { mac })
    }

    pub fn compute(&self, parts: &[&[u8]]) -> [u8; HMAC_SIZE] {
        let mut mac = self.mac.clone();
        for part in parts {
            Mac::update(&mut mac, part);
        }
        let mut out = [0u8; HMAC_SIZE];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Constant-time comparison against a stored value.
    pub fn verify(&self, parts: &[&[u8]], expected: &[u8]) -> bool {
        let mut mac = self.mac.clone();
        for part in parts {
            Mac::update(&mut mac, part);
        }
        mac.verify_slice(expected).is_ok()
    }
}

/// FIPS 186-2 (change notice 1) generator with G built on the SHA-1 compression function.
fn fips186_generate(seed: &[u8], out: &mut [u8]) {
    let mut xkey = [0u8; FIPS186_SEED_LEN];
    let n = seed.len().min(FIPS186_SEED_LEN);
    xkey[..n].copy_from_slice(&seed[..n]);
    // seeds shorter than 160 bits are treated as 160 bits wide
    let b = n.max(HMAC_SIZE);

    for chunk in out.chunks_mut(HMAC_SIZE) {
        let mut state = SHA1_INIT;
        sha1::compress(&mut state, &[GenericArray::clone_from_slice(&xkey)]);
        let mut x = [0u8; HMAC_SIZE];
        for (dst, word) in x.chunks_exact_mut(4).zip(state.iter()) {
            dst.copy_from_slice(&word.to_be_bytes());
        }
        chunk.copy_from_slice(&x[..chunk.len()]);

        // XKEY = (1 + XKEY + x) mod 2^b
        let mut carry = 1u16;
        let mut xs = x.iter().rev();
        for byte in xkey[..b].iter_mut().rev() {
            let sum = *byte as u16 + xs.next().copied().unwrap_or(0) as u16 + carry;
            *byte = sum as u8;
            carry = sum >> 8;
        }
    }
}

fn smpte_hmac_key(key: &[u8]) -> [u8; KEY_LENGTH] {
    let mut rng_buf = [0u8; HMAC_SIZE * 2];
    fips186_generate(key, &mut rng_buf);
    let mut out = [0u8; KEY_LENGTH];
    out.copy_from_slice(&rng_buf[HMAC_SIZE..HMAC_SIZE + KEY_LENGTH]);
    out
}

fn interop_hmac_key(key: &[u8]) -> [u8; KEY_LENGTH] {
    let mut sha = Sha1::new();
    Digest::update(&mut sha, key);
    Digest::update(&mut sha, INTEROP_KEY_NONCE);
    let digest = sha.finalize();
    let mut out = [0u8; KEY_LENGTH];
    out.copy_from_slice(&digest[..KEY_LENGTH]);
    out
}

/// Encrypt one frame into an encrypted source value.
///
/// Layout: IV, encrypted check value, plaintext prefix, CBC ciphertext, one padded block.
pub fn encrypt_frame(
    plaintext: &[u8],
    plaintext_offset: usize,
    ctx: &mut AesEncContext,
) -> Result<Vec<u8>> {
    if plaintext_offset > plaintext.len() {
        return Err(AsdcpError::param(format!(
            "plaintext offset {plaintext_offset} exceeds frame size {}",
            plaintext.len()
        )));
    }
    let ct_size = plaintext.len() - plaintext_offset;
    let diff = ct_size % CBC_BLOCK_SIZE;
    let block_end = plaintext.len() - diff;

    let mut out = Vec::with_capacity(calc_esv_length(plaintext.len(), plaintext_offset));
    out.extend_from_slice(ctx.ivec());
    ctx.encrypt_blocks(&ESV_CHECK_VALUE, &mut out)?;
    out.extend_from_slice(&plaintext[..plaintext_offset]);
    ctx.encrypt_blocks(&plaintext[plaintext_offset..block_end], &mut out)?;

    let mut last = [0u8; CBC_BLOCK_SIZE];
    last[..diff].copy_from_slice(&plaintext[block_end..]);
    for (i, pad) in last[diff..].iter_mut().enumerate() {
        *pad = i as u8;
    }
    ctx.encrypt_blocks(&last, &mut out)?;
    Ok(out)
}

/// Reverse [`encrypt_frame`], returning exactly `source_length` plaintext bytes.
pub fn decrypt_frame(
    esv: &[u8],
    source_length: usize,
    plaintext_offset: usize,
    ctx: &mut AesDecContext,
) -> Result<Vec<u8>> {
    if plaintext_offset > source_length {
        return Err(AsdcpError::format("plaintext offset exceeds source length"));
    }
    let expected = calc_esv_length(source_length, plaintext_offset);
    if esv.len() != expected {
        return Err(AsdcpError::format(format!(
            "encrypted value is {} bytes, expected {expected}",
            esv.len()
        )));
    }

    ctx.set_ivec(&esv[..CBC_BLOCK_SIZE])?;
    let mut check = Vec::with_capacity(CBC_BLOCK_SIZE);
    ctx.decrypt_blocks(&esv[CBC_BLOCK_SIZE..CBC_BLOCK_SIZE * 2], &mut check)?;
    if check != ESV_CHECK_VALUE {
        return Err(AsdcpError::CheckValue);
    }

    let ct_size = source_length - plaintext_offset;
    let diff = ct_size % CBC_BLOCK_SIZE;
    let block_size = ct_size - diff;

    let mut out = Vec::with_capacity(source_length + CBC_BLOCK_SIZE);
    let mut pos = CBC_BLOCK_SIZE * 2;
    out.extend_from_slice(&esv[pos..pos + plaintext_offset]);
    pos += plaintext_offset;
    ctx.decrypt_blocks(&esv[pos..pos + block_size], &mut out)?;
    pos += block_size;

    let mut last = Vec::with_capacity(CBC_BLOCK_SIZE);
    ctx.decrypt_blocks(&esv[pos..pos + CBC_BLOCK_SIZE], &mut last)?;
    if last[diff] != 0 {
        return Err(AsdcpError::format("unexpected non-zero padding value"));
    }
    out.extend_from_slice(&last[..diff]);
    Ok(out)
}

fn push_ber4(out: &mut Vec<u8>, len: u8) {
    out.extend_from_slice(&[0x83, 0, 0, len]);
}

/// Build the integrity pack for one encrypted frame.
pub fn calc_integrity_pack(
    esv: &[u8],
    asset_uuid: &Uuid,
    sequence: u64,
    hmac: &HmacContext,
) -> Vec<u8> {
    let mut pack = Vec::with_capacity(KLV_INTPACK_SIZE);
    push_ber4(&mut pack, UUID_LENGTH as u8);
    pack.extend_from_slice(asset_uuid.as_bytes());
    push_ber4(&mut pack, 8);
    pack.extend_from_slice(&sequence.to_be_bytes());
    push_ber4(&mut pack, HMAC_SIZE as u8);
    let mac = hmac.compute(&[esv, &pack]);
    pack.extend_from_slice(&mac);
    pack
}

/// Check a stored integrity pack against the ESV it follows.
pub fn test_integrity_pack(
    esv: &[u8],
    pack: &[u8],
    asset_uuid: &Uuid,
    sequence: u64,
    hmac: &HmacContext,
) -> Result<()> {
    if pack.len() != KLV_INTPACK_SIZE {
        return Err(AsdcpError::Integrity(format!(
            "integrity pack is {} bytes, expected {KLV_INTPACK_SIZE}",
            pack.len()
        )));
    }
    if pack[..4] != [0x83, 0, 0, UUID_LENGTH as u8] {
        return Err(AsdcpError::Integrity("unexpected UUID length in pack".into()));
    }
    if &pack[4..20] != asset_uuid.as_bytes() {
        return Err(AsdcpError::Integrity("incorrect TrackFileID".into()));
    }
    if pack[20..24] != [0x83, 0, 0, 8] {
        return Err(AsdcpError::Integrity("unexpected sequence length in pack".into()));
    }
    let mut seq = [0u8; 8];
    seq.copy_from_slice(&pack[24..32]);
    let found = u64::from_be_bytes(seq);
    if found != sequence {
        return Err(AsdcpError::Integrity(format!(
            "incorrect sequence number: expected {sequence}, found {found}"
        )));
    }
    if pack[32..36] != [0x83, 0, 0, HMAC_SIZE as u8] {
        return Err(AsdcpError::Integrity("unexpected HMAC length in pack".into()));
    }
    if !hmac.verify(&[esv, &pack[..36]], &pack[36..]) {
        return Err(AsdcpError::Integrity("HMAC mismatch".into()));
    }
    Ok(())
}
