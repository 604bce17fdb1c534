//! Structured Reference String (SRS) loading and validation.
//!
//! Adapted from the teacher's `srs_setup.rs`: same four-layer validation
//! discipline (deserialize, degree check, generator check, point validity),
//! but the SRS is carried as an explicit [`Srs`] value threaded through
//! `pcs.rs` rather than installed into a process-global `Mutex<OnceLock>` —
//! a prover and verifier in the same process may legitimately want SRS
//! instances of different sizes, and a global singleton can't express that.
//! See `DESIGN.md` for the full rationale.

#![forbid(unsafe_code)]

use std::path::Path;

use ark_bn254::{Bn254, G1Affine, G2Affine};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_serialize::CanonicalDeserialize;
use thiserror::Error;

const PTAU_MAGIC: &[u8; 4] = b"PTAU";
const PTAU_VERSION: u32 = 1;
const SECTION_G1_POWERS: u32 = 1;
const SECTION_G2_TAU: u32 = 2;

/// Errors loading or validating an [`Srs`].
#[derive(Debug, Error)]
pub enum SrsError {
    #[error("I/O error reading SRS file: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad .ptau magic: expected {expected:?}, got {got:?}")]
    BadMagic { expected: [u8; 4], got: [u8; 4] },
    #[error("unsupported .ptau version {0}")]
    UnsupportedVersion(u32),
    #[error("truncated .ptau file: {0}")]
    Truncated(&'static str),
    #[error("missing required section {0}")]
    MissingSection(u32),
    #[error("failed to deserialize G1 powers section: {0}")]
    BadG1Section(String),
    #[error("failed to deserialize G2 tau section: {0}")]
    BadG2Section(String),
    #[error("SRS has {available} powers, need at least {needed} for degree {degree}")]
    TooFewPowers { available: usize, needed: usize, degree: usize },
    #[error("G1 SRS's first element is not the generator")]
    NotGenerator,
    #[error("tau*G2 is the point at infinity")]
    ZeroTauG2,
}

/// A loaded (or generated) KZG structured reference string.
#[derive(Debug, Clone)]
pub struct Srs {
    /// `[τ⁰]₁, [τ¹]₁, …, [τᵈ]₁` — the `d+1` G1 powers committing polynomials
    /// up to degree `d` use.
    pub g1_powers: Vec<G1Affine>,
    /// `[τ]₂`, used by the verifier's pairing check.
    pub tau_g2: G2Affine,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], SrsError> {
        if self.pos + n > self.bytes.len() {
            return Err(SrsError::Truncated(what));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u32(&mut self, what: &'static str) -> Result<u32, SrsError> {
        let b = self.take(4, what)?;
        Ok(u32::from_le_bytes(b.try_into().unwrap()))
    }

    fn take_u64(&mut self, what: &'static str) -> Result<u64, SrsError> {
        let b = self.take(8, what)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }
}

impl Srs {
    /// Load a `.ptau`-style SRS: a 4-byte magic, a u32 version, a u32 section
    /// count, then that many `(section_id: u32, len: u64, payload)` records.
    /// Section 1 holds arkworks-compressed `Vec<G1Affine>` powers of tau;
    /// section 2 holds a compressed `G2Affine` for `[τ]₂`.
    pub fn load_ptau(path: impl AsRef<Path>, max_degree: usize) -> Result<Self, SrsError> {
        let bytes = std::fs::read(path)?;
        Self::from_ptau_bytes(&bytes, max_degree)
    }

    fn from_ptau_bytes(bytes: &[u8], max_degree: usize) -> Result<Self, SrsError> {
        let mut cur = Cursor::new(bytes);

        let magic: [u8; 4] = cur.take(4, "magic")?.try_into().unwrap();
        if &magic != PTAU_MAGIC {
            return Err(SrsError::BadMagic { expected: *PTAU_MAGIC, got: magic });
        }
        let version = cur.take_u32("version")?;
        if version != PTAU_VERSION {
            return Err(SrsError::UnsupportedVersion(version));
        }
        let section_count = cur.take_u32("section count")?;

        let mut g1_section: Option<&[u8]> = None;
        let mut g2_section: Option<&[u8]> = None;
        for _ in 0..section_count {
            let id = cur.take_u32("section id")?;
            let len = cur.take_u64("section length")? as usize;
            let payload = cur.take(len, "section payload")?;
            match id {
                SECTION_G1_POWERS => g1_section = Some(payload),
                SECTION_G2_TAU => g2_section = Some(payload),
                _ => {}
            }
        }

        let g1_bytes = g1_section.ok_or(SrsError::MissingSection(SECTION_G1_POWERS))?;
        let g2_bytes = g2_section.ok_or(SrsError::MissingSection(SECTION_G2_TAU))?;

        let g1_powers: Vec<G1Affine> =
            CanonicalDeserialize::deserialize_compressed(g1_bytes)
                .map_err(|e| SrsError::BadG1Section(e.to_string()))?;
        let tau_g2: G2Affine = CanonicalDeserialize::deserialize_compressed(g2_bytes)
            .map_err(|e| SrsError::BadG2Section(e.to_string()))?;

        Self::validate(g1_powers, tau_g2, max_degree)
    }

    fn validate(
        g1_powers: Vec<G1Affine>,
        tau_g2: G2Affine,
        max_degree: usize,
    ) -> Result<Self, SrsError> {
        if g1_powers.len() < max_degree + 1 {
            return Err(SrsError::TooFewPowers {
                available: g1_powers.len(),
                needed: max_degree + 1,
                degree: max_degree,
            });
        }
        let g1_gen = <Bn254 as Pairing>::G1::generator();
        if g1_powers[0] != g1_gen {
            return Err(SrsError::NotGenerator);
        }
        if tau_g2.is_zero() {
            return Err(SrsError::ZeroTauG2);
        }
        Ok(Srs { g1_powers, tau_g2 })
    }

    /// Truncate to the first `degree + 1` powers, for a smaller commitment.
    pub fn restrict(&self, degree: usize) -> Self {
        Self {
            g1_powers: self.g1_powers[..=degree.min(self.g1_powers.len() - 1)].to_vec(),
            tau_g2: self.tau_g2,
        }
    }

    /// Highest polynomial degree this SRS can commit to.
    pub fn max_degree(&self) -> usize {
        self.g1_powers.len() - 1
    }
}

/// Generate a deterministic development SRS with a **publicly known** secret.
/// Mirrors the teacher's `generate_dev_srs`: fixed seed, τ is not secret.
/// Only ever for test fixtures — never for anything whose proofs must bind.
#[cfg(feature = "dev-srs")]
pub fn generate_dev_srs(degree: usize) -> Srs {
    use ark_ec::Group;
    use ark_ff::{One, UniformRand};
    use ark_bn254::{Fr, G1Projective, G2Projective};
    use rand::{rngs::StdRng, SeedableRng};

    let mut rng = StdRng::from_seed([42u8; 32]);
    let tau: Fr = Fr::rand(&mut rng);

    let g1_gen = G1Projective::generator();
    let g2_gen = G2Projective::generator();

    let mut g1_powers = Vec::with_capacity(degree + 1);
    let mut tau_pow = Fr::one();
    for _ in 0..=degree {
        g1_powers.push((g1_gen * tau_pow).into_affine());
        tau_pow *= tau;
    }
    let tau_g2 = (g2_gen * tau).into_affine();

    Srs { g1_powers, tau_g2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_serialize::CanonicalSerialize;

    fn write_ptau(g1: &[G1Affine], g2: G2Affine) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(PTAU_MAGIC);
        out.extend_from_slice(&PTAU_VERSION.to_le_bytes());
        out.extend_from_slice(&2u32.to_le_bytes());

        let mut g1_bytes = Vec::new();
        g1.to_vec().serialize_compressed(&mut g1_bytes).unwrap();
        out.extend_from_slice(&SECTION_G1_POWERS.to_le_bytes());
        out.extend_from_slice(&(g1_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&g1_bytes);

        let mut g2_bytes = Vec::new();
        g2.serialize_compressed(&mut g2_bytes).unwrap();
        out.extend_from_slice(&SECTION_G2_TAU.to_le_bytes());
        out.extend_from_slice(&(g2_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&g2_bytes);

        out
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn round_trips_through_the_ptau_container() {
        let srs = generate_dev_srs(8);
        let bytes = write_ptau(&srs.g1_powers, srs.tau_g2);
        let loaded = Srs::from_ptau_bytes(&bytes, 8).unwrap();
        assert_eq!(loaded.g1_powers, srs.g1_powers);
        assert_eq!(loaded.tau_g2, srs.tau_g2);
    }

    #[test]
    fn rejects_bad_magic() {
        let bytes = b"NOPE0000".to_vec();
        let err = Srs::from_ptau_bytes(&bytes, 1).unwrap_err();
        assert!(matches!(err, SrsError::BadMagic { .. }));
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn rejects_insufficient_degree() {
        let srs = generate_dev_srs(4);
        let bytes = write_ptau(&srs.g1_powers, srs.tau_g2);
        let err = Srs::from_ptau_bytes(&bytes, 16).unwrap_err();
        assert!(matches!(err, SrsError::TooFewPowers { .. }));
    }
}
