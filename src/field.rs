//! Modular field layer with three interchangeable arithmetization modes
//!
//! [`FieldElement`] is a tagged-variant enum: every arithmetic operation
//! dispatches on the active variant instead of going through process-wide
//! free-function rebinding. This resolves the Design Notes' instruction
//! (spec.md §9) to replace "dynamic rebinding of free functions" with "a
//! tagged-variant field element whose operations dispatch on the variant."
//!
//! A thread-local [`ActiveMode`] exists *only* to tell the DAG's literal
//! constructor (`dag::Value::new`) which mode to quantize a bare `f64`
//! into — the one place the original toolkit reads process-wide state.
//! Arithmetic between two already-built `FieldElement`s never consults it.

use std::cell::Cell;

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, UniformRand, Zero};
use thiserror::Error;

use crate::fixed_point::{Fp16x16, FixedPointError};

/// Precision used by the symmetric fixed-point mode (bits of scale).
pub const SYMMETRIC_PRECISION_BITS: u32 = 64;
/// Precision used by the asymmetric fixed-point mode (bits of scale).
pub const ASYMMETRIC_PRECISION_BITS: u32 = 16;
/// Dequantized equality tolerance for the symmetric mode.
pub const SYMMETRIC_TOLERANCE: f64 = 1e-8;
/// Dequantized equality tolerance for the asymmetric mode.
pub const ASYMMETRIC_TOLERANCE: f64 = 1.0 / (1u64 << ASYMMETRIC_PRECISION_BITS) as f64;

/// Process-selectable arithmetization mode (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmetizationMode {
    Pure,
    FloatSymmetric,
    FloatAsymmetric,
}

impl Default for ArithmetizationMode {
    /// The original toolkit initializes process-wide state to
    /// `FLOAT_SYMMETRIC` at startup (spec.md §4.1).
    fn default() -> Self {
        ArithmetizationMode::FloatSymmetric
    }
}

thread_local! {
    static ACTIVE_MODE: Cell<ArithmetizationMode> = Cell::new(ArithmetizationMode::default());
}

/// Rebind the thread-local default mode consulted by literal construction.
///
/// Per spec.md §5, this must be confined to a single logical build: callers
/// should switch the mode and then build a fresh `dag::Graph` rather than
/// mutating the mode mid-build.
pub fn switch_arithmetization(mode: ArithmetizationMode) {
    ACTIVE_MODE.with(|m| m.set(mode));
}

/// Read the thread-local default mode.
pub fn active_mode() -> ArithmetizationMode {
    ACTIVE_MODE.with(|m| m.get())
}

/// Errors raised by field operations (spec.md §7 `ArithmetizationError`).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArithmetizationError {
    #[error("invalid quantization scale")]
    InvalidScale,
    #[error("negative magnitude not permitted in this context")]
    NegativeMagnitudeDisallowed,
    #[error("comparison of NaN is undefined")]
    NanCompared,
    #[error("comparison is undefined in PURE mode (residues have no sign)")]
    IncomparablePure,
    #[error("operands are in different arithmetization modes ({0:?} vs {1:?})")]
    ModeMismatch(ArithmetizationMode, ArithmetizationMode),
    #[error("division by zero")]
    DivisionByZero,
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}

/// A field element in the mode it was constructed under.
///
/// `Pure`/`FloatSymmetric` both store a raw `ark_bn254::Fr` residue; they
/// are kept as distinct variants (rather than collapsed into one `Fr`
/// case with a side mode tag) so that `mul`'s very different contracts —
/// true field multiplication for `Pure`, dequantize-multiply-requantize
/// for `FloatSymmetric` — are enforced by the match arm, not by an `if`
/// a future edit could silently drop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldElement {
    Pure(Fr),
    Symmetric(Fr),
    Asymmetric(Fp16x16),
}

impl FieldElement {
    /// Which arithmetization mode this element was built under.
    pub fn mode(&self) -> ArithmetizationMode {
        match self {
            FieldElement::Pure(_) => ArithmetizationMode::Pure,
            FieldElement::Symmetric(_) => ArithmetizationMode::FloatSymmetric,
            FieldElement::Asymmetric(_) => ArithmetizationMode::FloatAsymmetric,
        }
    }

    fn check_modes(&self, other: &Self) -> Result<(), ArithmetizationError> {
        if self.mode() != other.mode() {
            return Err(ArithmetizationError::ModeMismatch(self.mode(), other.mode()));
        }
        Ok(())
    }

    /// Quantize a host real into the given mode (spec.md §4.1).
    pub fn quantize(mode: ArithmetizationMode, value: f64) -> Self {
        match mode {
            ArithmetizationMode::Pure => {
                FieldElement::Pure(fr_from_signed_integer(value.round() as i128))
            }
            ArithmetizationMode::FloatSymmetric => {
                let scale = (1u128 << SYMMETRIC_PRECISION_BITS) as f64;
                let mag = (value.abs() * scale).round() as u128;
                let mut fr = Fr::from(mag);
                if value < 0.0 {
                    fr = -fr;
                }
                FieldElement::Symmetric(fr)
            }
            ArithmetizationMode::FloatAsymmetric => {
                FieldElement::Asymmetric(Fp16x16::quantize(value))
            }
        }
    }

    /// Quantize into the current thread-local active mode.
    pub fn quantize_active(value: f64) -> Self {
        Self::quantize(active_mode(), value)
    }

    /// Dequantize back to a host real (spec.md §3, §4.1).
    pub fn dequantize(&self) -> f64 {
        match self {
            FieldElement::Pure(fr) => fr_to_signed_f64(*fr),
            FieldElement::Symmetric(fr) => {
                let scale = (1u128 << SYMMETRIC_PRECISION_BITS) as f64;
                let (mag, neg) = symmetric_mag_sign(*fr);
                let v = mag as f64 / scale;
                if neg {
                    -v
                } else {
                    v
                }
            }
            FieldElement::Asymmetric(fp) => fp.dequantize(),
        }
    }

    /// The additive identity in `mode`.
    pub fn zero(mode: ArithmetizationMode) -> Self {
        Self::quantize(mode, 0.0)
    }

    /// The multiplicative identity in `mode`.
    pub fn one(mode: ArithmetizationMode) -> Self {
        Self::quantize(mode, 1.0)
    }

    /// Whether this element is the additive identity.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldElement::Pure(fr) | FieldElement::Symmetric(fr) => fr.is_zero(),
            FieldElement::Asymmetric(fp) => fp.magnitude() == 0,
        }
    }

    /// Addition; errors if `self` and `other` are in different modes.
    pub fn add(&self, other: &Self) -> Result<Self, ArithmetizationError> {
        self.check_modes(other)?;
        Ok(match (self, other) {
            (FieldElement::Pure(a), FieldElement::Pure(b)) => FieldElement::Pure(*a + b),
            (FieldElement::Symmetric(a), FieldElement::Symmetric(b)) => {
                FieldElement::Symmetric(*a + b)
            }
            (FieldElement::Asymmetric(a), FieldElement::Asymmetric(b)) => {
                FieldElement::Asymmetric(a.add(b))
            }
            _ => unreachable!("mode checked above"),
        })
    }

    /// Subtraction; errors if `self` and `other` are in different modes.
    pub fn sub(&self, other: &Self) -> Result<Self, ArithmetizationError> {
        self.add(&other.neg()?)
    }

    /// Additive inverse.
    pub fn neg(&self) -> Result<Self, ArithmetizationError> {
        Ok(match self {
            FieldElement::Pure(a) => FieldElement::Pure(-*a),
            FieldElement::Symmetric(a) => FieldElement::Symmetric(-*a),
            FieldElement::Asymmetric(a) => FieldElement::Asymmetric(a.neg()),
        })
    }

    /// Multiplication. **Contract preserved on purpose** (spec.md §9 Open
    /// Question): `FloatSymmetric` multiplication dequantizes both
    /// operands to `f64`, multiplies as host floats, and requantizes —
    /// it does *not* perform a true field multiplication. Two provers on
    /// different hardware executing the identical DAG can in principle
    /// produce differing field elements here; this crate reproduces the
    /// original behavior exactly rather than silently "fixing" it, per
    /// the spec's explicit instruction.
    pub fn mul(&self, other: &Self) -> Result<Self, ArithmetizationError> {
        self.check_modes(other)?;
        Ok(match (self, other) {
            (FieldElement::Pure(a), FieldElement::Pure(b)) => FieldElement::Pure(*a * b),
            (FieldElement::Symmetric(_), FieldElement::Symmetric(_)) => {
                let product = self.dequantize() * other.dequantize();
                FieldElement::quantize(ArithmetizationMode::FloatSymmetric, product)
            }
            (FieldElement::Asymmetric(a), FieldElement::Asymmetric(b)) => {
                FieldElement::Asymmetric(a.mul(b))
            }
            _ => unreachable!("mode checked above"),
        })
    }

    /// Division; errors on a zero divisor or a mode mismatch.
    pub fn div(&self, other: &Self) -> Result<Self, ArithmetizationError> {
        self.check_modes(other)?;
        Ok(match (self, other) {
            (FieldElement::Pure(a), FieldElement::Pure(b)) => {
                let inv = b.inverse().ok_or(ArithmetizationError::DivisionByZero)?;
                FieldElement::Pure(*a * inv)
            }
            (FieldElement::Symmetric(_), FieldElement::Symmetric(_)) => {
                if other.is_zero() {
                    return Err(ArithmetizationError::DivisionByZero);
                }
                let quotient = self.dequantize() / other.dequantize();
                FieldElement::quantize(ArithmetizationMode::FloatSymmetric, quotient)
            }
            (FieldElement::Asymmetric(a), FieldElement::Asymmetric(b)) => {
                FieldElement::Asymmetric(a.div(b)?)
            }
            _ => unreachable!("mode checked above"),
        })
    }

    /// Exponentiation by a signed integer (negative exponents invert first).
    pub fn pow(&self, exponent: i64) -> Result<Self, ArithmetizationError> {
        Ok(match self {
            FieldElement::Pure(a) => {
                if exponent < 0 {
                    let inv = a.inverse().ok_or(ArithmetizationError::DivisionByZero)?;
                    FieldElement::Pure(inv.pow([(-exponent) as u64]))
                } else {
                    FieldElement::Pure(a.pow([exponent as u64]))
                }
            }
            FieldElement::Symmetric(_) => {
                let value = self.dequantize().powi(exponent as i32);
                FieldElement::quantize(ArithmetizationMode::FloatSymmetric, value)
            }
            FieldElement::Asymmetric(a) => {
                let other = Fp16x16::new_unscaled(exponent.unsigned_abs(), exponent < 0);
                FieldElement::Asymmetric(a.pow(&other)?)
            }
        })
    }

    /// Ordering between two elements of the same mode (spec.md §4.1).
    /// `PURE` has no defined sign and always errors.
    pub fn compare(&self, other: &Self) -> Result<std::cmp::Ordering, ArithmetizationError> {
        self.check_modes(other)?;
        match (self, other) {
            (FieldElement::Pure(_), FieldElement::Pure(_)) => {
                Err(ArithmetizationError::IncomparablePure)
            }
            (FieldElement::Symmetric(_), FieldElement::Symmetric(_)) => {
                let a = self.dequantize();
                let b = other.dequantize();
                if a.is_nan() || b.is_nan() {
                    return Err(ArithmetizationError::NanCompared);
                }
                a.partial_cmp(&b).ok_or(ArithmetizationError::NanCompared)
            }
            (FieldElement::Asymmetric(a), FieldElement::Asymmetric(b)) => {
                if a.is_nan() || b.is_nan() {
                    return Err(ArithmetizationError::NanCompared);
                }
                Ok(a.compare(b))
            }
            _ => unreachable!("mode checked above"),
        }
    }

    /// Equality using each mode's dequantized tolerance (spec.md §4.1, §8).
    pub fn approx_eq(&self, other: &Self) -> bool {
        if self.mode() != other.mode() {
            return false;
        }
        match self.mode() {
            ArithmetizationMode::Pure => match (self, other) {
                (FieldElement::Pure(a), FieldElement::Pure(b)) => a == b,
                _ => unreachable!(),
            },
            ArithmetizationMode::FloatSymmetric => {
                (self.dequantize() - other.dequantize()).abs() < SYMMETRIC_TOLERANCE
            }
            ArithmetizationMode::FloatAsymmetric => {
                (self.dequantize() - other.dequantize()).abs() < ASYMMETRIC_TOLERANCE
            }
        }
    }

    /// A random element in the given mode, for tests and dev SRS-style uses.
    pub fn random(mode: ArithmetizationMode) -> Self {
        let mut rng = rand::thread_rng();
        match mode {
            ArithmetizationMode::Pure => FieldElement::Pure(Fr::rand(&mut rng)),
            ArithmetizationMode::FloatSymmetric => FieldElement::Symmetric(Fr::rand(&mut rng)),
            ArithmetizationMode::FloatAsymmetric => {
                use rand::Rng;
                FieldElement::Asymmetric(Fp16x16::new_unscaled(
                    rng.gen_range(0..(1u64 << 16)),
                    false,
                ))
            }
        }
    }

    /// The underlying BN254 scalar this element represents, used by the
    /// circuit/GKR layers which always compute over `Fr` regardless of mode
    /// (the layered circuit's wiring predicates are mode-agnostic; only
    /// `quantize`/`dequantize` at the DAG boundary are mode-specific).
    pub fn as_scalar(&self) -> Fr {
        match self {
            FieldElement::Pure(a) | FieldElement::Symmetric(a) => *a,
            FieldElement::Asymmetric(fp) => {
                let mag = Fr::from(fp.magnitude());
                if fp.is_negative() {
                    -mag
                } else {
                    mag
                }
            }
        }
    }
}

fn fr_from_signed_integer(v: i128) -> Fr {
    if v < 0 {
        -Fr::from((-v) as u128)
    } else {
        Fr::from(v as u128)
    }
}

fn fr_to_signed_f64(fr: Fr) -> f64 {
    let (mag, neg) = symmetric_mag_sign(fr);
    let v = mag as f64;
    if neg {
        -v
    } else {
        v
    }
}

/// Interpret an `Fr` residue as signed per spec.md §3: values greater than
/// `p/2` are negative, encoded as `p - |x|`.
fn symmetric_mag_sign(fr: Fr) -> (u128, bool) {
    let modulus = Fr::MODULUS;
    let half = {
        let mut h = modulus;
        h.div2();
        h
    };
    let repr = fr.into_bigint();
    if repr > half {
        let mag_repr = modulus.sub_with_borrow(&repr);
        (bigint_to_u128(&mag_repr), true)
    } else {
        (bigint_to_u128(&repr), false)
    }
}

fn bigint_to_u128(repr: &<Fr as PrimeField>::BigInt) -> u128 {
    let bytes = repr.to_bytes_le();
    let mut out = [0u8; 16];
    let n = bytes.len().min(16);
    out[..n].copy_from_slice(&bytes[..n]);
    u128::from_le_bytes(out)
}

/// Render `fr`'s canonical residue (always in `[0, p)`) as a decimal
/// string — the full-width counterpart to [`bigint_to_u128`], needed to
/// serialize a BN254 scalar (~254 bits) as a bare JSON integer the way
/// `expander_main.py`'s `int(value * SCALE_FACTOR) % PRIME_MOD` does.
pub(crate) fn fr_to_decimal_string(fr: Fr) -> String {
    let mut limbs = fr.into_bigint().to_bytes_le();
    if limbs.iter().all(|&b| b == 0) {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    loop {
        let mut remainder: u32 = 0;
        let mut any_nonzero = false;
        for byte in limbs.iter_mut().rev() {
            let acc = (remainder << 8) | *byte as u32;
            *byte = (acc / 10) as u8;
            remainder = acc % 10;
            any_nonzero |= *byte != 0;
        }
        digits.push(b'0' + remainder as u8);
        if !any_nonzero {
            break;
        }
    }
    digits.reverse();
    String::from_utf8(digits).expect("decimal digits are valid utf8")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_add_mul() {
        let a = FieldElement::quantize(ArithmetizationMode::Pure, 3.0);
        let b = FieldElement::quantize(ArithmetizationMode::Pure, 4.0);
        let c = a.mul(&b).unwrap();
        assert_eq!(c.dequantize(), 12.0);
    }

    #[test]
    fn pure_compare_is_undefined() {
        let a = FieldElement::quantize(ArithmetizationMode::Pure, 3.0);
        let b = FieldElement::quantize(ArithmetizationMode::Pure, 4.0);
        assert_eq!(a.compare(&b), Err(ArithmetizationError::IncomparablePure));
    }

    #[test]
    fn symmetric_quantize_dequantize_roundtrip() {
        let a = FieldElement::quantize(ArithmetizationMode::FloatSymmetric, -2.5);
        assert!((a.dequantize() - (-2.5)).abs() < SYMMETRIC_TOLERANCE);
    }

    #[test]
    fn symmetric_mul_matches_float_semantics() {
        let a = FieldElement::quantize(ArithmetizationMode::FloatSymmetric, 1.129);
        let b = FieldElement::quantize(ArithmetizationMode::FloatSymmetric, -100.12);
        let c = a.mul(&b).unwrap();
        assert!((c.dequantize() - (1.129 * -100.12)).abs() < 1e-4);
    }

    #[test]
    fn asymmetric_matches_fixed_point() {
        let a = FieldElement::quantize(ArithmetizationMode::FloatAsymmetric, 2.0);
        let b = FieldElement::quantize(ArithmetizationMode::FloatAsymmetric, 3.0);
        let c = a.mul(&b).unwrap();
        assert!((c.dequantize() - 6.0).abs() < ASYMMETRIC_TOLERANCE);
    }

    #[test]
    fn mode_mismatch_is_an_error() {
        let a = FieldElement::quantize(ArithmetizationMode::Pure, 1.0);
        let b = FieldElement::quantize(ArithmetizationMode::FloatSymmetric, 1.0);
        assert!(matches!(
            a.add(&b),
            Err(ArithmetizationError::ModeMismatch(_, _))
        ));
    }

    #[test]
    fn switch_arithmetization_changes_active_mode() {
        switch_arithmetization(ArithmetizationMode::Pure);
        assert_eq!(active_mode(), ArithmetizationMode::Pure);
        switch_arithmetization(ArithmetizationMode::FloatSymmetric);
        assert_eq!(active_mode(), ArithmetizationMode::FloatSymmetric);
    }
}
