//! FP16x16 sign-magnitude fixed-point base type
//!
//! Ported from `FP16x16Base` in the original Python/Cairo-flavored toolkit
//! this crate's asymmetric arithmetization mode is distilled from: a
//! magnitude/sign pair at a fixed scale of `2^16`, with transcendentals
//! implemented via range reduction, a small integer lookup table for the
//! exponent step of `exp2`, and the exact minimax polynomial coefficients
//! the original uses for the fractional remainder.
//!
//! Unlike the original's host language, Rust has native bit-scan primitives,
//! so the `msb` lookup table is replaced here with `u32::BITS - leading_zeros`
//! (a computed equivalent, not a behavioral change — see `DESIGN.md`).

#![allow(clippy::excessive_precision)]

use thiserror::Error;

/// `2^16`: the fixed-point scale.
pub const ONE: u64 = 1 << 16;
const HALF: u64 = 1 << 15;
const TWO: u64 = 1 << 17;
/// Magnitudes must stay below this bound.
pub const MAG_MAX: u64 = 1 << 31;
/// Sentinel magnitude used to encode `+-infinity`.
pub const INF_MAG: u64 = u32::MAX as u64;

const TWO_PI: u64 = 411775;
const PI: u64 = 205887;
const HALF_PI: u64 = 102944;

/// Errors raised constructing or operating on a fixed-point value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FixedPointError {
    #[error("fixed-point magnitude must be non-negative and below 2^31 (got {0})")]
    InvalidMagnitude(u64),
    #[error("operation undefined on a negative operand")]
    RequiresNonNegative,
    #[error("division by zero")]
    DivisionByZero,
}

/// Sign-magnitude fixed-point number at scale `2^16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fp16x16 {
    mag: u64,
    sign: bool,
}

impl Fp16x16 {
    /// Construct from an already-scaled magnitude and sign.
    pub fn try_new(mag: u64, sign: bool) -> Result<Self, FixedPointError> {
        if mag >= MAG_MAX {
            return Err(FixedPointError::InvalidMagnitude(mag));
        }
        Ok(Self { mag, sign })
    }

    /// Construct from an already-scaled magnitude and sign, panicking on an
    /// out-of-range magnitude. Mirrors the original's unchecked constructor
    /// paths used internally once a value is known to be in range.
    pub fn new(mag: u64, sign: bool) -> Self {
        Self::try_new(mag, sign).expect("invalid fixed-point magnitude")
    }

    /// Construct from an unscaled integer, applying the `2^16` scale.
    pub fn new_unscaled(mag: u64, sign: bool) -> Self {
        Self::new(mag * ONE, sign)
    }

    /// `0`.
    pub fn zero() -> Self {
        Self { mag: 0, sign: false }
    }
    /// `1`.
    pub fn one() -> Self {
        Self { mag: ONE, sign: false }
    }
    /// `0.5`.
    pub fn half() -> Self {
        Self { mag: HALF, sign: false }
    }
    /// Sentinel NaN: zero magnitude with the sign bit set.
    pub fn nan() -> Self {
        Self { mag: 0, sign: true }
    }
    /// `+infinity`.
    pub fn pos_inf() -> Self {
        Self { mag: INF_MAG, sign: false }
    }
    /// `-infinity`.
    pub fn neg_inf() -> Self {
        Self { mag: INF_MAG, sign: true }
    }
    /// Whether this is the [`Fp16x16::nan`] sentinel.
    pub fn is_nan(&self) -> bool {
        self.mag == 0 && self.sign
    }
    /// Whether this is `+/-infinity`.
    pub fn is_inf(&self) -> bool {
        self.mag == INF_MAG
    }

    /// The raw scaled magnitude, sign stripped.
    pub fn magnitude(&self) -> u64 {
        self.mag
    }
    /// Whether this value is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.sign && self.mag != 0
    }

    /// Quantize a host float into fixed-point (round-half-away-from-zero).
    pub fn quantize(value: f64) -> Self {
        let sign = value < 0.0;
        let mag = (value.abs() * ONE as f64).round() as u64;
        Self::new(mag.min(MAG_MAX - 1), sign)
    }

    /// Dequantize back to a host float.
    pub fn dequantize(&self) -> f64 {
        let v = self.mag as f64 / ONE as f64;
        if self.sign {
            -v
        } else {
            v
        }
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Self { mag: self.mag, sign: false }
    }

    /// Negation (zero stays positive).
    pub fn neg(&self) -> Self {
        if self.mag == 0 {
            *self
        } else {
            Self { mag: self.mag, sign: !self.sign }
        }
    }

    /// Sign-magnitude addition.
    pub fn add(&self, other: &Self) -> Self {
        if self.sign == other.sign {
            return Self::new(self.mag + other.mag, self.sign);
        }
        if self.mag == other.mag {
            return Self::zero();
        }
        if self.mag > other.mag {
            Self::new(self.mag - other.mag, self.sign)
        } else {
            Self::new(other.mag - self.mag, other.sign)
        }
    }

    /// Sign-magnitude subtraction.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.neg())
    }

    /// Fixed-point multiplication: widen to `u128`, multiply, rescale.
    pub fn mul(&self, other: &Self) -> Self {
        let prod = ((self.mag as u128) * (other.mag as u128) / ONE as u128) as u64;
        Self::new(prod, self.sign != other.sign)
    }

    /// Fixed-point division; errors on a zero divisor.
    pub fn div(&self, other: &Self) -> Result<Self, FixedPointError> {
        if other.mag == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let dividend = (self.mag as u128) * (ONE as u128);
        let quotient = (dividend / other.mag as u128) as u64;
        Ok(Self::new(quotient, self.sign != other.sign))
    }

    /// Round half away from zero to the nearest integer.
    pub fn round(&self) -> Self {
        let div = self.mag / ONE;
        let rem = self.mag % ONE;
        if rem >= HALF {
            Self::new_unscaled(div + 1, self.sign)
        } else {
            Self::new_unscaled(div, self.sign)
        }
    }

    /// Round toward negative infinity.
    pub fn floor(&self) -> Self {
        let div = self.mag / ONE;
        let rem = self.mag % ONE;
        if rem == 0 {
            *self
        } else if !self.sign {
            Self::new_unscaled(div, false)
        } else {
            Self::new_unscaled(div + 1, true)
        }
    }

    /// Round toward positive infinity.
    pub fn ceil(&self) -> Self {
        let div = self.mag / ONE;
        let rem = self.mag % ONE;
        if rem == 0 {
            *self
        } else if !self.sign {
            Self::new_unscaled(div + 1, false)
        } else if div == 0 {
            Self::new_unscaled(0, false)
        } else {
            Self::new_unscaled(div, true)
        }
    }

    /// Square root; errors on a negative operand.
    pub fn sqrt(&self) -> Result<Self, FixedPointError> {
        if self.sign {
            return Err(FixedPointError::RequiresNonNegative);
        }
        let root = (((self.mag as u128) * ONE as u128) as f64).sqrt() as u64;
        Ok(Self::new(root, false))
    }

    // ---------------------------------------------------------------
    // Transcendentals: exponential / logarithmic
    // ---------------------------------------------------------------

    /// 2^int for int in 0..31, scaled to fixed-point. A direct computed
    /// equivalent of the original's `exp2_lut` table.
    fn exp2_int_lut(exp: u64) -> u64 {
        debug_assert!(exp < 32);
        1u64 << exp
    }

    /// `2^self` via integer part lookup and a minimax polynomial for the
    /// fractional remainder.
    pub fn exp2(&self) -> Self {
        if self.mag == 0 {
            return Self::one();
        }
        let int_part = self.mag / ONE;
        let frac_part = self.mag % ONE;
        let int_res = Self::new_unscaled(Self::exp2_int_lut(int_part), false);
        let mut res = int_res;

        if frac_part != 0 {
            let frac = Self::new(frac_part, false);
            let r7 = Self::new(1, false).mul(&frac);
            let r6 = r7.add(&Self::new(10, false)).mul(&frac);
            let r5 = r6.add(&Self::new(87, false)).mul(&frac);
            let r4 = r5.add(&Self::new(630, false)).mul(&frac);
            let r3 = r4.add(&Self::new(3638, false)).mul(&frac);
            let r2 = r3.add(&Self::new(15743, false)).mul(&frac);
            let r1 = r2.add(&Self::new(45426, false)).mul(&frac);
            res = res.mul(&r1.add(&Self::one()));
        }

        if self.sign {
            Self::one().div(&res).expect("exp2 result is never zero")
        } else {
            res
        }
    }

    /// `e^self`, via `exp2(self * log2(e))`.
    pub fn exp(&self) -> Self {
        let log2_e = Self::new(94548, false);
        log2_e.mul(self).exp2()
    }

    fn msb(whole: u64) -> (u32, u64) {
        debug_assert!(whole > 0);
        let msb = 63 - whole.leading_zeros();
        (msb, 1u64 << msb)
    }

    /// Base-2 logarithm via range reduction to `[1, 2)` plus a minimax
    /// polynomial; errors on a negative operand.
    pub fn log2(&self) -> Result<Self, FixedPointError> {
        if self.sign {
            return Err(FixedPointError::RequiresNonNegative);
        }
        if self.mag == ONE {
            return Ok(Self::zero());
        }
        if self.mag < ONE {
            let inv = Self::one().div(self).expect("self != 0 here");
            return Ok(inv.log2()?.neg());
        }
        let whole = self.mag / ONE;
        let (msb, div) = Self::msb(whole);
        if self.mag == div * ONE {
            return Ok(Self::new_unscaled(msb as u64, false));
        }
        let norm = self.div(&Self::new_unscaled(div, false)).expect("div != 0");
        let r8 = Self::new(596, true).mul(&norm);
        let r7 = r8.add(&Self::new(8116, false)).mul(&norm);
        let r6 = r7.add(&Self::new(49044, true)).mul(&norm);
        let r5 = r6.add(&Self::new(172935, false)).mul(&norm);
        let r4 = r5.add(&Self::new(394096, true)).mul(&norm);
        let r3 = r4.add(&Self::new(608566, false)).mul(&norm);
        let r2 = r3.add(&Self::new(655828, true)).mul(&norm);
        let r1 = r2.add(&Self::new(534433, false)).mul(&norm);
        Ok(r1.add(&Self::new(224487, true)).add(&Self::new_unscaled(msb as u64, false)))
    }

    /// Natural logarithm, via `log2(self) * ln(2)`.
    pub fn ln(&self) -> Result<Self, FixedPointError> {
        Ok(self.log2()?.mul(&Self::new(45426, false)))
    }

    /// Base-10 logarithm, via `log2(self) * log10(2)`.
    pub fn log10(&self) -> Result<Self, FixedPointError> {
        Ok(self.log2()?.mul(&Self::new(19728, false)))
    }

    /// `self^n` for an unsigned integer exponent via square-and-multiply.
    pub fn pow_int(&self, mut n: u64, exp_sign: bool) -> Self {
        let mut x = *self;
        if exp_sign {
            x = Self::one().div(&x).expect("pow_int base must be non-zero for negative exponent");
        }
        if n == 0 {
            return Self::one();
        }
        let mut y = Self::one();
        while n > 1 {
            if n % 2 == 1 {
                y = x.mul(&y);
            }
            x = x.mul(&x);
            n /= 2;
        }
        x.mul(&y)
    }

    /// `self^other`; routes to the integer fast path when `other` has no
    /// fractional part, else evaluates `exp(other * ln(self))`.
    pub fn pow(&self, other: &Self) -> Result<Self, FixedPointError> {
        let rem = other.mag % ONE;
        if rem == 0 {
            return Ok(self.pow_int(other.mag / ONE, other.sign));
        }
        Ok(other.mul(&self.ln()?).exp())
    }

    // ---------------------------------------------------------------
    // Trigonometric
    // ---------------------------------------------------------------

    fn sin_loop(a: Self, i: i32, acc: Self) -> Self {
        let div = ((2 * i + 2) * (2 * i + 3)) as u64;
        let term = a.mul(&a).mul(&acc).div(&Self::new_unscaled(div, false)).expect("div != 0");
        let new_acc = Self::one().sub(&term);
        if i == 0 {
            new_acc
        } else {
            Self::sin_loop(a, i - 1, new_acc)
        }
    }

    /// Sine, via range reduction mod `2*pi` and a Taylor-series recurrence.
    pub fn sin(&self) -> Self {
        let a1 = self.mag % TWO_PI;
        let whole_rem = a1 / PI;
        let partial_rem = a1 % PI;
        let a2 = Self::new(partial_rem, false);
        let partial_sign = whole_rem == 1;
        let loop_res = a2.mul(&Self::sin_loop(a2, 7, Self::one()));
        Self::new(loop_res.mag, self.sign != partial_sign && loop_res.mag != 0)
    }

    /// Cosine, via `sin(pi/2 - self)`.
    pub fn cos(&self) -> Self {
        Self::new(HALF_PI, false).sub(self).sin()
    }

    /// Tangent, via `sin/cos`; errors if `cos(self)` is zero.
    pub fn tan(&self) -> Result<Self, FixedPointError> {
        let sinx = self.sin();
        let cosx = self.cos();
        sinx.div(&cosx)
    }

    /// Arctangent, via range reduction and a minimax polynomial.
    pub fn atan(&self) -> Self {
        let mut at = self.abs();
        let mut shift = false;
        let mut invert = false;

        if at.mag > ONE {
            at = Self::one().div(&at).expect("at != 0");
            invert = true;
        }
        if at.mag > 45875 {
            let sqrt3_3 = Self::new(37837, false);
            at = at.sub(&sqrt3_3).div(&Self::one().add(&at.mul(&sqrt3_3))).expect("denominator != 0");
            shift = true;
        }

        let r10 = Self::new(120, true).mul(&at);
        let r9 = r10.add(&Self::new(3066, true)).mul(&at);
        let r8 = r9.add(&Self::new(12727, false)).mul(&at);
        let r7 = r8.add(&Self::new(17170, true)).mul(&at);
        let r6 = r7.add(&Self::new(2865, false)).mul(&at);
        let r5 = r6.add(&Self::new(12456, false)).mul(&at);
        let r4 = r5.add(&Self::new(90, false)).mul(&at);
        let r3 = r4.add(&Self::new(21852, true)).mul(&at);
        let r2 = r3.mul(&at);
        let mut res = r2.add(&Self::new(65536, false)).mul(&at);

        if shift {
            res = res.add(&Self::new(34315, false));
        }
        if invert {
            res = res.sub(&Self::new(HALF_PI, false));
        }
        Self::new(res.mag, self.sign)
    }

    /// Arcsine, via `atan(self / sqrt(1 - self^2))`.
    pub fn asin(&self) -> Result<Self, FixedPointError> {
        if self.mag == ONE {
            return Ok(Self::new(HALF_PI, self.sign));
        }
        let div = Self::one().sub(&self.mul(self)).sqrt()?;
        Ok(self.div(&div)?.atan())
    }

    /// Arccosine, via the asin identity with a sign-dependent pi shift.
    pub fn acos(&self) -> Result<Self, FixedPointError> {
        let asin_arg = Self::one().sub(&self.mul(self)).sqrt()?;
        let asin_res = asin_arg.asin()?;
        if self.sign {
            Ok(Self::new(PI, false).sub(&asin_res))
        } else {
            Ok(asin_res)
        }
    }

    // ---------------------------------------------------------------
    // Hyperbolic
    // ---------------------------------------------------------------

    /// Hyperbolic sine, via `(e^x - e^-x) / 2`.
    pub fn sinh(&self) -> Self {
        let ea = self.exp();
        let inv = Self::one().div(&ea).expect("exp never zero");
        ea.sub(&inv).div(&Self::new(TWO, false)).expect("2 != 0")
    }

    /// Hyperbolic cosine, via `(e^x + e^-x) / 2`.
    pub fn cosh(&self) -> Self {
        let ea = self.exp();
        let inv = Self::one().div(&ea).expect("exp never zero");
        ea.add(&inv).div(&Self::new(TWO, false)).expect("2 != 0")
    }

    /// Hyperbolic tangent, via `(e^2x - 1) / (e^2x + 1)` rearranged to reuse
    /// a single `exp` call.
    pub fn tanh(&self) -> Self {
        let ea = self.exp();
        let inv = Self::one().div(&ea).expect("exp never zero");
        ea.sub(&inv).div(&ea.add(&inv)).expect("ea + 1/ea != 0")
    }

    // ---------------------------------------------------------------
    // Comparisons
    // ---------------------------------------------------------------

    /// Sign-aware total ordering.
    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        if self.sign != other.sign {
            return if self.sign { Ordering::Less } else { Ordering::Greater };
        }
        let mag_cmp = self.mag.cmp(&other.mag);
        if self.sign {
            mag_cmp.reverse()
        } else {
            mag_cmp
        }
    }
}

impl PartialOrd for Fp16x16 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Fp16x16 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.compare(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_cannot_be_negative_range() {
        assert_eq!(
            Fp16x16::try_new(MAG_MAX, false),
            Err(FixedPointError::InvalidMagnitude(MAG_MAX))
        );
    }

    #[test]
    fn add_same_sign() {
        let a = Fp16x16::new_unscaled(1, false);
        let b = Fp16x16::new_unscaled(2, false);
        assert_eq!(a.add(&b), Fp16x16::new_unscaled(3, false));
    }

    #[test]
    fn add_opposite_sign() {
        let a = Fp16x16::new_unscaled(5, false);
        let b = Fp16x16::new_unscaled(2, true);
        assert_eq!(a.add(&b), Fp16x16::new_unscaled(3, false));
    }

    #[test]
    fn mul_sign_xor() {
        let a = Fp16x16::new_unscaled(3, false);
        let b = Fp16x16::new_unscaled(2, true);
        assert_eq!(a.mul(&b), Fp16x16::new_unscaled(6, true));
    }

    #[test]
    fn quantize_dequantize_roundtrip() {
        let x = 3.25_f64;
        let q = Fp16x16::quantize(x);
        assert!((q.dequantize() - x).abs() < 1.0 / ONE as f64);
    }

    #[test]
    fn div_by_zero_errors() {
        let a = Fp16x16::new_unscaled(1, false);
        assert_eq!(a.div(&Fp16x16::zero()), Err(FixedPointError::DivisionByZero));
    }

    #[test]
    fn exp2_integer() {
        let three = Fp16x16::new_unscaled(3, false);
        let res = three.exp2();
        assert_eq!(res.dequantize().round() as i64, 8);
    }

    #[test]
    fn pow_int_matches_repeated_mul() {
        let base = Fp16x16::new_unscaled(2, false);
        let cubed = base.pow_int(3, false);
        assert_eq!(cubed, Fp16x16::new_unscaled(8, false));
    }

    #[test]
    fn comparisons_respect_sign() {
        let neg = Fp16x16::new_unscaled(5, true);
        let pos = Fp16x16::new_unscaled(1, false);
        assert!(neg < pos);
    }
}
