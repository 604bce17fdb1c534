//! Dense univariate polynomials over BN254's scalar field.
//!
//! Circuit-facing polynomials in this crate are small (one per layer of a
//! layered circuit, or a lookup table/witness), so a specialized dense
//! vector representation is enough — no need to reach for `ark-poly`'s
//! generic machinery, matching the teacher's own `domain.rs` convention of
//! hand-rolled dense FFT/IFFT over a plain `Vec<F>`.

use thiserror::Error;

use crate::domain::{self, Domain};
use crate::F;

/// Which basis a [`Polynomial`]'s coefficients are expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Basis {
    /// `coeffs[i]` is the coefficient of `x^i`.
    Monomial,
    /// `coeffs[i]` is the evaluation at `domain.omega^i`; length must be a
    /// power of two.
    Lagrange,
}

/// Errors from polynomial arithmetic and basis conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolyError {
    #[error("division left a non-zero remainder")]
    NonZeroRemainder,
    #[error("division by the zero polynomial")]
    DivisionByZero,
    #[error("Lagrange-basis polynomials must have power-of-two length (got {0})")]
    NotPowerOfTwo(usize),
    #[error(transparent)]
    Domain(#[from] domain::DomainError),
}

/// A dense univariate polynomial, either in monomial or Lagrange-over-a-
/// domain basis (see [`Basis`]).
#[derive(Clone, Debug)]
pub struct Polynomial {
    /// Which basis `coeffs` is expressed in.
    pub basis: Basis,
    /// Coefficients (monomial basis) or evaluations (Lagrange basis).
    pub coeffs: Vec<F>,
}

impl Polynomial {
    /// Wrap coefficients as a monomial-basis polynomial.
    pub fn from_coeffs(coeffs: Vec<F>) -> Self {
        Self { basis: Basis::Monomial, coeffs }
    }

    /// Wrap domain evaluations as a Lagrange-basis polynomial.
    pub fn from_evals(evals: Vec<F>) -> Result<Self, PolyError> {
        if !evals.len().is_power_of_two() {
            return Err(PolyError::NotPowerOfTwo(evals.len()));
        }
        Ok(Self { basis: Basis::Lagrange, coeffs: evals })
    }

    /// The zero polynomial (monomial basis, no coefficients).
    pub fn zero() -> Self {
        Self { basis: Basis::Monomial, coeffs: vec![] }
    }

    /// Index of the highest non-zero coefficient (monomial basis).
    pub fn degree(&self) -> usize {
        self.coeffs.iter().rposition(|c| !ark_ff::Zero::is_zero(c)).unwrap_or(0)
    }

    fn require_monomial(&self) -> Result<(), PolyError> {
        match self.basis {
            Basis::Monomial => Ok(()),
            Basis::Lagrange => Err(PolyError::NonZeroRemainder),
        }
    }

    /// Convert to monomial basis via IFFT over `d`, if not already monomial.
    pub fn to_monomial(&self, d: &Domain) -> Result<Polynomial, PolyError> {
        match self.basis {
            Basis::Monomial => Ok(self.clone()),
            Basis::Lagrange => {
                Ok(Polynomial::from_coeffs(domain::ifft_block_evals_to_coeffs_r(d, &self.coeffs)?))
            }
        }
    }

    /// Convert to Lagrange-over-`d` basis via FFT, if not already Lagrange.
    pub fn to_lagrange(&self, d: &Domain) -> Result<Polynomial, PolyError> {
        match self.basis {
            Basis::Lagrange => Ok(self.clone()),
            Basis::Monomial => {
                let mut c = self.coeffs.clone();
                c.resize(d.n, F::from(0u64));
                Polynomial::from_evals(domain::ntt_block_coeffs_to_evals_r(d, &c)?)
            }
        }
    }

    /// Coefficient-wise sum, zero-padded to the longer operand's length.
    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut out = vec![F::from(0u64); n];
        for (i, c) in self.coeffs.iter().enumerate() {
            out[i] += c;
        }
        for (i, c) in other.coeffs.iter().enumerate() {
            out[i] += c;
        }
        Polynomial { basis: self.basis, coeffs: out }
    }

    /// Coefficient-wise difference, zero-padded to the longer operand's length.
    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        let mut out = vec![F::from(0u64); n];
        for (i, c) in self.coeffs.iter().enumerate() {
            out[i] += c;
        }
        for (i, c) in other.coeffs.iter().enumerate() {
            out[i] -= c;
        }
        Polynomial { basis: self.basis, coeffs: out }
    }

    /// Schoolbook multiplication (monomial basis only).
    pub fn mul(&self, other: &Polynomial) -> Result<Polynomial, PolyError> {
        self.require_monomial()?;
        other.require_monomial()?;
        if self.coeffs.is_empty() || other.coeffs.is_empty() {
            return Ok(Polynomial::zero());
        }
        let mut out = vec![F::from(0u64); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if ark_ff::Zero::is_zero(a) {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] += *a * b;
            }
        }
        Ok(Polynomial::from_coeffs(out))
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&self, factor: F) -> Polynomial {
        Polynomial {
            basis: self.basis,
            coeffs: self.coeffs.iter().map(|c| *c * factor).collect(),
        }
    }

    /// Evaluate via Horner's method (monomial basis).
    pub fn eval(&self, x: F) -> Result<F, PolyError> {
        self.require_monomial()?;
        let mut acc = F::from(0u64);
        for c in self.coeffs.iter().rev() {
            acc = acc * x + c;
        }
        Ok(acc)
    }

    /// Long division by a monic linear divisor `(X - point)`, returning the
    /// quotient and requiring a zero remainder — the shape KZG opening
    /// proofs need (`f(X) - f(z)) / (X - z)`).
    pub fn div_by_linear(&self, point: F) -> Result<Polynomial, PolyError> {
        self.require_monomial()?;
        if self.coeffs.is_empty() {
            return Ok(Polynomial::zero());
        }
        let n = self.coeffs.len();
        let mut quotient = vec![F::from(0u64); n.saturating_sub(1)];
        let mut remainder = F::from(0u64);
        for i in (0..n).rev() {
            let coeff = self.coeffs[i] + remainder;
            if i > 0 {
                quotient[i - 1] = coeff;
                remainder = coeff * point;
            } else {
                remainder = coeff;
            }
        }
        if !ark_ff::Zero::is_zero(&remainder) {
            return Err(PolyError::NonZeroRemainder);
        }
        Ok(Polynomial::from_coeffs(quotient))
    }

    /// Divide by the vanishing polynomial `X^n - 1` of a size-`n` domain
    /// (monomial basis only), requiring a zero remainder. Generalizes
    /// `div_by_linear`'s coefficient-recurrence to this sparse divisor: each
    /// term `c_i X^i` with `i >= n` reduces via `X^n ≡ 1`, folding `c_i` into
    /// both the quotient at degree `i - n` and the remainder at `i - n`.
    pub fn div_by_vanishing(&self, n: usize) -> Result<Polynomial, PolyError> {
        self.require_monomial()?;
        let mut c = self.coeffs.clone();
        if c.len() <= n {
            return if c.iter().all(ark_ff::Zero::is_zero) {
                Ok(Polynomial::zero())
            } else {
                Err(PolyError::NonZeroRemainder)
            };
        }
        let mut quotient = vec![F::from(0u64); c.len() - n];
        for i in (n..c.len()).rev() {
            let c_i = c[i];
            quotient[i - n] = c_i;
            c[i] = F::from(0u64);
            c[i - n] += c_i;
        }
        if c[..n].iter().any(|x| !ark_ff::Zero::is_zero(x)) {
            return Err(PolyError::NonZeroRemainder);
        }
        Ok(Polynomial::from_coeffs(quotient))
    }

    /// Evaluate without materializing the monomial form, in O(n), via
    /// streaming barycentric interpolation over `d` (Lagrange basis only).
    pub fn barycentric_eval(&self, d: &Domain, x: F) -> Result<F, PolyError> {
        if self.basis != Basis::Lagrange {
            return Err(PolyError::NotPowerOfTwo(self.coeffs.len()));
        }
        let w = domain::bary_weights_r(d)?;
        Ok(domain::eval_stream_barycentric_r(d, self.coeffs.iter().copied(), x, &w)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;

    #[test]
    fn add_and_mul_agree_with_pointwise_evaluation() {
        let a = Polynomial::from_coeffs(vec![F::from(1u64), F::from(2u64)]); // 1 + 2x
        let b = Polynomial::from_coeffs(vec![F::from(3u64), F::from(4u64)]); // 3 + 4x
        let product = a.mul(&b).unwrap();
        let x = F::from(5u64);
        assert_eq!(product.eval(x).unwrap(), a.eval(x).unwrap() * b.eval(x).unwrap());
    }

    #[test]
    fn div_by_linear_recovers_quotient_when_remainder_is_zero() {
        // (X-2)(X-3) = X^2 -5X + 6
        let p = Polynomial::from_coeffs(vec![F::from(6u64), F::from(0u64) - F::from(5u64), F::from(1u64)]);
        let q = p.div_by_linear(F::from(2u64)).unwrap();
        // quotient should be (X - 3)
        assert_eq!(q.eval(F::from(3u64)).unwrap(), F::zero());
    }

    #[test]
    fn div_by_vanishing_recovers_quotient_and_remainder() {
        // X^3 = X*(X^2 - 1) + X
        let p = Polynomial::from_coeffs(vec![F::from(0u64), F::from(0u64), F::from(0u64), F::from(1u64)]);
        let q = p.div_by_vanishing(2).unwrap();
        assert_eq!(q.coeffs, vec![F::from(0u64), F::from(1u64)]);
    }

    #[test]
    fn div_by_vanishing_rejects_a_nonzero_remainder() {
        let p = Polynomial::from_coeffs(vec![F::from(1u64), F::from(1u64)]); // 1 + X, degree < n
        assert_eq!(p.div_by_vanishing(4), Err(PolyError::NonZeroRemainder));
    }

    #[test]
    fn barycentric_eval_matches_fft_roundtrip() {
        let d = Domain::of_size(4);
        let coeffs = Polynomial::from_coeffs(vec![F::from(1u64), F::from(2u64), F::from(3u64), F::from(4u64)]);
        let lagrange = coeffs.to_lagrange(&d).unwrap();
        let zeta = F::from(123456u64);
        let via_bary = lagrange.barycentric_eval(&d, zeta).unwrap();
        let via_monomial = coeffs.eval(zeta).unwrap();
        assert_eq!(via_bary, via_monomial);
    }
}
