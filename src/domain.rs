//! Domain & transform primitives
//!
//! Evaluation domain `H` of a power-of-two size with generator `ω`, radix-2
//! NTT/IFFT, and O(n) streaming barycentric evaluation. Adapted from the
//! original streaming `Domain`/`BarycentricWeights` pair; the blocked,
//! file-backed IFFT machinery is dropped here (see `DESIGN.md`) since every
//! polynomial this crate handles — circuit layers, lookup tables — fits
//! comfortably in memory; a dense in-place FFT is the right tool.

#![allow(dead_code)]

use ark_ff::{Field, One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use blake3::Hasher;

use crate::F;

/// Evaluation domain: the multiplicative subgroup `H = {1, ω, …, ω^{N-1}}`.
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct Domain {
    pub n: usize,
    pub omega: F,
}

/// Errors from building or using a [`Domain`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain size must be positive")]
    NZero,
    #[error("omega^N != 1")]
    OmegaNPowNotOne,
    #[error("omega is not primitive: omega^(N/{0}) == 1")]
    OmegaNotPrimitive(usize),
    #[error("length must be a positive power-of-two dividing N (len={len}, N={n})")]
    BadLen { len: usize, n: usize },
    #[error("evaluation point lies in H")]
    ZetaInDomain,
}

impl Domain {
    /// Build a domain, checking that `omega` is a primitive `n`-th root of unity.
    pub fn new_r(n: usize, omega: F) -> Result<Self, DomainError> {
        let d = Self { n, omega };
        validate_domain_r(&d)?;
        Ok(d)
    }

    /// Like [`Domain::new_r`], panicking on an invalid `(n, omega)` pair.
    pub fn new(n: usize, omega: F) -> Self {
        Self::new_r(n, omega).expect("invalid domain")
    }

    /// Build a domain of size `n` (must be a power of two) using BN254's
    /// canonical root of unity of that order.
    pub fn of_size(n: usize) -> Self {
        assert!(n.is_power_of_two() && n > 0, "domain size must be a power of two");
        use ark_ff::FftField;
        let omega = F::get_root_of_unity(n as u64)
            .expect("BN254 scalar field supports power-of-two domains up to its 2-adicity");
        Self::new(n, omega)
    }
}

/// Precomputed weights for [`eval_stream_barycentric_r`].
#[derive(Debug, Clone)]
pub struct BarycentricWeights {
    inv_n: F,
    step: F,
}

#[inline]
fn pow_u64(mut base: F, mut exp: u64) -> F {
    let mut acc = F::one();
    while exp > 0 {
        if (exp & 1) == 1 {
            acc *= base;
        }
        base.square_in_place();
        exp >>= 1;
    }
    acc
}

fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut p = 2usize;
    while p * p <= n {
        if n % p == 0 {
            out.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        out.push(n);
    }
    out
}

fn validate_domain_r(d: &Domain) -> Result<(), DomainError> {
    if d.n == 0 {
        return Err(DomainError::NZero);
    }
    let w_n = pow_u64(d.omega, d.n as u64);
    if !w_n.is_one() {
        return Err(DomainError::OmegaNPowNotOne);
    }
    for p in prime_factors(d.n) {
        let w_np = pow_u64(d.omega, (d.n / p) as u64);
        if w_np.is_one() {
            return Err(DomainError::OmegaNotPrimitive(p));
        }
    }
    Ok(())
}

/// Stable digest of a `Domain`, used for binding domain parameters into the
/// proof transcript.
pub fn domain_digest(d: &Domain) -> [u8; 32] {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&(d.n as u64).to_be_bytes());
    d.omega.serialize_compressed(&mut bytes).expect("serialize omega");
    let mut h = Hasher::new();
    h.update(b"zerok_core.domain.v1");
    h.update(&bytes);
    *h.finalize().as_bytes()
}

/// Evaluate the vanishing polynomial `X^n - 1` of `d` at `z`.
#[inline]
pub fn vanishing_at(d: &Domain, z: F) -> F {
    pow_u64(z, d.n as u64) - F::one()
}

/// Whether `z` is one of `d`'s `n`-th roots of unity.
#[inline]
pub fn is_in_domain(d: &Domain, z: F) -> bool {
    vanishing_at(d, z).is_zero()
}

/// Precompute the barycentric weights for `d`.
pub fn bary_weights_r(d: &Domain) -> Result<BarycentricWeights, DomainError> {
    validate_domain_r(d)?;
    let inv_n = F::from(d.n as u64).inverse().expect("N non-zero");
    let omega_pow_n_minus_1 = pow_u64(d.omega, (d.n as u64).saturating_sub(1));
    let step = omega_pow_n_minus_1.inverse().expect("non-zero");
    Ok(BarycentricWeights { inv_n, step })
}

/// Evaluate the polynomial defined by `evals` over `H` at `zeta`, without an
/// IFFT, in O(n). `zeta` must not lie in `H`.
pub fn eval_stream_barycentric_r(
    d: &Domain,
    it: impl Iterator<Item = F>,
    zeta: F,
    w: &BarycentricWeights,
) -> Result<F, DomainError> {
    validate_domain_r(d)?;
    if is_in_domain(d, zeta) {
        return Err(DomainError::ZetaInDomain);
    }
    let mut omega_i = F::one();
    let mut w_i = w.inv_n;
    let mut num = F::zero();
    let mut den = F::zero();
    for f_i in it {
        if zeta == omega_i {
            return Ok(f_i);
        }
        let denom_term = (zeta - omega_i).inverse().expect("zeta not in H, checked above");
        num += w_i * f_i * denom_term;
        den += w_i * denom_term;
        omega_i *= d.omega;
        w_i *= w.step;
    }
    Ok(num * den.inverse().expect("den != 0"))
}

#[inline]
fn validate_len_r(d: &Domain, len: usize) -> Result<(), DomainError> {
    validate_domain_r(d)?;
    if !(len > 0 && len.is_power_of_two() && d.n % len == 0) {
        return Err(DomainError::BadLen { len, n: d.n });
    }
    Ok(())
}

#[inline]
fn primitive_len_root_r(d: &Domain, len: usize) -> Result<F, DomainError> {
    validate_len_r(d, len)?;
    Ok(pow_u64(d.omega, (d.n / len) as u64))
}

fn ntt_in_place(a: &mut [F], root: F) {
    let n = a.len();
    debug_assert!(n.is_power_of_two());

    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            a.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let w_len = pow_u64(root, (n / len) as u64);
        for start in (0..n).step_by(len) {
            let mut w = F::one();
            let half = len / 2;
            for i in 0..half {
                let u = a[start + i];
                let v = a[start + i + half] * w;
                a[start + i] = u + v;
                a[start + i + half] = u - v;
                w *= w_len;
            }
        }
        len <<= 1;
    }
}

fn intt_in_place(a: &mut [F], root: F) {
    let n = a.len();
    let inv_root = root.inverse().expect("root non-zero");
    ntt_in_place(a, inv_root);
    let inv_n = F::from(n as u64).inverse().expect("n != 0");
    for x in a.iter_mut() {
        *x *= inv_n;
    }
}

/// Inverse transform: evaluations over a sub-block of `d` back to coefficients.
pub fn ifft_block_evals_to_coeffs_r(d: &Domain, evals: &[F]) -> Result<Vec<F>, DomainError> {
    let root = primitive_len_root_r(d, evals.len())?;
    let mut a = evals.to_vec();
    intt_in_place(&mut a, root);
    Ok(a)
}

/// Forward transform: coefficients to evaluations over a sub-block of `d`.
pub fn ntt_block_coeffs_to_evals_r(d: &Domain, coeffs: &[F]) -> Result<Vec<F>, DomainError> {
    let root = primitive_len_root_r(d, coeffs.len())?;
    let mut a = coeffs.to_vec();
    ntt_in_place(&mut a, root);
    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_of_size_eight_validates() {
        let d = Domain::of_size(8);
        assert_eq!(d.n, 8);
        assert!(pow_u64(d.omega, 8).is_one());
    }

    #[test]
    fn fft_then_ifft_round_trips() {
        let d = Domain::of_size(8);
        let coeffs: Vec<F> = (1..=8u64).map(F::from).collect();
        let evals = ntt_block_coeffs_to_evals_r(&d, &coeffs).unwrap();
        let back = ifft_block_evals_to_coeffs_r(&d, &evals).unwrap();
        assert_eq!(coeffs, back);
    }

    #[test]
    fn barycentric_matches_coefficient_evaluation() {
        let d = Domain::of_size(8);
        let coeffs: Vec<F> = (1..=8u64).map(F::from).collect();
        let evals = ntt_block_coeffs_to_evals_r(&d, &coeffs).unwrap();
        let w = bary_weights_r(&d).unwrap();
        let zeta = F::from(999u64);
        let by_bary = eval_stream_barycentric_r(&d, evals.iter().copied(), zeta, &w).unwrap();
        let mut acc = F::zero();
        let mut zp = F::one();
        for c in &coeffs {
            acc += *c * zp;
            zp *= zeta;
        }
        assert_eq!(by_bary, acc);
    }
}
