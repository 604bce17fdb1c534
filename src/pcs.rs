//! Polynomial Commitment Scheme — KZG on BN254.
//!
//! Adapted from the teacher's `pcs.rs` Aggregator/opening/verification core,
//! simplified to this crate's needs: polynomials here are small (one per
//! circuit layer or lookup table), so there's no streaming tile machinery —
//! `commit_g1` is a direct MSM over an explicit [`Srs`](crate::srs::Srs)
//! rather than a process-global accumulator fed block by block.

#![forbid(unsafe_code)]

use ark_bn254::{Bn254, G1Affine, G1Projective};
use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, Group};
use ark_ff::{PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use thiserror::Error;

use crate::domain::Domain;
use crate::poly::{Basis, PolyError, Polynomial};
use crate::srs::Srs;
use crate::F;

/// A KZG commitment: `C = Σ cᵢ·[τⁱ]₁`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Commitment(pub G1Affine);

/// An opening proof that a committed polynomial evaluates to `value` at `zeta`.
#[derive(Debug, Clone, CanonicalSerialize, CanonicalDeserialize)]
pub struct OpeningProof {
    pub zeta: F,
    pub value: F,
    /// Commitment to the witness polynomial `W(X) = (f(X) - f(ζ)) / (X - ζ)`.
    pub witness_comm: Commitment,
}

/// Errors committing to or opening a polynomial.
#[derive(Debug, Error)]
pub enum PcsError {
    #[error("polynomial degree {degree} exceeds SRS max degree {max_degree}")]
    DegreeTooLarge { degree: usize, max_degree: usize },
    #[error(transparent)]
    Poly(#[from] PolyError),
}

/// Errors verifying a KZG opening.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("claimed evaluation does not match the opening proof")]
    ValueMismatch,
    #[error("final pairing check failed")]
    Pairing,
}

fn msm(srs: &Srs, coeffs: &[F]) -> G1Projective {
    let mut acc = G1Projective::zero();
    for (i, c) in coeffs.iter().enumerate() {
        if c.is_zero() {
            continue;
        }
        acc += srs.g1_powers[i].into_group().mul_bigint(c.into_bigint());
    }
    acc
}

/// Commit to `poly` (converted to monomial form via `domain` if it's in
/// Lagrange basis) under `srs`.
pub fn commit_g1(srs: &Srs, domain: &Domain, poly: &Polynomial) -> Result<Commitment, PcsError> {
    let monomial = poly.to_monomial(domain)?;
    if monomial.degree() > srs.max_degree() {
        return Err(PcsError::DegreeTooLarge { degree: monomial.degree(), max_degree: srs.max_degree() });
    }
    Ok(Commitment(msm(srs, &monomial.coeffs).into_affine()))
}

/// Commit to a polynomial already known to be in monomial form, skipping the
/// basis-conversion step `commit_g1` would otherwise do.
pub fn commit_monomial_g1(srs: &Srs, coeffs: &[F]) -> Result<Commitment, PcsError> {
    if coeffs.len().saturating_sub(1) > srs.max_degree() {
        return Err(PcsError::DegreeTooLarge {
            degree: coeffs.len().saturating_sub(1),
            max_degree: srs.max_degree(),
        });
    }
    Ok(Commitment(msm(srs, coeffs).into_affine()))
}

/// Produce an opening proof of `poly` at `zeta`, converting to monomial form
/// first if needed.
pub fn open(
    srs: &Srs,
    domain: &Domain,
    poly: &Polynomial,
    zeta: F,
) -> Result<OpeningProof, PcsError> {
    let monomial = poly.to_monomial(domain)?;
    let value = monomial.eval(zeta)?;
    let mut shifted = monomial.clone();
    shifted.coeffs[0] -= value;
    let quotient = match shifted.div_by_linear(zeta) {
        Ok(q) => q,
        Err(_) => unreachable!("f(X) - f(zeta) always vanishes at zeta"),
    };
    let witness_comm = commit_monomial_g1(srs, &quotient.coeffs)?;
    Ok(OpeningProof { zeta, value, witness_comm })
}

/// Verify a single KZG opening via the pairing equation
/// `e(C - [f(ζ)]₁, G₂) == e(W, [τ]₂ - [ζ]₂)`.
pub fn verify_opening(
    srs: &Srs,
    commitment: &Commitment,
    proof: &OpeningProof,
    claimed_value: F,
) -> Result<(), VerifyError> {
    if proof.value != claimed_value {
        return Err(VerifyError::ValueMismatch);
    }

    let g1_gen = srs.g1_powers[0];
    let g2_gen = <Bn254 as Pairing>::G2::generator().into_affine();

    let lhs_g1 = (commitment.0.into_group()
        - g1_gen.into_group().mul_bigint(proof.value.into_bigint()))
    .into_affine();
    let rhs_g2 = (srs.tau_g2.into_group()
        - g2_gen.into_group().mul_bigint(proof.zeta.into_bigint()))
    .into_affine();

    let lhs = Bn254::pairing(lhs_g1, g2_gen);
    let rhs = Bn254::pairing(proof.witness_comm.0, rhs_g2);

    if lhs == rhs {
        Ok(())
    } else {
        Err(VerifyError::Pairing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::generate_dev_srs;

    #[test]
    #[cfg(feature = "dev-srs")]
    fn commits_and_opens_a_monomial_polynomial() {
        let srs = generate_dev_srs(8);
        let domain = Domain::of_size(8);
        let poly = Polynomial::from_coeffs((1..=4u64).map(F::from).collect());
        let commitment = commit_g1(&srs, &domain, &poly).unwrap();

        let zeta = F::from(777u64);
        let proof = open(&srs, &domain, &poly, zeta).unwrap();
        let expected = poly.eval(zeta).unwrap();
        assert_eq!(proof.value, expected);
        verify_opening(&srs, &commitment, &proof, expected).unwrap();
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn rejects_a_tampered_evaluation() {
        let srs = generate_dev_srs(8);
        let domain = Domain::of_size(8);
        let poly = Polynomial::from_coeffs((1..=4u64).map(F::from).collect());
        let commitment = commit_g1(&srs, &domain, &poly).unwrap();
        let zeta = F::from(777u64);
        let proof = open(&srs, &domain, &poly, zeta).unwrap();

        let wrong = proof.value + F::from(1u64);
        assert_eq!(verify_opening(&srs, &commitment, &proof, wrong), Err(VerifyError::ValueMismatch));
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn commits_to_a_lagrange_polynomial() {
        // Mirrors the upstream known-answer scenario's shape (commit to
        // Lagrange([1..8])); the exact published G1 point depends on the
        // real Hermez ceremony SRS, which this crate does not vendor, so we
        // check against our own dev SRS rather than the published constant.
        let srs = generate_dev_srs(8);
        let domain = Domain::of_size(8);
        let evals = Polynomial::from_evals((1..=8u64).map(F::from).collect()).unwrap();
        assert_eq!(evals.basis, Basis::Lagrange);
        let c1 = commit_g1(&srs, &domain, &evals).unwrap();
        let c2 = commit_g1(&srs, &domain, &evals).unwrap();
        assert_eq!(c1.0, c2.0);
    }
}
