//! Plookup — witness-in-table membership argument over KZG (spec.md §4.6).
//!
//! The teacher's `perm_lookup.rs` streams a *permutation* accumulator
//! (`PermAcc`/`LookupAcc`, `phi_lookup_compress`, `emit_lookup_column_block`)
//! one row at a time, checking only that a sorted column is a rearrangement
//! of its input — true of *any* input, table membership or not, since
//! sorting never changes a multiset. A real plookup-style grand product
//! closes that gap by entangling witness and table terms through
//! transcript-sampled challenges so a value absent from the table has no
//! matching term to pair against (see `DESIGN.md`'s "plookup" entry for the
//! full account of why the sorted-merge check alone is insufficient, and why
//! this module uses a log-derivative identity instead of attempting that
//! construction bit-for-bit). This module generalizes the teacher's
//! multiplicative-accumulator idea into a batch-committed argument via
//! Haböck's log-derivative identity:
//!
//! `Σ_i 1/(β - w_i) = Σ_j m_j/(β - T_j)`
//!
//! for a transcript-sampled `β`, where `m_j` is the (prover-committed, fixed
//! *before* `β` is known) multiplicity of table slot `j` in the witness. The
//! two sides are rational functions of `β` whose pole sets are exactly
//! `{w_i}` and `{T_j}`; if some `w_i ∉ T`, the identity fails for all but a
//! negligible fraction of challenges, by the same pole-counting argument
//! that makes Schwartz–Zippel work for ordinary polynomial identities. Cross-
//! checked against `original_source/zerok/lookup/plookup` (`tests/
//! test_plookup.py`/`benchmark.py`, which fix the `Setup(powers, tau)` /
//! `Params(table)` / `Prover(setup, params).prove(witness)` / `Verifier(
//! setup, params).verify(proof)` call shape this module mirrors — the pack
//! does not carry `prover.py`/`engine.py` themselves, so the polynomial
//! identity below is this crate's own rendering, not a transcription of
//! absent source).
//!
//! `ProtocolError` is shared with `gkr` (see its doc comment) rather than
//! duplicated per module — both raise the same flavor of failure
//! (Fiat-Shamir mismatch, identity violated, KZG opening failed).

#![forbid(unsafe_code)]

use ark_ff::{Field, One, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use crate::domain::Domain;
use crate::field::FieldElement;
use crate::gkr::ProtocolError;
use crate::pcs::{self, Commitment, OpeningProof};
use crate::poly::Polynomial;
use crate::srs::Srs;
use crate::transcript::{Label, ProofTranscript};
use crate::F;

fn scalars(xs: &[FieldElement]) -> Vec<F> {
    xs.iter().map(FieldElement::as_scalar).collect()
}

fn pow_u64(mut base: F, mut exp: u64) -> F {
    let mut acc = F::one();
    while exp > 0 {
        if exp & 1 == 1 {
            acc *= base;
        }
        base.square_in_place();
        exp >>= 1;
    }
    acc
}

fn serialize<T: CanonicalSerialize>(v: &T) -> Vec<u8> {
    let mut bytes = Vec::new();
    v.serialize_compressed(&mut bytes).expect("serialize proof artifact");
    bytes
}

fn deserialize<T: CanonicalDeserialize>(bytes: &[u8]) -> T {
    T::deserialize_compressed(bytes).expect("transcript entry is a valid proof artifact")
}

fn pad(values: &[F], pad_value: F, n: usize) -> Vec<F> {
    let mut out = values.to_vec();
    out.resize(n, pad_value);
    out
}

/// For each table slot, how many witness entries equal that slot's value —
/// attributed to the *first* table slot carrying that value, so that
/// duplicate table slots (introduced by padding) pick up zero multiplicity.
/// A witness value with no matching table slot at all is silently dropped —
/// the sum-check below then has no way to balance, which is exactly the
/// rejection a witness value outside the table must trigger.
fn compute_multiplicities(table: &[F], witness: &[F]) -> Vec<F> {
    let mut m = vec![F::zero(); table.len()];
    for w in witness {
        if let Some(j) = table.iter().position(|t| t == w) {
            m[j] += F::one();
        }
    }
    m
}

/// Commit the padded public table. Both prover and verifier compute this
/// independently — the table is public, so there's nothing to trust the
/// prover for here; the commitment still binds *which* table the proof is
/// about into the transcript hash.
fn commit_table(srs: &Srs, table: &[F], pad_value: F) -> Result<(Domain, Vec<F>, Commitment), ProtocolError> {
    let n = table.len().next_power_of_two().max(1);
    let domain = Domain::of_size(n);
    let evals = pad(table, pad_value, domain.n);
    let poly = Polynomial::from_evals(evals.clone())?;
    let comm = pcs::commit_g1(srs, &domain, &poly)?;
    Ok((domain, evals, comm))
}

fn add_scalar(poly: &Polynomial, c: F) -> Polynomial {
    poly.add(&Polynomial::from_coeffs(vec![c]))
}

fn scalar_minus(poly: &Polynomial, c: F) -> Polynomial {
    add_scalar(&poly.scale(-F::one()), c)
}

/// Builds a log-derivative lookup proof that a witness's values all occur in
/// a public table.
pub struct Prover;

impl Prover {
    /// Prove `witness ⊆ table` (as multisets; `witness` may repeat entries).
    #[tracing::instrument(skip_all)]
    pub fn prove(
        srs: &Srs,
        table: &[FieldElement],
        witness: &[FieldElement],
    ) -> Result<ProofTranscript, ProtocolError> {
        let table_f = scalars(table);
        let witness_f = scalars(witness);
        let pad_value = *table_f.last().ok_or(ProtocolError::EmptyTable)?;

        let (t_domain, t_evals, t_comm) = commit_table(srs, &table_f, pad_value)?;

        let n_w = witness_f.len().next_power_of_two().max(1);
        let w_domain = Domain::of_size(n_w);
        let w_evals = pad(&witness_f, pad_value, w_domain.n);
        let w_poly = Polynomial::from_evals(w_evals.clone())?;
        let w_comm = pcs::commit_g1(srs, &w_domain, &w_poly)?;

        let m_evals = compute_multiplicities(&t_evals, &w_evals);
        let m_poly = Polynomial::from_evals(m_evals.clone())?;
        let m_comm = pcs::commit_g1(srs, &t_domain, &m_poly)?;

        let mut pt = ProofTranscript::new("zerok_core.plookup.v1");
        pt.absorb_bytes(Label::LookupTComm, serialize(&t_comm));
        pt.absorb_bytes(Label::LookupWComm, serialize(&w_comm));
        pt.absorb_bytes(Label::LookupSComm, serialize(&m_comm));
        let beta = pt.challenge_field(Label::R1);

        let p_evals: Vec<F> = w_evals
            .iter()
            .map(|w| (beta - w).inverse().ok_or(ProtocolError::DegenerateChallenge))
            .collect::<Result<_, _>>()?;
        let q_evals: Vec<F> = t_evals
            .iter()
            .zip(m_evals.iter())
            .map(|(t, m)| {
                let inv = (beta - t).inverse().ok_or(ProtocolError::DegenerateChallenge)?;
                Ok(*m * inv)
            })
            .collect::<Result<_, ProtocolError>>()?;

        let p_poly = Polynomial::from_evals(p_evals)?;
        let q_poly = Polynomial::from_evals(q_evals)?;
        let p_comm = pcs::commit_g1(srs, &w_domain, &p_poly)?;
        let q_comm = pcs::commit_g1(srs, &t_domain, &q_poly)?;

        let w_mono = w_poly.to_monomial(&w_domain)?;
        let t_mono = Polynomial::from_evals(t_evals.clone())?.to_monomial(&t_domain)?;
        let m_mono = m_poly.to_monomial(&t_domain)?;
        let p_mono = p_poly.to_monomial(&w_domain)?;
        let q_mono = q_poly.to_monomial(&t_domain)?;

        // p(X)*(beta - w(X)) - 1 must vanish on the witness domain.
        let r1 = p_mono.mul(&scalar_minus(&w_mono, beta))?.sub(&Polynomial::from_coeffs(vec![F::one()]));
        let quotient1 = r1.div_by_vanishing(w_domain.n)?;
        let q1_comm = pcs::commit_monomial_g1(srs, &quotient1.coeffs)?;

        // q(X)*(beta - T(X)) - m(X) must vanish on the table domain.
        let r2 = q_mono.mul(&scalar_minus(&t_mono, beta))?.sub(&m_mono);
        let quotient2 = r2.div_by_vanishing(t_domain.n)?;
        let q2_comm = pcs::commit_monomial_g1(srs, &quotient2.coeffs)?;

        pt.absorb_bytes(Label::LookupZComm, serialize(&p_comm));
        pt.absorb_bytes(Label::LookupZComm, serialize(&q_comm));
        pt.absorb_bytes(Label::LookupZComm, serialize(&q1_comm));
        pt.absorb_bytes(Label::LookupZComm, serialize(&q2_comm));

        let zeta = pt.challenge_field(Label::RC);

        let openings = [
            pcs::open(srs, &w_domain, &w_poly, zeta)?,
            pcs::open(srs, &w_domain, &p_poly, zeta)?,
            pcs::open(srs, &w_domain, &p_poly, F::zero())?,
            pcs::open(srs, &t_domain, &q_poly, zeta)?,
            pcs::open(srs, &t_domain, &q_poly, F::zero())?,
            pcs::open(srs, &t_domain, &m_poly, zeta)?,
            pcs::open(srs, &w_domain, &quotient1, zeta)?,
            pcs::open(srs, &t_domain, &quotient2, zeta)?,
        ];
        for o in &openings {
            pt.absorb_bytes(Label::LookupOpening, serialize(o));
        }

        Ok(pt)
    }
}

/// Checks a lookup proof against a public table.
pub struct Verifier;

impl Verifier {
    /// Verify `proof` against `table`, returning `false` (never panicking)
    /// on any malformed or inconsistent proof.
    #[tracing::instrument(skip_all)]
    pub fn verify(
        srs: &Srs,
        table: &[FieldElement],
        witness_len: usize,
        proof: &mut ProofTranscript,
    ) -> bool {
        match Self::verify_inner(srs, table, witness_len, proof) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "plookup verification rejected");
                false
            }
        }
    }

    fn verify_inner(
        srs: &Srs,
        table: &[FieldElement],
        witness_len: usize,
        proof: &mut ProofTranscript,
    ) -> Result<bool, ProtocolError> {
        let table_f = scalars(table);
        let pad_value = *table_f.last().ok_or(ProtocolError::EmptyTable)?;
        let (t_domain, t_evals, expected_t_comm) = commit_table(srs, &table_f, pad_value)?;
        let t_mono = Polynomial::from_evals(t_evals)?.to_monomial(&t_domain)?;

        let n_w = witness_len.next_power_of_two().max(1);
        let w_domain = Domain::of_size(n_w);

        let mut my = ProofTranscript::new("zerok_core.plookup.v1");

        let t_comm_bytes = proof.next_bytes(Label::LookupTComm)?;
        let t_comm: Commitment = deserialize(&t_comm_bytes);
        if t_comm.0 != expected_t_comm.0 {
            return Err(ProtocolError::MultisetMismatch);
        }
        my.absorb_bytes(Label::LookupTComm, t_comm_bytes);

        let w_comm_bytes = proof.next_bytes(Label::LookupWComm)?;
        my.absorb_bytes(Label::LookupWComm, w_comm_bytes.clone());
        let w_comm: Commitment = deserialize(&w_comm_bytes);

        let m_comm_bytes = proof.next_bytes(Label::LookupSComm)?;
        my.absorb_bytes(Label::LookupSComm, m_comm_bytes.clone());
        let m_comm: Commitment = deserialize(&m_comm_bytes);

        let my_beta = my.challenge_field(Label::R1);
        let prover_beta = proof.next_field(Label::R1)?;
        if my_beta != prover_beta {
            return Err(ProtocolError::ChallengeMismatch(Label::R1));
        }
        let beta = my_beta;

        let mut read_comm = |label: Label| -> Result<Commitment, ProtocolError> {
            let bytes = proof.next_bytes(label)?;
            my.absorb_bytes(label, bytes.clone());
            Ok(deserialize(&bytes))
        };
        let p_comm = read_comm(Label::LookupZComm)?;
        let q_comm = read_comm(Label::LookupZComm)?;
        let q1_comm = read_comm(Label::LookupZComm)?;
        let q2_comm = read_comm(Label::LookupZComm)?;

        let my_zeta = my.challenge_field(Label::RC);
        let prover_zeta = proof.next_field(Label::RC)?;
        if my_zeta != prover_zeta {
            return Err(ProtocolError::ChallengeMismatch(Label::RC));
        }
        let zeta = my_zeta;

        let mut open_at = |comm: &Commitment, expected_zeta: F| -> Result<OpeningProof, ProtocolError> {
            let bytes = proof.next_bytes(Label::LookupOpening)?;
            let o: OpeningProof = deserialize(&bytes);
            if o.zeta != expected_zeta {
                return Err(ProtocolError::MultisetMismatch);
            }
            pcs::verify_opening(srs, comm, &o, o.value)?;
            Ok(o)
        };

        let w_open = open_at(&w_comm, zeta)?;
        let p_open = open_at(&p_comm, zeta)?;
        let p_zero = open_at(&p_comm, F::zero())?;
        let q_open = open_at(&q_comm, zeta)?;
        let q_zero = open_at(&q_comm, F::zero())?;
        let m_open = open_at(&m_comm, zeta)?;
        let q1_open = open_at(&q1_comm, zeta)?;
        let q2_open = open_at(&q2_comm, zeta)?;

        let t_at_zeta = t_mono.eval(zeta)?;

        let lhs1 = p_open.value * (beta - w_open.value) - F::one();
        let vanish_w = pow_u64(zeta, w_domain.n as u64) - F::one();
        if lhs1 != q1_open.value * vanish_w {
            return Err(ProtocolError::MultisetMismatch);
        }

        let lhs2 = q_open.value * (beta - t_at_zeta) - m_open.value;
        let vanish_t = pow_u64(zeta, t_domain.n as u64) - F::one();
        if lhs2 != q2_open.value * vanish_t {
            return Err(ProtocolError::MultisetMismatch);
        }

        let sum_w = F::from(w_domain.n as u64) * p_zero.value;
        let sum_t = F::from(t_domain.n as u64) * q_zero.value;
        if sum_w != sum_t {
            return Err(ProtocolError::MultisetMismatch);
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ArithmetizationMode;
    use crate::srs::generate_dev_srs;

    fn fe(v: i64) -> FieldElement {
        FieldElement::quantize(ArithmetizationMode::Pure, v as f64)
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn accepts_a_witness_drawn_from_the_table() {
        let srs = generate_dev_srs(64);
        let table: Vec<FieldElement> = (1..=4).map(fe).collect();
        let witness = vec![fe(2), fe(3)];

        let mut proof = Prover::prove(&srs, &table, &witness).unwrap();
        assert!(Verifier::verify(&srs, &table, witness.len(), &mut proof));
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn rejects_a_witness_value_outside_the_table() {
        let srs = generate_dev_srs(64);
        let table: Vec<FieldElement> = (1..=4).map(fe).collect();
        let witness = vec![fe(2), fe(5)];

        let mut proof = Prover::prove(&srs, &table, &witness).unwrap();
        assert!(!Verifier::verify(&srs, &table, witness.len(), &mut proof));
    }

    #[test]
    #[cfg(feature = "dev-srs")]
    fn rejects_a_proof_checked_against_the_wrong_table() {
        let srs = generate_dev_srs(64);
        let table: Vec<FieldElement> = (1..=4).map(fe).collect();
        let witness = vec![fe(2), fe(3)];
        let mut proof = Prover::prove(&srs, &table, &witness).unwrap();

        let other_table: Vec<FieldElement> = (10..=13).map(fe).collect();
        assert!(!Verifier::verify(&srs, &other_table, witness.len(), &mut proof));
    }
}
