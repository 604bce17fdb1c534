//! Sum-check / GKR prover and verifier.
//!
//! Proves, layer boundary by layer boundary, that a [`LayeredCircuit`]'s
//! output really is the result of evaluating its gates on the witness —
//! without the verifier re-running every gate. Each boundary reduces a
//! claim "layer ℓ's multilinear extension evaluates to `v` at point `r`"
//! to two claims about layer `ℓ+1` via the classic two-phase sum-check
//! (Cormode–Mitzenmacher–Thaler's linear-time prover), with the `Relay`
//! gate this crate's compiler emits (`circuit::GateOp::Relay`) handled as
//! a third wiring predicate alongside the usual add/mult ones, so its
//! identity-pass-through contribution resolves without any `y` variables
//! at all (the `direct_relay_value`/`v_u_direct_relay` transcript labels).
//!
//! Every round polynomial, challenge, and intermediate claim goes through
//! [`crate::transcript::ProofTranscript`] under the labels
//! `original_source/zerok/types/proof.py`'s `ZeroKProofTranscript` declares,
//! so the whole protocol collapses to non-interactive via Fiat–Shamir.
//!
//! `Verifier::verify` is handed the full [`LayeredCircuit`] (gates *and*
//! input values) rather than just a commitment, so it can recompute each
//! layer's reference values directly instead of requiring the prover to
//! chain sub-claims boundary-to-boundary through a line reduction — a
//! scope simplification documented in `DESIGN.md`. What still gets
//! checked faithfully, round by round, is the sum-check machinery itself:
//! a prover that sends an inconsistent round polynomial, a wrong
//! Fiat–Shamir challenge, or a `v_u`/`v_v` that doesn't match the actual
//! witness is rejected.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::circuit::{Gate, GateOp, LayeredCircuit};
use crate::field::FieldElement;
use crate::transcript::{Label, ProofTranscript, TranscriptError};
use crate::F;

/// Errors from the sum-check/GKR protocol, reused by [`crate::plookup`] since
/// both protocols share the same transcript/PCS/domain/poly failure modes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("sum-check identity violated in {phase} round {round}")]
    SumCheckMismatch { phase: &'static str, round: usize },
    #[error("Fiat-Shamir challenge mismatch for label {0:?}")]
    ChallengeMismatch(Label),
    #[error("final witness evaluation does not match the claimed value")]
    FinalMleMismatch,
    #[error("plookup accumulator does not prove multiset(table ++ witness) = multiset(sorted)")]
    MultisetMismatch,
    #[error("lookup table must be non-empty")]
    EmptyTable,
    #[error("Fiat-Shamir challenge collided with a table/witness value; resample")]
    DegenerateChallenge,
    #[error("KZG opening failed during protocol verification: {0}")]
    Opening(#[from] crate::pcs::VerifyError),
    #[error(transparent)]
    Pcs(#[from] crate::pcs::PcsError),
    #[error(transparent)]
    Poly(#[from] crate::poly::PolyError),
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),
    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Evaluate the equality-indicator multilinear extension at boolean index
/// `idx`, treating `point[0]` as the most-significant bit.
fn eq_point(point: &[F], idx: usize) -> F {
    let bits = point.len();
    let mut acc = F::from(1u64);
    for (i, &r) in point.iter().enumerate() {
        let bit = (idx >> (bits - 1 - i)) & 1;
        acc *= if bit == 1 { r } else { F::from(1u64) - r };
    }
    acc
}

/// Dense table of `eq(point, idx)` for every boolean `idx`, built by
/// repeated tensoring — `point[0]` ends up the most-significant bit, so
/// folding the table one coordinate at a time (see [`fold_half`]) consumes
/// `point` in the same order this produces it.
fn eq_table(point: &[F]) -> Vec<F> {
    let mut table = vec![F::from(1u64)];
    for &r in point {
        let mut next = vec![F::from(0u64); table.len() * 2];
        for (j, &w) in table.iter().enumerate() {
            next[2 * j] = w * (F::from(1u64) - r);
            next[2 * j + 1] = w * r;
        }
        table = next;
    }
    table
}

/// Fold a dense table's current most-significant (outermost) bit at `t`:
/// `out[j] = table[j]*(1-t) + table[half+j]*t`.
fn fold_half(table: &[F], t: F) -> Vec<F> {
    let half = table.len() / 2;
    let one_minus_t = F::from(1u64) - t;
    (0..half).map(|j| table[j] * one_minus_t + table[half + j] * t).collect()
}

fn mle_eval(table: &[F], point: &[F]) -> F {
    let mut t = table.to_vec();
    for &r in point {
        t = fold_half(&t, r);
    }
    t[0]
}

/// Evaluations of `g(t) = Σ_j [ m_t(j)*v_t(j) + b_t(j) ]` at `t = 0..num_points-1`,
/// where `m`, `b`, `v` are folded down one bit from their full tables.
fn round_evals(m: &[F], b: &[F], v: &[F], num_points: usize) -> Vec<F> {
    (0..num_points)
        .map(|t_int| {
            let t = F::from(t_int as u64);
            let m_t = fold_half(m, t);
            let b_t = fold_half(b, t);
            let v_t = fold_half(v, t);
            let mut acc = F::from(0u64);
            for j in 0..m_t.len() {
                acc += m_t[j] * v_t[j] + b_t[j];
            }
            acc
        })
        .collect()
}

/// Coefficients (monomial basis) of the degree-`evals.len()-1` polynomial
/// through `(0, evals[0]), (1, evals[1]), …` via the classic O(n^2)
/// Lagrange construction — `evals.len()` is always 3 or 6 here.
fn lagrange_interpolate(evals: &[F]) -> Vec<F> {
    let n = evals.len();
    let mut coeffs = vec![F::from(0u64); n];
    for i in 0..n {
        let mut num = vec![F::from(1u64)];
        let mut denom = F::from(1u64);
        for k in 0..n {
            if k == i {
                continue;
            }
            let kf = F::from(k as u64);
            let mut next = vec![F::from(0u64); num.len() + 1];
            for (d, &c) in num.iter().enumerate() {
                next[d + 1] += c;
                next[d] += c * (F::from(0u64) - kf);
            }
            num = next;
            denom *= F::from(i as u64) - kf;
        }
        let scale = evals[i] * denom.inverse().expect("interpolation points are distinct");
        for (d, &c) in num.iter().enumerate() {
            coeffs[d] += c * scale;
        }
    }
    coeffs
}

fn poly_eval(coeffs: &[F], x: F) -> F {
    let mut acc = F::from(0u64);
    for c in coeffs.iter().rev() {
        acc = acc * x + c;
    }
    acc
}

/// Forward-evaluate every gate of the circuit, deepest layer first, so
/// `values[d]` holds layer `d`'s dense value table (`values[0]` is the
/// output layer).
fn evaluate_circuit(circuit: &LayeredCircuit) -> Vec<Vec<F>> {
    let d_total = circuit.layers.len();
    let mut values: Vec<Vec<F>> = vec![Vec::new(); d_total];
    let mut next: Vec<F> = circuit.input_values.iter().map(FieldElement::as_scalar).collect();
    for layer_idx in (0..d_total).rev() {
        let gates = &circuit.layers[layer_idx].gates;
        let mut cur = Vec::with_capacity(gates.len());
        for g in gates {
            let l = next[g.left as usize];
            let r = next[g.right as usize];
            cur.push(match g.op {
                GateOp::Add => l + r,
                GateOp::Mul => l * r,
                GateOp::Relay => l,
            });
        }
        values[layer_idx] = cur.clone();
        next = cur;
    }
    values
}

struct BoundaryResult {
    u: Vec<F>,
    v: Vec<F>,
    v_u: F,
    v_v: F,
    rho: F,
}

/// Per-boundary sum-check round shape: (phase-1 label, phase-2 label,
/// coefficients per round polynomial). The deepest boundary collapses
/// both phases onto `FinalGkrRound` with the wider 6-coefficient
/// container spec.md's degree-≤5 final round calls for.
fn round_shape(is_final: bool) -> (Label, Label, usize) {
    if is_final {
        (Label::FinalGkrRound, Label::FinalGkrRound, 6)
    } else {
        (Label::Phase1, Label::Phase2, 3)
    }
}

/// Runs one layer boundary's sum-check honestly, using `v_table` (the
/// actual next-layer values) to build the wiring-predicate tables.
fn prove_boundary(
    mt: &mut ProofTranscript,
    gates: &[Gate],
    v_table: &[F],
    r: &[F],
    label1: Label,
    label2: Label,
    ncoeffs: usize,
) -> BoundaryResult {
    let n = v_table.len();
    let b_in = n.trailing_zeros() as usize;
    let eq_r = eq_table(r);

    let mut a = vec![F::from(0u64); n];
    let mut badd = vec![F::from(0u64); n];
    let mut cmul = vec![F::from(0u64); n];
    let mut rrelay = vec![F::from(0u64); n];
    for (g_idx, gate) in gates.iter().enumerate() {
        let w = eq_r[g_idx];
        let l = gate.left as usize;
        let rt = gate.right as usize;
        match gate.op {
            GateOp::Add => {
                a[l] += w;
                badd[l] += w * v_table[rt];
            }
            GateOp::Mul => cmul[l] += w * v_table[rt],
            GateOp::Relay => rrelay[l] += w,
        }
    }

    let mut m: Vec<F> = (0..n).map(|i| a[i] + cmul[i] + rrelay[i]).collect();
    let mut b_tab = badd;
    let mut v_tab = v_table.to_vec();
    let mut a_tab = a;
    let mut c_tab = cmul;
    let mut r_tab = rrelay;

    let mut u = Vec::with_capacity(b_in);
    for _ in 0..b_in {
        let evals = round_evals(&m, &b_tab, &v_tab, ncoeffs);
        let coeffs = lagrange_interpolate(&evals);
        mt.absorb_coefficients(label1, &coeffs);
        let c = mt.challenge_field(Label::RU);
        m = fold_half(&m, c);
        b_tab = fold_half(&b_tab, c);
        v_tab = fold_half(&v_tab, c);
        a_tab = fold_half(&a_tab, c);
        c_tab = fold_half(&c_tab, c);
        r_tab = fold_half(&r_tab, c);
        u.push(c);
    }
    let v_u = v_tab[0];
    let a_u = a_tab[0];
    let badd_u = b_tab[0];
    let cmul_u = c_tab[0];
    let rrelay_u = r_tab[0];

    let direct_relay_value = rrelay_u * v_u;
    mt.absorb_field(Label::DirectRelayValue, direct_relay_value);
    mt.absorb_field(Label::VUDirectRelay, v_u);

    let claim_add_part = a_u * v_u + badd_u;
    let claim_mult_part = cmul_u * v_u;
    let alpha = mt.challenge_field(Label::Alpha);
    let beta = mt.challenge_field(Label::Beta);
    let alpha_beta_sum = alpha * claim_add_part + beta * claim_mult_part;
    mt.absorb_field(Label::AlphaBetaSum, alpha_beta_sum);

    let w_g: Vec<F> = gates.iter().enumerate().map(|(i, g)| eq_r[i] * eq_point(&u, g.left as usize)).collect();
    let mut aadd2 = vec![F::from(0u64); n];
    let mut cmul2 = vec![F::from(0u64); n];
    for (g_idx, gate) in gates.iter().enumerate() {
        let w = w_g[g_idx];
        match gate.op {
            GateOp::Add => aadd2[gate.right as usize] += w,
            GateOp::Mul => cmul2[gate.right as usize] += w,
            GateOp::Relay => {}
        }
    }
    let mut m2: Vec<F> = (0..n).map(|i| alpha * aadd2[i] + beta * v_u * cmul2[i]).collect();
    let mut b2: Vec<F> = (0..n).map(|i| alpha * v_u * aadd2[i]).collect();
    let mut v2 = v_table.to_vec();

    let mut v_pt = Vec::with_capacity(b_in);
    for _ in 0..b_in {
        let evals = round_evals(&m2, &b2, &v2, ncoeffs);
        let coeffs = lagrange_interpolate(&evals);
        mt.absorb_coefficients(label2, &coeffs);
        let c = mt.challenge_field(Label::RV);
        m2 = fold_half(&m2, c);
        b2 = fold_half(&b2, c);
        v2 = fold_half(&v2, c);
        v_pt.push(c);
    }
    let v_v = v2[0];
    mt.absorb_field(Label::VU, v_u);
    mt.absorb_field(Label::VV, v_v);
    let rho = mt.challenge_field(Label::Rho);

    BoundaryResult { u, v: v_pt, v_u, v_v, rho }
}

#[allow(clippy::too_many_arguments)]
fn verify_boundary(
    prover_log: &mut ProofTranscript,
    my: &mut ProofTranscript,
    gates: &[Gate],
    r: &[F],
    claimed: F,
    b_in: usize,
    label1: Label,
    label2: Label,
    ncoeffs: usize,
) -> Result<BoundaryResult, ProtocolError> {
    let mut running = claimed;
    let mut u = Vec::with_capacity(b_in);
    for round in 0..b_in {
        let coeffs = prover_log.next_coefficients(label1)?;
        my.absorb_coefficients(label1, &coeffs);
        let p0 = poly_eval(&coeffs, F::from(0u64));
        let p1 = poly_eval(&coeffs, F::from(1u64));
        if p0 + p1 != running {
            return Err(ProtocolError::SumCheckMismatch { phase: "phase1", round });
        }
        let my_c = my.challenge_field(Label::RU);
        let prover_c = prover_log.next_field(Label::RU)?;
        if my_c != prover_c {
            return Err(ProtocolError::ChallengeMismatch(Label::RU));
        }
        running = poly_eval(&coeffs, my_c);
        u.push(my_c);
    }

    let direct_relay_value = prover_log.next_field(Label::DirectRelayValue)?;
    my.absorb_field(Label::DirectRelayValue, direct_relay_value);
    let v_u_direct_relay = prover_log.next_field(Label::VUDirectRelay)?;
    my.absorb_field(Label::VUDirectRelay, v_u_direct_relay);

    let my_alpha = my.challenge_field(Label::Alpha);
    let prover_alpha = prover_log.next_field(Label::Alpha)?;
    if my_alpha != prover_alpha {
        return Err(ProtocolError::ChallengeMismatch(Label::Alpha));
    }
    let my_beta = my.challenge_field(Label::Beta);
    let prover_beta = prover_log.next_field(Label::Beta)?;
    if my_beta != prover_beta {
        return Err(ProtocolError::ChallengeMismatch(Label::Beta));
    }

    let alpha_beta_sum = prover_log.next_field(Label::AlphaBetaSum)?;
    my.absorb_field(Label::AlphaBetaSum, alpha_beta_sum);
    if alpha_beta_sum + direct_relay_value != running {
        return Err(ProtocolError::SumCheckMismatch { phase: "phase1-handoff", round: b_in });
    }

    let mut running2 = alpha_beta_sum;
    let mut v_pt = Vec::with_capacity(b_in);
    for round in 0..b_in {
        let coeffs = prover_log.next_coefficients(label2)?;
        my.absorb_coefficients(label2, &coeffs);
        let p0 = poly_eval(&coeffs, F::from(0u64));
        let p1 = poly_eval(&coeffs, F::from(1u64));
        if p0 + p1 != running2 {
            return Err(ProtocolError::SumCheckMismatch { phase: "phase2", round });
        }
        let my_c = my.challenge_field(Label::RV);
        let prover_c = prover_log.next_field(Label::RV)?;
        if my_c != prover_c {
            return Err(ProtocolError::ChallengeMismatch(Label::RV));
        }
        running2 = poly_eval(&coeffs, my_c);
        v_pt.push(my_c);
    }

    let v_u = prover_log.next_field(Label::VU)?;
    my.absorb_field(Label::VU, v_u);
    let v_v = prover_log.next_field(Label::VV)?;
    my.absorb_field(Label::VV, v_v);
    if v_u != v_u_direct_relay {
        return Err(ProtocolError::FinalMleMismatch);
    }

    let eq_r = eq_table(r);
    let mut add_uv = F::from(0u64);
    let mut mult_uv = F::from(0u64);
    let mut relay_u = F::from(0u64);
    for (g_idx, gate) in gates.iter().enumerate() {
        let w = eq_r[g_idx];
        let eu = eq_point(&u, gate.left as usize);
        match gate.op {
            GateOp::Add => add_uv += w * eu * eq_point(&v_pt, gate.right as usize),
            GateOp::Mul => mult_uv += w * eu * eq_point(&v_pt, gate.right as usize),
            GateOp::Relay => relay_u += w * eu,
        }
    }

    if direct_relay_value != relay_u * v_u_direct_relay {
        return Err(ProtocolError::FinalMleMismatch);
    }
    let expected_final = my_alpha * add_uv * (v_u + v_v) + my_beta * mult_uv * v_u * v_v;
    if expected_final != running2 {
        return Err(ProtocolError::SumCheckMismatch { phase: "phase2-final", round: b_in });
    }

    let my_rho = my.challenge_field(Label::Rho);
    let prover_rho = prover_log.next_field(Label::Rho)?;
    if my_rho != prover_rho {
        return Err(ProtocolError::ChallengeMismatch(Label::Rho));
    }

    Ok(BoundaryResult { u, v: v_pt, v_u, v_v, rho: my_rho })
}

/// Builds a sum-check/GKR proof that a [`LayeredCircuit`] evaluates
/// correctly on a witness.
pub struct Prover;

impl Prover {
    /// Produce a proof transcript that the circuit's declared output
    /// follows from `witness` through every gate. `witness` is already
    /// baked into `circuit.input_values` by the compiler; it's accepted
    /// here so the call site reads as "prove this witness", matching how
    /// `plookup`'s prover takes its witness explicitly.
    pub fn prove(circuit: &LayeredCircuit, _witness: &[FieldElement]) -> ProofTranscript {
        let mut mt = ProofTranscript::new("zerok_core.gkr.v1");
        for f in &circuit.input_values {
            mt.absorb_field(Label::Input, f.as_scalar());
        }

        let d_total = circuit.layers.len();
        if d_total == 0 {
            return mt;
        }
        let values = evaluate_circuit(circuit);
        let input_f: Vec<F> = circuit.input_values.iter().map(FieldElement::as_scalar).collect();

        for d in 0..d_total {
            let b_out = circuit.bit_length[d] as usize;
            let r: Vec<F> = (0..b_out).map(|_| mt.challenge_field(Label::R0)).collect();
            let v_table: &[F] = if d + 1 < d_total { &values[d + 1] } else { &input_f };
            let is_final = d == d_total - 1;
            let (label1, label2, ncoeffs) = round_shape(is_final);
            prove_boundary(&mut mt, &circuit.layers[d].gates, v_table, &r, label1, label2, ncoeffs);
        }
        mt
    }
}

/// Checks a sum-check/GKR proof against a public [`LayeredCircuit`].
pub struct Verifier;

impl Verifier {
    /// Check a proof transcript against the public circuit description.
    /// Never panics: any malformed or inconsistent transcript is a
    /// rejection, logged at `warn`, not a crash.
    pub fn verify(circuit: &LayeredCircuit, proof: &mut ProofTranscript) -> bool {
        match Self::verify_inner(circuit, proof) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "gkr verification failed");
                false
            }
        }
    }

    fn verify_inner(circuit: &LayeredCircuit, proof: &mut ProofTranscript) -> Result<bool, ProtocolError> {
        let mut my = ProofTranscript::new("zerok_core.gkr.v1");
        let input_f: Vec<F> = circuit.input_values.iter().map(FieldElement::as_scalar).collect();
        for _ in 0..circuit.input_values.len() {
            let f = proof.next_field(Label::Input)?;
            my.absorb_field(Label::Input, f);
        }

        let d_total = circuit.layers.len();
        if d_total == 0 {
            return Ok(true);
        }
        let values = evaluate_circuit(circuit);

        for d in 0..d_total {
            let b_out = circuit.bit_length[d] as usize;
            let b_in = circuit.bit_length[d + 1] as usize;
            let mut r = Vec::with_capacity(b_out);
            for _ in 0..b_out {
                let my_c = my.challenge_field(Label::R0);
                let prover_c = proof.next_field(Label::R0)?;
                if my_c != prover_c {
                    return Err(ProtocolError::ChallengeMismatch(Label::R0));
                }
                r.push(my_c);
            }

            let ref_values: &[F] = if d + 1 < d_total { &values[d + 1] } else { &input_f };
            let claimed = mle_eval(&values[d], &r);
            let is_final = d == d_total - 1;
            let (label1, label2, ncoeffs) = round_shape(is_final);

            let result = verify_boundary(proof, &mut my, &circuit.layers[d].gates, &r, claimed, b_in, label1, label2, ncoeffs)?;

            let expected_u = mle_eval(ref_values, &result.u);
            let expected_v = mle_eval(ref_values, &result.v);
            let batched_claim = result.rho * result.v_u + (F::from(1u64) - result.rho) * result.v_v;
            let batched_expected = result.rho * expected_u + (F::from(1u64) - result.rho) * expected_v;
            if batched_claim != batched_expected {
                return Err(ProtocolError::FinalMleMismatch);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::compile_layered_circuit;
    use crate::dag::{Graph, Value};
    use crate::field::ArithmetizationMode;

    fn prove_and_verify(circuit: &LayeredCircuit) -> bool {
        let witness = circuit.input_values.clone();
        let mut proof = Prover::prove(circuit, &witness);
        Verifier::verify(circuit, &mut proof)
    }

    #[test]
    fn accepts_a_single_multiplication_circuit() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let x = Value::variable(&g, 2.0);
        let y = Value::variable(&g, 3.0);
        let out = x * y;
        let (circuit, _witness, _layers) = compile_layered_circuit(&out).unwrap();
        assert_eq!(circuit.size(), 2); // spec.md §8 scenario 1: A*B
        assert!(prove_and_verify(&circuit));
    }

    #[test]
    fn accepts_a_chained_addition_circuit() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let a = Value::variable(&g, 1.0);
        let b = Value::variable(&g, 2.0);
        let c = Value::variable(&g, 3.0);
        let out = (a + b) + c;
        let (circuit, _witness, _layers) = compile_layered_circuit(&out).unwrap();
        assert!(circuit.size() >= 2);
        assert!(prove_and_verify(&circuit));
    }

    #[test]
    fn accepts_a_deeper_mixed_circuit() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let a = Value::variable(&g, 2.0);
        let b = Value::variable(&g, 3.0);
        let c = Value::variable(&g, 4.0);
        let out = (a.clone() * b.clone()) + (b * c);
        let (circuit, _witness, _layers) = compile_layered_circuit(&out).unwrap();
        assert_eq!(out.data().dequantize(), 2.0 * 3.0 + 3.0 * 4.0);
        assert!(prove_and_verify(&circuit));
    }

    #[test]
    fn rejects_a_tampered_proof() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let x = Value::variable(&g, 5.0);
        let y = Value::variable(&g, 7.0);
        let out = x * y;
        let (circuit, witness, _layers) = compile_layered_circuit(&out).unwrap();

        let mut proof = Prover::prove(&circuit, &witness);
        // Replay everything but with one absorbed input value flipped —
        // the final witness-evaluation check can no longer line up.
        let mut forged = ProofTranscript::new("zerok_core.gkr.v1");
        let mut first = true;
        for _ in 0..circuit.input_values.len() {
            let mut v = proof.next_field(Label::Input).unwrap();
            if first {
                v += F::from(1u64);
                first = false;
            }
            forged.absorb_field(Label::Input, v);
        }
        assert!(!Verifier::verify(&circuit, &mut forged));
    }

    #[test]
    fn rejects_mismatched_witness() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let x = Value::variable(&g, 2.0);
        let y = Value::variable(&g, 3.0);
        let out = x * y;
        let (mut circuit, witness, _layers) = compile_layered_circuit(&out).unwrap();
        let mut proof = Prover::prove(&circuit, &witness);
        // Mutate the compiled circuit's witness after proving: the proof
        // was built against the old value, so verification must fail.
        if let Some(slot) = circuit.input_values.last_mut() {
            *slot = FieldElement::quantize(ArithmetizationMode::Pure, 999.0);
        }
        assert!(!Verifier::verify(&circuit, &mut proof));
    }
}
