//! `zerok_core`: fixed-point modular arithmetic, an expression-DAG-to-
//! layered-circuit compiler, and a sum-check/GKR prover/verifier over
//! BN254, with a plookup subsystem over KZG.
//!
//! Three tightly coupled subsystems, one per layer of the pipeline:
//!
//! 1. [`field`]/[`fixed_point`] — a tagged-variant field element with three
//!    interchangeable arithmetization modes (`PURE`, `FLOAT_SYMMETRIC`,
//!    `FLOAT_ASYMMETRIC`).
//! 2. [`dag`]/[`circuit`] — an expression arena plus the five-step compiler
//!    that turns a DAG into a layered add/mul/relay circuit.
//! 3. [`poly`]/[`domain`]/[`pcs`]/[`srs`]/[`transcript`]/[`gkr`]/[`plookup`]
//!    — the polynomial/KZG substrate and the two Fiat–Shamir protocols
//!    (sum-check/GKR, plookup) built on top of it.
//!
//! ## Invariants
//!
//! - **Field & curve.** The scalar field is `ark_bn254::Fr` ([`F`]).
//!   Commitments use KZG on BN254 (`G1 = ark_bn254::G1Affine`). Arithmetic
//!   is constant-time as provided by Arkworks; this crate forbids unsafe
//!   throughout.
//! - **Fiat–Shamir.** BLAKE3 with explicit domain-separation tags and an
//!   XOF to derive challenges ([`transcript::ProofTranscript`]). Prover and
//!   verifier replay the identical sequence of absorbs and challenges.
//! - **Concurrency.** Single-threaded, synchronous, no locks. The only
//!   shared mutable state is [`field`]'s thread-local active mode and a
//!   DAG's witness vector, each confined to one logical build.
//! - **Failure mode.** A malformed or inconsistent proof is a precise,
//!   logged rejection (`Ok(false)` from `gkr::Verifier::verify` /
//!   `plookup::Verifier::verify`), never a panic.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]

/// Modular field layer with three interchangeable arithmetization modes.
pub mod field;
/// FP16x16 sign-magnitude fixed-point base type backing `FLOAT_ASYMMETRIC`.
pub mod fixed_point;
/// Expression DAG: the front end recording an add/mul computation as a graph.
pub mod dag;
/// Layering compiler: DAG to layered arithmetic circuit.
pub mod circuit;
/// Dense univariate polynomials over BN254's scalar field.
pub mod poly;
/// Evaluation domain, FFT/IFFT, and streaming barycentric evaluation.
pub mod domain;
/// Polynomial commitment scheme — KZG on BN254.
pub mod pcs;
/// Structured Reference String loading and validation.
pub mod srs;
/// Fiat–Shamir proof transcript.
pub mod transcript;
/// Sum-check / GKR prover and verifier.
pub mod gkr;
/// Plookup — witness-in-table membership argument over KZG.
pub mod plookup;

/// Scalar field used across the crate (BN254's scalar field).
pub type F = ark_bn254::Fr;

/// G1 affine group element used for KZG commitments.
pub type G1 = ark_bn254::G1Affine;
