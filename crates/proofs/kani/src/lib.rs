//! Kani proofs for the two-phase pricer
//!
//! Run with: cargo kani -p proofs-kani
//!
//! Ordinary builds compile this crate to nothing.

#![cfg(kani)]

mod fees;
mod phase;
mod pricing;
