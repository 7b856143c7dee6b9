//! The extraction pipeline.
//!
//! Each submodule implements one transformation step; [`crate::analyze`]
//! wires them together per input format.
//!
//! ## Data Flow
//!
//! ```text
//! deck file ──► pptx::analyze_pptx ─┐
//!                                   ├──► Vec<Slide> ──► detect ──► filter ──► Vec<Slide>
//! deck file ──► pdf::analyze_pdf  ──┘
//! ```
//!
//! Extraction always runs to completion before detection: the repetition
//! heuristics need the whole deck to compute occurrence ratios.

pub mod detect;
pub mod filter;
pub mod pdf;
pub mod pptx;
