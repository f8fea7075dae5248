//! Sequence-alignment dynamic-programming engine: a C4 finite-state model
//! runtime, Viterbi driver, seeded/graph search for gapped alignment
//! (SDP/BSDP), heuristic bounds (SAR/HPair), per-query result bookkeeping
//! (GAM) and a library of named models (spec §1 OVERVIEW).
//!
//! `exonerate-core` has no I/O of its own beyond [`io`]'s JSON helpers;
//! sequences, substitution matrices and HSPs are supplied by the caller
//! (`exonerate-cli`, or any other embedder).

pub mod alignment;
pub mod arena;
pub mod bsdp;
pub mod comparison;
pub mod error;
pub mod gam;
pub mod heuristic;
pub mod hpair;
pub mod io;
pub mod model;
pub mod models;
pub mod pqueue;
pub mod region;
pub mod scoring;
pub mod sdp;
pub mod viterbi;

pub use alignment::Alignment;
pub use comparison::{Comparison, Hsp, HspSet};
pub use error::{EngineError, Result};
pub use model::{ClosedC4Model, OpenC4Model};
pub use region::Region;
pub use scoring::ScoringContext;
