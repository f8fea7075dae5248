//! Minimal I/O helpers. The engine itself never touches a filesystem or
//! socket; this module exists only so `Alignment` (and the few other
//! serde-derived result types) can round-trip through JSON for golden-file
//! tests and for `exonerate-cli`'s output.

pub mod json;
