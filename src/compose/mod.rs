//! Deterministic scene composition: ordered draw plan, hit testing, and the
//! body color-tint algorithm.

pub(crate) mod hit;
pub(crate) mod plan;
pub(crate) mod tint;
