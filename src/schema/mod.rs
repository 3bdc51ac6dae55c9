//! Creation validation: structural, referential, positional, timing, range,
//! and color checks with an aggregating entry point.

pub(crate) mod validate;
