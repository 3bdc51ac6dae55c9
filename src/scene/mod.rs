//! Creation data model and the interactive builder object.
//!
//! [`model`] is the serde wire boundary (what a share token carries);
//! [`creation::Creation`] wraps it with builder mutations and validation.

pub(crate) mod creation;
pub(crate) mod model;
pub(crate) mod sanitize;
