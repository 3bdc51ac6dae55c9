//! CPU renderer executing a deterministic scene plan into premultiplied
//! RGBA8 pixels.

pub(crate) mod canvas;
pub(crate) mod scene;
