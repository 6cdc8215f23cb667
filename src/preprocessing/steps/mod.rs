//! Individual normalization steps
//!
//! Run order: grayscale, crop, resize, invert, pack.

pub mod crop;
pub mod grayscale;
pub mod invert;
pub mod pack;
pub mod resize;
