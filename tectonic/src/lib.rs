//! `tectonic` enumerates every valid completed grid of a Tectonic-style
//! puzzle for a given base (height, width, maximum value) and stores the
//! enumeration in a compact stream of arbitrary-precision codes.

pub mod base;
pub mod codec;
pub mod coloring;
pub mod error;
pub mod grid;
pub mod producer;
pub mod progress;
pub mod region;
pub mod searcher;
pub mod stream;

pub use error::{Error, Result};
