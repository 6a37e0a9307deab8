//! Feed access (HTTP or a saved JSON file).

pub mod feed;

pub use feed::*;
