//! Path model: an ordered, owned command list plus flattening into polylines.

mod flatten;
mod path;

pub use flatten::{flatten_cubic, Subpath, CUBIC_SEGMENTS};
pub use path::{Path, PathCmd};
