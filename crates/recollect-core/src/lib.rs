pub mod hash;
pub mod memory;
pub mod metadata;
pub mod types;

pub use metadata::{layer, Metadata};
pub use types::*;
