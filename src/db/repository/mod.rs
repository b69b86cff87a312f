pub mod document;
pub mod extraction;

pub use document::*;
pub use extraction::*;
