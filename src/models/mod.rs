pub mod document;
pub mod enums;
pub mod extraction;

pub use document::*;
pub use enums::*;
pub use extraction::*;
