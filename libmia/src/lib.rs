pub use word::{pack, WordExt};

pub mod op;
pub mod word;
