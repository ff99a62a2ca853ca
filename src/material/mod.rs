//! Course material handling and loading

pub mod error;
pub mod frontmatter;
pub mod loader;
pub mod model;

pub use error::MaterialError;
pub use loader::{LoadOptions, load_tree};
pub use model::{Attribution, Course, MaterialTree, NodeKey, Section, Theme};
