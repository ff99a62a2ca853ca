//! Syllabus - course material hierarchy and progress for training portals
//!
//! Syllabus loads markdown course material into a repo → theme → course →
//! section tree, resolves the dotted refs that events and progress records use
//! to point into it, and summarises problem completion for students and
//! instructors.

pub mod config;
pub mod links;
pub mod material;
pub mod progress;
pub mod reference;
pub mod search;
pub mod tags;

pub use config::Config;
pub use material::MaterialTree;
pub use progress::{CompletionSummary, ProblemFact, Scope, summarize, summarize_in};
pub use reference::{DisplayBundle, Resolution, resolve};
