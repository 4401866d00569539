//! Text utilities exposed next to the consistency check.

pub mod acronyms;
pub mod citation;

pub use acronyms::{AcronymStore, Expansion};
pub use citation::{detect_style, CitationParts, CitationStyle};
