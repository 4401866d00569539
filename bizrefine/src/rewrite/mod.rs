//! Generative rewriting: corrective drafts for detected conflicts and the
//! three-way section rewrite.

mod corrective;
mod section;

pub use corrective::RewriteOrchestrator;
pub use section::{SectionRewrite, REWRITE_FAILED};
