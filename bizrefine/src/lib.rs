//! BizRefine: a writing assistant for business documents.
//!
//! The core is the cross-sentence consistency check in [`consistency`]: the
//! document is segmented, sentence pairs are labelled by an NLI classifier
//! ([`classifier`]) and by a numeric-fact comparison, and contradictions are
//! handed to the generative model ([`rewrite`]) for a corrected draft. The
//! [`api`] module serves it over HTTP next to the smaller [`tools`].

pub mod api;
pub mod classifier;
pub mod config;
pub mod consistency;
pub mod error;
pub mod llm;
pub mod processing;
pub mod rewrite;
pub mod services;
pub mod tools;
