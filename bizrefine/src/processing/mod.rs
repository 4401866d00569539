//! Document ingestion.

mod docx;

pub use docx::DocxExtractor;
