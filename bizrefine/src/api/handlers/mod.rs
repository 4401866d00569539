pub mod acronyms;
pub(crate) mod health;
pub mod process;
pub mod upload;

pub use acronyms::add_acronym;
pub use health::health_check;
pub use process::process;
pub use upload::upload_docx;
