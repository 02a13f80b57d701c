//! Structural recovery pipeline: ToC extraction, heading-driven chunking and
//! ToC-versus-chunk validation over page text.

mod chunking;
mod line_classify;
mod page_source;
mod result_store;
mod run;
mod structural_validation;
mod toc_extract;

pub use run::run;

pub(crate) use line_classify::LineClassifier;
pub(crate) use page_source::{doc_title_for, open_page_source};
pub(crate) use result_store::RUN_MANIFEST_FILE_NAME;
pub(crate) use toc_extract::extract_toc;
