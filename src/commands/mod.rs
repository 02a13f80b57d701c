pub mod parse;
pub mod status;
pub mod toc;
