//! Error taxonomy for option validation, lexing, and record assembly.

mod result;
mod types;

pub use result::Result;
pub use types::{CancelKind, Error, ErrorKind};
