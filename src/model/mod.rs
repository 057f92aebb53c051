//! Data model shared by the reader, the cleaning pipeline and the sinks.

mod page;
mod record;

pub use page::*;
pub use record::*;
