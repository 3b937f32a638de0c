pub mod model;
pub mod process;
pub mod reader;

pub use self::model::*;
pub use self::process::{detect_cas_type, process_cas_text, ProcessedCas};
pub use self::reader::{read_statement, ReadOptions};
