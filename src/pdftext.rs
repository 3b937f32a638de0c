pub mod extract;
pub mod investor;
pub mod rowgroup;

pub use extract::{
    ExtractedDoc, InputSource, LopdfTextExtractor, PageText, PlainTextExtractor,
    SourceType, TextFragment, TextLayoutExtractor,
};
