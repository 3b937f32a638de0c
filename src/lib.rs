pub mod app;
pub mod errors;
pub mod gains;
pub mod lookup;
pub mod pdftext;
pub mod statement;
pub mod tracing;
pub mod util;

extern crate lazy_static;

#[cfg(any(test, feature = "testlib"))]
pub mod testlib;
