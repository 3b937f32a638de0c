pub mod approot;
pub mod outfmt;
pub mod render;

pub const CASGAINS_APP_VERSION: &str = env!("CARGO_PKG_VERSION");
