pub mod cii;
pub mod fifo;
pub mod model;
pub mod report;

pub use self::cii::CiiTable;
pub use self::fifo::FifoUnits;
pub use self::model::{get_fin_year, Fund, GainEntry, GainType};
pub use self::report::CapitalGainsReport;
