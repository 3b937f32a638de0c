use thiserror::Error;

/// Errors raised while reading or parsing a CAS document. All of these are
/// fatal to the document being processed.
#[derive(Error, Debug)]
pub enum CasError {
    #[error("unsupported input: {0}")]
    UnsupportedSource(String),

    #[error("invalid or corrupt PDF file: {0}")]
    InvalidFile(String),

    #[error("incorrect PDF password")]
    IncorrectPassword,

    #[error("error parsing CAS header: {0}")]
    HeaderParse(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("unable to parse investor info")]
    InvestorInfo,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the capital-gains computation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GainsError {
    /// A scheme has transactions but a non-zero opening balance, so its
    /// lot history is incomplete and FIFO matching cannot be trusted.
    /// Fatal to the whole gains report.
    #[error(
        "incomplete CAS found: scheme \"{0}\" has a non-zero opening balance. \
         For gains computation, all schemes must have zero opening balance"
    )]
    IncompleteStatement(String),

    /// A redemption could not be fully matched against purchase lots.
    /// Recorded per fund on the report; other funds are unaffected.
    #[error("FIFO queue exhausted while matching a redemption in \"{0}\"")]
    FifoUnderflow(String),

    #[error("invalid financial year \"{0}\"")]
    InvalidFinYear(String),
}
