use packed_struct::PackingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("rom address {index:#05x} is outside the decoded space")]
    AddressOutOfRange { index: usize },
    #[error("cannot pack rom address: {0:?}")]
    Packing(PackingError),
    #[error("expected hex header '{expected}', found '{found}'")]
    BadHexHeader { expected: &'static str, found: String },
    #[error("bad hex token '{token}' on line {line}")]
    BadHexToken { line: usize, token: String },
}

impl From<PackingError> for RomError {
    fn from(e: PackingError) -> Self {
        RomError::Packing(e)
    }
}
