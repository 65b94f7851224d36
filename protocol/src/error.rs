use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("trailing bytes after message")]
    TrailingBytes,

    #[error("invalid value for field {0}")]
    InvalidValue(&'static str),
}
