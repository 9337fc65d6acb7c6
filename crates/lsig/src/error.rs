use thiserror::Error;

use crate::config::ConfigError;
use crate::input::{EncodeError, Skip};

/// Harness errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot encode input: {0}")]
    Encode(#[from] EncodeError),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("input does not decode: {0}")]
    Skipped(Skip),
}

pub type Result<T> = std::result::Result<T, Error>;
