//! Fuzz input framing.
//!
//! A raw input is `count:u8`, then `count` arguments each framed as
//! `len:u16be bytes[len]`, then the program (every remaining byte).

use std::fmt;

use thiserror::Error;

/// Inputs longer than this are skipped without decoding.
pub const MAX_INPUT_LEN: usize = 50_000;

/// A decoded program and its arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FuzzInput {
    pub program: Vec<u8>,
    pub args: Vec<Vec<u8>>,
}

/// Why a raw input was not worth running.
///
/// Skipping is the normal outcome for most mutated inputs, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Skip {
    TooLong { len: usize },
    /// No argument count byte.
    Empty,
    /// Fewer than two bytes left for the length of argument `index`.
    TruncatedHeader { index: usize },
    /// Argument `index` declares more bytes than remain.
    TruncatedArg {
        index: usize,
        declared: usize,
        available: usize,
    },
}

impl Skip {
    /// Metric label for this reason.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::TooLong { .. } => "too_long",
            Self::Empty => "empty",
            Self::TruncatedHeader { .. } => "truncated_header",
            Self::TruncatedArg { .. } => "truncated_arg",
        }
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong { len } => {
                write!(f, "input of {len} bytes exceeds {MAX_INPUT_LEN} bytes")
            }
            Self::Empty => f.write_str("input is empty"),
            Self::TruncatedHeader { index } => {
                write!(f, "length header of arg {index} is truncated")
            }
            Self::TruncatedArg {
                index,
                declared,
                available,
            } => write!(
                f,
                "arg {index} declares {declared} bytes but only {available} remain"
            ),
        }
    }
}

/// Error building a raw input from parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("{0} args do not fit in the count byte")]
    TooManyArgs(usize),
    #[error("arg {index} is {len} bytes, longer than a u16 length allows")]
    ArgTooLong { index: usize, len: usize },
    #[error("encoded input of {len} bytes exceeds {MAX_INPUT_LEN} bytes")]
    TooLong { len: usize },
}

/// Split a raw fuzz input into program and arguments.
///
/// Never inspects the program bytes; an empty program is returned as-is.
pub fn decode(raw: &[u8]) -> Result<FuzzInput, Skip> {
    if raw.len() > MAX_INPUT_LEN {
        return Err(Skip::TooLong { len: raw.len() });
    }
    let (&count, mut rest) = raw.split_first().ok_or(Skip::Empty)?;

    let mut args = Vec::with_capacity(usize::from(count));
    for index in 0..usize::from(count) {
        let Some((header, tail)) = rest.split_first_chunk::<2>() else {
            return Err(Skip::TruncatedHeader { index });
        };
        let declared = usize::from(u16::from_be_bytes(*header));
        if tail.len() < declared {
            return Err(Skip::TruncatedArg {
                index,
                declared,
                available: tail.len(),
            });
        }
        let (arg, tail) = tail.split_at(declared);
        args.push(arg.to_vec());
        rest = tail;
    }

    Ok(FuzzInput {
        program: rest.to_vec(),
        args,
    })
}

impl FuzzInput {
    pub fn new(program: impl Into<Vec<u8>>, args: Vec<Vec<u8>>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Encode back into the raw framing accepted by [`decode`].
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let count =
            u8::try_from(self.args.len()).map_err(|_| EncodeError::TooManyArgs(self.args.len()))?;
        let args_len: usize = self.args.iter().map(|a| a.len() + 2).sum();
        let mut out = Vec::with_capacity(1 + args_len + self.program.len());

        out.push(count);
        for (index, arg) in self.args.iter().enumerate() {
            let len = u16::try_from(arg.len()).map_err(|_| EncodeError::ArgTooLong {
                index,
                len: arg.len(),
            })?;
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(arg);
        }
        out.extend_from_slice(&self.program);

        if out.len() > MAX_INPUT_LEN {
            return Err(EncodeError::TooLong { len: out.len() });
        }
        Ok(out)
    }
}
