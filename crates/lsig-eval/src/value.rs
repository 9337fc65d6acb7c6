use std::fmt;

/// A value on the evaluation stack.
#[derive(Clone, PartialEq, Eq)]
pub enum StackValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

impl StackValue {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Uint(_) => "uint64",
            Self::Bytes(_) => "[]byte",
        }
    }
}

impl From<u64> for StackValue {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<bool> for StackValue {
    fn from(value: bool) -> Self {
        Self::Uint(u64::from(value))
    }
}

impl From<Vec<u8>> for StackValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl fmt::Debug for StackValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
        }
    }
}
