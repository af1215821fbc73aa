//! Text format of a matching instance: the size `n` followed by the `n²`
//! weights in row-major order, all separated by whitespace.

use std::io::{self, Read};

use nalgebra::DMatrix;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Io(io::ErrorKind),

    #[error("missing matrix size")]
    MissingSize,

    #[error("invalid matrix size {0:?}")]
    InvalidSize(String),

    #[error("matrix size {0} is too large")]
    TooLarge(usize),

    #[error("invalid weight {token:?} at position {index}")]
    InvalidWeight { index: usize, token: String },

    #[error("expected {expected} weights, found {found}")]
    MissingWeights { expected: usize, found: usize },

    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}

pub fn parse_instance(text: &str) -> Result<DMatrix<i64>, InputError> {
    let mut tokens = text.split_whitespace();

    let size = tokens.next().ok_or(InputError::MissingSize)?;
    let n = match size.parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => return Err(InputError::InvalidSize(size.to_owned())),
    };
    let expected = n.checked_mul(n).ok_or(InputError::TooLarge(n))?;

    let mut weights = Vec::new();
    for (index, token) in tokens.by_ref().take(expected).enumerate() {
        let weight = token.parse::<i64>().map_err(|_| InputError::InvalidWeight {
            index,
            token: token.to_owned(),
        })?;
        weights.push(weight);
    }
    if weights.len() < expected {
        return Err(InputError::MissingWeights {
            expected,
            found: weights.len(),
        });
    }
    if let Some(extra) = tokens.next() {
        return Err(InputError::TrailingInput(extra.to_owned()));
    }

    Ok(DMatrix::from_row_slice(n, n, &weights))
}

pub fn read_instance<R: Read>(mut reader: R) -> Result<DMatrix<i64>, InputError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|err| InputError::Io(err.kind()))?;
    parse_instance(&text)
}
