use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("weight matrix is empty")]
    Empty,

    #[error("weight matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// The total weight does not fit the weight type, or a potential left `i128`.
    #[error("arithmetic overflow in weight type")]
    Overflow,
}
