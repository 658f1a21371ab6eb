use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model fit failed: {0}")]
    FitFailed(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),

    #[error("Provider error: {0}")]
    Provider(String),
}
