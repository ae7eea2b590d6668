use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index: storage error: {0}")]
    Storage(String),

    #[error("index: serialization error: {0}")]
    Serialization(String),
}
