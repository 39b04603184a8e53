use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("could not serialize response body: {0}")]
    Serialize(#[from] serde_json::Error),
}
