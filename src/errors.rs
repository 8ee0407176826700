use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvanceError {
    #[error("Episode selector not present on the page")]
    NoEpisodeList,
    #[error("Episode selector has no active item")]
    NoActiveEpisode,
    #[error("Episode menu did not open")]
    MenuDidNotOpen,
    #[error("Next item at position {index} could not be activated")]
    ActivationFailed { index: usize },
    #[error("Season selector not present on the page")]
    NoSeasonList,
    #[error("Gave up after {attempts} attempts, last failure: {last}")]
    AttemptsExhausted {
        attempts: u32,
        #[source]
        last: Box<AdvanceError>,
    },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Stored document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
