use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unparseable timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("unknown sentiment label: {0:?}")]
    UnknownSentiment(String),

    #[error("reading topic map {path}: {source}")]
    TopicMapIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing topic map {path}: {source}")]
    TopicMapJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
