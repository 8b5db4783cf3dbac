//! Error taxonomy for the synthesis pipeline and its collaborators.

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Caller omitted a required input (credential, text, archive, URL).
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The request body was not the JSON the endpoint expects.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// The synthesizer failed on one segment; the request was aborted there.
    #[error("provider error on segment {index} ({}): {body}", status_label(.status))]
    Provider {
        index: usize,
        status: Option<u16>,
        body: String,
    },

    /// A collaborator's upstream fetch failed before any synthesis.
    #[error("upstream error ({}): {body}", status_label(.status))]
    Upstream { status: Option<u16>, body: String },

    /// A collaborator produced no usable text.
    #[error("{0}")]
    EmptyResult(String),

    #[error("request exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("base64 error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}
