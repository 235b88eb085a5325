//! Turning a track locator into bytes the decoder can read.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};
use thiserror::Error;
use tracing::debug;

use super::slot::CancelFlag;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported locator `{0}`")]
    Unsupported(String),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("empty audio resource")]
    Empty,
    #[error("cannot decode audio: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
    #[error("load cancelled")]
    Cancelled,
}

/// A fetched resource and the duration the decoder reported for it.
pub(super) struct Fetched {
    pub bytes: Arc<[u8]>,
    pub duration: Option<Duration>,
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Locator<'a> {
    File(&'a Path),
    Http(&'a str),
}

pub(super) fn classify(locator: &str) -> Result<Locator<'_>, FetchError> {
    let locator = locator.trim();
    if let Some(path) = locator.strip_prefix("file://") {
        return Ok(Locator::File(Path::new(path)));
    }
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return Ok(Locator::Http(locator));
    }
    if locator.is_empty() || locator.contains("://") {
        return Err(FetchError::Unsupported(locator.to_string()));
    }
    Ok(Locator::File(Path::new(locator)))
}

pub(super) fn fetch_bytes(locator: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
    let bytes = match classify(locator)? {
        Locator::File(path) => fs::read(path)?,
        Locator::Http(url) => {
            let client = reqwest::blocking::Client::builder()
                .timeout(timeout)
                .build()?;
            let response = client.get(url).send()?;
            if !response.status().is_success() {
                return Err(FetchError::Status(response.status()));
            }
            response.bytes()?.to_vec()
        }
    };
    if bytes.is_empty() {
        return Err(FetchError::Empty);
    }
    debug!(locator, len = bytes.len(), "fetched audio resource");
    Ok(bytes)
}

/// Fetch `locator` and make sure it decodes, reading its duration on the way.
/// `cancel` is checked before each step; a cancelled load stops at the next one.
pub(super) fn fetch_and_decode(
    locator: &str,
    timeout: Duration,
    cancel: &CancelFlag,
) -> Result<Fetched, FetchError> {
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let bytes: Arc<[u8]> = fetch_bytes(locator, timeout)?.into();
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let decoder = Decoder::new(Cursor::new(Arc::clone(&bytes)))?;
    let duration = decoder.total_duration();
    Ok(Fetched { bytes, duration })
}
