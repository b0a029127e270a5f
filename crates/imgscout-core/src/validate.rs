//! Candidate validation: reject placeholders before anything is fetched.
//!
//! Passing here does not mean the bytes are good; fetch-and-verify still checks
//! status, content type and decodability.

use crate::candidate::ImageCandidate;
use crate::config::ValidatorConfig;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("empty URL")]
    EmptyUrl,
    #[error("inline data URI")]
    DataUri,
    #[error("not an absolute http(s) URL")]
    InvalidUrl,
    #[error("unsupported URL scheme {scheme:?}")]
    UnsupportedScheme { scheme: String },
    #[error("low-resolution thumbnail host ({prefix})")]
    ThumbnailHost { prefix: String },
}

/// True when `url` is an inline `data:` URI (scheme is case-insensitive).
pub fn is_data_uri(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

#[derive(Debug, Clone)]
pub struct Validator {
    thumbnail_prefixes: Vec<String>,
}

impl Validator {
    pub fn new(cfg: &ValidatorConfig) -> Self {
        Self {
            thumbnail_prefixes: cfg.thumbnail_prefixes.clone(),
        }
    }

    /// First reason `candidate` must not be downloaded, if any.
    pub fn rejection(&self, candidate: &ImageCandidate) -> Option<Rejection> {
        let url = candidate.url.trim();
        if url.is_empty() {
            return Some(Rejection::EmptyUrl);
        }
        if is_data_uri(url) {
            return Some(Rejection::DataUri);
        }
        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Some(Rejection::UnsupportedScheme {
                    scheme: parsed.scheme().to_string(),
                })
            }
            Err(_) => return Some(Rejection::InvalidUrl),
        }
        self.thumbnail_prefixes
            .iter()
            .find(|p| !p.is_empty() && url.starts_with(p.as_str()))
            .map(|p| Rejection::ThumbnailHost { prefix: p.clone() })
    }

    pub fn is_acceptable(&self, candidate: &ImageCandidate) -> bool {
        self.rejection(candidate).is_none()
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(&ValidatorConfig::default())
    }
}
