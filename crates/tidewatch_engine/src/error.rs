use thiserror::Error;

/// Invalid reaction wiring, detected when the reaction is built rather than
/// when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("fallback query needs at least one child query")]
    EmptyFallback,
    #[error("invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("http client could not be built: {0}")]
    HttpClient(String),
}

impl ConfigurationError {
    pub(crate) fn selector(selector: &str, message: impl std::fmt::Debug) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            message: format!("{message:?}"),
        }
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<scraper::Selector, ConfigurationError> {
    scraper::Selector::parse(selector).map_err(|err| ConfigurationError::selector(selector, err))
}
