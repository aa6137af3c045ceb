use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tidewatch_core::{FilterChain, State};
use tidewatch_logging::{watch_debug, watch_warn};

use crate::{
    decode_body, ConfigurationError, Content, FailureKind, FetchError, HttpDocument, Query,
};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            user_agent: concat!("tidewatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GETs a URL and yields the decoded body as [`Content::Http`].
///
/// Non-2xx responses, timeouts, oversized bodies and undecodable bodies all
/// become failure states.
#[derive(Debug, Clone)]
pub struct HttpQuery {
    url: reqwest::Url,
    settings: FetchSettings,
    client: reqwest::Client,
}

impl HttpQuery {
    pub fn new(url: &str, settings: FetchSettings) -> Result<Self, ConfigurationError> {
        let parsed = parse_http_url(url)?;
        let client = build_client(&settings)?;
        Ok(Self {
            url: parsed,
            settings,
            client,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Parses `url` and checks that it can be fetched over HTTP.
pub(crate) fn parse_http_url(url: &str) -> Result<reqwest::Url, ConfigurationError> {
    let parsed = reqwest::Url::parse(url).map_err(|err| ConfigurationError::InvalidUrl {
        url: url.to_string(),
        message: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigurationError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(parsed)
}

/// GETs `url` with `client`, enforcing the size cap of `settings`.
pub(crate) async fn download(
    client: &reqwest::Client,
    url: &reqwest::Url,
    settings: &FetchSettings,
) -> Result<HttpDocument, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }

    if let Some(content_len) = response.content_length() {
        if content_len > settings.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: settings.max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = bytes.len() as u64 + chunk.len() as u64;
        if next_len > settings.max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes: settings.max_bytes,
                    actual: Some(next_len),
                },
                "response too large",
            ));
        }
        bytes.extend_from_slice(&chunk);
    }
    if final_url == url.as_str() {
        watch_debug!("GET {url} ({} bytes)", bytes.len());
    } else {
        watch_debug!("GET {url} redirected to {final_url} ({} bytes)", bytes.len());
    }

    let decoded = decode_body(&bytes, content_type.as_deref())
        .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;

    Ok(HttpDocument {
        url: final_url,
        status: status.as_u16(),
        content_type,
        encoding: decoded.encoding,
        body: decoded.text,
    })
}

#[async_trait::async_trait]
impl Query<Content> for HttpQuery {
    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }

    async fn fetch(&self) -> State<Content> {
        match download(&self.client, &self.url, &self.settings).await {
            Ok(document) => State::success(Content::Http(document)),
            Err(err) => {
                watch_warn!("GET {} failed: {err}", self.url);
                State::failure(err.to_string())
            }
        }
    }
}

/// Fetches a page whose address is found in another page.
///
/// The source query's state runs through the extraction filters, which must
/// leave the URL as [`Content::Text`]; that URL is then fetched like an
/// [`HttpQuery`] would. A failure anywhere along the way is the query's
/// failure.
pub struct FollowQuery {
    source: Arc<dyn Query<Content>>,
    extract: FilterChain<Content>,
    settings: FetchSettings,
    client: reqwest::Client,
}

impl FollowQuery {
    pub fn new(
        source: Arc<dyn Query<Content>>,
        extract: FilterChain<Content>,
        settings: FetchSettings,
    ) -> Result<Self, ConfigurationError> {
        let client = build_client(&settings)?;
        Ok(Self {
            source,
            extract,
            settings,
            client,
        })
    }

    async fn follow(&self) -> Result<HttpDocument, String> {
        let extracted = self.extract.apply(self.source.fetch().await);
        let target = match extracted {
            State::Success {
                payload: Content::Text(target),
            } => target,
            State::Success { payload } => return Err(payload.mismatch("text")),
            State::Failure { cause } => {
                return Err(cause.unwrap_or_else(|| "no url to follow".to_string()))
            }
        };
        let url = parse_http_url(target.trim()).map_err(|err| err.to_string())?;
        download(&self.client, &url, &self.settings)
            .await
            .map_err(|err| {
                watch_warn!("GET {url} failed: {err}");
                err.to_string()
            })
    }
}

#[async_trait::async_trait]
impl Query<Content> for FollowQuery {
    fn describe(&self) -> String {
        format!("follow[{} via {:?}]", self.source.describe(), self.extract)
    }

    async fn fetch(&self) -> State<Content> {
        self.follow().await.map(Content::Http).into()
    }
}

pub(crate) fn build_client(
    settings: &FetchSettings,
) -> Result<reqwest::Client, ConfigurationError> {
    let redirect_limit = settings.redirect_limit;
    let policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > redirect_limit {
            attempt.error("redirect limit exceeded")
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .user_agent(settings.user_agent.clone())
        .redirect(policy)
        .build()
        .map_err(|err| ConfigurationError::HttpClient(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
