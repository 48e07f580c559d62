//! HTTP client for the dejure.org linking service.

use std::io::{ErrorKind, Read};
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use url::Url;

use crate::config::{AnnotationConfig, CLIENT_VERSION, VERNETZEN_PATH};
use crate::error::{FetchError, Result};

/// Size of the chunks the response body is read in.
const READ_CHUNK_SIZE: usize = 1024;

/// Content type declared on requests.
const REQUEST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Service that turns plain text into text with linked citations.
///
/// Failures are returned as [`FetchError`] and never panic; the caller
/// always has the original text to fall back to.
pub trait AnnotationService: Send + Sync {
    fn fetch(
        &self,
        text: &str,
        ignore: &str,
        config: &AnnotationConfig,
    ) -> std::result::Result<String, FetchError>;
}

/// Build the request URL including all query parameters.
///
/// Changing any of these parameters changes the service output, which
/// is not reflected in cached results.
pub fn request_url(
    text: &str,
    ignore: &str,
    config: &AnnotationConfig,
) -> std::result::Result<Url, FetchError> {
    let endpoint = format!("{}{VERNETZEN_PATH}", config.base_url.trim_end_matches('/'));
    let provider_id = config.provider_id();
    let buzer = if config.allow_fallback_provider { "1" } else { "0" };

    let params: [(&str, &str); 10] = [
        ("Originaltext", text),
        ("AktenzeichenIgnorieren", ignore),
        ("Anbieterkennung", provider_id.as_str()),
        ("format", config.link_style.as_str()),
        ("Tooltip", config.tooltip.as_str()),
        ("Zeilenwechsel", config.line_break.as_str()),
        ("target", config.link_target.as_str()),
        ("class", config.css_class.as_str()),
        ("buzer", buzer),
        ("version", CLIENT_VERSION),
    ];

    Ok(Url::parse_with_params(&endpoint, params)?)
}

/// Blocking client for dejure.org.
#[derive(Debug, Clone)]
pub struct DejureClient {
    http: Client,
}

impl DejureClient {
    /// Create a client whose connection timeout is the configured
    /// request timeout.
    pub fn new(config: &AnnotationConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()?;
        Ok(Self { http })
    }
}

impl AnnotationService for DejureClient {
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    fn fetch(
        &self,
        text: &str,
        ignore: &str,
        config: &AnnotationConfig,
    ) -> std::result::Result<String, FetchError> {
        let url = request_url(text, ignore, config)?;

        let mut response = self
            .http
            .get(url)
            .header(USER_AGENT, config.effective_user_agent())
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .timeout(config.request_timeout + config.stream_timeout)
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(status = %status, "Service returned unexpected status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = read_body(&mut response, config)?;
        let body = String::from_utf8(body).map_err(|e| FetchError::InvalidBody(e.to_string()))?;

        Ok(body.trim().to_string())
    }
}

/// Read the whole body in chunks, aborting once the stream timeout has
/// elapsed since the headers arrived.
fn read_body<R: Read>(
    reader: &mut R,
    config: &AnnotationConfig,
) -> std::result::Result<Vec<u8>, FetchError> {
    let started = Instant::now();
    let stream_timeout = || FetchError::StreamTimeout {
        timeout_ms: config.stream_timeout.as_millis(),
    };

    let mut body = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        let read = match reader.read(&mut chunk) {
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == ErrorKind::TimedOut => return Err(stream_timeout()),
            Err(e) => return Err(FetchError::InvalidBody(e.to_string())),
        };
        if read == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..read]);

        if started.elapsed() > config.stream_timeout {
            return Err(stream_timeout());
        }
    }

    Ok(body)
}

/// Test utilities for the annotation service.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock service returning pre-configured responses in order.
    ///
    /// Once the script is exhausted every call fails with status 503.
    pub struct MockService {
        responses: Mutex<Vec<std::result::Result<String, FetchError>>>,
        calls: AtomicUsize,
    }

    impl MockService {
        pub fn new(responses: Vec<std::result::Result<String, FetchError>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_response(body: &str) -> Self {
            Self::new(vec![Ok(body.to_string())])
        }

        pub fn failing(error: FetchError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// Number of `fetch` calls made so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnnotationService for MockService {
        fn fetch(
            &self,
            _text: &str,
            _ignore: &str,
            _config: &AnnotationConfig,
        ) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self
                .responses
                .lock()
                .map_err(|e| FetchError::InvalidBody(format!("mock lock poisoned: {e}")))?;
            responses.pop().unwrap_or(Err(FetchError::Status(503)))
        }
    }
}
