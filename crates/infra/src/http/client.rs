use std::collections::BTreeMap;
use std::time::Duration;

use oidcflow_core::{HttpResponse, PostRequest, TransportError, WebTransport};
use oidcflow_domain::HttpConfig;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Blocking `reqwest` implementation of [`WebTransport`].
///
/// Timeouts configured on the builder surface as [`TransportError::Timeout`];
/// every other client failure is [`TransportError::Io`]. The client must not
/// be created or dropped on an async runtime thread.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Transport with the timeouts and user agent of `config`.
    pub fn from_config(config: &HttpConfig) -> Result<Self, TransportError> {
        let mut builder = Self::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.read_timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }
}

impl WebTransport for ReqwestTransport {
    fn send_post(&self, request: &PostRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, request.content_type.as_str())
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        debug!(
            url = %request.url,
            correlation_id = %request.correlation_id,
            "sending token POST"
        );

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();

        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            match value.to_str() {
                Ok(value) => {
                    headers.entry(name.as_str().to_string()).or_default().push(value.to_string());
                }
                Err(_) => debug!(header = %name, "dropping non-ASCII response header"),
            }
        }

        let body = response.text().map_err(map_reqwest_error)?;
        debug!(
            url = %request.url,
            status,
            correlation_id = %request.correlation_id,
            "received token response"
        );

        Ok(HttpResponse { status, body, headers })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        let defaults = HttpConfig::default();
        Self {
            connect_timeout: defaults.connect_timeout(),
            timeout: defaults.read_timeout(),
            user_agent: None,
        }
    }
}

impl ReqwestTransportBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Deadline for the whole exchange once connected.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::Io(format!("failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}
