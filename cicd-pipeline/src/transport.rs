//! HTTP transport seam.
//!
//! [`PipelineSync`](crate::PipelineSync) only needs "POST this JSON, give me
//! the status and body". Keeping that behind a trait lets tests substitute an
//! in-memory fake for the real client.

use std::time::Duration;

use cicd_core::ProviderConfig;

use crate::error::PipelineError;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    /// 1xx and 2xx count as success; anything from 300 up does not.
    pub fn is_success(&self) -> bool {
        self.status < 300
    }
}

/// Abstraction over the outbound HTTP call.
pub trait Transport {
    /// POST `body` as `application/json` to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Transport`] when no response was received.
    /// A response with a non-success status is *not* an error here.
    fn post_json(&self, url: &str, body: &str) -> Result<HttpReply, PipelineError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone, Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self::new(config.request_timeout_secs.map(Duration::from_secs))
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Transport for UreqTransport {
    fn post_json(&self, url: &str, body: &str) -> Result<HttpReply, PipelineError> {
        let transport_err = |message: String| PipelineError::Transport {
            url: url.to_string(),
            message,
        };

        match self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(body)
        {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| transport_err(format!("reading response body: {e}")))?;
                Ok(HttpReply { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpReply {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(err)) => Err(transport_err(err.to_string())),
        }
    }
}
