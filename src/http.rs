//! Blocking HTTP transport for the battle service.

use std::error::Error;
use std::io::{self, Read};

use crate::client::{Method, RawResponse, ServiceRequest, Transport};
use crate::config::ServiceConfig;
use crate::error::NetworkError;

pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ServiceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout()).build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, request: &ServiceRequest) -> String {
        format!("{}{}", self.base_url, request.endpoint.path(&request.battle))
    }
}

fn read_body(response: ureq::Response) -> Result<RawResponse, NetworkError> {
    let status = response.status();
    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(io_error)?;
    Ok(RawResponse { status, body })
}

fn is_timeout(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

fn io_error(error: io::Error) -> NetworkError {
    if is_timeout(error.kind()) {
        NetworkError::Timeout
    } else {
        NetworkError::Unreachable(error.to_string())
    }
}

fn transport_error(error: ureq::Transport) -> NetworkError {
    let timed_out = error
        .source()
        .and_then(|source| source.downcast_ref::<io::Error>())
        .is_some_and(|io| is_timeout(io.kind()));
    if timed_out {
        NetworkError::Timeout
    } else {
        NetworkError::Unreachable(error.to_string())
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, request: &ServiceRequest) -> Result<RawResponse, NetworkError> {
        let url = self.url(request);
        let result = match (request.endpoint.method(), &request.body) {
            (Method::Get, _) => self.agent.get(&url).call(),
            (Method::Post, Some(body)) => self.agent.post(&url).send_json(body),
            (Method::Post, None) => self
                .agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string("{}"),
        };
        match result {
            Ok(response) => read_body(response),
            // Error statuses still carry the service's envelope.
            Err(ureq::Error::Status(_, response)) => read_body(response),
            Err(ureq::Error::Transport(error)) => Err(transport_error(error)),
        }
    }
}
