use tracing::debug;

use crate::{
    adapters::Transport,
    config::Config,
    model::{
        error::StorageError,
        http::{BasicAuth, Method, Request, Response},
    },
    util,
};

pub const HEADER_MKDIR: &str = "Mkdir";
pub const HEADER_CONTENT_LENGTH: &str = "Content-Length";
pub const HEADER_DATE: &str = "Date";

pub const DELETE_CONFIRMATION: &[u8] = b"true";

/// Configuration plus transport, shared by the storage and every handle it
/// opens.
pub struct Remote {
    config: Config,
    transport: Box<dyn Transport>,
}

impl Remote {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoint(&self, name: &str) -> String {
        util::endpoint::endpoint(self.config.api_url(), self.config.bucket(), name)
    }

    fn request(
        &self,
        method: Method,
        name: &str,
        headers: Vec<(String, String)>,
        body: Option<Vec<u8>>,
    ) -> Result<Response, StorageError> {
        let url = self.endpoint(name);
        debug!(method=%method, url=%url, "request");

        let resp = self.transport.send(Request {
            method,
            url,
            headers,
            body,
            auth: BasicAuth {
                username: self.config.account().to_string(),
                password: self.config.password().to_string(),
            },
        })?;

        debug!(method=%method, status=resp.status, "response");
        Ok(resp)
    }

    /// Uploads `body`, asking the service to create missing parent
    /// directories.
    pub fn put(&self, name: &str, body: Vec<u8>) -> Result<(), StorageError> {
        let headers = vec![(HEADER_MKDIR.to_string(), "true".to_string())];
        let resp = self.request(Method::Put, name, headers, Some(body))?;

        if resp.status != 200 {
            return Err(StorageError::Upstream {
                status: resp.status,
                body: String::from_utf8_lossy(&resp.body).to_string(),
            });
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Response, StorageError> {
        self.request(Method::Get, name, Vec::new(), None)
    }

    pub fn head(&self, name: &str) -> Result<Response, StorageError> {
        self.request(Method::Head, name, Vec::new(), None)
    }

    pub fn delete(&self, name: &str) -> Result<(), StorageError> {
        let resp = self.request(Method::Delete, name, Vec::new(), None)?;

        if resp.body != DELETE_CONFIRMATION {
            return Err(StorageError::DeleteRejected);
        }

        Ok(())
    }

    pub fn content_length(&self, name: &str, resp: &Response) -> Result<u64, StorageError> {
        let value = resp
            .header(HEADER_CONTENT_LENGTH)
            .ok_or_else(|| StorageError::MissingHeader {
                name: name.to_string(),
                header: HEADER_CONTENT_LENGTH,
            })?;

        value
            .trim()
            .parse::<u64>()
            .map_err(|_| StorageError::InvalidHeader {
                name: name.to_string(),
                header: HEADER_CONTENT_LENGTH,
                value: value.to_string(),
            })
    }
}
