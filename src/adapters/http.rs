use std::collections::HashMap;

use tokio::runtime::Runtime;

use crate::{adapters, model};

/// Blocking transport over an async `reqwest` client. Each call is driven to
/// completion on the transport's own runtime, so it must not be invoked from
/// inside another tokio runtime.
pub struct HttpTransport {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpTransport {
    pub fn new() -> Result<Self, model::error::StorageError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| {
                model::error::StorageError::Transport(format!(
                    "failed to build runtime, {}",
                    err
                ))
            })?;

        let client = reqwest::Client::builder().build().map_err(|err| {
            model::error::StorageError::Transport(format!("failed to build client, {}", err))
        })?;

        Ok(Self { client, runtime })
    }

    fn method(method: model::http::Method) -> reqwest::Method {
        match method {
            model::http::Method::Get => reqwest::Method::GET,
            model::http::Method::Put => reqwest::Method::PUT,
            model::http::Method::Delete => reqwest::Method::DELETE,
            model::http::Method::Head => reqwest::Method::HEAD,
        }
    }
}

impl adapters::Transport for HttpTransport {
    fn send(
        &self,
        request: model::http::Request,
    ) -> Result<model::http::Response, model::error::StorageError> {
        let mut req = self
            .client
            .request(Self::method(request.method), &request.url)
            .basic_auth(&request.auth.username, Some(&request.auth.password));

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        let method = request.method;
        let url = request.url;

        self.runtime.block_on(async move {
            let resp = req.send().await.map_err(|err| {
                model::error::StorageError::Transport(format!(
                    "{} {}, {}",
                    method, url, err
                ))
            })?;

            let status = resp.status().as_u16();
            let mut headers = HashMap::new();
            for (name, value) in resp.headers() {
                headers.insert(
                    name.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(value.as_bytes()).to_string(),
                );
            }

            let body = resp.bytes().await.map_err(|err| {
                model::error::StorageError::Transport(format!(
                    "failed to collect body: {}, {}",
                    url, err
                ))
            })?;

            Ok(model::http::Response {
                status,
                headers,
                body: body.to_vec(),
            })
        })
    }
}
