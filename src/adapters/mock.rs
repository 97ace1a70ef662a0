use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use crate::{adapters, model};

/// In-memory transport answering from a queue of canned responses. Every
/// request it receives is recorded. An empty queue answers `200` with an
/// empty body.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<model::http::Response>>>,
    requests: Arc<Mutex<Vec<model::http::Request>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: model::http::Response) {
        self.responses
            .lock()
            .expect("failed to acquire `responses` guard")
            .push_back(response);
    }

    pub fn requests(&self) -> Vec<model::http::Request> {
        self.requests
            .lock()
            .expect("failed to acquire `requests` guard")
            .clone()
    }

    pub fn count(&self, method: model::http::Method) -> usize {
        self.requests()
            .iter()
            .filter(|req| req.method == method)
            .count()
    }
}

impl adapters::Transport for MockTransport {
    fn send(
        &self,
        request: model::http::Request,
    ) -> Result<model::http::Response, model::error::StorageError> {
        self.requests
            .lock()
            .map_err(|err| model::error::StorageError::Transport(err.to_string()))?
            .push(request);

        let next = self
            .responses
            .lock()
            .map_err(|err| model::error::StorageError::Transport(err.to_string()))?
            .pop_front();

        Ok(next.unwrap_or_else(|| model::http::Response::new(200, Vec::new())))
    }
}
