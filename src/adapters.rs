use crate::model;

pub mod http;
pub mod mock;

pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: model::http::Request,
    ) -> Result<model::http::Response, model::error::StorageError>;
}
