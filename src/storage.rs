use std::{
    collections::HashMap,
    io::Read,
    sync::{Arc, Mutex},
};

use time::PrimitiveDateTime;
use tracing::{error, info, span, Level};

use crate::{
    adapters::Transport,
    config::Config,
    file::{self, OpenMode, SharedMeta, UpyunFile},
    model::error::StorageError,
    remote::{self, Remote},
    util,
};

/// Storage capability set a pluggable file-storage backend provides.
pub trait Storage {
    type File: file::File;

    fn save(&self, name: &str, content: &mut dyn Read) -> Result<String, StorageError>;

    fn open(&self, name: &str, mode: &str) -> Result<Self::File, StorageError>;

    fn delete(&self, name: &str) -> Result<(), StorageError>;

    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    fn size(&self, name: &str) -> Result<u64, StorageError>;

    fn modified_time(&self, name: &str) -> Result<PrimitiveDateTime, StorageError>;

    fn url(&self, name: &str) -> String;
}

/// Storage backed by the UpYun REST API. Every opened handle is remembered
/// by name for the lifetime of the storage; entries are never evicted.
pub struct UpyunStorage {
    remote: Arc<Remote>,
    cache: Mutex<HashMap<String, SharedMeta>>,
}

impl UpyunStorage {
    pub fn new(config: Config, transport: Box<dyn Transport>) -> Self {
        Self {
            remote: Arc::new(Remote::new(config, transport)),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        self.remote.config()
    }

    pub fn endpoint(&self, name: &str) -> String {
        self.remote.endpoint(name)
    }

    fn cached(&self, name: &str) -> Result<Option<SharedMeta>, StorageError> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| StorageError::Guard("cache"))?;

        Ok(cache.get(name).cloned())
    }
}

impl Storage for UpyunStorage {
    type File = UpyunFile;

    fn save(&self, name: &str, content: &mut dyn Read) -> Result<String, StorageError> {
        let span = span!(Level::INFO, "save", context = "save");
        let _e = span.enter();
        info!(name = name, "called");

        let mut body = Vec::new();
        content.read_to_end(&mut body)?;

        if let Err(err) = self.remote.put(name, body) {
            error!(error_message=%err, error_group="put_object");
            return Err(err);
        }

        Ok(name.to_string())
    }

    fn open(&self, name: &str, mode: &str) -> Result<UpyunFile, StorageError> {
        let span = span!(Level::INFO, "open", context = "open");
        let _e = span.enter();
        info!(name = name, mode = mode, "called");

        let meta = SharedMeta::default();
        self.cache
            .lock()
            .map_err(|_| StorageError::Guard("cache"))?
            .insert(name.to_string(), meta.clone());

        Ok(UpyunFile::new(
            name,
            OpenMode::parse(mode),
            self.remote.clone(),
            meta,
        ))
    }

    /// Succeeds only when the service answers with the body `true`.
    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(name = name, "called");

        if let Err(err) = self.remote.delete(name) {
            error!(error_message=%err, error_group="delete_object");
            return Err(err);
        }

        Ok(())
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let span = span!(Level::INFO, "exists", context = "exists");
        let _e = span.enter();
        info!(name = name, "called");

        let resp = self.remote.head(name)?;

        Ok(resp.status == 200)
    }

    /// A name opened through this storage reports its handle's cached size.
    fn size(&self, name: &str) -> Result<u64, StorageError> {
        let span = span!(Level::INFO, "size", context = "size");
        let _e = span.enter();
        info!(name = name, "called");

        if let Some(meta) = self.cached(name)? {
            return file::lazy_size(&self.remote, name, &meta);
        }

        let resp = self.remote.head(name)?;
        self.remote.content_length(name, &resp)
    }

    /// Local wall-clock time of the `Date` header seen for an opened name.
    /// Names never opened through this storage are not looked up remotely.
    fn modified_time(&self, name: &str) -> Result<PrimitiveDateTime, StorageError> {
        let span = span!(Level::INFO, "modified_time", context = "modified_time");
        let _e = span.enter();
        info!(name = name, "called");

        let meta = match self.cached(name)? {
            None => {
                error!(error_message = "cache miss", error_group = "modified_time", name = name);
                return Err(StorageError::NotCached(name.to_string()));
            }
            Some(meta) => meta,
        };

        let mut meta = file::lock(&meta)?;
        if meta.date.is_none() {
            let resp = self.remote.head(name)?;
            meta.record(&resp);
        }

        let value = meta.date.clone().ok_or_else(|| StorageError::MissingHeader {
            name: name.to_string(),
            header: remote::HEADER_DATE,
        })?;

        let date =
            util::date::parse_http_date(&value).map_err(|_| StorageError::InvalidHeader {
                name: name.to_string(),
                header: remote::HEADER_DATE,
                value: value.clone(),
            })?;

        Ok(util::date::to_local_naive(date))
    }

    fn url(&self, name: &str) -> String {
        name.to_string()
    }
}
