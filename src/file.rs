use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, info, span, warn, Level};

use crate::{
    model::{error::StorageError, http::Response},
    remote::{self, Remote},
};

/// File capability set handed out by a [`crate::Storage`].
pub trait File {
    fn read(&mut self) -> Result<Vec<u8>, StorageError>;

    fn write(&mut self, content: &[u8]) -> Result<(), StorageError>;

    fn close(&mut self) -> Result<(), StorageError>;

    fn size(&self) -> Result<u64, StorageError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenMode {
    mode: String,
    writable: bool,
}

impl OpenMode {
    pub fn parse(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            writable: mode.contains(['w', 'a', '+']),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.mode
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }
}

/// Remote facts learned about a name, shared between a handle and the
/// storage cache entry that points at it.
#[derive(Debug, Default)]
pub struct FileMeta {
    pub size: Option<u64>,
    pub date: Option<String>,
}

impl FileMeta {
    pub(crate) fn record(&mut self, resp: &Response) {
        if let Some(date) = resp.header(remote::HEADER_DATE) {
            self.date = Some(date.to_string());
        }
    }
}

pub(crate) type SharedMeta = Arc<Mutex<FileMeta>>;

pub(crate) fn lock(meta: &SharedMeta) -> Result<MutexGuard<'_, FileMeta>, StorageError> {
    meta.lock().map_err(|_| StorageError::Guard("meta"))
}

/// First call issues a HEAD; every later call returns the stored value.
pub(crate) fn lazy_size(
    remote: &Remote,
    name: &str,
    meta: &SharedMeta,
) -> Result<u64, StorageError> {
    let mut meta = lock(meta)?;
    if let Some(size) = meta.size {
        return Ok(size);
    }

    let resp = remote.head(name)?;
    let size = remote.content_length(name, &resp)?;
    meta.record(&resp);
    meta.size = Some(size);

    Ok(size)
}

pub struct UpyunFile {
    name: String,
    mode: OpenMode,
    buffer: Option<Vec<u8>>,
    dirty: bool,
    meta: SharedMeta,
    remote: Arc<Remote>,
}

impl UpyunFile {
    pub(crate) fn new(name: &str, mode: OpenMode, remote: Arc<Remote>, meta: SharedMeta) -> Self {
        Self {
            name: name.to_string(),
            mode,
            buffer: Some(Vec::new()),
            dirty: false,
            meta,
            remote,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> &OpenMode {
        &self.mode
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_closed(&self) -> bool {
        self.buffer.is_none()
    }
}

impl File for UpyunFile {
    /// Always fetches the remote content; the local buffer is never served.
    fn read(&mut self) -> Result<Vec<u8>, StorageError> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(name = %self.name, "called");

        if self.is_closed() {
            return Err(StorageError::Closed(self.name.clone()));
        }

        let resp = match self.remote.get(&self.name) {
            Err(err) => {
                error!(error_message=%err, error_group="get_object");
                return Err(err);
            }
            Ok(resp) => resp,
        };

        if resp.status != 200 {
            warn!(name = %self.name, status = resp.status, "unexpected status");
        }

        lock(&self.meta)?.record(&resp);
        self.buffer = Some(resp.body.clone());

        Ok(resp.body)
    }

    /// Replaces the buffer with `content`. Nothing is sent until `close`.
    fn write(&mut self, content: &[u8]) -> Result<(), StorageError> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(name = %self.name, len = content.len(), "called");

        if !self.mode.is_writable() {
            error!(
                error_message = "read-only handle",
                error_group = "write",
                mode = self.mode.as_str()
            );
            return Err(StorageError::ReadOnly);
        }

        if self.is_closed() {
            return Err(StorageError::Closed(self.name.clone()));
        }

        self.buffer = Some(content.to_vec());
        self.dirty = true;

        Ok(())
    }

    /// Uploads the buffer when dirty, then releases it. A failed upload
    /// leaves the handle open and dirty.
    fn close(&mut self) -> Result<(), StorageError> {
        let span = span!(Level::INFO, "close", context = "close");
        let _e = span.enter();
        info!(name = %self.name, dirty = self.dirty, "called");

        let buffer = match &self.buffer {
            None => return Ok(()),
            Some(buffer) => buffer,
        };

        if self.dirty {
            if let Err(err) = self.remote.put(&self.name, buffer.clone()) {
                error!(error_message=%err, error_group="put_object");
                return Err(err);
            }
        }

        self.buffer = None;
        self.dirty = false;

        Ok(())
    }

    fn size(&self) -> Result<u64, StorageError> {
        lazy_size(&self.remote, &self.name, &self.meta)
    }
}

impl Drop for UpyunFile {
    fn drop(&mut self) {
        if self.dirty {
            warn!(name = %self.name, "dropped with unflushed content");
        }
    }
}
