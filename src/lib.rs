pub mod adapters;
pub mod config;
pub mod file;
pub mod model;
pub mod remote;
pub mod storage;
pub mod util;

pub use config::Config;
pub use file::{File, OpenMode, UpyunFile};
pub use model::error::StorageError;
pub use storage::{Storage, UpyunStorage};
