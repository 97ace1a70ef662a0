pub mod date;
pub mod endpoint;
