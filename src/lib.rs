pub mod banner;
pub mod config;
pub mod host;
pub mod models;
pub mod protocol;
pub mod redirect;
pub mod storage;
