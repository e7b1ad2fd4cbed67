pub mod asset;
pub mod common;
pub mod request;
pub mod user;
