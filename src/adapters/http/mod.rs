//! HTTP adapters for the account REST API.

mod account_api;

pub use account_api::{AccountApiConfig, HttpAccountApi};
