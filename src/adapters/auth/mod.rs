//! Authentication adapters.
//!
//! - `StaticTokenProvider` - In-process holder of the current bearer token

mod static_token;

pub use static_token::StaticTokenProvider;
