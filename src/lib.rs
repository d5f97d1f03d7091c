pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod http;
pub mod login;
pub mod region;
pub mod request;
pub mod runtime;
pub mod signer;

pub use client::Gs2Client;
pub use config::ClientConfig;
pub use credential::Credential;
pub use error::{Error, ErrorKind, Result};
pub use http::{Response, RetryPolicy};
pub use region::Region;
pub use request::{Method, Operation};
pub use signer::Signer;
