//! Typed client for the DocBase REST API.
//!
//! ```no_run
//! # async fn run() -> Result<(), docbase::Error> {
//! use docbase::{Client, Config, Context};
//!
//! let cfg = Config::from_env().map_err(docbase::Error::InvalidRequest)?;
//! let client = Client::from_config(&cfg)?;
//! let (posts, resp) = client
//!     .posts()
//!     .list()
//!     .query("tag:rust")
//!     .per_page(20)
//!     .send(&Context::background())
//!     .await?;
//! println!("{} posts, next page: {:?}", posts.len(), resp.meta.and_then(|m| m.next()));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod http;
pub mod services;
pub mod types;

pub use client::{Client, ClientBuilder};
pub use config::Config;
pub use http::context::{CancelHandle, Context};
pub use http::error::{ApiError, Error, RateLimitError};
pub use http::rate::Rate;
pub use http::request::{add_options, ApiRequest};
pub use http::transport::{TokenTransport, Transport};
pub use http::{ListOptions, Meta, Response, Target};
