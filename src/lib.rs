//! `psdb-http` is an async HTTP client for a psdb-style SQL proxy.
//!
//! Statements are sent to the `Execute` endpoint together with the session
//! returned by the previous call, and packed result rows are decoded into
//! typed values:
//! - [`Connection::execute`] runs a statement and carries the session forward
//! - [`Connection::refresh`] creates a session up front
//! - [`Client::execute`] runs a one-off statement on a fresh connection
//!
//! Type handling ([`Cast`]), query formatting ([`Format`]) and the HTTP call
//! itself ([`Transport`]) are injected through [`Config`].

mod cast;
mod client;
mod config;
mod decode;
mod error;
mod format;
mod params;
mod row;
mod session;
mod transport;
mod types;
mod value;
mod wire;

pub use cast::{cast, Cast, DefaultCast};
pub use client::{connect, Client, Connection, USER_AGENT};
pub use config::Config;
pub use error::{BoxError, DatabaseError, PsdbError, VitessError};
pub use format::{format, hex, sanitize, DefaultFormat, Format};
pub use params::Params;
pub use row::Row;
pub use session::Session;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use types::{ExecutedQuery, Field, FieldType};
pub use value::Value;

pub type Result<T> = std::result::Result<T, PsdbError>;
