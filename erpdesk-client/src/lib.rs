//! # erpdesk client
//!
//! Session-aware access to the ordering API.
//!
//! The pieces depend on each other leaves first:
//!
//! - [`session::SessionStore`] owns the credentials and writes them through
//!   to a [`storage::CredentialStorage`].
//! - [`public::PublicClient`] talks to the login and refresh endpoints
//!   without a bearer token.
//! - [`refresh::RefreshCoordinator`] makes sure at most one refresh call is
//!   in flight and fans its outcome out to every queued caller.
//! - [`authorized::AuthorizedClient`] injects the bearer token and replays a
//!   request once after a refresh.
//! - [`cache::QueryCache`] caches query results under cache tags and
//!   invalidates them after mutations.
//!
//! [`ErpClient`] wires all of them together.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod authorized;
pub mod cache;
pub mod error;
pub mod public;
pub mod refresh;
pub mod session;
pub mod storage;
pub mod transport;

pub use api::ErpClient;
pub use authorized::AuthorizedClient;
pub use cache::{CacheTag, Mutation, Query, QueryCache, TagKind};
pub use error::{ApiError, ErrorPayload, RefreshError, RequestError, StorageError};
pub use public::{PublicClient, TokenExchange};
pub use refresh::RefreshCoordinator;
pub use session::{Credentials, Session, SessionStore};
pub use storage::{CredentialStorage, FileStorage, MemoryStorage};
pub use transport::{ApiRequest, HttpTransport, RequestExecutor};
