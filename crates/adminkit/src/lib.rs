//! # adminkit
//!
//! Minimal Google Workspace admin client for audit tooling.
//!
//! This crate provides:
//! - **Credentials**: service account keys with domain-wide delegation ([`Credentials`])
//! - **Auth**: RS256 JWT bearer assertions exchanged for cached access tokens ([`Authenticator`])
//! - **Workspace**: one trait over the Directory, Reports, Drive and Gmail settings APIs ([`Workspace`])
//! - **Paging**: token-following iteration with an inter-page delay ([`Pager`])
//! - **Mock**: an in-memory [`Workspace`] for tests ([`MockWorkspace`])
//!
//! ## Example
//!
//! ```no_run
//! use adminkit::{Credentials, HttpWorkspace, Pager, Workspace, scopes};
//! use std::path::Path;
//!
//! let creds = Credentials::from_file(Path::new("service_account.json"), scopes::DIRECTORY)?
//!     .with_subject("admin@example.com");
//! let workspace = HttpWorkspace::new(creds);
//!
//! let users = Pager::new(100, |page| workspace.list_users(page)).collect_all()?;
//! println!("{} users", users.len());
//! # Ok::<(), adminkit::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod auth;
pub mod credentials;
pub mod error;
pub mod http;
pub mod mock;
pub mod pager;
pub mod scopes;
pub mod types;

pub use api::Workspace;
pub use auth::Authenticator;
pub use credentials::{Credentials, ServiceAccountKey};
pub use error::{Error, ErrorCategory, Result};
pub use http::{Endpoints, HttpWorkspace};
pub use mock::{MockWorkspace, Mutation};
pub use pager::Pager;
pub use types::{FileQuery, Page, PageRequest};
