pub mod api;
pub mod client;
pub mod collection;
pub mod datetime;
pub mod error;
pub mod models;
pub mod transport;
pub mod update_data;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::{Error, Result};
pub use models::*;

// API facade re-exports
pub use api::{Api, IssueApi, SearchApi, TransitionQuery, TransitionsApi, WorklogApi};

// Transport re-exports
pub use transport::{ProgressFn, Query, Transport};

// Payload and pagination re-exports
pub use collection::Page;
pub use update_data::{FieldOperation, OperationKind, OperationOrder, UpdateData};
