//! # quickmemo-client
//!
//! [`MemoService`](quickmemo_core::MemoService) implementation for a
//! self-hosted memo server's REST API (`/api/v1`).
//!
//! Server responses come in several shapes across API versions: bodies may be
//! wrapped in `data` or `resource`, memos may carry a canonical `name` or only
//! a legacy `id`. All of that is resolved in [`wire`], so callers only ever
//! see the normalized [`Memo`](quickmemo_core::Memo) and
//! [`ResourceRef`](quickmemo_core::ResourceRef).
//!
//! # Example
//!
//! ```rust,no_run
//! use quickmemo_client::MemosClient;
//! use quickmemo_core::{Credentials, MemoService, Visibility};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = MemosClient::from_env().unwrap();
//!     let creds = Credentials::new("https://memos.example.com/", "token");
//!     let memo = client
//!         .create_memo(&creds, "hello", Visibility::Private)
//!         .await
//!         .unwrap();
//!     println!("{}", memo.name);
//! }
//! ```

pub mod client;
pub mod wire;

pub use client::{ClientConfig, MemosClient};
