//! Infrastructure Manager client
//!
//! This crate exposes the REST API of the Infrastructure Manager (IM) as a
//! small object API: a client, the infrastructures it manages and their
//! virtual machines. Each remote call is a single HTTP round trip whose
//! outcome is an [`ImResponse`]: the typed payload on success, the service
//! message on failure.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   ImClient                    │
//! │  version / list / create / import             │
//! │  (base URL + AuthData + reqwest::Client)      │
//! └───────────────┬──────────────────────────────┘
//!                 │ mints
//! ┌───────────────▼──────────────┐
//! │        Infrastructure         │──┐
//! │ state / add / reconfigure ... │  │ trait CloudResource
//! └───────────────┬──────────────┘  │ destroy / info / property
//!                 │ owns vms         │ start / stop / contmsg
//! ┌───────────────▼──────────────┐  │
//! │        VirtualMachine         │──┘
//! │  reboot / snapshot / alter    │
//! └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use im_client::{AuthData, AuthDataItem, CloudResource, ImClient, TemplateType};
//!
//! let auth = AuthData::new(vec![
//!     AuthDataItem::new("im", "InfrastructureManager")
//!         .with_field("username", "user")
//!         .with_field("password", "pass"),
//!     AuthDataItem::new("dummy", "Dummy"),
//! ])?;
//! let im = ImClient::new("https://im.example.com:8800", auth);
//!
//! let response = im.create_infrastructure(radl, TemplateType::Radl).await?;
//! let mut inf = response.into_result()?;
//! inf.get_state().await?;
//! inf.destroy(false, false).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod resource;
pub mod response;
pub mod template;
pub mod vm;

// Re-exports
pub use auth::{AuthData, AuthDataItem};
pub use client::ImClient;
pub use config::{ClientConfig, find_auth_file};
pub use error::{ImError, Result};
pub use infrastructure::{Infrastructure, InfrastructureState};
pub use resource::CloudResource;
pub use response::ImResponse;
pub use template::TemplateType;
pub use vm::VirtualMachine;
