//! `cobblerclient` is a typed client for the XML-RPC API of the Cobbler provisioning server.
//!
//! # Overview
//!
//! Cobbler manages the objects that network installs are built from: distros, profiles,
//! systems and a handful of supporting item kinds. Its API is a flat list of RPC methods that
//! speak in loosely-typed values. This crate turns that into:
//! - Typed entities with explicit handling of values inherited from a parent item
//! - Generic create, read, update, delete, rename and copy operations for every item kind
//! - Deterministic write-back of an entity's fields, honoring server version differences
//! - Background actions such as sync, import and buildiso, with task status polling
//!
//! # Key Features
//!
//! - **Inheritance aware**: [`value::Inheritable`] keeps "take it from the parent" distinct
//!   from an explicit empty value, in both directions
//! - **Version aware**: the server version is fetched once and gates call shapes and fields
//!   that older servers do not understand
//! - **Pluggable transport**: [`transport::Transport`] hides the RPC envelope, so tests can use
//!   [`transport::MockTransport`] instead of a server
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use cobblerclient::{
//!     client::CobblerClient,
//!     models::{Distro, Profile},
//!     value::Inheritable,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CobblerClient::new("http://cobbler.example.com/cobbler_api");
//!     client.login("cobbler", "cobbler").await?;
//!
//!     // Register a distro
//!     let distro = Distro::new(
//!         "centos9-x86_64",
//!         "/srv/images/centos9/vmlinuz",
//!         "/srv/images/centos9/initrd.img",
//!     );
//!     client.create(&distro).await?;
//!
//!     // Build a profile on top of it, overriding one inherited value
//!     let mut profile = Profile::new("centos9-web", "centos9-x86_64");
//!     profile.virt_ram = Inheritable::explicit(2048);
//!     let profile = client.create(&profile).await?;
//!     println!("{} sits at depth {}", profile.item.name, profile.item.depth);
//!
//!     client.sync().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface of `cobblerctl`
//! - [`client`] - The client and its operations
//! - [`config`] - Connection configuration
//! - [`models`] - Typed entities and their field tables
//! - [`sync`] - Writing entities back to the server
//! - [`transport`] - The boundary with the RPC layer
//! - [`value`] - Inheritable values
//! - [`wire`] - The loosely-typed value tree and its conversions

#![warn(missing_docs)]

mod error;
mod version;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod cli;
pub mod client;
pub mod config;
pub mod models;
pub mod sync;
pub mod transport;
pub mod value;
pub mod wire;

pub use error::*;
pub use version::*;
