//! jsConnect Single Sign-On
//!
//! Identity-provider side of the jsConnect handshake used by forum
//! platforms:
//! - Timestamp and signature validation of the forum's request
//! - Username reconciliation against the forum's user directory
//! - Signed JSONP response rendering
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     jsConnect Handshake                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  Forum ──► JsConnect ──► validate ──► anonymous / signed-in     │
//! │                 │                              │                 │
//! │                 │                              ▼                 │
//! │                 │                      UsernameResolver          │
//! │                 │                       │            │           │
//! │                 ▼                       ▼            ▼           │
//! │  ┌──────────────────┐        ┌────────────┐  ┌──────────────┐   │
//! │  │ sign / JSONP     │        │ normalize  │  │ UserDirectory │   │
//! │  └──────────────────┘        └────────────┘  └──────────────┘   │
//! │                                                     │            │
//! │                                              Forum users API     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod handler;
pub mod normalize;
pub mod reconcile;
pub mod response;
pub mod signature;

// Re-exports
pub use config::{JsConnectConfig, LinkBy, UsernamePolicy};
pub use directory::{HttpDirectory, InMemoryDirectory, RemoteProfile, RemoteUser, UserDirectory, UserSelector};
pub use error::{DirectoryError, JsConnectError, JsConnectResult};
pub use handler::{render_failure, AuthenticatedIdentity, JsConnect, SsoRequest};
pub use reconcile::UsernameResolver;
pub use response::{Rendered, SsoResponse, UserData};
pub use signature::{sign, verify, HashAlgorithm};
