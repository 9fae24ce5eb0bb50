//! Biolink Entitlements
//!
//! Plan tiers, feature limits and subscription sync for the bio-link page
//! builder. Editors ask this crate whether an action is allowed (another quick
//! link, a custom theme, the analytics view) and send the user to the upgrade
//! flow when it is not.
//!
//! ## Library
//!
//! ```rust,ignore
//! use biolink_entitlements::application::PlanSession;
//! use biolink_entitlements::domain::FeatureKey;
//! use biolink_entitlements::infrastructure::{InMemorySubscriptionStore, SessionIdentity};
//! use std::sync::Arc;
//!
//! let identity = Arc::new(SessionIdentity::new());
//! identity.sign_in("uid-123");
//! let mut session = PlanSession::new(Arc::new(InMemorySubscriptionStore::new()), identity);
//! session.refresh().await?;
//! if !session.is_under_limit(FeatureKey::MaxLinks, links.len() as u32) {
//!     // redirect to the upgrade page
//! }
//! ```
//!
//! ## Standalone
//!
//! Run the binary:
//! ```bash
//! biolink-entitlements-server
//! ```
//!
//! ## Embedded (Axum)
//!
//! When the `server` feature is enabled, the router can be nested in a larger app:
//! ```rust,ignore
//! use axum::Router;
//! use biolink_entitlements::infrastructure::AppConfig;
//! use biolink_entitlements::server::{build_state_with_pool, router};
//! use sqlx::PgPool;
//!
//! let cfg = AppConfig::from_env()?;
//! let pool = PgPool::connect(cfg.database_url.as_deref().unwrap_or_default()).await?;
//! let state = build_state_with_pool(&cfg, pool, true).await?;
//! let app = Router::new().nest("/entitlements", router(state));
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

// Enabled behind the `server` feature so the core library can be used without Axum.
#[cfg(feature = "server")]
pub mod server;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;

#[cfg(feature = "server")]
pub use server::*;
