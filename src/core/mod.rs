//! Core engine: snapshot model, derived metrics, provider tables, poller,
//! session state, and action dispatch.

pub mod actions;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod registry;
pub mod session;
pub mod snapshot;

pub use actions::ActionDispatcher;
pub use metrics::{Severity, Theme};
pub use poller::Poller;
pub use registry::{LoginAction, ProviderMetadata};
pub use session::{PublishedState, Session};
pub use snapshot::{
    DEFAULT_PROVIDER, IdentityInfo, ProviderEntry, StatusInfo, UsageWindow, WidgetSnapshot,
};
