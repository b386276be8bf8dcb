//! Wildguard - real-time monitor for an acoustic detection service
//!
//! This library keeps a live, consistent view of a remote gunshot and wildlife
//! detection service: a push channel streams live results, a request channel issues
//! recording and analysis commands, and periodic snapshots fill in aggregate data.
//!
//! Start from [`session::MonitoringSession`].

pub mod backend;
pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod detection;
pub mod logging;
pub mod refresh;
pub mod session;
pub mod view;

pub use config::MonitorConfig;
pub use session::MonitoringSession;
pub use view::{ViewState, ViewStore, ViewUpdate};
