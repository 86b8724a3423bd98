//! Core of calplan: event sync and mutation against a remote calendar.
//!
//! - `palette` and `classify` decide how ingested events are colored and drawn
//! - `template` keeps a persisted, reorderable list of event shapes
//! - `sync` owns the local event cache and every remote round trip
//! - `remote` is the boundary that provider crates implement

pub mod classify;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod kv;
pub mod palette;
pub mod remote;
pub mod split;
pub mod sync;
pub mod template;

pub use classify::{BackgroundMode, Category, Classifier, Origin};
pub use config::{CalPlanConfig, GoogleConfig};
pub use date_range::{DateRange, WeekShift, shift_week, week_window};
pub use error::{CalPlanError, CalPlanResult};
pub use event::{CalendarEvent, DisplayMode, EventTime, RenderHints};
pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use remote::{
    AccessToken, AuthProvider, CalendarService, EventDateTime, EventQuery, EventResource,
    TaskQuery, TaskResource,
};
pub use split::{DEFAULT_SPLIT_PERCENT, split_bounds};
pub use sync::{MAX_RETRIES, SyncEngine, SyncOutcome, SyncSession};
pub use template::{EventTemplate, NavigateDirection, TemplateStore};
