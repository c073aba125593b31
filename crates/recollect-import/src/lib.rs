//! Sequential batch upload of a parsed conversation to a memory store.
//!
//! The flow is: optional [`auth::bootstrap`], then [`import_messages`], which
//! prechecks the store, partitions the selection into fixed-size batches and
//! posts them one at a time, folding each [`BatchOutcome`] into an
//! [`ImportTally`].

pub mod auth;
mod batch;
mod config;
mod error;
mod payload;
mod run;
mod transport;

pub use auth::{bootstrap, Account};
pub use batch::{partition, select, Batch, IndexedMessage};
pub use config::{
    AuthConfig, ImportConfig, DEFAULT_BASE_URL, DEFAULT_BATCH_SIZE, DEFAULT_PAUSE,
    DEFAULT_PLATFORM, STRING_KEYS,
};
pub use error::{ConfigError, ImportError};
pub use payload::{
    import_overlay, ImportData, ImportMessage, ImportOptions, ImportRequest, ImportResponse,
    RequestSettings, IMPORT_SOURCE,
};
pub use run::{
    import_messages, precheck, BatchOutcome, BatchReport, ImportReport, ImportTally, RunPlan,
};
pub use transport::{
    AuthTransport, CookieJar, HttpTransport, ImportTransport, Reply, IMPORT_PATH,
    LOGIN_PATH, REGISTER_PATH, SITE_PASSWORD_PATH, STATUS_PATH,
};
