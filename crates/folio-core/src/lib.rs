//! Shared foundations for the Folio relay: configuration, errors,
//! conversation types, and the clock/id seams used for stamping records.

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, IdGenerator, SystemClock, UuidGenerator};
pub use config::FolioConfig;
pub use error::{FolioError, Result};
pub use types::*;
