//! Code delivery facade.

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod facade;
pub(crate) mod traits;

pub use config::{SmsFacadeConfig, SmsFacadeConfigBuilder};
pub use error::{AggregateHealthError, SendAuthCodeError, SendSmsError};
pub use facade::SmsFacade;
pub use traits::AuthCodeService;
