mod error;
mod shutdown;

pub mod prelude {
    pub use crate::error::{ConfigurationError, ParseError, TransportError};
    pub use crate::shutdown::{DelegatedShutdownListener, ShutdownHandle, ShutdownSignalError};
}
