mod common;

pub mod endpoints;
mod runner_context;
mod search;

pub mod prelude {
    /// Common operations for library API scenarios.
    ///
    /// This is a good place to start if you are getting started writing scenarios.
    pub use crate::common::*;

    pub use crate::endpoints;
    pub use crate::runner_context::LibraryRunnerContext;
    pub use crate::search::{BookSearchRequest, Page, SearchQuery};

    /// Re-export of the `bookwind_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your scenarios.
    pub use bookwind_runner::prelude::*;

    /// Re-export of the instrumented client for convenience.
    pub use bookwind_http_client::prelude::*;
}
