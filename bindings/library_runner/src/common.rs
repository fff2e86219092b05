use std::env;

use bookwind_runner::prelude::{expect, HookResult, RunnerContext, ScenarioContext};

use crate::runner_context::LibraryRunnerContext;

pub const DEFAULT_AUTHOR_NUMBER: &str = "1";
pub const DEFAULT_ISBN: &str = "9782826012092";

/// Choose the author and book the suites read, falling back to the defaults for values that are
/// not given or blank.
pub fn test_data(author_number: Option<String>, isbn: Option<String>) -> LibraryRunnerContext {
    fn non_blank(value: Option<String>, default: &str) -> String {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    LibraryRunnerContext {
        author_number: non_blank(author_number, DEFAULT_AUTHOR_NUMBER),
        isbn: non_blank(isbn, DEFAULT_ISBN),
    }
}

/// Setup hook that reads `AUTHOR_ID` and `BOOK_ISBN` from the environment into the
/// [LibraryRunnerContext].
///
/// ```rust
/// use library_bookwind_runner::prelude::*;
///
/// fn scenario(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
///     let path = endpoints::author(&ctx.get().author_number);
///     let res = ctx.http_get(&path)?;
///     ctx.check(&res, "status is 200", expect::status(200));
///     Ok(())
/// }
/// ```
pub fn configure_test_data(ctx: &mut RunnerContext<LibraryRunnerContext>) -> HookResult {
    log::info!("Setting up test data at: {}", ctx.config().base_url());

    *ctx.get_mut() = test_data(env::var("AUTHOR_ID").ok(), env::var("BOOK_ISBN").ok());

    log::info!(
        "Using author number {} and ISBN {}",
        ctx.get().author_number,
        ctx.get().isbn
    );

    Ok(())
}

/// Request a record that cannot exist and expect the service to say so.
pub fn expect_not_found(ctx: &mut ScenarioContext<LibraryRunnerContext>, path: &str) -> HookResult {
    let res = ctx.http_get(path)?;
    ctx.check(&res, "status is 404", expect::not_found());
    Ok(())
}
