use bookwind_runner::prelude::UserValuesConstraint;

/// Identifiers of the records the suites read. Filled in by [crate::prelude::configure_test_data].
#[derive(Default, Debug)]
pub struct LibraryRunnerContext {
    pub author_number: String,
    pub isbn: String,
}

impl UserValuesConstraint for LibraryRunnerContext {}
