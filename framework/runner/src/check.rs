use std::panic::{catch_unwind, AssertUnwindSafe};

use bookwind_http_client::prelude::ResponseDescriptor;

/// The recorded result of one named check against one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Why the check failed, for the run report. Always `None` for a passing check.
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn passed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: None,
        }
    }

    pub fn failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// What a predicate may return: a plain `bool`, or a fallible `bool` when the predicate has to
/// parse the body first. An `Err` counts as a failed predicate.
pub trait IntoCheckOutcome {
    fn into_check_outcome(self) -> anyhow::Result<bool>;
}

impl IntoCheckOutcome for bool {
    fn into_check_outcome(self) -> anyhow::Result<bool> {
        Ok(self)
    }
}

impl<E> IntoCheckOutcome for Result<bool, E>
where
    E: Into<anyhow::Error>,
{
    fn into_check_outcome(self) -> anyhow::Result<bool> {
        self.map_err(Into::into)
    }
}

type Predicate<'a> = Box<dyn Fn(&ResponseDescriptor) -> anyhow::Result<bool> + 'a>;

/// A logical check made of one or more predicates, all evaluated against the same response.
///
/// ```ignore
/// let check = Check::new("book found")
///     .with(expect::status(200))
///     .with(expect::body_not_empty());
/// ```
pub struct Check<'a> {
    name: String,
    predicates: Vec<Predicate<'a>>,
}

impl<'a> Check<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            predicates: Vec::new(),
        }
    }

    pub fn with<P, O>(mut self, predicate: P) -> Self
    where
        P: Fn(&ResponseDescriptor) -> O + 'a,
        O: IntoCheckOutcome,
    {
        self.predicates
            .push(Box::new(move |res: &ResponseDescriptor| {
                predicate(res).into_check_outcome()
            }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate every predicate, even after one has failed, and fold them into one result.
    ///
    /// A predicate that errors or panics is a failed predicate. This never returns an error.
    pub fn evaluate(&self, response: &ResponseDescriptor) -> CheckResult {
        let mut passed = true;
        let mut problems = Vec::new();

        for predicate in &self.predicates {
            match catch_unwind(AssertUnwindSafe(|| predicate(response))) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => passed = false,
                Ok(Err(e)) => {
                    passed = false;
                    problems.push(e.to_string());
                }
                Err(_) => {
                    passed = false;
                    problems.push("predicate panicked".to_string());
                }
            }
        }

        if passed {
            CheckResult::passed(&self.name)
        } else {
            let mut detail = format!("status {}", response.status);
            for problem in problems {
                detail.push_str(": ");
                detail.push_str(&problem);
            }
            CheckResult::failed(&self.name, detail)
        }
    }
}

/// Ready-made predicates for [Check::with] and [crate::prelude::ScenarioContext::check].
pub mod expect {
    use bookwind_core::prelude::ParseError;
    use bookwind_http_client::prelude::ResponseDescriptor;
    use bytes::Bytes;

    pub fn status(expected: u16) -> impl Fn(&ResponseDescriptor) -> bool {
        move |res| res.status == expected
    }

    /// The status is one of `allowed`. Used where the service's data decides the answer, such as
    /// 200 or 404 for a listing that may be empty.
    pub fn status_in(allowed: &[u16]) -> impl Fn(&ResponseDescriptor) -> bool {
        let allowed = allowed.to_vec();
        move |res| allowed.contains(&res.status)
    }

    pub fn success() -> impl Fn(&ResponseDescriptor) -> bool {
        |res| res.is_success()
    }

    pub fn not_found() -> impl Fn(&ResponseDescriptor) -> bool {
        |res| res.is_not_found()
    }

    pub fn body_not_empty() -> impl Fn(&ResponseDescriptor) -> bool {
        |res| res.body_len() > 0
    }

    pub fn body_longer_than(len: usize) -> impl Fn(&ResponseDescriptor) -> bool {
        move |res| res.body_len() > len
    }

    pub fn body_contains(needle: impl Into<String>) -> impl Fn(&ResponseDescriptor) -> bool {
        let needle = needle.into();
        move |res| res.text().contains(needle.as_str())
    }

    /// Header names are matched ignoring case.
    pub fn header_present(name: impl Into<String>) -> impl Fn(&ResponseDescriptor) -> bool {
        let name = name.into();
        move |res| res.has_header(&name)
    }

    /// The body parses as JSON. Fails with the [ParseError] otherwise.
    pub fn json_body() -> impl Fn(&ResponseDescriptor) -> Result<bool, ParseError> {
        |res| res.json::<serde_json::Value>().map(|_| true)
    }

    pub fn same_status_as(reference: &ResponseDescriptor) -> impl Fn(&ResponseDescriptor) -> bool {
        let expected = reference.status;
        move |res| res.status == expected
    }

    /// Byte-for-byte equality with the body of `reference`.
    pub fn same_body_as(reference: &ResponseDescriptor) -> impl Fn(&ResponseDescriptor) -> bool {
        let expected: Bytes = reference.body.clone();
        move |res| res.body == expected
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;
    use pretty_assertions::assert_eq;

    fn response(status: u16, body: &'static str) -> ResponseDescriptor {
        ResponseDescriptor::new(
            status,
            vec![("ETag".to_string(), "\"abc\"".to_string())],
            body,
            Duration::from_millis(5),
        )
    }

    #[test]
    fn all_predicates_run_after_a_failure() {
        let calls = Cell::new(0);
        let check = Check::new("author found")
            .with(|_: &ResponseDescriptor| {
                calls.set(calls.get() + 1);
                false
            })
            .with(|_: &ResponseDescriptor| {
                calls.set(calls.get() + 1);
                true
            });

        let result = check.evaluate(&response(200, "{}"));

        assert!(!result.passed);
        assert_eq!(2, calls.get());
        assert_eq!(Some("status 200".to_string()), result.detail);
    }

    #[test]
    fn erroring_predicate_is_a_failure() {
        let check = Check::new("body is json").with(expect::json_body());

        let result = check.evaluate(&response(200, "<html>"));

        assert!(!result.passed);
        assert!(result
            .detail
            .unwrap()
            .starts_with("status 200: Failed to parse response body"));
    }

    #[test]
    fn panicking_predicate_is_a_failure() {
        let check = Check::new("first byte").with(|res: &ResponseDescriptor| res.body[10] == b'x');

        let result = check.evaluate(&response(200, "[]"));

        assert_eq!(
            CheckResult::failed("first byte", "status 200: predicate panicked"),
            result
        );
    }

    #[test]
    fn conjunction_of_standard_predicates() {
        let res = response(200, "[{\"isbn\":\"9782826012092\"}]");
        let check = Check::new("top books listed")
            .with(expect::status_in(&[200, 404]))
            .with(expect::success())
            .with(expect::body_longer_than(10))
            .with(expect::body_contains("isbn"))
            .with(expect::header_present("etag"))
            .with(expect::json_body());

        assert_eq!(CheckResult::passed("top books listed"), check.evaluate(&res));
    }

    #[test]
    fn comparison_predicates() {
        let first = response(200, "[1,2,3]");

        assert!(expect::same_body_as(&first)(&response(200, "[1,2,3]")));
        assert!(!expect::same_body_as(&first)(&response(200, "[1,2]")));
        assert!(!expect::same_status_as(&first)(&response(404, "[1,2,3]")));
        assert!(expect::not_found()(&response(404, "")));
        assert!(!expect::body_not_empty()(&response(404, "")));
    }
}
