use library_bookwind_runner::prelude::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

fn complete_author_retrieval_flow(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::author(&ctx.get().author_number);
    let res = ctx.http_get(&path)?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response is not empty", expect::body_not_empty());

    // An empty deployment answers 404, which has no data to look at.
    if res.status == 200 {
        ctx.check(&res, "response contains data", expect::body_longer_than(10));
    }

    Ok(())
}

fn author_search_by_name(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_get_with_query(&endpoints::authors(), &[("name", "Test")])?;
    ctx.check(&res, "status is 200", expect::status(200));
    Ok(())
}

fn get_specific_author(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::author(&ctx.get().author_number);
    let res = ctx.http_get(&path)?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response has content", expect::body_not_empty());

    Ok(())
}

fn author_not_found(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    expect_not_found(ctx, &endpoints::author(endpoints::NONEXISTENT_AUTHOR_NUMBER))
}

fn get_books_by_author(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::author_books(&ctx.get().author_number);
    let res = ctx.http_get(&path)?;
    ctx.check(&res, "status is 200", expect::status(200));
    Ok(())
}

fn get_top_authors_by_lendings(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_get(&endpoints::top_authors())?;
    ctx.check(&res, "status is 404 or 200", expect::status_in(&[404, 200]));
    Ok(())
}

fn cache_for_top_authors(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let verdict = CacheProbe::new(endpoints::top_authors())
        .with_quiescence(Duration::from_millis(50))
        .run(ctx)?;
    log::debug!("Top authors cache probe: {:?}", verdict);
    Ok(())
}

fn teardown(_ctx: Arc<RunnerContext<LibraryRunnerContext>>) -> HookResult {
    log::info!("Author system tests completed");
    Ok(())
}

fn author_suite(
    builder: ScenarioDefinitionBuilder<LibraryRunnerContext>,
) -> ScenarioDefinitionBuilder<LibraryRunnerContext> {
    builder
        .with_default_thresholds(Thresholds::new(3000, 0.5).with_max_http_failure_rate(0.5))
        .add_capture_env("AUTHOR_ID")
        .use_setup(configure_test_data)
        .use_scenario("testCompleteAuthorRetrievalFlow", complete_author_retrieval_flow)
        .use_scenario("testAuthorSearchByName", author_search_by_name)
        .use_scenario("testGetSpecificAuthor", get_specific_author)
        .use_scenario("testAuthorNotFoundScenario", author_not_found)
        .use_scenario("testGetBooksByAuthor", get_books_by_author)
        .use_scenario("testGetTopAuthorsByLendings", get_top_authors_by_lendings)
        .use_scenario("testRedisCacheForTop5Authors", cache_for_top_authors)
        .use_teardown(teardown)
}

fn main() -> BookwindResult<ExitCode> {
    let builder = author_suite(ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME")));

    let report = run(builder)?;

    Ok(report.exit_code())
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    async fn author(State(author_exists): State<bool>) -> Response {
        if author_exists {
            Json(serde_json::json!({
                "authorNumber": 1,
                "name": "Test Author",
                "bio": "Writes about testing",
            }))
            .into_response()
        } else {
            (StatusCode::NOT_FOUND, "author not found").into_response()
        }
    }

    async fn search_authors(Query(params): Query<HashMap<String, String>>) -> Response {
        if params.get("name").map(String::as_str) == Some("Test") {
            Json(serde_json::json!([{"authorNumber": 1, "name": "Test Author"}])).into_response()
        } else {
            StatusCode::BAD_REQUEST.into_response()
        }
    }

    fn library_api(author_exists: bool) -> Router {
        Router::new()
            .route("/api/authors", get(search_authors))
            .route("/api/authors/1", get(author))
            .route(
                "/api/authors/1/books",
                get(|| async { Json(serde_json::json!([{"isbn": DEFAULT_ISBN}])) }),
            )
            .route(
                "/api/authors/99999",
                get(|| async { (StatusCode::NOT_FOUND, "author not found") }),
            )
            .route(
                "/api/authors/top5",
                get(|| async { Json(serde_json::json!([{"name": "Test Author", "lendings": 3}])) }),
            )
            .with_state(author_exists)
    }

    fn start_library_api(author_exists: bool) -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, library_api(author_exists)).await.unwrap();
            });
        });

        addr
    }

    fn cli_for(addr: SocketAddr) -> BookwindCli {
        BookwindCli {
            base_url: Some(format!("http://{addr}/api")),
            no_progress: true,
            pacing_ms: Some(0),
            ..Default::default()
        }
    }

    fn check_names(outcome: &ScenarioOutcome) -> Vec<&str> {
        outcome.checks.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn author_suite_passes_against_populated_api() {
        let addr = start_library_api(true);

        let report = run(author_suite(ScenarioDefinitionBuilder::new(
            "author_system",
            cli_for(addr),
        )))
        .unwrap();

        assert_eq!(7, report.outcomes.len());
        assert!(
            report.outcomes.iter().all(|o| o.overall_passed),
            "{:?}",
            report.outcomes
        );

        let retrieval = report.outcome("testCompleteAuthorRetrievalFlow").unwrap();
        assert_eq!(
            vec!["status is 200", "response is not empty", "response contains data"],
            check_names(retrieval)
        );

        let cache = report.outcome("testRedisCacheForTop5Authors").unwrap();
        assert_eq!(5, cache.checks.len());
        assert_eq!(2, cache.advisories.len());

        assert_eq!(0, report.metrics.error_count);
        assert!(report.passed());
    }

    #[test]
    fn missing_author_skips_data_check() {
        let addr = start_library_api(false);
        let cli = BookwindCli {
            scenarios: vec!["testCompleteAuthorRetrievalFlow".to_string()],
            ..cli_for(addr)
        };

        let report = run(author_suite(ScenarioDefinitionBuilder::new("author_system", cli))).unwrap();

        assert_eq!(1, report.outcomes.len());
        let retrieval = report.outcome("testCompleteAuthorRetrievalFlow").unwrap();
        assert_eq!(
            vec!["status is 200", "response is not empty"],
            check_names(retrieval)
        );
        assert!(!retrieval.checks[0].passed);
        assert!(retrieval.checks[1].passed);
        assert!(!report.verdict.http_failure_rate_passed());
    }
}
