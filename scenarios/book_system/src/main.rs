use library_bookwind_runner::prelude::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const TEST_TITLE: &str = "Test Book";
const TEST_GENRE: &str = "Fiction";

fn complete_book_retrieval_flow(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let isbn = ctx.get().isbn.clone();
    let res = ctx.http_get(&endpoints::book(&isbn))?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response contains ISBN", |r| {
        let body = r.text();
        body.contains(isbn.as_str()) || body.contains("isbn")
    });
    ctx.check(&res, "response contains title", |r| {
        r.text().contains(TEST_TITLE) || r.body_len() > 0
    });

    Ok(())
}

fn book_search_flow(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_get_with_query(&endpoints::books(), &[("title", TEST_TITLE)])?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response contains results", |r| {
        r.text().contains(TEST_TITLE) || r.body_len() > 2
    });

    Ok(())
}

fn genre_based_book_search(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_get_with_query(&endpoints::books(), &[("genre", TEST_GENRE)])?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response contains Fiction", |r| {
        r.text().contains(TEST_GENRE) || r.body_len() > 2
    });

    Ok(())
}

fn top_books_retrieval_flow(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_get(&endpoints::top_books())?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "response is not empty", expect::body_not_empty());

    Ok(())
}

fn cache_for_top_books(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let verdict = CacheProbe::new(endpoints::top_books())
        .with_quiescence(Duration::from_millis(200))
        .run(ctx)?;
    log::debug!("Top books cache probe: {:?}", verdict);
    Ok(())
}

fn book_not_found(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    expect_not_found(ctx, &endpoints::book(endpoints::NONEXISTENT_ISBN))
}

fn book_photo_retrieval(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::book_photo(&ctx.get().isbn);
    let res = ctx.http_get(&path)?;
    ctx.check(&res, "status is 200 or 404", expect::status_in(&[200, 404]));
    Ok(())
}

fn average_lending_duration(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::book_avg_duration(&ctx.get().isbn);
    let res = ctx.http_get(&path)?;
    ctx.check(
        &res,
        "status is 400 or 200 or 404",
        expect::status_in(&[400, 200, 404]),
    );
    Ok(())
}

fn search_books_with_post(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let res = ctx.http_post_json(&endpoints::book_search(), &BookSearchRequest::by_title("Test"))?;

    ctx.check(&res, "status is 2xx", expect::success());
    ctx.check(&res, "response is not empty", expect::body_not_empty());

    Ok(())
}

fn multiple_sequential_requests_flow(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let search = ctx.http_get_with_query(&endpoints::books(), &[("genre", TEST_GENRE)])?;
    ctx.check(&search, "search status is 200", expect::status(200));
    ctx.pause(Duration::from_millis(50))?;

    let path = endpoints::book(&ctx.get().isbn);
    let details = ctx.http_get(&path)?;
    ctx.check(&details, "details status is 200", expect::status(200));
    ctx.pause(Duration::from_millis(50))?;

    let top = ctx.http_get(&endpoints::top_books())?;
    ctx.check(&top, "top books status is 200", expect::status(200));

    Ok(())
}

fn response_headers_validation(ctx: &mut ScenarioContext<LibraryRunnerContext>) -> HookResult {
    let path = endpoints::book(&ctx.get().isbn);
    let res = ctx.http_get(&path)?;

    ctx.check(&res, "status is 200", expect::status(200));
    ctx.check(&res, "has Content-Type header", expect::header_present("Content-Type"));
    ctx.check(&res, "has ETag header", expect::header_present("ETag"));

    Ok(())
}

fn teardown(_ctx: Arc<RunnerContext<LibraryRunnerContext>>) -> HookResult {
    log::info!("Book system tests completed");
    Ok(())
}

fn book_suite(
    builder: ScenarioDefinitionBuilder<LibraryRunnerContext>,
) -> ScenarioDefinitionBuilder<LibraryRunnerContext> {
    builder
        .with_default_thresholds(Thresholds::new(2000, 0.7).with_max_http_failure_rate(0.7))
        .add_capture_env("BOOK_ISBN")
        .use_setup(configure_test_data)
        .use_scenario("testCompleteBookRetrievalFlow", complete_book_retrieval_flow)
        .use_scenario("testBookSearchFlow", book_search_flow)
        .use_scenario("testGenreBasedBookSearch", genre_based_book_search)
        .use_scenario("testTopBooksRetrievalFlow", top_books_retrieval_flow)
        .use_scenario("testRedisCacheForTop5Books", cache_for_top_books)
        .use_scenario("testBookNotFoundScenario", book_not_found)
        .use_scenario("testBookPhotoRetrieval", book_photo_retrieval)
        .use_scenario("testAverageLendingDurationEndpoint", average_lending_duration)
        .use_scenario("testSearchBooksWithPostRequest", search_books_with_post)
        .use_scenario(
            "testMultipleSequentialRequestsFlow",
            multiple_sequential_requests_flow,
        )
        .use_scenario("testResponseHeadersValidation", response_headers_validation)
        .use_teardown(teardown)
}

fn main() -> BookwindResult<ExitCode> {
    let builder = book_suite(ScenarioDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME")));

    let report = run(builder)?;

    Ok(report.exit_code())
}

#[cfg(test)]
mod test {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::net::SocketAddr;

    type ReceivedSearches = Arc<Mutex<Vec<serde_json::Value>>>;

    fn test_book() -> serde_json::Value {
        serde_json::json!({"isbn": DEFAULT_ISBN, "title": TEST_TITLE, "genre": TEST_GENRE})
    }

    async fn list_books(Query(params): Query<HashMap<String, String>>) -> Response {
        let title = params.get("title").map(String::as_str);
        let genre = params.get("genre").map(String::as_str);
        if title == Some(TEST_TITLE) || genre == Some(TEST_GENRE) {
            Json(serde_json::json!([test_book()])).into_response()
        } else {
            StatusCode::BAD_REQUEST.into_response()
        }
    }

    /// Answers with `201 Created`, which is still a successful search.
    async fn search_books(
        State(received): State<ReceivedSearches>,
        Json(payload): Json<serde_json::Value>,
    ) -> Response {
        received.lock().push(payload);
        (StatusCode::CREATED, Json(serde_json::json!({"items": [test_book()]}))).into_response()
    }

    fn library_api(received: ReceivedSearches) -> Router {
        Router::new()
            .route("/api/books", get(list_books))
            .route(
                &format!("/api/books/{DEFAULT_ISBN}"),
                get(|| async { ([("etag", format!("\"{DEFAULT_ISBN}\""))], Json(test_book())) }),
            )
            .route(
                &format!("/api/books/{DEFAULT_ISBN}/photo"),
                get(|| async { (StatusCode::NOT_FOUND, "no photo") }),
            )
            .route(
                &format!("/api/books/{DEFAULT_ISBN}/avgDuration"),
                get(|| async { (StatusCode::BAD_REQUEST, "book was never lent") }),
            )
            .route(
                "/api/books/9999999999999",
                get(|| async { (StatusCode::NOT_FOUND, "book not found") }),
            )
            .route(
                "/api/books/top5",
                get(|| async { Json(serde_json::json!([test_book()])) }),
            )
            .route("/api/books/search", post(search_books))
            .with_state(received)
    }

    fn start_library_api(received: ReceivedSearches) -> SocketAddr {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, library_api(received)).await.unwrap();
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

    #[test]
    fn book_suite_passes_against_populated_api() {
        let received = ReceivedSearches::default();
        let addr = start_library_api(received.clone());

        let report = run(book_suite(ScenarioDefinitionBuilder::new(
            "book_system",
            cli_for(addr),
        )))
        .unwrap();

        assert_eq!(11, report.outcomes.len());
        assert!(
            report.outcomes.iter().all(|o| o.overall_passed),
            "{:?}",
            report.outcomes
        );
        assert_eq!(25, report.metrics.total_checks);
        assert_eq!(0, report.metrics.error_count);
        assert_eq!(15, report.request_count);
        assert!(report.passed());

        let cache = report.outcome("testRedisCacheForTop5Books").unwrap();
        assert_eq!(5, cache.checks.len());
    }

    #[test]
    fn post_search_sends_title_query_and_accepts_created() {
        let received = ReceivedSearches::default();
        let addr = start_library_api(received.clone());
        let cli = BookwindCli {
            scenarios: vec!["testSearchBooksWithPostRequest".to_string()],
            ..cli_for(addr)
        };

        let report = run(book_suite(ScenarioDefinitionBuilder::new("book_system", cli))).unwrap();

        let search = report.outcome("testSearchBooksWithPostRequest").unwrap();
        assert!(search.overall_passed, "{search:?}");
        assert_eq!(
            vec!["status is 2xx", "response is not empty"],
            search.checks.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
        );

        assert_eq!(
            vec![serde_json::json!({
                "page": {"number": 1, "limit": 10},
                "query": {"title": "Test", "genre": "", "authorName": ""},
            })],
            *received.lock()
        );
    }
}
