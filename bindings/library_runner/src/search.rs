use serde::Serialize;

/// Body of `POST /books/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSearchRequest {
    pub page: Page,
    pub query: SearchQuery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: u32,
    pub limit: u32,
}

/// Empty strings are sent as-is and mean "any".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub title: String,
    pub genre: String,
    pub author_name: String,
}

impl BookSearchRequest {
    /// Search the first page of 10 results by title.
    pub fn by_title(title: &str) -> Self {
        Self {
            page: Page {
                number: 1,
                limit: 10,
            },
            query: SearchQuery {
                title: title.to_string(),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_to_the_api_shape() {
        let value = serde_json::to_value(BookSearchRequest::by_title("Test")).unwrap();

        assert_eq!(
            serde_json::json!({
                "page": {"number": 1, "limit": 10},
                "query": {"title": "Test", "genre": "", "authorName": ""},
            }),
            value
        );
    }
}
