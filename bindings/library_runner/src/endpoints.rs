//! Paths of the library API, relative to the configured base URL.

/// An author number far outside any real range.
pub const NONEXISTENT_AUTHOR_NUMBER: &str = "99999";

/// A well-formed ISBN that no catalogue contains.
pub const NONEXISTENT_ISBN: &str = "9999999999999";

pub fn authors() -> String {
    "/authors".to_string()
}

pub fn author(author_number: &str) -> String {
    format!("/authors/{author_number}")
}

pub fn author_books(author_number: &str) -> String {
    format!("/authors/{author_number}/books")
}

pub fn top_authors() -> String {
    "/authors/top5".to_string()
}

pub fn books() -> String {
    "/books".to_string()
}

pub fn book(isbn: &str) -> String {
    format!("/books/{isbn}")
}

pub fn book_photo(isbn: &str) -> String {
    format!("/books/{isbn}/photo")
}

pub fn book_avg_duration(isbn: &str) -> String {
    format!("/books/{isbn}/avgDuration")
}

pub fn top_books() -> String {
    "/books/top5".to_string()
}

pub fn book_search() -> String {
    "/books/search".to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn paths_are_relative_to_the_api_root() {
        assert_eq!("/authors/99999", author(NONEXISTENT_AUTHOR_NUMBER));
        assert_eq!("/authors/1/books", author_books("1"));
        assert_eq!("/books/9782826012092/avgDuration", book_avg_duration("9782826012092"));
        assert_eq!("/books/9999999999999", book(NONEXISTENT_ISBN));
    }
}
