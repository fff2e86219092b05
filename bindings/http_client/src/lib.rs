mod client;
mod request;
mod response;

pub mod prelude {
    pub use crate::client::HttpClientInstrumented;
    pub use crate::request::HttpRequest;
    pub use crate::response::ResponseDescriptor;

    // Re-exported so scenarios don't need a direct reqwest dependency.
    pub use reqwest::Method;
}
