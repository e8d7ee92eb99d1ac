// API module entry
// Read-only JSON content API mounted under the API prefix

mod catalog;
mod handlers;
mod response;
mod types;

use hyper::{Method, Response};

use crate::http::Body;
use crate::routing::RequestDescriptor;

pub use catalog::Catalog;
pub use handlers::parse_positive;
pub use response::{error_response, json_response, method_not_allowed, not_found, preflight};
pub use types::{Page, Post, Product};

/// API route handler
///
/// `prefix` is the API prefix; everything after it is the route.
pub fn handle_api(request: &RequestDescriptor, prefix: &str, catalog: &Catalog) -> Response<Body> {
    match request.method {
        Method::OPTIONS => return preflight(),
        Method::GET => {}
        _ => return method_not_allowed(),
    }

    let route = route_of(&request.path, prefix);
    let response = match route.split_once('/') {
        None if route.is_empty() => handlers::handle_index(),
        None if route == "health" => handlers::handle_health(),
        None if route == "products" => handlers::handle_products(request, catalog),
        None if route == "posts" => handlers::handle_posts(request, catalog),
        Some(("products", id)) if !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()) => {
            handlers::handle_product(id, catalog)
        }
        Some(("posts", slug)) if !slug.is_empty() && !slug.contains('/') => handlers::handle_post(slug, catalog),
        _ => not_found("Not found"),
    };
    tracing::debug!(route, status = response.status().as_u16(), "api request");
    response
}

/// Path below the API prefix, without a leading slash
fn route_of<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path).trim_start_matches('/')
}
