// Content API handlers module

use hyper::{Response, StatusCode};

use super::catalog::Catalog;
use super::response::{json_response, not_found};
use super::types::{Health, Page, RouteList};
use crate::http::Body;
use crate::routing::RequestDescriptor;

const ROUTES: &[&str] = &["/products", "/products/:id", "/posts", "/posts/:slug"];

const PRODUCT_PAGE_SIZE: usize = 12;
const POST_PAGE_SIZE: usize = 6;

pub fn handle_index() -> Response<Body> {
    json_response(StatusCode::OK, &RouteList { ok: true, routes: ROUTES })
}

pub fn handle_health() -> Response<Body> {
    json_response(StatusCode::OK, &Health { ok: true })
}

/// `GET products?page=&pageSize=&q=`
pub fn handle_products(request: &RequestDescriptor, catalog: &Catalog) -> Response<Body> {
    let (page, page_size, query) = list_params(request, PRODUCT_PAGE_SIZE);
    let items = catalog.search_products(&query);
    json_response(StatusCode::OK, &Page::paginate(&items, page, page_size))
}

pub fn handle_product(id: &str, catalog: &Catalog) -> Response<Body> {
    id.parse()
        .ok()
        .and_then(|id| catalog.product(id))
        .map_or_else(
            || not_found("Product not found"),
            |product| json_response(StatusCode::OK, product),
        )
}

/// `GET posts?page=&pageSize=&q=`
pub fn handle_posts(request: &RequestDescriptor, catalog: &Catalog) -> Response<Body> {
    let (page, page_size, query) = list_params(request, POST_PAGE_SIZE);
    let items = catalog.search_posts(&query);
    json_response(StatusCode::OK, &Page::paginate(&items, page, page_size))
}

pub fn handle_post(slug: &str, catalog: &Catalog) -> Response<Body> {
    catalog.post(slug).map_or_else(
        || not_found("Post not found"),
        |post| json_response(StatusCode::OK, post),
    )
}

fn list_params(request: &RequestDescriptor, default_page_size: usize) -> (usize, usize, String) {
    let page = parse_positive(request.query_param("page").as_deref(), 1);
    let page_size = parse_positive(request.query_param("pageSize").as_deref(), default_page_size);
    let query = request.query_param("q").unwrap_or_default();
    (page, page_size, query)
}

/// Leading decimal integer of `value` if positive, else `default`
///
/// Whitespace before the number is skipped and trailing garbage ignored,
/// so `" 2x"` reads as 2.
pub fn parse_positive(value: Option<&str>, default: usize) -> usize {
    let Some(value) = value else {
        return default;
    };
    let trimmed = value.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    match unsigned[..digits_end].parse::<usize>() {
        Ok(n) if n > 0 => n,
        _ => default,
    }
}
