// Content API data types

use serde::Serialize;

/// Demo product record
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// `YYYY-MM-DD`
    pub created_at: String,
}

/// Demo blog post record
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub body: String,
    /// `YYYY-MM-DD`
    pub published_at: String,
}

/// One page of a list endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub last_page: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `items`, clamping the page number into `[1, last_page]`
    pub fn paginate(items: &[T], page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total = items.len();
        let last_page = total.div_ceil(page_size).max(1);
        let page = page.clamp(1, last_page);
        let start = (page - 1) * page_size;
        Self {
            items: items.iter().skip(start).take(page_size).cloned().collect(),
            page,
            page_size,
            total,
            last_page,
        }
    }
}

/// Index route listing
#[derive(Debug, Serialize)]
pub struct RouteList {
    pub ok: bool,
    pub routes: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
}

/// Error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ApiError<'a> {
    pub error: &'a str,
}
