// Immutable demo catalog, seeded once at startup

use chrono::{Days, NaiveDate};

use super::types::{Post, Product};

/// Products and posts served by the content API
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    posts: Vec<Post>,
}

impl Catalog {
    /// Deterministic data; dates count back from `today`
    pub fn seed(product_count: u32, post_count: u32, today: NaiveDate) -> Self {
        let products = (1..=product_count)
            .map(|id| Product {
                id,
                sku: format!("SKU-{id:05}"),
                name: format!("Product #{id}"),
                description: format!("This is the description for Product #{id}. It's fantastic for demos."),
                price: price_for(id),
                created_at: days_before(today, u64::from(id)),
            })
            .collect();
        let posts = (1..=post_count)
            .map(|n| Post {
                slug: format!("post-{n}"),
                title: format!("Post Title {n}"),
                excerpt: format!("A short teaser for post {n}."),
                body: format!(
                    "This is the full body of post {n}. It demonstrates dynamic routes and prerender-friendly content."
                ),
                published_at: days_before(today, u64::from(n) * 2),
            })
            .collect();
        Self { products, posts }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn product(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn post(&self, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// Case-insensitive match on name, description or SKU
    pub fn search_products(&self, query: &str) -> Vec<Product> {
        let q = query.to_lowercase();
        self.products
            .iter()
            .filter(|p| {
                q.is_empty()
                    || p.name.to_lowercase().contains(&q)
                    || p.description.to_lowercase().contains(&q)
                    || p.sku.to_lowercase().contains(&q)
            })
            .cloned()
            .collect()
    }

    /// Case-insensitive match on title, excerpt or body
    pub fn search_posts(&self, query: &str) -> Vec<Post> {
        let q = query.to_lowercase();
        self.posts
            .iter()
            .filter(|p| {
                q.is_empty()
                    || p.title.to_lowercase().contains(&q)
                    || p.excerpt.to_lowercase().contains(&q)
                    || p.body.to_lowercase().contains(&q)
            })
            .cloned()
            .collect()
    }
}

/// Between 10.00 and 158.99, stable per id
fn price_for(id: u32) -> f64 {
    let cents = (10 + id % 50) * 100 + id.wrapping_mul(7919) % 10_000;
    f64::from(cents) / 100.0
}

fn days_before(today: NaiveDate, days: u64) -> String {
    today
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y-%m-%d")
        .to_string()
}
