//! In-memory `ProductStore` for tests.
//!
//! Evaluates the same filter, sort and showcase rules as the SQL in `db.rs`
//! over a `Vec<Product>`, and counts how many times it was queried.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use uuid::Uuid;

use super::ProductStore;
use crate::models::{CategoryRef, Product};
use crate::query::{
    ListingQuery, ProductFilter, Showcase, SortOrder, TagFilter, FEATURED_MIN_RATING,
    FEATURED_MIN_SALES,
};

#[derive(Default)]
pub struct MemoryStore {
    products: Vec<Product>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl MemoryStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    /// Every query sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every query fails as if the connection dropped
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Number of store calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    async fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            bail!("connection refused");
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// FIXTURES
// -----------------------------------------------------------------------------

pub fn category(name: &str) -> CategoryRef {
    CategoryRef {
        id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
        name: name.to_string(),
        kind: "general".to_string(),
    }
}

/// An active product with neutral defaults. `created_seq` orders creation
/// time: a higher number is newer.
pub fn product(name: &str, price: i64, created_seq: i64) -> Product {
    let created_at = Utc
        .timestamp_opt(1_700_000_000 + created_seq * 60, 0)
        .single()
        .expect("valid timestamp");

    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{name} description"),
        category: category("General"),
        brand: None,
        price,
        sale_price: None,
        stock_quantity: 10,
        images: vec![format!("https://cdn.example.com/{created_seq}.jpg")],
        tags: Vec::new(),
        rating: 0.0,
        sales_count: 0,
        reviews: 0,
        is_new: false,
        discount: 0.0,
        is_active: true,
        created_at,
        updated_at: created_at,
    }
}

// -----------------------------------------------------------------------------
// EVALUATION
// -----------------------------------------------------------------------------

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(filter: &ProductFilter, p: &Product) -> bool {
    if let Some(category) = &filter.category {
        if !contains_ci(&p.category.name, category) {
            return false;
        }
    }

    if let Some(tag) = &filter.tag {
        let ok = match tag {
            TagFilter::DailyDeal => p.discount > 0.0,
            TagFilter::Featured => p.rating >= FEATURED_MIN_RATING,
            TagFilter::NewArrivals => p.is_new,
            TagFilter::Label(label) => p.tags.iter().any(|t| t == label),
        };
        if !ok {
            return false;
        }
    }

    if let Some(search) = &filter.search {
        let hit = contains_ci(&p.name, search)
            || contains_ci(&p.description, search)
            || contains_ci(&p.category.name, search);
        if !hit {
            return false;
        }
    }

    if filter.min_price.is_some_and(|min| p.price < min) {
        return false;
    }
    if filter.max_price.is_some_and(|max| p.price > max) {
        return false;
    }

    if let Some(brand) = &filter.brand {
        if !p.brand.as_deref().is_some_and(|b| contains_ci(b, brand)) {
            return false;
        }
    }

    true
}

fn compare(sort: SortOrder, a: &Product, b: &Product) -> Ordering {
    let primary = match sort {
        SortOrder::Bestseller => b
            .sales_count
            .cmp(&a.sales_count)
            .then(b.reviews.cmp(&a.reviews)),
        SortOrder::PriceAsc => a.price.cmp(&b.price),
        SortOrder::PriceDesc => b.price.cmp(&a.price),
        SortOrder::Rating => b.rating.total_cmp(&a.rating),
        SortOrder::Newest => b.created_at.cmp(&a.created_at),
        SortOrder::Name => a.name.cmp(&b.name),
    };
    primary.then(a.id.cmp(&b.id))
}

fn take(mut products: Vec<Product>, limit: u32) -> Vec<Product> {
    products.truncate(limit as usize);
    products
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self, query: &ListingQuery) -> Result<Vec<Product>> {
        self.enter().await?;
        let mut hits: Vec<Product> = self
            .products
            .iter()
            .filter(|p| matches(&query.filter, p))
            .cloned()
            .collect();
        hits.sort_by(|a, b| compare(query.sort, a, b));

        Ok(hits
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit as usize)
            .collect())
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        self.enter().await?;
        Ok(self.products.iter().filter(|p| matches(filter, p)).count() as u64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        self.enter().await?;
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn showcase(&self, kind: Showcase, limit: u32) -> Result<Vec<Product>> {
        self.enter().await?;
        let mut hits: Vec<Product> = self
            .products
            .iter()
            .filter(|p| match kind {
                Showcase::Featured => {
                    p.rating >= FEATURED_MIN_RATING
                        || p.tags.iter().any(|t| t == "featured")
                        || p.sales_count >= FEATURED_MIN_SALES
                }
                Showcase::Bestsellers => true,
                Showcase::Deals => p.discount > 0.0,
            })
            .cloned()
            .collect();

        hits.sort_by(|a, b| {
            let primary = match kind {
                Showcase::Featured => b
                    .rating
                    .total_cmp(&a.rating)
                    .then(b.sales_count.cmp(&a.sales_count)),
                Showcase::Bestsellers => b
                    .sales_count
                    .cmp(&a.sales_count)
                    .then(b.reviews.cmp(&a.reviews)),
                Showcase::Deals => b
                    .discount
                    .total_cmp(&a.discount)
                    .then(b.created_at.cmp(&a.created_at)),
            };
            primary.then(a.id.cmp(&b.id))
        });

        Ok(take(hits, limit))
    }

    async fn related_products(&self, product: &Product, limit: u32) -> Result<Vec<Product>> {
        self.enter().await?;
        let mut hits: Vec<Product> = self
            .products
            .iter()
            .filter(|p| p.category.id == product.category.id && p.id != product.id && p.is_active)
            .cloned()
            .collect();
        hits.sort_by(|a, b| compare(SortOrder::Newest, a, b));
        Ok(take(hits, limit))
    }

    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>> {
        self.enter().await?;
        let mut hits: Vec<Product> = self
            .products
            .iter()
            .filter(|p| {
                p.is_active
                    && (contains_ci(&p.name, term)
                        || p.brand.as_deref().is_some_and(|b| contains_ci(b, term))
                        || p.tags.iter().any(|t| contains_ci(t, term)))
            })
            .cloned()
            .collect();
        hits.sort_by(|a, b| compare(SortOrder::Newest, a, b));
        Ok(take(hits, limit))
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        self.enter().await?;
        let names: BTreeSet<String> = self
            .products
            .iter()
            .map(|p| p.category.name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn distinct_brands(&self) -> Result<Vec<String>> {
        self.enter().await?;
        let brands: BTreeSet<String> = self
            .products
            .iter()
            .filter_map(|p| p.brand.clone())
            .collect();
        Ok(brands.into_iter().collect())
    }

    async fn health_check(&self) -> bool {
        self.enter().await.is_ok()
    }
}
