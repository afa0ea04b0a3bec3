// =============================================================================
// SERVICE MODULE
// =============================================================================
// ProductService sits between the HTTP handlers and the ProductStore.
//
// RESPONSIBILITIES:
// - Validate input before the store is touched (malformed ids, blank search)
// - Bound every store call with the query timeout
// - Shape pagination metadata and the echoed filters
// - Read through the cache for detail and facet lookups
//
// LEARNING NOTE:
// The store is held as Arc<dyn ProductStore>, so the same service runs on
// PostgreSQL in production and on an in-memory store in tests.
// =============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::cache::{self, ProductCache};
use crate::db::ProductStore;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{Pagination, Product, ProductListResponse, SearchResponse};
use crate::query::{ListParams, ListingQuery, SearchParams, Showcase, SEARCH_RESULT_CAP};

/// Same message for missing and inactive products
const PRODUCT_NOT_FOUND: &str = "Product not found";

/// Parse a product id, rejecting anything that isn't a UUID.
pub fn parse_product_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid product id: {raw}")))
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    cache: ProductCache,
    query_timeout: Duration,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, cache: ProductCache, query_timeout: Duration) -> Self {
        Self {
            store,
            cache,
            query_timeout,
        }
    }

    /// Run one store call under the query timeout and record its latency.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let start = Instant::now();
        let outcome = tokio::time::timeout(self.query_timeout, fut).await;
        metrics::record_db_query(operation, start.elapsed().as_secs_f64());

        match outcome {
            Ok(result) => result.map_err(AppError::Store),
            Err(_) => {
                metrics::record_query_timeout(operation);
                tracing::warn!(
                    operation,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "Store query timed out"
                );
                Err(AppError::Timeout(self.query_timeout))
            }
        }
    }

    // -------------------------------------------------------------------------
    // LISTING
    // -------------------------------------------------------------------------
    /// Filtered, sorted, paginated listing. The page and the total count are
    /// fetched concurrently.
    pub async fn list_products(&self, params: &ListParams) -> AppResult<ProductListResponse> {
        let query = ListingQuery::from_params(params);

        tracing::debug!(
            sort = query.sort.as_str(),
            page = query.page.page,
            limit = query.page.limit,
            "Listing products"
        );

        let (products, total) = tokio::try_join!(
            self.bounded("list", self.store.list_products(&query)),
            self.bounded("count", self.store.count_products(&query.filter)),
        )?;

        metrics::record_listing_results(products.len());

        Ok(ProductListResponse {
            products,
            pagination: Pagination::new(query.page.page, query.page.limit, total),
            filters: query.applied_filters(),
        })
    }

    // -------------------------------------------------------------------------
    // DETAIL
    // -------------------------------------------------------------------------
    /// Single active product. Missing and inactive ids are both NotFound.
    pub async fn get_product(&self, raw_id: &str) -> AppResult<Product> {
        let id = parse_product_id(raw_id)?;
        let key = cache::product_key(id);

        if let Some(product) = self.cache.get::<Product>(&key).await {
            return Ok(product);
        }

        let product = self.find_visible(id).await?;
        self.cache.set(&key, &product).await;

        Ok(product)
    }

    async fn find_visible(&self, id: Uuid) -> AppResult<Product> {
        self.bounded("find", self.store.find_by_id(id))
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound(PRODUCT_NOT_FOUND.to_string()))
    }

    /// Active products in the same category as `raw_id`
    pub async fn related_products(&self, raw_id: &str, limit: u32) -> AppResult<Vec<Product>> {
        let id = parse_product_id(raw_id)?;
        let product = self.find_visible(id).await?;

        self.bounded("related", self.store.related_products(&product, limit))
            .await
    }

    // -------------------------------------------------------------------------
    // SHOWCASES
    // -------------------------------------------------------------------------
    pub async fn showcase(&self, kind: Showcase, limit: u32) -> AppResult<Vec<Product>> {
        self.bounded(kind.as_str(), self.store.showcase(kind, limit))
            .await
    }

    // -------------------------------------------------------------------------
    // QUICK SEARCH
    // -------------------------------------------------------------------------
    pub async fn search(&self, params: &SearchParams) -> AppResult<SearchResponse> {
        let term = params
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

        let products = self
            .bounded("search", self.store.search_products(term, SEARCH_RESULT_CAP))
            .await?;

        Ok(SearchResponse {
            total: products.len(),
            products,
            query: term.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // FACETS
    // -------------------------------------------------------------------------
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        if let Some(names) = self.cache.get::<Vec<String>>(cache::CATEGORIES_KEY).await {
            return Ok(names);
        }
        let names = self
            .bounded("categories", self.store.distinct_categories())
            .await?;
        self.cache.set(cache::CATEGORIES_KEY, &names).await;
        Ok(names)
    }

    pub async fn brands(&self) -> AppResult<Vec<String>> {
        if let Some(brands) = self.cache.get::<Vec<String>>(cache::BRANDS_KEY).await {
            return Ok(brands);
        }
        let brands = self
            .bounded("brands", self.store.distinct_brands())
            .await?;
        self.cache.set(cache::BRANDS_KEY, &brands).await;
        Ok(brands)
    }

    // -------------------------------------------------------------------------
    // HEALTH
    // -------------------------------------------------------------------------
    pub async fn store_healthy(&self) -> bool {
        tokio::time::timeout(self.query_timeout, self.store.health_check())
            .await
            .unwrap_or(false)
    }

    /// `None` when no cache is configured
    pub async fn cache_healthy(&self) -> Option<bool> {
        self.cache.ping().await
    }
}
