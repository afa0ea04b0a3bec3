// =============================================================================
// DATABASE MODULE
// =============================================================================
// This module handles all PostgreSQL database operations.
//
// LEARNING NOTES:
// - The ProductStore trait is the seam between the service and storage;
//   handlers never see SQL
// - sqlx::QueryBuilder assembles the listing query from optional filters
//   while keeping every user value a bound parameter
// - Connection pooling improves performance
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    FromRow, PgPool, Postgres, QueryBuilder, Row,
};
use uuid::Uuid;

use crate::models::{CategoryRef, Product};
use crate::query::{
    ListingQuery, ProductFilter, Showcase, SortOrder, TagFilter, FEATURED_MIN_RATING,
    FEATURED_MIN_SALES,
};

#[cfg(test)]
pub mod memory;

// =============================================================================
// STORE TRAIT
// =============================================================================
/// Read-only access to the product catalog.
///
/// `Database` is the PostgreSQL implementation; tests use an in-memory one.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// One page of the filtered, sorted listing
    async fn list_products(&self, query: &ListingQuery) -> Result<Vec<Product>>;

    /// Number of products matching `filter`, ignoring the page window
    async fn count_products(&self, filter: &ProductFilter) -> Result<u64>;

    /// Lookup by id, active or not
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>>;

    async fn showcase(&self, kind: Showcase, limit: u32) -> Result<Vec<Product>>;

    /// Active products sharing `product`'s category, newest first
    async fn related_products(&self, product: &Product, limit: u32) -> Result<Vec<Product>>;

    /// Active products whose name, brand or any tag contains `term`
    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>>;

    async fn distinct_categories(&self) -> Result<Vec<String>>;

    async fn distinct_brands(&self) -> Result<Vec<String>>;

    /// Check if the store is reachable
    async fn health_check(&self) -> bool;
}

// -----------------------------------------------------------------------------
// DATABASE WRAPPER
// -----------------------------------------------------------------------------
#[derive(Clone)]
pub struct Database {
    /// SQLx PostgreSQL connection pool
    pool: PgPool,
}

/// Columns selected for every product read, category populated by the join
const SELECT_PRODUCTS: &str = r#"
    SELECT p.id, p.name, p.description, p.brand, p.price, p.sale_price,
           p.stock_quantity, p.images, p.tags, p.rating, p.sales_count,
           p.reviews, p.is_new, p.discount, p.is_active, p.created_at,
           p.updated_at,
           c.id AS category_id, c.name AS category_name, c.type AS category_type
    FROM products p
    JOIN categories c ON c.id = p.category_id
"#;

const COUNT_PRODUCTS: &str = r#"
    SELECT COUNT(*)
    FROM products p
    JOIN categories c ON c.id = p.category_id
"#;

// -----------------------------------------------------------------------------
// SAMPLE CATALOG
// -----------------------------------------------------------------------------
struct SeedProduct {
    name: &'static str,
    category: &'static str,
    brand: &'static str,
    price: i64,
    sale_price: Option<i64>,
    stock: i32,
    tags: &'static [&'static str],
    rating: f64,
    sales: i32,
    reviews: i32,
    is_new: bool,
    discount: f64,
}

const SEED_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Royal Canin Medium Adult 4kg",
        category: "Thức ăn cho chó",
        brand: "Royal Canin",
        price: 650_000,
        sale_price: Some(590_000),
        stock: 40,
        tags: &["dry-food", "featured"],
        rating: 4.8,
        sales: 320,
        reviews: 85,
        is_new: false,
        discount: 9.0,
    },
    SeedProduct {
        name: "Pedigree Puppy 1.5kg",
        category: "Thức ăn cho chó",
        brand: "Pedigree",
        price: 185_000,
        sale_price: None,
        stock: 120,
        tags: &["puppy"],
        rating: 4.3,
        sales: 150,
        reviews: 40,
        is_new: false,
        discount: 0.0,
    },
    SeedProduct {
        name: "Whiskas Tuna Pouch 85g",
        category: "Thức ăn cho mèo",
        brand: "Whiskas",
        price: 15_000,
        sale_price: Some(12_000),
        stock: 500,
        tags: &["wet-food"],
        rating: 4.6,
        sales: 890,
        reviews: 210,
        is_new: false,
        discount: 20.0,
    },
    SeedProduct {
        name: "Me-O Kitten 1.1kg",
        category: "Thức ăn cho mèo",
        brand: "Me-O",
        price: 120_000,
        sale_price: None,
        stock: 60,
        tags: &["kitten"],
        rating: 4.1,
        sales: 45,
        reviews: 12,
        is_new: true,
        discount: 0.0,
    },
    SeedProduct {
        name: "Vòng cổ da chống ve",
        category: "Phụ kiện",
        brand: "PetLove",
        price: 95_000,
        sale_price: None,
        stock: 75,
        tags: &["collar"],
        rating: 4.0,
        sales: 30,
        reviews: 8,
        is_new: true,
        discount: 0.0,
    },
    SeedProduct {
        name: "Cát vệ sinh đậu nành 6L",
        category: "Phụ kiện",
        brand: "CatCare",
        price: 135_000,
        sale_price: Some(115_000),
        stock: 0,
        tags: &["litter"],
        rating: 4.7,
        sales: 410,
        reviews: 96,
        is_new: false,
        discount: 15.0,
    },
    SeedProduct {
        name: "Bóng cao su gặm",
        category: "Đồ chơi",
        brand: "Kong",
        price: 80_000,
        sale_price: None,
        stock: 90,
        tags: &["chew"],
        rating: 4.4,
        sales: 60,
        reviews: 20,
        is_new: true,
        discount: 0.0,
    },
    SeedProduct {
        name: "Cần câu lông vũ cho mèo",
        category: "Đồ chơi",
        brand: "PetLove",
        price: 45_000,
        sale_price: None,
        stock: 150,
        tags: &["teaser"],
        rating: 3.9,
        sales: 25,
        reviews: 6,
        is_new: false,
        discount: 0.0,
    },
];

impl Database {
    // -------------------------------------------------------------------------
    // CONNECTION
    // -------------------------------------------------------------------------
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            // How long to wait for a connection before giving up
            .acquire_timeout(std::time::Duration::from_secs(5))
            .idle_timeout(std::time::Duration::from_secs(300))
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    // -------------------------------------------------------------------------
    // MIGRATIONS
    // -------------------------------------------------------------------------
    /// Create the catalog tables and indexes, then seed a sample catalog if
    /// the products table is empty.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS categories (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(100) UNIQUE NOT NULL,
                type VARCHAR(100) NOT NULL DEFAULT 'general',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create categories table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                name VARCHAR(200) NOT NULL,
                description TEXT NOT NULL,
                category_id UUID NOT NULL REFERENCES categories(id),
                brand VARCHAR(100),

                -- VND, no minor unit
                price BIGINT NOT NULL,
                sale_price BIGINT,
                stock_quantity INTEGER NOT NULL DEFAULT 0,

                images TEXT[] NOT NULL DEFAULT '{}',
                tags TEXT[] NOT NULL DEFAULT '{}',

                rating DOUBLE PRECISION NOT NULL DEFAULT 0,
                sales_count INTEGER NOT NULL DEFAULT 0,
                reviews INTEGER NOT NULL DEFAULT 0,
                is_new BOOLEAN NOT NULL DEFAULT FALSE,
                discount DOUBLE PRECISION NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                CONSTRAINT non_negative_price CHECK (price >= 0),
                CONSTRAINT sale_below_price CHECK (
                    sale_price IS NULL OR (sale_price >= 0 AND sale_price < price)
                ),
                CONSTRAINT non_negative_stock CHECK (stock_quantity >= 0),
                CONSTRAINT rating_range CHECK (rating >= 0 AND rating <= 5),
                CONSTRAINT non_negative_counts CHECK (sales_count >= 0 AND reviews >= 0)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create products table")?;

        // One index per filtered or sorted column
        let indexes = [
            "CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id)",
            "CREATE INDEX IF NOT EXISTS idx_products_price ON products(price)",
            "CREATE INDEX IF NOT EXISTS idx_products_tags ON products USING GIN (tags)",
            "CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at DESC)",
            "CREATE INDEX IF NOT EXISTS idx_products_sales_count ON products(sales_count DESC)",
            "CREATE INDEX IF NOT EXISTS idx_products_rating ON products(rating DESC)",
        ];
        for statement in indexes {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to run: {statement}"))?;
        }

        self.seed_sample_data().await?;

        Ok(())
    }

    /// Seed a small pet-shop catalog for local runs
    async fn seed_sample_data(&self) -> Result<()> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        if count.0 > 0 {
            return Ok(());
        }

        let categories = [
            ("Thức ăn cho chó", "food"),
            ("Thức ăn cho mèo", "food"),
            ("Phụ kiện", "accessory"),
            ("Đồ chơi", "toy"),
        ];
        for (name, kind) in categories {
            sqlx::query(
                r#"
                INSERT INTO categories (name, type)
                VALUES ($1, $2)
                ON CONFLICT (name) DO NOTHING
                "#,
            )
            .bind(name)
            .bind(kind)
            .execute(&self.pool)
            .await?;
        }

        for seed in SEED_PRODUCTS {
            let tags: Vec<String> = seed.tags.iter().map(|t| t.to_string()).collect();
            sqlx::query(
                r#"
                INSERT INTO products (name, description, category_id, brand, price,
                                      sale_price, stock_quantity, tags, rating,
                                      sales_count, reviews, is_new, discount)
                VALUES ($1, $1, (SELECT id FROM categories WHERE name = $2), $3, $4,
                        $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(seed.name)
            .bind(seed.category)
            .bind(seed.brand)
            .bind(seed.price)
            .bind(seed.sale_price)
            .bind(seed.stock)
            .bind(tags)
            .bind(seed.rating)
            .bind(seed.sales)
            .bind(seed.reviews)
            .bind(seed.is_new)
            .bind(seed.discount)
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(count = SEED_PRODUCTS.len(), "Seeded sample catalog");

        Ok(())
    }
}

// -----------------------------------------------------------------------------
// ROW MAPPING
// -----------------------------------------------------------------------------
// The category columns come from the join and are folded into CategoryRef,
// so FromRow is written by hand instead of derived.
impl<'r> FromRow<'r, PgRow> for Product {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Product {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category: CategoryRef {
                id: row.try_get("category_id")?,
                name: row.try_get("category_name")?,
                kind: row.try_get("category_type")?,
            },
            brand: row.try_get("brand")?,
            price: row.try_get("price")?,
            sale_price: row.try_get("sale_price")?,
            stock_quantity: row.try_get("stock_quantity")?,
            images: row.try_get("images")?,
            tags: row.try_get("tags")?,
            rating: row.try_get("rating")?,
            sales_count: row.try_get("sales_count")?,
            reviews: row.try_get("reviews")?,
            is_new: row.try_get("is_new")?,
            discount: row.try_get("discount")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

// -----------------------------------------------------------------------------
// QUERY BUILDING
// -----------------------------------------------------------------------------

/// `%term%` for ILIKE, with LIKE metacharacters in `term` escaped
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Appends `AND ...` clauses for every filter that is set. Expects the
/// builder to already end in a WHERE clause.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category) = &filter.category {
        qb.push(" AND c.name ILIKE ").push_bind(like_pattern(category));
    }

    if let Some(tag) = &filter.tag {
        match tag {
            TagFilter::DailyDeal => {
                qb.push(" AND p.discount > 0");
            }
            TagFilter::Featured => {
                qb.push(" AND p.rating >= ").push_bind(FEATURED_MIN_RATING);
            }
            TagFilter::NewArrivals => {
                qb.push(" AND p.is_new");
            }
            TagFilter::Label(label) => {
                qb.push(" AND ").push_bind(label.clone()).push(" = ANY(p.tags)");
            }
        }
    }

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(min_price) = filter.min_price {
        qb.push(" AND p.price >= ").push_bind(min_price);
    }

    if let Some(max_price) = filter.max_price {
        qb.push(" AND p.price <= ").push_bind(max_price);
    }

    if let Some(brand) = &filter.brand {
        qb.push(" AND p.brand ILIKE ").push_bind(like_pattern(brand));
    }
}

/// ORDER BY body for a listing sort. `p.id` breaks ties so pages never
/// overlap.
fn order_by(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Bestseller => "p.sales_count DESC, p.reviews DESC, p.id ASC",
        SortOrder::PriceAsc => "p.price ASC, p.id ASC",
        SortOrder::PriceDesc => "p.price DESC, p.id ASC",
        SortOrder::Rating => "p.rating DESC, p.id ASC",
        SortOrder::Newest => "p.created_at DESC, p.id ASC",
        SortOrder::Name => "p.name ASC, p.id ASC",
    }
}

fn listing_sql(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_PRODUCTS);
    qb.push(" WHERE TRUE");
    push_filter(&mut qb, &query.filter);
    qb.push(" ORDER BY ").push(order_by(query.sort));
    qb.push(" LIMIT ")
        .push_bind(i64::from(query.page.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));
    qb
}

fn count_sql(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(COUNT_PRODUCTS);
    qb.push(" WHERE TRUE");
    push_filter(&mut qb, filter);
    qb
}

fn showcase_sql(kind: Showcase, limit: u32) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_PRODUCTS);
    match kind {
        Showcase::Featured => {
            qb.push(" WHERE p.rating >= ")
                .push_bind(FEATURED_MIN_RATING)
                .push(" OR 'featured' = ANY(p.tags) OR p.sales_count >= ")
                .push_bind(FEATURED_MIN_SALES)
                .push(" ORDER BY p.rating DESC, p.sales_count DESC, p.id ASC");
        }
        Showcase::Bestsellers => {
            qb.push(" ORDER BY p.sales_count DESC, p.reviews DESC, p.id ASC");
        }
        Showcase::Deals => {
            qb.push(" WHERE p.discount > 0")
                .push(" ORDER BY p.discount DESC, p.created_at DESC, p.id ASC");
        }
    }
    qb.push(" LIMIT ").push_bind(i64::from(limit));
    qb
}

// =============================================================================
// POSTGRES IMPLEMENTATION
// =============================================================================
#[async_trait]
impl ProductStore for Database {
    async fn list_products(&self, query: &ListingQuery) -> Result<Vec<Product>> {
        let products = listing_sql(query)
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch product listing")?;

        Ok(products)
    }

    async fn count_products(&self, filter: &ProductFilter) -> Result<u64> {
        let total: (i64,) = count_sql(filter)
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .context("Failed to count products")?;

        Ok(u64::try_from(total.0).unwrap_or_default())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let mut qb = QueryBuilder::new(SELECT_PRODUCTS);
        qb.push(" WHERE p.id = ").push_bind(id);

        let product = qb
            .build_query_as::<Product>()
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch product")?;

        Ok(product)
    }

    async fn showcase(&self, kind: Showcase, limit: u32) -> Result<Vec<Product>> {
        let products = showcase_sql(kind, limit)
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("Failed to fetch {} products", kind.as_str()))?;

        Ok(products)
    }

    async fn related_products(&self, product: &Product, limit: u32) -> Result<Vec<Product>> {
        let mut qb = QueryBuilder::new(SELECT_PRODUCTS);
        qb.push(" WHERE p.category_id = ")
            .push_bind(product.category.id)
            .push(" AND p.id <> ")
            .push_bind(product.id)
            .push(" AND p.is_active ORDER BY p.created_at DESC, p.id ASC LIMIT ")
            .push_bind(i64::from(limit));

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch related products")?;

        Ok(products)
    }

    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>> {
        let pattern = like_pattern(term);
        let mut qb = QueryBuilder::new(SELECT_PRODUCTS);
        qb.push(" WHERE p.is_active AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.brand ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(p.tags) AS t(tag) WHERE t.tag ILIKE ")
            .push_bind(pattern)
            .push(")) ORDER BY p.created_at DESC, p.id ASC LIMIT ")
            .push_bind(i64::from(limit));

        let products = qb
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to search products")?;

        Ok(products)
    }

    async fn distinct_categories(&self) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT c.name
            FROM products p
            JOIN categories c ON c.id = p.category_id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch categories")?;

        Ok(names)
    }

    async fn distinct_brands(&self) -> Result<Vec<String>> {
        let brands = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT brand
            FROM products
            WHERE brand IS NOT NULL
            ORDER BY brand
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch brands")?;

        Ok(brands)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ListParams;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("cat"), "%cat%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn empty_filter_adds_no_clauses() {
        let sql = count_sql(&ProductFilter::default()).sql().to_string();
        assert!(sql.trim_end().ends_with("WHERE TRUE"));
    }

    #[test]
    fn listing_sql_binds_every_user_value() {
        let query = ListingQuery::from_params(&ListParams {
            category: Some("dog".into()),
            tag: Some("organic".into()),
            search: Some("'; DROP TABLE products; --".into()),
            min_price: Some("100".into()),
            max_price: Some("900".into()),
            brand: Some("Royal".into()),
            sort: Some("price_desc".into()),
            page: Some("3".into()),
            limit: Some("5".into()),
        });
        let sql = listing_sql(&query).sql().to_string();

        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.contains("c.name ILIKE $1"));
        assert!(sql.contains("$2 = ANY(p.tags)"));
        assert!(sql.contains("p.name ILIKE $3"));
        assert!(sql.contains("p.price >= $6"));
        assert!(sql.contains("p.price <= $7"));
        assert!(sql.contains("p.brand ILIKE $8"));
        assert!(sql.contains("ORDER BY p.price DESC, p.id ASC"));
        assert!(sql.contains("LIMIT $9 OFFSET $10"));
    }

    #[test]
    fn tag_keywords_map_to_columns() {
        let sql = |tag: &str| {
            let filter = ProductFilter {
                tag: Some(TagFilter::parse(tag)),
                ..ProductFilter::default()
            };
            count_sql(&filter).sql().to_string()
        };
        assert!(sql("daily_deal").contains("p.discount > 0"));
        assert!(sql("featured").contains("p.rating >= $1"));
        assert!(sql("new_arrivals").contains("p.is_new"));
    }

    #[test]
    fn default_listing_orders_newest_first() {
        let query = ListingQuery::default();
        let sql = listing_sql(&query).sql().to_string();
        assert!(sql.contains("ORDER BY p.created_at DESC, p.id ASC"));
    }

    #[test]
    fn showcase_queries() {
        let featured = showcase_sql(Showcase::Featured, 8).sql().to_string();
        assert!(featured.contains("'featured' = ANY(p.tags)"));
        assert!(featured.contains("ORDER BY p.rating DESC, p.sales_count DESC"));

        let bestsellers = showcase_sql(Showcase::Bestsellers, 8).sql().to_string();
        assert!(!bestsellers.contains("WHERE"));
        assert!(bestsellers.contains("ORDER BY p.sales_count DESC, p.reviews DESC"));

        let deals = showcase_sql(Showcase::Deals, 8).sql().to_string();
        assert!(deals.contains("WHERE p.discount > 0"));
        assert!(deals.contains("ORDER BY p.discount DESC, p.created_at DESC"));
    }
}

// Runs the SQL above against a real PostgreSQL. Skipped unless
// TEST_DATABASE_URL is set. Each test migrates and seeds its own schema.
#[cfg(test)]
mod postgres_tests {
    use super::*;
    use crate::query::ListParams;
    use sqlx::Executor;

    struct Scratch {
        db: Database,
        schema: String,
    }

    impl Scratch {
        async fn open() -> Option<Self> {
            let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
                eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
                return None;
            };

            let schema = format!("catalog_test_{}", Uuid::new_v4().simple());
            let search_path = format!("SET search_path TO {schema}");
            let pool = PgPoolOptions::new()
                .max_connections(2)
                .after_connect(move |conn, _meta| {
                    let search_path = search_path.clone();
                    Box::pin(async move {
                        conn.execute(search_path.as_str()).await?;
                        Ok(())
                    })
                })
                .connect(&url)
                .await
                .expect("connect to TEST_DATABASE_URL");

            pool.execute(format!("CREATE SCHEMA {schema}").as_str())
                .await
                .expect("create scratch schema");

            let db = Database { pool };
            db.run_migrations().await.expect("migrate scratch schema");

            Some(Self { db, schema })
        }

        async fn close(self) {
            let drop_schema = format!("DROP SCHEMA {} CASCADE", self.schema);
            self.db
                .pool
                .execute(drop_schema.as_str())
                .await
                .expect("drop scratch schema");
            self.db.pool.close().await;
        }
    }

    fn listing(params: ListParams) -> ListingQuery {
        ListingQuery::from_params(&params)
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    #[tokio::test]
    async fn category_filter_folds_case_within_vietnamese_names() {
        let Some(scratch) = Scratch::open().await else {
            return;
        };
        let db = &scratch.db;

        let query = listing(ListParams {
            category: Some("thức ăn CHO mèo".into()),
            sort: Some("price_asc".into()),
            ..ListParams::default()
        });
        let products = db.list_products(&query).await.unwrap();
        assert_eq!(
            names(&products),
            vec!["Whiskas Tuna Pouch 85g", "Me-O Kitten 1.1kg"]
        );
        assert_eq!(db.count_products(&query.filter).await.unwrap(), 2);

        scratch.close().await;
    }

    #[tokio::test]
    async fn like_metacharacters_match_literally() {
        let Some(scratch) = Scratch::open().await else {
            return;
        };
        let db = &scratch.db;

        for term in ["%", "_", "\\"] {
            let filter = ProductFilter {
                search: Some(term.into()),
                ..ProductFilter::default()
            };
            assert_eq!(db.count_products(&filter).await.unwrap(), 0, "{term}");
            assert!(db.search_products(term, 50).await.unwrap().is_empty());
        }

        scratch.close().await;
    }

    #[tokio::test]
    async fn tag_label_is_exact_membership() {
        let Some(scratch) = Scratch::open().await else {
            return;
        };
        let db = &scratch.db;

        let filter = |tag: &str| ProductFilter {
            tag: Some(TagFilter::parse(tag)),
            ..ProductFilter::default()
        };
        assert_eq!(db.count_products(&filter("puppy")).await.unwrap(), 1);
        assert_eq!(db.count_products(&filter("pupp")).await.unwrap(), 0);
        assert_eq!(db.count_products(&filter("daily_deal")).await.unwrap(), 3);

        scratch.close().await;
    }

    #[tokio::test]
    async fn quick_search_reads_brand_and_tags() {
        let Some(scratch) = Scratch::open().await else {
            return;
        };
        let db = &scratch.db;

        let by_tag = db.search_products("KITTEN", 50).await.unwrap();
        assert_eq!(names(&by_tag), vec!["Me-O Kitten 1.1kg"]);

        let by_brand = db.search_products("petlove", 50).await.unwrap();
        assert_eq!(by_brand.len(), 2);

        let capped = db.search_products("o", 3).await.unwrap();
        assert_eq!(capped.len(), 3);

        scratch.close().await;
    }

    #[tokio::test]
    async fn paging_and_facets() {
        let Some(scratch) = Scratch::open().await else {
            return;
        };
        let db = &scratch.db;

        let query = listing(ListParams {
            page: Some("3".into()),
            limit: Some("3".into()),
            ..ListParams::default()
        });
        assert_eq!(db.list_products(&query).await.unwrap().len(), 2);
        assert_eq!(db.count_products(&query.filter).await.unwrap(), 8);

        assert_eq!(db.distinct_categories().await.unwrap().len(), 4);
        assert_eq!(db.distinct_brands().await.unwrap().len(), 7);
        assert!(db.health_check().await);

        scratch.close().await;
    }
}
