// =============================================================================
// QUERY MODULE
// =============================================================================
// Turns raw query-string parameters into a normalized listing query:
// filters, a sort order and a page window.
//
// LEARNING NOTES:
// - Every parameter arrives as Option<String> so a malformed number can never
//   make the Query extractor reject the request
// - Coercion happens once, here; the store only ever sees typed values
// - Enums model the closed sets (tags with special meaning, sort keys)
//
// COERCION POLICY:
// - Blank strings are treated as absent
// - page/limit that are not positive integers fall back to their defaults
// - limit is capped at MAX_LIMIT
// - minPrice/maxPrice that are not finite numbers are ignored; fractional
//   bounds round inward because prices are whole VND
// =============================================================================

use serde::{Deserialize, Serialize};

/// First page when `page` is missing or invalid
pub const DEFAULT_PAGE: u32 = 1;

/// Page size for the general listing
pub const DEFAULT_LIMIT: u32 = 12;

/// Page size for featured/bestsellers/deals/related
pub const DEFAULT_SHOWCASE_LIMIT: u32 = 8;

/// Hard upper bound on any requested page size
pub const MAX_LIMIT: u32 = 100;

/// Quick search never returns more than this many products
pub const SEARCH_RESULT_CAP: u32 = 50;

/// Category value that disables the category filter
const ALL_CATEGORIES: &str = "all";

// =============================================================================
// RAW PARAMETERS
// =============================================================================

/// Query parameters for the listing endpoint
///
/// # Example
/// GET /api/v1/products?category=cat&tag=daily_deal&sort=price_asc&page=2
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub brand: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// `?limit=` only, used by the showcase and related endpoints
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

impl LimitParams {
    pub fn resolve(&self, default: u32) -> u32 {
        parse_limit(self.limit.as_deref(), default)
    }
}

/// `?query=` for quick search
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

// =============================================================================
// TAG FILTER
// =============================================================================
/// A `tag` value. Three keywords carry their own filter semantics; anything
/// else is matched exactly against the product's tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagFilter {
    /// `daily_deal`: discount > 0
    DailyDeal,
    /// `featured`: rating >= 4.5
    Featured,
    /// `new_arrivals`: isNew = true
    NewArrivals,
    /// Any other value: exact membership in `tags`
    Label(String),
}

impl TagFilter {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "daily_deal" => TagFilter::DailyDeal,
            "featured" => TagFilter::Featured,
            "new_arrivals" => TagFilter::NewArrivals,
            other => TagFilter::Label(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TagFilter::DailyDeal => "daily_deal",
            TagFilter::Featured => "featured",
            TagFilter::NewArrivals => "new_arrivals",
            TagFilter::Label(label) => label,
        }
    }
}

/// Rating at or above which a product counts as featured
pub const FEATURED_MIN_RATING: f64 = 4.5;

/// Sales at or above which the featured showcase picks a product up
pub const FEATURED_MIN_SALES: i32 = 100;

// =============================================================================
// PRODUCT FILTER
// =============================================================================
/// All listing filters, ANDed together. `None` means "not applied".
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the category name
    pub category: Option<String>,
    pub tag: Option<TagFilter>,
    /// Case-insensitive substring of name, description or category name
    pub search: Option<String>,
    /// Inclusive lower bound on price
    pub min_price: Option<i64>,
    /// Inclusive upper bound on price
    pub max_price: Option<i64>,
    /// Case-insensitive substring of the brand
    pub brand: Option<String>,
}

// =============================================================================
// SORT ORDER
// =============================================================================
/// Listing sort. Resolution is exclusive; the first matching key wins.
///
/// An absent `sort` means newest first, but an unrecognized one means name
/// ascending. Storefront links depend on both defaults; don't merge them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// salesCount desc, then reviews desc
    Bestseller,
    PriceAsc,
    PriceDesc,
    /// rating desc
    Rating,
    /// createdAt desc
    #[default]
    Newest,
    /// name asc
    Name,
}

impl SortOrder {
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw {
            None => SortOrder::Newest,
            Some("bestseller") => SortOrder::Bestseller,
            Some("price_asc") => SortOrder::PriceAsc,
            Some("price_desc") => SortOrder::PriceDesc,
            Some("rating") => SortOrder::Rating,
            Some("newest") => SortOrder::Newest,
            Some(_) => SortOrder::Name,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Bestseller => "bestseller",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
            SortOrder::Rating => "rating",
            SortOrder::Newest => "newest",
            SortOrder::Name => "name",
        }
    }
}

// =============================================================================
// SHOWCASE
// =============================================================================
/// Fixed listings that ignore the general filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Showcase {
    /// rating >= 4.5 OR tagged "featured" OR salesCount >= 100;
    /// rating desc, salesCount desc
    Featured,
    /// everything; salesCount desc, reviews desc
    Bestsellers,
    /// discount > 0; discount desc, createdAt desc
    Deals,
}

impl Showcase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Showcase::Featured => "featured",
            Showcase::Bestsellers => "bestsellers",
            Showcase::Deals => "deals",
        }
    }
}

// =============================================================================
// PAGE WINDOW
// =============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Rows to skip: (page - 1) * limit
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

// =============================================================================
// LISTING QUERY
// =============================================================================
/// A fully normalized listing request
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListingQuery {
    pub filter: ProductFilter,
    pub sort: SortOrder,
    pub page: PageRequest,
}

impl ListingQuery {
    pub fn from_params(params: &ListParams) -> Self {
        let category = non_blank(params.category.as_deref())
            .filter(|c| *c != ALL_CATEGORIES)
            .map(str::to_string);

        let filter = ProductFilter {
            category,
            tag: non_blank(params.tag.as_deref()).map(TagFilter::parse),
            search: non_blank(params.search.as_deref()).map(str::to_string),
            min_price: parse_price(params.min_price.as_deref(), f64::ceil),
            max_price: parse_price(params.max_price.as_deref(), f64::floor),
            brand: non_blank(params.brand.as_deref()).map(str::to_string),
        };

        Self {
            filter,
            sort: SortOrder::resolve(non_blank(params.sort.as_deref())),
            page: PageRequest {
                page: parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
                limit: parse_limit(params.limit.as_deref(), DEFAULT_LIMIT),
            },
        }
    }

    /// The filter values actually applied, echoed back for client display
    pub fn applied_filters(&self) -> AppliedFilters {
        AppliedFilters {
            category: self.filter.category.clone(),
            tag: self.filter.tag.as_ref().map(|t| t.as_str().to_string()),
            search: self.filter.search.clone(),
            min_price: self.filter.min_price,
            max_price: self.filter.max_price,
            brand: self.filter.brand.clone(),
            sort: self.sort.as_str(),
        }
    }
}

/// Normalized filters, serialized under `data.filters`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilters {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub brand: Option<String>,
    pub sort: &'static str,
}

// =============================================================================
// COERCION HELPERS
// =============================================================================

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    non_blank(raw)
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|n| *n >= 1)
}

fn parse_limit(raw: Option<&str>, default: u32) -> u32 {
    parse_positive(raw).unwrap_or(default).min(MAX_LIMIT)
}

fn parse_price(raw: Option<&str>, round: fn(f64) -> f64) -> Option<i64> {
    non_blank(raw)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .map(|n| round(n) as i64)
}
