use common::EntityId;
use serde::{Deserialize, Serialize};

/// Page size used when a query names none.
pub const DEFAULT_LIMIT: u32 = 10;

fn page_size(limit: u32) -> u32 {
    if limit == 0 { DEFAULT_LIMIT } else { limit }
}

fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.max(1) - 1) * u64::from(limit)
}

/// Column a stock listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockOrder {
    #[default]
    CreatedAt,
    Stock,
    ProductName,
}

impl StockOrder {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            StockOrder::CreatedAt => "s.created_at",
            StockOrder::Stock => "s.stock",
            StockOrder::ProductName => "p.name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column a category listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryOrder {
    #[default]
    CreatedAt,
    Name,
}

impl CategoryOrder {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            CategoryOrder::CreatedAt => "created_at",
            CategoryOrder::Name => "name",
        }
    }
}

/// Column a product listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductOrder {
    #[default]
    CreatedAt,
    Name,
    ProductCode,
}

impl ProductOrder {
    pub(crate) fn column(&self) -> &'static str {
        match self {
            ProductOrder::CreatedAt => "created_at",
            ProductOrder::Name => "name",
            ProductOrder::ProductCode => "product_code",
        }
    }
}

impl SortDirection {
    pub(crate) fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Builder for filtering and paging stock rows.
///
/// Only live (not soft deleted) stock rows are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockQuery {
    /// Keep rows whose quantity is strictly greater than this.
    pub stock_greater_than: Option<i64>,

    /// Keep rows whose quantity is strictly lower than this.
    pub stock_lower_than: Option<i64>,

    /// Case-insensitive substring of the product name.
    pub product_name: Option<String>,

    /// Case-insensitive substring of the variant name.
    pub variant_name: Option<String>,

    /// Page size.
    pub limit: u32,

    /// 1-based page number.
    pub page: u32,

    pub order: StockOrder,
    pub direction: SortDirection,
}

impl Default for StockQuery {
    fn default() -> Self {
        Self {
            stock_greater_than: None,
            stock_lower_than: None,
            product_name: None,
            variant_name: None,
            limit: DEFAULT_LIMIT,
            page: 1,
            order: StockOrder::default(),
            direction: SortDirection::default(),
        }
    }
}

impl StockQuery {
    pub const DEFAULT_LIMIT: u32 = self::DEFAULT_LIMIT;

    /// Creates a query for the first page with default ordering.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock_greater_than(mut self, stock: i64) -> Self {
        self.stock_greater_than = Some(stock);
        self
    }

    pub fn stock_lower_than(mut self, stock: i64) -> Self {
        self.stock_lower_than = Some(stock);
        self
    }

    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn variant_name(mut self, name: impl Into<String>) -> Self {
        self.variant_name = Some(name.into());
        self
    }

    /// Sets the page size. Zero falls back to the default.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = page_size(limit);
        self
    }

    /// Sets the 1-based page. Zero is treated as the first page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn order_by(mut self, order: StockOrder, direction: SortDirection) -> Self {
        self.order = order;
        self.direction = direction;
        self
    }

    /// Number of rows skipped before the current page.
    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }
}

/// Builder for filtering and paging product categories.
///
/// Only live categories are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuery {
    /// Case-insensitive substring of the category name.
    pub name: Option<String>,
    pub limit: u32,
    pub page: u32,
    pub order: CategoryOrder,
    pub direction: SortDirection,
}

impl Default for CategoryQuery {
    fn default() -> Self {
        Self {
            name: None,
            limit: DEFAULT_LIMIT,
            page: 1,
            order: CategoryOrder::default(),
            direction: SortDirection::default(),
        }
    }
}

impl CategoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = page_size(limit);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn order_by(mut self, order: CategoryOrder, direction: SortDirection) -> Self {
        self.order = order;
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }
}

/// Builder for filtering and paging products.
///
/// Only live products are listed. Text filters are case-insensitive
/// substrings; `category_id` and `is_variant` match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub name: Option<String>,
    pub product_code: Option<String>,
    pub product_sku: Option<String>,
    pub category_id: Option<EntityId>,
    pub is_variant: Option<bool>,
    pub limit: u32,
    pub page: u32,
    pub order: ProductOrder,
    pub direction: SortDirection,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            name: None,
            product_code: None,
            product_sku: None,
            category_id: None,
            is_variant: None,
            limit: DEFAULT_LIMIT,
            page: 1,
            order: ProductOrder::default(),
            direction: SortDirection::default(),
        }
    }
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn product_code(mut self, code: impl Into<String>) -> Self {
        self.product_code = Some(code.into());
        self
    }

    pub fn product_sku(mut self, sku: impl Into<String>) -> Self {
        self.product_sku = Some(sku.into());
        self
    }

    pub fn category(mut self, category_id: EntityId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn is_variant(mut self, is_variant: bool) -> Self {
        self.is_variant = Some(is_variant);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = page_size(limit);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn order_by(mut self, order: ProductOrder, direction: SortDirection) -> Self {
        self.order = order;
        self.direction = direction;
        self
    }

    pub fn offset(&self) -> u64 {
        page_offset(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_first_page_of_ten() {
        let query = StockQuery::new();
        assert_eq!(query.limit, 10);
        assert_eq!(query.page, 1);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let query = StockQuery::new().limit(25).page(3);
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn zero_limit_and_page_fall_back_to_defaults() {
        let query = StockQuery::new().limit(0).page(0);
        assert_eq!(query.limit, StockQuery::DEFAULT_LIMIT);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn query_builder_chain() {
        let query = StockQuery::new()
            .stock_greater_than(5)
            .stock_lower_than(100)
            .product_name("widget")
            .variant_name("large")
            .order_by(StockOrder::Stock, SortDirection::Desc);

        assert_eq!(query.stock_greater_than, Some(5));
        assert_eq!(query.stock_lower_than, Some(100));
        assert_eq!(query.product_name.as_deref(), Some("widget"));
        assert_eq!(query.variant_name.as_deref(), Some("large"));
        assert_eq!(query.order.column(), "s.stock");
        assert_eq!(query.direction.keyword(), "DESC");
    }

    #[test]
    fn category_and_product_queries_share_paging_rules() {
        let categories = CategoryQuery::new().name("tool").limit(0).page(3);
        assert_eq!(categories.limit, DEFAULT_LIMIT);
        assert_eq!(categories.offset(), 20);
        assert_eq!(categories.order.column(), "created_at");

        let products = ProductQuery::new()
            .category(EntityId::from("C1"))
            .is_variant(true)
            .limit(5)
            .page(0)
            .order_by(ProductOrder::Name, SortDirection::Desc);
        assert_eq!(products.page, 1);
        assert_eq!(products.offset(), 0);
        assert_eq!(products.category_id, Some(EntityId::from("C1")));
        assert_eq!(products.is_variant, Some(true));
        assert_eq!(products.order.column(), "name");
    }
}
