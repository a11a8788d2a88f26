//! Composition of list queries from optional search, filter and sort parameters.
//!
//! Every parameter is independent: an absent value adds no constraint. Sorting
//! goes through a per-resource allow-list of column names; an unknown name
//! leaves the query unsorted (apart from the `id` tiebreaker).

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{ColumnTrait, Condition, EntityTrait, IdenStatic, QueryFilter, QueryOrder, Select};

use crate::entities::users::Role;
use crate::entities::{products, users};

pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` (any case) sorts ascending; anything else falls back to descending.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    const fn as_order(self) -> sea_orm::Order {
        match self {
            Self::Asc => sea_orm::Order::Asc,
            Self::Desc => sea_orm::Order::Desc,
        }
    }
}

const LIKE_ESCAPE: char = '!';

/// Makes `%` and `_` in user input match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Accumulates predicate clauses against one entity, then yields the `Select` once.
pub struct QueryBuilder<E: EntityTrait> {
    select: Select<E>,
}

impl<E: EntityTrait> Default for QueryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> QueryBuilder<E> {
    #[must_use]
    pub fn new() -> Self {
        Self { select: E::find() }
    }

    /// Case-insensitive substring match OR-ed across `columns`.
    #[must_use]
    pub fn search(mut self, term: Option<&str>, columns: &[E::Column]) -> Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };

        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        let condition = columns.iter().fold(Condition::any(), |cond, column| {
            cond.add(
                Expr::expr(Func::lower(Expr::col((E::default(), *column))))
                    .like(LikeExpr::new(&pattern).escape(LIKE_ESCAPE)),
            )
        });

        self.select = self.select.filter(condition);
        self
    }

    #[must_use]
    pub fn eq<V>(mut self, column: E::Column, value: Option<V>) -> Self
    where
        V: Into<sea_orm::Value>,
    {
        if let Some(value) = value {
            self.select = self.select.filter(column.eq(value));
        }
        self
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn min<V>(mut self, column: E::Column, value: Option<V>) -> Self
    where
        V: Into<sea_orm::Value>,
    {
        if let Some(value) = value {
            self.select = self.select.filter(column.gte(value));
        }
        self
    }

    /// Inclusive upper bound.
    #[must_use]
    pub fn max<V>(mut self, column: E::Column, value: Option<V>) -> Self
    where
        V: Into<sea_orm::Value>,
    {
        if let Some(value) = value {
            self.select = self.select.filter(column.lte(value));
        }
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Option<Condition>) -> Self {
        if let Some(condition) = condition {
            self.select = self.select.filter(condition);
        }
        self
    }

    /// Orders by `column` when it resolved, then always by `tiebreaker` ascending.
    #[must_use]
    pub fn sort(
        mut self,
        column: Option<E::Column>,
        order: SortOrder,
        tiebreaker: E::Column,
    ) -> Self {
        let sorted_by_tiebreaker = column.is_some_and(|c| c.as_str() == tiebreaker.as_str());
        if let Some(column) = column {
            self.select = self.select.order_by(column, order.as_order());
        }
        if !sorted_by_tiebreaker {
            self.select = self.select.order_by_asc(tiebreaker);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> Select<E> {
        self.select
    }
}

#[must_use]
pub fn user_sort_column(field: &str) -> Option<users::Column> {
    match field {
        "id" => Some(users::Column::Id),
        "username" => Some(users::Column::Username),
        "email" => Some(users::Column::Email),
        "role" => Some(users::Column::Role),
        "is_active" => Some(users::Column::IsActive),
        "created_at" => Some(users::Column::CreatedAt),
        "updated_at" => Some(users::Column::UpdatedAt),
        _ => None,
    }
}

#[must_use]
pub fn product_sort_column(field: &str) -> Option<products::Column> {
    match field {
        "id" => Some(products::Column::Id),
        "name" => Some(products::Column::Name),
        "price" => Some(products::Column::Price),
        "quantity" => Some(products::Column::Quantity),
        "category" => Some(products::Column::Category),
        "is_available" => Some(products::Column::IsAvailable),
        "created_at" => Some(products::Column::CreatedAt),
        "updated_at" => Some(products::Column::UpdatedAt),
        _ => None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserListOptions {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Default)]
pub struct ProductListOptions {
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_available: Option<bool>,
    pub in_stock: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

#[must_use]
pub fn user_query(options: &UserListOptions) -> Select<users::Entity> {
    let sort_field = options.sort_by.as_deref().unwrap_or(DEFAULT_SORT_FIELD);

    QueryBuilder::<users::Entity>::new()
        .search(
            options.search.as_deref(),
            &[users::Column::Username, users::Column::Email],
        )
        .eq(users::Column::Role, options.role)
        .eq(users::Column::IsActive, options.is_active)
        .sort(
            user_sort_column(sort_field),
            options.sort_order,
            users::Column::Id,
        )
        .build()
}

#[must_use]
pub fn product_query(options: &ProductListOptions) -> Select<products::Entity> {
    let sort_field = options.sort_by.as_deref().unwrap_or(DEFAULT_SORT_FIELD);

    let stock = options.in_stock.map(|in_stock| {
        if in_stock {
            Condition::all().add(products::Column::Quantity.gt(0))
        } else {
            Condition::all().add(products::Column::Quantity.lte(0))
        }
    });

    QueryBuilder::<products::Entity>::new()
        .search(
            options.search.as_deref(),
            &[products::Column::Name, products::Column::Description],
        )
        .eq(products::Column::Category, options.category.clone())
        .eq(products::Column::IsAvailable, options.is_available)
        .condition(stock)
        .min(products::Column::Price, options.min_price)
        .max(products::Column::Price, options.max_price)
        .sort(
            product_sort_column(sort_field),
            options.sort_order,
            products::Column::Id,
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql<E: EntityTrait>(select: Select<E>) -> String {
        select.build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }

    #[test]
    fn test_sort_allow_lists() {
        assert!(user_sort_column("username").is_some());
        assert!(user_sort_column("password_hash").is_none());
        assert!(product_sort_column("price").is_some());
        assert!(product_sort_column("drop table").is_none());
    }

    #[test]
    fn test_empty_options_only_sort() {
        let query = sql(user_query(&UserListOptions::default()));
        assert!(!query.contains("WHERE"));
        assert!(query.contains(r#"ORDER BY "users"."created_at" DESC, "users"."id" ASC"#));
    }

    #[test]
    fn test_unknown_sort_field_is_skipped() {
        let options = ProductListOptions {
            sort_by: Some("nonexistent".to_string()),
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let query = sql(product_query(&options));
        assert!(query.contains(r#"ORDER BY "products"."id" ASC"#));
        assert!(!query.contains("nonexistent"));
    }

    #[test]
    fn test_sort_by_id_has_no_duplicate_tiebreaker() {
        let options = UserListOptions {
            sort_by: Some("id".to_string()),
            ..Default::default()
        };
        let query = sql(user_query(&options));
        assert!(query.ends_with(r#"ORDER BY "users"."id" DESC"#));
    }

    #[test]
    fn test_search_is_case_insensitive_or() {
        let options = ProductListOptions {
            search: Some("  LaPtop ".to_string()),
            ..Default::default()
        };
        let query = sql(product_query(&options));
        assert!(query.contains(r#"LOWER("products"."name") LIKE '%laptop%'"#));
        assert!(query.contains(" OR "));
        assert!(query.contains(r#"LOWER("products"."description") LIKE '%laptop%'"#));
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");

        let options = ProductListOptions {
            search: Some("%".to_string()),
            ..Default::default()
        };
        let query = sql(product_query(&options));
        assert!(query.contains(r#"LOWER("products"."name") LIKE '%!%%' ESCAPE '!'"#));
    }

    #[test]
    fn test_filters_compose() {
        let options = ProductListOptions {
            category: Some("Books".to_string()),
            in_stock: Some(false),
            min_price: Some(5.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        let query = sql(product_query(&options));
        assert!(query.contains(r#""products"."category" = 'Books'"#));
        assert!(query.contains(r#""products"."quantity" <= 0"#));
        assert!(query.contains(r#""products"."price" >= 5"#));
        assert!(query.contains(r#""products"."price" <= 20"#));
    }

    #[test]
    fn test_user_role_filter() {
        let options = UserListOptions {
            role: Some(Role::Admin),
            is_active: Some(true),
            ..Default::default()
        };
        let query = sql(user_query(&options));
        assert!(query.contains(r#""users"."role" = 'admin'"#));
        assert!(query.contains(r#""users"."is_active" = "#));
    }
}
