/// Paginated search shared by the audit log and flag browsers
///
/// Filters are AND-combined and pushed into a `QueryBuilder`; pagination is
/// offset based with 1-based page numbers. A `limit` of zero disables
/// pagination and returns every match.
use crate::error::RelmonResult;
use crate::metrics;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, QueryBuilder, Sqlite, SqlitePool};

/// Page size used when the requested limit is not a usable integer
pub const DEFAULT_LIMIT: i64 = 50;

/// Raw browse parameters as they arrive from the request query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseParams {
    pub user: Option<String>,
    pub from_date: Option<String>,
    pub project: Option<String>,
    pub state: Option<String>,
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Coerced page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// 1-based page number
    pub page: i64,
    /// Page size; zero means unbounded
    pub limit: i64,
}

impl PageRequest {
    /// Coerce raw page/limit values, never failing.
    ///
    /// A missing or non-integer page, or one below 1, becomes page 1. A
    /// missing limit uses `default_limit`; a non-integer or negative limit
    /// also falls back to it and adds a notice for the viewer.
    pub fn from_params(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: i64,
        notices: &mut Vec<String>,
    ) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let limit = match limit.map(str::trim).filter(|l| !l.is_empty()) {
            None => default_limit,
            Some(raw) => match raw.parse::<i64>() {
                Ok(l) if l >= 0 => l,
                _ => {
                    notices.push("Incorrect limit provided, using default".to_string());
                    default_limit
                }
            },
        };

        Self::new(page, limit)
    }

    /// An unbounded request always reports page 1
    pub fn new(page: i64, limit: i64) -> Self {
        let limit = limit.max(0);
        let page = if limit == 0 { 1 } else { page.max(1) };
        Self { page, limit }
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit == 0
    }

    /// Rows skipped before this page
    pub fn offset(&self) -> i64 {
        if self.is_unbounded() {
            0
        } else {
            self.page.saturating_sub(1).saturating_mul(self.limit)
        }
    }

    /// `ceil(total / limit)`; an unbounded request is always one page
    pub fn total_pages(&self, total: i64) -> i64 {
        if self.is_unbounded() {
            1
        } else {
            let total = total.max(0);
            total / self.limit + i64::from(total % self.limit != 0)
        }
    }
}

/// Restriction on the user/actor column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum UserFilter {
    One(String),
    /// Any of the given identities (a viewer's username and email)
    AnyOf(Vec<String>),
}

/// Conjunctive search filters
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Exact project name, or a `*` pattern
    pub project: Option<String>,
    /// Inclusive lower bound on the creation date
    pub from_date: Option<NaiveDate>,
    pub user: Option<UserFilter>,
    /// Flag state, ignored by sources without a state column
    pub state: Option<String>,
}

impl SearchFilter {
    /// Build filters from raw parameters, dropping an unparsable date with a notice
    pub fn from_params(params: &BrowseParams, notices: &mut Vec<String>) -> Self {
        let from_date = match non_empty(params.from_date.as_deref()) {
            Some(raw) => {
                let parsed = parse_from_date(raw);
                if parsed.is_none() {
                    notices.push("Incorrect from_date provided, using default".to_string());
                }
                parsed
            }
            None => None,
        };

        Self {
            project: non_empty(params.project.as_deref()).map(String::from),
            from_date,
            user: non_empty(params.user.as_deref()).map(|u| UserFilter::One(u.to_string())),
            state: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a user supplied date, keeping only the calendar day
pub fn parse_from_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }

    None
}

/// Describes how a browsable collection maps onto SQL
#[derive(Debug, Clone, Copy)]
pub struct SearchSource {
    /// Collection name used in logs and metrics
    pub name: &'static str,
    /// `SELECT ... FROM ...` including the project join aliased as `p`
    pub select: &'static str,
    /// `FROM ...` clause shared with the count query
    pub from: &'static str,
    pub user_column: &'static str,
    pub created_column: &'static str,
    pub state_column: Option<&'static str>,
    /// Newest first, with a unique tiebreaker so pages are stable
    pub order_by: &'static str,
}

fn push_filters<'a>(
    qb: &mut QueryBuilder<'a, Sqlite>,
    source: &SearchSource,
    filter: &SearchFilter,
) {
    let mut has_where = false;
    let mut clause = |qb: &mut QueryBuilder<'a, Sqlite>| {
        qb.push(if has_where { " AND " } else { " WHERE " });
        has_where = true;
    };

    if let Some(project) = &filter.project {
        clause(qb);
        if project.contains('*') {
            qb.push("p.name LIKE ")
                .push_bind(like_pattern(project))
                .push(" ESCAPE '\\'");
        } else {
            qb.push("p.name = ").push_bind(project.clone());
        }
    }

    if let Some(from_date) = filter.from_date {
        clause(qb);
        qb.push(format!("substr({}, 1, 10) >= ", source.created_column))
            .push_bind(from_date.format("%Y-%m-%d").to_string());
    }

    match &filter.user {
        Some(UserFilter::One(user)) => {
            clause(qb);
            qb.push(format!("{} = ", source.user_column)).push_bind(user.clone());
        }
        Some(UserFilter::AnyOf(users)) if users.is_empty() => {
            clause(qb);
            qb.push("1 = 0");
        }
        Some(UserFilter::AnyOf(users)) => {
            clause(qb);
            qb.push(format!("{} IN (", source.user_column));
            let mut separated = qb.separated(", ");
            for user in users {
                separated.push_bind(user.clone());
            }
            separated.push_unseparated(")");
        }
        None => {}
    }

    if let (Some(column), Some(state)) = (source.state_column, &filter.state) {
        clause(qb);
        qb.push(format!("{} = ", column)).push_bind(state.clone());
    }
}

/// Translate a `*` pattern into a LIKE pattern, escaping LIKE metacharacters
fn like_pattern(pattern: &str) -> String {
    pattern
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
        .replace('*', "%")
}

/// Fetch one page of matching rows
pub async fn search<T>(
    pool: &SqlitePool,
    source: &SearchSource,
    filter: &SearchFilter,
    page: PageRequest,
    parse: fn(SqliteRow) -> RelmonResult<T>,
) -> RelmonResult<Vec<T>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("{} {}", source.select, source.from));
    push_filters(&mut qb, source, filter);
    qb.push(format!(" ORDER BY {}", source.order_by));

    if !page.is_unbounded() {
        qb.push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
    }

    metrics::record_search(source.name);
    let rows = qb.build().fetch_all(pool).await?;
    rows.into_iter().map(parse).collect()
}

/// Count every row matching the filters, ignoring pagination
pub async fn count(
    pool: &SqlitePool,
    source: &SearchSource,
    filter: &SearchFilter,
) -> RelmonResult<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) {}", source.from));
    push_filters(&mut qb, source, filter);

    let total = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(total)
}

/// One browsed page plus its totals
#[derive(Debug, Clone, Serialize)]
pub struct BrowseResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub total_pages: i64,
    pub page: i64,
    pub limit: i64,
    /// User-facing messages about coerced parameters or degraded results
    pub notices: Vec<String>,
}

/// Search and count, degrading to an empty result on storage failure
pub async fn browse<T>(
    pool: &SqlitePool,
    source: &SearchSource,
    filter: &SearchFilter,
    page: PageRequest,
    mut notices: Vec<String>,
    parse: fn(SqliteRow) -> RelmonResult<T>,
) -> BrowseResult<T> {
    let outcome = async {
        let items = search(pool, source, filter, page, parse).await?;
        let total = count(pool, source, filter).await?;
        Ok::<_, crate::error::RelmonError>((items, total))
    }
    .await;

    let (items, total) = match outcome {
        Ok(found) => found,
        Err(e) => {
            tracing::error!("Search over {} failed: {}", source.name, e);
            metrics::record_search_failure(source.name);
            notices.push(format!("Could not search {}, please try again later", source.name));
            (Vec::new(), 0)
        }
    };

    BrowseResult {
        items,
        total,
        total_pages: page.total_pages(total),
        page: page.page,
        limit: page.limit,
        notices,
    }
}
