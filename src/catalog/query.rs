use serde::Serialize;

use super::store::Catalog;
use super::title::Title;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Filters for a catalog query. All set filters must match.
///
/// Empty strings are treated the same as unset filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    category: Option<String>,
    title_type: Option<String>,
    needle: Option<String>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = non_empty(category.into());
        self
    }

    pub fn title_type(mut self, title_type: impl Into<String>) -> Self {
        self.title_type = non_empty(title_type.into());
        self
    }

    /// Case-insensitive substring match on the title text.
    pub fn text(mut self, q: impl Into<String>) -> Self {
        self.needle = non_empty(q.into()).map(|q| q.to_lowercase());
        self
    }

    pub fn matches(&self, title: &Title) -> bool {
        if let Some(ref category) = self.category {
            if !title.in_category(category) {
                return false;
            }
        }

        if let Some(ref title_type) = self.title_type {
            if title.title_type != *title_type {
                return false;
            }
        }

        if let Some(ref needle) = self.needle {
            if !title.title_contains(needle) {
                return false;
            }
        }

        true
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Pages far past any realistic catalog are all equally empty.
pub const MAX_PAGE: usize = u32::MAX as usize;

/// A normalized page request. `page` is in `1..=MAX_PAGE` and `limit` in
/// `1..=MAX_LIMIT`; every constructor enforces that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Normalize raw caller input; never fails.
    pub fn new(page: Option<f64>, limit: Option<f64>) -> Self {
        Self {
            page: normalize_page(page),
            limit: normalize_limit(limit),
        }
    }

    /// Same rules as [`Pagination::new`] for already whole numbers.
    pub fn from_parts(page: usize, limit: usize) -> Self {
        Self::new(Some(page as f64), Some(limit as f64))
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn start(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Floor a finite value; anything below 1 (or absent, NaN, infinite) is `None`.
fn positive_whole(raw: Option<f64>) -> Option<f64> {
    let value = raw?;
    if !value.is_finite() {
        return None;
    }
    let value = value.floor();
    if value < 1.0 {
        None
    } else {
        Some(value)
    }
}

pub fn normalize_page(raw: Option<f64>) -> usize {
    match positive_whole(raw) {
        Some(page) if page > MAX_PAGE as f64 => MAX_PAGE,
        Some(page) => page as usize,
        None => DEFAULT_PAGE,
    }
}

pub fn normalize_limit(raw: Option<f64>) -> usize {
    match positive_whole(raw) {
        Some(limit) if limit > MAX_LIMIT as f64 => MAX_LIMIT,
        Some(limit) => limit as usize,
        None => DEFAULT_LIMIT,
    }
}

/// One page of a filtered catalog listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<'a> {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub results: Vec<&'a Title>,
}

impl Catalog {
    /// Filter the titles in load order and cut out the requested page.
    pub fn query(&self, criteria: &Criteria, pagination: Pagination) -> PageResult<'_> {
        let start = pagination.start();
        let end = start.saturating_add(pagination.limit());

        let mut total = 0;
        let mut results = Vec::with_capacity(pagination.limit().min(self.len()));
        for title in self.titles().iter().filter(|t| criteria.matches(t)) {
            if total >= start && total < end {
                results.push(title);
            }
            total += 1;
        }

        PageResult {
            total,
            page: pagination.page(),
            limit: pagination.limit(),
            total_pages: total.div_ceil(pagination.limit()),
            results,
        }
    }
}
