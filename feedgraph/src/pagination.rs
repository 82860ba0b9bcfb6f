//! Page/limit handling for every listing.
//!
//! Bad input never fails a request: non-numeric, zero and negative values fall
//! back to the defaults. Totals are counted before the window is applied.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
/// Upper bound applied to `limit` unless configured otherwise.
pub const MAX_LIMIT: u64 = 100;

/// A caller's requested page, already coerced to positive values.
///
/// Deserialized requests go through the same coercion as [`PageRequest::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPageRequest")]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

#[derive(Deserialize)]
struct RawPageRequest {
    #[serde(default)]
    page: i64,
    #[serde(default)]
    limit: i64,
}

impl From<RawPageRequest> for PageRequest {
    fn from(raw: RawPageRequest) -> Self {
        Self::new(raw.page, raw.limit)
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

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: positive_or(page, DEFAULT_PAGE),
            limit: positive_or(limit, DEFAULT_LIMIT),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Coerces raw query-string values such as `?page=2&limit=abc`.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page, DEFAULT_PAGE),
            limit: parse_positive(limit, DEFAULT_LIMIT),
        }
    }

    pub fn clamp_limit(self, max_limit: u64) -> Self {
        Self {
            page: self.page,
            limit: self.limit.min(max_limit.max(1)),
        }
    }
}

fn positive_or(value: i64, default: u64) -> u64 {
    u64::try_from(value).ok().filter(|value| *value > 0).unwrap_or(default)
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|raw| raw.trim().parse::<i64>().ok())
        .map_or(default, |value| positive_or(value, default))
}

/// Skip/limit to apply to a result set, and the total to report with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
    pub reported_total: u64,
}

impl Window {
    pub fn compute(request: PageRequest, total: u64) -> Self {
        let page = request.page.max(DEFAULT_PAGE);
        let limit = if request.limit == 0 { DEFAULT_LIMIT } else { request.limit };
        Self {
            page,
            skip: (page - 1).saturating_mul(limit),
            limit,
            reported_total: total,
        }
    }

    pub fn has_more(&self) -> bool {
        self.skip.saturating_add(self.limit) < self.reported_total
    }

    /// Slices an already ordered, unpaginated result set.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(limit).collect()
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub limit: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: Window) -> Self {
        Self {
            items,
            count: window.reported_total,
            page: window.page,
            limit: window.limit,
            has_more: window.has_more(),
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), Window::compute(request, 0))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
