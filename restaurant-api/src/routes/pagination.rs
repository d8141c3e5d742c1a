/// List pagination
///
/// ```text
/// GET /orders?page=2&recordsPerPage=5
/// ```
///
/// | Parameter | Default | Notes |
/// |-----------|---------|-------|
/// | `page` | 1 | values < 1 or non-numeric fall back to 1 |
/// | `recordsPerPage` | 10 | alias `recordPerPage`; < 1 or non-numeric fall back to 10 |
/// | `startIndex` | `(page - 1) * recordsPerPage` | explicit offset, ignored unless a non-negative integer |

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_RECORDS_PER_PAGE: u64 = 10;

/// Raw list query parameters
///
/// Kept as strings so that bad values fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,

    #[serde(rename = "recordsPerPage", alias = "recordPerPage")]
    pub records_per_page: Option<String>,

    #[serde(rename = "startIndex")]
    pub start_index: Option<String>,
}

/// Resolved window over a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub records_per_page: u64,
    pub skip: u64,
}

impl From<&ListParams> for Pagination {
    fn from(params: &ListParams) -> Self {
        let records_per_page = positive(params.records_per_page.as_deref())
            .unwrap_or(DEFAULT_RECORDS_PER_PAGE);
        let page = positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE);

        let skip = params
            .start_index
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or_else(|| (page - 1).saturating_mul(records_per_page));

        Self {
            page,
            records_per_page,
            skip,
        }
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
}

/// One window of a collection plus the collection's full size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub total_count: u64,
    pub page: u64,
    pub records_per_page: u64,
    pub items: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(pagination: Pagination, total_count: u64, items: Vec<T>) -> Self {
        Self {
            total_count,
            page: pagination.page,
            records_per_page: pagination.records_per_page,
            items,
        }
    }
}
