//! This module defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The config that controls how requests are paged when the client does not
/// say otherwise.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a client may request.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// The raw `page` and `limit` query parameters of a request.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// The requested page number, starting from one.
    pub page: Option<u64>,
    /// The requested number of items per page.
    pub limit: Option<u64>,
}

/// A resolved page request, guaranteed to have a page number of at least one
/// and a limit between one and the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// The page number, starting from one.
    pub page: u64,
    /// The number of items per page.
    pub limit: u64,
}

impl PageParams {
    /// The number of items to skip to reach the start of the page.
    ///
    /// Saturates within SQLite's integer range for absurdly large page
    /// numbers, which simply read past the end of the collection and return
    /// an empty page.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }
}

impl PaginationConfig {
    /// Resolve the raw query parameters against the configured defaults and
    /// bounds.
    pub fn resolve(&self, query: PageQuery) -> PageParams {
        let page = query.page.unwrap_or(self.default_page).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);

        PageParams { page, limit }
    }
}

/// The page metadata returned alongside every paged collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// The page number of the returned slice, starting from one.
    pub page: u64,
    /// The requested number of items per page.
    pub limit: u64,
    /// The total number of items across all pages.
    pub total_items: u64,
    /// The total number of pages.
    pub total_pages: u64,
}

impl PageMetadata {
    /// Create the metadata for a page request over `total_items` items.
    pub fn new(params: PageParams, total_items: u64) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            total_items,
            total_pages: total_items.div_ceil(params.limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PageMetadata, PageParams, PageQuery, PaginationConfig};

    #[test]
    fn resolve_uses_defaults_when_unset() {
        let config = PaginationConfig::default();

        let params = config.resolve(PageQuery::default());

        assert_eq!(params, PageParams { page: 1, limit: 10 });
    }

    #[test]
    fn resolve_clamps_page_and_limit() {
        let config = PaginationConfig::default();

        let params = config.resolve(PageQuery {
            page: Some(0),
            limit: Some(10_000),
        });

        assert_eq!(
            params,
            PageParams {
                page: 1,
                limit: config.max_page_size
            }
        );
    }

    #[test]
    fn offset_skips_previous_pages() {
        let params = PageParams { page: 3, limit: 10 };

        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn offset_saturates_for_huge_page_numbers() {
        let config = PaginationConfig::default();

        let params = config.resolve(PageQuery {
            page: Some(u64::MAX),
            limit: Some(100),
        });

        assert_eq!(params.offset(), i64::MAX as u64);
    }

    #[test]
    fn metadata_rounds_page_count_up() {
        let params = PageParams { page: 1, limit: 10 };

        let metadata = PageMetadata::new(params, 21);

        assert_eq!(metadata.total_pages, 3);
    }

    #[test]
    fn metadata_for_empty_collection_has_zero_pages() {
        let params = PageParams { page: 1, limit: 10 };

        let metadata = PageMetadata::new(params, 0);

        assert_eq!(metadata.total_pages, 0);
        assert_eq!(metadata.total_items, 0);
    }
}
