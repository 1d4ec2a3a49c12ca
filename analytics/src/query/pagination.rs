use common::{Error, Result};
use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 5000;

/// A validated 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    limit: u64,
    offset: u64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self> {
        if page < 1 {
            return Err(Error::InvalidInput(format!(
                "page must be greater than or equal to 1, got {}",
                page
            )));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, limit
            )));
        }

        let (page, limit) = (page as u64, limit as u64);
        let offset = (page - 1)
            .checked_mul(limit)
            .filter(|offset| usize::try_from(*offset).is_ok())
            .ok_or_else(|| Error::InvalidInput(format!("page {} is out of range", page)))?;

        Ok(Self { page, limit, offset })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// `(page - 1) * limit`
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// `(skip, fetch)` in the shape `DataFrame::limit` takes.
    pub fn window(&self) -> (usize, usize) {
        (self.offset as usize, self.limit as usize)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE as u64,
            limit: DEFAULT_LIMIT as u64,
            offset: 0,
        }
    }
}

/// `floor(total_rows / limit) + 1`. Reports one trailing empty page when
/// `total_rows` is an exact multiple of `limit`; clients rely on this count.
pub fn total_pages(total_rows: u64, limit: u64) -> u64 {
    total_rows / limit + 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total_rows: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(request: PageRequest, total_rows: u64) -> Self {
        Self {
            page: request.page(),
            limit: request.limit(),
            total_rows,
            total_pages: total_pages(total_rows, request.limit()),
        }
    }
}
