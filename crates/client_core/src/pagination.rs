//! Pagination window arithmetic. Nothing here is cached between loads: every
//! page change is a fresh round trip.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub current_page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PaginationWindow {
    pub fn new(current_page: u32, page_size: u32, total: u64) -> Self {
        Self {
            current_page,
            page_size,
            total,
        }
    }

    pub fn last_page(&self) -> u64 {
        if self.page_size == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// Rows viewed up to and including the current page, capped at `total`.
    pub fn shown(&self) -> u64 {
        let viewed = u64::from(self.current_page) * u64::from(self.page_size);
        viewed.min(self.total)
    }

    pub fn badge(&self) -> String {
        format!("{}/{}", self.shown(), self.total)
    }

    pub fn has_controls(&self) -> bool {
        self.total > u64::from(self.page_size)
    }

    pub fn prev_enabled(&self) -> bool {
        self.current_page != 1
    }

    pub fn next_enabled(&self) -> bool {
        u64::from(self.current_page) != self.last_page()
    }
}
