//! Parsing context for one page response

/// Context information for parsing a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageContext {
    /// Zero-based page index within the query
    pub page_index: u32,

    /// Rows the registry returns on a full page
    pub page_size: u32,
}

impl PageContext {
    pub fn new(page_index: u32) -> Self {
        use crate::infrastructure::config::defaults::PAGE_SIZE;

        Self {
            page_index,
            page_size: PAGE_SIZE,
        }
    }

    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub const fn is_first_page(&self) -> bool {
        self.page_index == 0
    }

    /// Offset of the first row on this page
    pub const fn first_row(&self) -> u32 {
        self.page_index * self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_page_size() {
        assert_eq!(PageContext::new(0).first_row(), 0);
        assert_eq!(PageContext::new(3).first_row(), 45);
        assert_eq!(PageContext::new(2).with_page_size(10).first_row(), 20);
        assert!(PageContext::new(0).is_first_page());
    }
}
