use serde::Serialize;

/// One page of a listing.
///
/// `total` counts every matching row, not only the ones on this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        Self {
            items,
            total,
            page,
            limit,
        }
    }

    /// Number of pages needed to hold `total` rows, at least one.
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.limit)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Page::new(vec![1, 2], 12, 1, 5).total_pages(), 3);
        assert_eq!(Page::<u8>::new(Vec::new(), 0, 1, 10).total_pages(), 1);
        assert_eq!(Page::new(vec![1], 10, 1, 10).total_pages(), 1);
    }
}
