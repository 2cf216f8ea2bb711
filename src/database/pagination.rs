use serde::{Deserialize, Serialize};

/// One page of a windowed list query, with the offsets a client needs to
/// walk the result set. `total_rows` comes from a `COUNT(*) OVER()`
/// column on the rows themselves, so a page is always a single query.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: i64,
    pub prev_offset: i64,
    pub page_count: i64,
    pub message: Option<String>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let last_offset = ((total_rows - 1) / page_size) * page_size;
        let next_offset = (current_offset + page_size).min(last_offset);
        let prev_offset = (current_offset - page_size).max(0);
        let page_count = (total_rows + page_size - 1) / page_size;

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
            page_count,
            message: Some(format!(
                "{} - {} / {}",
                current_offset,
                (current_offset + page_size).min(total_rows),
                total_rows
            )),
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: 0,
            prev_offset: 0,
            page_count: 1,
            message: Some(String::from("No results")),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageContext<U> {
        PageContext {
            rows: self.rows.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            next_offset: self.next_offset,
            prev_offset: self.prev_offset,
            page_count: self.page_count,
            message: self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_has_no_movement() {
        let page = PageContext::from_rows(vec![1, 2, 3], 3, 10, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.next_offset, 0);
        assert_eq!(page.prev_offset, 0);
    }

    #[test]
    fn middle_page_points_both_ways() {
        let page = PageContext::from_rows(vec![0; 10], 35, 10, 10);
        assert_eq!(page.page_count, 4);
        assert_eq!(page.next_offset, 20);
        assert_eq!(page.prev_offset, 0);
    }

    #[test]
    fn last_page_clamps_next_offset() {
        let page = PageContext::from_rows(vec![0; 5], 35, 10, 30);
        assert_eq!(page.next_offset, 30);
        assert_eq!(page.prev_offset, 20);
    }

    #[test]
    fn empty_result_is_the_no_rows_page() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 10, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.message.as_deref(), Some("No results"));
    }
}
