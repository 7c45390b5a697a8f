//! Page slicing. `total` is the pre-slice length; `page` and `per_page`
//! are echoed back even when the page lies past the end.

use crate::models::Page;

pub const DEFAULT_PER_PAGE: usize = 24;

pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let total = items.len();
    let start = page.saturating_sub(1).saturating_mul(per_page);

    let results = if start >= total {
        Vec::new()
    } else {
        items.into_iter().skip(start).take(per_page).collect()
    };

    Page {
        results,
        total,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page() {
        let page = paginate((0..10).collect(), 1, 4);
        assert_eq!(page.results, vec![0, 1, 2, 3]);
        assert_eq!(page.total, 10);
    }

    #[test]
    fn test_partial_last_page() {
        let page = paginate((0..10).collect(), 3, 4);
        assert_eq!(page.results, vec![8, 9]);
    }

    #[test]
    fn test_out_of_range_page_is_empty_but_echoed() {
        let page = paginate((0..10).collect::<Vec<i32>>(), 9, 4);
        assert!(page.results.is_empty());
        assert_eq!(page.total, 10);
        assert_eq!(page.page, 9);
        assert_eq!(page.per_page, 4);
    }

    #[test]
    fn test_length_formula_holds() {
        for total in [0usize, 1, 7, 24, 25] {
            for page in 1..6usize {
                for per_page in 1..9usize {
                    let p = paginate((0..total).collect(), page, per_page);
                    let expected = total
                        .saturating_sub((page - 1) * per_page)
                        .min(per_page);
                    assert_eq!(p.results.len(), expected);
                    assert_eq!(p.total, total);
                }
            }
        }
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let page = paginate(vec![1, 2, 3], usize::MAX, usize::MAX);
        assert!(page.results.is_empty());
        assert_eq!(page.total, 3);
    }
}
