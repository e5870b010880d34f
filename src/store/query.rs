//! Pure listing query over the metadata index.
//!
//! Filter, sort, and paginate a snapshot of records. Stateless: the caller
//! supplies the snapshot and the parameters, nothing here touches storage.

use serde::Deserialize;

use super::record::DocumentRecord;

/// Sort key for document listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Sort by upload timestamp.
    #[default]
    Date,
    /// Sort by byte size.
    Size,
}

/// Sort direction for document listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

/// Parameters for one listing query.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// Case-insensitive substring filter against the title. Empty matches
    /// everything.
    pub q: String,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// 1-based page number.
    pub page: usize,
    /// Page size, must be positive.
    pub page_size: usize,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: 10,
        }
    }
}

/// Result page of a listing query.
#[derive(Debug, Clone)]
pub struct ListPage {
    /// Records on the requested page.
    pub documents: Vec<DocumentRecord>,
    /// Total number of records matching the filter, across all pages.
    pub total: usize,
}

impl ListPage {
    /// Total page count for a given page size, floored at 1.
    pub fn page_count(&self, page_size: usize) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(page_size)
        }
    }
}

/// Run a listing query: filter, stable-sort, page-slice.
///
/// Ties on the sort key keep the original collection order (stable sort), so
/// the result order for equal keys is deterministic. A page beyond the end
/// yields an empty slice, not an error. `page` is clamped to 1 and
/// `page_size` to a minimum of 1 so degenerate inputs cannot panic.
pub fn run(records: Vec<DocumentRecord>, params: &ListParams) -> ListPage {
    let page = params.page.max(1);
    let page_size = params.page_size.max(1);

    let mut matched: Vec<DocumentRecord> = if params.q.is_empty() {
        records
    } else {
        let needle = params.q.to_lowercase();
        records
            .into_iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .collect()
    };

    // Stable sort with a per-comparison reversal: equal keys keep the
    // original collection order in both directions.
    matched.sort_by(|a, b| {
        let ord = match params.sort_by {
            SortBy::Date => a.upload_date.cmp(&b.upload_date),
            SortBy::Size => a.size.cmp(&b.size),
        };
        match params.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = matched.len();
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = page.saturating_mul(page_size).min(total);
    let documents = matched[start..end].to_vec();

    ListPage { documents, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(id: &str, title: &str, size: u64, age_minutes: i64) -> DocumentRecord {
        let mut r = DocumentRecord::new(id, title, format!("{id}.txt"), size, "text/plain");
        r.upload_date = Utc::now() - Duration::minutes(age_minutes);
        r
    }

    fn titles(page: &ListPage) -> Vec<&str> {
        page.documents.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let records = vec![record("1", "a", 1, 0), record("2", "b", 2, 0)];
        let page = run(records, &ListParams::default());
        assert_eq!(page.total, 2);
        assert_eq!(page.documents.len(), 2);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let records = vec![
            record("1", "Quarterly Report.pdf", 1, 0),
            record("2", "notes.txt", 2, 0),
            record("3", "REPORTING-guide.md", 3, 0),
        ];
        let params = ListParams {
            q: "report".to_string(),
            ..Default::default()
        };
        let page = run(records, &params);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_sort_by_size_asc_and_desc() {
        let records = vec![
            record("1", "ten", 10, 0),
            record("2", "five", 5, 0),
            record("3", "twenty", 20, 0),
        ];

        let asc = ListParams {
            sort_by: SortBy::Size,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        let page = run(records.clone(), &asc);
        assert_eq!(titles(&page), vec!["five", "ten", "twenty"]);

        let desc = ListParams {
            sort_by: SortBy::Size,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let page = run(records, &desc);
        assert_eq!(titles(&page), vec!["twenty", "ten", "five"]);
    }

    #[test]
    fn test_sort_by_date() {
        let records = vec![
            record("1", "old", 1, 60),
            record("2", "new", 1, 0),
            record("3", "middle", 1, 30),
        ];
        let params = ListParams {
            sort_by: SortBy::Date,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        let page = run(records, &params);
        assert_eq!(titles(&page), vec!["new", "middle", "old"]);
    }

    #[test]
    fn test_equal_keys_keep_collection_order() {
        // Same size everywhere: equal keys must keep insertion order in
        // both sort directions.
        let records = vec![
            record("1", "first", 7, 0),
            record("2", "second", 7, 0),
            record("3", "third", 7, 0),
        ];

        for order in [SortOrder::Asc, SortOrder::Desc] {
            let params = ListParams {
                sort_by: SortBy::Size,
                sort_order: order,
                ..Default::default()
            };
            let page = run(records.clone(), &params);
            assert_eq!(titles(&page), vec!["first", "second", "third"]);
        }
    }

    #[test]
    fn test_pagination_slices() {
        let records: Vec<_> = (0..5).map(|i| record(&i.to_string(), &format!("doc{i}"), i, 0)).collect();
        let params = ListParams {
            sort_by: SortBy::Size,
            sort_order: SortOrder::Asc,
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let page = run(records, &params);
        assert_eq!(page.total, 5);
        assert_eq!(titles(&page), vec!["doc2", "doc3"]);
    }

    #[test]
    fn test_page_beyond_end_is_empty() {
        let records = vec![record("1", "only", 1, 0)];
        let params = ListParams {
            page: 99,
            page_size: 10,
            ..Default::default()
        };
        let page = run(records, &params);
        assert!(page.documents.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_degenerate_page_inputs_are_clamped() {
        let records = vec![record("1", "a", 1, 0)];
        let params = ListParams {
            page: 0,
            page_size: 0,
            ..Default::default()
        };
        let page = run(records, &params);
        // Clamped to page 1, page_size 1.
        assert_eq!(page.documents.len(), 1);
    }

    #[test]
    fn test_page_count() {
        let empty = ListPage {
            documents: vec![],
            total: 0,
        };
        assert_eq!(empty.page_count(10), 1);

        let page = ListPage {
            documents: vec![],
            total: 21,
        };
        assert_eq!(page.page_count(10), 3);
        assert_eq!(page.page_count(21), 1);
    }

    #[test]
    fn test_sort_params_deserialize_lowercase() {
        assert_eq!(serde_json::from_str::<SortBy>("\"date\"").unwrap(), SortBy::Date);
        assert_eq!(serde_json::from_str::<SortBy>("\"size\"").unwrap(), SortBy::Size);
        assert_eq!(
            serde_json::from_str::<SortOrder>("\"asc\"").unwrap(),
            SortOrder::Asc
        );
        assert_eq!(
            serde_json::from_str::<SortOrder>("\"desc\"").unwrap(),
            SortOrder::Desc
        );
    }
}
