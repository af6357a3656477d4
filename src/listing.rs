//! Client-side filter, sort and paginate for list views.
//!
//! Every state change recomputes the visible page from the full record set.

use core::cmp::Ordering;

/// Value a record exposes for one sort key.
#[derive(Clone, Debug, PartialEq)]
pub enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

impl SortValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }

    /// Total order: `Missing < Number < Text`; text compares case-insensitively.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<&str> for SortValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SortValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for SortValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<SortValue>> From<Option<T>> for SortValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// A record that can appear in a list view.
pub trait Listable {
    /// True if the record matches `needle`, which is already trimmed and
    /// lower-cased and never empty.
    fn matches(&self, needle: &str) -> bool;

    /// Value for the column named `key`.
    fn sort_value(&self, key: &str) -> SortValue;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Current list view state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub sort: Option<SortSpec>,
}

impl ListQuery {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self.page = 1;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: Self::DEFAULT_PAGE_SIZE,
            search: String::new(),
            sort: None,
        }
    }
}

/// One visible page of a list.
#[derive(Debug)]
pub struct ListPage<'a, T> {
    pub items: Vec<&'a T>,
    /// Records matching the search across all pages.
    pub total: usize,
    /// Page actually shown, clamped to `1..=page_count`.
    pub page: usize,
    pub page_count: usize,
}

/// Filter, sort and paginate `records`.
pub fn apply<'a, T: Listable>(records: &'a [T], query: &ListQuery) -> ListPage<'a, T> {
    let needle = query.search.trim().to_lowercase();
    let mut matched: Vec<&T> = if needle.is_empty() {
        records.iter().collect()
    } else {
        records.iter().filter(|r| r.matches(&needle)).collect()
    };

    if let Some(sort) = &query.sort {
        matched.sort_by(|a, b| {
            let ord = a.sort_value(&sort.key).compare(&b.sort_value(&sort.key));
            match sort.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }

    let total = matched.len();
    let page_size = query.page_size.max(1);
    let page_count = total.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, page_count);
    let start = (page - 1) * page_size;
    let items = matched.into_iter().skip(start).take(page_size).collect();
    ListPage {
        items,
        total,
        page,
        page_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct User {
        name: &'static str,
        email: &'static str,
        age: Option<f64>,
    }

    impl Listable for User {
        fn matches(&self, needle: &str) -> bool {
            self.name.to_lowercase().contains(needle) || self.email.to_lowercase().contains(needle)
        }

        fn sort_value(&self, key: &str) -> SortValue {
            match key {
                "name" => self.name.into(),
                "age" => self.age.into(),
                _ => SortValue::Missing,
            }
        }
    }

    fn users() -> Vec<User> {
        let user = |name, email, age| User { name, email, age };
        vec![
            user("Kim", "kim@example.com", Some(41.0)),
            user("lee", "lee@corp.kr", None),
            user("Park", "park@example.com", Some(29.0)),
            user("Choi", "choi@corp.kr", Some(29.0)),
        ]
    }

    #[test]
    fn search_is_trimmed_and_case_insensitive() {
        let all = users();
        let page = apply(&all, &ListQuery::default().with_search("  CORP.kr "));
        assert_eq!(page.total, 2);
        let names: Vec<_> = page.items.iter().map(|u| u.name).collect();
        assert_eq!(names, ["lee", "Choi"]);
    }

    #[test]
    fn sort_is_stable_and_missing_first() {
        let all = users();
        let page = apply(&all, &ListQuery::default().with_sort(SortSpec::ascending("age")));
        let names: Vec<_> = page.items.iter().map(|u| u.name).collect();
        assert_eq!(names, ["lee", "Park", "Choi", "Kim"]);

        let page = apply(&all, &ListQuery::default().with_sort(SortSpec::ascending("name")));
        let names: Vec<_> = page.items.iter().map(|u| u.name).collect();
        assert_eq!(names, ["Choi", "Kim", "lee", "Park"]);
    }

    #[test]
    fn page_is_clamped() {
        let all = users();
        let query = ListQuery {
            page_size: 3,
            ..ListQuery::default()
        }
        .with_page(9);
        let page = apply(&all, &query);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn empty_result_still_has_one_page() {
        let all = users();
        let page = apply(&all, &ListQuery::default().with_search("nobody"));
        assert_eq!(page.total, 0);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }
}
