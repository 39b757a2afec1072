use crate::error::{AppError, Result};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Posts per listing page.
pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Title,
}

impl SortField {
    /// SQL ordering expression. Titles order by code point (`COLLATE "C"`),
    /// the same order `str::cmp` gives the in-memory store.
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Title => r#"title COLLATE "C""#,
        }
    }
}

/// Sort order for post listings, written `[-]field` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let field = match name {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "title" => SortField::Title,
            _ => {
                return Err(AppError::BadRequest(format!(
                    "Cannot sort posts by '{}'.",
                    raw
                )))
            }
        };

        Ok(Self { field, descending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.field {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Title => "title",
        };
        if self.descending {
            write!(f, "-{}", name)
        } else {
            f.write_str(name)
        }
    }
}

/// A validated post listing request.
#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    /// 1-based.
    pub page: u32,
    pub sort: SortKey,
    /// Literal, case-insensitive substring matched against title or body.
    pub search: Option<String>,
    pub author_id: Option<Uuid>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            sort: SortKey::default(),
            search: None,
            author_id: None,
        }
    }
}

impl PostQuery {
    /// Build a query from raw listing parameters.
    ///
    /// Unparseable or non-positive pages fall back to page 1. An author of
    /// `""` or `"null"` means no author filter.
    pub fn parse(
        page: Option<&str>,
        sort_by: Option<&str>,
        search: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Self> {
        let page = page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let sort = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => SortKey::default(),
        };

        let search = search.filter(|s| !s.is_empty()).map(str::to_string);

        let author_id = match user_id.map(str::trim) {
            None | Some("") | Some("null") => None,
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| {
                AppError::BadRequest(format!("Invalid userID '{}'.", raw))
            })?),
        };

        Ok(Self {
            page,
            sort,
            search,
            author_id,
        })
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * PAGE_SIZE
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }
}

/// `ceil(total / PAGE_SIZE)`.
pub fn total_pages(total_posts: i64) -> i64 {
    if total_posts <= 0 {
        0
    } else {
        (total_posts + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = PostQuery::parse(None, None, None, None).unwrap();
        assert_eq!(query, PostQuery::default());
        assert_eq!(query.sort.to_string(), "-createdAt");
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_bad_pages_fall_back_to_first() {
        for raw in ["abc", "0", "-3", "", "1.5"] {
            let query = PostQuery::parse(Some(raw), None, None, None).unwrap();
            assert_eq!(query.page, 1, "page {:?}", raw);
        }

        let query = PostQuery::parse(Some("3"), None, None, None).unwrap();
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_sort_keys() {
        let key: SortKey = "title".parse().unwrap();
        assert_eq!(key.field, SortField::Title);
        assert!(!key.descending);

        let key: SortKey = "-updatedAt".parse().unwrap();
        assert_eq!(key.field, SortField::UpdatedAt);
        assert!(key.descending);

        assert!(matches!(
            "-likes".parse::<SortKey>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_user_filter() {
        let query = PostQuery::parse(None, None, None, Some("null")).unwrap();
        assert_eq!(query.author_id, None);

        let id = Uuid::new_v4();
        let query = PostQuery::parse(None, None, None, Some(&id.to_string())).unwrap();
        assert_eq!(query.author_id, Some(id));

        assert!(PostQuery::parse(None, None, None, Some("nope")).is_err());
    }

    #[test]
    fn test_empty_search_is_no_filter() {
        let query = PostQuery::parse(None, None, Some(""), None).unwrap();
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
    }
}
