//! Listing filters and sort order.

use crate::core::{Category, Document, DocumentView, ProjectId};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Column a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Upload time. The default.
    #[default]
    UploadedAt,
    /// Title.
    Title,
    /// Category label.
    Category,
    /// Content size.
    FileSizeBytes,
}

const SORT_KEYS: [(&str, SortKey); 4] = [
    ("uploadedat", SortKey::UploadedAt),
    ("title", SortKey::Title),
    ("category", SortKey::Category),
    ("filesizebytes", SortKey::FileSizeBytes),
];

impl SortKey {
    /// Maps a request parameter to a key, case-insensitively.
    ///
    /// Absent or unrecognised values select [`SortKey::UploadedAt`].
    pub fn from_param(param: Option<&str>) -> Self {
        param
            .map(|p| p.trim().to_ascii_lowercase())
            .and_then(|p| SORT_KEYS.iter().find(|(name, _)| *name == p))
            .map(|(_, key)| *key)
            .unwrap_or_default()
    }

    fn compare(self, a: &Document, b: &Document) -> Ordering {
        match self {
            Self::UploadedAt => a.uploaded_at.cmp(&b.uploaded_at),
            Self::Title => a.title.cmp(&b.title),
            Self::Category => a.category.label().cmp(b.category.label()),
            Self::FileSizeBytes => a.file_size_bytes.cmp(&b.file_size_bytes),
        }
    }
}

/// Direction of a listing's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    Asc,
    /// Largest first. The default.
    #[default]
    Desc,
}

impl SortDirection {
    /// Maps a request parameter to a direction, case-insensitively.
    ///
    /// Only `"asc"` selects ascending order.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(p) if p.trim().eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }
}

/// Complete ordering of a listing. Ties are broken by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct DocumentSort {
    /// Column.
    pub key: SortKey,
    /// Direction.
    pub direction: SortDirection,
}

impl DocumentSort {
    /// Creates an ordering.
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Builds an ordering from raw request parameters.
    pub fn from_params(sort_by: Option<&str>, sort_dir: Option<&str>) -> Self {
        Self::new(
            SortKey::from_param(sort_by),
            SortDirection::from_param(sort_dir),
        )
    }

    /// Compares two documents under this ordering.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let primary = match self.direction {
            SortDirection::Asc => self.key.compare(a, b),
            SortDirection::Desc => self.key.compare(b, a),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

/// Filters and ordering for a document listing.
///
/// # Examples
///
/// ```rust
/// use docbridge::core::Category;
/// use docbridge::query::{DocumentQuery, SortKey};
///
/// let query = DocumentQuery::new()
///     .with_category(Category::Reports)
///     .with_search("budget")
///     .sorted_by(SortKey::Title, docbridge::query::SortDirection::Asc);
/// assert_eq!(query.search.as_deref(), Some("budget"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentQuery {
    /// Exact category.
    pub category: Option<Category>,

    /// Exact project.
    pub project_id: Option<ProjectId>,

    /// Earliest upload date, inclusive.
    pub from_date: Option<NaiveDate>,

    /// Latest upload date, inclusive.
    pub to_date: Option<NaiveDate>,

    /// Case-insensitive substring over title, description, uploader name,
    /// project name and tags.
    pub search: Option<String>,

    /// Ordering.
    pub sort: DocumentSort,
}

impl DocumentQuery {
    /// Creates an unfiltered query in the default order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filters by category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Filters by project.
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Filters by upload date range, both ends inclusive.
    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from_date = from;
        self.to_date = to;
        self
    }

    /// Filters by free-text search.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the ordering.
    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = DocumentSort::new(key, direction);
        self
    }

    /// Returns the normalised search needle, if any.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Checks if a view matches every filter of this query.
    pub fn matches(&self, view: &DocumentView) -> bool {
        let document = &view.document;

        if let Some(category) = self.category {
            if document.category != category {
                return false;
            }
        }

        if let Some(project_id) = self.project_id {
            if document.project_id != Some(project_id) {
                return false;
            }
        }

        let uploaded_on = document.uploaded_at.date_naive();
        if let Some(from) = self.from_date {
            if uploaded_on < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if uploaded_on > to {
                return false;
            }
        }

        if let Some(needle) = self.needle() {
            let hit = |s: &str| s.to_lowercase().contains(&needle);
            let found = hit(&document.title)
                || document.description.as_deref().is_some_and(hit)
                || view.uploader_name.as_deref().is_some_and(hit)
                || view.project_name.as_deref().is_some_and(hit)
                || view.tags.iter().any(|t| hit(t));
            if !found {
                return false;
            }
        }

        true
    }
}
