//! Filter, sort and paginate a snapshot into the slice a screen shows
//!
//! [`derive_view`] is pure: it never fetches and never touches the cache.
//! [`ListView`] wraps it with the per-screen state (sort mode, page, query)
//! and runs the search step first when a query is set.
//!
//! # Self-healing Pages
//!
//! The requested page is clamped to the data: page 0 reads as page 1, and
//! a page past the last non-empty one (typically after a delete shrank the
//! list) resolves to page 1. [`ViewState::page`] reports the page actually
//! shown.

pub mod list;
pub mod pagination;

pub use list::ListView;
pub use pagination::{PageWindow, page_window, show_pagination};

use crate::model::Entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Default number of entities per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Ordering applied before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Newest first; entities without a timestamp are hidden
    #[default]
    Recency,
    /// Most liked first
    Popularity,
    /// Input order
    Original,
}

impl SortMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Popularity => "popularity",
            Self::Original => "original",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs of [`derive_view`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewParams {
    pub sort_mode: SortMode,
    /// 1-based requested page
    pub page: usize,
    pub page_size: usize,
}

impl ViewParams {
    #[must_use]
    pub const fn new(sort_mode: SortMode, page: usize, page_size: usize) -> Self {
        Self {
            sort_mode,
            page,
            page_size,
        }
    }
}

impl Default for ViewParams {
    fn default() -> Self {
        Self::new(SortMode::default(), 1, DEFAULT_PAGE_SIZE)
    }
}

/// The slice a screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<E> {
    pub page_items: Vec<E>,
    pub page_count: usize,
    /// Effective 1-based page after self-healing
    pub page: usize,
    /// Entities left after filtering, across all pages
    pub total: usize,
}

impl<E> ViewState<E> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Filter, sort and paginate `entities`
#[must_use]
pub fn derive_view<E: Entity>(entities: &[E], params: &ViewParams) -> ViewState<E> {
    let ordered = order(entities, params.sort_mode);
    paginate(ordered, params.page, params.page_size)
}

/// Filter and sort without paginating
#[must_use]
pub fn order<E: Entity>(entities: &[E], sort_mode: SortMode) -> Vec<E> {
    match sort_mode {
        SortMode::Original => entities.to_vec(),
        SortMode::Popularity => {
            let mut sorted = entities.to_vec();
            sorted.sort_by(|a, b| b.likes().len().cmp(&a.likes().len()));
            sorted
        }
        SortMode::Recency => {
            let mut dated: Vec<(Option<DateTime<Utc>>, &E)> = entities
                .iter()
                .filter(|entity| entity.created_at_raw().is_some())
                .map(|entity| (entity.created_at(), entity))
                .collect();
            dated.sort_by(|(a, _), (b, _)| newest_first(*a, *b));
            dated.into_iter().map(|(_, entity)| entity.clone()).collect()
        }
    }
}

/// Descending time, unparsable timestamps last
fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Number of pages needed for `total` entities
#[must_use]
pub const fn page_count(total: usize, page_size: usize) -> usize {
    let page_size = if page_size == 0 { 1 } else { page_size };
    total.div_ceil(page_size)
}

fn paginate<E>(ordered: Vec<E>, page: usize, page_size: usize) -> ViewState<E> {
    let page_size = page_size.max(1);
    let total = ordered.len();
    let pages = page_count(total, page_size);

    let page = match page {
        0 => 1,
        p if p > pages => {
            if pages > 0 {
                tracing::debug!(requested = p, pages, "page out of range, showing page 1");
            }
            1
        }
        p => p,
    };

    let page_items = ordered
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    ViewState {
        page_items,
        page_count: pages,
        page,
        total,
    }
}
