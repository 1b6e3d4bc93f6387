//! Per-screen list state

use super::pagination::{DEFAULT_MAX_VISIBLE_PAGES, PageWindow, page_window, show_pagination};
use super::{DEFAULT_PAGE_SIZE, SortMode, ViewParams, ViewState, derive_view};
use crate::config::EngineConfig;
use crate::model::{Entity, Snapshot};
use crate::search::{IndexCache, SearchOptions};

/// Sort mode, page and query of one list screen
///
/// [`render`](Self::render) runs search, filter, sort and pagination over a
/// snapshot and keeps the self-healed page for the next render.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    sort_mode: SortMode,
    page: usize,
    page_size: usize,
    max_visible_pages: usize,
    query: String,
    search: SearchOptions,
}

impl ListView {
    /// List over entities of type `E`, searching their default keys
    #[must_use]
    pub fn for_entity<E: Entity>(sort_mode: SortMode) -> Self {
        Self {
            sort_mode,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
            query: String::new(),
            search: SearchOptions::for_entity::<E>(),
        }
    }

    /// List using the page and search settings of `config`
    #[must_use]
    pub fn from_config<E: Entity>(config: &EngineConfig, sort_mode: SortMode) -> Self {
        Self {
            page_size: config.page_size,
            max_visible_pages: config.max_visible_pages,
            search: config.search_options::<E>(),
            ..Self::for_entity::<E>(sort_mode)
        }
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    #[must_use]
    pub const fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Change the ordering and go back to page 1
    pub fn set_sort_mode(&mut self, sort_mode: SortMode) {
        if self.sort_mode != sort_mode {
            self.sort_mode = sort_mode;
            self.page = 1;
        }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Request a page; out-of-range pages heal on the next render
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Set the search query and go back to page 1
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    #[must_use]
    pub const fn search_options(&self) -> &SearchOptions {
        &self.search
    }

    #[must_use]
    pub const fn params(&self) -> ViewParams {
        ViewParams::new(self.sort_mode, self.page, self.page_size)
    }

    /// Derive the visible slice of `snapshot`
    ///
    /// With a query set, only matching entities (best first) go through
    /// the sort and pagination steps. Search failures fall back to the
    /// whole snapshot.
    pub fn render<E: Entity>(&mut self, snapshot: &Snapshot<E>, indices: &IndexCache<E>) -> ViewState<E> {
        let state = if self.query.trim().is_empty() {
            derive_view(snapshot.entities(), &self.params())
        } else {
            let matched = indices.search_or_unfiltered(snapshot, &self.query, &self.search);
            derive_view(&matched, &self.params())
        };

        self.page = state.page;
        state
    }

    /// Navigation bar for a rendered state
    #[must_use]
    pub fn window<E>(&self, state: &ViewState<E>) -> PageWindow {
        page_window(state.page, state.page_count, self.max_visible_pages)
    }

    /// Whether a rendered state needs a navigation bar
    #[must_use]
    pub const fn needs_pagination<E>(&self, state: &ViewState<E>) -> bool {
        show_pagination(state.total, self.page_size)
    }
}
