//! Roster view state: filter, search, sort and paginate over canonical records.
//!
//! The visible slice is never stored; [`derive`] recomputes it from the
//! collection and a [`ViewState`] in a fixed order: filter, search, stable
//! sort, paginate.

#![forbid(unsafe_code)]

use std::time::Instant;

use roster_core::{Entity, EntitySchema, SortSpec};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::debug;

mod debounce;

pub use debounce::{Debounce, DEFAULT_DEBOUNCE_MS};

/// Filter value that disables a filter.
pub const ALL: &str = "all";

fn is_all(v: &str) -> bool { v.eq_ignore_ascii_case(ALL) }

/// User-controlled view parameters for one entity list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    search: String,
    filters: SmallVec<[(String, String); 4]>,
    sort: String,
    page: usize,
    page_size: usize,
    /// Set once the current page has been seen within bounds; only such a page is clamped later.
    #[serde(skip)]
    page_seen_valid: bool,
    #[serde(skip)]
    revision: u64,
}

impl ViewState {
    pub fn new(schema: &EntitySchema) -> Self {
        Self {
            search: String::new(),
            filters: SmallVec::new(),
            sort: schema.default_sort.to_string(),
            page: 1,
            page_size: schema.page_size.max(1),
            page_seen_valid: true,
            revision: 0,
        }
    }

    pub fn for_entity<E: Entity>() -> Self { Self::new(E::schema()) }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn search(&self) -> &str { &self.search }
    pub fn sort(&self) -> &str { &self.sort }
    pub fn page(&self) -> usize { self.page }
    pub fn page_size(&self) -> usize { self.page_size }
    pub fn revision(&self) -> u64 { self.revision }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> { self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
        self.reset_page();
    }

    /// Set an equality filter; `all` (any case) removes it.
    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        self.filters.retain(|(k, _)| *k != key);
        if !is_all(&value) {
            self.filters.push((key, value));
        }
        self.reset_page();
    }

    pub fn clear_filter(&mut self, key: &str) { self.set_filter(key, ALL) }

    pub fn set_sort(&mut self, key: impl Into<String>) {
        self.sort = key.into();
        self.reset_page();
    }

    /// Pages are 1-based; anything below 1 is treated as 1. Pages past the end
    /// are kept and yield an empty slice.
    pub fn set_page(&mut self, n: usize) {
        self.page = n.max(1);
        self.page_seen_valid = false;
        self.touch();
    }

    /// [`set_page`](Self::set_page) when the current page count is known: a
    /// page within `total_pages` counts as valid right away and is clamped if
    /// the data later shrinks below it.
    pub fn set_page_within(&mut self, n: usize, total_pages: usize) {
        self.set_page(n);
        self.page_seen_valid = self.page <= total_pages;
    }

    /// Bring the page back into range after the underlying data shrank.
    ///
    /// Only a page that was once within bounds is clamped; returns whether the
    /// page changed.
    pub fn reconcile(&mut self, total_pages: usize) -> bool {
        if self.page <= total_pages {
            self.page_seen_valid = true;
            return false;
        }
        if self.page_seen_valid {
            debug!(from = self.page, to = total_pages, "clamping page after shrink");
            self.page = total_pages.max(1);
            self.touch();
            return true;
        }
        false
    }

    fn reset_page(&mut self) {
        self.page = 1;
        self.page_seen_valid = true;
        self.touch();
    }

    fn touch(&mut self) { self.revision = self.revision.wrapping_add(1); }
}

/// The page of records currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleSlice<E> {
    pub items: Vec<E>,
    pub total_matches: usize,
    pub total_pages: usize,
    pub page: usize,
}

impl<E> VisibleSlice<E> {
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

/// Candidate counts after each narrowing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeriveDebugInfo {
    pub total: usize,
    pub after_filters: usize,
    pub after_search: usize,
}

pub fn total_pages(matches: usize, page_size: usize) -> usize { matches.div_ceil(page_size.max(1)).max(1) }

fn matches_filters<E: Entity>(rec: &E, view: &ViewState) -> bool {
    view.filters.iter().all(|(k, v)| rec.field_text(k).is_some_and(|f| f == v.as_str()))
}

fn matches_search<E: Entity>(rec: &E, schema: &EntitySchema, needle: &str) -> bool {
    schema
        .searchable
        .iter()
        .any(|f| rec.field_text(f).is_some_and(|t| t.to_lowercase().contains(needle)))
}

fn resolve_sort(schema: &EntitySchema, key: &str) -> Option<SortSpec> {
    schema.sort_spec(key).or_else(|| schema.sort_spec(schema.default_sort)).copied()
}

/// Indices into `items` that pass filters and search, in stable sort order.
pub fn select<E: Entity>(items: &[E], view: &ViewState) -> (Vec<usize>, DeriveDebugInfo) {
    let schema = E::schema();
    let mut info = DeriveDebugInfo { total: items.len(), ..Default::default() };

    let mut candidates: Vec<usize> = (0..items.len()).filter(|&i| matches_filters(&items[i], view)).collect();
    info.after_filters = candidates.len();

    let needle = view.search.trim().to_lowercase();
    if !needle.is_empty() {
        candidates.retain(|&i| matches_search(&items[i], schema, &needle));
    }
    info.after_search = candidates.len();

    if let Some(spec) = resolve_sort(schema, &view.sort) {
        // sort_by is stable: ties keep collection order
        let mut keyed: Vec<_> = candidates.into_iter().map(|i| (items[i].sort_value(spec.field), i)).collect();
        keyed.sort_by(|(a, _), (b, _)| {
            let ord = a.total_cmp(b);
            if spec.descending { ord.reverse() } else { ord }
        });
        candidates = keyed.into_iter().map(|(_, i)| i).collect();
    } else {
        debug!(kind = %E::KIND, sort = %view.sort, "no usable sort; keeping collection order");
    }
    (candidates, info)
}

/// `paginate(sort(search(filter(items))))`.
pub fn derive<E: Entity>(items: &[E], view: &ViewState) -> VisibleSlice<E> {
    let started = Instant::now();
    let (order, info) = select(items, view);
    let total_pages = total_pages(order.len(), view.page_size);
    let start = (view.page - 1).saturating_mul(view.page_size);
    let page_items: Vec<E> = order.iter().skip(start).take(view.page_size).map(|&i| items[i].clone()).collect();
    let took = started.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("roster_derive_ms", took, "kind" => E::KIND.as_str());
    debug!(kind = %E::KIND, total = info.total, after_filters = info.after_filters, after_search = info.after_search, page = view.page, took_ms = took, "derive");
    VisibleSlice { items: page_items, total_matches: order.len(), total_pages, page: view.page }
}

/// [`derive`], clamping a page that fell out of range because the data shrank.
pub fn derive_clamped<E: Entity>(items: &[E], view: &mut ViewState) -> VisibleSlice<E> {
    let slice = derive(items, view);
    if view.reconcile(slice.total_pages) { derive(items, view) } else { slice }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::prelude::*;
    use serde_json::json;

    fn users(n: usize) -> Vec<User> {
        (0..n).map(|i| User::normalize(&json!({"userId": format!("u{i}"), "username": format!("user{i}")}))).collect()
    }

    #[test]
    fn filter_all_is_removal() {
        let mut v = ViewState::for_entity::<User>();
        v.set_filter("plan", "Premium");
        assert_eq!(v.filter("plan"), Some("Premium"));
        v.set_filter("plan", "All");
        assert_eq!(v.filter("plan"), None);
        v.set_filter("plan", "Free");
        v.clear_filter("plan");
        assert_eq!(v.filters().count(), 0);
    }

    #[test]
    fn setters_reset_page_and_bump_revision() {
        let mut v = ViewState::for_entity::<User>();
        v.set_page(3);
        let r = v.revision();
        v.set_search("x");
        assert_eq!(v.page(), 1);
        assert!(v.revision() > r);
        v.set_page(0);
        assert_eq!(v.page(), 1);
    }

    #[test]
    fn total_pages_never_zero() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn unknown_filter_key_excludes_everything() {
        let items = users(3);
        let mut v = ViewState::for_entity::<User>();
        v.set_filter("colour", "red");
        assert_eq!(derive(&items, &v).total_matches, 0);
    }
}
