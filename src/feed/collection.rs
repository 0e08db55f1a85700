//! Client-side cache of a server-side paged list.

use std::sync::Arc;

use crate::models::Page;

/// Items addressable by a stable backend id.
pub trait Identified {
    fn id(&self) -> &str;
}

/// Ordered items plus the paging cursor.
///
/// Items sit behind an `Arc` and every change builds a new vector, so a
/// snapshot handed to a renderer never observes a partial update.
#[derive(Debug)]
pub struct PaginatedCollection<T> {
    items: Arc<Vec<T>>,
    /// Last page merged in; 0 before the first load
    current_page: u32,
    has_next_page: bool,
    total_count: u64,
}

impl<T> Clone for PaginatedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            current_page: self.current_page,
            has_next_page: self.has_next_page,
            total_count: self.total_count,
        }
    }
}

impl<T> Default for PaginatedCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PaginatedCollection<T> {
    /// Empty collection that still expects a first page.
    pub fn new() -> Self {
        Self {
            items: Arc::new(Vec::new()),
            current_page: 0,
            has_next_page: true,
            total_count: 0,
        }
    }

    pub fn items(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn has_next_page(&self) -> bool {
        self.has_next_page
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// Page number the next `append` is expected to carry.
    pub fn next_page(&self) -> u32 {
        self.current_page + 1
    }
}

impl<T: Clone> PaginatedCollection<T> {
    /// Drop everything loaded so far and start over from `page`.
    pub fn replace(&mut self, page: Page<T>) {
        self.items = Arc::new(page.items);
        self.apply_cursor(page.current_page, page.has_next_page, page.total_count);
    }

    /// Append `page` after the items already loaded, preserving their order.
    pub fn append(&mut self, page: Page<T>) {
        let mut items = Vec::with_capacity(self.items.len() + page.items.len());
        items.extend(self.items.iter().cloned());
        items.extend(page.items);
        self.items = Arc::new(items);
        self.apply_cursor(page.current_page, page.has_next_page, page.total_count);
    }

    fn apply_cursor(&mut self, current_page: u32, has_next_page: bool, total_count: u64) {
        self.current_page = current_page;
        self.has_next_page = has_next_page;
        self.total_count = total_count;
    }
}

impl<T: Clone + Identified> PaginatedCollection<T> {
    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Replace the item with `id` by `f(item)` in a fresh vector.
    ///
    /// Returns the item as it was before, or `None` if no such item is loaded.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let mut items: Vec<T> = self.items.as_ref().clone();
        let before = items[index].clone();
        f(&mut items[index]);
        self.items = Arc::new(items);
        Some(before)
    }
}
