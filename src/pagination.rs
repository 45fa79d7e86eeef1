//! Page cursor and list lifecycle for the table pages.
//!
//! [`ListState`] is a small state machine (`Idle -> Loading -> Ready | Error`) that hands
//! out a [`LoadTicket`] per fetch. A result is only applied while its ticket is the one in
//! flight, so answers for an abandoned cursor are dropped rather than shown.

use crate::api::Envelope;
use log::debug;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A 1-based page number and a page size.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        PageRequest {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn first(limit: u32) -> Self {
        Self::new(1, limit)
    }

    pub fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.limit)
    }

    pub fn previous(self) -> Option<Self> {
        (self.page > 1).then(|| Self::new(self.page - 1, self.limit))
    }

    pub fn offset(self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

/// Whether another page exists after `request`.
///
/// Explicit `total_pages` wins, then `total`, then the full-page heuristic. The heuristic
/// reports a next page when the last page happens to be exactly full.
pub fn has_next(request: PageRequest, total: Option<u64>, total_pages: Option<u64>, returned: usize) -> bool {
    if let Some(total_pages) = total_pages {
        return u64::from(request.page) < total_pages;
    }
    if let Some(total) = total {
        return u64::from(request.page) * u64::from(request.limit) < total;
    }
    returned == request.limit as usize
}

pub fn page_count(len: usize, limit: u32) -> u64 {
    (len as u64).div_ceil(u64::from(limit.max(1)))
}

pub fn slice_page<T: Clone>(items: &[T], request: PageRequest) -> Vec<T> {
    items
        .iter()
        .skip(request.offset())
        .take(request.limit as usize)
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ListStatus {
    Idle,
    Loading,
    Ready,
    Error(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct LoadTicket {
    generation: u64,
    pub request: PageRequest,
}

pub struct ListState<T> {
    request: PageRequest,
    status: ListStatus,
    rows: Vec<T>,
    has_next: bool,
    total_pages: Option<u64>,
    generation: u64,
    in_flight: Option<LoadTicket>,
    /// Full item set, kept when the backend ignored paging and returned everything.
    cached: Option<Vec<T>>,
}

impl<T: Clone> ListState<T> {
    pub fn new(limit: u32) -> Self {
        ListState {
            request: PageRequest::first(limit),
            status: ListStatus::Idle,
            rows: Vec::new(),
            has_next: false,
            total_pages: None,
            generation: 0,
            in_flight: None,
            cached: None,
        }
    }

    /// Moves the cursor. Returns a ticket when the page has to be fetched.
    pub fn goto(&mut self, page: u32) -> Option<LoadTicket> {
        let request = PageRequest::new(page, self.request.limit);
        if self.in_flight.is_some_and(|t| t.request == request) {
            return None;
        }
        self.request = request;
        if self.cached.is_some() {
            self.in_flight = None;
            self.show_cached_page();
            return None;
        }
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<LoadTicket> {
        if !self.has_next || self.is_loading() {
            return None;
        }
        self.goto(self.request.next().page)
    }

    pub fn previous_page(&mut self) -> Option<LoadTicket> {
        if self.is_loading() {
            return None;
        }
        let previous = self.request.previous()?;
        self.goto(previous.page)
    }

    /// Refetches the current page, forgetting any locally paged item set.
    pub fn reload(&mut self) -> Option<LoadTicket> {
        self.cached = None;
        if self.in_flight.is_some_and(|t| t.request == self.request) {
            return None;
        }
        Some(self.issue())
    }

    /// Applies a fetch result. Returns `false` when the ticket is no longer current.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<Envelope<T>, String>) -> bool {
        if self.in_flight != Some(ticket) {
            debug!(
                "Discarding stale result for page {} (generation {})",
                ticket.request.page, ticket.generation
            );
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(envelope) if envelope.items.len() > self.request.limit as usize => {
                debug!(
                    "Server returned {} rows for a page of {}, paging locally",
                    envelope.items.len(),
                    self.request.limit
                );
                self.cached = Some(envelope.items);
                self.show_cached_page();
            }
            Ok(envelope) => {
                self.has_next = has_next(self.request, envelope.total, envelope.total_pages, envelope.items.len());
                self.total_pages = envelope
                    .total_pages
                    .or_else(|| envelope.total.map(|t| t.div_ceil(u64::from(self.request.limit))));
                self.rows = envelope.items;
                self.status = ListStatus::Ready;
            }
            Err(message) => {
                self.rows.clear();
                self.has_next = false;
                self.status = ListStatus::Error(message);
            }
        }
        true
    }

    fn issue(&mut self) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            request: self.request,
        };
        self.in_flight = Some(ticket);
        self.status = ListStatus::Loading;
        ticket
    }

    fn show_cached_page(&mut self) {
        let Some(items) = &self.cached else {
            return;
        };
        let total_pages = page_count(items.len(), self.request.limit);
        self.rows = slice_page(items, self.request);
        self.has_next = has_next(self.request, None, Some(total_pages), self.rows.len());
        self.total_pages = Some(total_pages);
        self.status = ListStatus::Ready;
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn has_previous(&self) -> bool {
        self.request.page > 1
    }

    pub fn total_pages(&self) -> Option<u64> {
        self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            ListStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}
