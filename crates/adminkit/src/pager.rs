//! Page-by-page iteration over list endpoints.

use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::types::{Page, PageRequest};

/// Iterates the pages of a list call.
///
/// Stops after a page without a continuation token or after the first
/// error (which is yielded once). An empty page that carries a token is
/// yielded and its token followed. Sleeps for a fixed delay before every
/// page but the first.
pub struct Pager<'a, T> {
    fetch: Box<dyn FnMut(&PageRequest) -> Result<Page<T>> + 'a>,
    request: PageRequest,
    delay: Duration,
    started: bool,
    done: bool,
}

impl<'a, T> Pager<'a, T> {
    /// Page through `fetch` with `page_size` items per page.
    pub fn new<F>(page_size: u32, fetch: F) -> Self
    where
        F: FnMut(&PageRequest) -> Result<Page<T>> + 'a,
    {
        Self {
            fetch: Box::new(fetch),
            request: PageRequest::first(page_size),
            delay: Duration::ZERO,
            started: false,
            done: false,
        }
    }

    /// Sleep this long between pages.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Collect every item, failing on the first page error.
    pub fn collect_all(self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        for page in self {
            all.extend(page?);
        }
        Ok(all)
    }
}

impl<T> Iterator for Pager<'_, T> {
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.started = true;

        match (self.fetch)(&self.request) {
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            Ok(page) => {
                match page.next_page_token {
                    Some(token) if !token.is_empty() => self.request.page_token = Some(token),
                    _ => self.done = true,
                }
                Some(Ok(page.items))
            }
        }
    }
}
