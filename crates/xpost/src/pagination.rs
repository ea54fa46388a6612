//! Cursor-following pagination over list endpoints.
//!
//! A [`PageWalker`] drives a [`PageFetcher`] until it has produced the
//! requested number of items, the server stops returning a cursor, or the
//! page ceiling is reached. Pages are handed out one at a time so callers can
//! print them as they arrive; the walk cannot be restarted.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::XpostResult;
use crate::request::RequestDescriptor;
use crate::types::{data_items, merge_authors};

/// One page of a list response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

impl Page {
    /// Split a v2 list response into items (authors merged) and the cursor.
    #[must_use]
    pub fn from_response(mut body: Value) -> Self {
        let next_token = body
            .pointer("/meta/next_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(String::from);
        let mut items = data_items(&mut body);
        merge_authors(&mut items, body.get("includes"));
        Self { items, next_token }
    }
}

/// Fetches a single page at a cursor.
#[async_trait]
pub trait PageFetcher: Send {
    async fn fetch(&mut self, cursor: Option<&str>, page_size: Option<u32>) -> XpostResult<Page>;
}

/// Bounds an endpoint accepts for `max_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub min: u32,
    pub max: u32,
}

impl PageLimits {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Page size for `remaining` wanted items.
    #[must_use]
    pub fn size_for(self, remaining: usize) -> u32 {
        u32::try_from(remaining)
            .unwrap_or(u32::MAX)
            .clamp(self.min, self.max)
    }
}

/// Lazy, finite walk over pages.
#[derive(Debug)]
pub struct PageWalker {
    target: usize,
    limits: Option<PageLimits>,
    max_pages: u32,
    cursor: Option<String>,
    yielded: usize,
    pages: u32,
    exhausted: bool,
}

impl PageWalker {
    #[must_use]
    pub const fn new(target: usize, max_pages: u32) -> Self {
        Self {
            target,
            limits: None,
            max_pages,
            cursor: None,
            yielded: 0,
            pages: 0,
            exhausted: false,
        }
    }

    /// Request page sizes within `limits`. Without limits no size is sent.
    #[must_use]
    pub const fn with_limits(mut self, limits: Option<PageLimits>) -> Self {
        self.limits = limits;
        self
    }

    /// Items produced so far.
    #[must_use]
    pub const fn yielded(&self) -> usize {
        self.yielded
    }

    /// Pages fetched so far.
    #[must_use]
    pub const fn pages(&self) -> u32 {
        self.pages
    }

    /// Fetch the next page, truncated so the total never exceeds the target.
    /// `None` once the walk is over.
    ///
    /// # Errors
    ///
    /// The fetch error; the walk is over afterwards.
    pub async fn next_page<F>(&mut self, fetcher: &mut F) -> XpostResult<Option<Vec<Value>>>
    where
        F: PageFetcher + ?Sized,
    {
        if self.exhausted || self.yielded >= self.target || self.pages >= self.max_pages {
            return Ok(None);
        }

        let remaining = self.target - self.yielded;
        let size = self.limits.map(|limits| limits.size_for(remaining));

        let page = match fetcher.fetch(self.cursor.as_deref(), size).await {
            Ok(page) => page,
            Err(e) => {
                self.exhausted = true;
                return Err(e);
            }
        };
        self.pages += 1;

        let Page {
            mut items,
            next_token,
        } = page;
        items.truncate(remaining);
        self.yielded += items.len();

        debug!(
            page = self.pages,
            items = items.len(),
            total = self.yielded,
            has_more = next_token.is_some(),
            "Fetched page"
        );

        self.exhausted = next_token.is_none();
        self.cursor = next_token;

        Ok(Some(items))
    }

    /// Drain the walk into one vector.
    ///
    /// # Errors
    ///
    /// The first fetch error.
    pub async fn collect<F>(mut self, fetcher: &mut F) -> XpostResult<Vec<Value>>
    where
        F: PageFetcher + ?Sized,
    {
        let mut all = Vec::new();
        while let Some(items) = self.next_page(fetcher).await? {
            all.extend(items);
        }
        Ok(all)
    }
}

/// Pages of one endpoint, fetched through the executor.
pub struct EndpointPages<'a> {
    client: &'a mut ApiClient,
    template: RequestDescriptor,
    cursor_param: &'static str,
}

impl<'a> EndpointPages<'a> {
    pub const fn new(
        client: &'a mut ApiClient,
        template: RequestDescriptor,
        cursor_param: &'static str,
    ) -> Self {
        Self {
            client,
            template,
            cursor_param,
        }
    }
}

#[async_trait]
impl PageFetcher for EndpointPages<'_> {
    async fn fetch(&mut self, cursor: Option<&str>, page_size: Option<u32>) -> XpostResult<Page> {
        let mut request = self.template.clone();
        if let Some(size) = page_size {
            request.set_param("max_results", size);
        }
        if let Some(cursor) = cursor {
            request.set_param(self.cursor_param, cursor);
        }
        let body = self.client.execute(&request).await?;
        Ok(Page::from_response(body))
    }
}
