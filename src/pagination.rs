use std::future::Future;

use log::{debug, warn};
use serde_json::Value;

use crate::error::ApiError;

/// Largest `pageSize` the server accepts.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_MAX_PAGES: u32 = 1000;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

impl Page<Value> {
    /// Read `data.<key>` and `data.pagination.hasNext` from a listing envelope.
    pub fn from_listing(data: Option<&Value>, key: &str) -> Result<Self, ApiError> {
        let data = data.ok_or_else(|| ApiError::invalid_response("listing response has no data"))?;
        let items = data
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| {
                ApiError::invalid_response(format!("listing response has no `{}` array", key))
            })?;
        let has_next = data
            .get("pagination")
            .and_then(|p| p.get("hasNext"))
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ApiError::invalid_response("listing response has no pagination.hasNext")
            })?;
        Ok(Self { items, has_next })
    }
}

/// Drives a page-numbered listing to exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    pub page_size: u32,
    pub max_pages: u32,
}

impl Default for Paginator {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl Paginator {
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Fetch pages 1, 2, ... one at a time, concatenating items in page order.
    ///
    /// Stops at the first page with `has_next == false`, or after `max_pages`
    /// pages if the server never says it is done. Any error aborts the walk.
    pub async fn collect_all<T, P, F, Fut>(&self, mut list: F, filters: &P) -> Result<Vec<T>, ApiError>
    where
        F: FnMut(u32, u32, &P) -> Fut,
        Fut: Future<Output = Result<Page<T>, ApiError>>,
    {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let Page { items, has_next } = list(page, self.page_size, filters).await?;
            debug!("page {}: {} items, has_next={}", page, items.len(), has_next);
            all.extend(items);
            if !has_next {
                break;
            }
            if page >= self.max_pages {
                warn!(
                    "stopping pagination after {} pages; server still reports more",
                    self.max_pages
                );
                break;
            }
            page += 1;
        }
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn listing_envelope() {
        let data = json!({"cards": [1, 2], "pagination": {"hasNext": true}});
        let page = Page::from_listing(Some(&data), "cards").unwrap();
        assert_eq!(page.items, vec![json!(1), json!(2)]);
        assert!(page.has_next);
    }

    #[test]
    fn listing_envelope_missing_fields() {
        assert!(Page::from_listing(None, "cards").is_err());
        let err = Page::from_listing(Some(&json!({"cards": []})), "cards").unwrap_err();
        assert_eq!(err.code, "INVALID_RESPONSE");
        assert!(Page::from_listing(Some(&json!({"pagination": {"hasNext": false}})), "cards").is_err());
    }

    #[tokio::test]
    async fn safety_cap_stops_endless_server() {
        let calls = RefCell::new(Vec::new());
        let items = Paginator::default()
            .with_max_pages(4)
            .collect_all(
                |page, _size, _f: &()| {
                    calls.borrow_mut().push(page);
                    async move {
                        Ok(Page {
                            items: vec![page],
                            has_next: true,
                        })
                    }
                },
                &(),
            )
            .await
            .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(*calls.borrow(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn error_aborts_walk() {
        let out: Result<Vec<u32>, _> = Paginator::default()
            .collect_all(
                |page, _size, _f: &()| async move {
                    if page == 2 {
                        Err(ApiError::network("reset"))
                    } else {
                        Ok(Page {
                            items: vec![page],
                            has_next: true,
                        })
                    }
                },
                &(),
            )
            .await;
        assert_eq!(out.unwrap_err().code, "NETWORK_ERROR");
    }
}
