//! Paginated listing for v3 `list` endpoints.
//!
//! v3 listings are `POST {resource}/list` with `{kind, offset, length}` and
//! answer with a page of `entities` plus `metadata.total_matches`.
//! [`fetch_all`] walks the pages sequentially and concatenates the entities
//! in server order.
//!
//! The server does not snapshot the collection between pages. If it is
//! mutated mid-walk, the final count may differ from the total reported by
//! the first page; that is logged as a warning and the entities fetched are
//! returned as-is.

use std::future::Future;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PrismApiError;
use crate::executor::Executor;

/// Page size used when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Body of a `POST {resource}/list` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub kind: String,
    pub offset: u64,
    pub length: u32,
}

/// One page of a listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(default)]
    pub metadata: ListMetadata,
}

/// Listing metadata. Prism sends more fields; only the total is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMetadata {
    #[serde(default)]
    pub total_matches: u64,
}

/// Anything that can answer a single page request.
///
/// `resource` is the path of the collection relative to the API base, as
/// segments (e.g. `["categories", "AppType"]`); the `list` suffix is added
/// by the implementation.
pub trait PageSource {
    fn fetch_page(
        &self,
        resource: &[&str],
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResponse, PrismApiError>>;
}

impl PageSource for Executor {
    fn fetch_page(
        &self,
        resource: &[&str],
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageResponse, PrismApiError>> {
        async move {
            let endpoint = list_endpoint(resource);
            let mut segments = resource.to_vec();
            segments.push("list");
            let url = self.url(&segments)?;
            let payload =
                serde_json::to_value(request).map_err(|source| PrismApiError::Deserialization {
                    endpoint: endpoint.clone(),
                    source,
                })?;

            let body = self.execute(Method::POST, url, Some(&payload)).await?;
            serde_json::from_value(body)
                .map_err(|source| PrismApiError::Deserialization { endpoint, source })
        }
    }
}

/// Fetch every entity of `kind` from `resource`, `page_size` at a time.
///
/// Always issues at least one request, even for an empty collection. Stops
/// once the number of entities received reaches the first page's
/// `total_matches`, or when a page comes back empty before that.
///
/// # Errors
///
/// Any failed page aborts the walk and is returned as
/// [`PrismApiError::ListPage`] carrying the payload that failed. Nothing
/// fetched before the failure is returned.
pub async fn fetch_all<S: PageSource>(
    source: &S,
    resource: &[&str],
    kind: &str,
    page_size: u32,
) -> Result<Vec<Value>, PrismApiError> {
    if page_size == 0 {
        return Err(PrismApiError::InvalidPageSize);
    }

    let endpoint = list_endpoint(resource);
    let mut entities: Vec<Value> = Vec::new();
    let mut offset: u64 = 0;
    let mut total: u64 = 0;
    let mut pages: u32 = 0;

    loop {
        let request = PageRequest {
            kind: kind.to_string(),
            offset,
            length: page_size,
        };

        let page = match source.fetch_page(resource, &request).await {
            Ok(page) => page,
            Err(e) => {
                return Err(PrismApiError::ListPage {
                    endpoint,
                    payload: serde_json::to_string(&request).unwrap_or_default(),
                    source: Box::new(e),
                })
            }
        };

        if pages == 0 {
            total = page.metadata.total_matches;
        }
        pages += 1;

        let received = page.entities.len() as u64;
        entities.extend(page.entities);
        offset += received;

        tracing::debug!(%endpoint, kind, offset, total, received, "fetched page");

        if offset >= total {
            break;
        }
        if received == 0 {
            tracing::warn!(
                %endpoint,
                kind,
                offset,
                total,
                "empty page before reaching total_matches, stopping"
            );
            break;
        }
    }

    if entities.len() as u64 != total {
        tracing::warn!(
            %endpoint,
            kind,
            fetched = entities.len(),
            total,
            "listing count differs from total_matches; collection changed during the walk"
        );
    }

    Ok(entities)
}

fn list_endpoint(resource: &[&str]) -> String {
    format!("POST {}/list", resource.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// In-memory collection that records every page request.
    struct FakeSource {
        items: Vec<Value>,
        /// Largest page the fake will serve, regardless of `length`.
        cap: Option<u32>,
        /// Fail the request at this call index.
        fail_at: Option<usize>,
        calls: RefCell<Vec<PageRequest>>,
    }

    impl FakeSource {
        fn new(count: usize) -> Self {
            Self {
                items: (0..count).map(|i| json!({ "n": i })).collect(),
                cap: None,
                fail_at: None,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn offsets(&self) -> Vec<u64> {
            self.calls.borrow().iter().map(|r| r.offset).collect()
        }
    }

    impl PageSource for FakeSource {
        fn fetch_page(
            &self,
            _resource: &[&str],
            request: &PageRequest,
        ) -> impl Future<Output = Result<PageResponse, PrismApiError>> {
            let index = self.calls.borrow().len();
            self.calls.borrow_mut().push(request.clone());

            let result = if self.fail_at == Some(index) {
                Err(PrismApiError::Api {
                    endpoint: "POST vms/list".into(),
                    code: 500,
                    message: "boom".into(),
                })
            } else {
                let length = self.cap.map_or(request.length, |c| c.min(request.length));
                let start = (request.offset as usize).min(self.items.len());
                let end = (start + length as usize).min(self.items.len());
                Ok(PageResponse {
                    entities: self.items[start..end].to_vec(),
                    metadata: ListMetadata {
                        total_matches: self.items.len() as u64,
                    },
                })
            };
            std::future::ready(result)
        }
    }

    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn walks_250_items_in_three_pages() {
        let source = FakeSource::new(250);
        let all = block_on(fetch_all(&source, &["vms"], "vm", 100)).unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(source.offsets(), vec![0, 100, 200]);
        assert!(source.calls.borrow().iter().all(|r| r.kind == "vm" && r.length == 100));
    }

    #[test]
    fn empty_collection_costs_one_request() {
        let source = FakeSource::new(0);
        let all = block_on(fetch_all(&source, &["vms"], "vm", 100)).unwrap();
        assert!(all.is_empty());
        assert_eq!(source.offsets(), vec![0]);
    }

    #[test]
    fn short_pages_advance_by_received_count() {
        let mut source = FakeSource::new(25);
        source.cap = Some(7);
        let all = block_on(fetch_all(&source, &["vms"], "vm", 10)).unwrap();
        assert_eq!(all, source.items);
        assert_eq!(source.offsets(), vec![0, 7, 14, 21]);
    }

    #[test]
    fn zero_page_size_is_rejected_without_requests() {
        let source = FakeSource::new(5);
        let err = block_on(fetch_all(&source, &["vms"], "vm", 0)).unwrap_err();
        assert!(matches!(err, PrismApiError::InvalidPageSize));
        assert!(source.calls.borrow().is_empty());
    }

    #[test]
    fn failure_echoes_payload_and_returns_nothing() {
        let mut source = FakeSource::new(250);
        source.fail_at = Some(1);
        let err = block_on(fetch_all(&source, &["vms"], "vm", 100)).unwrap_err();
        match err {
            PrismApiError::ListPage {
                endpoint, payload, ..
            } => {
                assert_eq!(endpoint, "POST vms/list");
                assert_eq!(payload, r#"{"kind":"vm","offset":100,"length":100}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.offsets(), vec![0, 100]);
    }

    /// Claims ten matches but never returns an entity.
    #[derive(Default)]
    struct StalledSource {
        calls: Cell<usize>,
    }

    impl PageSource for StalledSource {
        fn fetch_page(
            &self,
            _resource: &[&str],
            _request: &PageRequest,
        ) -> impl Future<Output = Result<PageResponse, PrismApiError>> {
            self.calls.set(self.calls.get() + 1);
            std::future::ready(Ok(PageResponse {
                entities: Vec::new(),
                metadata: ListMetadata { total_matches: 10 },
            }))
        }
    }

    #[test]
    fn empty_page_before_total_stops() {
        let source = StalledSource::default();
        let all = block_on(fetch_all(&source, &["vms"], "vm", 5)).unwrap();
        assert!(all.is_empty());
        assert_eq!(source.calls.get(), 1);
    }

    #[test]
    fn page_response_tolerates_missing_fields() {
        let page: PageResponse = serde_json::from_value(json!({"api_version": "3.1"})).unwrap();
        assert!(page.entities.is_empty());
        assert_eq!(page.metadata.total_matches, 0);
    }

    proptest! {
        /// Round trips are ceil(t / n), or exactly one for an empty collection.
        #[test]
        fn round_trips_match_page_math(total in 0usize..400, page_size in 1u32..64) {
            let source = FakeSource::new(total);
            let all = block_on(fetch_all(&source, &["vms"], "vm", page_size)).unwrap();
            let expected = if total == 0 {
                1
            } else {
                total.div_ceil(page_size as usize)
            };
            prop_assert_eq!(source.calls.borrow().len(), expected);
            prop_assert_eq!(all.len(), total);
        }

        /// Concatenation preserves server order and never repeats an offset.
        #[test]
        fn entities_keep_server_order(total in 1usize..300, page_size in 1u32..50, cap in 1u32..50) {
            let mut source = FakeSource::new(total);
            source.cap = Some(cap);
            let all = block_on(fetch_all(&source, &["vms"], "vm", page_size)).unwrap();
            prop_assert_eq!(&all, &source.items);
            let offsets = source.offsets();
            prop_assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
