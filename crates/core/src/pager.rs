//! Paginated feature fetching
//!
//! A layer query returns at most `resultRecordCount` features per request.
//! [`FeaturePager`] walks `resultOffset` forward until the server answers with
//! a short page, accumulating every feature on the way. Like the hierarchy
//! walker it performs no I/O: the caller asks for the next cursor, performs
//! the request, and hands the result back.
//!
//! State transitions:
//!
//! - `Fetching` -> `Accumulating` on any successful response
//! - `Accumulating` -> `Fetching` while the last page was full
//! - `Accumulating` -> `Done` once a page comes back short
//! - any -> `Failed` on a transport or status error, keeping what was collected

use crate::error::FetchError;
use serde::Serialize;
use serde_json::Value;

/// Records requested per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Filter expression matching every row
pub const MATCH_ALL: &str = "1=1";

/// Field selection returning every attribute
pub const ALL_FIELDS: &str = "*";

/// Output spatial reference (WGS 84)
pub const OUT_SPATIAL_REFERENCE: u32 = 4326;

/// Parameters of a feature query against one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureQuery {
    pub service: String,
    pub layer_id: u32,
    pub where_clause: String,
    pub out_fields: String,
    pub page_size: usize,
}

impl FeatureQuery {
    pub fn new(
        service: impl Into<String>,
        layer_id: u32,
        where_clause: impl Into<String>,
        out_fields: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            layer_id,
            where_clause: where_clause.into(),
            out_fields: out_fields.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Every row, every field
    pub fn all(service: impl Into<String>, layer_id: u32) -> Self {
        Self::new(service, layer_id, MATCH_ALL, ALL_FIELDS)
    }

    /// Override the page size; zero is raised to one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Query string parameters for the page at `cursor`
    pub fn params(&self, cursor: &PageCursor) -> Vec<(&'static str, String)> {
        vec![
            ("where", self.where_clause.clone()),
            ("outFields", self.out_fields.clone()),
            ("f", "json".to_string()),
            ("returnGeometry", "true".to_string()),
            ("outSR", OUT_SPATIAL_REFERENCE.to_string()),
            ("resultOffset", cursor.offset.to_string()),
            ("resultRecordCount", cursor.page_size.to_string()),
        ]
    }
}

/// Position of the next page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    pub offset: usize,
    pub page_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagerState {
    /// Waiting for the page at this cursor
    Fetching(PageCursor),
    /// A page of `page_len` features was just appended
    Accumulating { cursor: PageCursor, page_len: usize },
    /// A short page ended the layer
    Done,
    /// A request failed; features collected so far are kept
    Failed(FetchError),
}

/// Every feature collected by one paginated query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    pub features: Vec<Value>,
    /// Number of page requests issued
    pub requests: usize,
    /// Set when the loop stopped on a failure and `features` is partial
    pub error: Option<FetchError>,
}

impl FeatureCollection {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Sans-IO state of one paginated query
#[derive(Debug)]
pub struct FeaturePager {
    state: PagerState,
    features: Vec<Value>,
    requests: usize,
}

impl FeaturePager {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: PagerState::Fetching(PageCursor {
                offset: 0,
                page_size: page_size.max(1),
            }),
            features: Vec::new(),
            requests: 0,
        }
    }

    pub fn state(&self) -> &PagerState {
        &self.state
    }

    /// Cursor of the page to request next, `None` once done or failed
    pub fn next_page(&self) -> Option<PageCursor> {
        match self.state {
            PagerState::Fetching(cursor) => Some(cursor),
            _ => None,
        }
    }

    /// Feed the result of the request for [`Self::next_page`]
    ///
    /// Results arriving outside the `Fetching` state are ignored.
    pub fn accept(&mut self, result: Result<Value, FetchError>) {
        let PagerState::Fetching(cursor) = self.state else {
            return;
        };
        self.requests += 1;

        match result {
            Ok(mut value) => {
                let page = match value.get_mut("features").map(Value::take) {
                    Some(Value::Array(features)) => features,
                    _ => Vec::new(),
                };
                let page_len = page.len();
                self.features.extend(page);
                self.state = PagerState::Accumulating { cursor, page_len };
                self.advance();
            }
            Err(err) => self.state = PagerState::Failed(err),
        }
    }

    fn advance(&mut self) {
        let PagerState::Accumulating { cursor, page_len } = self.state else {
            return;
        };

        self.state = if page_len < cursor.page_size {
            PagerState::Done
        } else {
            // Advances by the requested size, not by `page_len`.
            PagerState::Fetching(PageCursor {
                offset: cursor.offset + cursor.page_size,
                page_size: cursor.page_size,
            })
        };
    }

    /// Features collected so far
    pub fn collected(&self) -> usize {
        self.features.len()
    }

    pub fn finish(self) -> FeatureCollection {
        let error = match self.state {
            PagerState::Failed(err) => Some(err),
            _ => None,
        };

        FeatureCollection {
            features: self.features,
            requests: self.requests,
            error,
        }
    }
}
