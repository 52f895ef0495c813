//! Offset pagination over GLPI listing endpoints.
//!
//! Pages are requested as inclusive `range=<start>-<end>` windows. A page
//! shorter than the page size (including an empty one) is the last page; no
//! confirmatory empty fetch follows a short page. This assumes the server
//! only returns a short page at the true end of the result set. A server
//! that returns short intermediate pages will be under-fetched.
//!
//! Items are not deduplicated or compared across pages: software search rows
//! carry only a name, and the same name legitimately repeats.

use serde_json::Value;

use crate::client::GlpiError;

/// A listing endpoint: a path relative to the API base plus fixed query
/// parameters. The `range` parameter is added per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Fetches one inclusive `[start, end]` window of an endpoint.
pub trait PageSource {
    fn fetch_page(&mut self, endpoint: &Endpoint, start: usize, end: usize) -> Result<Value, GlpiError>;
}

/// Fetch every item of a paged endpoint.
///
/// Any failed page fails the whole call; nothing is retried.
pub fn fetch_all<P>(source: &mut P, endpoint: &Endpoint, page_size: usize) -> Result<Vec<Value>, GlpiError>
where
    P: PageSource + ?Sized,
{
    if page_size == 0 {
        return Err(GlpiError::InvalidPageSize);
    }

    let mut items = Vec::new();
    let mut start = 0usize;
    let mut page = 0u32;

    loop {
        page += 1;
        let end = start + page_size - 1;
        let body = source.fetch_page(endpoint, start, end)?;
        let chunk = page_items(body)?;
        let count = chunk.len();
        tracing::debug!(path = %endpoint.path, page, start, end, count, "fetched page");

        items.extend(chunk);

        if count < page_size {
            break;
        }
        start += page_size;
    }

    Ok(items)
}

/// Extract the items of one page. Accepts a bare array or an object
/// carrying the array under `data`.
pub fn page_items(body: Value) -> Result<Vec<Value>, GlpiError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(GlpiError::MalformedResponse(format!(
                "'data' is not an array (got {})",
                json_kind(&other)
            ))),
            // Search results with zero hits omit `data`
            None if reports_zero(&map, "count") || reports_zero(&map, "totalcount") => Ok(Vec::new()),
            None => Err(GlpiError::MalformedResponse(
                "object page without a 'data' array".into(),
            )),
        },
        other => Err(GlpiError::MalformedResponse(format!(
            "expected an array or an object page, got {}",
            json_kind(&other)
        ))),
    }
}

fn reports_zero(map: &serde_json::Map<String, Value>, key: &str) -> bool {
    map.get(key).and_then(Value::as_u64) == Some(0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Serves pages of the given sizes; item values are globally unique.
    struct ScriptedPages {
        sizes: Vec<usize>,
        wrap_in_data: bool,
        requests: Vec<(usize, usize)>,
    }

    impl ScriptedPages {
        fn new(sizes: &[usize]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                wrap_in_data: false,
                requests: Vec::new(),
            }
        }
    }

    impl PageSource for ScriptedPages {
        fn fetch_page(&mut self, _endpoint: &Endpoint, start: usize, end: usize) -> Result<Value, GlpiError> {
            let n = self.requests.len();
            self.requests.push((start, end));
            let size = self.sizes.get(n).copied().unwrap_or(0);
            let items: Vec<Value> = (start..start + size).map(|i| json!({ "id": i })).collect();
            Ok(if self.wrap_in_data {
                json!({ "totalcount": 9999, "data": items })
            } else {
                Value::Array(items)
            })
        }
    }

    fn ids(items: &[Value]) -> Vec<u64> {
        items.iter().map(|v| v["id"].as_u64().unwrap()).collect()
    }

    #[test]
    fn short_last_page_stops_without_extra_request() {
        let mut pages = ScriptedPages::new(&[1000, 1000, 437]);
        let items = fetch_all(&mut pages, &Endpoint::new("Computer"), 1000).unwrap();

        assert_eq!(items.len(), 2437);
        let mut unique = ids(&items);
        unique.dedup();
        assert_eq!(unique.len(), 2437);
        assert_eq!(pages.requests, vec![(0, 999), (1000, 1999), (2000, 2999)]);
    }

    #[test]
    fn exact_multiple_needs_empty_page() {
        let mut pages = ScriptedPages::new(&[1000, 1000, 1000, 0]);
        let items = fetch_all(&mut pages, &Endpoint::new("Computer"), 1000).unwrap();
        assert_eq!(items.len(), 3000);
        assert_eq!(pages.requests.len(), 4);
        assert_eq!(pages.requests[3], (3000, 3999));
    }

    #[test]
    fn empty_first_page() {
        let mut pages = ScriptedPages::new(&[0]);
        let items = fetch_all(&mut pages, &Endpoint::new("Computer"), 50).unwrap();
        assert!(items.is_empty());
        assert_eq!(pages.requests.len(), 1);
    }

    #[test]
    fn data_wrapped_pages() {
        let mut pages = ScriptedPages::new(&[3, 3, 1]);
        pages.wrap_in_data = true;
        let items = fetch_all(&mut pages, &Endpoint::new("search/Software"), 3).unwrap();
        assert_eq!(ids(&items), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut pages = ScriptedPages::new(&[1]);
        let err = fetch_all(&mut pages, &Endpoint::new("Computer"), 0).unwrap_err();
        assert!(matches!(err, GlpiError::InvalidPageSize));
        assert!(pages.requests.is_empty());
    }

    /// Serves fixed bodies in order, then empty pages.
    struct FixedPages {
        bodies: Vec<Value>,
        requests: Vec<(usize, usize)>,
    }

    impl PageSource for FixedPages {
        fn fetch_page(&mut self, _: &Endpoint, start: usize, end: usize) -> Result<Value, GlpiError> {
            let n = self.requests.len();
            self.requests.push((start, end));
            Ok(self.bodies.get(n).cloned().unwrap_or_else(|| json!([])))
        }
    }

    #[test]
    fn repeated_rows_at_page_heads_are_kept() {
        let mut pages = FixedPages {
            bodies: vec![
                json!({ "data": [{ "1": "7-Zip" }, { "1": "Chrome" }] }),
                json!({ "data": [{ "1": "7-Zip" }, { "1": "PuTTY" }] }),
                json!({ "data": [{ "1": "WinRAR" }] }),
            ],
            requests: Vec::new(),
        };
        let items = fetch_all(&mut pages, &Endpoint::new("search/Software"), 2).unwrap();

        let names: Vec<_> = items.iter().map(|v| v["1"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["7-Zip", "Chrome", "7-Zip", "PuTTY", "WinRAR"]);
        assert_eq!(pages.requests, vec![(0, 1), (2, 3), (4, 5)]);
    }

    #[test]
    fn identical_full_pages_continue_until_empty_page() {
        let page = json!([{ "1": "Notepad++" }, { "1": "Notepad++" }]);
        let mut pages = FixedPages {
            bodies: vec![page.clone(), page.clone(), page],
            requests: Vec::new(),
        };
        let items = fetch_all(&mut pages, &Endpoint::new("search/Software"), 2).unwrap();

        assert_eq!(items.len(), 6);
        assert_eq!(pages.requests.len(), 4);
        assert_eq!(pages.requests[3], (6, 7));
    }

    #[test]
    fn page_error_propagates() {
        struct Failing(u32);
        impl PageSource for Failing {
            fn fetch_page(&mut self, _: &Endpoint, start: usize, _: usize) -> Result<Value, GlpiError> {
                self.0 += 1;
                if start == 0 {
                    Ok(json!([{ "id": 1 }, { "id": 2 }]))
                } else {
                    Err(GlpiError::Http { status: 500, body: "boom".into() })
                }
            }
        }
        let mut source = Failing(0);
        let err = fetch_all(&mut source, &Endpoint::new("Computer"), 2).unwrap_err();
        assert!(matches!(err, GlpiError::Http { status: 500, .. }));
        assert_eq!(source.0, 2);
    }

    #[test]
    fn page_shapes() {
        assert_eq!(page_items(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(page_items(json!({ "data": [1] })).unwrap().len(), 1);
        assert!(page_items(Value::Null).unwrap().is_empty());
        assert!(page_items(json!({ "totalcount": 0, "count": 0 })).unwrap().is_empty());
        assert!(page_items(json!({ "data": null })).unwrap().is_empty());

        assert!(matches!(
            page_items(json!({ "data": "x" })),
            Err(GlpiError::MalformedResponse(_))
        ));
        assert!(matches!(
            page_items(json!({ "totalcount": 4 })),
            Err(GlpiError::MalformedResponse(_))
        ));
        assert!(matches!(page_items(json!("nope")), Err(GlpiError::MalformedResponse(_))));
    }

    #[test]
    fn endpoint_builder() {
        let ep = Endpoint::new("Computer").param("is_deleted", "0");
        assert_eq!(ep.path, "Computer");
        assert_eq!(ep.query, vec![("is_deleted".to_string(), "0".to_string())]);
    }
}
