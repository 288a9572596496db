//! Catalog Loader
//!
//! The catalog endpoint returns a JSON array of single-key objects whose
//! key is derived from the remote table name (e.g. `Tables_in_x`) and whose
//! value is the dataset name. Row 0 is a header row, not a dataset.
//!
//! Loading never fails outward: transport, decode and validation problems
//! produce `CatalogLoad::Unavailable` with an empty catalog and no initial
//! selection.

use serde_json::Value;
use tracing::{error, info, warn};
use types::errors::{FeedError, ValidationError};
use types::ids::DatasetId;

use crate::source::{ChartSource, RawResponse};

/// Number of leading header rows removed before presentation.
pub const HEADER_ROWS: usize = 1;

/// The selectable datasets, in remote order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Value of the header row, if it was a string.
    header: Option<String>,
    entries: Vec<DatasetId>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from the raw catalog response.
    ///
    /// Every row must be an object with exactly one key. The first
    /// `HEADER_ROWS` rows are kept aside as the header and may hold any
    /// value; selectable rows must hold a non-empty string. Duplicates after
    /// the first occurrence are dropped.
    pub fn from_rows(rows: &Value) -> Result<Self, ValidationError> {
        let rows = rows.as_array().ok_or(ValidationError::CatalogNotArray)?;

        let mut header = None;
        let mut entries: Vec<DatasetId> = Vec::with_capacity(rows.len().saturating_sub(HEADER_ROWS));

        for (index, row) in rows.iter().enumerate() {
            let value = single_value(index, row)?;
            if index < HEADER_ROWS {
                header = value.as_str().map(str::to_string);
                continue;
            }

            let name = value
                .as_str()
                .ok_or(ValidationError::CatalogEntryNotString { index })?;
            let id = DatasetId::try_new(name)
                .ok_or(ValidationError::EmptyDatasetName { index })?;
            if entries.contains(&id) {
                warn!(dataset = %id, index, "Duplicate catalog entry dropped");
                continue;
            }
            entries.push(id);
        }

        Ok(Self { header, entries })
    }

    /// Selectable datasets, header row excluded.
    pub fn entries(&self) -> &[DatasetId] {
        &self.entries
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// First selectable dataset, if any.
    pub fn initial_selection(&self) -> Option<&DatasetId> {
        self.entries.first()
    }

    pub fn contains(&self, id: &DatasetId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract the only value of a single-key object.
fn single_value(index: usize, row: &Value) -> Result<&Value, ValidationError> {
    let object = row
        .as_object()
        .ok_or(ValidationError::CatalogEntryKeys { index, keys: 0 })?;
    if object.len() != 1 {
        return Err(ValidationError::CatalogEntryKeys {
            index,
            keys: object.len(),
        });
    }
    object
        .values()
        .next()
        .ok_or(ValidationError::CatalogEntryKeys { index, keys: 0 })
}

/// Result of the one catalog load per session.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogLoad {
    Ready(Catalog),
    Unavailable(FeedError),
}

impl CatalogLoad {
    pub fn is_available(&self) -> bool {
        matches!(self, CatalogLoad::Ready(_))
    }

    /// Selectable datasets; empty when the load failed.
    pub fn entries(&self) -> &[DatasetId] {
        match self {
            CatalogLoad::Ready(catalog) => catalog.entries(),
            CatalogLoad::Unavailable(_) => &[],
        }
    }

    pub fn initial_selection(&self) -> Option<&DatasetId> {
        match self {
            CatalogLoad::Ready(catalog) => catalog.initial_selection(),
            CatalogLoad::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FeedError> {
        match self {
            CatalogLoad::Ready(_) => None,
            CatalogLoad::Unavailable(err) => Some(err),
        }
    }

    pub fn into_catalog(self) -> Catalog {
        match self {
            CatalogLoad::Ready(catalog) => catalog,
            CatalogLoad::Unavailable(_) => Catalog::empty(),
        }
    }
}

/// Load the catalog once. Failures are logged and represented, not returned.
pub async fn load_catalog<S: ChartSource + ?Sized>(source: &S) -> CatalogLoad {
    match fetch_catalog(source).await {
        Ok(catalog) => {
            info!(
                datasets = catalog.len(),
                initial = ?catalog.initial_selection().map(DatasetId::as_str),
                "Catalog loaded"
            );
            CatalogLoad::Ready(catalog)
        }
        Err(err) => {
            error!(error = %err, kind = ?err.kind(), "Catalog unavailable");
            CatalogLoad::Unavailable(err)
        }
    }
}

async fn fetch_catalog<S: ChartSource + ?Sized>(source: &S) -> Result<Catalog, FeedError> {
    let response = source.catalog().await?;
    let body = decode_catalog(&response)?;
    Ok(Catalog::from_rows(&body)?)
}

fn decode_catalog(response: &RawResponse) -> Result<Value, FeedError> {
    if !response.is_success() {
        return Err(FeedError::Server {
            status: response.status,
            message: error_message(&response.body),
        });
    }
    serde_json::from_slice(&response.body)
        .map_err(|e| FeedError::Decode(format!("catalog body is not JSON: {}", e)))
}

/// `error` field of a JSON error body, or the body text itself.
pub(crate) fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use types::window::WindowQuery;

    struct FixedCatalog(Result<RawResponse, FeedError>);

    #[async_trait]
    impl ChartSource for FixedCatalog {
        async fn catalog(&self) -> Result<RawResponse, FeedError> {
            self.0.clone()
        }

        async fn window(&self, _query: &WindowQuery) -> Result<RawResponse, FeedError> {
            Err(FeedError::Transport("not scripted".into()))
        }
    }

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog.entries().iter().map(DatasetId::as_str).collect()
    }

    #[test]
    fn test_header_row_is_removed() {
        let rows = json!([
            {"Tables_in_x": "HEADER"},
            {"Tables_in_x": "AAPL"},
            {"Tables_in_x": "MSFT"}
        ]);
        let catalog = Catalog::from_rows(&rows).unwrap();
        assert_eq!(names(&catalog), vec!["AAPL", "MSFT"]);
        assert_eq!(catalog.header(), Some("HEADER"));
        assert_eq!(catalog.initial_selection().unwrap().as_str(), "AAPL");
    }

    #[test]
    fn test_only_header_means_no_selection() {
        let catalog = Catalog::from_rows(&json!([{"Tables_in_x": "HEADER"}])).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.initial_selection().is_none());
    }

    #[test]
    fn test_empty_array() {
        let catalog = Catalog::from_rows(&json!([])).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.header().is_none());
    }

    #[test]
    fn test_key_spelling_is_irrelevant() {
        let rows = json!([
            {"TABLES_IN_PROJECT_4560": "hdr"},
            {"tables_in_project_4560": "btc_usdt"},
            {"whatever": "eth_usdt"}
        ]);
        let catalog = Catalog::from_rows(&rows).unwrap();
        assert_eq!(names(&catalog), vec!["btc_usdt", "eth_usdt"]);
    }

    #[test]
    fn test_multi_key_row_rejected() {
        let rows = json!([
            {"Tables_in_x": "HEADER"},
            {"a": "AAPL", "b": "MSFT"}
        ]);
        assert_eq!(
            Catalog::from_rows(&rows),
            Err(ValidationError::CatalogEntryKeys { index: 1, keys: 2 })
        );
    }

    #[test]
    fn test_zero_key_and_non_object_rows_rejected() {
        assert_eq!(
            Catalog::from_rows(&json!([{}])),
            Err(ValidationError::CatalogEntryKeys { index: 0, keys: 0 })
        );
        assert_eq!(
            Catalog::from_rows(&json!([{"t": "h"}, "AAPL"])),
            Err(ValidationError::CatalogEntryKeys { index: 1, keys: 0 })
        );
    }

    #[test]
    fn test_non_string_and_blank_values_rejected() {
        assert_eq!(
            Catalog::from_rows(&json!([{"t": "h"}, {"t": 42}])),
            Err(ValidationError::CatalogEntryNotString { index: 1 })
        );
        assert_eq!(
            Catalog::from_rows(&json!([{"t": "h"}, {"t": ""}])),
            Err(ValidationError::EmptyDatasetName { index: 1 })
        );
    }

    #[test]
    fn test_header_value_may_be_any_json() {
        let rows = json!([
            {"Tables_in_x": null},
            {"Tables_in_x": "AAPL"}
        ]);
        let catalog = Catalog::from_rows(&rows).unwrap();
        assert_eq!(names(&catalog), vec!["AAPL"]);
        assert!(catalog.header().is_none());

        let rows = json!([{"Tables_in_x": 7}, {"Tables_in_x": "MSFT"}]);
        assert_eq!(names(&Catalog::from_rows(&rows).unwrap()), vec!["MSFT"]);

        // the header still needs exactly one key
        assert_eq!(
            Catalog::from_rows(&json!([{"a": null, "b": null}, {"t": "AAPL"}])),
            Err(ValidationError::CatalogEntryKeys { index: 0, keys: 2 })
        );
    }

    #[test]
    fn test_not_an_array() {
        assert_eq!(
            Catalog::from_rows(&json!({"error": "Failed to fetch dropdown options"})),
            Err(ValidationError::CatalogNotArray)
        );
    }

    #[test]
    fn test_duplicates_dropped() {
        let rows = json!([{"t": "h"}, {"t": "AAPL"}, {"t": "AAPL"}, {"t": "MSFT"}]);
        let catalog = Catalog::from_rows(&rows).unwrap();
        assert_eq!(names(&catalog), vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn test_load_ready() {
        let source = FixedCatalog(Ok(RawResponse::json(
            200,
            &json!([{"Tables_in_x": "HEADER"}, {"Tables_in_x": "AAPL"}]),
        )));
        let load = load_catalog(&source).await;
        assert!(load.is_available());
        assert_eq!(load.initial_selection().unwrap().as_str(), "AAPL");
    }

    #[tokio::test]
    async fn test_load_transport_failure_is_represented() {
        let source = FixedCatalog(Err(FeedError::Transport("connection refused".into())));
        let load = load_catalog(&source).await;
        assert!(!load.is_available());
        assert!(load.entries().is_empty());
        assert!(load.initial_selection().is_none());
        assert!(matches!(load.error(), Some(FeedError::Transport(_))));
    }

    #[tokio::test]
    async fn test_load_server_error() {
        let source = FixedCatalog(Ok(RawResponse::json(
            500,
            &json!({"error": "Failed to fetch dropdown options"}),
        )));
        let load = load_catalog(&source).await;
        assert_eq!(
            load.error(),
            Some(&FeedError::Server {
                status: 500,
                message: "Failed to fetch dropdown options".into()
            })
        );
        assert!(load.into_catalog().is_empty());
    }

    #[tokio::test]
    async fn test_load_garbage_body() {
        let source = FixedCatalog(Ok(RawResponse::new(200, "<html>")));
        let load = load_catalog(&source).await;
        assert!(matches!(load.error(), Some(FeedError::Decode(_))));
    }

    #[tokio::test]
    async fn test_load_validation_failure() {
        let source = FixedCatalog(Ok(RawResponse::json(200, &json!([{"a": "x", "b": "y"}]))));
        let load = load_catalog(&source).await;
        assert!(matches!(
            load.error(),
            Some(FeedError::Validation(ValidationError::CatalogEntryKeys { .. }))
        ));
    }
}
