//! The grid response envelope.

use serde::Serialize;

use crate::record::Record;

/// A complete answer to one grid request.
///
/// Serializes with the field names grid clients expect:
///
/// ```
/// use datagrid::GridResponse;
///
/// let response = GridResponse {
///     draw: 2,
///     records_total: 57,
///     records_filtered: 5,
///     data: Vec::new(),
/// };
/// let json = serde_json::to_string(&response).unwrap();
/// assert_eq!(
///     json,
///     r#"{"draw":2,"recordsTotal":57,"recordsFiltered":5,"data":[]}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridResponse {
    /// Request counter echoed back to the client.
    pub draw: u64,
    /// Rows before search.
    pub records_total: u64,
    /// Rows after search, before pagination.
    pub records_filtered: u64,
    /// The records of the current page.
    pub data: Vec<Record>,
}

impl GridResponse {
    /// Serializes the response into a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "draw": self.draw,
            "recordsTotal": self.records_total,
            "recordsFiltered": self.records_filtered,
            "data": self.data.iter().map(Record::to_value).collect::<Vec<_>>(),
        })
    }
}
