pub mod data;
pub mod focus;
pub mod tasks;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::OpError;
use crate::store::StoreError;

/// Parse an operation payload against its expected shape, naming the
/// operation in the failure.
fn parse<T: DeserializeOwned>(operation: &'static str, params: Value) -> Result<T, OpError> {
    serde_json::from_value(params).map_err(|source| OpError::InvalidParams { operation, source })
}

/// Serialize a reply shape into the response payload.
fn reply(value: impl Serialize) -> Result<Value, OpError> {
    serde_json::to_value(value).map_err(|e| OpError::Storage(StoreError::Serde(e)))
}
