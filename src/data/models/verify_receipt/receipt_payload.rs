use chrono::{DateTime, Utc};
use serde_json::Value;

use super::receipt_info_model::ReceiptInfoModel;
use crate::errors::RelayError;

/// A receipt payload after shape detection.
#[derive(Debug)]
pub(crate) enum ReceiptPayload {
    /// A single object, as sent before the in-app purchase migration.
    Legacy(ReceiptInfoModel),
    /// One entry per transaction in the receipt.
    Transactions(Vec<ReceiptInfoModel>),
}

impl ReceiptPayload {
    pub(crate) fn decode(payload: Value) -> Result<Self, RelayError> {
        match payload {
            Value::Object(_) => Self::decode_legacy(payload),
            Value::Array(_) => Self::decode_transactions(payload),
            other => Err(RelayError::UnrecognizedReceiptShape(json_kind(&other).to_string())),
        }
    }

    fn decode_legacy(payload: Value) -> Result<Self, RelayError> {
        let mut model: ReceiptInfoModel = serde_json::from_value(payload)?;
        if model.in_app.is_empty() {
            return Ok(ReceiptPayload::Legacy(model));
        }
        let transactions = std::mem::take(&mut model.in_app);
        Ok(ReceiptPayload::Transactions(transactions))
    }

    fn decode_transactions(payload: Value) -> Result<Self, RelayError> {
        let transactions: Vec<ReceiptInfoModel> = serde_json::from_value(payload)?;
        if transactions.is_empty() {
            return Err(RelayError::UnrecognizedReceiptShape(
                "empty transaction array".to_string(),
            ));
        }
        Ok(ReceiptPayload::Transactions(transactions))
    }

    /// The authoritative transaction and its expiration. For arrays this is
    /// the entry with the latest purchase time; on ties the later entry wins.
    pub(crate) fn into_latest(self) -> (ReceiptInfoModel, Option<DateTime<Utc>>) {
        match self {
            ReceiptPayload::Legacy(model) => {
                let expires_at = model.legacy_expires_at();
                (model, expires_at)
            }
            ReceiptPayload::Transactions(transactions) => {
                let latest = transactions
                    .into_iter()
                    .max_by_key(|t| t.purchased_at())
                    .unwrap_or_default();
                let expires_at = latest.expires_at();
                (latest, expires_at)
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
