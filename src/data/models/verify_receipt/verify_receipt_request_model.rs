use serde::Serialize;

/// Request body sent to the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/requestbody
#[derive(Debug, Serialize)]
pub(crate) struct VerifyReceiptRequestModel<'a> {
    /// The Base64-encoded receipt data.
    #[serde(rename = "receipt-data")]
    pub(crate) receipt_data: &'a str,
    /// Your app's shared secret, which is a hexadecimal string.
    pub(crate) password: &'a str,
    /// Set this value to true for the response to include only the latest
    /// renewal transaction for any subscriptions. Always true here.
    #[serde(rename = "exclude-old-transactions")]
    pub(crate) exclude_old_transactions: bool,
}

impl<'a> VerifyReceiptRequestModel<'a> {
    pub(crate) fn new(receipt_data: &'a str, password: &'a str) -> Self {
        Self {
            receipt_data,
            password,
            exclude_old_transactions: true,
        }
    }
}
