use std::fmt;

/// Status codes returned by the verifyReceipt endpoint:
/// https://developer.apple.com/documentation/appstorereceipts/status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Valid,
    /// 21000: The request to the App Store was not made using the HTTP POST
    /// request method, or the App Store could not read the JSON object.
    Unreadable,
    /// 21002: The data in the receipt-data property was malformed or missing.
    ReceiptMalformed,
    /// 21003: The receipt could not be authenticated.
    NotAuthenticated,
    /// 21004: The shared secret does not match the shared secret on file for
    /// the account.
    MismatchedSecret,
    /// 21005: The receipt server was temporarily unable to provide the
    /// receipt.
    Unreachable,
    /// 21006: The receipt is valid but the subscription has expired.
    SubscriptionExpired,
    /// 21007: The receipt is from the test environment, but was sent to the
    /// production environment for verification.
    ReceiptFromTest,
    /// 21008: The receipt is from the production environment, but was sent to
    /// the test environment for verification.
    ReceiptFromProd,
    /// 21010: The account cannot be found or has been deleted.
    Unauthorized,
    /// 21100-21199: Internal data access errors.
    InternalDataAccess(i32),
    Unknown(i32),
}

impl VerifyStatus {
    pub fn code(&self) -> i32 {
        match self {
            VerifyStatus::Valid => 0,
            VerifyStatus::Unreadable => 21000,
            VerifyStatus::ReceiptMalformed => 21002,
            VerifyStatus::NotAuthenticated => 21003,
            VerifyStatus::MismatchedSecret => 21004,
            VerifyStatus::Unreachable => 21005,
            VerifyStatus::SubscriptionExpired => 21006,
            VerifyStatus::ReceiptFromTest => 21007,
            VerifyStatus::ReceiptFromProd => 21008,
            VerifyStatus::Unauthorized => 21010,
            VerifyStatus::InternalDataAccess(code) | VerifyStatus::Unknown(code) => *code,
        }
    }

    /// Whether the response body carries receipt data worth normalizing.
    pub fn has_receipt(&self) -> bool {
        matches!(self, VerifyStatus::Valid | VerifyStatus::SubscriptionExpired)
    }

    pub fn description(&self) -> &'static str {
        match self {
            VerifyStatus::Valid => "The receipt is valid.",
            VerifyStatus::Unreadable => "The App Store could not read the JSON object you provided.",
            VerifyStatus::ReceiptMalformed => {
                "The data in the receipt-data property was malformed or missing."
            }
            VerifyStatus::NotAuthenticated => "The receipt could not be authenticated.",
            VerifyStatus::MismatchedSecret => {
                "The shared secret you provided does not match the shared secret on file for your account."
            }
            VerifyStatus::Unreachable => "The receipt server is not currently available.",
            VerifyStatus::SubscriptionExpired => {
                "This receipt is valid but the subscription has expired."
            }
            VerifyStatus::ReceiptFromTest => {
                "This receipt is from the test environment, but it was sent to the production environment for verification."
            }
            VerifyStatus::ReceiptFromProd => {
                "This receipt is from the production environment, but it was sent to the test environment for verification."
            }
            VerifyStatus::Unauthorized => "This receipt could not be authorized.",
            VerifyStatus::InternalDataAccess(_) => "Internal data access error.",
            VerifyStatus::Unknown(_) => "Unrecognized status code.",
        }
    }
}

impl From<i32> for VerifyStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => VerifyStatus::Valid,
            21000 => VerifyStatus::Unreadable,
            21002 => VerifyStatus::ReceiptMalformed,
            21003 => VerifyStatus::NotAuthenticated,
            21004 => VerifyStatus::MismatchedSecret,
            21005 => VerifyStatus::Unreachable,
            21006 => VerifyStatus::SubscriptionExpired,
            21007 => VerifyStatus::ReceiptFromTest,
            21008 => VerifyStatus::ReceiptFromProd,
            21010 => VerifyStatus::Unauthorized,
            21100..=21199 => VerifyStatus::InternalDataAccess(code),
            other => VerifyStatus::Unknown(other),
        }
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
