use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct CurrencyParams {
    pub currency: String,
}

impl CurrencyParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

pub type GetCurrentDepositAddressParams = CurrencyParams;
pub type CreateDepositAddressParams = CurrencyParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAddress {
    pub address: String,
    pub currency: String,
    pub creation_timestamp: i64,
    #[serde(default, rename = "type")]
    pub address_type: Option<String>,
}

/// Paging params of the wallet history methods
#[derive(Debug, Clone, Serialize)]
pub struct WalletHistoryParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl WalletHistoryParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            count: None,
            offset: None,
        }
    }
}

pub type GetDepositsParams = WalletHistoryParams;
pub type GetTransfersParams = WalletHistoryParams;
pub type GetWithdrawalsParams = WalletHistoryParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub count: u64,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deposit {
    pub address: String,
    pub amount: f64,
    pub currency: String,
    pub state: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub received_timestamp: i64,
    pub updated_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub amount: f64,
    pub currency: String,
    pub direction: String,
    pub other_side: String,
    pub state: String,
    #[serde(rename = "type")]
    pub transfer_type: String,
    pub created_timestamp: i64,
    pub updated_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub address: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default)]
    pub fee: f64,
    pub state: String,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub created_timestamp: i64,
    #[serde(default)]
    pub confirmed_timestamp: Option<i64>,
    pub updated_timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawParams {
    pub currency: String,
    pub address: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelWithdrawalParams {
    pub currency: String,
    pub id: i64,
}
