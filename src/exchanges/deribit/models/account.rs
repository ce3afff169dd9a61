use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetAnnouncementsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub important: bool,
    pub publication_timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChangeSubaccountNameParams {
    pub sid: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetAccountSummaryParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended: Option<bool>,
}

impl GetAccountSummaryParams {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            extended: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub currency: String,
    pub balance: f64,
    pub equity: f64,
    pub available_funds: f64,
    pub margin_balance: f64,
    #[serde(default)]
    pub available_withdrawal_funds: Option<f64>,
    #[serde(default)]
    pub initial_margin: Option<f64>,
    #[serde(default)]
    pub maintenance_margin: Option<f64>,
    #[serde(default)]
    pub total_pl: Option<f64>,
    #[serde(default)]
    pub session_upl: Option<f64>,
    #[serde(default)]
    pub session_rpl: Option<f64>,
    #[serde(default)]
    pub delta_total: Option<f64>,
    #[serde(default)]
    pub portfolio_margining_enabled: Option<bool>,
    // only present with `extended = true`
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetEmailLanguageParams {
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetPositionParams {
    pub instrument_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetPositionsParams {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub instrument_name: String,
    pub direction: String,
    pub kind: String,
    pub size: f64,
    #[serde(default)]
    pub size_currency: Option<f64>,
    pub average_price: f64,
    pub mark_price: f64,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub estimated_liquidation_price: Option<f64>,
    #[serde(default)]
    pub floating_profit_loss: f64,
    #[serde(default)]
    pub realized_profit_loss: f64,
    #[serde(default)]
    pub total_profit_loss: f64,
    #[serde(default)]
    pub initial_margin: f64,
    #[serde(default)]
    pub maintenance_margin: f64,
    #[serde(default)]
    pub delta: Option<f64>,
    #[serde(default)]
    pub leverage: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetSubaccountsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_portfolio: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subaccount {
    pub id: i64,
    pub email: String,
    pub username: String,
    #[serde(rename = "type")]
    pub account_type: String,
    #[serde(default)]
    pub login_enabled: bool,
    #[serde(default)]
    pub receive_notifications: bool,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub tfa_enabled: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginState {
    Enable,
    Disable,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleSubaccountLoginParams {
    pub sid: i64,
    pub state: LoginState,
}
