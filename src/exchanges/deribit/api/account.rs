use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{
    AccountSummary, Announcement, ChangeSubaccountNameParams, GetAccountSummaryParams,
    GetAnnouncementsParams, GetPositionParams, GetPositionsParams, GetSubaccountsParams, Position,
    SetEmailLanguageParams, Subaccount, ToggleSubaccountLoginParams,
};

impl DeribitWsClient {
    pub async fn get_announcements(
        &self,
        params: &GetAnnouncementsParams,
    ) -> Result<Vec<Announcement>, ExchangeError> {
        self.call("public/get_announcements", params).await
    }

    /// Returns `"ok"`
    pub async fn change_subaccount_name(
        &self,
        params: &ChangeSubaccountNameParams,
    ) -> Result<String, ExchangeError> {
        self.call("private/change_subaccount_name", params).await
    }

    pub async fn create_subaccount(&self) -> Result<Subaccount, ExchangeError> {
        self.call("private/create_subaccount", &()).await
    }

    pub async fn get_account_summary(
        &self,
        params: &GetAccountSummaryParams,
    ) -> Result<AccountSummary, ExchangeError> {
        self.call("private/get_account_summary", params).await
    }

    pub async fn get_email_language(&self) -> Result<String, ExchangeError> {
        self.call("private/get_email_language", &()).await
    }

    pub async fn get_position(&self, params: &GetPositionParams) -> Result<Position, ExchangeError> {
        self.call("private/get_position", params).await
    }

    pub async fn get_positions(
        &self,
        params: &GetPositionsParams,
    ) -> Result<Vec<Position>, ExchangeError> {
        self.call("private/get_positions", params).await
    }

    pub async fn get_subaccounts(
        &self,
        params: &GetSubaccountsParams,
    ) -> Result<Vec<Subaccount>, ExchangeError> {
        self.call("private/get_subaccounts", params).await
    }

    pub async fn set_email_language(
        &self,
        params: &SetEmailLanguageParams,
    ) -> Result<String, ExchangeError> {
        self.call("private/set_email_language", params).await
    }

    pub async fn toggle_subaccount_login(
        &self,
        params: &ToggleSubaccountLoginParams,
    ) -> Result<String, ExchangeError> {
        self.call("private/toggle_subaccount_login", params).await
    }
}
