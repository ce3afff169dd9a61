use crate::core::errors::ExchangeError;
use crate::exchanges::deribit::client::DeribitWsClient;
use crate::exchanges::deribit::models::{
    CancelWithdrawalParams, CreateDepositAddressParams, Deposit, DepositAddress,
    GetCurrentDepositAddressParams, GetDepositsParams, GetTransfersParams, GetWithdrawalsParams,
    Paged, Transfer, WithdrawParams, Withdrawal,
};
use tracing::instrument;

impl DeribitWsClient {
    /// `None` when no address was created yet
    pub async fn get_current_deposit_address(
        &self,
        params: &GetCurrentDepositAddressParams,
    ) -> Result<Option<DepositAddress>, ExchangeError> {
        self.call("private/get_current_deposit_address", params)
            .await
    }

    pub async fn create_deposit_address(
        &self,
        params: &CreateDepositAddressParams,
    ) -> Result<DepositAddress, ExchangeError> {
        self.call("private/create_deposit_address", params).await
    }

    pub async fn get_deposits(
        &self,
        params: &GetDepositsParams,
    ) -> Result<Paged<Deposit>, ExchangeError> {
        self.call("private/get_deposits", params).await
    }

    pub async fn get_transfers(
        &self,
        params: &GetTransfersParams,
    ) -> Result<Paged<Transfer>, ExchangeError> {
        self.call("private/get_transfers", params).await
    }

    pub async fn get_withdrawals(
        &self,
        params: &GetWithdrawalsParams,
    ) -> Result<Paged<Withdrawal>, ExchangeError> {
        self.call("private/get_withdrawals", params).await
    }

    #[instrument(skip(self, params), fields(exchange = "deribit", currency = %params.currency))]
    pub async fn withdraw(&self, params: &WithdrawParams) -> Result<Withdrawal, ExchangeError> {
        self.call("private/withdraw", params).await
    }

    pub async fn cancel_withdrawal(
        &self,
        params: &CancelWithdrawalParams,
    ) -> Result<Withdrawal, ExchangeError> {
        self.call("private/cancel_withdrawal", params).await
    }
}
