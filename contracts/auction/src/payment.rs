use commons::{CustomContractError, Currency, LotId, RawAmount, TokenRef};
use concordium_cis2::*;
use concordium_std::*;

use crate::events::AuctionEvent;
use crate::state::State;

/// Entrypoint invoked on this contract when payment tokens are pulled
/// into escrow.
pub const RECEIVE_HOOK: &str = "onReceivingCIS2";

/// Outcome of a best-effort CCD push.
#[must_use]
pub enum PushOutcome {
    Delivered,
    Deferred(RawAmount),
}

/// Pay `amount` out of escrow. CCD pushes that fail are credited to the
/// pending ledger and recorded, instead of failing the caller; payment
/// token pushes fail hard.
pub fn push_or_defer<S: HasStateApi>(
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
    self_address: ContractAddress,
    lot_id: LotId,
    currency: &Currency,
    payee: AccountAddress,
    amount: RawAmount,
) -> ReceiveResult<()> {
    if amount == 0 {
        return Ok(());
    }
    match currency {
        Currency::Ccd => {
            if let PushOutcome::Deferred(owed) = push_ccd(host, payee, amount) {
                host.state_mut().credit_pending(payee, lot_id, owed);
                logger.log(&AuctionEvent::pending_recorded(lot_id, &payee, owed))?;
            }
        }
        Currency::Cis2(token) => {
            push_token(host, token, self_address, payee, amount)?;
        }
    }
    Ok(())
}

/// Attempt an immediate CCD transfer, reporting failure as a deferral.
pub fn push_ccd<T>(
    host: &mut impl HasHost<T>,
    payee: AccountAddress,
    amount: RawAmount,
) -> PushOutcome {
    match host.invoke_transfer(&payee, Amount::from_micro_ccd(amount)) {
        Ok(()) => PushOutcome::Delivered,
        Err(_) => PushOutcome::Deferred(amount),
    }
}

/// Hard push of payment tokens out of escrow.
pub fn push_token<T>(
    host: &mut impl HasHost<T>,
    token: &TokenRef,
    self_address: ContractAddress,
    payee: AccountAddress,
    amount: RawAmount,
) -> Result<(), CustomContractError> {
    transfer_token(
        host,
        token,
        Address::Contract(self_address),
        Receiver::Account(payee),
        amount,
    )
}

/// Pull payment tokens from `payer` into escrow. Returns the actually
/// received amount, so transfer-fee tokens cannot inflate a bid beyond
/// what arrived.
pub fn pull_token<T>(
    host: &mut impl HasHost<T>,
    token: &TokenRef,
    payer: AccountAddress,
    self_address: ContractAddress,
    amount: RawAmount,
) -> Result<RawAmount, CustomContractError> {
    let before = escrow_balance(host, token, self_address)?;
    transfer_token(
        host,
        token,
        Address::Account(payer),
        Receiver::Contract(
            self_address,
            OwnedEntrypointName::new_unchecked(RECEIVE_HOOK.into()),
        ),
        amount,
    )?;
    let after = escrow_balance(host, token, self_address)?;
    after
        .checked_sub(before)
        .ok_or(CustomContractError::InvokeTransferError)
}

fn transfer_token<T>(
    host: &mut impl HasHost<T>,
    token: &TokenRef,
    from: Address,
    to: Receiver,
    amount: RawAmount,
) -> Result<(), CustomContractError> {
    let params = TransferParams::from(vec![Transfer {
        token_id: token.id.clone(),
        amount: TokenAmountU64(amount),
        from,
        to,
        data: AdditionalData::empty(),
    }]);
    host.invoke_contract(
        &token.contract,
        &params,
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(|_| CustomContractError::InvokeTransferError)?;
    Ok(())
}

fn escrow_balance<T>(
    host: &impl HasHost<T>,
    token: &TokenRef,
    holder: ContractAddress,
) -> Result<RawAmount, CustomContractError> {
    let params = BalanceOfQueryParams {
        queries: vec![BalanceOfQuery {
            token_id: token.id.clone(),
            address: Address::Contract(holder),
        }],
    };
    let mut response = host
        .invoke_contract_read_only(
            &token.contract,
            &params,
            EntrypointName::new_unchecked("balanceOf"),
            Amount::zero(),
        )
        .map_err(|_| CustomContractError::InvokeTransferError)?
        .ok_or(CustomContractError::InvokeTransferError)?;
    let amounts = BalanceOfQueryResponse::<TokenAmountU64>::deserial(&mut response)
        .map_err(|_| CustomContractError::InvokeTransferError)?;
    amounts
        .0
        .first()
        .map(|amount| amount.0)
        .ok_or(CustomContractError::InvokeTransferError)
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::checking_mock;
    use concordium_std::test_infrastructure::*;
    use core::cell::Cell;

    const PAYMENT_TOKEN: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 9,
        subindex: 0,
    };

    const BIDDER: AccountAddress = AccountAddress([16; 32]);

    fn payment_token() -> TokenRef {
        TokenRef {
            contract: PAYMENT_TOKEN,
            id: TokenIdVec(vec![0]),
        }
    }

    fn empty_host() -> TestHost<()> {
        TestHost::new((), TestStateBuilder::new())
    }

    /// balanceOf answers `first` on the first call and `second` after.
    fn balance_sequence_mock<S>(first: u64, second: u64) -> MockFn<S> {
        let calls = Cell::new(0u32);
        MockFn::new(move |parameter, _amount, _balance, _state| {
            BalanceOfQueryParams::<TokenIdVec>::deserial(&mut Cursor::new(parameter))
                .map_err(|_| CallContractError::Trap)?;
            let n = calls.get();
            calls.set(n + 1);
            let balance = if n == 0 { first } else { second };
            Ok((
                false,
                Some(BalanceOfQueryResponse::from(vec![TokenAmountU64(balance)])),
            ))
        })
    }

    #[concordium_test]
    fn test_push_ccd_delivers() {
        let mut host = empty_host();
        host.set_self_balance(Amount::from_micro_ccd(1_000));

        let outcome = push_ccd(&mut host, BIDDER, 150);
        claim!(matches!(outcome, PushOutcome::Delivered));
        claim!(host.transfer_occurred(&BIDDER, Amount::from_micro_ccd(150)));
    }

    #[concordium_test]
    fn test_push_ccd_defers_on_failure() {
        let mut host = empty_host();
        // Nothing in the contract balance, so the transfer cannot land.
        let outcome = push_ccd(&mut host, BIDDER, 150);
        claim!(matches!(outcome, PushOutcome::Deferred(150)));
    }

    #[concordium_test]
    fn test_pull_token_reports_received_delta() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            balance_sequence_mock(100, 195),
        );
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            checking_mock::<TransferParams<TokenIdVec, TokenAmountU64>, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].from == Address::Account(BIDDER)
                        && params.0[0].amount == TokenAmountU64(100)
                },
                (),
            ),
        );

        // The token withheld a 5 unit transfer fee.
        let received = pull_token(&mut host, &payment_token(), BIDDER, SELF_ADDRESS, 100);
        claim_eq!(received, Ok(95));
    }

    #[concordium_test]
    fn test_push_token_hard_fails() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            MockFn::new(|_parameter, _amount, _balance, _state| {
                Err::<(bool, Option<()>), _>(CallContractError::Trap)
            }),
        );

        let response = push_token(&mut host, &payment_token(), SELF_ADDRESS, BIDDER, 50);
        claim_eq!(response, Err(CustomContractError::InvokeTransferError));
    }
}
