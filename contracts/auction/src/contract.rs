use commons::{
    AuthorityAction, AuthorityViewParams, BasisPoints, Currency, CustomContractError, LotId,
    PendingKey, RawAmount, TokenRef, MAX_FEE_RATE,
};
use concordium_cis2::TokenAmountU64;
use concordium_std::*;

use crate::asset::{self, AssetClass};
use crate::events::AuctionEvent;
use crate::external::*;
use crate::payment;
use crate::state::State;
use crate::AuctionLot;

/// Initialize the auction contract with an empty lot table.
#[init(contract = "EscrowAuction", parameter = "InitParams")]
fn contract_init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params = InitParams::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        params.fee_rate <= MAX_FEE_RATE,
        CustomContractError::InvalidFeeRate.into()
    );
    Ok(State::new(
        state_builder,
        ctx.init_origin(),
        params.fee_rate,
        params.min_delta,
    ))
}

/// Register a new lot. The asset stays with the creator until settlement,
/// so this contract must already be an operator of the creator on the
/// asset contract.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "createLot",
    parameter = "CreateLotParams",
    enable_logger
)]
fn contract_create_lot<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = CreateLotParams::deserial(&mut ctx.parameter_cursor())?;
    let creator = match ctx.sender() {
        Address::Account(creator) => creator,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let slot_time = ctx.metadata().slot_time();

    ensure!(
        host.state().is_whitelisted(&params.currency),
        CustomContractError::CurrencyNotWhitelisted.into()
    );
    ensure!(
        params.min_bid_delta >= host.state().min_delta,
        CustomContractError::IncrementBelowFloor.into()
    );
    ensure!(
        params.quantity != TokenAmountU64(0),
        CustomContractError::InvalidQuantity.into()
    );
    ensure!(
        params.start_offset.millis() != 0,
        CustomContractError::InvalidTimeWindow.into()
    );
    ensure!(
        params.end_offset > params.start_offset,
        CustomContractError::InvalidTimeWindow.into()
    );
    ensure!(
        params.start_price < params.buy_now_price,
        CustomContractError::InvalidPriceBounds.into()
    );

    // Unit-class assets carry single-unit semantics.
    if asset::asset_class(host, &params.asset.contract)? == AssetClass::Unit {
        ensure!(
            params.quantity == TokenAmountU64(1),
            CustomContractError::InvalidQuantity.into()
        );
    }
    ensure!(
        asset::is_operator_of(host, &params.asset.contract, creator, ctx.self_address())?,
        CustomContractError::NotAuthorized.into()
    );

    let start = slot_time
        .checked_add(params.start_offset)
        .ok_or(CustomContractError::Overflow)?;
    let end = slot_time
        .checked_add(params.end_offset)
        .ok_or(CustomContractError::Overflow)?;

    let lot = AuctionLot::open(
        params.asset.clone(),
        params.quantity,
        creator,
        params.currency.clone(),
        params.buy_now_price,
        params.start_price,
        params.min_bid_delta,
        start,
        end,
    );
    let lot_id = host.state_mut().add_lot(lot)?;

    logger.log(&AuctionEvent::lot_created(
        lot_id,
        &params.asset,
        &creator,
        params.quantity,
        &params.currency,
        params.buy_now_price,
        params.start_price,
        params.min_bid_delta,
        start,
        end,
    ))?;

    Ok(())
}

/// Place a bid. CCD bids attach the full amount; payment token bids are
/// pulled from the bidder, and the actually received amount is the
/// effective bid. Accepting a bid refunds the displaced leader.
#[receive(
    mutable,
    payable,
    contract = "EscrowAuction",
    name = "bid",
    parameter = "BidParams",
    enable_logger
)]
fn contract_bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = BidParams::deserial(&mut ctx.parameter_cursor())?;
    let bidder = match ctx.sender() {
        Address::Account(bidder) => bidder,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let slot_time = ctx.metadata().slot_time();

    // Latch against re-entry through payment token callbacks. A rejection
    // anywhere below reverts the latch together with the rest of state.
    host.state_mut().acquire_bid_lock()?;

    let currency = host
        .state()
        .check_bid(params.lot_id, bidder, params.amount, slot_time)?;

    let effective = match &currency {
        Currency::Ccd => {
            ensure!(
                amount == Amount::from_micro_ccd(params.amount),
                CustomContractError::AttachedAmountMismatch.into()
            );
            params.amount
        }
        Currency::Cis2(token) => {
            ensure!(
                amount == Amount::zero(),
                CustomContractError::AttachedAmountMismatch.into()
            );
            payment::pull_token(host, token, bidder, ctx.self_address(), params.amount)?
        }
    };

    let outgoing = host.state_mut().bid(params.lot_id, bidder, effective)?;

    logger.log(&AuctionEvent::bid_accepted(params.lot_id, &bidder, effective))?;

    // Refund the displaced leader out of escrow.
    if let Some(previous) = outgoing {
        payment::push_or_defer(
            host,
            logger,
            ctx.self_address(),
            params.lot_id,
            &currency,
            previous.bidder,
            previous.amount,
        )?;
    }

    host.state_mut().release_bid_lock();
    Ok(())
}

/// Edit a lot that has not finished. Fields equal to their stored value
/// are left untouched; the rest update under their field-specific guards.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "editLot",
    parameter = "EditLotParams",
    enable_logger
)]
fn contract_edit_lot<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = EditLotParams::deserial(&mut ctx.parameter_cursor())?;
    let caller = match ctx.sender() {
        Address::Account(caller) => caller,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let slot_time = ctx.metadata().slot_time();

    host.state_mut()
        .edit_lot(params.lot_id, caller, &params, slot_time)?;

    let lot = host.state().lot(params.lot_id)?;
    logger.log(&AuctionEvent::lot_edited(
        params.lot_id,
        lot.buy_now_price,
        lot.start_price,
        lot.min_bid_delta,
        lot.start,
        lot.end,
    ))?;

    Ok(())
}

/// One-shot anti-sniping extension of the end time, capped at 30 days.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "extend",
    parameter = "ExtendParams",
    enable_logger
)]
fn contract_extend<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = ExtendParams::deserial(&mut ctx.parameter_cursor())?;
    let caller = match ctx.sender() {
        Address::Account(caller) => caller,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let slot_time = ctx.metadata().slot_time();

    let end = host
        .state_mut()
        .extend(params.lot_id, caller, params.end, slot_time)?;

    logger.log(&AuctionEvent::lot_extended(params.lot_id, end))?;
    Ok(())
}

/// Remove a lot that was never bid on.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "deleteLot",
    parameter = "LotId",
    enable_logger
)]
fn contract_delete_lot<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let lot_id = LotId::deserial(&mut ctx.parameter_cursor())?;
    let caller = match ctx.sender() {
        Address::Account(caller) => caller,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };

    host.state_mut().delete_lot(lot_id, caller)?;

    logger.log(&AuctionEvent::lot_deleted(lot_id))?;
    Ok(())
}

/// Finalize a lot once its end condition is reached. Callable only by the
/// winner, who attaches the royalty on top of the escrowed bid for CCD
/// lots. The lot record is deleted before any external transfer, so a
/// re-entrant call cannot settle twice.
#[receive(
    mutable,
    payable,
    contract = "EscrowAuction",
    name = "settle",
    parameter = "LotId",
    enable_logger
)]
fn contract_settle<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let lot_id = LotId::deserial(&mut ctx.parameter_cursor())?;
    let winner = match ctx.sender() {
        Address::Account(winner) => winner,
        Address::Contract(_) => bail!(CustomContractError::OnlyAccountAddress.into()),
    };
    let slot_time = ctx.metadata().slot_time();

    let lot = host.state_mut().begin_settlement(lot_id, winner, slot_time)?;

    let fee = host.state().fee_rate.share_of(lot.leading_bid);
    host.state_mut().accrue_fee(lot.currency.clone(), fee);
    let net = lot.leading_bid - fee;

    payment::push_or_defer(
        host,
        logger,
        ctx.self_address(),
        lot_id,
        &lot.currency,
        lot.creator,
        net,
    )?;

    let royalty = asset::royalty_info(host, &lot.asset, lot.leading_bid)?;
    let royalty_amount = royalty.as_ref().map(|info| info.amount).unwrap_or(0);
    match &lot.currency {
        Currency::Ccd => {
            // The royalty rides on top of the escrowed bid, attached by
            // the winner. Zero royalty means zero attached.
            ensure!(
                amount == Amount::from_micro_ccd(royalty_amount),
                CustomContractError::RoyaltyMismatch.into()
            );
            if let Some(info) = &royalty {
                if info.amount > 0 {
                    payment::push_or_defer(
                        host,
                        logger,
                        ctx.self_address(),
                        lot_id,
                        &lot.currency,
                        info.receiver,
                        info.amount,
                    )?;
                }
            }
        }
        Currency::Cis2(token) => {
            ensure!(
                amount == Amount::zero(),
                CustomContractError::AttachedAmountMismatch.into()
            );
            if let Some(info) = &royalty {
                if info.amount > 0 {
                    let received =
                        payment::pull_token(host, token, winner, ctx.self_address(), info.amount)?;
                    payment::push_token(
                        host,
                        token,
                        ctx.self_address(),
                        info.receiver,
                        received,
                    )?;
                }
            }
        }
    }

    asset::transfer(host, &lot.asset, lot.creator, winner, lot.quantity)?;

    logger.log(&AuctionEvent::lot_settled(
        lot_id,
        &winner,
        &lot.creator,
        lot.leading_bid,
        fee,
        royalty_amount,
    ))?;

    Ok(())
}

/// Pay out a pending balance on a payee's behalf. No fallback: a failed
/// push rejects and the credit survives.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "reclaimPending",
    parameter = "ReclaimParams",
    enable_logger
)]
fn contract_reclaim_pending<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let params = ReclaimParams::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );

    let owed = host
        .state_mut()
        .take_pending(params.payee, params.lot_id)?;
    host.invoke_transfer(&params.destination, Amount::from_micro_ccd(owed))
        .map_err(CustomContractError::from)?;

    logger.log(&AuctionEvent::pending_paid(
        params.lot_id,
        &params.payee,
        &params.destination,
        owed,
    ))?;
    Ok(())
}

/// Withdraw the fees accrued in one currency.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "withdrawFees",
    parameter = "WithdrawFeesParams"
)]
fn contract_withdraw_fees<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let params = WithdrawFeesParams::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );

    let total = host.state_mut().take_fees(&params.currency)?;
    match &params.currency {
        Currency::Ccd => host
            .invoke_transfer(&params.destination, Amount::from_micro_ccd(total))
            .map_err(CustomContractError::from)?,
        Currency::Cis2(token) => payment::push_token(
            host,
            token,
            ctx.self_address(),
            params.destination,
            total,
        )?,
    }
    Ok(())
}

#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "setFeeRate",
    parameter = "BasisPoints",
    enable_logger
)]
fn contract_set_fee_rate<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ReceiveResult<()> {
    let rate = BasisPoints::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    host.state_mut().set_fee_rate(rate)?;
    logger.log(&AuctionEvent::fee_rate_changed(rate))?;
    Ok(())
}

#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "setMinDelta",
    parameter = "RawAmount"
)]
fn contract_set_min_delta<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let min_delta = RawAmount::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    host.state_mut().set_min_delta(min_delta);
    Ok(())
}

/// Make a payment token eligible as lot currency. CCD is implicitly
/// eligible and not representable here.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "whitelistCurrency",
    parameter = "TokenRef"
)]
fn contract_whitelist_currency<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let token = TokenRef::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    host.state_mut().whitelist_currency(token);
    Ok(())
}

#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "removeCurrency",
    parameter = "TokenRef"
)]
fn contract_remove_currency<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let token = TokenRef::deserial(&mut ctx.parameter_cursor())?;
    ensure!(
        host.state().authority.has_maintainer_rights(&ctx.sender()),
        CustomContractError::Unauthorized.into()
    );
    host.state_mut().remove_currency(&token);
    Ok(())
}

/// Function to manage addresses that are allowed to maintain and modify
/// the state of the contract.
#[receive(
    mutable,
    contract = "EscrowAuction",
    name = "updateAuthority",
    parameter = "AuthorityAction"
)]
fn contract_update_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    let action = AuthorityAction::deserial(&mut ctx.parameter_cursor())?;
    let sender = ctx.sender();
    host.state_mut().authority.handle_update(sender, action)?;
    Ok(())
}

#[receive(
    contract = "EscrowAuction",
    name = "viewAuthority",
    parameter = "AuthorityViewParams",
    return_value = "Vec<Address>"
)]
fn contract_view_authority<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<Vec<Address>> {
    let params = AuthorityViewParams::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().authority.handle_view(params))
}

#[receive(
    contract = "EscrowAuction",
    name = "viewLot",
    parameter = "LotId",
    return_value = "AuctionLot"
)]
fn contract_view_lot<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<AuctionLot> {
    let lot_id = LotId::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().lot(lot_id)?)
}

#[receive(
    contract = "EscrowAuction",
    name = "viewPending",
    parameter = "PendingKey",
    return_value = "RawAmount"
)]
fn contract_view_pending<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<RawAmount> {
    let key = PendingKey::deserial(&mut ctx.parameter_cursor())?;
    Ok(host.state().pending_amount(&key))
}

#[receive(
    contract = "EscrowAuction",
    name = "viewConfig",
    return_value = "ConfigView"
)]
fn contract_view_config<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<ConfigView> {
    let state = host.state();
    Ok(ConfigView {
        fee_rate: state.fee_rate,
        min_delta: state.min_delta,
        next_lot_id: state.next_lot_id,
    })
}

/// Hook invoked by CIS-2 contracts when tokens arrive in escrow.
#[receive(contract = "EscrowAuction", name = "onReceivingCIS2")]
fn contract_on_cis2_received<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    _host: &impl HasHost<State<S>, StateApiType = S>,
) -> ReceiveResult<()> {
    ensure!(
        matches!(ctx.sender(), Address::Contract(_)),
        CustomContractError::ContractOnly.into()
    );
    Ok(())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use commons::{
        RoyaltyQueryResponse, BID_ACCEPTED_TAG, FEE_RATE_CHANGED_TAG, LOT_CREATED_TAG,
        LOT_DELETED_TAG, LOT_EDITED_TAG, LOT_EXTENDED_TAG, LOT_SETTLED_TAG, PENDING_PAID_TAG,
        PENDING_RECORDED_TAG,
    };
    use concordium_cis2::*;
    use concordium_std::test_infrastructure::*;
    use core::cell::Cell;

    const ASSET_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const PAYMENT_TOKEN: ContractAddress = ContractAddress {
        index: 2,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 9,
        subindex: 0,
    };

    const ADMIN: AccountAddress = AccountAddress([1; 32]);
    const CREATOR: AccountAddress = AccountAddress([2; 32]);
    const RIGHTS_HOLDER: AccountAddress = AccountAddress([3; 32]);
    const MAINTAINER: AccountAddress = AccountAddress([4; 32]);

    const BIDDER_1: AccountAddress = AccountAddress([16; 32]);
    const BIDDER_2: AccountAddress = AccountAddress([17; 32]);

    const DAY_MS: u64 = 24 * 60 * 60 * 1_000;

    /// Creation time of the default lot.
    const T_CREATE: u64 = 10_000;
    /// Start of the default lot: creation + 1s offset.
    const T_START: u64 = 11_000;
    /// Some slot time with the default lot open for bids.
    const T_ACTIVE: u64 = 12_000;
    /// End of the default lot: creation + 1h offset.
    const T_END: u64 = 3_610_000;
    const T_AFTER_END: u64 = 3_700_000;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_timestamp_millis(millis)
    }

    fn asset() -> TokenRef {
        TokenRef {
            contract: ASSET_CONTRACT,
            id: TokenIdVec(vec![7]),
        }
    }

    fn payment_token() -> TokenRef {
        TokenRef {
            contract: PAYMENT_TOKEN,
            id: TokenIdVec(vec![0]),
        }
    }

    fn default_host() -> TestHost<State<TestStateApi>> {
        let mut ctx = TestInitContext::empty();
        let params = InitParams {
            fee_rate: BasisPoints::new(500),
            min_delta: 5,
        };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();
        let state =
            contract_init(&ctx, &mut state_builder).expect_report("Failed to init EscrowAuction");
        TestHost::new(state, state_builder)
    }

    fn mock_asset_standards(host: &mut TestHost<State<TestStateApi>>, cis2: bool, cis1: bool) {
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("supports".into()),
            MockFn::new(move |parameter, _amount, _balance, _state| {
                SupportsQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                let result_of = |supported| {
                    if supported {
                        SupportResult::Support
                    } else {
                        SupportResult::NoSupport
                    }
                };
                Ok((
                    false,
                    Some(SupportsQueryResponse {
                        results: vec![result_of(cis2), result_of(cis1)],
                    }),
                ))
            }),
        );
    }

    fn mock_asset_operator(host: &mut TestHost<State<TestStateApi>>, approved: bool) {
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("operatorOf".into()),
            MockFn::new(move |parameter, _amount, _balance, _state| {
                OperatorOfQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                Ok((false, Some(OperatorOfQueryResponse::from(vec![approved]))))
            }),
        );
    }

    fn mock_asset_transfer(host: &mut TestHost<State<TestStateApi>>) {
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            answering_mock::<TransferParams<TokenIdVec, TokenAmountU64>, _>(()),
        );
    }

    fn mock_royalty(host: &mut TestHost<State<TestStateApi>>, receiver: AccountAddress, amount: u64) {
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("royaltyInfo".into()),
            answering_mock::<commons::RoyaltyQueryParams, _>(RoyaltyQueryResponse {
                receiver,
                amount,
            }),
        );
    }

    fn mock_no_royalty(host: &mut TestHost<State<TestStateApi>>) {
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("royaltyInfo".into()),
            missing_entrypoint_mock(),
        );
    }

    fn mock_payment_transfer(host: &mut TestHost<State<TestStateApi>>) {
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            answering_mock::<TransferParams<TokenIdVec, TokenAmountU64>, _>(()),
        );
    }

    /// balanceOf mock answering the scripted balances call by call.
    fn mock_payment_balances(host: &mut TestHost<State<TestStateApi>>, script: Vec<u64>) {
        let calls = Cell::new(0usize);
        host.setup_mock_entrypoint(
            PAYMENT_TOKEN,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            MockFn::new(move |parameter, _amount, _balance, _state| {
                BalanceOfQueryParams::<TokenIdVec>::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                let n = calls.get();
                calls.set(n + 1);
                let balance = script.get(n).copied().ok_or(CallContractError::Trap)?;
                Ok((
                    false,
                    Some(BalanceOfQueryResponse::from(vec![TokenAmountU64(balance)])),
                ))
            }),
        );
    }

    fn default_lot_params() -> CreateLotParams {
        CreateLotParams {
            asset: asset(),
            quantity: TokenAmountU64(1),
            currency: Currency::Ccd,
            buy_now_price: 1_000,
            start_price: 100,
            start_offset: Duration::from_millis(1_000),
            end_offset: Duration::from_millis(3_600_000),
            min_bid_delta: 10,
        }
    }

    fn try_create_lot(
        host: &mut TestHost<State<TestStateApi>>,
        params: &CreateLotParams,
    ) -> ReceiveResult<()> {
        let bytes = to_bytes(params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(CREATOR))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(at(T_CREATE))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        host.with_rollback(|host| contract_create_lot(&ctx, host, &mut logger))
    }

    fn create_default_lot(host: &mut TestHost<State<TestStateApi>>) -> LotId {
        mock_asset_standards(host, true, false);
        mock_asset_operator(host, true);
        let result = try_create_lot(host, &default_lot_params());
        claim_eq!(result, Ok(()));
        LotId(host.state().next_lot_id - 1)
    }

    fn place_ccd_bid_attaching(
        host: &mut TestHost<State<TestStateApi>>,
        lot_id: LotId,
        bidder: AccountAddress,
        declared: RawAmount,
        attached: Amount,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        let params = BidParams {
            lot_id,
            amount: declared,
        };
        let bytes = to_bytes(&params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(bidder))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(at(slot_millis))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = host.with_rollback(|host| contract_bid(&ctx, host, attached, &mut logger));
        (result, logger)
    }

    fn place_ccd_bid(
        host: &mut TestHost<State<TestStateApi>>,
        lot_id: LotId,
        bidder: AccountAddress,
        amount: RawAmount,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        place_ccd_bid_attaching(
            host,
            lot_id,
            bidder,
            amount,
            Amount::from_micro_ccd(amount),
            slot_millis,
        )
    }

    fn place_token_bid(
        host: &mut TestHost<State<TestStateApi>>,
        lot_id: LotId,
        bidder: AccountAddress,
        amount: RawAmount,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        place_ccd_bid_attaching(host, lot_id, bidder, amount, Amount::zero(), slot_millis)
    }

    fn settle(
        host: &mut TestHost<State<TestStateApi>>,
        lot_id: LotId,
        caller: AccountAddress,
        attached: Amount,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        let bytes = to_bytes(&lot_id);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(caller))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(at(slot_millis))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = host.with_rollback(|host| contract_settle(&ctx, host, attached, &mut logger));
        (result, logger)
    }

    fn edit_lot(
        host: &mut TestHost<State<TestStateApi>>,
        caller: AccountAddress,
        params: &EditLotParams,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        let bytes = to_bytes(params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(caller))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(at(slot_millis))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = host.with_rollback(|host| contract_edit_lot(&ctx, host, &mut logger));
        (result, logger)
    }

    /// Stored lot terms as edit parameters; mutate a field to edit it.
    fn edit_params(host: &TestHost<State<TestStateApi>>, lot_id: LotId) -> EditLotParams {
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        EditLotParams {
            lot_id,
            buy_now_price: lot.buy_now_price,
            start_price: lot.start_price,
            start: lot.start,
            end: lot.end,
            min_bid_delta: lot.min_bid_delta,
        }
    }

    fn extend_lot(
        host: &mut TestHost<State<TestStateApi>>,
        caller: AccountAddress,
        lot_id: LotId,
        end: Timestamp,
        slot_millis: u64,
    ) -> (ReceiveResult<()>, TestLogger) {
        let params = ExtendParams { lot_id, end };
        let bytes = to_bytes(&params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(caller))
            .set_metadata_slot_time(at(slot_millis))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = host.with_rollback(|host| contract_extend(&ctx, host, &mut logger));
        (result, logger)
    }

    fn whitelist_payment_token(host: &mut TestHost<State<TestStateApi>>) {
        let bytes = to_bytes(&payment_token());
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        claim_eq!(contract_whitelist_currency(&ctx, host), Ok(()));
    }

    #[concordium_test]
    fn test_init_rejects_excessive_fee_rate() {
        let mut ctx = TestInitContext::empty();
        let params = InitParams {
            fee_rate: BasisPoints::new(1_501),
            min_delta: 5,
        };
        let bytes = to_bytes(&params);
        ctx.set_init_origin(ADMIN).set_parameter(&bytes);
        let mut state_builder = TestStateBuilder::new();
        let result = contract_init(&ctx, &mut state_builder);
        claim!(result.is_err());
    }

    #[concordium_test]
    fn test_create_lot() {
        let mut host = default_host();
        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);

        let params = default_lot_params();
        let bytes = to_bytes(&params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(CREATOR))
            .set_self_address(SELF_ADDRESS)
            .set_metadata_slot_time(at(T_CREATE))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();

        let result = contract_create_lot(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_CREATED_TAG);

        let lot = host.state().lot(LotId(0)).expect_report("Missing lot");
        claim_eq!(lot.creator, CREATOR);
        claim_eq!(lot.currency, Currency::Ccd);
        claim_eq!(lot.start, at(T_START));
        claim_eq!(lot.end, at(T_END));
        claim_eq!(lot.leading_bid, 0);
        claim!(lot.leading_bidder.is_none());
        claim!(!lot.extended);
        claim_eq!(host.state().next_lot_id, 1);
    }

    #[concordium_test]
    fn test_create_lot_validation() {
        let mut host = default_host();

        let mut params = default_lot_params();
        params.currency = Currency::Cis2(payment_token());
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::CurrencyNotWhitelisted.into())
        );

        let mut params = default_lot_params();
        params.min_bid_delta = 4;
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::IncrementBelowFloor.into())
        );

        let mut params = default_lot_params();
        params.quantity = TokenAmountU64(0);
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::InvalidQuantity.into())
        );

        let mut params = default_lot_params();
        params.start_offset = Duration::from_millis(0);
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::InvalidTimeWindow.into())
        );

        let mut params = default_lot_params();
        params.end_offset = params.start_offset;
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::InvalidTimeWindow.into())
        );

        let mut params = default_lot_params();
        params.start_price = params.buy_now_price;
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::InvalidPriceBounds.into())
        );
    }

    #[concordium_test]
    fn test_create_lot_asset_checks() {
        // Unit class assets only admit single-unit lots.
        let mut host = default_host();
        mock_asset_standards(&mut host, false, true);
        mock_asset_operator(&mut host, true);
        let mut params = default_lot_params();
        params.quantity = TokenAmountU64(2);
        claim_eq!(
            try_create_lot(&mut host, &params),
            Err(CustomContractError::InvalidQuantity.into())
        );
        claim_eq!(try_create_lot(&mut host, &default_lot_params()), Ok(()));

        // Batch class admits larger quantities.
        let mut host = default_host();
        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);
        let mut params = default_lot_params();
        params.quantity = TokenAmountU64(25);
        claim_eq!(try_create_lot(&mut host, &params), Ok(()));

        // Neither standard: the asset cannot be auctioned.
        let mut host = default_host();
        mock_asset_standards(&mut host, false, false);
        mock_asset_operator(&mut host, true);
        claim_eq!(
            try_create_lot(&mut host, &default_lot_params()),
            Err(CustomContractError::UnsupportedAsset.into())
        );

        // Missing operator approval.
        let mut host = default_host();
        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, false);
        claim_eq!(
            try_create_lot(&mut host, &default_lot_params()),
            Err(CustomContractError::NotAuthorized.into())
        );
    }

    #[concordium_test]
    fn test_first_bid_must_exceed_start_price() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 90, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));

        // The start price itself is not enough; the rule is strict.
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 100, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));

        let (result, logger) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], BID_ACCEPTED_TAG);

        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bidder, Some(BIDDER_1));
        claim_eq!(lot.leading_bid, 150);
    }

    #[concordium_test]
    fn test_later_bids_must_clear_increment() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 155, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 160, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::BidTooLow.into()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 161, T_ACTIVE);
        claim_eq!(result, Ok(()));

        // The displaced leader got its escrowed bid back.
        claim!(host.transfer_occurred(&BIDDER_1, Amount::from_micro_ccd(150)));
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bidder, Some(BIDDER_2));
        claim_eq!(lot.leading_bid, 161);
    }

    #[concordium_test]
    fn test_buy_now_short_circuits() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_001, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AboveBuyNow.into()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_000, T_ACTIVE);
        claim_eq!(result, Ok(()));
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim!(lot.is_bought_out());

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 1_000, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AuctionFinished.into()));
    }

    #[concordium_test]
    fn test_bid_admission_guards() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));

        let (result, _) = place_ccd_bid(&mut host, LotId(99), BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::UnknownLot.into()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, CREATOR, 150, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::CreatorForbidden.into()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_START - 500);
        claim_eq!(result, Err(CustomContractError::AuctionNotStarted.into()));

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::AuctionFinished.into()));

        let (result, _) = place_ccd_bid_attaching(
            &mut host,
            lot_id,
            BIDDER_1,
            150,
            Amount::from_micro_ccd(149),
            T_ACTIVE,
        );
        claim_eq!(
            result,
            Err(CustomContractError::AttachedAmountMismatch.into())
        );

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 200, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AlreadyLeading.into()));
    }

    #[concordium_test]
    fn test_bid_lock_blocks_nested_entry() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.state_mut()
            .acquire_bid_lock()
            .expect_report("Lock was free");

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::ReentrancyGuard.into()));
    }

    #[concordium_test]
    fn test_failed_refund_becomes_pending_payment() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        // Empty contract balance: the refund push cannot land, so the bid
        // must still be accepted and the refund deferred.
        let (result, logger) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 161, T_ACTIVE);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 2);
        claim_eq!(logger.logs[0][0], BID_ACCEPTED_TAG);
        claim_eq!(logger.logs[1][0], PENDING_RECORDED_TAG);

        let key = PendingKey {
            payee: BIDDER_1,
            lot_id,
        };
        claim_eq!(host.state().pending_amount(&key), 150);
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bidder, Some(BIDDER_2));
    }

    #[concordium_test]
    fn test_reclaim_pending() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_2, 161, T_ACTIVE);
        claim_eq!(result, Ok(()));

        let params = ReclaimParams {
            lot_id,
            payee: BIDDER_1,
            destination: BIDDER_1,
        };
        let bytes = to_bytes(&params);

        // Only maintainers or admins can push pending payments out.
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result =
            host.with_rollback(|host| contract_reclaim_pending(&ctx, host, &mut logger));
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result =
            host.with_rollback(|host| contract_reclaim_pending(&ctx, host, &mut logger));
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&BIDDER_1, Amount::from_micro_ccd(150)));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], PENDING_PAID_TAG);
        let key = PendingKey {
            payee: BIDDER_1,
            lot_id,
        };
        claim_eq!(host.state().pending_amount(&key), 0);

        // The balance was zeroed; a second reclaim has nothing to pay.
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result =
            host.with_rollback(|host| contract_reclaim_pending(&ctx, host, &mut logger));
        claim_eq!(result, Err(CustomContractError::NothingPending.into()));
    }

    #[concordium_test]
    fn test_extend_caps_and_single_use() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let (result, _) = extend_lot(
            &mut host,
            CREATOR,
            lot_id,
            at(T_END + 31 * DAY_MS),
            T_ACTIVE,
        );
        claim_eq!(result, Err(CustomContractError::ExtensionTooLong.into()));

        let (result, _) = extend_lot(&mut host, BIDDER_1, lot_id, at(T_END + DAY_MS), T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let (result, _) = extend_lot(&mut host, CREATOR, lot_id, at(T_END), T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::InvalidTimeWindow.into()));

        let new_end = at(T_END + 29 * DAY_MS);
        let (result, logger) = extend_lot(&mut host, CREATOR, lot_id, new_end, T_ACTIVE);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_EXTENDED_TAG);
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.end, new_end);
        claim!(lot.extended);

        let (result, _) = extend_lot(
            &mut host,
            CREATOR,
            lot_id,
            at(T_END + 30 * DAY_MS),
            T_ACTIVE,
        );
        claim_eq!(result, Err(CustomContractError::AlreadyExtended.into()));
    }

    #[concordium_test]
    fn test_extend_boundary_is_inclusive() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let (result, _) = extend_lot(
            &mut host,
            CREATOR,
            lot_id,
            at(T_END + 30 * DAY_MS),
            T_ACTIVE,
        );
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_edit_lot_fields() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        // Full edit before the lot starts.
        let mut params = edit_params(&host, lot_id);
        params.buy_now_price = 2_000;
        params.start_price = 200;
        params.start = at(T_START + 500);
        params.min_bid_delta = 20;
        let (result, logger) = edit_lot(&mut host, CREATOR, &params, T_CREATE + 500);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_EDITED_TAG);

        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.buy_now_price, 2_000);
        claim_eq!(lot.start_price, 200);
        claim_eq!(lot.start, at(T_START + 500));
        claim_eq!(lot.min_bid_delta, 20);
        claim!(!lot.extended);

        let params = edit_params(&host, lot_id);
        let (result, _) = edit_lot(&mut host, BIDDER_1, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        // Start time is frozen once it has elapsed.
        let mut params = edit_params(&host, lot_id);
        params.start = at(T_START + 900);
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AlreadyStarted.into()));

        let mut params = edit_params(&host, lot_id);
        params.min_bid_delta = 4;
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::IncrementBelowFloor.into()));

        let mut params = edit_params(&host, lot_id);
        params.start_price = params.buy_now_price;
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::InvalidPriceBounds.into()));
    }

    #[concordium_test]
    fn test_edit_start_price_frozen_after_bid() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        let mut params = edit_params(&host, lot_id);
        params.start_price = 300;
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::LotHasBids.into()));
    }

    #[concordium_test]
    fn test_edit_end_time_routes_through_extension() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let mut params = edit_params(&host, lot_id);
        params.end = at(T_END + 31 * DAY_MS);
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::ExtensionTooLong.into()));

        let mut params = edit_params(&host, lot_id);
        params.end = at(T_END + 29 * DAY_MS);
        let (result, logger) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Ok(()));
        // One record per call: the edit, not a separate extension.
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_EDITED_TAG);
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim!(lot.extended);

        let (result, _) = extend_lot(
            &mut host,
            CREATOR,
            lot_id,
            at(T_END + 30 * DAY_MS),
            T_ACTIVE,
        );
        claim_eq!(result, Err(CustomContractError::AlreadyExtended.into()));
    }

    #[concordium_test]
    fn test_edit_rejected_once_finished() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let mut params = edit_params(&host, lot_id);
        params.buy_now_price = 2_000;
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::AuctionFinished.into()));

        // Bought out lots freeze the same way, even before the end time.
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_000, T_ACTIVE);
        claim_eq!(result, Ok(()));
        let (result, _) = edit_lot(&mut host, CREATOR, &params, T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AuctionFinished.into()));
    }

    #[concordium_test]
    fn test_delete_lot() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let bytes = to_bytes(&lot_id);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_delete_lot(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(CREATOR)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_delete_lot(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_DELETED_TAG);
        claim_eq!(
            host.state().lot(lot_id),
            Err(CustomContractError::UnknownLot)
        );

        // Deleting again: the record is gone.
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(CREATOR)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_delete_lot(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::UnknownLot.into()));
    }

    #[concordium_test]
    fn test_delete_lot_rejected_after_bid() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        let bytes = to_bytes(&lot_id);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(CREATOR)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_delete_lot(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::LotHasBids.into()));
    }

    #[concordium_test]
    fn test_settle_pays_fee_creator_and_royalty() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_000, T_ACTIVE);
        claim_eq!(result, Ok(()));

        mock_asset_transfer(&mut host);
        mock_royalty(&mut host, RIGHTS_HOLDER, 25);

        // Bought out: settlement is open before the end time. The winner
        // attaches the royalty on top of the escrowed bid.
        let (result, logger) = settle(
            &mut host,
            lot_id,
            BIDDER_1,
            Amount::from_micro_ccd(25),
            T_ACTIVE + 1_000,
        );
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_SETTLED_TAG);

        // 5% fee on 1000, the rest to the creator, royalty on top.
        claim!(host.transfer_occurred(&CREATOR, Amount::from_micro_ccd(950)));
        claim!(host.transfer_occurred(&RIGHTS_HOLDER, Amount::from_micro_ccd(25)));
        claim_eq!(
            host.state().fees.get(&Currency::Ccd).map(|total| *total),
            Some(50)
        );

        // The record is gone; settlement cannot run twice.
        claim_eq!(
            host.state().lot(lot_id),
            Err(CustomContractError::UnknownLot)
        );
        let (result, _) = settle(
            &mut host,
            lot_id,
            BIDDER_1,
            Amount::from_micro_ccd(25),
            T_AFTER_END,
        );
        claim_eq!(result, Err(CustomContractError::UnknownLot.into()));
    }

    #[concordium_test]
    fn test_settle_royalty_mismatch() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_000, T_ACTIVE);
        claim_eq!(result, Ok(()));

        mock_asset_transfer(&mut host);
        mock_royalty(&mut host, RIGHTS_HOLDER, 25);

        let (result, _) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::RoyaltyMismatch.into()));

        // The rejection reverted step one: the lot record is intact.
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bidder, Some(BIDDER_1));
    }

    #[concordium_test]
    fn test_settle_without_royalty_support() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        mock_asset_transfer(&mut host);
        mock_no_royalty(&mut host);

        // Attaching anything when no royalty is owed is a mismatch.
        let (result, _) = settle(
            &mut host,
            lot_id,
            BIDDER_1,
            Amount::from_micro_ccd(5),
            T_AFTER_END,
        );
        claim_eq!(result, Err(CustomContractError::RoyaltyMismatch.into()));

        let (result, _) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Ok(()));
        // floor(150 * 500 / 10000) = 7.
        claim!(host.transfer_occurred(&CREATOR, Amount::from_micro_ccd(143)));
        claim_eq!(
            host.state().fees.get(&Currency::Ccd).map(|total| *total),
            Some(7)
        );
    }

    #[concordium_test]
    fn test_settle_guards() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));

        mock_asset_transfer(&mut host);
        mock_no_royalty(&mut host);

        // End condition not reached and no buyout.
        let (result, _) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_ACTIVE);
        claim_eq!(result, Err(CustomContractError::AuctionStillActive.into()));

        // Only the leading bidder can settle.
        let (result, _) = settle(&mut host, lot_id, BIDDER_2, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::NotLeadingBidder.into()));
        let (result, _) = settle(&mut host, lot_id, CREATOR, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::NotLeadingBidder.into()));

        // Settlement opens exactly at the end time.
        let (result, _) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_END);
        claim_eq!(result, Ok(()));
    }

    #[concordium_test]
    fn test_settle_never_bid_lot_is_not_settleable() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        mock_asset_transfer(&mut host);
        mock_no_royalty(&mut host);

        let (result, _) = settle(&mut host, lot_id, CREATOR, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Err(CustomContractError::NotLeadingBidder.into()));
    }

    #[concordium_test]
    fn test_token_lot_bid_and_settle() {
        let mut host = default_host();
        whitelist_payment_token(&mut host);

        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);
        let mut params = default_lot_params();
        params.currency = Currency::Cis2(payment_token());
        claim_eq!(try_create_lot(&mut host, &params), Ok(()));
        let lot_id = LotId(0);

        // Escrow balance: 0 before the bid pull, 150 after; then the
        // royalty pull at settlement moves it from 150 to 175.
        mock_payment_balances(&mut host, vec![0, 150, 150, 175]);
        mock_payment_transfer(&mut host);

        let (result, logger) = place_token_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bid, 150);

        mock_asset_transfer(&mut host);
        mock_royalty(&mut host, RIGHTS_HOLDER, 25);

        let (result, logger) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], LOT_SETTLED_TAG);
        claim_eq!(
            host.state()
                .fees
                .get(&Currency::Cis2(payment_token()))
                .map(|total| *total),
            Some(7)
        );
        claim_eq!(
            host.state().lot(lot_id),
            Err(CustomContractError::UnknownLot)
        );
    }

    #[concordium_test]
    fn test_token_bid_effective_amount_is_received_amount() {
        let mut host = default_host();
        whitelist_payment_token(&mut host);

        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);
        let mut params = default_lot_params();
        params.currency = Currency::Cis2(payment_token());
        claim_eq!(try_create_lot(&mut host, &params), Ok(()));
        let lot_id = LotId(0);

        // The token withholds a 5 unit transfer fee on the way in.
        mock_payment_balances(&mut host, vec![0, 145]);
        mock_payment_transfer(&mut host);

        let (result, _) = place_token_bid(&mut host, lot_id, BIDDER_1, 150, T_ACTIVE);
        claim_eq!(result, Ok(()));
        let lot = host.state().lot(lot_id).expect_report("Missing lot");
        claim_eq!(lot.leading_bid, 145);
    }

    #[concordium_test]
    fn test_token_bid_rejects_attached_ccd() {
        let mut host = default_host();
        whitelist_payment_token(&mut host);

        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);
        let mut params = default_lot_params();
        params.currency = Currency::Cis2(payment_token());
        claim_eq!(try_create_lot(&mut host, &params), Ok(()));

        let (result, _) = place_ccd_bid_attaching(
            &mut host,
            LotId(0),
            BIDDER_1,
            150,
            Amount::from_micro_ccd(150),
            T_ACTIVE,
        );
        claim_eq!(
            result,
            Err(CustomContractError::AttachedAmountMismatch.into())
        );
    }

    #[concordium_test]
    fn test_withdraw_fees() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);
        host.set_self_balance(Amount::from_micro_ccd(1_000_000));
        let (result, _) = place_ccd_bid(&mut host, lot_id, BIDDER_1, 1_000, T_ACTIVE);
        claim_eq!(result, Ok(()));
        mock_asset_transfer(&mut host);
        mock_no_royalty(&mut host);
        let (result, _) = settle(&mut host, lot_id, BIDDER_1, Amount::zero(), T_AFTER_END);
        claim_eq!(result, Ok(()));

        let params = WithdrawFeesParams {
            currency: Currency::Ccd,
            destination: ADMIN,
        };
        let bytes = to_bytes(&params);

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        let result = host.with_rollback(|host| contract_withdraw_fees(&ctx, host));
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let result = host.with_rollback(|host| contract_withdraw_fees(&ctx, host));
        claim_eq!(result, Ok(()));
        claim!(host.transfer_occurred(&ADMIN, Amount::from_micro_ccd(50)));
        claim!(host.state().fees.get(&Currency::Ccd).is_none());

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let result = host.with_rollback(|host| contract_withdraw_fees(&ctx, host));
        claim_eq!(result, Err(CustomContractError::NothingAccrued.into()));
    }

    #[concordium_test]
    fn test_fee_rate_admin() {
        let mut host = default_host();

        let rate = BasisPoints::new(1_501);
        let bytes = to_bytes(&rate);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_set_fee_rate(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::InvalidFeeRate.into()));

        let rate = BasisPoints::new(300);
        let bytes = to_bytes(&rate);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_set_fee_rate(&ctx, &mut host, &mut logger);
        claim_eq!(result, Err(CustomContractError::Unauthorized.into()));

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let mut logger = TestLogger::init();
        let result = contract_set_fee_rate(&ctx, &mut host, &mut logger);
        claim_eq!(result, Ok(()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], FEE_RATE_CHANGED_TAG);
        claim_eq!(host.state().fee_rate, BasisPoints::new(300));
    }

    #[concordium_test]
    fn test_min_delta_floors_new_lots() {
        let mut host = default_host();

        let bytes = to_bytes(&50u64);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        claim_eq!(contract_set_min_delta(&ctx, &mut host), Ok(()));
        claim_eq!(host.state().min_delta, 50);

        mock_asset_standards(&mut host, true, false);
        mock_asset_operator(&mut host, true);
        claim_eq!(
            try_create_lot(&mut host, &default_lot_params()),
            Err(CustomContractError::IncrementBelowFloor.into())
        );
    }

    #[concordium_test]
    fn test_currency_whitelist_round_trip() {
        let mut host = default_host();
        whitelist_payment_token(&mut host);
        claim!(host
            .state()
            .is_whitelisted(&Currency::Cis2(payment_token())));

        let bytes = to_bytes(&payment_token());
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        claim_eq!(contract_remove_currency(&ctx, &mut host), Ok(()));
        claim!(!host
            .state()
            .is_whitelisted(&Currency::Cis2(payment_token())));

        // CCD needs no whitelisting.
        claim!(host.state().is_whitelisted(&Currency::Ccd));
    }

    #[concordium_test]
    fn test_update_and_view_authority() {
        let mut host = default_host();

        let action = AuthorityAction::AddMaintainer(Address::Account(MAINTAINER));
        let bytes = to_bytes(&action);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        claim_eq!(
            contract_update_authority(&ctx, &mut host),
            Err(CustomContractError::Unauthorized.into())
        );

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        claim_eq!(contract_update_authority(&ctx, &mut host), Ok(()));

        // The new maintainer may use gated entrypoints.
        let rate = BasisPoints::new(250);
        let bytes = to_bytes(&rate);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(MAINTAINER))
            .set_parameter(&bytes);
        let mut logger = TestLogger::init();
        claim_eq!(contract_set_fee_rate(&ctx, &mut host, &mut logger), Ok(()));

        let params = commons::AuthorityViewParams {
            field: commons::AuthorityField::Maintainer,
            skip: 0,
            show: 10,
        };
        let bytes = to_bytes(&params);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(ADMIN)).set_parameter(&bytes);
        let result = contract_view_authority(&ctx, &host);
        claim_eq!(result, Ok(vec![Address::Account(MAINTAINER)]));
    }

    #[concordium_test]
    fn test_view_entrypoints() {
        let mut host = default_host();
        let lot_id = create_default_lot(&mut host);

        let bytes = to_bytes(&lot_id);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        let result = contract_view_lot(&ctx, &host);
        claim!(result.is_ok());

        let key = PendingKey {
            payee: BIDDER_1,
            lot_id,
        };
        let bytes = to_bytes(&key);
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1)).set_parameter(&bytes);
        claim_eq!(contract_view_pending(&ctx, &host), Ok(0));

        let ctx = TestReceiveContext::empty();
        let config = contract_view_config(&ctx, &host).expect_report("Config view failed");
        claim_eq!(config.fee_rate, BasisPoints::new(500));
        claim_eq!(config.min_delta, 5);
        claim_eq!(config.next_lot_id, 1);
    }

    #[concordium_test]
    fn test_receive_hook_rejects_accounts() {
        let host = default_host();

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(BIDDER_1));
        claim_eq!(
            contract_on_cis2_received(&ctx, &host),
            Err(CustomContractError::ContractOnly.into())
        );

        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Contract(PAYMENT_TOKEN));
        claim_eq!(contract_on_cis2_received(&ctx, &host), Ok(()));
    }
}
