use commons::{
    Authority, BasisPoints, Currency, CustomContractError, LotId, PendingKey, RawAmount, TokenRef,
    MAX_FEE_RATE,
};
use concordium_std::*;

use crate::external::EditLotParams;
use crate::{AuctionLot, LotPhase, OutgoingBid};

/// The contract state.
#[derive(Serial, DeserialWithState)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Authority module for administrative rights management.
    pub authority: Authority<S>,
    /// Platform fee deducted from the winning bid at settlement.
    pub fee_rate: BasisPoints,
    /// Process-wide floor for per-lot minimum bid increments.
    pub min_delta: RawAmount,
    /// Next lot identifier. Monotonic, never reused.
    pub next_lot_id: u64,
    /// Re-entrancy latch around the bid entrypoint.
    pub bid_lock: bool,
    /// Live auction lots.
    pub lots: StateMap<LotId, AuctionLot, S>,
    /// CCD owed to payees after failed pushes, per lot.
    pub pending: StateMap<PendingKey, RawAmount, S>,
    /// Accrued platform fees per currency.
    pub fees: StateMap<Currency, RawAmount, S>,
    /// Payment tokens eligible as lot currency. CCD is implicitly
    /// eligible and never a member.
    pub whitelist: StateSet<TokenRef, S>,
}

impl<S: HasStateApi> State<S> {
    pub fn new(
        state_builder: &mut StateBuilder<S>,
        origin: AccountAddress,
        fee_rate: BasisPoints,
        min_delta: RawAmount,
    ) -> Self {
        State {
            authority: Authority::new(state_builder, Address::Account(origin)),
            fee_rate,
            min_delta,
            next_lot_id: 0,
            bid_lock: false,
            lots: state_builder.new_map(),
            pending: state_builder.new_map(),
            fees: state_builder.new_map(),
            whitelist: state_builder.new_set(),
        }
    }

    pub fn is_whitelisted(&self, currency: &Currency) -> bool {
        match currency {
            Currency::Ccd => true,
            Currency::Cis2(token) => self.whitelist.contains(token),
        }
    }

    /// Store a freshly validated lot under the next identifier.
    pub fn add_lot(&mut self, lot: AuctionLot) -> Result<LotId, CustomContractError> {
        let lot_id = LotId(self.next_lot_id);
        self.next_lot_id = self
            .next_lot_id
            .checked_add(1)
            .ok_or(CustomContractError::Overflow)?;
        // Identifiers are never reused, so this insert cannot overwrite.
        self.lots.insert(lot_id, lot);
        Ok(lot_id)
    }

    pub fn lot(&self, lot_id: LotId) -> Result<AuctionLot, CustomContractError> {
        let stored = self
            .lots
            .get(&lot_id)
            .ok_or(CustomContractError::UnknownLot)?;
        Ok(AuctionLot::clone(&stored))
    }

    /// Admission checks on a declared bid, before any funds move.
    /// Returns the lot currency the funds must be collected in.
    pub fn check_bid(
        &self,
        lot_id: LotId,
        bidder: AccountAddress,
        declared: RawAmount,
        slot_time: Timestamp,
    ) -> Result<Currency, CustomContractError> {
        let lot = self
            .lots
            .get(&lot_id)
            .ok_or(CustomContractError::UnknownLot)?;
        ensure!(bidder != lot.creator, CustomContractError::CreatorForbidden);
        ensure!(
            lot.leading_bidder != Some(bidder),
            CustomContractError::AlreadyLeading
        );
        match lot.phase(slot_time) {
            LotPhase::BoughtOut | LotPhase::Ended => bail!(CustomContractError::AuctionFinished),
            LotPhase::Created => bail!(CustomContractError::AuctionNotStarted),
            LotPhase::Active => (),
        }
        ensure!(
            declared <= lot.buy_now_price,
            CustomContractError::AboveBuyNow
        );
        Ok(lot.currency.clone())
    }

    /// Record an admitted bid. The effective amount may be below the
    /// declared one for transfer-fee tokens, so the ceiling and ordering
    /// rules are enforced on what actually arrived. Returns the displaced
    /// leader that must be refunded.
    pub fn bid(
        &mut self,
        lot_id: LotId,
        bidder: AccountAddress,
        effective: RawAmount,
    ) -> Result<Option<OutgoingBid>, CustomContractError> {
        let mut entry = self
            .lots
            .get_mut(&lot_id)
            .ok_or(CustomContractError::UnknownLot)?;
        let lot = entry.get_mut();
        ensure!(
            effective <= lot.buy_now_price,
            CustomContractError::AboveBuyNow
        );
        let floor = match lot.leading_bidder {
            Some(_) => lot.leading_bid.saturating_add(lot.min_bid_delta),
            None => lot.start_price,
        };
        ensure!(effective > floor, CustomContractError::BidTooLow);
        let previous = lot.leading_bidder.replace(bidder).map(|prev| OutgoingBid {
            bidder: prev,
            amount: lot.leading_bid,
        });
        lot.leading_bid = effective;
        Ok(previous)
    }

    pub fn edit_lot(
        &mut self,
        lot_id: LotId,
        caller: AccountAddress,
        params: &EditLotParams,
        slot_time: Timestamp,
    ) -> Result<(), CustomContractError> {
        let floor = self.min_delta;
        let mut entry = self
            .lots
            .get_mut(&lot_id)
            .ok_or(CustomContractError::UnknownLot)?;
        let lot = entry.get_mut();
        ensure!(caller == lot.creator, CustomContractError::Unauthorized);
        ensure!(
            !lot.is_finished(slot_time),
            CustomContractError::AuctionFinished
        );
        if params.buy_now_price != lot.buy_now_price {
            lot.buy_now_price = params.buy_now_price;
        }
        if params.start_price != lot.start_price {
            ensure!(!lot.has_bid(), CustomContractError::LotHasBids);
            lot.start_price = params.start_price;
        }
        if params.start != lot.start {
            ensure!(slot_time < lot.start, CustomContractError::AlreadyStarted);
            lot.start = params.start;
        }
        if params.end != lot.end {
            lot.extend_to(params.end)?;
        }
        if params.min_bid_delta != lot.min_bid_delta {
            ensure!(
                params.min_bid_delta >= floor,
                CustomContractError::IncrementBelowFloor
            );
            lot.min_bid_delta = params.min_bid_delta;
        }
        // Window and price bound invariants must hold for the final values.
        ensure!(lot.end > lot.start, CustomContractError::InvalidTimeWindow);
        ensure!(
            lot.start_price < lot.buy_now_price,
            CustomContractError::InvalidPriceBounds
        );
        Ok(())
    }

    /// One-shot end time extension. Returns the new end time.
    pub fn extend(
        &mut self,
        lot_id: LotId,
        caller: AccountAddress,
        new_end: Timestamp,
        slot_time: Timestamp,
    ) -> Result<Timestamp, CustomContractError> {
        let mut entry = self
            .lots
            .get_mut(&lot_id)
            .ok_or(CustomContractError::UnknownLot)?;
        let lot = entry.get_mut();
        ensure!(caller == lot.creator, CustomContractError::Unauthorized);
        ensure!(
            !lot.is_finished(slot_time),
            CustomContractError::AuctionFinished
        );
        lot.extend_to(new_end)?;
        Ok(lot.end)
    }

    pub fn delete_lot(
        &mut self,
        lot_id: LotId,
        caller: AccountAddress,
    ) -> Result<(), CustomContractError> {
        {
            let lot = self
                .lots
                .get(&lot_id)
                .ok_or(CustomContractError::UnknownLot)?;
            ensure!(caller == lot.creator, CustomContractError::Unauthorized);
            ensure!(!lot.has_bid(), CustomContractError::LotHasBids);
        }
        self.lots.remove(&lot_id);
        Ok(())
    }

    /// Read and delete the lot record in one step. From this point the
    /// lot no longer exists for any re-entrant call.
    pub fn begin_settlement(
        &mut self,
        lot_id: LotId,
        caller: AccountAddress,
        slot_time: Timestamp,
    ) -> Result<AuctionLot, CustomContractError> {
        let lot = {
            let stored = self
                .lots
                .get(&lot_id)
                .ok_or(CustomContractError::UnknownLot)?;
            ensure!(
                stored.is_settleable(slot_time),
                CustomContractError::AuctionStillActive
            );
            ensure!(
                stored.leading_bidder == Some(caller),
                CustomContractError::NotLeadingBidder
            );
            AuctionLot::clone(&stored)
        };
        self.lots.remove(&lot_id);
        Ok(lot)
    }

    pub fn credit_pending(&mut self, payee: AccountAddress, lot_id: LotId, amount: RawAmount) {
        let key = PendingKey { payee, lot_id };
        let owed = self.pending.get(&key).map(|owed| *owed).unwrap_or(0);
        self.pending.insert(key, owed.saturating_add(amount));
    }

    pub fn pending_amount(&self, key: &PendingKey) -> RawAmount {
        self.pending.get(key).map(|owed| *owed).unwrap_or(0)
    }

    /// Read and zero a pending balance.
    pub fn take_pending(
        &mut self,
        payee: AccountAddress,
        lot_id: LotId,
    ) -> Result<RawAmount, CustomContractError> {
        self.pending
            .remove_and_get(&PendingKey { payee, lot_id })
            .ok_or(CustomContractError::NothingPending)
    }

    pub fn accrue_fee(&mut self, currency: Currency, amount: RawAmount) {
        if amount == 0 {
            return;
        }
        let total = self.fees.get(&currency).map(|total| *total).unwrap_or(0);
        self.fees.insert(currency, total.saturating_add(amount));
    }

    /// Read and zero the accrued fees in a currency.
    pub fn take_fees(&mut self, currency: &Currency) -> Result<RawAmount, CustomContractError> {
        self.fees
            .remove_and_get(currency)
            .ok_or(CustomContractError::NothingAccrued)
    }

    pub fn whitelist_currency(&mut self, token: TokenRef) {
        self.whitelist.insert(token);
    }

    pub fn remove_currency(&mut self, token: &TokenRef) {
        self.whitelist.remove(token);
    }

    pub fn set_fee_rate(&mut self, rate: BasisPoints) -> Result<(), CustomContractError> {
        ensure!(rate <= MAX_FEE_RATE, CustomContractError::InvalidFeeRate);
        self.fee_rate = rate;
        Ok(())
    }

    pub fn set_min_delta(&mut self, min_delta: RawAmount) {
        self.min_delta = min_delta;
    }

    pub fn acquire_bid_lock(&mut self) -> Result<(), CustomContractError> {
        ensure!(!self.bid_lock, CustomContractError::ReentrancyGuard);
        self.bid_lock = true;
        Ok(())
    }

    pub fn release_bid_lock(&mut self) {
        self.bid_lock = false;
    }
}
