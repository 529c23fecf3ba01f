//! Escrow-backed English/buy-now auction for CIS-2 assets, settled in CCD
//! or a whitelisted CIS-2 payment token, with royalty repayment to the
//! asset's rights-holder.
#![cfg_attr(not(feature = "std"), no_std)]

mod asset;
mod contract;
mod events;
mod external;
mod payment;
mod state;

use commons::{CustomContractError, Currency, RawAmount, TokenRef, MAX_EXTENSION_MILLIS};
use concordium_cis2::TokenAmountU64;
use concordium_std::*;

/// Lifecycle phase of a lot at a given slot time.
pub enum LotPhase {
    /// Start time has not been reached yet.
    Created,
    /// Open for bids.
    Active,
    /// A bid matched the buy-now price. Terminal even before the end time.
    BoughtOut,
    /// End time has passed.
    Ended,
}

/// One auction's full state record.
#[derive(Debug, Clone, PartialEq, Serialize, SchemaType)]
pub struct AuctionLot {
    /// The asset being sold.
    pub asset: TokenRef,
    /// Units transferred at settlement. Always 1 for unit-class assets.
    pub quantity: TokenAmountU64,
    /// Account that created the lot. May edit, extend and delete it, and
    /// is excluded from bidding.
    pub creator: AccountAddress,
    /// Currency all bids on this lot are denominated in.
    pub currency: Currency,
    /// Price at which a single bid immediately finalizes the auction.
    pub buy_now_price: RawAmount,
    /// Floor a first bid must strictly exceed.
    pub start_price: RawAmount,
    /// Increment a later bid must strictly exceed over the leading bid.
    pub min_bid_delta: RawAmount,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Current leader. Unset exactly while `leading_bid` is zero.
    pub leading_bidder: Option<AccountAddress>,
    pub leading_bid: RawAmount,
    /// One-shot flag: the end time may be pushed out at most once.
    pub extended: bool,
}

impl AuctionLot {
    pub fn open(
        asset: TokenRef,
        quantity: TokenAmountU64,
        creator: AccountAddress,
        currency: Currency,
        buy_now_price: RawAmount,
        start_price: RawAmount,
        min_bid_delta: RawAmount,
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        Self {
            asset,
            quantity,
            creator,
            currency,
            buy_now_price,
            start_price,
            min_bid_delta,
            start,
            end,
            leading_bidder: None,
            leading_bid: 0,
            extended: false,
        }
    }

    pub fn has_bid(&self) -> bool {
        self.leading_bidder.is_some()
    }

    pub fn is_bought_out(&self) -> bool {
        self.has_bid() && self.leading_bid == self.buy_now_price
    }

    pub fn phase(&self, slot_time: Timestamp) -> LotPhase {
        if self.is_bought_out() {
            LotPhase::BoughtOut
        } else if slot_time < self.start {
            LotPhase::Created
        } else if slot_time > self.end {
            LotPhase::Ended
        } else {
            LotPhase::Active
        }
    }

    /// Finished lots accept no bids and no edits.
    pub fn is_finished(&self, slot_time: Timestamp) -> bool {
        matches!(self.phase(slot_time), LotPhase::BoughtOut | LotPhase::Ended)
    }

    /// Settlement opens at the end time, or immediately on buyout.
    pub fn is_settleable(&self, slot_time: Timestamp) -> bool {
        self.is_bought_out() || slot_time >= self.end
    }

    /// Push the end time out. One-shot and capped; used by both the
    /// extension entrypoint and the end time branch of lot edits.
    pub(crate) fn extend_to(&mut self, new_end: Timestamp) -> Result<(), CustomContractError> {
        ensure!(!self.extended, CustomContractError::AlreadyExtended);
        let gained = new_end
            .timestamp_millis()
            .checked_sub(self.end.timestamp_millis())
            .filter(|gained| *gained > 0)
            .ok_or(CustomContractError::InvalidTimeWindow)?;
        ensure!(
            gained <= MAX_EXTENSION_MILLIS,
            CustomContractError::ExtensionTooLong
        );
        self.end = new_end;
        self.extended = true;
        Ok(())
    }
}

/// Outgoing leader displaced by an accepted bid. Must be refunded.
#[must_use]
pub struct OutgoingBid {
    pub bidder: AccountAddress,
    pub amount: RawAmount,
}
