use commons::{
    BasisPoints, Currency, LotId, RawAmount, TokenRef, BID_ACCEPTED_TAG, FEE_RATE_CHANGED_TAG,
    LOT_CREATED_TAG, LOT_DELETED_TAG, LOT_EDITED_TAG, LOT_EXTENDED_TAG, LOT_SETTLED_TAG,
    PENDING_PAID_TAG, PENDING_RECORDED_TAG,
};
use concordium_cis2::TokenAmountU64;
use concordium_std::*;

/// Lot creation event data.
#[derive(Debug, Serial)]
pub struct LotCreatedEvent<'a> {
    pub lot_id: LotId,
    pub asset: &'a TokenRef,
    pub creator: &'a AccountAddress,
    pub quantity: TokenAmountU64,
    pub currency: &'a Currency,
    pub buy_now_price: RawAmount,
    pub start_price: RawAmount,
    pub min_bid_delta: RawAmount,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Lot edit event data, carrying the final field values.
#[derive(Debug, Serial)]
pub struct LotEditedEvent {
    pub lot_id: LotId,
    pub buy_now_price: RawAmount,
    pub start_price: RawAmount,
    pub min_bid_delta: RawAmount,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// One-shot end time extension event data.
#[derive(Debug, Serial)]
pub struct LotExtendedEvent {
    pub lot_id: LotId,
    pub end: Timestamp,
}

#[derive(Debug, Serial)]
pub struct LotDeletedEvent {
    pub lot_id: LotId,
}

/// Accepted bid event data. `amount` is the effective bid after any
/// payment token transfer fee.
#[derive(Debug, Serial)]
pub struct BidAcceptedEvent<'a> {
    pub lot_id: LotId,
    pub bidder: &'a AccountAddress,
    pub amount: RawAmount,
}

/// A CCD push failed and the amount was credited to the pending ledger.
#[derive(Debug, Serial)]
pub struct PendingPaymentRecordedEvent<'a> {
    pub lot_id: LotId,
    pub payee: &'a AccountAddress,
    pub amount: RawAmount,
}

/// A pending balance was reclaimed and paid out.
#[derive(Debug, Serial)]
pub struct PendingPaymentPaidEvent<'a> {
    pub lot_id: LotId,
    pub payee: &'a AccountAddress,
    pub destination: &'a AccountAddress,
    pub amount: RawAmount,
}

/// Settlement event data. The creator received `price` less `fee`; the
/// royalty was paid by the winner on top of the price.
#[derive(Debug, Serial)]
pub struct LotSettledEvent<'a> {
    pub lot_id: LotId,
    pub winner: &'a AccountAddress,
    pub creator: &'a AccountAddress,
    pub price: RawAmount,
    pub fee: RawAmount,
    pub royalty: RawAmount,
}

#[derive(Debug, Serial)]
pub struct FeeRateChangedEvent {
    pub rate: BasisPoints,
}

/// Tagged auction event to be serialized into the event log.
#[derive(Debug)]
pub enum AuctionEvent<'a> {
    LotCreated(LotCreatedEvent<'a>),
    LotEdited(LotEditedEvent),
    LotExtended(LotExtendedEvent),
    LotDeleted(LotDeletedEvent),
    BidAccepted(BidAcceptedEvent<'a>),
    PendingPaymentRecorded(PendingPaymentRecordedEvent<'a>),
    PendingPaymentPaid(PendingPaymentPaidEvent<'a>),
    LotSettled(LotSettledEvent<'a>),
    FeeRateChanged(FeeRateChangedEvent),
}

impl<'a> AuctionEvent<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn lot_created(
        lot_id: LotId,
        asset: &'a TokenRef,
        creator: &'a AccountAddress,
        quantity: TokenAmountU64,
        currency: &'a Currency,
        buy_now_price: RawAmount,
        start_price: RawAmount,
        min_bid_delta: RawAmount,
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        Self::LotCreated(LotCreatedEvent {
            lot_id,
            asset,
            creator,
            quantity,
            currency,
            buy_now_price,
            start_price,
            min_bid_delta,
            start,
            end,
        })
    }

    pub fn lot_edited(
        lot_id: LotId,
        buy_now_price: RawAmount,
        start_price: RawAmount,
        min_bid_delta: RawAmount,
        start: Timestamp,
        end: Timestamp,
    ) -> Self {
        Self::LotEdited(LotEditedEvent {
            lot_id,
            buy_now_price,
            start_price,
            min_bid_delta,
            start,
            end,
        })
    }

    pub fn lot_extended(lot_id: LotId, end: Timestamp) -> Self {
        Self::LotExtended(LotExtendedEvent { lot_id, end })
    }

    pub fn lot_deleted(lot_id: LotId) -> Self {
        Self::LotDeleted(LotDeletedEvent { lot_id })
    }

    pub fn bid_accepted(lot_id: LotId, bidder: &'a AccountAddress, amount: RawAmount) -> Self {
        Self::BidAccepted(BidAcceptedEvent {
            lot_id,
            bidder,
            amount,
        })
    }

    pub fn pending_recorded(
        lot_id: LotId,
        payee: &'a AccountAddress,
        amount: RawAmount,
    ) -> Self {
        Self::PendingPaymentRecorded(PendingPaymentRecordedEvent {
            lot_id,
            payee,
            amount,
        })
    }

    pub fn pending_paid(
        lot_id: LotId,
        payee: &'a AccountAddress,
        destination: &'a AccountAddress,
        amount: RawAmount,
    ) -> Self {
        Self::PendingPaymentPaid(PendingPaymentPaidEvent {
            lot_id,
            payee,
            destination,
            amount,
        })
    }

    pub fn lot_settled(
        lot_id: LotId,
        winner: &'a AccountAddress,
        creator: &'a AccountAddress,
        price: RawAmount,
        fee: RawAmount,
        royalty: RawAmount,
    ) -> Self {
        Self::LotSettled(LotSettledEvent {
            lot_id,
            winner,
            creator,
            price,
            fee,
            royalty,
        })
    }

    pub fn fee_rate_changed(rate: BasisPoints) -> Self {
        Self::FeeRateChanged(FeeRateChangedEvent { rate })
    }
}

impl<'a> Serial for AuctionEvent<'a> {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvent::LotCreated(event) => {
                out.write_u8(LOT_CREATED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::LotEdited(event) => {
                out.write_u8(LOT_EDITED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::LotExtended(event) => {
                out.write_u8(LOT_EXTENDED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::LotDeleted(event) => {
                out.write_u8(LOT_DELETED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::BidAccepted(event) => {
                out.write_u8(BID_ACCEPTED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::PendingPaymentRecorded(event) => {
                out.write_u8(PENDING_RECORDED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::PendingPaymentPaid(event) => {
                out.write_u8(PENDING_PAID_TAG)?;
                event.serial(out)
            }
            AuctionEvent::LotSettled(event) => {
                out.write_u8(LOT_SETTLED_TAG)?;
                event.serial(out)
            }
            AuctionEvent::FeeRateChanged(event) => {
                out.write_u8(FEE_RATE_CHANGED_TAG)?;
                event.serial(out)
            }
        }
    }
}
