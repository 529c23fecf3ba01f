use commons::{BasisPoints, Currency, LotId, RawAmount, TokenRef};
use concordium_cis2::TokenAmountU64;
use concordium_std::*;

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct InitParams {
    /// Platform fee in basis points, capped at 15%.
    pub fee_rate: BasisPoints,
    /// Process-wide floor for per-lot minimum bid increments.
    pub min_delta: RawAmount,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct CreateLotParams {
    pub asset: TokenRef,
    pub quantity: TokenAmountU64,
    pub currency: Currency,
    pub buy_now_price: RawAmount,
    pub start_price: RawAmount,
    /// Offset from the creation time. Must not be zero.
    pub start_offset: Duration,
    /// Offset from the creation time. Must exceed `start_offset`.
    pub end_offset: Duration,
    pub min_bid_delta: RawAmount,
}

/// Full set of editable fields. A field equal to the stored value is left
/// untouched; a differing one is updated under its field-specific guard.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct EditLotParams {
    pub lot_id: LotId,
    pub buy_now_price: RawAmount,
    pub start_price: RawAmount,
    pub start: Timestamp,
    pub end: Timestamp,
    pub min_bid_delta: RawAmount,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct BidParams {
    pub lot_id: LotId,
    /// Declared bid. For CCD lots the attached amount must equal it
    /// exactly; for CIS-2 lots it is pulled from the bidder and the
    /// actually received amount becomes the effective bid.
    pub amount: RawAmount,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct ExtendParams {
    pub lot_id: LotId,
    /// New absolute end time, at most 30 days past the current one.
    pub end: Timestamp,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct ReclaimParams {
    pub lot_id: LotId,
    pub payee: AccountAddress,
    pub destination: AccountAddress,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct WithdrawFeesParams {
    pub currency: Currency,
    pub destination: AccountAddress,
}

#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct ConfigView {
    pub fee_rate: BasisPoints,
    pub min_delta: RawAmount,
    pub next_lot_id: u64,
}
