use super::*;

/// Amount in the base units of a lot's payment currency: micro CCD for
/// native lots, token base units for CIS-2 lots.
pub type RawAmount = u64;

/// Reference to a CIS-2 token: the issuing contract and the token id
/// within it. Used both for auctioned assets and for payment tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct TokenRef {
    pub contract: ContractAddress,
    pub id: TokenIdVec,
}

/// Auction lot identifier. Allocated sequentially, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, SchemaType)]
pub struct LotId(pub u64);

/// Payment currency of a lot. CCD is always eligible; CIS-2 tokens must
/// be whitelisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub enum Currency {
    Ccd,
    Cis2(TokenRef),
}

impl Currency {
    pub fn is_ccd(&self) -> bool {
        matches!(self, Currency::Ccd)
    }
}

/// Key of the pending payment ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SchemaType)]
pub struct PendingKey {
    pub payee: AccountAddress,
    pub lot_id: LotId,
}

/// Parameter for the `royaltyInfo` query on asset contracts.
#[derive(Debug, Clone, Serialize, SchemaType)]
pub struct RoyaltyQueryParams {
    pub id: TokenIdVec,
    pub sale_price: RawAmount,
}

/// Response of the `royaltyInfo` query on asset contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, SchemaType)]
pub struct RoyaltyQueryResponse {
    pub receiver: AccountAddress,
    pub amount: RawAmount,
}
