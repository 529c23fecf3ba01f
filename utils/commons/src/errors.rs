use super::*;

/// The custom errors the auction contracts can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Lot identifier is unknown or the lot no longer exists (Error code: -4).
    UnknownLot,
    /// Sender lacks the administrative rights for this call (Error code: -5).
    Unauthorized,
    /// This contract is not an operator of the asset owner (Error code: -6).
    NotAuthorized,
    /// Only account addresses can call this function (Error code: -7).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -8).
    ContractOnly,
    /// Payment token is not whitelisted (Error code: -9).
    CurrencyNotWhitelisted,
    /// Lot quantity is zero or exceeds what the asset class allows
    /// (Error code: -10).
    InvalidQuantity,
    /// Start and end times do not form a valid window (Error code: -11).
    InvalidTimeWindow,
    /// Start price does not lie strictly below the buy-now price
    /// (Error code: -12).
    InvalidPriceBounds,
    /// Minimum bid increment is below the process-wide floor
    /// (Error code: -13).
    IncrementBelowFloor,
    /// Fee rate exceeds the allowed maximum (Error code: -14).
    InvalidFeeRate,
    /// Attached CCD does not match the declared amount (Error code: -15).
    AttachedAmountMismatch,
    /// Lot creator is not allowed to bid on its own lot (Error code: -16).
    CreatorForbidden,
    /// Sender already holds the leading bid (Error code: -17).
    AlreadyLeading,
    /// Auction has not started yet (Error code: -18).
    AuctionNotStarted,
    /// Auction is past its end time or was bought out (Error code: -19).
    AuctionFinished,
    /// Auction end condition has not been reached yet (Error code: -20).
    AuctionStillActive,
    /// Lot start time has already elapsed (Error code: -21).
    AlreadyStarted,
    /// Lot has at least one recorded bid (Error code: -22).
    LotHasBids,
    /// Lot end time was already extended once (Error code: -23).
    AlreadyExtended,
    /// Requested end time is more than the allowed maximum past the
    /// current one (Error code: -24).
    ExtensionTooLong,
    /// Bid does not clear the start price or the required increment
    /// (Error code: -25).
    BidTooLow,
    /// Bid exceeds the buy-now price (Error code: -26).
    AboveBuyNow,
    /// Only the leading bidder can settle the lot (Error code: -27).
    NotLeadingBidder,
    /// Attached royalty payment does not equal the reported royalty
    /// (Error code: -28).
    RoyaltyMismatch,
    /// Asset contract does not declare a supported transfer standard
    /// (Error code: -29).
    UnsupportedAsset,
    /// Failed to invoke a contract (Error code: -30).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -31).
    InvokeTransferError,
    /// No pending payment recorded under this key (Error code: -32).
    NothingPending,
    /// No fees accrued in this currency (Error code: -33).
    NothingAccrued,
    /// Arithmetic overflow in time or amount computation (Error code: -34).
    Overflow,
    /// Nested call re-entered a guarded function (Error code: -35).
    ReentrancyGuard,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping errors related to CCD transfers to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}
