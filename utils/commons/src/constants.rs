use super::*;

/// Event log tag prefixes. Counting down from 250 keeps clear of the
/// CIS-2 reserved range at the top of the byte space.
pub const LOT_CREATED_TAG: u8 = 250;
pub const LOT_EDITED_TAG: u8 = 249;
pub const LOT_EXTENDED_TAG: u8 = 248;
pub const LOT_DELETED_TAG: u8 = 247;
pub const BID_ACCEPTED_TAG: u8 = 246;
pub const PENDING_RECORDED_TAG: u8 = 245;
pub const PENDING_PAID_TAG: u8 = 244;
pub const LOT_SETTLED_TAG: u8 = 243;
pub const FEE_RATE_CHANGED_TAG: u8 = 242;

/// Highest platform fee rate that can ever be configured, 15%.
pub const MAX_FEE_RATE: BasisPoints = BasisPoints::new(1_500);

/// Longest allowed one-shot end time extension.
pub const MAX_EXTENSION_MILLIS: u64 = 30 * 24 * 60 * 60 * 1000;
