//! Shared types and helpers for the auction contracts.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{authority::*, basis_points::*, constants::*, errors::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod authority;
mod basis_points;
mod constants;
mod errors;
mod types;
