use commons::{CustomContractError, RawAmount, RoyaltyQueryParams, RoyaltyQueryResponse, TokenRef};
use concordium_cis2::*;
use concordium_std::*;

/// Transfer-capability class declared by an asset contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    /// Single-unit semantics; lots must carry a quantity of exactly 1.
    Unit,
    /// Quantity transfers are supported.
    Batch,
}

/// Determine the asset class via the CIS-0 `supports` query. CIS-2
/// contracts take quantities; legacy CIS-1 contracts are treated as
/// single-unit. A contract declaring neither cannot be auctioned.
pub fn asset_class<T>(
    host: &impl HasHost<T>,
    contract: &ContractAddress,
) -> Result<AssetClass, CustomContractError> {
    let params = SupportsQueryParams {
        queries: vec![
            StandardIdentifierOwned::new_unchecked(String::from("CIS-2")),
            StandardIdentifierOwned::new_unchecked(String::from("CIS-1")),
        ],
    };
    let mut response = host
        .invoke_contract_read_only(
            contract,
            &params,
            EntrypointName::new_unchecked("supports"),
            Amount::zero(),
        )
        .map_err(|_| CustomContractError::UnsupportedAsset)?
        .ok_or(CustomContractError::UnsupportedAsset)?;
    let results = SupportsQueryResponse::deserial(&mut response)
        .map_err(|_| CustomContractError::UnsupportedAsset)?
        .results;
    // Results arrive in query order: CIS-2 first, CIS-1 second. Support
    // through another contract does not make the asset transferable here.
    match results.as_slice() {
        [SupportResult::Support, _] => Ok(AssetClass::Batch),
        [_, SupportResult::Support] => Ok(AssetClass::Unit),
        _ => Err(CustomContractError::UnsupportedAsset),
    }
}

/// Whether `operator` may move `owner`'s tokens on the asset contract.
pub fn is_operator_of<T>(
    host: &impl HasHost<T>,
    contract: &ContractAddress,
    owner: AccountAddress,
    operator: ContractAddress,
) -> Result<bool, CustomContractError> {
    let params = OperatorOfQueryParams {
        queries: vec![OperatorOfQuery {
            owner: Address::Account(owner),
            address: Address::Contract(operator),
        }],
    };
    let mut response = host
        .invoke_contract_read_only(
            contract,
            &params,
            EntrypointName::new_unchecked("operatorOf"),
            Amount::zero(),
        )
        .map_err(handle_call_error)?
        .ok_or(CustomContractError::UnsupportedAsset)?;
    let results = OperatorOfQueryResponse::deserial(&mut response)
        .map_err(|_| CustomContractError::UnsupportedAsset)?;
    results
        .0
        .first()
        .copied()
        .ok_or(CustomContractError::UnsupportedAsset)
}

/// Move `quantity` units of the asset. Fails hard on any precondition
/// violation inside the asset contract.
pub fn transfer<T>(
    host: &mut impl HasHost<T>,
    asset: &TokenRef,
    from: AccountAddress,
    to: AccountAddress,
    quantity: TokenAmountU64,
) -> Result<(), CustomContractError> {
    let params = TransferParams::from(vec![Transfer {
        token_id: asset.id.clone(),
        amount: quantity,
        from: Address::Account(from),
        to: Receiver::Account(to),
        data: AdditionalData::empty(),
    }]);
    host.invoke_contract(
        &asset.contract,
        &params,
        EntrypointName::new_unchecked("transfer"),
        Amount::zero(),
    )
    .map_err(handle_call_error)?;
    Ok(())
}

/// Royalty owed for selling the asset at `sale_price`. Asset contracts
/// without a `royaltyInfo` entrypoint owe none.
pub fn royalty_info<T>(
    host: &impl HasHost<T>,
    asset: &TokenRef,
    sale_price: RawAmount,
) -> Result<Option<RoyaltyQueryResponse>, CustomContractError> {
    let params = RoyaltyQueryParams {
        id: asset.id.clone(),
        sale_price,
    };
    let result = host.invoke_contract_read_only(
        &asset.contract,
        &params,
        EntrypointName::new_unchecked("royaltyInfo"),
        Amount::zero(),
    );
    let mut response = match result {
        Ok(Some(response)) => response,
        Ok(None) => return Err(CustomContractError::UnsupportedAsset),
        Err(CallContractError::MissingEntrypoint) => return Ok(None),
        Err(error) => return Err(handle_call_error(error)),
    };
    RoyaltyQueryResponse::deserial(&mut response)
        .map(Some)
        .map_err(|_| CustomContractError::UnsupportedAsset)
}

fn handle_call_error<R>(error: CallContractError<R>) -> CustomContractError {
    match error {
        CallContractError::MissingEntrypoint | CallContractError::MessageFailed => {
            CustomContractError::UnsupportedAsset
        }
        _ => CustomContractError::InvokeContractError,
    }
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use concordium_std::test_infrastructure::*;

    const ASSET_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 9,
        subindex: 0,
    };

    const CREATOR: AccountAddress = AccountAddress([2; 32]);
    const WINNER: AccountAddress = AccountAddress([16; 32]);
    const RIGHTS_HOLDER: AccountAddress = AccountAddress([3; 32]);

    fn token_ref() -> TokenRef {
        TokenRef {
            contract: ASSET_CONTRACT,
            id: TokenIdVec(vec![7]),
        }
    }

    fn empty_host() -> TestHost<()> {
        TestHost::new((), TestStateBuilder::new())
    }

    /// supports mock declaring the two probed standards.
    fn supports_mock<S>(cis2: bool, cis1: bool) -> MockFn<S> {
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
        })
    }

    #[concordium_test]
    fn test_asset_class() {
        let cases = [
            (true, false, Ok(AssetClass::Batch)),
            (false, true, Ok(AssetClass::Unit)),
            // CIS-2 wins when both standards are declared.
            (true, true, Ok(AssetClass::Batch)),
            (false, false, Err(CustomContractError::UnsupportedAsset)),
        ];

        for (cis2, cis1, expected) in cases {
            let mut host = empty_host();
            host.setup_mock_entrypoint(
                ASSET_CONTRACT,
                OwnedEntrypointName::new_unchecked("supports".into()),
                supports_mock(cis2, cis1),
            );
            claim_eq!(asset_class(&host, &ASSET_CONTRACT), expected);
        }
    }

    #[concordium_test]
    fn test_asset_class_delegated_support_is_not_enough() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("supports".into()),
            MockFn::new(|parameter, _amount, _balance, _state| {
                SupportsQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                Ok((
                    false,
                    Some(SupportsQueryResponse {
                        results: vec![
                            SupportResult::SupportBy(vec![SELF_ADDRESS]),
                            SupportResult::NoSupport,
                        ],
                    }),
                ))
            }),
        );

        claim_eq!(
            asset_class(&host, &ASSET_CONTRACT),
            Err(CustomContractError::UnsupportedAsset)
        );
    }

    #[concordium_test]
    fn test_is_operator_of() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("operatorOf".into()),
            MockFn::new(|parameter, _amount, _balance, _state| {
                let params = OperatorOfQueryParams::deserial(&mut Cursor::new(parameter))
                    .map_err(|_| CallContractError::Trap)?;
                let expected = params.queries.len() == 1
                    && params.queries[0].owner == Address::Account(CREATOR)
                    && params.queries[0].address == Address::Contract(SELF_ADDRESS);
                if !expected {
                    return Err(CallContractError::Trap);
                }
                Ok((false, Some(OperatorOfQueryResponse::from(vec![true]))))
            }),
        );

        let response = is_operator_of(&host, &ASSET_CONTRACT, CREATOR, SELF_ADDRESS);
        claim_eq!(response, Ok(true));
    }

    #[concordium_test]
    fn test_transfer() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            checking_mock::<TransferParams<TokenIdVec, TokenAmountU64>, _>(
                |params: &TransferParams<TokenIdVec, TokenAmountU64>| {
                    params.0.len() == 1
                        && params.0[0].from == Address::Account(CREATOR)
                        && matches!(params.0[0].to, Receiver::Account(to) if to == WINNER)
                        && params.0[0].amount == TokenAmountU64(3)
                },
                (),
            ),
        );

        let response = transfer(
            &mut host,
            &token_ref(),
            CREATOR,
            WINNER,
            TokenAmountU64(3),
        );
        claim_eq!(response, Ok(()));
    }

    #[concordium_test]
    fn test_royalty_info() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("royaltyInfo".into()),
            checking_mock::<RoyaltyQueryParams, _>(
                |params: &RoyaltyQueryParams| params.sale_price == 1_000,
                RoyaltyQueryResponse {
                    receiver: RIGHTS_HOLDER,
                    amount: 25,
                },
            ),
        );

        let response = royalty_info(&host, &token_ref(), 1_000);
        claim_eq!(
            response,
            Ok(Some(RoyaltyQueryResponse {
                receiver: RIGHTS_HOLDER,
                amount: 25,
            }))
        );
    }

    #[concordium_test]
    fn test_royalty_info_missing_entrypoint() {
        let mut host = empty_host();
        host.setup_mock_entrypoint(
            ASSET_CONTRACT,
            OwnedEntrypointName::new_unchecked("royaltyInfo".into()),
            missing_entrypoint_mock(),
        );

        let response = royalty_info(&host, &token_ref(), 1_000);
        claim_eq!(response, Ok(None));
    }
}
