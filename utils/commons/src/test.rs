#[cfg(any(test, feature = "test-utils"))]
pub use inner::*;

#[cfg(any(test, feature = "test-utils"))]
mod inner {
    use concordium_std::test_infrastructure::MockFn;
    use concordium_std::*;

    /// Mock that parses the parameter as `D` and answers with `value`.
    pub fn answering_mock<D: Deserial, S>(
        value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _amount, _balance, _state| {
            D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            Ok((false, Some(value.clone())))
        })
    }

    /// Mock that parses the parameter as `D`, traps unless `check`
    /// accepts it, and answers with `value`.
    pub fn checking_mock<D: Deserial, S>(
        check: impl Fn(&D) -> bool + 'static,
        value: impl Clone + Serial + 'static,
    ) -> MockFn<S> {
        MockFn::new(move |parameter, _amount, _balance, _state| {
            let parsed =
                D::deserial(&mut Cursor::new(parameter)).map_err(|_| CallContractError::Trap)?;
            if !check(&parsed) {
                return Err(CallContractError::Trap);
            }
            Ok((false, Some(value.clone())))
        })
    }

    /// Mock for an entrypoint the target contract does not expose.
    pub fn missing_entrypoint_mock<S>() -> MockFn<S> {
        MockFn::new(|_parameter, _amount, _balance, _state| {
            Err::<(bool, Option<()>), _>(CallContractError::MissingEntrypoint)
        })
    }
}
