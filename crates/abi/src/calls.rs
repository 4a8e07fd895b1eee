use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{sol, SolCall};

sol! {
    #[derive(Debug)]
    function balanceOf(address account) external view returns (uint256);

    #[derive(Debug)]
    function totalSupply() external view returns (uint256);
}

/// A read call on an ERC-20 token contract.
#[derive(Debug, derive_more::From)]
pub enum Erc20Call {
    /// A call to read the token balance of an account.
    BalanceOf(balanceOfCall),
    /// A call to read the total supply of the token.
    TotalSupply(totalSupplyCall),
}

impl Erc20Call {
    /// Returns the calldata for a `balanceOf(account)` call.
    pub fn balance_of(account: Address) -> Bytes {
        balanceOfCall { account }.abi_encode().into()
    }

    /// Returns the calldata for a `totalSupply()` call.
    pub fn total_supply() -> Bytes {
        totalSupplyCall {}.abi_encode().into()
    }

    /// Tries to decode the calldata into an [`Erc20Call`].
    pub fn try_decode(calldata: &[u8]) -> Option<Self> {
        let selector: [u8; 4] = calldata.get(0..4)?.try_into().ok()?;
        match selector {
            balanceOfCall::SELECTOR => balanceOfCall::abi_decode(calldata).map(Into::into).ok(),
            totalSupplyCall::SELECTOR => totalSupplyCall::abi_decode(calldata).map(Into::into).ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_decode_erc20_calls() {
        let holder = address!("0x99C9fc46f92E8a1c0deC1b1747d010903E884bE1");

        let call = Erc20Call::try_decode(&Erc20Call::balance_of(holder)).unwrap();
        assert!(matches!(call, Erc20Call::BalanceOf(c) if c.account == holder));

        let call = Erc20Call::try_decode(&Erc20Call::total_supply()).unwrap();
        assert!(matches!(call, Erc20Call::TotalSupply(_)));

        assert!(Erc20Call::try_decode(&[0xde, 0xad]).is_none());
    }
}
