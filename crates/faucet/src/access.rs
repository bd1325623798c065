//! Access-control capability consumed by the faucet.

use drip_common::types::Address;

/// Answers whether a caller may run administrative operations.
pub trait AccessControl {
    fn is_owner(&self, caller: &Address) -> bool;
}

/// Exactly one owner address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleOwner {
    owner: Address,
}

impl SingleOwner {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }
}

impl AccessControl for SingleOwner {
    fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_owner() {
        let owner = Address::from_low_u64(1);
        let access = SingleOwner::new(owner);
        assert!(access.is_owner(&owner));
        assert!(!access.is_owner(&Address::from_low_u64(2)));
        assert!(!access.is_owner(&Address::ZERO));
        assert_eq!(access.owner(), owner);
    }
}
