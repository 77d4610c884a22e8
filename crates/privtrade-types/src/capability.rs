//! Caller capability flags resolved once per invocation.

use serde::{Deserialize, Serialize};

/// Role attributes asserted by the caller's certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub is_farmer: bool,
    pub is_retailer: bool,
}

impl Capabilities {
    /// Why minting is refused, if it is. Minting requires the farmer
    /// attribute and forbids the retailer attribute.
    #[must_use]
    pub fn mint_refusal(&self) -> Option<&'static str> {
        if self.is_retailer {
            Some("client is a retailer")
        } else if !self.is_farmer {
            Some("client is not a farmer")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn farmer_only_can_mint() {
        let caps = Capabilities {
            is_farmer: true,
            is_retailer: false,
        };
        assert!(caps.mint_refusal().is_none());
    }

    #[test]
    fn retailer_farmer_cannot_mint() {
        let caps = Capabilities {
            is_farmer: true,
            is_retailer: true,
        };
        assert_eq!(caps.mint_refusal(), Some("client is a retailer"));
    }

    #[test]
    fn plain_client_cannot_mint() {
        let caps = Capabilities::default();
        assert_eq!(caps.mint_refusal(), Some("client is not a farmer"));
    }
}
