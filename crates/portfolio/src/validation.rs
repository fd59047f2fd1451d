use common::types::Network;

pub const ADDRESS_PREFIX: &str = "sei1";
pub const ADDRESS_LEN: usize = 42;

/// Request rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Wallet address is required")]
    AddressRequired,
    #[error("Invalid network. Supported networks: mainnet, testnet, devnet")]
    UnsupportedNetwork(String),
    #[error("Invalid Sei wallet address format")]
    InvalidAddress,
}

pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    if address.is_empty() {
        return Err(ValidationError::AddressRequired);
    }
    if !address.starts_with(ADDRESS_PREFIX) || address.chars().count() != ADDRESS_LEN {
        return Err(ValidationError::InvalidAddress);
    }
    Ok(())
}

/// Missing network means mainnet.
pub fn parse_network(network: Option<&str>) -> Result<Network, ValidationError> {
    match network {
        None => Ok(Network::Mainnet),
        Some(n) => n
            .parse()
            .map_err(|_unknown| ValidationError::UnsupportedNetwork(n.to_string())),
    }
}

/// Checks run in the same order as the public API reports them:
/// address presence, network, then address format.
pub fn validate_request(
    address: Option<&str>,
    network: Option<&str>,
) -> Result<(String, Network), ValidationError> {
    let address = address
        .filter(|a| !a.is_empty())
        .ok_or(ValidationError::AddressRequired)?;
    let network = parse_network(network)?;
    validate_address(address)?;
    Ok((address.to_string(), network))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address_of_len(len: usize) -> String {
        format!("{ADDRESS_PREFIX}{}", "q".repeat(len - ADDRESS_PREFIX.len()))
    }

    #[test]
    fn test_prefix_plus_38_chars_is_valid() {
        let addr = format!("sei1{}", "x7".repeat(19));
        assert_eq!(addr.len(), 42);
        assert_eq!(validate_address(&addr), Ok(()));
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        for len in [4, 41, 43, 60] {
            assert_eq!(
                validate_address(&address_of_len(len)),
                Err(ValidationError::InvalidAddress),
                "len {len}"
            );
        }
    }

    #[test]
    fn test_wrong_prefix_is_rejected() {
        let cosmos = format!("cosmos{}", "q".repeat(36));
        assert_eq!(cosmos.len(), 42);
        assert_eq!(
            validate_address(&cosmos),
            Err(ValidationError::InvalidAddress)
        );
        let upper = format!("SEI1{}", "q".repeat(38));
        assert_eq!(
            validate_address(&upper),
            Err(ValidationError::InvalidAddress)
        );
    }

    #[test]
    fn test_empty_address_is_required() {
        assert_eq!(validate_address(""), Err(ValidationError::AddressRequired));
        assert_eq!(
            validate_request(None, Some("mainnet")),
            Err(ValidationError::AddressRequired)
        );
        assert_eq!(
            validate_request(Some(""), None),
            Err(ValidationError::AddressRequired)
        );
    }

    #[test]
    fn test_network_defaults_to_mainnet() {
        let addr = address_of_len(42);
        let (addr, network) = validate_request(Some(addr.as_str()), None).unwrap();
        assert_eq!(network, Network::Mainnet);
        assert_eq!(addr.len(), 42);
    }

    #[test]
    fn test_unknown_network_is_rejected_before_address_format() {
        let err = validate_request(Some("sei1short"), Some("localnet")).unwrap_err();
        assert_eq!(err, ValidationError::UnsupportedNetwork("localnet".to_string()));
        assert!(err.to_string().contains("mainnet, testnet, devnet"));
    }

    #[test]
    fn test_all_fixed_networks_accepted() {
        for name in ["mainnet", "testnet", "devnet"] {
            assert_eq!(parse_network(Some(name)).unwrap().as_str(), name);
        }
    }
}
