//! Address Book — self address, known stations, nets, and wildcards
//!
//! ALE addresses are 3 to 15 characters from the restricted ASCII set. The
//! address book holds this station's own address plus the operator's lists
//! of known stations (with friendly names) and net addresses. Wildcard
//! matching follows MIL-STD-188-141B: `@` in a pattern matches any single
//! character, and pattern and target must be the same length.

use crate::ale_word::is_valid_ale_char;

/// Station and net address storage with self-address validation.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    self_address: String,
    /// (address, friendly name)
    stations: Vec<(String, String)>,
    /// (net address, description)
    nets: Vec<(String, String)>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an address against the restricted character set and the
    /// 3..=15 length window.
    pub fn is_valid_address(address: &str) -> bool {
        (3..=15).contains(&address.chars().count())
            && address.chars().all(is_valid_ale_char)
    }

    /// Set this station's own address. Returns false (and leaves the
    /// previous address untouched) when the address is invalid.
    pub fn set_self_address(&mut self, address: &str) -> bool {
        if !Self::is_valid_address(address) {
            return false;
        }
        self.self_address = address.to_string();
        true
    }

    /// This station's address, empty until configured.
    pub fn self_address(&self) -> &str {
        &self.self_address
    }

    /// Add a station unless already present.
    pub fn add_station(&mut self, address: &str, name: &str) {
        if !self.stations.iter().any(|(a, _)| a == address) {
            self.stations.push((address.to_string(), name.to_string()));
        }
    }

    /// Add a net address unless already present.
    pub fn add_net(&mut self, net_address: &str, description: &str) {
        if !self.nets.iter().any(|(a, _)| a == net_address) {
            self.nets.push((net_address.to_string(), description.to_string()));
        }
    }

    /// Does the address match our own?
    pub fn is_self(&self, address: &str) -> bool {
        !self.self_address.is_empty() && address == self.self_address
    }

    pub fn is_known_station(&self, address: &str) -> bool {
        self.stations.iter().any(|(a, _)| a == address)
    }

    pub fn is_known_net(&self, address: &str) -> bool {
        self.nets.iter().any(|(a, _)| a == address)
    }

    /// Friendly name for a station, if one was stored.
    pub fn station_name(&self, address: &str) -> Option<&str> {
        self.stations
            .iter()
            .find(|(a, _)| a == address)
            .map(|(_, n)| n.as_str())
    }

    /// Wildcard match: `@` matches any single character; lengths must agree.
    pub fn match_wildcard(pattern: &str, address: &str) -> bool {
        if pattern.chars().count() != address.chars().count() {
            return false;
        }
        pattern
            .chars()
            .zip(address.chars())
            .all(|(p, a)| p == '@' || p == a)
    }
}
