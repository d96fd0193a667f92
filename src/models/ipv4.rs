//! IPv4 address and CIDR notation utilities.
//!
//! Provides [`Ipv4`] struct for representing IPv4 blocks with a prefix length,
//! along with the block arithmetic used by the address planner and route tables.

use crate::error::{Result, TopologyError};
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum length for an IPv4 subnet mask (32 bits).
pub const MAX_LENGTH: u8 = 32;

/// Addresses the cloud provider keeps at the start of every subnet
/// (network, router, DNS, future use).
pub const RESERVED_LEADING_HOSTS: u32 = 4;

/// Convert a CIDR prefix length to a subnet mask as u32.
///
/// # Examples
/// ```
/// use vpc_service_topology::models::get_cidr_mask;
/// assert_eq!(get_cidr_mask(24).unwrap(), 0xFFFFFF00);
/// ```
pub fn get_cidr_mask(len: u8) -> Result<u32> {
    if len > MAX_LENGTH {
        Err(TopologyError::InvalidCidr(format!(
            "prefix length /{len} is too long"
        )))
    } else {
        let right_len = MAX_LENGTH - len;
        let all_bits = u32::MAX as u64;

        let mask = (all_bits >> right_len) << right_len;

        Ok(mask as u32)
    }
}

/// Get the network address for a given IP and prefix length.
pub fn cut_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    Ok(Ipv4Addr::from(u32::from(addr) & mask))
}

/// Returns the IP address following the given subnet, `None` past 255.255.255.255.
pub fn ip_after_subnet(addr: Ipv4Addr, cidr: u8) -> Result<Option<Ipv4Addr>> {
    let subnet_size = 1u64 << (MAX_LENGTH - cidr.min(MAX_LENGTH));
    let network_bits = u32::from(cut_addr(addr, cidr)?) as u64;
    let next_bits = network_bits + subnet_size;
    if next_bits > u32::MAX as u64 {
        return Ok(None);
    }
    Ok(Some(Ipv4Addr::from(next_bits as u32)))
}

/// Calculate the broadcast address for a given IP and prefix length.
pub fn broadcast_addr(addr: Ipv4Addr, len: u8) -> Result<Ipv4Addr> {
    let mask = get_cidr_mask(len)?;
    let network_bits = u32::from(addr) & mask;
    Ok(Ipv4Addr::from(network_bits | !mask))
}

/// Smallest address `>= addr` that is a valid network address for `len`.
///
/// Returns `None` when aligning would run past the end of the address space.
pub fn align_up(addr: Ipv4Addr, len: u8) -> Result<Option<Ipv4Addr>> {
    let lo = cut_addr(addr, len)?;
    if lo == addr {
        Ok(Some(addr))
    } else {
        ip_after_subnet(lo, len)
    }
}

/// IPv4 block with CIDR notation support.
#[derive(Eq, Ord, Debug, Copy, Clone, Hash)]
pub struct Ipv4 {
    /// The IPv4 address.
    pub addr: Ipv4Addr,
    /// The subnet mask length (0-32).
    pub mask: u8,
}

impl Serialize for Ipv4 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Ipv4, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ipv4::new(&s).map_err(de::Error::custom)
    }
}

impl Ipv4 {
    /// Create a new [`Ipv4`] from a CIDR string (e.g., "10.0.0.0/24").
    pub fn new(addr_cidr: &str) -> Result<Ipv4> {
        let addr_cidr = addr_cidr.trim();
        let (addr, mask) = addr_cidr
            .split_once('/')
            .ok_or_else(|| TopologyError::InvalidCidr(format!("missing mask in '{addr_cidr}'")))?;
        let addr: Ipv4Addr = addr
            .parse()
            .map_err(|_| TopologyError::InvalidCidr(format!("invalid address '{addr}'")))?;
        let mask: u8 = mask
            .parse()
            .map_err(|_| TopologyError::InvalidCidr(format!("invalid subnet mask '{mask}'")))?;
        if mask > MAX_LENGTH {
            return Err(TopologyError::InvalidCidr(format!(
                "prefix length /{mask} is too long"
            )));
        }
        Ok(Ipv4 { addr, mask })
    }

    /// A single-address block (`/32`).
    pub fn host(addr: Ipv4Addr) -> Ipv4 {
        Ipv4 {
            addr,
            mask: MAX_LENGTH,
        }
    }

    /// The whole IPv4 space, `0.0.0.0/0`.
    pub fn any() -> Ipv4 {
        Ipv4 {
            addr: Ipv4Addr::UNSPECIFIED,
            mask: 0,
        }
    }

    /// Get the highest (broadcast) address in the block.
    pub fn hi(&self) -> Ipv4Addr {
        broadcast_addr(self.addr, self.mask).unwrap_or(self.addr)
    }

    /// Get the lowest (network) address in the block.
    pub fn lo(&self) -> Ipv4Addr {
        cut_addr(self.addr, self.mask).unwrap_or(self.addr)
    }

    /// True when the address is the block's network address.
    pub fn is_canonical(&self) -> bool {
        self.addr == self.lo()
    }

    /// Number of addresses covered by the block.
    pub fn size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.mask.min(MAX_LENGTH))
    }

    /// Check if an IP address is contained within this block.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        ip >= self.lo() && ip <= self.hi()
    }

    /// Check if `other` lies entirely within this block.
    pub fn contains_block(&self, other: &Ipv4) -> bool {
        other.mask >= self.mask && self.contains(other.lo()) && self.contains(other.hi())
    }

    /// Check if the two blocks share at least one address.
    pub fn overlaps(&self, other: &Ipv4) -> bool {
        self.lo() <= other.hi() && other.lo() <= self.hi()
    }

    /// The `offset`-th address of the block, `None` when outside it.
    pub fn nth(&self, offset: u32) -> Option<Ipv4Addr> {
        let addr = u32::from(self.lo()).checked_add(offset)?;
        let addr = Ipv4Addr::from(addr);
        self.contains(addr).then_some(addr)
    }
}

impl FromStr for Ipv4 {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self> {
        Ipv4::new(s)
    }
}

impl std::fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.mask)
    }
}

impl PartialEq for Ipv4 {
    fn eq(&self, other: &Ipv4) -> bool {
        self.addr == other.addr && self.mask == other.mask
    }
}

impl PartialOrd for Ipv4 {
    fn partial_cmp(&self, other: &Ipv4) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
