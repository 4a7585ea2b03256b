//! CIDR arithmetic over IPv4 and IPv6 prefixes.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use minijinja::value::Rest;

use super::failure;

/// Address of host number `hostnum` within `prefix`, negative numbers count
/// back from the end of the range.
pub fn cidr_host(prefix: &str, hostnum: i64) -> Result<String, minijinja::Error> {
    let net = parse(prefix)?;
    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    let magnitude = u128::from(hostnum.unsigned_abs());

    let offset = match (hostnum < 0, span(host_bits)) {
        (false, Some(size)) if magnitude < size => magnitude,
        (false, None) => magnitude,
        (true, Some(size)) if magnitude <= size => size - magnitude,
        (true, None) => u128::MAX - (magnitude - 1),
        _ => {
            return Err(failure(
                "cidrHost",
                format!("prefix '{prefix}' has no host number {hostnum}"),
            ))
        }
    };
    Ok(address(&net, base(&net) + offset).to_string())
}

/// Dotted netmask of an IPv4 prefix.
pub fn cidr_netmask(prefix: &str) -> Result<String, minijinja::Error> {
    match parse(prefix)? {
        IpNet::V4(net) => Ok(net.netmask().to_string()),
        IpNet::V6(_) => Err(failure("cidrNetmask", format!("'{prefix}' is not an IPv4 prefix"))),
    }
}

/// The `netnum`-th subnet of `prefix` extended by `newbits`.
pub fn cidr_subnet(prefix: &str, newbits: u32, netnum: i64) -> Result<String, minijinja::Error> {
    let net = parse(prefix)?;
    let new_len = extended_len(&net, newbits)?;
    let count = span(newbits);
    let netnum = u128::try_from(netnum)
        .ok()
        .filter(|n| count.map_or(true, |count| *n < count))
        .ok_or_else(|| {
            failure(
                "cidrSubnet",
                format!("prefix '{prefix}' extended by {newbits} bits has no network {netnum}"),
            )
        })?;

    let shift = u32::from(net.max_prefix_len() - new_len);
    let offset = netnum.checked_shl(shift).unwrap_or(0);
    subnet(&net, base(&net) + offset, new_len).map(|s| s.to_string())
}

/// Consecutive subnets of `prefix`, one per entry of `newbits`, each
/// aligned to its own size.
pub fn cidr_subnets(prefix: &str, newbits: Rest<u32>) -> Result<Vec<String>, minijinja::Error> {
    let net = parse(prefix)?;
    let start = base(&net);
    let parent = span(u32::from(net.max_prefix_len() - net.prefix_len()));

    let mut next = start;
    let mut subnets = Vec::with_capacity(newbits.len());
    for bits in newbits.iter().copied() {
        let new_len = extended_len(&net, bits)?;
        let size = span(u32::from(net.max_prefix_len() - new_len));
        if let Some(size) = size {
            next = next
                .checked_next_multiple_of(size)
                .ok_or_else(|| exhausted(prefix))?;
        }
        let used = size.and_then(|size| (next - start).checked_add(size));
        if let (Some(parent), Some(used)) = (parent, used) {
            if used > parent {
                return Err(exhausted(prefix));
            }
        }

        subnets.push(subnet(&net, next, new_len)?.to_string());
        next = match size {
            Some(size) => next.checked_add(size).ok_or_else(|| exhausted(prefix))?,
            None => next,
        };
    }
    Ok(subnets)
}

fn parse(prefix: &str) -> Result<IpNet, minijinja::Error> {
    prefix
        .parse::<IpNet>()
        .map_err(|e| failure(&format!("invalid prefix '{prefix}'"), e))
}

fn extended_len(net: &IpNet, newbits: u32) -> Result<u8, minijinja::Error> {
    let available = net.max_prefix_len() - net.prefix_len();
    u32::from(net.prefix_len())
        .checked_add(newbits)
        .filter(|len| *len <= u32::from(net.max_prefix_len()))
        .and_then(|len| u8::try_from(len).ok())
        .ok_or_else(|| {
            failure(
                "cidr",
                format!("cannot extend '{net}' by {newbits} bits, only {available} bits are available"),
            )
        })
}

/// `2^bits`, `None` when it does not fit a u128.
fn span(bits: u32) -> Option<u128> {
    1u128.checked_shl(bits)
}

fn base(net: &IpNet) -> u128 {
    match net.network() {
        IpAddr::V4(addr) => u128::from(u32::from(addr)),
        IpAddr::V6(addr) => u128::from(addr),
    }
}

fn address(net: &IpNet, value: u128) -> IpAddr {
    match net {
        IpNet::V4(_) => IpAddr::V4(Ipv4Addr::from(value as u32)),
        IpNet::V6(_) => IpAddr::V6(Ipv6Addr::from(value)),
    }
}

fn subnet(net: &IpNet, value: u128, len: u8) -> Result<IpNet, minijinja::Error> {
    IpNet::new(address(net, value), len).map_err(|e| failure("cidr", e))
}

fn exhausted(prefix: &str) -> minijinja::Error {
    failure("cidrSubnets", format!("not enough space in '{prefix}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cidr_host() {
        assert_eq!(cidr_host("10.12.112.0/20", 16).unwrap(), "10.12.112.16");
        assert_eq!(cidr_host("10.12.112.0/20", 268).unwrap(), "10.12.113.12");
        assert_eq!(cidr_host("10.12.112.0/20", -1).unwrap(), "10.12.127.255");
        assert_eq!(cidr_host("fd00:fd12:3456:7890::/56", 16).unwrap(), "fd00:fd12:3456:7800::10");
        assert!(cidr_host("10.0.0.0/30", 4).is_err());
    }

    #[test]
    fn test_cidr_netmask() {
        assert_eq!(cidr_netmask("172.16.0.0/12").unwrap(), "255.240.0.0");
        assert!(cidr_netmask("fd00::/8").is_err());
    }

    #[test]
    fn test_cidr_subnet() {
        assert_eq!(cidr_subnet("172.16.0.0/12", 4, 2).unwrap(), "172.18.0.0/16");
        assert_eq!(cidr_subnet("10.1.2.0/24", 4, 15).unwrap(), "10.1.2.240/28");
        assert!(cidr_subnet("10.1.2.0/24", 4, 16).is_err());
        assert!(cidr_subnet("10.1.2.0/24", 9, 0).is_err());
    }

    #[test]
    fn test_cidr_subnets_are_aligned() {
        let subnets = cidr_subnets("10.1.0.0/16", Rest(vec![4, 4, 8, 4])).unwrap();
        assert_eq!(subnets, vec!["10.1.0.0/20", "10.1.16.0/20", "10.1.32.0/24", "10.1.48.0/20"]);
    }

    #[test]
    fn test_cidr_subnets_exhausted() {
        assert!(cidr_subnets("10.1.0.0/24", Rest(vec![1, 1, 1])).is_err());
    }

    #[test]
    fn test_newbits_overflow_is_error() {
        assert!(cidr_subnet("10.0.0.0/24", u32::MAX, 0).is_err());
        assert!(cidr_subnet("fd00::/8", u32::MAX, 0).is_err());
        assert!(cidr_subnets("10.0.0.0/24", Rest(vec![u32::MAX])).is_err());
        assert!(cidr_subnets("10.0.0.0/24", Rest(vec![4, u32::MAX])).is_err());
    }
}
