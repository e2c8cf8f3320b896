//! IPv4 and IPv6 address atoms and their literal grammar.
//!
//! A literal token is one of `any`, a plain address, `addr/prefix`,
//! `addr/mask` (IPv4 only) or `lo-hi`. In strict mode a network literal
//! with host bits set is rejected; in loose mode it is widened to the
//! enclosing network, which is what most exported rule bases need.

use std::net::{Ipv4Addr, Ipv6Addr};

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{Domains, Side};
use crate::error::{ModelError, ModelResult};
use crate::mvalue::Mvalue;
use crate::range::{Range, RangeStyle};

/// How the literal was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    Address,
    Subnet,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

/// One source or destination address interval.
#[derive(Debug, Clone)]
pub struct Address {
    name: String,
    side: Side,
    kind: AddressKind,
    version: IpVersion,
    value: Mvalue,
    any: bool,
}

impl Address {
    pub fn new_v4(
        name: impl Into<String>,
        side: Side,
        kind: AddressKind,
        lower: u32,
        upper: u32,
    ) -> Self {
        let domain = side.address4_domain();
        Address {
            name: name.into(),
            side,
            kind,
            version: IpVersion::V4,
            value: Mvalue::new(
                domain,
                Range::with_style(32, lower as u128, upper as u128, RangeStyle::Ipv4),
            ),
            any: false,
        }
    }

    pub fn new_v6(
        name: impl Into<String>,
        side: Side,
        kind: AddressKind,
        lower: u128,
        upper: u128,
        v4_format: bool,
    ) -> Self {
        let domain = side.address6_domain();
        Address {
            name: name.into(),
            side,
            kind,
            version: IpVersion::V6,
            value: Mvalue::new(
                domain,
                Range::with_style(128, lower, upper, RangeStyle::Ipv6 { v4_format }),
            ),
            any: false,
        }
    }

    pub fn any(side: Side) -> Self {
        Address {
            name: "any".to_string(),
            side,
            kind: AddressKind::Subnet,
            version: IpVersion::V4,
            value: Mvalue::spanning(side.address4_domain()),
            any: true,
        }
    }

    /// Parses a literal token into an address atom.
    pub fn parse(
        name: impl Into<String>,
        side: Side,
        token: &str,
        strict: bool,
    ) -> ModelResult<Self> {
        let invalid = |reason: &str| ModelError::InvalidAddress {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        if token.eq_ignore_ascii_case("any") {
            return Ok(Self::any(side));
        }

        if token.contains(':') {
            let (lower, upper, kind) = parse_v6(token, strict).map_err(|r| invalid(r))?;
            return Ok(Self::new_v6(name, side, kind, lower, upper, false));
        }

        let (lower, upper, kind) = parse_v4(token, strict).map_err(|r| invalid(r))?;
        Ok(Self::new_v4(name, side, kind, lower, upper))
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn version(&self) -> IpVersion {
        self.version
    }

    pub fn range(&self) -> &Range {
        self.value.range()
    }

    /// Rebuilds this interval on the other side of the packet space.
    /// Needed by the symmetry check: source and destination addresses live
    /// in disjoint domains and can only be compared after this crossover.
    pub fn flipped(&self, side: Side) -> Address {
        let range = self.value.range();
        match self.version {
            IpVersion::V4 => Address::new_v4(
                self.name.clone(),
                side,
                self.kind,
                range.lb() as u32,
                range.ub() as u32,
            ),
            IpVersion::V6 => {
                let v4_format = matches!(range.style(), RangeStyle::Ipv6 { v4_format: true });
                Address::new_v6(
                    self.name.clone(),
                    side,
                    self.kind,
                    range.lb(),
                    range.ub(),
                    v4_format,
                )
            }
        }
    }
}

impl Atom for Address {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any {
            return dom.mk_true();
        }
        self.value.make_bdd(dom)
    }

    fn value_text(&self) -> String {
        if self.any {
            "any".to_string()
        } else {
            self.value.to_string()
        }
    }

    fn is_any(&self) -> bool {
        self.any
    }
}

fn parse_v4(token: &str, strict: bool) -> Result<(u32, u32, AddressKind), &'static str> {
    if let Some((net, mask)) = token.split_once('/') {
        let network: Ipv4Addr = net.parse().map_err(|_| "invalid network address")?;
        let network = u32::from(network);

        let mask = if mask.len() <= 2 {
            let bits: u32 = mask.parse().map_err(|_| "invalid prefix length")?;
            if bits > 32 {
                return Err("invalid prefix length");
            }
            (0xFFFF_FFFFu64 ^ (0xFFFF_FFFFu64 >> bits)) as u32
        } else {
            let mask: Ipv4Addr = mask.parse().map_err(|_| "invalid netmask")?;
            u32::from(mask)
        };

        if strict && (network & mask) != network {
            return Err("host bits set in network address");
        }

        let lower = network & mask;
        let upper = lower | !mask;
        let kind = if upper > lower {
            AddressKind::Subnet
        } else {
            AddressKind::Address
        };
        return Ok((lower, upper, kind));
    }

    if let Some((lo, hi)) = token.split_once('-') {
        let lower: Ipv4Addr = lo.parse().map_err(|_| "invalid range")?;
        let upper: Ipv4Addr = hi.parse().map_err(|_| "invalid range")?;
        let (lower, upper) = (u32::from(lower), u32::from(upper));
        if lower > upper {
            return Err("range bounds inverted");
        }
        return Ok((lower, upper, AddressKind::Range));
    }

    let addr: Ipv4Addr = token.parse().map_err(|_| "invalid address")?;
    let value = u32::from(addr);
    Ok((value, value, AddressKind::Address))
}

fn parse_v6(token: &str, strict: bool) -> Result<(u128, u128, AddressKind), &'static str> {
    if let Some((net, prefix)) = token.split_once('/') {
        let network: Ipv6Addr = net.parse().map_err(|_| "invalid network address")?;
        let network = u128::from(network);
        let bits: u32 = prefix.parse().map_err(|_| "invalid prefix length")?;
        if bits > 128 {
            return Err("invalid prefix length");
        }

        let mask = if bits == 0 {
            0
        } else {
            u128::MAX << (128 - bits)
        };
        if strict && (network & mask) != network {
            return Err("host bits set in network address");
        }

        let lower = network & mask;
        let upper = lower | !mask;
        let kind = if upper > lower {
            AddressKind::Subnet
        } else {
            AddressKind::Address
        };
        return Ok((lower, upper, kind));
    }

    if let Some((lo, hi)) = token.split_once('-') {
        let lower: Ipv6Addr = lo.parse().map_err(|_| "invalid range")?;
        let upper: Ipv6Addr = hi.parse().map_err(|_| "invalid range")?;
        let (lower, upper) = (u128::from(lower), u128::from(upper));
        if lower > upper {
            return Err("range bounds inverted");
        }
        return Ok((lower, upper, AddressKind::Range));
    }

    let addr: Ipv6Addr = token.parse().map_err(|_| "invalid address")?;
    let value = u128::from(addr);
    Ok((value, value, AddressKind::Address))
}
