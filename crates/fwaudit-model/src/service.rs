//! Services: a protocol paired with a destination port or ICMP type range.
//!
//! Token grammar: `proto`, `proto/any`, `proto/dynamic`, `proto/<n>`,
//! `proto/<n>-<m>` where `proto` is tcp, udp or icmp. `dynamic` maps to
//! the 0-0 range, the convention used by rule exports for
//! negotiated-port services.

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::{DomainKind, Domains};
use crate::error::{ModelError, ModelResult};
use crate::mvalue::Mvalue;
use crate::range::Range;

/// Protocols the port model distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolKind {
    Udp = 0,
    Tcp = 1,
    Icmp = 2,
}

impl ProtocolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProtocolKind::Udp => "udp",
            ProtocolKind::Tcp => "tcp",
            ProtocolKind::Icmp => "icmp",
        }
    }

    /// The domain holding this protocol's port (or ICMP type) values.
    pub fn port_domain(self) -> DomainKind {
        match self {
            ProtocolKind::Udp => DomainKind::DstUdpPort,
            ProtocolKind::Tcp => DomainKind::DstTcpPort,
            ProtocolKind::Icmp => DomainKind::IcmpType,
        }
    }
}

/// A named service. The `any` sentinel places no constraint at all; every
/// other service constrains the protocol and its port domain.
#[derive(Debug, Clone)]
pub struct Service {
    name: String,
    protocol: Option<ProtocolKind>,
    proto_value: Mvalue,
    ports: Mvalue,
    any: bool,
}

impl Service {
    fn with_protocol(
        name: impl Into<String>,
        protocol: ProtocolKind,
        lower: u16,
        upper: u16,
    ) -> Self {
        let port_domain = protocol.port_domain();
        Service {
            name: name.into(),
            protocol: Some(protocol),
            proto_value: Mvalue::singleton(DomainKind::Protocol, protocol as u128),
            ports: Mvalue::new(
                port_domain,
                Range::new(port_domain.width(), lower as u128, upper as u128),
            ),
            any: false,
        }
    }

    pub fn tcp(name: impl Into<String>, lower: u16, upper: u16) -> Self {
        Self::with_protocol(name, ProtocolKind::Tcp, lower, upper)
    }

    pub fn udp(name: impl Into<String>, lower: u16, upper: u16) -> Self {
        Self::with_protocol(name, ProtocolKind::Udp, lower, upper)
    }

    pub fn icmp(name: impl Into<String>, lower: u8, upper: u8) -> Self {
        Self::with_protocol(name, ProtocolKind::Icmp, lower as u16, upper as u16)
    }

    pub fn any() -> Self {
        Service {
            name: "any".to_string(),
            protocol: None,
            proto_value: Mvalue::spanning(DomainKind::Protocol),
            ports: Mvalue::spanning(DomainKind::DstTcpPort),
            any: true,
        }
    }

    /// Parses a `proto[/ports]` token.
    pub fn parse(name: impl Into<String>, token: &str) -> ModelResult<Self> {
        let invalid = || ModelError::InvalidService {
            token: token.to_string(),
        };

        if token.eq_ignore_ascii_case("any") {
            return Ok(Self::any());
        }

        let (proto, ports) = match token.split_once('/') {
            Some((p, r)) => (p, Some(r)),
            None => (token, None),
        };

        let protocol = if proto.eq_ignore_ascii_case("tcp") {
            ProtocolKind::Tcp
        } else if proto.eq_ignore_ascii_case("udp") {
            ProtocolKind::Udp
        } else if proto.eq_ignore_ascii_case("icmp") {
            ProtocolKind::Icmp
        } else {
            return Err(invalid());
        };

        let max = protocol.port_domain().max() as u16;
        let (lower, upper) = match ports {
            None => (0, max),
            Some(r) if r.eq_ignore_ascii_case("any") => (0, max),
            Some(r) if r.eq_ignore_ascii_case("dynamic") => (0, 0),
            Some(r) => parse_port_range(r, max).ok_or_else(invalid)?,
        };

        Ok(Self::with_protocol(name, protocol, lower, upper))
    }

    pub fn protocol(&self) -> Option<ProtocolKind> {
        self.protocol
    }

    pub fn ports(&self) -> &Range {
        self.ports.range()
    }
}

fn parse_port_range(text: &str, max: u16) -> Option<(u16, u16)> {
    let parse_one = |s: &str| -> Option<u16> {
        let v: u32 = s.parse().ok()?;
        if v > max as u32 {
            return None;
        }
        Some(v as u16)
    };

    match text.split_once('-') {
        Some((lo, hi)) => {
            let lower = parse_one(lo)?;
            let upper = parse_one(hi)?;
            (lower <= upper).then_some((lower, upper))
        }
        None => {
            let v = parse_one(text)?;
            Some((v, v))
        }
    }
}

impl Atom for Service {
    fn name(&self) -> &str {
        &self.name
    }

    fn make_bdd(&self, dom: &Domains) -> Bdd {
        if self.any {
            return dom.mk_true();
        }
        self.proto_value.make_bdd(dom).and(&self.ports.make_bdd(dom))
    }

    fn value_text(&self) -> String {
        match self.protocol {
            None => "any".to_string(),
            Some(p) => {
                if self.ports.is_full() {
                    p.as_str().to_string()
                } else {
                    format!("{}/{}", p.as_str(), self.ports.range())
                }
            }
        }
    }

    fn is_any(&self) -> bool {
        self.any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BddExt;

    #[test]
    fn parses_the_token_grammar() {
        assert_eq!(
            Service::parse("web", "tcp/80").unwrap().value_text(),
            "tcp/80"
        );
        assert_eq!(
            Service::parse("dns", "udp/53").unwrap().ports().lb(),
            53
        );
        assert_eq!(Service::parse("t", "tcp").unwrap().value_text(), "tcp");
        assert_eq!(Service::parse("t", "tcp/any").unwrap().value_text(), "tcp");
        let dynamic = Service::parse("d", "udp/dynamic").unwrap();
        assert!(dynamic.ports().same_bounds(&Range::new(16, 0, 0)));
        assert!(Service::parse("x", "gre").is_err());
        assert!(Service::parse("x", "tcp/99999").is_err());
        assert!(Service::parse("x", "tcp/90-80").is_err());
    }

    #[test]
    fn equal_port_spans_compile_to_equal_conditions() {
        let dom = Domains::new();
        let a = Service::parse("a", "tcp/80").unwrap();
        let b = Service::parse("b", "tcp/80-80").unwrap();
        assert_eq!(a.make_bdd(&dom), b.make_bdd(&dom));
    }

    #[test]
    fn tcp_and_udp_on_one_port_are_disjoint() {
        let dom = Domains::new();
        let t = Service::tcp("t", 53, 53).make_bdd(&dom);
        let u = Service::udp("u", 53, 53).make_bdd(&dom);
        assert!(t.is_disjoint(&u));
    }

    #[test]
    fn any_service_is_unconstrained() {
        let dom = Domains::new();
        assert!(Service::any().make_bdd(&dom).is_true());
    }
}
