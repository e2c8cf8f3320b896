//! Finite packet-field domains and their variable blocks.
//!
//! Every packet field the model can reason about is a finite integer
//! domain. Each domain owns a contiguous block of engine variables,
//! allocated once in declaration order when the [`Domains`] context is
//! built. Source and destination variants of zones and addresses are
//! distinct domains with disjoint blocks, so a source-address condition can
//! never be meaningfully compared with a destination-address condition.

use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet};

use crate::range::{Range, RangeStyle};

/// Identifies one dimension of the packet space.
///
/// The order of the variants is the variable allocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    SrcZone,
    SrcAddress4,
    SrcAddress6,
    DstZone,
    DstAddress4,
    DstAddress6,
    Protocol,
    DstTcpPort,
    DstUdpPort,
    IcmpType,
    Application,
    User,
    Url,
}

impl DomainKind {
    pub const ALL: [DomainKind; 13] = [
        DomainKind::SrcZone,
        DomainKind::SrcAddress4,
        DomainKind::SrcAddress6,
        DomainKind::DstZone,
        DomainKind::DstAddress4,
        DomainKind::DstAddress6,
        DomainKind::Protocol,
        DomainKind::DstTcpPort,
        DomainKind::DstUdpPort,
        DomainKind::IcmpType,
        DomainKind::Application,
        DomainKind::User,
        DomainKind::Url,
    ];

    /// Width of the domain in bits.
    pub fn width(self) -> u16 {
        match self {
            DomainKind::SrcZone | DomainKind::DstZone => 10,
            DomainKind::SrcAddress4 | DomainKind::DstAddress4 => 32,
            DomainKind::SrcAddress6 | DomainKind::DstAddress6 => 128,
            DomainKind::Protocol | DomainKind::IcmpType => 8,
            DomainKind::DstTcpPort | DomainKind::DstUdpPort => 16,
            DomainKind::Application | DomainKind::User | DomainKind::Url => 16,
        }
    }

    /// Largest value representable in this domain.
    pub fn max(self) -> u128 {
        let w = self.width();
        if w == 128 {
            u128::MAX
        } else {
            (1u128 << w) - 1
        }
    }

    pub(crate) fn range_style(self) -> RangeStyle {
        match self {
            DomainKind::SrcAddress4 | DomainKind::DstAddress4 => RangeStyle::Ipv4,
            DomainKind::SrcAddress6 | DomainKind::DstAddress6 => {
                RangeStyle::Ipv6 { v4_format: false }
            }
            _ => RangeStyle::Plain,
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).expect("domain in table")
    }
}

/// Distinguishes the source and destination variants of a packet field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Src,
    Dst,
}

impl Side {
    pub fn zone_domain(self) -> DomainKind {
        match self {
            Side::Src => DomainKind::SrcZone,
            Side::Dst => DomainKind::DstZone,
        }
    }

    pub fn address4_domain(self) -> DomainKind {
        match self {
            Side::Src => DomainKind::SrcAddress4,
            Side::Dst => DomainKind::DstAddress4,
        }
    }

    pub fn address6_domain(self) -> DomainKind {
        match self {
            Side::Src => DomainKind::SrcAddress6,
            Side::Dst => DomainKind::DstAddress6,
        }
    }
}

/// Which IP address families the model reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpModel {
    V4,
    V6,
    Dual,
}

impl IpModel {
    pub fn models_v4(self) -> bool {
        matches!(self, IpModel::V4 | IpModel::Dual)
    }

    pub fn models_v6(self) -> bool {
        matches!(self, IpModel::V6 | IpModel::Dual)
    }
}

impl std::fmt::Display for IpModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IpModel::V4 => "IPv4",
            IpModel::V6 => "IPv6",
            IpModel::Dual => "IPv6+IPv4",
        })
    }
}

/// The packet-space context: one engine variable set and the thirteen
/// domain blocks carved out of it.
///
/// Built once at program start and passed by reference to every
/// BDD-producing call. Tests build their own in a fixture.
pub struct Domains {
    set: BddVariableSet,
    blocks: Vec<Vec<BddVariable>>,
}

impl Domains {
    pub fn new() -> Self {
        let total: u16 = DomainKind::ALL.iter().map(|k| k.width()).sum();
        let set = BddVariableSet::new_anonymous(total);
        let vars = set.variables();

        let mut blocks = Vec::with_capacity(DomainKind::ALL.len());
        let mut offset = 0usize;
        for kind in DomainKind::ALL {
            let width = kind.width() as usize;
            blocks.push(vars[offset..offset + width].to_vec());
            offset += width;
        }

        Domains { set, blocks }
    }

    pub fn var_set(&self) -> &BddVariableSet {
        &self.set
    }

    /// The variable block encoding the given domain, most significant bit
    /// first.
    pub fn block(&self, kind: DomainKind) -> &[BddVariable] {
        &self.blocks[kind.index()]
    }

    /// The full interval of the given domain.
    pub fn full_range(&self, kind: DomainKind) -> Range {
        Range::with_style(kind.width(), 0, kind.max(), kind.range_style())
    }

    pub fn num_vars(&self) -> u16 {
        self.set.num_vars()
    }

    pub fn mk_true(&self) -> Bdd {
        self.set.mk_true()
    }

    pub fn mk_false(&self) -> Bdd {
        self.set.mk_false()
    }
}

impl Default for Domains {
    fn default() -> Self {
        Self::new()
    }
}
