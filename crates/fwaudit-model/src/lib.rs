//! Symbolic firewall rule model.
//!
//! Rules are encoded as boolean functions over a multi-dimensional packet
//! space using reduced ordered binary decision diagrams. Every
//! set-theoretic question about rules (containment, overlap, equality)
//! becomes a BDD operation, which is what makes the anomaly analysis, the
//! policy comparator and the packet tracer exact instead of heuristic.
//!
//! The crate is synchronous and context-driven: a [`domain::Domains`]
//! value is built once and passed to every compiling call. Nothing here
//! does I/O; loading catalogs and rendering tables live in the
//! neighbouring crates.

pub mod address;
pub mod analyzer;
pub mod anomaly;
pub mod application;
pub mod atom;
pub mod comparator;
pub mod domain;
pub mod engine;
pub mod error;
pub mod firewall;
pub mod group;
pub mod mvalue;
pub mod options;
pub mod packet;
pub mod predicate;
pub mod range;
pub mod rule;
pub mod rulelist;
pub mod service;
pub mod state;
pub mod table;
pub mod url;
pub mod user;
pub mod zone;

pub use address::{Address, AddressKind, IpVersion};
pub use analyzer::{Analyzer, ProgressSink, RulePair};
pub use anomaly::{AnomalyDetails, AnomalyLevel, AnomalyScope, AnomalyType, RuleAnomalies};
pub use application::Application;
pub use atom::Atom;
pub use comparator::{PolicyComparator, PolicyRelationship};
pub use domain::{DomainKind, Domains, IpModel, Side};
pub use engine::{BddExt, NodeRelation};
pub use error::{ModelError, ModelResult};
pub use firewall::Firewall;
pub use group::Group;
pub use mvalue::Mvalue;
pub use options::{BddScope, ModelOptions, OptionsCell, SharedOptions};
pub use packet::{PacketTester, TestPacket};
pub use predicate::{Destinations, Predicate, Sources};
pub use range::{Range, RangeStyle};
pub use rule::{OutputOptions, Rule, RuleAction, RuleStatus};
pub use rulelist::{Counters, RuleList};
pub use service::{ProtocolKind, Service};
pub use table::{Cell, Row, Table};
pub use url::Url;
pub use user::User;
pub use zone::Zone;
