//! Security rules.

use biodivine_lib_bdd::Bdd;

use crate::atom::Atom;
use crate::domain::Domains;
use crate::engine::{BddExt, NodeRelation};
use crate::group::Group;
use crate::predicate::Predicate;
use crate::table::{Cell, Row, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Deny,
    Allow,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::Allow => "allow",
            RuleAction::Deny => "deny",
        }
    }
}

impl std::ops::Not for RuleAction {
    type Output = RuleAction;

    fn not(self) -> RuleAction {
        match self {
            RuleAction::Allow => RuleAction::Deny,
            RuleAction::Deny => RuleAction::Allow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Disabled,
    Enabled,
}

impl RuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleStatus::Enabled => "enabled",
            RuleStatus::Disabled => "disabled",
        }
    }
}

/// Column selection for rule tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub rule_name: bool,
    pub address_name: bool,
    pub service_name: bool,
    pub application_name: bool,
    pub user_name: bool,
    pub url: bool,
    pub negate_address: bool,
}

/// One access-control rule. Everything but the status is immutable; ids
/// are positive and unique within the owning firewall.
#[derive(Debug, Clone)]
pub struct Rule {
    id: u32,
    name: String,
    status: RuleStatus,
    action: RuleAction,
    predicate: Predicate,
}

impl Rule {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        status: RuleStatus,
        action: RuleAction,
        predicate: Predicate,
    ) -> Self {
        assert!(id > 0, "rule ids are positive");
        Rule {
            id,
            name: name.into(),
            status,
            action,
            predicate,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RuleStatus {
        self.status
    }

    pub fn set_status(&mut self, status: RuleStatus) {
        self.status = status;
    }

    pub fn action(&self) -> RuleAction {
        self.action
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// True when the rule admits only its applications' default services.
    pub fn is_default_app_svc(&self) -> bool {
        self.predicate.is_app_default()
    }

    pub fn is_deny_all(&self, dom: &Domains) -> bool {
        self.action == RuleAction::Deny && self.predicate.is_any(dom)
    }

    /// Same test against an already compiled condition.
    pub(crate) fn is_deny_all_bdd(&self, bdd: &Bdd) -> bool {
        self.action == RuleAction::Deny && bdd.is_any()
    }

    /// Rules compare by their conditions, not by id.
    pub fn compare(&self, other: &Rule, dom: &Domains) -> NodeRelation {
        self.predicate
            .make_bdd(dom)
            .relation(&other.predicate.make_bdd(dom))
    }

    pub(crate) fn write_to_row(&self, row: &mut Row, options: &OutputOptions) {
        let predicate = &self.predicate;
        let mut col = 0;

        row.cell(col).append(self.id.to_string());
        col += 1;
        if options.rule_name {
            row.cell(col).append(&self.name);
            col += 1;
        }
        row.cell(col).append(self.action.as_str());
        col += 1;
        write_names(row.cell(col), predicate.src_zones());
        col += 1;
        write_names(row.cell(col), predicate.dst_zones());
        col += 1;
        if options.negate_address {
            row.cell(col)
                .append(if predicate.negate_src_addresses() { "yes" } else { "no" });
            col += 1;
        }
        if options.address_name {
            write_names(row.cell(col), predicate.src_addresses());
            col += 1;
        }
        write_values(row.cell(col), predicate.src_addresses());
        col += 1;
        if options.negate_address {
            row.cell(col)
                .append(if predicate.negate_dst_addresses() { "yes" } else { "no" });
            col += 1;
        }
        if options.address_name {
            write_names(row.cell(col), predicate.dst_addresses());
            col += 1;
        }
        write_values(row.cell(col), predicate.dst_addresses());
        col += 1;
        if options.service_name {
            write_service_names(row.cell(col), self);
            col += 1;
        }
        write_values(row.cell(col), predicate.services());
        col += 1;
        if options.application_name {
            write_names(row.cell(col), predicate.applications());
            col += 1;
        }
        if options.user_name {
            write_names(row.cell(col), predicate.users());
            col += 1;
        }
        if options.url {
            write_names(row.cell(col), predicate.urls());
            col += 1;
        }
        let _ = col;
    }

    /// A vertical attribute/name/value table for `fw show rule <id>`.
    pub fn create_table(&self, options: &OutputOptions) -> Table {
        let mut table = Table::new(vec!["attribute", "name", "value"]);
        let predicate = &self.predicate;

        let row = table.add_row();
        row.cell(0).append("name");
        row.cell(1).append(&self.name);
        row.cell(2).append(self.id.to_string());

        let row = table.add_row();
        row.cell(0).append("status");
        row.cell(1).append(self.status.as_str());
        row.cell(2)
            .append(if self.status == RuleStatus::Enabled { "1" } else { "0" });

        let row = table.add_row();
        row.cell(0).append("action");
        row.cell(1).append(self.action.as_str());
        row.cell(2)
            .append(if self.action == RuleAction::Allow { "1" } else { "0" });

        let row = table.add_row();
        row.cell(0).append("src.zone");
        write_names(row.cell(1), predicate.src_zones());
        write_values(row.cell(2), predicate.src_zones());

        let row = table.add_row();
        row.cell(0).append("dst.zone");
        write_names(row.cell(1), predicate.dst_zones());
        write_values(row.cell(2), predicate.dst_zones());

        let row = table.add_row();
        row.cell(0).append(if predicate.negate_src_addresses() {
            "!src.addr"
        } else {
            "src.addr"
        });
        write_names(row.cell(1), predicate.src_addresses());
        write_values(row.cell(2), predicate.src_addresses());

        let row = table.add_row();
        row.cell(0).append(if predicate.negate_dst_addresses() {
            "!dst.addr"
        } else {
            "dst.addr"
        });
        write_names(row.cell(1), predicate.dst_addresses());
        write_values(row.cell(2), predicate.dst_addresses());

        let row = table.add_row();
        row.cell(0).append("services");
        write_service_names(row.cell(1), self);
        write_values(row.cell(2), predicate.services());

        if options.application_name {
            let row = table.add_row();
            row.cell(0).append("applications");
            write_names(row.cell(1), predicate.applications());
            write_values(row.cell(2), predicate.applications());
        }

        if options.user_name {
            let row = table.add_row();
            row.cell(0).append("users");
            write_names(row.cell(1), predicate.users());
            write_values(row.cell(2), predicate.users());
        }

        if options.url {
            let row = table.add_row();
            row.cell(0).append("urls");
            write_names(row.cell(1), predicate.urls());
            write_values(row.cell(2), predicate.urls());
        }

        table
    }
}

pub(crate) fn write_names<T: Atom>(cell: &mut Cell, group: &Group<T>) {
    for item in group.items() {
        cell.append_line(item.name());
    }
}

pub(crate) fn write_values<T: Atom>(cell: &mut Cell, group: &Group<T>) {
    for item in group.items() {
        cell.append_line(item.value_text());
    }
}

/// Service name column: application-default rules print the marker, every
/// other rule prints its member names.
fn write_service_names(cell: &mut Cell, rule: &Rule) {
    if rule.is_default_app_svc() {
        cell.append("app-default");
    } else {
        write_names(cell, rule.predicate().services());
    }
}
