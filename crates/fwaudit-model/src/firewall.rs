//! A firewall owns its rules in insertion order.

use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};
use crate::options::ModelOptions;
use crate::rule::{OutputOptions, Rule, RuleAction, RuleStatus};
use crate::rulelist::RuleList;
use crate::table::Table;

#[derive(Debug, Default)]
pub struct Firewall {
    name: String,
    rules: Vec<Rule>,
    index: BTreeMap<u32, usize>,
}

impl Firewall {
    pub fn new(name: impl Into<String>) -> Self {
        Firewall {
            name: name.into(),
            rules: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// A copy of another firewall under a new name.
    pub fn duplicate(other: &Firewall, name: impl Into<String>) -> Self {
        let mut firewall = Firewall::new(name);
        for rule in &other.rules {
            firewall.add_rule(rule.clone()).expect("ids unique in source");
        }
        firewall
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_rule(&mut self, rule: Rule) -> ModelResult<()> {
        if self.index.contains_key(&rule.id()) {
            return Err(ModelError::DuplicateRuleId { id: rule.id() });
        }
        self.index.insert(rule.id(), self.rules.len());
        self.rules.push(rule);
        Ok(())
    }

    pub fn get_rule(&self, id: u32) -> Option<&Rule> {
        self.index.get(&id).map(|&i| &self.rules[i])
    }

    pub fn get_rule_mut(&mut self, id: u32) -> Option<&mut Rule> {
        self.index.get(&id).copied().map(move |i| &mut self.rules[i])
    }

    /// The largest rule id in use.
    pub fn max_rule_id(&self) -> u32 {
        self.index.keys().next_back().copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.index.clear();
    }

    /// All rules, in insertion order.
    pub fn rules(&self) -> RuleList<'_> {
        self.rules.iter().collect()
    }

    /// The access-control list: the enabled rules, in insertion order.
    pub fn acl(&self) -> RuleList<'_> {
        self.rules().filter_status(RuleStatus::Enabled)
    }

    /// Derives the table columns from what the rule base actually uses.
    pub fn make_output_options(
        &self,
        show_object_names: bool,
        model: ModelOptions,
    ) -> OutputOptions {
        let acl = self.acl();
        OutputOptions {
            rule_name: acl.have_names(),
            negate_address: acl.have_negate(),
            address_name: show_object_names,
            service_name: show_object_names,
            application_name: model.applications,
            user_name: model.users,
            url: model.urls,
        }
    }

    pub fn create_rules_table(&self, options: &OutputOptions) -> Table {
        self.acl().create_table(options)
    }

    /// A summary of the rule base.
    pub fn info(&self) -> Table {
        let mut table = Table::new(vec!["info", "value"]);
        let rules = self.rules();
        let acl = self.acl();

        let mut add = |label: &str, value: String| {
            let row = table.add_row();
            row.cell(0).append(label);
            row.cell(1).append(value);
        };

        add("Name", self.name.clone());
        add("Total Rules", rules.len().to_string());
        add(
            "Disabled Rules",
            rules.filter_status(RuleStatus::Disabled).len().to_string(),
        );
        add(
            "Allow Rules",
            rules.filter_action(RuleAction::Allow).len().to_string(),
        );
        add(
            "Deny Rules",
            rules.filter_action(RuleAction::Deny).len().to_string(),
        );
        add("Source zones", acl.all_src_zones().len().to_string());
        add("Destination zones", acl.all_dst_zones().len().to_string());
        add("Address objects", acl.all_addresses().len().to_string());
        add("Service objects", acl.all_services().len().to_string());
        add(
            "Application objects",
            acl.all_applications().len().to_string(),
        );
        add("User objects", acl.all_users().len().to_string());
        add("Url objects", acl.all_urls().len().to_string());

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Predicate;

    fn rule(id: u32, status: RuleStatus, action: RuleAction) -> Rule {
        Rule::new(id, format!("r{id}"), status, action, Predicate::any())
    }

    #[test]
    fn acl_keeps_only_enabled_rules_in_order() {
        let mut fw = Firewall::new("edge");
        fw.add_rule(rule(1, RuleStatus::Enabled, RuleAction::Allow)).unwrap();
        fw.add_rule(rule(2, RuleStatus::Disabled, RuleAction::Allow)).unwrap();
        fw.add_rule(rule(3, RuleStatus::Enabled, RuleAction::Deny)).unwrap();

        assert_eq!(fw.acl().id_list(), vec![1, 3]);
        assert_eq!(fw.rules().id_list(), vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_rule_ids_are_rejected() {
        let mut fw = Firewall::new("edge");
        fw.add_rule(rule(7, RuleStatus::Enabled, RuleAction::Allow)).unwrap();
        let err = fw
            .add_rule(rule(7, RuleStatus::Enabled, RuleAction::Deny))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateRuleId { id: 7 }));
    }

    #[test]
    fn duplicate_copies_every_rule() {
        let mut fw = Firewall::new("edge");
        fw.add_rule(rule(1, RuleStatus::Enabled, RuleAction::Allow)).unwrap();
        fw.add_rule(rule(2, RuleStatus::Enabled, RuleAction::Deny)).unwrap();

        let copy = Firewall::duplicate(&fw, "edge-copy");
        assert_eq!(copy.name(), "edge-copy");
        assert_eq!(copy.rules().id_list(), vec![1, 2]);
        assert_eq!(copy.max_rule_id(), 2);
    }
}
