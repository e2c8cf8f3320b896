//! Anomaly findings and their tabular report.

use crate::rule::{Rule, RuleAction};
use crate::rulelist::RuleList;
use crate::table::{Cell, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyScope {
    FullyMaskedRule,
    PartiallyMaskedRule,
}

impl AnomalyScope {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyScope::FullyMaskedRule => "Fully masked",
            AnomalyScope::PartiallyMaskedRule => "Partially masked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyLevel {
    Warning,
    Error,
}

impl AnomalyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AnomalyLevel::Warning => "warning",
            AnomalyLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyType {
    Shadowing,
    Redundancy,
    Correlation,
    Generalization,
    RedundancyOrCorrelation,
}

/// What was found, with the earlier rules that triggered the finding.
#[derive(Debug, Clone)]
pub enum AnomalyDetails<'a> {
    Shadowed { shadowing: RuleList<'a> },
    FullRedundant { redundant: RuleList<'a> },
    PartialRedundant { redundant: RuleList<'a> },
    Correlated { correlated: RuleList<'a> },
    RedundantOrCorrelated {
        redundant: RuleList<'a>,
        correlated: RuleList<'a>,
    },
    Generalization { generalized: RuleList<'a> },
}

impl AnomalyDetails<'_> {
    pub fn scope(&self) -> AnomalyScope {
        match self {
            AnomalyDetails::Shadowed { .. } | AnomalyDetails::FullRedundant { .. } => {
                AnomalyScope::FullyMaskedRule
            }
            _ => AnomalyScope::PartiallyMaskedRule,
        }
    }

    pub fn level(&self) -> AnomalyLevel {
        match self {
            AnomalyDetails::Correlated { .. } | AnomalyDetails::Generalization { .. } => {
                AnomalyLevel::Warning
            }
            _ => AnomalyLevel::Error,
        }
    }

    pub fn kind(&self) -> AnomalyType {
        match self {
            AnomalyDetails::Shadowed { .. } => AnomalyType::Shadowing,
            AnomalyDetails::FullRedundant { .. } | AnomalyDetails::PartialRedundant { .. } => {
                AnomalyType::Redundancy
            }
            AnomalyDetails::Correlated { .. } => AnomalyType::Correlation,
            AnomalyDetails::RedundantOrCorrelated { .. } => AnomalyType::RedundancyOrCorrelation,
            AnomalyDetails::Generalization { .. } => AnomalyType::Generalization,
        }
    }

    fn write_to_cell(&self, cell: &mut Cell, rule: &Rule) {
        let allow = rule.action() == RuleAction::Allow;
        match self {
            AnomalyDetails::Shadowed { shadowing } => {
                cell.append_line("Shadowed rule")
                    .append(format!(
                        "packets are {} by {} ",
                        if allow { "denied" } else { "accepted" },
                        plural_rules(shadowing)
                    ))
                    .append_ids(&shadowing.id_list());
            }
            AnomalyDetails::FullRedundant { redundant } => {
                cell.append_line("Redundant rule")
                    .append(format!(
                        "packets are {} by {} ",
                        if allow { "accepted" } else { "denied" },
                        plural_rules(redundant)
                    ))
                    .append_ids(&redundant.id_list());
            }
            AnomalyDetails::PartialRedundant { redundant } => {
                cell.append("Rule")
                    .append(if redundant.len() > 1 { "s " } else { " " })
                    .append_ids(&redundant.id_list())
                    .append_line("")
                    .append(format!(
                        "{} redundant with this rule",
                        if redundant.len() > 1 { "are all" } else { "is" }
                    ));
            }
            AnomalyDetails::Correlated { correlated } => {
                cell.append_line("Correlated rule")
                    .append(format!(
                        "part of packets are {} by {} ",
                        if allow { "denied" } else { "accepted" },
                        plural_rules(correlated)
                    ))
                    .append_ids(&correlated.id_list());
            }
            AnomalyDetails::RedundantOrCorrelated {
                redundant,
                correlated,
            } => {
                if correlated.is_empty() {
                    cell.append_line("Redundant rule");
                } else {
                    cell.append_line("Redundant or correlated rule");
                }
                cell.append(format!(
                    "part of packets are {} by {} ",
                    if allow { "allowed" } else { "denied" },
                    plural_rules(redundant)
                ))
                .append_ids(&redundant.id_list());

                if !correlated.is_empty() {
                    cell.append_line("")
                        .append(format!(
                            "part of packets are {} by {} ",
                            if allow { "denied" } else { "allowed" },
                            plural_rules(correlated)
                        ))
                        .append_ids(&correlated.id_list());
                }
            }
            AnomalyDetails::Generalization { generalized } => {
                cell.append("Generalization of rule")
                    .append(if generalized.len() > 1 { "s " } else { " " })
                    .append_ids(&generalized.id_list());
            }
        }
    }
}

fn plural_rules(rules: &RuleList<'_>) -> &'static str {
    if rules.len() > 1 {
        "combined rules"
    } else {
        "rule"
    }
}

/// One flagged rule.
#[derive(Debug, Clone)]
pub struct RuleAnomaly<'a> {
    pub rule: &'a Rule,
    pub details: AnomalyDetails<'a>,
}

/// The ordered findings of one anomaly pass.
#[derive(Debug, Clone, Default)]
pub struct RuleAnomalies<'a> {
    anomalies: Vec<RuleAnomaly<'a>>,

    /// Set when the walk ends with undecided packets, meaning the ACL has
    /// no final deny-all.
    pub missing_deny_all: bool,
}

impl<'a> RuleAnomalies<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, anomaly: RuleAnomaly<'a>) {
        self.anomalies.push(anomaly);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleAnomaly<'a>> {
        self.anomalies.iter()
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// One row per finding, in ACL order.
    pub fn create_table(&self, show_rule_name: bool) -> Table {
        let mut headers = vec![
            "id".to_string(),
            "name".to_string(),
            "src.zone".to_string(),
            "dst.zone".to_string(),
            "anomaly".to_string(),
            "level".to_string(),
            "details".to_string(),
        ];
        let mut wraps = vec![0, 0, 0, 0, 0, 0, 40];
        if !show_rule_name {
            headers.remove(1);
            wraps.remove(1);
        }

        let mut table = Table::with_wrap(headers, wraps);
        for anomaly in &self.anomalies {
            let row = table.add_row();
            let mut col = 0;
            row.cell(col).append(anomaly.rule.id().to_string());
            col += 1;
            if show_rule_name {
                row.cell(col).append(anomaly.rule.name());
                col += 1;
            }
            crate::rule::write_names(row.cell(col), anomaly.rule.predicate().src_zones());
            col += 1;
            crate::rule::write_names(row.cell(col), anomaly.rule.predicate().dst_zones());
            col += 1;
            row.cell(col).append(anomaly.details.scope().as_str());
            col += 1;
            row.cell(col).append(anomaly.details.level().as_str());
            col += 1;
            anomaly.details.write_to_cell(row.cell(col), anomaly.rule);
        }
        table
    }
}
