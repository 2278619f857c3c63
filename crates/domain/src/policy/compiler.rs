use std::sync::Arc;

use super::entity::{CompiledCriterion, FieldName, Policy, PolicySet};
use super::enumeration::EnumerationTables;
use super::error::PolicyError;
use super::expander::expand;
use super::parser::try_parse_field;

/// A field left out of a compiled criterion because its value did not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    /// Position of the source policy in the policy set.
    pub policy_index: usize,
    pub field: FieldName,
    pub value: String,
    pub error: PolicyError,
}

/// Output of a compilation run plus what was lost along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub criteria: Vec<CompiledCriterion>,
    /// One entry per (policy, field) pair that failed to parse.
    pub dropped: Vec<DroppedField>,
    /// Indices into `criteria` of criteria with no fields (match all traffic).
    pub empty_criteria: Vec<usize>,
}

/// Compiles protocol-agnostic policies into concrete match criteria.
///
/// A policy that omits the transport protocol is expanded over every entry
/// of the protocol table, and one that omits the ethertype over every entry
/// of the ethertype table. Protocol is expanded first, so output is
/// protocol-major. Output order is fully determined by the policy order
/// and the table order.
#[derive(Debug, Clone)]
pub struct PolicyCompiler {
    tables: Arc<EnumerationTables>,
}

impl PolicyCompiler {
    pub fn new(tables: Arc<EnumerationTables>) -> Self {
        Self { tables }
    }

    /// Compile every policy of the set, in set order.
    pub fn compile(&self, set: &PolicySet) -> Vec<CompiledCriterion> {
        self.compile_with_report(set).criteria
    }

    /// Compile every policy of the set and report dropped fields and
    /// empty criteria.
    pub fn compile_with_report(&self, set: &PolicySet) -> CompileReport {
        let mut report = CompileReport::default();

        for (policy_index, policy) in set.policies().iter().enumerate() {
            for variant in self.variants(policy) {
                let criterion = self.translate(policy_index, &variant, &mut report.dropped);
                if criterion.is_empty() {
                    report.empty_criteria.push(report.criteria.len());
                }
                report.criteria.push(criterion);
            }
        }

        report
    }

    /// Compile a single policy.
    pub fn compile_policy(&self, policy: &Policy) -> Vec<CompiledCriterion> {
        let mut dropped = Vec::new();
        self.variants(policy)
            .iter()
            .map(|variant| self.translate(0, variant, &mut dropped))
            .collect()
    }

    /// Expand a policy over every omitted enumerable field.
    pub fn variants(&self, policy: &Policy) -> Vec<Policy> {
        let mut variants = vec![policy.clone()];

        if !policy.contains(FieldName::Protocol) {
            variants = expand(&variants, FieldName::Protocol, self.tables.protocols.names());
        }

        if !policy.contains(FieldName::EtherType) {
            variants = expand(
                &variants,
                FieldName::EtherType,
                self.tables.ether_types.names(),
            );
        }

        variants
    }

    // ── Private helpers ────────────────────────────────────────────────

    /// Parse every field of a concrete policy, in field-name order.
    /// Unparseable fields are left out and recorded once per policy.
    fn translate(
        &self,
        policy_index: usize,
        variant: &Policy,
        dropped: &mut Vec<DroppedField>,
    ) -> CompiledCriterion {
        let mut criterion = CompiledCriterion::new();

        for (field, raw) in variant.iter() {
            match try_parse_field(field, raw, &self.tables) {
                Ok(value) => criterion.insert(field, value),
                Err(error) => {
                    // Entries for the current policy are always at the tail.
                    let seen = dropped
                        .iter()
                        .rev()
                        .take_while(|d| d.policy_index == policy_index)
                        .any(|d| d.field == field);
                    if !seen {
                        dropped.push(DroppedField {
                            policy_index,
                            field,
                            value: raw.to_string(),
                            error,
                        });
                    }
                }
            }
        }

        criterion
    }
}

impl Default for PolicyCompiler {
    fn default() -> Self {
        Self::new(Arc::new(EnumerationTables::standard()))
    }
}
