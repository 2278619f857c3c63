use super::entity::{FieldName, Policy};

/// Fan each policy out into one copy per candidate value of `field`.
///
/// Output length is `policies.len() * values.len()`. Policies form the
/// outer loop (input order preserved), values the inner loop (in the
/// order given). Inputs are never modified.
pub fn expand<'a>(
    policies: &[Policy],
    field: FieldName,
    values: impl IntoIterator<Item = &'a str>,
) -> Vec<Policy> {
    let values: Vec<&str> = values.into_iter().collect();
    let mut expanded = Vec::with_capacity(policies.len() * values.len());

    for policy in policies {
        for value in &values {
            expanded.push(policy.with_field(field, value));
        }
    }

    expanded
}
