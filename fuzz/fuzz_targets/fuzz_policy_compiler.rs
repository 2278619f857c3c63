#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::common::entity::EnforcementPointId;
use domain::policy::compiler::PolicyCompiler;
use domain::policy::entity::{FieldName, Policy, PolicySet};

// Build a small policy set from fuzz data and compile it.
//
// Each policy is a run of `[field selector, len, value bytes...]`
// records terminated by a 0xFF selector.
fuzz_target!(|data: &[u8]| {
    let mut policies = Vec::new();
    let mut policy = Policy::new();
    let mut cursor = 0;

    while cursor < data.len() && policies.len() < 16 {
        let selector = data[cursor];
        cursor += 1;
        if selector == 0xFF {
            policies.push(std::mem::take(&mut policy));
            continue;
        }
        let Some(&len) = data.get(cursor) else { break };
        cursor += 1;
        let end = (cursor + len as usize % 48).min(data.len());
        let raw = String::from_utf8_lossy(&data[cursor..end]).into_owned();
        cursor = end;

        let field = FieldName::ALL[selector as usize % FieldName::ALL.len()];
        policy = policy.with(field, raw);
    }
    policies.push(policy);

    let set = PolicySet::new(EnforcementPointId(1), policies);
    let compiler = PolicyCompiler::default();
    let report = compiler.compile_with_report(&set);

    for criterion in &report.criteria {
        let _ = criterion.to_string();
    }
});
