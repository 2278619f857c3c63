use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use domain::common::entity::EnforcementPointId;
use domain::policy::compiler::PolicyCompiler;
use domain::policy::entity::{FieldName, Policy, PolicySet};
use domain::policy::enumeration::EnumerationTables;
use domain::policy::parser::parse_field;

fn make_policy(i: usize) -> Policy {
    let policy = Policy::new()
        .with(FieldName::DstPort, (1024 + i % 60_000).to_string())
        .with(FieldName::SrcIp, format!("10.{}.{}.1", (i >> 8) & 0xFF, i & 0xFF));
    match i % 3 {
        0 => policy,
        1 => policy.with(FieldName::Protocol, "tcp"),
        _ => policy.with(FieldName::EtherType, "ipv6"),
    }
}

fn make_set(n: usize) -> PolicySet {
    PolicySet::new(
        EnforcementPointId(1),
        (0..n).map(make_policy).collect(),
    )
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy_compile");
    let compiler = PolicyCompiler::new(Arc::new(EnumerationTables::standard()));

    for &n in &[1, 10, 100, 1_000] {
        let set = make_set(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &set, |b, set| {
            b.iter(|| compiler.compile(black_box(set)));
        });
    }

    group.finish();
}

fn bench_compile_all_invalid(c: &mut Criterion) {
    let compiler = PolicyCompiler::new(Arc::new(EnumerationTables::standard()));
    let bad = Policy::new()
        .with(FieldName::SrcPort, "http")
        .with(FieldName::DstPort, "https")
        .with(FieldName::SrcMac, "zz:00:00:00:00:01")
        .with(FieldName::DstMac, "00:00:00:00:00")
        .with(FieldName::SrcIp, "10.0.0.0/33")
        .with(FieldName::DstIp, "host.example");
    let set = PolicySet::new(EnforcementPointId(1), vec![bad; 4096]);

    c.bench_function("policy_compile_all_invalid_4096", |b| {
        b.iter(|| compiler.compile_with_report(black_box(&set)));
    });
}

fn bench_parse_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_parse");
    let tables = EnumerationTables::standard();

    let cases = [
        ("port", FieldName::DstPort, "8080"),
        ("protocol", FieldName::Protocol, "udp"),
        ("mac", FieldName::SrcMac, "00:00:00:00:00:01"),
        ("ipv4", FieldName::SrcIp, "10.0.0.0/8"),
        ("ipv6", FieldName::DstIp, "2001:db8::/32"),
    ];

    for (label, field, raw) in cases {
        group.bench_function(label, |b| {
            b.iter(|| parse_field(field, black_box(raw), &tables));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_compile_all_invalid,
    bench_parse_field
);
criterion_main!(benches);
