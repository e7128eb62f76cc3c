//! Runs a small program's tables through both phases, shipping the combine
//! output over the wire format, and checks that the result matches a
//! single reduce pass over the raw records.

use feldera_tables::{
    decode_records, encode_records, Catalog, CounterMap, DriverConfig, EmitKey, EmitRecord,
    EmitValue, GroupDriver, Phase, RecordSink, SharedBuffer, SideChannel, SideChannels,
    TableContext, TextSink,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CATALOG: &str = r#"
total:
  kind: sum
latency:
  kind: mean
spread:
  kind: histogram
  min: 0
  max: 100
  buckets: 4
quartiles:
  kind: quantile
  n: 4
visitors:
  kind: unique
  n: 1000
heaviest:
  kind: maximum
  n: 2
words:
  kind: top
  n: 2
counters:
  kind: mrcounter
audit:
  kind: output
  channel: audit
"#;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn requests() -> Vec<EmitRecord> {
    let verbs = ["get", "put", "get", "head"];
    let mut records = Vec::new();
    let mut emit = |key: EmitKey, value: EmitValue| records.push(EmitRecord::new(key, value));
    for i in 0..40i64 {
        emit(EmitKey::new("total"), EmitValue::new((i % 5).to_string()));
        emit(EmitKey::new("latency"), EmitValue::new(format!("{}.5", i % 9)));
        emit(EmitKey::new("spread"), EmitValue::new((i * 7 % 100).to_string()));
        emit(EmitKey::new("quartiles"), EmitValue::new((i * 13 % 50).to_string()));
        emit(EmitKey::new("visitors"), EmitValue::new(format!("u{}", i % 7)));
        emit(
            EmitKey::indexed("heaviest", ["page"]),
            EmitValue::weighted(format!("p{i}"), (i * 17 % 23).to_string()),
        );
        emit(EmitKey::new("words"), EmitValue::new(verbs[i as usize % 4]));
        emit(
            EmitKey::indexed("counters", ["requests", "served"]),
            EmitValue::new("1"),
        );
        if i % 10 == 0 {
            emit(EmitKey::new("audit"), EmitValue::new(format!("request {i}")));
        }
    }
    records
}

/// Groups records by key, keeping arrival order within each group.
fn grouped(mut records: Vec<EmitRecord>) -> Vec<EmitRecord> {
    records.sort_by(|left, right| left.key.cmp(&right.key));
    records
}

fn context() -> (TableContext, SharedBuffer, CounterMap) {
    let (audit, buffer) = SideChannel::memory("audit");
    let counters = CounterMap::new();
    let context = TableContext::default()
        .with_channels(SideChannels::default().with_output(audit))
        .with_counters(Arc::new(counters.clone()));
    (context, buffer, counters)
}

fn reduce(catalog: &Catalog, context: &TableContext, records: Vec<EmitRecord>) -> Vec<String> {
    let mut sink = TextSink::new(Vec::new());
    GroupDriver::new(DriverConfig::default())
        .run(catalog, context, Phase::Reduce, grouped(records), &mut sink)
        .unwrap();
    String::from_utf8(sink.into_inner())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn combine_then_reduce_matches_single_pass() {
    init_logging();
    let catalog = Catalog::from_yaml(CATALOG).unwrap();
    let driver = GroupDriver::new(DriverConfig::default());

    // Two producers, each combining its own share of the records and
    // shipping the result as bytes.
    let (context, combine_audit, counters) = context();
    let mut shipped = Vec::new();
    for producer in 0..2 {
        let share: Vec<EmitRecord> = requests()
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == producer)
            .map(|(_, record)| record)
            .collect();
        let mut sink = RecordSink::new();
        driver
            .run(&catalog, &context, Phase::Combine, grouped(share), &mut sink)
            .unwrap();
        shipped.push(encode_records(sink.records()).unwrap());
    }
    let combined: Vec<EmitRecord> = shipped
        .iter()
        .flat_map(|bytes| decode_records(bytes).unwrap())
        .collect();
    assert!(combined.len() < requests().len());
    let split = reduce(&catalog, &context, combined);

    let (direct_context, direct_audit, _) = self::context();
    let direct = reduce(&catalog, &direct_context, requests());

    assert_eq!(split, direct);
    for line in [
        "total = 80",
        "visitors = 7",
        "words = get, 20, 0",
        "words = head, 10, 0",
        "spread = {11, 11, 10, 8}",
    ] {
        assert!(split.iter().any(|l| l == line), "missing {line:?} in {split:#?}");
    }
    assert_eq!(
        split
            .iter()
            .filter(|line| line.starts_with("heaviest[page] = "))
            .count(),
        2
    );

    // Counters are folded in the combine phase only.
    assert_eq!(counters.get("requests", "served"), 40);

    let mut combine_lines = combine_audit.lines();
    let mut direct_lines = direct_audit.lines();
    combine_lines.sort();
    direct_lines.sort();
    assert_eq!(combine_lines, direct_lines);
    assert_eq!(direct_lines.len(), 4);
}
