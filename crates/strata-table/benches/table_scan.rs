//! Table and cursor benchmarks.
//!
//! Benchmarks for:
//! - Native index inserts, sequential and scattered
//! - Full table scans through the clustered and a non-clustered order
//! - Keyed cursor lookups

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use strata_common::{EngineConfig, IndexConfig};
use strata_storage::index::NativeIndex;
use strata_storage::schema::{Column, Order, OrderColumn, RowType, ScalarType, SortDirection, TableType};
use strata_storage::value::{DefaultValueManager, Row};
use strata_table::{SharedTable, TableScan};

const SIZES: [i64; 3] = [1_000, 10_000, 50_000];

/// Keys 0..count, visited in a fixed scattered order.
fn scattered(count: i64) -> Vec<i64> {
    (0..count).map(|i| (i * 7919) % count).collect()
}

fn key_type() -> Arc<RowType> {
    Arc::new(RowType::new(vec![Column::new("k", ScalarType::Int64)]).unwrap())
}

fn events_type() -> TableType {
    let row_type = RowType::new(vec![
        Column::new("id", ScalarType::Int64),
        Column::new("bucket", ScalarType::Int32),
        Column::new("payload", ScalarType::String),
    ])
    .unwrap();
    TableType::new("Events", row_type)
        .with_key(Order::key("Events_PK", &[0]))
        .with_order(Order::new("Events_Bucket", vec![OrderColumn::ascending(1)], false))
}

fn events(count: i64) -> SharedTable {
    let table_type = events_type();
    let table = SharedTable::new(
        &table_type,
        Arc::new(DefaultValueManager::new()),
        EngineConfig::default(),
    )
    .unwrap();
    for id in scattered(count) {
        let bucket = (id % 97) as i32;
        let row = Row::from_values(
            Arc::clone(table_type.row_type()),
            vec![id.into(), bucket.into(), format!("event {id}").as_str().into()],
        )
        .unwrap();
        table.insert(&row, false).unwrap();
    }
    table
}

fn index_inserts(c: &mut Criterion, name: &str, keys: impl Fn(i64) -> Vec<i64>) {
    let mut group = c.benchmark_group(name);
    let manager = DefaultValueManager::new();
    let key_type = key_type();

    for size in SIZES {
        let rows: Vec<Row> = keys(size)
            .into_iter()
            .map(|k| Row::from_values(Arc::clone(&key_type), vec![k.into()]).unwrap())
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let mut index = NativeIndex::new(
                    "Bench",
                    Arc::clone(&key_type),
                    Arc::clone(&key_type),
                    vec![SortDirection::Ascending],
                    IndexConfig::default(),
                )
                .unwrap();
                for row in rows {
                    index.insert(&manager, row, row).unwrap();
                }
                black_box(index.len())
            });
        });
    }

    group.finish();
}

/// Benchmark sequential inserts into a native index.
fn bench_index_insert_sequential(c: &mut Criterion) {
    index_inserts(c, "index/insert_sequential", |n| (0..n).collect());
}

/// Benchmark scattered inserts into a native index.
fn bench_index_insert_scattered(c: &mut Criterion) {
    index_inserts(c, "index/insert_scattered", scattered);
}

/// Benchmark full scans through each order.
fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor/scan");

    for size in SIZES {
        let table = events(size);
        group.throughput(Throughput::Elements(size as u64));

        for order in ["Events_PK", "Events_Bucket"] {
            group.bench_with_input(BenchmarkId::new(order, size), &table, |b, table| {
                b.iter(|| {
                    let mut scan = TableScan::new(table.clone()).with_order(order);
                    scan.open().unwrap();
                    let mut visited = 0usize;
                    while scan.next().unwrap() {
                        visited += 1;
                    }
                    black_box(visited)
                });
            });
        }
    }

    group.finish();
}

/// Benchmark keyed lookups through a cursor.
fn bench_find_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor/find_key");
    let id_type = Arc::new(RowType::new(vec![Column::new("id", ScalarType::Int64)]).unwrap());

    for size in SIZES {
        let table = events(size);
        let keys: Vec<Row> = scattered(size)
            .into_iter()
            .take(1_000)
            .map(|id| Row::from_values(Arc::clone(&id_type), vec![id.into()]).unwrap())
            .collect();

        group.throughput(Throughput::Elements(keys.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &keys, |b, keys| {
            let mut scan = TableScan::new(table.clone());
            scan.open().unwrap();
            b.iter(|| {
                let mut found = 0usize;
                for key in keys {
                    if scan.find_key(key).unwrap() {
                        found += 1;
                    }
                }
                black_box(found)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_index_insert_sequential,
    bench_index_insert_scattered,
    bench_scan,
    bench_find_key,
);

criterion_main!(benches);
