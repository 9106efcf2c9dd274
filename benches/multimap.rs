//   Copyright (c) 2024-2026 Anton Kundenko <singaraiona@gmail.com>
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Build/probe benchmark for the lazy multi-map (component C): insert
//! phase across a fixed shard count, then `finalize`, then a full probe
//! pass that touches every inserted key once.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use flowbase::multimap::LazyMultiMap;
use flowbase::types::Value;

const SHARD_COUNT: usize = 8;

fn key(n: i32) -> Vec<Value> {
    vec![Value::Integer(n)]
}

fn build_and_probe(rows: usize) {
    let mm: LazyMultiMap<Vec<Value>, i32> = LazyMultiMap::new(SHARD_COUNT);
    for i in 0..rows {
        mm.insert(i % SHARD_COUNT, key((i % (rows / 4).max(1)) as i32), i as i32);
    }
    let sealed = mm.finalize();
    let mut touched = 0usize;
    for i in 0..rows {
        touched += sealed.equal_range(&key((i % (rows / 4).max(1)) as i32)).count();
    }
    criterion::black_box(touched);
}

fn bench_build_and_probe(c: &mut Criterion) {
    let mut group = c.benchmark_group("lazy_multimap_build_and_probe");
    for rows in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| build_and_probe(rows));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build_and_probe);
criterion_main!(benches);
