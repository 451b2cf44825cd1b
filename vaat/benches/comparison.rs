//! Comparison benchmarks: vaat vs futures-rs oneshot

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

mod vaat_bench {
    use vaat::{pair, DefaultTag, Future};

    pub fn fulfill_then_consume(ops: usize) {
        for i in 0..ops {
            let (p, f) = pair::<usize, DefaultTag>();
            p.fulfill(i);
            f.finally(|v| {
                criterion::black_box(v);
            });
        }
    }

    pub fn consume_then_fulfill(ops: usize) {
        for i in 0..ops {
            let (p, f) = pair::<usize, DefaultTag>();
            f.finally(|v| {
                criterion::black_box(v);
            });
            p.fulfill(i);
        }
    }

    pub fn inline_ready_chain(ops: usize) {
        for i in 0..ops {
            Future::<usize, DefaultTag>::ready(i)
                .and_then(|v| v + 1)
                .finally(|v| {
                    criterion::black_box(v);
                });
        }
    }

    pub fn chain_depth(depth: usize) {
        let (p, f) = pair::<u64, DefaultTag>();
        let mut chained = f;
        for _ in 0..depth {
            chained = chained.and_then(|v| v + 1);
        }
        chained.finally(|v| {
            criterion::black_box(v);
        });
        p.fulfill(0);
    }

    pub fn cross_thread(ops: usize) {
        let mut handles = Vec::with_capacity(ops);
        for i in 0..ops {
            let (p, f) = pair::<usize, DefaultTag>();
            handles.push(std::thread::spawn(move || f.wait()));
            p.fulfill(i);
        }
        for h in handles {
            criterion::black_box(h.join().unwrap());
        }
    }
}

mod oneshot_bench {
    use futures::channel::oneshot;
    use futures::executor::block_on;

    pub fn fulfill_then_consume(ops: usize) {
        for i in 0..ops {
            let (tx, rx) = oneshot::channel::<usize>();
            tx.send(i).unwrap();
            criterion::black_box(block_on(rx).unwrap());
        }
    }

    pub fn cross_thread(ops: usize) {
        let mut handles = Vec::with_capacity(ops);
        for i in 0..ops {
            let (tx, rx) = oneshot::channel::<usize>();
            handles.push(std::thread::spawn(move || block_on(rx).unwrap()));
            tx.send(i).unwrap();
        }
        for h in handles {
            criterion::black_box(h.join().unwrap());
        }
    }
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    const OPS: usize = 10_000;
    group.throughput(Throughput::Elements(OPS as u64));

    group.bench_function("vaat/fulfill_then_consume", |b| {
        b.iter(|| vaat_bench::fulfill_then_consume(black_box(OPS)))
    });
    group.bench_function("vaat/consume_then_fulfill", |b| {
        b.iter(|| vaat_bench::consume_then_fulfill(black_box(OPS)))
    });
    group.bench_function("vaat/inline_ready_chain", |b| {
        b.iter(|| vaat_bench::inline_ready_chain(black_box(OPS)))
    });
    group.bench_function("oneshot/fulfill_then_consume", |b| {
        b.iter(|| oneshot_bench::fulfill_then_consume(black_box(OPS)))
    });

    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_depth");
    for depth in [1usize, 8, 64, 512] {
        group.bench_with_input(BenchmarkId::new("vaat", depth), &depth, |b, &depth| {
            b.iter(|| vaat_bench::chain_depth(black_box(depth)))
        });
    }
    group.finish();
}

fn bench_cross_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("cross_thread");
    const OPS: usize = 64;
    group.throughput(Throughput::Elements(OPS as u64));
    group.sample_size(20);

    group.bench_function("vaat", |b| {
        b.iter(|| vaat_bench::cross_thread(black_box(OPS)))
    });
    group.bench_function("oneshot", |b| {
        b.iter(|| oneshot_bench::cross_thread(black_box(OPS)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread,
    bench_chain_depth,
    bench_cross_thread
);
criterion_main!(benches);
