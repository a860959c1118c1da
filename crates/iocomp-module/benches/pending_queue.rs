//! Pending queue and loop drain throughput.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use iocomp_core::activity::{handle_flags, HandleId};
use iocomp_core::pending::PendingQueue;
use iocomp_core::request::{ReqKind, Request};
use iocomp_core::table::RequestTable;
use iocomp_module::{EventLoop, LoopConfig};

fn bench_insert_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending_queue");
    for &n in &[16usize, 256, 4096] {
        let mut table: RequestTable = RequestTable::new(n);
        let ids: Vec<_> = (0..n)
            .map(|_| table.insert(Request::new(HandleId::new(0), ReqKind::Custom)))
            .collect::<Result<_, _>>()
            .expect("table sized for n");

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("insert_pop", n), &ids, |b, ids| {
            let mut q = PendingQueue::new();
            b.iter(|| {
                for &id in ids {
                    q.insert(&mut table, id).expect("live id");
                }
                while let Some(id) = q.pop_front(&mut table) {
                    black_box(id);
                }
            });
        });
    }
    group.finish();
}

fn bench_bypass_dispatch(c: &mut Criterion) {
    let config = LoopConfig::new().poll_timeout(Duration::ZERO);
    let mut lp = EventLoop::with_queue_port(config).expect("loop");
    let h = lp.open_handle(handle_flags::SYNC_BYPASS);

    c.bench_function("loop/bypass_submit_dispatch_256", |b| {
        b.iter(|| {
            for _ in 0..256 {
                let id = lp.new_request(h, ReqKind::Write, |_, done| {
                    black_box(done.bytes);
                }).expect("slot");
                lp.submit(id, Ok(())).expect("bypass");
            }
            black_box(lp.process_reqs());
        });
    });
}

criterion_group!(benches, bench_insert_pop, bench_bypass_dispatch);
criterion_main!(benches);
