//! iocomp End-to-End Smoke Test
//!
//! Exercises the loop the way a handle implementation drives it:
//!   Part A: Status codec: wrap, unwrap, socket mapping, errno
//!   Part B: Submission: bypass, await-port, rejected
//!   Part C: Port: worker threads posting, FIFO dispatch, synthetic posts
//!   Part D: Lifecycle: closing handles, unref, loop liveness
//!
//! Run: ./target/release/iocomp-smoke
//! (IOCOMP_LOG_LEVEL=debug for loop tracing)

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use iocomp_core::activity::{handle_flags, HandleId};
use iocomp_core::classify::Disposition;
use iocomp_core::codes::*;
use iocomp_core::error::CoreError;
use iocomp_core::port::{CompletionEvent, CompletionPort};
use iocomp_core::request::{ReqId, ReqKind};
use iocomp_core::status::*;
use iocomp_core::translate::EOF;
use iocomp_module::{Completion, EventLoop, LoopConfig};

// ── Test harness ──

struct TestRunner {
    total: usize,
    passed: usize,
    failed: usize,
}

const LINE: &str = "────────────────────────────────────────────────────────────";

impl TestRunner {
    fn new() -> Self {
        Self { total: 0, passed: 0, failed: 0 }
    }

    fn section(&self, name: &str) {
        println!("\n{}", LINE);
        println!("  {}", name);
        println!("{}", LINE);
    }

    fn pass(&mut self, name: &str) {
        self.total += 1;
        self.passed += 1;
        println!("  [{:2}] {:<52} PASS", self.total, name);
    }

    fn fail(&mut self, name: &str, reason: &str) {
        self.total += 1;
        self.failed += 1;
        println!("  [{:2}] {:<52} FAIL: {}", self.total, name, reason);
    }

    fn check(&mut self, name: &str, ok: bool, reason: &str) {
        if ok { self.pass(name); } else { self.fail(name, reason); }
    }

    fn summary(&self) {
        println!("\n{}", LINE);
        println!(
            "  Total: {}  Passed: {}  Failed: {}",
            self.total, self.passed, self.failed
        );
        println!("{}", LINE);
    }
}

type Log = Rc<RefCell<Vec<Completion>>>;

fn new_loop(capacity: usize) -> Option<EventLoop> {
    let config = LoopConfig::from_env()
        .port_capacity(capacity)
        .poll_timeout(Duration::from_millis(20));
    match EventLoop::with_queue_port(config) {
        Ok(lp) => Some(lp),
        Err(e) => {
            println!("  loop creation failed: {}", e);
            None
        }
    }
}

fn record(lp: &mut EventLoop, h: HandleId, kind: ReqKind, log: &Log) -> Option<ReqId> {
    let sink = Rc::clone(log);
    lp.new_request(h, kind, move |_, done| sink.borrow_mut().push(done)).ok()
}

// ════════════════════════════════════════════════════════════
// Part A: Status codec
// ════════════════════════════════════════════════════════════

fn test_codec(t: &mut TestRunner) {
    t.section("Part A: Status codec");

    let wrapped = NtStatus::from_win32(ERROR_BROKEN_PIPE);
    t.check(
        "wrap win32 -> facility NTWIN32, error severity",
        wrapped.facility() == FACILITY_NTWIN32 && wrapped.severity() == Severity::Error,
        &format!("{:?}", wrapped),
    );
    t.check(
        "unwrap recovers win32 code",
        wrapped.to_win32() == ERROR_BROKEN_PIPE,
        &format!("{}", wrapped.to_win32()),
    );
    t.check(
        "success wraps to STATUS_SUCCESS",
        NtStatus::from_win32(ERROR_SUCCESS) == STATUS_SUCCESS,
        "",
    );
    t.check(
        "native cancelled -> operation aborted",
        STATUS_CANCELLED.to_win32() == ERROR_OPERATION_ABORTED,
        &format!("{}", STATUS_CANCELLED.to_win32()),
    );
    t.check(
        "native refused -> WSAECONNREFUSED",
        STATUS_CONNECTION_REFUSED.to_winsock() == WSAECONNREFUSED,
        &format!("{}", STATUS_CONNECTION_REFUSED.to_winsock()),
    );
    t.check(
        "broken pipe -> EOF",
        ERROR_BROKEN_PIPE.to_errno() == EOF,
        &format!("{}", ERROR_BROKEN_PIPE.to_errno()),
    );
}

// ════════════════════════════════════════════════════════════
// Part B: Submission
// ════════════════════════════════════════════════════════════

fn test_submission(t: &mut TestRunner) {
    t.section("Part B: Submission");

    let Some(mut lp) = new_loop(64) else {
        t.fail("create loop", "with_queue_port failed");
        return;
    };
    let log: Log = Rc::new(RefCell::new(Vec::new()));

    // Bypass: immediate success on a SYNC_BYPASS handle.
    let hb = lp.open_handle(handle_flags::SYNC_BYPASS);
    if let Some(id) = record(&mut lp, hb, ReqKind::Write, &log) {
        let d = lp.submit(id, Ok(()));
        t.check("bypass: classified Bypass", d == Ok(Disposition::Bypass), &format!("{:?}", d));
        t.check("bypass: enqueued, never posted", lp.pending_len() == 1 && lp.port().queued() == 0, "");
        lp.process_reqs();
        let ok = log.borrow().last().map(|c| c.req == id && c.is_success()).unwrap_or(false);
        t.check("bypass: callback saw success", ok, "");
    } else {
        t.fail("bypass: new_request", "no slot");
    }

    // Await: pending submission, completion from the port.
    let ha = lp.open_handle(0);
    if let Some(id) = record(&mut lp, ha, ReqKind::Read, &log) {
        let d = lp.submit(id, Err(ERROR_IO_PENDING));
        t.check("await: classified AwaitCompletion", d == Ok(Disposition::AwaitCompletion), &format!("{:?}", d));
        t.check("await: registered, not enqueued", lp.pending_len() == 0 && lp.counters().active_reqs == 1, "");
        let posted = lp.port().post(CompletionEvent::completed(id, STATUS_SUCCESS, 512));
        t.check("await: port accepted event", posted.is_ok(), &format!("{:?}", posted));
        let n = lp.run_once(Some(Duration::ZERO));
        t.check("await: run_once dispatched one", matches!(n, Ok(1)), &format!("{:?}", n));
        let res = log.borrow().last().map(|c| c.result());
        t.check("await: callback saw 512 bytes", res == Some(Ok(512)), &format!("{:?}", res));
    } else {
        t.fail("await: new_request", "no slot");
    }

    // Rejected: hard failure, nothing registered.
    if let Some(id) = record(&mut lp, ha, ReqKind::Connect, &log) {
        let before = log.borrow().len();
        let r = lp.submit(id, Err(ERROR_ACCESS_DENIED));
        t.check(
            "rejected: Submit error returned",
            r == Err(CoreError::Submit(ERROR_ACCESS_DENIED)),
            &format!("{:?}", r),
        );
        lp.process_reqs();
        t.check("rejected: no callback, no count", log.borrow().len() == before && !lp.alive(), "");
    } else {
        t.fail("rejected: new_request", "no slot");
    }
}

// ════════════════════════════════════════════════════════════
// Part C: Port
// ════════════════════════════════════════════════════════════

fn test_port(t: &mut TestRunner) {
    t.section("Part C: Port (cross-thread)");

    const WORKERS: usize = 4;
    const PER_WORKER: usize = 250;

    let Some(mut lp) = new_loop(WORKERS * PER_WORKER) else {
        t.fail("create loop", "with_queue_port failed");
        return;
    };
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let h = lp.open_handle(0);

    let mut batches: Vec<Vec<ReqId>> = vec![Vec::new(); WORKERS];
    for i in 0..WORKERS * PER_WORKER {
        match record(&mut lp, h, ReqKind::Read, &log) {
            Some(id) => match lp.submit(id, Err(ERROR_IO_PENDING)) {
                Ok(Disposition::AwaitCompletion) => batches[i % WORKERS].push(id),
                other => {
                    t.fail("port: submit", &format!("{}: {:?}", id, other));
                    return;
                }
            },
            None => {
                t.fail("port: new_request", "no slot");
                return;
            }
        }
    }
    t.check(
        "port: all requests registered",
        lp.counters().active_reqs as usize == WORKERS * PER_WORKER,
        &format!("{}", lp.counters().active_reqs),
    );

    let start = Instant::now();
    let workers: Vec<_> = batches
        .iter()
        .cloned()
        .map(|batch| {
            let poster = lp.poster();
            thread::spawn(move || {
                batch
                    .into_iter()
                    .filter(|&id| {
                        poster.post(CompletionEvent::completed(id, STATUS_SUCCESS, id.as_u32())).is_err()
                    })
                    .count()
            })
        })
        .collect();

    let run = lp.run();
    let mut refused = 0;
    let mut panicked = 0;
    for w in workers {
        match w.join() {
            Ok(n) => refused += n,
            Err(_) => panicked += 1,
        }
    }
    let elapsed = start.elapsed();

    t.check(
        "port: workers posted every event",
        refused == 0 && panicked == 0,
        &format!("{} refused, {} workers panicked", refused, panicked),
    );

    t.check("port: run() returned Ok", run.is_ok(), &format!("{:?}", run));
    t.check(
        "port: every callback fired once",
        log.borrow().len() == WORKERS * PER_WORKER,
        &format!("{}", log.borrow().len()),
    );

    // Per-producer order survives the port and the pending queue.
    let ordered = batches.iter().all(|batch| {
        let seen: Vec<ReqId> = log
            .borrow()
            .iter()
            .map(|c| c.req)
            .filter(|r| batch.contains(r))
            .collect();
        seen == *batch
    });
    t.check("port: per-producer FIFO preserved", ordered, "");
    println!("       {} completions in {:?}", WORKERS * PER_WORKER, elapsed);

    // Synthetic: status recorded first, then posted.
    if let Some(id) = record(&mut lp, h, ReqKind::Shutdown, &log) {
        let reg = lp.register_req(id);
        t.check("synthetic: registered", reg.is_ok(), &format!("{:?}", reg));
        if let Some(req) = lp.request_mut(id) {
            req.set_error(ERROR_OPERATION_ABORTED);
        }
        let posted = lp.post_completion(id);
        t.check(
            "synthetic: went through port",
            posted.is_ok() && lp.port().queued() == 1 && lp.pending_len() == 0,
            &format!("{:?}", posted),
        );
        let n = lp.run_once(Some(Duration::ZERO));
        t.check("synthetic: run_once dispatched one", matches!(n, Ok(1)), &format!("{:?}", n));
        let err = log.borrow().last().map(|c| c.error());
        t.check(
            "synthetic: callback saw recorded error",
            err == Some(ERROR_OPERATION_ABORTED),
            &format!("{:?}", err),
        );
    }
    let stats = lp.stats();
    println!("       stats: {:?}", stats);
}

// ════════════════════════════════════════════════════════════
// Part D: Lifecycle
// ════════════════════════════════════════════════════════════

fn test_lifecycle(t: &mut TestRunner) {
    t.section("Part D: Lifecycle");

    let Some(mut lp) = new_loop(16) else {
        t.fail("create loop", "with_queue_port failed");
        return;
    };
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let h = lp.open_handle(0);

    let Some(id) = record(&mut lp, h, ReqKind::Read, &log) else {
        t.fail("lifecycle: new_request", "no slot");
        return;
    };
    let d = lp.submit(id, Err(ERROR_IO_PENDING));
    t.check("lifecycle: submit awaits port", d == Ok(Disposition::AwaitCompletion), &format!("{:?}", d));

    let unref = lp.set_handle_ref(h, false);
    t.check(
        "unref: handle no longer counted",
        unref.is_ok() && lp.counters().active_handles == 0 && lp.counters().active_reqs == 1,
        &format!("{:?} {:?}", unref, lp.counters()),
    );
    let reref = lp.set_handle_ref(h, true);
    t.check("ref: handle counted again", reref.is_ok() && lp.counters().active_handles == 1, &format!("{:?}", reref));

    let closed = lp.close_handle(h);
    t.check(
        "close: deferred while request outstanding",
        closed.is_ok() && lp.handle(h).is_some(),
        &format!("{:?}", closed),
    );
    let refused = lp.new_request(h, ReqKind::Read, |_, _| {});
    t.check(
        "close: new requests refused",
        refused == Err(CoreError::HandleClosing(h)),
        &format!("{:?}", refused),
    );

    let posted = lp.port().post(CompletionEvent::completed(id, STATUS_CANCELLED, 0));
    t.check("close: cancellation posted", posted.is_ok(), &format!("{:?}", posted));
    let run = lp.run();
    t.check("close: run() returned Ok", run.is_ok(), &format!("{:?}", run));
    t.check("close: released after last dispatch", lp.handle(h).is_none(), "");
    let aborted = log.borrow().last().map(|c| c.error());
    t.check(
        "close: callback saw cancellation",
        aborted == Some(ERROR_OPERATION_ABORTED),
        &format!("{:?}", aborted),
    );
    t.check("loop: not alive when idle", !lp.alive(), "");
}

// ════════════════════════════════════════════════════════════

fn main() {
    println!("=== iocomp End-to-End Smoke Test ===");

    let config = LoopConfig::from_env();
    if config.debug_logging {
        config.print();
    }

    let mut t = TestRunner::new();

    test_codec(&mut t);
    test_submission(&mut t);
    test_port(&mut t);
    test_lifecycle(&mut t);

    t.summary();
    std::process::exit(if t.failed > 0 { 1 } else { 0 });
}
