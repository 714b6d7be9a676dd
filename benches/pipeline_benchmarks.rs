//! Benchmarks for the FOOL pipeline: compiling, assembling and executing.
//!
//! Per-pass timings are available through puffin:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- compile
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use fool::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print the average time of every top-level scope seen so far.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;
    use std::collections::BTreeMap;

    let Some(frame_view) = FRAME_VIEW.get() else {
        return;
    };
    let view = frame_view.lock();
    let scopes = view.scope_collection();

    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut frames = 0i64;
    for frame in view.recent_frames() {
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        frames += 1;
        for (_, stream_info) in unpacked.thread_streams.iter() {
            let Ok(top) = Reader::from_start(&stream_info.stream).read_top_scopes() else {
                continue;
            };
            for scope in top {
                if let Some(details) = scopes.fetch_by_id(&scope.id) {
                    *totals.entry(details.name().to_string()).or_insert(0) +=
                        scope.record.duration_ns;
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frames} frames) ===");
    for (name, ns) in &totals {
        let avg = if frames > 0 { ns / frames } else { *ns };
        println!(
            "  {name:40} {:>10.2?}",
            std::time::Duration::from_nanos(avg as u64)
        );
    }
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

const SCRIPTS: [(&str, &str); 4] = [
    ("arithmetic", include_str!("../test_scripts/arithmetic.fool")),
    ("static_links", include_str!("../test_scripts/static_links.fool")),
    ("accounts", include_str!("../test_scripts/accounts.fool")),
    ("dispatch", include_str!("../test_scripts/dispatch.fool")),
];

const FIB: &str = "let
    fun fib:int (n:int) if n <= 1 then { n } else { fib(n - 1) + fib(n - 2) };
    in fib(20);";

/// Source text to assembly.
fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("compile");
    for (name, source) in SCRIPTS {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let compiled = fool::compile(black_box(source), &CompileOptions::default())
                    .expect("script compiles");
                end_profiling_frame();
                black_box(compiled.code.len())
            });
        });
    }
    group.finish();

    print_profiling_stats();
}

/// Assembly to code memory.
fn assemble_benchmarks(c: &mut Criterion) {
    let text = fool::compile(FIB, &CompileOptions::default())
        .expect("fib compiles")
        .code
        .to_string();

    let mut group = c.benchmark_group("assemble");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("fib_text", |b| {
        b.iter(|| black_box(assemble_text(black_box(&text)).expect("fib assembles").len()));
    });
    group.finish();
}

/// Machine execution of already assembled programs.
fn execute_benchmarks(c: &mut Criterion) {
    let compiled = fool::compile(FIB, &CompileOptions::default()).expect("fib compiles");
    let program = assemble(&compiled.code).expect("fib assembles");

    let mut group = c.benchmark_group("execute");
    group.bench_function("fib_20", |b| {
        b.iter(|| {
            let outcome = Machine::new(&program, MachineConfig::default())
                .run()
                .expect("fib runs");
            black_box(outcome.top)
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    compile_benchmarks,
    assemble_benchmarks,
    execute_benchmarks
);
criterion_main!(benches);
