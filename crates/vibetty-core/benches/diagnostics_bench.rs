//! Criterion benchmarks for the terminal I/O diagnostic codec.
//!
//! The codec runs on every send and receive while diagnostics are enabled, so
//! it must keep up with a busy full-screen TUI redraw (tens of KiB per frame).
//!
//! Run with:
//! ```bash
//! cargo bench --package vibetty-core --bench diagnostics_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vibetty_core::diagnostics::codec::{decode_hex, encode, encode_byte, Direction};
use vibetty_core::LogicalKey;

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Typical redraw traffic: SGR sequences, text, and line endings.
fn make_redraw(len: usize) -> Vec<u8> {
    let chunk = b"\x1b[38;5;245m~\x1b[0m                                   \r\n";
    chunk.iter().copied().cycle().take(len).collect()
}

fn make_all_bytes() -> Vec<u8> {
    (0u8..=255).collect()
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for len in [16usize, 1024, 16 * 1024] {
        let data = make_redraw(len);
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("redraw", len), &data, |b, data| {
            b.iter(|| encode(black_box(data), Direction::Received))
        });
    }

    let all = make_all_bytes();
    group.bench_function("all_byte_values", |b| b.iter(|| encode(black_box(&all), Direction::Received)));
    group.finish();
}

fn bench_encode_key(c: &mut Criterion) {
    let bytes = LogicalKey::CtrlArrowUp.request().xterm_bytes();
    c.bench_function("encode_ctrl_up", |b| b.iter(|| encode(black_box(&bytes), Direction::Sent)));
    c.bench_function("encode_byte", |b| b.iter(|| encode_byte(black_box(0x1B), Direction::Sent)));
}

fn bench_decode(c: &mut Criterion) {
    let record = encode(&make_redraw(16 * 1024), Direction::Received);
    c.bench_function("decode_hex_16k", |b| b.iter(|| decode_hex(black_box(&record.hex))));
}

criterion_group!(benches, bench_encode, bench_encode_key, bench_decode);
criterion_main!(benches);
