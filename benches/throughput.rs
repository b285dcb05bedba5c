use alice_ringbuf::RingBuffer;
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_throughput(c: &mut Criterion) {
    let mut storage = vec![0u8; 4096];
    let mut rb = RingBuffer::new(&mut storage).unwrap();
    let chunk = [0x11u8; 64];
    let mut out = [0u8; 64];

    c.bench_function("spsc_write_read_64b", |b| {
        b.iter(|| {
            rb.write(&chunk);
            rb.read(&mut out);
        })
    });

    c.bench_function("spsc_advance_skip_64b", |b| {
        b.iter(|| {
            rb.advance(64);
            rb.skip(64);
        })
    });
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
