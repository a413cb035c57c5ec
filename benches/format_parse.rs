use bitlens::{Bits, Program};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_format(token_count: usize) -> String {
    let mut spec = String::new();
    for i in 0..token_count {
        if i > 0 {
            spec.push_str(", ");
        }
        spec.push_str("uint:16");
    }
    spec
}

fn gen_payload(total_bits: usize) -> Bits {
    let total_bytes = (total_bits + 7) / 8;
    let mut data = Vec::with_capacity(total_bytes);

    // Deterministic but non-trivial pattern
    for i in 0..total_bytes {
        data.push((i * 31 % 256) as u8);
    }

    Bits::from_bytes(&data)
}

fn bench_compile(c: &mut Criterion) {
    for &token_count in &[1usize, 10, 50, 100] {
        let spec = gen_format(token_count);
        c.bench_function(&format!("compile_{}_tokens", token_count), |b| {
            b.iter(|| {
                let _ = Program::from_spec(&spec).unwrap();
            })
        });
    }
}

fn bench_unpack(c: &mut Criterion) {
    for &token_count in &[1usize, 10, 50, 100] {
        let spec = gen_format(token_count);
        let payload = gen_payload(token_count * 16);

        c.bench_function(&format!("unpack_{}_tokens", token_count), |b| {
            b.iter(|| {
                let _ = payload.unpack(&spec).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_compile, bench_unpack);
criterion_main!(benches);
