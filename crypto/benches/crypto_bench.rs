use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn ed25519_sign_bench(c: &mut Criterion) {
    let kp = guardian_crypto::keypair_from_seed(&[1u8; 32]);
    let msg = [42u8; 48];

    c.bench_function("ed25519_sign_submission", |b| {
        b.iter(|| guardian_crypto::sign_message(black_box(&msg), &kp.private))
    });
}

fn ed25519_verify_bench(c: &mut Criterion) {
    let kp = guardian_crypto::keypair_from_seed(&[1u8; 32]);
    let msg = [42u8; 48];
    let sig = guardian_crypto::sign_message(&msg, &kp.private);

    c.bench_function("ed25519_verify_submission", |b| {
        b.iter(|| guardian_crypto::verify_signature(black_box(&msg), &sig, &kp.public))
    });
}

fn blake2b_chain_bench(c: &mut Criterion) {
    c.bench_function("blake2b_256_chain_32B", |b| {
        b.iter(|| {
            let mut v = [7u8; 32];
            for _ in 0..16 {
                v = guardian_crypto::blake2b_256(black_box(&v));
            }
            v
        })
    });
}

criterion_group!(
    benches,
    ed25519_sign_bench,
    ed25519_verify_bench,
    blake2b_chain_bench
);
criterion_main!(benches);
