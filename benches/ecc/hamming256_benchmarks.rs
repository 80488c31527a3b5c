use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nand_ecc::ecc::hamming::{compute256, verify256, BLOCK_SIZE};
use nand_ecc::ecc::page::{code_len, compute, verify};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_data(len: usize) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

fn bench_block(c: &mut Criterion) {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(&random_data(BLOCK_SIZE));
    let code = compute256(&block);

    let mut group = c.benchmark_group("block");
    group.throughput(Throughput::Bytes(BLOCK_SIZE as u64));
    group.bench_function("compute256", |b| b.iter(|| compute256(black_box(&block))));
    group.bench_function("verify256_clean", |b| {
        b.iter(|| verify256(black_box(&mut block), black_box(&code)))
    });
    group.bench_function("verify256_corrected", |b| {
        b.iter(|| {
            block[77] ^= 0x08;
            verify256(black_box(&mut block), black_box(&code))
        })
    });
    group.finish();
}

fn bench_page(c: &mut Criterion) {
    let mut group = c.benchmark_group("page");
    for page_size in [512usize, 2048, 4096] {
        let data = random_data(page_size);
        let mut code = vec![0u8; code_len(page_size).unwrap()];
        compute(&data, &mut code).unwrap();

        group.throughput(Throughput::Bytes(page_size as u64));
        group.bench_with_input(BenchmarkId::new("compute", page_size), &data, |b, data| {
            let mut out = vec![0u8; code.len()];
            b.iter(|| compute(black_box(data), &mut out).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("verify", page_size), &data, |b, data| {
            let mut page = data.clone();
            b.iter(|| verify(black_box(&mut page), black_box(&code)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_block, bench_page);
criterion_main!(benches);
