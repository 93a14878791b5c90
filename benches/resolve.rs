use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use symsize::dwarf::{DebugIndex, DebugRange};
use symsize::formats::elf::ElfImage;
use symsize::resolve::resolve;
use symsize::symbols::{SymbolBinding, SymbolKind, SymbolRecord};

/// Minimal ELF64 image with one .text section at [0x10000, 0x110000).
fn synthetic_image() -> Vec<u8> {
    let mut data = vec![0u8; 1024];
    data[0..4].copy_from_slice(b"\x7fELF");
    data[4] = 2;
    data[5] = 1;
    data[6] = 1;
    data[16] = 3; // ET_DYN
    data[18] = 62; // EM_X86_64
    data[40..48].copy_from_slice(&0x100u64.to_le_bytes()); // e_shoff
    data[52] = 64;
    data[54] = 56;
    data[58] = 64;
    data[60] = 3; // e_shnum
    data[62] = 2; // e_shstrndx

    // Section 1: .text, far larger virtually than the backing file. NOBITS
    // keeps the image tiny; the resolver only reads headers anyway.
    let s1 = 0x100 + 64;
    data[s1] = 1;
    data[s1 + 4] = 8; // SHT_NOBITS
    data[s1 + 8] = 6; // SHF_ALLOC | SHF_EXECINSTR
    data[s1 + 16..s1 + 24].copy_from_slice(&0x10000u64.to_le_bytes());
    data[s1 + 32..s1 + 40].copy_from_slice(&0x100000u64.to_le_bytes());

    // Section 2: .shstrtab
    let s2 = 0x100 + 128;
    data[s2] = 7;
    data[s2 + 4] = 3;
    data[s2 + 24..s2 + 32].copy_from_slice(&0x300u64.to_le_bytes());
    data[s2 + 32] = 0x20;

    data[0x300 + 1..0x300 + 7].copy_from_slice(b".text\0");
    data[0x300 + 7..0x300 + 17].copy_from_slice(b".shstrtab\0");
    data
}

fn synthetic_symbols(count: usize) -> Vec<SymbolRecord> {
    (0..count)
        .map(|i| SymbolRecord {
            name: format!("fn_{:05}", i),
            address: 0x10000 + (i as u64) * 16,
            // every third symbol has no declared size
            declared_size: if i % 3 == 0 { 0 } else { 12 },
            binding: if i % 7 == 0 {
                SymbolBinding::Weak
            } else {
                SymbolBinding::Global
            },
            kind: SymbolKind::Function,
            section_index: Some(1),
        })
        .collect()
}

fn synthetic_ranges(count: usize) -> Vec<DebugRange> {
    (0..count)
        .map(|i| DebugRange {
            start: 0x10000 + (i as u64) * 256,
            end: 0x10000 + (i as u64 + 1) * 256,
            file: format!("src/module_{:02}.c", i % 40),
            line: Some(1),
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let image = synthetic_image();
    let elf = ElfImage::parse(&image).expect("synthetic image parses");
    let index = DebugIndex::from_ranges(synthetic_ranges(4096));

    let mut group = c.benchmark_group("resolve");
    for count in [1_000usize, 10_000, 50_000] {
        let symbols = synthetic_symbols(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("{}_symbols", count), |b| {
            b.iter(|| resolve(&symbols, &elf, &index))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
