//! Performance benchmarks for pdfcmap-rs.
//!
//! Benchmarks cover the hot paths of text extraction with composite fonts:
//! - Parsing a ToUnicode CMap program
//! - Segmenting byte strings under 1-byte, 2-byte and mixed-width codespaces
//! - Resolving codes to CIDs and Unicode text

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use pdfcmap_parse::{parse_cmap, predefined_cmap};

// ---------------------------------------------------------------------------
// Fixture generators
// ---------------------------------------------------------------------------

/// A ToUnicode program with `n` bfchar entries and one large bfrange.
fn to_unicode_program(n: u32) -> Vec<u8> {
    let mut out = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    for chunk in (0..n).collect::<Vec<_>>().chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for &i in chunk {
            out.push_str(&format!("<{:04X}> <{:04X}>\n", i + 1, 0x4E00 + i));
        }
        out.push_str("endbfchar\n");
    }
    out.push_str("1 beginbfrange\n<8000> <8FFF> <AC00>\nendbfrange\nendcmap\nend\nend\n");
    out.into_bytes()
}

/// `len` bytes of Shift-JIS style text alternating ASCII and 2-byte codes.
fn mixed_text(len: usize) -> Vec<u8> {
    [0x41, 0x82, 0xA0, 0xB1, 0x81, 0x40]
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn two_byte_text(len: usize) -> Vec<u8> {
    (0..len / 2)
        .flat_map(|i| ((i % 0x1000) as u16 + 1).to_be_bytes())
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let program = to_unicode_program(2_000);
    c.bench_function("parse_to_unicode_2000", |b| {
        b.iter(|| parse_cmap(black_box(&program)).unwrap())
    });
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_codes");

    let identity = predefined_cmap("Identity-H").unwrap();
    let two_byte = two_byte_text(64 * 1024);
    group.bench_function("identity_h_64k", |b| {
        b.iter(|| identity.read_codes(black_box(&two_byte)))
    });

    let rksj = predefined_cmap("90ms-RKSJ-H").unwrap();
    let mixed = mixed_text(64 * 1024);
    group.bench_function("rksj_mixed_64k", |b| {
        b.iter(|| rksj.read_codes(black_box(&mixed)))
    });

    let single = parse_cmap(b"1 begincodespacerange <00> <FF> endcodespacerange").unwrap();
    group.bench_function("single_byte_64k", |b| {
        b.iter(|| single.read_codes(black_box(&mixed)))
    });

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    let rksj = predefined_cmap("90ms-RKSJ-H").unwrap();
    let mixed = mixed_text(64 * 1024);
    group.bench_function("to_cid_rksj_64k", |b| {
        b.iter(|| {
            rksj.codes(black_box(&mixed))
                .filter_map(|code| code.value())
                .map(|code| rksj.to_cid(code))
                .sum::<u32>()
        })
    });

    let to_unicode = parse_cmap(&to_unicode_program(2_000)).unwrap();
    let two_byte = two_byte_text(64 * 1024);
    group.bench_function("charcodes_to_unicode_64k", |b| {
        b.iter(|| to_unicode.charcodes_to_unicode(black_box(&two_byte)))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_segmentation, bench_resolution);
criterion_main!(benches);
