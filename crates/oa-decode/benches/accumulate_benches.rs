use criterion::{Criterion, criterion_group, criterion_main};
use oa_decode::{accumulate, classify};
use oa_format::{FormatCatalog, Generation, Interface, ReasonBits, ReportView};
use oa_test_helpers::ReportWriter;

fn benchmark_accumulate(c: &mut Criterion) {
    let Ok(legacy) = FormatCatalog::builtin(Interface::Legacy) else {
        return;
    };
    let Ok(observation) = FormatCatalog::builtin(Interface::Observation) else {
        return;
    };

    for (name, format) in [
        ("accumulate A32u40_A4u32_B8_C8", legacy.lookup(Generation::Gen12, 10)),
        ("accumulate PEC64u64_B8_C8", observation.lookup(Generation::Xe2, 12)),
    ] {
        let Ok(format) = format else { continue };
        let start = ReportWriter::new(format).timestamp(100).into_bytes();
        let end = ReportWriter::new(format).timestamp(50).into_bytes();
        c.bench_function(name, |b| {
            b.iter(|| std::hint::black_box(accumulate(format, &start, &end).ok()));
        });
    }
}

fn benchmark_classify(c: &mut Criterion) {
    let Ok(catalog) = FormatCatalog::builtin(Interface::Legacy) else {
        return;
    };

    for (name, generation, id) in [
        ("classify explicit reason", Generation::Gen9, 10),
        ("classify timestamp heuristic", Generation::Haswell, 5),
    ] {
        let Ok(format) = catalog.lookup(generation, id) else {
            continue;
        };
        let bytes = ReportWriter::new(format)
            .reason(ReasonBits::TIMER)
            .timestamp(0x400)
            .into_bytes();
        c.bench_function(name, |b| {
            b.iter(|| {
                let view = ReportView::new(format, &bytes).ok();
                std::hint::black_box(view.and_then(|v| classify(&v, 10).ok()))
            });
        });
    }
}

criterion_group!(benches, benchmark_accumulate, benchmark_classify);
criterion_main!(benches);
