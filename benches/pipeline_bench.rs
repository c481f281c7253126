use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use img_sweep::evaluate::OptimizationResult;
use img_sweep::report::generate_report;
use img_sweep::svg::minify;

fn inkscape_svg(shapes: usize) -> String {
    let mut svg = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- Created with Inkscape -->\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\"\n   \
         xmlns:inkscape=\"http://www.inkscape.org/namespaces/inkscape\"\n   \
         viewBox=\"0 0 100 100\">\n  <metadata><rdf:RDF></rdf:RDF></metadata>\n",
    );
    for i in 0..shapes {
        svg.push_str(&format!(
            "  <g   id=\"layer{i}\"   inkscape:label=\"Layer {i}\" >\n    <rect x=\"{i}\" y=\"{i}\"   width=\"1\" height=\"1\" />\n  </g>\n",
            i = i
        ));
    }
    svg.push_str("</svg>\n");
    svg
}

fn results(count: usize) -> Vec<OptimizationResult> {
    (0..count)
        .map(|i| OptimizationResult {
            file_name: format!("assets/images/photo-{:05}.png", i),
            size_before: 100_000 + i as u64,
            size_after: 60_000,
            percentage_change: -40.0,
            significant: true,
        })
        .collect()
}

fn bench_svg_minify(c: &mut Criterion) {
    let mut group = c.benchmark_group("svg_minify");

    for shapes in [10, 100, 1000] {
        let svg = inkscape_svg(shapes);
        group.bench_with_input(BenchmarkId::from_parameter(shapes), &svg, |b, svg| {
            b.iter(|| minify(black_box(svg), 10))
        });
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_report");

    for count in [10, 500, 5000] {
        let data = results(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| generate_report(black_box(data), "https://github.com/o/r/actions/runs/1"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_svg_minify, bench_report);
criterion_main!(benches);
