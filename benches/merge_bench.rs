//! Merge and combinator performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use csscade::{Combinator, CombinatorConfig, MergeConfig, MergeEngine, MergeMode, OverrideSpec};

const BUTTON_CSS: &str = r#"
.btn { margin: 10px; padding: 4px 8px; border: 1px solid #ccc; color: #333; }
.btn:hover { color: #000; border-color: #999; }
.btn:focus { outline: 2px solid blue; }
@media (max-width: 600px) { .btn { padding: 2px; } }
"#;

fn bench_permanent_merge(c: &mut Criterion) {
    let overrides = OverrideSpec::new()
        .set("margin-top", "30px")
        .set("color", "red")
        .pseudo(":hover", &[("color", "blue")]);
    let mut engine = MergeEngine::new(MergeConfig::with_mode(MergeMode::Permanent)).unwrap();

    c.bench_function("permanent_merge", |b| {
        b.iter(|| engine.merge(black_box(BUTTON_CSS), black_box(&overrides)).unwrap())
    });
}

fn bench_component_merge(c: &mut Criterion) {
    let overrides = OverrideSpec::new()
        .set("padding", "12px")
        .set("border-color", "red")
        .media("(max-width: 600px)", &[("padding", "6px")]);
    let mut engine = MergeEngine::new(MergeConfig::default()).unwrap();

    c.bench_function("component_merge", |b| {
        b.iter(|| engine.merge(black_box(BUTTON_CSS), black_box(&overrides)).unwrap())
    });
}

fn bench_large_stylesheet(c: &mut Criterion) {
    let mut css = String::new();
    for i in 0..500 {
        css.push_str(&format!(".item-{} {{ margin: {}px; padding: 2px; color: #{:06x}; }}\n", i, i % 20, i * 97));
    }
    let overrides = OverrideSpec::new().set("padding-left", "8px");
    let mut engine = MergeEngine::new(MergeConfig::with_mode(MergeMode::Permanent)).unwrap();

    c.bench_function("large_stylesheet_merge", |b| {
        b.iter(|| engine.merge(black_box(css.as_str()), black_box(&overrides)).unwrap())
    });
}

fn bench_combinator_detect(c: &mut Criterion) {
    let mut combinator = Combinator::new(CombinatorConfig::default()).unwrap();
    combinator
        .load_css(
            "utilities",
            ".p-3 { padding: 12px; } .pt-2 { padding-top: 8px; } .rounded { border-radius: 4px; } \
             .border { border: 1px solid; } .text-red { color: red; } .link:hover { color: blue; }",
        )
        .unwrap();
    let classes: Vec<String> = ["p-3", "pt-2", "rounded", "border", "text-red", "link"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let overrides = OverrideSpec::new().set("padding-top", "20px").set("border-width", "2px");

    c.bench_function("combinator_detect", |b| {
        b.iter(|| combinator.detect(black_box(&classes), black_box(&overrides), None).unwrap())
    });
}

criterion_group!(
    benches,
    bench_permanent_merge,
    bench_component_merge,
    bench_large_stylesheet,
    bench_combinator_detect
);
criterion_main!(benches);
