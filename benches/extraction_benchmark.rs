//! Product page extraction benchmark
//!
//! Measures title and price extraction over a page padded with unrelated
//! markup, for the first pattern matching and for the last-resort pattern.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use price_monitor_lib::infrastructure::ProductPageParser;

fn product_page(price_markup: &str) -> String {
    let filler: String = (0..400)
        .map(|i| format!("<div class=\"a-row a-spacing-small\"><span class=\"a-text-normal\">item {i}</span></div>"))
        .collect();
    format!(
        "<html><body><span id=\"productTitle\">  Il nome della rosa  </span>{filler}{price_markup}</body></html>"
    )
}

fn extraction_benchmark(c: &mut Criterion) {
    let parser = ProductPageParser::new().unwrap();

    let deal = product_page("<span class=\"a-size-base a-color-price a-color-price\">12,50 €</span>");
    c.bench_function("parse page - first pattern", |b| {
        b.iter(|| parser.parse(black_box(&deal)).unwrap())
    });

    let buying = product_page(
        "<span class=\"a-size-medium a-color-price priceBlockBuyingPriceString\">12,50 €</span>",
    );
    c.bench_function("parse page - last pattern", |b| {
        b.iter(|| parser.parse(black_box(&buying)).unwrap())
    });

    let missing = product_page("");
    c.bench_function("parse page - no price", |b| {
        b.iter(|| parser.parse(black_box(&missing)).unwrap())
    });
}

criterion_group!(benches, extraction_benchmark);
criterion_main!(benches);
