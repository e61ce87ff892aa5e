//! Benchmarks for receipt extraction and normalization

use cleannest::extract::ReceiptExtractor;
use cleannest::models::RawReceipt;
use cleannest::normalize::normalize_receipts;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn raw_receipts(count: usize) -> Vec<RawReceipt> {
    (0..count)
        .map(|i| RawReceipt {
            timestamp: format!("1/{}/25 {}:15 PM", i % 28 + 1, i % 11 + 1),
            receipt_id: format!("1-{}", i % (count / 2 + 1)),
            receipt_type: "Sale".to_string(),
            gross_sales: "255.00".to_string(),
            discounts: "0".to_string(),
            total_collected: "255.00".to_string(),
            payment_type: "Cash".to_string(),
            description: "1 x TITAN Wash, 1 x TITAN Dry, 1 x Fold, 1 x Ariel Liquid Detergent, 1 x Downy Fabcon"
                .to_string(),
            cashier_name: "Hannah".to_string(),
            customer_name: if i % 3 == 0 { String::new() } else { format!("Customer {}", i % 50) },
            status: "Closed".to_string(),
        })
        .collect()
}

fn bench_item_counts(c: &mut Criterion) {
    let extractor = ReceiptExtractor::new(&["Hannah".to_string()]).unwrap();
    let description = "2 x Wash, 2 x Dry, 1 x Extra Dry, 1 x Fold, 3 x Ariel Liquid Detergent, 1 x Downy Fabcon, 1 x Zonrox Bleach";
    c.bench_function("item_counts", |b| b.iter(|| extractor.item_counts(black_box(description))));
}

fn bench_extract_and_normalize(c: &mut Criterion) {
    let extractor = ReceiptExtractor::new(&["Hannah".to_string()]).unwrap();
    let raws = raw_receipts(2_000);
    c.bench_function("extract_all_2000", |b| {
        b.iter(|| extractor.extract_all(black_box(raws.clone())).unwrap())
    });

    let receipts = extractor.extract_all(raws).unwrap();
    c.bench_function("normalize_receipts_2000", |b| {
        b.iter(|| normalize_receipts(black_box(receipts.clone())))
    });
}

criterion_group!(benches, bench_item_counts, bench_extract_and_normalize);
criterion_main!(benches);
