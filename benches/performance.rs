use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use finance_core::core::bucketing::monthly_buckets;
use finance_core::core::recurring::{RecurrenceGenerator, RecurringRule};
use finance_core::core::services::SummaryService;
use finance_core::records::{DatedAmountRecord, MonthWindow, NewRecord, Period};
use finance_core::storage::{JsonStore, Repository};
use tempfile::tempdir;
use uuid::Uuid;

const CATEGORIES: [&str; 5] = ["Rent", "Groceries", "Fuel", "Dining", "Utilities"];

fn sample_expenses(count: usize) -> Vec<DatedAmountRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..count)
        .map(|idx| {
            let date = start + Duration::days((idx % 730) as i64);
            let input = NewRecord::new(
                date,
                10.0 + (idx % 90) as f64,
                CATEGORIES[idx % CATEGORIES.len()],
            );
            DatedAmountRecord::standalone(Uuid::new_v4(), &input)
        })
        .collect()
}

fn bench_generation(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let rule = RecurringRule::from_new(
        Uuid::new_v4(),
        &NewRecord::new(start, 1200.0, "Rent").monthly(),
    );

    c.bench_function("generate_default_horizon", |b| {
        let generator = RecurrenceGenerator::default();
        b.iter(|| black_box(generator.generate(&rule, start, None, start)))
    });

    c.bench_function("generate_100_years", |b| {
        let generator = RecurrenceGenerator::new(1200);
        b.iter(|| black_box(generator.generate(&rule, start, None, start)))
    });
}

fn bench_bucketing(c: &mut Criterion) {
    let expenses = sample_expenses(black_box(20_000));
    let window = MonthWindow::year(2024);

    c.bench_function("monthly_buckets_20k", |b| {
        b.iter(|| black_box(monthly_buckets(&expenses, window)))
    });

    c.bench_function("category_breakdown_20k", |b| {
        b.iter(|| black_box(SummaryService::category_breakdown(&expenses, Period::Year(2024))))
    });
}

fn bench_store_io(c: &mut Criterion) {
    let expenses = sample_expenses(10_000);
    let dir = tempdir().expect("tempdir");
    let store = JsonStore::open(dir.path()).expect("open store");
    let repository = store.expenses();

    c.bench_function("expenses_store_10k", |b| {
        b.iter(|| repository.store(&expenses).expect("store"))
    });

    c.bench_function("expenses_load_10k", |b| {
        b.iter(|| black_box(repository.load().expect("load")))
    });
}

criterion_group!(benches, bench_generation, bench_bucketing, bench_store_io);
criterion_main!(benches);
