//! Benchmarks for percentile ranking and composite scoring.

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rps_data::{Bar, Instrument, MarketDataSource, MemorySource};
use rps_engine::{
    Aggregation, CompositeScorer, RankingEngine, RankingUnit, ReturnRecord, ScoreTable,
    rank_records,
};
use std::collections::BTreeMap;

fn random_records(n: usize, rng: &mut StdRng) -> Vec<ReturnRecord> {
    (0..n)
        .map(|i| ReturnRecord::new(format!("sh{:06}", i), rng.gen_range(-50.0..50.0)))
        .collect()
}

fn benchmark_rank_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank_records");
    let mut rng = StdRng::seed_from_u64(7);

    for n in [100, 1_000, 5_000] {
        let records = random_records(n, &mut rng);
        group.bench_with_input(BenchmarkId::new("universe", n), &records, |b, records| {
            b.iter(|| rank_records(black_box(records.clone())));
        });
    }

    group.finish();
}

fn benchmark_rank_unit(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default();
    let dates: Vec<NaiveDate> = start.iter_days().take(300).collect();

    let mut source = MemorySource::new();
    for i in 0..1_000 {
        let mut close = 10.0;
        let bars: Vec<Bar> = dates
            .iter()
            .map(|&d| {
                close *= 1.0 + rng.gen_range(-0.03..0.03);
                Bar::new(d, close)
            })
            .collect();
        source.insert(format!("sz{:06}", i), bars);
    }
    let instruments = source.list_instruments("ALL").unwrap_or_default();
    let eligible: Vec<&Instrument> = instruments.iter().collect();
    let date = dates[dates.len() - 1];
    let engine = RankingEngine::default();

    let mut group = c.benchmark_group("rank_unit");
    for period in [20, 250] {
        let unit = RankingUnit::trailing(period);
        group.bench_function(BenchmarkId::new("period", period), |b| {
            b.iter(|| engine.rank(&source, black_box(&unit), date, &eligible));
        });
    }
    group.finish();
}

fn benchmark_composite(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(13);
    let periods = [10, 20, 50, 120, 250];
    let per_period: BTreeMap<usize, ScoreTable> = periods
        .iter()
        .map(|&p| (p, rank_records(random_records(4_000, &mut rng))))
        .collect();

    c.bench_function("composite_inverse_period", |b| {
        b.iter(|| {
            CompositeScorer::composite(
                black_box(&per_period),
                &periods,
                Aggregation::InversePeriod,
            )
        });
    });
}

criterion_group!(benches, benchmark_rank_records, benchmark_rank_unit, benchmark_composite);
criterion_main!(benches);
