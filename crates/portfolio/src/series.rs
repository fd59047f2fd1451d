use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::model::ChartPoint;
use crate::parser::ParsedTransaction;

/// Running balance after transaction `index`, before chronological ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePoint {
    pub index: usize,
    pub date: NaiveDate,
    pub value: f64,
}

/// `max(1, ceil(n / max_points))`. Sampling every `stride`-th index plus the
/// last one never yields more than `max_points + 1` samples.
pub fn sampling_stride(n: usize, max_points: usize) -> usize {
    n.div_ceil(max_points.max(1)).max(1)
}

/// Walk transactions in the order given, applying each one's delta to a
/// balance seeded with `opening`, and sample the running value.
pub fn build_series(
    opening: f64,
    transactions: &[ParsedTransaction],
    max_points: usize,
    today: NaiveDate,
) -> Vec<SamplePoint> {
    let n = transactions.len();
    if n == 0 {
        return vec![SamplePoint {
            index: 0,
            date: today,
            value: opening.max(0.0),
        }];
    }

    let stride = sampling_stride(n, max_points);
    let mut balance = opening;
    let mut samples = Vec::with_capacity(max_points + 1);
    for (i, tx) in transactions.iter().enumerate() {
        balance += tx.delta();
        if i % stride == 0 || i == n - 1 {
            samples.push(SamplePoint {
                index: i,
                date: tx.date,
                value: balance.max(0.0),
            });
        }
    }
    samples
}

/// One point per day, oldest first. When several samples share a day the
/// one taken later in the walk wins.
pub fn chronological(samples: &[SamplePoint]) -> Vec<ChartPoint> {
    let mut by_day = BTreeMap::new();
    for s in samples {
        by_day.insert(s.date, s.value);
    }
    by_day
        .into_iter()
        .map(|(date, value)| ChartPoint { date, value })
        .collect()
}
