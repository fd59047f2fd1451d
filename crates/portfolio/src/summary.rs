use crate::model::{BestTrade, ChartPoint, GainLossSummary, TotalGainLoss, WorstTrade};

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Percentage of `delta` relative to `baseline`; 0 when there is no baseline.
fn percent_of(delta: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        delta / baseline * 100.0
    } else {
        0.0
    }
}

/// Gain/loss figures for a chart series, all attributed to `token`.
pub fn summarize(series: &[ChartPoint], token: &str) -> GainLossSummary {
    let initial = series.first().map_or(0.0, |p| p.value);
    let last = series.last().map_or(0.0, |p| p.value);
    let max = series.iter().map(|p| p.value).fold(initial, f64::max);
    let min = series.iter().map(|p| p.value).fold(initial, f64::min);

    let total = last - initial;
    let gain = max - initial;
    let loss = min - initial;

    GainLossSummary {
        best_trade: BestTrade {
            token: token.to_string(),
            gain: round2(gain),
            percentage: round2(percent_of(gain, initial)),
        },
        worst_trade: WorstTrade {
            token: token.to_string(),
            loss: round2(loss),
            percentage: round2(percent_of(loss, initial)),
        },
        total_gain_loss: TotalGainLoss {
            amount: round2(total),
            percentage: round2(percent_of(total, initial)),
        },
    }
}
