//! Momentum indicator and synthetic sparkline history.

/// Look-back used for the dashboard RSI gauge.
pub const RSI_PERIOD: usize = 14;

/// RSI reported when there is not enough history to compute one.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Interpolated points in a synthetic history; the current price is appended.
pub const DEFAULT_HISTORY_POINTS: usize = 20;

/// Noise span relative to the current price (total width, centred on zero).
const HISTORY_NOISE_SPAN: f64 = 0.005;

/// Wilder-smoothed RSI over `closes` (oldest first), evaluated at the last close.
///
/// Returns [`NEUTRAL_RSI`] when fewer than `period + 1` closes are available.
pub fn compute_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let mut gains = Vec::with_capacity(closes.len() - 1);
    let mut losses = Vec::with_capacity(closes.len() - 1);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let period_f = period as f64;
    let mut avg_gain = gains[..period].iter().sum::<f64>() / period_f;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period_f;

    for (gain, loss) in gains[period..].iter().zip(&losses[period..]) {
        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;
    }

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rsi = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
    if rsi.is_finite() {
        rsi.clamp(0.0, 100.0)
    } else {
        NEUTRAL_RSI
    }
}

/// Plausible recent path ending at `current`, for instruments without real closes.
///
/// Walks linearly from the implied previous close to `current` over `points`
/// steps with small uniform noise, then appends `current` exactly.
pub fn mock_history(
    current: f64,
    change_percent: f64,
    points: usize,
    rng: &mut fastrand::Rng,
) -> Vec<f64> {
    if current == 0.0 || !current.is_finite() {
        return Vec::new();
    }

    let divisor = 1.0 + change_percent / 100.0;
    let start = if divisor > 0.0 && divisor.is_finite() {
        current / divisor
    } else {
        current
    };
    let step = if points == 0 {
        0.0
    } else {
        (current - start) / points as f64
    };

    let mut history = Vec::with_capacity(points + 1);
    for i in 0..points {
        let noise = (rng.f64() - 0.5) * current * HISTORY_NOISE_SPAN;
        history.push(start + step * i as f64 + noise);
    }
    history.push(current);
    history
}
