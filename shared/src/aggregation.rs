//! Reduction of provider time series into fixed 7-day series

use crate::types::{DailySeries, EMPTY_SERIES, HORIZON_DAYS, HOURS_PER_DAY};

/// Mean of each consecutive 24-sample block of an hourly series.
///
/// Block `i` covers indices `[24i, 24i + 24)`. The block sum is always divided
/// by 24, so a short or partially missing block yields a lower mean rather
/// than a mean over the samples present. Missing samples add nothing to the
/// sum. Absent or empty input gives a series of nulls.
pub fn daily_means(hourly: Option<&[Option<f64>]>) -> DailySeries {
    let samples = match hourly {
        Some(samples) if !samples.is_empty() => samples,
        _ => return EMPTY_SERIES,
    };

    std::array::from_fn(|day| {
        let start = (day * HOURS_PER_DAY).min(samples.len());
        let end = (start + HOURS_PER_DAY).min(samples.len());
        let sum: f64 = samples[start..end].iter().flatten().sum();
        Some(sum / HOURS_PER_DAY as f64)
    })
}

/// Elementwise sum of sibling series divided by `divisor`.
///
/// A day is null only when every component is null for that day.
pub fn combine(series: &[DailySeries], divisor: f64) -> DailySeries {
    std::array::from_fn(|day| {
        let values: Vec<f64> = series.iter().filter_map(|s| s[day]).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / divisor)
        }
    })
}

/// Soil temperature: mean of the surface and 6 cm readings
pub fn soil_temperature(surface: DailySeries, depth_6cm: DailySeries) -> DailySeries {
    combine(&[surface, depth_6cm], 2.0)
}

/// Soil moisture: three depth layers summed and halved.
///
/// The divisor is 2 for three layers. Stored district data has always been
/// computed this way, so the value is kept as is.
pub fn soil_moisture(
    layer_0_1cm: DailySeries,
    layer_1_3cm: DailySeries,
    layer_3_9cm: DailySeries,
) -> DailySeries {
    combine(&[layer_0_1cm, layer_1_3cm, layer_3_9cm], 2.0)
}

/// Fit an already-daily provider series to the 7-day horizon, padding with
/// nulls or dropping trailing days.
pub fn fit_daily(values: Option<Vec<Option<f64>>>) -> DailySeries {
    let mut series = EMPTY_SERIES;
    if let Some(values) = values {
        for (slot, value) in series.iter_mut().zip(values.into_iter().take(HORIZON_DAYS)) {
            *slot = value;
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blocks_of_index() -> Vec<Option<f64>> {
        (0..HORIZON_DAYS * HOURS_PER_DAY)
            .map(|i| Some((i / HOURS_PER_DAY) as f64))
            .collect()
    }

    #[test]
    fn test_aligned_blocks() {
        let samples = blocks_of_index();
        let means = daily_means(Some(&samples));
        assert_eq!(
            means,
            [Some(0.0), Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)]
        );
    }

    #[test]
    fn test_absent_or_empty_input() {
        assert_eq!(daily_means(None), EMPTY_SERIES);
        assert_eq!(daily_means(Some(&[])), EMPTY_SERIES);
    }

    #[test]
    fn test_short_input_still_divides_by_24() {
        // 30 samples of 12.0: a full first day, 6 hours of the second
        let samples = vec![Some(12.0); 30];
        let means = daily_means(Some(&samples));
        assert_eq!(means[0], Some(12.0));
        assert_eq!(means[1], Some(3.0));
        for day in 2..HORIZON_DAYS {
            assert_eq!(means[day], Some(0.0));
        }
    }

    #[test]
    fn test_missing_samples_count_as_zero() {
        let mut samples = vec![Some(24.0); HORIZON_DAYS * HOURS_PER_DAY];
        samples[0] = None;
        let means = daily_means(Some(&samples));
        assert_eq!(means[0], Some(23.0));
        assert_eq!(means[1], Some(24.0));
    }

    #[test]
    fn test_extra_samples_are_ignored() {
        let samples = vec![Some(1.0); 16 * HOURS_PER_DAY];
        let means = daily_means(Some(&samples));
        assert!(means.iter().all(|m| *m == Some(1.0)));
    }

    #[test]
    fn test_soil_temperature_average() {
        let surface = [Some(20.0); HORIZON_DAYS];
        let deep = [Some(30.0); HORIZON_DAYS];
        assert_eq!(soil_temperature(surface, deep), [Some(25.0); HORIZON_DAYS]);
    }

    #[test]
    fn test_soil_moisture_halves_three_layers() {
        let a = [Some(0.1); HORIZON_DAYS];
        let b = [Some(0.2); HORIZON_DAYS];
        let c = [Some(0.3); HORIZON_DAYS];
        let combined = soil_moisture(a, b, c);
        for value in combined {
            assert!((value.unwrap() - 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_combine_with_missing_components() {
        let present = [Some(10.0); HORIZON_DAYS];
        assert_eq!(soil_temperature(present, EMPTY_SERIES), [Some(5.0); HORIZON_DAYS]);
        assert_eq!(soil_temperature(EMPTY_SERIES, EMPTY_SERIES), EMPTY_SERIES);
    }

    #[test]
    fn test_fit_daily() {
        assert_eq!(fit_daily(None), EMPTY_SERIES);

        let short = fit_daily(Some(vec![Some(1.0), None, Some(3.0)]));
        assert_eq!(short, [Some(1.0), None, Some(3.0), None, None, None, None]);

        let long = fit_daily(Some((0..10).map(|i| Some(i as f64)).collect()));
        assert_eq!(long[6], Some(6.0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Constant blocks reduce to their constant
        #[test]
        fn prop_constant_blocks(values in proptest::array::uniform7(-1000i32..1000i32)) {
            let samples: Vec<Option<f64>> = values
                .iter()
                .flat_map(|v| std::iter::repeat(Some(*v as f64)).take(HOURS_PER_DAY))
                .collect();
            let means = daily_means(Some(&samples));
            for (mean, expected) in means.iter().zip(values.iter()) {
                prop_assert_eq!(*mean, Some(*expected as f64));
            }
        }

        /// Any non-empty input yields a full series of numbers
        #[test]
        fn prop_always_seven_numbers(samples in proptest::collection::vec(proptest::option::of(-50.0f64..50.0), 1..400)) {
            let means = daily_means(Some(&samples));
            prop_assert_eq!(means.len(), HORIZON_DAYS);
            prop_assert!(means.iter().all(|m| m.is_some()));
        }
    }
}
