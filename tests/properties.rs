use glucose_pipeline::{
    DriftCompensator, DriftConfig, FilterConfig, MAX_WINDOW, MIN_WINDOW, Q15, ReferenceMode,
    SmoothingFilter,
};
use proptest::prelude::*;

fn reference_mode() -> impl Strategy<Value = ReferenceMode> {
    prop_oneof![Just(ReferenceMode::Tracking), Just(ReferenceMode::Latched)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn low_pass_has_unit_dc_gain(cutoff in 0.0002f32..0.4999, level in 40.0f32..400.0) {
        let mut float = SmoothingFilter::new(FilterConfig::low_pass(cutoff)).unwrap();
        let mut fixed = SmoothingFilter::<Q15>::with_precision(FilterConfig::low_pass(cutoff)).unwrap();

        // Poles approach the unit circle at both ends of the band
        let margin = cutoff.min(0.5 - cutoff);
        let samples = (30.0 / margin) as usize + 200;
        let (mut a, mut b) = (0.0, 0.0);
        for _ in 0..samples {
            a = float.process(level);
            b = fixed.process(level);
        }

        let tolerance = level * 1e-3;
        prop_assert!(
            (a - level).abs() <= tolerance,
            "cutoff {} settled at {} instead of {}", cutoff, a, level
        );
        prop_assert!(
            (b - level).abs() <= tolerance,
            "cutoff {} fixed point settled at {} instead of {}", cutoff, b, level
        );
    }
}

proptest! {
    #[test]
    fn window_size_accepted_only_in_range(window in any::<u8>()) {
        let accepted = SmoothingFilter::new(FilterConfig::moving_average(window)).is_ok();
        prop_assert_eq!(accepted, (MIN_WINDOW..=MAX_WINDOW).contains(&window));
    }

    #[test]
    fn moving_average_stays_within_window_extremes(
        window in MIN_WINDOW..=MAX_WINDOW,
        samples in prop::collection::vec(0.0f32..500.0, 1..100),
    ) {
        let mut filter = SmoothingFilter::new(FilterConfig::moving_average(window)).unwrap();
        let window = usize::from(window);

        for (i, &raw) in samples.iter().enumerate() {
            let out = filter.process(raw);
            let recent = &samples[(i + 1).saturating_sub(window)..=i];
            let lo = recent.iter().cloned().fold(f32::INFINITY, f32::min);
            let hi = recent.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            prop_assert!(out >= lo - 1e-3 && out <= hi + 1e-3, "{} outside [{}, {}]", out, lo, hi);
        }
    }

    #[test]
    fn configure_discards_history(
        warmup in prop::collection::vec(40.0f32..400.0, 0..30),
        alpha in 0.01f32..0.99,
        input in 40.0f32..400.0,
    ) {
        let cfg = FilterConfig::ema(alpha);
        let mut used = SmoothingFilter::new(FilterConfig::moving_average(7)).unwrap();
        for &raw in &warmup {
            used.process(raw);
        }
        used.configure(cfg).unwrap();
        prop_assert_eq!(used.fill_count(), 0);

        let mut fresh = SmoothingFilter::new(cfg).unwrap();
        for _ in 0..cfg.window_size {
            prop_assert_eq!(used.process(input), fresh.process(input));
        }
    }

    #[test]
    fn drift_offset_is_bounded_and_output_non_negative(
        readings in prop::collection::vec((0.0f32..400.0, 1u32..600), 1..300),
        max_offset in 1.0f32..60.0,
        mode in reference_mode(),
    ) {
        let cfg = DriftConfig {
            max_offset,
            reference_mode: mode,
            ..DriftConfig::default()
        };
        let mut drift = DriftCompensator::new(cfg);

        let mut t = 0u32;
        for (value, step) in readings {
            t = t.wrapping_add(step);
            let out = drift.apply_compensation(value, t);
            prop_assert!(out >= 0.0, "negative output {}", out);
            prop_assert!(drift.current_offset().abs() <= max_offset);
        }
    }

    #[test]
    fn drift_offset_is_bounded_on_flat_signals(
        level in 41.0f32..400.0,
        reference in 1.0f32..400.0,
        max_offset in 1.0f32..60.0,
    ) {
        let cfg = DriftConfig {
            max_offset,
            reference_mode: ReferenceMode::Latched,
            ..DriftConfig::default()
        };
        let mut drift = DriftCompensator::new(cfg);
        drift.set_stable_reference(reference, 0);

        let mut t = 0u32;
        for _ in 0..200 {
            t += 300;
            let out = drift.apply_compensation(level, t);
            prop_assert!(out >= 0.0);
        }
        prop_assert!(drift.current_offset().abs() <= max_offset);
    }
}
