mod moving_average_tests {
    use glucose_pipeline::{FilterConfig, SmoothingFilter};

    #[test]
    fn moving_average_fills_then_wraps() {
        let mut filter = SmoothingFilter::new(FilterConfig::moving_average(3)).unwrap();

        assert_eq!(filter.process(10.0), 10.0);
        assert_eq!(filter.process(20.0), 15.0);
        assert_eq!(filter.process(30.0), 20.0);
        assert_eq!(filter.fill_count(), 3);

        // Oldest sample (10) drops out
        let out = filter.process(40.0);
        assert!((out - 30.0).abs() < 1e-5, "Expected 30.0, got {}", out);
        assert_eq!(filter.fill_count(), 3);
    }

    #[test]
    fn moving_average_smooths_alternating_noise() {
        let mut filter = SmoothingFilter::new(FilterConfig::moving_average(4)).unwrap();

        let mut output = 0.0;
        for i in 0..20 {
            let raw = if i % 2 == 0 { 104.0 } else { 96.0 };
            output = filter.process(raw);
        }

        assert!((output - 100.0).abs() < 1e-4, "Expected 100.0, got {}", output);
    }
}

mod ema_tests {
    use glucose_pipeline::{FilterConfig, Q15, SmoothingFilter};

    #[test]
    fn ema_first_sample_initializes() {
        let mut filter = SmoothingFilter::new(FilterConfig::ema(0.5)).unwrap();
        assert_eq!(filter.process(100.0), 100.0);
    }

    #[test]
    fn ema_step_response() {
        let mut filter = SmoothingFilter::new(FilterConfig::ema(0.5)).unwrap();
        filter.process(100.0);

        let out1 = filter.process(200.0);
        assert!((out1 - 150.0).abs() < 1e-4, "Expected 150.0, got {}", out1);

        let out2 = filter.process(200.0);
        assert!((out2 - 175.0).abs() < 1e-4, "Expected 175.0, got {}", out2);
    }

    #[test]
    fn ema_fixed_point_step_response() {
        let mut filter = SmoothingFilter::<Q15>::with_precision(FilterConfig::ema(0.5)).unwrap();
        assert_eq!(filter.process(100.0), 100.0);

        let out = filter.process(200.0);
        assert!((out - 150.0).abs() < 1e-3, "Expected 150.0, got {}", out);
    }

    #[test]
    fn ema_converges_to_constant() {
        let mut filter = SmoothingFilter::new(FilterConfig::ema(0.2)).unwrap();
        filter.process(50.0);

        let mut output = 0.0;
        for _ in 0..100 {
            output = filter.process(180.0);
        }

        assert!((output - 180.0).abs() < 0.01, "Expected 180.0, got {}", output);
    }
}

mod low_pass_tests {
    use glucose_pipeline::{FilterConfig, Q15, SmoothingFilter};

    #[test]
    fn low_pass_settles_on_constant_input() {
        let mut filter = SmoothingFilter::new(FilterConfig::low_pass(0.1)).unwrap();

        let mut output = 0.0;
        for _ in 0..300 {
            output = filter.process(140.0);
        }

        assert!((output - 140.0).abs() < 0.01, "Expected 140.0, got {}", output);
    }

    #[test]
    fn low_pass_attenuates_fast_oscillation() {
        let mut filter = SmoothingFilter::new(FilterConfig::low_pass(0.05)).unwrap();

        // Period-2 oscillation sits at Nyquist, far above the cutoff
        let mut max_dev: f32 = 0.0;
        for i in 0..400 {
            let raw = if i % 2 == 0 { 110.0 } else { 90.0 };
            let out = filter.process(raw);
            if i > 200 {
                max_dev = max_dev.max((out - 100.0).abs());
            }
        }

        assert!(max_dev < 0.5, "Oscillation leaked through: {}", max_dev);
    }

    #[test]
    fn low_pass_fixed_point_settles() {
        let mut filter = SmoothingFilter::<Q15>::with_precision(FilterConfig::low_pass(0.1)).unwrap();

        let mut output = 0.0;
        for _ in 0..300 {
            output = filter.process(140.0);
        }

        assert!((output - 140.0).abs() < 0.1, "Expected ~140.0, got {}", output);
    }
}

mod median_tests {
    use glucose_pipeline::{FilterConfig, SmoothingFilter};

    #[test]
    fn median_rejects_single_spike() {
        let mut filter = SmoothingFilter::new(FilterConfig::median(5)).unwrap();

        for _ in 0..5 {
            filter.process(100.0);
        }

        assert_eq!(filter.process(400.0), 100.0);
        assert_eq!(filter.process(100.0), 100.0);
    }

    #[test]
    fn median_even_count_averages_middle_pair() {
        let mut filter = SmoothingFilter::new(FilterConfig::median(4)).unwrap();

        filter.process(10.0);
        assert_eq!(filter.process(30.0), 20.0);
    }
}

mod reset_tests {
    use glucose_pipeline::{FilterConfig, SmoothingFilter};

    const CONFIGS: [FilterConfig; 5] = [
        FilterConfig::moving_average(5),
        FilterConfig::ema(0.3),
        FilterConfig::low_pass(0.2),
        FilterConfig::median(3),
        FilterConfig::passthrough(),
    ];

    #[test]
    fn configure_always_starts_empty() {
        for cfg in CONFIGS {
            let mut filter = SmoothingFilter::new(FilterConfig::default()).unwrap();
            for i in 0..7 {
                filter.process(90.0 + i as f32);
            }

            filter.configure(cfg).unwrap();
            assert_eq!(filter.fill_count(), 0, "{:?} kept samples", cfg.kind);
        }
    }

    #[test]
    fn reconfigured_filter_behaves_like_fresh_one() {
        for cfg in CONFIGS {
            let mut used = SmoothingFilter::new(FilterConfig::default()).unwrap();
            for i in 0..7 {
                used.process(150.0 - i as f32 * 3.0);
            }
            used.configure(cfg).unwrap();

            let mut fresh = SmoothingFilter::new(cfg).unwrap();
            for _ in 0..usize::from(cfg.window_size) {
                assert_eq!(used.process(120.0), fresh.process(120.0), "{:?}", cfg.kind);
            }
        }
    }

    #[test]
    fn reset_keeps_configuration() {
        let cfg = FilterConfig::moving_average(6);
        let mut filter = SmoothingFilter::new(cfg).unwrap();
        filter.process(1.0);
        filter.process(2.0);

        filter.reset();

        assert_eq!(filter.config(), cfg);
        assert_eq!(filter.fill_count(), 0);
        assert_eq!(filter.current(), 0.0);
    }
}
