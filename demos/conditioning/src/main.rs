//! Demonstrates glucose signal conditioning
//!
//! Runs the same noisy, slowly drifting sensor trace through each smoothing
//! filter, then shows drift compensation pulling a sagging sensor back to
//! its calibrated level.

use glucose_pipeline::{
    ConditioningPipeline, DriftConfig, FilterConfig, InMemoryStore, ParamKey, ParameterStore,
    PipelineError, Reading, ReferenceMode, SharedPipeline,
};

const NOISY: [f32; 10] = [
    112.0, 108.5, 114.0, 109.0, 131.0, 111.5, 110.0, 113.5, 108.0, 112.5,
];

fn main() -> Result<(), PipelineError> {
    println!("=== Glucose Conditioning Examples ===\n");

    let filters = [
        ("No filter (raw passthrough)", FilterConfig::passthrough()),
        ("Moving average (window=4)", FilterConfig::moving_average(4)),
        ("Median (window=5)", FilterConfig::median(5)),
        ("EMA (alpha=0.3)", FilterConfig::ema(0.3)),
        ("2nd order low-pass (cutoff=0.1)", FilterConfig::low_pass(0.1)),
    ];

    let mut pipeline = ConditioningPipeline::init(InMemoryStore::<4>::new());
    for (n, (label, cfg)) in filters.iter().enumerate() {
        println!("{}. {}", n + 1, label);
        pipeline.set_filter_parameter(*cfg)?;

        println!("   Input → Output (mg/dL)");
        for (t, &raw) in NOISY.iter().enumerate() {
            let out = pipeline.process(raw, t as u32 * 60);
            println!("   {:6.1} → {:6.1}", raw, out);
        }
        println!();
    }

    // Drift: sensor reads 100 at calibration, then sags to 90
    println!("{}. Drift compensation (reference latched at 100)", filters.len() + 1);
    let mut store = InMemoryStore::<4>::new();
    let drift = DriftConfig {
        reference_mode: ReferenceMode::Latched,
        ..DriftConfig::default()
    };
    store
        .write(ParamKey::DriftConfig, &drift.to_bytes())
        .map_err(PipelineError::PersistenceFailure)?;
    let mut pipeline = ConditioningPipeline::init(store);

    let mut t = 0;
    let calibration = (0..10).map(|_| 100.0);
    let sagging = (0..240).map(|_| 90.0);
    let mut trace = calibration.chain(sagging).map(|value| {
        t += 60;
        Reading::new(value, t)
    });

    let mut step = 0;
    loop {
        match pipeline.poll(&mut || trace.next()) {
            Ok(out) => {
                if step % 20 == 0 {
                    println!(
                        "   step {:3}: output {:6.2}, offset {:5.2}",
                        step,
                        out,
                        pipeline.drift_offset()
                    );
                }
                step += 1;
            }
            Err(PipelineError::NoData) => break,
            Err(e) => return Err(e),
        }
    }
    println!();

    // Shared: configuration from a second thread while sampling
    println!("{}. Shared pipeline", filters.len() + 2);
    let shared = std::sync::Arc::new(SharedPipeline::init(InMemoryStore::<4>::new()));
    let commands = {
        let shared = std::sync::Arc::clone(&shared);
        std::thread::spawn(move || shared.set_filter_parameter(FilterConfig::ema(0.5)))
    };
    for (t, &raw) in NOISY.iter().enumerate() {
        shared.process(raw, t as u32 * 60);
    }
    if let Ok(result) = commands.join() {
        result?;
    }
    println!("   Active filter: {:?}", shared.filter_config().kind);
    println!("   Last output:   {:.1}", shared.process(110.0, 600));

    Ok(())
}
