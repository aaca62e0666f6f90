//! Benchmark loop threshold, timing and exception-summary tests.

use flopbench::{bench, Fexcept, InputBuffer, Operation, ResultBuffer, DEFAULT_ALIGNMENT};

#[test]
fn test_ops_count_equals_buffer_size_for_single_repeat() {
    let op = Operation::resolve("exp").unwrap();
    let values = vec![0.5f64; 12345];
    let input = InputBuffer::from_f64s(&values, DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();

    let report = bench::run(op, &input, &mut result, 1, 0).unwrap();
    assert_eq!(report.num_ops, 12345);
    assert_eq!(report.repetitions, 1);
}

/// The loop continues until *both* thresholds are met: a min-ops target of
/// ten buffers forces at least ten repetitions even with repeat = 1.
#[test]
fn test_min_ops_threshold_extends_the_loop() {
    let op = Operation::resolve("log").unwrap();
    let n = 500u64;
    let values = vec![2.0f64; n as usize];
    let input = InputBuffer::from_f64s(&values, DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();

    let report = bench::run(op, &input, &mut result, 1, 10 * n).unwrap();
    assert!(
        report.repetitions >= 10,
        "only {} repetitions",
        report.repetitions
    );
    assert!(report.num_ops >= 10 * n);
    // Counters agree: ops is repetitions whole buffers.
    assert_eq!(report.num_ops, report.repetitions * n);
}

#[test]
fn test_repeat_threshold_alone() {
    let op = Operation::resolve("sinf").unwrap();
    let values = vec![0.25f32; 64];
    let input = InputBuffer::from_f32s(&values, DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();

    let report = bench::run(op, &input, &mut result, 5, 0).unwrap();
    assert_eq!(report.repetitions, 5);
    assert_eq!(report.num_ops, 5 * 64);
    assert!(report.seconds >= 0.0);
}

/// Repetitions overwrite the result in place; the final contents equal a
/// single application.
#[test]
fn test_repetitions_overwrite_idempotently() {
    let op = Operation::resolve("tanh").unwrap();
    let values: Vec<f64> = (0..100).map(|i| i as f64 * 0.05 - 2.5).collect();
    let input = InputBuffer::from_f64s(&values, DEFAULT_ALIGNMENT).unwrap();

    let mut once = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();
    let mut many = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();

    bench::run(op, &input, &mut once, 1, 0).unwrap();
    bench::run(op, &input, &mut many, 9, 0).unwrap();

    let a = once.as_f64s().unwrap();
    let b = many.as_f64s().unwrap();
    for i in 0..a.len() {
        assert_eq!(a[i].to_bits(), b[i].to_bits(), "index {i}");
    }
}

/// Benign inputs for exp raise only "inexact", which the final summary
/// deliberately masks out.
#[test]
fn test_exception_summary_masks_inexact() {
    let op = Operation::resolve("exp").unwrap();
    let input = InputBuffer::from_f64s(&[0.0, 1.0, 2.0], DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, 3, DEFAULT_ALIGNMENT).unwrap();

    bench::run(op, &input, &mut result, 1, 0).unwrap();

    let expected = if Fexcept::supported() { "none" } else { "disabled" };
    assert_eq!(result.fexcept.label(), expected);
}

/// log(0) raises divide-by-zero, which survives the mask.
#[test]
fn test_exception_summary_reports_real_flags() {
    if !Fexcept::supported() {
        return;
    }
    let op = Operation::resolve("log").unwrap();
    let input = InputBuffer::from_f64s(&[1.0, 0.0, 10.0], DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, 3, DEFAULT_ALIGNMENT).unwrap();

    bench::run(op, &input, &mut result, 1, 0).unwrap();

    assert_eq!(result.fexcept.label(), "divide-by-zero");
    assert_eq!(result.as_f64s().unwrap()[1], f64::NEG_INFINITY);
}

/// End-to-end scenario from the interface contract: exp over [0, 1, 2].
#[test]
fn test_end_to_end_exp() {
    let op = Operation::resolve("exp").unwrap();
    let input = InputBuffer::from_f64s(&[0.0, 1.0, 2.0], DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, 3, DEFAULT_ALIGNMENT).unwrap();

    let report = bench::run(op, &input, &mut result, 1, 0).unwrap();
    assert_eq!(report.num_ops, 3);

    let out = result.as_f64s().unwrap();
    let expected = [1.0, std::f64::consts::E, std::f64::consts::E * std::f64::consts::E];
    for i in 0..3 {
        let rel = ((out[i] - expected[i]) / expected[i]).abs();
        assert!(rel <= 4.0 * f64::EPSILON, "index {i}: {} vs {}", out[i], expected[i]);
    }
}

/// Large parallel run: every element written, counters exact.
#[test]
fn test_parallel_run_covers_every_element() {
    let op = Operation::resolve("sqrt").unwrap();
    let values: Vec<f64> = (0..100_000).map(|i| (i as f64) * (i as f64)).collect();
    let input = InputBuffer::from_f64s(&values, DEFAULT_ALIGNMENT).unwrap();
    let mut result = ResultBuffer::for_operation(op, values.len(), DEFAULT_ALIGNMENT).unwrap();

    let report = bench::run(op, &input, &mut result, 2, 0).unwrap();
    assert_eq!(report.repetitions, 2);
    assert_eq!(report.num_ops, 200_000);

    let out = result.as_f64s().unwrap();
    for (i, &v) in out.iter().enumerate() {
        assert_eq!(v, i as f64, "index {i}");
    }
}
