//! Invariants over arbitrary inputs.

use monkey_engine::camera::scroll_steps;
use monkey_engine::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn swing_never_leaves_its_bound(
        start in -2.0f64..2.0,
        bound in 0.1f64..1.5,
        speed in 0.0f64..0.5,
        ticks in 1usize..2000,
    ) {
        let mut swing = SwingState::new(start, bound);
        for _ in 0..ticks {
            swing.advance(speed);
            prop_assert!(swing.angle.abs() <= bound);
            prop_assert!(swing.direction == 1.0 || swing.direction == -1.0);
        }
    }

    #[test]
    fn scroll_moves_exactly_its_amount(
        amount in 0.0f64..2000.0,
        duration in 1.0f64..3000.0,
    ) {
        let tick_ms = 1000.0 / 60.0;
        let mut camera = CameraController::new();
        prop_assert!(camera.scroll_world(amount, duration, tick_ms, None));

        let mut steps = 0;
        let mut moved = 0.0;
        while let Some(step) = camera.step() {
            steps += 1;
            moved += step.dy();
            // Single flight: nothing else may start meanwhile.
            prop_assert!(step.finished || !camera.scroll_world(1.0, duration, tick_ms, None));
        }
        prop_assert_eq!(steps, scroll_steps(duration, tick_ms));
        prop_assert!((moved - amount).abs() < 1e-6);
        prop_assert!((camera.offset() - amount).abs() < 1e-6);
        prop_assert!(!camera.is_busy());
    }

    #[test]
    fn collapse_scroll_runs_backwards(amount in 100.0f64..800.0) {
        let mut camera = CameraController::new();
        camera.scroll_world(250.0, 400.0, 1000.0 / 60.0, None);
        camera.step();
        prop_assert!(camera.collapse_scroll(amount, 700.0, 1000.0 / 60.0));
        prop_assert!(!camera.collapse_scroll(amount, 700.0, 1000.0 / 60.0));

        let mut moved = 0.0;
        let mut kinds = Vec::new();
        while let Some(step) = camera.step() {
            moved += step.dy();
            kinds.push(step.kind);
        }
        prop_assert_eq!(kinds.len(), 42);
        prop_assert!(kinds.iter().all(|k| *k == ScrollKind::Collapse));
        prop_assert!((moved + amount).abs() < 1e-6);
    }
}
