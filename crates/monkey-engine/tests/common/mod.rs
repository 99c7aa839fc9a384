//! Helpers shared by the integration tests.
//!
//! Most tests do not aim the swinging block by timing; they release it and
//! then move it to where it should fall from, so each scenario is exact.

#![allow(dead_code)]

use monkey_engine::prelude::*;

/// Ticks from a drop to its placement verdict at 60 Hz with the default
/// 600 ms settle delay.
pub const SETTLE_TICKS: u64 = 36;

/// Release the current block and let it fall from `(x, y)`. Returns the
/// events of the settle period.
pub fn drop_from(session: &mut GameSession, x: f64, y: f64) -> Vec<GameEvent> {
    let body = session
        .current_block()
        .expect("a block should be hanging")
        .body;
    assert!(session.request_drop(), "drop should be accepted");
    let physics = session.physics_mut();
    physics.set_position(body, x, y);
    physics.set_rotation(body, 0.0);
    physics.set_linvel(body, 0.0, 0.0);
    physics.set_angvel(body, 0.0);
    session.run_ticks(SETTLE_TICKS)
}

/// Position of the top of the stack.
pub fn top_position(session: &GameSession) -> (f64, f64) {
    let top = session.stack().top().expect("stack should not be empty");
    let t = session
        .physics()
        .transform(top.body)
        .expect("top block should exist");
    (t.x, t.y)
}

/// Place one block squarely on the stack. The first block falls from
/// `(240, first_drop_y)`.
pub fn stack_block(session: &mut GameSession, first_drop_y: f64) -> Vec<GameEvent> {
    let (x, y) = if session.stack().is_empty() {
        (240.0, first_drop_y)
    } else {
        let (x, y) = top_position(session);
        (x, y - 52.0)
    };
    let events = drop_from(session, x, y);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, GameEvent::BlockPlaced { .. })),
        "block should be placed, got {events:?}"
    );
    events
}

/// Place `n` blocks, returning all events.
pub fn build_tower(session: &mut GameSession, n: usize, first_drop_y: f64) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..n {
        events.extend(stack_block(session, first_drop_y));
    }
    events
}

pub fn count<F: Fn(&GameEvent) -> bool>(events: &[GameEvent], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
