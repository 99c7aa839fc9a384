//! The game session.
//!
//! [`GameSession`] owns every piece of game state: the physics world, the
//! hanging block, the stack, the camera, the tower state machine, hazards,
//! the boss, abilities and the score board. The host drives it with one
//! [`GameSession::tick`] per frame plus the player inputs
//! ([`request_drop`](GameSession::request_drop),
//! [`activate_shield`](GameSession::activate_shield),
//! [`abandon`](GameSession::abandon)) and reads back [`GameEvent`]s and a
//! [`FrameSnapshot`].
//!
//! # Tick order
//!
//! 1. swing the hanging block
//! 2. camera-follow check
//! 3. rocks and boss
//! 4. power-up spawn and pickup
//! 5. physics step and collision handling
//! 6. scroll animation and timers (wobble recovery, shield, slow motion,
//!    settle delay)
//! 7. stability scan
//!
//! ```
//! use monkey_engine::prelude::*;
//!
//! let mut session = GameSession::with_memory_store(SessionOptions::default());
//! session.run_ticks(30);
//! assert!(session.request_drop());
//! // A second press while the first block settles is ignored.
//! assert!(!session.request_drop());
//!
//! let events = session.run_ticks(40);
//! assert!(events.iter().any(|e| matches!(e, GameEvent::BlockPlaced { .. })));
//! assert_eq!(session.score(), 1);
//! ```

use monkey_physics::{BodyDesc, BodyId, BodyRole, CollisionPair, PhysicsWorld};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::abilities::{PowerUp, PowerUpChange, Shield, ShieldDenied};
use crate::boss::{Boss, BossCue};
use crate::camera::{collapse_amount, periodic_scroll_amount, CameraController, ScrollKind};
use crate::clock::{Countdown, TickConfig, VirtualClock};
use crate::collapse::{fall_kick, wobble_kick, TowerMachine, TowerState};
use crate::config::{Level, LevelConfig, Tuning};
use crate::events::GameEvent;
use crate::hazards::{aim_rock, RockThrower};
use crate::placement::{evaluate_placement, Placement, Stack};
use crate::records::{MemoryStore, RecordStore, ScoreBoard};
use crate::snapshot::{hash_frame, BodySnapshot, BossSnapshot, FrameSnapshot, RopeSnapshot};
use crate::swing::HangingBlock;

/// Height of the mascot's centre above the surface it stands on.
const MASCOT_CLEARANCE: f64 = 15.0;

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Everything needed to start a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Seed for every random decision (impulses, rocks, orb placement).
    pub seed: u64,
    /// Date string stamped on new score records. The host supplies it so
    /// the core never reads the wall clock.
    pub date: String,
    pub level: LevelConfig,
    pub tuning: Tuning,
    pub tick: TickConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            seed: 0,
            date: String::new(),
            level: LevelConfig::default(),
            tuning: Tuning::default(),
            tick: TickConfig::default(),
        }
    }
}

impl SessionOptions {
    pub fn for_level(level: Level) -> Self {
        Self {
            level: LevelConfig::for_level(level),
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

pub struct GameSession {
    level: LevelConfig,
    tuning: Tuning,
    date: String,
    clock: VirtualClock,
    rng: Pcg32,

    physics: PhysicsWorld,
    ground: BodyId,
    anchor: BodyId,

    current: Option<HangingBlock>,
    /// Running between a drop and its placement verdict.
    settle: Option<Countdown>,
    stack: Stack,
    camera: CameraController,
    tower: TowerMachine,
    rocks: RockThrower,
    boss: Option<Boss>,
    shield: Shield,
    power_up: PowerUp,
    mascot: (f64, f64),

    score: u32,
    board: ScoreBoard,
    initial_high_score: u32,
    record_beaten: bool,
    store: Box<dyn RecordStore>,

    outbox: Vec<GameEvent>,
}

impl GameSession {
    /// Build the world, load the score board from `store` and hang the first
    /// block.
    ///
    /// # Panics
    ///
    /// Panics if `options.tick.fixed_dt` is not positive and finite.
    pub fn new(options: SessionOptions, store: Box<dyn RecordStore>) -> Self {
        let SessionOptions {
            seed,
            date,
            level,
            tuning,
            tick,
        } = options;

        let clock = VirtualClock::new(tick);
        let mut rng = Pcg32::seed_from_u64(seed);

        let mut physics =
            PhysicsWorld::new(0.0, tuning.gravity).with_length_unit(tuning.pixels_per_meter);
        let (gx, gy) = tuning.ground_origin();
        let ground = physics.spawn(&BodyDesc::ground(
            gx,
            gy,
            tuning.world_width / 2.0,
            tuning.ground_half_height,
        ));
        let (ax, ay) = tuning.anchor();
        let anchor = physics.spawn(&BodyDesc::anchor(ax, ay));

        let board = ScoreBoard::load_or_default(store.as_ref(), tuning.max_records);
        let initial_high_score = board.high_score();
        let power_up = PowerUp::new(&tuning, &mut rng);
        let shield = Shield::new(level.shield.clone(), tuning.shield_duration_ms);
        let rocks = RockThrower::new(&tuning);
        let mascot = (gx, gy - tuning.ground_half_height - MASCOT_CLEARANCE);

        tracing::info!(
            level = level.level.number(),
            seed,
            high_score = initial_high_score,
            "session started"
        );

        let mut session = Self {
            level,
            tuning,
            date,
            clock,
            rng,
            physics,
            ground,
            anchor,
            current: None,
            settle: None,
            stack: Stack::new(),
            camera: CameraController::new(),
            tower: TowerMachine::new(),
            rocks,
            boss: None,
            shield,
            power_up,
            mascot,
            score: 0,
            board,
            initial_high_score,
            record_beaten: false,
            store,
            outbox: Vec::new(),
        };
        session.spawn_block();
        session
    }

    /// Session with a throwaway in-memory score store.
    pub fn with_memory_store(options: SessionOptions) -> Self {
        Self::new(options, Box::new(MemoryStore::new()))
    }

    // -- inputs -------------------------------------------------------------

    /// Release the current block. Ignored while a previous drop is still
    /// settling, after release, and once the tower is falling.
    pub fn request_drop(&mut self) -> bool {
        if self.tower.is_terminal() || self.settle.is_some() {
            return false;
        }
        let Some(current) = self.current.as_mut() else {
            return false;
        };
        if !current.release(&mut self.physics) {
            return false;
        }
        let body = current.body;
        tracing::debug!(%body, tick = self.clock.tick_count(), "block dropped");
        self.outbox.push(GameEvent::BlockDropped { body });
        self.settle = Some(Countdown::new(self.tuning.settle_delay_ms));
        true
    }

    /// Raise the shield if the tier's gate allows it.
    pub fn activate_shield(&mut self) -> Result<(), ShieldDenied> {
        if self.tower.is_terminal() {
            return Err(ShieldDenied::Unavailable);
        }
        self.shield.activate()?;
        tracing::debug!(charges = self.shield.charges(), "shield up");
        self.outbox.push(GameEvent::ShieldActivated);
        Ok(())
    }

    /// Quit the run. Goes straight to game over.
    pub fn abandon(&mut self) {
        if self.tower.abandon() {
            tracing::info!(score = self.score, "session abandoned");
            self.settle = None;
            self.outbox.push(GameEvent::GameOver { score: self.score });
            self.save_records();
        }
    }

    // -- tick ---------------------------------------------------------------

    /// Advance one fixed step. Returns the events raised since the previous
    /// tick, in order.
    pub fn tick(&mut self) -> Vec<GameEvent> {
        self.clock.advance();
        let dt = self.clock.fixed_dt();
        let dt_ms = self.clock.tick_ms();

        if self.tower.state() == TowerState::GameOver {
            // Let the rubble settle for the renderer; nothing else runs.
            self.physics.step(dt);
            self.expire_rocks(dt_ms);
            return std::mem::take(&mut self.outbox);
        }

        self.update_swing();
        self.update_follow();
        if !self.tower.is_terminal() {
            self.update_rocks(dt_ms);
            self.update_boss(dt_ms);
            self.update_power_up(dt_ms);
        }
        self.expire_rocks(dt_ms);

        let collisions = self.physics.step(dt);
        self.handle_collisions(&collisions);

        self.advance_scroll();
        self.advance_timers(dt_ms);
        self.scan_stability();

        std::mem::take(&mut self.outbox)
    }

    /// Run `n` ticks and collect their events.
    pub fn run_ticks(&mut self, n: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..n {
            events.extend(self.tick());
        }
        events
    }

    fn update_swing(&mut self) {
        if self.tower.is_terminal() {
            return;
        }
        let speed = self.level.swing.speed_at(self.score) * self.power_up.speed_factor(&self.tuning);
        let anchor_pos = self.tuning.anchor();
        if let Some(current) = self.current.as_mut() {
            current.update(&mut self.physics, anchor_pos, speed, self.tuning.spin_angvel);
        }
    }

    fn update_follow(&mut self) {
        if self.tower.is_terminal() {
            return;
        }
        let top_y = self
            .stack
            .top()
            .and_then(|e| self.physics.transform(e.body))
            .map(|t| t.y);
        if self.camera.check_follow(top_y, self.tuning.follow_threshold_y) {
            self.start_scroll(self.tuning.follow_amount, None);
        }
    }

    fn update_rocks(&mut self, dt_ms: f64) {
        if !self.rocks.advance(dt_ms) {
            return;
        }
        if !self.level.rocks_enabled || self.stack.len() < self.tuning.rock_min_stack {
            return;
        }
        let upper = self.stack.upper_half();
        if upper.is_empty() {
            return;
        }
        let target = upper[self.rng.gen_range(0..upper.len())];
        let Some(t) = self.physics.transform(target.body) else {
            return;
        };
        let launch = aim_rock((t.x, t.y), &self.tuning, &mut self.rng);
        let body = self.physics.spawn(&BodyDesc::rock(
            launch.x,
            launch.y,
            self.tuning.rock_radius,
            launch.vx,
            launch.vy,
        ));
        self.rocks.track(body);
        tracing::debug!(%body, target = %target.body, "rock thrown");
        self.outbox.push(GameEvent::RockThrown {
            body,
            target: target.body,
        });
    }

    fn expire_rocks(&mut self, dt_ms: f64) {
        for body in self.rocks.expire(dt_ms) {
            self.physics.despawn(body);
        }
    }

    fn update_boss(&mut self, dt_ms: f64) {
        if !self.level.boss_enabled {
            return;
        }
        if self.boss.is_none() {
            if self.stack.len() >= self.level.boss_after_blocks {
                self.boss = Some(Boss::spawn(self.ground_y(), &self.tuning));
                tracing::info!(stack = self.stack.len(), "boss appeared");
                self.outbox.push(GameEvent::BossAppeared);
            }
            return;
        }

        let target_x = self
            .stack
            .base()
            .and_then(|e| self.physics.transform(e.body))
            .map(|t| t.x);
        let cue = match self.boss.as_mut() {
            Some(boss) => boss.update(dt_ms, target_x, &self.tuning),
            None => None,
        };
        match cue {
            Some(BossCue::Arrived) => self.outbox.push(GameEvent::BossArrived),
            Some(BossCue::Shake) => self.wobble(),
            Some(BossCue::Push) => {
                self.outbox.push(GameEvent::BossPushed);
                self.trigger_fall(self.tuning.push_multiplier, "boss push");
            }
            None => {}
        }
    }

    fn update_power_up(&mut self, dt_ms: f64) {
        if !self.level.power_up_enabled {
            return;
        }
        if let Some(PowerUpChange::Spawned { x, y }) =
            self.power_up.advance_spawn(dt_ms, &self.tuning, &mut self.rng)
        {
            self.outbox.push(GameEvent::PowerUpSpawned { x, y });
        }
        let block = self
            .current
            .as_ref()
            .and_then(|c| self.physics.transform(c.body));
        if let Some(t) = block {
            if self.power_up.try_collect((t.x, t.y), &self.tuning).is_some() {
                tracing::debug!("slow motion on");
                self.outbox.push(GameEvent::PowerUpCollected);
            }
        }
    }

    fn handle_collisions(&mut self, collisions: &[CollisionPair]) {
        if self.tower.is_terminal() {
            return;
        }
        for pair in collisions {
            if let Some((rock, block)) = pair.split(BodyRole::Rock, BodyRole::Block) {
                if self.rocks.contains(rock) && self.stack.contains(block) {
                    self.rock_hit(rock, block);
                }
                continue;
            }
            if let Some((block, _)) = pair.split(BodyRole::Block, BodyRole::Ground) {
                let dropped_current = self
                    .current
                    .as_ref()
                    .is_some_and(|c| c.body == block && !c.is_hanging());
                if dropped_current && !self.stack.is_empty() {
                    self.trigger_fall(1.0, "ground impact");
                }
            }
        }
    }

    fn rock_hit(&mut self, rock: BodyId, block: BodyId) {
        if self.shield.is_active() {
            self.physics.despawn(rock);
            self.rocks.remove(rock);
            tracing::debug!(%rock, "rock deflected");
            self.outbox.push(GameEvent::RockDeflected { rock });
            return;
        }
        self.outbox.push(GameEvent::RockHit { rock, block });
        self.wobble();
    }

    fn advance_scroll(&mut self) {
        let Some(step) = self.camera.step() else {
            return;
        };
        let dy = step.dy();
        if step.kind == ScrollKind::Forward {
            self.physics.translate(self.ground, 0.0, dy);
            if let Some(boss) = self.boss.as_mut() {
                boss.translate(dy);
            }
        }
        for body in self.stack.bodies() {
            self.physics.translate(body, 0.0, dy);
        }
        if let Some(current) = &self.current {
            self.physics.translate(current.body, 0.0, dy);
        }
        for body in self.rocks.bodies() {
            self.physics.translate(body, 0.0, dy);
        }
        let (ax, ay) = self.tuning.anchor();
        self.physics.set_position(self.anchor, ax, ay);

        let snapped = step
            .snap
            .and_then(|body| self.physics.transform(body))
            .map(|t| self.mascot_spot(t.x, t.y));
        match snapped {
            Some(spot) => self.mascot = spot,
            None => self.mascot.1 += dy,
        }

        if step.finished && step.kind == ScrollKind::Collapse {
            self.finish_game_over();
        }
    }

    fn advance_timers(&mut self, dt_ms: f64) {
        if self.tower.advance(dt_ms) {
            for body in self.stack.bodies() {
                self.physics.set_static(body, true);
            }
            tracing::debug!("wobble recovered");
            self.outbox.push(GameEvent::WobbleRecovered);
        }
        if self.shield.advance(dt_ms) {
            self.outbox.push(GameEvent::ShieldExpired);
        }
        if let Some(PowerUpChange::Expired) = self.power_up.advance_effect(dt_ms) {
            self.outbox.push(GameEvent::SlowMotionEnded);
        }
        let settled = self.settle.as_mut().is_some_and(|t| t.advance(dt_ms));
        if settled {
            self.settle = None;
            if !self.tower.is_terminal() {
                self.resolve_drop();
            }
        }
    }

    /// Topple the tower if a block above the base has come down to the ground
    /// band or any block has turned past the tilt limit.
    fn scan_stability(&mut self) {
        if self.tower.is_terminal() {
            return;
        }
        let limit = self.ground_y() - self.tuning.ground_contact_margin;
        let cause = self.stack.iter().enumerate().find_map(|(index, entry)| {
            let t = self.physics.transform(entry.body)?;
            // The base rests on the ground.
            if index > 0 && t.y > limit {
                Some("block near ground")
            } else if angle_delta(t.angle, entry.frozen_angle).abs() > self.tuning.tilt_limit {
                Some("block tilted")
            } else {
                None
            }
        });
        if let Some(cause) = cause {
            self.trigger_fall(1.0, cause);
        }
    }

    // -- placement ------------------------------------------------------------

    fn resolve_drop(&mut self) {
        let Some(body) = self.current.as_ref().map(|c| c.body) else {
            return;
        };
        let Some(dropped) = self.physics.bounds(body) else {
            return;
        };
        let top = self.stack.top().and_then(|e| self.physics.bounds(e.body));
        match evaluate_placement(&dropped, top.as_ref(), self.ground_y(), &self.tuning) {
            Placement::Accepted => self.accept_block(body),
            Placement::Rejected(reason) => {
                tracing::debug!(%body, ?reason, "placement rejected");
                self.outbox.push(GameEvent::PlacementRejected { body, reason });
                self.trigger_fall(1.0, "invalid placement");
            }
        }
    }

    fn accept_block(&mut self, body: BodyId) {
        // On a wobbling tower the block rides the loose stack until the
        // recovery freezes them all together.
        if !matches!(self.tower.state(), TowerState::Wobbling { .. }) {
            self.physics.set_static(body, true);
        }
        let Some(t) = self.physics.transform(body) else {
            return;
        };
        self.stack.push(body, t.angle);
        let stack_len = self.stack.len();
        tracing::debug!(%body, x = t.x, y = t.y, stack_len, "block placed");
        self.outbox.push(GameEvent::BlockPlaced {
            body,
            x: t.x,
            y: t.y,
            stack_len,
        });

        self.shield.on_block_placed();
        self.camera
            .update_follow(stack_len, self.tuning.follow_after_blocks);
        if let Some(amount) = periodic_scroll_amount(
            stack_len,
            self.tuning.periodic_every,
            self.tuning.periodic_amount,
            self.tuning.periodic_growth,
        ) {
            self.start_scroll(amount, Some(body));
        }

        self.mascot = self.mascot_spot(t.x, t.y);
        self.outbox.push(GameEvent::MascotMoved {
            x: self.mascot.0,
            y: self.mascot.1,
        });

        self.score += 1;
        self.outbox.push(GameEvent::ScoreChanged { score: self.score });
        self.update_records();

        self.spawn_block();
    }

    fn spawn_block(&mut self) {
        let block = HangingBlock::spawn(
            &mut self.physics,
            self.anchor,
            self.tuning.anchor(),
            &self.tuning,
            &self.level,
            self.stack.len(),
            self.score,
            self.camera.offset(),
        );
        self.outbox.push(GameEvent::BlockSpawned { body: block.body });
        self.current = Some(block);
    }

    fn start_scroll(&mut self, amount: f64, snap: Option<BodyId>) {
        let tick_ms = self.clock.tick_ms();
        if self
            .camera
            .scroll_world(amount, self.tuning.scroll_duration_ms, tick_ms, snap)
        {
            tracing::debug!(amount, ?snap, "scroll started");
            self.outbox.push(GameEvent::ScrollStarted { amount });
        }
    }

    fn mascot_spot(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y - self.tuning.block_half_size - MASCOT_CLEARANCE)
    }

    fn update_records(&mut self) {
        if self.board.record_score(self.score, &self.date) {
            self.save_records();
        }
        if !self.record_beaten && self.initial_high_score > 0 && self.score > self.initial_high_score
        {
            self.record_beaten = true;
            tracing::info!(score = self.score, previous = self.initial_high_score, "record beaten");
            self.outbox.push(GameEvent::RecordBeaten {
                score: self.score,
                previous: self.initial_high_score,
            });
        }
    }

    fn save_records(&mut self) {
        if let Err(e) = self.board.save(self.store.as_mut()) {
            tracing::warn!(error = %e, "failed to save score records");
        }
    }

    // -- wobble and collapse --------------------------------------------------

    fn wobble(&mut self) {
        if self.shield.is_active() {
            return;
        }
        if !self
            .tower
            .begin_wobble(self.stack.len(), self.tuning.wobble_recover_ms)
        {
            return;
        }
        for (index, entry) in self.stack.iter().enumerate() {
            self.physics.set_static(entry.body, false);
            let mass = self.physics.mass(entry.body).unwrap_or(1.0);
            let kick = wobble_kick(index, mass, &self.tuning, &mut self.rng);
            self.physics
                .apply_impulse(entry.body, kick.impulse.0, kick.impulse.1);
        }
        tracing::debug!(stack = self.stack.len(), "tower wobbling");
        self.outbox.push(GameEvent::WobbleStarted);
    }

    /// Bring the tower down. Idempotent.
    fn trigger_fall(&mut self, multiplier: f64, cause: &'static str) {
        if !self.tower.begin_fall() {
            return;
        }
        tracing::info!(cause, stack = self.stack.len(), score = self.score, "tower falling");
        self.settle = None;

        for (index, entry) in self.stack.iter().enumerate() {
            self.physics.set_static(entry.body, false);
            let mass = self.physics.mass(entry.body).unwrap_or(1.0);
            let kick = fall_kick(index, mass, multiplier, &self.tuning, &mut self.rng);
            self.physics
                .apply_impulse(entry.body, kick.impulse.0, kick.impulse.1);
            if let Some(spin) = kick.spin {
                self.physics.set_angvel(entry.body, spin);
            }
        }
        self.outbox.push(GameEvent::FailSound);

        let lowest_y = self
            .stack
            .bodies()
            .filter_map(|body| self.physics.transform(body))
            .map(|t| t.y)
            .reduce(f64::max);
        let amount = collapse_amount(
            self.ground_y(),
            lowest_y,
            self.tuning.collapse_ground_margin,
            self.tuning.collapse_scroll_min,
        );
        let tick_ms = self.clock.tick_ms();
        if self
            .camera
            .collapse_scroll(amount, self.tuning.collapse_scroll_ms, tick_ms)
        {
            self.outbox.push(GameEvent::CollapseScrollStarted { amount });
        }
    }

    fn finish_game_over(&mut self) {
        if self.tower.finish() {
            tracing::info!(score = self.score, ticks = self.clock.tick_count(), "game over");
            self.outbox.push(GameEvent::GameOver { score: self.score });
            self.save_records();
        }
    }

    // -- queries --------------------------------------------------------------

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.board.high_score()
    }

    pub fn board(&self) -> &ScoreBoard {
        &self.board
    }

    pub fn tower_state(&self) -> TowerState {
        self.tower.state()
    }

    pub fn is_game_over(&self) -> bool {
        self.tower.state() == TowerState::GameOver
    }

    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    pub fn current_block(&self) -> Option<&HangingBlock> {
        self.current.as_ref()
    }

    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    pub fn shield(&self) -> &Shield {
        &self.shield
    }

    pub fn power_up(&self) -> &PowerUp {
        &self.power_up
    }

    pub fn rocks(&self) -> &RockThrower {
        &self.rocks
    }

    pub fn mascot(&self) -> (f64, f64) {
        self.mascot
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn tick_count(&self) -> u64 {
        self.clock.tick_count()
    }

    pub fn ground(&self) -> BodyId {
        self.ground
    }

    /// Current centre line of the ground (moves with forward scrolls).
    pub fn ground_y(&self) -> f64 {
        self.physics
            .transform(self.ground)
            .map_or(self.tuning.ground_origin().1 + self.camera.offset(), |t| t.y)
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    /// Direct access to the physics world, for hosts and tests that need to
    /// stage a situation.
    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    /// Render snapshot of the current state.
    pub fn frame(&self) -> FrameSnapshot {
        let bodies = self
            .physics
            .body_ids()
            .filter_map(|id| {
                let t = self.physics.transform(id)?;
                Some(BodySnapshot {
                    id,
                    role: self.physics.role(id)?,
                    x: t.x,
                    y: t.y,
                    angle: t.angle,
                    shape: self.physics.shape(id)?,
                    is_static: self.physics.is_static(id)?,
                })
            })
            .collect();

        let rope = self
            .current
            .as_ref()
            .filter(|c| c.is_hanging())
            .and_then(|c| self.physics.transform(c.body))
            .map(|t| RopeSnapshot {
                from: self.tuning.anchor(),
                to: (t.x, t.y),
            });

        FrameSnapshot {
            tick: self.clock.tick_count(),
            score: self.score,
            high_score: self.board.high_score(),
            tower_state: self.tower.state().label().to_owned(),
            scroll_offset: self.camera.offset(),
            bodies,
            rope,
            boss: self.boss.as_ref().map(|b| BossSnapshot {
                x: b.x,
                y: b.y,
                facing: b.facing,
                phase: b.phase_name().to_owned(),
            }),
            orb: self.power_up.orb(),
            mascot: self.mascot,
            shield_active: self.shield.is_active(),
            shield_charges: self.shield.charges(),
            slow_motion: self.power_up.slow_motion_active(),
        }
    }

    /// BLAKE3 digest of [`GameSession::frame`] and the tick counter.
    pub fn state_hash(&self) -> String {
        hash_frame(&self.frame(), self.clock.tick_count())
    }
}

/// Signed difference `a - b` wrapped into `(-PI, PI]`.
fn angle_delta(a: f64, b: f64) -> f64 {
    let d = a - b;
    d.sin().atan2(d.cos())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShieldGate;

    fn session() -> GameSession {
        GameSession::with_memory_store(SessionOptions::default())
    }

    #[test]
    fn starts_with_one_hanging_block() {
        let s = session();
        let current = s.current_block().unwrap();
        assert!(current.is_hanging());
        assert_eq!(s.physics().rope_count(), 1);
        assert!(s.stack().is_empty());
        assert_eq!(s.tower_state(), TowerState::Stable);
        assert!((s.ground_y() - 490.0).abs() < 1e-3);
    }

    #[test]
    fn first_events_announce_the_block() {
        let mut s = session();
        let body = s.current_block().unwrap().body;
        let events = s.tick();
        assert_eq!(events, vec![GameEvent::BlockSpawned { body }]);
        assert!(s.tick().is_empty());
    }

    #[test]
    fn first_drop_is_always_placed_after_settle_delay() {
        let mut s = session();
        s.run_ticks(10);
        let first = s.current_block().unwrap().body;
        assert!(s.request_drop());
        assert_eq!(s.physics().rope_count(), 0);

        let before = s.run_ticks(35);
        assert!(!before
            .iter()
            .any(|e| matches!(e, GameEvent::BlockPlaced { .. })));

        let events = s.tick();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BlockPlaced { body, .. } if *body == first)));
        assert!(events.contains(&GameEvent::ScoreChanged { score: 1 }));
        assert_eq!(s.stack().len(), 1);
        assert_eq!(s.physics().is_static(first), Some(true));
        // A fresh block is already swinging.
        let next = s.current_block().unwrap();
        assert_ne!(next.body, first);
        assert!(next.is_hanging());
    }

    #[test]
    fn drop_is_debounced() {
        let mut s = session();
        assert!(s.request_drop());
        for _ in 0..35 {
            s.tick();
            assert!(!s.request_drop());
        }
        s.tick();
        assert!(s.request_drop());
    }

    #[test]
    fn swing_stops_after_release() {
        let mut s = session();
        s.run_ticks(5);
        let angle = s.current_block().unwrap().swing.angle;
        s.request_drop();
        s.run_ticks(5);
        assert_eq!(s.current_block().unwrap().swing.angle, angle);
    }

    #[test]
    fn abandon_ends_the_game_once() {
        let mut s = session();
        s.abandon();
        s.abandon();
        let events = s.tick();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .count(),
            1
        );
        assert!(s.is_game_over());
        assert!(!s.request_drop());
    }

    #[test]
    fn shield_gate_follows_level() {
        let mut s = session();
        assert_eq!(s.activate_shield(), Err(ShieldDenied::Unavailable));

        let mut options = SessionOptions::for_level(Level::Three);
        options.level.rocks_enabled = false;
        let mut s = GameSession::with_memory_store(options);
        assert!(matches!(s.level().shield, ShieldGate::Cooldown { .. }));
        assert_eq!(s.activate_shield(), Ok(()));
        assert!(s.shield().is_active());
        assert!(s.tick().contains(&GameEvent::ShieldActivated));
    }

    /// Release the current block at rest from `(x, y)`.
    fn release_at(s: &mut GameSession, x: f64, y: f64) -> BodyId {
        let body = s.current_block().unwrap().body;
        assert!(s.request_drop());
        let physics = s.physics_mut();
        physics.set_position(body, x, y);
        physics.set_linvel(body, 0.0, 0.0);
        body
    }

    fn top_of(s: &GameSession) -> (f64, f64) {
        let t = s
            .physics()
            .transform(s.stack().top().unwrap().body)
            .unwrap();
        (t.x, t.y)
    }

    #[test]
    fn first_block_lands_on_the_ground() {
        let mut s = session();
        release_at(&mut s, 240.0, 130.0);
        s.run_ticks(36);
        let (_, y) = top_of(&s);
        // Ground surface at 480.
        assert!((y - 455.0).abs() < 6.0, "base at y={y}");
        // Resting on the ground is not a collapse.
        s.run_ticks(120);
        assert_eq!(s.tower_state(), TowerState::Stable);
    }

    #[test]
    fn block_accepted_mid_wobble_refreezes_with_the_tower() {
        let mut s = session();
        release_at(&mut s, 240.0, 300.0);
        s.run_ticks(36);
        let (x, y) = top_of(&s);
        release_at(&mut s, x, y - 52.0);
        s.run_ticks(36);
        assert_eq!(s.stack().len(), 2);

        let (x, y) = top_of(&s);
        let third = release_at(&mut s, x, y - 52.0);
        s.run_ticks(20);
        s.wobble();
        assert!(matches!(s.tower_state(), TowerState::Wobbling { .. }));

        // The verdict comes 16 ticks into the 30-tick wobble.
        let events = s.run_ticks(16);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::BlockPlaced { body, .. } if *body == third)));
        assert!(matches!(s.tower_state(), TowerState::Wobbling { .. }));
        assert_eq!(s.physics().is_static(third), Some(false));

        let events = s.run_ticks(14);
        assert!(events.contains(&GameEvent::WobbleRecovered));
        assert_eq!(s.tower_state(), TowerState::Stable);
        for entry in s.stack().iter() {
            assert_eq!(s.physics().is_static(entry.body), Some(true));
        }
        // Frozen where it rests, not above the block below.
        let below = s.stack().get(1).unwrap().body;
        let gap = s.physics().transform(below).unwrap().y - s.physics().transform(third).unwrap().y;
        assert!(gap > 40.0 && gap < 60.0, "gap {gap}");
    }

    #[test]
    fn angle_delta_wraps() {
        use std::f64::consts::PI;
        assert!((angle_delta(PI - 0.1, -PI + 0.1) + 0.2).abs() < 1e-9);
        assert!((angle_delta(0.5, 0.2) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn frame_lists_every_body_sorted() {
        let s = session();
        let frame = s.frame();
        // Ground, anchor, hanging block.
        assert_eq!(frame.bodies.len(), 3);
        assert!(frame.bodies.windows(2).all(|w| w[0].id < w[1].id));
        assert!(frame.rope.is_some());
        assert_eq!(frame.tower_state, "stable");
    }
}
