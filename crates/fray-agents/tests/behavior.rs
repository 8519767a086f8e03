//! Telegraph and death scenarios driven tick by tick.

use fray_agents::{
    AgentContext, AgentEvent, AgentState, BehaviorTuning, HostileAgent, ProfileCatalog,
    SeparationGrid,
};
use fray_combat::AbilityCatalog;
use fray_core::{AbilityName, Combatant, EntityId, PlayerId, Vec2, ZoneId};
use fray_space::ZoneBounds;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const TICK_MS: u64 = 100;

struct Harness {
    agent: HostileAgent,
    tuning: BehaviorTuning,
    rng: ChaCha8Rng,
    now: u64,
}

impl Harness {
    fn new(profile: &str, at: Vec2) -> Self {
        let profiles = ProfileCatalog::default();
        Self {
            agent: HostileAgent::spawn(
                ZoneId(1),
                profiles.get(profile).unwrap().clone(),
                at,
                &AbilityCatalog::default(),
                0,
            ),
            tuning: BehaviorTuning::default(),
            rng: ChaCha8Rng::seed_from_u64(42),
            now: 0,
        }
    }

    fn tick(&mut self, players: &[(EntityId, Vec2)]) -> Option<AgentEvent> {
        self.now += TICK_MS;
        let grid = SeparationGrid::build(
            self.tuning.separation_bucket,
            [(self.agent.id(), self.agent.position())],
        );
        let ctx = AgentContext {
            now_ms: self.now,
            dt: TICK_MS as f32 / 1000.0,
            players,
            separation: &grid,
            bounds: ZoneBounds::square(Vec2::ZERO, 8192.0),
            tuning: &self.tuning,
        };
        self.agent.update(&ctx, &mut self.rng)
    }
}

// ── Ranged telegraph ────────────────────────────────────────────

#[test]
fn hard_agent_warns_once_per_telegraph() {
    let mut h = Harness::new("hard", Vec2::new(2000.0, 2000.0));
    let target = EntityId::Player(PlayerId(1));
    let players = [(target, Vec2::new(2150.0, 2000.0))];

    for _ in 0..10 {
        assert!(h.tick(&players).is_none());
    }
    assert_eq!(h.agent.state(), AgentState::Roam);

    let mut warnings = Vec::new();
    let mut strikes = 0;
    let mut telegraph_ticks = 0;
    while h.agent.state() != AgentState::Cooldown {
        let state_before = h.agent.state();
        match h.tick(&players) {
            Some(AgentEvent::Telegraph(w)) => {
                assert_eq!(h.agent.state(), AgentState::Telegraph);
                warnings.push(w);
            }
            Some(AgentEvent::Strike(s)) => {
                assert_eq!(s.ability, AbilityName::Fireball);
                assert_eq!(s.impact, Vec2::new(2150.0, 2000.0));
                strikes += 1;
            }
            _ => {}
        }
        if state_before == AgentState::Telegraph && h.agent.state() == AgentState::Telegraph {
            telegraph_ticks += 1;
        }
        assert!(h.now < 10_000, "agent never attacked");
    }

    assert_eq!(warnings.len(), 1);
    assert!(telegraph_ticks > 1);
    let w = &warnings[0];
    assert_eq!(w.target_id, target);
    assert_eq!(w.ability, AbilityName::Fireball);
    assert_eq!((w.impact_x, w.impact_y), (2150.0, 2000.0));
    assert_eq!(w.radius, 50.0);
    assert_eq!(w.duration_ms, 1000);
    assert_eq!(strikes, 1);
}

#[test]
fn reentering_telegraph_warns_again() {
    let mut h = Harness::new("hard", Vec2::new(2000.0, 2000.0));
    let target = EntityId::Player(PlayerId(1));
    let players = [(target, Vec2::new(2100.0, 2000.0))];
    let mut warnings = 0;
    // Two full attack cycles: 1s spawn, then (1s telegraph + 0.5s attack + 3s cooldown) x 2.
    for _ in 0..100 {
        if let Some(AgentEvent::Telegraph(_)) = h.tick(&players) {
            warnings += 1;
        }
    }
    assert_eq!(warnings, 2);
}

#[test]
fn out_of_range_target_yields_no_warning() {
    let mut h = Harness::new("hard", Vec2::new(2000.0, 2000.0));
    h.agent.transition(AgentState::Telegraph, h.now, 1000);
    let far = [(EntityId::Player(PlayerId(1)), Vec2::new(2400.0, 2000.0))];
    assert!(h.tick(&far).is_none());
    // The cast at the end of the telegraph has no impact and is dropped.
    let mut struck = false;
    for _ in 0..15 {
        if let Some(AgentEvent::Strike(_)) = h.tick(&far) {
            struck = true;
        }
    }
    assert!(!struck);
}

// ── Death ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn killed_agent_dies_next_tick_and_expires_on_schedule(
        profile in prop::sample::select(vec!["easy", "medium", "hard"]),
        warmup in 0usize..40,
        overkill in 0i32..500,
    ) {
        let mut h = Harness::new(profile, Vec2::new(3000.0, 3000.0));
        let players = [(EntityId::Player(PlayerId(9)), Vec2::new(3050.0, 3000.0))];
        for _ in 0..warmup {
            h.tick(&players);
        }
        let hp = h.agent.stats().hp;
        h.agent.stats_mut().apply_damage(hp + overkill);

        h.tick(&players);
        prop_assert_eq!(h.agent.state(), AgentState::Death);
        let death_ticks = h.agent.profile().death_ms / TICK_MS;

        let mut expired_after = None;
        for i in 1..=death_ticks + 1 {
            if let Some(AgentEvent::Expired(award)) = h.tick(&players) {
                prop_assert_eq!(award.amount, h.agent.profile().xp_drop);
                expired_after = Some(i);
                break;
            }
            prop_assert_eq!(h.agent.state(), AgentState::Death);
        }
        prop_assert_eq!(expired_after, Some(death_ticks));
        for _ in 0..5 {
            prop_assert!(h.tick(&players).is_none());
            prop_assert_eq!(h.agent.state(), AgentState::Death);
        }
    }
}
