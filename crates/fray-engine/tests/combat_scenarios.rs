//! End-to-end combat through the lockstep server: XP awards, telegraph
//! warnings, deaths and respawns.

use fray_agents::AgentState;
use fray_core::{Combatant, PlayerId, ServerMessage, Vec2, ZoneId};
use fray_engine::{LockstepServer, MigrationRequest, ZoneInput};
use fray_test_utils::{
    action, grid_topology, guardian, line_topology, quiet_config, RecordingSink,
};

const ZONE: ZoneId = ZoneId(1);

fn one_zone() -> LockstepServer {
    LockstepServer::new(quiet_config(), grid_topology(1, 1, 2000.0)).unwrap()
}

fn place(server: &LockstepServer, id: PlayerId, at: Vec2) {
    server
        .coordinator()
        .with_zone(ZONE, |z| z.player_mut(id).unwrap().set_position(at))
        .unwrap();
}

fn xp_of(server: &LockstepServer, id: PlayerId) -> u32 {
    server
        .coordinator()
        .with_zone(ZONE, |z| z.player(id).unwrap().progression().xp)
        .unwrap()
}

// ── XP award ─────────────────────────────────────────────────────

#[test]
fn easy_kill_awards_ten_xp_inside_radius_only() {
    let mut server = one_zone();
    let near_sink = RecordingSink::new();
    let near = server.coordinator().spawn(guardian(), near_sink.boxed()).unwrap();
    let far = server
        .coordinator()
        .spawn(guardian(), RecordingSink::new().boxed())
        .unwrap();
    place(&server, far, Vec2::new(1500.0, 1000.0));

    let agent = server
        .coordinator()
        .with_zone(ZONE, |z| {
            let id = z.spawn_agent("easy", Vec2::new(1000.0, 1060.0)).unwrap();
            z.agent_mut(id).unwrap().stats_mut().hp = 20;
            id
        })
        .unwrap();

    // The sweep kills it on the first tick.
    server
        .coordinator()
        .route(ZoneInput {
            player: near,
            input: action(),
        })
        .unwrap();
    server.step_sync();
    let state = server
        .coordinator()
        .with_zone(ZONE, |z| z.agent(agent).map(|a| a.state()))
        .unwrap();
    assert_eq!(state, Some(AgentState::Death));
    assert_eq!(xp_of(&server, near), 0);

    // Death lasts 1000 ms; the award lands when it completes.
    server.run(10);
    assert!(server
        .coordinator()
        .with_zone(ZONE, |z| z.agent(agent).is_none())
        .unwrap());
    assert_eq!(xp_of(&server, near), 10);
    assert_eq!(xp_of(&server, far), 0);
    assert_eq!(near_sink.count("abilityEffect"), 1);
}

#[test]
fn award_reaches_players_across_the_zone_edge() {
    let mut server = LockstepServer::new(quiet_config(), line_topology(2, 1000.0)).unwrap();
    let c = server.coordinator();
    let near = c.spawn(guardian(), RecordingSink::new().boxed()).unwrap();
    let across = c.spawn(guardian(), RecordingSink::new().boxed()).unwrap();
    let far = c.spawn(guardian(), RecordingSink::new().boxed()).unwrap();
    for id in [across, far] {
        assert!(c.apply_migration(MigrationRequest {
            player: id,
            from: ZoneId(1),
            to: ZoneId(2),
        }));
    }
    let place_in = |zone: ZoneId, id: PlayerId, at: Vec2| {
        c.with_zone(zone, |z| z.player_mut(id).unwrap().set_position(at))
            .unwrap();
    };
    place_in(ZoneId(1), near, Vec2::new(900.0, 500.0));
    place_in(ZoneId(2), across, Vec2::new(1100.0, 500.0));
    place_in(ZoneId(2), far, Vec2::new(1900.0, 500.0));

    // Easy award radius is 320 px, so the circle spills into zone 2.
    c.with_zone(ZoneId(1), |z| {
        let agent = z.spawn_agent("easy", Vec2::new(960.0, 500.0)).unwrap();
        z.agent_mut(agent).unwrap().stats_mut().apply_damage(10_000);
    })
    .unwrap();

    server.run(12);

    let xp_in = |zone: ZoneId, id: PlayerId| {
        server
            .coordinator()
            .with_zone(zone, |z| z.player(id).unwrap().progression().xp)
            .unwrap()
    };
    assert_eq!(xp_in(ZoneId(1), near), 10);
    assert_eq!(xp_in(ZoneId(2), across), 10);
    assert_eq!(xp_in(ZoneId(2), far), 0);
}

#[test]
fn enough_xp_levels_up_and_notifies() {
    let mut server = one_zone();
    let sink = RecordingSink::new();
    let id = server.coordinator().spawn(guardian(), sink.boxed()).unwrap();
    let attack_before = server
        .coordinator()
        .with_zone(ZONE, |z| {
            for i in 0..4 {
                let at = Vec2::new(900.0 + 40.0 * i as f32, 1050.0);
                let agent = z.spawn_agent("hard", at).unwrap();
                z.agent_mut(agent).unwrap().stats_mut().apply_damage(10_000);
            }
            z.player(id).unwrap().stats().attack_power
        })
        .unwrap();

    server.run(12);

    let levels = sink.of_type("levelUp");
    assert_eq!(levels.len(), 1);
    let ServerMessage::LevelUp(up) = &levels[0] else {
        unreachable!()
    };
    // 4 × 30 XP crosses the 100 XP threshold for level 2.
    assert_eq!(up.new_level, 2);
    assert!(up.new_attack > attack_before);
    assert_eq!(xp_of(&server, id), 120);
}

// ── Telegraph ────────────────────────────────────────────────────

#[test]
fn ranged_telegraph_is_sent_once_per_state_entry() {
    let mut server = one_zone();
    let sink = RecordingSink::new();
    let id = server.coordinator().spawn(guardian(), sink.boxed()).unwrap();
    server
        .coordinator()
        .with_zone(ZONE, |z| z.spawn_agent("hard", Vec2::new(1150.0, 1000.0)))
        .unwrap()
        .unwrap();

    // Spawn takes 1000 ms, telegraph another 1000 ms.
    server.run(15);

    let warnings = sink.of_type("telegraphWarning");
    assert_eq!(warnings.len(), 1);
    let ServerMessage::TelegraphWarning(w) = &warnings[0] else {
        unreachable!()
    };
    assert_eq!(w.target_id, id.into());
    assert_eq!(w.duration_ms, 1000);
    assert_eq!((w.impact_x, w.impact_y), (1000.0, 1000.0));
}

// ── Death and respawn ────────────────────────────────────────────

#[test]
fn dead_player_respawns_on_request() {
    let mut server = one_zone();
    let sink = RecordingSink::new();
    let id = server.coordinator().spawn(guardian(), sink.boxed()).unwrap();
    place(&server, id, Vec2::new(300.0, 300.0));
    server
        .coordinator()
        .with_zone(ZONE, |z| {
            let p = z.player_mut(id).unwrap();
            let (progress, stats) = p.progression_mut();
            progress.xp = 42;
            stats.apply_damage(10_000);
        })
        .unwrap();
    server.step_sync();
    assert_eq!(sink.count("playerDeath"), 1);

    // Dead players ignore movement.
    server
        .coordinator()
        .submit_raw(id, r#"{"type":"input","data":{"keys":{"W":true}}}"#)
        .unwrap();
    server.step_sync();
    let still = server
        .coordinator()
        .with_zone(ZONE, |z| z.player(id).unwrap().position())
        .unwrap();
    assert_eq!(still, Vec2::new(300.0, 300.0));

    server
        .coordinator()
        .submit_raw(id, r#"{"type":"spawnPlayerCharacter","data":{"class":"guardian"}}"#)
        .unwrap();
    server.step_sync();

    assert_eq!(sink.count("playerRespawn"), 1);
    let (hp, max_hp, at, xp, dead) = server
        .coordinator()
        .with_zone(ZONE, |z| {
            let p = z.player(id).unwrap();
            (p.stats().hp, p.stats().max_hp, p.position(), p.progression().xp, p.is_dead())
        })
        .unwrap();
    assert!(!dead);
    assert_eq!(hp, max_hp);
    assert_eq!(at, Vec2::new(1000.0, 1000.0));
    assert_eq!(xp, 42);
}

#[test]
fn respawn_request_from_living_player_is_ignored() {
    let mut server = one_zone();
    let sink = RecordingSink::new();
    let id = server.coordinator().spawn(guardian(), sink.boxed()).unwrap();
    assert!(!server.coordinator().respawn(id).unwrap());
    server.step_sync();
    assert_eq!(sink.count("playerRespawn"), 0);
}
