//! Realtime server smoke tests: zones tick on their own threads and
//! the migrator hands players across.

use std::thread;
use std::time::{Duration, Instant};

use fray_core::{MoveKeys, ZoneId};
use fray_engine::{RealtimeServer, ServerConfig, ZoneInput};
use fray_test_utils::{guardian, keys, line_topology, quiet_config, RecordingSink};

fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn player_receives_batches_and_migrates() {
    let config = ServerConfig {
        tick_rate_hz: 50.0,
        ..quiet_config()
    };
    let mut server = RealtimeServer::new(config, line_topology(2, 100.0)).unwrap();
    let sink = RecordingSink::new();
    let id = server.coordinator().spawn(guardian(), sink.boxed()).unwrap();

    assert!(wait_until(|| sink.count("activeZones") > 0));
    assert_eq!(sink.messages()[0].type_name(), "welcome");

    server
        .coordinator()
        .route(ZoneInput {
            player: id,
            input: keys(MoveKeys::RIGHT),
        })
        .unwrap();
    assert!(wait_until(
        || server.coordinator().player_zone(id) == Some(ZoneId(2))
    ));
    assert_eq!(server.coordinator().owners(id).as_slice(), &[ZoneId(2)]);

    let report = server.shutdown();
    assert_eq!(report.zones_joined, 2);
    assert!(report.migrator_joined);
    assert!(report.migrations >= 1);

    // Zones stay inspectable after shutdown.
    assert_eq!(server.coordinator().player_count(), 1);
}
