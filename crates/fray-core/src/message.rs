//! Wire-agnostic message types.
//!
//! Every message travels in a `{type, data}` envelope. Outbound messages
//! are [`ServerMessage`]; inbound messages are decoded once, at the
//! boundary, into [`ClientMessage`] and never reach the simulation in
//! raw form.

use crate::error::MessageError;
use crate::id::{AbilityName, EntityId, PlayerId, ZoneId};
use crate::stats::Stats;
use glam::Vec2;
use serde::{Deserialize, Serialize, Serializer};
use smallvec::SmallVec;

// ── Outbound ────────────────────────────────────────────────────

/// A message produced by the server for one client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once after a character is spawned.
    Welcome(Welcome),
    /// The zones the client should render this tick.
    ActiveZones(ActiveZones),
    /// Every player visible from the active zone set.
    PlayerUpdates(Vec<PlayerSnapshot>),
    /// Every hostile agent visible from the active zone set.
    EnemyUpdates(Vec<AgentSnapshot>),
    /// Settle frame for one player, sent right before it migrates.
    PlayerUpdate(PlayerSnapshot),
    /// Visual effect of a resolved ability.
    AbilityEffect(AbilityEffect),
    /// A hostile agent has committed to a ranged attack.
    TelegraphWarning(TelegraphWarning),
    /// The receiving player has died.
    PlayerDeath(PlayerDeath),
    /// The receiving player has respawned.
    PlayerRespawn(PlayerRespawn),
    /// The receiving player gained one or more levels.
    LevelUp(LevelUp),
}

impl ServerMessage {
    /// Envelope `type` string of this message.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Welcome(_) => "welcome",
            Self::ActiveZones(_) => "activeZones",
            Self::PlayerUpdates(_) => "playerUpdates",
            Self::EnemyUpdates(_) => "enemyUpdates",
            Self::PlayerUpdate(_) => "playerUpdate",
            Self::AbilityEffect(_) => "abilityEffect",
            Self::TelegraphWarning(_) => "telegraphWarning",
            Self::PlayerDeath(_) => "playerDeath",
            Self::PlayerRespawn(_) => "playerRespawn",
            Self::LevelUp(_) => "levelUp",
        }
    }

    /// Encode as a JSON envelope.
    pub fn to_json(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload of `welcome`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Welcome {
    /// The id assigned to the new character.
    pub player_id: PlayerId,
    /// The zone the character was spawned in.
    pub zone_id: ZoneId,
    /// Chosen class.
    pub class: CharacterClass,
}

/// Payload of `activeZones`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveZones {
    /// Owning zone of the receiving player.
    pub current_zone: ZoneId,
    /// Owning zone first, then up to three neighbours.
    pub zones: SmallVec<[ZoneId; 4]>,
}

/// Facing of a player sprite, derived from the last movement input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Towards the camera (moving down).
    #[default]
    Front,
    /// Moving left.
    Left,
    /// Moving right.
    Right,
    /// Away from the camera (moving up).
    Back,
}

impl Facing {
    /// Facing implied by a velocity, or `None` when standing still.
    ///
    /// Horizontal movement wins over vertical on diagonals.
    pub fn from_velocity(v: Vec2) -> Option<Self> {
        if v.x < 0.0 {
            Some(Self::Left)
        } else if v.x > 0.0 {
            Some(Self::Right)
        } else if v.y < 0.0 {
            Some(Self::Back)
        } else if v.y > 0.0 {
            Some(Self::Front)
        } else {
            None
        }
    }

    /// Numeric wire code.
    pub fn code(self) -> u8 {
        match self {
            Self::Front => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Back => 3,
        }
    }
}

impl Serialize for Facing {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Point-in-time view of a player for outbound updates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Player id.
    pub id: PlayerId,
    /// Owning zone at snapshot time.
    pub zone_id: ZoneId,
    /// World-space x.
    pub x: f32,
    /// World-space y.
    pub y: f32,
    /// Current HP, never negative.
    pub hp: i32,
    /// Maximum HP.
    pub max_hp: i32,
    /// Current AP.
    pub ap: i32,
    /// Maximum AP.
    pub max_ap: i32,
    /// Character level.
    pub level: u32,
    /// Total accumulated XP.
    pub xp: u32,
    /// Sprite facing.
    pub direction: Facing,
    /// Owning zone's clock in milliseconds.
    pub timestamp: u64,
}

impl PlayerSnapshot {
    /// Build a snapshot, clamping HP at zero.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: PlayerId,
        zone_id: ZoneId,
        position: Vec2,
        stats: &Stats,
        level: u32,
        xp: u32,
        direction: Facing,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            zone_id,
            x: position.x,
            y: position.y,
            hp: stats.hp.max(0),
            max_hp: stats.max_hp,
            ap: stats.ap,
            max_ap: stats.max_ap,
            level,
            xp,
            direction,
            timestamp,
        }
    }
}

/// Point-in-time view of a hostile agent for outbound updates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSnapshot {
    /// Agent id, in `agent-N` form.
    pub id: EntityId,
    /// Owning zone at snapshot time.
    pub zone_id: ZoneId,
    /// World-space x.
    pub x: f32,
    /// World-space y.
    pub y: f32,
    /// Current HP, never negative.
    pub hp: i32,
    /// Maximum HP.
    pub max_hp: i32,
    /// Behavior profile name.
    pub profile: String,
    /// State machine state name.
    pub state: &'static str,
    /// Owning zone's clock in milliseconds.
    pub timestamp: u64,
}

/// Payload of `abilityEffect`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityEffect {
    /// Which ability resolved.
    pub ability: AbilityName,
    /// Who cast it.
    pub caster_id: EntityId,
    /// Impact x.
    pub impact_x: f32,
    /// Impact y.
    pub impact_y: f32,
    /// Effect radius.
    pub radius: f32,
}

/// Payload of `telegraphWarning`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegraphWarning {
    /// The agent winding up.
    pub agent_id: EntityId,
    /// The entity it has locked on to.
    pub target_id: EntityId,
    /// The ability about to fire.
    pub ability: AbilityName,
    /// Fixed impact x.
    pub impact_x: f32,
    /// Fixed impact y.
    pub impact_y: f32,
    /// Effect radius.
    pub radius: f32,
    /// How long until the attack lands.
    pub duration_ms: u64,
}

/// Payload of `playerDeath`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDeath {
    /// The player that died.
    pub player_id: PlayerId,
    /// Level reached.
    pub level: u32,
    /// Total XP earned.
    pub xp: u32,
}

/// Payload of `playerRespawn`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRespawn {
    /// The respawned player.
    pub player_id: PlayerId,
    /// Zone it respawned in.
    pub zone_id: ZoneId,
    /// Respawn x.
    pub x: f32,
    /// Respawn y.
    pub y: f32,
}

/// Payload of `levelUp`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LevelUp {
    /// Level after the award.
    #[serde(rename = "newLevel")]
    pub new_level: u32,
    /// Attack power after the award.
    #[serde(rename = "newATK")]
    pub new_attack: i32,
    /// XP earned past the start of the current level.
    #[serde(rename = "gameXpOnCurrentLevel")]
    pub xp_on_level: u32,
    /// XP span of the current level.
    #[serde(rename = "gameXpTotalForNextLevel")]
    pub xp_for_next: u32,
}

// ── Inbound ─────────────────────────────────────────────────────

/// A message received from a client, already validated.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Movement key state and action flag.
    Input(InputState),
    /// Spawn a character of the given class.
    SpawnPlayerCharacter(CharacterSelection),
    /// Choose a class before spawning. Treated like a spawn request.
    SelectCharacter(CharacterSelection),
}

impl ClientMessage {
    /// Decode one JSON envelope.
    pub fn parse(raw: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Bitset of held movement keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MoveKeys(u8);

impl MoveKeys {
    /// Up.
    pub const UP: u8 = 1 << 0;
    /// Left.
    pub const LEFT: u8 = 1 << 1;
    /// Down.
    pub const DOWN: u8 = 1 << 2;
    /// Right.
    pub const RIGHT: u8 = 1 << 3;

    /// Build from raw bits; unknown bits are discarded.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::UP | Self::LEFT | Self::DOWN | Self::RIGHT))
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether `key` is held.
    pub fn contains(self, key: u8) -> bool {
        self.0 & key != 0
    }

    /// Unit-length movement direction, or zero when keys cancel out.
    pub fn direction(self) -> Vec2 {
        let mut d = Vec2::ZERO;
        if self.contains(Self::UP) {
            d.y -= 1.0;
        }
        if self.contains(Self::DOWN) {
            d.y += 1.0;
        }
        if self.contains(Self::LEFT) {
            d.x -= 1.0;
        }
        if self.contains(Self::RIGHT) {
            d.x += 1.0;
        }
        d.normalize_or_zero()
    }
}

/// Payload of `input`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "RawInput")]
pub struct InputState {
    /// Held movement keys.
    pub movement: MoveKeys,
    /// Whether the action key is held.
    pub action: bool,
}

#[derive(Deserialize)]
struct RawInput {
    keys: RawKeys,
}

#[derive(Deserialize)]
#[allow(non_snake_case)]
struct RawKeys {
    #[serde(default)]
    W: bool,
    #[serde(default)]
    A: bool,
    #[serde(default)]
    S: bool,
    #[serde(default)]
    D: bool,
    #[serde(default)]
    SPACE: bool,
}

impl From<RawInput> for InputState {
    fn from(raw: RawInput) -> Self {
        let k = raw.keys;
        let mut bits = 0;
        for (held, bit) in [
            (k.W, MoveKeys::UP),
            (k.A, MoveKeys::LEFT),
            (k.S, MoveKeys::DOWN),
            (k.D, MoveKeys::RIGHT),
        ] {
            if held {
                bits |= bit;
            }
        }
        Self {
            movement: MoveKeys::from_bits(bits),
            action: k.SPACE,
        }
    }
}

/// Character archetypes offered at spawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    /// High TNK, medium DPS.
    #[default]
    Guardian,
    /// High TNK, medium SUP.
    Paladin,
    /// High DPS, medium TNK.
    Ravager,
    /// High SUP, medium TNK.
    Monk,
    /// High DPS, medium SUP.
    Harbinger,
    /// High SUP, medium DPS.
    Mystic,
}

impl CharacterClass {
    /// `(TNK, DPS, SUP)` ratings in percent of the base stat.
    pub fn ratings(self) -> (i32, i32, i32) {
        match self {
            Self::Guardian => (150, 100, 50),
            Self::Paladin => (150, 50, 100),
            Self::Ravager => (100, 150, 50),
            Self::Monk => (100, 50, 150),
            Self::Harbinger => (50, 150, 100),
            Self::Mystic => (50, 100, 150),
        }
    }

    /// Scale base stats by this class's ratings.
    ///
    /// TNK scales max HP, DPS scales attack power and SUP scales max AP.
    pub fn stats(self, base_hp: i32, base_ap: i32, base_attack: i32) -> Stats {
        let (tnk, dps, sup) = self.ratings();
        Stats::new(
            (base_hp * tnk / 100).max(1),
            base_ap * sup / 100,
            base_attack * dps / 100,
        )
    }
}

/// Payload of `spawnPlayerCharacter` and `selectCharacter`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CharacterSelection {
    /// Requested class.
    #[serde(default)]
    pub class: CharacterClass,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_parses_keys() {
        let msg = ClientMessage::parse(
            r#"{"type":"input","data":{"keys":{"W":true,"A":false,"S":false,"D":true,"SPACE":true}}}"#,
        )
        .unwrap();
        let ClientMessage::Input(input) = msg else {
            panic!("expected input, got {msg:?}");
        };
        assert!(input.movement.contains(MoveKeys::UP));
        assert!(input.movement.contains(MoveKeys::RIGHT));
        assert!(!input.movement.contains(MoveKeys::LEFT));
        assert!(input.action);
        let d = input.movement.direction();
        assert!((d.length() - 1.0).abs() < 1e-6);
        assert!(d.x > 0.0 && d.y < 0.0);
    }

    #[test]
    fn opposing_keys_cancel() {
        let keys = MoveKeys::from_bits(MoveKeys::LEFT | MoveKeys::RIGHT);
        assert_eq!(keys.direction(), Vec2::ZERO);
    }

    #[test]
    fn unknown_type_is_malformed() {
        let err = ClientMessage::parse(r#"{"type":"teleport","data":{}}"#).unwrap_err();
        assert!(matches!(err, MessageError::Malformed { .. }));
    }

    #[test]
    fn input_without_keys_is_malformed() {
        assert!(ClientMessage::parse(r#"{"type":"input","data":{"x":1}}"#).is_err());
        assert!(ClientMessage::parse("not json").is_err());
    }

    #[test]
    fn spawn_selects_class() {
        let msg =
            ClientMessage::parse(r#"{"type":"spawnPlayerCharacter","data":{"class":"monk"}}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SpawnPlayerCharacter(CharacterSelection {
                class: CharacterClass::Monk
            })
        );
        let msg = ClientMessage::parse(r#"{"type":"selectCharacter","data":{}}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::SelectCharacter(CharacterSelection::default())
        );
    }

    #[test]
    fn class_scales_stats() {
        let s = CharacterClass::Guardian.stats(300, 200, 45);
        assert_eq!(s.max_hp, 450);
        assert_eq!(s.attack_power, 45);
        assert_eq!(s.max_ap, 100);
    }

    #[test]
    fn facing_prefers_horizontal() {
        assert_eq!(Facing::from_velocity(Vec2::new(1.0, -1.0)), Some(Facing::Right));
        assert_eq!(Facing::from_velocity(Vec2::new(0.0, -1.0)), Some(Facing::Back));
        assert_eq!(Facing::from_velocity(Vec2::ZERO), None);
    }

    #[test]
    fn envelope_shape() {
        let msg = ServerMessage::AbilityEffect(AbilityEffect {
            ability: AbilityName::Fireball,
            caster_id: EntityId::Agent(crate::id::AgentId(4)),
            impact_x: 10.0,
            impact_y: 20.0,
            radius: 50.0,
        });
        let v: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(v["type"], msg.type_name());
        assert_eq!(v["data"]["ability"], "Fireball");
        assert_eq!(v["data"]["casterId"], "agent-4");
        assert_eq!(v["data"]["radius"], 50.0);
    }

    #[test]
    fn snapshot_clamps_hp() {
        let mut stats = Stats::new(100, 10, 5);
        stats.apply_damage(150);
        let snap = PlayerSnapshot::new(
            PlayerId(1),
            ZoneId(1),
            Vec2::new(1.0, 2.0),
            &stats,
            1,
            0,
            Facing::Back,
            0,
        );
        assert_eq!(snap.hp, 0);
        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["direction"], 3);
        assert_eq!(v["maxHp"], 100);
    }
}
