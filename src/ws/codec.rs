//! JSON codec for protocol envelopes

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::entity::{Entity, EntityKind};

use super::protocol::{Action, Message, Payload, PayloadKind};

/// Envelope decode/encode failures. Fatal to one message only.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Unknown payload type: {0}")]
    UnknownType(String),

    #[error("Payload type {0:?} is not decodable by this codec")]
    Unsupported(PayloadKind),

    #[error("Payload does not match type {kind:?}: {source}")]
    Mismatch {
        kind: PayloadKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported payload value: {0}")]
    BadValue(&'static str),
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    action: Action,
    #[serde(rename = "type")]
    kind: PayloadKind,
    object: &'a Value,
}

#[derive(Deserialize)]
struct InboundEnvelope {
    action: Action,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    object: Value,
}

/// Encodes any message and decodes messages whose composite payloads belong to a fixed set
#[derive(Debug, Clone, Default)]
pub struct Codec {
    types: HashSet<EntityKind>,
}

impl Codec {
    /// Codec able to rebuild the given entity variants. Scalars are always accepted.
    pub fn new(types: impl IntoIterator<Item = EntityKind>) -> Self {
        Self {
            types: types.into_iter().collect(),
        }
    }

    /// Scalar-only codec, used for inbound key messages
    pub fn scalars() -> Self {
        Self::default()
    }

    /// The set rebuilt by the presentation mirror
    pub fn presentation() -> Self {
        Self::new([
            EntityKind::Vehicle,
            EntityKind::Laser,
            EntityKind::Boss,
            EntityKind::PlayerVehicle,
        ])
    }

    pub fn accepts(&self, kind: EntityKind) -> bool {
        self.types.contains(&kind)
    }

    pub fn encode(&self, message: &Message) -> Result<String, CodecError> {
        let object = match &message.object {
            Payload::Integer(v) => Value::from(*v),
            Payload::Number(v) => {
                if !v.is_finite() {
                    return Err(CodecError::BadValue("non-finite number"));
                }
                Value::from(*v)
            }
            Payload::Text(s) => Value::from(s.as_str()),
            Payload::Flag(b) => Value::from(*b),
            Payload::Entity(entity) => entity_to_value(entity).map_err(CodecError::Malformed)?,
        };

        serde_json::to_string(&OutboundEnvelope {
            action: message.action,
            kind: message.kind(),
            object: &object,
        })
        .map_err(CodecError::Malformed)
    }

    pub fn decode(&self, text: &str) -> Result<Message, CodecError> {
        let envelope: InboundEnvelope = serde_json::from_str(text).map_err(CodecError::Malformed)?;

        let object = match envelope.object {
            Value::Object(_) => {
                let name = envelope
                    .kind
                    .ok_or_else(|| CodecError::UnknownType(String::new()))?;
                let kind: PayloadKind = serde_json::from_value(Value::String(name.clone()))
                    .map_err(|_| CodecError::UnknownType(name))?;
                let entity_kind = kind
                    .entity_kind()
                    .filter(|k| self.accepts(*k))
                    .ok_or(CodecError::Unsupported(kind))?;
                let entity = entity_from_value(entity_kind, envelope.object)
                    .map_err(|source| CodecError::Mismatch { kind, source })?;
                Payload::Entity(Box::new(entity))
            }
            Value::Number(n) => match n.as_i64() {
                Some(v) => Payload::Integer(v),
                None => Payload::Number(n.as_f64().ok_or(CodecError::BadValue("number"))?),
            },
            Value::String(s) => Payload::Text(s),
            Value::Bool(b) => Payload::Flag(b),
            Value::Null => return Err(CodecError::BadValue("null")),
            Value::Array(_) => return Err(CodecError::BadValue("array")),
        };

        Ok(Message {
            action: envelope.action,
            object,
        })
    }
}

fn entity_to_value(entity: &Entity) -> Result<Value, serde_json::Error> {
    match entity {
        Entity::Vehicle(v) => serde_json::to_value(v),
        Entity::Player(p) => serde_json::to_value(p),
        Entity::Boss(b) => serde_json::to_value(b),
        Entity::Rocket(r) => serde_json::to_value(r),
        Entity::Laser(l) => serde_json::to_value(l),
    }
}

fn entity_from_value(kind: EntityKind, value: Value) -> Result<Entity, serde_json::Error> {
    Ok(match kind {
        EntityKind::Vehicle => Entity::Vehicle(serde_json::from_value(value)?),
        EntityKind::PlayerVehicle => Entity::Player(serde_json::from_value(value)?),
        EntityKind::Boss => Entity::Boss(serde_json::from_value(value)?),
        EntityKind::Rocket => Entity::Rocket(serde_json::from_value(value)?),
        EntityKind::Laser => Entity::Laser(serde_json::from_value(value)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::{Boss, Kinematics, Laser, PlayerVehicle, Rocket, Team};
    use crate::game::tuning::ArenaTuning;
    use crate::ws::protocol::Key;
    use rand::SeedableRng;

    #[test]
    fn envelope_is_self_describing() {
        let codec = Codec::presentation();
        let text = codec.encode(&Message::delete(7)).unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["action"], "delete");
        assert_eq!(json["type"], "integer");
        assert_eq!(json["object"], 7);
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        let codec = Codec::scalars();
        for message in [
            Message::join(1234),
            Message::refresh_red_points(3),
            Message::keydown(Key::Space),
            Message::new(Action::Set, Payload::Number(0.1 + 0.2)),
            Message::new(Action::Set, Payload::Number(3.0)),
            Message::new(Action::Set, Payload::Flag(true)),
        ] {
            let decoded = codec.decode(&codec.encode(&message).unwrap()).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn composite_payload_rebuilds_concrete_variant() {
        let tuning = ArenaTuning::default();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let mut player = PlayerVehicle::spawn(2, 30, Team::Red, &tuning, &mut rng).unwrap();
        player.vehicle.controls.turning_left = true;
        player.vehicle.body.speed = 12.345678901234;
        let entity = Entity::Player(player);

        let codec = Codec::presentation();
        let decoded = codec.decode(&codec.encode(&Message::set(&entity)).unwrap()).unwrap();
        assert_eq!(decoded.action, Action::Set);
        assert_eq!(decoded.object.as_entity(), Some(&entity));
        assert_eq!(decoded.object.as_entity().and_then(Entity::team), Some(Team::Red));
    }

    #[test]
    fn boss_and_laser_round_trip_through_presentation_set() {
        let tuning = ArenaTuning::default();
        let codec = Codec::presentation();
        let boss = Entity::Boss(Boss::spawn(0, 10, &tuning));
        let laser = Entity::Laser(Laser {
            rocket: Rocket::new(Kinematics::at(1, 10, 5.0, 6.0)),
            laser_color: Laser::BLUE_BEAM.into(),
        });
        for entity in [boss, laser] {
            let decoded = codec.decode(&codec.encode(&Message::set(&entity)).unwrap()).unwrap();
            assert_eq!(decoded.object.as_entity().map(Entity::kind), Some(entity.kind()));
        }
    }

    #[test]
    fn composite_outside_configured_set_is_rejected() {
        let rocket = Entity::Rocket(Rocket::new(Kinematics::at(1, 0, 0.0, 0.0)));
        let text = Codec::presentation().encode(&Message::set(&rocket)).unwrap();
        assert!(matches!(
            Codec::presentation().decode(&text),
            Err(CodecError::Unsupported(PayloadKind::Rocket))
        ));
        assert!(matches!(
            Codec::scalars().decode(&text),
            Err(CodecError::Unsupported(PayloadKind::Rocket))
        ));
    }

    #[test]
    fn malformed_envelopes_are_errors() {
        let codec = Codec::presentation();
        assert!(matches!(codec.decode("{not json"), Err(CodecError::Malformed(_))));
        assert!(matches!(
            codec.decode(r#"{"action":"explode","type":"string","object":"x"}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(
            codec.decode(r#"{"action":"set","type":"Spaceship","object":{"id":1}}"#),
            Err(CodecError::UnknownType(_))
        ));
        assert!(matches!(
            codec.decode(r#"{"action":"set","type":"boss","object":{"id":1}}"#),
            Err(CodecError::Mismatch { kind: PayloadKind::Boss, .. })
        ));
        assert!(matches!(
            codec.decode(r#"{"action":"delete","type":"integer","object":null}"#),
            Err(CodecError::BadValue("null"))
        ));
    }

    #[test]
    fn browser_key_message_decodes() {
        let message = Codec::scalars()
            .decode(r#"{"action":"keydown","type":"String","object":"ArrowLeft"}"#)
            .unwrap();
        assert_eq!(message.key_event(), Some((true, Key::ArrowLeft)));
    }
}
