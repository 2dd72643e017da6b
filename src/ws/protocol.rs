//! WebSocket protocol message definitions
//! The same envelope carries state out to observers and key input back in.

use serde::{Deserialize, Serialize};

use crate::game::entity::{Entity, EntityId, EntityKind};

/// Action tag of an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Object is the join timestamp, used by the new observer to align its clock
    Join,
    /// Object is a full entity snapshot
    Set,
    /// Object is the id of the removed entity
    Delete,
    /// Object is the red team's score
    RefreshRedPoints,
    /// Object is the blue team's score
    RefreshBluePoints,
    /// Object is a key symbol
    Keydown,
    Keyup,
}

/// Wire discriminator of a payload. Stable, independent of Rust type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadKind {
    Integer,
    Number,
    String,
    Boolean,
    Vehicle,
    PlayerVehicle,
    Boss,
    Rocket,
    Laser,
}

impl PayloadKind {
    pub fn is_composite(self) -> bool {
        self.entity_kind().is_some()
    }

    pub fn entity_kind(self) -> Option<EntityKind> {
        match self {
            PayloadKind::Vehicle => Some(EntityKind::Vehicle),
            PayloadKind::PlayerVehicle => Some(EntityKind::PlayerVehicle),
            PayloadKind::Boss => Some(EntityKind::Boss),
            PayloadKind::Rocket => Some(EntityKind::Rocket),
            PayloadKind::Laser => Some(EntityKind::Laser),
            PayloadKind::Integer
            | PayloadKind::Number
            | PayloadKind::String
            | PayloadKind::Boolean => None,
        }
    }
}

impl From<EntityKind> for PayloadKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Vehicle => PayloadKind::Vehicle,
            EntityKind::PlayerVehicle => PayloadKind::PlayerVehicle,
            EntityKind::Boss => PayloadKind::Boss,
            EntityKind::Rocket => PayloadKind::Rocket,
            EntityKind::Laser => PayloadKind::Laser,
        }
    }
}

/// Envelope contents
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Integer(i64),
    Number(f64),
    Text(String),
    Flag(bool),
    Entity(Box<Entity>),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Integer(_) => PayloadKind::Integer,
            Payload::Number(_) => PayloadKind::Number,
            Payload::Text(_) => PayloadKind::String,
            Payload::Flag(_) => PayloadKind::Boolean,
            Payload::Entity(entity) => entity.kind().into(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Payload::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Payload::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<Entity> {
        match self {
            Payload::Entity(e) => Some(*e),
            _ => None,
        }
    }
}

/// Unit of state transfer: `{action, type, object}` on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub action: Action,
    pub object: Payload,
}

impl Message {
    pub fn new(action: Action, object: Payload) -> Self {
        Self { action, object }
    }

    /// Discriminator derived from the payload's concrete variant
    pub fn kind(&self) -> PayloadKind {
        self.object.kind()
    }

    pub fn join(timestamp: u64) -> Self {
        Self::new(Action::Join, Payload::Integer(timestamp as i64))
    }

    pub fn set(entity: &Entity) -> Self {
        Self::new(Action::Set, Payload::Entity(Box::new(entity.clone())))
    }

    pub fn delete(id: EntityId) -> Self {
        Self::new(Action::Delete, Payload::Integer(id as i64))
    }

    pub fn refresh_red_points(points: u32) -> Self {
        Self::new(Action::RefreshRedPoints, Payload::Integer(points as i64))
    }

    pub fn refresh_blue_points(points: u32) -> Self {
        Self::new(Action::RefreshBluePoints, Payload::Integer(points as i64))
    }

    pub fn keydown(key: Key) -> Self {
        Self::new(Action::Keydown, Payload::Text(key.symbol().to_string()))
    }

    pub fn keyup(key: Key) -> Self {
        Self::new(Action::Keyup, Payload::Text(key.symbol().to_string()))
    }

    /// Key transition carried by this message, if it is a recognized one
    pub fn key_event(&self) -> Option<(bool, Key)> {
        let pressed = match self.action {
            Action::Keydown => true,
            Action::Keyup => false,
            _ => return None,
        };
        let key = Key::from_symbol(self.object.as_text()?)?;
        Some((pressed, key))
    }
}

/// The five input symbols understood by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
}

impl Key {
    pub const ALL: [Key; 5] = [
        Key::ArrowLeft,
        Key::ArrowRight,
        Key::ArrowUp,
        Key::ArrowDown,
        Key::Space,
    ];

    /// Browser `KeyboardEvent.key` value
    pub fn symbol(self) -> &'static str {
        match self {
            Key::ArrowLeft => "ArrowLeft",
            Key::ArrowRight => "ArrowRight",
            Key::ArrowUp => "ArrowUp",
            Key::ArrowDown => "ArrowDown",
            Key::Space => " ",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.symbol() == symbol)
    }
}
