//! Observer-side shadow of the arena
//!
//! A [`Replica`] applies the server's deltas, extrapolates entities between
//! updates with the same integration rules, and hands the table to a
//! [`Canvas`] for drawing. It never decides anything.

pub mod keyboard;
pub mod renderer;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::game::draw::Canvas;
use crate::game::entity::{Entity, EntityId};
use crate::game::tuning::ArenaTuning;
use crate::game::world::TeamTally;
use crate::util::geometry::GeometryError;
use crate::util::time::{Clock, WallClock};
use crate::ws::codec::{Codec, CodecError};
use crate::ws::protocol::{Action, Message};

pub use keyboard::KeyFilter;
pub use renderer::render_frame;

pub struct Replica {
    tuning: ArenaTuning,
    entities: BTreeMap<EntityId, Entity>,
    codec: Codec,
    clock: Box<dyn Clock>,
    /// Server time minus local time, fixed by the last `join`
    offset: i64,
    scores: TeamTally,
}

impl Replica {
    pub fn new(tuning: ArenaTuning) -> Self {
        Self {
            tuning,
            entities: BTreeMap::new(),
            codec: Codec::presentation(),
            clock: Box::new(WallClock::new()),
            offset: 0,
            scores: TeamTally::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Server time as estimated from the local clock
    pub fn timestamp(&self) -> u64 {
        let local = self.clock.now_ms() as i64;
        (local + self.offset).max(0) as u64
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn scores(&self) -> TeamTally {
        self.scores
    }

    /// Decode a text frame and apply it
    pub fn on_text(&mut self, text: &str) -> Result<(), CodecError> {
        let message = self.codec.decode(text)?;
        self.on_message(message);
        Ok(())
    }

    pub fn on_message(&mut self, message: Message) {
        match message.action {
            Action::Join => {
                if let Some(server_now) = message.object.as_integer() {
                    self.offset = server_now - self.clock.now_ms() as i64;
                    debug!(server_now, offset = self.offset, "Replica clock aligned");
                }
            }
            Action::Set => {
                if let Some(entity) = message.object.into_entity() {
                    trace!(entity_id = entity.id(), "Replica set");
                    self.entities.insert(entity.id(), entity);
                }
            }
            Action::Delete => {
                if let Some(id) = message.object.as_integer() {
                    self.entities.remove(&(id as EntityId));
                }
            }
            Action::RefreshRedPoints => {
                if let Some(points) = message.object.as_integer() {
                    self.scores.red = points.max(0) as u32;
                }
            }
            Action::RefreshBluePoints => {
                if let Some(points) = message.object.as_integer() {
                    self.scores.blue = points.max(0) as u32;
                }
            }
            Action::Keydown | Action::Keyup => {}
        }
    }

    /// Extrapolate every entity to the estimated server time
    pub fn step(&mut self) -> Result<(), GeometryError> {
        let now = self.timestamp();
        for entity in self.entities.values_mut() {
            entity.catch_up(now, &self.tuning)?;
        }
        Ok(())
    }

    pub fn render(&self, canvas: &mut dyn Canvas) {
        render_frame(canvas, self.entities.values(), &self.tuning);
    }
}
