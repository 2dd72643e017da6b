//! Arena driver and the handle the transport talks to it through

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::util::time::tick_duration;
use crate::ws::protocol::Message;

use super::boss::{BossConfig, BossController};
use super::entity::EntityId;
use super::world::{Game, StepOutcome};

/// Capacity of the outbound broadcast. A lagging observer skips ahead.
pub const OUTBOX_CAPACITY: usize = 1024;
const COMMAND_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Arena loop is no longer running")]
    Closed,

    #[error("Join rejected: {0}")]
    Rejected(String),
}

/// A joined observer: its player id and the stream of messages it must mirror
#[derive(Debug)]
pub struct Connection {
    pub id: EntityId,
    pub messages: broadcast::Receiver<Message>,
}

/// Requests applied by the arena loop, in arrival order
#[derive(Debug)]
pub enum ArenaCommand {
    Connect {
        reply: oneshot::Sender<Result<Connection, ArenaError>>,
    },
    Input {
        id: EntityId,
        message: Message,
    },
    Disconnect {
        id: EntityId,
    },
}

#[derive(Debug, Default)]
struct ArenaStats {
    entities: AtomicUsize,
    observers: AtomicUsize,
}

/// Cloneable sender side of the arena loop
#[derive(Clone)]
pub struct ArenaHandle {
    commands: mpsc::Sender<ArenaCommand>,
    stats: Arc<ArenaStats>,
}

impl ArenaHandle {
    /// Join as a new player. The returned receiver starts with the join snapshot.
    pub async fn connect(&self) -> Result<Connection, ArenaError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(ArenaCommand::Connect { reply })
            .await
            .map_err(|_| ArenaError::Closed)?;
        response.await.map_err(|_| ArenaError::Closed)?
    }

    pub async fn input(&self, id: EntityId, message: Message) -> Result<(), ArenaError> {
        self.commands
            .send(ArenaCommand::Input { id, message })
            .await
            .map_err(|_| ArenaError::Closed)
    }

    pub async fn disconnect(&self, id: EntityId) -> Result<(), ArenaError> {
        self.commands
            .send(ArenaCommand::Disconnect { id })
            .await
            .map_err(|_| ArenaError::Closed)
    }

    /// Entity count as of the last tick
    pub fn entities(&self) -> usize {
        self.stats.entities.load(Ordering::Relaxed)
    }

    /// Connected observers
    pub fn observers(&self) -> usize {
        self.stats.observers.load(Ordering::Relaxed)
    }
}

/// Driver settings
#[derive(Debug, Clone, Copy)]
pub struct ArenaSettings {
    /// Delay between a boss leaving the table and its replacement joining
    pub boss_respawn_ms: u64,
    pub boss: BossConfig,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            boss_respawn_ms: 5000,
            boss: BossConfig::default(),
        }
    }
}

/// Single owner of the [`Game`]. Every mutation goes through this task.
pub struct ArenaLoop {
    game: Game,
    settings: ArenaSettings,
    boss: Option<BossController>,
    boss_due: Option<u64>,
    commands: mpsc::Receiver<ArenaCommand>,
    stats: Arc<ArenaStats>,
}

impl ArenaLoop {
    pub fn new(game: Game, settings: ArenaSettings) -> (Self, ArenaHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let stats = Arc::new(ArenaStats::default());

        let handle = ArenaHandle {
            commands: tx,
            stats: stats.clone(),
        };
        let arena = Self {
            game,
            settings,
            boss: None,
            boss_due: None,
            commands: rx,
            stats,
        };
        (arena, handle)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn boss(&self) -> Option<&BossController> {
        self.boss.as_ref()
    }

    /// When the next boss joins, if one is pending
    pub fn boss_due(&self) -> Option<u64> {
        self.boss_due
    }

    /// Run the tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!(
            width = self.game.tuning().width,
            height = self.game.tuning().height,
            "Arena started"
        );

        let mut tick_interval = interval(tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            if !self.process_commands() {
                info!("All arena handles dropped, stopping");
                break;
            }

            self.tick();
        }
    }

    /// Apply every queued command. Returns false once the channel is closed.
    pub fn process_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: ArenaCommand) {
        match command {
            ArenaCommand::Connect { reply } => {
                // Subscribe first so the join snapshot lands in this receiver
                let messages = self.game.subscribe();
                let result = match self.game.join(false) {
                    Ok(id) => {
                        self.stats.observers.fetch_add(1, Ordering::Relaxed);
                        Ok(Connection { id, messages })
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to join observer");
                        Err(ArenaError::Rejected(e.to_string()))
                    }
                };
                if let Err(Ok(connection)) = reply.send(result) {
                    debug!(entity_id = connection.id, "Observer left before join completed");
                    self.disconnect(connection.id);
                }
            }
            ArenaCommand::Input { id, message } => self.game.on_message(id, &message),
            ArenaCommand::Disconnect { id } => self.disconnect(id),
        }
    }

    fn disconnect(&mut self, id: EntityId) {
        if self.game.quit(id).is_some() {
            let _ = self
                .stats
                .observers
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        }
    }

    /// One simulation period: boss behaviours, then physics and combat
    pub fn tick(&mut self) {
        if let Some(boss) = self.boss.as_mut() {
            if let Err(e) = boss.tick(&mut self.game) {
                warn!(entity_id = boss.id(), error = %e, "Boss update failed");
            }
            if !boss.is_active() {
                self.boss = None;
            }
        }

        match self.game.step() {
            Ok(StepOutcome::Running) => {}
            Ok(StepOutcome::NeedsBoss) => {
                self.boss = None;
                if self.boss_due.is_none() {
                    let due = self.game.timestamp() + self.settings.boss_respawn_ms;
                    info!(due_at = due, "Boss respawn scheduled");
                    self.boss_due = Some(due);
                }
            }
            Err(e) => error!(error = %e, "Simulation step failed"),
        }

        if let Some(due) = self.boss_due {
            if self.game.timestamp() >= due {
                self.boss_due = None;
                match BossController::spawn(&mut self.game, self.settings.boss) {
                    Ok(boss) => self.boss = Some(boss),
                    Err(e) => error!(error = %e, "Failed to spawn boss"),
                }
            }
        }

        self.stats
            .entities
            .store(self.game.len(), Ordering::Relaxed);
    }
}
