//! The room state machine.
//!
//! [`Room`] is plain synchronous state: it owns the seated players, the
//! waiting queue, the team assignment and the RNG. It knows nothing about
//! tasks or timers. The manager's actor drives it and owns the reset timer;
//! tests drive it directly.
//!
//! ```text
//!            join (seats < capacity)
//!           ┌───────┐
//!           ▼       │
//!       ┌─────────┐ │   join fills last seat    ┌─────────┐
//!  ───► │ Waiting │─┴─────────────────────────► │ Playing │
//!       └─────────┘                             └─────────┘
//!           ▲          reset(generation)             │
//!           └────────────────────────────────────────┘
//! ```
//!
//! A player is in at most one of `players` and `queue`. Moving one between
//! them is a move of the record, never a copy.

use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use turncoat_protocol::{GameRecord, Phase, Player, PlayerId, RoomSnapshot, Teams};

use crate::assign::assign_teams;
use crate::{RoomConfig, RoomError};

/// Where a successful join put the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Took a seat in the room.
    Seated,
    /// Appended to the waiting queue at this 1-based position.
    Queued { position: usize },
}

/// Result of a successful [`Room::join`].
#[derive(Debug, Clone)]
pub struct Admission {
    /// The new player as stored at the moment of the join. If this join
    /// started the game, the record already carries the assignment.
    pub player: Player,
    pub placement: Placement,
    /// Set when this join filled the room and started a game.
    pub started: Option<GameRecord>,
}

/// Where a [`Room::leave`] found the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    Seated(Player),
    Queued(Player),
    /// Unknown id. Leaving is idempotent, so this is not an error.
    Absent,
}

/// Result of a reset that applied to the current game.
#[derive(Debug, Clone)]
pub struct Promotion {
    /// The game that just ended.
    pub finished_game: u64,
    /// Players moved from the front of the queue into seats.
    pub promoted: usize,
    /// Players still queued after the move.
    pub still_waiting: usize,
    /// Set when the promoted players filled the room and a new game started.
    pub started: Option<GameRecord>,
}

/// The single room: seats, queue, phase and assignment.
pub struct Room {
    config: RoomConfig,
    phase: Phase,
    players: Vec<Player>,
    queue: VecDeque<Player>,
    teams: Teams,
    game_number: u64,
    /// Strictly increasing counter baked into every generated id.
    serial: u64,
    rng: StdRng,
}

impl Room {
    /// Creates an empty waiting room for game 1.
    pub fn new(config: RoomConfig) -> Self {
        Self::starting_at(config, 1)
    }

    /// Creates an empty waiting room whose first game is `game_number`.
    pub fn starting_at(config: RoomConfig, game_number: u64) -> Self {
        let config = config.validated();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            phase: Phase::Waiting,
            players: Vec::new(),
            queue: VecDeque::new(),
            teams: Teams::default(),
            game_number: game_number.max(1),
            serial: 0,
            rng,
        }
    }

    /// Admits a player under `name`, de-duplicated against everyone seated
    /// or queued.
    ///
    /// # Errors
    /// - [`RoomError::InvalidArgument`] if `name` is blank.
    /// - [`RoomError::RoomBusy`] if a game is in progress and the room is
    ///   not configured to queue during games.
    pub fn join(&mut self, name: &str) -> Result<Admission, RoomError> {
        let base = name.trim();
        if base.is_empty() {
            return Err(RoomError::InvalidArgument("player name is required".into()));
        }

        if !self.accepts_joins() {
            return Err(RoomError::RoomBusy(self.game_number));
        }

        let unique = self.unique_name(base);
        let id = PlayerId(self.next_id());
        let player = Player::new(id, unique, now_millis());

        if self.phase == Phase::Waiting && self.players.len() < self.config.capacity {
            self.players.push(player);
            tracing::info!(
                game = self.game_number,
                player = %self.players[self.players.len() - 1].name,
                players = self.players.len(),
                capacity = self.config.capacity,
                "player seated"
            );

            let started = if self.players.len() == self.config.capacity {
                Some(self.start_game())
            } else {
                None
            };
            // Cloned after a possible start so the caller sees the stamps.
            let player = self.players[self.players.len() - 1].clone();

            return Ok(Admission {
                player,
                placement: Placement::Seated,
                started,
            });
        }

        self.queue.push_back(player.clone());
        let position = self.queue.len();
        tracing::info!(
            game = self.game_number,
            player = %player.name,
            position,
            "player queued"
        );

        Ok(Admission {
            player,
            placement: Placement::Queued { position },
            started: None,
        })
    }

    /// Removes `id` from the seats and from the queue. Unknown ids are a
    /// no-op.
    ///
    /// Leaving during a game leaves the team lists and the pending reset as
    /// they are; the stale entry disappears at the next reset.
    pub fn leave(&mut self, id: &PlayerId) -> Departure {
        if let Some(pos) = self.players.iter().position(|p| &p.id == id) {
            let player = self.players.remove(pos);
            tracing::info!(
                game = self.game_number,
                player = %player.name,
                players = self.players.len(),
                phase = %self.phase,
                "player left room"
            );
            return Departure::Seated(player);
        }

        if let Some(pos) = self.queue.iter().position(|p| &p.id == id) {
            if let Some(player) = self.queue.remove(pos) {
                tracing::info!(
                    player = %player.name,
                    waiting = self.queue.len(),
                    "player left queue"
                );
                return Departure::Queued(player);
            }
        }

        tracing::debug!(player_id = %id, "leave for unknown player ignored");
        Departure::Absent
    }

    /// Ends game `generation` and seats the front of the queue.
    ///
    /// Returns `None` without touching anything if `generation` is not the
    /// game currently being played (a stale timer).
    pub fn reset(&mut self, generation: u64) -> Option<Promotion> {
        if self.phase != Phase::Playing || generation != self.game_number {
            tracing::debug!(
                generation,
                current = self.game_number,
                phase = %self.phase,
                "stale reset ignored"
            );
            return None;
        }

        let finished_game = self.game_number;
        let take = self.config.capacity.min(self.queue.len());
        self.players = self.queue.drain(..take).collect();
        self.teams = Teams::default();
        self.phase = Phase::Waiting;
        self.game_number += 1;

        let started = if self.players.len() == self.config.capacity {
            Some(self.start_game())
        } else {
            None
        };

        Some(Promotion {
            finished_game,
            promoted: take,
            still_waiting: self.queue.len(),
            started,
        })
    }

    /// Owned copy of the current state. `total_games` is left at 0; the
    /// manager fills it from the game log.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            players: self.players.clone(),
            phase: self.phase,
            teams: self.teams.clone(),
            player_count: self.players.len(),
            waiting_queue: self.queue.iter().cloned().collect(),
            waiting_count: self.queue.len(),
            game_number: self.game_number,
            capacity: self.config.capacity,
            total_games: 0,
        }
    }

    /// Whether a join would be admitted now, seated or queued.
    pub fn accepts_joins(&self) -> bool {
        self.phase == Phase::Waiting || self.config.queue_while_playing
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game_number(&self) -> u64 {
        self.game_number
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.queue.len()
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Waiting → Playing. Assigns teams and builds the archive record.
    fn start_game(&mut self) -> GameRecord {
        self.phase = Phase::Playing;
        self.teams = assign_teams(
            &mut self.players,
            self.config.traitor_count,
            self.config.split_policy,
            &mut self.rng,
        );

        let record = GameRecord {
            id: self.next_id(),
            timestamp: now_millis(),
            game_number: self.game_number,
            players: self.players.clone(),
            teams: self.teams.clone(),
            traitors: self.teams.traitor_ids(),
        };

        tracing::info!(
            game = self.game_number,
            players = self.players.len(),
            traitors = record.traitors.len(),
            "game started"
        );
        tracing::debug!(
            game = self.game_number,
            team1 = ?names(&self.teams.team1),
            team2 = ?names(&self.teams.team2),
            "teams assigned"
        );

        record
    }

    /// `base`, or `base` followed by the smallest integer ≥ 2 that no
    /// seated or queued player is using.
    fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.players
                .iter()
                .chain(self.queue.iter())
                .any(|p| p.name == candidate)
        };

        if !taken(base) {
            return base.to_owned();
        }
        let mut suffix = 2u64;
        loop {
            let candidate = format!("{base}{suffix}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Millisecond timestamp, serial number and a random tail, e.g.
    /// `18c2f4a9b10-0003-k2x9qa`.
    fn next_id(&mut self) -> String {
        self.serial += 1;
        let tail: String = (0..6)
            .map(|_| char::from(self.rng.sample(Alphanumeric)).to_ascii_lowercase())
            .collect();
        format!("{:x}-{:04x}-{tail}", now_millis(), self.serial)
    }
}

fn names(players: &[Player]) -> Vec<&str> {
    players.iter().map(|p| p.name.as_str()).collect()
}

/// Unix epoch milliseconds. A clock before 1970 reads as 0.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use turncoat_protocol::Team;

    use super::*;

    fn seeded() -> RoomConfig {
        RoomConfig {
            seed: Some(11),
            ..RoomConfig::default()
        }
    }

    fn fill(room: &mut Room, n: usize) -> Vec<Admission> {
        (1..=n)
            .map(|i| room.join(&format!("P{i}")).unwrap())
            .collect()
    }

    #[test]
    fn test_new_room_is_waiting_game_one() {
        let room = Room::new(seeded());
        assert_eq!(room.phase(), Phase::Waiting);
        assert_eq!(room.game_number(), 1);
        assert_eq!(room.player_count(), 0);
        assert_eq!(room.waiting_count(), 0);
    }

    #[test]
    fn test_join_seats_in_order() {
        let mut room = Room::new(seeded());
        fill(&mut room, 3);
        let names: Vec<_> = room.snapshot().players.into_iter().map(|p| p.name).collect();
        assert_eq!(names, ["P1", "P2", "P3"]);
    }

    #[test]
    fn test_blank_name_is_invalid() {
        let mut room = Room::new(seeded());
        assert!(matches!(room.join("   "), Err(RoomError::InvalidArgument(_))));
        assert!(matches!(room.join(""), Err(RoomError::InvalidArgument(_))));
        assert_eq!(room.player_count(), 0);
    }

    #[test]
    fn test_name_is_trimmed() {
        let mut room = Room::new(seeded());
        let a = room.join("  Alex ").unwrap();
        assert_eq!(a.player.name, "Alex");
    }

    #[test]
    fn test_duplicate_names_get_suffixes_from_two() {
        let mut room = Room::new(seeded());
        let a = room.join("Alex").unwrap();
        let b = room.join("Alex").unwrap();
        let c = room.join("Alex").unwrap();
        assert_eq!(a.player.name, "Alex");
        assert_eq!(b.player.name, "Alex2");
        assert_eq!(c.player.name, "Alex3");
    }

    #[test]
    fn test_suffix_skips_taken_candidates() {
        let mut room = Room::new(seeded());
        room.join("Alex").unwrap();
        room.join("Alex2").unwrap();
        let c = room.join("Alex").unwrap();
        assert_eq!(c.player.name, "Alex3");
    }

    #[test]
    fn test_name_frees_up_after_leave() {
        let mut room = Room::new(seeded());
        let a = room.join("Alex").unwrap();
        room.leave(&a.player.id);
        assert_eq!(room.join("Alex").unwrap().player.name, "Alex");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut room = Room::new(RoomConfig {
            capacity: 100,
            ..seeded()
        });
        let ids: HashSet<_> = fill(&mut room, 99).into_iter().map(|a| a.player.id).collect();
        assert_eq!(ids.len(), 99);
    }

    #[test]
    fn test_tenth_join_starts_game() {
        let mut room = Room::new(seeded());
        let admissions = fill(&mut room, 10);
        assert!(admissions[..9].iter().all(|a| a.started.is_none()));
        let record = admissions[9].started.as_ref().expect("10th join starts the game");

        assert_eq!(room.phase(), Phase::Playing);
        assert_eq!(record.game_number, 1);
        assert_eq!(record.traitors.len(), 4);

        let snap = room.snapshot();
        assert_eq!(snap.teams.team1.len(), 5);
        assert_eq!(snap.teams.team2.len(), 5);
        let all: HashSet<_> = snap.players.iter().map(|p| p.id.clone()).collect();
        let teamed: HashSet<_> = snap.teams.iter().map(|p| p.id.clone()).collect();
        assert_eq!(all, teamed);
        assert_eq!(snap.players.iter().filter(|p| p.is_traitor).count(), 4);
    }

    #[test]
    fn test_filling_join_returns_stamped_player() {
        let mut room = Room::new(seeded());
        let last = fill(&mut room, 10).pop().unwrap();
        assert_ne!(last.player.team, Team::Unassigned);
    }

    #[test]
    fn test_join_while_playing_is_busy_and_changes_nothing() {
        let mut room = Room::new(seeded());
        fill(&mut room, 10);
        let before = room.snapshot();

        let err = room.join("Late").unwrap_err();
        assert!(matches!(err, RoomError::RoomBusy(1)));
        assert_eq!(room.snapshot(), before);
    }

    #[test]
    fn test_queue_while_playing_enqueues_late_joiner() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);

        let late = room.join("P11").unwrap();
        assert_eq!(late.placement, Placement::Queued { position: 1 });
        assert_eq!(room.waiting_count(), 1);
        assert_eq!(room.player_count(), 10);
    }

    #[test]
    fn test_accepts_joins_follows_phase_and_queueing() {
        let mut strict = Room::new(seeded());
        assert!(strict.accepts_joins());
        fill(&mut strict, 10);
        assert!(!strict.accepts_joins());

        let mut queueing = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut queueing, 10);
        assert_eq!(queueing.phase(), Phase::Playing);
        assert!(queueing.accepts_joins());
        assert!(queueing.join("P11").is_ok());
    }

    #[test]
    fn test_queued_name_is_unique_against_seats() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);
        assert_eq!(room.join("P3").unwrap().player.name, "P32");
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut room = Room::new(seeded());
        let a = fill(&mut room, 3).remove(1);

        assert!(matches!(room.leave(&a.player.id), Departure::Seated(_)));
        let once = room.snapshot();
        assert_eq!(room.leave(&a.player.id), Departure::Absent);
        assert_eq!(room.snapshot(), once);
        assert_eq!(room.player_count(), 2);
    }

    #[test]
    fn test_leave_unknown_id_is_noop() {
        let mut room = Room::new(seeded());
        fill(&mut room, 2);
        let before = room.snapshot();
        assert_eq!(room.leave(&PlayerId::from("nope")), Departure::Absent);
        assert_eq!(room.snapshot(), before);
    }

    #[test]
    fn test_leave_during_game_keeps_teams() {
        let mut room = Room::new(seeded());
        let gone = fill(&mut room, 10).remove(0);
        room.leave(&gone.player.id);

        let snap = room.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.player_count, 9);
        assert_eq!(snap.teams.iter().count(), 10, "team lists keep the departed player");
    }

    #[test]
    fn test_leave_from_queue() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);
        let q = room.join("Q").unwrap();
        assert!(matches!(room.leave(&q.player.id), Departure::Queued(_)));
        assert_eq!(room.waiting_count(), 0);
    }

    #[test]
    fn test_reset_returns_to_waiting_and_bumps_game() {
        let mut room = Room::new(seeded());
        fill(&mut room, 10);

        let promo = room.reset(1).expect("current generation");
        assert_eq!(promo.finished_game, 1);
        assert_eq!(promo.promoted, 0);
        assert!(promo.started.is_none());

        let snap = room.snapshot();
        assert_eq!(snap.phase, Phase::Waiting);
        assert_eq!(snap.game_number, 2);
        assert!(snap.players.is_empty());
        assert!(snap.teams.is_empty());
    }

    #[test]
    fn test_stale_reset_is_noop() {
        let mut room = Room::new(seeded());
        fill(&mut room, 10);
        let before = room.snapshot();
        assert!(room.reset(7).is_none());
        assert_eq!(room.snapshot(), before);

        room.reset(1).unwrap();
        assert!(room.reset(1).is_none(), "second reset for the same game is ignored");
    }

    #[test]
    fn test_reset_while_waiting_is_noop() {
        let mut room = Room::new(seeded());
        fill(&mut room, 4);
        assert!(room.reset(1).is_none());
        assert_eq!(room.player_count(), 4);
    }

    #[test]
    fn test_reset_promotes_queue_front_in_order() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);
        let queued: Vec<_> = (1..=3)
            .map(|i| room.join(&format!("Q{i}")).unwrap().player)
            .collect();

        let promo = room.reset(1).unwrap();
        assert_eq!(promo.promoted, 3);
        assert_eq!(promo.still_waiting, 0);
        assert_eq!(room.snapshot().players, queued);
    }

    #[test]
    fn test_reset_with_full_queue_chains_into_next_game() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);
        let queued: Vec<_> = (1..=12)
            .map(|i| room.join(&format!("Q{i}")).unwrap().player.id)
            .collect();

        let promo = room.reset(1).unwrap();
        assert_eq!(promo.promoted, 10);
        assert_eq!(promo.still_waiting, 2);
        let record = promo.started.expect("a full promotion starts game 2");
        assert_eq!(record.game_number, 2);

        let snap = room.snapshot();
        assert_eq!(snap.phase, Phase::Playing);
        assert_eq!(snap.game_number, 2);
        let seated: Vec<_> = snap.players.iter().map(|p| p.id.clone()).collect();
        assert_eq!(seated, queued[..10]);
        let waiting: Vec<_> = snap.waiting_queue.iter().map(|p| p.id.clone()).collect();
        assert_eq!(waiting, queued[10..]);
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        for i in 0..35 {
            let _ = room.join(&format!("N{i}"));
            assert!(room.player_count() <= 10);
        }
        assert_eq!(room.waiting_count(), 25);
    }

    #[test]
    fn test_player_in_at_most_one_container() {
        let mut room = Room::new(RoomConfig {
            queue_while_playing: true,
            ..seeded()
        });
        fill(&mut room, 10);
        for i in 0..5 {
            room.join(&format!("Q{i}")).unwrap();
        }
        room.reset(1).unwrap();
        let snap = room.snapshot();
        let seated: HashSet<_> = snap.players.iter().map(|p| &p.id).collect();
        assert!(snap.waiting_queue.iter().all(|p| !seated.contains(&p.id)));
    }

    #[test]
    fn test_starting_at_continues_numbering() {
        let room = Room::starting_at(seeded(), 42);
        assert_eq!(room.game_number(), 42);
        assert_eq!(Room::starting_at(seeded(), 0).game_number(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut room = Room::new(seeded());
        fill(&mut room, 2);
        let mut snap = room.snapshot();
        snap.players.clear();
        snap.player_count = 0;
        assert_eq!(room.player_count(), 2);
        assert_eq!(room.snapshot().players.len(), 2);
    }
}
