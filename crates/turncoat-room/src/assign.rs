//! Team and traitor assignment for a full room.
//!
//! The steps, in order:
//!
//! 1. Shuffle the seating order (Fisher-Yates, via [`SliceRandom::shuffle`]).
//! 2. Draw `traitor_count` distinct positions uniformly without replacement
//!    and flag those players.
//! 3. Split into two equal teams according to the [`SplitPolicy`].
//! 4. Shuffle each team's display order.
//! 5. Stamp the team number on every player.
//!
//! Join order never influences the outcome: the first shuffle erases it.

use rand::Rng;
use rand::seq::{SliceRandom, index};
use turncoat_protocol::{Player, Team, Teams};

use crate::SplitPolicy;

/// Assigns traitors and teams to `players` in place and returns the teams.
///
/// `players` keeps its join order; only `is_traitor` and `team` change.
/// The returned [`Teams`] hold copies of the stamped records.
///
/// `players.len()` must be even and `traitor_count` must fit the policy
/// (see [`RoomConfig::validated`](crate::RoomConfig::validated)).
pub fn assign_teams<R: Rng + ?Sized>(
    players: &mut [Player],
    traitor_count: usize,
    policy: SplitPolicy,
    rng: &mut R,
) -> Teams {
    let n = players.len();
    let half = n / 2;
    debug_assert!(n % 2 == 0, "assignment needs an even number of players");
    let traitor_count = traitor_count.min(n);

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    for pos in index::sample(rng, n, traitor_count) {
        players[order[pos]].is_traitor = true;
    }

    let (mut team1, mut team2) = match policy {
        SplitPolicy::Positional => {
            let team2 = order.split_off(half);
            (order, team2)
        }
        SplitPolicy::Balanced => {
            let (mut traitors, mut regulars): (Vec<usize>, Vec<usize>) =
                order.iter().partition(|&&i| players[i].is_traitor);
            traitors.shuffle(rng);
            regulars.shuffle(rng);

            let traitors1 = (traitor_count / 2).min(half);
            let regulars1 = half - traitors1;

            let traitors2 = traitors.split_off(traitors1);
            let regulars2 = regulars.split_off(regulars1.min(regulars.len()));

            let mut team1 = traitors;
            team1.extend(regulars);
            let mut team2 = traitors2;
            team2.extend(regulars2);
            (team1, team2)
        }
    };

    team1.shuffle(rng);
    team2.shuffle(rng);

    for &i in &team1 {
        players[i].team = Team::One;
    }
    for &i in &team2 {
        players[i].team = Team::Two;
    }

    Teams {
        team1: team1.iter().map(|&i| players[i].clone()).collect(),
        team2: team2.iter().map(|&i| players[i].clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use turncoat_protocol::PlayerId;

    use super::*;

    fn room_of(n: usize) -> Vec<Player> {
        (1..=n)
            .map(|i| Player::new(PlayerId(format!("id{i}")), format!("P{i}"), i as u64))
            .collect()
    }

    fn ids(players: &[Player]) -> HashSet<PlayerId> {
        players.iter().map(|p| p.id.clone()).collect()
    }

    #[test]
    fn test_balanced_split_gives_five_and_five() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = room_of(10);
        let teams = assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);

        assert_eq!(teams.team1.len(), 5);
        assert_eq!(teams.team2.len(), 5);

        let t1 = ids(&teams.team1);
        let t2 = ids(&teams.team2);
        assert!(t1.is_disjoint(&t2));
        let union: HashSet<_> = t1.union(&t2).cloned().collect();
        assert_eq!(union, ids(&players));
    }

    #[test]
    fn test_balanced_split_puts_half_the_traitors_on_each_team() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let mut players = room_of(10);
            let teams = assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);
            assert_eq!(teams.team1.iter().filter(|p| p.is_traitor).count(), 2);
            assert_eq!(teams.team2.iter().filter(|p| p.is_traitor).count(), 2);
            assert_eq!(players.iter().filter(|p| p.is_traitor).count(), 4);
        }
    }

    #[test]
    fn test_positional_split_marks_exact_traitor_count() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let mut players = room_of(10);
            let teams = assign_teams(&mut players, 2, SplitPolicy::Positional, &mut rng);
            assert_eq!(teams.team1.len(), 5);
            assert_eq!(teams.team2.len(), 5);
            assert_eq!(teams.traitor_ids().len(), 2);
            assert!(ids(&teams.team1).is_disjoint(&ids(&teams.team2)));
        }
    }

    #[test]
    fn test_stamps_match_team_lists() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut players = room_of(10);
        let teams = assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);

        assert!(teams.team1.iter().all(|p| p.team == Team::One));
        assert!(teams.team2.iter().all(|p| p.team == Team::Two));
        for p in &players {
            assert_ne!(p.team, Team::Unassigned);
            let copy = teams.iter().find(|c| c.id == p.id).unwrap();
            assert_eq!(copy, p);
        }
    }

    #[test]
    fn test_room_keeps_join_order() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut players = room_of(10);
        assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);
        let names: Vec<_> = players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8", "P9", "P10"]
        );
    }

    #[test]
    fn test_assignments_vary_between_runs() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut seen = HashSet::new();
        for _ in 0..20 {
            let mut players = room_of(10);
            let teams = assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);
            let mut team1: Vec<_> = teams.team1.iter().map(|p| p.id.clone()).collect();
            team1.sort();
            let mut traitors = teams.traitor_ids();
            traitors.sort();
            seen.insert((team1, traitors));
        }
        assert!(seen.len() > 1, "assignment should not repeat every run");
    }

    #[test]
    fn test_every_player_can_be_traitor_and_on_either_team() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut traitor = HashSet::new();
        let mut on_team1 = HashSet::new();
        let mut on_team2 = HashSet::new();
        for _ in 0..2000 {
            let mut players = room_of(10);
            let teams = assign_teams(&mut players, 4, SplitPolicy::Balanced, &mut rng);
            traitor.extend(teams.traitor_ids());
            on_team1.extend(ids(&teams.team1));
            on_team2.extend(ids(&teams.team2));
        }
        let all = ids(&room_of(10));
        assert_eq!(traitor, all);
        assert_eq!(on_team1, all);
        assert_eq!(on_team2, all);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let mut a = room_of(10);
        let mut b = room_of(10);
        let ta = assign_teams(&mut a, 4, SplitPolicy::Balanced, &mut StdRng::seed_from_u64(42));
        let tb = assign_teams(&mut b, 4, SplitPolicy::Balanced, &mut StdRng::seed_from_u64(42));
        assert_eq!(ta, tb);
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_traitors() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut players = room_of(4);
        let teams = assign_teams(&mut players, 0, SplitPolicy::Balanced, &mut rng);
        assert!(teams.traitor_ids().is_empty());
        assert_eq!(teams.team1.len(), 2);
        assert_eq!(teams.team2.len(), 2);
    }
}
