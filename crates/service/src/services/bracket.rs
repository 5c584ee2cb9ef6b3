//! Single-elimination bracket built from tournament registrations.
//!
//! Entrants are ranked by explicit seed, then by registration time. The
//! draw uses standard seeding (1 meets the lowest seed, 1 and 2 can only
//! meet in the final) and byes go to the top seeds when the field is not a
//! power of two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Entrant {
    pub player_id: Uuid,
    pub name: String,
    pub seed: Option<i32>,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub seed: u32,
    pub player_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub number: u32,
    pub home: Option<Slot>,
    pub away: Option<Slot>,
    /// One side is empty in round one; the other side advances.
    pub bye: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub name: String,
    pub matches: Vec<BracketMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: Uuid,
    pub entrants: u32,
    /// Field size rounded up to a power of two.
    pub size: u32,
    pub rounds: Vec<Round>,
}

/// Seed order for a bracket of `size` (a power of two).
///
/// ```
/// assert_eq!(service::services::bracket::seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
/// ```
pub fn seed_order(size: u32) -> Vec<u32> {
    let mut order = vec![1];
    while (order.len() as u32) < size {
        let next = order.len() as u32 * 2 + 1;
        order = order.iter().flat_map(|&s| [s, next - s]).collect();
    }
    order
}

pub fn round_name(matches_in_round: usize) -> String {
    match matches_in_round {
        1 => "Final".to_string(),
        2 => "Semifinal".to_string(),
        4 => "Quarterfinal".to_string(),
        n => format!("Round of {}", n * 2),
    }
}

pub fn build(tournament_id: Uuid, mut entrants: Vec<Entrant>) -> Bracket {
    entrants.sort_by(|a, b| {
        let seed = |e: &Entrant| e.seed.filter(|s| *s > 0).map(i64::from).unwrap_or(i64::MAX);
        seed(a).cmp(&seed(b)).then(a.registered_at.cmp(&b.registered_at))
    });
    let seeded: Vec<Slot> = entrants
        .into_iter()
        .enumerate()
        .map(|(i, e)| Slot { seed: i as u32 + 1, player_id: e.player_id, name: e.name })
        .collect();

    let count = seeded.len() as u32;
    if count == 0 {
        return Bracket { tournament_id, entrants: 0, size: 0, rounds: Vec::new() };
    }
    let size = count.max(2).next_power_of_two();
    let slot = |seed: u32| seeded.get(seed as usize - 1).cloned();

    let order = seed_order(size);
    let first: Vec<BracketMatch> = order
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let (home, away) = (slot(pair[0]), slot(pair[1]));
            let bye = home.is_none() != away.is_none();
            BracketMatch { number: i as u32 + 1, home, away, bye }
        })
        .collect();

    // Bye winners are already known and appear in round two.
    let mut advancing: Vec<Option<Slot>> = first
        .iter()
        .map(|m| if m.bye { m.home.clone().or_else(|| m.away.clone()) } else { None })
        .collect();

    let mut rounds = vec![Round { number: 1, name: round_name(first.len()), matches: first }];
    let mut number = 1;
    while advancing.len() > 1 {
        number += 1;
        let matches: Vec<BracketMatch> = advancing
            .chunks(2)
            .enumerate()
            .map(|(i, pair)| BracketMatch { number: i as u32 + 1, home: pair[0].clone(), away: pair[1].clone(), bye: false })
            .collect();
        advancing = vec![None; matches.len()];
        rounds.push(Round { number, name: round_name(matches.len()), matches });
    }

    Bracket { tournament_id, entrants: count, size, rounds }
}
