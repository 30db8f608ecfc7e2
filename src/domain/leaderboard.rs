// src/domain/leaderboard.rs

use chrono::{DateTime, Duration, Utc};

use crate::models::leaderboard::LeaderboardEntry;

/// Number of entries a leaderboard returns.
pub const LEADERBOARD_SIZE: usize = 50;

/// Time window a leaderboard is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Overall,
    Daily,
    Weekly,
}

impl Period {
    /// Matches exactly; anything else, `WEEKLY` included, falls back to `Overall`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("daily") => Period::Daily,
            Some("weekly") => Period::Weekly,
            _ => Period::Overall,
        }
    }

    /// Earliest score timestamp that counts, or `None` for all-time totals.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Overall => None,
            Period::Daily => Some(now - Duration::days(1)),
            Period::Weekly => Some(now - Duration::weeks(1)),
        }
    }
}

/// Orders standings by points descending, lower user id first on ties, and keeps the top `limit`.
pub fn rank(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.total_points.cmp(&a.total_points).then(a.id.cmp(&b.id)));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, points: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            id,
            username: format!("player{id}"),
            avatar_url: None,
            total_points: points,
            badges: Vec::new(),
        }
    }

    #[test]
    fn ranks_descending_with_id_tie_break() {
        let ranked = rank(vec![entry(3, 10), entry(1, 30), entry(2, 10), entry(4, 0)], 50);
        let ids: Vec<i64> = ranked.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn truncates_to_limit() {
        let entries = (1..=80).map(|id| entry(id, id * 3)).collect();
        let ranked = rank(entries, LEADERBOARD_SIZE);
        assert_eq!(ranked.len(), 50);
        assert_eq!(ranked[0].id, 80);
        assert!(ranked.windows(2).all(|w| w[0].total_points >= w[1].total_points));
    }

    #[test]
    fn zero_point_players_are_kept() {
        let ranked = rank(vec![entry(1, 0), entry(2, 0)], 50);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn period_parsing_falls_back_to_overall() {
        assert_eq!(Period::parse(Some("daily")), Period::Daily);
        assert_eq!(Period::parse(Some("weekly")), Period::Weekly);
        assert_eq!(Period::parse(Some("WEEKLY")), Period::Overall);
        assert_eq!(Period::parse(Some(" daily")), Period::Overall);
        assert_eq!(Period::parse(Some("monthly")), Period::Overall);
        assert_eq!(Period::parse(None), Period::Overall);
    }

    #[test]
    fn window_start_offsets() {
        let now = Utc::now();
        assert_eq!(Period::Overall.window_start(now), None);
        assert_eq!(Period::Daily.window_start(now), Some(now - Duration::hours(24)));
        assert_eq!(Period::Weekly.window_start(now), Some(now - Duration::days(7)));
    }
}
