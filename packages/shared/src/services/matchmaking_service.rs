use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::matchmaking::{
    GameMatch, MatchStatus, QueueEntry, QueueMode, QueueStats,
};
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;

/// Skill-based pairing engine. Owns the per-mode waiting queues and the
/// match table; queue entries live here until matched or withdrawn.
///
/// A pairing pass sorts the queue by rating and matches the first
/// adjacent pair within the threshold, so formed pairs always satisfy
/// `|rating_a - rating_b| <= threshold`. One match per enqueue call.
pub struct MatchmakingService {
    queues: Mutex<HashMap<QueueMode, Vec<QueueEntry>>>,
    matches: Mutex<HashMap<String, GameMatch>>,
    rating_threshold: i32,
}

impl MatchmakingService {
    pub fn new(rating_threshold: i32) -> Self {
        MatchmakingService {
            queues: Mutex::new(HashMap::new()),
            matches: Mutex::new(HashMap::new()),
            rating_threshold,
        }
    }

    /// Appends the entry and runs one pairing pass. `None` is the
    /// expected steady state while waiting, not an error.
    pub async fn enqueue(&self, entry: QueueEntry, mode: QueueMode) -> Option<GameMatch> {
        let formed = {
            let mut queues = self.queues.lock().await;
            let queue = queues.entry(mode).or_default();

            info!(
                player_id = %entry.player_id,
                rating = entry.rating,
                %mode,
                queue_size = queue.len() + 1,
                "player queued"
            );
            queue.push(entry);

            if queue.len() < 2 {
                return None;
            }

            queue.sort_by_key(|e| e.rating);

            let mut formed = None;
            for i in 0..queue.len() - 1 {
                if (queue[i + 1].rating - queue[i].rating).abs() <= self.rating_threshold {
                    let player2 = queue.remove(i + 1);
                    let player1 = queue.remove(i);
                    formed = Some(GameMatch::new(mode, player1, player2));
                    break;
                }
            }
            formed
        }?;

        info!(
            match_id = %formed.id,
            %mode,
            player1 = %formed.players[0].player_id,
            player2 = %formed.players[1].player_id,
            "match formed"
        );

        let mut matches = self.matches.lock().await;
        matches.insert(formed.id.clone(), formed.clone());
        Some(formed)
    }

    /// Withdraws a player before they are matched. Returns whether an
    /// entry was actually removed.
    pub async fn dequeue(&self, player_id: &str, mode: QueueMode) -> bool {
        let mut queues = self.queues.lock().await;
        let queue = queues.entry(mode).or_default();
        let before = queue.len();
        queue.retain(|e| e.player_id != player_id);
        let removed = queue.len() < before;
        if removed {
            debug!(player_id, %mode, "player left queue");
        }
        removed
    }

    /// Active -> Completed, with results. Completed is terminal; ending
    /// a finished match is an error, the match is never revived.
    pub async fn end_match(
        &self,
        match_id: &str,
        results: serde_json::Value,
    ) -> Result<GameMatch, MatchmakingServiceError> {
        let mut matches = self.matches.lock().await;
        let game_match = matches
            .get_mut(match_id)
            .ok_or(MatchmakingServiceError::MatchNotFound)?;

        if game_match.status == MatchStatus::Completed {
            return Err(MatchmakingServiceError::MatchAlreadyCompleted);
        }

        game_match.status = MatchStatus::Completed;
        game_match.end_time = Some(Utc::now());
        game_match.results = Some(results);

        info!(match_id, "match completed");
        Ok(game_match.clone())
    }

    pub async fn get_match(&self, match_id: &str) -> Option<GameMatch> {
        self.matches.lock().await.get(match_id).cloned()
    }

    /// Operational monitoring: queue length, average wait, and the top
    /// ten ratings (descending). Never consulted for pairing.
    pub async fn queue_stats(&self, mode: QueueMode) -> QueueStats {
        let queues = self.queues.lock().await;
        let queue = queues.get(&mode).map(Vec::as_slice).unwrap_or(&[]);

        let avg_wait_ms = if queue.is_empty() {
            0
        } else {
            let now = Utc::now();
            let total: i64 = queue
                .iter()
                .map(|e| (now - e.queued_at).num_milliseconds())
                .sum();
            total / queue.len() as i64
        };

        let mut top_ratings: Vec<i32> = queue.iter().map(|e| e.rating).collect();
        top_ratings.sort_unstable_by(|a, b| b.cmp(a));
        top_ratings.truncate(10);

        QueueStats {
            mode,
            queue_size: queue.len(),
            avg_wait_ms,
            top_ratings,
        }
    }
}
