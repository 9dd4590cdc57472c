// src/services/stats.rs

//! Practice analytics computed from a user's completed sessions.
//! Everything here is pure; the caller supplies sessions, topics and "now".

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::{
    config::{RECENT_SESSIONS_LIMIT, STRONG_TOPIC_ACCURACY, TOPIC_SLICE, WEAK_TOPIC_ACCURACY},
    models::{
        practice_session::PracticeSession,
        stats::{RecentSession, TopicAccuracy, TopicAnalysis, UserStats},
    },
};

/// Counts consecutive days with at least one completed session, walking back
/// from the calendar day of `now`.
///
/// The walk always starts at today: no session today means a streak of 0, even
/// if yesterday ended a long run. Days are taken in the timezone of `now`.
pub fn calculate_study_streak<Tz: TimeZone>(sessions: &[PracticeSession], now: &DateTime<Tz>) -> u32 {
    let tz = now.timezone();
    let active_days: HashSet<NaiveDate> = sessions
        .iter()
        .filter_map(|s| s.completed_at)
        .map(|at| at.with_timezone(&tz).date_naive())
        .collect();

    let mut streak = 0;
    let mut day = now.date_naive();
    while active_days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }
    streak
}

/// Per-topic accuracy over every question attempt, highest first.
///
/// Attempts whose question has no known topic are ignored, as are topics with
/// zero accuracy. Ties keep the order in which topics were first seen.
pub fn topic_accuracies(
    sessions: &[PracticeSession],
    topics_by_question: &HashMap<i64, String>,
) -> Vec<TopicAccuracy> {
    // (topic, correct, total) in first-seen order
    let mut tally: Vec<(&str, u32, u32)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for attempt in sessions.iter().flat_map(|s| s.questions.iter()) {
        let Some(topic) = topics_by_question.get(&attempt.question_id) else {
            continue;
        };
        let slot = *index.entry(topic.as_str()).or_insert_with(|| {
            tally.push((topic.as_str(), 0, 0));
            tally.len() - 1
        });
        tally[slot].2 += 1;
        if attempt.is_correct() {
            tally[slot].1 += 1;
        }
    }

    let mut accuracies: Vec<TopicAccuracy> = tally
        .into_iter()
        .map(|(topic, correct, total)| TopicAccuracy {
            topic: topic.to_string(),
            accuracy: f64::from(correct) / f64::from(total) * 100.0,
        })
        .filter(|t| t.accuracy > 0.0)
        .collect();

    accuracies.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    accuracies
}

/// Strong topics come from the top of the ranking, weak ones from the bottom.
pub fn analyze_topics(
    sessions: &[PracticeSession],
    topics_by_question: &HashMap<i64, String>,
) -> TopicAnalysis {
    let ranked = topic_accuracies(sessions, topics_by_question);

    let strong = ranked
        .iter()
        .take(TOPIC_SLICE)
        .filter(|t| t.accuracy >= STRONG_TOPIC_ACCURACY)
        .map(|t| t.topic.clone())
        .collect();

    let weak = ranked[ranked.len().saturating_sub(TOPIC_SLICE)..]
        .iter()
        .filter(|t| t.accuracy < WEAK_TOPIC_ACCURACY)
        .map(|t| t.topic.clone())
        .collect();

    TopicAnalysis { strong, weak }
}

/// Builds the stats view from completed sessions ordered newest first.
pub fn build_user_stats<Tz: TimeZone>(
    sessions: &[PracticeSession],
    topics_by_question: &HashMap<i64, String>,
    now: &DateTime<Tz>,
) -> UserStats {
    let completed = sessions.len() as u32;
    let total_questions = sessions.iter().map(|s| s.total_questions).sum();
    let average_score = if completed > 0 {
        let total: u64 = sessions.iter().map(|s| u64::from(s.score)).sum();
        (total as f64 / f64::from(completed)).round() as u32
    } else {
        0
    };

    let topics = analyze_topics(sessions, topics_by_question);

    UserStats {
        practice_sessions_completed: completed,
        total_questions_answered: total_questions,
        average_score,
        study_streak: calculate_study_streak(sessions, now),
        recent_sessions: sessions
            .iter()
            .take(RECENT_SESSIONS_LIMIT)
            .map(RecentSession::from)
            .collect(),
        weak_topics: topics.weak,
        strong_topics: topics.strong,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::practice_session::{QuestionAttempt, SessionType};
    use chrono::{Duration, TimeZone, Utc};

    fn completed_at(at: DateTime<Utc>, score: u32) -> PracticeSession {
        let mut s = PracticeSession::new(
            1,
            "JAMB",
            &["Mathematics".to_string()],
            SessionType::Practice,
            None,
            1800,
            &[],
            at,
        );
        s.is_completed = true;
        s.completed_at = Some(at);
        s.score = score;
        s
    }

    fn noon_today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn attempt(question_id: i64, correct: bool) -> QuestionAttempt {
        QuestionAttempt {
            question_id,
            user_answer: Some("A".to_string()),
            correct_answer: "A".to_string(),
            is_correct: Some(correct),
            time_spent: 10,
            skipped: false,
        }
    }

    /// A session with `correct` right answers out of `total` on questions
    /// starting at `first_id`.
    fn session_with_attempts(first_id: i64, correct: usize, total: usize) -> PracticeSession {
        let mut s = completed_at(noon_today(), 0);
        s.questions = (0..total)
            .map(|i| attempt(first_id + i as i64, i < correct))
            .collect();
        s.total_questions = total as u32;
        s
    }

    fn topics(entries: &[(std::ops::Range<i64>, &str)]) -> HashMap<i64, String> {
        let mut map = HashMap::new();
        for (range, topic) in entries {
            for id in range.clone() {
                map.insert(id, topic.to_string());
            }
        }
        map
    }

    #[test]
    fn test_streak_requires_activity_today() {
        let now = noon_today();
        let sessions = vec![
            completed_at(now - Duration::days(1), 50),
            completed_at(now - Duration::days(2), 50),
        ];
        assert_eq!(calculate_study_streak(&sessions, &now), 0);
    }

    #[test]
    fn test_streak_counts_today_and_yesterday() {
        let now = noon_today();
        let sessions = vec![
            completed_at(now - Duration::hours(2), 50),
            completed_at(now - Duration::days(1), 50),
        ];
        assert_eq!(calculate_study_streak(&sessions, &now), 2);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let now = noon_today();
        let only_old = vec![completed_at(now - Duration::days(3), 50)];
        assert_eq!(calculate_study_streak(&only_old, &now), 0);

        let with_gap = vec![
            completed_at(now, 50),
            completed_at(now - Duration::days(2), 50),
            completed_at(now - Duration::days(3), 50),
        ];
        assert_eq!(calculate_study_streak(&with_gap, &now), 1);
    }

    #[test]
    fn test_streak_truncates_time_of_day() {
        let now = noon_today();
        let start_of_day = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap();
        let late_yesterday = Utc.with_ymd_and_hms(2024, 3, 14, 23, 59, 59).unwrap();
        let sessions = vec![
            completed_at(start_of_day, 80),
            completed_at(start_of_day + Duration::minutes(5), 80),
            completed_at(late_yesterday, 80),
        ];
        assert_eq!(calculate_study_streak(&sessions, &now), 2);
    }

    #[test]
    fn test_streak_ignores_uncompleted() {
        let now = noon_today();
        let mut s = completed_at(now, 50);
        s.completed_at = None;
        assert_eq!(calculate_study_streak(&[s], &now), 0);
        assert_eq!(calculate_study_streak(&[], &now), 0);
    }

    #[test]
    fn test_topic_strong_and_weak() {
        // Algebra: ids 1..=10, 8 correct. Geometry: ids 11..=20, 2 correct.
        let sessions = vec![
            session_with_attempts(1, 8, 10),
            session_with_attempts(11, 2, 10),
        ];
        let map = topics(&[(1..11, "Algebra"), (11..21, "Geometry")]);

        let analysis = analyze_topics(&sessions, &map);
        assert_eq!(analysis.strong, vec!["Algebra".to_string()]);
        assert_eq!(analysis.weak, vec!["Geometry".to_string()]);
    }

    #[test]
    fn test_topic_zero_accuracy_is_dropped() {
        let sessions = vec![session_with_attempts(1, 0, 4), session_with_attempts(5, 1, 4)];
        let map = topics(&[(1..5, "Optics"), (5..9, "Waves")]);

        let ranked = topic_accuracies(&sessions, &map);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].topic, "Waves");
        assert_eq!(ranked[0].accuracy, 25.0);
    }

    #[test]
    fn test_topic_unresolved_questions_are_skipped() {
        let sessions = vec![session_with_attempts(1, 3, 4)];
        // Only question 1 resolves.
        let map = topics(&[(1..2, "Algebra")]);

        let ranked = topic_accuracies(&sessions, &map);
        assert_eq!(ranked, vec![TopicAccuracy { topic: "Algebra".into(), accuracy: 100.0 }]);
    }

    #[test]
    fn test_topic_slices_take_three_from_each_end() {
        // Five topics of 10 questions each: 90%, 80%, 75%, 50%, 10%.
        let corrects = [9, 8, 7, 5, 1];
        let names = ["A", "B", "C", "D", "E"];
        let mut sessions = Vec::new();
        let mut entries = Vec::new();
        for (i, (correct, name)) in corrects.iter().zip(names).enumerate() {
            let first = (i as i64) * 10 + 1;
            sessions.push(session_with_attempts(first, *correct, 10));
            entries.push((first..first + 10, name));
        }
        let map = topics(&entries);

        let analysis = analyze_topics(&sessions, &map);
        assert_eq!(analysis.strong, vec!["A", "B", "C"]);
        // Bottom three are C (70), D (50), E (10); C is not weak.
        assert_eq!(analysis.weak, vec!["D", "E"]);
    }

    #[test]
    fn test_topic_ties_keep_first_seen_order() {
        let sessions = vec![session_with_attempts(1, 1, 2), session_with_attempts(3, 1, 2)];
        let map = topics(&[(1..3, "Second"), (3..5, "First")]);

        let ranked = topic_accuracies(&sessions, &map);
        let order: Vec<&str> = ranked.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(order, vec!["Second", "First"]);
    }

    #[test]
    fn test_build_user_stats() {
        let now = noon_today();
        let sessions: Vec<PracticeSession> = (0..7)
            .map(|day| {
                let mut s = completed_at(now - Duration::days(day), 60 + day as u32);
                s.id = 100 - day;
                s.total_questions = 10;
                s
            })
            .collect();

        let stats = build_user_stats(&sessions, &HashMap::new(), &now);

        assert_eq!(stats.practice_sessions_completed, 7);
        assert_eq!(stats.total_questions_answered, 70);
        // mean of 60..=66
        assert_eq!(stats.average_score, 63);
        assert_eq!(stats.study_streak, 7);
        assert_eq!(stats.recent_sessions.len(), 5);
        assert_eq!(stats.recent_sessions[0].id, 100);
        assert!(stats.strong_topics.is_empty());
        assert!(stats.weak_topics.is_empty());
    }

    #[test]
    fn test_build_user_stats_empty() {
        let stats = build_user_stats(&[], &HashMap::new(), &noon_today());
        assert_eq!(stats.practice_sessions_completed, 0);
        assert_eq!(stats.average_score, 0);
        assert_eq!(stats.study_streak, 0);
        assert!(stats.recent_sessions.is_empty());
    }
}
