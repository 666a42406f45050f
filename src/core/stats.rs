//! Dashboard figures derived from the state. Days are UTC calendar days.

use crate::models::records::{day_key, parse_date_text};
use crate::models::{AppState, Challenge, Profile};
use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::HashSet;

/// Moods offered by the daily check-in
pub const MOODS: [&str; 4] = ["Happy", "Romantic", "Calm", "Wild"];

/// Sum of the points of completed challenges
#[must_use]
pub fn challenge_score(challenges: &[Challenge]) -> u32 {
    challenges
        .iter()
        .filter(|c| c.done)
        .map(|c| c.points)
        .sum()
}

fn day_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// Days on which anything happened: notes, plans and memories created,
/// challenges completed.
#[must_use]
pub fn activity_days(state: &AppState) -> HashSet<NaiveDate> {
    let notes = state.notes.iter().map(|n| day_of(n.created_at));
    let plans = state.plans.iter().map(|p| day_of(p.created_at));
    let memories = state.memories.iter().map(|m| day_of(m.created_at));
    let challenges = state
        .challenges
        .iter()
        .filter(|c| c.done)
        .filter_map(|c| c.completed_at.map(day_of));

    notes.chain(plans).chain(memories).chain(challenges).collect()
}

/// Consecutive active days ending with `today`; zero if today had no activity.
#[must_use]
pub fn activity_streak(state: &AppState, today: NaiveDate) -> u32 {
    let days = activity_days(state);
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor.filter(|d| days.contains(d)) {
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

/// Whole days since the anniversary, or `None` if it is unset or in the future.
#[must_use]
pub fn days_together(anniversary: &str, today: NaiveDate) -> Option<i64> {
    let start = parse_date_text(anniversary)?.date_naive();
    let days = (today - start).num_days();
    (days >= 0).then_some(days)
}

/// Mood logged for `today`, if any
#[must_use]
pub fn today_mood(profile: &Profile, today: NaiveDate) -> Option<&str> {
    profile.mood_log.get(&day_key(today)).map(String::as_str)
}

/// Whether to show the partner onboarding prompt
#[must_use]
pub const fn needs_partner_onboarding(profile: &Profile) -> bool {
    !profile.onboarding_seen && profile.couple_id.is_none()
}
