//! Research formatting.
//!
//! Renders a [`MatchupSummary`] bundle into a compact text block for
//! model prompts and human review. Kept much shorter than a raw data
//! dump — records, splits, form, and the top few injuries only.

use crate::types::{MatchupSummary, TeamSummary};

/// Maximum injuries listed per team.
const MAX_INJURIES: usize = 3;

/// Maximum recent results listed per team.
const MAX_RECENT: usize = 3;

/// Sentinel text used when no research could be gathered at all.
pub fn unavailable(home_team: &str, away_team: &str) -> String {
    format!("Research unavailable. Analyzing {away_team} @ {home_team} based on odds only.")
}

/// Format a matchup bundle as a concise context block.
///
/// Falls back to a short "limited data" sentinel when neither team
/// produced any data — never an error.
pub fn format_matchup(matchup: &MatchupSummary) -> String {
    let home = &matchup.home;
    let away = &matchup.away;

    if !home.has_data() && !away.has_data() {
        return format!(
            "Limited data available for {} @ {}. Analyze based on odds.",
            away.name, home.name,
        );
    }

    let mut lines = vec![format!("=== MATCHUP: {} @ {} ===", away.name, home.name), String::new()];

    lines.push(format!("HOME ({}):", home.name));
    push_team_block(&mut lines, home, true);

    lines.push(String::new());
    lines.push(format!("AWAY ({}):", away.name));
    push_team_block(&mut lines, away, false);

    let recent: Vec<String> = home
        .recent_games
        .iter()
        .take(MAX_RECENT)
        .map(|g| format!("  {}: {}", home.name, g))
        .chain(
            away.recent_games
                .iter()
                .take(MAX_RECENT)
                .map(|g| format!("  {}: {}", away.name, g)),
        )
        .collect();

    if !recent.is_empty() {
        lines.push(String::new());
        lines.push("RECENT RESULTS:".to_string());
        lines.extend(recent);
    }

    lines.join("\n")
}

fn push_team_block(lines: &mut Vec<String>, team: &TeamSummary, home_side: bool) {
    if let Some(record) = &team.record {
        lines.push(format!(
            "  Record: {}-{} ({:.1}%)",
            record.wins,
            record.losses,
            record.win_pct * 100.0,
        ));
        let split = if home_side { &record.home_record } else { &record.away_record };
        if let Some(split) = split {
            let label = if home_side { "Home" } else { "Away" };
            lines.push(format!("  {label} Record: {split}"));
        }
        lines.push(format!("  Point Diff: {:+.1}", record.point_diff));
    }

    if let Some(form) = team.recent_form() {
        lines.push(format!("  Last {} Form: {:.0}%", team.recent_games.len(), form * 100.0));
    }

    lines.push(format!("  Key Injuries Out: {}", team.injuries_out()));
    if !team.injuries.is_empty() {
        let detail = team
            .injuries
            .iter()
            .take(MAX_INJURIES)
            .map(|i| format!("{} ({})", i.player, i.status))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  Injuries: {detail}"));
    }

    if let Some(headline) = team.news.first() {
        lines.push(format!("  News: {}", headline.title));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
