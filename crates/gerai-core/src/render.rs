//! Chat-facing text for snapshots and outcomes.
//!
//! Snapshot text is Telegram legacy Markdown; outcome replies are plain text.

use crate::admin::AdminOutcome;
use crate::clock::Timestamp;
use crate::hours::OperatingHours;
use crate::registry::Stall;
use crate::status::StatusSnapshot;
use crate::subscribers::{SubscribeOutcome, UnsubscribeOutcome};
use crate::voting::{VoteOutcome, VOTE_STALENESS_MINUTES};

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format("%d/%m/%Y, %I:%M:%S %p").to_string()
}

/// Escape the characters legacy Markdown treats as entity markers.
pub fn escape_markdown(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn state_label(open: bool) -> &'static str {
    if open {
        "Open 🟢"
    } else {
        "Closed 🔴"
    }
}

pub fn render_snapshot(snapshot: &StatusSnapshot) -> String {
    if !snapshot.within_hours {
        let mut msg = String::from("⏰ *Outside Operating Hours*\nAll gerai are closed.\n\n");
        msg.push_str(&format!("Operating Hours: {}\n\n", snapshot.hours.label()));
        for stall in &snapshot.stalls {
            msg.push_str(&format!("{}: 🔴 Closed\n", escape_markdown(&stall.name)));
        }
        return msg;
    }

    let mut msg = String::from("📊 *Current Gerai Statuses*\n\n");
    for stall in &snapshot.stalls {
        let (emoji, text) = if stall.is_open {
            ("🟢", "Open")
        } else {
            ("🔴", "Closed")
        };
        msg.push_str(&format!("{}: {emoji} {text}", escape_markdown(&stall.name)));
        match &stall.last_updated_at {
            Some(at) => msg.push_str(&format!("\nLast Updated: {}", format_timestamp(at))),
            None => msg.push_str("\nNo updates yet"),
        }
        if let Some(by) = &stall.last_updated_by {
            msg.push_str(&format!("\nUpdated by: {}", escape_markdown(by)));
        }
        if stall.pending_votes > 0 {
            let toward = if stall.is_open { "close" } else { "open" };
            msg.push_str(&format!(
                "\n⏳ {}/{} votes to {toward}",
                stall.pending_votes,
                crate::voting::VOTES_REQUIRED
            ));
        }
        msg.push_str("\n\n");
    }
    msg
}

pub fn render_vote_outcome(stall: &Stall, outcome: &VoteOutcome, hours: &OperatingHours) -> String {
    let name = &stall.display_name;
    match outcome {
        VoteOutcome::OutsideOperatingHours => format!(
            "⛔ Updates are disabled outside operating hours ({}).\nAll gerai are closed during this time.",
            hours.label()
        ),
        VoteOutcome::AlreadyVoted {
            target,
            votes,
            needed,
        } => format!(
            "☑️ You already voted to mark {name} as {} ({votes}/{needed}).\nWaiting for someone else to confirm.",
            state_label(*target)
        ),
        VoteOutcome::FirstVote {
            target,
            votes,
            needed,
        } => format!(
            "🗳️ Vote recorded: {name} → {} ({votes}/{needed}).\nOne more person must confirm within {VOTE_STALENESS_MINUTES} minutes.",
            state_label(*target)
        ),
        VoteOutcome::VoteRecorded {
            target,
            votes,
            needed,
        } => format!(
            "🗳️ Vote recorded: {name} → {} ({votes}/{needed}).",
            state_label(*target)
        ),
        VoteOutcome::Committed { target, voters } => format!(
            "✅ {name} status updated to: {}\nConfirmed by: {}",
            state_label(*target),
            voters.join(", ")
        ),
    }
}

pub fn render_admin_outcome(stall: &Stall, outcome: &AdminOutcome) -> String {
    match outcome {
        AdminOutcome::Changed { current, .. } => format!(
            "✅ [admin] {} set to: {}",
            stall.display_name,
            state_label(*current)
        ),
        AdminOutcome::NoChange { current } => format!(
            "ℹ️ {} is already {}; nothing changed.",
            stall.display_name,
            state_label(*current)
        ),
    }
}

pub fn render_subscribe(outcome: SubscribeOutcome) -> &'static str {
    match outcome {
        SubscribeOutcome::Subscribed => {
            "🔔 Subscribed. You will be notified when a gerai changes status."
        }
        SubscribeOutcome::AlreadySubscribed => "🔔 You are already subscribed.",
    }
}

pub fn render_unsubscribe(outcome: UnsubscribeOutcome) -> &'static str {
    match outcome {
        UnsubscribeOutcome::Unsubscribed => "🔕 Unsubscribed. No more notifications.",
        UnsubscribeOutcome::NotSubscribed => "🔕 You were not subscribed.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StallView;
    use chrono::{FixedOffset, TimeZone};

    fn ts() -> Timestamp {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, 13, 5, 9)
            .unwrap()
    }

    fn view(id: &str, open: bool) -> StallView {
        StallView {
            id: id.into(),
            name: format!("Gerai {id}"),
            location: None,
            is_open: open,
            last_updated_at: open.then(ts),
            last_updated_by: open.then(|| "my_user".to_string()),
            pending_votes: 0,
        }
    }

    fn snapshot(within_hours: bool) -> StatusSnapshot {
        StatusSnapshot {
            generated_at: ts(),
            within_hours,
            hours: OperatingHours::default(),
            stalls: vec![view("11", true), view("17", false)],
        }
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(format_timestamp(&ts()), "02/03/2026, 01:05:09 PM");
    }

    #[test]
    fn snapshot_inside_hours() {
        let text = render_snapshot(&snapshot(true));
        assert!(text.starts_with("📊 *Current Gerai Statuses*"));
        assert!(text.contains("Gerai 11: 🟢 Open"));
        assert!(text.contains("Updated by: my\\_user"));
        assert!(text.contains("Gerai 17: 🔴 Closed\nNo updates yet"));
    }

    #[test]
    fn snapshot_outside_hours_lists_all_closed() {
        let text = render_snapshot(&snapshot(false));
        assert!(text.contains("Outside Operating Hours"));
        assert!(text.contains("7:00 AM - 12:00 AM"));
        assert!(text.contains("Gerai 11: 🔴 Closed"));
        assert!(!text.contains("🟢"));
    }

    #[test]
    fn pending_votes_shown() {
        let mut snap = snapshot(true);
        snap.stalls[1].pending_votes = 1;
        assert!(render_snapshot(&snap).contains("⏳ 1/2 votes to open"));
    }

    #[test]
    fn outcome_messages() {
        let stall = Stall::new("gerai11", "Gerai 11");
        let hours = OperatingHours::default();
        let first = render_vote_outcome(
            &stall,
            &VoteOutcome::FirstVote {
                target: true,
                votes: 1,
                needed: 2,
            },
            &hours,
        );
        assert!(first.contains("(1/2)"));
        let done = render_vote_outcome(
            &stall,
            &VoteOutcome::Committed {
                target: false,
                voters: vec!["a".into(), "b".into()],
            },
            &hours,
        );
        assert!(done.contains("Closed 🔴"));
        assert!(done.contains("a, b"));
        let closed = render_vote_outcome(&stall, &VoteOutcome::OutsideOperatingHours, &hours);
        assert!(closed.starts_with("⛔"));
    }
}
