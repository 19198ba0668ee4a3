use crate::clock::Timestamp;
use crate::status::StatusStore;
use crate::voting::VoteBook;

/// Attribution written by the end-of-day sweep.
pub const AUTO_CLOSE_ACTOR: &str = "system/auto-close";

/// Force every open stall closed and drop every pending vote, whatever its
/// progress. Returns the ids that actually transitioned, in registry order.
pub fn sweep(statuses: &mut StatusStore, votes: &mut VoteBook, now: Timestamp) -> Vec<String> {
    let mut closed = Vec::new();
    for id in statuses.open_ids() {
        if statuses.set_status(&id, false, AUTO_CLOSE_ACTOR, now).is_ok() {
            closed.push(id);
        }
    }
    votes.reset_all();
    closed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hours::{Gate, OperatingHours};
    use crate::registry::{Registry, Stall};
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> Timestamp {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 2, h, m, 0)
            .unwrap()
    }

    #[test]
    fn closes_open_stalls_and_clears_votes() {
        let reg = Registry::new(vec![
            Stall::new("a", "A"),
            Stall::new("b", "B"),
            Stall::new("c", "C"),
        ])
        .unwrap();
        let mut st = StatusStore::new(&reg);
        let mut vb = VoteBook::new(&reg);
        let gate = Gate::new(OperatingHours::default(), false);

        st.set_status("a", true, "x", at(8, 0)).unwrap();
        st.set_status("c", true, "x", at(8, 0)).unwrap();
        vb.propose_or_vote(&mut st, &gate, "b", "alice", at(23, 0)).unwrap();
        assert_eq!(vb.get("b").unwrap().len(), 1);

        let closed = sweep(&mut st, &mut vb, at(0, 0));
        assert_eq!(closed, vec!["a".to_string(), "c".to_string()]);
        for id in ["a", "b", "c"] {
            assert!(!st.get(id).unwrap().is_open);
            assert!(vb.get(id).unwrap().is_empty());
        }
        assert_eq!(
            st.get("a").unwrap().last_updated_by.as_deref(),
            Some(AUTO_CLOSE_ACTOR)
        );
        // Already-closed stalls keep their attribution.
        assert_eq!(st.get("b").unwrap().last_updated_by, None);
    }
}
