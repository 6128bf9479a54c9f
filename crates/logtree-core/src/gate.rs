//! Gating: is a (resolved filter level, requested level, payload) triple active?

use logtree_types::{Payload, Rank};

/// Namespace/level gate: the request is at least as severe as the filter.
///
/// Requests at or above `off` never pass.
pub fn level_passes(resolved: Rank, requested: Rank, off: Rank) -> bool {
    requested < off && resolved <= requested
}

/// Error veto: client-caused errors and errors already given a log id are
/// kept out of the log while `exclude_client_errors` is on.
pub fn vetoed(payload: Option<&Payload<'_>>, exclude_client_errors: bool) -> bool {
    if !exclude_client_errors {
        return false;
    }
    payload
        .and_then(Payload::as_error)
        .is_some_and(|err| err.is_client_caused() || err.log_id().is_some())
}

/// Full gate. The veto is applied only after the level gate passes, so it
/// can only narrow emission.
pub fn is_active(
    resolved: Rank,
    requested: Rank,
    off: Rank,
    payload: Option<&Payload<'_>>,
    exclude_client_errors: bool,
) -> bool {
    level_passes(resolved, requested, off) && !vetoed(payload, exclude_client_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree_types::ProbeError;

    fn rank(raw: u32) -> Rank {
        Rank::new(raw).unwrap()
    }

    #[test]
    fn test_monotonic_in_requested_rank() {
        let off = rank(700);
        for resolved in (100..=600).step_by(100).map(rank) {
            let mut seen_active = false;
            for requested in (100..=600).step_by(100).map(rank) {
                let active = level_passes(resolved, requested, off);
                if seen_active {
                    assert!(active, "{} should stay active at {}", resolved, requested);
                }
                seen_active |= active;
            }
            assert!(seen_active);
        }
    }

    #[test]
    fn test_off_never_passes() {
        let off = rank(700);
        assert!(!level_passes(rank(100), off, off));
        assert!(!level_passes(off, rank(600), off));
    }

    #[test]
    fn test_client_error_vetoed_only_when_enabled() {
        let err = ProbeError::new("NotFound", "no such student").client_caused();
        let payload = Payload::from(&err);
        assert!(!is_active(rank(100), rank(500), rank(700), Some(&payload), true));
        assert!(is_active(rank(100), rank(500), rank(700), Some(&payload), false));
    }

    #[test]
    fn test_already_logged_error_vetoed() {
        let err = ProbeError::new("Error", "boom");
        let payload = Payload::from(&err);
        assert!(!vetoed(Some(&payload), true));
        err.assign_log_id(|| "id1".to_string());
        assert!(vetoed(Some(&payload), true));
    }

    #[test]
    fn test_veto_never_widens() {
        let err = ProbeError::new("Error", "boom");
        let payload = Payload::from(&err);
        assert!(!is_active(rank(400), rank(200), rank(700), Some(&payload), true));
        assert!(!is_active(rank(400), rank(200), rank(700), Some(&payload), false));
    }

    #[test]
    fn test_non_error_payloads_not_vetoed() {
        let payload = Payload::structured(&serde_json::json!({"id": 7}));
        assert!(!vetoed(Some(&payload), true));
        assert!(!vetoed(None, true));
    }
}
