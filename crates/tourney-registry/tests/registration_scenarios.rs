//! End-to-end registration scenarios through `TournamentService`.

use std::sync::Arc;

use rust_decimal::Decimal;
use tourney_registry::{InMemoryDirectory, TournamentService};
use tourney_types::{
    TournamentId, TournamentSpec, TournamentStatus, TourneyConfig, TourneyError, UserId,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    service: TournamentService,
    directory: Arc<InMemoryDirectory>,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let directory = Arc::new(InMemoryDirectory::new());
        let service = TournamentService::new(&TourneyConfig::default(), directory.clone()).unwrap();
        Self { service, directory }
    }

    fn user(&self, points: i64) -> UserId {
        let user = UserId::new();
        self.directory.add_user(user);
        self.service.open_account(user).unwrap();
        if points > 0 {
            self.service.credit(user, Decimal::new(points, 0)).unwrap();
        }
        user
    }

    fn tournament(&self, spec: TournamentSpec) -> TournamentId {
        self.directory.add_game(spec.game);
        self.service.create_tournament(spec).unwrap()
    }
}

#[test]
fn insufficient_funds_changes_nothing() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(10, 1, 8));
    let user = h.user(5);

    let err = h.service.join(t, user).unwrap_err();
    assert!(
        matches!(err, TourneyError::InsufficientFunds { .. }),
        "Expected InsufficientFunds, got: {err:?}"
    );
    assert_eq!(h.service.get_balance(user).unwrap(), Decimal::new(5, 0));
    assert_eq!(h.service.tournament(t).unwrap().participant_count(), 0);
}

#[test]
fn third_join_hits_capacity() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(0, 2, 2));
    let (a, b, c) = (h.user(0), h.user(0), h.user(0));

    assert_eq!(h.service.join(t, a).unwrap(), 1);
    assert_eq!(h.service.join(t, b).unwrap(), 2);
    assert!(matches!(
        h.service.join(t, c),
        Err(TourneyError::CapacityFull { max: 2 })
    ));

    let tournament = h.service.tournament(t).unwrap();
    assert_eq!(tournament.participant_count(), 2);
    assert!(tournament.participants.contains(&a));
    assert!(tournament.participants.contains(&b));
}

#[test]
fn ongoing_cannot_reopen() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(0, 1, 4));
    h.service.transition(t, TournamentStatus::Ongoing).unwrap();

    let err = h.service.transition(t, TournamentStatus::Open).unwrap_err();
    assert!(matches!(
        err,
        TourneyError::InvalidTransition {
            from: TournamentStatus::Ongoing,
            to: TournamentStatus::Open,
        }
    ));
    assert_eq!(
        h.service.tournament(t).unwrap().status,
        TournamentStatus::Ongoing
    );
}

#[test]
fn kill_by_non_participant_pays_nothing() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(0, 1, 4));
    let outsider = h.user(3);

    assert!(matches!(
        h.service.record_kill(t, outsider),
        Err(TourneyError::NotRegistered { .. })
    ));
    assert_eq!(h.service.get_balance(outsider).unwrap(), Decimal::new(3, 0));
}

#[test]
fn full_tournament_lifecycle() {
    let h = Harness::new();
    let mut spec = TournamentSpec::dummy(20, 2, 4);
    spec.initial_status = TournamentStatus::Moderation;
    let t = h.tournament(spec);
    let (a, b) = (h.user(50), h.user(50));

    // Not yet approved.
    assert!(matches!(
        h.service.join(t, a),
        Err(TourneyError::RegistrationClosed(_))
    ));

    h.service.transition(t, TournamentStatus::Open).unwrap();
    h.service.join(t, a).unwrap();
    assert!(matches!(
        h.service.start(t),
        Err(TourneyError::NotEnoughParticipants { needed: 2, have: 1 })
    ));
    h.service.join(t, b).unwrap();
    h.service.start(t).unwrap();

    // Participant set is frozen once the tournament runs.
    assert!(matches!(
        h.service.leave(t, a),
        Err(TourneyError::RegistrationClosed(_))
    ));

    assert_eq!(h.service.record_kill(t, a).unwrap(), Decimal::new(3150, 2));
    assert_eq!(h.service.record_kill(t, a).unwrap(), Decimal::new(3300, 2));
    assert_eq!(h.service.record_kill(t, b).unwrap(), Decimal::new(3150, 2));

    h.service.transition(t, TournamentStatus::Finished).unwrap();
    assert!(matches!(
        h.service.transition(t, TournamentStatus::Canceled),
        Err(TourneyError::InvalidTransition { .. })
    ));

    // 100 credited, 40 in fees, 4.50 in rewards.
    assert_eq!(h.service.audit().unwrap(), Decimal::new(6450, 2));

    h.service.delete_tournament(t).unwrap();
    assert!(h.service.tournament_ids().is_empty());
}

#[test]
fn paused_registration_blocks_join_and_leave() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(0, 1, 4));
    let (a, b) = (h.user(0), h.user(0));
    h.service.join(t, a).unwrap();

    h.service.set_registration_open(t, false).unwrap();
    assert!(matches!(
        h.service.join(t, b),
        Err(TourneyError::RegistrationClosed(_))
    ));
    assert!(matches!(
        h.service.leave(t, a),
        Err(TourneyError::RegistrationClosed(_))
    ));

    h.service.set_registration_open(t, true).unwrap();
    assert_eq!(h.service.leave(t, a).unwrap(), 0);
    assert_eq!(h.service.join(t, b).unwrap(), 1);
}

#[test]
fn retried_join_request_charges_once() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(10, 1, 4));
    let user = h.user(30);

    assert_eq!(h.service.join_once("client-42", t, user).unwrap(), 1);
    for _ in 0..3 {
        assert!(matches!(
            h.service.join_once("client-42", t, user),
            Err(TourneyError::DuplicateRequest(_))
        ));
    }
    assert_eq!(h.service.get_balance(user).unwrap(), Decimal::new(20, 0));
}

#[test]
fn snapshot_serializes_for_outer_layers() {
    let h = Harness::new();
    let t = h.tournament(TournamentSpec::dummy(10, 1, 4));
    let user = h.user(10);
    h.service.join(t, user).unwrap();

    let json = serde_json::to_value(h.service.tournament(t).unwrap()).unwrap();
    assert_eq!(json["id"], serde_json::json!(t.0));
    assert_eq!(json["status"], "open");
    assert_eq!(json["reward_per_kill"], "1.50");
    assert_eq!(json["participants"].as_array().map(Vec::len), Some(1));
}
