//! Concurrency properties of registration and id allocation.
//!
//! Joins racing for the last seats must never push a tournament past
//! `max_limit`, and every refused join must leave the user's balance intact.

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tourney_registry::{InMemoryDirectory, TournamentService};
use tourney_types::{TournamentSpec, TournamentStatus, TourneyConfig, TourneyError, UserId};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn service() -> (TournamentService, Arc<InMemoryDirectory>) {
    init_tracing();
    // Generous timeout: these tests are about atomicity, not contention.
    let config = TourneyConfig {
        lock_timeout_ms: 10_000,
        ..TourneyConfig::default()
    };
    let directory = Arc::new(InMemoryDirectory::new());
    let service = TournamentService::new(&config, directory.clone()).unwrap();
    (service, directory)
}

#[test]
fn racing_joins_never_exceed_capacity() {
    let (service, directory) = service();
    let spec = TournamentSpec::dummy(10, 1, 16);
    directory.add_game(spec.game);
    let t = service.create_tournament(spec).unwrap();

    let users: Vec<UserId> = (0..64)
        .map(|_| {
            let user = UserId::new();
            directory.add_user(user);
            service.open_account(user).unwrap();
            service.credit(user, Decimal::new(10, 0)).unwrap();
            user
        })
        .collect();

    let joined = AtomicUsize::new(0);
    let full = AtomicUsize::new(0);

    std::thread::scope(|s| {
        for &user in &users {
            let (service, joined, full) = (&service, &joined, &full);
            s.spawn(move || match service.join(t, user) {
                Ok(count) => {
                    assert!(count <= 16, "count {count} over capacity");
                    joined.fetch_add(1, Ordering::SeqCst);
                }
                Err(TourneyError::CapacityFull { max: 16 }) => {
                    full.fetch_add(1, Ordering::SeqCst);
                }
                Err(other) => panic!("unexpected error: {other}"),
            });
        }
    });

    assert_eq!(joined.load(Ordering::SeqCst), 16);
    assert_eq!(full.load(Ordering::SeqCst), 48);

    let tournament = service.tournament(t).unwrap();
    assert_eq!(tournament.participant_count(), 16);
    for user in &users {
        let expected = if tournament.participants.contains(user) {
            Decimal::ZERO
        } else {
            Decimal::new(10, 0)
        };
        assert_eq!(service.get_balance(*user).unwrap(), expected);
    }
    assert_eq!(service.audit().unwrap(), Decimal::new(480, 0));
}

#[test]
fn same_user_racing_joins_charges_once() {
    let (service, directory) = service();
    let spec = TournamentSpec::dummy(5, 1, 8);
    directory.add_game(spec.game);
    let t = service.create_tournament(spec).unwrap();

    let user = UserId::new();
    directory.add_user(user);
    service.open_account(user).unwrap();
    service.credit(user, Decimal::new(100, 0)).unwrap();

    let joined = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|| match service.join(t, user) {
                Ok(_) => {
                    joined.fetch_add(1, Ordering::SeqCst);
                }
                Err(TourneyError::AlreadyRegistered { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            });
        }
    });

    assert_eq!(joined.load(Ordering::SeqCst), 1);
    assert_eq!(service.get_balance(user).unwrap(), Decimal::new(95, 0));
}

#[test]
fn joins_racing_a_start_are_all_or_nothing() {
    let (service, directory) = service();
    let spec = TournamentSpec::dummy(1, 1, 64);
    directory.add_game(spec.game);
    let t = service.create_tournament(spec).unwrap();

    let first = UserId::new();
    directory.add_user(first);
    service.open_account(first).unwrap();
    service.credit(first, Decimal::ONE).unwrap();
    service.join(t, first).unwrap();

    let users: Vec<UserId> = (0..32)
        .map(|_| {
            let user = UserId::new();
            directory.add_user(user);
            service.open_account(user).unwrap();
            service.credit(user, Decimal::ONE).unwrap();
            user
        })
        .collect();

    std::thread::scope(|s| {
        s.spawn(|| service.start(t).unwrap());
        for &user in &users {
            let service = &service;
            s.spawn(move || match service.join(t, user) {
                Ok(_) | Err(TourneyError::RegistrationClosed(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            });
        }
    });

    let tournament = service.tournament(t).unwrap();
    assert_eq!(tournament.status, TournamentStatus::Ongoing);
    for user in &users {
        let paid = service.get_balance(*user).unwrap().is_zero();
        assert_eq!(paid, tournament.participants.contains(user));
    }
}

#[test]
fn concurrent_creates_get_distinct_ids() {
    let (service, directory) = service();
    let ids = Mutex::new(HashSet::new());

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    let spec = TournamentSpec::dummy(0, 1, 2);
                    directory.add_game(spec.game);
                    let id = service.create_tournament(spec).unwrap();
                    assert!(id.is_public_range());
                    assert!(ids.lock().insert(id), "id {id} handed out twice");
                }
            });
        }
    });

    assert_eq!(ids.lock().len(), 800);
    assert_eq!(service.tournament_ids().len(), 800);
}
