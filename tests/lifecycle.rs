use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use arrakis::{
    Activation, Arrakeener, ArrakeenerFactory, ErrorKind, ExchangeError, ServerLifetime,
};

fn factory() -> ArrakeenerFactory {
    ArrakeenerFactory::new(Arc::new(ServerLifetime::new()))
}

#[test]
fn last_release_signals_shutdown_exactly_once() {
    let f = factory();
    let mut rx = f.lifetime().subscribe();

    let a = f.create().unwrap();
    let b = f.create().unwrap();
    let a2 = a.retain();
    assert_eq!(f.lifetime().holds(), 2);

    a.release();
    a2.release();
    assert!(!f.lifetime().is_stopping());
    assert!(!rx.has_changed().unwrap());

    b.release();
    assert!(f.lifetime().is_stopping());
    assert!(rx.has_changed().unwrap());
    assert!(*rx.borrow_and_update());
}

#[test]
fn create_after_shutdown_is_refused() {
    let f = factory();
    f.create().unwrap().release();

    let err = f.create().unwrap_err();
    assert_eq!(err, ExchangeError::ServerStopping);
    assert_eq!(err.kind(), ErrorKind::ServerStopping);
    assert!(f.lock_server().is_err());
    assert_eq!(f.lifetime().holds(), 0);
}

#[test]
fn aggregation_is_unsupported() {
    let f = factory();
    let err = f.create_instance(Activation::Aggregated).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(f.lifetime().holds(), 0);
    assert!(!f.lifetime().is_stopping());
}

#[test]
fn explicit_server_lock_keeps_server_alive() {
    let f = factory();
    let lock = f.lock_server().unwrap();

    f.create().unwrap().release();
    assert!(!f.lifetime().is_stopping());
    assert!(f.create().is_ok());

    drop(lock);
    assert!(f.lifetime().is_stopping());
}

#[test]
fn clones_keep_the_server_alive() {
    let f = factory();
    let h = f.create().unwrap();
    let ghola = h.clone_instance().unwrap();
    h.release();
    assert!(!f.lifetime().is_stopping());
    assert!(ghola.eat_spice(1).is_err()); // fresh clone of a fresh account has no spice
    ghola.release();
    assert!(f.lifetime().is_stopping());
}

#[test]
fn release_from_another_thread_waits_for_in_flight_calls() {
    let f = factory();
    let h = f.create().unwrap();
    let worker_handle = h.retain();
    let lifetime = Arc::clone(f.lifetime());
    let (released_tx, released_rx) = mpsc::channel::<()>();

    let worker = thread::spawn(move || {
        released_rx.recv().unwrap();
        // The creator's reference is gone; ours still keeps the instance alive.
        for _ in 0..1_000 {
            assert!(worker_handle.energy() >= 0);
            let _ = worker_handle.mine_spice(1);
        }
        assert!(!lifetime.is_stopping());
        assert_eq!(worker_handle.ref_count(), 1);
    });

    h.release();
    released_tx.send(()).unwrap();
    worker.join().unwrap();

    assert!(f.lifetime().is_stopping());
}

#[test]
fn no_creation_succeeds_after_shutdown_is_observed() {
    for _ in 0..20 {
        let f = factory();
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let mut seen_stop = false;
                    for _ in 0..200 {
                        match f.create() {
                            Ok(h) => {
                                assert!(!seen_stop, "instance created after shutdown");
                                h.release();
                            }
                            Err(e) => {
                                assert_eq!(e, ExchangeError::ServerStopping);
                                seen_stop = true;
                            }
                        }
                    }
                });
            }
        });
        assert_eq!(f.lifetime().holds(), 0);
        assert!(f.lifetime().is_stopping());
    }
}

#[tokio::test]
async fn hosting_loop_wakes_on_shutdown() {
    let f = factory();
    let handles: Vec<_> = (0..4).map(|_| f.create().unwrap()).collect();

    let lifetime = Arc::clone(f.lifetime());
    let waiter = tokio::spawn(async move { lifetime.stopped().await });

    let releaser = tokio::task::spawn_blocking(move || {
        for h in handles {
            thread::sleep(Duration::from_millis(5));
            h.release();
        }
    });

    releaser.await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("shutdown signal not delivered")
        .unwrap();
    assert!(f.lifetime().is_stopping());
}
