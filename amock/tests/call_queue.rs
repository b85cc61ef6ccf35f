// vim: tw=80
//! Direct tests of the per-method handler queue

use amock::{CallQueue, ConsumeError, Handler, IntoHandler, Mismatch, Values};
use std::{
    sync::{
        Arc,
        Barrier,
        Mutex,
        atomic::{AtomicUsize, Ordering}
    },
    thread
};

fn returning(x: u32) -> Handler {
    (move || (x,)).into_handler()
}

fn consume_u32(queue: &CallQueue) -> Result<u32, ConsumeError> {
    let results = queue.consume(Vec::new())?;
    Ok(<(u32,)>::from_values(results).unwrap().0)
}

#[test]
fn empty() {
    let queue = CallQueue::new();
    assert_eq!(queue.snapshot(), (0, 0));
    assert_eq!(consume_u32(&queue), Err(ConsumeError::Exhausted));
    assert_eq!(queue.snapshot(), (0, 0));
}

#[test]
fn fifo_order() {
    let queue = CallQueue::new();
    for i in 0..4 {
        queue.append(returning(i));
    }
    for i in 0..4 {
        assert_eq!(consume_u32(&queue), Ok(i));
        assert_eq!(queue.snapshot(), (4, i as usize + 1));
    }
    assert_eq!(consume_u32(&queue), Err(ConsumeError::Exhausted));
    assert_eq!(queue.snapshot(), (4, 4));
}

/// An exhausted queue must not invoke anything
#[test]
fn exhausted_invokes_nothing() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let queue = CallQueue::new();
    let inv = invocations.clone();
    queue.append((move || {
        inv.fetch_add(1, Ordering::Relaxed);
    }).into_handler());
    queue.consume(Vec::new()).unwrap();
    assert_eq!(queue.consume(Vec::new()).err(),
               Some(ConsumeError::Exhausted));
    assert_eq!(invocations.load(Ordering::Relaxed), 1);
}

#[test]
fn append_after_exhaustion() {
    let queue = CallQueue::new();
    queue.append(returning(1));
    assert_eq!(consume_u32(&queue), Ok(1));
    assert_eq!(consume_u32(&queue), Err(ConsumeError::Exhausted));
    queue.append(returning(2));
    assert_eq!(consume_u32(&queue), Ok(2));
    assert_eq!(queue.snapshot(), (2, 2));
}

#[test]
fn append_n() {
    let queue = CallQueue::new();
    queue.append_n(3, returning(7));
    queue.append_n(0, returning(8));
    assert_eq!(queue.snapshot(), (3, 0));
    for _ in 0..3 {
        assert_eq!(consume_u32(&queue), Ok(7));
    }
    assert_eq!(consume_u32(&queue), Err(ConsumeError::Exhausted));
}

#[test]
fn arguments_are_passed() {
    let queue = CallQueue::new();
    queue.append((|a: u32, b: String| (b.len() as u32 + a,)).into_handler());
    let results = queue.consume((3u32, String::from("abc")).into_values())
        .unwrap();
    assert_eq!(<(u32,)>::from_values(results), Ok((6,)));
}

/// A mismatch still consumes the handler, because the index was claimed
/// before invocation.
#[test]
fn mismatch() {
    let queue = CallQueue::new();
    queue.append((|_a: u32| ()).into_handler());
    let e = queue.consume((1u64,).into_values()).err();
    assert_eq!(e, Some(ConsumeError::Mismatch(Mismatch::Type {
        position: 0,
        expected: "u32",
        found: "u64"
    })));
    assert_eq!(queue.snapshot(), (1, 1));
}

/// Every handler is invoked exactly once, no matter how many threads race
#[test]
fn concurrent_consumers() {
    const HANDLERS: usize = 64;
    const THREADS: usize = 8;
    const CALLS_PER_THREAD: usize = 10;

    let queue = Arc::new(CallQueue::new());
    let counts = Arc::new(
        (0..HANDLERS).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>()
    );
    for i in 0..HANDLERS {
        let counts = counts.clone();
        queue.append((move || {
            counts[i].fetch_add(1, Ordering::Relaxed);
            (i,)
        }).into_handler());
    }
    let barrier = Arc::new(Barrier::new(THREADS));
    let exhausted = Arc::new(AtomicUsize::new(0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let threads = (0..THREADS).map(|_| {
        let barrier = barrier.clone();
        let exhausted = exhausted.clone();
        let queue = queue.clone();
        let seen = seen.clone();
        thread::spawn(move || {
            barrier.wait();
            for _ in 0..CALLS_PER_THREAD {
                match queue.consume(Vec::new()) {
                    Ok(results) => {
                        let (i,) = <(usize,)>::from_values(results).unwrap();
                        seen.lock().unwrap().push(i);
                    },
                    Err(ConsumeError::Exhausted) => {
                        exhausted.fetch_add(1, Ordering::Relaxed);
                    },
                    Err(e) => panic!("{}", e)
                }
            }
        })
    }).collect::<Vec<_>>();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(exhausted.load(Ordering::Relaxed),
               THREADS * CALLS_PER_THREAD - HANDLERS);
    for count in counts.iter() {
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..HANDLERS).collect::<Vec<_>>());
    assert_eq!(queue.snapshot(), (HANDLERS, HANDLERS));
}

/// Appending while other threads consume never loses or duplicates a handler
#[test]
fn concurrent_append_and_consume() {
    const N: usize = 200;

    let queue = Arc::new(CallQueue::new());
    let q = queue.clone();
    let producer = thread::spawn(move || {
        for i in 0..N {
            q.append((move || (i,)).into_handler());
        }
    });
    let mut consumed = Vec::new();
    while consumed.len() < N {
        match queue.consume(Vec::new()) {
            Ok(results) => {
                consumed.push(<(usize,)>::from_values(results).unwrap().0);
            },
            Err(ConsumeError::Exhausted) => thread::yield_now(),
            Err(e) => panic!("{}", e)
        }
    }
    producer.join().unwrap();
    assert_eq!(consumed, (0..N).collect::<Vec<_>>());
    assert_eq!(queue.snapshot(), (N, N));
}

/// A handler may consume from its own queue without deadlocking
#[test]
fn reentrant_handler() {
    let queue = Arc::new(CallQueue::new());
    let q = queue.clone();
    queue.append((move || {
        let inner = q.consume(Vec::new()).unwrap();
        let (x,) = <(u32,)>::from_values(inner).unwrap();
        (x + 1,)
    }).into_handler());
    queue.append(returning(41));
    assert_eq!(consume_u32(&queue), Ok(42));
    assert_eq!(queue.snapshot(), (2, 2));
}
