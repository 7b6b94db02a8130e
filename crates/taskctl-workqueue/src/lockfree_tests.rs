//! Tests for the lock-free queue.

use super::*;
use std::thread;

#[test]
fn test_new_queue_is_empty() {
    let mut queue: LockFreeQueue<i32> = LockFreeQueue::new();
    assert!(queue.is_empty());
    assert!(queue.front().is_none());
    assert!(queue.back().is_none());
    assert_eq!(queue.try_pop(), None);
}

#[test]
fn test_push_pop_fifo() {
    let mut queue = LockFreeQueue::new();
    queue.push(1);
    queue.push(2);
    queue.push(3);

    assert!(!queue.is_empty());
    assert_eq!(queue.try_pop(), Some(1));
    assert_eq!(queue.pop(), Some(2));
    assert_eq!(queue.try_pop(), Some(3));
    assert_eq!(queue.try_pop(), None);
    assert!(queue.is_empty());
}

#[test]
fn test_front_and_back_peek() {
    let mut queue = LockFreeQueue::new();
    queue.push("first".to_string());
    queue.push("second".to_string());

    assert_eq!(queue.front().map(String::as_str), Some("first"));
    assert_eq!(queue.back().map(String::as_str), Some("second"));

    assert_eq!(queue.try_pop().as_deref(), Some("first"));
    assert_eq!(queue.front().map(String::as_str), Some("second"));
    assert_eq!(queue.back().map(String::as_str), Some("second"));

    queue.try_pop();
    assert!(queue.back().is_none());
}

#[test]
fn test_reuse_after_drain() {
    let mut queue = LockFreeQueue::new();
    queue.push(1);
    assert_eq!(queue.try_pop(), Some(1));

    queue.push(2);
    assert_eq!(queue.back(), Some(&2));
    assert_eq!(queue.try_pop(), Some(2));
}

#[test]
fn test_drop_releases_unpopped_values() {
    use std::sync::Arc;

    let marker = Arc::new(());
    let mut queue = LockFreeQueue::new();
    for _ in 0..10 {
        queue.push(Arc::clone(&marker));
    }
    assert_eq!(Arc::strong_count(&marker), 11);

    drop(queue);
    assert_eq!(Arc::strong_count(&marker), 1);
}

#[test]
fn test_split_keeps_contents() {
    let mut queue = LockFreeQueue::new();
    queue.push(10);
    queue.push(20);

    let (mut producer, mut consumer) = queue.split();
    producer.push(30);

    assert_eq!(consumer.front(), Some(&10));
    let drained: Vec<i32> = consumer.drain().collect();
    assert_eq!(drained, vec![10, 20, 30]);
    assert!(consumer.is_empty());
    assert!(producer.is_empty());
}

#[test]
fn test_spsc_threads_preserve_order() {
    const COUNT: u64 = 100_000;

    let (mut producer, mut consumer) = LockFreeQueue::new().split();

    let producer_thread = thread::spawn(move || {
        for i in 0..COUNT {
            producer.push(i);
        }
        producer
    });

    let mut received = Vec::with_capacity(COUNT as usize);
    while received.len() < COUNT as usize {
        match consumer.try_pop() {
            Some(value) => received.push(value),
            None => thread::yield_now(),
        }
    }

    let producer = producer_thread.join().unwrap();
    assert!(received.iter().copied().eq(0..COUNT));
    assert!(consumer.is_empty());
    assert!(producer.is_empty());
}

fn assert_send<S: Send>(_: &S) {}

#[test]
fn test_split_ends_move_across_threads() {
    // Ends are `Send` even for non-`Sync` payloads; sharing them by
    // reference is rejected at compile time (see the `Consumer` docs).
    let (mut producer, mut consumer) = LockFreeQueue::new().split();
    assert_send(&producer);
    assert_send(&consumer);

    let producer_thread = thread::spawn(move || {
        for i in 0..10u32 {
            producer.push(std::cell::Cell::new(i));
        }
    });
    producer_thread.join().unwrap();

    let consumer_thread = thread::spawn(move || {
        let front = consumer.front().map(|c| c.get());
        let values: Vec<u32> = consumer.drain().map(|c| c.get()).collect();
        (front, values)
    });
    let (front, values) = consumer_thread.join().unwrap();
    assert_eq!(front, Some(0));
    assert_eq!(values, (0..10).collect::<Vec<_>>());
}
