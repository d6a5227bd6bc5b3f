/// Concurrent access integration tests for Emberbin
///
/// Tests multi-threaded create and access operations to ensure view
/// accounting stays exact under concurrent load: no lost updates and no
/// paste served past its quota.

use ember_api::{AccessOutcome, CreatePaste, Pastebin};
use ember_core::clock;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_single_view_paste_served_exactly_once() {
    let dir = TempDir::new().unwrap();
    let bin = Arc::new(Pastebin::create(dir.path()).unwrap());

    let receipt = bin
        .create_paste(CreatePaste::new("burn after reading").max_views(1))
        .unwrap();

    let num_threads = 8;
    let mut handles = vec![];

    // Every thread races for the only view
    for _ in 0..num_threads {
        let bin_clone = Arc::clone(&bin);
        let id = receipt.id.clone();
        let handle = thread::spawn(move || {
            match bin_clone.access(&id, clock::now_millis()).unwrap() {
                AccessOutcome::Ok(_) => 1usize,
                AccessOutcome::ViewLimitExceeded => 0,
                other => panic!("Unexpected outcome: {:?}", other),
            }
        });
        handles.push(handle);
    }

    let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(granted, 1, "Exactly one thread may win the single view");

    let record = bin.store().get(&receipt.id).unwrap();
    assert_eq!(record.views_count, 1);
}

#[test]
fn test_quota_never_oversubscribed() {
    let dir = TempDir::new().unwrap();
    let bin = Arc::new(Pastebin::create(dir.path()).unwrap());

    let receipt = bin
        .create_paste(CreatePaste::new("ten views").max_views(10))
        .unwrap();

    let num_threads = 20;
    let mut handles = vec![];

    for _ in 0..num_threads {
        let bin_clone = Arc::clone(&bin);
        let id = receipt.id.clone();
        let handle = thread::spawn(move || {
            match bin_clone.access(&id, clock::now_millis()).unwrap() {
                AccessOutcome::Ok(_) => 1usize,
                AccessOutcome::ViewLimitExceeded => 0,
                other => panic!("Unexpected outcome: {:?}", other),
            }
        });
        handles.push(handle);
    }

    let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(granted, 10, "Grants must match the quota exactly");

    let record = bin.store().get(&receipt.id).unwrap();
    assert_eq!(record.views_count, 10);
}

#[test]
fn test_no_lost_view_updates() {
    let dir = TempDir::new().unwrap();
    let bin = Arc::new(Pastebin::create(dir.path()).unwrap());

    let receipt = bin
        .create_paste(CreatePaste::new("unlimited"))
        .unwrap();

    let num_threads = 4;
    let views_per_thread = 25;

    let mut handles = vec![];

    for _ in 0..num_threads {
        let bin_clone = Arc::clone(&bin);
        let id = receipt.id.clone();
        let handle = thread::spawn(move || {
            for _ in 0..views_per_thread {
                let outcome = bin_clone.access(&id, clock::now_millis()).unwrap();
                assert!(outcome.is_ok(), "Unlimited paste must always be served");
            }
        });
        handles.push(handle);
    }

    // Wait for all threads
    for handle in handles {
        handle.join().unwrap();
    }

    // Every one of the 100 views must be in the count
    let record = bin.store().get(&receipt.id).unwrap();
    assert_eq!(record.views_count, (num_threads * views_per_thread) as u64);
}

#[test]
fn test_concurrent_creates_yield_distinct_pastes() {
    let dir = TempDir::new().unwrap();
    let bin = Arc::new(Pastebin::create(dir.path()).unwrap());

    let num_threads = 10;
    let creates_per_thread = 20;

    let mut handles = vec![];

    for thread_id in 0..num_threads {
        let bin_clone = Arc::clone(&bin);
        let handle = thread::spawn(move || {
            let mut ids = Vec::new();
            for i in 0..creates_per_thread {
                let content = format!("thread{} paste{}", thread_id, i);
                let receipt = bin_clone.create_paste(CreatePaste::new(content)).unwrap();
                ids.push(receipt.id);
            }
            ids
        });
        handles.push(handle);
    }

    let mut all_ids = Vec::new();
    for handle in handles {
        all_ids.extend(handle.join().unwrap());
    }

    // All ids distinct, all pastes present
    let unique: std::collections::HashSet<_> = all_ids.iter().collect();
    assert_eq!(unique.len(), num_threads * creates_per_thread);
    assert_eq!(
        bin.status().unwrap().pastes,
        num_threads * creates_per_thread
    );

    for id in &all_ids {
        assert!(bin.store().get(id).is_some(), "Missing paste {}", id);
    }
}

#[test]
fn test_concurrent_create_and_access_mix() {
    let dir = TempDir::new().unwrap();
    let bin = Arc::new(Pastebin::create(dir.path()).unwrap());

    // Pre-populate a shared paste for the readers
    let shared = bin
        .create_paste(CreatePaste::new("shared body"))
        .unwrap();

    let mut handles = vec![];

    // Writer threads keep creating new pastes
    for thread_id in 0..4 {
        let bin_clone = Arc::clone(&bin);
        let handle = thread::spawn(move || {
            for i in 0..50 {
                let content = format!("writer{} body{}", thread_id, i);
                bin_clone.create_paste(CreatePaste::new(content)).unwrap();
            }
        });
        handles.push(handle);
    }

    // Reader threads hammer the shared paste
    for _ in 0..4 {
        let bin_clone = Arc::clone(&bin);
        let id = shared.id.clone();
        let handle = thread::spawn(move || {
            for _ in 0..50 {
                let outcome = bin_clone.access(&id, clock::now_millis()).unwrap();
                assert!(outcome.is_ok());
            }
        });
        handles.push(handle);
    }

    // Wait for all threads
    for handle in handles {
        handle.join().unwrap();
    }

    // 4 writers x 50 pastes + the shared one
    assert_eq!(bin.status().unwrap().pastes, 201);

    let record = bin.store().get(&shared.id).unwrap();
    assert_eq!(record.views_count, 200);
}

#[test]
fn test_concurrent_in_memory_mode() {
    let bin = Arc::new(Pastebin::create_in_memory());

    let receipt = bin
        .create_paste(CreatePaste::new("ephemeral").max_views(5))
        .unwrap();

    let mut handles = vec![];

    for _ in 0..10 {
        let bin_clone = Arc::clone(&bin);
        let id = receipt.id.clone();
        let handle = thread::spawn(move || {
            match bin_clone.access(&id, clock::now_millis()).unwrap() {
                AccessOutcome::Ok(_) => 1usize,
                AccessOutcome::ViewLimitExceeded => 0,
                other => panic!("Unexpected outcome: {:?}", other),
            }
        });
        handles.push(handle);
    }

    let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(granted, 5);
}
