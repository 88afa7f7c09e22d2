//! Error handling and edge case tests.

use server_flags::{
    ConfigNamespaceProxy, Executor, Flag, FlagError, InMemoryConfigProxy, ManualExecutor,
    ReaderConfig, SerialExecutor, ServerFlagReader, SharedListener,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NAMESPACE: &str = "test";

fn counter() -> (Arc<AtomicUsize>, SharedListener) {
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&calls);
    (
        calls,
        Arc::new(move || {
            sink.fetch_add(1, Ordering::SeqCst);
        }),
    )
}

// --- Store Failures ---

#[test]
fn test_unavailable_store_reads_default() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let reader = ServerFlagReader::new(NAMESPACE, proxy.clone(), executor).unwrap();

    proxy
        .set_property(NAMESPACE, "flag_override_1", "0", false)
        .unwrap();
    proxy
        .set_property(NAMESPACE, "flag_override_2", "1", false)
        .unwrap();
    proxy.set_available(false);

    // Should fall back, not error
    assert!(reader.is_enabled(&Flag::released(1)));
    assert!(!reader.is_enabled(&Flag::unreleased(2)));

    proxy.set_available(true);
    assert!(!reader.is_enabled(&Flag::released(1)));
    assert!(reader.is_enabled(&Flag::unreleased(2)));
}

#[test]
fn test_unavailable_store_rejects_first_subscription() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let reader = ServerFlagReader::new(NAMESPACE, proxy.clone(), executor.clone()).unwrap();
    let (calls, listener) = counter();

    proxy.set_available(false);
    let result = reader.listen_for_changes(&[Flag::released(1)], listener.clone());
    assert!(matches!(result, Err(FlagError::StoreUnavailable(_))));
    assert_eq!(reader.subscription_count(), 0);

    // Retrying once the store is back subscribes normally.
    proxy.set_available(true);
    reader
        .listen_for_changes(&[Flag::released(1)], listener)
        .unwrap();
    proxy
        .set_property(NAMESPACE, "flag_override_1", "1", false)
        .unwrap();
    executor.run_all_ready();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(proxy.listener_count(), 1);
}

#[test]
fn test_unparseable_override_reads_default() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let reader = ServerFlagReader::new(NAMESPACE, proxy.clone(), executor).unwrap();

    proxy
        .set_property(NAMESPACE, "flag_override_1", "maybe", false)
        .unwrap();

    let flag = Flag::released(1);
    assert_eq!(reader.read_override(&flag.id), None);
    assert!(reader.is_enabled(&flag));
}

// --- Listener Failures ---

#[test]
fn test_panicking_listener_does_not_block_others() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let reader = ServerFlagReader::new(NAMESPACE, proxy.clone(), executor.clone()).unwrap();
    let flag = Flag::released(1);
    let (calls, listener) = counter();

    reader
        .listen_for_changes(&[flag.clone()], Arc::new(|| panic!("listener bug")))
        .unwrap();
    reader.listen_for_changes(&[flag], listener).unwrap();

    proxy
        .set_property(NAMESPACE, "flag_override_1", "0", false)
        .unwrap();
    executor.run_all_ready();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_panic_propagates_without_isolation() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let config = ReaderConfig {
        isolate_listener_panics: false,
        ..ReaderConfig::new(NAMESPACE)
    };
    let reader = ServerFlagReader::with_config(config, proxy.clone(), executor.clone()).unwrap();

    reader
        .listen_for_changes(&[Flag::released(1)], Arc::new(|| panic!("listener bug")))
        .unwrap();
    proxy
        .set_property(NAMESPACE, "flag_override_1", "0", false)
        .unwrap();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        executor.run_all_ready();
    }));
    assert!(result.is_err());
}

// --- Executor Failures ---

#[test]
fn test_closed_executor_drops_notification() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(SerialExecutor::new("closed-exec").unwrap());
    let reader = ServerFlagReader::new(NAMESPACE, proxy.clone(), executor.clone()).unwrap();
    let (calls, listener) = counter();
    reader
        .listen_for_changes(&[Flag::released(1)], listener)
        .unwrap();

    executor.shutdown();
    assert!(matches!(
        executor.execute(Box::new(|| {})),
        Err(FlagError::ExecutorClosed)
    ));

    // The write itself still succeeds; only the notification is lost.
    assert!(proxy
        .set_property(NAMESPACE, "flag_override_1", "0", false)
        .unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!reader.is_enabled(&Flag::released(1)));
}

// --- Construction ---

#[test]
fn test_empty_namespace_rejected() {
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());

    let result = ServerFlagReader::new("", proxy, executor);
    assert!(matches!(result, Err(FlagError::InvalidNamespace(_))));
}

#[test]
fn test_reader_from_config_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("reader.json");
    std::fs::write(&path, r#"{"namespace": "systemui"}"#).unwrap();

    let config = ReaderConfig::load(&path).unwrap();
    let proxy = Arc::new(InMemoryConfigProxy::new());
    let executor = Arc::new(ManualExecutor::new());
    let reader = ServerFlagReader::with_config(config, proxy, executor).unwrap();

    assert_eq!(reader.namespace(), "systemui");
}
