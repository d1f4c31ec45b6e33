use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

use super::*;
use crate::error::EngineError;
use crate::settings::{SettingsPatch, StoredSettings};
use crate::store::MemorySettingsStore;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Attach(String),
    Insert(String, String),
    Detach(String),
}

/// Driver double that records every call.
#[derive(Default)]
struct MockDriver {
    events: Mutex<Vec<Event>>,
    insert_times: Mutex<Vec<Instant>>,
    sessions: Mutex<u32>,
    fail_attach: bool,
    /// Zero-based index of the insert call that fails.
    fail_insert_at: Option<usize>,
    /// Attach waits for this before returning, when set.
    attach_gate: Option<Arc<Notify>>,
    /// The insert call at `.0` waits for `.1`, then fails if its session
    /// was detached meanwhile.
    insert_gate: Option<(usize, Arc<Notify>)>,
    inserted: Option<mpsc::UnboundedSender<String>>,
}

impl MockDriver {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn typed_text(&self) -> String {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Insert(_, text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| pred(*e)).count()
    }

    fn attaches(&self) -> usize {
        self.count(|e| matches!(e, Event::Attach(_)))
    }

    fn inserts(&self) -> usize {
        self.count(|e| matches!(e, Event::Insert(..)))
    }

    fn detaches(&self) -> usize {
        self.count(|e| matches!(e, Event::Detach(_)))
    }
}

#[async_trait]
impl DebugSessionDriver for MockDriver {
    async fn attach(&self, tab: &TabId) -> Result<DebugSession, EngineError> {
        if let Some(gate) = &self.attach_gate {
            gate.notified().await;
        }
        if self.fail_attach {
            return Err(EngineError::AttachFailure {
                tab: tab.to_string(),
                message: "Another debugger is already attached".to_string(),
            });
        }
        let id = {
            let mut n = self.sessions.lock();
            *n += 1;
            format!("S{}", *n)
        };
        self.events.lock().push(Event::Attach(id.clone()));
        Ok(DebugSession::new(tab.clone(), id))
    }

    async fn insert_text(&self, session: &DebugSession, text: &str) -> Result<(), EngineError> {
        let index = self.inserts();
        self.events
            .lock()
            .push(Event::Insert(session.session_id().to_string(), text.to_string()));
        self.insert_times.lock().push(Instant::now());
        if let Some((at, gate)) = &self.insert_gate {
            if *at == index {
                gate.notified().await;
                let detached = Event::Detach(session.session_id().to_string());
                if self.events.lock().contains(&detached) {
                    return Err(EngineError::InjectionFailure(
                        "Session with given id not found".to_string(),
                    ));
                }
            }
        }
        if self.fail_insert_at == Some(index) {
            return Err(EngineError::InjectionFailure("No editable element focused".to_string()));
        }
        if let Some(tx) = &self.inserted {
            let _ = tx.send(text.to_string());
        }
        Ok(())
    }

    async fn detach(&self, session: &DebugSession) -> Result<(), EngineError> {
        self.events
            .lock()
            .push(Event::Detach(session.session_id().to_string()));
        Ok(())
    }
}

struct MockClipboard(String);

#[async_trait]
impl ClipboardReader for MockClipboard {
    async fn read_text(&self, _tab: &TabId) -> String {
        self.0.clone()
    }
}

/// Store whose reads always fail.
struct BrokenStore;

#[async_trait]
impl SettingsStore for BrokenStore {
    async fn get(&self) -> Result<StoredSettings, EngineError> {
        Err(EngineError::Settings("disk on fire".to_string()))
    }

    async fn set(&self, _patch: SettingsPatch) -> Result<(), EngineError> {
        Err(EngineError::Settings("disk on fire".to_string()))
    }
}

fn engine_with(driver: Arc<MockDriver>, clipboard: &str) -> TypingEngine {
    TypingEngine::new(
        driver,
        Arc::new(MockClipboard(clipboard.to_string())),
        Arc::new(MemorySettingsStore::new()),
    )
}

fn tab() -> TabId {
    TabId::from("tab-1")
}

#[tokio::test(start_paused = true)]
async fn test_types_text_in_order_and_cleans_up() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let handle = engine.start_typing(tab(), Some("hey".to_string())).unwrap();
    let outcome = handle.await.unwrap();

    assert_eq!(outcome, TypingOutcome::Completed { typed: 3 });
    assert_eq!(
        driver.events(),
        vec![
            Event::Attach("S1".to_string()),
            Event::Insert("S1".to_string(), "h".to_string()),
            Event::Insert("S1".to_string(), "e".to_string()),
            Event::Insert("S1".to_string(), "y".to_string()),
            Event::Detach("S1".to_string()),
        ]
    );
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_start_for_same_tab_is_ignored() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let first = engine.start_typing(tab(), Some("abc".to_string()));
    let second = engine.start_typing(tab(), Some("zzz".to_string()));
    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(engine.registry().len(), 1);

    first.unwrap().await.unwrap();
    assert_eq!(driver.typed_text(), "abc");
    assert_eq!(driver.attaches(), 1);

    // Once the task has ended the tab accepts a new one.
    let again = engine.start_typing(tab(), Some("d".to_string())).unwrap();
    assert_eq!(again.await.unwrap(), TypingOutcome::Completed { typed: 1 });
}

#[tokio::test(start_paused = true)]
async fn test_other_tabs_are_independent() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let a = engine.start_typing(TabId::from("a"), Some("12".to_string())).unwrap();
    let b = engine.start_typing(TabId::from("b"), Some("34".to_string())).unwrap();
    assert_eq!(engine.registry().len(), 2);

    assert_eq!(a.await.unwrap(), TypingOutcome::Completed { typed: 2 });
    assert_eq!(b.await.unwrap(), TypingOutcome::Completed { typed: 2 });
    assert_eq!(driver.detaches(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_attach_failure_rolls_back_registration() {
    let driver = Arc::new(MockDriver {
        fail_attach: true,
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "clipboard");

    let outcome = engine.start_typing(tab(), None).unwrap().await.unwrap();

    assert!(matches!(outcome, TypingOutcome::AttachFailed(_)));
    assert_eq!(driver.inserts(), 0);
    assert_eq!(driver.detaches(), 0);
    assert!(!engine.is_typing(&tab()));
}

#[tokio::test(start_paused = true)]
async fn test_injection_failure_stops_remaining_characters() {
    let driver = Arc::new(MockDriver {
        fail_insert_at: Some(2),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let outcome = engine
        .start_typing(tab(), Some("abcdef".to_string()))
        .unwrap()
        .await
        .unwrap();

    match outcome {
        TypingOutcome::InjectionFailed { typed, error } => {
            assert_eq!(typed, 2);
            assert!(error.contains("No editable element"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    // The failing character was attempted once and nothing after it.
    assert_eq!(driver.inserts(), 3);
    assert_eq!(driver.detaches(), 1);
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_takes_effect_at_next_character() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = Arc::new(MockDriver {
        inserted: Some(tx),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let handle = engine.start_typing(tab(), Some("abcdef".to_string())).unwrap();

    assert_eq!(rx.recv().await.as_deref(), Some("a"));
    assert_eq!(rx.recv().await.as_deref(), Some("b"));
    assert!(engine.stop_typing(&tab()).await);

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, TypingOutcome::Cancelled { typed: 2 });
    assert_eq!(driver.typed_text(), "ab");
    // Released by the stop, not again by the task's own cleanup.
    assert_eq!(driver.detaches(), 1);
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    assert!(!engine.stop_typing(&tab()).await);

    let handle = engine.start_typing(tab(), Some("abc".to_string())).unwrap();
    tokio::task::yield_now().await;
    assert!(engine.stop_typing(&tab()).await);
    assert!(!engine.stop_typing(&tab()).await);

    handle.await.unwrap();
    assert_eq!(driver.attaches(), 1);
    assert_eq!(driver.detaches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_insert_is_cancellation() {
    let gate = Arc::new(Notify::new());
    let driver = Arc::new(MockDriver {
        insert_gate: Some((1, gate.clone())),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let handle = engine.start_typing(tab(), Some("abc".to_string())).unwrap();
    while driver.inserts() < 2 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // The second insert is in flight when the session goes away.
    assert!(engine.stop_typing(&tab()).await);
    gate.notify_one();

    let outcome = handle.await.unwrap();
    assert_eq!(outcome, TypingOutcome::Cancelled { typed: 1 });
    assert_eq!(driver.detaches(), 1);
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_attach_releases_late_session() {
    let gate = Arc::new(Notify::new());
    let driver = Arc::new(MockDriver {
        attach_gate: Some(gate.clone()),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let handle = engine.start_typing(tab(), Some("abc".to_string())).unwrap();
    tokio::task::yield_now().await;

    // No session bound yet, so the stop has nothing to detach.
    assert!(engine.stop_typing(&tab()).await);
    assert_eq!(driver.detaches(), 0);

    gate.notify_one();
    assert_eq!(handle.await.unwrap(), TypingOutcome::Cancelled { typed: 0 });
    assert_eq!(driver.inserts(), 0);
    assert_eq!(driver.attaches(), 1);
    assert_eq!(driver.detaches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_task_leaves_new_task_alone() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = Arc::new(MockDriver {
        inserted: Some(tx),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let old = engine.start_typing(tab(), Some("aaaa".to_string())).unwrap();
    rx.recv().await;
    engine.stop_typing(&tab()).await;
    let new = engine.start_typing(tab(), Some("bb".to_string())).unwrap();

    assert!(matches!(old.await.unwrap(), TypingOutcome::Cancelled { .. }));
    assert_eq!(new.await.unwrap(), TypingOutcome::Completed { typed: 2 });
    assert_eq!(driver.attaches(), 2);
    assert_eq!(driver.detaches(), 2);
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delays_respect_pacing_bounds() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let text = "the quick brown fox jumps";
    engine
        .start_typing(tab(), Some(text.to_string()))
        .unwrap()
        .await
        .unwrap();

    // 100 ms base at 120 WPM plus 50..=200 ms jitter.
    let (min, max) = PacingSettings::default().delay_bounds();
    assert_eq!(min, Duration::from_millis(150));
    assert_eq!(max, Duration::from_millis(300));

    let times = driver.insert_times.lock().clone();
    assert_eq!(times.len(), text.len());
    for pair in times.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= min && gap <= max, "gap {:?} outside [{:?}, {:?}]", gap, min, max);
    }
}

#[tokio::test(start_paused = true)]
async fn test_custom_pacing_from_store() {
    let driver = Arc::new(MockDriver::default());
    let store = MemorySettingsStore::new();
    store
        .set(SettingsPatch {
            typing_speed: Some(60),
            min_typing_speed: Some(0),
            max_typing_speed: Some(0),
            snippets: None,
        })
        .await
        .unwrap();
    let engine = TypingEngine::new(
        driver.clone(),
        Arc::new(MockClipboard(String::new())),
        Arc::new(store),
    );

    engine
        .start_typing(tab(), Some("abc".to_string()))
        .unwrap()
        .await
        .unwrap();

    let times = driver.insert_times.lock().clone();
    assert_eq!(times[1] - times[0], Duration::from_millis(200));
    assert_eq!(times[2] - times[1], Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_settings_fall_back_to_defaults() {
    let driver = Arc::new(MockDriver::default());
    let engine = TypingEngine::new(
        driver.clone(),
        Arc::new(MockClipboard(String::new())),
        Arc::new(BrokenStore),
    );

    let outcome = engine
        .start_typing(tab(), Some("ok".to_string()))
        .unwrap()
        .await
        .unwrap();

    assert_eq!(outcome, TypingOutcome::Completed { typed: 2 });
    let times = driver.insert_times.lock().clone();
    let gap = times[1] - times[0];
    assert!(gap >= Duration::from_millis(150) && gap <= Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn test_empty_clipboard_short_circuits() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let outcome = engine.start_typing(tab(), None).unwrap().await.unwrap();

    assert_eq!(outcome, TypingOutcome::NothingToType);
    assert_eq!(driver.inserts(), 0);
    assert_eq!(driver.attaches(), 1);
    assert_eq!(driver.detaches(), 1);
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_used_when_text_missing_or_empty() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "clip");

    engine
        .start_typing(tab(), Some(String::new()))
        .unwrap()
        .await
        .unwrap();

    assert_eq!(driver.typed_text(), "clip");
}

#[tokio::test(start_paused = true)]
async fn test_multibyte_characters_are_typed_whole() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    let outcome = engine
        .start_typing(tab(), Some("héllo 👍".to_string()))
        .unwrap()
        .await
        .unwrap();

    assert_eq!(outcome, TypingOutcome::Completed { typed: 7 });
    assert_eq!(driver.typed_text(), "héllo 👍");
}

#[tokio::test(start_paused = true)]
async fn test_force_paste_inserts_once_and_bypasses_registry() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let driver = Arc::new(MockDriver {
        inserted: Some(tx),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let typing = engine.start_typing(tab(), Some("slow".to_string())).unwrap();
    rx.recv().await;

    let outcome = engine
        .force_paste(&tab(), Some("pasted in one go".to_string()))
        .await;
    assert_eq!(outcome, PasteOutcome::Pasted { chars: 16 });

    // The typing task still owns its tab entry and keeps going.
    assert!(engine.is_typing(&tab()));
    assert_eq!(typing.await.unwrap(), TypingOutcome::Completed { typed: 4 });

    let paste_inserts: Vec<Event> = driver
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Insert(_, text) if text == "pasted in one go"))
        .collect();
    assert_eq!(paste_inserts, vec![Event::Insert("S2".to_string(), "pasted in one go".to_string())]);
    assert!(driver.events().contains(&Event::Detach("S2".to_string())));
    assert_eq!(driver.detaches(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_paste_uses_clipboard() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "from clipboard");

    assert_eq!(
        engine.force_paste(&tab(), None).await,
        PasteOutcome::Pasted { chars: 14 }
    );
    assert_eq!(driver.typed_text(), "from clipboard");
    assert!(engine.registry().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_force_paste_with_nothing_does_not_attach() {
    let driver = Arc::new(MockDriver::default());
    let engine = engine_with(driver.clone(), "");

    assert_eq!(engine.force_paste(&tab(), None).await, PasteOutcome::NothingToPaste);
    assert!(driver.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_force_paste_failure_still_detaches() {
    let driver = Arc::new(MockDriver {
        fail_insert_at: Some(0),
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let outcome = engine.force_paste(&tab(), Some("text".to_string())).await;

    assert!(matches!(outcome, PasteOutcome::InjectionFailed(_)));
    assert_eq!(driver.detaches(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_force_paste_attach_failure() {
    let driver = Arc::new(MockDriver {
        fail_attach: true,
        ..MockDriver::default()
    });
    let engine = engine_with(driver.clone(), "");

    let outcome = engine.force_paste(&tab(), Some("text".to_string())).await;

    assert!(matches!(outcome, PasteOutcome::AttachFailed(_)));
    assert!(driver.events().is_empty());
}
