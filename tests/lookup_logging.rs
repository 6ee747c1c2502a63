mod common;

use std::cell::RefCell;
use std::sync::Once;

use common::{harness, journal, Script};
use log::{Level, LevelFilter, Log, Metadata, Record};
use tickwork::components::{SpriteComponent, WindowComponent};
use tickwork::event::{RawEvent, WindowResizeEvent};
use tickwork::{Entity, Identity, World};

/// Keeps every record logged on the current thread.
struct Capture;

thread_local! {
    static RECORDS: RefCell<Vec<(Level, String)>> = RefCell::new(Vec::new());
}

impl Log for Capture {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;
static INSTALL: Once = Once::new();

/// Runs `f` and returns what it logged on this thread.
fn captured<R>(f: impl FnOnce() -> R) -> (R, Vec<(Level, String)>) {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
    let result = f();
    let records = RECORDS.with(|records| records.borrow_mut().drain(..).collect());
    (result, records)
}

fn count(records: &[(Level, String)], level: Level) -> usize {
    records.iter().filter(|(l, _)| *l == level).count()
}

#[test]
fn test_unknown_component_lookup_logs_one_error() {
    let mut entity = Entity::new("lookup");
    let window = entity
        .add_component(WindowComponent::new("W", 640, 480))
        .unwrap();
    let bad = Identity::generate();

    let (absent, records) = captured(|| entity.component::<SpriteComponent>(&bad).is_none());
    assert!(absent);
    assert_eq!(count(&records, Level::Error), 1);
    assert!(records[0].1.contains(&bad.to_string()));

    let (absent, records) = captured(|| entity.component_mut::<SpriteComponent>(&bad).is_none());
    assert!(absent);
    assert_eq!(count(&records, Level::Error), 1);

    // a known identity of the wrong type is not an error
    let (absent, records) =
        captured(|| entity.component::<SpriteComponent>(&window.identity()).is_none());
    assert!(absent);
    assert_eq!(count(&records, Level::Error), 0);
}

#[test]
fn test_unknown_entity_lookup_logs_one_error() {
    let mut world = World::new();
    let known = world.add_entity(Entity::new("known")).unwrap();
    let bad = Identity::generate();

    let (absent, records) = captured(|| world.entity(&bad).is_none());
    assert!(absent);
    assert_eq!(count(&records, Level::Error), 1);

    let (absent, records) = captured(|| world.entity_mut(&bad).is_none());
    assert!(absent);
    assert_eq!(count(&records, Level::Error), 1);

    let (found, records) = captured(|| world.entity(&known).is_some());
    assert!(found);
    assert_eq!(count(&records, Level::Error), 0);
}

#[test]
fn test_dropped_events_are_reported_once() {
    let journal = journal();
    let mut entity = Entity::new("target");
    entity
        .add_component(WindowComponent::new("W", 800, 600))
        .unwrap();
    let entity_id = entity.identity();
    let stranger = Identity::generate();
    let missing_window = Identity::generate();

    let (_, records) = captured(|| {
        let mut h = harness();
        let handle = h.windows.clone();
        let mut app = Script::new(&journal)
            .with_entity(entity)
            .on_update(move |_, tick| {
                if tick > 1 {
                    return tickwork::ExitCode::Exit;
                }
                let event = WindowResizeEvent {
                    width: 1,
                    height: 1,
                };
                handle.push_raw(RawEvent::new(event, missing_window, stranger));
                handle.push_raw(RawEvent::new(event, missing_window, entity_id));
                tickwork::ExitCode::Success
            });
        h.engine.run(&mut app).unwrap();
    });

    for id in [stranger, missing_window] {
        let mentions: Vec<_> = records
            .iter()
            .filter(|(_, message)| message.contains(&id.to_string()))
            .collect();
        assert_eq!(mentions.len(), 1, "{id} reported {mentions:?}");
        assert_eq!(mentions[0].0, Level::Warn);
    }
}
