mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{entries, harness, journal, Probe, Script};
use tickwork::backend::GraphicsCommand;
use tickwork::components::{SpriteComponent, WindowComponent};
use tickwork::ecs::RegistrationError;
use tickwork::engine::{EngineError, ExitCode, Outcome, Phase};
use tickwork::Entity;

#[test]
fn test_hooks_run_in_registration_then_insertion_order() {
    let journal = journal();
    let mut first = Entity::new("first");
    for tag in ["a1", "a2", "a3"] {
        first.add_component(Probe::new(tag, &journal)).unwrap();
    }
    let mut second = Entity::new("second");
    for tag in ["b1", "b2"] {
        second.add_component(Probe::new(tag, &journal)).unwrap();
    }

    let mut h = harness();
    let mut app = Script::new(&journal)
        .with_entity(first)
        .with_entity(second)
        .run_for(2);
    let outcome = h.engine.run(&mut app).unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(outcome.status(), 0);

    let updates = ["update:a1", "update:a2", "update:a3", "update:b1", "update:b2"];
    let mut expected = vec!["app:enter"];
    expected.extend(["start:a1", "start:a2", "start:a3", "start:b1", "start:b2"]);
    expected.push("app:update");
    expected.extend(updates);
    expected.push("app:update");
    expected.extend(updates);
    expected.extend(["app:update", "app:exit"]);
    expected.extend(["exit:a1", "exit:a2", "exit:a3", "drop:a1", "drop:a2", "drop:a3"]);
    expected.extend(["exit:b1", "exit:b2", "drop:b1", "drop:b2"]);
    assert_eq!(*journal.borrow(), expected);
}

#[test]
fn test_teardown_empties_world_and_terminates_backend() {
    let journal = journal();
    let mut entity = Entity::new("windowed");
    entity
        .add_component(WindowComponent::new("T", 800, 600))
        .unwrap();
    entity.add_component(Probe::new("p", &journal)).unwrap();

    let mut h = harness();
    let mut app = Script::new(&journal).with_entity(entity).run_for(3);
    h.engine.run(&mut app).unwrap();

    assert_eq!(h.engine.phase(), Phase::Terminated);
    assert!(h.engine.world().is_empty());
    assert_eq!(h.engine.ticks(), 3);
    assert_eq!(h.engine.recent_stats().count(), 3);
    assert_eq!(h.windows.windows_created(), 1);
    assert_eq!(h.windows.live_windows(), 0);
    assert!(h.windows.is_terminated());
    assert_eq!(entries(&journal, "drop:"), vec!["drop:p"]);
}

#[test]
fn test_window_and_sprite_scenario_exits_cleanly() {
    let journal = journal();
    let mut entity = Entity::new("scene");
    let window = entity
        .add_component(WindowComponent::new("T", 800, 600))
        .unwrap();
    entity.add_component(SpriteComponent::new(window)).unwrap();
    let entity_id = entity.identity();

    let mut h = harness();
    let handle = h.windows.clone();
    let mut app = Script::new(&journal)
        .with_entity(entity)
        .on_update(move |world, tick| {
            let closed = world
                .window(&entity_id, &window)
                .map_or(true, |w| w.closed());
            if closed {
                return ExitCode::Exit;
            }
            if tick == 3 {
                handle.close(window.identity());
            }
            ExitCode::Success
        });
    app.exit = ExitCode::Exit;

    let outcome = h.engine.run(&mut app).unwrap();
    assert_eq!(outcome.status(), 0);
    assert_eq!(app.ticks, 4);

    let commands = h.graphics.commands();
    let initialized = commands
        .iter()
        .position(|c| *c == GraphicsCommand::Initialize)
        .unwrap();
    let created = commands
        .iter()
        .position(|c| matches!(c, GraphicsCommand::CreateMesh { .. }))
        .unwrap();
    assert!(initialized < created, "window must start before the sprite");

    let draws = h.graphics.draws();
    assert_eq!(draws.len(), 3);
    assert!(draws.iter().all(|d| d.window == window.identity()));
    assert!(draws.iter().all(|d| d.index_count == 6));
    assert_eq!(h.windows.presents(window.identity()), 3);

    assert!(matches!(
        commands.last(),
        Some(GraphicsCommand::ReleaseMesh(_))
    ));
    assert_eq!(h.graphics.live_meshes(), 0);
    assert!(!h.windows.is_alive(window.identity()));
    assert!(h.engine.world().is_empty());
}

#[test]
fn test_registration_after_start_is_rejected() {
    let journal = journal();
    let rejected = Rc::new(Cell::new(false));
    let seen = Rc::clone(&rejected);

    let mut h = harness();
    let mut app = Script::new(&journal)
        .with_entity(Entity::new("early"))
        .on_update(move |world, _| {
            let late = Entity::new("late");
            let id = late.identity();
            seen.set(world.add_entity(late) == Err(RegistrationError::Late(id)));
            ExitCode::Exit
        });

    h.engine.run(&mut app).unwrap();
    assert!(rejected.get());
}

#[test]
fn test_duplicate_entity_is_rejected() {
    let mut h = harness();
    let entity = Entity::new("one");
    let twin = Entity::with_identity(entity.identity(), "two");
    let world = h.engine.world_mut();

    world.add_entity(entity).unwrap();
    assert!(matches!(
        world.add_entity(twin),
        Err(RegistrationError::Duplicate(_))
    ));
    assert_eq!(world.len(), 1);
}

#[test]
fn test_engine_runs_only_once() {
    let journal = journal();
    let mut h = harness();
    let mut app = Script::new(&journal);
    h.engine.run(&mut app).unwrap();

    assert!(matches!(
        h.engine.run(&mut app),
        Err(EngineError::AlreadyRan)
    ));
    assert_eq!(entries(&journal, "app:enter").len(), 1);
}
