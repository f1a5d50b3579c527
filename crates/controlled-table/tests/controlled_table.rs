//! End-to-end tests of the commit, regenerate, editing and controlled-state flows.

use std::sync::Arc;

use controlled_table::prelude::*;
use controlled_table::{EditState, IgnoreReason, Person, PersonGenerator, person_columns};
use parking_lot::Mutex;

fn ann() -> Person {
    Person::new("Ann", "Lee", 30, 12, "single", 80)
}

fn store(rows: Vec<Person>) -> RowStore<Person> {
    RowStore::new(Arc::new(person_columns().unwrap()), rows)
}

/// A table whose generator yields `P0`, `P1`, ... with age equal to the index.
fn numbered_table(rows: usize, page_size: usize) -> ControlledTable<Person, impl FnMut() -> Person> {
    let mut next = 0u32;
    let generator = move || {
        let person = Person::new(format!("P{next}"), "Doe", next, next * 2, "single", 50);
        next += 1;
        person
    };
    let config = TableConfig {
        initial_row_count: rows,
        page_size,
        ..TableConfig::default()
    };
    ControlledTable::new(config, person_columns().unwrap(), generator)
}

#[test]
fn commit_replaces_only_the_target_slot() {
    let store = store(vec![ann(), Person::new("Bob", "Kim", 41, 3, "complicated", 10)]);
    let before: Vec<Person> = store.snapshot().iter().map(|p| (**p).clone()).collect();

    let outcome = store.commit(0, "firstName", CellValue::from("Anna"));
    assert!(outcome.is_applied());

    let after: Vec<Person> = store.snapshot().iter().map(|p| (**p).clone()).collect();
    assert_eq!(after[0].first_name, CellValue::from("Anna"));
    assert_eq!(
        Person {
            first_name: CellValue::from("Ann"),
            ..after[0].clone()
        },
        before[0]
    );
    assert_eq!(after[1], before[1]);

    let entry = store.change_log().latest().unwrap();
    assert_eq!(entry.row_index, 0);
    assert_eq!(entry.column_id, "firstName");
    assert_eq!(entry.old_value, CellValue::from("Ann"));
    assert_eq!(entry.new_value, CellValue::from("Anna"));
}

#[test]
fn committing_the_current_value_is_idempotent() {
    let store = store(vec![ann()]);
    let before = (*store.get(0).unwrap()).clone();

    let outcome = store.commit(0, "status", CellValue::from("single"));
    let entry = outcome.entry().unwrap();
    assert_eq!(entry.old_value, entry.new_value);
    assert_eq!(*store.get(0).unwrap(), before);
}

#[test]
fn out_of_range_commit_changes_nothing() {
    let store = store(vec![ann(), ann(), ann()]);
    let before = store.snapshot();

    let outcome = store.commit(5, "age", CellValue::from("40"));
    assert_eq!(
        outcome,
        CommitOutcome::Ignored(IgnoreReason::RowOutOfRange {
            row_index: 5,
            len: 3
        })
    );
    assert!(Arc::ptr_eq(&before, &store.snapshot()));
    assert!(store.change_log().latest().is_none());
}

#[test]
fn regenerate_yields_exact_count_and_clears_log() {
    let store = store(vec![ann()]);
    let _ = store.commit(0, "firstName", CellValue::from("Anna"));
    assert!(!store.change_log().is_empty());

    let mut generator = PersonGenerator::new(Some(99));
    store.regenerate(8, &mut generator);
    assert_eq!(store.len(), 8);
    assert!(store.change_log().latest().is_none());

    for count in [0, 1, 25] {
        store.regenerate(count, &mut generator);
        assert_eq!(store.len(), count);
    }
}

#[test]
fn edit_then_blur_commits_and_logs() {
    let mut table = numbered_table(3, 10);
    let key = CellKey::new(0, "firstName");

    table.handle(TableEvent::Focus(key.clone()));
    table.handle(TableEvent::Input(key.clone(), "Anna".into()));
    assert!(table.change_log().is_none());

    let outcome = table.handle(TableEvent::Blur(key.clone())).unwrap();
    assert!(outcome.is_applied());
    assert_eq!(
        table.change_log().as_deref(),
        Some("Row index: 0\nColumn Id: firstName\nOld value: P0\nNew value: Anna")
    );

    let buffer = table.editor().buffer(&key).unwrap();
    assert_eq!(buffer.draft(), "Anna");
    assert_eq!(buffer.state(), EditState::Clean);
}

#[test]
fn blur_on_untouched_cell_commits_same_value() {
    let mut table = numbered_table(3, 10);
    let key = CellKey::new(2, "age");

    let before = table.data_json().unwrap();

    table.handle(TableEvent::Focus(key.clone()));
    let outcome = table.handle(TableEvent::Blur(key)).unwrap();
    let entry = outcome.entry().unwrap();
    assert!(entry.is_noop());
    assert_eq!(entry.new_value, CellValue::Int(2));
    assert_eq!(table.store().get(2).unwrap().age, CellValue::Int(2));
    assert_eq!(table.data_json().unwrap(), before);
}

#[test]
fn focusing_another_cell_commits_the_first() {
    let mut table = numbered_table(3, 10);
    let a = CellKey::new(0, "status");
    let b = CellKey::new(1, "status");

    table.handle(TableEvent::Focus(a.clone()));
    table.handle(TableEvent::Input(a, "complicated".into()));
    let outcome = table.handle(TableEvent::Focus(b.clone())).unwrap();

    assert_eq!(outcome.entry().unwrap().row_index, 0);
    assert_eq!(
        table.store().get(0).unwrap().status,
        CellValue::from("complicated")
    );
    assert_eq!(table.editor().focused(), Some(&b));
}

#[test]
fn clean_buffer_follows_external_commit() {
    let mut table = numbered_table(3, 10);
    let key = CellKey::new(1, "lastName");

    let _ = table.commit(1, "lastName", CellValue::from("Smith"));
    assert_eq!(table.editor().buffer(&key).unwrap().draft(), "Smith");
}

#[test]
fn regenerate_discards_dirty_draft() {
    let mut table = numbered_table(3, 10);
    let key = CellKey::new(0, "firstName");

    table.handle(TableEvent::Focus(key.clone()));
    table.handle(TableEvent::Input(key.clone(), "draft".into()));
    assert!(table.editor().buffer(&key).unwrap().is_dirty());

    table.handle(TableEvent::Regenerate);

    // The generator keeps counting, so row 0 is now P3.
    let buffer = table.editor().buffer(&key).unwrap();
    assert_eq!(buffer.draft(), "P3");
    assert!(!buffer.is_dirty());
    assert!(table.change_log().is_none());

    let frame = table.render();
    assert_eq!(frame.rows[0][0].content, "P3");
}

#[test]
fn stale_blur_after_regenerate_to_fewer_rows_is_ignored() {
    let mut table = numbered_table(8, 10);
    let key = CellKey::new(7, "firstName");
    table.handle(TableEvent::Input(key.clone(), "Zed".into()));

    table.regenerate_with(3);
    assert_eq!(table.handle(TableEvent::Blur(key)), None);
    assert_eq!(table.store().len(), 3);
    assert!(table.change_log().is_none());
}

#[test]
fn commits_on_a_sorted_page_hit_the_right_record() {
    let mut table = numbered_table(12, 5);
    table.handle(TableEvent::State(StateUpdate::ToggleSort {
        column_id: "age".into(),
        multi: false,
    }));
    table.handle(TableEvent::State(StateUpdate::ToggleSort {
        column_id: "age".into(),
        multi: false,
    }));

    // Descending age: the first visible row is store row 11.
    let frame = table.render();
    let top = &frame.rows[0][0];
    assert_eq!(top.key, CellKey::new(11, "firstName"));

    table.handle(TableEvent::Input(top.key.clone(), "Eleven".into()));
    table.handle(TableEvent::Blur(top.key.clone()));
    assert_eq!(
        table.store().get(11).unwrap().first_name,
        CellValue::from("Eleven")
    );
}

#[test]
fn host_observes_every_state_transition() {
    let mut table = numbered_table(25, 10);
    let pages = Arc::new(Mutex::new(Vec::new()));

    let pages_clone = pages.clone();
    table.bridge().state_changed().connect(move |state| {
        pages_clone.lock().push(state.pagination.page_index);
    });

    table.handle(TableEvent::State(StateUpdate::NextPage));
    table.handle(TableEvent::State(StateUpdate::NextPage));
    table.handle(TableEvent::State(StateUpdate::NextPage));
    table.handle(TableEvent::State(StateUpdate::FirstPage));

    assert_eq!(*pages.lock(), vec![1, 2, 0]);
    assert_eq!(table.render().page_index, 0);
}

#[test]
fn host_override_drives_the_projection() {
    let mut table = numbered_table(25, 10);
    let mut state = table.state();
    state.pagination.page_index = 2;
    state.column_visibility.insert("visits".into(), false);

    assert!(table.override_state(state));
    let frame = table.render();
    assert_eq!(frame.page_index, 2);
    assert_eq!(frame.rows.len(), 5);
    assert_eq!(frame.header_rows[0].len(), 5);
    assert_eq!(table.builder().state(), table.state());
}

#[test]
fn uncontrolled_builder_manages_its_own_state() {
    let store = Arc::new(store((0..30).map(|_| ann()).collect()));
    let builder = ViewModelBuilder::new(store, TableState::with_page_size(10));
    assert!(!builder.options().is_controlled());

    builder.dispatch(StateUpdate::LastPage);
    assert_eq!(builder.state().pagination.page_index, 2);
    assert_eq!(builder.view().rows.len(), 10);
}

#[test]
fn table_data_dumps_as_pretty_json() {
    let mut table = numbered_table(2, 10);
    let _ = table.commit(1, "age", CellValue::from("40"));

    let json: serde_json::Value = serde_json::from_str(&table.data_json().unwrap()).unwrap();
    assert_eq!(json[0]["firstName"], "P0");
    assert_eq!(json[0]["age"], 0);
    assert_eq!(json[1]["age"], "40");
    assert_eq!(json.as_array().unwrap().len(), 2);
}
