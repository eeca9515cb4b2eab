use catalog_core::db::open_db_in_memory;
use catalog_core::{
    AllowAll, Category, CategoryId, CategoryService, CategoryServiceError, ErrorKind,
    MoveRequest, ReorderConfig, ReorderError, SqliteCatalogStore, ROOT_CATEGORY_ID,
};
use rusqlite::{params, Connection};

const ADMIN: i64 = 2;

type Service<'conn> = CategoryService<SqliteCatalogStore<'conn>, AllowAll>;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn service(conn: &Connection) -> Service<'_> {
    service_with(conn, ReorderConfig::default())
}

fn service_with(conn: &Connection, config: ReorderConfig) -> Service<'_> {
    let store = SqliteCatalogStore::try_new(conn).unwrap();
    CategoryService::new(store, AllowAll, config).unwrap()
}

fn create(service: &Service<'_>, parent: CategoryId, name: &str) -> Category {
    service.create_category(ADMIN, parent, name).unwrap()
}

fn sibling_keys(service: &Service<'_>, parent: CategoryId) -> Vec<(CategoryId, i64)> {
    service
        .list_children(ADMIN, parent)
        .unwrap()
        .into_iter()
        .map(|category| (category.id, category.sort_order))
        .collect()
}

fn course_keys(service: &Service<'_>, category: CategoryId) -> Vec<(i64, i64)> {
    service
        .list_courses(ADMIN, category)
        .unwrap()
        .into_iter()
        .map(|course| (course.id, course.sort_order))
        .collect()
}

fn set_category_key(conn: &Connection, id: CategoryId, sort_order: i64) {
    conn.execute(
        "UPDATE course_categories SET sortorder = ?2 WHERE id = ?1;",
        params![id, sort_order],
    )
    .unwrap();
}

fn insert_raw_course(conn: &Connection, category: CategoryId, sort_order: i64) -> i64 {
    conn.execute(
        "INSERT INTO courses (category, fullname, shortname, sortorder)
         VALUES (?1, 'Raw course', 'RAW', ?2);",
        params![category, sort_order],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn expect_reorder_error(err: CategoryServiceError) -> ReorderError {
    match err {
        CategoryServiceError::Reorder(inner) => inner,
        other => panic!("expected reorder error, got {other:?}"),
    }
}

#[test]
fn repeated_moves_toward_first_sibling_advance_one_step_each() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let c = create(&service, ROOT_CATEGORY_ID, "C").id;
    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(a, 10_000), (b, 20_000), (c, 30_000)]
    );

    let outcome = service
        .move_category(ADMIN, MoveRequest::toward(c, a))
        .unwrap();
    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(a, 10_000), (c, 20_000), (b, 30_000)]
    );
    assert_eq!(outcome.position, 1);
    assert_eq!(outcome.sort_order, 20_000);
    assert_eq!(outcome.categories_renumbered, 2);
    assert!(!outcome.parent_changed());

    service
        .move_category(ADMIN, MoveRequest::toward(c, a))
        .unwrap();
    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(c, 10_000), (a, 20_000), (b, 30_000)]
    );
}

#[test]
fn move_to_end_places_category_after_every_sibling() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let c = create(&service, ROOT_CATEGORY_ID, "C").id;

    let outcome = service
        .move_category(ADMIN, MoveRequest::to_end(a))
        .unwrap();

    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(b, 10_000), (c, 20_000), (a, 30_000)]
    );
    assert_eq!(outcome.position, 2);
    assert_eq!(outcome.sort_order, 30_000);
}

#[test]
fn distant_before_id_moves_down_a_single_position() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let c = create(&service, ROOT_CATEGORY_ID, "C").id;
    let d = create(&service, ROOT_CATEGORY_ID, "D").id;

    service
        .move_category(ADMIN, MoveRequest::toward(a, d))
        .unwrap();

    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(b, 10_000), (a, 20_000), (c, 30_000), (d, 40_000)]
    );
}

#[test]
fn moving_before_current_successor_leaves_keys_unchanged() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let c = create(&service, ROOT_CATEGORY_ID, "C").id;
    service.create_course(ADMIN, a, "Algebra", "ALG").unwrap();
    let before_courses = course_keys(&service, a);

    let outcome = service
        .move_category(ADMIN, MoveRequest::toward(a, b))
        .unwrap();

    assert_eq!(outcome.categories_renumbered, 0);
    assert_eq!(outcome.courses_renumbered, 0);
    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(a, 10_000), (b, 20_000), (c, 30_000)]
    );
    assert_eq!(course_keys(&service, a), before_courses);
}

#[test]
fn legacy_keys_are_canonicalized_with_id_tie_break() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let c = create(&service, ROOT_CATEGORY_ID, "C").id;
    set_category_key(&conn, a, 3);
    set_category_key(&conn, b, 3);
    set_category_key(&conn, c, 150);

    service
        .move_category(ADMIN, MoveRequest::to_end(c))
        .unwrap();

    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(a, 10_000), (b, 20_000), (c, 30_000)]
    );
}

#[test]
fn courses_follow_their_category_and_keep_relative_order() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    let b_first_by_id = insert_raw_course(&conn, b, 20_009);
    let b_second_by_id = insert_raw_course(&conn, b, 20_002);
    let b_third_by_id = insert_raw_course(&conn, b, 20_005);
    let a_course = service.create_course(ADMIN, a, "Art", "ART").unwrap();
    assert_eq!(a_course.sort_order, 10_001);

    let outcome = service
        .move_category(ADMIN, MoveRequest::toward(b, a))
        .unwrap();

    assert_eq!(outcome.courses_renumbered, 4);
    assert_eq!(
        course_keys(&service, b),
        vec![
            (b_second_by_id, 10_001),
            (b_third_by_id, 10_002),
            (b_first_by_id, 10_003)
        ]
    );
    assert_eq!(course_keys(&service, a), vec![(a_course.id, 20_001)]);

    for (category_id, category_key) in sibling_keys(&service, ROOT_CATEGORY_ID) {
        for (_, course_key) in course_keys(&service, category_id) {
            assert!(
                course_key > category_key && course_key < category_key + 10_000
            );
        }
    }
}

#[test]
fn reparent_appends_under_new_parent_and_leaves_old_siblings_alone() {
    let conn = setup();
    let service = service(&conn);
    let p1 = create(&service, ROOT_CATEGORY_ID, "P1").id;
    let p2 = create(&service, ROOT_CATEGORY_ID, "P2").id;
    let x = create(&service, p1, "X").id;
    let y = create(&service, p1, "Y").id;
    let z = create(&service, p2, "Z").id;
    set_category_key(&conn, z, 10_000);
    let y_before = service.get_category(ADMIN, y).unwrap();

    let outcome = service
        .move_category(ADMIN, MoveRequest::to_end(x).under(p2))
        .unwrap();

    assert!(outcome.parent_changed());
    assert_eq!(outcome.previous_parent, p1);
    assert_eq!(outcome.parent, p2);
    let moved = service.get_category(ADMIN, x).unwrap();
    assert_eq!(moved.parent, p2);
    assert_eq!(sibling_keys(&service, p2), vec![(z, 10_000), (x, 20_000)]);

    let y_after = service.get_category(ADMIN, y).unwrap();
    assert_eq!(y_after.sort_order, y_before.sort_order);
    assert_eq!(sibling_keys(&service, p1), vec![(y, 20_000)]);
}

#[test]
fn reparent_with_before_id_inserts_ahead_of_target() {
    let conn = setup();
    let service = service(&conn);
    let p1 = create(&service, ROOT_CATEGORY_ID, "P1").id;
    let p2 = create(&service, ROOT_CATEGORY_ID, "P2").id;
    let x = create(&service, p1, "X").id;
    let z1 = create(&service, p2, "Z1").id;
    let z2 = create(&service, p2, "Z2").id;

    service
        .move_category(ADMIN, MoveRequest::toward(x, z2).under(p2))
        .unwrap();

    assert_eq!(
        sibling_keys(&service, p2),
        vec![(z1, 10_000), (x, 20_000), (z2, 30_000)]
    );
}

#[test]
fn reparent_to_root_uses_root_sibling_set() {
    let conn = setup();
    let service = service(&conn);
    let top = create(&service, ROOT_CATEGORY_ID, "Top").id;
    let nested = create(&service, top, "Nested").id;

    let outcome = service
        .move_category(
            ADMIN,
            MoveRequest::to_end(nested).under(ROOT_CATEGORY_ID),
        )
        .unwrap();

    assert_eq!(outcome.parent, ROOT_CATEGORY_ID);
    assert_eq!(
        sibling_keys(&service, ROOT_CATEGORY_ID),
        vec![(top, 10_000), (nested, 20_000)]
    );
    assert!(service.list_children(ADMIN, top).unwrap().is_empty());
}

#[test]
fn missing_references_are_not_found() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;

    let missing_id = service
        .move_category(ADMIN, MoveRequest::to_end(404))
        .unwrap_err();
    assert_eq!(missing_id.kind(), ErrorKind::NotFound);
    assert!(matches!(
        expect_reorder_error(missing_id),
        ReorderError::CategoryNotFound(404)
    ));

    let missing_parent = service
        .move_category(ADMIN, MoveRequest::to_end(a).under(405))
        .unwrap_err();
    assert_eq!(missing_parent.kind().http_status(), 404);
    assert!(matches!(
        expect_reorder_error(missing_parent),
        ReorderError::ParentNotFound(405)
    ));

    let missing_before = service
        .move_category(ADMIN, MoveRequest::toward(a, 406))
        .unwrap_err();
    assert_eq!(missing_before.kind().code(), "NOT_FOUND");
    assert!(matches!(
        expect_reorder_error(missing_before),
        ReorderError::BeforeNotFound(406)
    ));
}

#[test]
fn before_id_under_other_parent_is_invalid() {
    let conn = setup();
    let service = service(&conn);
    let p1 = create(&service, ROOT_CATEGORY_ID, "P1").id;
    let p2 = create(&service, ROOT_CATEGORY_ID, "P2").id;
    let x = create(&service, p1, "X").id;
    let z = create(&service, p2, "Z").id;

    let err = service
        .move_category(ADMIN, MoveRequest::toward(x, z))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert_eq!(err.kind().http_status(), 400);
    assert!(matches!(
        expect_reorder_error(err),
        ReorderError::ParentMismatch {
            before_id,
            before_parent,
            target_parent,
        } if before_id == z && before_parent == p2 && target_parent == p1
    ));
    assert_eq!(service.get_category(ADMIN, x).unwrap().parent, p1);
}

#[test]
fn self_referencing_requests_are_invalid() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;

    let self_parent = service
        .move_category(ADMIN, MoveRequest::to_end(a).under(a))
        .unwrap_err();
    assert!(matches!(
        expect_reorder_error(self_parent),
        ReorderError::SelfParent(id) if id == a
    ));

    let before_self = service
        .move_category(ADMIN, MoveRequest::toward(a, a))
        .unwrap_err();
    assert!(matches!(
        expect_reorder_error(before_self),
        ReorderError::BeforeSelf(id) if id == a
    ));
}

#[test]
fn strict_ancestry_rejects_move_under_descendant() {
    let conn = setup();
    let service = service_with(&conn, ReorderConfig::default().strict_ancestry(true));
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, a, "B").id;
    let c = create(&service, b, "C").id;

    let err = service
        .move_category(ADMIN, MoveRequest::to_end(a).under(c))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
    assert!(matches!(
        expect_reorder_error(err),
        ReorderError::CycleDetected { category_id, parent_id }
            if category_id == a && parent_id == c
    ));
    assert_eq!(
        service.get_category(ADMIN, a).unwrap().parent,
        ROOT_CATEGORY_ID
    );
}

#[test]
fn default_ancestry_check_is_shallow() {
    let conn = setup();
    let service = service(&conn);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, a, "B").id;

    service
        .move_category(ADMIN, MoveRequest::to_end(a).under(b))
        .unwrap();

    assert_eq!(service.get_category(ADMIN, a).unwrap().parent, b);
    assert!(service.category_tree(ADMIN).unwrap().is_empty());
}

#[test]
fn exceeding_gap_capacity_fails_and_rolls_back() {
    let conn = setup();
    let config = ReorderConfig::with_sort_gap(3).unwrap();
    let service = service_with(&conn, config);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    service.create_course(ADMIN, a, "One", "ONE").unwrap();
    service.create_course(ADMIN, a, "Two", "TWO").unwrap();
    let refused = service
        .create_course(ADMIN, a, "Three", "THREE")
        .unwrap_err();
    assert!(matches!(
        refused,
        CategoryServiceError::CourseCapacityExceeded { category_id, capacity: 2 }
            if category_id == a
    ));
    insert_raw_course(&conn, a, 6);
    let keys_before = sibling_keys(&service, ROOT_CATEGORY_ID);
    let courses_before = course_keys(&service, a);

    let err = service
        .move_category(ADMIN, MoveRequest::toward(b, a))
        .unwrap_err();

    assert_eq!(err.kind().code(), "GAP_CAPACITY_EXCEEDED");
    assert!(matches!(
        expect_reorder_error(err),
        ReorderError::GapCapacityExceeded { category_id, course_count: 3, gap: 3 }
            if category_id == a
    ));
    assert_eq!(sibling_keys(&service, ROOT_CATEGORY_ID), keys_before);
    assert_eq!(course_keys(&service, a), courses_before);
}

#[test]
fn storage_failure_mid_renumber_rolls_back_every_write() {
    let conn = setup();
    let service = service(&conn);
    let p1 = create(&service, ROOT_CATEGORY_ID, "P1").id;
    let p2 = create(&service, ROOT_CATEGORY_ID, "P2").id;
    let moving = create(&service, p1, "Moving").id;
    let z1 = create(&service, p2, "Z1").id;
    let z2 = create(&service, p2, "Z2").id;
    set_category_key(&conn, z1, 5);
    let p2_before = sibling_keys(&service, p2);

    conn.execute_batch(&format!(
        "CREATE TRIGGER course_categories_fail_sort_update_test
         BEFORE UPDATE OF sortorder ON course_categories
         WHEN NEW.id = {z2}
         BEGIN
             SELECT RAISE(ABORT, 'forced sort failure');
         END;"
    ))
    .unwrap();

    let err = service
        .move_category(ADMIN, MoveRequest::toward(moving, z1).under(p2))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(err.kind().http_status(), 500);
    assert!(matches!(expect_reorder_error(err), ReorderError::Store(_)));
    assert_eq!(service.get_category(ADMIN, moving).unwrap().parent, p1);
    assert_eq!(sibling_keys(&service, p2), p2_before);
    assert_eq!(sibling_keys(&service, p1), vec![(moving, 10_000)]);
}

#[test]
fn oversized_gap_reports_key_overflow_and_rolls_back() {
    let conn = setup();
    let config = ReorderConfig::with_sort_gap(i64::MAX / 2).unwrap();
    let service = service_with(&conn, config);
    let a = create(&service, ROOT_CATEGORY_ID, "A").id;
    let b = create(&service, ROOT_CATEGORY_ID, "B").id;
    conn.execute(
        "INSERT INTO course_categories (name, parent, sortorder) VALUES ('C', 0, ?1);",
        [i64::MAX],
    )
    .unwrap();
    let c = conn.last_insert_rowid();
    let keys_before = sibling_keys(&service, ROOT_CATEGORY_ID);
    assert_eq!(
        keys_before,
        vec![(a, i64::MAX / 2), (b, i64::MAX - 1), (c, i64::MAX)]
    );

    let err = service
        .move_category(ADMIN, MoveRequest::to_end(a))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::KeyOverflow);
    assert_eq!(err.kind().code(), "SORT_KEY_OVERFLOW");
    assert_eq!(err.kind().http_status(), 500);
    assert!(matches!(
        expect_reorder_error(err),
        ReorderError::SortKeyOverflow { category_id } if category_id == a
    ));
    assert_eq!(sibling_keys(&service, ROOT_CATEGORY_ID), keys_before);
}
