//! Session listing scopes, owner-restricted mutations and the member
//! calendar view.

mod common;

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use studio::audit::{self, Action};
use studio::models::calendar::{self, MonthKey, Range};
use studio::models::class_session::{self, Scope, SessionStatus, SessionWrite};

use common::{create_instructor, create_member, setup_test_db};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 5, day, hour, 0, 0).unwrap()
}

fn may_2030() -> Range {
    calendar::month_range(MonthKey { year: 2030, month: 5 }, FixedOffset::east_opt(0).unwrap())
}

fn lesson(title: &str, starts_at: DateTime<Utc>, instructor: i64, member: Option<i64>) -> SessionWrite {
    SessionWrite {
        title: title.to_string(),
        starts_at,
        ends_at: Some(starts_at + Duration::minutes(50)),
        status: SessionStatus::Scheduled,
        location: Some("Studio A".to_string()),
        memo: None,
        instructor_id: Some(instructor),
        member_id: member,
    }
}

#[tokio::test]
async fn test_list_in_range_respects_scope() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let yui = create_instructor(pool, "yui@example.com", "Yui").await;
    let rin = create_instructor(pool, "rin@example.com", "Rin").await;
    let mia = create_member(pool, "mia@example.com", "Mia", "member").await;

    let a = class_session::create(pool, &lesson("Yui + Mia", at(3, 10), yui, Some(mia))).await.unwrap();
    let b = class_session::create(pool, &lesson("Rin group", at(2, 9), rin, None)).await.unwrap();
    class_session::create(pool, &lesson("June class", at(31, 23) + Duration::hours(2), yui, None))
        .await
        .unwrap();

    let all = class_session::list_in_range(pool, may_2030(), Scope::All, false).await.unwrap();
    let ids: Vec<i64> = all.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![b, a], "ordered by start, June excluded");
    assert_eq!(all[1].instructor_name.as_deref(), Some("Yui"));
    assert_eq!(all[1].member_email.as_deref(), Some("mia@example.com"));

    let yuis = class_session::list_in_range(pool, may_2030(), Scope::Instructor(yui), false).await.unwrap();
    assert_eq!(yuis.len(), 1);
    assert_eq!(yuis[0].id, a);

    let mias = class_session::list_in_range(pool, may_2030(), Scope::Member(mia), false).await.unwrap();
    assert_eq!(mias.len(), 1);
    assert_eq!(mias[0].id, a);

    db.teardown().await;
}

#[tokio::test]
async fn test_canceled_sessions_are_hidden_unless_asked() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let yui = create_instructor(pool, "yui@example.com", "Yui").await;
    let mut canceled = lesson("Called off", at(10, 10), yui, None);
    canceled.status = SessionStatus::Canceled;
    let id = class_session::create(pool, &canceled).await.unwrap();

    assert!(class_session::list_in_range(pool, may_2030(), Scope::All, false).await.unwrap().is_empty());
    let shown = class_session::list_in_range(pool, may_2030(), Scope::All, true).await.unwrap();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, id);
    assert_eq!(shown[0].status(), SessionStatus::Canceled);

    db.teardown().await;
}

#[tokio::test]
async fn test_mutations_are_limited_to_the_owner() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let yui = create_instructor(pool, "yui@example.com", "Yui").await;
    let rin = create_instructor(pool, "rin@example.com", "Rin").await;
    let id = class_session::create(pool, &lesson("Yoga", at(5, 10), yui, None)).await.unwrap();

    // Another instructor matches nothing.
    assert!(!class_session::update_title(pool, id, "Hijacked", Some(rin)).await.unwrap());
    assert!(!class_session::update_time(pool, id, at(6, 10), at(6, 11), Some(rin)).await.unwrap());
    assert!(!class_session::delete(pool, id, Some(rin)).await.unwrap());

    assert!(class_session::update_title(pool, id, "Morning yoga", Some(yui)).await.unwrap());
    assert!(class_session::update_time(pool, id, at(6, 10), at(6, 11), Some(yui)).await.unwrap());

    let row = class_session::find_by_id(pool, id).await.unwrap().unwrap();
    assert_eq!(row.title, "Morning yoga");
    assert_eq!(row.starts_at, at(6, 10));
    assert_eq!(row.ends_at, Some(at(6, 11)));

    // Admins pass no owner.
    assert!(class_session::delete(pool, id, None).await.unwrap());
    assert!(class_session::find_by_id(pool, id).await.unwrap().is_none());

    db.teardown().await;
}

#[tokio::test]
async fn test_update_keeps_instructor_when_none_given() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let yui = create_instructor(pool, "yui@example.com", "Yui").await;
    let rin = create_instructor(pool, "rin@example.com", "Rin").await;
    let id = class_session::create(pool, &lesson("Pilates", at(7, 18), yui, None)).await.unwrap();

    let mut edit = lesson("Pilates", at(7, 19), yui, None);
    edit.instructor_id = None;
    edit.status = SessionStatus::Completed;
    edit.memo = Some("bring a mat".into());
    assert!(class_session::update(pool, id, &edit, None).await.unwrap());

    let row = class_session::find_by_id(pool, id).await.unwrap().unwrap();
    assert_eq!(row.instructor_id, Some(yui));
    assert_eq!(row.status(), SessionStatus::Completed);
    assert_eq!(row.memo.as_deref(), Some("bring a mat"));

    edit.instructor_id = Some(rin);
    assert!(class_session::update(pool, id, &edit, None).await.unwrap());
    let row = class_session::find_by_id(pool, id).await.unwrap().unwrap();
    assert_eq!(row.instructor_id, Some(rin));

    db.teardown().await;
}

#[tokio::test]
async fn test_member_calendar_view() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let yui = create_instructor(pool, "yui@example.com", "Yui").await;
    let mia = create_member(pool, "mia@example.com", "Mia", "member").await;

    let mut open_ended = lesson("Trial", at(12, 9), yui, Some(mia));
    open_ended.ends_at = None;
    let id = class_session::create(pool, &open_ended).await.unwrap();
    class_session::create(pool, &lesson("Group", at(12, 11), yui, None)).await.unwrap();

    let events = class_session::member_calendar(pool, mia, may_2030()).await.unwrap();
    assert_eq!(events.len(), 1);
    let e = &events[0];
    assert_eq!(e.event_id, id);
    assert_eq!(e.ends_at, e.starts_at, "missing end falls back to start");
    assert_eq!(e.instructor_name.as_deref(), Some("Yui"));

    db.teardown().await;
}

#[tokio::test]
async fn test_audit_entries_are_written() {
    let Some(db) = setup_test_db().await else { return };
    let pool = db.pool();

    let admin = create_member(pool, "admin@example.com", "Admin", "admin").await;
    audit::try_log(pool, admin, Action::SessionDeleted, 77, "Yoga").await.unwrap();
    audit::log(pool, admin, Action::PassGranted, 5, "8 sessions").await;

    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT action, target_type, target_id FROM audit_log ORDER BY id")
            .fetch_all(pool)
            .await
            .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, Action::SessionDeleted.as_str());
    assert_eq!(rows[0].1, "class_session");
    assert_eq!(rows[0].2, 77);
    assert_eq!(rows[1].1, "pass");

    db.teardown().await;
}
