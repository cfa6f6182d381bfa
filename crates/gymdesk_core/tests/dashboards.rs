use gymdesk_core::event::{noop_notifier, EventBus, EventLog};
use gymdesk_core::model::collections::{ACTIVITY_LOGS, BILLS, MEMBERS, NOTIFICATIONS, USERS};
use gymdesk_core::model::document::{fields_from, Document};
use gymdesk_core::service::catalog_service::{CatalogService, NewDiet, NewSupplement};
use gymdesk_core::service::member_dashboard::MemberDashboard;
use gymdesk_core::service::user_dashboard::UserDashboard;
use gymdesk_core::{
    DocumentStore, MemorySlotStorage, RecordStore, Role, Session, StoreOptions,
};
use serde_json::json;
use std::sync::Arc;

fn admin() -> Session {
    Session::new("jhanvi@gmail.com", "Jhanvi Singh", Role::Admin)
}

fn member() -> Session {
    Session::new("member@gmail.com", "Krishna Sharma", Role::Member)
}

fn user() -> Session {
    Session::new("user@gmail.com", "Regular User", Role::User)
}

struct Gym {
    store: RecordStore<MemorySlotStorage>,
    me: Document,
    other: Document,
}

fn gym() -> Gym {
    let store = RecordStore::in_memory();
    let me = store
        .create(
            MEMBERS,
            fields_from(json!({
                "name": "Krishna Sharma",
                "email": "member@gmail.com",
                "phone": "9876543210",
                "status": "active",
                "joinDate": "2026-01-01",
                "totalPaid": 5000,
                "lastPayment": "2026-01-02",
            })),
        )
        .unwrap();
    let other = store
        .create(
            MEMBERS,
            fields_from(json!({"name": "Shivam", "email": "shivam@gym.com", "status": "active"})),
        )
        .unwrap();
    Gym { store, me, other }
}

fn bill(store: &RecordStore<MemorySlotStorage>, member_id: &str, amount: i64, date: &str, status: &str) -> Document {
    store
        .create(
            BILLS,
            fields_from(json!({
                "memberId": member_id,
                "amount": amount,
                "billDate": date,
                "status": status,
                "receiptNumber": format!("RCP-0000-{amount}"),
            })),
        )
        .unwrap()
}

#[test]
fn member_sees_only_their_own_bills_newest_first() {
    let gym = gym();
    let old = bill(&gym.store, &gym.me.id, 100, "2026-01-01", "paid");
    let new = bill(&gym.store, &gym.me.id, 200, "2026-03-01", "pending");
    let foreign = bill(&gym.store, &gym.other.id, 300, "2026-02-01", "pending");
    let dashboard = MemberDashboard::new(&gym.store, noop_notifier());

    let bills = dashboard.bills(&member()).unwrap();
    let ids: Vec<&str> = bills.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec![new.id.as_str(), old.id.as_str()]);

    assert_eq!(dashboard.bill_details(&member(), &old.id).unwrap().id, old.id);
    assert!(dashboard
        .bill_details(&member(), &foreign.id)
        .unwrap_err()
        .is_not_found());

    assert_eq!(dashboard.outstanding_bills(&member()).unwrap().len(), 1);
    assert_eq!(dashboard.total_outstanding(&member()).unwrap(), 200.0);
}

#[test]
fn receipts_only_for_paid_bills() {
    let gym = gym();
    let paid = bill(&gym.store, &gym.me.id, 100, "2026-01-01", "paid");
    let pending = bill(&gym.store, &gym.me.id, 200, "2026-02-01", "pending");
    let dashboard = MemberDashboard::new(&gym.store, noop_notifier());

    let receipt = dashboard.download_receipt(&member(), &paid.id).unwrap();
    assert_eq!(receipt.receipt_number.as_deref(), Some("RCP-0000-100"));
    assert_eq!(receipt.amount, 100.0);

    let err = dashboard
        .download_receipt(&member(), &pending.id)
        .unwrap_err();
    assert_eq!(err.to_string(), "Receipt only available for paid bills");
}

#[test]
fn notifications_are_scoped_and_markable() {
    let gym = gym();
    let mine_old = gym
        .store
        .create(
            NOTIFICATIONS,
            fields_from(json!({"memberId": gym.me.id, "title": "old", "read": false})),
        )
        .unwrap();
    gym.store
        .create(
            NOTIFICATIONS,
            fields_from(json!({"memberId": gym.me.id, "title": "new", "read": false})),
        )
        .unwrap();
    let theirs = gym
        .store
        .create(
            NOTIFICATIONS,
            fields_from(json!({"memberId": gym.other.id, "title": "x", "read": false})),
        )
        .unwrap();
    let dashboard = MemberDashboard::new(&gym.store, noop_notifier());

    let titles: Vec<String> = dashboard
        .notifications(&member())
        .unwrap()
        .iter()
        .filter_map(|n| n.str_field("title").map(str::to_string))
        .collect();
    assert_eq!(titles, vec!["new", "old"]);
    assert_eq!(dashboard.unread_count(&member()).unwrap(), 2);

    dashboard
        .mark_notification_read(&member(), &mine_old.id)
        .unwrap();
    assert_eq!(dashboard.unread_count(&member()).unwrap(), 1);

    assert!(dashboard
        .mark_notification_read(&member(), &theirs.id)
        .unwrap_err()
        .is_not_found());
    assert_eq!(
        gym.store.read(NOTIFICATIONS, &theirs.id).unwrap().bool_field("read"),
        Some(false)
    );
}

#[test]
fn profile_update_is_limited_and_announced() {
    let gym = gym();
    let bus = Arc::new(EventBus::new());
    let log = EventLog::new();
    log.attach(&bus);
    let dashboard = MemberDashboard::new(&gym.store, bus);

    let updated = dashboard
        .update_profile(
            &member(),
            fields_from(json!({
                "phone": "1111111111",
                "address": "Pune",
                "status": "suspended",
                "totalPaid": 0,
            })),
        )
        .unwrap();
    assert_eq!(updated.str_field("phone"), Some("1111111111"));
    assert_eq!(updated.str_field("address"), Some("Pune"));
    assert_eq!(updated.str_field("status"), Some("active"));
    assert_eq!(updated.f64_field("totalPaid"), Some(5000.0));
    assert_eq!(log.names(), vec!["profile_updated"]);
}

#[test]
fn membership_summary_combines_counts() {
    let gym = gym();
    bill(&gym.store, &gym.me.id, 150, "2026-01-01", "pending");
    bill(&gym.store, &gym.me.id, 250, "2026-02-01", "pending");
    bill(&gym.store, &gym.me.id, 999, "2026-02-01", "paid");
    gym.store
        .create(
            NOTIFICATIONS,
            fields_from(json!({"memberId": gym.me.id, "title": "hi", "read": false})),
        )
        .unwrap();
    let dashboard = MemberDashboard::new(&gym.store, noop_notifier());

    let summary = dashboard.membership_summary(&member()).unwrap();
    assert_eq!(summary.member_id, gym.me.id);
    assert_eq!(summary.name.as_deref(), Some("Krishna Sharma"));
    assert_eq!(summary.outstanding_bills, 2);
    assert_eq!(summary.total_outstanding, 400.0);
    assert_eq!(summary.unread_notifications, 1);
    assert_eq!(summary.total_paid, 5000.0);
    assert_eq!(summary.last_payment, json!("2026-01-02"));
}

#[test]
fn sessions_without_member_record_or_rights_are_refused() {
    let gym = gym();
    let dashboard = MemberDashboard::new(&gym.store, noop_notifier());

    let stranger = Session::new("nobody@gym.com", "Nobody", Role::Member);
    assert!(dashboard.profile(&stranger).unwrap_err().is_not_found());
    assert!(dashboard
        .update_profile(&user(), fields_from(json!({"phone": "1"})))
        .unwrap_err()
        .is_permission_denied());
}

#[test]
fn catalog_is_admin_managed_and_readable_by_all() {
    let store = RecordStore::in_memory();
    let catalog = CatalogService::new(&store);

    let creatine = catalog
        .add_supplement(
            &admin(),
            NewSupplement {
                name: "Creatine".to_string(),
                price: 800.0,
                description: Some("Strength".to_string()),
                extra: Default::default(),
            },
        )
        .unwrap();
    assert!(catalog
        .add_supplement(
            &admin(),
            NewSupplement {
                name: "Free Sample".to_string(),
                price: 0.0,
                ..Default::default()
            },
        )
        .unwrap_err()
        .is_validation());
    assert!(catalog
        .add_supplement(
            &member(),
            NewSupplement {
                name: "Sneaky".to_string(),
                price: 1.0,
                ..Default::default()
            },
        )
        .unwrap_err()
        .is_permission_denied());

    let updated = catalog
        .update_supplement(
            &admin(),
            &creatine.id,
            NewSupplement {
                name: "Creatine HCL".to_string(),
                price: 900.0,
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.fields["price"], json!(900));
    assert_eq!(updated.str_field("description"), Some("Strength"));
    assert_eq!(catalog.supplements(&user()).unwrap().len(), 1);

    let diet = catalog
        .add_diet(
            &admin(),
            NewDiet {
                name: "Keto".to_string(),
                details: "Low carb".to_string(),
                extra: Default::default(),
            },
        )
        .unwrap();
    assert!(catalog
        .add_diet(&admin(), NewDiet::default())
        .unwrap_err()
        .is_validation());
    assert_eq!(catalog.diet(&member(), &diet.id).unwrap().id, diet.id);

    catalog.delete_diet(&admin(), &diet.id).unwrap();
    catalog.delete_supplement(&admin(), &creatine.id).unwrap();
    assert!(catalog.diets(&user()).unwrap().is_empty());
    assert!(catalog
        .supplement(&user(), &creatine.id)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn user_search_spans_members_and_supplements() {
    let store = RecordStore::open(
        MemorySlotStorage::new(),
        StoreOptions {
            seed_defaults: true,
            ..StoreOptions::default()
        },
        noop_notifier(),
    )
    .unwrap();
    let dashboard = UserDashboard::new(&store);

    let results = dashboard.search(&user(), "krish").unwrap();
    assert_eq!(results.members.len(), 1);
    assert!(results.supplements.is_empty());

    let results = dashboard.search(&user(), "STRENGTH").unwrap();
    assert!(results.members.is_empty());
    assert_eq!(results.supplements.len(), 1);
    assert_eq!(results.supplements[0].str_field("name"), Some("Creatine"));

    let phone_only = dashboard.search(&user(), "98765").unwrap();
    assert!(phone_only.is_empty());
}

#[test]
fn user_activity_log_and_summary() {
    let store = RecordStore::in_memory();
    for (user_id, action, at) in [
        ("user@gmail.com", "login", "2026-01-01T08:00:00Z"),
        ("user@gmail.com", "browse", "2026-01-03T08:00:00Z"),
        ("other@gmail.com", "login", "2026-01-04T08:00:00Z"),
        ("user@gmail.com", "search", "2026-01-02T08:00:00Z"),
    ] {
        store
            .create(
                ACTIVITY_LOGS,
                fields_from(json!({"userId": user_id, "action": action, "timestamp": at})),
            )
            .unwrap();
    }
    let dashboard = UserDashboard::new(&store);

    let actions: Vec<String> = dashboard
        .activity_log(&user())
        .unwrap()
        .iter()
        .filter_map(|entry| entry.str_field("action").map(str::to_string))
        .collect();
    assert_eq!(actions, vec!["browse", "search", "login"]);

    let summary = dashboard.dashboard_summary(&user()).unwrap();
    assert_eq!(summary.recent_activity, 3);
    assert_eq!(summary.role, Role::User);
    assert_eq!(summary.supplements_available, 0);
    assert!(dashboard.diets(&user()).unwrap().is_empty());
}

#[test]
fn user_account_hides_password_and_limits_edits() {
    let store = RecordStore::in_memory();
    let account = store
        .create(
            USERS,
            fields_from(json!({
                "email": "user@gmail.com",
                "name": "Regular User",
                "password": "user123",
                "role": "user",
            })),
        )
        .unwrap();
    let dashboard = UserDashboard::new(&store);

    let profile = dashboard.user_profile(&user()).unwrap();
    assert_eq!(profile.id, account.id);
    assert!(profile.fields.get("password").is_none());

    let updated = dashboard
        .update_profile(
            &user(),
            fields_from(json!({
                "bio": "Morning runner",
                "phone": "9000000001",
                "role": "admin",
                "password": "hunter2",
            })),
        )
        .unwrap();
    assert_eq!(updated.str_field("bio"), Some("Morning runner"));
    assert_eq!(updated.str_field("phone"), Some("9000000001"));
    assert!(updated.fields.get("password").is_none());

    let stored = store.read(USERS, &account.id).unwrap();
    assert_eq!(stored.str_field("role"), Some("user"));
    assert_eq!(stored.str_field("password"), Some("user123"));

    let stranger = Session::new("nobody@gym.com", "Nobody", Role::User);
    assert!(dashboard.user_profile(&stranger).unwrap_err().is_not_found());
    assert!(dashboard
        .update_profile(&member(), fields_from(json!({"bio": "x"})))
        .unwrap_err()
        .is_permission_denied());
}
