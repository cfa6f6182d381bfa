use gymdesk_core::model::collections::{BILLS, MEMBERS};
use gymdesk_core::model::document::fields_from;
use gymdesk_core::service::report_service::{summarize_bills, ReportService, UNKNOWN_MONTH};
use gymdesk_core::{DocumentStore, Filter, MemorySlotStorage, RecordStore, Role, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

fn admin() -> Session {
    Session::new("jhanvi@gmail.com", "Jhanvi Singh", Role::Admin)
}

fn store_with(bills: &[Value], members: &[Value]) -> RecordStore<MemorySlotStorage> {
    let store = RecordStore::in_memory();
    for bill in bills {
        store.create(BILLS, fields_from(bill.clone())).unwrap();
    }
    for member in members {
        store.create(MEMBERS, fields_from(member.clone())).unwrap();
    }
    store
}

#[test]
fn empty_store_reports_zero_rates() {
    let store = RecordStore::in_memory();
    let reports = ReportService::new(&store);

    let billing = reports.billing_report(&admin(), false).unwrap();
    assert_eq!(billing.total_amount, 0.0);
    assert_eq!(billing.collection_rate, 0.0);

    let revenue = reports.revenue_report(&admin()).unwrap();
    assert!(revenue.monthly_revenue.is_empty());
    assert_eq!(revenue.average_monthly_revenue, 0.0);

    let metrics = reports.performance_metrics(&admin()).unwrap();
    assert_eq!(metrics.member_retention_rate, 0.0);
    assert_eq!(metrics.bill_payment_rate, 0.0);
}

#[test]
fn billing_amounts_partition_the_total() {
    let bill_sets = [
        vec![],
        vec![json!({"amount": 100, "status": "paid"})],
        vec![
            json!({"amount": 100.5, "status": "paid"}),
            json!({"amount": 200, "status": "pending"}),
            json!({"amount": 50, "status": "refunded"}),
            json!({"amount": 25, "status": "waived"}),
            json!({"status": "pending"}),
        ],
    ];
    for bills in bill_sets {
        let store = store_with(&bills, &[]);
        let report = summarize_bills(store.read_all(BILLS, &Filter::all()).unwrap(), false);
        let parts = report.paid_amount + report.pending_amount + report.other_amount;
        assert_eq!(parts, report.total_amount);
    }
}

#[test]
fn cent_amounts_partition_the_total_exactly() {
    let mut rng = StdRng::seed_from_u64(7);
    let statuses = ["paid", "pending", "overdue"];
    for _ in 0..500 {
        let bills: Vec<Value> = (0..6)
            .map(|_| {
                let cents: u32 = rng.gen_range(1..1_000_000);
                json!({
                    "amount": f64::from(cents) / 100.0,
                    "status": statuses[rng.gen_range(0..statuses.len())],
                })
            })
            .collect();
        let store = store_with(&bills, &[]);
        let report = summarize_bills(store.read_all(BILLS, &Filter::all()).unwrap(), false);
        assert_eq!(
            report.paid_amount + report.pending_amount + report.other_amount,
            report.total_amount
        );
    }

    let report = summarize_bills(
        store_with(
            &[
                json!({"amount": 0.1, "status": "paid"}),
                json!({"amount": 0.2, "status": "pending"}),
                json!({"amount": 0.3, "status": "overdue"}),
            ],
            &[],
        )
        .read_all(BILLS, &Filter::all())
        .unwrap(),
        false,
    );
    assert_eq!(report.other_amount, 0.3);
    assert_eq!(
        report.paid_amount + report.pending_amount + report.other_amount,
        report.total_amount
    );
}

#[test]
fn member_report_counts_statuses() {
    let store = store_with(
        &[],
        &[
            json!({"name": "A", "status": "active"}),
            json!({"name": "B", "status": "active"}),
            json!({"name": "C", "status": "suspended"}),
            json!({"name": "D", "status": "inactive"}),
        ],
    );
    let reports = ReportService::new(&store);

    let summary = reports.member_report(&admin(), false).unwrap();
    assert_eq!(summary.total_members, 4);
    assert_eq!(summary.active_members, 2);
    assert_eq!(summary.inactive_members, 1);
    assert_eq!(summary.suspended_members, 1);
    assert!(summary.members.is_none());

    let detailed = reports.member_report(&admin(), true).unwrap();
    assert_eq!(detailed.members.unwrap().len(), 4);

    let metrics = reports.performance_metrics(&admin()).unwrap();
    assert_eq!(metrics.member_retention_rate, 50.0);
}

#[test]
fn revenue_groups_paid_bills_by_month() {
    let store = store_with(
        &[
            json!({"amount": 1000, "status": "paid", "paidDate": "2026-01-05T10:00:00.000Z"}),
            json!({"amount": 500, "status": "paid", "paidDate": "2026-01-20"}),
            json!({"amount": 3000, "status": "paid", "paidDate": "2026-02-01T00:00:00Z"}),
            json!({"amount": 700, "status": "paid", "paidDate": null}),
            json!({"amount": 9999, "status": "pending", "paidDate": "2026-02-01"}),
        ],
        &[],
    );
    let reports = ReportService::new(&store);

    let revenue = reports.revenue_report(&admin()).unwrap();
    assert_eq!(revenue.total_revenue, 5200.0);
    assert_eq!(revenue.monthly_revenue["2026-01"], 1500.0);
    assert_eq!(revenue.monthly_revenue["2026-02"], 3000.0);
    assert_eq!(revenue.monthly_revenue[UNKNOWN_MONTH], 700.0);
    assert_eq!(revenue.average_monthly_revenue, 1733.33);

    let metrics = reports.performance_metrics(&admin()).unwrap();
    assert_eq!(metrics.total_revenue, 5200.0);
    assert_eq!(metrics.bill_payment_rate, 80.0);
}

#[test]
fn csv_export_quotes_commas_and_doubles_quotes() {
    let store = store_with(
        &[],
        &[
            json!({"name": "Sharma, Krishna", "note": "says \"hi\", often"}),
            json!({"name": "Shivam", "note": null}),
        ],
    );
    let reports = ReportService::new(&store);

    let csv = reports.export_csv(&admin(), MEMBERS).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "createdAt,id,name,note,updatedAt");
    assert!(lines[1].contains(",\"Sharma, Krishna\","));
    assert!(lines[1].ends_with(&format!(
        "\"says \"\"hi\"\", often\",{}",
        store.read_all(MEMBERS, &Filter::all()).unwrap()[0].updated_at
    )));
    assert!(lines[2].contains(",Shivam,,"));
}

#[test]
fn export_of_empty_collection_is_an_error() {
    let store = RecordStore::in_memory();
    let reports = ReportService::new(&store);
    let err = reports.export_csv(&admin(), BILLS).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "No data to export");

    assert_eq!(reports.export_json(&admin(), BILLS).unwrap(), "[]");
}

#[test]
fn summary_csv_lists_counts_then_rows() {
    let store = store_with(&[], &[json!({"name": "Krishna", "email": "k@gym.com", "phone": "1", "feePackage": "monthly", "joinDate": "2026-01-01"})]);
    let member_id = store.read_all(MEMBERS, &Filter::all()).unwrap()[0].id.clone();
    store
        .create(
            BILLS,
            fields_from(json!({"memberId": member_id, "amount": 5000, "billDate": "2026-01-02", "status": "paid"})),
        )
        .unwrap();
    store
        .create(
            BILLS,
            fields_from(json!({"memberId": "gone", "amount": 1500.5, "billDate": "2026-01-03", "status": "pending"})),
        )
        .unwrap();
    let reports = ReportService::new(&store);

    let csv = reports.summary_csv(&admin()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "GYM MANAGEMENT MONTHLY REPORT");
    assert!(lines[1].starts_with("Generated Date,"));
    assert!(lines.contains(&"Total Members,1"));
    assert!(lines.contains(&"Total Bills,2"));
    assert!(lines.contains(&"Total Revenue,6500.5"));
    assert!(lines.contains(&"Paid Bills,1"));
    assert!(lines.contains(&"Krishna,k@gym.com,1,monthly,2026-01-01"));
    assert!(lines.contains(&"Krishna,5000,2026-01-02,paid"));
    assert!(lines.contains(&"gone,1500.5,2026-01-03,pending"));
}

#[test]
fn reports_are_admin_only() {
    let store = RecordStore::in_memory();
    let reports = ReportService::new(&store);
    let member = Session::new("member@gmail.com", "Krishna Sharma", Role::Member);
    assert!(reports
        .billing_report(&member, false)
        .unwrap_err()
        .is_permission_denied());
    assert!(reports
        .export_csv(&member, MEMBERS)
        .unwrap_err()
        .is_permission_denied());
}
