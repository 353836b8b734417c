use super::*;
use shared::domain::{AccountId, Axis, SessionId, StateTag};

use crate::{
    render::NotificationLevel,
    test_support::{account_row, harness, page},
};

fn server() -> ServerContext {
    ServerContext::new(ServerId(12), "edge-1")
}

fn server_session(id: i64, uid: i64, tun_dst: &str, status: StateTag) -> ServerSessionRow {
    ServerSessionRow {
        id: SessionId(id),
        uid,
        tun_dst: tun_dst.to_string(),
        src: "10.8.0.1".to_string(),
        dst: "10.8.0.2".to_string(),
        rt: String::new(),
        status,
    }
}

#[tokio::test]
async fn account_roster_renders_first_page_with_controls() {
    let h = harness();
    let rows: Vec<AccountRow> = (1..=10)
        .map(|id| account_row(id, &format!("user{id}"), StateTag::Enabled, StateTag::Inactive))
        .collect();
    h.transport.reply_ok(&page(47, rows));

    let query = ListQuery::accounts("all", 1, 10, DEFAULT_ORDER);
    let outcome = h.console.lists().load(&query).await;

    let window = PaginationWindow::new(1, 10, 47);
    assert_eq!(
        outcome,
        ListOutcome::Rendered {
            total: 47,
            window: Some(window)
        }
    );

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Endpoint::ListAccounts);
    assert_eq!(sent[0].1.target_id, 0);
    assert_eq!(sent[0].1.payload, "all:1:10:rdate-r");

    let tables = h.sink.tables();
    let (region, table) = &tables[0];
    assert_eq!(*region, Region::AccountRoster);
    assert_eq!(table.title, "All Users");
    assert_eq!(table.badge, "10/47");
    assert_eq!(table.rows.len(), 10);
    assert_eq!(table.rows[0][1], "user1");

    let controls = table.pagination.as_ref().expect("controls shown");
    assert_eq!(controls.previous(), None);
    assert_eq!(controls.next().expect("next enabled").payload(), "all:2:10:rdate-r");

    assert_eq!(
        h.console.tag(EntityKey::account(AccountId(3)), Axis::Lifecycle),
        Some(StateTag::Inactive)
    );
}

#[tokio::test]
async fn last_page_disables_next() {
    let h = harness();
    let rows: Vec<AccountRow> = (41..=47)
        .map(|id| account_row(id, &format!("user{id}"), StateTag::Enabled, StateTag::Active))
        .collect();
    h.transport.reply_ok(&page(47, rows));

    let query = ListQuery::accounts("all", 5, 10, DEFAULT_ORDER);
    h.console.lists().load(&query).await;

    let tables = h.sink.tables();
    let table = &tables[0].1;
    assert_eq!(table.badge, "47/47");
    let controls = table.pagination.as_ref().expect("controls shown");
    assert_eq!(controls.next(), None);
    assert_eq!(controls.previous().expect("prev enabled").page, 4);
}

#[tokio::test]
async fn single_page_roster_has_no_controls() {
    let h = harness();
    h.transport.reply_ok(&page(
        2,
        vec![
            account_row(1, "ana", StateTag::Enabled, StateTag::Active),
            account_row(2, "ben", StateTag::Disabled, StateTag::Inactive),
        ],
    ));

    h.console.lists().load(&ListQuery::home()).await;

    let tables = h.sink.tables();
    assert_eq!(tables[0].1.title, "New Users");
    assert_eq!(tables[0].1.badge, "2/2");
    assert!(tables[0].1.pagination.is_none());
}

#[tokio::test]
async fn declared_failure_renders_empty_roster() {
    let h = harness();
    h.transport.refuse(1, "no rows");

    let outcome = h
        .console
        .lists()
        .load(&ListQuery::accounts("disabled", 1, 25, DEFAULT_ORDER))
        .await;

    assert_eq!(outcome, ListOutcome::Empty);
    assert_eq!(
        h.sink.empties(),
        vec![(Region::AccountRoster, "Empty disabled user list".to_string())]
    );
    assert!(h.sink.notifications().is_empty());
}

#[tokio::test]
async fn empty_server_session_list_names_the_server() {
    let h = harness();
    h.transport.refuse(1, "");

    let outcome = h
        .console
        .lists()
        .load(&ListQuery::assigned_sessions(&server()))
        .await;

    assert_eq!(outcome, ListOutcome::Empty);
    assert_eq!(
        h.sink.empties(),
        vec![(
            Region::ServerDetail,
            "edge-1 has no assigned tunnel sessions".to_string()
        )]
    );
    assert_eq!(h.transport.sent()[0].1.target_id, 12);
}

#[tokio::test]
async fn every_list_name_signals_empty_on_declared_failure() {
    let account = AccountContext::new(AccountId(5), "ana");
    let mut cases: Vec<(ListQuery, Region, String)> = Vec::new();
    for list in ["all", "new", "admin", "enabled", "disabled", "active", "inactive"] {
        cases.push((
            ListQuery::accounts(list, 1, 25, DEFAULT_ORDER),
            Region::AccountRoster,
            format!("Empty {list} user list"),
        ));
    }
    for list in ["all", "enabled", "disabled", "active", "inactive"] {
        cases.push((
            ListQuery::servers(list, 1, 25, DEFAULT_ORDER),
            Region::ServerRoster,
            format!("Empty {list} server list"),
        ));
    }
    for list in ["login", "activity"] {
        cases.push((
            ListQuery::account_history(&account, list),
            Region::AccountDetail,
            format!("Empty {list} user list"),
        ));
    }
    for list in [
        "all-sessions",
        "assigned-sessions",
        "unassigned-sessions",
        "active-sessions",
        "session-activity",
        "all-users",
    ] {
        cases.push((
            ListQuery::server_list(&server(), list),
            Region::ServerDetail,
            "edge-1 has no assigned tunnel sessions".to_string(),
        ));
    }
    assert_eq!(cases.len(), 20);

    for (query, region, message) in cases {
        let h = harness();
        h.transport.refuse(1, "no rows");

        let outcome = h.console.lists().load(&query).await;

        assert_eq!(outcome, ListOutcome::Empty, "{}", query.payload());
        assert_eq!(h.sink.empties(), vec![(region, message)], "{}", query.payload());
        assert!(h.sink.tables().is_empty(), "{} rendered a table", query.payload());
        assert!(h.sink.notifications().is_empty(), "{}", query.payload());
    }
}

#[tokio::test]
async fn undecodable_page_fails_without_a_table() {
    let h = harness();
    h.transport.reply(ResponseEnvelope::ok("not json"));

    let outcome = h
        .console
        .lists()
        .load(&ListQuery::accounts("all", 1, 25, DEFAULT_ORDER))
        .await;

    assert_eq!(outcome, ListOutcome::Failed);
    assert!(h.sink.tables().is_empty());
    assert!(h.sink.empties().is_empty());
    let notification = h.sink.last_notification().expect("failure shown");
    assert_eq!(notification.level, NotificationLevel::Failure);
    assert_eq!(
        notification.message,
        "Request failed; the server sent an unexpected response"
    );
}

#[tokio::test]
async fn transport_failure_notifies_and_renders_nothing() {
    let h = harness();
    h.transport.fail();

    let outcome = h
        .console
        .lists()
        .load(&ListQuery::servers("all", 1, 25, DEFAULT_ORDER))
        .await;

    assert_eq!(outcome, ListOutcome::Failed);
    assert!(h.sink.tables().is_empty());
    let notification = h.sink.last_notification().expect("failure shown");
    assert_eq!(notification.level, NotificationLevel::Failure);
}

#[tokio::test]
async fn null_entries_render_an_empty_table() {
    let h = harness();
    h.transport
        .reply(ResponseEnvelope::ok(r#"{"Total":0,"Entry":null}"#));

    let outcome = h
        .console
        .lists()
        .load(&ListQuery::account_history(
            &AccountContext::new(AccountId(5), "ana"),
            "login",
        ))
        .await;

    assert_eq!(
        outcome,
        ListOutcome::Rendered {
            total: 0,
            window: Some(PaginationWindow::new(1, 10, 0))
        }
    );
    let tables = h.sink.tables();
    assert_eq!(tables[0].0, Region::AccountDetail);
    assert_eq!(tables[0].1.title, "Login History");
    assert!(tables[0].1.rows.is_empty());
    assert_eq!(h.transport.sent()[0].1.payload, "login:1:10:");
}

#[tokio::test]
async fn server_sessions_record_lifecycle_and_destination() {
    let h = harness();
    h.transport.reply_ok(&page(
        2,
        vec![
            server_session(7, 42, "10.0.0.5", StateTag::Active),
            server_session(8, 43, "", StateTag::Inactive),
        ],
    ));

    h.console
        .lists()
        .load(&ListQuery::server_list(&server(), "all-sessions"))
        .await;

    let active = h
        .console
        .entity(EntityKey::session(SessionId(7)))
        .expect("session recorded");
    assert_eq!(active.lifecycle, Some(StateTag::Active));
    assert_eq!(active.tunnel_destination.as_deref(), Some("10.0.0.5"));

    let tables = h.sink.tables();
    assert_eq!(tables[0].1.title, "All Tunnel Sessions");
    assert_eq!(tables[0].1.columns, SERVER_SESSION_COLUMNS.to_vec());
    assert_eq!(tables[0].1.rows[1][1], "43");
}

#[tokio::test]
async fn session_activity_uses_its_own_row_shape() {
    let h = harness();
    h.transport.reply(ResponseEnvelope::ok(concat!(
        r#"{"Total":1,"Entry":[{"Sid":"7","Uid":"42","Action":"activate","#,
        r#""Time":"2024-03-01 10:00"}]}"#,
    )));

    h.console
        .lists()
        .load(&ListQuery::server_list(&server(), "session-activity"))
        .await;

    let tables = h.sink.tables();
    assert_eq!(tables[0].1.title, "Session Activity Logs");
    assert_eq!(
        tables[0].1.rows,
        vec![vec![
            "7".to_string(),
            "42".to_string(),
            "activate".to_string(),
            "2024-03-01 10:00".to_string()
        ]]
    );
}

#[tokio::test]
async fn account_sessions_are_listed_with_total_badge() {
    let h = harness();
    let account = AccountContext::new(AccountId(42), "bob");
    h.transport.reply(ResponseEnvelope::ok(concat!(
        r#"{"Total":1,"Entry":[{"Id":7,"ServerId":"12","ServerName":"edge-1","Type":"l2tp","#,
        r#""TunSrc":"198.51.100.1","TunDst":"10.0.0.5","Src":"","Dst":"","Rt":"","#,
        r#""Status":"active"}]}"#,
    )));

    let listed = h.console.lists().load_account_sessions(&account).await;

    assert_eq!(
        listed.outcome,
        ListOutcome::Rendered {
            total: 1,
            window: None
        }
    );
    assert_eq!(
        listed.sessions,
        vec![SessionRef {
            session: SessionId(7),
            server: ServerId(12),
            server_name: "edge-1".to_string(),
            account: AccountId(42),
        }]
    );
    let tables = h.sink.tables();
    assert_eq!(tables[0].1.title, "Tunnel Sessions");
    assert_eq!(tables[0].1.badge, "1");
    assert_eq!(
        h.console
            .entity(EntityKey::session(SessionId(7)))
            .and_then(|state| state.tunnel_destination),
        Some("10.0.0.5".to_string())
    );
    assert_eq!(h.transport.sent()[0].0, Endpoint::AccountSessions);
}

#[tokio::test]
async fn account_without_sessions_shows_empty_message() {
    let h = harness();
    h.transport.refuse(1, "");

    let listed = h
        .console
        .lists()
        .load_account_sessions(&AccountContext::new(AccountId(42), "bob"))
        .await;

    assert_eq!(listed.outcome, ListOutcome::Empty);
    assert!(listed.sessions.is_empty());
    assert_eq!(
        h.sink.empties(),
        vec![(Region::AccountDetail, "Empty tunnel session list".to_string())]
    );
}

#[test]
fn unknown_list_names_fall_back_to_the_raw_name() {
    assert_eq!(ListQuery::servers("archived", 1, 25, "").title, "archived");
    assert_eq!(server_roster_title("active"), Some("Active Tunnel Servers"));
    assert_eq!(server_list_title("all-users"), Some("Tunnel Session Users"));
}
