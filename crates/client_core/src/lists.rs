//! Paginated roster retrieval and rendering.

use serde::de::DeserializeOwned;
use shared::{
    domain::{EntityKey, ServerId},
    protocol::{
        AccountRow, AccountSessionRow, ActivityRow, Endpoint, ListPage, ResponseEnvelope,
        ServerRow, ServerSessionRow, SessionActivityRow,
    },
};
use tracing::{debug, warn};

use crate::{
    dispatcher::{decode_response, DispatchError},
    pagination::PaginationWindow,
    render::{Notification, Region, TableView},
    types::{AccountContext, ServerContext, SessionRef},
    Console,
};

pub const ROSTER_PAGE_SIZE: u32 = 25;
pub const DETAIL_PAGE_SIZE: u32 = 10;
pub const DEFAULT_ORDER: &str = "rdate-r";

const ACCOUNT_COLUMNS: [&str; 6] = ["ID", "Username", "Name", "Registered", "Admin", "Status"];
const SERVER_COLUMNS: [&str; 10] = [
    "ID",
    "Server Name",
    "Entity",
    "Access",
    "Tunnel",
    "Alias",
    "Description",
    "Location",
    "Admin",
    "Status",
];
const ACTIVITY_COLUMNS: [&str; 3] = ["Action", "IP", "Timestamp"];
const SESSION_ACTIVITY_COLUMNS: [&str; 4] = ["ID", "User ID", "Action", "Timestamp"];
const SERVER_USER_COLUMNS: [&str; 6] = [
    "User ID",
    "Username",
    "Name",
    "Registered",
    "Admin",
    "Status",
];
const SERVER_SESSION_COLUMNS: [&str; 7] = [
    "ID",
    "User ID",
    "Tunnel Destination",
    "Source Address",
    "Destination Address",
    "Routed Prefix",
    "Status",
];
const ACCOUNT_SESSION_COLUMNS: [&str; 8] = [
    "Server Name",
    "Type",
    "Tunnel Source",
    "Tunnel Destination",
    "Source Address",
    "Destination Address",
    "Routed Prefix",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    Accounts,
    Servers,
    AccountHistory(AccountContext),
    ServerSessions(ServerContext),
}

impl ListSource {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Accounts => Endpoint::ListAccounts,
            Self::Servers => Endpoint::ListServers,
            Self::AccountHistory(_) => Endpoint::AccountHistory,
            Self::ServerSessions(_) => Endpoint::ServerSessions,
        }
    }

    pub fn target_id(&self) -> i64 {
        match self {
            Self::Accounts | Self::Servers => 0,
            Self::AccountHistory(account) => account.id.0,
            Self::ServerSessions(server) => server.id.0,
        }
    }

    pub fn region(&self) -> Region {
        match self {
            Self::Accounts => Region::AccountRoster,
            Self::Servers => Region::ServerRoster,
            Self::AccountHistory(_) => Region::AccountDetail,
            Self::ServerSessions(_) => Region::ServerDetail,
        }
    }

    fn empty_message(&self, list: &str) -> String {
        match self {
            Self::Accounts | Self::AccountHistory(_) => format!("Empty {list} user list"),
            Self::Servers => format!("Empty {list} server list"),
            Self::ServerSessions(server) => {
                format!("{} has no assigned tunnel sessions", server.name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub source: ListSource,
    pub title: String,
    pub list: String,
    pub page: u32,
    pub page_size: u32,
    pub sort: String,
}

impl ListQuery {
    pub fn accounts(list: &str, page: u32, page_size: u32, sort: &str) -> Self {
        Self {
            source: ListSource::Accounts,
            title: account_roster_title(list).unwrap_or(list).to_string(),
            list: list.to_string(),
            page,
            page_size,
            sort: sort.to_string(),
        }
    }

    pub fn servers(list: &str, page: u32, page_size: u32, sort: &str) -> Self {
        Self {
            source: ListSource::Servers,
            title: server_roster_title(list).unwrap_or(list).to_string(),
            list: list.to_string(),
            page,
            page_size,
            sort: sort.to_string(),
        }
    }

    /// Roster shown on the landing page.
    pub fn home() -> Self {
        Self::accounts("new", 1, DETAIL_PAGE_SIZE, DEFAULT_ORDER)
    }

    pub fn account_history(account: &AccountContext, list: &str) -> Self {
        let title = match list {
            "login" => "Login History",
            "activity" => "Activity History",
            other => other,
        };
        Self {
            source: ListSource::AccountHistory(account.clone()),
            title: title.to_string(),
            list: list.to_string(),
            page: 1,
            page_size: DETAIL_PAGE_SIZE,
            sort: String::new(),
        }
    }

    pub fn activity_history(account: &AccountContext) -> Self {
        Self::account_history(account, "activity")
    }

    pub fn server_list(server: &ServerContext, list: &str) -> Self {
        Self {
            source: ListSource::ServerSessions(server.clone()),
            title: server_list_title(list).unwrap_or(list).to_string(),
            list: list.to_string(),
            page: 1,
            page_size: DETAIL_PAGE_SIZE,
            sort: String::new(),
        }
    }

    pub fn assigned_sessions(server: &ServerContext) -> Self {
        Self::server_list(server, "assigned-sessions")
    }

    pub fn unassigned_sessions(server: &ServerContext) -> Self {
        Self::server_list(server, "unassigned-sessions")
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// `list:page:pageSize:sortKey`
    pub fn payload(&self) -> String {
        format!("{}:{}:{}:{}", self.list, self.page, self.page_size, self.sort)
    }
}

pub fn account_roster_title(list: &str) -> Option<&'static str> {
    Some(match list {
        "all" => "All Users",
        "new" => "New Users",
        "admin" => "Admin Users",
        "enabled" => "Enabled Users",
        "disabled" => "Disabled Users",
        "active" => "Active Users",
        "inactive" => "Inactive Users",
        _ => return None,
    })
}

pub fn server_roster_title(list: &str) -> Option<&'static str> {
    Some(match list {
        "all" => "All Tunnel Servers",
        "enabled" => "Enabled Tunnel Servers",
        "disabled" => "Disabled Tunnel Servers",
        "active" => "Active Tunnel Servers",
        "inactive" => "Inactive Tunnel Servers",
        _ => return None,
    })
}

pub fn server_list_title(list: &str) -> Option<&'static str> {
    Some(match list {
        "all-sessions" => "All Tunnel Sessions",
        "assigned-sessions" => "Assigned Tunnel Sessions",
        "unassigned-sessions" => "Unassigned Tunnel Sessions",
        "active-sessions" => "Active Tunnel Sessions",
        "session-activity" => "Session Activity Logs",
        "all-users" => "Tunnel Session Users",
        _ => return None,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationControls {
    pub window: PaginationWindow,
    query: ListQuery,
}

impl PaginationControls {
    pub fn previous(&self) -> Option<ListQuery> {
        self.window
            .prev_enabled()
            .then(|| self.query.with_page(self.query.page.saturating_sub(1)))
    }

    pub fn next(&self) -> Option<ListQuery> {
        self.window
            .next_enabled()
            .then(|| self.query.with_page(self.query.page.saturating_add(1)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Rendered {
        total: u64,
        window: Option<PaginationWindow>,
    },
    /// The server answered `ErrNo != 0`; rendered as an empty roster.
    Empty,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSessions {
    pub outcome: ListOutcome,
    pub sessions: Vec<SessionRef>,
}

struct DecodedRows {
    total: u64,
    columns: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl DecodedRows {
    fn new<T>(
        page: &ListPage<T>,
        columns: &[&'static str],
        row: impl Fn(&T) -> Vec<String>,
    ) -> Self {
        Self {
            total: page.total,
            columns: columns.to_vec(),
            rows: page.entries.iter().map(row).collect(),
        }
    }
}

pub struct PaginatedListLoader<'a> {
    console: &'a Console,
}

impl<'a> PaginatedListLoader<'a> {
    pub(crate) fn new(console: &'a Console) -> Self {
        Self { console }
    }

    pub async fn load(&self, query: &ListQuery) -> ListOutcome {
        let endpoint = query.source.endpoint();
        let region = query.source.region();
        let envelope = self
            .console
            .dispatcher()
            .envelope(query.source.target_id(), "", query.payload());

        let response = match self.console.dispatcher().send(endpoint, envelope).await {
            Ok(response) => response,
            Err(err) => return self.fail(endpoint, &err),
        };

        if !response.is_success() {
            debug!(
                endpoint = %endpoint,
                list = %query.list,
                page = query.page,
                "lists: empty roster"
            );
            self.console
                .sink()
                .render_empty(region, query.source.empty_message(&query.list));
            return ListOutcome::Empty;
        }

        let decoded = match self.decode_rows(query, &response) {
            Ok(decoded) => decoded,
            Err(err) => return self.fail(endpoint, &err),
        };

        let window = PaginationWindow::new(query.page, query.page_size, decoded.total);
        let pagination = window.has_controls().then(|| PaginationControls {
            window,
            query: query.clone(),
        });
        self.console.sink().render_table(
            region,
            TableView {
                title: query.title.clone(),
                badge: window.badge(),
                columns: decoded.columns,
                rows: decoded.rows,
                pagination,
            },
        );

        ListOutcome::Rendered {
            total: decoded.total,
            window: Some(window),
        }
    }

    /// Not paginated. Every row is recorded in the model so it can be toggled.
    pub async fn load_account_sessions(&self, account: &AccountContext) -> AccountSessions {
        let endpoint = Endpoint::AccountSessions;
        let envelope = self.console.dispatcher().envelope(account.id.0, "", "");
        let response = match self.console.dispatcher().send(endpoint, envelope).await {
            Ok(response) => response,
            Err(err) => {
                return AccountSessions {
                    outcome: self.fail(endpoint, &err),
                    sessions: Vec::new(),
                }
            }
        };

        if !response.is_success() {
            self.console
                .sink()
                .render_empty(Region::AccountDetail, "Empty tunnel session list".to_string());
            return AccountSessions {
                outcome: ListOutcome::Empty,
                sessions: Vec::new(),
            };
        }

        let page: ListPage<AccountSessionRow> = match decode_response(endpoint, &response) {
            Ok(page) => page,
            Err(err) => {
                return AccountSessions {
                    outcome: self.fail(endpoint, &err),
                    sessions: Vec::new(),
                }
            }
        };

        self.console.with_model(|model| {
            for row in &page.entries {
                let key = EntityKey::session(row.id);
                model.set_tag(key, row.status);
                model.set_tunnel_destination(key, Some(row.tun_dst.clone()));
            }
        });

        let sessions = page
            .entries
            .iter()
            .map(|row| SessionRef {
                session: row.id,
                server: ServerId(row.server_id),
                server_name: row.server_name.clone(),
                account: account.id,
            })
            .collect();

        let decoded = DecodedRows::new(&page, &ACCOUNT_SESSION_COLUMNS, |row| {
            vec![
                row.server_name.clone(),
                row.kind.clone(),
                row.tun_src.clone(),
                row.tun_dst.clone(),
                row.src.clone(),
                row.dst.clone(),
                row.rt.clone(),
                row.status.to_string(),
            ]
        });
        self.console.sink().render_table(
            Region::AccountDetail,
            TableView {
                title: "Tunnel Sessions".to_string(),
                badge: page.total.to_string(),
                columns: decoded.columns,
                rows: decoded.rows,
                pagination: None,
            },
        );

        AccountSessions {
            outcome: ListOutcome::Rendered {
                total: page.total,
                window: None,
            },
            sessions,
        }
    }

    fn fail(&self, endpoint: Endpoint, err: &DispatchError) -> ListOutcome {
        warn!(endpoint = %endpoint, "lists: load failed: {err}");
        self.console
            .sink()
            .notify(Notification::failure(err.operator_message()));
        ListOutcome::Failed
    }

    fn decode_rows(
        &self,
        query: &ListQuery,
        response: &ResponseEnvelope,
    ) -> Result<DecodedRows, DispatchError> {
        let endpoint = query.source.endpoint();
        match &query.source {
            ListSource::Accounts => {
                let page = self.decode_accounts(endpoint, response)?;
                Ok(DecodedRows::new(&page, &ACCOUNT_COLUMNS, |row| {
                    vec![
                        row.id.to_string(),
                        row.login.clone(),
                        row.name.clone(),
                        row.registered.clone(),
                        row.admin.to_string(),
                        row.status.to_string(),
                    ]
                }))
            }
            ListSource::Servers => {
                let page: ListPage<ServerRow> = decode_page(endpoint, response)?;
                self.console.with_model(|model| {
                    for row in &page.entries {
                        let key = EntityKey::server(row.id);
                        model.set_tag(key, row.admin);
                        model.set_tag(key, row.status);
                    }
                });
                Ok(DecodedRows::new(&page, &SERVER_COLUMNS, |row| {
                    vec![
                        row.id.to_string(),
                        row.name.clone(),
                        row.entity.clone(),
                        row.access.clone(),
                        row.tunnel.clone(),
                        row.alias.clone(),
                        row.descr.clone(),
                        row.location.clone(),
                        row.admin.to_string(),
                        row.status.to_string(),
                    ]
                }))
            }
            ListSource::AccountHistory(_) => {
                let page: ListPage<ActivityRow> = decode_page(endpoint, response)?;
                Ok(DecodedRows::new(&page, &ACTIVITY_COLUMNS, |row| {
                    vec![row.action.clone(), row.address.clone(), row.time.clone()]
                }))
            }
            ListSource::ServerSessions(_) => match query.list.as_str() {
                "session-activity" => {
                    let page: ListPage<SessionActivityRow> = decode_page(endpoint, response)?;
                    Ok(DecodedRows::new(&page, &SESSION_ACTIVITY_COLUMNS, |row| {
                        vec![
                            row.sid.clone(),
                            row.uid.clone(),
                            row.action.clone(),
                            row.time.clone(),
                        ]
                    }))
                }
                "all-users" => {
                    let page = self.decode_accounts(endpoint, response)?;
                    Ok(DecodedRows::new(&page, &SERVER_USER_COLUMNS, |row| {
                        vec![
                            row.id.to_string(),
                            row.login.clone(),
                            row.name.clone(),
                            row.registered.clone(),
                            row.admin.to_string(),
                            row.status.to_string(),
                        ]
                    }))
                }
                _ => {
                    let page: ListPage<ServerSessionRow> = decode_page(endpoint, response)?;
                    self.console.with_model(|model| {
                        for row in &page.entries {
                            let key = EntityKey::session(row.id);
                            model.set_tag(key, row.status);
                            model.set_tunnel_destination(key, Some(row.tun_dst.clone()));
                        }
                    });
                    Ok(DecodedRows::new(&page, &SERVER_SESSION_COLUMNS, |row| {
                        vec![
                            row.id.to_string(),
                            row.uid.to_string(),
                            row.tun_dst.clone(),
                            row.src.clone(),
                            row.dst.clone(),
                            row.rt.clone(),
                            row.status.to_string(),
                        ]
                    }))
                }
            },
        }
    }

    fn decode_accounts(
        &self,
        endpoint: Endpoint,
        response: &ResponseEnvelope,
    ) -> Result<ListPage<AccountRow>, DispatchError> {
        let page: ListPage<AccountRow> = decode_page(endpoint, response)?;
        self.console.with_model(|model| {
            for row in &page.entries {
                let key = EntityKey::account(row.id);
                model.set_tag(key, row.admin);
                model.set_tag(key, row.status);
            }
        });
        Ok(page)
    }
}

fn decode_page<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: &ResponseEnvelope,
) -> Result<ListPage<T>, DispatchError> {
    decode_response(endpoint, response)
}

#[cfg(test)]
#[path = "tests/lists_tests.rs"]
mod tests;
