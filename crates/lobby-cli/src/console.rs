//! Interactive console: pages, key handling, and the event loop
//!
//! One logical thread of control: the loop below reacts to terminal input,
//! messages from spawned fetch tasks, chat session events, and the tick
//! timer, strictly one at a time. Long-running work never blocks the loop;
//! it runs in a spawned task and reports back over the UI channel.

use std::sync::Arc;
use std::time::Instant;

use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use tokio::sync::{broadcast, mpsc};

use lobby_api::{
    AgentPolicies, ApiClient, ChatSummary, LogLevel, LogPage, LogQuery, ServerSettings,
    UserAccount, UserPatch,
};
use lobby_client::{
    AuthContext, ChatController, Conversation, Route, SessionEvent, Turn,
    conversation,
    dashboard::{DashboardSnapshot, REFRESH_INTERVAL},
    directory::{ActivityFilter, RoleFilter, UserFilter},
    pager::Pager,
};
use lobby_tui::{
    Theme,
    input::{Action, key_to_action},
    widgets::{
        Banner, Column, Composer, DataTable, Picker, PickerItem, PickerState, SeriesPanel,
        Spinner, StatCard, Transcript, TranscriptEntry,
        cards::format_count,
        spinner::frame_for,
        table::{select_down, select_up},
        transcript::transcript_height,
    },
};

use crate::commands::{CommandResult, execute_command};

/// Role options the users page cycles through
const ROLE_OPTIONS: &[&str] = &["all", "admin", "manager", "user"];

/// Level options the logs page cycles through
const LEVEL_OPTIONS: &[Option<LogLevel>] = &[
    None,
    Some(LogLevel::Info),
    Some(LogLevel::Warn),
    Some(LogLevel::Error),
];

/// Console pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Users,
    Logs,
    Settings,
    Agents,
    Chat,
    /// Shown after a 403: the account lacks the admin role
    Restricted,
    /// Shown after a 401: the cached token was rejected
    Login,
}

impl Page {
    /// Pages reachable with Tab, in order
    const CYCLE: [Page; 6] = [
        Page::Dashboard,
        Page::Users,
        Page::Logs,
        Page::Settings,
        Page::Agents,
        Page::Chat,
    ];

    fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Users => "Users",
            Page::Logs => "Logs",
            Page::Settings => "Settings",
            Page::Agents => "Agents",
            Page::Chat => "Chat",
            Page::Restricted => "Restricted",
            Page::Login => "Sign in",
        }
    }
}

/// Messages from spawned tasks back to the loop
pub enum UiMessage {
    Session(SessionEvent),
    Chats(Vec<ChatSummary>),
    Conversation(Conversation),
    Dashboard(Box<DashboardSnapshot>),
    Users(Vec<UserAccount>),
    UserSaved,
    Logs(LogPage),
    LogsChanged,
    Settings(ServerSettings),
    Agents(AgentPolicies),
    Renamed { chat_id: String, title: String },
    Notice(String),
    Failure { message: String, route: Option<Route> },
}

/// Commands for the chat controller task
enum ChatCommand {
    Send(String),
    EditLast(String),
    Load(Box<Conversation>),
}

/// What the bottom prompt line is editing
enum PromptTarget {
    RenameChat,
    EditUsername { user_id: String },
    EditEmail { user_id: String },
    EditSetting { index: usize },
}

impl PromptTarget {
    fn label(&self) -> String {
        match self {
            PromptTarget::RenameChat => "New title".to_string(),
            PromptTarget::EditUsername { .. } => "Username".to_string(),
            PromptTarget::EditEmail { .. } => "Email".to_string(),
            PromptTarget::EditSetting { index } => {
                SETTING_FIELDS.get(*index).map(|f| f.0).unwrap_or("Value").to_string()
            }
        }
    }
}

/// Editable settings fields: label + accessor pair
const SETTING_FIELDS: &[(&str, fn(&ServerSettings) -> String)] = &[
    ("Access token TTL (min)", |s| s.access_token_ttl_min.to_string()),
    ("Reset code TTL (min)", |s| s.reset_code_ttl_min.to_string()),
    ("Reset max attempts", |s| s.reset_max_attempts.to_string()),
    ("SMTP host", |s| s.smtp_host.clone()),
    ("SMTP port", |s| s.smtp_port.to_string()),
    ("SMTP user", |s| s.smtp_user.clone()),
    ("SMTP from", |s| s.smtp_from.clone()),
];

fn apply_setting(settings: &mut ServerSettings, index: usize, value: &str) -> Result<(), String> {
    let value = value.trim();
    match index {
        0 => settings.access_token_ttl_min = parse_number(value)?,
        1 => settings.reset_code_ttl_min = parse_number(value)?,
        2 => settings.reset_max_attempts = parse_number(value)?,
        3 => settings.smtp_host = value.to_string(),
        4 => settings.smtp_port = parse_number(value)?,
        5 => settings.smtp_user = value.to_string(),
        6 => settings.smtp_from = value.to_string(),
        _ => return Err("unknown field".to_string()),
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", value))
}

/// All state the console renders from
pub struct ConsoleState {
    theme: Theme,
    page: Page,
    banner: Option<String>,
    notice: Option<String>,
    client: ApiClient,
    ui_tx: mpsc::Sender<UiMessage>,
    chat_tx: mpsc::Sender<ChatCommand>,
    days: u32,

    // dashboard
    dashboard: DashboardSnapshot,
    dashboard_loading: bool,
    dashboard_refreshed: Option<Instant>,

    // users
    users: Vec<UserAccount>,
    users_loading: bool,
    user_filter: UserFilter,
    users_selected: Option<usize>,
    users_query: Composer,
    role_index: usize,
    activity_index: usize,

    // logs
    logs: Vec<lobby_api::LogEntry>,
    logs_loading: bool,
    pager: Pager,
    logs_selected: Option<usize>,
    logs_checked: Vec<bool>,
    logs_query: Composer,
    level_index: usize,

    // settings
    settings: Option<ServerSettings>,
    settings_selected: usize,
    settings_dirty: bool,

    // agents
    agents: AgentPolicies,
    agents_selected: usize,
    agents_dirty: bool,

    // chat
    chats: Vec<ChatSummary>,
    current_chat: Option<(String, String)>,
    transcript: Vec<TranscriptEntry>,
    scroll: usize,
    stick_to_bottom: bool,
    composer: Composer,
    streaming: bool,
    picker: PickerState,
    spinner_start: Instant,

    // bottom prompt line
    prompt: Option<PromptTarget>,
    prompt_input: Composer,

    quit: bool,
}

impl ConsoleState {
    fn new(
        client: ApiClient,
        ui_tx: mpsc::Sender<UiMessage>,
        chat_tx: mpsc::Sender<ChatCommand>,
        theme: Theme,
        page: Page,
        days: u32,
        page_size: u32,
    ) -> Self {
        Self {
            theme,
            page,
            banner: None,
            notice: None,
            client,
            ui_tx,
            chat_tx,
            days,
            dashboard: DashboardSnapshot::default(),
            dashboard_loading: false,
            dashboard_refreshed: None,
            users: Vec::new(),
            users_loading: false,
            user_filter: UserFilter::default(),
            users_selected: None,
            users_query: Composer::new().with_placeholder("search username or email"),
            role_index: 0,
            activity_index: 0,
            logs: Vec::new(),
            logs_loading: false,
            pager: Pager::new(page_size),
            logs_selected: None,
            logs_checked: Vec::new(),
            logs_query: Composer::new().with_placeholder("search activity"),
            level_index: 0,
            settings: None,
            settings_selected: 0,
            settings_dirty: false,
            agents: AgentPolicies::new(),
            agents_selected: 0,
            agents_dirty: false,
            chats: Vec::new(),
            current_chat: None,
            transcript: Vec::new(),
            scroll: 0,
            stick_to_bottom: true,
            composer: Composer::new().with_placeholder("message, or /help"),
            streaming: false,
            picker: PickerState::default(),
            spinner_start: Instant::now(),
            prompt: None,
            prompt_input: Composer::new(),
            quit: false,
        }
    }

    // ---- Spawned fetches ----

    /// Send a failure back to the loop, with its route override if any
    fn failure(e: lobby_client::Error) -> UiMessage {
        let route = e.redirect();
        let message = match &e {
            lobby_client::Error::Api(api) => api.banner_message(),
            other => other.to_string(),
        };
        tracing::debug!("request failed: {}", e);
        UiMessage::Failure { message, route }
    }

    fn load_dashboard(&mut self) {
        if self.dashboard_loading {
            return;
        }
        self.dashboard_loading = true;
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        let days = self.days;
        tokio::spawn(async move {
            let msg = match DashboardSnapshot::fetch(&client, days).await {
                Ok(snapshot) => UiMessage::Dashboard(Box::new(snapshot)),
                Err(e) => Self::failure(e),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn load_users(&mut self) {
        if self.users_loading {
            return;
        }
        self.users_loading = true;
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.list_users(None).await {
                Ok(users) => UiMessage::Users(users),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// The server-side filter for the current logs page
    fn log_query(&self) -> LogQuery {
        LogQuery {
            q: Some(self.logs_query.content().to_string()),
            level: LEVEL_OPTIONS[self.level_index],
            limit: Some(self.pager.page_size),
            offset: Some(self.pager.offset()),
            ..Default::default()
        }
    }

    fn load_logs(&mut self) {
        if self.logs_loading {
            return;
        }
        self.logs_loading = true;
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        let query = self.log_query();
        tokio::spawn(async move {
            let msg = match client.list_logs(&query).await {
                Ok(page) => UiMessage::Logs(page),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn load_settings(&mut self) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.settings().await {
                Ok(settings) => UiMessage::Settings(settings),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn load_agents(&mut self) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.agent_policies().await {
                Ok(policies) => UiMessage::Agents(policies),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn load_chats(&mut self) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.list_chats().await {
                Ok(chats) => UiMessage::Chats(chats),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn open_chat(&mut self, summary: ChatSummary) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.chat_history(&summary.id).await {
                Ok(history) => {
                    let turns: Vec<Turn> = history
                        .iter()
                        .map(|m| match m.role {
                            lobby_api::Role::User => Turn::user(m.text()),
                            lobby_api::Role::Assistant => Turn::assistant(m.text()),
                        })
                        .collect();
                    UiMessage::Conversation(Conversation::from_history(
                        summary.id.clone(),
                        summary.title.clone(),
                        turns,
                    ))
                }
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn patch_user(&mut self, user_id: String, patch: UserPatch) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.update_user(&user_id, &patch).await {
                Ok(_) => UiMessage::UserSaved,
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn delete_logs(&mut self, ids: Vec<i64>) {
        if ids.is_empty() {
            return;
        }
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let result = if ids.len() == 1 {
                client.delete_log(ids[0]).await
            } else {
                client.bulk_delete_logs(&ids).await
            };
            let msg = match result {
                Ok(()) => UiMessage::LogsChanged,
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn export_logs(&mut self) {
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        let query = self.log_query();
        tokio::spawn(async move {
            let msg = match client.export_logs_csv(&query).await {
                Ok(csv) => match tokio::fs::write("logs.csv", csv).await {
                    Ok(()) => UiMessage::Notice("Exported to logs.csv".to_string()),
                    Err(e) => UiMessage::Failure {
                        message: format!("Could not write logs.csv: {}", e),
                        route: None,
                    },
                },
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn save_settings(&mut self) {
        let Some(settings) = self.settings.clone() else {
            return;
        };
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.update_settings(&settings).await {
                Ok(stored) => UiMessage::Settings(stored),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn save_agents(&mut self) {
        let policies = self.agents.clone();
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.put_agent_policies(&policies).await {
                Ok(stored) => UiMessage::Agents(stored),
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    fn rename_current_chat(&mut self, title: String) {
        let Some((chat_id, _)) = self.current_chat.clone() else {
            self.banner = Some("No conversation selected".to_string());
            return;
        };
        let client = self.client.clone();
        let tx = self.ui_tx.clone();
        tokio::spawn(async move {
            let msg = match client.rename_chat(&chat_id, &title).await {
                Ok(stored) => UiMessage::Renamed {
                    chat_id: stored.id,
                    title: stored.title,
                },
                Err(e) => Self::failure(e.into()),
            };
            let _ = tx.send(msg).await;
        });
    }

    /// Reload whatever the visible page shows
    fn refresh_page(&mut self) {
        match self.page {
            Page::Dashboard => self.load_dashboard(),
            Page::Users => self.load_users(),
            Page::Logs => self.load_logs(),
            Page::Settings => self.load_settings(),
            Page::Agents => self.load_agents(),
            Page::Chat => self.load_chats(),
            Page::Restricted | Page::Login => {}
        }
    }

    // ---- Message handling ----

    fn handle_message(&mut self, msg: UiMessage) {
        match msg {
            UiMessage::Session(event) => self.handle_session_event(event),
            UiMessage::Chats(chats) => self.chats = chats,
            UiMessage::Conversation(conversation) => {
                self.current_chat = conversation
                    .id
                    .clone()
                    .map(|id| (id, conversation.title.clone()));
                self.transcript = conversation
                    .turns
                    .iter()
                    .map(|t| match t.role {
                        lobby_api::Role::User => TranscriptEntry::user(t.text()),
                        lobby_api::Role::Assistant => TranscriptEntry::assistant(t.text(), false),
                    })
                    .collect();
                self.stick_to_bottom = true;
                let _ = self
                    .chat_tx
                    .try_send(ChatCommand::Load(Box::new(conversation)));
            }
            UiMessage::Dashboard(snapshot) => {
                self.dashboard = *snapshot;
                self.dashboard_loading = false;
                self.dashboard_refreshed = Some(Instant::now());
            }
            UiMessage::Users(users) => {
                self.users = users;
                self.users_loading = false;
                self.users_selected = if self.users.is_empty() { None } else { Some(0) };
            }
            UiMessage::UserSaved => {
                self.notice = Some("User saved".to_string());
                self.load_users();
            }
            UiMessage::Logs(page) => {
                self.pager.set_total(page.total);
                self.logs = page.items;
                self.logs_checked = vec![false; self.logs.len()];
                self.logs_selected = if self.logs.is_empty() { None } else { Some(0) };
                self.logs_loading = false;
            }
            UiMessage::LogsChanged => {
                self.notice = Some("Logs deleted".to_string());
                self.logs_loading = false;
                self.load_logs();
            }
            UiMessage::Settings(settings) => {
                self.settings = Some(settings);
                if self.settings_dirty {
                    self.notice = Some("Settings saved".to_string());
                }
                self.settings_dirty = false;
            }
            UiMessage::Agents(policies) => {
                self.agents = policies;
                if self.agents_dirty {
                    self.notice = Some("Agent policies saved".to_string());
                }
                self.agents_dirty = false;
                self.agents_selected = self
                    .agents_selected
                    .min(self.agents.len().saturating_sub(1));
            }
            UiMessage::Renamed { chat_id, title } => {
                if let Some((id, current_title)) = &mut self.current_chat {
                    if *id == chat_id {
                        *current_title = title.clone();
                    }
                }
                if let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) {
                    chat.title = title;
                }
            }
            UiMessage::Notice(text) => self.notice = Some(text),
            UiMessage::Failure { message, route } => {
                self.dashboard_loading = false;
                self.users_loading = false;
                self.logs_loading = false;
                self.banner = Some(message);
                match route {
                    Some(Route::Login) => self.page = Page::Login,
                    Some(Route::Restricted) => self.page = Page::Restricted,
                    _ => {}
                }
            }
        }
    }

    /// Mirror session events into the transcript, one mutation per event
    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::SendStart { text } => {
                self.banner = None;
                self.streaming = true;
                self.spinner_start = Instant::now();
                self.transcript.push(TranscriptEntry::user(text));
                self.stick_to_bottom = true;
            }
            SessionEvent::ChatCreated { chat_id, title } => {
                self.current_chat = Some((chat_id.clone(), title.clone()));
                self.chats.insert(
                    0,
                    ChatSummary {
                        id: chat_id,
                        title,
                        created_at: None,
                    },
                );
            }
            SessionEvent::StreamStart => {
                self.transcript.push(TranscriptEntry::assistant("", true));
            }
            SessionEvent::Fragment { delta } => {
                if let Some(last) = self.transcript.last_mut() {
                    if last.is_streaming {
                        last.content.push_str(&delta);
                    }
                }
            }
            SessionEvent::StreamEnd { .. } => {
                if let Some(last) = self.transcript.last_mut() {
                    last.is_streaming = false;
                }
                self.streaming = false;
            }
            SessionEvent::Error { message } => {
                if let Some(last) = self.transcript.last_mut() {
                    last.is_streaming = false;
                }
                self.streaming = false;
                self.transcript
                    .push(TranscriptEntry::error(format!("Error: {}", message)));
                self.banner = Some(message);
            }
        }
    }

    /// Periodic work: the dashboard refresh cadence
    fn tick(&mut self) {
        if self.page == Page::Dashboard
            && !self.dashboard_loading
            && self
                .dashboard_refreshed
                .is_none_or(|t| t.elapsed() >= REFRESH_INTERVAL)
        {
            self.load_dashboard();
        }
    }

    // ---- Input handling ----

    /// Handle one action; returns `false` to quit
    fn handle_action(&mut self, action: Action, width: u16) -> bool {
        match action {
            Action::Quit | Action::Interrupt => return false,
            Action::Refresh => {
                self.refresh_page();
                return true;
            }
            _ => {}
        }

        // The prompt line swallows everything while open
        if self.prompt.is_some() {
            self.handle_prompt_action(action, width);
            return true;
        }

        // The picker swallows navigation while open
        if self.picker.visible {
            self.handle_picker_action(action);
            return true;
        }

        if action == Action::Escape {
            self.banner = None;
            self.notice = None;
            self.users_query.set_focused(false);
            self.logs_query.set_focused(false);
            return true;
        }

        if action == Action::Tab || action == Action::BackTab {
            self.switch_page(action == Action::Tab);
            return true;
        }

        match self.page {
            Page::Dashboard => {}
            Page::Users => self.handle_users_action(action, width),
            Page::Logs => self.handle_logs_action(action, width),
            Page::Settings => self.handle_settings_action(action),
            Page::Agents => self.handle_agents_action(action),
            Page::Chat => self.handle_chat_action(action, width),
            Page::Restricted | Page::Login => {}
        }
        !self.quit
    }

    fn switch_page(&mut self, forward: bool) {
        let current = Page::CYCLE
            .iter()
            .position(|p| *p == self.page)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % Page::CYCLE.len()
        } else {
            (current + Page::CYCLE.len() - 1) % Page::CYCLE.len()
        };
        self.page = Page::CYCLE[next];
        self.refresh_page();
    }

    fn handle_prompt_action(&mut self, action: Action, width: u16) {
        match action {
            Action::Escape => {
                self.prompt = None;
                self.prompt_input.clear();
            }
            Action::Submit => {
                let value = self.prompt_input.take();
                let Some(target) = self.prompt.take() else {
                    return;
                };
                match target {
                    PromptTarget::RenameChat => self.rename_current_chat(value),
                    PromptTarget::EditUsername { user_id } => self.patch_user(
                        user_id,
                        UserPatch {
                            username: Some(value.trim().to_string()),
                            ..Default::default()
                        },
                    ),
                    PromptTarget::EditEmail { user_id } => self.patch_user(
                        user_id,
                        UserPatch {
                            email: Some(value.trim().to_string()),
                            ..Default::default()
                        },
                    ),
                    PromptTarget::EditSetting { index } => {
                        if let Some(settings) = &mut self.settings {
                            match apply_setting(settings, index, &value) {
                                Ok(()) => self.settings_dirty = true,
                                Err(e) => self.banner = Some(e),
                            }
                        }
                    }
                }
            }
            other => {
                self.prompt_input.handle_action(&other, width);
            }
        }
    }

    fn handle_picker_action(&mut self, action: Action) {
        match action {
            Action::Up => self.picker.up(self.chats.len()),
            Action::Down => self.picker.down(self.chats.len()),
            Action::Escape => self.picker.hide(),
            Action::Submit => {
                if let Some(summary) = self.chats.get(self.picker.selected).cloned() {
                    self.open_chat(summary);
                }
                self.picker.hide();
            }
            _ => {}
        }
    }

    /// Rows currently visible on the users page, after client-side filtering
    fn filtered_users(&self) -> Vec<&UserAccount> {
        self.user_filter.apply(&self.users)
    }

    fn handle_users_action(&mut self, action: Action, width: u16) {
        if self.users_query.is_focused() {
            match action {
                Action::Submit => self.users_query.set_focused(false),
                other => {
                    if self.users_query.handle_action(&other, width) {
                        self.user_filter.query = self.users_query.content().to_string();
                        self.users_selected =
                            if self.filtered_users().is_empty() { None } else { Some(0) };
                    }
                }
            }
            return;
        }

        let visible = self.filtered_users().len();
        match action {
            Action::Up => self.users_selected = select_up(self.users_selected),
            Action::Down => self.users_selected = select_down(self.users_selected, visible),
            Action::Char('/') => self.users_query.set_focused(true),
            Action::Char('r') => {
                self.role_index = (self.role_index + 1) % ROLE_OPTIONS.len();
                self.user_filter.role = match ROLE_OPTIONS[self.role_index] {
                    "all" => RoleFilter::All,
                    role => RoleFilter::Role(role.to_string()),
                };
                self.users_selected = if self.filtered_users().is_empty() { None } else { Some(0) };
            }
            Action::Char('a') => {
                self.activity_index = (self.activity_index + 1) % 3;
                self.user_filter.activity = match self.activity_index {
                    1 => ActivityFilter::Active,
                    2 => ActivityFilter::Inactive,
                    _ => ActivityFilter::All,
                };
                self.users_selected = if self.filtered_users().is_empty() { None } else { Some(0) };
            }
            Action::Char('o') => {
                if let Some(user) = self.selected_user() {
                    let patch = UserPatch::active(!user.is_active);
                    let id = user.id.clone();
                    self.patch_user(id, patch);
                }
            }
            Action::Char('u') => {
                if let Some(user) = self.selected_user() {
                    let user_id = user.id.clone();
                    let current = user.username.clone();
                    self.prompt_input.set_content(current);
                    self.prompt = Some(PromptTarget::EditUsername { user_id });
                }
            }
            Action::Char('m') => {
                if let Some(user) = self.selected_user() {
                    let user_id = user.id.clone();
                    let current = user.email.clone();
                    self.prompt_input.set_content(current);
                    self.prompt = Some(PromptTarget::EditEmail { user_id });
                }
            }
            _ => {}
        }
    }

    fn selected_user(&self) -> Option<&UserAccount> {
        let visible = self.filtered_users();
        self.users_selected.and_then(|i| visible.get(i).copied())
    }

    fn handle_logs_action(&mut self, action: Action, width: u16) {
        if self.logs_query.is_focused() {
            match action {
                Action::Submit => {
                    self.logs_query.set_focused(false);
                    self.pager.page = 1;
                    self.load_logs();
                }
                other => {
                    self.logs_query.handle_action(&other, width);
                }
            }
            return;
        }

        match action {
            Action::Up => self.logs_selected = select_up(self.logs_selected),
            Action::Down => self.logs_selected = select_down(self.logs_selected, self.logs.len()),
            Action::Char('/') => self.logs_query.set_focused(true),
            Action::Char(' ') => {
                if let Some(i) = self.logs_selected {
                    if let Some(checked) = self.logs_checked.get_mut(i) {
                        *checked = !*checked;
                    }
                }
            }
            Action::Char('v') => {
                self.level_index = (self.level_index + 1) % LEVEL_OPTIONS.len();
                self.pager.page = 1;
                self.load_logs();
            }
            Action::Char('d') => {
                if let Some(entry) = self.logs_selected.and_then(|i| self.logs.get(i)) {
                    let id = entry.id;
                    self.delete_logs(vec![id]);
                }
            }
            Action::Char('D') => {
                let ids: Vec<i64> = self
                    .logs
                    .iter()
                    .zip(&self.logs_checked)
                    .filter(|(_, checked)| **checked)
                    .map(|(entry, _)| entry.id)
                    .collect();
                self.delete_logs(ids);
            }
            Action::Char('c') => self.export_logs(),
            Action::PageUp => {
                if self.pager.prev() {
                    self.load_logs();
                }
            }
            Action::PageDown => {
                if self.pager.next() {
                    self.load_logs();
                }
            }
            _ => {}
        }
    }

    fn handle_settings_action(&mut self, action: Action) {
        match action {
            Action::Up => {
                self.settings_selected = self.settings_selected.saturating_sub(1);
            }
            Action::Down => {
                self.settings_selected =
                    (self.settings_selected + 1).min(SETTING_FIELDS.len() - 1);
            }
            Action::Submit => {
                if let Some(settings) = &self.settings {
                    let current = (SETTING_FIELDS[self.settings_selected].1)(settings);
                    self.prompt_input.set_content(current);
                    self.prompt = Some(PromptTarget::EditSetting {
                        index: self.settings_selected,
                    });
                }
            }
            Action::Char('s') => {
                if self.settings.is_some() {
                    self.settings_dirty = true;
                    self.save_settings();
                }
            }
            _ => {}
        }
    }

    fn handle_agents_action(&mut self, action: Action) {
        let names: Vec<String> = self.agents.keys().cloned().collect();
        match action {
            Action::Up => self.agents_selected = self.agents_selected.saturating_sub(1),
            Action::Down => {
                self.agents_selected =
                    (self.agents_selected + 1).min(names.len().saturating_sub(1));
            }
            Action::Submit | Action::Char(' ') => {
                if let Some(name) = names.get(self.agents_selected) {
                    if let Some(policy) = self.agents.get_mut(name) {
                        policy.enabled = !policy.enabled;
                    }
                }
            }
            Action::Char('u') => self.toggle_agent_role("user"),
            Action::Char('a') => self.toggle_agent_role("admin"),
            Action::Char('s') => {
                self.agents_dirty = true;
                self.save_agents();
            }
            _ => {}
        }
    }

    fn toggle_agent_role(&mut self, role: &str) {
        let names: Vec<String> = self.agents.keys().cloned().collect();
        if let Some(name) = names.get(self.agents_selected) {
            if let Some(policy) = self.agents.get_mut(name) {
                if let Some(pos) = policy.roles.iter().position(|r| r == role) {
                    policy.roles.remove(pos);
                } else {
                    policy.roles.push(role.to_string());
                }
            }
        }
    }

    fn handle_chat_action(&mut self, action: Action, width: u16) {
        match action {
            Action::Submit => {
                let input = self.composer.take();
                let input = input.trim();
                if input.is_empty() {
                    return;
                }
                match execute_command(input) {
                    Some(CommandResult::NewChat) => {
                        self.current_chat = None;
                        self.transcript.clear();
                        let _ = self
                            .chat_tx
                            .try_send(ChatCommand::Load(Box::new(Conversation::untitled())));
                    }
                    Some(CommandResult::Rename(title)) => self.rename_current_chat(title),
                    Some(CommandResult::Edit(text)) => {
                        if self.streaming {
                            self.banner = Some("Wait for the reply to finish".to_string());
                        } else {
                            self.rewind_transcript();
                            let _ = self.chat_tx.try_send(ChatCommand::EditLast(text));
                        }
                    }
                    Some(CommandResult::OpenChats) => {
                        self.picker.selected = 0;
                        self.picker.show();
                        self.load_chats();
                    }
                    Some(CommandResult::Message(text)) => {
                        self.transcript.push(TranscriptEntry::system(text));
                        self.stick_to_bottom = true;
                    }
                    Some(CommandResult::Exit) => self.quit = true,
                    Some(CommandResult::Unknown(name)) => {
                        self.banner = Some(format!("Unknown command: /{}", name));
                    }
                    None => {
                        if self.streaming {
                            self.banner = Some("Wait for the reply to finish".to_string());
                        } else {
                            let _ = self.chat_tx.try_send(ChatCommand::Send(input.to_string()));
                        }
                    }
                }
            }
            Action::PageUp => {
                self.stick_to_bottom = false;
                self.scroll = self.scroll.saturating_sub(5);
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(5);
            }
            Action::End => {
                self.stick_to_bottom = true;
            }
            other => {
                self.composer.handle_action(&other, width);
            }
        }
    }

    /// Drop the last exchange from the local transcript, mirroring what the
    /// controller is about to do to the turn list.
    fn rewind_transcript(&mut self) {
        let turns: Vec<Turn> = self
            .transcript
            .iter()
            .filter(|e| e.role != "system")
            .map(|e| {
                if e.role == "user" {
                    Turn::user(e.content.clone())
                } else {
                    Turn::assistant(e.content.clone())
                }
            })
            .collect();
        if let Some((rest, _)) = conversation::without_last_exchange(&turns) {
            self.transcript = rest
                .iter()
                .map(|t| match t.role {
                    lobby_api::Role::User => TranscriptEntry::user(t.text()),
                    lobby_api::Role::Assistant => TranscriptEntry::assistant(t.text(), false),
                })
                .collect();
        }
    }

    // ---- Rendering ----

    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // tabs
                Constraint::Length(1), // banner
                Constraint::Min(1),    // body
                Constraint::Length(1), // footer / prompt
            ])
            .split(frame.area());

        self.render_tabs(frame, chunks[0]);
        self.render_banner(frame, chunks[1]);

        match self.page {
            Page::Dashboard => self.render_dashboard(frame, chunks[2]),
            Page::Users => self.render_users(frame, chunks[2]),
            Page::Logs => self.render_logs(frame, chunks[2]),
            Page::Settings => self.render_settings(frame, chunks[2]),
            Page::Agents => self.render_agents(frame, chunks[2]),
            Page::Chat => self.render_chat(frame, chunks[2]),
            Page::Restricted => self.render_screen(
                frame,
                chunks[2],
                "This page needs the admin role. Press Tab for the chat page.",
            ),
            Page::Login => self.render_screen(
                frame,
                chunks[2],
                "Your session is no longer valid. Quit and run `lobby login`.",
            ),
        }

        self.render_footer(frame, chunks[3]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for page in Page::CYCLE {
            let style = if page == self.page {
                self.theme.accent_bold()
            } else {
                self.theme.dim_style()
            };
            spans.push(Span::styled(format!(" {} ", page.title()), style));
            spans.push(Span::raw("|"));
        }
        spans.pop();
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        if let Some(message) = &self.banner {
            frame.render_widget(Banner::error(message, &self.theme), area);
        } else if let Some(notice) = &self.notice {
            frame.render_widget(Banner::notice(notice, &self.theme), area);
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        if let Some(target) = &self.prompt {
            self.prompt_input
                .render(area, frame.buffer_mut(), &self.theme, &target.label());
            return;
        }

        let hints = match self.page {
            Page::Dashboard => "Tab pages  Ctrl+R refresh  Ctrl+Q quit",
            Page::Users => {
                "/ search  r role  a active  o enable/disable  u username  m email  Ctrl+Q quit"
            }
            Page::Logs => {
                "/ search  v level  space mark  d delete  D delete marked  c export  PgUp/PgDn page"
            }
            Page::Settings => "Enter edit field  s save  Tab pages",
            Page::Agents => "Enter toggle  u/a roles  s save  Tab pages",
            Page::Chat => "Enter send  /help commands  PgUp/PgDn scroll",
            Page::Restricted | Page::Login => "Ctrl+Q quit",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hints, self.theme.dim_style())),
            area,
        );
    }

    fn render_screen(&self, frame: &mut Frame, area: Rect, message: &str) {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(message, self.theme.base_style())),
        ];
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_dashboard(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(4),
                Constraint::Min(4),
                Constraint::Length(1),
            ])
            .split(area);

        let m = &self.dashboard.metrics;
        let primary: [(&str, String); 4] = [
            ("Users", format_count(m.users)),
            ("Chats", format_count(m.chats)),
            ("Tokens", format_count(m.tokens)),
            ("Docs", format_count(m.docs)),
        ];
        let secondary: [(&str, String); 4] = [
            ("DAU / WAU / MAU", format!("{} / {} / {}", m.dau, m.wau, m.mau)),
            ("Messages today", format_count(m.messages_today)),
            ("Cost today", format!("${:.2}", m.cost_today)),
            (
                "Latency p50/p95 ms",
                format!(
                    "{} / {}",
                    m.p50_ms.map_or("-".to_string(), |v| format!("{:.0}", v)),
                    m.p95_ms.map_or("-".to_string(), |v| format!("{:.0}", v)),
                ),
            ),
        ];

        for (row_area, cards) in [(rows[0], &primary), (rows[1], &secondary)] {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Ratio(1, 4); 4])
                .split(row_area);
            for (i, (title, value)) in cards.iter().enumerate() {
                frame.render_widget(StatCard::new(title, value.clone(), &self.theme), columns[i]);
            }
        }

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 2); 2])
            .split(rows[2]);
        let tokens = self.dashboard.token_sparkline();
        let messages: Vec<u64> = self.dashboard.messages.iter().map(|p| p.count).collect();
        frame.render_widget(
            SeriesPanel::new("Token usage", &tokens, &self.theme),
            panels[0],
        );
        frame.render_widget(
            SeriesPanel::new("Messages", &messages, &self.theme),
            panels[1],
        );

        if self.dashboard_loading {
            frame.render_widget(
                Spinner::new("refreshing", &self.theme).with_start_time(self.spinner_start),
                rows[3],
            );
        } else if let Some(at) = self.dashboard_refreshed {
            let text = format!("updated {}s ago", at.elapsed().as_secs());
            frame.render_widget(
                Paragraph::new(Span::styled(text, self.theme.dim_style())),
                rows[3],
            );
        }
    }

    fn render_users(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);

        self.users_query
            .render(chunks[0], frame.buffer_mut(), &self.theme, "Search");

        let columns = [
            Column::new("Username", Constraint::Length(20)),
            Column::new("Email", Constraint::Min(24)),
            Column::new("Roles", Constraint::Length(20)),
            Column::new("Active", Constraint::Length(8)),
            Column::new("Last login", Constraint::Length(20)),
        ];
        let rows: Vec<Vec<String>> = self
            .filtered_users()
            .iter()
            .map(|u| {
                vec![
                    u.username.clone(),
                    u.email.clone(),
                    u.roles.join(", "),
                    if u.is_active { "yes" } else { "no" }.to_string(),
                    u.last_login
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();

        let title = format!(
            "Users ({}) role:{} status:{}",
            rows.len(),
            ROLE_OPTIONS[self.role_index],
            ["all", "active", "inactive"][self.activity_index],
        );
        frame.render_widget(
            DataTable::new(title, &columns, &self.theme)
                .rows(rows)
                .selected(self.users_selected)
                .focused(!self.users_query.is_focused()),
            chunks[1],
        );
    }

    fn render_logs(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.logs_query
            .render(chunks[0], frame.buffer_mut(), &self.theme, "Search");

        let columns = [
            Column::new("When", Constraint::Length(18)),
            Column::new("Level", Constraint::Length(7)),
            Column::new("User", Constraint::Length(14)),
            Column::new("Activity", Constraint::Min(24)),
        ];
        let rows: Vec<Vec<String>> = self
            .logs
            .iter()
            .map(|l| {
                vec![
                    l.occurred_at.format("%Y-%m-%d %H:%M").to_string(),
                    l.level.map(|v| v.as_str()).unwrap_or("-").to_string(),
                    l.user_id.clone().unwrap_or_else(|| "-".to_string()),
                    l.activity.clone(),
                ]
            })
            .collect();

        let level_label = LEVEL_OPTIONS[self.level_index]
            .map(|l| l.as_str())
            .unwrap_or("all");
        frame.render_widget(
            DataTable::new(
                format!("Recent activity level:{}", level_label),
                &columns,
                &self.theme,
            )
            .rows(rows)
            .selected(self.logs_selected)
            .checked(self.logs_checked.clone())
            .focused(!self.logs_query.is_focused()),
            chunks[1],
        );

        let status = if self.logs_loading {
            "loading...".to_string()
        } else {
            format!(
                "Page {}/{} - {} results",
                self.pager.page,
                self.pager.page_count(),
                self.pager.total,
            )
        };
        frame.render_widget(
            Paragraph::new(Span::styled(status, self.theme.dim_style())),
            chunks[2],
        );
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let Some(settings) = &self.settings else {
            self.render_screen(frame, area, "Loading settings...");
            return;
        };

        let mut lines = Vec::new();
        for (i, (label, value_of)) in SETTING_FIELDS.iter().enumerate() {
            let style = if i == self.settings_selected {
                self.theme.selection_style()
            } else {
                self.theme.base_style()
            };
            lines.push(Line::from(Span::styled(
                format!("  {:<26} {}", label, value_of(settings)),
                style,
            )));
        }
        if self.settings_dirty {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  unsaved changes - press s to save",
                self.theme.warning_style(),
            )));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_agents(&self, frame: &mut Frame, area: Rect) {
        if self.agents.is_empty() {
            self.render_screen(frame, area, "No agent policies found.");
            return;
        }

        let mut lines = Vec::new();
        for (i, (name, policy)) in self.agents.iter().enumerate() {
            let style = if i == self.agents_selected {
                self.theme.selection_style()
            } else {
                self.theme.base_style()
            };
            let status = if policy.enabled { "enabled " } else { "disabled" };
            lines.push(Line::from(Span::styled(
                format!(
                    "  {:<16} {}  roles: {}",
                    name.to_uppercase(),
                    status,
                    if policy.roles.is_empty() {
                        "-".to_string()
                    } else {
                        policy.roles.join(", ")
                    },
                ),
                style,
            )));
        }
        if self.agents_dirty {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  unsaved changes - press s to save",
                self.theme.warning_style(),
            )));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_chat(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let title = self
            .current_chat
            .as_ref()
            .map(|(_, title)| title.clone())
            .unwrap_or_else(|| "Start a new conversation".to_string());
        let mut spans = vec![Span::styled(title, self.theme.accent_bold())];
        if self.streaming {
            spans.push(Span::styled(
                format!("  {} streaming", frame_for(self.spinner_start)),
                self.theme.warning_style(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

        // Keep the view pinned to the newest output unless the user scrolled
        let height = transcript_height(&self.transcript, chunks[1].width as usize);
        let visible = chunks[1].height as usize;
        if self.stick_to_bottom {
            self.scroll = height.saturating_sub(visible);
        } else {
            self.scroll = self.scroll.min(height.saturating_sub(1));
        }

        Transcript::new(&self.transcript, &self.theme)
            .scroll(self.scroll)
            .spinner_frame(frame_for(self.spinner_start))
            .render(chunks[1], frame.buffer_mut());

        self.composer
            .render(chunks[2], frame.buffer_mut(), &self.theme, "Message");

        if self.picker.visible {
            let items: Vec<PickerItem> = self
                .chats
                .iter()
                .map(|c| {
                    let current = self
                        .current_chat
                        .as_ref()
                        .is_some_and(|(id, _)| *id == c.id);
                    let mut item = PickerItem::new(c.title.clone()).current(current);
                    if let Some(at) = c.created_at {
                        item = item.hint(at.format("%Y-%m-%d").to_string());
                    }
                    item
                })
                .collect();
            frame.render_widget(
                Picker::new("Conversations", &items, &self.theme)
                    .with_selected(self.picker.selected),
                area,
            );
        }
    }
}

/// Own the chat controller on its task; the loop talks to it over a channel
async fn chat_task(mut controller: ChatController, mut rx: mpsc::Receiver<ChatCommand>) {
    while let Some(command) = rx.recv().await {
        match command {
            // Failures surface through session events; nothing to do here
            ChatCommand::Send(text) => {
                let _ = controller.send(&text).await;
            }
            ChatCommand::EditLast(text) => {
                let _ = controller.edit_last(&text).await;
            }
            ChatCommand::Load(conversation) => controller.load(*conversation),
        }
    }
}

/// Run the interactive console until quit
pub async fn run_console(
    client: ApiClient,
    ctx: &AuthContext,
    theme: Theme,
    days: u32,
    page_size: u32,
) -> anyhow::Result<()> {
    // Route by locally cached claims; the backend still checks every call
    let start_page = match lobby_client::auth::landing_route(Some(ctx)) {
        Route::Admin => Page::Dashboard,
        Route::Chat => Page::Chat,
        Route::Login => Page::Login,
        Route::Restricted => Page::Restricted,
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(64);
    let (chat_tx, chat_rx) = mpsc::channel::<ChatCommand>(16);

    // Chat controller lives on its own task; its events flow into the UI channel
    let controller = ChatController::new(Arc::new(client.clone()));
    let mut session_rx = controller.subscribe();
    let forward_tx = ui_tx.clone();
    tokio::spawn(async move {
        loop {
            match session_rx.recv().await {
                Ok(event) => {
                    if forward_tx.send(UiMessage::Session(event)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    tokio::spawn(chat_task(controller, chat_rx));

    let mut state = ConsoleState::new(client, ui_tx, chat_tx, theme, start_page, days, page_size);
    state.refresh_page();
    if start_page != Page::Chat {
        state.load_chats();
    }

    let mut event_stream = EventStream::new();
    let mut tick_interval = tokio::time::interval(std::time::Duration::from_millis(100));

    let result = loop {
        terminal.draw(|frame| state.render(frame))?;
        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            // Fetch results and session events first, for responsiveness
            msg = ui_rx.recv() => {
                if let Some(msg) = msg {
                    state.handle_message(msg);
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(Event::Key(key))) => {
                        let action = key_to_action(key);
                        if !state.handle_action(action, area_width) {
                            break Ok(());
                        }
                    }
                    Some(Ok(Event::Paste(text))) => {
                        state.handle_action(Action::Paste(text), area_width);
                    }
                    Some(Ok(Event::Resize(_, _))) => {}
                    Some(Err(e)) => break Err(anyhow::anyhow!("event error: {}", e)),
                    None => break Ok(()),
                    _ => {}
                }
            }

            _ = tick_interval.tick() => state.tick(),
        }
    };

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}
