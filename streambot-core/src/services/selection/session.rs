// File: streambot-core/src/services/selection/session.rs
//
// One interactive browse. Pure state: no timers, no Discord types. Callers
// pass `now` in, which keeps expiry decisions testable.

use std::time::Duration;

use tokio::time::Instant;

use streambot_common::models::{CatalogEntry, SelectionOutcome};

use crate::Error;

/// Discord caps a select menu at 25 options.
pub const MENU_OPTION_LIMIT: usize = 25;
/// Five action rows per message, one of them is the prev/next row.
pub const MAX_MENUS_PER_PAGE: usize = 4;
/// Discord caps an option label at 100 characters.
pub const OPTION_LABEL_LIMIT: usize = 100;

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const DEFAULT_INACTIVITY_SECS: u64 = 60;
/// Interaction tokens stop working after 15 minutes, and with them the
/// expired-picker redraw.
pub const MAX_INACTIVITY_SECS: u64 = 900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionConfig {
    pub page_size: usize,
    pub menu_capacity: usize,
    /// Idle time after which an unanswered session expires. Reset by navigation.
    pub inactivity: Duration,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            menu_capacity: MENU_OPTION_LIMIT,
            inactivity: Duration::from_secs(DEFAULT_INACTIVITY_SECS),
        }
    }
}

impl SelectionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.menu_capacity == 0 || self.menu_capacity > MENU_OPTION_LIMIT {
            return Err(Error::Configuration(format!(
                "menu capacity must be within 1..={MENU_OPTION_LIMIT}, got {}",
                self.menu_capacity
            )));
        }
        let max_page = self.menu_capacity * MAX_MENUS_PER_PAGE;
        if self.page_size == 0 || self.page_size > max_page {
            return Err(Error::Configuration(format!(
                "page size must be within 1..={max_page}, got {}",
                self.page_size
            )));
        }
        if self.inactivity.is_zero() {
            return Err(Error::Configuration("selection timeout must be positive".into()));
        }
        if self.inactivity > Duration::from_secs(MAX_INACTIVITY_SECS) {
            return Err(Error::Configuration(format!(
                "selection timeout must be at most {MAX_INACTIVITY_SECS}s, got {}s",
                self.inactivity.as_secs()
            )));
        }
        Ok(())
    }
}

/// Sessions are unique per (owner, channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub owner_id: u64,
    pub channel_id: u64,
}

/// Where the session was opened; needed to play and to edit the reply later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOrigin {
    pub guild_id: u64,
    pub interaction_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Resolved,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Navigate(Navigation),
    /// Carries the option value picked from a menu.
    Select(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotOwner,
    Expired,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Ignored(IgnoreReason),
    Render(PageView),
    Resolved(SelectionOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub token: String,
}

/// Everything needed to draw one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub page_index: usize,
    pub total_pages: usize,
    pub total_candidates: usize,
    pub menus: Vec<Vec<MenuOption>>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageView {
    pub fn entry_count(&self) -> usize {
        self.menus.iter().map(Vec::len).sum()
    }

    pub fn header(&self) -> String {
        format!(
            "Page {}/{} — {} stream(s). Pick one to start playing.",
            self.page_index + 1,
            self.total_pages,
            self.total_candidates
        )
    }
}

/// Index tokens: the option value is the candidate's position in the
/// filtered set, independent of the page it was drawn on.
pub fn token_for(index: usize) -> String {
    index.to_string()
}

fn option_label(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        return "(unnamed stream)".to_string();
    }
    if name.chars().count() <= OPTION_LABEL_LIMIT {
        return name.to_string();
    }
    let mut label: String = name.chars().take(OPTION_LABEL_LIMIT - 1).collect();
    label.push('…');
    label
}

#[derive(Debug)]
pub struct SelectionSession {
    id: u64,
    key: SessionKey,
    origin: SessionOrigin,
    candidates: Vec<CatalogEntry>,
    page_index: usize,
    config: SelectionConfig,
    state: SessionState,
    deadline: Instant,
}

impl SelectionSession {
    /// Returns `None` for an empty candidate set; there is nothing to browse.
    pub fn new(
        id: u64,
        key: SessionKey,
        origin: SessionOrigin,
        candidates: Vec<CatalogEntry>,
        config: SelectionConfig,
        now: Instant,
    ) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            id,
            key,
            origin,
            candidates,
            page_index: 0,
            config,
            state: SessionState::AwaitingInput,
            deadline: now + config.inactivity,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn origin(&self) -> &SessionOrigin {
        &self.origin
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn total_pages(&self) -> usize {
        self.candidates.len().div_ceil(self.config.page_size)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_terminal(&self) -> bool {
        self.state != SessionState::AwaitingInput
    }

    /// Moves an idle session past its deadline to `Expired`. Returns true on
    /// that transition only.
    pub fn check_expiry(&mut self, now: Instant) -> bool {
        if self.state == SessionState::AwaitingInput && now >= self.deadline {
            self.state = SessionState::Expired;
            return true;
        }
        false
    }

    pub fn render(&self) -> PageView {
        let start = self.page_index * self.config.page_size;
        let end = (start + self.config.page_size).min(self.candidates.len());

        let options: Vec<MenuOption> = self.candidates[start..end]
            .iter()
            .enumerate()
            .map(|(offset, entry)| MenuOption {
                label: option_label(&entry.display_name),
                token: token_for(start + offset),
            })
            .collect();

        let menus = options
            .chunks(self.config.menu_capacity)
            .map(<[MenuOption]>::to_vec)
            .collect();

        let total_pages = self.total_pages();
        PageView {
            page_index: self.page_index,
            total_pages,
            total_candidates: self.candidates.len(),
            menus,
            has_previous: self.page_index > 0,
            has_next: self.page_index + 1 < total_pages,
        }
    }

    /// Looks a token up in the full candidate set, not the visible page.
    pub fn resolve_token(&self, token: &str) -> Option<&CatalogEntry> {
        token
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|index| self.candidates.get(index))
    }

    pub fn handle(&mut self, actor_id: u64, event: SessionEvent, now: Instant) -> EventResult {
        if actor_id != self.key.owner_id {
            return EventResult::Ignored(IgnoreReason::NotOwner);
        }
        self.check_expiry(now);
        match self.state {
            SessionState::Expired => return EventResult::Ignored(IgnoreReason::Expired),
            SessionState::Resolved => return EventResult::Ignored(IgnoreReason::Resolved),
            SessionState::AwaitingInput => {}
        }

        match event {
            SessionEvent::Navigate(direction) => {
                let last = self.total_pages().saturating_sub(1);
                self.page_index = match direction {
                    Navigation::Previous => self.page_index.saturating_sub(1),
                    Navigation::Next => (self.page_index + 1).min(last),
                };
                self.deadline = now + self.config.inactivity;
                EventResult::Render(self.render())
            }
            SessionEvent::Select(token) => {
                self.state = SessionState::Resolved;
                let outcome = match self.resolve_token(&token) {
                    Some(entry) => SelectionOutcome::Selected(entry.clone()),
                    None => SelectionOutcome::NotFound,
                };
                EventResult::Resolved(outcome)
            }
        }
    }
}
