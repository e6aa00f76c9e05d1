// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AppMode, ConfirmAction, Focus, FormKind, Location, NAV_TARGETS, NavTarget, NavigationRequest,
    Navigator, Screen, SettledLocation, StatusFilter, StatusFilterState, resolve_active,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub navigator: Navigator,
    pub filter: StatusFilterState,
    pub mode: AppMode,
    pub focus: Focus,
    pub sidebar_cursor: usize,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Location::new(crate::DASHBOARD_PATH))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Navigate(NavigationRequest),
    SetFilter(StatusFilter),
    ActivateSidebar,
    Back,
    Settle,
    ToggleFocus,
    MoveSidebar(isize),
    OpenForm(FormKind),
    Confirm(ConfirmAction),
    ExitToNav,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    LocationSettled(SettledLocation),
    ScreenChanged(Screen),
    FilterChanged(StatusFilter),
    ModeChanged(AppMode),
    FocusChanged(Focus),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn new(initial: Location) -> Self {
        let filter = StatusFilterState::from_location(&initial);
        let mode = mode_for(Screen::for_path(initial.path()));
        let sidebar_cursor = resolve_active(initial.path(), filter.active().as_str(), &NAV_TARGETS)
            .and_then(|active| NAV_TARGETS.iter().position(|target| target == active))
            .unwrap_or(0);
        Self {
            navigator: Navigator::new(initial),
            filter,
            mode,
            focus: Focus::Content,
            sidebar_cursor,
            status_line: None,
        }
    }

    pub fn location(&self) -> &Location {
        self.navigator.current()
    }

    pub fn screen(&self) -> Screen {
        Screen::for_path(self.location().path())
    }

    pub fn active_filter(&self) -> &StatusFilter {
        self.filter.active()
    }

    /// Highlighted sidebar entry for the settled location.
    pub fn active_target(&self) -> Option<&'static NavTarget> {
        resolve_active(
            self.location().path(),
            self.filter.active().as_str(),
            &NAV_TARGETS,
        )
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::Navigate(request) => {
                self.navigator.push(request);
                Vec::new()
            }
            AppCommand::SetFilter(filter) => {
                if let Some(request) = self.filter.set_filter(self.navigator.current(), &filter) {
                    self.navigator.push(request);
                }
                Vec::new()
            }
            AppCommand::ActivateSidebar => {
                if let Some(target) = NAV_TARGETS.get(self.sidebar_cursor) {
                    self.navigator.push(NavigationRequest::to(target.location()));
                }
                Vec::new()
            }
            AppCommand::Back => {
                self.navigator.back();
                Vec::new()
            }
            AppCommand::Settle => self.settle(),
            AppCommand::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Sidebar => Focus::Content,
                    Focus::Content => Focus::Sidebar,
                };
                vec![AppEvent::FocusChanged(self.focus)]
            }
            AppCommand::MoveSidebar(delta) => {
                let len = NAV_TARGETS.len() as isize;
                let next = (self.sidebar_cursor as isize + delta).rem_euclid(len);
                self.sidebar_cursor = next as usize;
                Vec::new()
            }
            AppCommand::OpenForm(kind) => self.set_mode(AppMode::Form(kind)),
            AppCommand::Confirm(action) => self.set_mode(AppMode::Confirm(action)),
            AppCommand::ExitToNav => self.set_mode(mode_for(self.screen())),
            AppCommand::SetStatus(message) => vec![self.set_status(message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    /// Applies the pending navigation, then re-derives everything that hangs
    /// off the location. Emits nothing when the location did not change.
    fn settle(&mut self) -> Vec<AppEvent> {
        let previous_screen = self.screen();
        let Some(settled) = self.navigator.settle() else {
            return Vec::new();
        };

        let mut events = vec![AppEvent::LocationSettled(settled.clone())];
        let screen = self.screen();
        if screen != previous_screen {
            events.push(AppEvent::ScreenChanged(screen));
            events.extend(self.set_mode(mode_for(screen)));
        }
        if self.filter.settle(&settled.location) {
            events.push(AppEvent::FilterChanged(self.filter.active().clone()));
        }
        events
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_status(&mut self, message: String) -> AppEvent {
        self.status_line = Some(message.clone());
        AppEvent::StatusUpdated(message)
    }
}

/// The new-order page is the order form itself; every other page starts in
/// navigation mode.
fn mode_for(screen: Screen) -> AppMode {
    match screen {
        Screen::NewOrder => AppMode::Form(FormKind::Order),
        _ => AppMode::Nav,
    }
}
