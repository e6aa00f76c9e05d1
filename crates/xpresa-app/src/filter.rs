// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{DASHBOARD_PATH, Location, NavigationRequest, STATUS_PARAM, StatusFilter};

impl StatusFilter {
    pub fn from_location(location: &Location) -> Self {
        Self::from_query(location.query_param(STATUS_PARAM))
    }
}

/// Active order filter, derived from the current location.
///
/// There is no setter for the displayed value: `set_filter` only produces a
/// navigation request, and the value changes when `settle` observes the
/// resulting location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusFilterState {
    active: StatusFilter,
}

impl StatusFilterState {
    pub fn from_location(location: &Location) -> Self {
        Self {
            active: StatusFilter::from_location(location),
        }
    }

    pub fn active(&self) -> &StatusFilter {
        &self.active
    }

    /// Navigation needed to show `filter`; `None` when it is already active.
    pub fn set_filter(
        &self,
        current: &Location,
        filter: &StatusFilter,
    ) -> Option<NavigationRequest> {
        if *filter == self.active {
            return None;
        }
        let next = current
            .with_query_param(STATUS_PARAM, filter.query_value())
            .with_path(DASHBOARD_PATH);
        Some(NavigationRequest::preserving_scroll(next))
    }

    /// Re-derives the filter from a settled location. Returns whether the
    /// derived value differs from the previous one.
    pub fn settle(&mut self, location: &Location) -> bool {
        let derived = StatusFilter::from_location(location);
        let changed = derived != self.active;
        self.active = derived;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::StatusFilterState;
    use crate::{Location, Navigator, OrderStatus, ScrollBehavior, StatusFilter};
    use anyhow::Result;

    fn settle_into(
        navigator: &mut Navigator,
        state: &mut StatusFilterState,
        filter: &StatusFilter,
    ) -> bool {
        if let Some(request) = state.set_filter(navigator.current(), filter) {
            navigator.push(request);
        }
        match navigator.settle() {
            Some(settled) => state.settle(&settled.location),
            None => false,
        }
    }

    #[test]
    fn every_filter_settles_from_its_location() -> Result<()> {
        for filter in StatusFilter::BAR {
            let location = Location::new("/dashboard").with_query_param("status", filter.query_value());
            let state = StatusFilterState::from_location(&location);
            assert_eq!(state.active(), &filter, "location {location}");
        }
        Ok(())
    }

    #[test]
    fn set_filter_does_not_change_display_until_settled() -> Result<()> {
        let location = Location::parse("/dashboard")?;
        let mut navigator = Navigator::new(location.clone());
        let mut state = StatusFilterState::from_location(&location);
        let shipped = StatusFilter::Status(OrderStatus::Shipped);

        let request = state
            .set_filter(navigator.current(), &shipped)
            .expect("new filter needs navigation");
        assert_eq!(request.location.href(), "/dashboard?status=enviado");
        assert_eq!(request.scroll, ScrollBehavior::Preserve);
        navigator.push(request);
        assert_eq!(state.active(), &StatusFilter::All);

        let settled = navigator.settle().expect("location changed");
        assert!(state.settle(&settled.location));
        assert_eq!(state.active(), &shipped);
        Ok(())
    }

    #[test]
    fn choosing_all_removes_the_parameter() -> Result<()> {
        let location = Location::parse("/dashboard?status=pendiente&page=3")?;
        let state = StatusFilterState::from_location(&location);

        let request = state
            .set_filter(&location, &StatusFilter::All)
            .expect("all differs from pending");
        assert_eq!(request.location.href(), "/dashboard?page=3");
        Ok(())
    }

    #[test]
    fn setting_the_active_filter_is_a_no_op() -> Result<()> {
        let location = Location::parse("/dashboard?status=all")?;
        let mut navigator = Navigator::new(location.clone());
        let mut state = StatusFilterState::from_location(&location);

        assert!(state.set_filter(navigator.current(), &StatusFilter::All).is_none());
        assert!(!settle_into(&mut navigator, &mut state, &StatusFilter::All));
        assert_eq!(navigator.current(), &location);
        Ok(())
    }

    #[test]
    fn filter_follows_every_settled_location() -> Result<()> {
        let mut navigator = Navigator::new(Location::parse("/dashboard")?);
        let mut state = StatusFilterState::default();

        for filter in StatusFilter::BAR.iter().rev() {
            settle_into(&mut navigator, &mut state, filter);
            assert_eq!(state.active(), filter);
            assert_eq!(&StatusFilter::from_location(navigator.current()), filter);
        }
        Ok(())
    }

    #[test]
    fn set_filter_from_another_page_targets_the_dashboard() -> Result<()> {
        let location = Location::parse("/gastos")?;
        let state = StatusFilterState::from_location(&location);
        let request = state
            .set_filter(&location, &StatusFilter::Status(OrderStatus::Quoted))
            .expect("quoted differs from all");
        assert_eq!(request.location.href(), "/dashboard?status=cotizado");
        Ok(())
    }
}
