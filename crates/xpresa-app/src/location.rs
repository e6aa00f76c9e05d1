// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use url::Url;
use url::form_urlencoded;

const ORIGIN: &str = "http://localhost";

/// A navigable location: an absolute path plus ordered query pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: String,
    query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Resolves `href` against the application origin, so relative hrefs and
    /// bare query strings behave the way a browser link would.
    pub fn parse(href: &str) -> Result<Self> {
        let origin = Url::parse(ORIGIN).context("parse application origin")?;
        let url = origin
            .join(href)
            .with_context(|| format!("parse location {href:?}"))?;
        if url.origin() != origin.origin() {
            bail!("location {href:?} leaves the application; use a path such as /dashboard");
        }

        Ok(Self {
            path: url.path().to_owned(),
            query: url.query_pairs().into_owned().collect(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Copy of this location with `key` replaced by `value`, or removed when
    /// `value` is `None`. A replaced key keeps the position of its first
    /// occurrence; other keys are untouched.
    pub fn with_query_param(&self, key: &str, value: Option<&str>) -> Self {
        let mut query = Vec::with_capacity(self.query.len() + 1);
        let mut placed = false;
        for (name, existing) in &self.query {
            if name != key {
                query.push((name.clone(), existing.clone()));
                continue;
            }
            if let Some(value) = value
                && !placed
            {
                query.push((name.clone(), value.to_owned()));
                placed = true;
            }
        }
        if let Some(value) = value
            && !placed
        {
            query.push((key.to_owned(), value.to_owned()));
        }

        Self {
            path: self.path.clone(),
            query,
        }
    }

    pub fn with_path(&self, path: &str) -> Self {
        Self {
            path: path.to_owned(),
            query: self.query.clone(),
        }
    }

    pub fn href(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{encoded}", self.path)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.href())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Reset,
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub location: Location,
    pub scroll: ScrollBehavior,
    returning: bool,
}

impl NavigationRequest {
    pub fn to(location: Location) -> Self {
        Self {
            location,
            scroll: ScrollBehavior::Reset,
            returning: false,
        }
    }

    pub fn preserving_scroll(location: Location) -> Self {
        Self {
            location,
            scroll: ScrollBehavior::Preserve,
            returning: false,
        }
    }

    fn returning_to(location: Location) -> Self {
        Self {
            returning: true,
            ..Self::to(location)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledLocation {
    pub location: Location,
    pub scroll: ScrollBehavior,
}

/// Owns the current location. Requests are queued by `push` and only become
/// current on `settle`, which is the single point where observers learn about
/// a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    current: Location,
    pending: Option<NavigationRequest>,
    history: Vec<Location>,
}

impl Navigator {
    pub fn new(initial: Location) -> Self {
        Self {
            current: initial,
            pending: None,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Queues a request; a newer request replaces one that has not settled yet.
    pub fn push(&mut self, request: NavigationRequest) {
        self.pending = Some(request);
    }

    /// Queues a return to the previous location, if there is one.
    pub fn back(&mut self) -> bool {
        match self.history.last() {
            Some(previous) => {
                self.pending = Some(NavigationRequest::returning_to(previous.clone()));
                true
            }
            None => false,
        }
    }

    /// Applies the pending request. Returns `None` when nothing was queued or
    /// the request pointed at the current location. Only a request queued by
    /// `back` pops history; any other request pushes, even when it targets the
    /// previous location.
    pub fn settle(&mut self) -> Option<SettledLocation> {
        let request = self.pending.take()?;
        if request.location == self.current {
            return None;
        }

        let previous = std::mem::replace(&mut self.current, request.location.clone());
        if request.returning {
            self.history.pop();
        } else {
            self.history.push(previous);
        }

        Some(SettledLocation {
            location: request.location,
            scroll: request.scroll,
        })
    }
}
