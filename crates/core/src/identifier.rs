//! Identifier grammar for target components and `user@host` entries.
//!
//! Pure validation, no I/O. Target identifiers are `name` or `name:index`
//! where `name` starts with a letter and `index` is a non-negative integer.
//! User entries are `user@host`. List parsing trims entries, collapses
//! duplicates and preserves a deterministic (sorted) order.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use lazy_regex::{regex_captures, regex_is_match};

use crate::{AppError, AppResult};

/// A validated `name` or `name:index` identifier of one target component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId {
    name: String,
    index: Option<u32>,
}

impl TargetId {
    /// Parses a `name` or `name:index` value.
    pub fn parse(value: &str) -> AppResult<Self> {
        let Some((_, name, index)) =
            regex_captures!(r"^([A-Za-z][A-Za-z0-9_]*)(:[0-9]+)?$", value)
        else {
            return Err(AppError::InvalidTarget(value.to_owned()));
        };

        let index = if index.is_empty() {
            None
        } else {
            let parsed = index[1..]
                .parse::<u32>()
                .map_err(|_| AppError::InvalidTarget(value.to_owned()))?;
            Some(parsed)
        };

        Ok(Self {
            name: name.to_owned(),
            index,
        })
    }

    /// Returns the component name without the index.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the component index, if the identifier carries one.
    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.index
    }
}

impl Display for TargetId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(formatter, "{}:{index}", self.name),
            None => write!(formatter, "{}", self.name),
        }
    }
}

/// A validated `user@host` entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserHost(String);

impl UserHost {
    /// Parses a `user@host` value.
    pub fn parse(value: &str) -> AppResult<Self> {
        if regex_is_match!(r"^[A-Za-z][-._A-Za-z0-9]*@[A-Za-z0-9][-._A-Za-z0-9]*$", value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(AppError::InvalidUser(value.to_owned()))
        }
    }

    /// Returns the underlying `user@host` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserHost {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Parses the comma-separated target list of a request.
///
/// An empty or whitespace-only list fails with [`AppError::EmptyTargets`]
/// because such a request would have no effect; malformed entries fail with
/// [`AppError::InvalidTarget`].
pub fn parse_target_list(text: &str) -> AppResult<BTreeSet<TargetId>> {
    if text.trim().is_empty() {
        return Err(AppError::EmptyTargets);
    }

    let mut targets = BTreeSet::new();
    for entry in text.split(',') {
        targets.insert(TargetId::parse(entry.trim())?);
    }

    Ok(targets)
}

/// Parses an optional comma-separated `user@host` list.
///
/// A leading `+` or `-` on the whole string marks an add/remove edit and is
/// not part of the first entry; it is stripped before validation. An empty
/// input yields an empty set.
pub fn parse_user_list(text: &str) -> AppResult<BTreeSet<UserHost>> {
    if text.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut users = BTreeSet::new();
    for entry in strip_edit_prefix(text).split(',') {
        users.insert(UserHost::parse(entry.trim())?);
    }

    Ok(users)
}

/// Parses an optional comma-separated component list.
///
/// Same prefix handling as [`parse_user_list`]; entries use the target
/// identifier grammar.
pub fn parse_component_list(text: &str) -> AppResult<BTreeSet<TargetId>> {
    if text.is_empty() {
        return Ok(BTreeSet::new());
    }

    let mut components = BTreeSet::new();
    for entry in strip_edit_prefix(text).split(',') {
        components.insert(TargetId::parse(entry.trim())?);
    }

    Ok(components)
}

fn strip_edit_prefix(text: &str) -> &str {
    match text.as_bytes().first() {
        Some(b'+' | b'-') => &text[1..],
        _ => text,
    }
}
