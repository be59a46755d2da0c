//! Check engine: ordered predicate evaluation gating execution.
//!
//! Predicates report their outcome as a [`CheckResult`] value; failure is
//! not an error path inside the engine, only at the dispatch boundary where
//! it is routed to the permission-error notification.

use futures::future::BoxFuture;
use giotto_error::CheckFailure;
use giotto_model::InteractionPayload;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Outcome of one check predicate.
#[derive(Debug, Clone)]
pub enum CheckResult {
    /// The predicate accepts the context.
    Pass,
    /// The predicate rejects the context.
    Fail(CheckFailure),
}

impl CheckResult {
    /// Whether this outcome is a pass.
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckResult::Pass)
    }
}

type CheckFn =
    dyn for<'a> Fn(&'a InteractionPayload) -> BoxFuture<'a, CheckResult> + Send + Sync + 'static;

/// One gating predicate with an identity for deduplication.
///
/// Predicates are stored ordered per command/component and evaluated
/// left-to-right; they may suspend (role lookups, cache reads). Two
/// predicates are equal when their names are.
#[derive(Clone)]
pub struct CheckPredicate {
    name: String,
    func: Arc<CheckFn>,
}

impl fmt::Debug for CheckPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckPredicate")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for CheckPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl CheckPredicate {
    /// Create a predicate from an async function.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: for<'a> Fn(&'a InteractionPayload) -> BoxFuture<'a, CheckResult>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Create a predicate from a synchronous function.
    pub fn from_sync<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&InteractionPayload) -> CheckResult + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            name,
            func: Arc::new(move |payload| {
                let result = func(payload);
                Box::pin(async move { result })
            }),
        }
    }

    /// Identity of this predicate.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate against a payload.
    pub async fn evaluate(&self, payload: &InteractionPayload) -> CheckResult {
        (self.func)(payload).await
    }
}

/// Evaluate checks strictly in insertion order, short-circuiting on the
/// first failure.
///
/// Returns `Ok(())` when every predicate passes and the specific failure
/// otherwise, so callers can introspect which predicate rejected.
pub async fn run_checks(
    checks: &[CheckPredicate],
    payload: &InteractionPayload,
) -> Result<(), CheckFailure> {
    for check in checks {
        match check.evaluate(payload).await {
            CheckResult::Pass => {}
            CheckResult::Fail(failure) => {
                debug!(check = check.name(), "check rejected interaction");
                return Err(failure);
            }
        }
    }
    Ok(())
}

/// Combinator: passes when any wrapped predicate passes.
///
/// All individual failures are aggregated into one composite failure when
/// every alternative fails. Used for "owner OR guild-owner" style gates.
pub fn check_any(name: impl Into<String>, checks: Vec<CheckPredicate>) -> CheckPredicate {
    let name = name.into();
    CheckPredicate::new(name.clone(), move |payload| {
        let checks = checks.clone();
        Box::pin(async move {
            let mut failures = Vec::with_capacity(checks.len());
            for check in &checks {
                match check.evaluate(payload).await {
                    CheckResult::Pass => return CheckResult::Pass,
                    CheckResult::Fail(failure) => failures.push(failure),
                }
            }
            CheckResult::Fail(CheckFailure::any(failures))
        })
    })
}

/// Passes only for interactions sent from a guild.
pub fn guild_only() -> CheckPredicate {
    CheckPredicate::from_sync("guild_only", |payload| {
        if payload.is_guild() {
            CheckResult::Pass
        } else {
            CheckResult::Fail(CheckFailure::predicate(
                "guild_only",
                "interaction did not come from a guild",
            ))
        }
    })
}

/// Passes only for interactions sent from a direct message.
pub fn dm_only() -> CheckPredicate {
    CheckPredicate::from_sync("dm_only", |payload| {
        if payload.is_guild() {
            CheckResult::Fail(CheckFailure::predicate(
                "dm_only",
                "interaction came from a guild",
            ))
        } else {
            CheckResult::Pass
        }
    })
}

/// Passes only when the invoking user is the given owner.
pub fn is_owner(owner_id: u64) -> CheckPredicate {
    CheckPredicate::from_sync("is_owner", move |payload| {
        if payload.author_id() == Some(owner_id) {
            CheckResult::Pass
        } else {
            CheckResult::Fail(CheckFailure::predicate("is_owner", "author is not the owner"))
        }
    })
}

/// Passes only when the invoking member holds the given role.
pub fn has_role(role_id: u64) -> CheckPredicate {
    CheckPredicate::from_sync("has_role", move |payload| {
        if payload.author_roles().contains(&role_id) {
            CheckResult::Pass
        } else {
            CheckResult::Fail(CheckFailure::predicate(
                "has_role",
                format!("author lacks role {role_id}"),
            ))
        }
    })
}

/// Passes when the invoking member holds any of the given roles.
pub fn has_any_role(role_ids: Vec<u64>) -> CheckPredicate {
    CheckPredicate::from_sync("has_any_role", move |payload| {
        if payload
            .author_roles()
            .iter()
            .any(|role| role_ids.contains(role))
        {
            CheckResult::Pass
        } else {
            CheckResult::Fail(CheckFailure::predicate(
                "has_any_role",
                "author holds none of the required roles",
            ))
        }
    })
}

/// Ordered check list with identity-based removal.
///
/// Removal of a predicate that is not present is a no-op, not an error.
#[derive(Debug, Clone, Default)]
pub struct CheckList {
    checks: Vec<CheckPredicate>,
}

impl CheckList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate.
    pub fn add(&mut self, check: CheckPredicate) {
        self.checks.push(check);
    }

    /// Remove the first predicate with the same identity, if present.
    pub fn remove(&mut self, check: &CheckPredicate) {
        if let Some(index) = self.checks.iter().position(|c| c == check) {
            self.checks.remove(index);
        }
    }

    /// The predicates, in insertion order.
    pub fn as_slice(&self) -> &[CheckPredicate] {
        &self.checks
    }

    /// Evaluate the whole list against a payload.
    pub async fn run(&self, payload: &InteractionPayload) -> Result<(), CheckFailure> {
        run_checks(&self.checks, payload).await
    }
}
