//! Invocation permissions
//!
//! Permission names are dot-separated paths. A name ending in `.*` (or the
//! bare `*`) is a wildcard covering every name below that prefix:
//! `invoke.Math.*` implies `invoke.Math.max` and `invoke.Math.util.*`, but
//! not `invoke.Math` itself. Actions are carried along for the policy's
//! benefit and play no part in implication.

use std::fmt;

use crate::error::{InvalidPermission, PermissionDenied};

/// Authority prefix of every permission checked before a method call.
pub const INVOKE_AUTHORITY: &str = "invoke";

/// A hierarchical permission to invoke a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvokePermission {
    name: String,
    actions: Option<String>,
}

impl InvokePermission {
    /// Create a permission from its name.
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidPermission> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidPermission::EmptyName);
        }
        Ok(Self {
            name,
            actions: None,
        })
    }

    /// Create a permission from its name and an action list.
    pub fn with_actions(
        name: impl Into<String>,
        actions: impl Into<String>,
    ) -> Result<Self, InvalidPermission> {
        let mut permission = Self::new(name)?;
        permission.actions = Some(actions.into());
        Ok(permission)
    }

    /// The permission checked before invoking `member` (`Type.method`).
    pub fn for_member(member: &str) -> Self {
        Self {
            name: format!("{}.{}", INVOKE_AUTHORITY, member),
            actions: None,
        }
    }

    /// The permission name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action list, if any.
    pub fn actions(&self) -> Option<&str> {
        self.actions.as_deref()
    }

    /// Whether the name ends in a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.name == "*" || self.name.ends_with(".*")
    }

    /// Whether holding `self` grants `other`.
    pub fn implies(&self, other: &InvokePermission) -> bool {
        match (self.is_wildcard(), other.is_wildcard()) {
            (true, true) => other.prefix().starts_with(self.prefix()),
            (true, false) => {
                other.name.len() > self.prefix().len() && other.name.starts_with(self.prefix())
            }
            (false, true) => false,
            (false, false) => self.name == other.name,
        }
    }

    /// Name with the trailing `*` removed (keeps the separating dot).
    fn prefix(&self) -> &str {
        self.name.strip_suffix('*').unwrap_or(&self.name)
    }
}

impl fmt::Display for InvokePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(actions) = &self.actions {
            write!(f, " [{}]", actions)?;
        }
        Ok(())
    }
}

/// Decides whether a method invocation may proceed.
pub trait InvocationPolicy: fmt::Debug + Send + Sync {
    /// Allow or refuse `permission`.
    fn check(&self, permission: &InvokePermission) -> Result<(), PermissionDenied>;
}

/// A policy granting exactly the permissions it holds.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    granted: Vec<InvokePermission>,
}

impl PermissionSet {
    /// A set granting nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission (builder pattern).
    pub fn with(mut self, permission: InvokePermission) -> Self {
        self.grant(permission);
        self
    }

    /// Grant a permission.
    pub fn grant(&mut self, permission: InvokePermission) {
        self.granted.push(permission);
    }

    /// Whether any granted permission implies `permission`.
    pub fn implies(&self, permission: &InvokePermission) -> bool {
        self.granted.iter().any(|granted| granted.implies(permission))
    }
}

impl InvocationPolicy for PermissionSet {
    fn check(&self, permission: &InvokePermission) -> Result<(), PermissionDenied> {
        if self.implies(permission) {
            Ok(())
        } else {
            Err(PermissionDenied {
                permission: permission.name().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perm(name: &str) -> InvokePermission {
        InvokePermission::new(name).unwrap()
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(InvokePermission::new(""), Err(InvalidPermission::EmptyName));
    }

    #[test]
    fn test_wildcard_implies_descendants() {
        let granted = perm("invoke.a.*");
        assert!(granted.implies(&perm("invoke.a.b")));
        assert!(granted.implies(&perm("invoke.a.b.c")));
        assert!(granted.implies(&perm("invoke.a.b.*")));
        assert!(granted.implies(&perm("invoke.a.*")));
        assert!(!granted.implies(&perm("invoke.a")));
        assert!(!granted.implies(&perm("invoke.ab")));
        assert!(!granted.implies(&perm("invoke.c.d")));
    }

    #[test]
    fn test_star_implies_everything() {
        let all = perm("*");
        assert!(all.implies(&perm("invoke.x.y")));
        assert!(all.implies(&perm("anything")));
    }

    #[test]
    fn test_exact_match() {
        let granted = perm("invoke.a.b");
        assert!(granted.implies(&perm("invoke.a.b")));
        assert!(!granted.implies(&perm("invoke.a.b.c")));
        assert!(!granted.implies(&perm("invoke.a.*")));
        // A star not preceded by a dot is an ordinary character.
        assert!(!perm("invoke.a*").is_wildcard());
    }

    #[test]
    fn test_actions_ignored_by_implies() {
        let granted = InvokePermission::with_actions("invoke.a.*", "call").unwrap();
        assert_eq!(granted.actions(), Some("call"));
        assert!(granted.implies(&perm("invoke.a.b")));
        assert_eq!(granted.to_string(), "invoke.a.* [call]");
    }

    #[test]
    fn test_for_member() {
        assert_eq!(InvokePermission::for_member("Math.max").name(), "invoke.Math.max");
    }

    #[test]
    fn test_permission_set_policy() {
        let policy = PermissionSet::new().with(perm("invoke.a.*"));
        assert!(policy.check(&InvokePermission::for_member("a.b")).is_ok());
        assert_eq!(
            policy.check(&InvokePermission::for_member("c.d")),
            Err(PermissionDenied {
                permission: "invoke.c.d".to_string()
            })
        );
    }
}
