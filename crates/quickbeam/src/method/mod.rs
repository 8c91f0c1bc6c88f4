//! Method invocation gateway
//!
//! Method-call nodes do not know how to find or run methods; they go
//! through the [`MethodAccessor`] installed on the [`EvalContext`]. Every
//! way an invocation can go wrong (unknown member, refused permission,
//! failing method) reaches the node as one [`MethodFailed`].

mod permission;

pub use permission::{InvocationPolicy, InvokePermission, PermissionSet, INVOKE_AUTHORITY};

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{MethodFailed, NoSuchMethod};
use crate::{EvalContext, Value};

/// Resolves and invokes methods on behalf of method-call nodes.
pub trait MethodAccessor: fmt::Debug + Send + Sync {
    /// Call the static method `name` of `target_type`.
    fn call_static_method(
        &self,
        ctx: &mut EvalContext,
        target_type: &str,
        name: &str,
        args: &[Value],
    ) -> Result<Value, MethodFailed>;

    /// Call the method `name` on `target`.
    fn call_method(
        &self,
        ctx: &mut EvalContext,
        target: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, MethodFailed>;
}

/// Host implementation of an instance method: `(target, args) -> result`.
pub type MethodFn = Arc<dyn Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Host implementation of a static method: `(args) -> result`.
pub type StaticMethodFn = Arc<dyn Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// A [`MethodAccessor`] backed by host closures.
///
/// Instance methods are keyed by the target's type name, static methods
/// by an explicit type name. With a policy installed, each call first
/// checks `invoke.<Type>.<method>` against it.
///
/// # Example
///
/// ```
/// use quickbeam::method::{InvokePermission, MethodAccessor, MethodRegistry, PermissionSet};
/// use quickbeam::{EvalContext, Value};
/// use std::sync::Arc;
///
/// let registry = MethodRegistry::new()
///     .with_static_method("Math", "abs", |args| {
///         let n = args.first().and_then(Value::as_i64).unwrap_or_default();
///         Ok(Value::Int(n.abs()))
///     })
///     .with_policy(Arc::new(
///         PermissionSet::new().with(InvokePermission::new("invoke.Math.*").unwrap()),
///     ));
///
/// let mut ctx = EvalContext::new();
/// let result = registry.call_static_method(&mut ctx, "Math", "abs", &[Value::Int(-3)]);
/// assert_eq!(result.unwrap(), Value::Int(3));
/// ```
#[derive(Default)]
pub struct MethodRegistry {
    methods: DashMap<String, MethodFn>,
    static_methods: DashMap<String, StaticMethodFn>,
    policy: Option<Arc<dyn InvocationPolicy>>,
}

impl MethodRegistry {
    /// Create an empty registry with no policy (every call allowed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a permission policy (builder pattern).
    pub fn with_policy(mut self, policy: Arc<dyn InvocationPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Register an instance method (builder pattern).
    pub fn with_method<F>(self, type_name: &str, name: &str, method: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register_method(type_name, name, method);
        self
    }

    /// Register a static method (builder pattern).
    pub fn with_static_method<F>(self, type_name: &str, name: &str, method: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.register_static_method(type_name, name, method);
        self
    }

    /// Register (or replace) an instance method for values of `type_name`.
    pub fn register_method<F>(&self, type_name: &str, name: &str, method: F)
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(member(type_name, name), Arc::new(method));
    }

    /// Register (or replace) a static method of `type_name`.
    pub fn register_static_method<F>(&self, type_name: &str, name: &str, method: F)
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.static_methods
            .insert(member(type_name, name), Arc::new(method));
    }

    /// Whether the policy allows invoking `member`.
    fn authorize(&self, member: &str) -> Result<(), MethodFailed> {
        let Some(policy) = &self.policy else {
            return Ok(());
        };
        policy
            .check(&InvokePermission::for_member(member))
            .map_err(|denied| {
                debug!(member, permission = %denied.permission, "method invocation denied");
                MethodFailed::new(member, denied)
            })
    }
}

impl MethodAccessor for MethodRegistry {
    fn call_static_method(
        &self,
        _ctx: &mut EvalContext,
        target_type: &str,
        name: &str,
        args: &[Value],
    ) -> Result<Value, MethodFailed> {
        let member = member(target_type, name);
        let method = self
            .static_methods
            .get(&member)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| unresolved(&member))?;

        self.authorize(&member)?;
        method(args).map_err(|cause| {
            debug!(member = %member, error = %cause, "static method failed");
            MethodFailed::new(member, cause)
        })
    }

    fn call_method(
        &self,
        _ctx: &mut EvalContext,
        target: &Value,
        name: &str,
        args: &[Value],
    ) -> Result<Value, MethodFailed> {
        let member = member(&target.type_name(), name);
        let method = self
            .methods
            .get(&member)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| unresolved(&member))?;

        self.authorize(&member)?;
        method(target, args).map_err(|cause| {
            debug!(member = %member, error = %cause, "method failed");
            MethodFailed::new(member, cause)
        })
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods.len())
            .field("static_methods", &self.static_methods.len())
            .field("policy", &self.policy)
            .finish()
    }
}

fn member(type_name: &str, name: &str) -> String {
    format!("{}.{}", type_name, name)
}

fn unresolved(member: &str) -> MethodFailed {
    MethodFailed::new(
        member,
        NoSuchMethod {
            member: member.to_string(),
        },
    )
}
