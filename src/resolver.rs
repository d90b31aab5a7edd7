//! Picks the registered shape for a method, action and status.
//!
//! Candidates are tried from most to least specific; within each level a
//! role-specific registration beats a role-agnostic one:
//!
//! 1. `(method, action, status)`, then `(action, status)`
//! 2. `(method, action, role)`, then `(method, action)`
//! 3. `(action, role)`, then `(action)`
//! 4. `(role)`, then the resource default

use crate::error::{Error, Result};
use crate::registry::{HttpMethod, RegistrationConfig, ShapeKey, ShapeRegistry, ShapeRole};
use crate::shape::ShapeDescriptor;
use log::debug;
use std::sync::Arc;

/// Action whose results are never wrapped in an envelope.
pub const LIST_ACTION: &str = "list";

/// Which candidate level a resolution matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionLevel {
    Status,
    MethodAction,
    Action,
    Resource,
}

#[derive(Debug, Clone)]
pub struct ResolvedShape {
    pub shape: Arc<ShapeDescriptor>,
    /// Registration key that matched
    pub key: ShapeKey,
    pub config: RegistrationConfig,
    pub level: ResolutionLevel,
}

#[derive(Debug, Clone)]
pub struct ShapeResolver {
    registry: Arc<ShapeRegistry>,
    wrap_result: bool,
}

impl ShapeResolver {
    pub fn new(registry: Arc<ShapeRegistry>) -> Self {
        Self {
            registry,
            wrap_result: false,
        }
    }

    pub fn with_wrap_result(mut self, wrap_result: bool) -> Self {
        self.wrap_result = wrap_result;
        self
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    /// Response shape for an action, optionally for a specific status.
    pub fn resolve(
        &self,
        resource: &str,
        method: HttpMethod,
        action: &str,
        status: Option<u16>,
    ) -> Result<ResolvedShape> {
        self.resolve_role(ShapeRole::Result, resource, method, action, status)
    }

    /// Request shape for an action.
    pub fn resolve_collect(&self, resource: &str, method: HttpMethod, action: &str) -> Result<ResolvedShape> {
        self.resolve_role(ShapeRole::Collect, resource, method, action, None)
    }

    pub fn resolve_role(
        &self,
        role: ShapeRole,
        resource: &str,
        method: HttpMethod,
        action: &str,
        status: Option<u16>,
    ) -> Result<ResolvedShape> {
        for (key, level) in candidates(role, resource, method, action, status) {
            if let Some(config) = self.registry.get(&key) {
                debug!("Resolved {} {} {} to {} ({:?})", resource, method, action, key, level);
                let shape = if self.wraps(role, Some(action)) && !config.is_message_only() {
                    Arc::new(config.serializer_shape.wrapped())
                } else {
                    Arc::clone(&config.serializer_shape)
                };
                return Ok(ResolvedShape {
                    shape,
                    key,
                    config: config.clone(),
                    level,
                });
            }
        }
        Err(Error::ShapeNotFound {
            resource: resource.to_string(),
            method: method.to_string(),
            action: action.to_string(),
            status,
        })
    }

    /// Whether shapes resolved for `role` and `action` get the result envelope.
    pub fn wraps(&self, role: ShapeRole, action: Option<&str>) -> bool {
        self.wrap_result && role == ShapeRole::Result && action != Some(LIST_ACTION)
    }
}

fn candidates(
    role: ShapeRole,
    resource: &str,
    method: HttpMethod,
    action: &str,
    status: Option<u16>,
) -> Vec<(ShapeKey, ResolutionLevel)> {
    let base = ShapeKey::resource(resource);
    let method_action = base.clone().method(method).action(action);
    let mut keys = Vec::with_capacity(8);

    if let (Some(status), ShapeRole::Result) = (status, role) {
        keys.push((
            method_action.clone().role(ShapeRole::Result).status(status),
            ResolutionLevel::Status,
        ));
        keys.push((
            base.clone().action(action).role(ShapeRole::Result).status(status),
            ResolutionLevel::Status,
        ));
    }
    keys.push((method_action.clone().role(role), ResolutionLevel::MethodAction));
    keys.push((method_action, ResolutionLevel::MethodAction));
    keys.push((base.clone().action(action).role(role), ResolutionLevel::Action));
    keys.push((base.clone().action(action), ResolutionLevel::Action));
    keys.push((base.clone().role(role), ResolutionLevel::Resource));
    keys.push((base, ResolutionLevel::Resource));
    keys
}
