use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::service::RpcService;

/// Alias to service lookup.
///
/// Populated during configuration, then frozen inside the server and shared
/// read-only across exchanges.
#[derive(Default, Clone)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<dyn RpcService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under an alias
    pub fn register<S>(&mut self, alias: impl Into<String>, service: S) -> Result<(), RegistryError>
    where
        S: RpcService + 'static,
    {
        self.register_arc(alias, Arc::new(service))
    }

    /// Register an already shared service under an alias
    pub fn register_arc(
        &mut self,
        alias: impl Into<String>,
        service: Arc<dyn RpcService>,
    ) -> Result<(), RegistryError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(RegistryError::EmptyAlias);
        }
        if alias.contains(crate::METHOD_SEPARATOR) {
            return Err(RegistryError::InvalidAlias(alias));
        }
        if self.services.contains_key(&alias) {
            return Err(RegistryError::DuplicateAlias(alias));
        }

        debug!(alias = %alias, operations = service.operations().len(), "Registered service");
        self.services.insert(alias, service);
        Ok(())
    }

    pub fn resolve(&self, alias: &str) -> Option<Arc<dyn RpcService>> {
        self.services.get(alias).cloned()
    }

    /// Registered aliases, sorted
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.services.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn RpcService>)> {
        self.services.iter().map(|(alias, service)| (alias.as_str(), service))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("aliases", &self.aliases())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::FnService;
    use crate::signature::OperationSchema;
    use serde_json::Value;

    fn ping_service() -> FnService {
        FnService::builder()
            .operation(OperationSchema::new("ping"), |_| async {
                Ok(Value::String("pong".into()))
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ServiceRegistry::new();
        registry.register("health", ping_service()).unwrap();

        let service = registry.resolve("health").unwrap();
        assert!(service.operation("ping").is_some());
        assert!(registry.resolve("other").is_none());
        assert_eq!(registry.aliases(), vec!["health"]);
    }

    #[test]
    fn test_alias_validation() {
        let mut registry = ServiceRegistry::new();
        assert_eq!(
            registry.register("", ping_service()),
            Err(RegistryError::EmptyAlias)
        );
        assert_eq!(
            registry.register("a.b", ping_service()),
            Err(RegistryError::InvalidAlias("a.b".into()))
        );

        registry.register("health", ping_service()).unwrap();
        assert_eq!(
            registry.register("health", ping_service()),
            Err(RegistryError::DuplicateAlias("health".into()))
        );
        assert_eq!(registry.len(), 1);
    }
}
