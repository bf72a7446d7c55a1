//! Module plumbing shared by all modules.
use std::collections::BTreeMap;

use crate::{logger::get_logger, modules::core::Error as CoreError, state::State};

/// An invariant check over the given state.
///
/// Returns a formatted message and whether the invariant is broken.
pub type Invariant = Box<dyn Fn(&mut State) -> (String, bool)>;

/// A query method handler.
pub type QueryHandler = Box<dyn Fn(&mut State, cbor::Value) -> Result<cbor::Value, CoreError>>;

/// Format an invariant message.
pub fn format_invariant(module: &str, name: &str, msg: &str) -> String {
    format!("{}: {} invariant\n{}\n", module, name, msg)
}

/// A registered invariant.
pub struct InvariantRoute {
    pub module: String,
    pub route: String,
    invariant: Invariant,
}

impl InvariantRoute {
    /// Full route of the invariant, i.e. `<module>/<route>`.
    pub fn full_route(&self) -> String {
        format!("{}/{}", self.module, self.route)
    }
}

/// Registry of invariants exposed by the modules.
pub struct InvariantRegistry {
    routes: Vec<InvariantRoute>,
    logger: slog::Logger,
}

impl InvariantRegistry {
    /// Create a new invariant registry.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            logger: get_logger("crisis"),
        }
    }

    /// Register a new invariant.
    ///
    /// # Panics
    ///
    /// This method will panic in case an invariant with the same route is already registered.
    pub fn register_route(&mut self, module: &str, route: &str, invariant: Invariant) {
        if self
            .routes
            .iter()
            .any(|r| r.module == module && r.route == route)
        {
            panic!("invariant already registered: {}/{}", module, route);
        }
        self.routes.push(InvariantRoute {
            module: module.to_string(),
            route: route.to_string(),
            invariant,
        });
    }

    /// Registered invariants in registration order.
    pub fn routes(&self) -> &[InvariantRoute] {
        &self.routes
    }

    /// Run a single registered invariant.
    pub fn check_route(
        &self,
        state: &mut State,
        module: &str,
        route: &str,
    ) -> Option<(String, bool)> {
        self.routes
            .iter()
            .find(|r| r.module == module && r.route == route)
            .map(|r| (r.invariant)(state))
    }

    /// Run all registered invariants, failing on the first broken one.
    pub fn assert_invariants(&self, state: &mut State) -> Result<(), CoreError> {
        for route in &self.routes {
            let (msg, broken) = (route.invariant)(state);
            if broken {
                slog::error!(self.logger, "invariant broken";
                    "route" => route.full_route(),
                    "msg" => &msg,
                );
                return Err(CoreError::InvariantViolation(msg));
            }
        }
        Ok(())
    }
}

/// Registry of query methods exposed by the modules.
pub struct MethodRegistry {
    query_methods: BTreeMap<String, QueryHandler>,
}

impl MethodRegistry {
    /// Create a new method registry.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            query_methods: BTreeMap::new(),
        }
    }

    /// Register a new query method.
    ///
    /// # Panics
    ///
    /// This method will panic in case a method with the same name is already registered.
    pub fn register_query(&mut self, name: &str, handler: QueryHandler) {
        if self.query_methods.contains_key(name) {
            panic!("query method already exists: {}", name);
        }
        self.query_methods.insert(name.to_string(), handler);
    }

    /// Dispatch a query to the registered handler.
    pub fn dispatch_query(
        &self,
        state: &mut State,
        name: &str,
        args: cbor::Value,
    ) -> Result<cbor::Value, CoreError> {
        let handler = self
            .query_methods
            .get(name)
            .ok_or_else(|| CoreError::InvalidMethod(name.to_string()))?;
        handler(state, args)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_format_invariant() {
        assert_eq!(
            format_invariant("bank", "total-supply", "all good"),
            "bank: total-supply invariant\nall good\n"
        );
    }

    #[test]
    fn test_invariant_registry() {
        let mut state = State::new(MemoryStore::new());
        let mut registry = InvariantRegistry::new();
        registry.register_route("test", "ok", Box::new(|_: &mut State| (String::new(), false)));
        registry.register_route(
            "test",
            "broken",
            Box::new(|_: &mut State| (format_invariant("test", "broken", "oops"), true)),
        );
        assert_eq!(registry.routes().len(), 2);
        assert_eq!(registry.routes()[1].full_route(), "test/broken");

        assert_eq!(
            registry.check_route(&mut state, "test", "ok"),
            Some((String::new(), false))
        );
        assert_eq!(registry.check_route(&mut state, "test", "missing"), None);

        match registry.assert_invariants(&mut state) {
            Err(CoreError::InvariantViolation(msg)) => {
                assert_eq!(msg, "test: broken invariant\noops\n")
            }
            _ => panic!("expected invariant violation"),
        }
    }

    #[test]
    #[should_panic(expected = "invariant already registered: test/ok")]
    fn test_invariant_registry_duplicate() {
        let mut registry = InvariantRegistry::new();
        registry.register_route("test", "ok", Box::new(|_: &mut State| (String::new(), false)));
        registry.register_route("test", "ok", Box::new(|_: &mut State| (String::new(), false)));
    }

    #[test]
    fn test_method_registry() {
        let mut state = State::new(MemoryStore::new());
        let mut registry = MethodRegistry::new();
        registry.register_query(
            "test.Echo",
            Box::new(|_: &mut State, args: cbor::Value| {
                let v: u64 =
                    cbor::from_value(args).map_err(|e| CoreError::InvalidArgument(e.into()))?;
                Ok(cbor::to_value(v + 1))
            }),
        );

        let result = registry
            .dispatch_query(&mut state, "test.Echo", cbor::to_value(41u64))
            .unwrap();
        assert_eq!(cbor::from_value::<u64>(result).unwrap(), 42);

        assert!(matches!(
            registry.dispatch_query(&mut state, "test.Missing", cbor::to_value(0u64)),
            Err(CoreError::InvalidMethod(_))
        ));
        assert!(matches!(
            registry.dispatch_query(&mut state, "test.Echo", cbor::to_value(String::from("x"))),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
