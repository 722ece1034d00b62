//! Tools and the tool registry.
//!
//! A [`ToolDefinition`] bundles a name, a description, an input schema for
//! the catalog, an async handler, and the `return_direct` flag. Definitions
//! are built once at setup, registered into a [`ToolRegistry`], and never
//! mutated afterwards.
//!
//! The registry is an ordinary value: whoever assembles an agent constructs
//! one, registers tools into it, and hands it over as `Arc<ToolRegistry>`.
//! Tests and independent agents therefore never share hidden state.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::backend::ToolSpec;
use crate::error::ToolError;

/// The async function behind a tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        (self.0)(arguments).await
    }
}

/// Wrap an async closure as a [`ToolHandler`].
///
/// ```ignore
/// let handler = handler_fn(|args| async move {
///     Ok(serde_json::json!({ "echo": args }))
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ToolError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// A self-describing tool implemented as a type.
///
/// Built-in tools (calculator, weather, search) implement this trait and are
/// turned into a [`ToolDefinition`] with [`ToolDefinition::from_tool`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calculator").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Whether the tool's output is the agent's final answer.
    fn return_direct(&self) -> bool {
        false
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

struct ToolAdapter<T>(T);

#[async_trait]
impl<T: Tool + 'static> ToolHandler for ToolAdapter<T> {
    async fn call(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        self.0.execute(arguments).await
    }
}

/// An immutable, registered tool.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: Value,
    handler: Arc<dyn ToolHandler>,
    return_direct: bool,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
            return_direct: false,
        }
    }

    /// Build a definition from a [`Tool`] implementation.
    pub fn from_tool<T: Tool + 'static>(tool: T) -> Self {
        let name = tool.name().to_string();
        let description = tool.description().to_string();
        let schema = tool.parameters_schema();
        let return_direct = tool.return_direct();
        Self::new(name, description, schema, Arc::new(ToolAdapter(tool)))
            .with_return_direct(return_direct)
    }

    /// Mark the tool's output as the agent's final answer.
    pub fn with_return_direct(mut self, return_direct: bool) -> Self {
        self.return_direct = return_direct;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    pub fn return_direct(&self) -> bool {
        self.return_direct
    }

    /// Run the handler. Errors are returned untouched.
    pub async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        self.handler.call(arguments).await
    }

    /// The catalog entry advertised to the backend.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.input_schema.clone(),
        }
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("return_direct", &self.return_direct)
            .finish_non_exhaustive()
    }
}

/// A registry of available tools, keyed by name.
///
/// The agent loop uses this to:
/// 1. Build the tool catalog advertised to the backend
/// 2. Look up and invoke tools when the backend requests them
#[derive(Debug, Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, def: ToolDefinition) {
        let name = def.name.clone();
        if self.tools.insert(name.clone(), def).is_some() {
            warn!(tool = %name, "Tool re-registered, previous definition replaced");
        } else {
            debug!(tool = %name, "Tool registered");
        }
    }

    /// Register a [`Tool`] implementation.
    pub fn register_tool<T: Tool + 'static>(&mut self, tool: T) {
        self.register(ToolDefinition::from_tool(tool));
    }

    /// Get a tool by name.
    pub fn lookup(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Resolve `names` in order, silently skipping unknown ones.
    pub fn resolve_many<S: AsRef<str>>(&self, names: &[S]) -> Vec<&ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.lookup(name.as_ref()))
            .collect()
    }

    /// The catalog entries for `names`, with the same filtering as
    /// [`resolve_many`](Self::resolve_many).
    pub fn catalog<S: AsRef<str>>(&self, names: &[S]) -> Vec<ToolSpec> {
        self.resolve_many(names)
            .into_iter()
            .map(ToolDefinition::to_spec)
            .collect()
    }

    /// List all registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
