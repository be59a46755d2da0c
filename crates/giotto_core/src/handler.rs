//! Handler seams: user-supplied callables invoked at dispatch time.
//!
//! The core never inspects handler bodies; it only consults the declared
//! parameter list (when one is declared) to auto-derive and bind options,
//! and invokes the handler with remapped arguments.

use crate::context::{CommandContext, ComponentContext};
use async_trait::async_trait;
use futures::future::BoxFuture;
use giotto_error::GiottoResult;
use giotto_model::OptionKind;
use std::fmt;
use std::sync::Arc;

/// One declared handler parameter, used to derive and bind options.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct ParameterSpec {
    /// Parameter name; becomes the argument key at invocation time.
    name: String,
    /// Option kind hint for auto-filled placeholder options.
    kind: OptionKind,
    /// Whether the parameter has no default, forcing the option required.
    #[getter(rename = "is_required")]
    required: bool,
}

impl ParameterSpec {
    /// Declare a required parameter.
    pub fn required(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
        }
    }

    /// Declare an optional parameter (one with a default).
    pub fn optional(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
        }
    }
}

/// A command handler body.
///
/// `parameters` returning `None` means the handler does not declare its
/// parameter list; the registry then takes the option list as authored
/// without arity reconciliation.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Declared parameter list, if any.
    fn parameters(&self) -> Option<Vec<ParameterSpec>> {
        None
    }

    /// Run the handler body.
    async fn invoke(&self, ctx: CommandContext) -> GiottoResult<()>;
}

type CommandFn =
    dyn Fn(CommandContext) -> BoxFuture<'static, GiottoResult<()>> + Send + Sync + 'static;

/// Adapter turning an async closure into a [`CommandHandler`].
#[derive(Clone)]
pub struct FnCommandHandler {
    func: Arc<CommandFn>,
    parameters: Option<Vec<ParameterSpec>>,
}

impl fmt::Debug for FnCommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCommandHandler")
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl FnCommandHandler {
    /// Wrap an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = GiottoResult<()>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |ctx| Box::pin(func(ctx))),
            parameters: None,
        }
    }

    /// Declare the handler's parameter list.
    pub fn with_parameters(mut self, parameters: Vec<ParameterSpec>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[async_trait]
impl CommandHandler for FnCommandHandler {
    fn parameters(&self) -> Option<Vec<ParameterSpec>> {
        self.parameters.clone()
    }

    async fn invoke(&self, ctx: CommandContext) -> GiottoResult<()> {
        (self.func)(ctx).await
    }
}

/// Wrap an async closure as a shared command handler.
pub fn command_handler<F, Fut>(func: F) -> Arc<dyn CommandHandler>
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = GiottoResult<()>> + Send + 'static,
{
    Arc::new(FnCommandHandler::new(func))
}

/// A component handler body.
#[async_trait]
pub trait ComponentHandler: Send + Sync {
    /// Run the handler body.
    async fn invoke(&self, ctx: ComponentContext) -> GiottoResult<()>;
}

type ComponentFn =
    dyn Fn(ComponentContext) -> BoxFuture<'static, GiottoResult<()>> + Send + Sync + 'static;

/// Adapter turning an async closure into a [`ComponentHandler`].
#[derive(Clone)]
pub struct FnComponentHandler {
    func: Arc<ComponentFn>,
}

impl fmt::Debug for FnComponentHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnComponentHandler").finish()
    }
}

impl FnComponentHandler {
    /// Wrap an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(ComponentContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = GiottoResult<()>> + Send + 'static,
    {
        Self {
            func: Arc::new(move |ctx| Box::pin(func(ctx))),
        }
    }
}

#[async_trait]
impl ComponentHandler for FnComponentHandler {
    async fn invoke(&self, ctx: ComponentContext) -> GiottoResult<()> {
        (self.func)(ctx).await
    }
}

/// Wrap an async closure as a shared component handler.
pub fn component_handler<F, Fut>(func: F) -> Arc<dyn ComponentHandler>
where
    F: Fn(ComponentContext) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = GiottoResult<()>> + Send + 'static,
{
    Arc::new(FnComponentHandler::new(func))
}
