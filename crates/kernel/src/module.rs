use async_trait::async_trait;
use axum::Router;

/// Context handed to modules during initialization and start-up
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Schema migration contributed by a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

/// Core module trait that every service module implements
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module, also used as its mount point
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context
    /// Called during application startup after migrations
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    /// Routes will be mounted under `/api/{module_name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Will be merged with other modules' specs
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Return migrations contributed by this module
    /// Migrations are executed in the order returned
    fn migrations(&self) -> Vec<Migration> {
        vec![]
    }

    /// Called once every module is initialized, right before serving
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called during application shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
