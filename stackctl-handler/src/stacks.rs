//! Stack operations: the driver seam plus the deploy and destroy flows.

use async_trait::async_trait;
use serde_json::json;
use stackctl_db::{DbError, RowMap, SiteLookup};
use thiserror::Error;
use tracing::{error, info};

use crate::event::ActionEvent;
use crate::response::ActionResponse;

/// Failures surfaced by a stack driver.
#[derive(Debug, Error)]
pub enum StackDriverError {
    /// The named stack does not exist.
    #[error("stack '{0}' does not exist")]
    StackNotFound(String),

    /// Any other cloud API failure.
    #[error("stack driver error: {0}")]
    Api(String),
}

/// External stack orchestration collaborator.
///
/// Provisioning itself is out of scope here; implementations live with the
/// hosting platform's cloud SDK.
#[async_trait]
pub trait StackDriver: Send + Sync {
    /// Kick off deployment of the named stack for a tenant site.
    async fn deploy_stack(&self, stack_name: &str, site: &RowMap) -> Result<(), StackDriverError>;

    /// Kick off deletion of the named stack.
    async fn destroy_stack(&self, stack_name: &str) -> Result<(), StackDriverError>;
}

/// Deploy flow: resolve the tenant site record, then hand off to the
/// driver.
pub async fn deploy_stacks<D, L>(driver: &D, sites: &L, event: &ActionEvent) -> ActionResponse
where
    D: StackDriver + ?Sized,
    L: SiteLookup + ?Sized,
{
    let Some(stack_name) = event.stack_name.as_deref() else {
        return ActionResponse::bad_request("stack_name is required in request body");
    };
    let Some(site_master_id) = event.site_master_id.as_deref() else {
        return ActionResponse::bad_request("site_master_id is required in request body");
    };

    let site = match sites.get_by_id(site_master_id).await {
        Ok(Some(site)) => site,
        Ok(None) => {
            return ActionResponse::not_found(json!({
                "message": format!("Site master {site_master_id} not found"),
            }));
        }
        Err(err) => {
            log_db_failure(&err);
            return ActionResponse::internal_error("Operation failed", &err.to_string());
        }
    };

    match driver.deploy_stack(stack_name, &site).await {
        Ok(()) => {
            info!(stack_name, "stack deployment initiated");
            ActionResponse::ok(json!({
                "message": format!("Stack {stack_name} deployment initiated successfully"),
                "stack_name": stack_name,
            }))
        }
        Err(err) => {
            error!(stack_name, "error during stack deployment: {err}");
            ActionResponse::internal_error("Stack deployment failed", &err.to_string())
        }
    }
}

/// Destroy flow: delete the stack, mapping a missing stack to 404.
pub async fn destroy_stacks<D>(driver: &D, event: &ActionEvent) -> ActionResponse
where
    D: StackDriver + ?Sized,
{
    let Some(stack_name) = event.stack_name.as_deref() else {
        return ActionResponse::bad_request("stack_name is required in request body");
    };

    match driver.destroy_stack(stack_name).await {
        Ok(()) => {
            info!(stack_name, "stack deletion initiated");
            ActionResponse::ok(json!({
                "message": format!("Stack {stack_name} deletion initiated successfully"),
                "stack_name": stack_name,
            }))
        }
        Err(StackDriverError::StackNotFound(_)) => ActionResponse::not_found(json!({
            "message": format!("Stack {stack_name} does not exist"),
        })),
        Err(err) => {
            error!(stack_name, "error during stack deletion: {err}");
            ActionResponse::internal_error("Stack deletion failed", &err.to_string())
        }
    }
}

/// Log a classified database failure with its routing flags so operators
/// can see how it will be dispatched downstream.
fn log_db_failure(err: &DbError) {
    match err.policy() {
        Some(policy) => error!(
            retry = policy.retry,
            send_alert = policy.send_alert,
            dead_letter = policy.dead_letter,
            audit = policy.audit,
            "classified database failure: {err}",
        ),
        None => error!("unclassified database failure: {err}"),
    }
}
