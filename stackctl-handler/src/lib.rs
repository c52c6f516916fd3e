//! stackctl-handler: control event dispatch for stack deploy/destroy
//!
//! Parses the incoming platform event, dispatches to the deploy or destroy
//! flow, and shapes status-code responses. Cloud orchestration itself sits
//! behind the [`StackDriver`] seam; tenant configuration comes through the
//! [`SiteLookup`](stackctl_db::SiteLookup) seam.

pub mod event;
pub mod response;
pub mod stacks;

use serde_json::Value;
use stackctl_db::SiteLookup;
use tracing::{error, info};

pub use event::{ActionEvent, ACTION_DEPLOY, ACTION_DESTROY};
pub use response::{status, ActionResponse};
pub use stacks::{deploy_stacks, destroy_stacks, StackDriver, StackDriverError};

/// Entry point: parse the raw event and dispatch by action.
pub async fn handle_event<D, L>(driver: &D, sites: &L, event: Value) -> ActionResponse
where
    D: StackDriver + ?Sized,
    L: SiteLookup + ?Sized,
{
    info!(%event, "received action event");
    let event: ActionEvent = match serde_json::from_value(event) {
        Ok(event) => event,
        Err(err) => {
            error!("malformed action event: {err}");
            return ActionResponse::bad_request("Malformed request body");
        }
    };

    match event.action.as_deref() {
        Some(ACTION_DEPLOY) => deploy_stacks(driver, sites, &event).await,
        Some(ACTION_DESTROY) => destroy_stacks(driver, &event).await,
        other => {
            error!(action = ?other, "invalid action");
            ActionResponse::bad_request(
                "Invalid action. Use \"deploy\" or \"destroy\" in the request body",
            )
        }
    }
}
