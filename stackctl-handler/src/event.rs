//! Incoming control event.

use serde::Deserialize;

/// Action verb for a deploy request.
pub const ACTION_DEPLOY: &str = "deploy";
/// Action verb for a destroy request.
pub const ACTION_DESTROY: &str = "destroy";

/// Control event as delivered by the hosting platform.
///
/// Unknown fields are ignored; missing fields surface as `None` so the
/// dispatch layer can answer with a 400 instead of a deserialize failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionEvent {
    pub action: Option<String>,
    pub stack_name: Option<String>,
    pub site_master_id: Option<String>,
}
