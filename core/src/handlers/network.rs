/// "Do it if online, tell the user if offline"
use crate::context::ControllerContext;
use crate::controllers::{ConfirmationPrompt, ConfirmationRequest, ConfirmationScope, OnHideAnimationEnd};
use crate::error::Result;
use tracing::info;

pub const OFFLINE_HEADER: &str = "No internet connection";
pub const OFFLINE_MESSAGE: &str = "Check your connection and try again.";
pub const OFFLINE_ACK: &str = "OK";

/// Runs `action` when the engine reports connectivity. Otherwise shows a
/// single-button alert on `scope` and returns `Ok(false)`; nothing is retried.
pub fn run_if_online<F>(
    ctx: &ControllerContext,
    label: &str,
    scope: ConfirmationScope,
    action: F,
) -> Result<bool>
where
    F: FnOnce() -> Result<()>,
{
    ctx.verify_lifecycle()?;
    if ctx.engine().is_network_available() {
        action()?;
        return Ok(true);
    }
    info!("'{}' blocked: offline", label);
    let prompt = ConfirmationPrompt::new(OFFLINE_HEADER, OFFLINE_MESSAGE, OFFLINE_ACK);
    ctx.confirmation().request_confirmation(
        ConfirmationRequest::new(prompt, OnHideAnimationEnd(|_, _, _| {})),
        scope,
    )?;
    Ok(false)
}
