//! Set Defaults - persist sender settings and restart the OSC sender

use tracing::{error, info};

use super::{Action, ActionError, ActionParams};
use crate::config::SenderSettings;
use crate::engine::ActionContext;

const DEFAULT_SENDER_IP: &str = "127.0.0.1";
const DEFAULT_SENDER_PORT: &str = "9000";
const DEFAULT_LISTENER_PORT: &str = "9001";

/// "Set Defaults" action
pub struct SetDefaultsAction;

impl SetDefaultsAction {
    pub const NAME: &'static str = "SetDefaults";

    fn settings(params: &ActionParams) -> Result<SenderSettings, ActionError> {
        let ip = params.get_or("sender_ip", DEFAULT_SENDER_IP);
        let port = params.get_or("sender_port", DEFAULT_SENDER_PORT);
        let listener = params.get_or("listener_port", DEFAULT_LISTENER_PORT);

        SenderSettings::parse(ip, port, Some(listener)).map_err(|e| {
            let (name, value) = if port.trim().parse::<u16>().is_err() {
                ("sender_port", port)
            } else {
                ("listener_port", listener)
            };
            error!("Invalid sender defaults: {}", e);
            ActionError::InvalidNumber {
                name: name.to_string(),
                value: value.to_string(),
            }
        })
    }
}

impl Action for SetDefaultsAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Set Defaults"
    }

    fn group(&self) -> &str {
        "Initialization"
    }

    /// Writes the settings files then reconfigures the transport
    ///
    /// The file I/O runs on the engine runtime; the call returns immediately.
    fn run_command(&self, params: &ActionParams, ctx: &ActionContext) -> Result<(), ActionError> {
        let settings = Self::settings(params)?;
        info!("Set Defaults pressed: {}:{}", settings.sender_ip, settings.sender_port);
        ctx.update_sender_settings(settings);
        Ok(())
    }
}
