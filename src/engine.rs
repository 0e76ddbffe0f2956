//! Engine - the entry point the host talks to
//!
//! Owns the action registry and the shared [`ActionContext`], and routes host
//! calls (command, adjustment, image, listbox) to the named action.

mod context;
mod momentary;


pub use context::{ActionContext, ChangeListener, ValueChanged};
pub use momentary::MomentaryScheduler;

use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

use crate::actions::{builtin_actions, Action, ActionError, ActionParams, ListboxItem};
use crate::config::{EngineSettings, SenderSettings};
use crate::osc::{StatusCallback, TransportStatus};
use crate::render::{FeedbackRenderer, ImageSize};
use crate::state::AddressStore;

/// Action-to-OSC dispatch engine
pub struct Engine {
    actions: HashMap<String, Arc<dyn Action>>,
    ctx: ActionContext,
}

impl Engine {
    /// Create an engine with the built-in actions registered
    ///
    /// `runtime` runs momentary reverts and settings writes; host calls
    /// themselves may come from any thread.
    pub fn new(settings: &EngineSettings, runtime: Handle) -> Self {
        let renderer = FeedbackRenderer::from_settings(settings);
        Self::with_renderer(settings, runtime, renderer)
    }

    /// Same as [`Engine::new`] with an explicit renderer
    pub fn with_renderer(settings: &EngineSettings, runtime: Handle, renderer: FeedbackRenderer) -> Self {
        let ctx = ActionContext::new(runtime, renderer, settings.momentary_delay());
        let mut engine = Self {
            actions: HashMap::new(),
            ctx,
        };
        for action in builtin_actions() {
            engine.register_action(action);
        }
        info!("Engine ready with {} actions", engine.actions.len());
        engine
    }

    /// Persist sender settings written by Set Defaults into `dir`
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.ctx.data_dir = Some(dir);
        self
    }

    pub fn register_action(&mut self, action: Arc<dyn Action>) {
        debug!("Registering action '{}'", action.name());
        self.actions.insert(action.name().to_string(), action);
    }

    fn action(&self, name: &str) -> Result<&Arc<dyn Action>, ActionError> {
        self.actions.get(name).ok_or_else(|| {
            error!("Unknown action '{}'", name);
            ActionError::UnknownAction(name.to_string())
        })
    }

    /// Registered actions, sorted by name
    pub fn actions(&self) -> Vec<Arc<dyn Action>> {
        let mut actions: Vec<_> = self.actions.values().cloned().collect();
        actions.sort_by(|a, b| a.name().cmp(b.name()));
        actions
    }

    /// Button press or knob reset
    pub fn run_command(&self, action: &str, params: &ActionParams) -> Result<(), ActionError> {
        self.action(action)?.run_command(params, &self.ctx)
    }

    /// Dial rotation by `diff` ticks
    pub fn apply_adjustment(&self, action: &str, params: &ActionParams, diff: i32) -> Result<(), ActionError> {
        self.action(action)?.apply_adjustment(params, diff, &self.ctx)
    }

    /// Feedback image for a host slot of `width` x `height` pixels
    ///
    /// Reads the store only; never blocks on the transport.
    pub fn request_image(
        &self,
        action: &str,
        params: &ActionParams,
        width: u32,
        height: u32,
    ) -> Result<Option<RgbaImage>, ActionError> {
        let size = ImageSize::for_slot(width, height);
        self.action(action)?.image(params, size, &self.ctx)
    }

    pub fn adjustment_display_name(&self, action: &str, params: &ActionParams) -> Result<Option<String>, ActionError> {
        Ok(self.action(action)?.adjustment_display_name(params))
    }

    /// Listbox items for `control`; an unknown control yields no items
    pub fn listbox_items(&self, action: &str, control: &str) -> Result<Vec<ListboxItem>, ActionError> {
        let items = self.action(action)?.listbox_items(control);
        Ok(items.unwrap_or_else(|| {
            error!("Action '{}' has no listbox '{}'", action, control);
            Vec::new()
        }))
    }

    /// Point the transport at new sender settings
    pub async fn apply_sender_settings(&self, settings: &SenderSettings) -> TransportStatus {
        self.ctx.apply_sender_settings(settings).await
    }

    /// Listen for every state change
    pub fn subscribe(&self, listener: ChangeListener) {
        self.ctx.subscribe(listener);
    }

    /// Listen for transport status changes
    pub fn subscribe_status(&self, callback: StatusCallback) {
        self.ctx.transport.subscribe_status(callback);
    }

    pub fn store(&self) -> &AddressStore {
        &self.ctx.store
    }

    pub fn transport_status(&self) -> TransportStatus {
        self.ctx.transport.status()
    }

    pub fn context(&self) -> &ActionContext {
        &self.ctx
    }

    /// Fire pending momentary reverts now and close the socket
    pub fn shutdown(&self) {
        let flushed = self.ctx.scheduler.flush();
        if flushed > 0 {
            info!("Flushed {} pending momentary reverts", flushed);
        }
        self.ctx.transport.close();
        info!("Engine shut down");
    }
}
