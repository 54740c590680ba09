//! Process-wide legacy device shared by every bridge.
//!
//! The legacy device is expensive and only used for aliasing, so a single one
//! serves all clients. It is created when the first client acquires it and
//! torn down (device, then context) when the last client lets go. The client
//! count and both handles live behind one lock, so creation and teardown are
//! mutually exclusive across threads.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::backend::LegacyApi;
use crate::com_ptr::LightComPtr;
use crate::error::{BridgeResult, OptionExt};
use crate::format::LegacyDeviceParams;

struct HostState<L: LegacyApi> {
    context: LightComPtr<L::Context>,
    device: LightComPtr<L::Device>,
    active_clients: usize,
}

/// Reference-counted owner of the shared legacy context and device.
///
/// Both handles are empty exactly when `active_clients` is zero.
pub struct LegacyDeviceHost<L: LegacyApi> {
    api: L,
    params: LegacyDeviceParams,
    state: Mutex<HostState<L>>,
}

impl<L: LegacyApi> LegacyDeviceHost<L> {
    pub fn new(api: L) -> Arc<Self> {
        Self::with_params(api, LegacyDeviceParams::default())
    }

    pub fn with_params(api: L, params: LegacyDeviceParams) -> Arc<Self> {
        Arc::new(Self {
            api,
            params,
            state: Mutex::new(HostState {
                context: LightComPtr::new(),
                device: LightComPtr::new(),
                active_clients: 0,
            }),
        })
    }

    pub fn api(&self) -> &L {
        &self.api
    }

    /// Register a client, starting the device if it is the first one.
    ///
    /// On failure the client count is rolled back and nothing stays held.
    pub fn acquire(self: &Arc<Self>) -> BridgeResult<LegacyDeviceLease<L>> {
        let mut state = self.state.lock();
        state.active_clients += 1;
        if state.active_clients == 1 {
            if let Err(err) = self.start(&mut state) {
                state.active_clients -= 1;
                return Err(err);
            }
        }

        let device = state
            .device
            .get()
            .cloned()
            .context("legacy device missing while clients are active")?;

        Ok(LegacyDeviceLease {
            device,
            client: ClientGuard(Arc::clone(self)),
        })
    }

    /// Number of live leases.
    pub fn active_clients(&self) -> usize {
        self.state.lock().active_clients
    }

    pub fn is_started(&self) -> bool {
        let state = self.state.lock();
        state.context.is_valid() && state.device.is_valid()
    }

    fn start(&self, state: &mut HostState<L>) -> BridgeResult<()> {
        // A context whose device fails to come up is dropped here, not kept.
        let context = self.api.create_context()?;
        let device = self.api.create_device(&context, &self.params)?;
        state.context.replace(context);
        state.device.replace(device);

        log::debug!("Legacy device started");
        Ok(())
    }

    fn release(&self) {
        let mut state = self.state.lock();
        if state.active_clients == 0 {
            log::warn!("Legacy device released with no active clients");
            return;
        }

        state.active_clients -= 1;
        if state.active_clients == 0 {
            state.device.release();
            state.context.release();
            log::debug!("Legacy device torn down");
        }
    }
}

/// One client's hold on the shared legacy device.
///
/// Dropping the lease returns the hold; the last lease tears the device down.
pub struct LegacyDeviceLease<L: LegacyApi> {
    // Field order matters: the retained device is released before the
    // client count drops, so teardown holds the final reference.
    device: L::Device,
    client: ClientGuard<L>,
}

impl<L: LegacyApi> LegacyDeviceLease<L> {
    pub fn device(&self) -> &L::Device {
        &self.device
    }

    pub fn api(&self) -> &L {
        self.client.0.api()
    }

    pub fn host(&self) -> &Arc<LegacyDeviceHost<L>> {
        &self.client.0
    }

    /// Explicitly give the hold back.
    pub fn release(self) {
        drop(self);
    }
}

struct ClientGuard<L: LegacyApi>(Arc<LegacyDeviceHost<L>>);

impl<L: LegacyApi> Drop for ClientGuard<L> {
    fn drop(&mut self) {
        self.0.release();
    }
}
