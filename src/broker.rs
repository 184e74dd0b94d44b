//! # Broker Module
//!
//! Handles through which action code talks to the rest of the cluster. The
//! messaging itself belongs to the broker client; this crate only carries one
//! resolved [`BrokerHandle`] into every [`crate::dispatcher::FlowContext`].
//!
//! | Context | Use |
//! |---|---|
//! | [`BroadcastContext`] | push to players, no ordering across calls |
//! | [`BroadcastOrderContext`] | push to players in strict call order |
//! | [`InvokeModuleContext`] | call another logic server |
//! | [`InvokeExternalModuleContext`] | call the external (gateway) servers |

use crate::cmd::CmdMerge;
use std::fmt;
use std::sync::Arc;

/// Unordered push to players.
pub trait BroadcastContext: Send + Sync {
    /// Push `data` on route `cmd_merge` to `actor_ids`, or to every online
    /// player when `actor_ids` is empty.
    fn broadcast(
        &self,
        cmd_merge: CmdMerge,
        data: Option<Vec<u8>>,
        actor_ids: &[i64],
    ) -> anyhow::Result<()>;
}

/// Push to players, delivered in the order the calls were made.
pub trait BroadcastOrderContext: Send + Sync {
    /// Same as [`BroadcastContext::broadcast`] with ordered delivery.
    fn broadcast_order(
        &self,
        cmd_merge: CmdMerge,
        data: Option<Vec<u8>>,
        actor_ids: &[i64],
    ) -> anyhow::Result<()>;
}

/// Calls between logic servers.
pub trait InvokeModuleContext: Send + Sync {
    /// Request/response call to the server that owns `cmd_merge`.
    fn invoke_module(
        &self,
        cmd_merge: CmdMerge,
        data: Option<Vec<u8>>,
    ) -> anyhow::Result<Option<Vec<u8>>>;

    /// One-way call to the server that owns `cmd_merge`.
    fn invoke_module_void(&self, cmd_merge: CmdMerge, data: Option<Vec<u8>>) -> anyhow::Result<()>;
}

/// Calls from a logic server to the external servers holding player connections.
pub trait InvokeExternalModuleContext: Send + Sync {
    /// Call every external server with business code `biz_code`, collecting
    /// one response per server.
    fn invoke_external_module(
        &self,
        biz_code: i32,
        data: Option<Vec<u8>>,
    ) -> anyhow::Result<Vec<Option<Vec<u8>>>>;
}

/// The broker client of this process.
///
/// A client usually implements every context itself and returns `self` from
/// each accessor.
pub trait BrokerClient: Send + Sync {
    /// Identifier of this client within the cluster
    fn id(&self) -> &str;
    /// Unordered broadcast
    fn broadcast_context(&self) -> &dyn BroadcastContext;
    /// Ordered broadcast
    fn broadcast_order_context(&self) -> &dyn BroadcastOrderContext;
    /// Logic server to logic server calls
    fn invoke_module_context(&self) -> &dyn InvokeModuleContext;
    /// Logic server to external server calls
    fn invoke_external_module_context(&self) -> &dyn InvokeExternalModuleContext;
}

/// Shared handle to the active [`BrokerClient`].
#[derive(Clone)]
pub struct BrokerHandle {
    client: Arc<dyn BrokerClient>,
}

impl BrokerHandle {
    /// Wrap the active client.
    pub fn new(client: Arc<dyn BrokerClient>) -> Self {
        Self { client }
    }

    /// The wrapped client
    pub fn client(&self) -> &Arc<dyn BrokerClient> {
        &self.client
    }

    /// Unordered broadcast
    pub fn broadcast(&self) -> &dyn BroadcastContext {
        self.client.broadcast_context()
    }

    /// Ordered broadcast
    pub fn broadcast_order(&self) -> &dyn BroadcastOrderContext {
        self.client.broadcast_order_context()
    }

    /// Logic server to logic server calls
    pub fn invoke_module(&self) -> &dyn InvokeModuleContext {
        self.client.invoke_module_context()
    }

    /// Logic server to external server calls
    pub fn invoke_external_module(&self) -> &dyn InvokeExternalModuleContext {
        self.client.invoke_external_module_context()
    }
}

impl fmt::Debug for BrokerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerHandle")
            .field("id", &self.client.id())
            .finish()
    }
}
