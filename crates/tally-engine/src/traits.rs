use std::sync::Arc;

use bytes::Bytes;
use tally_types::{Operation, ReplicaAddress};

use crate::error::EngineResult;

/// Called once with the reply payload or a systemic error.
pub type Completion = Box<dyn FnOnce(EngineResult<Bytes>) + Send + 'static>;

/// Opens sessions against a cluster.
pub trait Engine: Send + Sync {
    fn open(
        &self,
        client_id: u128,
        cluster_id: u128,
        addresses: &[ReplicaAddress],
    ) -> EngineResult<Arc<dyn EngineContext>>;
}

/// One open session's handle into the engine.
///
/// `submit` returns as soon as the batch is queued. Its completion runs
/// exactly once, from inside some later `drive` call, unless the context is
/// closed first, in which case the completion is dropped uncalled.
pub trait EngineContext: Send + Sync {
    fn submit(
        &self,
        operation: Operation,
        payload: Bytes,
        completion: Completion,
    ) -> EngineResult<()>;

    /// Make progress on queued work. Never blocks on the network.
    fn drive(&self) -> EngineResult<()>;

    /// Release the context. Idempotent.
    fn close(&self);

    fn is_closed(&self) -> bool;
}
