use std::future::Future;

use action_primitives::Actuator;
use pilot_core_types::Descriptor;
use tracing::{debug, warn};

/// Mark `candidates`, run `operation`, then clear every mark
///
/// Marks are cleared whatever `operation` returns. Marking failures are
/// diagnostic only and never change the result.
pub async fn with_marks<F, T>(actuator: &dyn Actuator, candidates: &[Descriptor], operation: F) -> T
where
    F: Future<Output = T>,
{
    if let Err(err) = actuator.mark(candidates).await {
        debug!(%err, "marking candidates failed");
    }
    let output = operation.await;
    if let Err(err) = actuator.clear_marks().await {
        warn!(%err, "clearing candidate marks failed");
    }
    output
}
