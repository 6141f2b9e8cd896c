use clusterflow_cloud::{ContinuationStore, ResourceDescriptor};
use colored::Colorize;

/// Forget the stored continuation
///
/// The remote operation is not cancelled; the next `create` starts over.
pub async fn handle(
    store: &ContinuationStore,
    descriptor: &ResourceDescriptor,
) -> anyhow::Result<()> {
    let lock = store.acquire_lock(descriptor).await?;

    match store.load(descriptor).await? {
        Some(continuation) => {
            store.clear(descriptor).await?;
            if let Some(id) = continuation.operation_id {
                tracing::warn!(operation_id = %id, "Abandoning in-flight operation");
            }
            println!("{} {}", "✓ Reset".green(), descriptor.key());
        }
        None => println!("Nothing stored for {}", descriptor.key()),
    }

    lock.release().await?;
    Ok(())
}
