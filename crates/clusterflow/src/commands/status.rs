use clusterflow_cloud::{ContinuationStore, ProvisioningState, ResourceDescriptor};
use colored::Colorize;

pub async fn handle(
    store: &ContinuationStore,
    descriptor: &ResourceDescriptor,
) -> anyhow::Result<()> {
    super::print_descriptor(descriptor);

    let continuation = store.load(descriptor).await?;
    let state = ProvisioningState::of(continuation.as_ref());

    let label = match state {
        ProvisioningState::NotStarted => state.to_string().dimmed(),
        ProvisioningState::Polling => state.to_string().yellow(),
        ProvisioningState::TimedOut => state.to_string().red(),
        _ => state.to_string().normal(),
    };
    println!("  state:  {}", label);

    match continuation {
        Some(continuation) => {
            if let Some(id) = &continuation.operation_id {
                println!("  operation: {}", id.cyan());
            }
            println!("  polls left: {}", continuation.retries_remaining);
            println!();
            println!("{}", serde_json::to_string_pretty(&continuation)?);
        }
        None => println!("  no stored continuation"),
    }

    Ok(())
}
