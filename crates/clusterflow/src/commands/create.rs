use clusterflow_cloud::{
    ClientFactory, ContinuationStore, ProgressSignal, ProvisionHandler, ResourceDescriptor,
    SecretStore,
};
use colored::Colorize;
use std::process::ExitCode;

pub async fn handle<S, F>(
    handler: &ProvisionHandler<S, F>,
    store: &ContinuationStore,
    descriptor: &ResourceDescriptor,
    once: bool,
) -> anyhow::Result<ExitCode>
where
    S: SecretStore,
    F: ClientFactory,
{
    super::print_descriptor(descriptor);
    println!();

    let signal = drive(handler, store, descriptor, once).await?;

    match &signal {
        ProgressSignal::InProgress { continuation } => {
            println!(
                "{} ({} polls left)",
                "Cluster creation in progress".yellow(),
                continuation.retries_remaining
            );
            println!("Run the same command again to continue.");
            Ok(ExitCode::SUCCESS)
        }
        ProgressSignal::Success => {
            println!("{}", "✓ Cluster is available".green().bold());
            Ok(ExitCode::SUCCESS)
        }
        ProgressSignal::Failed { .. } | ProgressSignal::TimedOut => {
            let message = signal.message().unwrap_or_default();
            eprintln!("{} {}", "✗ Cluster creation failed:".red().bold(), message);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Re-invoke the handler until a terminal signal, persisting in between
///
/// With `once` a single step is taken and its signal returned as is.
pub async fn drive<S, F>(
    handler: &ProvisionHandler<S, F>,
    store: &ContinuationStore,
    descriptor: &ResourceDescriptor,
    once: bool,
) -> anyhow::Result<ProgressSignal>
where
    S: SecretStore,
    F: ClientFactory,
{
    let lock = store.acquire_lock(descriptor).await?;
    let mut continuation = store.load(descriptor).await?;

    if continuation.is_some() {
        println!("{}", "Resuming stored continuation".blue());
    }

    let signal = loop {
        let signal = handler.handle(descriptor, continuation.take()).await;

        match signal {
            ProgressSignal::InProgress { continuation: next } => {
                store.save(descriptor, &next).await?;
                println!(
                    "  • operation {} pending ({} polls left)",
                    next.operation_id.as_deref().unwrap_or("-").cyan(),
                    next.retries_remaining
                );

                if once {
                    break ProgressSignal::in_progress(next);
                }
                continuation = Some(next);
            }
            terminal => {
                store.clear(descriptor).await?;
                break terminal;
            }
        }
    };

    lock.release().await?;
    Ok(signal)
}
