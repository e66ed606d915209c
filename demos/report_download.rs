//! Report Download Example
//!
//! This example demonstrates the report flow a list screen drives:
//! - Loading the most recent patients (or searching when a query is given)
//! - Generating a report through the download dialog workflow
//! - Watching progress updates
//! - Saving the finished report to disk
//!
//! Run this example with:
//! ```bash
//! HOSPITAL_ADMIN_API_URL=http://localhost:8080 cargo run --example report_download -- [query] [kind]
//! ```
//!
//! `kind` is one of: medical, sick, leave, visit, companion, companion_visit.

use std::sync::Arc;

use hospital_admin::{
    Client, ClientConfig, PatientListView, PatientScope, ReportKind, SearchView, TracingNotifier,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_default();
    let kind: ReportKind = args.next().as_deref().unwrap_or("medical").parse()?;

    // Step 1: Configure the client from HOSPITAL_ADMIN_* variables
    let client = Client::new(ClientConfig::from_env())?;
    let notifier = Arc::new(TracingNotifier);

    // Step 2: Pick a patient from a search or the recent list
    let patient = if query.trim().is_empty() {
        let mut view = PatientListView::new(&client, PatientScope::Recent, notifier.clone());
        view.refresh().await?;
        println!("{}: {} rows", view.title(), view.items().len());
        view.items().first().cloned()
    } else {
        let mut view = SearchView::new(&client, notifier.clone());
        let results = view.run(&query).await?;
        println!("Search {:?}: {} matches", query, results.patients().len());
        results.patients().first().cloned()
    };
    let Some(patient) = patient else {
        println!("No patient to report on");
        client.close().await;
        return Ok(());
    };

    // Step 3: Generate the report, printing progress as it arrives
    let view = PatientListView::new(&client, PatientScope::All, notifier);
    let mut updates = view.reports().subscribe();
    let watcher = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            println!("   {:?} {}%", state.phase, state.progress);
        }
    });

    println!("\nGenerating {} for {} ({})", kind.label(), patient.name, patient.id);
    let state = view.generate_report(&patient.id, kind).await?;

    // Step 4: Save the blob behind the object URL
    if let Some(url) = &state.file_url {
        if let Some(blob) = client.object_urls().resolve(url) {
            blob.save_to(&state.file_name).await?;
            println!("Saved {} ({} bytes, {})", state.file_name, blob.len(), blob.content_type());
        }
    }

    // Step 5: Close the dialog and the client
    view.close_report_dialog();
    drop(view);
    let _ = watcher.await;
    client.close().await;
    Ok(())
}
