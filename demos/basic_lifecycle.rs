//! Basic lifecycle example: upload, scan, download, replace, delete.
//!
//! This example shows how to:
//! - Build a DocumentEngine over a filesystem file store
//! - Upload a document and observe the scan gate
//! - Report a scan verdict the way the scanning worker would
//! - Replace the content and watch it go back to Pending
//!
//! Run with: cargo run --example basic_lifecycle

use docbridge::prelude::*;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Docbridge Basic Lifecycle Example ===\n");

    let storage = TempDir::new()?;
    let repository = InMemoryRepository::new();
    let queue = InMemoryScanQueue::default();
    let directory = InMemoryDirectory::new()
        .with_user(UserProfile::new(UserId(1), "Dana Lee", Role::Employee));

    let engine = DocumentEngine::builder()
        .with_repository(repository.clone())
        .with_directory(directory)
        .with_file_store(FilesystemFileStore::new(storage.path())?)
        .with_scan_queue(queue.clone())
        .build()?;

    let cancel = CancellationToken::new();
    let owner = UserId(1);

    // Upload
    let upload = FileUpload::new(
        b"%PDF-1.7 quarterly budget".to_vec(),
        "Budget.pdf",
        "application/pdf",
    );
    let request = UploadRequest::new("Q1 Budget", "Reports")
        .with_description("Numbers for the first quarter")
        .with_tags(["finance", "q1"]);
    let document = engine.upload(owner, request, upload, &cancel).await?;

    println!("Uploaded document {} ({})", document.id, document.title);
    println!("Stored at: {}", document.file_path);
    println!("Scan status: {}", document.scan_status);
    println!("Queued messages on '{}': {}", queue.name(), queue.len());

    // Scan gate
    match engine.download(document.id, owner, &cancel).await {
        Err(DocumentError::ScanPending { .. }) => {
            println!("\nDownload refused: scan still pending");
        }
        other => println!("\nUnexpected result: {:?}", other.map(|c| c.file_name)),
    }

    // The scanning worker reports back
    let job = queue.jobs().into_iter().last().ok_or("no scan job queued")?;
    let outcome = record_verdict(&repository, &job, ScanVerdict::Clean).await?;
    println!("Verdict applied: {}", outcome.is_applied());

    let content = engine.download(document.id, owner, &cancel).await?;
    println!(
        "Downloaded {} ({} bytes, {})",
        content.file_name,
        content.data.len(),
        content.content_type
    );

    // Replace sends the document back for scanning
    println!("\n=== Replacing Content ===\n");
    let replacement = FileUpload::new(
        b"%PDF-1.7 revised budget".to_vec(),
        "Budget-v2.pdf",
        "application/pdf",
    );
    let replaced = engine
        .replace_file(document.id, owner, replacement, &cancel)
        .await?;
    println!("New file: {}", replaced.file_name);
    println!("Scan status: {}", replaced.scan_status);

    // A verdict for the old content is ignored
    let stale = record_verdict(&repository, &job, ScanVerdict::Clean).await?;
    println!("Old verdict applied: {}", stale.is_applied());

    // Metadata
    let updated = engine
        .update_metadata(
            document.id,
            owner,
            MetadataUpdate::new().title("Q1 Budget (final)").tags(["finance"]),
            &cancel,
        )
        .await?;
    println!("\nRenamed to: {}", updated.title);

    // Delete
    engine.delete(document.id, owner, &cancel).await?;
    let after = engine.get_document(document.id, owner, &cancel).await?;
    println!("\nDeleted; still visible: {}", after.is_some());
    println!("Live documents: {}", engine.document_count(owner, &cancel).await?);

    println!("\n=== Example Complete ===");
    Ok(())
}
