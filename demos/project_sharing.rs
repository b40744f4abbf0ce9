//! Project and sharing example.
//!
//! This example shows how to:
//! - Attach documents to a project and notify its members
//! - Share a personal document with a colleague
//! - See how view and manage access differ per user
//! - List documents with filters and sorting
//!
//! Run with: cargo run --example project_sharing

use docbridge::prelude::*;
use docbridge::store::RecordingNotificationSink;
use tokio_util::sync::CancellationToken;

const MANAGER: UserId = UserId(1);
const ANALYST: UserId = UserId(2);
const DESIGNER: UserId = UserId(3);
const AUDITOR: UserId = UserId(4);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,docbridge::audit=info".into()),
        )
        .init();

    println!("=== Docbridge Project Sharing Example ===\n");

    let directory = InMemoryDirectory::new()
        .with_user(UserProfile::new(MANAGER, "Priya Manager", Role::ProjectManager))
        .with_user(UserProfile::new(ANALYST, "Sam Analyst", Role::Employee))
        .with_user(UserProfile::new(DESIGNER, "Kim Designer", Role::Employee))
        .with_user(UserProfile::new(AUDITOR, "Alex Auditor", Role::Administrator))
        .with_project(
            Project::new(ProjectId(7), "Website Relaunch", MANAGER)
                .with_member(ANALYST)
                .with_member(DESIGNER),
        );

    let notifications = RecordingNotificationSink::new();
    let engine = DocumentEngine::builder()
        .with_repository(InMemoryRepository::new())
        .with_directory(directory)
        .with_file_store(InMemoryFileStore::new())
        .with_scan_queue(InMemoryScanQueue::default())
        .with_notifier(notifications.clone())
        .build()?;

    let cancel = CancellationToken::new();

    // Project documents
    let brief = engine
        .upload(
            ANALYST,
            UploadRequest::new("Launch Brief", "Project Documents")
                .with_project(ProjectId(7))
                .with_tags(["launch"]),
            FileUpload::new(b"brief".to_vec(), "brief.docx", "application/msword"),
            &cancel,
        )
        .await?;
    println!("{} uploaded '{}'", ANALYST, brief.title);
    for n in notifications.sent() {
        println!("  notified user {}: {}", n.user_id, n.message);
    }

    // A personal document, shared explicitly
    let notes = engine
        .upload(
            DESIGNER,
            UploadRequest::new("Moodboard Notes", "Personal Files"),
            FileUpload::new(b"notes".to_vec(), "notes.txt", "text/plain"),
            &cancel,
        )
        .await?;
    let summary = engine
        .share(notes.id, DESIGNER, ShareRequest::new([ANALYST, ANALYST]), &cancel)
        .await?;
    println!(
        "\n{} shared '{}' with {:?} ({} new)",
        DESIGNER,
        notes.title,
        summary.recipients,
        summary.newly_shared.len()
    );

    // Access differs per user
    println!("\n=== Access ===\n");
    for (user, name) in [
        (MANAGER, "manager"),
        (ANALYST, "analyst"),
        (DESIGNER, "designer"),
        (AUDITOR, "auditor"),
    ] {
        let visible = engine
            .list_documents(user, &DocumentQuery::new(), &cancel)
            .await?;
        let titles: Vec<_> = visible.iter().map(|v| v.document.title.as_str()).collect();
        println!("{:>9} sees {:?}", name, titles);
    }

    // Members view project documents but only the manager may edit them
    let attempt = engine
        .update_metadata(brief.id, DESIGNER, MetadataUpdate::new().title("Mine now"), &cancel)
        .await;
    println!("\nDesigner edit: {}", describe(attempt));

    let attempt = engine
        .update_metadata(brief.id, MANAGER, MetadataUpdate::new().title("Launch Brief v2"), &cancel)
        .await;
    println!("Manager edit: {}", describe(attempt));

    // Filtered listing
    println!("\n=== Search ===\n");
    let query = DocumentQuery::new()
        .with_search("relaunch")
        .sorted_by(SortKey::Title, SortDirection::Asc);
    for view in engine.list_documents(AUDITOR, &query, &cancel).await? {
        println!(
            "{} [{}] in {:?} by {:?}",
            view.document.title,
            view.document.category,
            view.project_name,
            view.uploader_name
        );
    }

    println!("\n=== Example Complete ===");
    Ok(())
}

fn describe(result: Result<Document, DocumentError>) -> String {
    match result {
        Ok(document) => format!("ok, title is now '{}'", document.title),
        Err(e) => format!("refused ({})", e),
    }
}
