use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::StreamExt;
use shelf_archive::{ContainerFormat, Envelope};
use shelf_backup::export::{ExportEvent, ExportOptions, export};
use shelf_backup::restore::{RestoreEvent, RestoreOptions, RestoreSummary, restore};
use shelf_backup::{LocalSource, SourceHandle};
use shelf_config::Config;
use shelf_store::{Database, SqliteStore, StoreHandle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::OffsetDateTime;
use time::macros::format_description;

pub const ARCHIVE_EXTENSION: &str = "sbk";

async fn open_store(path: &Path) -> Result<(Database, StoreHandle)> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Write(parent.display().to_string()))?;
    }
    let db = Database::connect(path).await.or_raise(|| ErrorKind::Database)?;
    let store: StoreHandle = Arc::new(SqliteStore::from(&db));
    Ok((db, store))
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.or_raise(|| ErrorKind::Read(path.display().to_string()))
}

pub fn export_options(config: &Config) -> Result<ExportOptions> {
    Ok(ExportOptions {
        include_chapters: config.backup.include_chapters,
        include_settings: config.backup.include_settings,
        compression: config.backup.compression().or_raise(|| ErrorKind::Config)?,
        envelope: config.backup.envelope().or_raise(|| ErrorKind::Config)?,
    })
}

pub fn restore_options(config: &Config) -> Result<RestoreOptions> {
    Ok(RestoreOptions {
        envelope: config.restore.envelope().or_raise(|| ErrorKind::Config)?,
        pacing: config.restore.pacing(),
        poll_interval: config.restore.poll_interval(),
        refresh_timeout: config.restore.refresh_timeout(),
        ..Default::default()
    })
}

/// `shelf-backup-20260101-120000.sbk`
pub fn archive_file_name(now: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = now.format(format).unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("shelf-backup-{stamp}.{ARCHIVE_EXTENSION}")
}

pub async fn run_export(config: &Config, output: Option<PathBuf>) -> Result<PathBuf> {
    let options = export_options(config)?;
    let output = output.unwrap_or_else(|| config.backup.directory.join(archive_file_name(OffsetDateTime::now_utc())));
    let (db, store) = open_store(&config.database.path).await?;

    let mut archive = None;
    let mut events = std::pin::pin!(export(&store, options));
    while let Some(event) = events.next().await {
        match event.or_raise(|| ErrorKind::Export)? {
            ExportEvent::NovelsLoaded(count) => tracing::info!(count, "loaded bookmarked novels"),
            ExportEvent::ExtensionsResolved { found, missing } => {
                tracing::info!(found, missing, "resolved extensions");
            },
            ExportEvent::Complete(exported) => archive = Some(exported),
            event => tracing::debug!(?event, "export progress"),
        }
    }
    db.close().await;
    let Some(archive) = archive else {
        exn::bail!(ErrorKind::Export);
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Write(parent.display().to_string()))?;
    }
    tokio::fs::write(&output, &archive.bytes).await.or_raise(|| ErrorKind::Write(output.display().to_string()))?;
    let stats = &archive.stats;
    println!(
        "wrote {} ({} bytes, version {}): {} novel(s), {} chapter(s), {} extension(s), {} categor{}",
        output.display(),
        archive.bytes.len(),
        archive.version,
        stats.novels,
        stats.chapters,
        stats.extensions,
        stats.categories,
        if stats.categories == 1 { "y" } else { "ies" },
    );
    if stats.dropped_novels > 0 {
        println!("left out {} novel(s) of uninstalled extensions", stats.dropped_novels);
    }
    Ok(output)
}

pub async fn run_restore(config: &Config, archive: &Path, catalog: Option<&Path>) -> Result<RestoreSummary> {
    let options = restore_options(config)?;
    let bytes = read(archive).await?;
    let catalog = match catalog {
        Some(path) => Some(LocalSource::parse_catalog(&read(path).await?).or_raise(|| ErrorKind::Config)?),
        None => None,
    };
    let (db, store) = open_store(&config.database.path).await?;
    let mut source = LocalSource::new(store.clone());
    if let Some(catalog) = catalog {
        source = source.with_catalog(catalog);
    }
    let source: SourceHandle = Arc::new(source);

    let mut summary = None;
    let mut events = std::pin::pin!(restore(&store, &source, &bytes, options));
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                db.close().await;
                return Err(err.raise(ErrorKind::Restore));
            },
        };
        match event {
            RestoreEvent::Validated(version) => tracing::info!(%version, "archive accepted"),
            RestoreEvent::ListingRefreshed(report) => {
                tracing::info!(outcome = %report.outcome, available = report.available, "extension listing ready");
            },
            RestoreEvent::ExtensionSkipped { id, reason } => tracing::warn!(id, %reason, "skipped extension"),
            RestoreEvent::Complete(done) => summary = Some(done),
            event => tracing::debug!(?event, "restore progress"),
        }
    }
    db.close().await;
    let Some(summary) = summary else {
        exn::bail!(ErrorKind::Restore);
    };
    println!("{summary}");
    for extension in summary.extensions.iter().filter(|e| e.failed + e.skipped > 0) {
        println!(
            "  extension {}: {}, {} failed, {} not attempted",
            extension.id, extension.status, extension.failed, extension.skipped
        );
    }
    Ok(summary)
}

pub async fn run_inspect(archive: &Path) -> Result<()> {
    let bytes = read(archive).await?;
    let envelope = Envelope::sniff(&bytes);
    let container = envelope.open(&bytes).or_raise(|| ErrorKind::Inspect)?;
    let info = shelf_archive::inspect(&container).or_raise(|| ErrorKind::Inspect)?;
    let tree = shelf_archive::decode_tree(&container).or_raise(|| ErrorKind::Inspect)?;

    let format = match info.format {
        ContainerFormat::Framed => "framed",
        ContainerFormat::Legacy => "legacy",
    };
    println!("archive:      {}", archive.display());
    println!("version:      {}", info.version);
    println!("format:       {format} ({envelope})");
    println!("compression:  {}", info.compression);
    if let Some(created) = info.created {
        println!("created:      {created}");
    }
    println!("repositories: {}", tree.repositories.len());
    println!("categories:   {}", tree.categories.len());
    println!("extensions:   {}", tree.extensions.len());
    println!("novels:       {}", tree.novel_count());
    println!("chapters:     {}", tree.chapter_count());
    Ok(())
}
