//! Link Table CLI
//!
//! Command-line tool for browsing, opening and editing CSV link tables.

use clap::{ArgAction, Parser, Subcommand};
use lt_core::edit::{parse_append_row, parse_set_cell};
use lt_core::store::validate_file_name;
use lt_core::{
    apply_edits, collect_urls, open_all, parse_csv, render_rows, Discovery, Edit, EditFile,
    LinkItem, SessionState, StoreConfig, TableStore, UploadPolicy, UrlOpener,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lt-cli")]
#[command(about = "CSV link table viewer and editor", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the CSV tables
    #[arg(
        short,
        long,
        global = true,
        env = "LT_ROOT",
        default_value_os_t = StoreConfig::default().root
    )]
    root: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables in the root directory
    List {
        /// Print the full discovery as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a table's rows as links
    Show {
        /// Table file name (".csv" may be omitted)
        #[arg(short, long)]
        table: String,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Open every URL in a table
    OpenAll {
        /// Table file name
        #[arg(short, long)]
        table: String,

        /// Print the URLs instead of opening them
        #[arg(long)]
        dry_run: bool,
    },

    /// Open the link of a single row
    Open {
        /// Table file name
        #[arg(short, long)]
        table: String,

        /// Row number (0-based, as shown by `show`)
        #[arg(long)]
        row: usize,
    },

    /// Parse and display a single CSV file anywhere on disk
    Parse {
        /// Path to CSV file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Edit a table and save it
    Edit {
        /// Table file name
        #[arg(short, long)]
        table: String,

        /// Cell edits (row:column:value)
        #[arg(short, long)]
        set: Vec<String>,

        /// Rows to append (column=value,column=value)
        #[arg(short, long)]
        append: Vec<String>,

        /// Rows to delete (0-based)
        #[arg(short, long)]
        delete_row: Vec<usize>,

        /// Edit file (JSON) to apply before the other edits
        #[arg(short, long)]
        edits: Option<PathBuf>,
    },

    /// Create a new empty table
    Create {
        /// File name of the new table
        #[arg(short, long)]
        name: String,
    },

    /// Copy an external CSV file into the root directory
    Upload {
        /// File to upload
        #[arg(short, long)]
        file: PathBuf,

        /// Target file name (defaults to the uploaded file's name)
        #[arg(short, long)]
        name: Option<String>,

        /// Replace an existing table with the same name
        #[arg(long)]
        overwrite: bool,
    },

    /// Create an edit file template
    CreateEdits {
        /// Table the edits apply to
        #[arg(short, long)]
        table: String,

        /// Output path for the edit file
        #[arg(short, long)]
        output: PathBuf,

        /// Example edits to include (row:column:value)
        #[arg(short, long)]
        example: Vec<String>,
    },
}

/// Opens URLs in the system browser
struct BrowserOpener;

impl UrlOpener for BrowserOpener {
    fn open(&mut self, url: &str) -> Result<(), String> {
        webbrowser::open(url).map_err(|e| e.to_string())
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> lt_core::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = TableStore::new(StoreConfig::new(cli.root));

    match cli.command {
        Commands::List { json } => cmd_list(&store, json),
        Commands::Show { table, limit } => cmd_show(&store, &table, limit),
        Commands::OpenAll { table, dry_run } => cmd_open_all(&store, &table, dry_run),
        Commands::Open { table, row } => cmd_open(&store, &table, row),
        Commands::Parse { file } => cmd_parse(&file),
        Commands::Edit {
            table,
            set,
            append,
            delete_row,
            edits,
        } => cmd_edit(&store, &table, &set, &append, &delete_row, edits.as_deref()),
        Commands::Create { name } => cmd_create(&store, &name),
        Commands::Upload {
            file,
            name,
            overwrite,
        } => cmd_upload(&store, &file, name.as_deref(), overwrite),
        Commands::CreateEdits {
            table,
            output,
            example,
        } => cmd_create_edits(&table, &output, &example),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print and clear the notice left by the previous action
fn show_pending_notice(store: &TableStore) {
    let path = SessionState::path_in(store.root());
    let mut session = match SessionState::load(&path) {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable session file");
            return;
        }
    };

    if let Some(notice) = session.take_notice() {
        println!("* {}", notice.message);
        println!();
        if let Err(e) = session.save(&path) {
            tracing::warn!(error = %e, "failed to clear session notice");
        }
    }
}

/// Leave a notice for the next render
fn set_notice(store: &TableStore, message: &str) {
    let path = SessionState::path_in(store.root());
    let mut session = SessionState::load(&path).unwrap_or_default();
    session.set_notice(message);
    if let Err(e) = session.save(&path) {
        tracing::warn!(error = %e, "failed to store session notice");
    }
}

fn report_issues(discovery: &Discovery) {
    for issue in &discovery.issues {
        eprintln!("Error: {}", issue);
    }
}

fn print_empty_state() {
    println!("No CSV files found. Use `create` or `upload` to add one.");
}

fn cmd_list(store: &TableStore, json: bool) -> lt_core::Result<()> {
    let discovery = store.discover();

    if json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    show_pending_notice(store);
    report_issues(&discovery);

    if discovery.is_empty() {
        print_empty_state();
        return Ok(());
    }

    println!("Tables in {} ({}):", discovery.root.display(), discovery.entries.len());
    for entry in &discovery.entries {
        let encoding = entry.table.encoding.as_deref().unwrap_or("unreadable");
        println!(
            "  {} ({} rows, {})",
            entry.name(),
            entry.table.row_count(),
            encoding
        );
    }

    Ok(())
}

fn cmd_show(store: &TableStore, table_name: &str, limit: Option<usize>) -> lt_core::Result<()> {
    show_pending_notice(store);

    let discovery = store.discover();
    report_issues(&discovery);

    if discovery.is_empty() {
        print_empty_state();
        return Ok(());
    }

    let file_name = validate_file_name(table_name)?;
    let entry = discovery
        .find(&file_name)
        .ok_or_else(|| lt_core::Error::TableNotFound(file_name.clone()))?;
    let table = &entry.table;

    println!("{}", file_name);
    println!("{}", "=".repeat(file_name.chars().count()));

    if !table.has_url_column() {
        println!("This table has no 'url' column. Use `edit` to add one.");
        return Ok(());
    }

    let items = render_rows(table);
    let row_limit = limit.unwrap_or(items.len());
    for (i, item) in items.iter().enumerate().take(row_limit) {
        match item {
            LinkItem::Link { label, url } => println!("{:>4}  [link] {} -> {}", i, label, url),
            LinkItem::Label(label) => println!("{:>4}         {}", i, label),
        }
    }

    if items.len() > row_limit {
        println!("... ({} more rows)", items.len() - row_limit);
    }

    Ok(())
}

fn cmd_open_all(store: &TableStore, table_name: &str, dry_run: bool) -> lt_core::Result<()> {
    let table = store.load(table_name)?;

    if !table.has_url_column() {
        println!("This table has no 'url' column. Nothing to open.");
        return Ok(());
    }

    let urls = collect_urls(&table);
    if dry_run {
        for url in &urls {
            println!("{}", url);
        }
        return Ok(());
    }

    let report = open_all(&urls, &mut BrowserOpener);
    println!("Opened {} of {} URLs", report.opened.len(), urls.len());
    for (url, reason) in &report.failures {
        eprintln!("Could not open {}: {}", url, reason);
    }

    Ok(())
}

fn cmd_open(store: &TableStore, table_name: &str, row: usize) -> lt_core::Result<()> {
    let table = store.load(table_name)?;
    let items = render_rows(&table);

    let item = items.get(row).ok_or(lt_core::Error::RowOutOfRange {
        row,
        len: items.len(),
    })?;

    match item.url() {
        Some(url) => {
            if let Err(reason) = BrowserOpener.open(url) {
                eprintln!("Could not open {}: {}", url, reason);
            } else {
                println!("Opened {} -> {}", item.label(), url);
            }
        }
        None => println!("Row {} ({}) has no URL", row, item.label()),
    }

    Ok(())
}

fn cmd_parse(file: &Path) -> lt_core::Result<()> {
    let table = parse_csv(file)?;

    println!("File: {}", file.display());
    println!("Encoding: {}", table.encoding.as_deref().unwrap_or("unknown"));
    println!("Columns: {}", table.column_count());
    println!("Rows: {}", table.row_count());
    println!();

    let header: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    for record in table.records().take(10) {
        let values: Vec<&str> = record.iter().map(|(_, value)| value).collect();
        println!("{}", values.join("\t"));
    }

    if table.row_count() > 10 {
        println!("... ({} more rows)", table.row_count() - 10);
    }

    Ok(())
}

fn cmd_edit(
    store: &TableStore,
    table_name: &str,
    set: &[String],
    append: &[String],
    delete_rows: &[usize],
    edit_file: Option<&Path>,
) -> lt_core::Result<()> {
    let mut edits: Vec<Edit> = Vec::new();

    if let Some(path) = edit_file {
        let file = EditFile::load(path)?;
        if validate_file_name(&file.table)? != validate_file_name(table_name)? {
            eprintln!(
                "Warning: edit file targets '{}', applying to '{}'",
                file.table, table_name
            );
        }
        edits.extend(file.edits);
    }

    for arg in set {
        match parse_set_cell(arg) {
            Some(edit) => edits.push(edit),
            None => eprintln!("Warning: invalid edit '{}', expected 'row:column:value'", arg),
        }
    }
    for arg in append {
        match parse_append_row(arg) {
            Some(edit) => edits.push(edit),
            None => eprintln!("Warning: invalid row '{}', expected 'column=value,...'", arg),
        }
    }
    // Delete from the bottom up so earlier deletions don't shift later ones
    let mut deletes = delete_rows.to_vec();
    deletes.sort_unstable_by(|a, b| b.cmp(a));
    deletes.dedup();
    edits.extend(deletes.into_iter().map(Edit::delete_row));

    let mut table = store.load(table_name)?;
    table.normalize();

    let result = apply_edits(&mut table, &edits);
    println!("Applied {} of {} edits", result.applied, edits.len());
    for (edit, reason) in &result.failed {
        eprintln!("  skipped {:?}: {}", edit, reason);
    }
    if !edits.is_empty() && !result.changed() {
        println!("Nothing changed; {} left as is", table_name);
        return Ok(());
    }

    let outcome = store.save(&table);
    if !outcome.success {
        eprintln!("Error: {}", outcome.message);
        std::process::exit(1);
    }

    set_notice(store, &outcome.message);
    println!();
    cmd_show(store, table_name, None)
}

fn cmd_create(store: &TableStore, name: &str) -> lt_core::Result<()> {
    let table = store.create(name)?;

    let file_name = validate_file_name(name)?;
    set_notice(store, &format!("added new table {}", file_name));
    tracing::debug!(path = %table.source_path.display(), "new table ready");

    cmd_list(store, false)
}

fn cmd_upload(
    store: &TableStore,
    file: &Path,
    name: Option<&str>,
    overwrite: bool,
) -> lt_core::Result<()> {
    let bytes = std::fs::read(file).map_err(|e| lt_core::Error::FileRead {
        path: file.to_path_buf(),
        source: e,
    })?;

    let declared = match name {
        Some(name) => name.to_string(),
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };

    let policy = if overwrite {
        UploadPolicy::Overwrite
    } else {
        UploadPolicy::Reject
    };

    let table = store.upload(&declared, &bytes, policy)?;
    set_notice(
        store,
        &format!(
            "uploaded {} ({} rows)",
            validate_file_name(&declared)?,
            table.row_count()
        ),
    );

    cmd_list(store, false)
}

fn cmd_create_edits(table: &str, output: &Path, examples: &[String]) -> lt_core::Result<()> {
    let mut file = EditFile::new(validate_file_name(table)?);

    for example in examples {
        match parse_set_cell(example) {
            Some(edit) => file.add_edit(edit),
            None => eprintln!(
                "Warning: Invalid example format '{}', expected 'row:column:value'",
                example
            ),
        }
    }

    // If no examples provided, add a placeholder
    if file.edits.is_empty() {
        file.add_edit(Edit::set_cell(0, "url", "https://example.com"));
    }

    file.save(output)?;
    println!("Created edit file: {}", output.display());
    println!("Table: {}", file.table);
    println!("Edits: {}", file.edits.len());
    println!();
    println!("Edit the file to add your changes, then run:");
    println!("  lt-cli edit --table {} --edits {}", file.table, output.display());

    Ok(())
}
