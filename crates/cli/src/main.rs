// Accession CLI - headless archival intake operations

mod exit_codes;

use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};

use accession_config::Settings;
use accession_engine::address::Address;
use accession_engine::cell::CellValue;
use accession_io::project::{
    self, Project, ProjectError, SortOrder,
};
use accession_io::gsheet;
use accession_io::store::ProjectStore;

use exit_codes::{
    EXIT_AI_MISSING_KEY, EXIT_ERROR, EXIT_NETWORK, EXIT_NO_PROJECT, EXIT_STORE, EXIT_SUCCESS,
    EXIT_USAGE, EXIT_VALIDATION,
};

#[derive(Parser)]
#[command(name = "accession")]
#[command(about = "Archival metadata intake for digitized image collections")]
#[command(version)]
struct Cli {
    /// Project database path (defaults to the per-user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Desc,
    Asc,
}

impl From<SortArg> for SortOrder {
    fn from(s: SortArg) -> Self {
        match s {
            SortArg::Desc => SortOrder::Descending,
            SortArg::Asc => SortOrder::Ascending,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a project from a directory of images
    #[command(after_help = "\
Examples:
  accession new ./scans --name 'Box 12'
  accession new ./scans --name 'Box 12' --sort asc")]
    New {
        /// Directory containing the images to catalog
        dir: PathBuf,

        /// Project name
        #[arg(long)]
        name: String,

        /// Image ordering (defaults to the configured preference)
        #[arg(long)]
        sort: Option<SortArg>,
    },

    /// Import a CSV file, stdin, or a Google Sheets share link as a project
    #[command(after_help = "\
Examples:
  accession import metadata.csv --name 'Box 12'
  cat metadata.csv | accession import --name 'Box 12'
  accession import --url 'https://docs.google.com/spreadsheets/d/…/edit' --name 'Box 12'")]
    Import {
        /// CSV file (omit to read from stdin)
        input: Option<PathBuf>,

        /// Google Sheets share link to fetch instead of a file
        #[arg(long, conflicts_with = "input")]
        url: Option<String>,

        /// Project name
        #[arg(long)]
        name: String,
    },

    /// Export the project as CSV
    Export {
        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show project summary
    Show,

    /// Set one cell by A1 address (row 1 is the header; data starts at row 2)
    #[command(after_help = "\
Examples:
  accession set E2 '[Portrait of a miner]'
  accession set L3 '46.5958'")]
    Set {
        /// Cell address, e.g. B2
        address: String,

        /// New value
        value: String,
    },

    /// Append or insert an empty row
    AddRow {
        /// Insert before this data row (1-based); omit to append
        #[arg(long)]
        at: Option<usize>,
    },

    /// Delete a data row
    DeleteRow {
        /// Data row number (1-based)
        row: usize,
    },

    /// Move a data row
    MoveRow {
        /// Data row number to move (1-based)
        from: usize,
        /// Destination data row number (1-based)
        to: usize,
    },

    /// Validate every cell against its field and report problems
    Validate,

    /// Draft metadata for project images with the vision model
    #[command(after_help = "\
Results are cached in the project store and seed default values the next
time a template is generated.")]
    Describe {
        /// Re-request drafts even for images that already have one
        #[arg(long)]
        force: bool,
    },

    /// Delete the stored project
    Clear,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(run(cli))
}

fn run(cli: Cli) -> u8 {
    let store = match open_store(cli.db.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return EXIT_STORE;
        }
    };

    match cli.command {
        Commands::New { dir, name, sort } => cmd_new(store, &dir, &name, sort),
        Commands::Import { input, url, name } => cmd_import(store, input, url, &name),
        Commands::Export { output } => cmd_export(store, output),
        Commands::Show => cmd_show(store),
        Commands::Set { address, value } => cmd_set(store, &address, value),
        Commands::AddRow { at } => cmd_add_row(store, at),
        Commands::DeleteRow { row } => cmd_delete_row(store, row),
        Commands::MoveRow { from, to } => cmd_move_row(store, from, to),
        Commands::Validate => cmd_validate(store),
        Commands::Describe { force } => cmd_describe(store, force),
        Commands::Clear => cmd_clear(store),
    }
}

fn open_store(db: Option<&std::path::Path>) -> Result<Arc<ProjectStore>, String> {
    let store = match db {
        Some(path) => ProjectStore::open(path),
        None => ProjectStore::open_default(),
    };
    store.map(Arc::new).map_err(|e| e.to_string())
}

fn load_project(store: Arc<ProjectStore>) -> Result<Project, u8> {
    match Project::load(store) {
        Ok(p) => Ok(p),
        Err(ProjectError::NoProject) => {
            eprintln!("error: no project found; run `accession new` or `accession import` first");
            Err(EXIT_NO_PROJECT)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Err(EXIT_STORE)
        }
    }
}

fn cmd_new(store: Arc<ProjectStore>, dir: &std::path::Path, name: &str, sort: Option<SortArg>) -> u8 {
    let order = sort
        .map(SortOrder::from)
        .unwrap_or_else(|| match Settings::load().sort_order {
            accession_config::SortPreference::Descending => SortOrder::Descending,
            accession_config::SortPreference::Ascending => SortOrder::Ascending,
        });

    match Project::create_from_images(store, name, dir, order) {
        Ok(p) => {
            println!(
                "Created project '{}' with {} images and {} fields",
                name,
                p.sheet.rows.len(),
                p.sheet.fields.len()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_ERROR
        }
    }
}

fn cmd_import(
    store: Arc<ProjectStore>,
    input: Option<PathBuf>,
    url: Option<String>,
    name: &str,
) -> u8 {
    let text = if let Some(url) = url {
        if !gsheet::is_sheets_url(&url) && gsheet::extract_sheet_id(&url).is_none() {
            eprintln!("error: not a Google Sheets URL: {}", url);
            return EXIT_USAGE;
        }
        match gsheet::fetch_csv(&url) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error: {}", e);
                return EXIT_NETWORK;
            }
        }
    } else if let Some(path) = input {
        match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error: cannot read {}: {}", path.display(), e);
                return EXIT_USAGE;
            }
        }
    } else {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("error: reading stdin: {}", e);
            return EXIT_ERROR;
        }
        buf
    };

    let sheet = project::sheet_from_csv(&text);
    if sheet.fields.is_empty() {
        eprintln!("error: input has no header row");
        return EXIT_USAGE;
    }

    match Project::create_from_sheet(store, name, sheet) {
        Ok(p) => {
            println!(
                "Imported project '{}' with {} rows and {} fields",
                name,
                p.sheet.rows.len(),
                p.sheet.fields.len()
            );
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_STORE
        }
    }
}

fn cmd_export(store: Arc<ProjectStore>, output: Option<PathBuf>) -> u8 {
    let project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let csv = project.export_csv();
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, csv) {
                eprintln!("error: cannot write {}: {}", path.display(), e);
                return EXIT_ERROR;
            }
            EXIT_SUCCESS
        }
        None => {
            println!("{}", csv);
            EXIT_SUCCESS
        }
    }
}

fn cmd_show(store: Arc<ProjectStore>) -> u8 {
    let project = match load_project(Arc::clone(&store)) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let name = store
        .project_name()
        .ok()
        .flatten()
        .unwrap_or_else(|| "(unnamed)".to_string());
    println!("Project: {}", name);
    println!("Rows:    {}", project.sheet.rows.len());
    println!(
        "Fields:  {}",
        project
            .sheet
            .fields
            .iter()
            .map(|f| f.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Ok(Some(saved_at)) = store.saved_at() {
        println!("Saved:   {}", saved_at);
    }
    if !project.sheet.images.is_empty() {
        println!("Images:  {}", project.sheet.images.len());
    }
    EXIT_SUCCESS
}

fn cmd_set(store: Arc<ProjectStore>, address: &str, value: String) -> u8 {
    let mut project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let addr = match Address::parse(address) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {}", e);
            return EXIT_USAGE;
        }
    };
    // Row 1 is the header row
    if addr.row == 0 {
        eprintln!("error: row 1 is the header; data starts at row 2");
        return EXIT_USAGE;
    }
    let Some(field) = project.sheet.fields.get(addr.col).map(|f| f.title.clone()) else {
        eprintln!(
            "error: no field at column {} (sheet has {})",
            address,
            project.sheet.fields.len()
        );
        return EXIT_USAGE;
    };

    match project.edit_cell(addr.row - 1, &field, CellValue::Text(value)) {
        Ok(()) => finish(&project),
        Err(accession_engine::sheet::EditError::Invalid(e)) => {
            eprintln!("error: {}", e);
            EXIT_VALIDATION
        }
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_USAGE
        }
    }
}

fn cmd_add_row(store: Arc<ProjectStore>, at: Option<usize>) -> u8 {
    let mut project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let index = at.map(|n| n.saturating_sub(1));
    project.add_row(&accession_engine::sheet::Row::default(), index);
    finish(&project)
}

fn cmd_delete_row(store: Arc<ProjectStore>, row: usize) -> u8 {
    let mut project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if row == 0 {
        eprintln!("error: data rows are numbered from 1");
        return EXIT_USAGE;
    }
    match project.delete_row(row - 1) {
        Ok(()) => finish(&project),
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_USAGE
        }
    }
}

fn cmd_move_row(store: Arc<ProjectStore>, from: usize, to: usize) -> u8 {
    let mut project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if from == 0 || to == 0 {
        eprintln!("error: data rows are numbered from 1");
        return EXIT_USAGE;
    }
    match project.move_row(from - 1, to - 1) {
        Ok(()) => finish(&project),
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_USAGE
        }
    }
}

fn cmd_validate(store: Arc<ProjectStore>) -> u8 {
    let project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let report = project::validate_sheet(&project.sheet);
    if report.is_empty() {
        println!("All cells valid");
        return EXIT_SUCCESS;
    }
    for (row, errors) in &report {
        for (field, message) in errors {
            // +2: 1-based plus the header row
            eprintln!("row {}, {}: {}", row + 2, field, message);
        }
    }
    EXIT_VALIDATION
}

fn cmd_describe(store: Arc<ProjectStore>, force: bool) -> u8 {
    let project = match load_project(Arc::clone(&store)) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let settings = Settings::load();
    let api_key = settings.ai.api_key();
    if api_key.is_none() && !settings.ai.api_key_env.is_empty() {
        eprintln!(
            "error: {} is not set; export it or clear ai.api_key_env in {}",
            settings.ai.api_key_env,
            Settings::config_path_display()
        );
        return EXIT_AI_MISSING_KEY;
    }
    let mut client = accession_ai::VisionClient::new(&settings.ai.endpoint, api_key);
    if !settings.ai.model.is_empty() {
        client = client.with_model(settings.ai.model.clone());
    }

    let mut results = match store.ai_results() {
        Ok(r) => r.unwrap_or_default(),
        Err(e) => {
            eprintln!("error: {}", e);
            return EXIT_STORE;
        }
    };

    let mut described = 0usize;
    for (filename, path) in &project.sheet.images {
        if !force && results.contains_key(filename) {
            continue;
        }
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("skipping {}: {}", filename, e);
                continue;
            }
        };
        match client.describe_image(&bytes, None) {
            Ok(response) => {
                results.insert(filename.clone(), response);
                described += 1;
            }
            Err(e) => {
                eprintln!("error describing {}: {}", filename, e);
                return EXIT_NETWORK;
            }
        }
    }

    if let Err(e) = store.set_ai_results(&results) {
        eprintln!("error: {}", e);
        return EXIT_STORE;
    }
    println!("Described {} image(s)", described);
    let pending = results.values().filter(|r| !r.is_done).count();
    if pending > 0 {
        println!("{} draft(s) have follow-up questions pending", pending);
    }
    EXIT_SUCCESS
}

fn cmd_clear(store: Arc<ProjectStore>) -> u8 {
    let project = match load_project(store) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match project.clear() {
        Ok(()) => {
            println!("Project cleared");
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_STORE
        }
    }
}

/// Persist the mutated sheet synchronously before the process exits.
fn finish(project: &Project) -> u8 {
    match project.save() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            EXIT_STORE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(args: &[&str]) -> u8 {
        run(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_import_set_export_round() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("project.db");
        let db = db.to_str().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "file,title\na.jpg,First\nb.jpg,Second\n").unwrap();

        let code = run_args(&[
            "accession", "--db", db, "import", input.to_str().unwrap(), "--name", "Box 1",
        ]);
        assert_eq!(code, EXIT_SUCCESS);

        // B2 = title of the first data row
        assert_eq!(run_args(&["accession", "--db", db, "set", "B2", "Renamed"]), EXIT_SUCCESS);

        let out = dir.path().join("out.csv");
        let code = run_args(&["accession", "--db", db, "export", "-o", out.to_str().unwrap()]);
        assert_eq!(code, EXIT_SUCCESS);
        let text = std::fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("file,title"));
        assert!(text.contains("a.jpg,Renamed"));
        assert!(text.contains("b.jpg,Second"));
    }

    #[test]
    fn test_set_rejects_header_row_and_bad_address() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("project.db");
        let db = db.to_str().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "file,title\na.jpg,First\n").unwrap();
        run_args(&["accession", "--db", db, "import", input.to_str().unwrap(), "--name", "x"]);

        assert_eq!(run_args(&["accession", "--db", db, "set", "A1", "nope"]), EXIT_USAGE);
        assert_eq!(run_args(&["accession", "--db", db, "set", "2B", "nope"]), EXIT_USAGE);
        // column past the schema
        assert_eq!(run_args(&["accession", "--db", db, "set", "Z2", "nope"]), EXIT_USAGE);
    }

    #[test]
    fn test_commands_without_project() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("project.db");
        let db = db.to_str().unwrap();

        assert_eq!(run_args(&["accession", "--db", db, "show"]), EXIT_NO_PROJECT);
        assert_eq!(run_args(&["accession", "--db", db, "export"]), EXIT_NO_PROJECT);
    }

    #[test]
    fn test_row_ops_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("project.db");
        let db = db.to_str().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "file,title\na.jpg,First\nb.jpg,Second\n").unwrap();
        run_args(&["accession", "--db", db, "import", input.to_str().unwrap(), "--name", "x"]);

        assert_eq!(run_args(&["accession", "--db", db, "add-row"]), EXIT_SUCCESS);
        assert_eq!(run_args(&["accession", "--db", db, "move-row", "1", "2"]), EXIT_SUCCESS);
        assert_eq!(run_args(&["accession", "--db", db, "delete-row", "3"]), EXIT_SUCCESS);
        assert_eq!(run_args(&["accession", "--db", db, "delete-row", "0"]), EXIT_USAGE);

        assert_eq!(run_args(&["accession", "--db", db, "clear"]), EXIT_SUCCESS);
        assert_eq!(run_args(&["accession", "--db", db, "show"]), EXIT_NO_PROJECT);
    }
}
