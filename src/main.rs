//! `empdb` command line tool.
//!
//! # Usage
//!
//! ```bash
//! empdb -n -f staff.db          # create and fill with the sample set
//! empdb -f staff.db             # validate and list
//! empdb -f staff.db -s 1002     # search by id
//! empdb -f staff.db -d 1002     # delete by id
//! empdb -f staff.db -i in.csv   # append rows from CSV
//! empdb -f staff.db -e out.csv  # dump records to CSV
//! ```
//!
//! Exits 0 on success and 1 on any failure, with a diagnostic on stderr.

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use empdb::storage::{export_csv, import_csv, sample_employees, CsvOptions};
use empdb::{EmpDbError, RecordStore};

#[derive(Debug, Parser)]
#[command(name = "empdb", version, about = "Flat-file employee database")]
struct Cli {
    /// Create the database file and populate it with sample records
    #[arg(short = 'n', long = "new")]
    new: bool,

    /// Path to the database file
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    file: PathBuf,

    /// Print the first record with this id
    #[arg(short = 's', long = "search", value_name = "ID")]
    search: Option<u32>,

    /// Delete every record with this id
    #[arg(short = 'd', long = "delete", value_name = "ID")]
    delete: Option<u32>,

    /// Append records from a CSV file (id,name,salary)
    #[arg(short = 'i', long = "import", value_name = "CSV")]
    import: Option<PathBuf>,

    /// Write all records to a CSV file
    #[arg(short = 'e', long = "export", value_name = "CSV")]
    export: Option<PathBuf>,
}

impl Cli {
    fn has_action(&self) -> bool {
        self.search.is_some()
            || self.delete.is_some()
            || self.import.is_some()
            || self.export.is_some()
    }
}

fn main() -> ExitCode {
    log_init::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err((context, e)) => {
            eprintln!("{context}: {e}");
            ExitCode::FAILURE
        }
    }
}

type CliResult = std::result::Result<(), (&'static str, EmpDbError)>;

fn run(cli: &Cli) -> CliResult {
    let store = RecordStore::new(&cli.file);

    if cli.new {
        store
            .create_file()
            .map_err(|e| ("Failed to create database file", e))?;
        store
            .append_records(&sample_employees())
            .map_err(|e| ("Failed to insert sample records", e))?;
        println!("Database created with sample records.");
    } else {
        store
            .open_and_validate()
            .map_err(|e| ("Failed to load database file", e))?;
    }

    if let Some(csv_path) = &cli.import {
        let result = import_csv(&store, csv_path, &CsvOptions::default())
            .map_err(|e| ("Failed to import records", e))?;
        println!("Imported {} records.", result.imported);
    }

    if let Some(id) = cli.delete {
        let deleted = store
            .delete_by_id(id)
            .map_err(|e| ("Failed to delete record", e))?;
        if deleted {
            println!("Deleted employee {id}.");
        } else {
            println!("Employee {id} not found.");
        }
    }

    if let Some(id) = cli.search {
        match store
            .search_by_id(id)
            .map_err(|e| ("Failed to search records", e))?
        {
            Some(employee) => println!("{employee}"),
            None => println!("Employee {id} not found."),
        }
    }

    if let Some(csv_path) = &cli.export {
        let file = File::create(csv_path).map_err(|e| {
            (
                "Failed to export records",
                EmpDbError::IoError(format!("Failed to create {}: {e}", csv_path.display())),
            )
        })?;
        let count = export_csv(&store, file, &CsvOptions::default())
            .map_err(|e| ("Failed to export records", e))?;
        println!("Exported {count} records.");
    }

    if !cli.new && !cli.has_action() {
        for employee in store
            .list_records()
            .map_err(|e| ("Failed to list records", e))?
        {
            let employee = employee.map_err(|e| ("Failed to list records", e))?;
            println!("{employee}");
        }
    }

    Ok(())
}
