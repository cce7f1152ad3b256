//! Demo driver for the register store.
//!
//! # Responsibility
//! - Seed, update, delete and print sample registers through
//!   `RepositoryScope`, the same way any other caller would.
//! - Keep output deterministic enough for quick local sanity checks.

use clap::{Parser, Subcommand};
use ksiazka_core::{
    configure_db_path, db_path, default_log_level, init_logging, Entry, Register, RegisterId,
    RegisterRepository, RepoResult, RepositoryScope,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ksiazka", version, about = "Register (ksiazka) demo driver")]
struct Cli {
    /// SQLite database file; defaults to KSIAZKA_DB_PATH or a temp file.
    #[arg(long, env = "KSIAZKA_DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print registers as JSON instead of plain text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add the three sample registers (ids 1, 2, 3).
    Seed,
    /// Print one register.
    Show { id: RegisterId },
    /// Replace register 1 with its renamed variant.
    UpdateDemo,
    /// Delete one register with all of its entries.
    Delete { id: RegisterId },
    /// Seed, update register 1, delete register 2, then print 1..=3.
    Demo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    if let Some(db) = cli.db.as_ref() {
        if let Err(err) = configure_db_path(db) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> RepoResult<()> {
    println!("database={}", db_path().display());
    match cli.command {
        Command::Seed => seed(),
        Command::Show { id } => show(id, cli.json),
        Command::UpdateDemo => update_demo(),
        Command::Delete { id } => delete(id),
        Command::Demo => {
            // A failed step is reported and the demo keeps going.
            for outcome in [seed(), update_demo(), delete(2)] {
                if let Err(err) = outcome {
                    eprintln!("{err}");
                }
            }
            for id in 1..=3 {
                show(id, cli.json)?;
            }
            Ok(())
        }
    }
}

fn seed() -> RepoResult<()> {
    for register in sample_registers() {
        let mut scope = RepositoryScope::acquire_configured()?;
        scope.registers().add(&register)?;
        scope.mark_complete();
        scope.release()?;
        println!("added register {}", register.id);
    }
    Ok(())
}

fn update_demo() -> RepoResult<()> {
    let mut scope = RepositoryScope::acquire_configured()?;
    scope.registers().update(&renamed_directors())?;
    scope.mark_complete();
    scope.release()?;
    println!("updated register 1");
    Ok(())
}

fn delete(id: RegisterId) -> RepoResult<()> {
    let mut scope = RepositoryScope::acquire_configured()?;
    scope.registers().delete(&Register::with_id(id))?;
    scope.mark_complete();
    scope.release()?;
    println!("deleted register {id}");
    Ok(())
}

fn show(id: RegisterId, json: bool) -> RepoResult<()> {
    let scope = RepositoryScope::acquire_configured()?;
    let found = scope.registers().get_by_id(id)?;
    scope.release()?;

    match found {
        None => println!("register {id} not found"),
        Some(register) if json => match serde_json::to_string_pretty(&register) {
            Ok(text) => println!("{text}"),
            Err(err) => eprintln!("cannot serialize register {id}: {err}"),
        },
        Some(register) => {
            println!("{register}");
            for entry in &register.entries {
                println!("  {entry}");
            }
        }
    }
    Ok(())
}

fn sample_registers() -> Vec<Register> {
    vec![
        Register::filed_now(
            1,
            "Dyrektorzy",
            vec![
                person("Jan", "Janowski", 111_222_333, "zielona", "10B", "1", "Ustka"),
                person("Adam", "Adamowski", 222_333_444, "biala", "1B", "2", "Slupsk"),
                person("Alina", "Alinowicz", 333_444_555, "zolta", "60", "10", "Grudziadz"),
                person("Piotr", "Piotrowski", 444_555_666, "wojewodzka", "1", "150", "Warszawa"),
                person("Krystyna", "Krystynowicz", 555_666_777, "nowa", "12", "1", "Lublin"),
            ],
        ),
        Register::filed_now(2, "Kierownicy", staff()),
        Register::filed_now(3, "zarzad", staff()),
    ]
}

fn staff() -> Vec<Entry> {
    vec![
        person("Michal", "Janowski", 111_222_333, "zielona", "10B", "1", "Ustka"),
        person("Adam", "Babinicz", 222_333_444, "biala", "1B", "2", "Slupsk"),
        person("Michalina", "Iksinski", 333_444_555, "zolta", "60", "10", "Grudziadz"),
        person("Abelard", "Nowakowski", 444_555_666, "wojewodzka", "1", "150", "Warszawa"),
        person("Ziemowit", "Klimczak", 555_666_777, "nowa", "12", "1", "Lublin"),
    ]
}

fn renamed_directors() -> Register {
    Register::filed_now(
        1,
        "Dyrektorzy",
        vec![
            person("Jana", "Janowski", 111_222_333, "zielona", "10B", "1", "Ustka"),
            person("Adama", "Adamowski", 222_333_444, "biala", "1B", "2", "Slupsk"),
            person("Alina", "Alinowicz", 333_444_555, "zolta", "60", "10", "Grudziadz"),
            person("Piotr", "Piotrowski", 444_555_666, "wojewodzka", "1", "150", "Warszawa"),
            person("Krystyna", "Krystynowicz", 555_666_777, "nowa", "12", "1", "Lublin"),
        ],
    )
}

fn person(
    name: &str,
    surname: &str,
    phone_number: i64,
    street: &str,
    house_no: &str,
    apartment_no: &str,
    city: &str,
) -> Entry {
    Entry::new(name, surname, phone_number).with_address(street, house_no, apartment_no, city)
}
