mod render;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use crmgrid_lib::RestClient;
use crmgrid_lib::TableSession;
use crmgrid_lib::crm;
use crmgrid_lib::crm::leads;
use crmgrid_lib::edit::SubmitTrigger;
use crmgrid_lib::error::ApiError;
use crmgrid_lib::model::FieldSource;
use crmgrid_lib::model::Record;
use crmgrid_lib::model::RecordId;
use crmgrid_lib::model::Value;
use crmgrid_lib::query::Direction;
use crmgrid_lib::query::SortDirective;
use crmgrid_lib::view::RowKey;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;

/// Browse and edit the leads and opportunities of a json-server backend.
#[derive(Debug, Clone, Parser)]
#[clap(name = "crmgrid", version)]
struct Cli {
    /// Base URL of the backend.
    #[clap(long, env = "CRMGRID_URL", default_value = "http://localhost:3000")]
    url: String,

    /// More log output; repeat for more.
    #[clap(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write logs to this file instead of stderr.
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Table {
    Leads,
    Opportunities,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Print one page of a table.
    List {
        #[clap(value_enum)]
        table: Table,

        /// Match against the searchable columns.
        #[clap(long, short)]
        search: Option<String>,

        /// Only rows whose status (or stage) equals this; `all` for every row.
        #[clap(long, short)]
        filter: Option<String>,

        /// Sort by this column instead of the table default.
        #[clap(long)]
        sort: Option<String>,

        /// Sort descending.
        #[clap(long, requires = "sort")]
        desc: bool,

        /// 1-based page number.
        #[clap(long, short, default_value_t = 1)]
        page: usize,

        /// Rows per page.
        #[clap(long)]
        page_size: Option<usize>,

        /// Hide a column; repeatable.
        #[clap(long = "hide")]
        hidden: Vec<String>,

        /// Print the page as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Change one lead field in place (email or status).
    Edit {
        id: RecordId,
        field: String,
        value: String,
    },

    /// Update several fields of a record at once.
    Set {
        #[clap(value_enum)]
        table: Table,
        id: RecordId,

        /// Assignments in the form `field=value`.
        #[clap(required = true)]
        assignments: Vec<String>,
    },

    /// Delete a row.
    Delete {
        #[clap(value_enum)]
        table: Table,
        id: RecordId,

        /// The row is a converted lead shown among the opportunities.
        #[clap(long)]
        derived: bool,
    },

    /// Create a lead.
    CreateLead {
        #[clap(long)]
        name: String,
        #[clap(long)]
        company: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        source: String,
        #[clap(long, default_value_t = 0.0)]
        score: f64,
        #[clap(long, default_value = "New")]
        status: String,
    },

    /// Turn a lead into an opportunity and mark it converted.
    Convert {
        lead: RecordId,

        /// Opportunity name; defaults to "<lead name> - Opportunity".
        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        stage: Option<String>,

        #[clap(long)]
        amount: Option<f64>,

        /// Account name; defaults to the lead's company.
        #[clap(long)]
        account: Option<String>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Crm(#[from] crmgrid_lib::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] log::SetLoggerError),

    #[error("Failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

impl From<crmgrid_lib::error::ConfigError> for CliError {
    fn from(e: crmgrid_lib::error::ConfigError) -> Self {
        CliError::Crm(e.into())
    }
}

impl From<crmgrid_lib::error::FieldError> for CliError {
    fn from(e: crmgrid_lib::error::FieldError) -> Self {
        CliError::Crm(e.into())
    }
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<(), CliError> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    match log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(
            level,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        )?,
    }
    Ok(())
}

fn session(client: RestClient, table: Table) -> Result<TableSession<RestClient>, CliError> {
    Ok(match table {
        Table::Leads => crm::leads::session(client)?,
        Table::Opportunities => crm::opportunities::session(client)?,
    })
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str), CliError> {
    assignment
        .split_once('=')
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| CliError::Usage(format!("Expected field=value, got '{}'", assignment)))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let client = RestClient::builder().url(cli.url).build()?;

    match cli.command {
        Command::List {
            table,
            search,
            filter,
            sort,
            desc,
            page,
            page_size,
            hidden,
            json,
        } => {
            let mut session = session(client, table)?;
            let view = session.view_mut();
            if let Some(search) = search {
                view.set_search(search);
            }
            if let Some(filter) = filter {
                view.set_category(filter);
            }
            if let Some(column) = sort {
                if !view.columns().is_sortable(&column) {
                    return Err(CliError::Usage(format!("Column '{}' is not sortable", column)));
                }
                let direction = if desc { Direction::Desc } else { Direction::Asc };
                view.set_sort(Some(SortDirective::new(column, direction)));
            }
            if let Some(page_size) = page_size {
                view.set_page_size(page_size);
            }
            for column in &hidden {
                view.toggle_column(column, false);
            }
            view.set_page(page);

            session.refresh().await?;

            let sort = session.view().params().sort().cloned();
            let columns = session.view().columns().clone();
            let page = session.page();
            if json {
                let items: Vec<&Record> = page.items().iter().map(|row| row.record()).collect();
                let out = serde_json::json!({ "meta": page.meta, "items": items });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", render::table(columns.visible(), page, sort.as_ref()));
                println!("{}", render::pager(&page.meta));
            }
        }

        Command::Edit { id, field, value } => {
            if !leads::INLINE_FIELDS.contains(&field.as_str()) {
                return Err(CliError::Usage(format!(
                    "'{}' cannot be edited in place; use `set` instead",
                    field
                )));
            }
            let mut session = leads::session(client)?;
            session.refresh().await?;
            session.begin_edit(&RowKey::Primary(id), &field)?;
            session.set_edit_input(&value)?;
            let outcome = session.commit_edit(SubmitTrigger::AcceptKey).await?;
            log::info!("Edit finished: {:?}", outcome);
        }

        Command::Set {
            table,
            id,
            assignments,
        } => {
            let mut session = session(client, table)?;
            session.refresh().await?;
            let current = session
                .view()
                .record(&id)
                .cloned()
                .ok_or_else(|| CliError::Usage(format!("No record {} in {:?}", id, table)))?;

            let mut patch = Record::new();
            for assignment in &assignments {
                let (field, input) = parse_assignment(assignment)?;
                patch.insert(field, Value::from_input(input, current.field(field)));
            }
            session.update_record(&id, &patch).await?;
        }

        Command::Delete { table, id, derived } => {
            let key = if derived {
                RowKey::Derived(id)
            } else {
                RowKey::Primary(id)
            };
            let mut session = session(client, table)?;
            session.delete(&key).await?;
        }

        Command::CreateLead {
            name,
            company,
            email,
            source,
            score,
            status,
        } => {
            let mut session = leads::session(client)?;
            let draft = session.begin_create();
            draft.insert("name", name);
            draft.insert("company", company);
            draft.insert("email", email);
            draft.insert("source", source);
            draft.insert("score", score);
            draft.insert(leads::STATUS_FIELD, status);
            let created = session.submit_create().await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }

        Command::Convert {
            lead,
            name,
            stage,
            amount,
            account,
        } => {
            let mut session = leads::session(client)?;
            session.refresh().await?;
            let record = session
                .view()
                .record(&lead)
                .cloned()
                .ok_or_else(|| CliError::Usage(format!("No lead {}", lead)))?;

            let mut draft = crm::opportunity_draft_for(&record)?;
            if let Some(name) = name {
                draft.insert("name", name);
            }
            if let Some(stage) = stage {
                draft.insert(crm::opportunities::STAGE_FIELD, stage);
            }
            if let Some(amount) = amount {
                draft.insert("amount", amount);
            }
            if let Some(account) = account {
                draft.insert("accountName", account);
            }
            let created = crm::convert_lead(session.store(), &record, &draft).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_ref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_arguments() {
        let cli = Cli::try_parse_from([
            "crmgrid", "--url", "http://crm.local", "list", "leads", "--sort", "score", "--desc",
            "--hide", "email", "--hide", "source", "-p", "2",
        ])
        .unwrap();
        assert_eq!(cli.url, "http://crm.local");
        let Command::List {
            table,
            sort,
            desc,
            page,
            hidden,
            ..
        } = cli.command
        else {
            panic!("expected list");
        };
        assert_eq!(table, Table::Leads);
        assert_eq!(sort.as_deref(), Some("score"));
        assert!(desc);
        assert_eq!(page, 2);
        assert_eq!(hidden, vec!["email", "source"]);
    }

    #[test]
    fn test_desc_requires_sort() {
        assert!(Cli::try_parse_from(["crmgrid", "list", "leads", "--desc"]).is_err());
    }

    #[test]
    fn test_record_ids_parse_as_numbers_or_text() {
        let cli = Cli::try_parse_from(["crmgrid", "delete", "opportunities", "7", "--derived"])
            .unwrap();
        let Command::Delete { table, id, derived } = cli.command else {
            panic!("expected delete");
        };
        assert_eq!(table, Table::Opportunities);
        assert_eq!(id, RecordId::Number(7));
        assert!(derived);
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("score=80").unwrap(), ("score", "80"));
        assert_eq!(parse_assignment("note=a=b").unwrap(), ("note", "a=b"));
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("score").is_err());
    }
}
