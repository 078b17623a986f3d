use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use mpds_client::{Config, DataType};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "mpds", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data type of API requests: peer_reviewed, machine_learning, ab_initio or all
    #[arg(long, global = true)]
    dtype: Option<DataType>,

    /// Pause between page requests, seconds
    #[arg(long, global = true)]
    chillout: Option<f64>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Show the API project metadata
    ///
    /// Prints the metadata record describing the MPDS API: its name,
    /// version, base URL and documentation generator. With --js the
    /// record is rendered as the `define(...)` module consumed by the
    /// documentation viewer; with --check it is audited for empty fields,
    /// malformed versions and timestamps. Given a FILE, the record is
    /// read from that `api_project.js` (or bare JSON) instead of the
    /// built-in one.
    Project {
        /// An api_project.js file to read instead of the built-in record
        file: Option<PathBuf>,
        /// Render as a JavaScript define() module
        #[arg(long, conflicts_with = "check")]
        js: bool,
        /// Audit the record and report findings
        #[arg(long)]
        check: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Count the hits of a search
    Count {
        /// Search as a JSON object, e.g. '{"elements": "Cu-Zn"}'
        search: String,
        /// Restrict to these phase ids
        #[arg(long, value_delimiter = ',')]
        phases: Vec<u64>,
    },
    /// Download the entries of a search
    ///
    /// Without --field the raw JSON entries are printed. Each --field
    /// takes KIND:EXPR where KIND is S, P or C and EXPR a dotted path
    /// such as sample.measurement[0].property.scalar, or =VALUE for a
    /// constant. Rows are printed as JSON, or as CSV when --columns is
    /// given.
    Fetch {
        /// Search as a JSON object
        search: String,
        /// Restrict to these phase ids
        #[arg(long, value_delimiter = ',')]
        phases: Vec<u64>,
        /// Column selection, KIND:EXPR (repeatable)
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
        /// Use the standard seven columns for every entry kind
        #[arg(long, conflicts_with = "fields")]
        default_fields: bool,
        /// Column names for CSV output
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Validate a saved API response against a JSON schema
    Validate {
        /// JSON schema file
        schema: PathBuf,
        /// Saved API response
        response: PathBuf,
    },
    /// List binary systems forming no compounds
    Nonformers,
    /// Extract the liquidus lines of a binary system
    Liquidus {
        /// First chemical element
        a: String,
        /// Second chemical element
        b: String,
    },
    /// Thermal expansion of oxides melting above 1800 C
    ///
    /// Uses machine-learning data unless --dtype is given.
    Melting,
    /// Cluster binary band gaps and export a 3D plot
    Clusters {
        /// Seed for the initial centroids
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Compare ab initio and peer-reviewed property values
    Compare {
        /// Harvest again even if a cached run exists
        #[arg(long)]
        refresh: bool,
    },
    /// Analyse electronic transport data
    Transport {
        /// SIGMA.DAT file from a raw data archive
        #[arg(required_unless_present = "list")]
        sigma: Option<PathBuf>,
        /// Temperature, K
        #[arg(long, default_value_t = mpds_core::transport::REFERENCE_TEMPERATURE)]
        temperature: f64,
        /// Chemical potential, eV
        #[arg(long, default_value_t = mpds_core::transport::REFERENCE_MU)]
        mu: f64,
        /// List the raw data archives of conductivity calculations instead
        #[arg(long, conflicts_with = "sigma")]
        list: bool,
    },
    /// Show the periodic table group of a chemical element
    Group {
        /// Element symbol or atomic number
        element: String,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get {
        key: Option<String>,
    },
    /// Set a value in the config file
    Set {
        key: String,
        value: String,
    },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file if missing
    Init,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(dtype) = cli.dtype {
        config.dtype = dtype;
    }
    if let Some(chillout) = cli.chillout {
        config.chillout_secs = chillout;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Project { file, js, check } => {
            commands::show_project(file.as_deref(), *js, *check)?;
        }
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config::show_config()?,
            ConfigCommand::Get { key } => commands::config::get_config(key.as_deref())?,
            ConfigCommand::Set { key, value } => commands::config::set_config(key, value)?,
            ConfigCommand::Path => commands::config::show_path(),
            ConfigCommand::Example => commands::config::show_example(),
            ConfigCommand::Init => commands::config::init_config()?,
        },
        Commands::Count { search, phases } => {
            commands::run_count(&load_config(&cli)?, search, phases).await?;
        }
        Commands::Fetch {
            search,
            phases,
            fields,
            default_fields,
            columns,
        } => {
            let request = commands::fetch::FetchRequest {
                search,
                phases,
                fields,
                default_fields: *default_fields,
                columns,
            };
            commands::run_fetch(&load_config(&cli)?, &request).await?;
        }
        Commands::Validate { schema, response } => commands::run_validate(schema, response)?,
        Commands::Nonformers => commands::run_nonformers(&load_config(&cli)?).await?,
        Commands::Liquidus { a, b } => commands::run_liquidus(&load_config(&cli)?, a, b).await?,
        Commands::Melting => {
            let mut config = load_config(&cli)?;
            if cli.dtype.is_none() {
                config.dtype = DataType::MachineLearning;
            }
            commands::run_melting(&config).await?;
        }
        Commands::Clusters { seed } => commands::run_clusters(&load_config(&cli)?, *seed).await?,
        Commands::Compare { refresh } => commands::run_compare(&load_config(&cli)?, *refresh).await?,
        Commands::Transport {
            sigma,
            temperature,
            mu,
            list,
        } => {
            if *list {
                commands::transport::list_archives(&load_config(&cli)?).await?;
            } else if let Some(sigma) = sigma {
                commands::transport::analyze_file(sigma, *temperature, *mu)?;
            }
        }
        Commands::Group { element } => commands::show_group(element)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_dtype() {
        let cli = Cli::try_parse_from(["mpds", "count", r#"{"elements":"Cu"}"#, "--dtype", "ab_initio"]).unwrap();
        assert_eq!(cli.dtype, Some(DataType::AbInitio));
        assert!(matches!(cli.command, Commands::Count { .. }));
    }

    #[test]
    fn test_fetch_phases_and_fields() {
        let cli = Cli::try_parse_from([
            "mpds",
            "fetch",
            r#"{"props":"band gap"}"#,
            "--phases",
            "1,2,3",
            "-f",
            "P:sample.material.phase_id",
            "-f",
            "P:=eV",
        ])
        .unwrap();
        let Commands::Fetch { phases, fields, .. } = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(phases, vec![1, 2, 3]);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_transport_requires_file_or_list() {
        assert!(Cli::try_parse_from(["mpds", "transport"]).is_err());
        assert!(Cli::try_parse_from(["mpds", "transport", "--list"]).is_ok());
        assert!(Cli::try_parse_from(["mpds", "transport", "SIGMA.DAT"]).is_ok());
    }

    #[test]
    fn test_project_flags_conflict() {
        assert!(Cli::try_parse_from(["mpds", "project", "--js", "--check"]).is_err());
    }

    #[test]
    fn test_project_file_argument() {
        let cli = Cli::try_parse_from(["mpds", "project", "--check", "api_project.js"]).unwrap();
        match cli.command {
            Commands::Project { file, check, .. } => {
                assert_eq!(file, Some(PathBuf::from("api_project.js")));
                assert!(check);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
