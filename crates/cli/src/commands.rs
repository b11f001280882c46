//! CLI commands

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use stockroom_http::{Resource, StockroomClient, StockroomClientBuilder};
use tracing::info;

use crate::config;

/// Global options shared by every command
pub struct Settings {
    pub data_dir: PathBuf,
    /// Whether `--data-dir` was passed explicitly
    pub data_dir_overridden: bool,
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password
        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// List a collection
    List {
        resource: Resource,

        /// Query parameter as KEY=VALUE (repeatable)
        #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Show one item
    Get { resource: Resource, id: String },

    /// Create an item from a JSON document
    Create {
        resource: Resource,

        /// JSON body
        #[arg(long)]
        data: String,
    },

    /// Replace an item with a JSON document
    Update {
        resource: Resource,
        id: String,

        /// JSON body
        #[arg(long)]
        data: String,
    },

    /// Delete an item
    Delete { resource: Resource, id: String },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Generate a default configuration file
    Init {
        /// Output file path (defaults to DATA_DIR/config.toml)
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    pub async fn execute(self, settings: &Settings) -> Result<()> {
        let client = || build_client(settings);

        match self {
            Self::Config { command } => return command.execute(settings),
            Self::Login { email, password } => {
                let user = client()?.login(email, password).await?;
                println!("Signed in as {} <{}> ({})", user.user_name, user.email, user.role);
            }
            Self::Logout => {
                client()?.logout().await?;
                println!("Signed out");
            }
            Self::Whoami => match client()?.current_user().await? {
                Some(user) => print_json(&serde_json::to_value(user)?)?,
                None => println!("Not signed in"),
            },
            Self::List { resource, query } => {
                let query: Vec<(&str, &str)> = query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                let items: Value = client()?.list(resource, &query).await?;
                print_json(&items)?;
            }
            Self::Get { resource, id } => {
                let item: Value = client()?.get(resource, &id).await?;
                print_json(&item)?;
            }
            Self::Create { resource, data } => {
                let body = parse_body(&data)?;
                let item: Value = client()?.create(resource, &body).await?;
                print_json(&item)?;
            }
            Self::Update { resource, id, data } => {
                let body = parse_body(&data)?;
                let item: Value = client()?.update(resource, &id, &body).await?;
                print_json(&item)?;
            }
            Self::Delete { resource, id } => {
                client()?.delete(resource, &id).await?;
                println!("Deleted {resource}/{id}");
            }
        }

        Ok(())
    }
}

impl ConfigCommands {
    pub fn execute(self, settings: &Settings) -> Result<()> {
        match self {
            Self::Init { output, force } => {
                let config_path =
                    output.unwrap_or_else(|| settings.data_dir.join(config::CONFIG_FILE_NAME));

                if config_path.exists() && !force {
                    bail!(
                        "{} already exists, pass --force to overwrite",
                        config_path.display()
                    );
                }

                let path = config::generate_default_config(&config_path, &settings.data_dir)?;
                println!("Generated client configuration at: {}", path.display());
                Ok(())
            }
        }
    }
}

fn build_client(settings: &Settings) -> Result<StockroomClient> {
    let mut client_config = config::load_client_config(settings.config.as_deref(), &settings.data_dir)?;

    if settings.data_dir_overridden {
        client_config.credentials_path = settings.data_dir.join("credentials.json");
    }

    info!(base_url = %client_config.base_url, "Connecting to inventory API");

    let client = StockroomClientBuilder::from_config(&client_config)
        .navigator(Arc::new(|_route: &str| {
            eprintln!("Session expired. Run `stockroom login` to sign in again.");
        }))
        .build()?;

    Ok(client)
}

fn parse_body(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("--data must be a JSON document")
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("status=open"),
            Ok(("status".to_string(), "open".to_string()))
        );
        assert_eq!(
            parse_key_value("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("status").is_err());
    }

    #[test]
    fn test_parse_body_rejects_invalid_json() {
        assert!(parse_body("{\"name\": \"North\"}").is_ok());
        assert!(parse_body("name=North").is_err());
    }

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().to_path_buf(),
            data_dir_overridden: true,
            config: None,
        };

        ConfigCommands::Init {
            output: None,
            force: false,
        }
        .execute(&settings)
        .unwrap();
        assert!(dir.path().join(config::CONFIG_FILE_NAME).exists());

        let again = ConfigCommands::Init {
            output: None,
            force: false,
        }
        .execute(&settings);
        assert!(again.is_err());

        ConfigCommands::Init {
            output: None,
            force: true,
        }
        .execute(&settings)
        .unwrap();
    }
}
