//! Command-line interface for Foodgram.
//!
//! Without a subcommand the binary starts the HTTP server. Other subcommands
//! work directly against the configured database:
//! - `migrate` - Create or upgrade the schema and exit
//! - `config check` - Validate the configuration file
//! - `tags list|add` - Inspect or extend the tag catalog
//! - `ingredients list|add` - Inspect or extend the ingredient catalog

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::api::error::ApiError;
use crate::api::validation::{validate_ingredient, validate_tag};
use crate::config::Config;
use crate::db::{self, filters::IngredientFilter, CreateIngredientRequest, CreateTagRequest, Ingredient, Tag};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "foodgram")]
#[command(author, version, about = "Recipe sharing service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "FOODGRAM_CONFIG", default_value = "foodgram.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Create or upgrade the database schema, then exit
    Migrate,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Tag catalog commands
    #[command(subcommand)]
    Tags(TagCommands),

    /// Ingredient catalog commands
    #[command(subcommand)]
    Ingredients(IngredientCommands),
}

/// Config subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Tag subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum TagCommands {
    /// List all tags
    List,
    /// Add a tag
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// URL-safe identifier used by the recipe filter
        #[arg(long)]
        slug: String,
        /// Hex color, e.g. #49B64E
        #[arg(long)]
        color: String,
    },
}

/// Ingredient subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum IngredientCommands {
    /// List ingredients, optionally by name prefix
    List {
        #[arg(long)]
        name: Option<String>,
    },
    /// Add an ingredient
    Add {
        #[arg(long)]
        name: String,
        /// Measurement unit, e.g. g or pcs
        #[arg(long)]
        unit: String,
    },
}

impl Cli {
    /// Whether this invocation should start the server
    pub fn is_serve(&self) -> bool {
        matches!(self.command, None | Some(Commands::Serve))
    }
}

/// Run a non-server CLI command
pub async fn run_command(command: &Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Serve => Ok(()),
        Commands::Migrate => cmd_migrate(config).await,
        Commands::Config(ConfigCommands::Check) => {
            anyhow::bail!("`config check` must run before the configuration is loaded")
        }
        Commands::Tags(TagCommands::List) => cmd_tags_list(config).await,
        Commands::Tags(TagCommands::Add { name, slug, color }) => {
            let req = CreateTagRequest {
                name: name.clone(),
                slug: slug.clone(),
                color: color.clone(),
            };
            cmd_tags_add(config, &req).await.map(|_| ())
        }
        Commands::Ingredients(IngredientCommands::List { name }) => {
            cmd_ingredients_list(config, name.clone()).await
        }
        Commands::Ingredients(IngredientCommands::Add { name, unit }) => {
            let req = CreateIngredientRequest {
                name: name.clone(),
                measurement_unit: unit.clone(),
            };
            cmd_ingredients_add(config, &req).await.map(|_| ())
        }
    }
}

/// Turn a validation failure into a CLI error listing every field
fn describe(err: ApiError) -> anyhow::Error {
    let mut message = err.to_string();
    if let Some(details) = err.details() {
        let mut fields: Vec<_> = details.iter().collect();
        fields.sort();
        for (field, errors) in fields {
            message.push_str(&format!("\n  {}: {}", field, errors.join("; ")));
        }
    }
    anyhow::anyhow!(message)
}

async fn cmd_migrate(config: &Config) -> Result<()> {
    let pool = db::init(config).await?;
    pool.close().await;
    println!("[OK] Database schema is up to date");
    Ok(())
}

async fn cmd_tags_list(config: &Config) -> Result<()> {
    let pool = db::init(config).await?;
    let tags = Tag::list(&pool).await.context("Failed to list tags")?;

    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }

    println!();
    println!("{:<6}  {:<30}  {:<30}  {:<8}", "ID", "NAME", "SLUG", "COLOR");
    println!("{}", "-".repeat(80));
    for tag in tags {
        println!(
            "{:<6}  {:<30}  {:<30}  {:<8}",
            tag.id,
            truncate(&tag.name, 30),
            truncate(&tag.slug, 30),
            tag.color
        );
    }
    println!();
    Ok(())
}

async fn cmd_tags_add(config: &Config, req: &CreateTagRequest) -> Result<Tag> {
    validate_tag(req, &config.limits).map_err(describe)?;

    let pool = db::init(config).await?;
    let tag = Tag::create(&pool, req).await.map_err(|e| {
        describe(ApiError::from(e)).context(format!("Failed to add tag '{}'", req.slug))
    })?;

    tracing::info!(tag_id = tag.id, slug = %tag.slug, "Tag added");
    println!("[OK] Added tag {} ({})", tag.name, tag.id);
    Ok(tag)
}

async fn cmd_ingredients_list(config: &Config, name: Option<String>) -> Result<()> {
    let pool = db::init(config).await?;
    let ingredients = Ingredient::list(&pool, &IngredientFilter { name })
        .await
        .context("Failed to list ingredients")?;

    if ingredients.is_empty() {
        println!("No ingredients found.");
        return Ok(());
    }

    println!();
    println!("{:<6}  {:<40}  {:<20}", "ID", "NAME", "UNIT");
    println!("{}", "-".repeat(70));
    for ingredient in ingredients {
        println!(
            "{:<6}  {:<40}  {:<20}",
            ingredient.id,
            truncate(&ingredient.name, 40),
            truncate(&ingredient.measurement_unit, 20)
        );
    }
    println!();
    Ok(())
}

async fn cmd_ingredients_add(config: &Config, req: &CreateIngredientRequest) -> Result<Ingredient> {
    validate_ingredient(req, &config.limits).map_err(describe)?;

    let pool = db::init(config).await?;
    let ingredient = Ingredient::create(&pool, req).await.map_err(|e| {
        describe(ApiError::from(e)).context(format!(
            "Failed to add ingredient '{}' ({})",
            req.name, req.measurement_unit
        ))
    })?;

    tracing::info!(ingredient_id = ingredient.id, "Ingredient added");
    println!(
        "[OK] Added ingredient {} ({}) as {}",
        ingredient.name, ingredient.measurement_unit, ingredient.id
    );
    Ok(ingredient)
}

/// Validate the configuration file and print a summary
pub fn cmd_config_check(config_path: &Path) -> Result<()> {
    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("A default configuration will be used when starting the server.");
        println!("To create a custom configuration, copy foodgram.example.toml to foodgram.toml");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("Server:");
            println!("  Host:         {}", config.server.host);
            println!("  Port:         {}", config.server.port);
            println!("  Data Dir:     {}", config.server.data_dir.display());
            println!("  Database:     {}", config.database_url());
            println!();
            println!("Pagination:");
            println!("  Page Size:    {}", config.pagination.page_size);
            println!("  Max Size:     {}", config.pagination.max_page_size);
            println!();
            println!("Limits:");
            println!("  Names:        {}", config.limits.name_max_length);
            println!("  Slugs:        {}", config.limits.slug_max_length);
            println!("  User Names:   {}", config.limits.user_name_max_length);
            println!("  Email:        {}", config.limits.email_max_length);
            println!();

            let mut warnings = Vec::new();
            if config.pagination.page_size > config.pagination.max_page_size {
                warnings.push("page_size is larger than max_page_size; requests will be clamped");
            }
            if config.pagination.page_size < 1 {
                warnings.push("page_size must be at least 1");
            }

            if !warnings.is_empty() {
                println!("Warnings:");
                for warning in warnings {
                    println!("  [!] {}", warning);
                }
                println!();
            }

            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            println!();
            println!("Please check the configuration file syntax and try again.");
            anyhow::bail!("Invalid configuration file");
        }
    }
}

/// Truncate a string to max length with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.server.data_dir = dir.path().to_path_buf();
        config
    }

    #[test]
    fn test_parse_defaults_to_serve() {
        let cli = Cli::try_parse_from(["foodgram"]).unwrap();
        assert!(cli.is_serve());
        assert_eq!(cli.log_level, None);

        let cli = Cli::try_parse_from(["foodgram", "serve"]).unwrap();
        assert!(cli.is_serve());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from([
            "foodgram", "--config", "other.toml", "tags", "add", "--name", "Lunch", "--slug",
            "lunch", "--color", "#49B64E",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(!cli.is_serve());
        assert_eq!(
            cli.command,
            Some(Commands::Tags(TagCommands::Add {
                name: "Lunch".to_string(),
                slug: "lunch".to_string(),
                color: "#49B64E".to_string(),
            }))
        );

        let cli = Cli::try_parse_from(["foodgram", "config", "check"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Config(ConfigCommands::Check)));

        assert!(Cli::try_parse_from(["foodgram", "ingredients", "add", "--name", "salt"]).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("sugar", 10), "sugar");
        assert_eq!(truncate("brown sugar syrup", 10), "brown s...");
        assert_eq!(truncate("сахарный песок", 8), "сахар...");
    }

    #[tokio::test]
    async fn test_catalog_commands() {
        if std::env::var(crate::config::DATABASE_URL_ENV).is_ok() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let config = temp_config(&dir);

        let tag = cmd_tags_add(
            &config,
            &CreateTagRequest {
                name: "Lunch".to_string(),
                slug: "lunch".to_string(),
                color: "#49B64E".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(tag.slug, "lunch");

        let duplicate = cmd_tags_add(
            &config,
            &CreateTagRequest {
                name: "Lunch again".to_string(),
                slug: "lunch".to_string(),
                color: "#000000".to_string(),
            },
        )
        .await;
        assert!(duplicate.is_err());

        let invalid = cmd_tags_add(
            &config,
            &CreateTagRequest {
                name: "Dinner".to_string(),
                slug: "dinner".to_string(),
                color: "purple".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(invalid.to_string().contains("color"));

        let sugar = cmd_ingredients_add(
            &config,
            &CreateIngredientRequest {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(sugar.measurement_unit, "g");

        run_command(&Commands::Migrate, &config).await.unwrap();
        run_command(&Commands::Tags(TagCommands::List), &config).await.unwrap();
        run_command(
            &Commands::Ingredients(IngredientCommands::List { name: Some("su".to_string()) }),
            &config,
        )
        .await
        .unwrap();
    }

    #[test]
    fn test_config_check() {
        let dir = tempfile::tempdir().unwrap();

        assert!(cmd_config_check(&dir.path().join("missing.toml")).is_ok());

        let valid = dir.path().join("valid.toml");
        std::fs::write(&valid, "[pagination]\npage_size = 10\n").unwrap();
        assert!(cmd_config_check(&valid).is_ok());

        let invalid = dir.path().join("invalid.toml");
        std::fs::write(&invalid, "[server\nport = 1").unwrap();
        assert!(cmd_config_check(&invalid).is_err());
    }
}
