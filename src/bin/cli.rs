use anyhow::Context;
use clap::{Parser, Subcommand};
use resume_matcher::{
    config::Settings,
    db, load_model,
    repositories::user_repository::SqliteUserRepository,
    services::{
        user_service::{CreateUserRequest, UserService},
        HubClient, MatchModel, PublishService, TrainingParams, TrainingService,
    },
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "resume-matcher-cli")]
#[command(about = "Manage resume matcher users and models", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Fine-tuning and publishing
    Model {
        #[command(subcommand)]
        command: ModelCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// List all users
    List {
        /// Maximum number of users to display
        #[arg(short, long, default_value_t = 100)]
        limit: i64,

        /// Offset for pagination
        #[arg(short = 'o', long, default_value_t = 0)]
        offset: i64,
    },

    /// Delete a user
    Delete {
        /// Email address of the user to delete
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Fine-tune on a labelled CSV (resume_text, job_desc, label)
    Train {
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, default_value_t = 2)]
        epochs: usize,

        #[arg(long, default_value_t = 16)]
        batch_size: usize,
    },

    /// Upload the saved model to the Hugging Face Hub
    Push,
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn prompt_new_password() -> anyhow::Result<String> {
    let password = get_password("Password")?;
    let confirm = get_password("Confirm password")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }
    Ok(password)
}

async fn open_model(settings: &Settings) -> anyhow::Result<Arc<MatchModel>> {
    let settings = settings.clone();
    let model = tokio::task::spawn_blocking(move || load_model(&settings))
        .await?
        .context("Failed to load sentence encoder")?;
    Ok(model)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::User { command } => run_user_command(&settings, command).await,
        Commands::Model { command } => run_model_command(&settings, command).await,
    }
}

async fn run_user_command(settings: &Settings, command: UserCommands) -> anyhow::Result<()> {
    let pool = db::create_pool(&settings.database_url)
        .await
        .with_context(|| format!("Failed to open {}", settings.database_url))?;
    db::run_migrations(&pool).await?;

    let user_repository = Arc::new(SqliteUserRepository::new(pool));
    let user_service = UserService::new(user_repository);

    match command {
        UserCommands::Create { email, password } => {
            let password = match password {
                Some(pw) => pw,
                None => prompt_new_password()?,
            };

            let user = user_service
                .create_user(CreateUserRequest { email, password })
                .await
                .context("Failed to create user")?;

            println!("✅ User created successfully!");
            println!("  ID: {}", user.id);
            println!("  Email: {}", user.email);
        }

        UserCommands::List { limit, offset } => {
            let users = user_service
                .list_users(Some(limit), Some(offset))
                .await
                .context("Failed to list users")?;

            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<5} {:<40} {:<20}", "ID", "Email", "Created");
                println!("{}", "-".repeat(65));
                for user in users {
                    println!(
                        "{:<5} {:<40} {:<20}",
                        user.id,
                        user.email,
                        user.created_at.as_deref().unwrap_or("N/A")
                    );
                }
            }
        }

        UserCommands::Delete { email } => {
            let user = user_service
                .find_user_by_email(&email)
                .await
                .context("Failed to find user")?
                .with_context(|| format!("User '{}' not found", email))?;

            user_service
                .delete_user(user.id)
                .await
                .context("Failed to delete user")?;
            println!("✅ User '{}' deleted successfully!", email);
        }
    }

    Ok(())
}

async fn run_model_command(settings: &Settings, command: ModelCommands) -> anyhow::Result<()> {
    let model = open_model(settings).await?;

    match command {
        ModelCommands::Train {
            csv,
            epochs,
            batch_size,
        } => {
            let bytes = tokio::fs::read(&csv)
                .await
                .with_context(|| format!("Failed to read {}", csv.display()))?;

            let params = TrainingParams {
                epochs,
                batch_size,
                ..TrainingParams::default()
            };
            let service = TrainingService::new(model, settings.model_dir.clone(), params);
            let report = service.train_csv(&bytes).await?;

            println!("✅ Model fine-tuned and saved.");
            println!("  Examples: {}", report.examples);
            println!("  Steps: {}", report.steps);
            println!(
                "  Loss: {:.4} -> {:.4}",
                report.initial_loss, report.final_loss
            );
            println!("  Saved to: {}", settings.model_dir.display());
        }

        ModelCommands::Push => {
            let service = PublishService::new(
                model,
                HubClient::new(&settings.hf_endpoint),
                settings.hf_model_name.clone(),
                settings.hf_token.clone(),
            );
            let url = service.push().await?;
            println!("✅ Model pushed to Hugging Face: {}", url);
        }
    }

    Ok(())
}
