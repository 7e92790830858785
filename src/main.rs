use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use booth::api::{ApiError, AvatarUploader, ImgBbUploader, Language};
use booth::config::Config;
use booth::env_vars;
use booth::logging;
use booth::steps::{
    AttendeeInput, Step, StepInput, StepManager, Submission, TicketSelectionInput,
};
use booth::store::JsonFileStore;

#[derive(Parser)]
#[command(name = "booth")]
#[command(about = "Three-step ticket booking wizard")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current step and entered details
    Status,

    /// Step 1: choose a ticket type and quantity
    Select {
        /// Ticket type index (see `booth catalog`)
        #[arg(short = 't', long = "type")]
        type_index: Option<usize>,

        /// Number of tickets
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Save as a draft without validating or advancing
        #[arg(long)]
        draft: bool,
    },

    /// Step 2: enter attendee details
    Attendee {
        /// Full name (first and last)
        #[arg(short, long, default_value = "")]
        name: String,

        /// Email address
        #[arg(short, long, default_value = "")]
        email: String,

        /// Avatar URL (keeps the current avatar when omitted)
        #[arg(short, long)]
        avatar: Option<String>,

        /// Special request
        #[arg(short, long)]
        request: Option<String>,

        /// Save as a draft without validating or advancing
        #[arg(long)]
        draft: bool,
    },

    /// Set the avatar from an image file (uploaded) or an http(s) URL
    Avatar {
        /// Image file path or URL
        source: String,
    },

    /// Go back one step
    Back,

    /// Go to a step by number (1-3)
    Goto { step: u8 },

    /// Show the issued ticket
    Ticket,

    /// Export the issued ticket as JSON
    Export {
        /// Output file (default: <ticket code>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List every ticket booked in this profile
    Tickets,

    /// Discard the current booking and start over
    Reset,

    /// Start a new booking after a ticket was issued
    BookAnother,

    /// List the ticket types on offer
    Catalog,

    /// List languages supported for translation
    Languages,

    /// List environment variables read by booth
    Env,

    /// Print the effective configuration as TOML
    Config {
        /// Also write it to .booth/config.toml
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let logging_handle = logging::init_logging(&config, cli.debug)?;

    let result = run(&config, cli.command.unwrap_or(Commands::Status)).await;

    if let Some(log_path) = logging_handle.log_file_path {
        if log_path.metadata().map(|m| m.len() > 0).unwrap_or(false) {
            eprintln!("Session log: {}", log_path.display());
        }
    }

    result
}

async fn run(config: &Config, command: Commands) -> Result<()> {
    match command {
        Commands::Status => cmd_status(config),
        Commands::Select {
            type_index,
            quantity,
            draft,
        } => cmd_select(config, type_index, quantity, draft),
        Commands::Attendee {
            name,
            email,
            avatar,
            request,
            draft,
        } => cmd_attendee(config, name, email, avatar, request, draft),
        Commands::Avatar { source } => cmd_avatar(config, &source).await,
        Commands::Back => cmd_back(config),
        Commands::Goto { step } => cmd_goto(config, step),
        Commands::Ticket => cmd_ticket(config),
        Commands::Export { output } => cmd_export(config, output),
        Commands::Tickets => cmd_tickets(config),
        Commands::Reset => cmd_reset(config),
        Commands::BookAnother => cmd_book_another(config),
        Commands::Catalog => cmd_catalog(config),
        Commands::Languages => cmd_languages(),
        Commands::Env => cmd_env(),
        Commands::Config { save } => cmd_config(config, save),
    }
}

fn open_manager(config: &Config) -> StepManager<JsonFileStore> {
    let store = JsonFileStore::new(config.state_path());
    StepManager::from_config(config, store)
}

fn print_submission(manager: &StepManager<JsonFileStore>, submission: Submission) -> Result<()> {
    match submission {
        Submission::Advanced(step) => {
            println!("Now on step {}: {}", step, step.title());
            println!("{}", manager.format_progress());
            Ok(())
        }
        Submission::Rejected(errors) => {
            println!("Please fix the following:");
            for error in &errors {
                println!("  ✗ {}", error);
            }
            bail!("step {} was not submitted", manager.current_step())
        }
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    let manager = open_manager(config);
    let session = manager.session();

    println!("{}", config.booking.event_name);
    println!("{}", manager.format_progress());
    println!("{}", "─".repeat(60));

    let selection = &session.ticket_selection;
    if selection.type_index.is_some() {
        println!(
            "Ticket:   {} ({}) x{}",
            selection.type_label, selection.price, selection.quantity
        );
    } else {
        println!("Ticket:   not selected");
    }

    let attendee = &session.attendee;
    if !attendee.name.is_empty() {
        println!("Name:     {}", attendee.name);
    }
    if !attendee.email.is_empty() {
        println!("Email:    {}", attendee.email);
    }
    if let Some(ref avatar) = attendee.avatar_ref {
        println!("Avatar:   {}", avatar);
    }
    if let Some(ref note) = attendee.note {
        println!("Request:  {}", note);
    }
    if let Some(ref code) = session.generated_ticket_code {
        println!("Code:     {}", code);
    }

    println!();
    match manager.current_step() {
        Step::One => println!("Next: booth select --type <n> --quantity <n>"),
        Step::Two => println!("Next: booth attendee --name <name> --email <email>"),
        Step::Three => println!("Next: booth ticket, or booth book-another"),
    }

    Ok(())
}

fn cmd_select(config: &Config, type_index: Option<usize>, quantity: u32, draft: bool) -> Result<()> {
    let mut manager = open_manager(config);
    let input = StepInput::TicketSelection(TicketSelectionInput {
        type_index,
        quantity,
    });

    if draft {
        manager.update_draft(input)?;
        println!("Ticket selection saved as draft");
        return Ok(());
    }

    let submission = manager.submit_step(input)?;
    print_submission(&manager, submission)
}

fn cmd_attendee(
    config: &Config,
    name: String,
    email: String,
    avatar: Option<String>,
    request: Option<String>,
    draft: bool,
) -> Result<()> {
    let mut manager = open_manager(config);
    let avatar_ref = avatar.or_else(|| manager.session().attendee.avatar_ref.clone());
    let input = StepInput::Attendee(AttendeeInput {
        name,
        email,
        avatar_ref,
        note: request,
    });

    if draft {
        manager.update_draft(input)?;
        println!("Attendee details saved as draft");
        return Ok(());
    }

    let submission = manager.submit_step(input)?;
    print_submission(&manager, submission)
}

async fn cmd_avatar(config: &Config, source: &str) -> Result<()> {
    let mut manager = open_manager(config);
    if manager.current_step() == Step::Three {
        bail!("ticket already issued; book another ticket to change the avatar");
    }

    let url = if source.starts_with("http://") || source.starts_with("https://") {
        source.to_string()
    } else {
        let uploader = ImgBbUploader::from_config(&config.upload).map_err(|err| match err {
            ApiError::NotConfigured { .. } => {
                anyhow::Error::new(err).context("set BOOTH_UPLOAD__API_KEY to upload image files")
            }
            other => other.into(),
        })?;
        upload_file(&uploader, Path::new(source)).await?
    };

    manager.apply_avatar(&url)?;
    println!("Avatar set: {}", url);
    Ok(())
}

async fn upload_file(uploader: &dyn AvatarUploader, path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("avatar");

    println!("Uploading {} ({} bytes)...", file_name, bytes.len());
    match uploader.upload(file_name, bytes).await {
        Ok(url) => Ok(url),
        Err(err) if err.is_retryable() => {
            Err(anyhow::Error::new(err).context("upload failed; try again later"))
        }
        Err(err) => Err(err.into()),
    }
}

fn cmd_back(config: &Config) -> Result<()> {
    let mut manager = open_manager(config);
    let step = manager.back()?;
    println!("Now on step {}: {}", step, step.title());
    Ok(())
}

fn cmd_goto(config: &Config, step: u8) -> Result<()> {
    let mut manager = open_manager(config);
    let step = manager.go_to_step(step)?;
    println!("Now on step {}: {}", step, step.title());
    println!("{}", manager.format_progress());
    Ok(())
}

fn cmd_ticket(config: &Config) -> Result<()> {
    let manager = open_manager(config);
    let Some(ticket) = manager.issued_ticket() else {
        println!("No ticket issued yet ({})", manager.format_progress());
        return Ok(());
    };

    println!("Your ticket is booked!");
    println!("{}", ticket.render_card(&config.booking));
    Ok(())
}

fn cmd_export(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let manager = open_manager(config);
    let Some(ticket) = manager.issued_ticket() else {
        bail!("no ticket has been issued yet");
    };

    let path = output.unwrap_or_else(|| PathBuf::from(format!("{}.json", ticket.ticket_code)));
    ticket.export_json(&path)?;
    println!("Ticket {} exported to {}", ticket.ticket_code, path.display());
    Ok(())
}

fn cmd_tickets(config: &Config) -> Result<()> {
    let manager = open_manager(config);
    let tickets = manager.booked_tickets();

    if tickets.is_empty() {
        println!("No tickets booked yet");
        return Ok(());
    }

    println!("My Tickets ({})", tickets.len());
    println!("{}", "─".repeat(60));

    for ticket in &tickets {
        println!(
            "{}  {} x{}  {}  {}",
            ticket.ticket_code,
            ticket.selection.ticket_type_text,
            ticket.selection.number_of_tickets,
            ticket.attendee.name,
            ticket.issued_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

fn cmd_reset(config: &Config) -> Result<()> {
    let mut manager = open_manager(config);
    manager.reset()?;
    println!("Booking discarded");
    Ok(())
}

fn cmd_book_another(config: &Config) -> Result<()> {
    let mut manager = open_manager(config);
    manager.book_another()?;
    println!("Ready for a new booking");
    println!("{}", manager.format_progress());
    Ok(())
}

fn cmd_catalog(config: &Config) -> Result<()> {
    let catalog = config.catalog();

    println!("{}", config.booking.event_name);
    println!("{}", config.booking.event_details);
    println!("{}", "─".repeat(60));

    for (index, ticket_type) in catalog.iter() {
        println!(
            "{}  {:<14} {:>6}  {} left",
            index, ticket_type.label, ticket_type.price, ticket_type.availability
        );
    }

    println!();
    println!("Up to {} tickets per booking", config.booking.max_quantity);
    println!(
        "Avatar: {}",
        config.validation.avatar_policy.display_name()
    );
    Ok(())
}

fn cmd_languages() -> Result<()> {
    println!("Supported Languages");
    println!("{}", "─".repeat(60));
    for language in Language::all() {
        println!("{:<4} {}", language.code(), language.name());
    }
    Ok(())
}

fn cmd_env() -> Result<()> {
    for (category, vars) in env_vars::env_vars_by_category() {
        println!("{}", category.display_name());
        println!("{}", "─".repeat(60));
        for var in vars {
            println!("  {}", var.name);
            println!("      {}", var.description);
            if let Some(default) = var.default {
                println!("      default: {}", default);
            }
            if let Some(example) = var.example {
                println!("      example: {}", example);
            }
        }
        println!();
    }
    Ok(())
}

fn cmd_config(config: &Config, save: bool) -> Result<()> {
    print!("{}", config.to_toml()?);
    if save {
        let path = Config::local_config_path();
        config.save_to(&path)?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}
