use clap::{Parser, Subcommand};
use taskboard::{commands, config::Config, models::Card, AppContext, AppError};

#[derive(Parser)]
#[command(name = "taskboard-cli")]
#[command(about = "Maintenance commands for the taskboard database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create all tables
    Create,
    /// Drop all tables
    Drop,
    /// Insert the sample cards and users
    Seed,
    /// Print the first card
    #[command(name = "first_card")]
    FirstCard,
    /// Print how many cards are ongoing
    #[command(name = "count_ongoing")]
    CountOngoing,
    /// Print every card in board order
    #[command(name = "all_cards")]
    AllCards,
    /// Print cards that are not started or have high priority
    #[command(name = "todo_or_high")]
    TodoOrHigh,
}

fn print_card(card: &Card) {
    println!(
        "{:<4} {:<20} {:<10} {:<8} {}",
        card.id, card.title, card.status, card.priority, card.date
    );
}

fn print_cards(cards: &[Card]) {
    if cards.is_empty() {
        println!("No cards found.");
        return;
    }
    println!("{:<4} {:<20} {:<10} {:<8} {}", "ID", "Title", "Status", "Priority", "Date");
    println!("{}", "-".repeat(60));
    cards.iter().for_each(print_card);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::parse();

    let config = Config::from_env()?;
    // Each invocation is its own process, so memory:// state would never survive it.
    if config.uses_memory_store() {
        return Err(AppError::ConfigError(
            "the cli needs a persistent DATABASE_URL, memory:// is server-only".into(),
        )
        .into());
    }
    let ctx = AppContext::from_config(&config).await?;
    let store = ctx.store();

    match cli.command {
        Commands::Create => {
            commands::create_all(store).await?;
            println!("Tables created");
        }
        Commands::Drop => {
            commands::drop_all(store).await?;
            println!("Tables dropped");
        }
        Commands::Seed => {
            let (cards, users) = commands::seed(store, ctx.bcrypt_cost).await?;
            log::info!("Seeded {} cards and {} users", cards.len(), users.len());
            println!("Tables seeded");
        }
        Commands::FirstCard => match commands::first_card(store).await? {
            Some(card) => print_card(&card),
            None => println!("No cards found."),
        },
        Commands::CountOngoing => {
            println!("{}", commands::count_ongoing(store).await?);
        }
        Commands::AllCards => print_cards(&commands::all_cards(store).await?),
        Commands::TodoOrHigh => print_cards(&commands::todo_or_high(store).await?),
    }

    Ok(())
}
