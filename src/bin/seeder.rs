//! Development seeder
//!
//! Creates pending accounts with random names and roles through the normal
//! registration path, so they show up in the admin approval queue.
//!
//! Usage:
//!   seeder --count 25
//!
//! Environment:
//!   DATABASE_PATH - SQLite database file (required)
//!   SEED_PASSWORD - Password shared by all seeded accounts (default: password123)

use anyhow::{Context, Result};
use clap::Parser;
use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use coursify_backend::{
    auth::{models::RegisterRequest, JwtHandler, PasswordHasher, UserRole},
    services::UserService,
    store::Database,
};

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Edsger", "Frances", "Grace", "Hedy", "John",
    "Katherine", "Ken", "Linus", "Margaret", "Niklaus", "Radia", "Sophie", "Tim",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Backus", "Dijkstra", "Hamilton", "Hopper", "Johnson", "Kay", "Knuth", "Lamarr",
    "Liskov", "Lovelace", "Perlman", "Ritchie", "Shannon", "Thompson", "Turing", "Wilson",
    "Wirth",
];

const SEED_ROLES: [UserRole; 2] = [UserRole::Student, UserRole::Instructor];

#[derive(Parser, Debug)]
#[command(name = "seeder")]
#[command(about = "Seed the database with pending test accounts")]
struct Args {
    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH")]
    database_path: String,

    /// Number of accounts to create
    #[arg(long, short = 'n', default_value = "10")]
    count: usize,

    /// Password shared by every seeded account
    #[arg(long, env = "SEED_PASSWORD", default_value = "password123")]
    password: String,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// bcrypt cost factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    bcrypt_cost: u32,
}

fn fake_registration(rng: &mut impl Rng, password: &str) -> RegisterRequest {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    let tag: u32 = rng.gen_range(1000..10000);

    RegisterRequest {
        full_name: format!("{first} {last}"),
        email: format!("{}.{}{}@example.com", first, last, tag).to_lowercase(),
        password: password.to_string(),
        role: SEED_ROLES[rng.gen_range(0..SEED_ROLES.len())],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let db = Database::open(&args.database_path)
        .with_context(|| format!("Failed to open database at {}", args.database_path))?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Seeding never issues tokens; the signing key is throwaway
    let secret: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let users = UserService::new(
        db,
        PasswordHasher::new(args.bcrypt_cost),
        Arc::new(JwtHandler::new(&secret)),
    );

    info!(count = args.count, "Seeding users...");

    let mut created = 0usize;
    for _ in 0..args.count {
        let request = fake_registration(&mut rng, &args.password);
        let email = request.email.clone();
        match users.register(request).await {
            Ok(user) => {
                created += 1;
                info!(role = user.role.as_str(), email = %user.email, "Created user");
            }
            Err(e) => warn!(email = %email, error = %e, "Could not create user"),
        }
    }

    info!(created, requested = args.count, "Seeding complete!");
    Ok(())
}
