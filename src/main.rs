use anyhow::{bail, Context};
use dotenv::dotenv;
use incident_console::api::{IncidentStatus, NewAccount};
use incident_console::error::AuthError;
use incident_console::{AuthStatus, Console, Error, Settings};
use std::env;
use std::io::{BufRead, Write};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const USAGE: &str = "\
incident-console <command>

Commands:
  login <email>                       authenticate (password read from
                                      CONSOLE_PASSWORD or prompted)
  logout                              end the session
  status                              show the current session state
  reports list                        list incident reports
  reports status <id> <status>        set report status (pending|validated|rejected)
  reports publish <id>                publish a report
  reports delete <id>                 delete a report
  users list                          list administrator accounts
  users create <name> <email>         register an administrator
  users delete <id>                   delete an administrator
  stats                               show dashboard summary datasets
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging (RUST_LOG overrides, warnings and up by default)
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    // Load configuration
    let settings = Settings::new().context("failed to load configuration")?;

    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let console = Console::new(&settings).context("failed to initialize console")?;
    console.init().await.context("failed to load session")?;

    match args.as_slice() {
        ["login", email] => {
            let password = read_password()?;
            console.session.login(email, &password).await?;
            println!("Logged in as {}", email);
        }
        ["logout"] => {
            console.teardown().await?;
            println!("Logged out");
        }
        ["status"] => {
            let state = match console.session.auth_status() {
                AuthStatus::Authenticated => "authenticated",
                AuthStatus::Unauthenticated => "unauthenticated",
                AuthStatus::Unknown => "unknown",
            };
            println!("Session: {}", state);
            println!("API:     {}", settings.api.base_url);
            println!("Checked: {}", chrono::Utc::now().to_rfc3339());
        }
        ["reports", "list"] => {
            require_login(&console)?;
            let mut incidents = console.reports.list().await?;
            incidents.sort_by_key(|i| std::cmp::Reverse(i.created_at()));
            println!("{:>6}  {:<10}  {:<11}  {:<20}  description", "id", "status", "published", "created");
            for incident in &incidents {
                println!(
                    "{:>6}  {:<10}  {:<11}  {:<20}  {}",
                    incident.id,
                    incident.normalized_status(),
                    if incident.published { "published" } else { "unpublished" },
                    incident.created,
                    incident.description.as_deref().unwrap_or("-"),
                );
            }
            println!("{} report(s)", incidents.len());
        }
        ["reports", "status", id, status] => {
            require_login(&console)?;
            let id = parse_id(id)?;
            let status: IncidentStatus = status
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))?;
            console.reports.set_status(id, status).await?;
            println!("Report {} set to {}", id, status);
        }
        ["reports", "publish", id] => {
            require_login(&console)?;
            let id = parse_id(id)?;
            console.reports.publish(id).await?;
            println!("Report {} published", id);
        }
        ["reports", "delete", id] => {
            require_login(&console)?;
            let id = parse_id(id)?;
            console.reports.remove(id).await?;
            println!("Report {} deleted", id);
        }
        ["users", "list"] => {
            require_login(&console)?;
            let accounts = console.users.list().await?;
            println!("{:>6}  {:<30}  {:<9}  {:<9}  name", "id", "email", "admin", "status");
            for account in &accounts {
                println!(
                    "{:>6}  {:<30}  {:<9}  {:<9?}  {}",
                    account.id,
                    account.email,
                    if account.is_admin { "yes" } else { "no" },
                    account.user_status,
                    account.name.as_deref().unwrap_or("-"),
                );
            }
            println!("{} account(s)", accounts.len());
        }
        ["users", "create", name, email] => {
            require_login(&console)?;
            let password = read_password()?;
            let created = console
                .users
                .create(&NewAccount {
                    name: (*name).to_string(),
                    email: (*email).to_string(),
                    password,
                })
                .await?;
            println!("Created administrator {} (id {})", created.email, created.id);
        }
        ["users", "delete", id] => {
            require_login(&console)?;
            let id = parse_id(id)?;
            console.users.remove(id).await?;
            println!("Deleted administrator {}", id);
        }
        ["stats"] => {
            require_login(&console)?;
            let stats = console.dashboard.stats().await?;
            print_dataset("Incidents by month", &stats.area);
            print_dataset("By category", &stats.bar);
            print_dataset("By status", &stats.pie_status);
            print_dataset("Published ratio", &stats.pie_published);
        }
        _ => {
            eprint!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn require_login(console: &Console) -> anyhow::Result<()> {
    if !console.session.is_authenticated() {
        return Err(Error::from(AuthError::NotAuthenticated))
            .context("run `incident-console login <email>` first");
    }
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    let id: i64 = raw.trim().parse().context("id must be a number")?;
    if id <= 0 {
        bail!("id must be positive");
    }
    Ok(id)
}

fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = env::var("CONSOLE_PASSWORD") {
        return Ok(password);
    }

    print!("Password: ");
    std::io::stdout().flush()?;
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("failed to read password")?;
    Ok(password.trim_end_matches(['\r', '\n']).to_string())
}

fn print_dataset(title: &str, dataset: &incident_console::api::Dataset) {
    println!("{}", title);
    for (label, value) in dataset.labels.iter().zip(dataset.data.iter()) {
        println!("  {:<20} {}", label, value);
    }
}
