use std::io::{BufRead, Write};

use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use helpdesk::api::{SupportLevel, TicketFilter, TicketStatus};
use helpdesk::cli;
use helpdesk::config::ClientConfig;
use helpdesk::identity::{AuthState, LoginRequest};
use helpdesk::{AppError, AppResult, HelpdeskClient};

fn print_usage() {
    eprintln!("Usage: helpdesk <command> [args]");
    eprintln!("  login <username>               sign in (password from HELPDESK_PASSWORD or stdin)");
    eprintln!("  logout                         discard the stored session");
    eprintln!("  whoami                         show the signed-in user");
    eprintln!("  tickets [STATUS]               list visible tickets");
    eprintln!("  status <id> <STATUS>           change a ticket's status");
    eprintln!("  level <id> <LEVEL>             change a ticket's support level (1, 2, 3)");
    eprintln!("  assign <id> <user_id> [note]   assign a ticket");
    eprintln!("  stats                          ticket statistics");
    eprintln!("  forgot-password <email>        request a password reset");
    eprintln!("Environment: HELPDESK_API_URL, HELPDESK_TOKEN_FILE, HELPDESK_OUTPUT=json, RUST_LOG");
}

fn read_password() -> anyhow::Result<String> {
    if let Ok(p) = std::env::var("HELPDESK_PASSWORD") {
        return Ok(p);
    }
    eprint!("password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Print a command result either as `Outcome` JSON or through `human`.
fn report<T: Serialize>(res: AppResult<T>, human: impl FnOnce(&T)) -> bool {
    if cli::json_output() {
        return cli::print_outcome(res);
    }
    match res {
        Ok(v) => {
            human(&v);
            true
        }
        Err(e) => {
            eprintln!("{}: {}", e.kind().as_str(), e.message());
            false
        }
    }
}

fn usage_error(msg: &str) -> AppError {
    AppError::validation("usage".to_string(), msg.to_string())
}

async fn run(client: &HelpdeskClient, cmd: &str, args: &[String]) -> anyhow::Result<bool> {
    let arg = |i: usize| args.get(i).map(String::as_str);
    let ok = match cmd {
        "login" => {
            let Some(username) = arg(0) else {
                print_usage();
                return Ok(false);
            };
            let password = read_password()?;
            let req = LoginRequest { username: username.to_string(), password };
            let res = client.sessions.login(&req).await.map(|s| s.principal);
            report(res, cli::print_principal)
        }
        "logout" => {
            client.sessions.logout();
            report(Ok(()), |_| println!("signed out"))
        }
        "whoami" => {
            let res = client
                .store
                .principal()
                .ok_or_else(|| AppError::unauthorized("sign_in_required", "not signed in"));
            report(res, cli::print_principal)
        }
        "tickets" => {
            let status = match arg(0) {
                Some(s) => match TicketStatus::parse(s) {
                    Some(st) => Some(st),
                    None => return Ok(report::<()>(Err(usage_error(&format!("unknown status '{}'", s))), |_| {})),
                },
                None => None,
            };
            let filter = TicketFilter { status, ..TicketFilter::default() };
            let res = client.tickets.load(&filter).await;
            report(res, |t| cli::print_tickets(t))
        }
        "status" => {
            let (Some(id), Some(raw)) = (arg(0), arg(1)) else {
                print_usage();
                return Ok(false);
            };
            let res = match TicketStatus::parse(raw) {
                Some(st) => match client.tickets.open(id).await {
                    Ok(_) => client.tickets.change_status(id, st).await,
                    Err(e) => Err(e),
                },
                None => Err(usage_error(&format!("unknown status '{}'", raw))),
            };
            report(res, |t| println!("ticket {} is now {}", t.id, t.status.as_str()))
        }
        "level" => {
            let (Some(id), Some(raw)) = (arg(0), arg(1)) else {
                print_usage();
                return Ok(false);
            };
            let res = match SupportLevel::parse(raw) {
                Some(lvl) => match client.tickets.open(id).await {
                    Ok(_) => client.tickets.change_support_level(id, lvl).await,
                    Err(e) => Err(e),
                },
                None => Err(usage_error(&format!("unknown support level '{}'", raw))),
            };
            report(res, |t| println!("ticket {} is now {}", t.id, t.support_level.as_str()))
        }
        "assign" => {
            let (Some(id), Some(user)) = (arg(0), arg(1)) else {
                print_usage();
                return Ok(false);
            };
            let res = client.tickets.assign(id, user, arg(2)).await;
            report(res, |t| println!("ticket {} assigned to {}", t.id, t.assigned_to_id.as_deref().unwrap_or("-")))
        }
        "stats" => {
            let res = client.tickets.stats().await;
            report(res, |v| {
                for line in cli::stats_lines(v) {
                    println!("{}", line);
                }
            })
        }
        "forgot-password" => {
            let Some(email) = arg(0) else {
                print_usage();
                return Ok(false);
            };
            let res = client.sessions.forgot_password(email).await;
            report(res, |_| println!("if the address is registered, a reset link has been sent"))
        }
        _ => {
            print_usage();
            false
        }
    };
    Ok(ok)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = args.first().cloned() else {
        print_usage();
        std::process::exit(2);
    };

    let config = ClientConfig::from_env()?;
    info!(target: "helpdesk", api_url = %config.api_url, token_file = %config.token_file.display(), "helpdesk starting");
    let client = HelpdeskClient::from_config(config)?;

    if cmd != "login" && cmd != "logout" {
        if let AuthState::Authenticated(p) = client.sessions.restore().await {
            info!(target: "helpdesk", user = %p.id, "using stored session");
        }
    }

    if !run(&client, &cmd, &args[1..]).await? {
        std::process::exit(1);
    }
    Ok(())
}
