mod api;
mod session;

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use shared::pg::{run_migrations, PgStore};
use shared::{AdminCredentials, Role, Store};
use tracing::info;

#[derive(Parser)]
#[command(name = "admin-service")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(long, env = "PORT", default_value = "3002")]
    port: u16,

    #[arg(long)]
    skip_migrations: bool,

    /// Back-office accounts created at startup when missing, as
    /// `username:role:password` with role `administrator` or `logistic`.
    #[arg(long = "bootstrap-admin", env = "BOOTSTRAP_ADMINS", value_delimiter = ',')]
    bootstrap_admins: Vec<String>,
}

fn parse_bootstrap_admin(raw: &str) -> Result<AdminCredentials> {
    let mut parts = raw.splitn(3, ':');
    let (Some(username), Some(role), Some(password)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("Expected username:role:password, got {:?}", raw);
    };
    let Some(role) = Role::parse(role) else {
        bail!("Unknown role {:?} for {}", role, username);
    };
    if username.is_empty() || password.is_empty() {
        bail!("Username and password must not be empty");
    }
    Ok(AdminCredentials::new(username, username, role, password))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    if !args.skip_migrations {
        info!("Running database migrations...");
        run_migrations(&args.database_url)?;
        info!("Migrations completed successfully");
    }

    let admins = args
        .bootstrap_admins
        .iter()
        .map(|raw| parse_bootstrap_admin(raw))
        .collect::<Result<Vec<_>>>()?;

    let store = PgStore::connect(&args.database_url).await?;
    for admin in &admins {
        if store.ensure_admin(admin).await? {
            info!("Created {} account {}", admin.user.role.as_str(), admin.user.username);
        } else {
            info!("Account {} already exists, left unchanged", admin.user.username);
        }
    }

    let app_state = api::AppState {
        store: Arc::new(store),
        sessions: session::Sessions::default(),
    };

    let app = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port)).await?;

    info!("Admin service started on port {}", args.port);
    info!("Back office ready at http://0.0.0.0:{}/orders", args.port);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::password::verify_password;

    #[test]
    fn bootstrap_admin_keeps_colons_in_password() {
        let admin = parse_bootstrap_admin("logistica:logistic:clave:con:dos").unwrap();
        assert_eq!(admin.user.username, "logistica");
        assert_eq!(admin.user.role, Role::Logistic);
        assert!(verify_password("clave:con:dos", &admin.password_hash));
    }

    #[test]
    fn bootstrap_admin_rejects_bad_entries() {
        assert!(parse_bootstrap_admin("admin:admin123").is_err());
        assert!(parse_bootstrap_admin("admin:root:admin123").is_err());
        assert!(parse_bootstrap_admin(":administrator:admin123").is_err());
        assert!(parse_bootstrap_admin("admin:administrator:").is_err());
    }

    #[test]
    fn bootstrap_admins_split_on_commas() {
        let args = Args::try_parse_from([
            "admin-service",
            "--database-url",
            "postgres://localhost/sucamec",
            "--bootstrap-admin",
            "admin:administrator:admin123,logistica:logistic:logistica123",
        ])
        .unwrap();
        assert_eq!(args.bootstrap_admins.len(), 2);
    }
}
