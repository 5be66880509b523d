use clap::Subcommand;

/// Sub-commands available under `managers`.
#[derive(Debug, Subcommand)]
pub enum ManagersCommands {
    /// List store managers and the stores they may post to
    List,
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: ManagersCommands) -> anyhow::Result<()> {
    match command {
        ManagersCommands::List => list(pool).await,
    }
}

/// Store label for listings; the main-domain store has no subdomain.
pub(crate) fn store_label(subdomain: &str, name: &str) -> String {
    if subdomain.is_empty() {
        format!("{name} (main)")
    } else {
        format!("{name} ({subdomain})")
    }
}

async fn list(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let managers = flowershop_db::list_managers(pool).await?;
    if managers.is_empty() {
        println!("no managers; add them to the catalog file and run `db seed`");
        return Ok(());
    }

    for manager in &managers {
        let stores = flowershop_db::list_manager_stores(pool, manager.id).await?;
        let status = if manager.is_active { "active" } else { "inactive" };
        let username = if manager.telegram_username.is_empty() {
            String::new()
        } else {
            format!(" @{}", manager.telegram_username)
        };
        println!(
            "{} {}{username} [{status}] telegram_id={}",
            manager.id, manager.full_name, manager.telegram_id
        );
        if stores.is_empty() {
            println!("    (no stores)");
        }
        for store in &stores {
            println!("    {}", store_label(&store.subdomain, &store.name));
        }
    }
    Ok(())
}
