use zenstack_storage::Store;

use crate::config::AuthConfig;

/// Create the default admin account when the users table is empty.
pub async fn seed_admin(store: &Store, auth: &AuthConfig) -> anyhow::Result<()> {
    match store.count_users().await? {
        0 => {
            let hash = bcrypt::hash(&auth.default_password, bcrypt::DEFAULT_COST)?;
            store
                .create_user(&auth.default_username, &hash, "admin", "active")
                .await?;
            tracing::info!(
                username = %auth.default_username,
                "Created default admin account"
            );
        }
        count => {
            tracing::info!(count, "Users table already has accounts, skipping admin seed");
        }
    }
    Ok(())
}

/// Seed the default message templates the notifier expects, one per
/// event, only when the event has no template yet.
pub async fn seed_templates(store: &Store) -> anyhow::Result<()> {
    let defaults = [
        (
            "SITE_DOWN",
            "Site Down Alert",
            "Site {{domain}} is down. Status code: {{status_code}}",
            "🚨 告警：站点 {{domain}} 无法访问！状态码：{{status}}",
        ),
        (
            "SSL_CRITICAL",
            "SSL Certificate Warning",
            "SSL certificate for {{domain}} will expire in {{days_remaining}} days.",
            "🔒 证书预警：域名 {{domain}} 的 SSL 证书将在 {{days}} 天后过期。",
        ),
    ];

    for (event_name, title, body, text) in defaults {
        if store.get_template_by_event(event_name).await?.is_some() {
            continue;
        }
        match store
            .insert_message_template(event_name, title, body, text)
            .await
        {
            Ok(_) => tracing::info!(event = event_name, "Seeded default message template"),
            Err(e) => tracing::warn!(
                event = event_name,
                error = %e,
                "Failed to seed message template"
            ),
        }
    }
    Ok(())
}
