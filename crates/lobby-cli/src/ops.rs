//! One-shot subcommands: plain-output admin operations

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::NaiveDate;
use lobby_api::{ApiClient, AgentPolicy, LogQuery, PasswordChange, ProfilePatch, UserPatch};
use lobby_client::directory::{ActivityFilter, RoleFilter, UserFilter};
use lobby_client::pager::{Pager, day_end, day_start};

use crate::credentials::{self, Credentials};

/// Sign in and cache the token plus role claims
pub async fn login(api_url: &str, username: &str, password: &str) -> anyhow::Result<()> {
    let client = ApiClient::anonymous(api_url);
    let token = client.login(username, password).await?;

    let creds = Credentials::new(token.access_token, token.roles.clone());
    credentials::save(&creds).context("failed to store credentials")?;

    if token.roles.is_empty() {
        println!("Signed in.");
    } else {
        println!("Signed in with roles: {}", token.roles.join(", "));
    }
    Ok(())
}

/// Show the signed-in account
pub async fn whoami(client: &ApiClient) -> anyhow::Result<()> {
    let me = client.me().await?;
    println!("{} <{}>", me.username, me.email);
    if !me.roles.is_empty() {
        println!("roles: {}", me.roles.join(", "));
    }
    Ok(())
}

/// Update the signed-in account's profile
pub async fn set_profile(
    client: &ApiClient,
    username: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    if username.is_none() && email.is_none() {
        bail!("nothing to update; pass --username and/or --email");
    }
    let patch = ProfilePatch { username, email };
    let me = client.update_profile(&patch).await?;
    println!("Profile updated: {} <{}>", me.username, me.email);
    Ok(())
}

/// Change the signed-in account's password
pub async fn set_password(client: &ApiClient, current: &str, new: &str) -> anyhow::Result<()> {
    let change = PasswordChange {
        current_password: current.to_string(),
        new_password: new.to_string(),
    };
    client.change_password(&change).await?;
    println!("Password changed.");
    Ok(())
}

/// List users, with the same client-side filters the console applies
pub async fn users_list(
    client: &ApiClient,
    query: Option<String>,
    role: Option<String>,
    active: Option<bool>,
) -> anyhow::Result<()> {
    let users = client.list_users(query.as_deref()).await?;

    let filter = UserFilter {
        query: query.unwrap_or_default(),
        role: role.map(RoleFilter::Role).unwrap_or(RoleFilter::All),
        activity: match active {
            Some(true) => ActivityFilter::Active,
            Some(false) => ActivityFilter::Inactive,
            None => ActivityFilter::All,
        },
    };
    let rows = filter.apply(&users);

    if rows.is_empty() {
        println!("No users found");
        return Ok(());
    }

    println!(
        "{:<38} {:<20} {:<28} {:<8} {}",
        "ID", "USERNAME", "EMAIL", "ACTIVE", "ROLES"
    );
    for user in rows {
        println!(
            "{:<38} {:<20} {:<28} {:<8} {}",
            user.id,
            user.username,
            user.email,
            if user.is_active { "yes" } else { "no" },
            user.roles.join(","),
        );
    }
    Ok(())
}

/// Patch a user account
pub async fn users_set(
    client: &ApiClient,
    id: &str,
    username: Option<String>,
    email: Option<String>,
    roles: Option<String>,
    active: Option<bool>,
) -> anyhow::Result<()> {
    let patch = UserPatch {
        username,
        email,
        is_active: active,
        roles: roles.map(|csv| {
            csv.split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        }),
    };
    let user = client.update_user(id, &patch).await?;
    println!("Saved {} <{}>", user.username, user.email);
    Ok(())
}

/// Build the server-side log filter from the shared CLI flags
pub fn build_log_query(
    query: Option<String>,
    level: Option<lobby_api::LogLevel>,
    user_id: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> LogQuery {
    LogQuery {
        q: query,
        level,
        user_id,
        date_from: from.map(day_start),
        date_to: to.map(day_end),
        limit: None,
        offset: None,
    }
}

/// List one page of activity logs
pub async fn logs_list(
    client: &ApiClient,
    mut query: LogQuery,
    page: u32,
    page_size: u32,
) -> anyhow::Result<()> {
    let mut pager = Pager::new(page_size);
    pager.page = page.max(1);
    query.limit = Some(pager.page_size);
    query.offset = Some(pager.offset());

    let result = client.list_logs(&query).await?;
    pager.set_total(result.total);

    if page > pager.page_count() {
        bail!("page {} is out of range (1..{})", page, pager.page_count());
    }

    println!(
        "{:<18} {:<7} {:<14} {}",
        "WHEN", "LEVEL", "USER", "ACTIVITY"
    );
    for entry in &result.items {
        println!(
            "{:<18} {:<7} {:<14} {}",
            entry.occurred_at.format("%Y-%m-%d %H:%M"),
            entry.level.map(|l| l.as_str()).unwrap_or("-"),
            entry.user_id.as_deref().unwrap_or("-"),
            entry.activity,
        );
    }
    println!(
        "\nPage {}/{} - {} results",
        pager.page,
        pager.page_count(),
        pager.total
    );
    Ok(())
}

/// Export the filtered log set as CSV
pub async fn logs_export(
    client: &ApiClient,
    query: LogQuery,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let csv = client.export_logs_csv(&query).await?;
    let path = out.unwrap_or_else(|| PathBuf::from("logs.csv"));
    tokio::fs::write(&path, csv)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Exported to {}", path.display());
    Ok(())
}

/// Delete one or more log rows
pub async fn logs_delete(client: &ApiClient, ids: &[i64]) -> anyhow::Result<()> {
    if ids.is_empty() {
        bail!("no log ids given");
    }
    if ids.len() == 1 {
        client.delete_log(ids[0]).await?;
    } else {
        client.bulk_delete_logs(ids).await?;
    }
    println!("Deleted {} log(s)", ids.len());
    Ok(())
}

/// Print current server settings
pub async fn settings_get(client: &ApiClient) -> anyhow::Result<()> {
    let settings = client.settings().await?;
    println!("access_token_ttl_min = {}", settings.access_token_ttl_min);
    println!("reset_code_ttl_min   = {}", settings.reset_code_ttl_min);
    println!("reset_max_attempts   = {}", settings.reset_max_attempts);
    println!("smtp_host            = {}", settings.smtp_host);
    println!("smtp_port            = {}", settings.smtp_port);
    println!("smtp_user            = {}", settings.smtp_user);
    println!("smtp_from            = {}", settings.smtp_from);
    Ok(())
}

/// Patch server settings from key=value pairs
pub async fn settings_set(client: &ApiClient, pairs: &[String]) -> anyhow::Result<()> {
    let mut settings = client.settings().await?;

    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{}'", pair))?;
        let value = value.trim();
        match key.trim() {
            "access_token_ttl_min" => settings.access_token_ttl_min = value.parse()?,
            "reset_code_ttl_min" => settings.reset_code_ttl_min = value.parse()?,
            "reset_max_attempts" => settings.reset_max_attempts = value.parse()?,
            "smtp_host" => settings.smtp_host = value.to_string(),
            "smtp_port" => settings.smtp_port = value.parse()?,
            "smtp_user" => settings.smtp_user = value.to_string(),
            "smtp_from" => settings.smtp_from = value.to_string(),
            other => bail!("unknown setting '{}'", other),
        }
    }

    client.update_settings(&settings).await?;
    println!("Settings saved.");
    Ok(())
}

/// Print the agent policy map
pub async fn agents_get(client: &ApiClient) -> anyhow::Result<()> {
    let policies = client.agent_policies().await?;
    if policies.is_empty() {
        println!("No agent policies found");
        return Ok(());
    }
    for (name, policy) in &policies {
        println!(
            "{:<16} {:<9} roles: {}",
            name,
            if policy.enabled { "enabled" } else { "disabled" },
            if policy.roles.is_empty() {
                "-".to_string()
            } else {
                policy.roles.join(", ")
            },
        );
    }
    Ok(())
}

/// Update one agent's policy, leaving the rest of the map unchanged
pub async fn agents_set(
    client: &ApiClient,
    name: &str,
    enabled: Option<bool>,
    roles: Option<String>,
) -> anyhow::Result<()> {
    let mut policies = client.agent_policies().await?;
    let policy = policies.entry(name.to_string()).or_insert_with(AgentPolicy::default);

    if let Some(enabled) = enabled {
        policy.enabled = enabled;
    }
    if let Some(csv) = roles {
        policy.roles = csv
            .split(',')
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
    }

    client.put_agent_policies(&policies).await?;
    println!("Policy for '{}' saved.", name);
    Ok(())
}

/// Upload documents to the retrieval index
pub async fn docs_upload(client: &ApiClient, paths: &[PathBuf]) -> anyhow::Result<()> {
    if paths.is_empty() {
        bail!("no files given");
    }
    let refs: Vec<&Path> = paths.iter().map(PathBuf::as_path).collect();
    let receipt = client.upload_docs(&refs).await?;
    if receipt.uploaded.is_empty() {
        println!("Uploaded {} file(s)", paths.len());
    } else {
        println!("Uploaded: {}", receipt.uploaded.join(", "));
    }
    Ok(())
}

/// List another user's conversations (admin chat console)
pub async fn chats_for_user(client: &ApiClient, user_id: &str) -> anyhow::Result<()> {
    let chats = client.user_chats(user_id).await?;
    if chats.is_empty() {
        println!("No conversations");
        return Ok(());
    }
    for chat in &chats {
        let created = chat
            .created_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<38} {:<20} {}", chat.id, created, chat.title);
    }
    Ok(())
}

/// Show a conversation's messages (admin chat console)
pub async fn chat_messages(client: &ApiClient, chat_id: &str, limit: u32) -> anyhow::Result<()> {
    let messages = client.chat_messages(chat_id, limit).await?;
    for message in &messages {
        println!(
            "[{}] {}: {}",
            message.created_at.format("%Y-%m-%d %H:%M"),
            message.role.as_str(),
            message.text,
        );
    }
    Ok(())
}

/// Post an assistant reply into a user's conversation
pub async fn chat_reply(client: &ApiClient, chat_id: &str, text: &str) -> anyhow::Result<()> {
    client.admin_reply(chat_id, text).await?;
    println!("Reply posted.");
    Ok(())
}
