//! Subcommand handlers. Each one is a thin wrapper over an `ApiClient`
//! operation that prints the result.

use anyhow::{Context, Result};
use tracing::warn;

use amalie_core::api::{AuditLogFilter, EntityFilter, QueryParams};
use amalie_core::models::{DashboardAnalytics, Entity, NewEntity, Transaction};
use amalie_core::{ApiClient, Config};

use crate::cli::{AuditArgs, Command, EntityArgs, MonitorArgs, ScreenArgs};

/// How many entities `dashboard --with-entities` lists
const RECENT_ENTITY_LIMIT: u32 = 10;

pub async fn run(command: Command, api: &ApiClient, config: &mut Config) -> Result<()> {
    match command {
        Command::Login { email, password } => login(api, config, email, password).await,
        Command::Logout => {
            api.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => whoami(api).await,
        Command::Screen(args) => screen(api, args).await,
        Command::Entities(args) => entities(api, args).await,
        Command::Monitor(args) => monitor(api, args).await,
        Command::Dashboard {
            timeframe,
            with_entities,
        } => {
            if with_entities {
                let recent = QueryParams::new().with("limit", RECENT_ENTITY_LIMIT);
                let (analytics, entities) = futures::try_join!(
                    api.get_dashboard_analytics(timeframe),
                    api.get_entities(recent)
                )?;
                print_dashboard(&analytics);
                println!();
                print_entities(&entities);
            } else {
                print_dashboard(&api.get_dashboard_analytics(timeframe).await?);
            }
            Ok(())
        }
        Command::Audit(args) => audit(api, args).await,
    }
}

async fn login(
    api: &ApiClient,
    config: &mut Config,
    email: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let email = email
        .or_else(|| config.last_email.clone())
        .context("No email given; pass --email")?;
    let password = match password {
        Some(password) => password,
        None => rpassword::prompt_password(format!("Password for {}: ", email))
            .context("Failed to read password")?,
    };

    let response = api.login(&email, &password).await?;

    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!(
        "Logged in as {} ({})",
        response.user.display_name(),
        response.user.display_role()
    );
    Ok(())
}

async fn whoami(api: &ApiClient) -> Result<()> {
    match api.current_identity().await {
        Some(identity) => {
            println!("[{}] {}", identity.initials(), identity.display_name());
            println!("  role:  {}", identity.display_role());
            if let Some(ref email) = identity.email {
                println!("  email: {}", email);
            }
            if let Some(expires_at) = identity.expires_at() {
                println!("  session expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

async fn screen(api: &ApiClient, args: ScreenArgs) -> Result<()> {
    let entity = NewEntity {
        name: args.name,
        entity_type: args.entity_type,
        country: args.country,
        identifier: args.identifier,
        notes: args.notes,
    };
    let result = api.screen_entity(&entity).await?;
    print_entities(std::slice::from_ref(&result.entity));
    Ok(())
}

async fn entities(api: &ApiClient, args: EntityArgs) -> Result<()> {
    let filter = EntityFilter {
        country: args.country,
        entity_type: args.entity_type,
        status: args.status,
        search: args.search,
        page: args.page,
        limit: args.limit,
    };
    print_entities(&api.get_entities(filter).await?);
    Ok(())
}

async fn monitor(api: &ApiClient, args: MonitorArgs) -> Result<()> {
    let transaction = Transaction::new(args.from, args.to, args.amount)
        .with_currency(args.currency)
        .with_description(args.description);
    let result = api.monitor_transaction(&transaction).await?;

    println!(
        "{} -> {}: {}",
        result.transaction.from_entity,
        result.transaction.to_entity,
        result.transaction.amount_display()
    );
    println!(
        "  risk {}% ({})  status {}",
        result.analysis.risk_score,
        result.analysis.risk_level(),
        result.analysis.status.label()
    );
    Ok(())
}

/// Typed filters first; `--param` pairs are added on top and win on a
/// repeated key.
fn audit_query(args: AuditArgs) -> QueryParams {
    let filter = AuditLogFilter {
        user: args.user,
        action: args.action,
        entity_id: args.entity_id,
        start_date: args.start_date,
        end_date: args.end_date,
        page: args.page,
        limit: args.limit,
    };
    let mut params = QueryParams::from(filter);
    for (key, value) in args.params {
        params.insert(key, value);
    }
    params
}

async fn audit(api: &ApiClient, args: AuditArgs) -> Result<()> {
    let page = api.get_audit_logs(audit_query(args)).await?;
    println!("{}", serde_json::to_string_pretty(page.as_value())?);
    Ok(())
}

fn print_entities(entities: &[Entity]) {
    if entities.is_empty() {
        println!("No entities");
        return;
    }
    println!(
        "{:<10} {:<32} {:<11} {:<7} {:>5} {:<9} {:>10}  {}",
        "ID", "NAME", "TYPE", "COUNTRY", "RISK", "STATUS", "CONFIDENCE", "SCREENED"
    );
    for e in entities {
        println!(
            "{:<10} {:<32} {:<11} {:<7} {:>5} {:<9} {:>9}%  {}",
            e.id,
            e.name,
            e.entity_type,
            e.country.as_deref().unwrap_or("-"),
            e.overall_risk,
            e.status.label(),
            e.ai_analysis.confidence,
            e.screened_date.format("%Y-%m-%d")
        );
    }
}

fn print_dashboard(analytics: &DashboardAnalytics) {
    let s = &analytics.summary;
    println!("Total screenings: {}", s.total_screenings);
    println!(
        "  blocked {}  warning {}  clear {}",
        s.blocked_count, s.warning_count, s.clear_count
    );

    if !analytics.daily_trends.is_empty() {
        println!("Daily trends:");
        for day in &analytics.daily_trends {
            println!(
                "  {:<12} {:>6} screenings  avg risk {:.1}",
                day.date, day.screenings, day.avg_risk
            );
        }
    }

    if !analytics.risk_distribution.is_empty() {
        println!("Risk distribution:");
        for (bucket, (_, share)) in analytics
            .risk_distribution
            .iter()
            .zip(analytics.risk_share())
        {
            println!("  {:<7} {:>6}  ({:.1}%)", bucket.risk_level, bucket.count, share);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_audit_query_merges_filters_and_params() {
        let args = AuditArgs {
            user: Some("ada".to_string()),
            action: None,
            entity_id: Some("17".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            end_date: None,
            page: Some(2),
            limit: None,
            params: vec![
                ("page".to_string(), "3".to_string()),
                ("sort".to_string(), "desc".to_string()),
            ],
        };
        assert_eq!(
            audit_query(args).to_query_string(),
            "entityId=17&page=3&sort=desc&startDate=2024-03-01&user=ada"
        );
    }
}
