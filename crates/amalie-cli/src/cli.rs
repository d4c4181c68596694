use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use amalie_core::models::{EntityType, RiskStatus, Timeframe};

#[derive(Debug, Parser)]
#[command(name = "amalie", version, about = "Compliance screening console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session for later commands
    Login {
        /// Account email; defaults to the last one used
        #[arg(long)]
        email: Option<String>,
        /// Password; prompted for when not set
        #[arg(long, env = "AMALIE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Screen an entity against the service's watch lists
    Screen(ScreenArgs),
    /// List screened entities
    Entities(EntityArgs),
    /// Submit a transaction for risk monitoring
    Monitor(MonitorArgs),
    /// Show dashboard analytics
    Dashboard {
        #[arg(long, value_parser = parse_timeframe)]
        timeframe: Option<Timeframe>,
        /// Also list the most recent entities
        #[arg(long)]
        with_entities: bool,
    },
    /// Query the audit log; raw JSON is printed
    Audit(AuditArgs),
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: EntityType,
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long)]
    pub identifier: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[arg(long)]
    pub country: Option<String>,
    #[arg(long = "type", value_parser = parse_entity_type)]
    pub entity_type: Option<EntityType>,
    #[arg(long, value_parser = parse_status)]
    pub status: Option<RiskStatus>,
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub amount: f64,
    #[arg(long, default_value = "USD")]
    pub currency: String,
    #[arg(long, default_value = "")]
    pub description: String,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<NaiveDate>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
    /// Extra filter as key=value, repeatable
    #[arg(long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

fn parse_entity_type(s: &str) -> Result<EntityType, String> {
    s.parse()
}

fn parse_status(s: &str) -> Result<RiskStatus, String> {
    s.parse()
}

fn parse_timeframe(s: &str) -> Result<Timeframe, String> {
    s.parse()
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, found {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("action=screen").unwrap(),
            ("action".to_string(), "screen".to_string())
        );
        assert_eq!(
            parse_key_value("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_parse_dashboard_command() {
        let cli = Cli::try_parse_from(["amalie", "dashboard", "--timeframe", "7d"]).unwrap();
        match cli.command {
            Command::Dashboard { timeframe, with_entities } => {
                assert_eq!(timeframe, Some(Timeframe::Week));
                assert!(!with_entities);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["amalie", "dashboard", "--timeframe", "1y"]).is_err());
    }

    #[test]
    fn test_parse_audit_command() {
        let cli = Cli::try_parse_from([
            "amalie", "audit", "--action", "screen", "--start-date", "2024-03-01",
            "--param", "sort=desc",
        ])
        .unwrap();
        match cli.command {
            Command::Audit(args) => {
                assert_eq!(args.action.as_deref(), Some("screen"));
                assert_eq!(args.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(args.end_date, None);
                assert_eq!(args.params, vec![("sort".to_string(), "desc".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["amalie", "audit", "--start-date", "03/01/2024"]).is_err());
    }

    #[test]
    fn test_parse_screen_command() {
        let cli = Cli::try_parse_from([
            "amalie", "screen", "--name", "Acme", "--type", "company", "--country", "US",
        ])
        .unwrap();
        match cli.command {
            Command::Screen(args) => {
                assert_eq!(args.name, "Acme");
                assert_eq!(args.entity_type, EntityType::Company);
                assert_eq!(args.country.as_deref(), Some("US"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
