use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assetdesk_client::{
    config::Config,
    coordinator::{Coordinator, NoticeLevel},
    draft::DraftField,
    models::{
        common::{wire_date, DbId, RequestFilter},
        request::{RequestStatus, NOT_AVAILABLE},
    },
    Session,
};

const USAGE: &str = "usage:
  assetdesk list [status]
  assetdesk assets
  assetdesk categories
  assetdesk request <assetId> <reason...>
  assetdesk review <requestId> <pending|approved|rejected>
  assetdesk bulk-review <pending|approved|rejected> <requestId>...";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (dev convenience)
    let _ = dotenvy::dotenv();

    // Tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = Config::from_env()?;
    let session = Session::from_config(&cfg)?;
    tracing::info!(
        "Session for user {:?} with role {:?} against {}",
        session.claims.user_id(),
        session.claims.role,
        cfg.api_url
    );

    let mut coordinator = Coordinator::from_session(&session);
    coordinator.refresh_lookups().await?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&mut coordinator, &args).await;

    if !matches!(args.first().map(String::as_str), Some("assets" | "categories")) {
        print_requests(&coordinator);
    }
    print_notices(&coordinator);
    result
}

async fn run(coordinator: &mut Coordinator, args: &[String]) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str).unwrap_or("list");
    match command {
        "list" => match args.get(1) {
            Some(status) => {
                let status = parse_status(status)?;
                coordinator.apply_filter(RequestFilter::Status(status)).await?;
            }
            None => coordinator.refresh_requests().await?,
        },
        "assets" => {
            print_assets(coordinator);
        }
        "categories" => {
            for category in coordinator.lookups().category_choices() {
                println!("{:<6} {}", category.category_id, category.name);
            }
        }
        "request" => {
            let asset_id = parse_id(args.get(1).context(USAGE)?)?;
            let reason = args.get(2..).unwrap_or_default().join(" ");
            coordinator
                .claims()
                .user_id()
                .context("identity token carries no user id")?;

            coordinator.refresh_requests().await?;
            coordinator.start_draft_for_asset(asset_id).await?;
            coordinator.set_field(DraftField::Reason, &reason)?;
            coordinator.submit().await?;
        }
        "review" => {
            let id = parse_id(args.get(1).context(USAGE)?)?;
            let status = parse_status(args.get(2).context(USAGE)?)?;
            coordinator.refresh_requests().await?;
            coordinator.review(id, status).await?;
        }
        "bulk-review" => {
            let status = parse_status(args.get(1).context(USAGE)?)?;
            let ids = args
                .get(2..)
                .unwrap_or_default()
                .iter()
                .map(|id| parse_id(id))
                .collect::<anyhow::Result<Vec<_>>>()?;
            coordinator.refresh_requests().await?;
            let outcome = coordinator.bulk_review(&ids, status).await?;
            for (id, reason) in &outcome.failed {
                eprintln!("request {}: {}", id, reason);
            }
        }
        _ => anyhow::bail!("{}", USAGE),
    }
    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<DbId> {
    raw.parse().with_context(|| format!("`{}` is not an id", raw))
}

fn parse_status(raw: &str) -> anyhow::Result<RequestStatus> {
    raw.parse().map_err(anyhow::Error::msg)
}

fn print_requests(coordinator: &Coordinator) {
    let rows = coordinator.enriched();
    if rows.is_empty() {
        println!("No asset requests available");
        return;
    }

    println!(
        "{:<6} {:<10} {:<20} {:<16} {:<16} {:<12} {:<9} Reason",
        "ID", "User", "Asset", "Category", "Subcategory", "Date", "Status"
    );
    for row in rows {
        println!(
            "{:<6} {:<10} {:<20} {:<16} {:<16} {:<12} {:<9} {}",
            row.request_id.map(|id| id.to_string()).unwrap_or_default(),
            row.requester_id,
            row.asset_name,
            row.category_name,
            row.sub_category_name,
            row.requested_on.map(wire_date::format).unwrap_or_default(),
            row.status,
            row.reason,
        );
    }
}

fn print_assets(coordinator: &Coordinator) {
    let lookups = coordinator.lookups();
    for asset in lookups.asset_choices() {
        let category = asset
            .category_id
            .and_then(|id| lookups.category(id))
            .map(|c| c.name.as_str())
            .unwrap_or(NOT_AVAILABLE);
        println!("{:<6} {:<24} {}", asset.asset_id, asset.name, category);
    }
}

fn print_notices(coordinator: &Coordinator) {
    for notice in coordinator.notices() {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{}] {}", tag, notice.message);
    }
}
