//! quarry - member search over an in-memory store

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use quarry::config::SessionConfig;
use quarry::entity::{NewMember, NewTeam};
use quarry::gateway::{MemoryGateway, SqlRenderer};
use quarry::search::{MemberRepository, MemberSearchCondition, MemberTeamDto, PageRequest};
use quarry::session::Session;
use std::sync::Arc;

/// Search members and their teams
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Exact member name
    #[arg(short, long)]
    name: Option<String>,

    /// Exact team name
    #[arg(short, long)]
    team_name: Option<String>,

    /// Minimum age, inclusive
    #[arg(long)]
    age_goe: Option<i32>,

    /// Maximum age, inclusive
    #[arg(long)]
    age_loe: Option<i32>,

    /// Rows to skip; requires --limit
    #[arg(short, long, requires = "limit")]
    offset: Option<u64>,

    /// Page size
    #[arg(short, long)]
    limit: Option<u64>,

    /// Number of demo members to seed
    #[arg(short, long, default_value = "100")]
    members: u32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Print the SQL of the search statement
    #[arg(long)]
    show_sql: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let gateway = Arc::new(MemoryGateway::new());
    seed(&gateway, args.members)?;

    let config = SessionConfig::default().with_log_statements(args.debug);
    let repository = MemberRepository::with_session(Session::with_config(gateway, config));

    let condition = MemberSearchCondition {
        name: args.name,
        team_name: args.team_name,
        age_goe: args.age_goe,
        age_loe: args.age_loe,
    };

    if args.show_sql {
        let query = repository.search_query(&condition)?;
        let query = match args.limit {
            Some(limit) => query.with_window(Some(args.offset.unwrap_or(0)), Some(limit)),
            None => query,
        };
        println!("{}", SqlRenderer::select(query.plan()));
    }

    match args.limit {
        Some(limit) => {
            let request = PageRequest::new(args.offset.unwrap_or(0), limit);
            let page = repository
                .search_page(&condition, request)
                .context("search failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_rows(&page.content);
                println!(
                    "page {} of {} ({} matching members)",
                    page.page_number() + 1,
                    page.total_pages(),
                    page.total_count
                );
            }
        }
        None => {
            let rows = repository
                .search(&condition, None)
                .context("search failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_rows(&rows);
                println!("{} matching members", rows.len());
            }
        }
    }

    Ok(())
}

/// Two teams and `count` members, alternating between them, aged by index
fn seed(gateway: &MemoryGateway, count: u32) -> Result<()> {
    let team_a = gateway.insert(NewTeam::new("teamA"))?;
    let team_b = gateway.insert(NewTeam::new("teamB"))?;
    for i in 0..count {
        let team = if i % 2 == 0 { team_a } else { team_b };
        let age = i32::try_from(i).context("member count out of range")?;
        gateway.insert(NewMember::new(format!("member{}", i), age, Some(team)))?;
    }
    log::info!("seeded 2 teams and {} members", count);
    Ok(())
}

fn print_rows(rows: &[MemberTeamDto]) {
    println!(
        "{:>6}  {:<12} {:>4}  {:<10}",
        "id", "username", "age", "team"
    );
    for row in rows {
        println!(
            "{:>6}  {:<12} {:>4}  {:<10}",
            row.member_id,
            row.username.as_deref().unwrap_or("-"),
            row.age,
            row.team_name.as_deref().unwrap_or("-")
        );
    }
}
