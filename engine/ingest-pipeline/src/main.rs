//! `ingest`: one-shot ingestion commands
//!
//! Configuration comes from `.env`, an optional TOML file (`--config`) and
//! the environment. Commands that only work on local files run without
//! Supabase credentials.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ingest_pipeline::config::IngestConfig;
use ingest_pipeline::logging::{initialize_logging, initialize_logging_with_config};
use ingest_pipeline::pipelines::{
    adp, dynasty, enrich, headshots, ids, match_ids, missing_players, nffc, notes, projections, stats, teams,
    teams_refresh,
};
use ingest_pipeline::{IngestContext, Summary};
use source_feeds::{FootballguysClient, NffcClient, SleeperClient, SportsDataClient, UnderdogClient};
use std::path::PathBuf;
use std::sync::Arc;
use supabase_rest::{StorageClient, SupabaseClient};
use tracing::error;

#[derive(Parser)]
#[command(name = "ingest")]
#[command(about = "Fantasy football ingestion: ID matching, enrichment, ADP, values, stats and NFFC drafts")]
#[command(version)]
struct Cli {
    /// TOML config file; environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a source's IDs to players and save data/matched/<source>_ids.json
    #[command(subcommand)]
    Match(MatchCommand),

    /// Apply matched IDs to the players table
    #[command(subcommand)]
    Ids(IdsCommand),

    /// Fill empty bio and ID columns from a vendor
    #[command(subcommand)]
    Enrich(EnrichCommand),

    /// NFL team data and player team changes
    #[command(subcommand)]
    Teams(TeamsCommand),

    /// Rookie headshot uploads
    #[command(subcommand)]
    Headshots(HeadshotsCommand),

    /// Underdog ADP and the dynasty/ADP sheet
    #[command(subcommand)]
    Adp(AdpCommand),

    /// Dan's dynasty trade values
    #[command(subcommand)]
    Dynasty(DynastyCommand),

    /// Season projections
    #[command(subcommand)]
    Projections(ProjectionsCommand),

    /// Weekly player stats from nflreadr
    #[command(subcommand)]
    Stats(StatsCommand),

    /// NFFC draft history: pull, build the clean CSVs, load them
    #[command(subcommand)]
    Nffc(NffcCommand),

    /// Player writeups
    #[command(subcommand)]
    Notes(NotesCommand),
}

#[derive(Subcommand)]
enum MatchCommand {
    /// nflreadr ff_playerids.csv by sportradar ID
    Nflreadr,
    /// SportsData.io active players
    Sportsdata,
    /// SportsData.io rookies, merged into the SportsData file
    SportsdataRookies,
    /// Sleeper player dump
    Sleeper,
    /// Underdog ADP export
    Underdog,
    /// DraftKings pre-draft rankings
    Draftkings,
    /// Drafters player export
    Drafters,
    /// Footballguys crosswalk through the SportsData file
    Fbg,
}

#[derive(Subcommand)]
enum IdsCommand {
    /// Merge the matched files and PATCH every player
    Apply,
    /// Merge the matched files into update_ids.sql
    Sql,
    /// INSERT statements for high-ADP Underdog players missing from the DB
    AddMissing {
        /// Run the statements through the Management API
        #[arg(long)]
        apply: bool,
    },
}

#[derive(Subcommand)]
enum EnrichCommand {
    /// Bio, draft and IDs from SportsData.io
    Sportsdata,
    /// Footballguys IDs and measurements
    Fbg,
}

#[derive(Subcommand)]
enum TeamsCommand {
    /// Sync latest_team from Sleeper
    Refresh {
        /// Report changes without writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Upsert nflreadr teams.csv
    Load,
    /// Upsert nflreadr team_game_stats.csv
    GameStats,
}

#[derive(Subcommand)]
enum HeadshotsCommand {
    /// Upload <name>.png files for dynasty players without a headshot
    Upload {
        /// Directory of PNG files named after players
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdpCommand {
    /// Download Underdog rankings and upsert today's ADP
    FetchUnderdog,
    /// Upsert today's ADP from the local Underdog export
    LoadUnderdog,
    /// Write dynasty values joined with today's Underdog ADP
    ExportDynasty,
}

#[derive(Subcommand)]
enum DynastyCommand {
    /// Match the value sheet, set dan_id and upsert values
    MatchDan,
    /// Load the value change log
    History,
}

#[derive(Subcommand)]
enum ProjectionsCommand {
    /// Footballguys projections with half-PPR points
    Fbg,
}

#[derive(Subcommand)]
enum StatsCommand {
    /// nflreadr player_stats.csv
    Players,
}

#[derive(Subcommand)]
enum NffcCommand {
    /// Fetch league lists, draft results and league details
    Pull,
    /// Build data/clean/*.csv from the raw pulls
    Build,
    /// Load data/clean/*.csv into Supabase
    Load,
}

#[derive(Subcommand)]
enum NotesCommand {
    /// Upsert data/writeups/player_writeups.yaml into player_notes
    Push {
        /// Preview the first writeups without writing
        #[arg(long)]
        dry_run: bool,
    },
}

impl Commands {
    /// Commands that read or write Supabase tables
    fn needs_database(&self) -> bool {
        !matches!(
            self,
            Commands::Ids(IdsCommand::Sql | IdsCommand::AddMissing { .. })
                | Commands::Nffc(NffcCommand::Pull | NffcCommand::Build)
                | Commands::Notes(NotesCommand::Push { dry_run: true })
        )
    }
}

fn sportsdata(config: &IngestConfig) -> Result<SportsDataClient> {
    Ok(SportsDataClient::new(config.sportsdata_key()?)?)
}

/// NFLPlayers needs no key; projections do
fn footballguys(config: &IngestConfig, with_key: bool) -> Result<FootballguysClient> {
    let key = if with_key { Some(config.fbg_key()?) } else { config.sources.fbg_api_key.as_deref() };
    Ok(FootballguysClient::new(key)?)
}

async fn run(ctx: &IngestContext, command: Commands) -> Result<Summary> {
    let config = &ctx.config;
    match command {
        Commands::Match(command) => match command {
            MatchCommand::Nflreadr => match_ids::nflreadr::run(ctx).await,
            MatchCommand::Sportsdata => match_ids::sportsdata::run(ctx, &sportsdata(config)?).await,
            MatchCommand::SportsdataRookies => match_ids::sportsdata::run_rookies(ctx, &sportsdata(config)?).await,
            MatchCommand::Sleeper => match_ids::sleeper::run(ctx, &SleeperClient::new()?).await,
            MatchCommand::Underdog => match_ids::adp_sources::run_underdog(ctx).await,
            MatchCommand::Draftkings => match_ids::adp_sources::run_draftkings(ctx).await,
            MatchCommand::Drafters => match_ids::adp_sources::run_drafters(ctx).await,
            MatchCommand::Fbg => match_ids::fbg::run(ctx).await,
        },
        Commands::Ids(command) => match command {
            IdsCommand::Apply => ids::run_apply(ctx).await,
            IdsCommand::Sql => ids::run_sql(ctx).await,
            IdsCommand::AddMissing { apply } => missing_players::run(ctx, apply).await,
        },
        Commands::Enrich(command) => match command {
            EnrichCommand::Sportsdata => enrich::run_sportsdata(ctx, &sportsdata(config)?).await,
            EnrichCommand::Fbg => enrich::run_fbg(ctx, &footballguys(config, false)?).await,
        },
        Commands::Teams(command) => match command {
            TeamsCommand::Refresh { dry_run } => teams_refresh::run(ctx, &SleeperClient::new()?, dry_run).await,
            TeamsCommand::Load => teams::run_load(ctx).await,
            TeamsCommand::GameStats => teams::run_game_stats(ctx).await,
        },
        Commands::Headshots(HeadshotsCommand::Upload { dir }) => {
            let storage = StorageClient::new(config.supabase()?).context("Failed to create storage client")?;
            headshots::run(ctx, &storage, &dir).await
        }
        Commands::Adp(command) => match command {
            AdpCommand::FetchUnderdog => {
                let client = UnderdogClient::new(&config.sources.underdog_rankings_url)?;
                adp::run_fetch_underdog(ctx, &client).await
            }
            AdpCommand::LoadUnderdog => adp::run_load_underdog(ctx).await,
            AdpCommand::ExportDynasty => adp::run_export_dynasty(ctx).await,
        },
        Commands::Dynasty(command) => match command {
            DynastyCommand::MatchDan => dynasty::run_match_dan(ctx).await,
            DynastyCommand::History => dynasty::run_history(ctx).await,
        },
        Commands::Projections(ProjectionsCommand::Fbg) => projections::run(ctx, &footballguys(config, true)?).await,
        Commands::Stats(StatsCommand::Players) => stats::run_players(ctx).await,
        Commands::Nffc(command) => match command {
            NffcCommand::Pull => {
                let client = NffcClient::new(config.nffc_key()?, config.data.nffc_current_season)?;
                nffc::pull::run(ctx, &client).await
            }
            NffcCommand::Build => nffc::build::run(ctx).await,
            NffcCommand::Load => nffc::load::run(ctx).await,
        },
        Commands::Notes(NotesCommand::Push { dry_run }) => notes::run(ctx, dry_run).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match IngestConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            initialize_logging()?;
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    initialize_logging_with_config(&config.logging)?;

    let ctx = if cli.command.needs_database() {
        let client = SupabaseClient::new(config.supabase()?).context("Failed to create Supabase client")?;
        println!("✅ Supabase: {}", client.config().url);
        IngestContext::new(config, Arc::new(client))
    } else {
        IngestContext::offline(config)
    };
    println!("📂 Data directory: {}", ctx.layout.root().display());

    let summary = run(&ctx, cli.command).await?;
    println!("{summary}");
    println!("✅ {} complete", summary.title());
    Ok(())
}
