use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use athlete_identity::{IdentityResolver, MatchStage, MatcherConfig, NameAliases, ResolverInputs};

#[derive(Debug, Parser)]
#[command(name = "athlete-identity")]
#[command(about = "Link athletes across two federation rosters", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Match source A against source B and write the merged + link tables
    Resolve {
        /// Source A roster (.csv or LiveHeats .json)
        #[arg(long)]
        source_a: PathBuf,

        /// Source B roster (.csv)
        #[arg(long)]
        source_b: PathBuf,

        /// Demonym → country mapping (.csv)
        #[arg(long)]
        countries: PathBuf,

        /// Name aliases, source B spelling → source A spelling (.json)
        #[arg(long)]
        aliases: Option<PathBuf>,

        /// Matcher thresholds (.json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exact + fuzzy stages only
        #[arg(long)]
        name_only: bool,

        #[arg(long, default_value = "athlete_matches.csv")]
        merged_out: PathBuf,

        #[arg(long, default_value = "athlete_links.csv")]
        links_out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("athlete_identity=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Resolve {
            source_a,
            source_b,
            countries,
            aliases,
            config,
            name_only,
            merged_out,
            links_out,
        } => {
            let mut matcher_config = match config {
                Some(path) => MatcherConfig::from_file(path)?,
                None => MatcherConfig::default(),
            };
            if name_only {
                matcher_config.birth_year_stage = false;
                matcher_config.nationality_stage = false;
            }

            let aliases = match aliases {
                Some(path) => NameAliases::from_file(path)?,
                None => NameAliases::new(),
            };

            println!("🔗 Athlete Identity Resolution");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

            println!("\n📂 Loading rosters...");
            let inputs = ResolverInputs::load(&source_a, &source_b, &countries)?;
            println!(
                "✓ {} source A athletes, {} source B sailors, {} country mappings",
                inputs.source_a.len(),
                inputs.source_b.len(),
                inputs.country_mappings.len()
            );

            println!("\n🎯 Matching...");
            let resolver = IdentityResolver::new()
                .config(matcher_config)
                .aliases(aliases);
            let report = resolver.resolve(inputs)?;

            for stage in MatchStage::all() {
                println!("  {:<13} {}", stage.as_str(), report.stage_count(stage));
            }
            if report.dropped_source_b > 0 {
                println!(
                    "⚠️  {} source B sailors dropped (no nationality mapping)",
                    report.dropped_source_b
                );
            }

            println!("\n💾 Writing outputs...");
            report.write_outputs(&merged_out, &links_out)?;
            println!("✓ Merged table: {}", merged_out.display());
            println!("✓ Link table:   {}", links_out.display());

            println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("✅ {}", report.summary());
        }
    }

    Ok(())
}
