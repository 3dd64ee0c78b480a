// src/config.rs
//
// Command line for the two phases: `build` runs the batch pipeline and
// writes artifacts, `serve` loads them and answers queries.

use crate::advisor::{AnswerGenerator, GenerateError, OpenAiGenerator, TemplateGenerator};
use crate::domain::ProjectionConfig;
use crate::embedder::{EmbedError, Embedder, HashingEmbedder, OpenAiEmbedder};
use crate::errors::ValidationError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "homeverdict", about = "Buy-vs-rent verdicts for property listings")]
pub struct Cli {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, env = "HOMEVERDICT_LOG_JSON", global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest listings and rentals, enrich them, and write catalog + index.
    Build(BuildArgs),
    /// Serve filter, search and chat queries over previously built artifacts.
    Serve(ServeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    #[arg(long, env = "HOMEVERDICT_DB", default_value = "catalog.sqlite3")]
    pub db: PathBuf,

    #[arg(long, env = "HOMEVERDICT_INDEX", default_value = "catalog.index")]
    pub index: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Sale listings CSV.
    #[arg(long, env = "HOMEVERDICT_LISTINGS")]
    pub listings: PathBuf,

    /// Rental comparables CSV.
    #[arg(long, env = "HOMEVERDICT_RENTALS")]
    pub rentals: PathBuf,

    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Also write the enriched catalog as CSV.
    #[arg(long)]
    pub catalog_csv: Option<PathBuf>,

    #[command(flatten)]
    pub finance: FinanceArgs,

    #[command(flatten)]
    pub embedder: EmbedderArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    #[arg(long, env = "HOMEVERDICT_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    #[arg(long, env = "HOMEVERDICT_MAX_WORKERS", default_value_t = 8)]
    pub max_workers: usize,

    /// Upper bound on `k` accepted by /search.
    #[arg(long, env = "HOMEVERDICT_MAX_TOP_K", default_value_t = 50)]
    pub max_top_k: usize,

    #[command(flatten)]
    pub embedder: EmbedderArgs,

    #[command(flatten)]
    pub generator: GeneratorArgs,
}

#[derive(Args, Debug, Clone)]
pub struct FinanceArgs {
    /// Annual interest rate in percent.
    #[arg(long, env = "HOMEVERDICT_INTEREST_RATE", default_value_t = 8.5)]
    pub interest_rate: f64,

    /// Down payment as a fraction of price.
    #[arg(long, env = "HOMEVERDICT_DOWN_PAYMENT", default_value_t = 0.25)]
    pub down_payment: f64,

    #[arg(long, env = "HOMEVERDICT_TERM_YEARS", default_value_t = 20)]
    pub term_years: u32,

    /// Years over which rent is accumulated.
    #[arg(long, env = "HOMEVERDICT_HORIZON_YEARS", default_value_t = 20)]
    pub horizon_years: u32,

    /// One-time acquisition tax as a fraction of price.
    #[arg(long, env = "HOMEVERDICT_BUY_TAX", default_value_t = 0.15)]
    pub buy_tax: f64,

    /// Rent-side tax in months of rent.
    #[arg(long, env = "HOMEVERDICT_RENT_TAX_MONTHS", default_value_t = 60.0)]
    pub rent_tax_months: f64,
}

impl FinanceArgs {
    pub fn projection_config(&self) -> Result<ProjectionConfig, ValidationError> {
        let cfg = ProjectionConfig {
            annual_interest_rate: self.interest_rate / 100.0,
            down_payment_fraction: self.down_payment,
            loan_term_years: self.term_years,
            horizon_years: self.horizon_years,
            buy_tax_fraction: self.buy_tax,
            rent_tax_months: self.rent_tax_months,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Deterministic local feature hashing; no network.
    Hashing,
    Openai,
}

#[derive(Args, Debug, Clone)]
pub struct EmbedderArgs {
    #[arg(id = "embedder_kind", long = "embedder", env = "HOMEVERDICT_EMBEDDER", value_enum, default_value_t = EmbedderKind::Hashing)]
    pub kind: EmbedderKind,

    #[arg(long, env = "HOMEVERDICT_EMBED_MODEL", default_value = "text-embedding-3-small")]
    pub embed_model: String,

    /// Dimensions for the hashing embedder, or requested dimensions for remote models.
    #[arg(long, env = "HOMEVERDICT_EMBED_DIMENSIONS")]
    pub embed_dimensions: Option<usize>,

    #[arg(long, env = "HOMEVERDICT_EMBED_BATCH", default_value_t = 64)]
    pub embed_batch: usize,

    #[arg(long, env = "HOMEVERDICT_EMBED_ATTEMPTS", default_value_t = 4)]
    pub embed_attempts: usize,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "HOMEVERDICT_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,
}

pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

impl EmbedderArgs {
    pub fn build(&self) -> Result<Arc<dyn Embedder>, EmbedError> {
        match self.kind {
            EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(
                self.embed_dimensions.unwrap_or(DEFAULT_HASHING_DIMENSIONS),
            ))),
            EmbedderKind::Openai => {
                let key = self.openai_api_key.as_deref().unwrap_or_default();
                let embedder = OpenAiEmbedder::new(
                    key,
                    &self.openai_base_url,
                    self.embed_model.clone(),
                    self.embed_dimensions,
                    Duration::from_secs(self.http_timeout_secs),
                    self.embed_attempts,
                    self.embed_batch,
                )?;
                Ok(Arc::new(embedder))
            }
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    /// Restates retrieved facts without calling a model.
    Template,
    Openai,
}

#[derive(Args, Debug, Clone)]
pub struct GeneratorArgs {
    #[arg(id = "generator_kind", long = "generator", env = "HOMEVERDICT_GENERATOR", value_enum, default_value_t = GeneratorKind::Template)]
    pub kind: GeneratorKind,

    #[arg(long, env = "HOMEVERDICT_CHAT_MODEL", default_value = "gpt-4o-mini")]
    pub chat_model: String,

    #[arg(long, env = "HOMEVERDICT_CHAT_TIMEOUT_SECS", default_value_t = 60)]
    pub chat_timeout_secs: u64,
}

impl GeneratorArgs {
    /// The OpenAI generator shares endpoint and key with the embedder.
    pub fn build(&self, embedder: &EmbedderArgs) -> Result<Arc<dyn AnswerGenerator>, GenerateError> {
        match self.kind {
            GeneratorKind::Template => Ok(Arc::new(TemplateGenerator)),
            GeneratorKind::Openai => {
                let key = embedder.openai_api_key.as_deref().unwrap_or_default();
                let generator = OpenAiGenerator::new(
                    key,
                    &embedder.openai_base_url,
                    self.chat_model.clone(),
                    Duration::from_secs(self.chat_timeout_secs),
                )?;
                Ok(Arc::new(generator))
            }
        }
    }
}
