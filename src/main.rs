use crate::catalog::CatalogHandle;
use crate::config::{BuildArgs, Cli, Command, ServeArgs};
use crate::db::Database;
use crate::query::SemanticIndex;
use crate::responses::error_to_response;
use crate::router::{handle, AppState};
use astra::Server;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod advisor;
mod catalog;
mod config;
mod db;
mod domain;
mod embedder;
mod errors;
mod ingest;
mod query;
mod responses;
mod router;
mod spreadsheets;

#[cfg(test)]
mod tests;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match cli.command {
        Command::Build(args) => run_build(&args),
        Command::Serve(args) => run_serve(&args),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run_build(args: &BuildArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = args.finance.projection_config()?;
    let embedder = args.embedder.build()?;

    let (listings, listing_report) = ingest::read_listings(&args.listings)?;
    listing_report.log_summary("listings");
    let (comparables, rental_report) = ingest::read_comparables(&args.rentals)?;
    rental_report.log_summary("rental comparables");

    let output = domain::pipeline::run(listings, &comparables, &cfg);
    output.report.log_summary();
    let catalog = output.catalog;
    if catalog.is_empty() {
        warn!("no listing could be enriched; writing an empty catalog");
    }

    if let Some(path) = &args.catalog_csv {
        let file = File::create(path)?;
        catalog.write_csv(BufWriter::new(file))?;
        info!(path = %path.display(), "catalog CSV written");
    }

    let index = SemanticIndex::build(&catalog, embedder.as_ref())?;

    let db = Database::new(&args.artifacts.db);
    db::save_artifacts(&db, &args.artifacts.index, &catalog, &index)?;

    info!(
        records = catalog.len(),
        fingerprint = catalog.fingerprint(),
        "build finished"
    );
    Ok(())
}

fn run_serve(args: &ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let embedder = args.embedder.build()?;
    let generator = args.generator.build(&args.embedder)?;

    let (catalog, index) =
        db::load_artifacts(&args.artifacts.db, &args.artifacts.index, embedder.model_id())?;

    let state = AppState {
        catalog: CatalogHandle::new(catalog, index),
        embedder,
        generator,
        db_path: args.artifacts.db.clone(),
        index_path: args.artifacts.index.clone(),
        max_top_k: args.max_top_k,
    };

    info!(addr = %args.bind, workers = args.max_workers, "starting server");
    let server = Server::bind(&args.bind).max_workers(args.max_workers);

    server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    })?;

    info!("server shut down cleanly");
    Ok(())
}
