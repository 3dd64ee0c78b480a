// src/advisor/mod.rs
//
// Retrieval-grounded answers for the chat endpoint. The generator is a black
// box; everything it is told comes from the current snapshot.

mod generate_error;
pub mod openai;

pub use generate_error::GenerateError;
pub use openai::OpenAiGenerator;

use crate::catalog::Snapshot;
use crate::embedder::Embedder;
use crate::errors::{QueryError, ServerError};
use crate::query::{self, DEFAULT_TOP_K};
use serde::Serialize;
use std::fmt::Write;
use tracing::{debug, warn};

pub const FALLBACK_ANSWER: &str =
    "I could not reach the advisory service just now. Please try again, or ask about a specific area such as Hebbal or Whitefield.";

/// Turns a fully built prompt into answer text.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Offline generator: restates the facts it was given. Deterministic, so it
/// doubles as the test seam.
pub struct TemplateGenerator;

impl AnswerGenerator for TemplateGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let facts = prompt
            .split(FACTS_HEADER)
            .nth(1)
            .and_then(|rest| rest.split(INSTRUCTIONS_HEADER).next())
            .map(str::trim)
            .unwrap_or_default();
        Ok(format!("Here is what the catalog shows:\n{facts}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorAnswer {
    pub answer: String,
    pub properties_found: Vec<u64>,
}

const FACTS_HEADER: &str = "CATALOG FACTS:";
const INSTRUCTIONS_HEADER: &str = "INSTRUCTIONS:";

/// One line per retrieved record: price text, EMI and verdict.
pub fn facts_block(snapshot: &Snapshot, ids: &[u64]) -> String {
    let mut out = String::new();
    for id in ids {
        let Some(r) = snapshot.catalog.get(*id) else {
            continue;
        };
        let _ = writeln!(
            out,
            "- {} (id {}): listed at {}. Estimated monthly EMI: ₹{:.0}. Verdict: {}.",
            r.listing.display_text(),
            id,
            r.listing.price_raw,
            r.projection.monthly_emi,
            r.decision()
        );
    }
    if out.is_empty() {
        out.push_str("No matching properties were found in the catalog.\n");
    }
    out
}

pub fn build_prompt(question: &str, facts: &str) -> String {
    format!(
        "You are a real estate investment advisor for Bangalore.\n\n\
         USER QUESTION: \"{question}\"\n\n\
         {FACTS_HEADER}\n{facts}\n\
         {INSTRUCTIONS_HEADER}\n\
         1. When catalog facts are listed, quote those exact prices, EMIs and verdicts.\n\
         2. Explain why each BUY or RENT verdict follows from the numbers.\n\
         3. When no facts are listed, give general market advice and say the catalog had no match.\n\
         4. Keep it professional and concise.\n"
    )
}

/// Answers a free-text question from the nearest catalog records.
///
/// Retrieval errors propagate. A failing generator degrades to
/// [`FALLBACK_ANSWER`]; the retrieved ids are still returned.
pub fn answer(
    question: &str,
    snapshot: &Snapshot,
    embedder: &dyn Embedder,
    generator: &dyn AnswerGenerator,
) -> Result<AdvisorAnswer, ServerError> {
    if question.trim().is_empty() {
        return Err(QueryError::new("query", "question is empty").into());
    }

    let k = DEFAULT_TOP_K.min(snapshot.index.len().max(1));
    let neighbors = query::search(snapshot, embedder, question, k as i64, DEFAULT_TOP_K)?;
    let ids: Vec<u64> = neighbors.iter().map(|n| n.id).collect();

    let prompt = build_prompt(question.trim(), &facts_block(snapshot, &ids));
    debug!(retrieved = ids.len(), "advisor prompt built");

    let answer = match generator.generate(&prompt) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            warn!("generator returned an empty answer");
            FALLBACK_ANSWER.to_string()
        }
        Err(e) => {
            warn!(error = %e, "answer generation failed");
            FALLBACK_ANSWER.to_string()
        }
    };

    Ok(AdvisorAnswer {
        answer,
        properties_found: ids,
    })
}
