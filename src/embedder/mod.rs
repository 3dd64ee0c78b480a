mod embed_error;
pub mod hashing;
pub mod openai;

pub use embed_error::EmbedError;
pub use hashing::HashingEmbedder;
pub use openai::OpenAiEmbedder;

/// External text -> vector model. Must be a pure function of its input:
/// the same text always yields the same vector.
pub trait Embedder: Send + Sync {
    /// Identifies the model; an index may only be queried with the model that built it.
    fn model_id(&self) -> &str;

    /// Maximum number of inputs per `embed_batch` call.
    fn batch_size(&self) -> usize;

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn embed_one(&self, input: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_batch(&[input])?
            .pop()
            .ok_or_else(|| EmbedError::UnexpectedShape("no embedding returned".into()))
    }
}

/// Embeds every text in batches. Either all vectors come back or none do.
pub fn embed_all(embedder: &dyn Embedder, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
    let batch = embedder.batch_size().max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch) {
        let inputs: Vec<&str> = chunk.iter().map(String::as_str).collect();
        let embedded = embedder.embed_batch(&inputs)?;
        if embedded.len() != inputs.len() {
            return Err(EmbedError::UnexpectedShape(format!(
                "{} embeddings for {} inputs",
                embedded.len(),
                inputs.len()
            )));
        }
        vectors.extend(embedded);
    }

    Ok(vectors)
}
