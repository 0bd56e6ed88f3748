//! Candle + BGE-small-en-v1.5 backed embedder.
//!
//! Grounded on the teacher's `ob-semantic-matcher::embedder` (same
//! model repo, same CLS-pooling + L2-normalize forward pass). Article
//! bodies have no query/target asymmetry, so this drops the teacher's
//! instruction-prefix split and always embeds as a target.

use std::sync::Arc;

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use geosignal_error::EmbedError;

use crate::Embedder;

const MODEL_REPO: &str = "BAAI/bge-small-en-v1.5";
const EMBEDDING_DIM: usize = 384;

struct Inner {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

pub struct BgeEmbedder {
    inner: Arc<Inner>,
}

impl BgeEmbedder {
    pub fn load() -> Result<Self, EmbedError> {
        Self::load_model(MODEL_REPO)
    }

    pub fn load_model(model_name: &str) -> Result<Self, EmbedError> {
        info!(model_name, "loading embedding model");
        let device = Device::Cpu;

        let api = Api::new().map_err(|e| EmbedError::Model(e.to_string()))?;
        let repo = api.repo(Repo::new(model_name.to_string(), RepoType::Model));

        let config_path = repo
            .get("config.json")
            .map_err(|e| EmbedError::Model(e.to_string()))?;
        let tokenizer_path = repo
            .get("tokenizer.json")
            .map_err(|e| EmbedError::Model(e.to_string()))?;
        let weights_path = repo
            .get("model.safetensors")
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        let config: Config = serde_json::from_str(
            &std::fs::read_to_string(&config_path).map_err(|e| EmbedError::Model(e.to_string()))?,
        )
        .map_err(|e| EmbedError::Model(e.to_string()))?;
        debug!(hidden_size = config.hidden_size, "model config loaded");

        let tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| EmbedError::Model(e.to_string()))?;

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[weights_path], DTYPE, &device)
                .map_err(|e| EmbedError::Model(e.to_string()))?
        };
        let model = BertModel::load(vb, &config).map_err(|e| EmbedError::Model(e.to_string()))?;

        info!("embedding model loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                model,
                tokenizer,
                device,
            }),
        })
    }

    fn forward_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.inner.forward_batch(texts)
    }
}

impl Clone for BgeEmbedder {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl Inner {
    fn forward_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        let max_len = encodings.iter().map(|e| e.get_ids().len()).max().unwrap_or(0);

        let mut all_input_ids = Vec::new();
        let mut all_attention_mask = Vec::new();
        let mut all_token_type_ids = Vec::new();

        for encoding in &encodings {
            let mut ids = encoding.get_ids().to_vec();
            let mut attention = encoding.get_attention_mask().to_vec();
            let mut type_ids = encoding.get_type_ids().to_vec();

            ids.resize(max_len, 0);
            attention.resize(max_len, 0);
            type_ids.resize(max_len, 0);

            all_input_ids.extend(ids);
            all_attention_mask.extend(attention);
            all_token_type_ids.extend(type_ids);
        }

        let batch_size = texts.len();
        let to_tensor = |data: Vec<u32>| -> Result<Tensor, EmbedError> {
            Tensor::from_vec(data, (batch_size, max_len), &self.device)
                .map_err(|e| EmbedError::Model(e.to_string()))
        };

        let input_ids = to_tensor(all_input_ids)?.to_dtype(DType::U32).map_err(|e| EmbedError::Model(e.to_string()))?;
        let attention_mask = to_tensor(all_attention_mask)?;
        let token_type_ids = to_tensor(all_token_type_ids)?.to_dtype(DType::U32).map_err(|e| EmbedError::Model(e.to_string()))?;

        let output = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        // CLS pooling, matching the teacher's BGE embedder.
        let cls = output
            .narrow(1, 0, 1)
            .and_then(|t| t.squeeze(1))
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        let norm = cls
            .sqr()
            .and_then(|t| t.sum_keepdim(1))
            .and_then(|t| t.sqrt())
            .and_then(|t| t.clamp(1e-12, f64::MAX))
            .map_err(|e| EmbedError::Model(e.to_string()))?;
        let normalized = cls
            .broadcast_div(&norm)
            .map_err(|e| EmbedError::Model(e.to_string()))?;

        normalized
            .to_vec2::<f32>()
            .map_err(|e| EmbedError::Model(e.to_string()))
    }
}

#[async_trait]
impl Embedder for BgeEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        // candle forward passes are CPU-bound and synchronous; run them
        // on the blocking pool so they don't starve the cooperative
        // scheduler.
        let inner = Arc::clone(&self.inner);
        let owned: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = owned.iter().map(String::as_str).collect();
            inner.forward_batch(&refs)
        })
        .await
        .map_err(|e| EmbedError::Model(e.to_string()))?
    }

    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // requires a model download
    fn loads_and_embeds() {
        let embedder = BgeEmbedder::load().expect("load embedder");
        let vectors = embedder.forward_batch(&["a quiet morning in the capital"]).unwrap();
        assert_eq!(vectors[0].len(), EMBEDDING_DIM);
    }
}
