//! Quantized causal-transformer forward pass returning hidden states.
//!
//! Embedding checkpoints of the Qwen2 family ship as GGUF; the stock
//! implementations return logits, but embedding extraction needs the
//! final hidden states, so the forward pass stops after the output norm.

use std::fs::File;
use std::sync::Arc;

use candle_core::quantized::{QMatMul, gguf_file};
use candle_core::{D, Device, Module, Result, Tensor};
use candle_nn::RmsNorm;

/// Architecture parameters read from GGUF metadata.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub hidden_size: usize,
    pub num_layers: usize,
    pub num_heads: usize,
    pub num_kv_heads: usize,
    pub head_dim: usize,
    pub rms_norm_eps: f64,
    pub rope_theta: f64,
    pub max_seq_len: usize,
}

impl DecoderConfig {
    fn from_gguf(content: &gguf_file::Content) -> Result<Self> {
        let get_u64 = |key: &str, default: u64| -> u64 {
            content
                .metadata
                .get(key)
                .and_then(|v| v.to_u64().ok())
                .unwrap_or(default)
        };

        let get_f64 = |key: &str, default: f64| -> f64 {
            content
                .metadata
                .get(key)
                .and_then(|v| v.to_f64().ok())
                .unwrap_or(default)
        };

        let hidden_size = get_u64("qwen2.embedding_length", 1024) as usize;
        let num_heads = get_u64("qwen2.attention.head_count", 16) as usize;

        Ok(Self {
            hidden_size,
            num_layers: get_u64("qwen2.block_count", 24) as usize,
            num_heads,
            num_kv_heads: get_u64("qwen2.attention.head_count_kv", 8) as usize,
            head_dim: hidden_size / num_heads,
            rms_norm_eps: get_f64("qwen2.attention.layer_norm_rms_epsilon", 1e-6),
            rope_theta: get_f64("qwen2.rope.freq_base", 1_000_000.0),
            max_seq_len: get_u64("qwen2.context_length", 32768) as usize,
        })
    }
}

fn load_qmatmul(
    content: &gguf_file::Content,
    file: &mut File,
    name: &str,
    device: &Device,
) -> Result<QMatMul> {
    let qtensor = content.tensor(file, name, device)?;
    QMatMul::from_arc(Arc::new(qtensor))
}

fn load_rms_norm(
    content: &gguf_file::Content,
    file: &mut File,
    name: &str,
    device: &Device,
    eps: f64,
) -> Result<RmsNorm> {
    let weight = content.tensor(file, name, device)?.dequantize(device)?;
    Ok(RmsNorm::new(weight, eps))
}

fn load_optional_bias(
    content: &gguf_file::Content,
    file: &mut File,
    name: &str,
    device: &Device,
) -> Option<Tensor> {
    content
        .tensor(file, name, device)
        .ok()
        .and_then(|qt| qt.dequantize(device).ok())
}

/// Precomputed rotary position tables.
struct Rotary {
    cos: Tensor,
    sin: Tensor,
}

impl Rotary {
    fn new(config: &DecoderConfig, max_seq_len: usize, device: &Device) -> Result<Self> {
        let half_dim = config.head_dim / 2;
        let inv_freq: Vec<f32> = (0..half_dim)
            .map(|i| 1.0 / (config.rope_theta as f32).powf((2 * i) as f32 / config.head_dim as f32))
            .collect();

        let inv_freq = Tensor::new(inv_freq, device)?;
        let positions: Vec<f32> = (0..max_seq_len).map(|p| p as f32).collect();
        let positions = Tensor::new(positions, device)?;

        let freqs = positions.unsqueeze(1)?.matmul(&inv_freq.unsqueeze(0)?)?;
        let freqs = Tensor::cat(&[&freqs, &freqs], D::Minus1)?;

        Ok(Self {
            cos: freqs.cos()?,
            sin: freqs.sin()?,
        })
    }

    fn apply(&self, x: &Tensor) -> Result<Tensor> {
        let (_batch, _heads, seq_len, head_dim) = x.dims4()?;

        let cos = self.cos.narrow(0, 0, seq_len)?.unsqueeze(0)?.unsqueeze(0)?;
        let sin = self.sin.narrow(0, 0, seq_len)?.unsqueeze(0)?.unsqueeze(0)?;

        let half = head_dim / 2;
        let x1 = x.narrow(D::Minus1, 0, half)?;
        let x2 = x.narrow(D::Minus1, half, half)?;
        let rotated = Tensor::cat(&[&x2.neg()?, &x1], D::Minus1)?;

        (x.broadcast_mul(&cos)? + rotated.broadcast_mul(&sin)?)
    }
}

/// One decoder block: pre-norm attention plus pre-norm SwiGLU MLP.
struct DecoderBlock {
    attn_q: QMatMul,
    attn_k: QMatMul,
    attn_v: QMatMul,
    attn_o: QMatMul,
    attn_q_bias: Option<Tensor>,
    attn_k_bias: Option<Tensor>,
    attn_v_bias: Option<Tensor>,
    attn_norm: RmsNorm,
    ffn_norm: RmsNorm,
    ffn_gate: QMatMul,
    ffn_up: QMatMul,
    ffn_down: QMatMul,
    num_heads: usize,
    num_kv_heads: usize,
    head_dim: usize,
}

impl DecoderBlock {
    fn load(
        content: &gguf_file::Content,
        file: &mut File,
        device: &Device,
        config: &DecoderConfig,
        layer_idx: usize,
    ) -> Result<Self> {
        let p = format!("blk.{layer_idx}");

        Ok(Self {
            attn_q: load_qmatmul(content, file, &format!("{p}.attn_q.weight"), device)?,
            attn_k: load_qmatmul(content, file, &format!("{p}.attn_k.weight"), device)?,
            attn_v: load_qmatmul(content, file, &format!("{p}.attn_v.weight"), device)?,
            attn_o: load_qmatmul(content, file, &format!("{p}.attn_output.weight"), device)?,
            attn_q_bias: load_optional_bias(content, file, &format!("{p}.attn_q.bias"), device),
            attn_k_bias: load_optional_bias(content, file, &format!("{p}.attn_k.bias"), device),
            attn_v_bias: load_optional_bias(content, file, &format!("{p}.attn_v.bias"), device),
            attn_norm: load_rms_norm(
                content,
                file,
                &format!("{p}.attn_norm.weight"),
                device,
                config.rms_norm_eps,
            )?,
            ffn_norm: load_rms_norm(
                content,
                file,
                &format!("{p}.ffn_norm.weight"),
                device,
                config.rms_norm_eps,
            )?,
            ffn_gate: load_qmatmul(content, file, &format!("{p}.ffn_gate.weight"), device)?,
            ffn_up: load_qmatmul(content, file, &format!("{p}.ffn_up.weight"), device)?,
            ffn_down: load_qmatmul(content, file, &format!("{p}.ffn_down.weight"), device)?,
            num_heads: config.num_heads,
            num_kv_heads: config.num_kv_heads,
            head_dim: config.head_dim,
        })
    }

    fn forward(&self, x: &Tensor, mask: &Tensor, rope: &Rotary) -> Result<Tensor> {
        let residual = x;
        let h = self.attn_norm.forward(x)?;
        let h = self.attention(&h, mask, rope)?;
        let x = (residual + h)?;

        let residual = &x;
        let h = self.ffn_norm.forward(&x)?;
        let gate = self.ffn_gate.forward(&h)?;
        let up = self.ffn_up.forward(&h)?;
        let h = (candle_nn::ops::silu(&gate)? * up)?;
        let h = self.ffn_down.forward(&h)?;

        residual + h
    }

    fn attention(&self, x: &Tensor, mask: &Tensor, rope: &Rotary) -> Result<Tensor> {
        let (batch, seq_len, _hidden) = x.dims3()?;

        let mut q = self.attn_q.forward(x)?;
        let mut k = self.attn_k.forward(x)?;
        let mut v = self.attn_v.forward(x)?;

        if let Some(ref bias) = self.attn_q_bias {
            q = q.broadcast_add(bias)?;
        }
        if let Some(ref bias) = self.attn_k_bias {
            k = k.broadcast_add(bias)?;
        }
        if let Some(ref bias) = self.attn_v_bias {
            v = v.broadcast_add(bias)?;
        }

        let q = q
            .reshape((batch, seq_len, self.num_heads, self.head_dim))?
            .transpose(1, 2)?;
        let k = k
            .reshape((batch, seq_len, self.num_kv_heads, self.head_dim))?
            .transpose(1, 2)?;
        let v = v
            .reshape((batch, seq_len, self.num_kv_heads, self.head_dim))?
            .transpose(1, 2)?;

        let q = rope.apply(&q)?;
        let k = rope.apply(&k)?;

        // Grouped-query attention: expand KV heads to match query heads.
        let k = self.repeat_kv(k)?;
        let v = self.repeat_kv(v)?;

        let scale = 1.0 / (self.head_dim as f64).sqrt();
        let attn = (q.matmul(&k.transpose(D::Minus2, D::Minus1)?)? * scale)?;
        let attn = attn.broadcast_add(mask)?;
        let attn = candle_nn::ops::softmax_last_dim(&attn)?;
        let out = attn.matmul(&v)?;

        let out = out
            .transpose(1, 2)?
            .reshape((batch, seq_len, self.num_heads * self.head_dim))?;

        self.attn_o.forward(&out)
    }

    fn repeat_kv(&self, x: Tensor) -> Result<Tensor> {
        let n_rep = self.num_heads / self.num_kv_heads;
        if n_rep == 1 {
            return Ok(x);
        }
        let (batch, num_kv_heads, seq_len, head_dim) = x.dims4()?;
        x.unsqueeze(2)?
            .expand((batch, num_kv_heads, n_rep, seq_len, head_dim))?
            .reshape((batch, num_kv_heads * n_rep, seq_len, head_dim))
    }
}

/// Decoder stack that stops before the LM head.
pub struct EmbeddingDecoder {
    tok_embeddings: Tensor,
    blocks: Vec<DecoderBlock>,
    output_norm: RmsNorm,
    rope: Rotary,
    config: DecoderConfig,
    device: Device,
}

impl EmbeddingDecoder {
    /// Loads the decoder from GGUF content.
    pub fn from_gguf(
        content: gguf_file::Content,
        file: &mut File,
        device: &Device,
        max_seq_len: usize,
    ) -> Result<Self> {
        let config = DecoderConfig::from_gguf(&content)?;

        let tok_embeddings = content
            .tensor(file, "token_embd.weight", device)?
            .dequantize(device)?;

        let mut blocks = Vec::with_capacity(config.num_layers);
        for layer_idx in 0..config.num_layers {
            blocks.push(DecoderBlock::load(&content, file, device, &config, layer_idx)?);
        }

        let output_norm = load_rms_norm(
            &content,
            file,
            "output_norm.weight",
            device,
            config.rms_norm_eps,
        )?;

        let rope = Rotary::new(&config, max_seq_len.min(config.max_seq_len), device)?;

        Ok(Self {
            tok_embeddings,
            blocks,
            output_norm,
            rope,
            config,
            device: device.clone(),
        })
    }

    /// Runs the forward pass; returns `[batch, seq_len, hidden_size]`.
    pub fn forward(&self, input_ids: &Tensor) -> Result<Tensor> {
        let (batch, seq_len) = input_ids.dims2()?;
        let flat_ids = input_ids.flatten_all()?;
        let mut hidden = self.tok_embeddings.index_select(&flat_ids, 0)?;
        hidden = hidden.reshape((batch, seq_len, self.config.hidden_size))?;

        let mask = self.causal_mask(seq_len)?;

        for block in &self.blocks {
            hidden = block.forward(&hidden, &mask, &self.rope)?;
        }

        self.output_norm.forward(&hidden)
    }

    fn causal_mask(&self, seq_len: usize) -> Result<Tensor> {
        let mask: Vec<f32> = (0..seq_len)
            .flat_map(|i| (0..seq_len).map(move |j| if j <= i { 0.0 } else { f32::NEG_INFINITY }))
            .collect();

        Tensor::from_vec(mask, (1, 1, seq_len, seq_len), &self.device)
    }

    /// Returns the architecture parameters.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}
