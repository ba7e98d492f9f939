//! Pooling over transformer hidden states.

use candle_core::{DType, Tensor};
use vaultdb_core::error::{Error, Result};

fn tensor_err(e: candle_core::Error) -> Error {
    Error::Embedding(format!("tensor op failed: {e}"))
}

/// Masked mean over the token axis followed by L2 normalization.
///
/// `hidden` is `[B, T, H]`, `attention_mask` is `[B, T]`; returns `[B, H]`.
pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    if dims.len() != 3 {
        return Err(Error::Embedding(format!("hidden shape must be [B,T,H], got {dims:?}")));
    }
    let hidden_dim = dims[2];

    let mask = attention_mask
        .to_device(hidden.device())
        .and_then(|m| m.to_dtype(hidden.dtype()))
        .map_err(tensor_err)?;
    let mask_3d = mask.unsqueeze(2).map_err(tensor_err)?;
    let mask_broadcast = mask_3d
        .broadcast_as(hidden.shape())
        .or_else(|_| mask_3d.repeat((1, 1, hidden_dim)))
        .map_err(tensor_err)?;
    let masked = (hidden * &mask_broadcast).map_err(tensor_err)?;
    let sum = masked.sum(1).map_err(tensor_err)?;
    let lengths = mask
        .sum(1)
        .and_then(|t| t.unsqueeze(1))
        .and_then(|t| t.to_dtype(sum.dtype()))
        .map_err(tensor_err)?;
    let mut mean = sum.broadcast_div(&lengths).map_err(tensor_err)?;

    let eps_val = match hidden.dtype() {
        DType::F16 => 1e-6f32,
        _ => 1e-12f32,
    };
    let eps = Tensor::new(&[eps_val], hidden.device())
        .and_then(|t| t.to_dtype(hidden.dtype()))
        .and_then(|t| t.unsqueeze(0))
        .map_err(tensor_err)?;
    let norm = mean
        .sqr()
        .and_then(|t| t.sum_keepdim(1))
        .and_then(|t| t.sqrt())
        .map_err(tensor_err)?;
    let norm = norm.broadcast_add(&eps).map_err(tensor_err)?;
    mean = mean.broadcast_div(&norm).map_err(tensor_err)?;
    Ok(mean)
}
