use candle_core::{Device, Tensor};
use tokenizers::Encoding;
use vaultdb_core::error::{Error, Result};

/// Pad or truncate an encoding to `max_len` and lift ids + attention mask
/// onto the device as `[1, max_len]` tensors.
pub fn encode_padded(enc: &Encoding, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let tensor_err = |e: candle_core::Error| Error::Embedding(format!("tensor op failed: {e}"));
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len {
        ids.truncate(max_len);
        mask.truncate(max_len);
    }
    if ids.len() < max_len {
        let pad = max_len - ids.len();
        ids.extend(std::iter::repeat(1).take(pad));
        mask.extend(std::iter::repeat(0).take(pad));
    }
    let input_ids = Tensor::from_iter(ids, device)
        .and_then(|t| t.reshape((1, max_len)))
        .map_err(tensor_err)?;
    let attention_mask = Tensor::from_iter(mask, device)
        .and_then(|t| t.reshape((1, max_len)))
        .map_err(tensor_err)?;
    Ok((input_ids, attention_mask))
}
