#![cfg(feature = "backend-tract")]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::frame::Frame;
use crate::infer::age::{estimate_from_scores, AgeEstimate, AGE_BUCKETS};
use crate::infer::backend::InferenceBackend;

/// Model input edge length. The age net takes square 227x227 crops.
const INPUT_SIZE: usize = 227;

/// Per-channel means subtracted before inference, in the model's BGR channel
/// order. These are the training-set means the published age net expects.
const CHANNEL_MEANS: [f32; 3] = [78.4263377603, 87.7689143744, 114.895847746];

/// Tract-based age classifier over a local ONNX model.
///
/// The model file is loaded in `warm_up`, on the worker thread, so a missing
/// or corrupt model disables the age stage without touching the rest of the
/// pipeline. Inference resizes the incoming face crop to the model's square
/// input, subtracts channel means, and gates the winning bucket on the
/// confidence threshold.
pub struct AgeNetBackend {
    model_path: PathBuf,
    confidence_threshold: f32,
    model: Option<SimplePlan<TypedFact, Box<dyn TypedOp>>>,
}

impl AgeNetBackend {
    pub fn new<P: AsRef<Path>>(model_path: P, confidence_threshold: f32) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            confidence_threshold,
            model: None,
        }
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(anyhow!("empty face crop"));
        }

        let pixels = frame.pixels();
        let src_w = frame.width() as usize;
        let src_h = frame.height() as usize;

        // Nearest-neighbour resize into NCHW planes. The model wants BGR, the
        // frame is RGB, so channel 0 reads the blue byte and channel 2 the
        // red one.
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, INPUT_SIZE, INPUT_SIZE),
            |(_, channel, y, x)| {
                let src_x = x * src_w / INPUT_SIZE;
                let src_y = y * src_h / INPUT_SIZE;
                let idx = (src_y * src_w + src_x) * 3;
                let byte = match channel {
                    0 => pixels[idx + 2],
                    1 => pixels[idx + 1],
                    _ => pixels[idx],
                };
                byte as f32 - CHANNEL_MEANS[channel]
            },
        );

        Ok(input.into_tensor())
    }

    fn extract_scores(&self, outputs: TVec<Tensor>) -> Result<Vec<f32>> {
        let output = outputs
            .get(0)
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let scores: Vec<f32> = scores.iter().copied().collect();
        if scores.len() != AGE_BUCKETS.len() {
            return Err(anyhow!(
                "expected {} bucket scores, model produced {}",
                AGE_BUCKETS.len(),
                scores.len()
            ));
        }
        Ok(scores)
    }
}

impl InferenceBackend for AgeNetBackend {
    type Output = AgeEstimate;

    fn name(&self) -> &'static str {
        "agenet"
    }

    fn warm_up(&mut self) -> Result<()> {
        let model = tract_onnx::onnx()
            .model_for_path(&self.model_path)
            .with_context(|| {
                format!(
                    "failed to load ONNX model from {}",
                    self.model_path.display()
                )
            })?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, INPUT_SIZE, INPUT_SIZE)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        self.model = Some(model);
        log::info!("agenet: model loaded from {}", self.model_path.display());
        Ok(())
    }

    fn infer(&mut self, frame: &Frame) -> Result<Option<AgeEstimate>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("agenet model not warmed up"))?;
        let input = self.build_input(frame)?;
        let outputs = model.run(tvec!(input)).context("age inference failed")?;
        let scores = self.extract_scores(outputs)?;
        Ok(estimate_from_scores(&scores, self.confidence_threshold))
    }
}
