use ndarray::Array4;
use ort::{inputs, session::Session, value::Tensor};

use crate::error::{Error, Result};

/// 运行模型推理
///
/// 使用ONNX模型对输入张量进行推理，返回各类别的得分。
///
/// # 参数
/// * `model` - ONNX模型Session
/// * `input` - 输入张量，形状为(1, h, w, 3)或(1, 3, h, w)
///
/// # 返回值
/// 返回长度为类别数的得分向量
///
/// # 错误处理
/// 推理失败或输出形状不是(1, num_classes)时返回Err
pub fn run_inference(model: &mut Session, input: &Array4<f32>) -> Result<Vec<f32>> {
    let shape: Vec<usize> = input.shape().to_vec();
    let (data, _offset) = input.as_standard_layout().into_owned().into_raw_vec_and_offset();
    let input_tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;
    let outputs = model.run(inputs![input_tensor])?;

    let (shape, scores) = outputs[0].try_extract_tensor::<f32>()?;

    // 分类模型输出形状为 [1, num_classes]
    if shape.len() != 2 || shape[0] != 1 {
        return Err(Error::ModelOutput(format!("输出形状 {:?}，期望 [1, num_classes]", shape)));
    }

    Ok(scores.to_vec())
}
