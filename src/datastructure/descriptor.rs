use crate::error::SiftModuleError;
use crate::Result;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

/// Number of components in a SIFT descriptor.
pub const SIFT_DESCRIPTOR_LENGTH: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorType {
    /// 128 float components.
    Sift,
    /// 128 components quantized to 8 bits.
    SiftUint8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorDataType {
    F32,
    U8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorData {
    F32(Array2<f32>),
    U8(Array2<u8>),
}

/// Packed descriptors, one row per keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorBuffer {
    descriptor_type: DescriptorType,
    data: DescriptorData,
}

impl DescriptorBuffer {
    pub fn from_f32(descriptors: Array2<f32>) -> Result<Self> {
        check_length(descriptors.ncols())?;
        Ok(Self {
            descriptor_type: DescriptorType::Sift,
            data: DescriptorData::F32(descriptors),
        })
    }

    pub fn from_u8(descriptors: Array2<u8>) -> Result<Self> {
        check_length(descriptors.ncols())?;
        Ok(Self {
            descriptor_type: DescriptorType::SiftUint8,
            data: DescriptorData::U8(descriptors),
        })
    }

    pub fn empty(descriptor_type: DescriptorType) -> Self {
        let data = match descriptor_type {
            DescriptorType::Sift => DescriptorData::F32(Array2::zeros((0, SIFT_DESCRIPTOR_LENGTH))),
            DescriptorType::SiftUint8 => DescriptorData::U8(Array2::zeros((0, SIFT_DESCRIPTOR_LENGTH))),
        };
        Self {
            descriptor_type,
            data,
        }
    }

    pub fn descriptor_type(&self) -> DescriptorType {
        self.descriptor_type
    }

    pub fn data_type(&self) -> DescriptorDataType {
        match self.data {
            DescriptorData::F32(_) => DescriptorDataType::F32,
            DescriptorData::U8(_) => DescriptorDataType::U8,
        }
    }

    pub fn data(&self) -> &DescriptorData {
        &self.data
    }

    pub fn nb_descriptors(&self) -> usize {
        match &self.data {
            DescriptorData::F32(rows) => rows.nrows(),
            DescriptorData::U8(rows) => rows.nrows(),
        }
    }

    pub fn descriptor_length(&self) -> usize {
        SIFT_DESCRIPTOR_LENGTH
    }

    pub fn is_empty(&self) -> bool {
        self.nb_descriptors() == 0
    }

    pub fn as_f32(&self) -> Option<ArrayView2<'_, f32>> {
        match &self.data {
            DescriptorData::F32(rows) => Some(rows.view()),
            DescriptorData::U8(_) => None,
        }
    }

    pub fn as_u8(&self) -> Option<ArrayView2<'_, u8>> {
        match &self.data {
            DescriptorData::U8(rows) => Some(rows.view()),
            DescriptorData::F32(_) => None,
        }
    }

    /// Descriptor row `index` widened to floats.
    pub fn row_f32(&self, index: usize) -> Option<Vec<f32>> {
        if index >= self.nb_descriptors() {
            return None;
        }
        Some(match &self.data {
            DescriptorData::F32(rows) => rows.row(index).to_vec(),
            DescriptorData::U8(rows) => rows.row(index).iter().map(|&v| v as f32).collect(),
        })
    }

    /// Re-encodes the buffer; float components saturate into `0..=255`.
    pub fn convert_to(&self, data_type: DescriptorDataType) -> DescriptorBuffer {
        match (&self.data, data_type) {
            (DescriptorData::F32(rows), DescriptorDataType::U8) => DescriptorBuffer {
                descriptor_type: DescriptorType::SiftUint8,
                data: DescriptorData::U8(rows.mapv(|v| v.round().clamp(0.0, 255.0) as u8)),
            },
            (DescriptorData::U8(rows), DescriptorDataType::F32) => DescriptorBuffer {
                descriptor_type: DescriptorType::Sift,
                data: DescriptorData::F32(rows.mapv(|v| v as f32)),
            },
            _ => self.clone(),
        }
    }
}

fn check_length(length: usize) -> Result<()> {
    if length != SIFT_DESCRIPTOR_LENGTH {
        return Err(SiftModuleError::InvalidFeatureSet(format!(
            "descriptor length {} instead of {}",
            length, SIFT_DESCRIPTOR_LENGTH
        ))
        .into());
    }
    Ok(())
}
