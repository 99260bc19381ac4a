use crate::datastructure::SIFT_DESCRIPTOR_LENGTH;
use crate::error::SiftModuleError;
use crate::Result;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

/// Most orientations the engine assigns to one extremum.
pub const MAX_ORIENTATIONS: usize = 4;

/// One detected extremum with its dominant orientations (radians).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub x: f32,
    pub y: f32,
    pub sigma: f32,
    pub orientations: Vec<f32>,
}

impl Feature {
    pub fn num_ori(&self) -> usize {
        self.orientations.len()
    }
}

/// Result of one engine job.
///
/// Descriptor rows are laid out feature by feature, one row per orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    features: Vec<Feature>,
    descriptors: Array2<f32>,
    offsets: Vec<usize>,
}

impl FeatureSet {
    pub fn new(features: Vec<Feature>, descriptors: Array2<f32>) -> Result<Self> {
        if descriptors.ncols() != SIFT_DESCRIPTOR_LENGTH {
            return Err(SiftModuleError::InvalidFeatureSet(format!(
                "descriptor length {} instead of {}",
                descriptors.ncols(),
                SIFT_DESCRIPTOR_LENGTH
            ))
            .into());
        }

        let mut offsets = Vec::with_capacity(features.len());
        let mut total = 0;
        for (index, feature) in features.iter().enumerate() {
            if feature.num_ori() == 0 || feature.num_ori() > MAX_ORIENTATIONS {
                return Err(SiftModuleError::InvalidFeatureSet(format!(
                    "feature {} has {} orientations",
                    index,
                    feature.num_ori()
                ))
                .into());
            }
            offsets.push(total);
            total += feature.num_ori();
        }

        if total != descriptors.nrows() {
            return Err(SiftModuleError::InvalidFeatureSet(format!(
                "{} orientations but {} descriptor rows",
                total,
                descriptors.nrows()
            ))
            .into());
        }

        Ok(Self {
            features,
            descriptors,
            offsets,
        })
    }

    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
            descriptors: Array2::zeros((0, SIFT_DESCRIPTOR_LENGTH)),
            offsets: Vec::new(),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.nrows()
    }

    pub fn descriptors(&self) -> ArrayView2<'_, f32> {
        self.descriptors.view()
    }

    pub fn descriptors_mut(&mut self) -> &mut Array2<f32> {
        &mut self.descriptors
    }

    pub fn into_descriptors(self) -> Array2<f32> {
        self.descriptors
    }

    /// Row of the first descriptor of feature `index`.
    pub fn descriptor_offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    pub fn descriptor(&self, row: usize) -> ArrayView1<'_, f32> {
        self.descriptors.row(row)
    }

    /// Each feature paired with the descriptor rows of its orientations.
    pub fn iter(&self) -> impl Iterator<Item = (&Feature, ArrayView2<'_, f32>)> + '_ {
        self.features.iter().zip(self.offsets.iter()).map(move |(feature, &offset)| {
            (
                feature,
                self.descriptors
                    .slice(ndarray::s![offset..offset + feature.num_ori(), ..]),
            )
        })
    }

    /// Keeps at most `max` features, largest sigma first.
    pub fn retain_largest_scale_first(self, max: usize) -> Result<Self> {
        let mut order: Vec<usize> = (0..self.features.len()).collect();
        order.sort_by(|&a, &b| {
            self.features[b]
                .sigma
                .partial_cmp(&self.features[a].sigma)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(max);

        let mut rows = Vec::new();
        let mut features = Vec::with_capacity(order.len());
        for index in order {
            let offset = self.offsets[index];
            rows.extend(offset..offset + self.features[index].num_ori());
            features.push(self.features[index].clone());
        }

        let descriptors = self.descriptors.select(Axis(0), &rows);
        Self::new(features, descriptors)
    }
}
