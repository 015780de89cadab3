//! ROI masking of volumes

use ndarray::{Array3, ArrayView3, Zip};

use crate::error::{StatsError, StatsResult};
use crate::is_active;

/// Keep `data` where `mask` is active, NaN everywhere else
///
/// Both arrays must have the same shape.
pub fn data_mask(data: ArrayView3<f64>, mask: ArrayView3<f64>) -> StatsResult<Array3<f64>> {
    if data.shape() != mask.shape() {
        return Err(StatsError::shape_mismatch(data.shape(), mask.shape()));
    }

    let mut out = Array3::from_elem(data.raw_dim(), f64::NAN);
    Zip::from(&mut out)
        .and(&data)
        .and(&mask)
        .for_each(|o, &d, &m| {
            if is_active(m) {
                *o = d;
            }
        });

    Ok(out)
}
