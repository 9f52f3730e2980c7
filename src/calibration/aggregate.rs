//! Replicate aggregation per calibration level
//!
//! Groups calibration points by their exact level, optionally rejects
//! outliers inside each group, and reduces every group to a single
//! representative value.

use serde::{Deserialize, Serialize};

use super::point::CalibrationPoint;
use super::stats;
use crate::constants::outliers::{
    GRUBBS_MIN_GROUP, GRUBBS_THRESHOLD, IQR_FENCE, IQR_MIN_GROUP,
};

/// Outlier rejection applied inside each level group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutlierPolicy {
    #[default]
    None,
    /// Tukey fences at 1.5 IQR, groups of four or more
    Iqr,
    /// Single-outlier normalized deviation test, groups of three or more
    Grubbs,
}

/// Reduction of a group to one representative value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CentralTendency {
    #[default]
    Mean,
    Median,
    TrimmedMean,
}

/// One aggregated calibration level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelGroup {
    pub level: f64,
    /// Representative value after outlier rejection
    pub value: f64,
    /// Raw metric values of the group, in input order
    pub values: Vec<f64>,
    /// Values that survived outlier rejection
    pub kept: Vec<f64>,
}

impl LevelGroup {
    /// Number of raw replicates
    pub fn n(&self) -> usize {
        self.values.len()
    }

    /// Population standard deviation of the raw replicates
    pub fn std_dev(&self) -> f64 {
        stats::std_dev(&self.values)
    }
}

/// Aggregate `(point, metric value)` pairs into sorted level groups
///
/// Points that are excluded or have no finite level are skipped.
pub fn aggregate<'a, I>(
    points: I,
    policy: OutlierPolicy,
    tendency: CentralTendency,
) -> Vec<LevelGroup>
where
    I: IntoIterator<Item = (&'a CalibrationPoint, f64)>,
{
    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for (point, value) in points {
        if !point.is_usable() {
            continue;
        }
        let Some(level) = point.level else { continue };
        match groups.iter_mut().find(|(l, _)| *l == level) {
            Some((_, values)) => values.push(value),
            None => groups.push((level, vec![value])),
        }
    }
    groups.sort_by(|a, b| a.0.total_cmp(&b.0));

    groups
        .into_iter()
        .map(|(level, values)| {
            let kept = reject_outliers(&values, policy);
            let value = reduce(&kept, tendency);
            LevelGroup {
                level,
                value,
                values,
                kept,
            }
        })
        .collect()
}

/// Apply the outlier policy to one group
pub fn reject_outliers(values: &[f64], policy: OutlierPolicy) -> Vec<f64> {
    match policy {
        OutlierPolicy::None => values.to_vec(),
        OutlierPolicy::Iqr if values.len() >= IQR_MIN_GROUP => {
            let sorted = stats::sorted(values);
            let n = sorted.len();
            let q1 = sorted[((n - 1) as f64 * 0.25).floor() as usize];
            let q3 = sorted[((n - 1) as f64 * 0.75).floor() as usize];
            let iqr = q3 - q1;
            let (lo, hi) = (q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr);
            values
                .iter()
                .copied()
                .filter(|v| *v >= lo && *v <= hi)
                .collect()
        }
        OutlierPolicy::Grubbs if values.len() >= GRUBBS_MIN_GROUP => {
            let mut out = values.to_vec();
            let m = stats::mean(values);
            let s = stats::std_dev(values);
            if s > 0.0 {
                let mut worst = 0;
                let mut worst_z = f64::NEG_INFINITY;
                for (i, v) in values.iter().enumerate() {
                    let z = (v - m).abs() / s;
                    if z > worst_z {
                        worst = i;
                        worst_z = z;
                    }
                }
                if worst_z > GRUBBS_THRESHOLD {
                    out.remove(worst);
                }
            }
            out
        }
        // below the policy's minimum group size
        _ => values.to_vec(),
    }
}

fn reduce(values: &[f64], tendency: CentralTendency) -> f64 {
    match tendency {
        CentralTendency::Mean => stats::mean(values),
        CentralTendency::Median => stats::median(values),
        CentralTendency::TrimmedMean => stats::trimmed_mean(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn points(levels_values: &[(Option<f64>, f64)]) -> Vec<(CalibrationPoint, f64)> {
        levels_values
            .iter()
            .map(|(level, value)| {
                let mut p = CalibrationPoint::new("mg/L");
                p.level = *level;
                (p, *value)
            })
            .collect()
    }

    fn run(
        data: &[(CalibrationPoint, f64)],
        policy: OutlierPolicy,
        tendency: CentralTendency,
    ) -> Vec<LevelGroup> {
        aggregate(data.iter().map(|(p, v)| (p, *v)), policy, tendency)
    }

    #[test]
    fn test_groups_sorted_and_unlevelled_skipped() {
        let data = points(&[
            (Some(10.0), 90.0),
            (None, 1000.0),
            (Some(0.0), 10.0),
            (Some(10.0), 92.0),
            (Some(5.0), 50.0),
        ]);
        let groups = run(&data, OutlierPolicy::None, CentralTendency::Mean);
        let levels: Vec<f64> = groups.iter().map(|g| g.level).collect();
        assert_eq!(levels, vec![0.0, 5.0, 10.0]);
        assert_relative_eq!(groups[2].value, 91.0);
        assert_eq!(groups[2].n(), 2);
    }

    #[test]
    fn test_excluded_points_skipped() {
        let mut data = points(&[(Some(1.0), 1.0), (Some(1.0), 3.0)]);
        data[1].0.include = false;
        let groups = run(&data, OutlierPolicy::None, CentralTendency::Mean);
        assert_eq!(groups[0].values, vec![1.0]);
    }

    #[test]
    fn test_iqr_inactive_below_four() {
        let values = [1.0, 2.0, 1000.0];
        assert_eq!(reject_outliers(&values, OutlierPolicy::Iqr), values.to_vec());
    }

    #[test]
    fn test_iqr_drops_far_value() {
        let values = [10.0, 11.0, 10.5, 10.2, 50.0];
        let kept = reject_outliers(&values, OutlierPolicy::Iqr);
        assert_eq!(kept, vec![10.0, 11.0, 10.5, 10.2]);
    }

    #[test]
    fn test_grubbs_drops_single_outlier() {
        let values = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 30.0];
        let kept = reject_outliers(&values, OutlierPolicy::Grubbs);
        assert_eq!(kept.len(), 6);
        assert!(kept.iter().all(|v| *v == 10.0));
    }

    #[test]
    fn test_grubbs_keeps_tight_group() {
        // max z of three values never exceeds sqrt(2)
        let values = [1.0, 2.0, 100.0];
        assert_eq!(reject_outliers(&values, OutlierPolicy::Grubbs).len(), 3);
    }

    #[test]
    fn test_grubbs_zero_variance() {
        let values = [4.0, 4.0, 4.0];
        assert_eq!(reject_outliers(&values, OutlierPolicy::Grubbs), values.to_vec());
    }

    #[test]
    fn test_median_and_trimmed_reduction() {
        let data = points(&[
            (Some(1.0), 1.0),
            (Some(1.0), 2.0),
            (Some(1.0), 3.0),
            (Some(1.0), 10.0),
        ]);
        let median = run(&data, OutlierPolicy::None, CentralTendency::Median);
        assert_relative_eq!(median[0].value, 2.5);

        let trimmed = run(&data, OutlierPolicy::None, CentralTendency::TrimmedMean);
        assert_relative_eq!(trimmed[0].value, 4.0);
    }

    #[test]
    fn test_raw_values_kept_for_reporting() {
        let data = points(&[
            (Some(2.0), 10.0),
            (Some(2.0), 11.0),
            (Some(2.0), 10.5),
            (Some(2.0), 10.2),
            (Some(2.0), 50.0),
        ]);
        let groups = run(&data, OutlierPolicy::Iqr, CentralTendency::Mean);
        assert_eq!(groups[0].values.len(), 5);
        assert_eq!(groups[0].kept.len(), 4);
        assert_relative_eq!(groups[0].value, 10.425);
    }
}
