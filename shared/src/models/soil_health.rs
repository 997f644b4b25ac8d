//! Soil health categories and advice

use serde::{Deserialize, Serialize};

/// Ordered soil health categories, worst first
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    #[serde(rename = "Poor")]
    Poor,
    #[serde(rename = "Below Average")]
    BelowAverage,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Excellent")]
    Excellent,
}

impl HealthStatus {
    /// All categories in ascending order of soil health
    pub const ALL: [HealthStatus; 5] = [
        HealthStatus::Poor,
        HealthStatus::BelowAverage,
        HealthStatus::Average,
        HealthStatus::Good,
        HealthStatus::Excellent,
    ];

    /// Management advice for soils in this category
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            HealthStatus::Poor => &[
                "Add organic matter through compost or farmyard manure",
                "Consider soil testing for micronutrient deficiencies",
                "Implement crop rotation with legumes",
                "Use balanced NPK fertilizers",
            ],
            HealthStatus::BelowAverage => &[
                "Increase organic matter content",
                "Apply balanced fertilizers based on soil test",
                "Consider green manuring",
                "Monitor soil pH levels",
            ],
            HealthStatus::Average => &[
                "Maintain current soil management practices",
                "Regular soil testing every 2-3 years",
                "Continue organic matter addition",
                "Optimize fertilizer application timing",
            ],
            HealthStatus::Good => &[
                "Continue current practices",
                "Focus on sustainable farming methods",
                "Consider precision agriculture techniques",
                "Monitor for any nutrient imbalances",
            ],
            HealthStatus::Excellent => &[
                "Maintain excellent soil health",
                "Share best practices with other farmers",
                "Consider reducing fertilizer inputs",
                "Focus on soil conservation",
            ],
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Poor => write!(f, "Poor"),
            HealthStatus::BelowAverage => write!(f, "Below Average"),
            HealthStatus::Average => write!(f, "Average"),
            HealthStatus::Good => write!(f, "Good"),
            HealthStatus::Excellent => write!(f, "Excellent"),
        }
    }
}

/// Generic advice given when no trained clusterer is available
pub const GENERIC_SOIL_ADVICE: [&str; 3] = [
    "Regular soil testing recommended",
    "Consider organic matter addition",
    "Monitor nutrient levels",
];

/// Coarse health status from total N+P+K, used without a clusterer
pub fn heuristic_health_status(total_nutrients: f64) -> HealthStatus {
    if total_nutrients > 400.0 {
        HealthStatus::Good
    } else if total_nutrients > 250.0 {
        HealthStatus::Average
    } else {
        HealthStatus::Poor
    }
}

/// Soil health analysis result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SoilHealthReport {
    pub health_status: HealthStatus,
    /// Cluster the sample fell into; absent for heuristic reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
    pub total_nutrients: f64,
    pub recommendations: Vec<String>,
}

impl SoilHealthReport {
    /// Report for a cluster assignment, with the category's advice
    pub fn for_cluster(health_status: HealthStatus, cluster: usize, total_nutrients: f64) -> Self {
        Self {
            health_status,
            cluster: Some(cluster),
            total_nutrients,
            recommendations: health_status
                .recommendations()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Report from the total-nutrient heuristic
    pub fn heuristic(total_nutrients: f64) -> Self {
        Self {
            health_status: heuristic_health_status(total_nutrients),
            cluster: None,
            total_nutrients,
            recommendations: GENERIC_SOIL_ADVICE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_are_ordered() {
        assert!(HealthStatus::Poor < HealthStatus::BelowAverage);
        assert!(HealthStatus::Good < HealthStatus::Excellent);
        let mut sorted = HealthStatus::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, HealthStatus::ALL.to_vec());
    }

    #[test]
    fn heuristic_thresholds() {
        assert_eq!(heuristic_health_status(401.0), HealthStatus::Good);
        assert_eq!(heuristic_health_status(400.0), HealthStatus::Average);
        assert_eq!(heuristic_health_status(251.0), HealthStatus::Average);
        assert_eq!(heuristic_health_status(250.0), HealthStatus::Poor);
    }

    #[test]
    fn below_average_display_and_serde_agree() {
        let json = serde_json::to_string(&HealthStatus::BelowAverage).unwrap();
        assert_eq!(json, format!("\"{}\"", HealthStatus::BelowAverage));
    }

    #[test]
    fn cluster_report_carries_category_advice() {
        let report = SoilHealthReport::for_cluster(HealthStatus::Poor, 3, 120.0);
        assert_eq!(report.cluster, Some(3));
        assert_eq!(report.recommendations.len(), 4);
        assert_eq!(
            report.recommendations[0],
            "Add organic matter through compost or farmyard manure"
        );
    }
}
