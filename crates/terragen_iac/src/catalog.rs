//! GCP service catalog.
//!
//! In-process lookup tables for service availability, regions, and pairwise
//! compatibility. The architecture stage consults these while designing the
//! module topology; no live gcloud calls are made.

use serde::{Deserialize, Serialize};

/// Compatibility verdict for a pair of GCP services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Compatibility {
    pub compatible: bool,
    pub notes: String,
    pub requirements: Vec<String>,
}

/// Map a short service name to its googleapis.com API name.
pub fn service_api_name(service: &str) -> String {
    match service {
        "cloud_run" => "run.googleapis.com".to_string(),
        "cloud_sql" => "sql-component.googleapis.com".to_string(),
        "gcs" => "storage-component.googleapis.com".to_string(),
        "compute" => "compute.googleapis.com".to_string(),
        "gke" => "container.googleapis.com".to_string(),
        "vpc" => "compute.googleapis.com".to_string(),
        other => format!("{other}.googleapis.com"),
    }
}

/// Regions a service type is offered in.
pub fn service_regions(service_type: &str) -> &'static [&'static str] {
    match service_type {
        "run" | "cloud_run" | "sql" | "cloud_sql" => &[
            "us-central1",
            "us-east1",
            "us-west1",
            "europe-west1",
            "asia-east1",
        ],
        _ => &[
            "us-central1",
            "us-east1",
            "us-west1",
            "us-west2",
            "europe-west1",
            "europe-west2",
            "asia-east1",
            "asia-southeast1",
        ],
    }
}

/// Whether a service is offered in the given region.
pub fn service_available(service: &str, region: &str) -> bool {
    service_regions(service).contains(&region)
}

/// Check whether two services can work together.
///
/// Unknown pairs default to compatible; only pairs with known coupling
/// requirements carry notes.
pub fn service_compatibility(primary: &str, secondary: &str) -> Compatibility {
    let pair = |a: &str, b: &str| {
        (primary == a && secondary == b) || (primary == b && secondary == a)
    };

    if pair("cloud_run", "cloud_sql") {
        Compatibility {
            compatible: true,
            notes: "Cloud Run can connect to Cloud SQL via private IP or Cloud SQL Proxy"
                .to_string(),
            requirements: vec![
                "VPC connector".to_string(),
                "Cloud SQL private IP".to_string(),
            ],
        }
    } else if pair("cloud_run", "gcs") {
        Compatibility {
            compatible: true,
            notes: "Cloud Run can access GCS using service account authentication".to_string(),
            requirements: vec!["IAM permissions".to_string()],
        }
    } else if pair("gke", "cloud_sql") {
        Compatibility {
            compatible: true,
            notes: "GKE can connect to Cloud SQL via Cloud SQL Proxy sidecar".to_string(),
            requirements: vec![
                "Cloud SQL Proxy".to_string(),
                "Workload Identity".to_string(),
            ],
        }
    } else if pair("gke", "gcs") {
        Compatibility {
            compatible: true,
            notes: "GKE can access GCS via Workload Identity or service account keys".to_string(),
            requirements: vec!["Workload Identity or service account".to_string()],
        }
    } else {
        Compatibility {
            compatible: true,
            notes: "No specific compatibility issues identified".to_string(),
            requirements: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_name_mapping() {
        assert_eq!(service_api_name("cloud_run"), "run.googleapis.com");
        assert_eq!(service_api_name("vpc"), "compute.googleapis.com");
        assert_eq!(service_api_name("bigquery"), "bigquery.googleapis.com");
    }

    #[test]
    fn test_region_availability() {
        assert!(service_available("cloud_run", "us-central1"));
        assert!(!service_available("cloud_run", "us-west2"));
        assert!(service_available("compute", "us-west2"));
    }

    #[test]
    fn test_known_pair_carries_requirements() {
        let compat = service_compatibility("cloud_run", "cloud_sql");
        assert!(compat.compatible);
        assert!(compat.requirements.contains(&"VPC connector".to_string()));

        // Order must not matter
        let reversed = service_compatibility("cloud_sql", "cloud_run");
        assert_eq!(reversed.notes, compat.notes);
    }

    #[test]
    fn test_unknown_pair_defaults_to_compatible() {
        let compat = service_compatibility("pubsub", "bigquery");
        assert!(compat.compatible);
        assert!(compat.requirements.is_empty());
    }
}
