use crate::chat::{CleanableConversation, ConversationStats, SpaceSavings};
use crate::classifier::FileCategory;
use crate::cleaner::{CleanupPlan, CleanupResult, FailedItem};
use crate::safety::SafetyLevel;
use crate::scanner::{FileScan, StorageStats, SubdirectorySize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const REPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub roots: Vec<PathBuf>,
    pub categories: Vec<CategoryScanResult>,
    pub total_size_bytes: u64,
    pub total_item_count: usize,
    pub skipped_count: usize,
    pub subdirectories: Vec<SubdirectorySize>,
    pub recommendations: Vec<String>,
    pub scan_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryScanResult {
    pub id: FileCategory,
    pub name: String,
    pub size_bytes: u64,
    pub item_count: usize,
}

impl ScanReport {
    pub fn new(
        roots: Vec<PathBuf>,
        scan: &FileScan,
        subdirectories: Vec<SubdirectorySize>,
        duration_ms: u64,
    ) -> Self {
        let stats = StorageStats::from_entries(&scan.entries);
        let categories = stats
            .by_category
            .iter()
            .map(|(category, summary)| CategoryScanResult {
                id: *category,
                name: category.to_string(),
                size_bytes: summary.size,
                item_count: summary.count,
            })
            .collect();

        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            roots,
            categories,
            total_size_bytes: stats.total_size,
            total_item_count: stats.total_files,
            skipped_count: scan.skipped.len(),
            subdirectories,
            recommendations: stats.recommendations(),
            scan_duration_ms: duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub agent_root: PathBuf,
    pub stats: ConversationStats,
    pub skipped_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanable: Option<Vec<CleanableConversation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings: Option<SpaceSavings>,
}

impl ChatReport {
    pub fn new(agent_root: PathBuf, stats: ConversationStats, skipped_count: usize) -> Self {
        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            agent_root,
            stats,
            skipped_count,
            cleanable: None,
            savings: None,
        }
    }

    pub fn with_cleanable(
        mut self,
        cleanable: Vec<CleanableConversation>,
        savings: SpaceSavings,
    ) -> Self {
        self.cleanable = Some(cleanable);
        self.savings = Some(savings);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub categories: Vec<CategoryPlanResult>,
    pub total_size_bytes: u64,
    pub safe_to_delete: bool,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPlanResult {
    pub id: String,
    pub size_bytes: u64,
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanItem {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub safe: bool,
}

impl PlanReport {
    pub fn new(plan: &CleanupPlan) -> Self {
        let categories = plan
            .by_reason()
            .into_iter()
            .map(|summary| CategoryPlanResult {
                id: summary.reason.label().to_string(),
                size_bytes: summary.size,
                items: plan
                    .candidates
                    .iter()
                    .filter(|c| c.reason == summary.reason)
                    .map(|c| PlanItem {
                        path: c.entry.path.clone(),
                        size_bytes: c.size,
                        safe: c.safety == SafetyLevel::Safe,
                    })
                    .collect(),
            })
            .collect();

        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            categories,
            total_size_bytes: plan.total_size,
            safe_to_delete: plan.safe_to_delete,
            warnings: plan.warnings.clone(),
            recommendations: plan.recommendations.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Partial,
    Failed,
    DryRun,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub plan: PlanReport,
    pub deleted_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub failed_items: Vec<FailedItem>,
    pub total_deleted_size: u64,
    pub duration_ms: u64,
}

impl ExecutionReport {
    pub fn new(plan: &CleanupPlan, result: &CleanupResult) -> Self {
        let status = if result.dry_run {
            ExecutionStatus::DryRun
        } else if result.failed_items.is_empty() {
            ExecutionStatus::Success
        } else if result.deleted_count > 0 || result.skipped_count > 0 {
            ExecutionStatus::Partial
        } else {
            ExecutionStatus::Failed
        };

        Self {
            version: REPORT_VERSION.to_string(),
            timestamp: Utc::now(),
            status,
            plan: PlanReport::new(plan),
            deleted_count: result.deleted_count,
            skipped_count: result.skipped_count,
            failed_count: result.failed_count(),
            failed_items: result.failed_items.clone(),
            total_deleted_size: result.bytes_freed,
            duration_ms: result.duration.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::PathClassifier;
    use crate::cleaner::{CleanupPlanner, PlanOptions};
    use crate::scanner::{ScanPhase, ScanProgress};
    use chrono::Duration;
    use std::path::Path;

    fn sample_plan() -> CleanupPlan {
        let now = Utc::now();
        let root = Path::new("/kiro");
        let classifier = PathClassifier::new();
        let entries = vec![
            classifier.entry(root, root.join("a.tmp"), 10, now),
            classifier.entry(root, root.join("app.log"), 5, now - Duration::days(2)),
        ];
        CleanupPlanner::new().plan(&entries, &[], &PlanOptions::default(), now)
    }

    #[test]
    fn test_plan_report_groups_by_reason() {
        let report = PlanReport::new(&sample_plan());
        assert_eq!(report.version, REPORT_VERSION);
        assert_eq!(report.total_size_bytes, 15);
        assert!(!report.safe_to_delete);

        let ids: Vec<_> = report.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["log", "temp"]);
        assert!(!report.categories[0].items[0].safe);
        assert!(report.categories[1].items[0].safe);
    }

    #[test]
    fn test_execution_status() {
        let plan = sample_plan();

        let dry = CleanupResult {
            dry_run: true,
            ..CleanupResult::default()
        };
        assert_eq!(ExecutionReport::new(&plan, &dry).status, ExecutionStatus::DryRun);

        let partial = CleanupResult {
            deleted_count: 1,
            failed_items: vec![FailedItem {
                path: PathBuf::from("/kiro/app.log"),
                error: "denied".to_string(),
            }],
            ..CleanupResult::default()
        };
        let report = ExecutionReport::new(&plan, &partial);
        assert_eq!(report.status, ExecutionStatus::Partial);
        assert_eq!(report.failed_count, 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "partial");
        assert_eq!(json["plan"]["categories"][0]["id"], "log");
    }

    #[test]
    fn test_scan_report_serializes_categories() {
        let now = Utc::now();
        let root = Path::new("/kiro");
        let classifier = PathClassifier::new();
        let scan = FileScan {
            entries: vec![
                classifier.entry(root, root.join("a.tmp"), 10, now),
                classifier.entry(root, root.join("b.tmp"), 20, now),
                classifier.entry(root, root.join("x.png"), 1, now),
            ],
            skipped: Vec::new(),
            progress: ScanProgress::new(ScanPhase::Files),
        };

        let report = ScanReport::new(vec![root.to_path_buf()], &scan, Vec::new(), 3);
        assert_eq!(report.total_size_bytes, 31);
        assert_eq!(report.total_item_count, 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["categories"][0]["id"], "temp");
        assert_eq!(json["categories"][0]["size_bytes"], 30);
        assert_eq!(json["categories"][1]["name"], "Image");
    }
}
